//! Texture frame sources
//!
//! The polymorphic façade the host depends on. A source composes a capture
//! device (or a media player) with a [`FrameSurfaceBridge`] and pushes
//! converted texture frames to its registered consumer until stopped.

mod camera;
mod media_player;

pub use camera::CameraTextureFrameSource;
pub use media_player::MediaPlayerTextureFrameSource;

use crate::consumer::TextureFrameProducer;
use crate::device::CaptureState;
use crate::error::{MediaError, MediaResult};
use crate::host::TextureFrameHost;
use crate::permission::{PermissionGate, PermissionStatus};
use crate::stats::SourceStats;
use crate::surface::DestinationSurface;
use crate::viewport::Size;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use texframe_core::{keys, Options};
use tracing::info;

/// Source variants selectable by the `textureFrameSource` option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    Camera2,
    CameraX,
    MediaPlayer,
}

impl SourceKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Camera2" => Some(SourceKind::Camera2),
            "CameraX" => Some(SourceKind::CameraX),
            "MediaPlayer" => Some(SourceKind::MediaPlayer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Camera2 => "Camera2",
            SourceKind::CameraX => "CameraX",
            SourceKind::MediaPlayer => "MediaPlayer",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Start/stop capability shared by every source variant
pub trait TextureFrameSource: TextureFrameProducer + Send {
    fn kind(&self) -> SourceKind;

    fn permission_gate(&self) -> &PermissionGate;

    /// Request any missing permission; returns whether all were granted
    fn check_and_request_permissions(&self) -> bool {
        self.permission_gate().check_and_request()
    }

    fn permissions_granted(&self) -> bool {
        self.permission_gate().permissions_granted()
    }

    /// Forward the host's permission result. Does not start the source.
    fn on_request_permissions_result(
        &self,
        request_code: i32,
        permissions: &[String],
        grants: &[PermissionStatus],
    ) {
        self.permission_gate()
            .on_request_permissions_result(request_code, permissions, grants);
    }

    /// Begin producing frames. A no-op while permissions are missing.
    fn start(&mut self) -> MediaResult<()>;

    /// Stop producing frames and release the device and surfaces
    fn stop(&mut self);

    fn is_started(&self) -> bool;

    /// On-screen size for a view of `view_size`, absent until known
    fn compute_display_size_from_view_size(&self, view_size: Size) -> Option<Size>;

    fn is_rotated(&self) -> bool;

    /// Rebind the display target frames are rendered for
    fn attach(&self, surface: Option<&Arc<DestinationSurface>>, width: u32, height: u32);

    fn stats(&self) -> SourceStats;

    /// State of the underlying capture device, if the source has one
    fn device_state(&self) -> Option<CaptureState> {
        None
    }
}

/// Create the source named by the `textureFrameSource` option
pub fn build_texture_frame_source(
    host: &Arc<dyn TextureFrameHost>,
    options: &Options,
) -> MediaResult<Box<dyn TextureFrameSource>> {
    let name = options
        .get_string(keys::TEXTURE_FRAME_SOURCE)
        .unwrap_or_default();
    let kind = SourceKind::from_name(name).ok_or_else(|| MediaError::UnsupportedSource {
        name: name.to_string(),
    })?;
    info!(source = %kind, "Creating texture frame source");

    let source: Box<dyn TextureFrameSource> = match kind {
        SourceKind::Camera2 | SourceKind::CameraX => {
            Box::new(CameraTextureFrameSource::create(host, kind, options)?)
        }
        SourceKind::MediaPlayer => Box::new(MediaPlayerTextureFrameSource::create(host, options)?),
    };
    Ok(source)
}
