//! Platform seams
//!
//! Narrow interfaces over the platform services a frame source drives: the
//! hardware camera API, the camera selection library, the media player and
//! the GL context. Implementations live outside this crate (the platform
//! binding layer, or in-process fakes in tests). Callback traits may be
//! invoked on any thread, including synchronously from inside the call that
//! triggered them.

use crate::error::MediaResult;
use crate::surface::{DestinationSurface, RawFrame};
use crate::viewport::Size;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Lens facing reported by device metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LensFacing {
    Front,
    Back,
    External,
}

// ---------------------------------------------------------------------------
// Hardware camera API
// ---------------------------------------------------------------------------

/// Static metadata of one camera device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraCharacteristics {
    pub lens_facing: Option<LensFacing>,
    /// Clockwise sensor rotation in degrees
    pub sensor_orientation: i32,
    /// Supported output sizes for texture targets, preferred first
    pub output_sizes: Vec<Size>,
}

/// Enumerates and opens hardware camera devices
pub trait CameraManager: Send + Sync {
    fn camera_id_list(&self) -> MediaResult<Vec<String>>;

    fn camera_characteristics(&self, camera_id: &str) -> MediaResult<CameraCharacteristics>;

    /// Begin opening; the outcome arrives on `callback`
    fn open_camera(
        &self,
        camera_id: &str,
        callback: Arc<dyn DeviceStateCallback>,
    ) -> MediaResult<()>;
}

/// Device lifecycle callbacks delivered by the camera service
pub trait DeviceStateCallback: Send + Sync {
    fn on_opened(&self, device: Arc<dyn CameraDeviceHandle>);
    fn on_disconnected(&self);
    fn on_error(&self, code: i32);
}

/// An opened camera device
pub trait CameraDeviceHandle: Send + Sync {
    fn id(&self) -> &str;

    /// Begin negotiating a session writing into `outputs`; the outcome
    /// arrives on `callback`
    fn create_capture_session(
        &self,
        outputs: Vec<Arc<DestinationSurface>>,
        callback: Arc<dyn SessionStateCallback>,
    ) -> MediaResult<()>;

    fn close(&self) -> MediaResult<()>;
}

/// Session negotiation callbacks
pub trait SessionStateCallback: Send + Sync {
    fn on_configured(&self, session: Arc<dyn CaptureSessionHandle>);
    fn on_configure_failed(&self);
}

/// A negotiated capture session
pub trait CaptureSessionHandle: Send + Sync {
    /// Submit a request that repeats until the session closes
    fn set_repeating_request(&self, request: CaptureRequest) -> MediaResult<()>;
    fn close(&self) -> MediaResult<()>;
}

/// Repeating preview request
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    /// Let the device run auto exposure, focus and white balance
    pub auto_control: bool,
    pub targets: Vec<Arc<DestinationSurface>>,
}

impl CaptureRequest {
    pub fn preview(targets: Vec<Arc<DestinationSurface>>) -> Self {
        Self {
            auto_control: true,
            targets,
        }
    }
}

// ---------------------------------------------------------------------------
// Camera selection library
// ---------------------------------------------------------------------------

/// Camera description as reported by the selection library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraInfo {
    pub camera_id: String,
    pub lens_facing: Option<LensFacing>,
    pub sensor_rotation_degrees: i32,
    pub preview_size: Size,
}

/// Higher-level camera library that handles device opening itself
pub trait CameraProvider: Send + Sync {
    fn available_cameras(&self) -> MediaResult<Vec<CameraInfo>>;

    /// Bind a preview use case writing into `surface`. No callbacks fire
    /// until [`PreviewBinding::open`].
    fn bind_preview(
        &self,
        camera: &CameraInfo,
        surface: Arc<DestinationSurface>,
    ) -> MediaResult<Arc<dyn PreviewBinding>>;
}

/// A bound preview use case
pub trait PreviewBinding: Send + Sync {
    fn open(&self, callback: Arc<dyn PreviewStateCallback>) -> MediaResult<()>;
    fn start_streaming(&self) -> MediaResult<()>;
    fn unbind(&self) -> MediaResult<()>;
}

/// Preview binding callbacks
pub trait PreviewStateCallback: Send + Sync {
    fn on_camera_opened(&self);
    fn on_camera_closed(&self);
    fn on_error(&self, code: i32);
}

// ---------------------------------------------------------------------------
// Media player
// ---------------------------------------------------------------------------

pub trait MediaPlayerFactory: Send + Sync {
    fn create(&self, uri: &str) -> MediaResult<Box<dyn MediaPlayer>>;
}

/// File playback rendering into a surface
pub trait MediaPlayer: Send {
    fn set_surface(&mut self, surface: Option<Arc<DestinationSurface>>);
    fn set_looping(&mut self, looping: bool);
    fn start(&mut self) -> MediaResult<()>;
    fn stop(&mut self) -> MediaResult<()>;
    fn release(&mut self);
}

// ---------------------------------------------------------------------------
// Graphics
// ---------------------------------------------------------------------------

/// GL texture name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureName(pub u32);

/// The host's shared GL context
pub trait GraphicsContext: Send + Sync {
    fn create_texture(&self, size: Size) -> MediaResult<TextureName>;

    /// Render the external frame into `target`, scaled to `size`
    fn render_external_frame(
        &self,
        frame: &RawFrame,
        target: TextureName,
        size: Size,
    ) -> MediaResult<()>;

    fn delete_texture(&self, texture: TextureName);
}
