//! Camera backed sources

use super::{SourceKind, TextureFrameSource};
use crate::bridge::{BridgeConfig, FrameSurfaceBridge};
use crate::consumer::{TextureFrameConsumer, TextureFrameProducer};
use crate::device::{
    Camera2Device, CameraXDevice, CaptureDevice, CaptureState, DeviceFacing, OnCameraStartedListener,
};
use crate::error::{MediaError, MediaResult};
use crate::host::TextureFrameHost;
use crate::permission::PermissionGate;
use crate::stats::SourceStats;
use crate::surface::DestinationSurface;
use crate::viewport::Size;
use std::sync::{Arc, Weak};
use texframe_core::Options;
use tracing::{debug, info};

/// Camera source over either device driver.
///
/// Each `start` builds a new device bound to the bridge's destination
/// surface; `stop` closes it before the bridge is torn down.
pub struct CameraTextureFrameSource {
    kind: SourceKind,
    host: Weak<dyn TextureFrameHost>,
    gate: PermissionGate,
    facing: DeviceFacing,
    bridge: FrameSurfaceBridge,
    device: Option<Box<dyn CaptureDevice>>,
}

impl CameraTextureFrameSource {
    pub fn create(
        host: &Arc<dyn TextureFrameHost>,
        kind: SourceKind,
        options: &Options,
    ) -> MediaResult<Self> {
        if kind == SourceKind::MediaPlayer {
            return Err(MediaError::UnsupportedSource {
                name: format!("{kind} is not a camera source"),
            });
        }
        let config = BridgeConfig::from_options(options)?;
        let gate = PermissionGate::camera(host.foreground_context().permission_resolver());
        Ok(Self {
            kind,
            host: Arc::downgrade(host),
            gate,
            facing: DeviceFacing::from_options(options),
            bridge: FrameSurfaceBridge::new(host.graphics_context(), config, None),
            device: None,
        })
    }

    pub fn facing(&self) -> DeviceFacing {
        self.facing
    }

    pub fn bridge(&self) -> &FrameSurfaceBridge {
        &self.bridge
    }

    fn build_device(
        &self,
        host: &Arc<dyn TextureFrameHost>,
        surface: Arc<DestinationSurface>,
    ) -> MediaResult<Box<dyn CaptureDevice>> {
        let foreground = host.foreground_context();
        let device: Box<dyn CaptureDevice> = match self.kind {
            SourceKind::Camera2 => Box::new(Camera2Device::new(foreground.camera_manager()?, surface)),
            SourceKind::CameraX => {
                Box::new(CameraXDevice::new(foreground.camera_provider()?, surface))
            }
            SourceKind::MediaPlayer => {
                return Err(MediaError::UnsupportedSource {
                    name: self.kind.to_string(),
                })
            }
        };
        Ok(device)
    }
}

impl TextureFrameProducer for CameraTextureFrameSource {
    fn set_consumer(&self, consumer: Option<&Arc<dyn TextureFrameConsumer>>) {
        self.bridge.set_consumer(consumer);
    }
}

impl TextureFrameSource for CameraTextureFrameSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn permission_gate(&self) -> &PermissionGate {
        &self.gate
    }

    fn start(&mut self) -> MediaResult<()> {
        if let Some(device) = &self.device {
            let state = device.state();
            if !matches!(state, CaptureState::Closed | CaptureState::Error(_)) {
                debug!(source = %self.kind, %state, "Already started");
                return Ok(());
            }
            info!(source = %self.kind, %state, "Rebuilding camera device");
            if let Some(device) = self.device.take() {
                device.set_on_camera_started_listener(None);
                device.close_camera();
            }
        }
        if !self.gate.permissions_granted() {
            info!(source = %self.kind, "Camera permission not granted; not starting");
            return Ok(());
        }
        let host = self.host.upgrade().ok_or_else(|| MediaError::ResourceNotAvailable {
            resource: "texture frame host".to_string(),
        })?;

        let surface = self.bridge.ensure_surface();
        let device = self.build_device(&host, surface)?;
        let weak_host = Arc::downgrade(&host);
        let listener: OnCameraStartedListener = Arc::new(move |surface: Arc<DestinationSurface>| {
            if let Some(host) = weak_host.upgrade() {
                host.set_surface_texture(surface);
            }
        });
        device.set_on_camera_started_listener(Some(listener));
        device.start_camera(self.facing)?;
        info!(source = %self.kind, facing = %self.facing, "Camera source started");
        self.device = Some(device);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(device) = self.device.take() {
            device.set_on_camera_started_listener(None);
            device.close_camera();
            info!(source = %self.kind, "Camera source stopped");
        }
        self.bridge.close();
    }

    fn is_started(&self) -> bool {
        self.device.is_some()
    }

    fn compute_display_size_from_view_size(&self, view_size: Size) -> Option<Size> {
        self.device
            .as_ref()
            .and_then(|device| device.compute_display_size(view_size))
    }

    fn is_rotated(&self) -> bool {
        self.device
            .as_ref()
            .map(|device| device.is_rotated())
            .unwrap_or(false)
    }

    fn attach(&self, surface: Option<&Arc<DestinationSurface>>, width: u32, height: u32) {
        self.bridge.attach(surface, width, height);
    }

    fn stats(&self) -> SourceStats {
        self.bridge.stats()
    }

    fn device_state(&self) -> Option<CaptureState> {
        self.device.as_ref().map(|device| device.state())
    }
}

impl Drop for CameraTextureFrameSource {
    fn drop(&mut self) {
        self.stop();
    }
}
