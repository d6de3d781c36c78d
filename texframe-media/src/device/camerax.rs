//! Camera selection library driver

use super::lifecycle::DeviceLifecycle;
use super::state::{CaptureState, CaptureTransition, DeviceFault, Generation};
use super::{CaptureDevice, DeviceEvent, DeviceFacing, OnCameraStartedListener};
use crate::error::{MediaError, MediaResult};
use crate::platform::{CameraInfo, CameraProvider, PreviewBinding, PreviewStateCallback};
use crate::surface::DestinationSurface;
use crate::viewport::{FrameInfo, RotationState};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Picks a camera from the library's device list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraSelector {
    facing: DeviceFacing,
}

impl CameraSelector {
    pub fn new(facing: DeviceFacing) -> Self {
        Self { facing }
    }

    pub fn facing(&self) -> DeviceFacing {
        self.facing
    }

    /// First camera whose lens facing matches
    pub fn select<'a>(&self, cameras: &'a [CameraInfo]) -> Option<&'a CameraInfo> {
        cameras
            .iter()
            .find(|camera| self.facing.matches(camera.lens_facing))
    }
}

#[derive(Default)]
struct CameraXHandles {
    binding: Option<Arc<dyn PreviewBinding>>,
}

impl CameraXHandles {
    fn release(self) {
        if let Some(binding) = self.binding {
            if let Err(e) = binding.unbind() {
                warn!(error = %e, "Failed to unbind preview");
            }
        }
    }
}

struct CameraXInner {
    provider: Arc<dyn CameraProvider>,
    surface: Arc<DestinationSurface>,
    lifecycle: DeviceLifecycle<CameraXHandles>,
}

/// Lets the camera library open the device; this driver only selects the
/// camera, binds a preview use case to the destination surface and starts
/// streaming once the library reports the camera open.
pub struct CameraXDevice {
    inner: Arc<CameraXInner>,
}

impl CameraXDevice {
    pub fn new(provider: Arc<dyn CameraProvider>, surface: Arc<DestinationSurface>) -> Self {
        Self {
            inner: Arc::new(CameraXInner {
                provider,
                surface,
                lifecycle: DeviceLifecycle::new("camerax"),
            }),
        }
    }

    pub fn surface(&self) -> &Arc<DestinationSurface> {
        &self.inner.surface
    }
}

impl CameraXInner {
    fn fail(&self, generation: Generation, fault: DeviceFault) {
        if let Some(handles) = self.lifecycle.fault(generation, fault) {
            handles.release();
        }
    }

    fn start(self: &Arc<Self>, generation: Generation, facing: DeviceFacing) {
        let cameras = match self.provider.available_cameras() {
            Ok(cameras) => cameras,
            Err(e) => {
                return self.fail(
                    generation,
                    DeviceFault::EnumerationFailed {
                        reason: e.to_string(),
                    },
                )
            }
        };
        let Some(camera) = CameraSelector::new(facing).select(&cameras) else {
            return self.fail(
                generation,
                DeviceFault::NoMatchingDevice {
                    facing: facing.to_string(),
                },
            );
        };

        let info = FrameInfo::new(
            camera.preview_size,
            RotationState::from_degrees(camera.sensor_rotation_degrees),
        );
        if !self.lifecycle.characterize(generation, info) {
            return;
        }
        self.surface.set_default_buffer_size(camera.preview_size);
        info!(
            camera_id = %camera.camera_id,
            %generation,
            size = %camera.preview_size,
            rotated = info.rotation.is_rotated(),
            "Binding camera preview"
        );

        let binding = match self.provider.bind_preview(camera, Arc::clone(&self.surface)) {
            Ok(binding) => binding,
            Err(e) => {
                return self.fail(
                    generation,
                    DeviceFault::AccessDenied {
                        camera_id: camera.camera_id.clone(),
                        reason: e.to_string(),
                    },
                )
            }
        };
        let stored = self.lifecycle.with_handles(generation, |h| {
            h.binding = Some(Arc::clone(&binding));
        });
        if stored.is_none() {
            if let Err(e) = binding.unbind() {
                warn!(error = %e, "Failed to unbind stale preview binding");
            }
            return;
        }

        let callback = Arc::new(BindingCallback {
            inner: Arc::downgrade(self),
            generation,
        });
        if let Err(e) = binding.open(callback) {
            self.fail(
                generation,
                DeviceFault::AccessDenied {
                    camera_id: camera.camera_id.clone(),
                    reason: e.to_string(),
                },
            );
        }
    }

    fn create_preview(self: &Arc<Self>, generation: Generation) -> MediaResult<()> {
        let binding = self
            .lifecycle
            .advance(generation, CaptureTransition::Configure, |h| h.binding.clone())
            .ok_or_else(|| MediaError::InvalidState {
                message: format!("create_preview requires OPEN, state is {}", self.lifecycle.state()),
            })?;
        let Some(binding) = binding else {
            self.fail(
                generation,
                DeviceFault::SessionNegotiationFailed {
                    reason: "no preview binding".to_string(),
                },
            );
            return Ok(());
        };

        let inner = Arc::downgrade(self);
        let queued = self.lifecycle.execute(generation, move || {
            let Some(inner) = inner.upgrade() else {
                return;
            };
            if !inner.lifecycle.is_current(generation) {
                return;
            }
            match binding.start_streaming() {
                Ok(()) => {
                    inner
                        .lifecycle
                        .advance(generation, CaptureTransition::Configured, |_| ());
                }
                Err(e) => inner.fail(
                    generation,
                    DeviceFault::SessionNegotiationFailed {
                        reason: e.to_string(),
                    },
                ),
            }
        });
        if !queued {
            self.fail(
                generation,
                DeviceFault::SessionNegotiationFailed {
                    reason: "background executor not running".to_string(),
                },
            );
        }
        Ok(())
    }
}

struct BindingCallback {
    inner: Weak<CameraXInner>,
    generation: Generation,
}

impl PreviewStateCallback for BindingCallback {
    fn on_camera_opened(&self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        if inner
            .lifecycle
            .advance(self.generation, CaptureTransition::Opened, |_| ())
            .is_none()
        {
            return;
        }
        if inner.lifecycle.fire_started(self.generation, &inner.surface) {
            if let Err(e) = inner.create_preview(self.generation) {
                debug!(error = %e, "Preview not created after open");
            }
        }
    }

    fn on_camera_closed(&self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        if let Some(handles) = inner.lifecycle.disconnect(self.generation) {
            warn!(generation = %self.generation, "Camera closed by the camera library");
            handles.release();
        }
    }

    fn on_error(&self, code: i32) {
        if let Some(inner) = self.inner.upgrade() {
            inner.fail(self.generation, DeviceFault::DeviceError { code });
        }
    }
}

impl CaptureDevice for CameraXDevice {
    fn start_camera(&self, facing: DeviceFacing) -> MediaResult<()> {
        let generation = self.inner.lifecycle.begin_open()?;
        self.inner.start(generation, facing);
        Ok(())
    }

    fn create_preview(&self) -> MediaResult<()> {
        self.inner.create_preview(self.inner.lifecycle.generation())
    }

    fn close_camera(&self) {
        self.inner.lifecycle.close().release();
    }

    fn state(&self) -> CaptureState {
        self.inner.lifecycle.state()
    }

    fn generation(&self) -> Generation {
        self.inner.lifecycle.generation()
    }

    fn frame_info(&self) -> Option<FrameInfo> {
        self.inner.lifecycle.frame_info()
    }

    fn set_on_camera_started_listener(&self, listener: Option<OnCameraStartedListener>) {
        self.inner.lifecycle.set_listener(listener);
    }

    fn subscribe_events(&self) -> broadcast::Receiver<DeviceEvent> {
        self.inner.lifecycle.subscribe()
    }
}

impl Drop for CameraXDevice {
    fn drop(&mut self) {
        self.close_camera();
    }
}

impl std::fmt::Debug for CameraXDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraXDevice")
            .field("driver", &self.inner.lifecycle.label())
            .field("state", &self.state())
            .field("generation", &self.generation())
            .field("surface", &self.inner.surface.id())
            .finish()
    }
}
