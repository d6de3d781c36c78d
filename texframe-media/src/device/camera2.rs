//! Direct hardware session driver

use super::lifecycle::DeviceLifecycle;
use super::state::{CaptureState, CaptureTransition, DeviceFault, Generation};
use super::{CaptureDevice, DeviceEvent, DeviceFacing, OnCameraStartedListener};
use crate::error::{MediaError, MediaResult};
use crate::platform::{
    CameraCharacteristics, CameraDeviceHandle, CameraManager, CaptureRequest, CaptureSessionHandle,
    DeviceStateCallback, SessionStateCallback,
};
use crate::surface::DestinationSurface;
use crate::viewport::{FrameInfo, RotationState};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

#[derive(Default)]
struct Camera2Handles {
    device: Option<Arc<dyn CameraDeviceHandle>>,
    session: Option<Arc<dyn CaptureSessionHandle>>,
}

impl Camera2Handles {
    /// Session first, then device; every step runs even if one fails
    fn release(self) {
        if let Some(session) = self.session {
            if let Err(e) = session.close() {
                warn!(error = %e, "Failed to close capture session");
            }
        }
        if let Some(device) = self.device {
            if let Err(e) = device.close() {
                warn!(camera_id = device.id(), error = %e, "Failed to close camera device");
            }
        }
    }
}

struct Camera2Inner {
    manager: Arc<dyn CameraManager>,
    surface: Arc<DestinationSurface>,
    lifecycle: DeviceLifecycle<Camera2Handles>,
}

/// Drives the hardware camera API directly: opens the device, negotiates a
/// capture session into the destination surface and submits a repeating
/// preview request from the background executor.
pub struct Camera2Device {
    inner: Arc<Camera2Inner>,
}

impl Camera2Device {
    pub fn new(manager: Arc<dyn CameraManager>, surface: Arc<DestinationSurface>) -> Self {
        Self {
            inner: Arc::new(Camera2Inner {
                manager,
                surface,
                lifecycle: DeviceLifecycle::new("camera2"),
            }),
        }
    }

    pub fn surface(&self) -> &Arc<DestinationSurface> {
        &self.inner.surface
    }
}

impl Camera2Inner {
    fn fail(&self, generation: Generation, fault: DeviceFault) {
        if let Some(handles) = self.lifecycle.fault(generation, fault) {
            handles.release();
        }
    }

    fn select(&self, facing: DeviceFacing) -> Result<(String, CameraCharacteristics), DeviceFault> {
        let ids = self
            .manager
            .camera_id_list()
            .map_err(|e| DeviceFault::EnumerationFailed {
                reason: e.to_string(),
            })?;
        for id in ids {
            let characteristics = self.manager.camera_characteristics(&id).map_err(|e| {
                DeviceFault::EnumerationFailed {
                    reason: format!("characteristics of camera {id}: {e}"),
                }
            })?;
            if facing.matches(characteristics.lens_facing) {
                return Ok((id, characteristics));
            }
        }
        Err(DeviceFault::NoMatchingDevice {
            facing: facing.to_string(),
        })
    }

    fn start(self: &Arc<Self>, generation: Generation, facing: DeviceFacing) {
        let (camera_id, characteristics) = match self.select(facing) {
            Ok(selected) => selected,
            Err(fault) => return self.fail(generation, fault),
        };
        let Some(frame_size) = characteristics.output_sizes.first().copied() else {
            return self.fail(
                generation,
                DeviceFault::EnumerationFailed {
                    reason: format!("camera {camera_id} reports no output sizes"),
                },
            );
        };
        let info = FrameInfo::new(
            frame_size,
            RotationState::from_degrees(characteristics.sensor_orientation),
        );
        if !self.lifecycle.characterize(generation, info) {
            return;
        }
        self.surface.set_default_buffer_size(frame_size);
        info!(
            %camera_id,
            %generation,
            size = %frame_size,
            rotated = info.rotation.is_rotated(),
            "Opening camera"
        );

        let callback = Arc::new(DeviceCallback {
            inner: Arc::downgrade(self),
            generation,
        });
        if let Err(e) = self.manager.open_camera(&camera_id, callback) {
            self.fail(
                generation,
                DeviceFault::AccessDenied {
                    camera_id,
                    reason: e.to_string(),
                },
            );
        }
    }

    fn create_preview(self: &Arc<Self>, generation: Generation) -> MediaResult<()> {
        let device = self
            .lifecycle
            .advance(generation, CaptureTransition::Configure, |h| h.device.clone())
            .ok_or_else(|| MediaError::InvalidState {
                message: format!("create_preview requires OPEN, state is {}", self.lifecycle.state()),
            })?;
        let Some(device) = device else {
            self.fail(
                generation,
                DeviceFault::SessionNegotiationFailed {
                    reason: "no device handle".to_string(),
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
            let callback = Arc::new(SessionCallback {
                inner: Arc::downgrade(&inner),
                generation,
            });
            debug!(camera_id = device.id(), %generation, "Creating capture session");
            if let Err(e) = device.create_capture_session(vec![Arc::clone(&inner.surface)], callback) {
                inner.fail(
                    generation,
                    DeviceFault::SessionNegotiationFailed {
                        reason: e.to_string(),
                    },
                );
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

    /// Runs on the executor once the session is configured
    fn submit_preview(&self, generation: Generation, session: Arc<dyn CaptureSessionHandle>) {
        if !self.lifecycle.is_current(generation) {
            discard_session(&session);
            return;
        }
        let request = CaptureRequest::preview(vec![Arc::clone(&self.surface)]);
        if let Err(e) = session.set_repeating_request(request) {
            discard_session(&session);
            return self.fail(
                generation,
                DeviceFault::SessionNegotiationFailed {
                    reason: e.to_string(),
                },
            );
        }
        let stored = self
            .lifecycle
            .advance(generation, CaptureTransition::Configured, |h| {
                h.session = Some(Arc::clone(&session));
            });
        if stored.is_none() {
            discard_session(&session);
        }
    }
}

/// Close a session that never made it into the handles
fn discard_session(session: &Arc<dyn CaptureSessionHandle>) {
    if let Err(e) = session.close() {
        warn!(error = %e, "Failed to close discarded capture session");
    }
}

fn discard_device(device: &dyn CameraDeviceHandle) {
    if let Err(e) = device.close() {
        warn!(camera_id = device.id(), error = %e, "Failed to close discarded camera device");
    }
}

struct DeviceCallback {
    inner: Weak<Camera2Inner>,
    generation: Generation,
}

impl DeviceStateCallback for DeviceCallback {
    fn on_opened(&self, device: Arc<dyn CameraDeviceHandle>) {
        let Some(inner) = self.inner.upgrade() else {
            discard_device(device.as_ref());
            return;
        };
        let stored = inner
            .lifecycle
            .advance(self.generation, CaptureTransition::Opened, |h| {
                h.device = Some(Arc::clone(&device));
            });
        if stored.is_none() {
            debug!(camera_id = device.id(), generation = %self.generation, "Closing device opened by a stale attempt");
            discard_device(device.as_ref());
            return;
        }
        if inner.lifecycle.fire_started(self.generation, &inner.surface) {
            if let Err(e) = inner.create_preview(self.generation) {
                debug!(error = %e, "Preview not created after open");
            }
        }
    }

    fn on_disconnected(&self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        if let Some(handles) = inner.lifecycle.disconnect(self.generation) {
            warn!(generation = %self.generation, "Camera disconnected");
            handles.release();
        }
    }

    fn on_error(&self, code: i32) {
        if let Some(inner) = self.inner.upgrade() {
            inner.fail(self.generation, DeviceFault::DeviceError { code });
        }
    }
}

struct SessionCallback {
    inner: Weak<Camera2Inner>,
    generation: Generation,
}

impl SessionStateCallback for SessionCallback {
    fn on_configured(&self, session: Arc<dyn CaptureSessionHandle>) {
        let Some(inner) = self.inner.upgrade() else {
            discard_session(&session);
            return;
        };
        let generation = self.generation;
        let target = Arc::downgrade(&inner);
        let pending = Arc::clone(&session);
        let queued = inner.lifecycle.execute(generation, move || {
            if let Some(inner) = target.upgrade() {
                inner.submit_preview(generation, pending);
            }
        });
        if !queued {
            discard_session(&session);
        }
    }

    fn on_configure_failed(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.fail(
                self.generation,
                DeviceFault::SessionNegotiationFailed {
                    reason: "session configuration rejected".to_string(),
                },
            );
        }
    }
}

impl CaptureDevice for Camera2Device {
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

impl Drop for Camera2Device {
    fn drop(&mut self) {
        self.close_camera();
    }
}

impl std::fmt::Debug for Camera2Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Camera2Device")
            .field("driver", &self.inner.lifecycle.label())
            .field("state", &self.state())
            .field("generation", &self.generation())
            .field("surface", &self.inner.surface.id())
            .finish()
    }
}
