//! Capture devices
//!
//! A capture device wraps one video producing device behind a uniform
//! open / preview / close state machine. Opening is asynchronous: the
//! platform reports readiness, failure and disconnects through callbacks
//! that may arrive on any thread, possibly after the device was closed.
//! Every callback carries the [`Generation`] of the open attempt that created
//! it and is discarded once that attempt is no longer current.
//!
//! Device failures are never returned to the caller of `start_camera`; they
//! move the device into [`CaptureState::Error`] and are published as
//! [`DeviceEvent::Fault`].

mod camera2;
mod camerax;
mod executor;
mod lifecycle;
mod state;

pub use camera2::Camera2Device;
pub use camerax::{CameraSelector, CameraXDevice};
pub use executor::BackgroundExecutor;
pub use state::{next, CaptureState, CaptureTransition, DeviceFault, Generation};

use crate::error::MediaResult;
use crate::platform::LensFacing;
use crate::surface::DestinationSurface;
use crate::viewport::{FrameInfo, Size};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use texframe_core::{keys, Options};
use tokio::sync::broadcast;

/// Device selection criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceFacing {
    Front,
    Back,
    External,
    /// Matches any device
    Any,
}

impl DeviceFacing {
    /// `cameraFacingFront`: true selects FRONT, false BACK, absent ANY
    pub fn from_options(options: &Options) -> Self {
        match options.get_bool(keys::CAMERA_FACING_FRONT) {
            Some(true) => DeviceFacing::Front,
            Some(false) => DeviceFacing::Back,
            None => DeviceFacing::Any,
        }
    }

    pub fn matches(&self, lens_facing: Option<LensFacing>) -> bool {
        match self {
            DeviceFacing::Any => true,
            DeviceFacing::Front => lens_facing == Some(LensFacing::Front),
            DeviceFacing::Back => lens_facing == Some(LensFacing::Back),
            DeviceFacing::External => lens_facing == Some(LensFacing::External),
        }
    }
}

impl fmt::Display for DeviceFacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeviceFacing::Front => "FRONT",
            DeviceFacing::Back => "BACK",
            DeviceFacing::External => "EXTERNAL",
            DeviceFacing::Any => "ANY",
        })
    }
}

/// Device telemetry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    StateChanged {
        generation: Generation,
        from: CaptureState,
        to: CaptureState,
    },
    /// The device is open and its destination surface was handed out
    CameraStarted {
        generation: Generation,
        surface_id: u64,
    },
    Fault {
        generation: Generation,
        fault: DeviceFault,
    },
}

/// Invoked once per open attempt, after the device reached OPEN
pub type OnCameraStartedListener = Arc<dyn Fn(Arc<DestinationSurface>) + Send + Sync>;

/// Uniform contract of every capture device driver
pub trait CaptureDevice: Send + Sync {
    /// Begin opening the first device matching `facing`.
    ///
    /// Returns an error only when the device is not CLOSED or its background
    /// executor cannot be started. Enumeration and access failures are
    /// reported through the device state instead.
    fn start_camera(&self, facing: DeviceFacing) -> MediaResult<()>;

    /// Negotiate the preview session. Valid only in OPEN.
    fn create_preview(&self) -> MediaResult<()>;

    /// Release everything and return to CLOSED; a no-op when already closed
    fn close_camera(&self);

    fn state(&self) -> CaptureState;

    fn generation(&self) -> Generation;

    /// Intrinsic frame size and rotation of the selected device
    fn frame_info(&self) -> Option<FrameInfo>;

    fn set_on_camera_started_listener(&self, listener: Option<OnCameraStartedListener>);

    fn subscribe_events(&self) -> broadcast::Receiver<DeviceEvent>;

    fn compute_display_size(&self, view_size: Size) -> Option<Size> {
        self.frame_info()
            .and_then(|info| info.compute_display_size(view_size))
    }

    fn is_rotated(&self) -> bool {
        self.frame_info()
            .map(|info| info.rotation.is_rotated())
            .unwrap_or(false)
    }
}
