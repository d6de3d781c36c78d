//! Capture device states and the transition table

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Why a device entered the error state
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DeviceFault {
    /// The device list or a device's characteristics could not be read
    #[error("device enumeration failed: {reason}")]
    EnumerationFailed { reason: String },

    /// No enumerated device has the requested facing
    #[error("no device facing {facing}")]
    NoMatchingDevice { facing: String },

    /// Opening the device was refused
    #[error("access to camera {camera_id} denied: {reason}")]
    AccessDenied { camera_id: String, reason: String },

    #[error("capture session negotiation failed: {reason}")]
    SessionNegotiationFailed { reason: String },

    /// Asynchronous error reported by the device
    #[error("device error {code}")]
    DeviceError { code: i32 },
}

/// Lifecycle state of a capture device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CaptureState {
    Closed,
    Opening,
    Open,
    Configuring,
    Previewing,
    Error(DeviceFault),
}

impl CaptureState {
    pub fn name(&self) -> &'static str {
        match self {
            CaptureState::Closed => "CLOSED",
            CaptureState::Opening => "OPENING",
            CaptureState::Open => "OPEN",
            CaptureState::Configuring => "CONFIGURING",
            CaptureState::Previewing => "PREVIEWING",
            CaptureState::Error(_) => "ERROR",
        }
    }

    /// A live device handle exists in this state
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            CaptureState::Open | CaptureState::Configuring | CaptureState::Previewing
        )
    }

    pub fn is_previewing(&self) -> bool {
        matches!(self, CaptureState::Previewing)
    }

    pub fn fault(&self) -> Option<&DeviceFault> {
        match self {
            CaptureState::Error(fault) => Some(fault),
            _ => None,
        }
    }
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureState::Error(fault) => write!(f, "ERROR({fault})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Inputs driving the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureTransition {
    /// `start_camera` was called
    Open,
    /// The device-ready callback arrived
    Opened,
    /// `create_preview` was called
    Configure,
    /// The session accepted the repeating request
    Configured,
    Fail(DeviceFault),
    Disconnected,
    Close,
}

/// Apply a transition. `None` means the input is not valid in `state` and
/// must be discarded.
pub fn next(state: &CaptureState, transition: &CaptureTransition) -> Option<CaptureState> {
    use CaptureState as S;
    use CaptureTransition as T;

    match (state, transition) {
        (S::Closed, T::Open) => Some(S::Opening),
        (S::Opening, T::Opened) => Some(S::Open),
        (S::Open, T::Configure) => Some(S::Configuring),
        (S::Configuring, T::Configured) => Some(S::Previewing),
        (S::Opening | S::Open | S::Configuring | S::Previewing, T::Fail(fault)) => {
            Some(S::Error(fault.clone()))
        }
        (S::Opening | S::Open | S::Configuring | S::Previewing, T::Disconnected) => {
            Some(S::Closed)
        }
        (S::Closed, T::Close) => None,
        (_, T::Close) => Some(S::Closed),
        _ => None,
    }
}

/// Identifies one open attempt; callbacks from older attempts are stale
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Generation(u64);

impl Generation {
    pub fn value(&self) -> u64 {
        self.0
    }

    pub(crate) fn bump(&mut self) -> Generation {
        self.0 += 1;
        *self
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
