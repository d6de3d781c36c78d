//! Media capture error types and handling
//!
//! This module defines the error types used by permission checks, capture
//! devices, the surface bridge and frame sources. Device-layer errors are
//! contained inside their device and only surface through logs, events and
//! state; the façade never returns them to the host.

use texframe_core::TexFrameError;
use thiserror::Error;

/// Main error type for capture operations
#[derive(Error, Debug)]
pub enum MediaError {
    /// I/O operation failed
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Invalid configuration provided
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Error message
        message: String,
    },

    /// Source name not recognized
    #[error("Unsupported texture frame source: {name}")]
    UnsupportedSource {
        /// Requested source name
        name: String,
    },

    /// Device enumeration failed
    #[error("Device enumeration failed: {reason}")]
    DeviceEnumerationFailed {
        /// Failure reason
        reason: String,
    },

    /// The device API refused access
    #[error("Camera access error for {camera_id}: {reason}")]
    CameraAccess {
        /// Device identifier
        camera_id: String,
        /// Failure reason
        reason: String,
    },

    /// Capture session configuration rejected
    #[error("Capture session negotiation failed: {reason}")]
    SessionNegotiationFailed {
        /// Failure reason
        reason: String,
    },

    /// Graphics context operation failed
    #[error("Graphics error: {message}")]
    Graphics {
        /// Error message
        message: String,
    },

    /// Media playback failed, as reported by a `MediaPlayer`
    #[error("Playback error: {message}")]
    Playback {
        /// Error message
        message: String,
    },

    /// Resource not available
    #[error("Resource not available: {resource}")]
    ResourceNotAvailable {
        /// Resource name
        resource: String,
    },

    /// Invalid state for operation
    #[error("Invalid state: {message}")]
    InvalidState {
        /// State error message
        message: String,
    },

    /// Surface has been released
    #[error("Surface {surface_id} has been released")]
    SurfaceReleased {
        /// Surface identifier
        surface_id: u64,
    },

    /// Core configuration or initialization error
    #[error(transparent)]
    Core(#[from] TexFrameError),
}

/// Result type alias for media operations
pub type MediaResult<T> = Result<T, MediaError>;

impl MediaError {
    /// Check if error is recoverable by calling `start()` again
    pub fn is_recoverable(&self) -> bool {
        match self {
            MediaError::Io { .. } => true,
            MediaError::CameraAccess { .. } => true,
            MediaError::ResourceNotAvailable { .. } => true,
            MediaError::SessionNegotiationFailed { .. } => true,
            MediaError::InvalidConfiguration { .. } => false,
            MediaError::UnsupportedSource { .. } => false,
            MediaError::Core(_) => false,
            _ => false,
        }
    }

    /// Get error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            MediaError::Io { .. } => ErrorCategory::System,
            MediaError::InvalidConfiguration { .. } => ErrorCategory::Configuration,
            MediaError::UnsupportedSource { .. } => ErrorCategory::Configuration,
            MediaError::DeviceEnumerationFailed { .. } => ErrorCategory::Device,
            MediaError::CameraAccess { .. } => ErrorCategory::Device,
            MediaError::SessionNegotiationFailed { .. } => ErrorCategory::Session,
            MediaError::Graphics { .. } => ErrorCategory::Graphics,
            MediaError::Playback { .. } => ErrorCategory::Playback,
            MediaError::ResourceNotAvailable { .. } => ErrorCategory::System,
            MediaError::InvalidState { .. } => ErrorCategory::State,
            MediaError::SurfaceReleased { .. } => ErrorCategory::Graphics,
            MediaError::Core(TexFrameError::NativeLibrary { .. }) => ErrorCategory::System,
            MediaError::Core(_) => ErrorCategory::Configuration,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// System-level errors (I/O, missing services, etc.)
    System,
    /// Configuration and parameter errors
    Configuration,
    /// Device and hardware errors
    Device,
    /// Capture session errors
    Session,
    /// Graphics context and texture errors
    Graphics,
    /// File playback errors
    Playback,
    /// State management errors
    State,
}
