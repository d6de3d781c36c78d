//! # texframe media
//!
//! Capture of camera and media-file video into GPU texture frames.
//! This crate holds the permission gate, the capture device state machine
//! and its drivers, the frame surface bridge that converts raw frames into
//! pooled textures, the viewport sizing rule and the frame source façade
//! the host depends on.

#![warn(clippy::all)]

pub mod bridge;
pub mod consumer;
pub mod device;
pub mod error;
pub mod host;
pub mod permission;
pub mod platform;
pub mod source;
pub mod stats;
pub mod surface;
pub mod viewport;

// Re-export main types
pub use bridge::{BridgeConfig, FrameSurfaceBridge, SurfaceBinding, TextureFrame, DEFAULT_NUM_BUFFERS};
pub use consumer::{frame_stream, FrameStream, FrameStreamSender, TextureFrameConsumer, TextureFrameProducer};
pub use device::{
    BackgroundExecutor, Camera2Device, CameraSelector, CameraXDevice, CaptureDevice, CaptureState,
    CaptureTransition, DeviceEvent, DeviceFacing, DeviceFault, Generation, OnCameraStartedListener,
};
pub use error::{ErrorCategory, MediaError, MediaResult};
pub use host::{ForegroundContext, TextureFrameHost};
pub use permission::{Permission, PermissionGate, PermissionResolver, PermissionStatus, PERMISSION_REQUEST_CODE};
pub use platform::{
    CameraCharacteristics, CameraDeviceHandle, CameraInfo, CameraManager, CameraProvider,
    CaptureRequest, CaptureSessionHandle, DeviceStateCallback, GraphicsContext, LensFacing,
    MediaPlayer, MediaPlayerFactory, PreviewBinding, PreviewStateCallback, SessionStateCallback,
    TextureName,
};
pub use source::{
    build_texture_frame_source, CameraTextureFrameSource, MediaPlayerTextureFrameSource,
    SourceKind, TextureFrameSource,
};
pub use stats::SourceStats;
pub use surface::{DestinationSurface, FrameAvailableListener, RawFrame, SurfaceOrigin};
pub use viewport::{compute_display_size, FrameInfo, RotationState, Size};
