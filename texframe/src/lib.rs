//! # texframe
//!
//! Texture frame sources for feeding camera and media-file video into a
//! native graph engine. A source acquires a hardware camera (directly or
//! through a camera selection library) or plays a media file, converts each
//! frame into a pooled GPU texture and pushes it to a single consumer.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use texframe::{Options, PreviewController, PreviewDisplay, TexFrame, TextureFrameHost};
//!
//! # fn example(
//! #     host: Arc<dyn TextureFrameHost>,
//! #     loader: &dyn texframe::NativeLibraryLoader,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! // Load the native libraries once per process
//! let texframe = TexFrame::init(loader)?;
//!
//! let options = Options::from_json_str(r#"{"textureFrameSource": "Camera2"}"#)?;
//! let display = Arc::new(PreviewDisplay::new());
//! let mut preview = texframe.preview(host, display, options);
//!
//! preview.resume()?;
//! preview.on_display_surface_changed(1080, 1920);
//! preview.pause();
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

// Re-export core types for easy access
pub use texframe_core::{
    default_libraries, keys, LibrarySpec, NativeLibraryLoader, NativeRuntime, OptionValue,
    Options, TexFrameError,
};

pub use texframe_media::{
    build_texture_frame_source, frame_stream, CaptureState, DestinationSurface, DeviceEvent,
    DeviceFacing, DeviceFault, ErrorCategory, ForegroundContext, FrameStream, GraphicsContext,
    MediaError, MediaResult, Permission, PermissionResolver, PermissionStatus, Size, SourceKind,
    SourceStats, TextureFrame, TextureFrameConsumer, TextureFrameHost, TextureFrameProducer,
    TextureFrameSource,
};

#[cfg(feature = "diagnostics")]
pub use texframe_diagnostics::{DebugLogger, SourceReport};

// Public API modules
pub mod config;
pub mod lifecycle;

// Re-export main API types
pub use config::GlobalConfig;
pub use lifecycle::{PreviewController, PreviewDisplay};

use std::sync::Arc;

/// Main entry point for texframe
#[derive(Debug, Clone)]
pub struct TexFrame {
    inner: Arc<TexFrameInner>,
}

#[derive(Debug)]
struct TexFrameInner {
    config: GlobalConfig,
    loaded_libraries: Vec<String>,
}

impl TexFrame {
    /// Initialize texframe with default settings
    pub fn init(loader: &dyn NativeLibraryLoader) -> Result<Self, TexFrameError> {
        Self::init_with(GlobalConfig::default(), loader)
    }

    /// Initialize with custom global configuration
    pub fn init_with(
        config: GlobalConfig,
        loader: &dyn NativeLibraryLoader,
    ) -> Result<Self, TexFrameError> {
        Self::init_on(NativeRuntime::global(), config, loader)
    }

    /// Initialize against a specific native runtime instead of the
    /// process-wide one
    pub fn init_on(
        runtime: &NativeRuntime,
        config: GlobalConfig,
        loader: &dyn NativeLibraryLoader,
    ) -> Result<Self, TexFrameError> {
        #[cfg(feature = "diagnostics")]
        if config.install_logger {
            DebugLogger::new(config.debug_logging).install();
        }

        let loaded_libraries = runtime.initialize(loader, &config.native_libraries)?;
        tracing::info!(libraries = ?loaded_libraries, "texframe initialized");
        Ok(Self {
            inner: Arc::new(TexFrameInner {
                config,
                loaded_libraries,
            }),
        })
    }

    /// The configuration used at initialization
    pub fn config(&self) -> &GlobalConfig {
        &self.inner.config
    }

    /// Library names that were loaded, fallbacks included
    pub fn loaded_libraries(&self) -> &[String] {
        &self.inner.loaded_libraries
    }

    /// Create the source named by the `textureFrameSource` option
    pub fn create_source(
        &self,
        host: &Arc<dyn TextureFrameHost>,
        options: &Options,
    ) -> MediaResult<Box<dyn TextureFrameSource>> {
        build_texture_frame_source(host, options)
    }

    /// Lifecycle controller for a preview backed by `host`
    pub fn preview(
        &self,
        host: Arc<dyn TextureFrameHost>,
        display: Arc<PreviewDisplay>,
        options: Options,
    ) -> PreviewController {
        PreviewController::new(host, display, options)
    }
}
