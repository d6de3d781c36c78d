//! Configuration types and defaults

use texframe_core::{default_libraries, LibrarySpec};

/// Global texframe configuration
#[derive(Debug, Clone)]
pub struct GlobalConfig {
    /// Enable debug logging
    pub debug_logging: bool,
    /// Install the tracing subscriber during initialization
    pub install_logger: bool,
    /// Native libraries loaded before any source is created
    pub native_libraries: Vec<LibrarySpec>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            debug_logging: false,
            install_logger: true,
            native_libraries: default_libraries(),
        }
    }
}

impl GlobalConfig {
    /// Enable or disable debug logging
    pub fn with_debug_logging(mut self, enabled: bool) -> Self {
        self.debug_logging = enabled;
        self
    }

    /// Replace the native library list
    pub fn with_native_libraries(mut self, libraries: Vec<LibrarySpec>) -> Self {
        self.native_libraries = libraries;
        self
    }
}
