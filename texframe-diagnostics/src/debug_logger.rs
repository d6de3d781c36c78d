//! Structured debug logging system

use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::EnvFilter;

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Default filter when `RUST_LOG` is unset
const DEFAULT_DIRECTIVE: &str = "info";
/// Default filter with debug logging enabled
const DEBUG_DIRECTIVE: &str = "info,texframe=debug,texframe_core=debug,texframe_media=debug";

/// Debug logger for structured logging
#[derive(Debug, Clone, Default)]
pub struct DebugLogger {
    debug: bool,
}

impl DebugLogger {
    /// Create new debug logger
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }

    /// Filter directive used when `RUST_LOG` is unset
    pub fn default_directive(&self) -> &'static str {
        if self.debug {
            DEBUG_DIRECTIVE
        } else {
            DEFAULT_DIRECTIVE
        }
    }

    /// Build the filter: `RUST_LOG` wins, otherwise the default directive
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.default_directive()))
    }

    /// Install the global subscriber.
    ///
    /// Returns false when a subscriber was already installed, by this logger
    /// or by the application.
    pub fn install(&self) -> bool {
        let installed = tracing_subscriber::fmt()
            .with_env_filter(self.env_filter())
            .with_target(true)
            .try_init()
            .is_ok();
        if installed {
            INSTALLED.store(true, Ordering::SeqCst);
            tracing::debug!(debug = self.debug, "Logging initialized");
        }
        installed
    }

    /// Initialize logging system with default verbosity
    pub fn init_logging() -> bool {
        Self::default().install()
    }

    /// Whether this logger installed the global subscriber
    pub fn is_installed() -> bool {
        INSTALLED.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(DebugLogger::new(false).default_directive(), "info");
        assert!(DebugLogger::new(true)
            .default_directive()
            .contains("texframe_media=debug"));
    }

    #[test]
    fn test_install_is_idempotent() {
        let first = DebugLogger::new(true).install();
        let second = DebugLogger::init_logging();
        assert!(!second);
        if first {
            assert!(DebugLogger::is_installed());
        }
    }
}
