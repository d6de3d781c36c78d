//! Explicit native runtime initialization
//!
//! The native graph engine and its support libraries must be loaded before
//! any frame source is created. Loading happens once per [`NativeRuntime`];
//! repeated calls return the first outcome.

use crate::error::TexFrameError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Loads a single shared library by name
pub trait NativeLibraryLoader: Send + Sync {
    /// Load the library; the error string is the loader's message
    fn load_library(&self, name: &str) -> Result<(), String>;
}

/// A library to load, with alternates tried in order when it is missing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibrarySpec {
    /// Primary library name
    pub name: String,
    /// Alternates tried in order after the primary fails
    pub fallbacks: Vec<String>,
}

impl LibrarySpec {
    /// Library with no alternates
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fallbacks: Vec::new(),
        }
    }

    /// Add an alternate name
    pub fn or(mut self, fallback: &str) -> Self {
        self.fallbacks.push(fallback.to_string());
        self
    }

    fn candidates(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.fallbacks.iter().map(String::as_str))
    }
}

/// Libraries needed by the graph engine
pub fn default_libraries() -> Vec<LibrarySpec> {
    vec![
        LibrarySpec::new("mediapipe_jni"),
        LibrarySpec::new("opencv_java3").or("opencv_java4"),
    ]
}

/// One-shot native initialization with a readiness flag
#[derive(Debug, Default)]
pub struct NativeRuntime {
    outcome: Mutex<Option<Result<Vec<String>, TexFrameError>>>,
    ready: AtomicBool,
}

impl NativeRuntime {
    /// Create a runtime that has not loaded anything yet
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide runtime
    pub fn global() -> &'static NativeRuntime {
        static GLOBAL: OnceLock<NativeRuntime> = OnceLock::new();
        GLOBAL.get_or_init(NativeRuntime::new)
    }

    /// Load every library once; later calls return the first outcome.
    ///
    /// On success returns the names that were actually loaded, which may be
    /// fallbacks.
    pub fn initialize(
        &self,
        loader: &dyn NativeLibraryLoader,
        libraries: &[LibrarySpec],
    ) -> Result<Vec<String>, TexFrameError> {
        let mut outcome = self.outcome.lock();
        if let Some(previous) = outcome.as_ref() {
            debug!("Native runtime already initialized");
            return previous.clone();
        }

        let result = Self::load_all(loader, libraries);
        if let Ok(loaded) = &result {
            info!(libraries = ?loaded, "Native runtime ready");
            self.ready.store(true, Ordering::Release);
        }
        *outcome = Some(result.clone());
        result
    }

    /// Whether initialization completed successfully
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn load_all(
        loader: &dyn NativeLibraryLoader,
        libraries: &[LibrarySpec],
    ) -> Result<Vec<String>, TexFrameError> {
        let mut loaded = Vec::with_capacity(libraries.len());
        for spec in libraries {
            let mut last_error = String::new();
            let mut found = None;
            for candidate in spec.candidates() {
                match loader.load_library(candidate) {
                    Ok(()) => {
                        found = Some(candidate.to_string());
                        break;
                    }
                    Err(e) => {
                        warn!(library = candidate, error = %e, "Native library failed to load");
                        last_error = e;
                    }
                }
            }
            match found {
                Some(name) => loaded.push(name),
                None => {
                    return Err(TexFrameError::NativeLibrary {
                        name: spec.name.clone(),
                        reason: last_error,
                    })
                }
            }
        }
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::AtomicUsize;

    struct FakeLoader {
        available: HashSet<&'static str>,
        calls: AtomicUsize,
    }

    impl FakeLoader {
        fn new(available: &[&'static str]) -> Self {
            Self {
                available: available.iter().copied().collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl NativeLibraryLoader for FakeLoader {
        fn load_library(&self, name: &str) -> Result<(), String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.available.contains(name) {
                Ok(())
            } else {
                Err(format!("dlopen failed: lib{}.so not found", name))
            }
        }
    }

    #[test]
    fn test_fallback_library_is_used() {
        let loader = FakeLoader::new(&["mediapipe_jni", "opencv_java4"]);
        let runtime = NativeRuntime::new();

        let loaded = runtime.initialize(&loader, &default_libraries()).unwrap();

        assert_eq!(loaded, vec!["mediapipe_jni", "opencv_java4"]);
        assert!(runtime.is_ready());
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let loader = FakeLoader::new(&["mediapipe_jni", "opencv_java3"]);
        let runtime = NativeRuntime::new();

        runtime.initialize(&loader, &default_libraries()).unwrap();
        let calls = loader.calls.load(Ordering::SeqCst);
        runtime.initialize(&loader, &default_libraries()).unwrap();

        assert_eq!(loader.calls.load(Ordering::SeqCst), calls);
    }

    #[test]
    fn test_missing_library_is_reported() {
        let loader = FakeLoader::new(&["mediapipe_jni"]);
        let runtime = NativeRuntime::new();

        let err = runtime.initialize(&loader, &default_libraries()).unwrap_err();

        match err {
            TexFrameError::NativeLibrary { name, reason } => {
                assert_eq!(name, "opencv_java3");
                assert!(reason.contains("opencv_java4"));
            }
            other => panic!("Expected NativeLibrary error, got {:?}", other),
        }
        assert!(!runtime.is_ready());
    }
}
