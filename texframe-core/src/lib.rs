//! # texframe core
//!
//! Process-level building blocks shared by every texframe crate: the flat
//! option bundle consumed by frame sources, the core error type, and the
//! explicit one-shot loading of the native graph engine libraries.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod native;
pub mod options;

// Re-export main types
pub use error::TexFrameError;
pub use native::{default_libraries, LibrarySpec, NativeLibraryLoader, NativeRuntime};
pub use options::{keys, OptionValue, Options};
