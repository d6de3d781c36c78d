//! # texframe diagnostics
//!
//! Debugging and diagnostic tools for texframe.
//! Provides structured logging setup and serializable frame source reports.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod debug_logger;
pub mod source_report;

// Re-export main types
pub use debug_logger::DebugLogger;
pub use source_report::SourceReport;
