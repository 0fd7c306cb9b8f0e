//! Common types and utilities for the jts lowering engine.
//!
//! This crate provides foundational types used across all jts crates:
//! - Source spans (`Span`)
//! - The lowering error taxonomy (`LoweringError`)
//! - Diagnostics (`Diagnostic`, `DiagnosticCategory`, codes)
//! - Lowering configuration (`LoweringOptions`)
//! - Recursion limits

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Diagnostics reported to the caller
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory};

// Terminal errors of a lowering run
pub mod error;
pub use error::{LoweringError, LoweringResult};

// Configuration shared by every stage
pub mod options;
pub use options::LoweringOptions;

// Centralized limits
pub mod limits;

#[cfg(test)]
#[path = "../tests/options_tests.rs"]
mod options_tests;

#[cfg(test)]
#[path = "../tests/error_tests.rs"]
mod error_tests;
