//! Utility modules
//!
//! This module contains utilities and helpers:
//! - Diagnostics and error reporting
//! - Error types and result types
//! - Offset to line/column mapping

pub mod diagnostics;
pub mod error;
pub mod position;

// Re-export commonly used items
pub use diagnostics::{
    check_latex, check_latex_with_options, format_diagnostics, CheckResult, Diagnostic,
    DiagnosticLevel,
};
pub use error::{ParseWarning, TexError, TexResult};
pub use position::{LineIndex, Location};
