//! Diagnostic events produced by a validation run.

mod collector;
mod diagnostic;

pub use collector::Diagnostics;
pub use diagnostic::{Category, Diagnostic, DiagnosticCode, Severity};
