//! Per-value format inference and per-column consistency.

mod classifier;
mod consistency;

pub use classifier::{Format, FormatClassifier};
pub use consistency::{CONSISTENCY_THRESHOLD, ColumnFormatProfile, check_consistency};
