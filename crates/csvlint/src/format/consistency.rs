//! Per-column format profiles and the dominance check.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::diagnostics::{Category, DiagnosticCode, Diagnostics};

use super::classifier::{Format, FormatClassifier};

/// Share of a column's values the most common format must reach.
pub const CONSISTENCY_THRESHOLD: f64 = 0.9;

/// Format occurrence counts per column (0-based index).
///
/// A column appears only once a non-empty value has been seen in it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnFormatProfile {
    columns: BTreeMap<usize, IndexMap<Format, usize>>,
}

impl ColumnFormatProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one observation of `format` in `column`.
    pub fn record(&mut self, column: usize, format: Format) {
        *self
            .columns
            .entry(column)
            .or_default()
            .entry(format)
            .or_insert(0) += 1;
    }

    /// Classify and count every non-empty cell of a data row.
    pub fn record_row(&mut self, classifier: &FormatClassifier, cells: &[String]) {
        for (column, cell) in cells.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            self.record(column, classifier.classify(cell));
        }
    }

    /// Counts for one column, if it has been observed.
    pub fn counts(&self, column: usize) -> Option<&IndexMap<Format, usize>> {
        self.columns.get(&column)
    }

    /// The most common format of a column and its share of observations.
    pub fn dominant(&self, column: usize) -> Option<(Format, f64)> {
        let counts = self.columns.get(&column)?;
        let total: usize = counts.values().sum();
        if total == 0 {
            return None;
        }
        counts
            .iter()
            .max_by_key(|(_, count)| **count)
            .map(|(format, count)| (*format, *count as f64 / total as f64))
    }

    /// Observed column indices in ascending order.
    pub fn columns(&self) -> impl Iterator<Item = usize> + '_ {
        self.columns.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Warn about every observed column whose dominant format falls short of
/// [`CONSISTENCY_THRESHOLD`].
pub fn check_consistency(profile: &ColumnFormatProfile, diagnostics: &mut Diagnostics) {
    for column in profile.columns() {
        let Some((format, share)) = profile.dominant(column) else {
            continue;
        };
        if share < CONSISTENCY_THRESHOLD {
            tracing::debug!(column, %format, share, "inconsistent column");
            diagnostics
                .warning(DiagnosticCode::InconsistentValues, Category::Schema)
                .column = Some(column + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_of(values: &[&str]) -> ColumnFormatProfile {
        let classifier = FormatClassifier::new();
        let mut profile = ColumnFormatProfile::new();
        for value in values {
            profile.record_row(&classifier, &[value.to_string()]);
        }
        profile
    }

    #[test]
    fn test_empty_cells_are_not_counted() {
        let profile = profile_of(&["", "", ""]);
        assert!(profile.is_empty());

        let mut diagnostics = Diagnostics::new();
        check_consistency(&profile, &mut diagnostics);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_dominant_format() {
        let profile = profile_of(&["1", "2", "3", "x"]);
        let (format, share) = profile.dominant(0).unwrap();
        assert_eq!(format, Format::Numeric);
        assert!((share - 0.75).abs() < f64::EPSILON);
        assert_eq!(profile.counts(0).unwrap()[&Format::String], 1);
    }

    #[test]
    fn test_below_threshold_warns() {
        // 8 of 10 numeric: 0.8 < 0.9
        let mut values = vec!["1"; 8];
        values.extend(["a", "b"]);
        let profile = profile_of(&values);

        let mut diagnostics = Diagnostics::new();
        check_consistency(&profile, &mut diagnostics);
        assert_eq!(diagnostics.count(DiagnosticCode::InconsistentValues), 1);
        assert_eq!(diagnostics.iter().next().unwrap().column, Some(1));
    }

    #[test]
    fn test_at_threshold_is_consistent() {
        // 9 of 10 numeric: exactly 0.9
        let mut values = vec!["1"; 9];
        values.push("a");
        let profile = profile_of(&values);

        let mut diagnostics = Diagnostics::new();
        check_consistency(&profile, &mut diagnostics);
        assert!(diagnostics.is_empty());
    }
}
