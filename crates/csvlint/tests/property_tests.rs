//! Property-based tests for csvlint.
//!
//! These tests use proptest to generate random inputs and verify that the
//! classifier, the consistency check and the row loop keep their invariants.
//!
//! # Running Property Tests
//!
//! ```bash
//! # Run all property tests
//! cargo test -p csvlint --test property_tests
//!
//! # Run with more cases (slower but more thorough)
//! PROPTEST_CASES=10000 cargo test -p csvlint --test property_tests
//! ```

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use proptest::prelude::*;

use csvlint::dialect::{Dialect, resolve_dialect};
use csvlint::format::{ColumnFormatProfile, Format, FormatClassifier, check_consistency};
use csvlint::{DiagnosticCode, DialectFragment, Diagnostics, MockTransport, Source, Validator};

// =============================================================================
// Test Strategies
// =============================================================================

/// Strings shaped like the dated formats, valid or not.
fn date_like() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]{4}-[0-9]{2}-[0-9]{2}",
        "[0-9]{1,2} (Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec|Foo) [0-9]{4}",
        "(January|February|March|April|June|Smarch) [0-9]{1,2}, [0-9]{4}",
        "[0-9]{2}:[0-9]{2}",
        "[0-9]{2}:[0-9]{2}:[0-9]{2}",
        "[0-9]{4}-[0-9]{2}-[0-9]{2} [0-9]{2}:[0-9]{2}:[0-9]{2}",
        "[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}Z",
        "(January|March|Smarch) [0-9]{2}, [0-9]{4} [0-9]{2}:[0-9]{2}",
        "[0-9]{1,2} (Jan|Feb|Mar|Jun|Dec|Foo)",
        "[0-9]{2} (Jan|Feb|Apr|Foo) [0-9]{2}:[0-9]{2}",
        Just("29 Feb".to_string()),
        Just("31 Feb".to_string()),
        Just("00 Jan".to_string()),
        Just("29 Feb 23:59".to_string()),
    ]
}

fn valid_date() -> impl Strategy<Value = NaiveDate> {
    (1000i32..=9999, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

/// Leap year used to parse values that carry no year.
const LEAP_YEAR: &str = "2000";

/// Re-render `value` with the pattern of its dated format.
fn reformat(format: Format, value: &str) -> Option<String> {
    let pattern = match format {
        Format::DateShort => "%-d %b",
        Format::DatetimeShort => "%d %b %H:%M",
        Format::DateDb => "%Y-%m-%d",
        Format::DateRfc822 => "%-d %b %Y",
        Format::DateLong => "%B %-d, %Y",
        Format::TimeHm => "%H:%M",
        Format::TimeHms => "%H:%M:%S",
        Format::DatetimeDb => "%Y-%m-%d %H:%M:%S",
        Format::DatetimeIso8601 => "%Y-%m-%dT%H:%M:%SZ",
        Format::DatetimeLong => "%B %d, %Y %H:%M",
        _ => return None,
    };
    let with_year = format!("{} {}", value, LEAP_YEAR);
    let pattern_with_year = format!("{} %Y", pattern);
    let rendered = match format {
        Format::DateShort => NaiveDate::parse_from_str(&with_year, &pattern_with_year)
            .ok()?
            .format(pattern)
            .to_string(),
        Format::DatetimeShort => NaiveDateTime::parse_from_str(&with_year, &pattern_with_year)
            .ok()?
            .format(pattern)
            .to_string(),
        Format::TimeHm | Format::TimeHms => NaiveTime::parse_from_str(value, pattern)
            .ok()?
            .format(pattern)
            .to_string(),
        Format::DatetimeDb | Format::DatetimeIso8601 | Format::DatetimeLong => {
            NaiveDateTime::parse_from_str(value, pattern)
                .ok()?
                .format(pattern)
                .to_string()
        }
        _ => NaiveDate::parse_from_str(value, pattern)
            .ok()?
            .format(pattern)
            .to_string(),
    };
    Some(rendered)
}

// =============================================================================
// Format Classification
// =============================================================================

proptest! {
    /// Anything accepted into a dated category re-renders to itself.
    #[test]
    fn accepted_dates_round_trip(value in date_like()) {
        let format = FormatClassifier::new().classify(&value);
        if let Some(rendered) = reformat(format, &value) {
            prop_assert_eq!(rendered, value);
        }
    }

    #[test]
    fn real_dates_are_recognised(date in valid_date()) {
        let classifier = FormatClassifier::new();
        prop_assert_eq!(classifier.classify(&date.format("%Y-%m-%d").to_string()), Format::DateDb);
        prop_assert_eq!(classifier.classify(&date.format("%-d %b %Y").to_string()), Format::DateRfc822);
        prop_assert_eq!(
            classifier.classify(&date.format("%Y-%m-%dT12:30:00Z").to_string()),
            Format::DatetimeIso8601
        );
    }

    #[test]
    fn real_days_without_year_are_recognised(date in valid_date(), hour in 0u32..24, minute in 0u32..60) {
        let classifier = FormatClassifier::new();
        prop_assert_eq!(classifier.classify(&date.format("%-d %b").to_string()), Format::DateShort);
        let stamp = format!("{} {:02}:{:02}", date.format("%d %b"), hour, minute);
        prop_assert_eq!(classifier.classify(&stamp), Format::DatetimeShort);
    }

    #[test]
    fn integers_are_numeric(n in any::<i64>()) {
        prop_assert_eq!(FormatClassifier::new().classify(&n.to_string()), Format::Numeric);
    }

    #[test]
    fn classify_never_panics(value in "\\PC{0,40}") {
        let _ = FormatClassifier::new().classify(&value);
    }
}

#[test]
fn yearless_dates_use_a_leap_year() {
    let classifier = FormatClassifier::new();
    assert_eq!(classifier.classify("29 Feb"), Format::DateShort);
    assert_eq!(classifier.classify("29 Feb 23:59"), Format::DatetimeShort);
    assert_ne!(classifier.classify("31 Feb"), Format::DateShort);
    assert_ne!(classifier.classify("00 Jan"), Format::DateShort);
}

// =============================================================================
// Consistency Threshold
// =============================================================================

proptest! {
    /// A column warns exactly when its dominant share is below 0.9.
    #[test]
    fn threshold_decides_warning(n in 1usize..60, k_seed in 0usize..60) {
        let k = k_seed % (n + 1);
        let mut profile = ColumnFormatProfile::new();
        for _ in 0..k {
            profile.record(0, Format::Numeric);
        }
        for _ in k..n {
            profile.record(0, Format::String);
        }

        let mut diagnostics = Diagnostics::new();
        check_consistency(&profile, &mut diagnostics);

        let dominant = k.max(n - k) as f64 / n as f64;
        let warned = diagnostics.count(DiagnosticCode::InconsistentValues);
        prop_assert_eq!(warned, usize::from(dominant < 0.9));
    }
}

// =============================================================================
// Row Loop
// =============================================================================

proptest! {
    /// One odd-width row after the first data row yields exactly one
    /// ragged_rows error, at that row.
    #[test]
    fn one_ragged_row(rows in 2usize..20, odd_seed in 1usize..20, width in 1usize..6) {
        prop_assume!(width != 3);
        let odd = 1 + odd_seed % (rows - 1);

        let mut body = String::from("a,b,c\r\n");
        for i in 0..rows {
            let cells = if i == odd { width } else { 3 };
            let row: Vec<String> = (0..cells).map(|c| (i * 10 + c).to_string()).collect();
            body.push_str(&row.join(","));
            body.push_str("\r\n");
        }

        let mut validator = Validator::with_transport(MockTransport::new());
        let report = validator.validate(&Source::stream(body));

        let ragged: Vec<_> = report
            .errors()
            .filter(|d| d.code == DiagnosticCode::RaggedRows)
            .map(|d| d.row)
            .collect();
        prop_assert_eq!(ragged, vec![Some(odd + 2)]);
        prop_assert_eq!(report.expected_columns, 3);
    }

    /// Arbitrary bytes never panic and never report invalid_encoding twice.
    #[test]
    fn validator_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let mut validator = Validator::with_transport(MockTransport::new());
        let report = validator.validate(&Source::stream(bytes));

        prop_assert!(report.diagnostics.count(DiagnosticCode::InvalidEncoding) <= 1);
        prop_assert!(report.row_count <= validator.rows().len());
    }
}

// =============================================================================
// Dialect Resolution
// =============================================================================

#[test]
fn defaults_without_overrides() {
    let (dialect, options) = resolve_dialect(None, None, true);
    assert_eq!(dialect, Dialect::default());
    assert!(options.header);
    assert_eq!(options.delimiter, ",");
    assert_eq!(options.quote_char, '"');
}

proptest! {
    #[test]
    fn explicit_delimiter_wins(schema in "[,;|\t]", explicit in "[,;|\t]") {
        let schema = DialectFragment::new().with_delimiter(schema.chars().next().unwrap());
        let explicit_char = explicit.chars().next().unwrap();
        let explicit = DialectFragment::new().with_delimiter(explicit_char);

        let (dialect, _) = resolve_dialect(Some(&schema), Some(&explicit), true);
        prop_assert_eq!(dialect.delimiter, explicit_char);
        prop_assert!(dialect.header && dialect.trim && dialect.skip_initial_space);
    }
}
