//! Fuzz target for format classification.
//!
//! Regex and date parsing must cope with pathological values.

#![no_main]

use csvlint::FormatClassifier;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10_000 {
        return;
    }
    if let Ok(value) = std::str::from_utf8(data) {
        let _ = FormatClassifier::new().classify(value);
    }
});
