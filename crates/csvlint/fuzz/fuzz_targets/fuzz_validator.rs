//! Fuzz target for the row loop.
//!
//! The validator must report malformed input as diagnostics and never panic,
//! whatever the bytes, encoding or line breaks.

#![no_main]

use csvlint::{MockTransport, Source, SourceMetadata, Validator};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Only process reasonable-sized inputs to avoid OOM
    if data.len() > 100_000 {
        return;
    }

    let mut validator = Validator::with_transport(MockTransport::new());
    let _ = validator.validate(&Source::stream(data.to_vec()));

    // Same bytes declared as Latin-1 go down the other decoding path.
    let metadata = SourceMetadata::from_content_type("text/csv; charset=iso-8859-1");
    let _ = validator.validate(&Source::stream_with_metadata(data.to_vec(), metadata));
});
