//! Fuzz target for the Link header parser.

#![no_main]

use csvlint::parse_link_header;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(header) = std::str::from_utf8(data) {
        if let Ok(links) = parse_link_header(header) {
            for link in &links {
                let _ = link.media_type();
            }
        }
    }
});
