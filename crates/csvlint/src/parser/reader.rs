//! Physical line splitting and per-line decoding.

use encoding_rs::{Encoding, UTF_8};

use crate::dialect::LineTerminator;

/// The RFC 4180 line terminator.
pub const CRLF: &str = "\r\n";

/// Bytes that do not decode in the source encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeFailure;

enum Lines<'a> {
    /// ASCII-compatible encodings are split on raw bytes and decoded per line.
    Bytes {
        body: &'a [u8],
        pos: usize,
        encoding: &'static Encoding,
    },
    /// Other encodings are decoded up front.
    Text { text: String, pos: usize },
    /// The body could not be decoded at all.
    Undecodable,
    Done,
}

/// Yields physical lines, each including its terminator when present.
pub struct LineReader<'a> {
    lines: Lines<'a>,
    terminator: String,
    detected: Option<String>,
    line_breaks: Vec<String>,
}

impl<'a> LineReader<'a> {
    /// Prepare to read `body`.
    ///
    /// `charset` is the declared encoding label; a byte order mark overrides
    /// it and unknown labels fall back to UTF-8.
    pub fn new(
        body: &'a [u8],
        charset: Option<&str>,
        line_terminator: &LineTerminator,
        quote_char: char,
    ) -> Self {
        let declared = match charset {
            Some(label) => Encoding::for_label(label.trim().as_bytes()).unwrap_or_else(|| {
                tracing::warn!(charset = label, "unknown charset, decoding as UTF-8");
                UTF_8
            }),
            None => UTF_8,
        };
        let (encoding, bom_len) = Encoding::for_bom(body).unwrap_or((declared, 0));
        let body = &body[bom_len..];

        let quote = quote_char.is_ascii().then_some(quote_char as u8);
        let (lines, line_breaks) = if encoding.is_ascii_compatible() {
            let breaks = scan_line_breaks(body, quote);
            (
                Lines::Bytes {
                    body,
                    pos: 0,
                    encoding,
                },
                breaks,
            )
        } else {
            match encoding.decode_without_bom_handling_and_without_replacement(body) {
                Some(text) => {
                    let breaks = scan_line_breaks(text.as_bytes(), quote);
                    (
                        Lines::Text {
                            text: text.into_owned(),
                            pos: 0,
                        },
                        breaks,
                    )
                }
                None => (Lines::Undecodable, Vec::new()),
            }
        };

        let detected = match line_terminator {
            LineTerminator::Literal(literal) => Some(literal.clone()),
            LineTerminator::Auto => line_breaks.first().cloned(),
        };
        let terminator = detected.clone().unwrap_or_else(|| "\n".to_string());

        Self {
            lines,
            terminator,
            detected,
            line_breaks,
        }
    }

    /// Terminator rows are split on.
    pub fn terminator(&self) -> &str {
        &self.terminator
    }

    /// The terminator actually in use, if the body has one or the dialect
    /// names one.
    pub fn detected_terminator(&self) -> Option<&str> {
        self.detected.as_deref()
    }

    /// Distinct line breaks found outside quoted fields, in order of first
    /// appearance.
    pub fn line_breaks(&self) -> &[String] {
        &self.line_breaks
    }
}

impl Iterator for LineReader<'_> {
    type Item = Result<String, DecodeFailure>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.lines {
            Lines::Bytes {
                body,
                pos,
                encoding,
            } => {
                if *pos >= body.len() {
                    return None;
                }
                let rest = &body[*pos..];
                let end = find_subslice(rest, self.terminator.as_bytes())
                    .map(|i| i + self.terminator.len())
                    .unwrap_or(rest.len());
                *pos += end;

                let decoded = encoding
                    .decode_without_bom_handling_and_without_replacement(&rest[..end])
                    .map(|text| text.into_owned())
                    .ok_or(DecodeFailure);
                Some(decoded)
            }
            Lines::Text { text, pos } => {
                if *pos >= text.len() {
                    return None;
                }
                let rest = &text[*pos..];
                let end = rest
                    .find(self.terminator.as_str())
                    .map(|i| i + self.terminator.len())
                    .unwrap_or(rest.len());
                let line = rest[..end].to_string();
                *pos += end;
                Some(Ok(line))
            }
            Lines::Undecodable => {
                self.lines = Lines::Done;
                Some(Err(DecodeFailure))
            }
            Lines::Done => None,
        }
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Collect the distinct line breaks that occur outside quoted fields.
fn scan_line_breaks(bytes: &[u8], quote: Option<u8>) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let mut in_quotes = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let brk = if Some(b) == quote {
            in_quotes = !in_quotes;
            None
        } else if in_quotes {
            None
        } else if b == b'\r' {
            if bytes.get(i + 1) == Some(&b'\n') {
                i += 1;
                Some(CRLF)
            } else {
                Some("\r")
            }
        } else if b == b'\n' {
            Some("\n")
        } else {
            None
        };

        if let Some(brk) = brk {
            if !found.iter().any(|f| f == brk) {
                found.push(brk.to_string());
            }
        }
        i += 1;
    }

    found
}
