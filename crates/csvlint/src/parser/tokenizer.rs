//! Strict field tokenizer.
//!
//! Unlike a lenient CSV reader, this refuses anything RFC 4180 does not
//! allow and says why, so malformed rows can be classified.

use thiserror::Error;

use crate::dialect::ParseOptions;

/// Why a row could not be tokenized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    /// A closing quote followed by something other than a delimiter.
    #[error("missing or stray quote")]
    StrayQuote,
    /// A quote inside an unquoted field.
    #[error("illegal quoting")]
    IllegalQuoting,
    /// Input ended inside a quoted field.
    #[error("unclosed quoted field")]
    UnclosedQuote,
    /// A raw line break inside an unquoted field.
    #[error("unquoted fields do not allow \\r or \\n")]
    UnquotedLineBreak,
    #[error("{0}")]
    Other(String),
}

/// Result of tokenizing the text gathered so far for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tokenized {
    /// A complete row.
    Row(Vec<String>),
    /// A quoted field is still open; the next physical line belongs to this row.
    Incomplete,
}

/// Splits one logical row into fields.
#[derive(Debug, Clone)]
pub struct RowTokenizer {
    delimiter: String,
    quote: char,
    misconfigured: Option<String>,
}

impl RowTokenizer {
    pub fn new(options: &ParseOptions) -> Self {
        let misconfigured = if options.delimiter.contains(options.quote_char) {
            Some(format!(
                "quote character {:?} cannot appear in delimiter {:?}",
                options.quote_char, options.delimiter
            ))
        } else {
            None
        };

        Self {
            delimiter: options.delimiter.clone(),
            quote: options.quote_char,
            misconfigured,
        }
    }

    /// Tokenize `text`, which must not include the row's final terminator.
    pub fn tokenize(&self, text: &str) -> Result<Tokenized, TokenizeError> {
        if let Some(ref message) = self.misconfigured {
            return Err(TokenizeError::Other(message.clone()));
        }
        if text.is_empty() {
            return Ok(Tokenized::Row(Vec::new()));
        }

        let mut fields = Vec::new();
        let mut rest = text;

        loop {
            let remainder = if let Some(body) = rest.strip_prefix(self.quote) {
                match self.quoted_field(body) {
                    Some((value, after)) => {
                        fields.push(value);
                        if after.is_empty() {
                            None
                        } else if let Some(next) = after.strip_prefix(self.delimiter.as_str()) {
                            Some(next)
                        } else {
                            return Err(TokenizeError::StrayQuote);
                        }
                    }
                    None => return Ok(Tokenized::Incomplete),
                }
            } else {
                let (field, next) = match rest.find(self.delimiter.as_str()) {
                    Some(i) => (&rest[..i], Some(&rest[i + self.delimiter.len()..])),
                    None => (rest, None),
                };
                if field.contains(self.quote) {
                    return Err(TokenizeError::IllegalQuoting);
                }
                if field.contains(['\r', '\n']) {
                    return Err(TokenizeError::UnquotedLineBreak);
                }
                fields.push(field.to_string());
                next
            };

            match remainder {
                // A trailing delimiter leaves one empty field.
                Some("") => {
                    fields.push(String::new());
                    break;
                }
                Some(next) => rest = next,
                None => break,
            }
        }

        Ok(Tokenized::Row(fields))
    }

    /// Read a quoted field body. Returns the unescaped value and the text
    /// after the closing quote, or `None` if the quote is never closed.
    fn quoted_field<'t>(&self, body: &'t str) -> Option<(String, &'t str)> {
        let mut value = String::new();
        let mut chars = body.char_indices().peekable();

        while let Some((i, c)) = chars.next() {
            if c != self.quote {
                value.push(c);
                continue;
            }
            if matches!(chars.peek(), Some(&(_, next)) if next == self.quote) {
                chars.next();
                value.push(self.quote);
                continue;
            }
            return Some((value, &body[i + c.len_utf8()..]));
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{DialectFragment, resolve_dialect};

    fn tokenizer() -> RowTokenizer {
        let (_, options) = resolve_dialect(None, None, true);
        RowTokenizer::new(&options)
    }

    fn row(text: &str) -> Vec<String> {
        match tokenizer().tokenize(text) {
            Ok(Tokenized::Row(fields)) => fields,
            other => panic!("expected row, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_fields() {
        assert_eq!(row("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(row("a,,c"), vec!["a", "", "c"]);
        assert_eq!(row("a,b,"), vec!["a", "b", ""]);
        assert!(row("").is_empty());
    }

    #[test]
    fn test_quoted_fields() {
        assert_eq!(row(r#""a,b",c"#), vec!["a,b", "c"]);
        assert_eq!(row(r#""say ""hi""",x"#), vec![r#"say "hi""#, "x"]);
        assert_eq!(row("\"line\nbreak\",x"), vec!["line\nbreak", "x"]);
        assert_eq!(row(r#""",x"#), vec!["", "x"]);
    }

    #[test]
    fn test_open_quote_is_incomplete() {
        assert_eq!(tokenizer().tokenize("a,\"open"), Ok(Tokenized::Incomplete));
    }

    #[test]
    fn test_failures() {
        let t = tokenizer();
        assert_eq!(t.tokenize(r#""a"b,c"#), Err(TokenizeError::StrayQuote));
        assert_eq!(t.tokenize(r#""a" ,c"#), Err(TokenizeError::StrayQuote));
        assert_eq!(t.tokenize(r#"a, "b""#), Err(TokenizeError::IllegalQuoting));
        assert_eq!(t.tokenize(r#"a"b,c"#), Err(TokenizeError::IllegalQuoting));
        assert_eq!(t.tokenize("a,b\rc"), Err(TokenizeError::UnquotedLineBreak));
    }

    #[test]
    fn test_space_joined_delimiter() {
        let fragment = DialectFragment::new().with_skip_initial_space(false);
        let (_, options) = resolve_dialect(None, Some(&fragment), true);
        let t = RowTokenizer::new(&options);

        assert_eq!(
            t.tokenize(r#"a, "b""#),
            Ok(Tokenized::Row(vec!["a".to_string(), "b".to_string()]))
        );
    }

    #[test]
    fn test_quote_in_delimiter_is_reported() {
        let fragment = DialectFragment::new().with_delimiter('"');
        let (_, options) = resolve_dialect(None, Some(&fragment), true);
        let t = RowTokenizer::new(&options);

        assert!(matches!(t.tokenize("a"), Err(TokenizeError::Other(_))));
    }
}
