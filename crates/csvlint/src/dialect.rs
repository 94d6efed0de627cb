//! CSV dialects and their resolution into parse options.
//!
//! A dialect is resolved by layering, key by key:
//!
//! 1. built-in defaults,
//! 2. the dialect declared by a bound schema for this source's table,
//! 3. the dialect supplied explicitly by the caller.
//!
//! Later layers win for every key they set.

use serde::{Deserialize, Serialize};

/// How rows are terminated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LineTerminator {
    /// Detect from the first terminator in the body.
    Auto,
    /// A fixed terminator sequence.
    Literal(String),
}

impl From<String> for LineTerminator {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("auto") || value.is_empty() {
            LineTerminator::Auto
        } else {
            LineTerminator::Literal(value)
        }
    }
}

impl From<LineTerminator> for String {
    fn from(value: LineTerminator) -> Self {
        match value {
            LineTerminator::Auto => "auto".to_string(),
            LineTerminator::Literal(s) => s,
        }
    }
}

/// A fully populated dialect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dialect {
    pub header: bool,
    pub delimiter: char,
    pub skip_initial_space: bool,
    pub line_terminator: LineTerminator,
    pub quote_char: char,
    pub trim: bool,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            header: true,
            delimiter: ',',
            skip_initial_space: true,
            line_terminator: LineTerminator::Auto,
            quote_char: '"',
            trim: true,
        }
    }
}

impl Dialect {
    /// Apply every key present in `fragment` over this dialect.
    pub fn merge(&mut self, fragment: &DialectFragment) {
        if let Some(header) = fragment.header {
            self.header = header;
        }
        if let Some(delimiter) = fragment.delimiter {
            self.delimiter = delimiter;
        }
        if let Some(skip) = fragment.skip_initial_space {
            self.skip_initial_space = skip;
        }
        if let Some(ref terminator) = fragment.line_terminator {
            self.line_terminator = terminator.clone();
        }
        if let Some(quote) = fragment.quote_char {
            self.quote_char = quote;
        }
        if let Some(trim) = fragment.trim {
            self.trim = trim;
        }
    }
}

/// A partial dialect, as declared by a schema or supplied by a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialectFragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_initial_space: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_terminator: Option<LineTerminator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_char: Option<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim: Option<bool>,
}

impl DialectFragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, header: bool) -> Self {
        self.header = Some(header);
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_skip_initial_space(mut self, skip: bool) -> Self {
        self.skip_initial_space = Some(skip);
        self
    }

    pub fn with_line_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.line_terminator = Some(LineTerminator::from(terminator.into()));
        self
    }

    pub fn with_quote_char(mut self, quote: char) -> Self {
        self.quote_char = Some(quote);
        self
    }

    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = Some(trim);
        self
    }

    /// Parse a fragment from CSVW-style JSON.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Low-level options handed to the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Whether the first row is a header.
    pub header: bool,
    /// Field separator; may be longer than one character.
    pub delimiter: String,
    pub quote_char: char,
    pub line_terminator: LineTerminator,
    /// Trim header names.
    pub trim: bool,
}

/// Resolve the effective dialect.
///
/// `header_inferred` is the header presence derived from transport metadata;
/// the effective header flag requires both it and the dialect to agree.
pub fn resolve_dialect(
    schema_dialect: Option<&DialectFragment>,
    explicit_dialect: Option<&DialectFragment>,
    header_inferred: bool,
) -> (Dialect, ParseOptions) {
    let mut dialect = Dialect::default();
    if let Some(fragment) = schema_dialect {
        dialect.merge(fragment);
    }
    if let Some(fragment) = explicit_dialect {
        dialect.merge(fragment);
    }

    // Without skipInitialSpace a following space is part of the separator.
    let mut delimiter = dialect.delimiter.to_string();
    if !dialect.skip_initial_space {
        delimiter.push(' ');
    }

    let options = ParseOptions {
        header: dialect.header && header_inferred,
        delimiter,
        quote_char: dialect.quote_char,
        line_terminator: dialect.line_terminator.clone(),
        trim: dialect.trim,
    };

    tracing::debug!(?dialect, header = options.header, "resolved dialect");
    (dialect, options)
}
