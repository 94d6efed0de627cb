//! Parser for HTTP `Link` header field values.
//!
//! Grammar (RFC 8288, simplified):
//!
//! ```text
//! Link       = #link-value
//! link-value = "<" URI-Reference ">" *( OWS ";" OWS link-param )
//! link-param = token BWS [ "=" BWS ( token / quoted-string ) ]
//! ```
//!
//! The `rel` parameter holds one or more space-separated relation types.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A syntax error in a Link header value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed Link header at offset {offset}: {message}")]
pub struct LinkHeaderError {
    pub offset: usize,
    pub message: String,
}

/// One link parsed out of a Link header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRelation {
    /// Target URI reference, unresolved.
    pub uri: String,
    /// Relation types, lowercased.
    pub rel: Vec<String>,
    /// All parameters by lowercased name; the first occurrence wins.
    pub params: IndexMap<String, String>,
}

impl LinkRelation {
    /// Whether this link carries relation type `rel`.
    pub fn has_rel(&self, rel: &str) -> bool {
        self.rel.iter().any(|r| r.eq_ignore_ascii_case(rel))
    }

    /// Parameter value by name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The `type` parameter without media type parameters.
    pub fn media_type(&self) -> Option<&str> {
        self.param("type")
            .and_then(|t| t.split(';').next())
            .map(str::trim)
    }

    pub fn title(&self) -> Option<&str> {
        self.param("title")
    }
}

/// Parse one Link header field value into its links.
pub fn parse_link_header(value: &str) -> Result<Vec<LinkRelation>, LinkHeaderError> {
    LinkParser::new(value).parse()
}

struct LinkParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> LinkParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn parse(mut self) -> Result<Vec<LinkRelation>, LinkHeaderError> {
        let mut links = Vec::new();

        loop {
            self.skip_ows();
            // Empty list elements are allowed: "<a>, , <b>"
            while self.eat(',') {
                self.skip_ows();
            }
            if self.at_end() {
                break;
            }

            links.push(self.link_value()?);

            self.skip_ows();
            if self.at_end() {
                break;
            }
            if !self.eat(',') {
                return Err(self.error("expected ',' between links"));
            }
        }

        Ok(links)
    }

    fn link_value(&mut self) -> Result<LinkRelation, LinkHeaderError> {
        if !self.eat('<') {
            return Err(self.error("expected '<'"));
        }
        let start = self.pos;
        let end = self.input[start..]
            .find('>')
            .map(|i| start + i)
            .ok_or_else(|| self.error("unterminated URI reference"))?;
        let uri = self.input[start..end].trim().to_string();
        self.pos = end + 1;

        let mut params = IndexMap::new();
        loop {
            self.skip_ows();
            if !self.eat(';') {
                break;
            }
            self.skip_ows();
            let (name, value) = self.link_param()?;
            params.entry(name).or_insert(value);
        }

        let rel = params
            .get("rel")
            .map(|r: &String| {
                r.split_whitespace()
                    .map(|t| t.to_ascii_lowercase())
                    .collect()
            })
            .unwrap_or_default();

        Ok(LinkRelation { uri, rel, params })
    }

    fn link_param(&mut self) -> Result<(String, String), LinkHeaderError> {
        let name = self.token().ok_or_else(|| self.error("expected parameter name"))?;
        self.skip_ows();
        if !self.eat('=') {
            return Ok((name.to_ascii_lowercase(), String::new()));
        }
        self.skip_ows();

        let value = if self.peek() == Some('"') {
            self.quoted_string()?
        } else {
            self.token()
                .ok_or_else(|| self.error("expected parameter value"))?
        };
        Ok((name.to_ascii_lowercase(), value))
    }

    fn token(&mut self) -> Option<String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_tchar(c) {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        (self.pos > start).then(|| self.input[start..self.pos].to_string())
    }

    fn quoted_string(&mut self) -> Result<String, LinkHeaderError> {
        let open = self.pos;
        self.pos += 1;
        let mut out = String::new();

        while let Some(c) = self.peek() {
            self.pos += c.len_utf8();
            match c {
                '"' => return Ok(out),
                '\\' => match self.peek() {
                    Some(escaped) => {
                        self.pos += escaped.len_utf8();
                        out.push(escaped);
                    }
                    None => break,
                },
                _ => out.push(c),
            }
        }

        Err(LinkHeaderError {
            offset: open,
            message: "unterminated quoted string".to_string(),
        })
    }

    fn skip_ows(&mut self) {
        while let Some(c) = self.peek() {
            if c == ' ' || c == '\t' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn error(&self, message: &str) -> LinkHeaderError {
        LinkHeaderError {
            offset: self.pos,
            message: message.to_string(),
        }
    }
}

/// RFC 7230 `tchar`.
fn is_tchar(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}
