//! XML stream capability
//!
//! The persistence core never touches raw XML. It talks to two small traits:
//!
//! - [`StreamReader`]: forward-only token cursor (`next_token`, `current`, `position`)
//! - [`StreamWriter`]: sequential element/text emission
//!
//! Both are implemented on top of `quick-xml` ([`XmlTokenReader`], [`XmlTokenWriter`]).
//! Comments, processing instructions, the XML declaration and whitespace-only
//! text are not tokens. Empty elements (`<a/>`) are reported as a start/end pair.

mod reader;
mod writer;

pub use reader::{StreamReader, XmlTokenReader};
pub use writer::{StreamWriter, XmlTokenWriter};

use thiserror::Error;

/// Attribute list of a start element, in document order
pub type Attributes = Vec<(String, String)>;

/// Errors raised by the XML stream capability
#[derive(Error, Debug)]
pub enum XmlError {
    /// Input is not well-formed
    #[error("XML syntax error at byte {position}: {message}")]
    Syntax { position: u64, message: String },

    /// Element or attribute name is not a valid XML name
    #[error("Invalid XML name: {0}")]
    InvalidName(String),

    /// Underlying sink failed
    #[error("XML I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl XmlError {
    /// Create a syntax error
    pub fn syntax(position: u64, msg: impl Into<String>) -> Self {
        XmlError::Syntax {
            position,
            message: msg.into(),
        }
    }
}

/// Kind of the token under the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Start,
    End,
    Text,
    Eof,
}

/// A single token of the document stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlToken {
    /// `<name attr="value">`
    Start { name: String, attributes: Attributes },

    /// `</name>`
    End { name: String },

    /// Character data with entities resolved
    Text(String),

    /// End of document
    Eof,
}

impl XmlToken {
    /// Create a start token without attributes
    pub fn start(name: impl Into<String>) -> Self {
        XmlToken::Start {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    /// Create an end token
    pub fn end(name: impl Into<String>) -> Self {
        XmlToken::End { name: name.into() }
    }

    /// Token kind
    pub fn kind(&self) -> TokenKind {
        match self {
            XmlToken::Start { .. } => TokenKind::Start,
            XmlToken::End { .. } => TokenKind::End,
            XmlToken::Text(_) => TokenKind::Text,
            XmlToken::Eof => TokenKind::Eof,
        }
    }

    /// Element name for start and end tokens
    pub fn element_name(&self) -> Option<&str> {
        match self {
            XmlToken::Start { name, .. } | XmlToken::End { name } => Some(name),
            _ => None,
        }
    }

    /// Look up an attribute on a start token
    pub fn attribute(&self, key: &str) -> Option<&str> {
        match self {
            XmlToken::Start { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    /// Check if this is the start tag `<name>`
    pub fn is_start_of(&self, name: &str) -> bool {
        matches!(self, XmlToken::Start { name: n, .. } if n == name)
    }

    /// Check if this is the end tag `</name>`
    pub fn is_end_of(&self, name: &str) -> bool {
        matches!(self, XmlToken::End { name: n } if n == name)
    }
}

impl std::fmt::Display for XmlToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            XmlToken::Start { name, .. } => write!(f, "<{}>", name),
            XmlToken::End { name } => write!(f, "</{}>", name),
            XmlToken::Text(_) => write!(f, "text"),
            XmlToken::Eof => write!(f, "end of document"),
        }
    }
}

/// Check that `name` can be used as an element name in project documents.
///
/// Accepted: a letter or `_`, followed by letters, digits, `-`, `_` or `.`.
/// Names starting with `xml` (any case) are reserved.
pub fn validate_name(name: &str) -> std::result::Result<(), String> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err("name is empty".to_string());
    };
    if !(first.is_alphabetic() || first == '_') {
        return Err(format!("must start with a letter or '_', found '{}'", first));
    }
    if let Some(bad) = chars.find(|c| !(c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))) {
        return Err(format!("contains invalid character '{}'", bad));
    }
    if name.get(..3).is_some_and(|prefix| prefix.eq_ignore_ascii_case("xml")) {
        return Err("names starting with 'xml' are reserved".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name_accepts_common_identifiers() {
        assert!(validate_name("bookmarks").is_ok());
        assert!(validate_name("_private").is_ok());
        assert!(validate_name("editor.state-v2").is_ok());
    }

    #[test]
    fn test_validate_name_rejects_bad_identifiers() {
        assert!(validate_name("").is_err());
        assert!(validate_name("1st").is_err());
        assert!(validate_name("has space").is_err());
        assert!(validate_name("ns:tag").is_err());
        assert!(validate_name("XmlThing").is_err());
    }

    #[test]
    fn test_validate_name_non_ascii() {
        assert!(validate_name("naïve").is_ok());
        assert!(validate_name("aaé").is_ok());
        assert!(validate_name("été").is_ok());
        assert!(validate_name("xmlé").is_err());
    }

    #[test]
    fn test_token_accessors() {
        let token = XmlToken::Start {
            name: "entry".to_string(),
            attributes: vec![("key".to_string(), "a".to_string())],
        };
        assert_eq!(token.kind(), TokenKind::Start);
        assert_eq!(token.element_name(), Some("entry"));
        assert_eq!(token.attribute("key"), Some("a"));
        assert_eq!(token.attribute("missing"), None);
        assert!(token.is_start_of("entry"));
        assert!(!XmlToken::Eof.is_end_of("entry"));
        assert_eq!(XmlToken::end("entry").to_string(), "</entry>");
    }
}
