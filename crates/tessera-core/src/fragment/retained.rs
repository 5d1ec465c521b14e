//! Unrecognized fragments kept for re-emission on save

use crate::xml::{StreamWriter, XmlError, XmlToken};

/// One skipped fragment, stored token by token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetainedFragment {
    tag: String,
    tokens: Vec<XmlToken>,
}

impl RetainedFragment {
    /// Whitespace-only text between elements is dropped so replay under an
    /// indenting writer does not accumulate it. Whitespace that is the whole
    /// content of an element is kept.
    pub(crate) fn new(tag: impl Into<String>, tokens: Vec<XmlToken>) -> Self {
        let tokens = tokens
            .iter()
            .enumerate()
            .filter(|(i, token)| match token {
                XmlToken::Text(text) if text.trim().is_empty() => {
                    let after_start = i
                        .checked_sub(1)
                        .is_some_and(|prev| matches!(tokens[prev], XmlToken::Start { .. }));
                    let before_end = matches!(tokens.get(i + 1), Some(XmlToken::End { .. }));
                    after_start && before_end
                }
                _ => true,
            })
            .map(|(_, token)| token.clone())
            .collect();
        Self {
            tag: tag.into(),
            tokens,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Tokens from the start tag through the matching end tag
    pub fn tokens(&self) -> &[XmlToken] {
        &self.tokens
    }

    /// Write the fragment back out unchanged
    pub(crate) fn replay(&self, stream: &mut dyn StreamWriter) -> Result<(), XmlError> {
        for token in &self.tokens {
            match token {
                XmlToken::Start { name, attributes } => stream.start_element(name, attributes)?,
                XmlToken::End { name } => stream.end_element(name)?,
                XmlToken::Text(text) => stream.text(text)?,
                XmlToken::Eof => {}
            }
        }
        Ok(())
    }
}

/// Workspace state slot holding fragments no registered provider claimed.
///
/// Only populated when `load.retain_unrecognized` is enabled. Cleared at the
/// start of every workspace load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetainedFragments {
    fragments: Vec<RetainedFragment>,
}

impl RetainedFragments {
    pub(crate) fn push(&mut self, fragment: RetainedFragment) {
        self.fragments.push(fragment);
    }

    pub fn iter(&self) -> impl Iterator<Item = &RetainedFragment> {
        self.fragments.iter()
    }

    pub fn tags(&self) -> Vec<&str> {
        self.fragments.iter().map(|f| f.tag()).collect()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}
