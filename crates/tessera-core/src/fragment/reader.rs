//! Reader scoped to one provider fragment

use crate::provider::ProviderError;
use crate::xml::{Attributes, StreamReader, XmlError, XmlToken};

/// View of the document stream handed to [`FragmentProvider::read`].
///
/// Created just after `<identifier>` has been consumed. Tokens are passed
/// through from the underlying stream until the matching `</identifier>`;
/// after that the view is finished and refuses to advance. The dispatcher
/// inspects the view once the provider returns to verify it stopped exactly
/// at the fragment end.
///
/// [`FragmentProvider::read`]: crate::provider::FragmentProvider::read
pub struct FragmentReader<'a> {
    stream: &'a mut dyn StreamReader,
    identifier: String,
    attributes: Attributes,
    /// Elements open inside the fragment
    depth: usize,
    finished: bool,
    overrun: bool,
    fault: Option<(u64, String)>,
}

impl<'a> FragmentReader<'a> {
    pub(crate) fn new(
        stream: &'a mut dyn StreamReader,
        identifier: impl Into<String>,
        attributes: Attributes,
    ) -> Self {
        Self {
            stream,
            identifier: identifier.into(),
            attributes,
            depth: 0,
            finished: false,
            overrun: false,
            fault: None,
        }
    }

    /// Identifier (tag) of this fragment
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Attribute of the fragment's own start tag
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Number of elements currently open inside the fragment
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether the fragment's end tag has been consumed
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Token under the cursor
    pub fn current(&self) -> Option<&XmlToken> {
        self.stream.current()
    }

    /// Advance to the next token of the fragment.
    ///
    /// The final token returned is the fragment's own end tag.
    pub fn next_token(&mut self) -> Result<XmlToken, ProviderError> {
        if self.finished {
            self.overrun = true;
            return Err(ProviderError::PastFragmentEnd(self.identifier.clone()));
        }
        if let Some((position, message)) = &self.fault {
            return Err(XmlError::syntax(*position, message.clone()).into());
        }

        let token = match self.stream.next_token() {
            Ok(token) => token,
            Err(err) => {
                let fault = match &err {
                    XmlError::Syntax { position, message } => (*position, message.clone()),
                    other => (self.stream.position(), other.to_string()),
                };
                self.fault = Some(fault);
                return Err(err.into());
            }
        };

        match &token {
            XmlToken::Start { .. } => self.depth += 1,
            XmlToken::End { .. } if self.depth == 0 => self.finished = true,
            XmlToken::End { .. } => self.depth -= 1,
            XmlToken::Text(_) => {}
            XmlToken::Eof => {
                let message = format!(
                    "unexpected end of document inside <{}>",
                    self.identifier
                );
                self.fault = Some((self.stream.position(), message.clone()));
                return Err(XmlError::syntax(self.stream.position(), message).into());
            }
        }

        Ok(token)
    }

    /// Advance to the next child element of the element currently open.
    ///
    /// Text is skipped. Returns `None` once the enclosing element's end tag
    /// has been consumed, so `while let Some(child) = input.next_child()?`
    /// walks the fragment's top-level children and consumes the fragment end.
    pub fn next_child(&mut self) -> Result<Option<XmlToken>, ProviderError> {
        loop {
            match self.next_token()? {
                start @ XmlToken::Start { .. } => return Ok(Some(start)),
                XmlToken::End { .. } => return Ok(None),
                _ => continue,
            }
        }
    }

    /// Read the text content of the element whose start tag was just consumed,
    /// including its end tag. Nested elements are an error.
    pub fn read_text(&mut self) -> Result<String, ProviderError> {
        let mut text = String::new();
        loop {
            match self.next_token()? {
                XmlToken::Text(chunk) => text.push_str(&chunk),
                XmlToken::End { .. } => return Ok(text),
                other => return Err(ProviderError::unexpected("text", other)),
            }
        }
    }

    /// Skip the element whose start tag was just consumed, including its end tag
    pub fn skip_element(&mut self) -> Result<(), ProviderError> {
        let mut depth = 1usize;
        while depth > 0 {
            match self.next_token()? {
                XmlToken::Start { .. } => depth += 1,
                XmlToken::End { .. } => depth -= 1,
                _ => {}
            }
        }
        Ok(())
    }

    /// Consume everything up to and including the fragment's end tag
    pub fn finish(&mut self) -> Result<(), ProviderError> {
        while !self.finished {
            self.next_token()?;
        }
        Ok(())
    }

    /// Tried to advance past the fragment end
    pub(crate) fn overran(&self) -> bool {
        self.overrun
    }

    /// Stream fault seen while the provider was reading
    pub(crate) fn take_fault(&mut self) -> Option<XmlError> {
        self.fault
            .take()
            .map(|(position, message)| XmlError::syntax(position, message))
    }
}
