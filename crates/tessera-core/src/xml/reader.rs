//! Forward-only token reader

use super::{Attributes, XmlError, XmlToken};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Sequential token source consumed by the dispatcher and by providers
pub trait StreamReader {
    /// Advance the cursor and return the new current token.
    ///
    /// After [`XmlToken::Eof`] every further call returns `Eof` again.
    fn next_token(&mut self) -> Result<XmlToken, XmlError>;

    /// Token under the cursor, `None` before the first `next_token`
    fn current(&self) -> Option<&XmlToken>;

    /// Byte offset of the cursor in the input
    fn position(&self) -> u64;
}

/// [`StreamReader`] over an in-memory document, backed by `quick-xml`
pub struct XmlTokenReader<'a> {
    reader: Reader<&'a [u8]>,
    current: Option<XmlToken>,
}

impl<'a> XmlTokenReader<'a> {
    /// Create a reader over a complete document
    pub fn from_str(input: &'a str) -> Self {
        let mut reader = Reader::from_str(input);
        let config = reader.config_mut();
        config.expand_empty_elements = true;
        config.check_end_names = true;

        Self {
            reader,
            current: None,
        }
    }

    fn syntax_error(&self, err: impl std::fmt::Display) -> XmlError {
        XmlError::syntax(self.reader.buffer_position() as u64, err.to_string())
    }

    fn start_token(&self, start: &BytesStart<'_>) -> Result<XmlToken, XmlError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Attributes::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| self.syntax_error(e))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| self.syntax_error(e))?
                .into_owned();
            attributes.push((key, value));
        }
        Ok(XmlToken::Start { name, attributes })
    }
}

impl StreamReader for XmlTokenReader<'_> {
    fn next_token(&mut self) -> Result<XmlToken, XmlError> {
        if matches!(self.current, Some(XmlToken::Eof)) {
            return Ok(XmlToken::Eof);
        }

        let token = loop {
            let event = self.reader.read_event().map_err(|e| self.syntax_error(e))?;
            match event {
                Event::Start(start) => break self.start_token(&start)?,
                Event::End(end) => {
                    break XmlToken::End {
                        name: String::from_utf8_lossy(end.name().as_ref()).into_owned(),
                    }
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| self.syntax_error(e))?;
                    break XmlToken::Text(text.into_owned());
                }
                Event::CData(data) => {
                    break XmlToken::Text(String::from_utf8_lossy(&data.into_inner()).into_owned())
                }
                Event::Eof => break XmlToken::Eof,
                // Declarations, comments, processing instructions and doctypes
                _ => continue,
            }
        };

        self.current = Some(token.clone());
        Ok(token)
    }

    fn current(&self) -> Option<&XmlToken> {
        self.current.as_ref()
    }

    fn position(&self) -> u64 {
        self.reader.buffer_position() as u64
    }
}
