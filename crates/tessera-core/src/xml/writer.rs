//! Sequential token writer

use super::XmlError;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

/// Sequential token sink used by the save orchestrator
pub trait StreamWriter {
    /// Open `<name attr="value" ...>`
    fn start_element(&mut self, name: &str, attributes: &[(String, String)])
        -> Result<(), XmlError>;

    /// Write escaped character data
    fn text(&mut self, text: &str) -> Result<(), XmlError>;

    /// Close `</name>`
    fn end_element(&mut self, name: &str) -> Result<(), XmlError>;
}

/// [`StreamWriter`] backed by `quick-xml`
pub struct XmlTokenWriter<W: Write> {
    writer: Writer<W>,
}

fn sink_error(err: impl std::fmt::Display) -> XmlError {
    XmlError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        err.to_string(),
    ))
}

impl<W: Write> XmlTokenWriter<W> {
    /// Create a writer; `indent == 0` writes everything on one line
    pub fn new(inner: W, indent: usize) -> Self {
        let writer = if indent == 0 {
            Writer::new(inner)
        } else {
            Writer::new_with_indent(inner, b' ', indent)
        };
        Self { writer }
    }

    /// Write the `<?xml version="1.0" encoding="UTF-8"?>` declaration
    pub fn declaration(&mut self) -> Result<(), XmlError> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(sink_error)
    }

    /// Recover the underlying sink
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl XmlTokenWriter<Vec<u8>> {
    /// Writer into an in-memory buffer
    pub fn in_memory(indent: usize) -> Self {
        Self::new(Vec::new(), indent)
    }

    /// Finish and return the document as a string
    pub fn into_string(self) -> Result<String, XmlError> {
        String::from_utf8(self.into_inner()).map_err(sink_error)
    }
}

impl<W: Write> StreamWriter for XmlTokenWriter<W> {
    fn start_element(
        &mut self,
        name: &str,
        attributes: &[(String, String)],
    ) -> Result<(), XmlError> {
        let mut start = BytesStart::new(name);
        for (key, value) in attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        self.writer
            .write_event(Event::Start(start))
            .map_err(sink_error)
    }

    fn text(&mut self, text: &str) -> Result<(), XmlError> {
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(sink_error)
    }

    fn end_element(&mut self, name: &str) -> Result<(), XmlError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(sink_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_escaped_content() {
        let mut writer = XmlTokenWriter::in_memory(0);
        writer
            .start_element("entry", &[("key".to_string(), "a\"b".to_string())])
            .unwrap();
        writer.text("1 < 2 & 3").unwrap();
        writer.end_element("entry").unwrap();

        let out = writer.into_string().unwrap();
        assert_eq!(out, "<entry key=\"a&quot;b\">1 &lt; 2 &amp; 3</entry>");
    }

    #[test]
    fn test_declaration() {
        let mut writer = XmlTokenWriter::in_memory(0);
        writer.declaration().unwrap();
        let out = writer.into_string().unwrap();
        assert!(out.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    }
}
