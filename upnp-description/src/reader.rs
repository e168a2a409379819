//! Positioned streaming reader over description XML
//!
//! `DescriptionReader` wraps a `quick_xml::Reader` and exposes the document as
//! a sequence of owned [`Token`]s, remembering the most recent one. Parsers
//! hand the same reader down the element tree: a child parser starts on the
//! token its parent just read and returns with the reader positioned on its
//! own end element, so the parent can carry on from there.

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{DescriptionError, Result};

/// One meaningful XML token, with namespace prefixes stripped from names
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Nothing has been read yet
    Begin,
    Start {
        name: String,
        attributes: Vec<(String, String)>,
    },
    /// A self-closing element such as `<retval/>`
    Empty {
        name: String,
        attributes: Vec<(String, String)>,
    },
    End { name: String },
    Text(String),
    Eof,
}

impl Token {
    /// Short human-readable form used in structure errors
    pub fn describe(&self) -> String {
        match self {
            Token::Begin => "start of document".to_string(),
            Token::Start { name, .. } => format!("<{}>", name),
            Token::Empty { name, .. } => format!("<{}/>", name),
            Token::End { name } => format!("</{}>", name),
            Token::Text(text) => format!("text {:?}", text),
            Token::Eof => "end of document".to_string(),
        }
    }
}

/// Streaming reader shared by every description parser of one document
pub struct DescriptionReader<R> {
    inner: Reader<R>,
    buf: Vec<u8>,
    current: Token,
}

impl<'a> DescriptionReader<&'a [u8]> {
    /// Read a document held in memory
    pub fn from_str(xml: &'a str) -> Self {
        Self::new(xml.as_bytes())
    }
}

impl<R: BufRead> DescriptionReader<R> {
    pub fn new(source: R) -> Self {
        let mut inner = Reader::from_reader(source);
        // end tags are matched by the description parsers themselves
        inner.trim_text(true).check_end_names(false);
        Self {
            inner,
            buf: Vec::new(),
            current: Token::Begin,
        }
    }

    /// The token the reader is positioned on
    pub fn current(&self) -> &Token {
        &self.current
    }

    /// Advance to the next meaningful token and return it
    ///
    /// Declarations, comments, processing instructions and doctypes are
    /// skipped. Reading past [`Token::Eof`] keeps returning `Eof`.
    pub fn advance(&mut self) -> Result<Token> {
        if self.current == Token::Eof {
            return Ok(Token::Eof);
        }

        let token = loop {
            self.buf.clear();
            let token = match self.inner.read_event_into(&mut self.buf)? {
                Event::Start(e) => Token::Start {
                    name: local_name(&e),
                    attributes: attributes(&e)?,
                },
                Event::Empty(e) => Token::Empty {
                    name: local_name(&e),
                    attributes: attributes(&e)?,
                },
                Event::End(e) => Token::End {
                    name: String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
                },
                Event::Text(e) => Token::Text(e.unescape()?.into_owned()),
                Event::CData(e) => Token::Text(String::from_utf8_lossy(&e.into_inner()).into_owned()),
                Event::Eof => Token::Eof,
                Event::Decl(_) | Event::PI(_) | Event::Comment(_) | Event::DocType(_) => continue,
            };
            break token;
        };

        self.current = token.clone();
        Ok(token)
    }

    /// Skip ahead to the document's first element
    pub fn move_to_content(&mut self) -> Result<&Token> {
        loop {
            match self.advance()? {
                Token::Start { .. } | Token::Empty { .. } => return Ok(&self.current),
                Token::Eof => {
                    return Err(DescriptionError::structure("a root element", "end of document"))
                }
                _ => continue,
            }
        }
    }

    /// Check that the reader sits on `<element>` (or `<element/>`)
    ///
    /// Returns the element's attributes and whether it was self-closing.
    pub fn expect_start(&self, element: &str) -> Result<(Vec<(String, String)>, bool)> {
        match &self.current {
            Token::Start { name, attributes } if name == element => Ok((attributes.clone(), false)),
            Token::Empty { name, attributes } if name == element => Ok((attributes.clone(), true)),
            other => Err(DescriptionError::structure(format!("<{}>", element), other.describe())),
        }
    }

    /// Consume the element the reader is positioned on, including its subtree
    pub fn skip_element(&mut self) -> Result<()> {
        let element = match &self.current {
            Token::Start { name, .. } => name.clone(),
            Token::Empty { .. } => return Ok(()),
            other => return Err(DescriptionError::structure("an element", other.describe())),
        };

        let mut depth = 0usize;
        loop {
            match self.advance()? {
                Token::Start { .. } => depth += 1,
                Token::End { name } => {
                    if depth == 0 {
                        if name != element {
                            return Err(DescriptionError::structure(
                                format!("</{}>", element),
                                format!("</{}>", name),
                            ));
                        }
                        return Ok(());
                    }
                    depth -= 1;
                }
                Token::Eof => {
                    return Err(DescriptionError::structure(
                        format!("</{}>", element),
                        "end of document",
                    ))
                }
                _ => {}
            }
        }
    }
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attributes(e: &BytesStart<'_>) -> Result<Vec<(String, String)>> {
    let mut out = Vec::new();
    for attribute in e.attributes() {
        let attribute = attribute.map_err(quick_xml::Error::from)?;
        let key = attribute.key.local_name();
        // namespace declarations carry no description data
        if attribute.key.as_ref().starts_with(b"xmlns") {
            continue;
        }
        out.push((
            String::from_utf8_lossy(key.as_ref()).into_owned(),
            attribute.unescape_value()?.into_owned(),
        ));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_strip_prefixes_and_skip_prolog() {
        let xml = r#"<?xml version="1.0"?>
<!-- comment -->
<s:root xmlns:s="urn:schemas-upnp-org:device-1-0"><s:major>1</s:major></s:root>"#;
        let mut reader = DescriptionReader::from_str(xml);

        assert_eq!(reader.current(), &Token::Begin);
        reader.move_to_content().unwrap();
        assert!(reader.expect_start("root").is_ok());
        assert_eq!(
            reader.advance().unwrap(),
            Token::Start {
                name: "major".to_string(),
                attributes: vec![]
            }
        );
        assert_eq!(reader.advance().unwrap(), Token::Text("1".to_string()));
        assert_eq!(
            reader.advance().unwrap(),
            Token::End {
                name: "major".to_string()
            }
        );
    }

    #[test]
    fn test_text_is_unescaped_and_cdata_is_text() {
        let xml = "<a><b>Tom &amp; Jerry</b><c><![CDATA[<raw>]]></c></a>";
        let mut reader = DescriptionReader::from_str(xml);
        reader.move_to_content().unwrap();
        reader.advance().unwrap();
        assert_eq!(reader.advance().unwrap(), Token::Text("Tom & Jerry".to_string()));
        reader.advance().unwrap();
        reader.advance().unwrap();
        assert_eq!(reader.advance().unwrap(), Token::Text("<raw>".to_string()));
    }

    #[test]
    fn test_attributes_are_collected_without_namespace_declarations() {
        let xml = r#"<stateVariable xmlns:dt="urn:x" sendEvents="yes" dt:multicast="no"/>"#;
        let mut reader = DescriptionReader::from_str(xml);
        reader.move_to_content().unwrap();
        let (attributes, empty) = reader.expect_start("stateVariable").unwrap();
        assert!(empty);
        assert_eq!(
            attributes,
            vec![
                ("sendEvents".to_string(), "yes".to_string()),
                ("multicast".to_string(), "no".to_string()),
            ]
        );
    }

    #[test]
    fn test_expect_start_reports_structure_error() {
        let mut reader = DescriptionReader::from_str("<scpd/>");
        reader.move_to_content().unwrap();
        let err = reader.expect_start("root").unwrap_err();
        assert!(err.is_structure_error());
        assert!(err.to_string().contains("<root>"));
        assert!(err.to_string().contains("<scpd/>"));
    }

    #[test]
    fn test_skip_element_consumes_nested_subtree() {
        let xml = "<a><x><x><y>1</y></x></x><b>2</b></a>";
        let mut reader = DescriptionReader::from_str(xml);
        reader.move_to_content().unwrap();
        reader.advance().unwrap();
        reader.skip_element().unwrap();
        assert_eq!(
            reader.current(),
            &Token::End {
                name: "x".to_string()
            }
        );
        assert_eq!(
            reader.advance().unwrap(),
            Token::Start {
                name: "b".to_string(),
                attributes: vec![]
            }
        );
    }

    #[test]
    fn test_eof_is_sticky() {
        let mut reader = DescriptionReader::from_str("<a/>");
        reader.move_to_content().unwrap();
        assert_eq!(reader.advance().unwrap(), Token::Eof);
        assert_eq!(reader.advance().unwrap(), Token::Eof);
    }
}
