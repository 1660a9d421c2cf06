//! Depth-limited pull reader shared by the QLM decoders.
//!
//! [`XmlReader`] wraps a [`quick_xml::Reader`] over an in-memory buffer and adds
//! what every element decoder needs: child iteration with unknown-element
//! skipping, text collection, raw inner-content capture and a nesting bound.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::events::{BytesRef, BytesStart, Event};

use crate::error::XmlError;

/// An element whose start tag has just been read.
#[derive(Debug, Clone)]
pub struct Element<'a> {
    /// Start tag, including attributes.
    pub start: BytesStart<'a>,
    /// Whether the element was self-closing (`<x/>`), i.e. has no content to read.
    pub empty: bool,
}

impl Element<'_> {
    /// Local element name, without any namespace prefix.
    pub fn name(&self) -> Result<&str, XmlError> {
        std::str::from_utf8(self.start.local_name().into_inner())
            .map_err(|e| XmlError::ParseError(e.to_string()))
    }

    /// Collect attributes as `(local name, unescaped value)` pairs in document order.
    ///
    /// Namespace declarations are left out.
    pub fn attributes(&self, reader: &XmlReader<'_>) -> Result<Vec<(String, String)>, XmlError> {
        let mut attrs = Vec::new();
        for attr in self.start.attributes() {
            let attr = attr?;
            if attr.key.as_namespace_binding().is_some() {
                continue;
            }
            let key = std::str::from_utf8(attr.key.local_name().into_inner())
                .map_err(|e| XmlError::ParseError(e.to_string()))?
                .to_owned();
            let value = attr
                .decode_and_unescape_value(reader.inner.decoder())
                .map_err(|source| reader.malformed(source))?
                .into_owned();
            attrs.push((key, value));
        }
        Ok(attrs)
    }
}

/// Pull reader over an in-memory XML document.
#[derive(Debug)]
pub struct XmlReader<'a> {
    xml: &'a [u8],
    inner: Reader<&'a [u8]>,
    depth: usize,
    max_depth: usize,
}

impl<'a> XmlReader<'a> {
    /// Create a reader over `xml` that rejects nesting deeper than `max_depth`.
    pub fn new(xml: &'a [u8], max_depth: usize) -> Self {
        let mut inner = Reader::from_reader(xml);
        inner.config_mut().trim_text(false);
        Self {
            xml,
            inner,
            depth: 0,
            max_depth,
        }
    }

    /// Read up to the root element, skipping the declaration, comments and whitespace.
    pub fn root(&mut self) -> Result<Element<'a>, XmlError> {
        loop {
            match self.next_event()? {
                Event::Start(start) => return self.enter(start, false),
                Event::Empty(start) => return self.enter(start, true),
                Event::Eof => return Err(XmlError::MissingElement("root element".to_owned())),
                _ => {}
            }
        }
    }

    /// Visit each child element of `parent` until its end tag.
    ///
    /// The visitor must either decode the child completely or hand it to
    /// [`XmlReader::skip`]. Text, comments and processing instructions between
    /// children are ignored.
    pub fn read_children<F>(&mut self, parent: &Element<'_>, mut visit: F) -> Result<(), XmlError>
    where
        F: FnMut(&mut Self, Element<'a>) -> Result<(), XmlError>,
    {
        if parent.empty {
            return Ok(());
        }
        loop {
            match self.next_event()? {
                Event::Start(start) => {
                    let child = self.enter(start, false)?;
                    visit(self, child)?;
                    self.leave();
                }
                Event::Empty(start) => {
                    let child = self.enter(start, true)?;
                    visit(self, child)?;
                    self.leave();
                }
                Event::End(_) => return Ok(()),
                Event::Eof => return Err(self.unexpected_eof(parent)),
                _ => {}
            }
        }
    }

    /// Collect the character data of `element` and consume its end tag.
    ///
    /// Entity and character references are resolved and CDATA sections included.
    /// Nested elements are skipped; their text does not contribute.
    pub fn read_text(&mut self, element: &Element<'_>) -> Result<String, XmlError> {
        let mut text = String::new();
        if element.empty {
            return Ok(text);
        }
        loop {
            match self.next_event()? {
                Event::Text(e) => {
                    let decoded = e
                        .decode()
                        .map_err(|err| XmlError::ParseError(err.to_string()))?;
                    let unescaped = quick_xml::escape::unescape(&decoded)
                        .map_err(|err| XmlError::ParseError(err.to_string()))?;
                    text.push_str(&unescaped);
                }
                Event::CData(e) => {
                    let decoded = e
                        .decode()
                        .map_err(|err| XmlError::ParseError(err.to_string()))?;
                    text.push_str(&decoded);
                }
                Event::GeneralRef(r) => text.push_str(&resolve_reference(&r)?),
                Event::Start(_) => self.skip_content()?,
                Event::End(_) => return Ok(text),
                Event::Eof => return Err(self.unexpected_eof(element)),
                _ => {}
            }
        }
    }

    /// Capture the inner content of `element` verbatim and consume its end tag.
    ///
    /// Markup, comments and whitespace are returned exactly as they appear in the input.
    pub fn read_raw(&mut self, element: &Element<'_>) -> Result<Cow<'a, str>, XmlError> {
        if element.empty {
            return Ok(Cow::Borrowed(""));
        }
        let start = self.offset();
        let mut depth: u32 = 1;
        loop {
            let before = self.offset();
            match self.next_event()? {
                Event::Start(_) => depth += 1,
                Event::End(_) => {
                    depth -= 1;
                    if depth == 0 {
                        let raw = self.xml.get(start..before).unwrap_or_default();
                        return std::str::from_utf8(raw)
                            .map(Cow::Borrowed)
                            .map_err(|e| XmlError::ParseError(e.to_string()));
                    }
                }
                Event::Eof => return Err(self.unexpected_eof(element)),
                _ => {}
            }
        }
    }

    /// Skip the content of an element the caller does not understand.
    pub fn skip(&mut self, element: &Element<'_>) -> Result<(), XmlError> {
        tracing::debug!(element = element.name().unwrap_or("?"), "skipping unknown element");
        if element.empty {
            return Ok(());
        }
        self.skip_content()
    }

    /// Consume events through the end tag of the element just opened.
    fn skip_content(&mut self) -> Result<(), XmlError> {
        let mut depth: u32 = 1;
        loop {
            match self.next_event()? {
                Event::Start(_) => depth += 1,
                Event::End(_) => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF while skipping element".to_owned(),
                    ));
                }
                _ => {}
            }
        }
    }

    fn enter(&mut self, start: BytesStart<'a>, empty: bool) -> Result<Element<'a>, XmlError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            tracing::warn!(limit = self.max_depth, "XML nesting depth limit exceeded");
            return Err(XmlError::DepthExceeded {
                limit: self.max_depth,
            });
        }
        Ok(Element { start, empty })
    }

    /// Byte offset of the next unread input.
    fn offset(&self) -> usize {
        usize::try_from(self.inner.buffer_position()).unwrap_or(usize::MAX)
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn next_event(&mut self) -> Result<Event<'a>, XmlError> {
        self.inner.read_event().map_err(|source| self.malformed(source))
    }

    fn malformed(&self, source: quick_xml::Error) -> XmlError {
        XmlError::Malformed {
            position: self.inner.error_position(),
            source,
        }
    }

    fn unexpected_eof(&self, element: &Element<'_>) -> XmlError {
        XmlError::UnexpectedElement(format!(
            "unexpected EOF in {}",
            element.name().unwrap_or("element")
        ))
    }
}

/// Resolve a `&name;` or `&#N;` reference found in text content.
fn resolve_reference(reference: &BytesRef<'_>) -> Result<String, XmlError> {
    if let Some(ch) = reference
        .resolve_char_ref()
        .map_err(|err| XmlError::ParseError(err.to_string()))?
    {
        return Ok(ch.to_string());
    }
    let name = reference
        .decode()
        .map_err(|err| XmlError::ParseError(err.to_string()))?;
    quick_xml::escape::resolve_predefined_entity(&name)
        .map(str::to_owned)
        .ok_or_else(|| XmlError::ParseError(format!("unknown entity reference: &{name};")))
}
