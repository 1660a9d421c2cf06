//! Indenting XML writer.
//!
//! Wraps a non-indenting [`quick_xml::Writer`] and lays documents out the way the
//! legacy QLM producers do:
//!
//! - the first tag starts at column zero with no leading newline;
//! - every start tag goes on a new line, indented one unit per nesting level;
//! - an element without child elements keeps its end tag on the same line
//!   (`<Object></Object>`, `<id>X</id>`);
//! - an end tag after child elements goes on its own line at the element's level.
//!
//! Raw payloads are written verbatim and do not count as child elements.

use std::borrow::Cow;
use std::fmt;
use std::io::{self, Write};

use quick_xml::Writer;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;

/// Streaming writer producing legacy-compatible indented XML.
pub struct XmlWriter<W: Write> {
    inner: Writer<W>,
    indent: usize,
    depth: usize,
    indented_in: bool,
    put_newline: bool,
}

impl<W: Write> fmt::Debug for XmlWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XmlWriter")
            .field("indent", &self.indent)
            .field("depth", &self.depth)
            .field("indented_in", &self.indented_in)
            .field("put_newline", &self.put_newline)
            .finish_non_exhaustive()
    }
}

impl<W: Write> XmlWriter<W> {
    /// Create a writer using `indent` spaces per level; zero disables line breaks.
    pub fn new(sink: W, indent: usize) -> Self {
        Self {
            inner: Writer::new(sink),
            indent,
            depth: 0,
            indented_in: false,
            put_newline: false,
        }
    }

    /// Write the `<?xml version="1.0" encoding="UTF-8"?>` declaration.
    pub fn declaration(&mut self) -> io::Result<()> {
        self.inner
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        self.put_newline = true;
        Ok(())
    }

    /// Open an element.
    pub fn start(&mut self, tag: BytesStart<'_>) -> io::Result<()> {
        self.write_indent(Step::In)?;
        self.inner.write_event(Event::Start(tag))?;
        Ok(())
    }

    /// Close the innermost open element.
    pub fn end(&mut self, name: &str) -> io::Result<()> {
        self.write_indent(Step::Out)?;
        self.inner.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    /// Write escaped character data.
    ///
    /// Carriage returns are written as `&#xD;` so that parsers applying
    /// end-of-line normalization still read them back.
    pub fn text(&mut self, text: &str) -> io::Result<()> {
        if !text.is_empty() {
            let escaped = escape_text(text);
            self.inner
                .write_event(Event::Text(BytesText::from_escaped(escaped)))?;
        }
        Ok(())
    }

    /// Write content verbatim, without escaping or re-indenting.
    pub fn raw(&mut self, content: &str) -> io::Result<()> {
        if !content.is_empty() {
            self.inner
                .write_event(Event::Text(BytesText::from_escaped(content)))?;
        }
        Ok(())
    }

    /// Write `<tag attrs...>text</tag>`.
    pub fn text_element(&mut self, tag: BytesStart<'_>, text: &str) -> io::Result<()> {
        let name = tag_name(&tag)?;
        self.start(tag)?;
        self.text(text)?;
        self.end(&name)
    }

    /// Write an element and let `content` fill it.
    pub fn element<F>(&mut self, tag: BytesStart<'_>, content: F) -> io::Result<()>
    where
        F: FnOnce(&mut Self) -> io::Result<()>,
    {
        let name = tag_name(&tag)?;
        self.start(tag)?;
        content(self)?;
        self.end(&name)
    }

    /// Consume the writer and return the sink.
    pub fn into_inner(self) -> W {
        self.inner.into_inner()
    }

    fn write_indent(&mut self, step: Step) -> io::Result<()> {
        if self.indent == 0 {
            return Ok(());
        }
        if step == Step::Out {
            self.depth = self.depth.saturating_sub(1);
            if self.indented_in {
                self.indented_in = false;
                return Ok(());
            }
            self.indented_in = false;
        }
        let sink = self.inner.get_mut();
        if self.put_newline {
            sink.write_all(b"\n")?;
        } else {
            self.put_newline = true;
        }
        let width = self.depth * self.indent;
        if width > 0 {
            write!(sink, "{:width$}", "")?;
        }
        if step == Step::In {
            self.depth += 1;
            self.indented_in = true;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    In,
    Out,
}

fn tag_name(tag: &BytesStart<'_>) -> io::Result<String> {
    std::str::from_utf8(tag.name().as_ref())
        .map(str::to_owned)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Escape character data.
fn escape_text(text: &str) -> Cow<'_, str> {
    let escaped = quick_xml::escape::escape(text);
    if escaped.contains('\r') {
        Cow::Owned(escaped.replace('\r', "&#xD;"))
    } else {
        escaped
    }
}

/// Escape an attribute value, including the whitespace characters that
/// attribute-value normalization would otherwise turn into spaces.
fn escape_attr(value: &str) -> Cow<'_, str> {
    let escaped = quick_xml::escape::escape(value);
    if !escaped.contains(['\n', '\t', '\r']) {
        return escaped;
    }
    let mut out = String::with_capacity(escaped.len() + 8);
    for ch in escaped.chars() {
        match ch {
            '\n' => out.push_str("&#xA;"),
            '\t' => out.push_str("&#x9;"),
            '\r' => out.push_str("&#xD;"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

/// Push `key="value"`, escaping the value.
pub fn push_attr(tag: &mut BytesStart<'_>, key: &str, value: &str) {
    let value = escape_attr(value).into_owned().into_bytes();
    tag.push_attribute(Attribute {
        key: QName(key.as_bytes()),
        value: Cow::Owned(value),
    });
}

/// Push `key="value"` unless the value is empty.
pub fn push_optional_attr(tag: &mut BytesStart<'_>, key: &str, value: &str) {
    if !value.is_empty() {
        push_attr(tag, key, value);
    }
}

/// Push an integer attribute unless it is zero.
pub fn push_optional_int(tag: &mut BytesStart<'_>, key: &str, value: i64) {
    if value != 0 {
        push_attr(tag, key, &value.to_string());
    }
}

/// Push a floating point attribute unless it is zero.
pub fn push_optional_float(tag: &mut BytesStart<'_>, key: &str, value: f64) {
    if value != 0.0 {
        push_attr(tag, key, &format_float(value));
    }
}

/// Format a float in the shortest form that parses back to the same value.
///
/// Decimal exponents below -4 or at least 6 use exponent notation with a signed,
/// two-digit minimum exponent (`1e+06`, `2.5e-07`); everything else is plain
/// decimal (`10`, `-1`, `3.5`, `0.0001`).
#[must_use]
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "+Inf" } else { "-Inf" }.to_owned();
    }
    let scientific = format!("{value:e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    if (-4..6).contains(&exponent) || value == 0.0 {
        return format!("{value}");
    }
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs())
}
