//! QLM XML deserialization: parsing XML into model types.
//!
//! This module provides the [`QlmDeserialize`] trait and implementations for every
//! data-format and envelope type. Decoding is lenient in the way the legacy
//! consumers are: unknown elements and attributes are skipped, missing optional
//! attributes decode to zero values and a repeated single-valued child keeps the
//! last occurrence. Elements and attributes are matched on their local names, so
//! namespace-prefixed documents (`<odf:Objects xmlns:odf="...">`) decode too. The
//! root element itself must still be a QLM document root.

use std::str::FromStr;

use qlm_model::df::{Description, InfoItem, MetaData, Object, Objects, QlmId, Value};
use qlm_model::mi::{
    CancelRequest, Envelope, Message, NodeList, ReadRequest, Request, RequestId, RequestResult,
    Response, Return, WriteRequest,
};
use serde::{Deserialize, Serialize};

use crate::config::CodecConfig;
use crate::error::XmlError;
use crate::reader::{Element, XmlReader};
use crate::serialize::{ENVELOPE_TAG, OBJECTS_TAG, RESULT_ENVELOPE_TAG};

/// Legacy name of the envelope root still produced by older nodes.
pub const LEGACY_ENVELOPE_TAG: &str = "omiEnvelope";

/// Trait for deserializing QLM types from XML.
///
/// The caller has already consumed the start tag of the element; the
/// implementation reads its attributes from `element`, then its content up to
/// and including the matching end tag.
pub trait QlmDeserialize: Sized {
    /// Canonical element name.
    const TAG: &'static str;

    /// Whether an element with this name decodes as `Self`.
    fn accepts(name: &str) -> bool {
        name == Self::TAG
    }

    /// Deserialize an instance from the element just opened.
    ///
    /// # Errors
    ///
    /// Returns `XmlError` if the XML is malformed, too deeply nested or
    /// an attribute cannot be parsed.
    fn deserialize_xml(reader: &mut XmlReader<'_>, element: &Element<'_>)
    -> Result<Self, XmlError>;
}

/// Deserialize a standalone XML document into a typed value.
///
/// Finds the root element, checks its name and delegates to the type's
/// [`QlmDeserialize`] implementation.
///
/// # Errors
///
/// Returns `XmlError` if the XML is malformed, the root element has the wrong
/// name or deserialization fails.
pub fn from_xml<T: QlmDeserialize>(xml: &[u8], config: &CodecConfig) -> Result<T, XmlError> {
    let mut reader = XmlReader::new(xml, config.max_depth);
    let root = reader.root()?;
    let name = root.name()?;
    if !T::accepts(name) {
        return Err(XmlError::UnexpectedElement(format!(
            "expected root <{}>, found <{name}>",
            T::TAG
        )));
    }
    T::deserialize_xml(&mut reader, &root)
}

/// Decode a data-format document with the default configuration.
pub fn decode_objects(xml: &[u8]) -> Result<Objects, XmlError> {
    decode_objects_with(xml, &CodecConfig::default())
}

/// Decode a data-format document.
pub fn decode_objects_with(xml: &[u8], config: &CodecConfig) -> Result<Objects, XmlError> {
    let objects: Objects = from_xml(xml, config)?;
    tracing::debug!(objects = objects.objects.len(), "decoded data-format document");
    Ok(objects)
}

/// Decode an envelope with the default configuration.
pub fn decode_envelope(xml: &[u8]) -> Result<Envelope, XmlError> {
    decode_envelope_with(xml, &CodecConfig::default())
}

/// Decode an envelope.
pub fn decode_envelope_with(xml: &[u8], config: &CodecConfig) -> Result<Envelope, XmlError> {
    let envelope: Envelope = from_xml(xml, config)?;
    tracing::debug!(
        version = %envelope.version,
        ttl = envelope.ttl,
        request = envelope.request.as_ref().map_or("none", Request::tag),
        "decoded envelope"
    );
    Ok(envelope)
}

/// Kind of QLM document, as told by its root element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentKind {
    /// `<Objects>` data-format document.
    Objects,
    /// `<qlmEnvelope>` (or legacy `<omiEnvelope>`) message.
    Envelope,
}

/// Determine the document kind by reading only up to the root element.
///
/// # Errors
///
/// Returns `XmlError` if no root element can be read or its name is not a
/// QLM document root.
pub fn detect_document(xml: &[u8]) -> Result<DocumentKind, XmlError> {
    let mut reader = XmlReader::new(xml, 1);
    let root = reader.root()?;
    let name = root.name()?;
    if Objects::accepts(name) {
        Ok(DocumentKind::Objects)
    } else if Envelope::accepts(name) {
        Ok(DocumentKind::Envelope)
    } else {
        Err(XmlError::UnexpectedElement(format!(
            "<{name}> is not a QLM document root"
        )))
    }
}

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// Parse a numeric attribute; surrounding whitespace is ignored and an empty
/// value means zero.
fn parse_number<T>(name: &str, value: &str) -> Result<T, XmlError>
where
    T: FromStr + Default,
    T::Err: std::fmt::Display,
{
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(T::default());
    }
    trimmed
        .parse()
        .map_err(|e| XmlError::ParseError(format!("invalid {name} {value:?}: {e}")))
}

/// Decode a child into `slot`, replacing any earlier occurrence.
fn replace<T: QlmDeserialize>(
    slot: &mut Option<T>,
    reader: &mut XmlReader<'_>,
    element: &Element<'_>,
) -> Result<(), XmlError> {
    *slot = Some(T::deserialize_xml(reader, element)?);
    Ok(())
}

/// Decode a child and append it to `items`.
fn push<T: QlmDeserialize>(
    items: &mut Vec<T>,
    reader: &mut XmlReader<'_>,
    element: &Element<'_>,
) -> Result<(), XmlError> {
    items.push(T::deserialize_xml(reader, element)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Data-format document
// ---------------------------------------------------------------------------

impl QlmDeserialize for Objects {
    const TAG: &'static str = OBJECTS_TAG;

    fn deserialize_xml(
        reader: &mut XmlReader<'_>,
        element: &Element<'_>,
    ) -> Result<Self, XmlError> {
        let mut result = Self::default();
        for (key, value) in element.attributes(reader)? {
            if key == "version" {
                result.version = value;
            }
        }
        reader.read_children(element, |reader, child| match child.name()? {
            "Object" => push(&mut result.objects, reader, &child),
            _ => reader.skip(&child),
        })?;
        Ok(result)
    }
}

impl QlmDeserialize for Object {
    const TAG: &'static str = "Object";

    fn deserialize_xml(
        reader: &mut XmlReader<'_>,
        element: &Element<'_>,
    ) -> Result<Self, XmlError> {
        let mut result = Self::default();
        for (key, value) in element.attributes(reader)? {
            match key.as_str() {
                "type" => result.type_ = value,
                "udef" => result.udef = value,
                _ => {}
            }
        }
        reader.read_children(element, |reader, child| match child.name()? {
            "id" => replace(&mut result.id, reader, &child),
            "description" => replace(&mut result.description, reader, &child),
            "InfoItem" => push(&mut result.info_items, reader, &child),
            "Object" => push(&mut result.objects, reader, &child),
            _ => reader.skip(&child),
        })?;
        Ok(result)
    }
}

impl QlmDeserialize for QlmId {
    const TAG: &'static str = "id";

    fn deserialize_xml(
        reader: &mut XmlReader<'_>,
        element: &Element<'_>,
    ) -> Result<Self, XmlError> {
        let mut result = Self::default();
        for (key, value) in element.attributes(reader)? {
            match key.as_str() {
                "idType" => result.id_type = value,
                "tagType" => result.tag_type = value,
                "startDate" => result.start_date = value,
                "endDate" => result.end_date = value,
                "udef" => result.udef = value,
                _ => {}
            }
        }
        result.text = reader.read_text(element)?;
        Ok(result)
    }
}

impl QlmDeserialize for Description {
    const TAG: &'static str = "description";

    fn deserialize_xml(
        reader: &mut XmlReader<'_>,
        element: &Element<'_>,
    ) -> Result<Self, XmlError> {
        let mut result = Self::default();
        for (key, value) in element.attributes(reader)? {
            match key.as_str() {
                "lang" => result.lang = value,
                "udef" => result.udef = value,
                _ => {}
            }
        }
        result.text = reader.read_text(element)?;
        Ok(result)
    }
}

impl QlmDeserialize for InfoItem {
    const TAG: &'static str = "InfoItem";

    fn deserialize_xml(
        reader: &mut XmlReader<'_>,
        element: &Element<'_>,
    ) -> Result<Self, XmlError> {
        let mut result = Self::default();
        for (key, value) in element.attributes(reader)? {
            match key.as_str() {
                "udef" => result.udef = value,
                "name" => result.name = value,
                _ => {}
            }
        }
        reader.read_children(element, |reader, child| match child.name()? {
            "description" => replace(&mut result.description, reader, &child),
            "name" => {
                result.other_names.push(reader.read_text(&child)?);
                Ok(())
            }
            "MetaData" => replace(&mut result.meta_data, reader, &child),
            "value" => push(&mut result.values, reader, &child),
            _ => reader.skip(&child),
        })?;
        Ok(result)
    }
}

impl QlmDeserialize for MetaData {
    const TAG: &'static str = "MetaData";

    fn deserialize_xml(
        reader: &mut XmlReader<'_>,
        element: &Element<'_>,
    ) -> Result<Self, XmlError> {
        let mut result = Self::default();
        reader.read_children(element, |reader, child| match child.name()? {
            "InfoItem" => push(&mut result.info_items, reader, &child),
            _ => reader.skip(&child),
        })?;
        Ok(result)
    }
}

impl QlmDeserialize for Value {
    const TAG: &'static str = "value";

    fn deserialize_xml(
        reader: &mut XmlReader<'_>,
        element: &Element<'_>,
    ) -> Result<Self, XmlError> {
        let mut result = Self::default();
        for (key, value) in element.attributes(reader)? {
            match key.as_str() {
                "type" => result.type_ = value,
                "dateTime" => result.date_time = value,
                "unixTime" => result.unix_time = parse_number("unixTime", &value)?,
                _ => {}
            }
        }
        result.text = reader.read_text(element)?;
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

impl QlmDeserialize for Envelope {
    const TAG: &'static str = ENVELOPE_TAG;

    fn accepts(name: &str) -> bool {
        name == ENVELOPE_TAG || name == LEGACY_ENVELOPE_TAG
    }

    fn deserialize_xml(
        reader: &mut XmlReader<'_>,
        element: &Element<'_>,
    ) -> Result<Self, XmlError> {
        let mut result = Self::default();
        for (key, value) in element.attributes(reader)? {
            match key.as_str() {
                "version" => result.version = value,
                "ttl" => result.ttl = parse_number("ttl", &value)?,
                _ => {}
            }
        }
        reader.read_children(element, |reader, child| {
            let request = match child.name()? {
                "read" => Request::Read(ReadRequest::deserialize_xml(reader, &child)?),
                "write" => Request::Write(WriteRequest::deserialize_xml(reader, &child)?),
                "cancel" => Request::Cancel(CancelRequest::deserialize_xml(reader, &child)?),
                "response" => Request::Response(Response::deserialize_xml(reader, &child)?),
                _ => return reader.skip(&child),
            };
            if let Some(previous) = &result.request {
                tracing::warn!(
                    previous = previous.tag(),
                    current = request.tag(),
                    "envelope carries more than one request, keeping the last"
                );
            }
            result.request = Some(request);
            Ok(())
        })?;
        Ok(result)
    }
}

impl QlmDeserialize for ReadRequest {
    const TAG: &'static str = "read";

    fn deserialize_xml(
        reader: &mut XmlReader<'_>,
        element: &Element<'_>,
    ) -> Result<Self, XmlError> {
        let mut result = Self::default();
        for (key, value) in element.attributes(reader)? {
            match key.as_str() {
                "msgformat" => result.msg_format = value,
                "callback" => result.callback = value,
                "targetType" => result.target_type = value,
                "interval" => result.interval = parse_number("interval", &value)?,
                "oldest" => result.oldest = parse_number("oldest", &value)?,
                "newest" => result.newest = parse_number("newest", &value)?,
                "begin" => result.begin = value,
                "end" => result.end = value,
                _ => {}
            }
        }
        reader.read_children(element, |reader, child| match child.name()? {
            "nodeList" => replace(&mut result.node_list, reader, &child),
            "requestId" => push(&mut result.request_ids, reader, &child),
            "msg" => replace(&mut result.message, reader, &child),
            _ => reader.skip(&child),
        })?;
        Ok(result)
    }
}

impl QlmDeserialize for WriteRequest {
    const TAG: &'static str = "write";

    fn deserialize_xml(
        reader: &mut XmlReader<'_>,
        element: &Element<'_>,
    ) -> Result<Self, XmlError> {
        let mut result = Self::default();
        for (key, value) in element.attributes(reader)? {
            match key.as_str() {
                "callback" => result.callback = value,
                "msgformat" => result.msg_format = value,
                "targetType" => result.target_type = value,
                _ => {}
            }
        }
        reader.read_children(element, |reader, child| match child.name()? {
            "nodeList" => replace(&mut result.node_list, reader, &child),
            "requestId" => push(&mut result.request_ids, reader, &child),
            "msg" => replace(&mut result.message, reader, &child),
            _ => reader.skip(&child),
        })?;
        Ok(result)
    }
}

impl QlmDeserialize for CancelRequest {
    const TAG: &'static str = "cancel";

    fn deserialize_xml(
        reader: &mut XmlReader<'_>,
        element: &Element<'_>,
    ) -> Result<Self, XmlError> {
        let mut result = Self::default();
        reader.read_children(element, |reader, child| match child.name()? {
            "requestId" => push(&mut result.request_ids, reader, &child),
            "nodeList" => replace(&mut result.node_list, reader, &child),
            _ => reader.skip(&child),
        })?;
        Ok(result)
    }
}

impl QlmDeserialize for Response {
    const TAG: &'static str = "response";

    fn deserialize_xml(
        reader: &mut XmlReader<'_>,
        element: &Element<'_>,
    ) -> Result<Self, XmlError> {
        let mut result = Self::default();
        reader.read_children(element, |reader, child| match child.name()? {
            "result" => push(&mut result.results, reader, &child),
            _ => reader.skip(&child),
        })?;
        Ok(result)
    }
}

impl QlmDeserialize for RequestResult {
    const TAG: &'static str = "result";

    fn deserialize_xml(
        reader: &mut XmlReader<'_>,
        element: &Element<'_>,
    ) -> Result<Self, XmlError> {
        let mut result = Self::default();
        for (key, value) in element.attributes(reader)? {
            match key.as_str() {
                "msgformat" => result.msg_format = value,
                "targetType" => result.target_type = value,
                _ => {}
            }
        }
        reader.read_children(element, |reader, child| match child.name()? {
            "return" => replace(&mut result.return_, reader, &child),
            "requestId" => replace(&mut result.request_id, reader, &child),
            "msg" => replace(&mut result.message, reader, &child),
            "nodeList" => replace(&mut result.node_list, reader, &child),
            name if Envelope::accepts(name) || name == RESULT_ENVELOPE_TAG => {
                let envelope = Envelope::deserialize_xml(reader, &child)?;
                result.envelope = Some(Box::new(envelope));
                Ok(())
            }
            _ => reader.skip(&child),
        })?;
        Ok(result)
    }
}

impl QlmDeserialize for Return {
    const TAG: &'static str = "return";

    fn deserialize_xml(
        reader: &mut XmlReader<'_>,
        element: &Element<'_>,
    ) -> Result<Self, XmlError> {
        let mut result = Self::default();
        for (key, value) in element.attributes(reader)? {
            match key.as_str() {
                "returnCode" => result.return_code = value,
                "description" => result.description = value,
                _ => {}
            }
        }
        reader.read_children(element, |reader, child| reader.skip(&child))?;
        Ok(result)
    }
}

impl QlmDeserialize for RequestId {
    const TAG: &'static str = "requestId";

    fn deserialize_xml(
        reader: &mut XmlReader<'_>,
        element: &Element<'_>,
    ) -> Result<Self, XmlError> {
        let mut result = Self::default();
        for (key, value) in element.attributes(reader)? {
            if key == "format" {
                result.format = value;
            }
        }
        result.text = reader.read_text(element)?;
        Ok(result)
    }
}

impl QlmDeserialize for NodeList {
    const TAG: &'static str = "nodeList";

    fn deserialize_xml(
        reader: &mut XmlReader<'_>,
        element: &Element<'_>,
    ) -> Result<Self, XmlError> {
        let mut result = Self::default();
        for (key, value) in element.attributes(reader)? {
            if key == "type" {
                result.type_ = value;
            }
        }
        reader.read_children(element, |reader, child| match child.name()? {
            "node" => {
                result.nodes.push(reader.read_text(&child)?);
                Ok(())
            }
            _ => reader.skip(&child),
        })?;
        Ok(result)
    }
}

impl QlmDeserialize for Message {
    const TAG: &'static str = "msg";

    fn deserialize_xml(
        reader: &mut XmlReader<'_>,
        element: &Element<'_>,
    ) -> Result<Self, XmlError> {
        let data = reader.read_raw(element)?;
        Ok(Self::new(data.into_owned()))
    }
}
