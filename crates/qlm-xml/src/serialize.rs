//! QLM XML serialization: converting model types to XML.
//!
//! Every [`QlmSerialize`] implementation writes its own element, tag and attributes
//! included, so the same code serves both document roots and nested positions.
//! Attribute and child order follow the wire contract of the legacy producers:
//!
//! - empty string attributes and zero numeric attributes are omitted;
//! - `InfoItem/@name`, `return/@returnCode` and the envelope's `version`/`ttl`
//!   are always written;
//! - `msg` content is spliced in verbatim.

use std::io::{self, Write};

use qlm_model::df::{Description, InfoItem, MetaData, Object, Objects, QlmId, Value};
use qlm_model::mi::{
    CancelRequest, Envelope, Message, NodeList, ReadRequest, Request, RequestId, RequestResult,
    Response, Return, WriteRequest,
};
use quick_xml::events::BytesStart;

use crate::config::CodecConfig;
use crate::error::XmlError;
use crate::writer::{
    XmlWriter, format_float, push_attr, push_optional_attr, push_optional_float,
    push_optional_int,
};

/// XML Schema instance namespace declared on every data-format document.
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Schema file referenced by `xsi:noNamespaceSchemaLocation`.
pub const ODF_SCHEMA_LOCATION: &str = "odf.xsd";

/// Root element of data-format documents.
pub const OBJECTS_TAG: &str = "Objects";

/// Root element of envelopes.
pub const ENVELOPE_TAG: &str = "qlmEnvelope";

/// Element of an envelope nested inside a `<result>`.
pub const RESULT_ENVELOPE_TAG: &str = "QlmEnvelope";

/// Trait for serializing QLM types to XML.
///
/// Uses `io::Result` because the only failure is the underlying sink.
pub trait QlmSerialize {
    /// Serialize this value as one XML element into the given writer.
    ///
    /// # Errors
    ///
    /// Returns `io::Error` if writing to the underlying writer fails.
    fn serialize_xml<W: Write>(&self, writer: &mut XmlWriter<W>) -> io::Result<()>;
}

/// Serialize a value as a standalone XML document.
///
/// # Errors
///
/// Returns `XmlError` if serialization fails.
pub fn to_xml<T: QlmSerialize>(value: &T, config: &CodecConfig) -> Result<Vec<u8>, XmlError> {
    let mut writer = XmlWriter::new(Vec::with_capacity(512), config.indent);
    if config.xml_declaration {
        writer.declaration()?;
    }
    value.serialize_xml(&mut writer)?;
    Ok(writer.into_inner())
}

/// Encode a data-format document with the default configuration.
pub fn encode_objects(objects: &Objects) -> Result<Vec<u8>, XmlError> {
    encode_objects_with(objects, &CodecConfig::default())
}

/// Encode a data-format document.
pub fn encode_objects_with(objects: &Objects, config: &CodecConfig) -> Result<Vec<u8>, XmlError> {
    to_xml(objects, config)
}

/// Encode an envelope with the default configuration.
pub fn encode_envelope(envelope: &Envelope) -> Result<Vec<u8>, XmlError> {
    encode_envelope_with(envelope, &CodecConfig::default())
}

/// Encode an envelope.
pub fn encode_envelope_with(envelope: &Envelope, config: &CodecConfig) -> Result<Vec<u8>, XmlError> {
    to_xml(envelope, config)
}

/// Write a `Vec` of serializable children.
fn write_all<W: Write, T: QlmSerialize>(writer: &mut XmlWriter<W>, items: &[T]) -> io::Result<()> {
    items.iter().try_for_each(|item| item.serialize_xml(writer))
}

/// Write an optional serializable child.
fn write_optional<W: Write, T: QlmSerialize>(
    writer: &mut XmlWriter<W>,
    item: Option<&T>,
) -> io::Result<()> {
    match item {
        Some(item) => item.serialize_xml(writer),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Data-format document
// ---------------------------------------------------------------------------

impl QlmSerialize for Objects {
    fn serialize_xml<W: Write>(&self, writer: &mut XmlWriter<W>) -> io::Result<()> {
        let mut tag = BytesStart::new(OBJECTS_TAG);
        tag.push_attribute(("xmlns:xsi", XSI_NAMESPACE));
        tag.push_attribute(("xsi:noNamespaceSchemaLocation", ODF_SCHEMA_LOCATION));
        push_optional_attr(&mut tag, "version", &self.version);
        writer.element(tag, |w| write_all(w, &self.objects))
    }
}

impl QlmSerialize for Object {
    fn serialize_xml<W: Write>(&self, writer: &mut XmlWriter<W>) -> io::Result<()> {
        let mut tag = BytesStart::new("Object");
        push_optional_attr(&mut tag, "type", &self.type_);
        push_optional_attr(&mut tag, "udef", &self.udef);
        writer.element(tag, |w| {
            write_optional(w, self.id.as_ref())?;
            write_optional(w, self.description.as_ref())?;
            write_all(w, &self.info_items)?;
            write_all(w, &self.objects)
        })
    }
}

impl QlmSerialize for QlmId {
    fn serialize_xml<W: Write>(&self, writer: &mut XmlWriter<W>) -> io::Result<()> {
        let mut tag = BytesStart::new("id");
        push_optional_attr(&mut tag, "idType", &self.id_type);
        push_optional_attr(&mut tag, "tagType", &self.tag_type);
        push_optional_attr(&mut tag, "startDate", &self.start_date);
        push_optional_attr(&mut tag, "endDate", &self.end_date);
        push_optional_attr(&mut tag, "udef", &self.udef);
        writer.text_element(tag, &self.text)
    }
}

impl QlmSerialize for Description {
    fn serialize_xml<W: Write>(&self, writer: &mut XmlWriter<W>) -> io::Result<()> {
        let mut tag = BytesStart::new("description");
        push_optional_attr(&mut tag, "lang", &self.lang);
        push_optional_attr(&mut tag, "udef", &self.udef);
        writer.text_element(tag, &self.text)
    }
}

impl QlmSerialize for InfoItem {
    fn serialize_xml<W: Write>(&self, writer: &mut XmlWriter<W>) -> io::Result<()> {
        let mut tag = BytesStart::new("InfoItem");
        push_optional_attr(&mut tag, "udef", &self.udef);
        push_attr(&mut tag, "name", &self.name);
        writer.element(tag, |w| {
            write_optional(w, self.description.as_ref())?;
            for name in &self.other_names {
                w.text_element(BytesStart::new("name"), name)?;
            }
            write_optional(w, self.meta_data.as_ref())?;
            write_all(w, &self.values)
        })
    }
}

impl QlmSerialize for MetaData {
    fn serialize_xml<W: Write>(&self, writer: &mut XmlWriter<W>) -> io::Result<()> {
        writer.element(BytesStart::new("MetaData"), |w| {
            write_all(w, &self.info_items)
        })
    }
}

impl QlmSerialize for Value {
    fn serialize_xml<W: Write>(&self, writer: &mut XmlWriter<W>) -> io::Result<()> {
        let mut tag = BytesStart::new("value");
        push_optional_attr(&mut tag, "type", &self.type_);
        push_optional_attr(&mut tag, "dateTime", &self.date_time);
        push_optional_int(&mut tag, "unixTime", self.unix_time);
        writer.text_element(tag, &self.text)
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

impl QlmSerialize for Envelope {
    fn serialize_xml<W: Write>(&self, writer: &mut XmlWriter<W>) -> io::Result<()> {
        write_envelope(writer, self, ENVELOPE_TAG)
    }
}

/// Write an envelope under the given element name.
fn write_envelope<W: Write>(
    writer: &mut XmlWriter<W>,
    envelope: &Envelope,
    name: &str,
) -> io::Result<()> {
    let mut tag = BytesStart::new(name);
    push_attr(&mut tag, "version", &envelope.version);
    push_attr(&mut tag, "ttl", &format_float(envelope.ttl));
    writer.element(tag, |w| write_optional(w, envelope.request.as_ref()))
}

impl QlmSerialize for Request {
    fn serialize_xml<W: Write>(&self, writer: &mut XmlWriter<W>) -> io::Result<()> {
        match self {
            Self::Read(read) => read.serialize_xml(writer),
            Self::Write(write) => write.serialize_xml(writer),
            Self::Cancel(cancel) => cancel.serialize_xml(writer),
            Self::Response(response) => response.serialize_xml(writer),
        }
    }
}

impl QlmSerialize for ReadRequest {
    fn serialize_xml<W: Write>(&self, writer: &mut XmlWriter<W>) -> io::Result<()> {
        let mut tag = BytesStart::new("read");
        push_optional_attr(&mut tag, "msgformat", &self.msg_format);
        push_optional_attr(&mut tag, "callback", &self.callback);
        push_optional_attr(&mut tag, "targetType", &self.target_type);
        push_optional_float(&mut tag, "interval", self.interval);
        push_optional_int(&mut tag, "oldest", self.oldest);
        push_optional_int(&mut tag, "newest", self.newest);
        push_optional_attr(&mut tag, "begin", &self.begin);
        push_optional_attr(&mut tag, "end", &self.end);
        writer.element(tag, |w| {
            write_optional(w, self.node_list.as_ref())?;
            write_all(w, &self.request_ids)?;
            write_optional(w, self.message.as_ref())
        })
    }
}

impl QlmSerialize for WriteRequest {
    fn serialize_xml<W: Write>(&self, writer: &mut XmlWriter<W>) -> io::Result<()> {
        let mut tag = BytesStart::new("write");
        push_optional_attr(&mut tag, "callback", &self.callback);
        push_optional_attr(&mut tag, "msgformat", &self.msg_format);
        push_optional_attr(&mut tag, "targetType", &self.target_type);
        writer.element(tag, |w| {
            write_optional(w, self.node_list.as_ref())?;
            write_all(w, &self.request_ids)?;
            write_optional(w, self.message.as_ref())
        })
    }
}

impl QlmSerialize for CancelRequest {
    fn serialize_xml<W: Write>(&self, writer: &mut XmlWriter<W>) -> io::Result<()> {
        writer.element(BytesStart::new("cancel"), |w| {
            write_all(w, &self.request_ids)?;
            write_optional(w, self.node_list.as_ref())
        })
    }
}

impl QlmSerialize for Response {
    fn serialize_xml<W: Write>(&self, writer: &mut XmlWriter<W>) -> io::Result<()> {
        writer.element(BytesStart::new("response"), |w| {
            write_all(w, &self.results)
        })
    }
}

impl QlmSerialize for RequestResult {
    fn serialize_xml<W: Write>(&self, writer: &mut XmlWriter<W>) -> io::Result<()> {
        let mut tag = BytesStart::new("result");
        push_optional_attr(&mut tag, "msgformat", &self.msg_format);
        push_optional_attr(&mut tag, "targetType", &self.target_type);
        writer.element(tag, |w| {
            write_optional(w, self.return_.as_ref())?;
            write_optional(w, self.request_id.as_ref())?;
            write_optional(w, self.message.as_ref())?;
            write_optional(w, self.node_list.as_ref())?;
            match self.envelope.as_deref() {
                Some(envelope) => write_envelope(w, envelope, RESULT_ENVELOPE_TAG),
                None => Ok(()),
            }
        })
    }
}

impl QlmSerialize for Return {
    fn serialize_xml<W: Write>(&self, writer: &mut XmlWriter<W>) -> io::Result<()> {
        let mut tag = BytesStart::new("return");
        push_attr(&mut tag, "returnCode", &self.return_code);
        push_optional_attr(&mut tag, "description", &self.description);
        writer.element(tag, |_| Ok(()))
    }
}

impl QlmSerialize for RequestId {
    fn serialize_xml<W: Write>(&self, writer: &mut XmlWriter<W>) -> io::Result<()> {
        let mut tag = BytesStart::new("requestId");
        push_optional_attr(&mut tag, "format", &self.format);
        writer.text_element(tag, &self.text)
    }
}

impl QlmSerialize for NodeList {
    fn serialize_xml<W: Write>(&self, writer: &mut XmlWriter<W>) -> io::Result<()> {
        let mut tag = BytesStart::new("nodeList");
        push_optional_attr(&mut tag, "type", &self.type_);
        writer.element(tag, |w| {
            for node in &self.nodes {
                w.text_element(BytesStart::new("node"), node)?;
            }
            Ok(())
        })
    }
}

impl QlmSerialize for Message {
    fn serialize_xml<W: Write>(&self, writer: &mut XmlWriter<W>) -> io::Result<()> {
        writer.element(BytesStart::new("msg"), |w| w.raw(&self.data))
    }
}
