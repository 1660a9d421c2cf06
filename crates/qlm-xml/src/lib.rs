//! QLM XML serialization/deserialization.
//!
//! This crate provides the XML layer for the QLM data format and messaging
//! envelope, converting between `qlm-model` types and the wire format produced
//! by the legacy nodes.
//!
//! # Key components
//!
//! - [`QlmSerialize`] trait and [`to_xml`] function for writing documents
//! - [`QlmDeserialize`] trait and [`from_xml`] function for reading documents
//! - [`encode_objects`]/[`decode_objects`] and [`encode_envelope`]/[`decode_envelope`]
//!   as the typed entry points
//! - [`detect_document`] to tell the two document kinds apart
//!
//! # QLM XML conventions
//!
//! - Data-format root: `<Objects xmlns:xsi="..." xsi:noNamespaceSchemaLocation="odf.xsd">`
//! - Envelope root: `<qlmEnvelope version="..." ttl="...">`
//! - Empty string and zero attributes are omitted
//! - `<msg>` content is an opaque payload, kept byte-for-byte
//! - Four-space indentation and no XML declaration by default

pub mod config;
pub mod deserialize;
pub mod error;
pub mod reader;
pub mod serialize;
pub mod writer;

pub use config::CodecConfig;
pub use deserialize::{
    DocumentKind, QlmDeserialize, decode_envelope, decode_envelope_with, decode_objects,
    decode_objects_with, detect_document, from_xml,
};
pub use error::{ErrorKind, XmlError};
pub use serialize::{
    ODF_SCHEMA_LOCATION, QlmSerialize, XSI_NAMESPACE, encode_envelope, encode_envelope_with,
    encode_objects, encode_objects_with, to_xml,
};
