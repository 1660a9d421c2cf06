//! Value types for the QLM data format and messaging envelope.
//!
//! Two document types share this crate:
//!
//! - [`df`]: the measurement document (`Objects` → `Object` → `InfoItem` → `value`)
//! - [`mi`]: the request/response envelope (`qlmEnvelope` carrying `read`, `write`,
//!   `cancel` or `response`)
//!
//! The types are plain owned trees. Optional XML attributes are stored as plain
//! strings or numbers where the empty string or zero means "absent"; optional child
//! elements are `Option`s. The XML layer lives in `qlm-xml`.

pub mod df;
pub mod mi;

pub use df::{Description, InfoItem, MetaData, Object, Objects, QlmId, Value};
pub use mi::{
    CancelRequest, Envelope, Message, NodeList, ReadRequest, Request, RequestId, RequestResult,
    Response, Return, TtlKind, WriteRequest,
};
