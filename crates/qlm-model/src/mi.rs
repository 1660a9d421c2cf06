//! Messaging envelope types.
//!
//! An [`Envelope`] carries at most one [`Request`] body. Payloads travel in
//! [`Message`]s as raw inner XML which this layer never interprets.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Sentinel ttl meaning "valid forever".
pub const TTL_INFINITE: f64 = -1.0;

/// Sentinel ttl meaning "answer immediately".
pub const TTL_IMMEDIATE: f64 = 0.0;

/// Outer protocol message (`<qlmEnvelope>`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Protocol version. Always written.
    pub version: String,
    /// Time to live in seconds; see [`TtlKind`].
    pub ttl: f64,
    /// The request or response carried; `None` is a degenerate but valid envelope.
    pub request: Option<Request>,
}

impl Envelope {
    /// Create an envelope carrying the given body.
    #[must_use]
    pub fn new(version: impl Into<String>, ttl: f64, request: Request) -> Self {
        Self {
            version: version.into(),
            ttl,
            request: Some(request),
        }
    }

    /// Create a response envelope from a list of results.
    #[must_use]
    pub fn response(version: impl Into<String>, ttl: f64, results: Vec<RequestResult>) -> Self {
        Self::new(version, ttl, Request::Response(Response { results }))
    }

    /// Classify the ttl value.
    #[must_use]
    pub fn ttl_kind(&self) -> TtlKind {
        TtlKind::from_seconds(self.ttl)
    }

    /// The read body, if this envelope carries one.
    #[must_use]
    pub fn read(&self) -> Option<&ReadRequest> {
        match &self.request {
            Some(Request::Read(r)) => Some(r),
            _ => None,
        }
    }

    /// The write body, if this envelope carries one.
    #[must_use]
    pub fn write(&self) -> Option<&WriteRequest> {
        match &self.request {
            Some(Request::Write(w)) => Some(w),
            _ => None,
        }
    }

    /// The cancel body, if this envelope carries one.
    #[must_use]
    pub fn cancel(&self) -> Option<&CancelRequest> {
        match &self.request {
            Some(Request::Cancel(c)) => Some(c),
            _ => None,
        }
    }

    /// The response body, if this envelope carries one.
    #[must_use]
    pub fn response_body(&self) -> Option<&Response> {
        match &self.request {
            Some(Request::Response(r)) => Some(r),
            _ => None,
        }
    }
}

/// Interpretation of an envelope ttl.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TtlKind {
    /// Negative ttl: the request stays valid until cancelled.
    Infinite,
    /// Zero ttl: no waiting, answer with what is available now.
    Immediate,
    /// Positive ttl in seconds.
    Seconds(Duration),
}

impl TtlKind {
    /// Classify a ttl given in (possibly fractional) seconds.
    #[must_use]
    pub fn from_seconds(ttl: f64) -> Self {
        if ttl < 0.0 {
            Self::Infinite
        } else if ttl == 0.0 || ttl.is_nan() {
            Self::Immediate
        } else {
            Duration::try_from_secs_f64(ttl).map_or(Self::Infinite, Self::Seconds)
        }
    }
}

/// The body carried by an envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Request {
    /// `<read>`: one-time read or subscription.
    Read(ReadRequest),
    /// `<write>`: publish or write values.
    Write(WriteRequest),
    /// `<cancel>`: cancel subscriptions.
    Cancel(CancelRequest),
    /// `<response>`: results of earlier requests.
    Response(Response),
}

impl Request {
    /// Element name used on the wire.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Read(_) => "read",
            Self::Write(_) => "write",
            Self::Cancel(_) => "cancel",
            Self::Response(_) => "response",
        }
    }
}

/// `<response>` body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// One result per answered request.
    pub results: Vec<RequestResult>,
}

/// One `<result>` of a response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResult {
    /// Status of the answered request.
    #[serde(rename = "return")]
    pub return_: Option<Return>,
    /// Identifier of the answered request.
    pub request_id: Option<RequestId>,
    /// Payload.
    pub message: Option<Message>,
    /// Nodes the result applies to.
    pub node_list: Option<NodeList>,
    /// Envelope forwarded inside the result.
    pub envelope: Option<Box<Envelope>>,
    /// Format of the payload, e.g. `"QLMdf"` or `"CSV"`.
    pub msg_format: String,
    /// Target type, e.g. `"device"`.
    pub target_type: String,
}

impl RequestResult {
    /// Create a result holding only a status.
    #[must_use]
    pub fn status(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            return_: Some(Return {
                return_code: code.into(),
                description: description.into(),
            }),
            ..Self::default()
        }
    }
}

/// Status of a result (`<return>`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Return {
    /// HTTP-like status code. Always written.
    pub return_code: String,
    /// Human-readable status.
    pub description: String,
}

impl Return {
    /// Whether the code is in the 2xx class.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.return_code.len() == 3 && self.return_code.starts_with('2')
    }
}

/// Request identifier (`<requestId>`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestId {
    /// Identifier format.
    pub format: String,
    /// Identifier value.
    pub text: String,
}

impl RequestId {
    /// Create an identifier with no format.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            format: String::new(),
            text: text.into(),
        }
    }
}

/// List of addressable endpoints (`<nodeList>`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeList {
    /// Kind of node addresses, e.g. `"URL"`.
    #[serde(rename = "type")]
    pub type_: String,
    /// Node addresses in order.
    pub nodes: Vec<String>,
}

impl NodeList {
    /// Create a `type="URL"` list.
    #[must_use]
    pub fn urls<I, S>(nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            type_: "URL".to_owned(),
            nodes: nodes.into_iter().map(Into::into).collect(),
        }
    }
}

/// Opaque payload (`<msg>`).
///
/// `data` is the raw inner content, markup and whitespace included. It is written
/// back verbatim, without escaping.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Raw inner XML or text.
    pub data: String,
}

impl Message {
    /// Wrap raw payload content.
    #[must_use]
    pub fn new(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }
}

/// `<read>` body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadRequest {
    /// Nodes to read from.
    pub node_list: Option<NodeList>,
    /// Earlier requests this read refers to (poll by id).
    pub request_ids: Vec<RequestId>,
    /// Payload describing what to read.
    pub message: Option<Message>,
    /// Payload format.
    pub msg_format: String,
    /// Address where subscription results are delivered.
    pub callback: String,
    /// Target type.
    pub target_type: String,
    /// Subscription interval in seconds; zero means a one-time read.
    pub interval: f64,
    /// Number of oldest values requested.
    pub oldest: i64,
    /// Number of newest values requested.
    pub newest: i64,
    /// Start of the requested time range.
    pub begin: String,
    /// End of the requested time range.
    pub end: String,
}

/// `<write>` body.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteRequest {
    /// Nodes to write to.
    pub node_list: Option<NodeList>,
    /// Related request identifiers.
    pub request_ids: Vec<RequestId>,
    /// Values to write.
    pub message: Option<Message>,
    /// Address where the result is delivered.
    pub callback: String,
    /// Payload format.
    pub msg_format: String,
    /// Target type.
    pub target_type: String,
}

/// `<cancel>` body.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    /// Requests to cancel, in order.
    pub request_ids: Vec<RequestId>,
    /// Nodes the cancellation applies to.
    pub node_list: Option<NodeList>,
}
