//! Error types for QLM XML encoding and decoding.

use std::io;

/// Errors that can occur during QLM XML encoding or decoding.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// An I/O error during XML writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not well-formed XML.
    #[error("malformed XML at byte {position}: {source}")]
    Malformed {
        /// Byte offset where the reader detected the problem.
        position: u64,
        /// Underlying reader error.
        #[source]
        source: quick_xml::Error,
    },

    /// An error from quick-xml attribute handling.
    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    /// A required XML element was missing.
    #[error("missing required XML element: {0}")]
    MissingElement(String),

    /// An unexpected XML element was encountered.
    #[error("unexpected XML element: {0}")]
    UnexpectedElement(String),

    /// An error parsing a value from XML text content.
    #[error("failed to parse value: {0}")]
    ParseError(String),

    /// Elements are nested deeper than the configured maximum.
    #[error("XML nesting exceeds the maximum depth of {limit}")]
    DepthExceeded {
        /// The configured maximum depth.
        limit: usize,
    },
}

/// Coarse classification of an [`XmlError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The input is not a well-formed document of the expected type.
    MalformedInput,
    /// Nesting exceeded the configured safety bound.
    DepthExceeded,
    /// The output could not be written.
    EncodingFailure,
}

impl XmlError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::EncodingFailure,
            Self::DepthExceeded { .. } => ErrorKind::DepthExceeded,
            Self::Malformed { .. }
            | Self::Attribute(_)
            | Self::MissingElement(_)
            | Self::UnexpectedElement(_)
            | Self::ParseError(_) => ErrorKind::MalformedInput,
        }
    }

    /// Byte offset of the failure, when the reader reported one.
    #[must_use]
    pub fn position(&self) -> Option<u64> {
        match self {
            Self::Malformed { position, .. } => Some(*position),
            _ => None,
        }
    }
}
