//! Codec configuration.
//!
//! Provides [`CodecConfig`] for tuning encoder layout and decoder safety limits.
//! Values can be loaded from environment variables via [`CodecConfig::from_env`].

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Default maximum XML element nesting depth accepted by the decoder.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Default indentation width, in spaces, of encoded documents.
pub const DEFAULT_INDENT: usize = 4;

/// Encoder and decoder configuration.
///
/// # Examples
///
/// ```
/// use qlm_xml::CodecConfig;
///
/// let config = CodecConfig::builder().max_depth(16).build();
/// assert_eq!(config.max_depth, 16);
/// assert_eq!(config.indent, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct CodecConfig {
    /// Maximum element nesting depth while decoding; the root element is depth 1.
    #[builder(default = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Spaces per nesting level when encoding. Zero writes everything on one line.
    #[builder(default = DEFAULT_INDENT)]
    pub indent: usize,

    /// Whether to start encoded documents with an `<?xml ...?>` declaration.
    #[builder(default = false)]
    pub xml_declaration: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            indent: DEFAULT_INDENT,
            xml_declaration: false,
        }
    }
}

impl CodecConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `QLM_MAX_DEPTH` | `128` |
    /// | `QLM_INDENT` | `4` |
    /// | `QLM_XML_DECLARATION` | `false` |
    ///
    /// Unparseable values are ignored.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("QLM_MAX_DEPTH") {
            if let Ok(n) = v.parse::<usize>() {
                config.max_depth = n;
            }
        }
        if let Ok(v) = std::env::var("QLM_INDENT") {
            if let Ok(n) = v.parse::<usize>() {
                config.indent = n;
            }
        }
        if let Ok(v) = std::env::var("QLM_XML_DECLARATION") {
            config.xml_declaration = parse_bool(&v);
        }

        config
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
