//! Formatter configuration.

use qlm_xml::CodecConfig;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// How decoded documents are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutputFormat {
    /// Canonical QLM XML.
    #[default]
    Xml,
    /// Pretty-printed JSON dump of the decoded tree.
    Json,
}

impl OutputFormat {
    /// Parse `xml` or `json`, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("xml") {
            Some(Self::Xml)
        } else if value.eq_ignore_ascii_case("json") {
            Some(Self::Json)
        } else {
            None
        }
    }
}

/// Formatter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct FmtConfig {
    /// Log level filter used when `RUST_LOG` is unset.
    #[builder(default = String::from("warn"))]
    pub log_level: String,

    /// Output format.
    #[builder(default)]
    pub output: OutputFormat,

    /// Codec settings for decoding and re-encoding.
    #[builder(default)]
    pub codec: CodecConfig,
}

impl Default for FmtConfig {
    fn default() -> Self {
        Self {
            log_level: String::from("warn"),
            output: OutputFormat::Xml,
            codec: CodecConfig::default(),
        }
    }
}

impl FmtConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `LOG_LEVEL` | `warn` |
    /// | `QLM_OUTPUT` | `xml` |
    ///
    /// Codec settings come from [`CodecConfig::from_env`].
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self {
            codec: CodecConfig::from_env(),
            ..Self::default()
        };

        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Ok(v) = std::env::var("QLM_OUTPUT") {
            if let Some(output) = OutputFormat::parse(&v) {
                config.output = output;
            }
        }

        config
    }
}
