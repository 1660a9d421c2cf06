//! qlm-fmt - validate and pretty-print QLM documents.
//!
//! Reads a data-format document or envelope from a file or stdin, decodes it and
//! writes either its canonical XML encoding or a JSON dump of the decoded tree.
//!
//! # Usage
//!
//! ```text
//! qlm-fmt [--json] [FILE|-]
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `QLM_OUTPUT` | `xml` | Output format (`xml` or `json`) |
//! | `QLM_MAX_DEPTH` | `128` | Maximum element nesting accepted |
//! | `QLM_INDENT` | `4` | Spaces per level; `0` writes a single line |
//! | `QLM_XML_DECLARATION` | `false` | Prefix output with `<?xml ...?>` |
//! | `LOG_LEVEL` | `warn` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod config;

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use qlm_xml::{DocumentKind, decode_envelope_with, decode_objects_with, detect_document};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::{FmtConfig, OutputFormat};

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
/// Logs go to stderr so they never mix with the formatted document.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    Ok(())
}

/// Validate and pretty-print QLM documents.
#[derive(Parser, Debug)]
#[command(name = "qlm-fmt", version, about = "Validate and pretty-print QLM documents")]
struct Args {
    /// Dump the decoded tree as JSON instead of canonical XML
    #[arg(long)]
    json: bool,
    /// Input file; `-` or nothing reads stdin
    input: Option<PathBuf>,
}

impl Args {
    /// Input file to read, or `None` for stdin.
    fn input_path(&self) -> Option<&PathBuf> {
        self.input.as_ref().filter(|path| path.as_path() != Path::new("-"))
    }
}

fn read_input(input: Option<&PathBuf>) -> Result<Vec<u8>> {
    match input {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
        }
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

/// Decode `input` and render it in the configured output format.
fn format_document(input: &[u8], config: &FmtConfig) -> Result<Vec<u8>> {
    let kind = detect_document(input).context("input is not a QLM document")?;
    debug!(?kind, bytes = input.len(), "detected document");

    let mut output = match kind {
        DocumentKind::Objects => {
            let objects =
                decode_objects_with(input, &config.codec).context("invalid data-format document")?;
            match config.output {
                OutputFormat::Xml => qlm_xml::encode_objects_with(&objects, &config.codec)?,
                OutputFormat::Json => serde_json::to_vec_pretty(&objects)?,
            }
        }
        DocumentKind::Envelope => {
            let envelope =
                decode_envelope_with(input, &config.codec).context("invalid envelope")?;
            match config.output {
                OutputFormat::Xml => qlm_xml::encode_envelope_with(&envelope, &config.codec)?,
                OutputFormat::Json => serde_json::to_vec_pretty(&envelope)?,
            }
        }
    };
    output.push(b'\n');
    Ok(output)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = FmtConfig::from_env();
    if args.json {
        config.output = OutputFormat::Json;
    }

    init_tracing(&config.log_level)?;

    let input = read_input(args.input_path())?;
    let output = format_document(&input, &config)?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(&output).context("failed to write output")?;
    stdout.flush().context("failed to write output")?;
    Ok(())
}
