//! File-loading collaborator
//!
//! Resolves a path, reads the configuration text, and hands it to the
//! parser. The parsing core itself never touches the filesystem; this module
//! is the only place that does.

use crate::parser::{self, Document, ParseError};
use std::path::Path;
use thiserror::Error;

/// Conventional httpd.conf location on Debian-family systems
pub const DEFAULT_CONF_PATH: &str = "/etc/apache/httpd.conf";

/// Load error
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Read and parse a configuration file
pub fn load_file(path: impl AsRef<Path>) -> Result<Document, LoadError> {
    let path = path.as_ref();
    tracing::debug!("Loading configuration from {}", path.display());

    let source = std::fs::read_to_string(path)?;
    let document = parser::parse(&source)?;

    tracing::debug!("Parsed {} top-level entries", document.len());
    Ok(document)
}

/// Read and parse the configuration file at its conventional location
pub fn load_default() -> Result<Document, LoadError> {
    load_file(DEFAULT_CONF_PATH)
}
