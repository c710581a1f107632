//! Policy snapshot loading.
//!
//! Snapshots are the serialized form of [`PolicySnapshot`]: JSON or YAML
//! documents listing declarations and rules. The format is detected from
//! the content, so file extensions do not matter.
//!
//! ## Usage
//!
//! ```no_run
//! use poldiff::parsers::parse_policy;
//! use std::path::Path;
//!
//! let policy = parse_policy(Path::new("base-policy.json")).unwrap();
//! println!("{} types", policy.index().types.len());
//! ```

mod detection;

pub use detection::{SnapshotFormat, detect_format};

use crate::error::{ParseErrorKind, PolicyDiffError};
use crate::model::{Policy, PolicySnapshot};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading a snapshot
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("JSON parse error: {0}")]
    JsonError(String),

    #[error("YAML parse error: {0}")]
    YamlError(String),

    #[error("Invalid snapshot structure: {0}")]
    InvalidStructure(String),

    #[error("Snapshot is {size} bytes, exceeding the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },
}

impl From<std::io::Error> for ParseError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ParseError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::YamlError(err.to_string())
    }
}

impl From<ParseError> for PolicyDiffError {
    fn from(err: ParseError) -> Self {
        let kind = match err {
            ParseError::JsonError(msg) => ParseErrorKind::InvalidJson(msg),
            ParseError::YamlError(msg) => ParseErrorKind::InvalidYaml(msg),
            ParseError::TooLarge { size, limit } => ParseErrorKind::TooLarge { size, limit },
            ParseError::IoError(msg) => ParseErrorKind::InvalidValue {
                field: "<file>".to_string(),
                message: msg,
            },
            ParseError::InvalidStructure(msg) => ParseErrorKind::InvalidValue {
                field: "<snapshot>".to_string(),
                message: msg,
            },
        };
        Self::parse("loading policy snapshot", kind)
    }
}

/// Maximum snapshot file size (256 MB).
pub const MAX_SNAPSHOT_SIZE: u64 = 256 * 1024 * 1024;

/// Load and index a snapshot file.
///
/// Returns an error if the file exceeds [`MAX_SNAPSHOT_SIZE`].
pub fn parse_policy(path: &Path) -> Result<Policy, ParseError> {
    let metadata = std::fs::metadata(path)?;
    if metadata.len() > MAX_SNAPSHOT_SIZE {
        return Err(ParseError::TooLarge {
            size: metadata.len(),
            limit: MAX_SNAPSHOT_SIZE,
        });
    }

    let content = std::fs::read_to_string(path)?;
    let policy = parse_policy_str(&content)?;
    tracing::info!(path = %path.display(), "loaded policy snapshot");
    Ok(policy)
}

/// Parse and index a snapshot from string content.
pub fn parse_policy_str(content: &str) -> Result<Policy, ParseError> {
    let snapshot = parse_snapshot_str(content)?;
    Policy::from_snapshot(snapshot).map_err(|e| ParseError::InvalidStructure(e.to_string()))
}

/// Parse the declarations only, without indexing.
pub fn parse_snapshot_str(content: &str) -> Result<PolicySnapshot, ParseError> {
    match detect_format(content) {
        SnapshotFormat::Json => Ok(serde_json::from_str(content)?),
        SnapshotFormat::Yaml => Ok(serde_yaml::from_str(content)?),
    }
}
