//! Snapshot format detection.

/// Serialization of a snapshot document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Yaml,
}

/// Detect the format from the first meaningful character.
///
/// JSON documents open with `{`; everything else is handed to the YAML
/// parser, which also accepts flow-style JSON-like input.
pub fn detect_format(content: &str) -> SnapshotFormat {
    let first = content
        .trim_start_matches('\u{feff}')
        .trim_start()
        .chars()
        .next();
    match first {
        Some('{') => SnapshotFormat::Json,
        _ => SnapshotFormat::Yaml,
    }
}
