//! Configuration file loading and discovery.
//!
//! Supports YAML and JSON configuration files with automatic discovery.

use super::types::DiffConfig;
use std::path::{Path, PathBuf};

// ============================================================================
// Configuration File Discovery
// ============================================================================

/// Standard config file names to search for.
const CONFIG_FILE_NAMES: &[&str] = &[
    ".poldiff.yaml",
    ".poldiff.yml",
    "poldiff.yaml",
    "poldiff.yml",
    ".poldiff.json",
];

/// Discover a config file by searching standard locations.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Current directory
/// 3. Git repository root (if in a repo)
/// 4. User config directory (~/.config/poldiff/)
/// 5. Home directory
#[must_use]
pub fn discover_config_file(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    let cwd = std::env::current_dir().ok();
    if let Some(path) = cwd.as_deref().and_then(find_config_in_dir) {
        return Some(path);
    }

    if let Some(path) = find_git_root().as_deref().and_then(find_config_in_dir) {
        return Some(path);
    }

    if let Some(path) = dirs::config_dir().and_then(|dir| find_config_in_dir(&dir.join("poldiff"))) {
        return Some(path);
    }

    dirs::home_dir().and_then(|home| find_config_in_dir(&home))
}

/// Find a config file in a specific directory.
fn find_config_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

/// Find the git repository root by walking up the directory tree.
fn find_git_root() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    let mut current = cwd.as_path();
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        current = current.parent()?;
    }
}

// ============================================================================
// Configuration File Loading
// ============================================================================

/// Error type for config file operations.
#[derive(Debug)]
pub enum ConfigFileError {
    /// File not found
    NotFound(PathBuf),
    /// IO error reading file
    Io(std::io::Error),
    /// YAML parsing error
    Parse(serde_yaml::Error),
    /// JSON parsing error
    ParseJson(serde_json::Error),
}

impl std::fmt::Display for ConfigFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => {
                write!(f, "Config file not found: {}", path.display())
            }
            Self::Io(e) => write!(f, "Failed to read config file: {e}"),
            Self::Parse(e) => write!(f, "Failed to parse config file: {e}"),
            Self::ParseJson(e) => write!(f, "Failed to parse config file: {e}"),
        }
    }
}

impl std::error::Error for ConfigFileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::ParseJson(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigFileError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_yaml::Error> for ConfigFileError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Parse(err)
    }
}

impl From<serde_json::Error> for ConfigFileError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseJson(err)
    }
}

/// Load a `DiffConfig` from a YAML or JSON file (chosen by extension).
pub fn load_config_file(path: &Path) -> Result<DiffConfig, ConfigFileError> {
    if !path.exists() {
        return Err(ConfigFileError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let config = if is_json {
        serde_json::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };
    Ok(config)
}

/// Load config from discovered file, or return default.
#[must_use]
pub fn load_or_default(explicit_path: Option<&Path>) -> (DiffConfig, Option<PathBuf>) {
    discover_config_file(explicit_path).map_or_else(
        || (DiffConfig::default(), None),
        |path| match load_config_file(&path) {
            Ok(config) => (config, Some(path)),
            Err(e) => {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                (DiffConfig::default(), None)
            }
        },
    )
}

/// Generate an example config file content.
#[must_use]
pub fn generate_example_config() -> String {
    format!(
        "# poldiff configuration\n# Place this file at .poldiff.yaml in your project root or ~/.config/poldiff/\n\n{}",
        serde_yaml::to_string(&DiffConfig::default()).unwrap_or_default()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiffKind;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_in_dir() {
        let tmp = TempDir::new().unwrap();
        assert!(find_config_in_dir(tmp.path()).is_none());

        std::fs::write(tmp.path().join("poldiff.yml"), "parallel: false\n").unwrap();
        let found = find_config_in_dir(tmp.path()).unwrap();
        assert!(found.ends_with("poldiff.yml"));
    }

    #[test]
    fn test_load_yaml_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".poldiff.yaml");
        std::fs::write(&path, "selection: [access-rules, mls-users]\nparallel: false\n").unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(
            config.selection,
            vec![DiffKind::AccessRules, DiffKind::MlsUsers]
        );
        assert!(!config.parallel);
    }

    #[test]
    fn test_load_json_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".poldiff.json");
        std::fs::write(&path, r#"{"infer_type_map": false}"#).unwrap();

        let config = load_config_file(&path).unwrap();
        assert!(!config.infer_type_map);
        assert_eq!(config.selection, vec![DiffKind::All]);
    }

    #[test]
    fn test_load_missing_and_invalid() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope.yaml");
        assert!(matches!(
            load_config_file(&missing),
            Err(ConfigFileError::NotFound(_))
        ));

        let bad = tmp.path().join("bad.yaml");
        std::fs::write(&bad, "selection: [not-a-kind]\n").unwrap();
        assert!(matches!(load_config_file(&bad), Err(ConfigFileError::Parse(_))));
    }

    #[test]
    fn test_load_or_default_explicit() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.yaml");
        std::fs::write(&path, "derive_type_change_rules: false\n").unwrap();

        let (config, loaded_from) = load_or_default(Some(&path));
        assert!(!config.derive_type_change_rules);
        assert_eq!(loaded_from.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_example_config_parses() {
        let example = generate_example_config();
        let config: DiffConfig = serde_yaml::from_str(&example).unwrap();
        assert_eq!(config, DiffConfig::default());
    }
}
