//! Configuration for poldiff runs.
//!
//! This module provides:
//! - Type-safe configuration structures
//! - Validation for all configuration values
//! - Named presets for common runs
//! - YAML/JSON config file loading and discovery
//!
//! # Quick Start
//!
//! ```rust
//! use poldiff::config::{ConfigPreset, DiffConfig, TypeRemapEntry};
//!
//! let config = DiffConfig::from_preset(ConfigPreset::Rules);
//!
//! let config = DiffConfig::builder()
//!     .type_remap(TypeRemapEntry::new("httpd_t", "apache_t"))
//!     .parallel(false)
//!     .build();
//! assert_eq!(config.type_remaps.len(), 1);
//! ```
//!
//! # Configuration File
//!
//! Place a `.poldiff.yaml` file in your project root or `~/.config/poldiff/`:
//!
//! ```yaml
//! selection: [components, access-rules]
//! type_remaps:
//!   - original: [httpd_t]
//!     modified: [apache_t]
//! ```

mod defaults;
pub mod file;
mod types;
mod validation;

pub use defaults::ConfigPreset;
pub use file::{discover_config_file, load_config_file, load_or_default, ConfigFileError};
pub use types::{DiffConfig, DiffConfigBuilder, TypeRemapEntry};
pub use validation::{ConfigError, Validatable};

/// Generate the JSON schema of [`DiffConfig`].
#[must_use]
pub fn generate_json_schema() -> String {
    let schema = schemars::schema_for!(DiffConfig);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_schema_lists_fields() {
        let schema = generate_json_schema();
        assert!(schema.contains("type_remaps"));
        assert!(schema.contains("mls-levels"));
    }
}
