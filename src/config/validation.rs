//! Configuration validation for poldiff.

use super::types::{DiffConfig, TypeRemapEntry};
use std::collections::HashSet;

// ============================================================================
// Configuration Error
// ============================================================================

/// Error type for configuration validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// The field that failed validation
    pub field: String,
    /// Description of the validation error
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Validation Trait
// ============================================================================

/// Trait for validatable configuration types.
pub trait Validatable {
    /// Validate the configuration, returning any errors found.
    fn validate(&self) -> Vec<ConfigError>;

    /// Check if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

// ============================================================================
// Validation Implementations
// ============================================================================

impl Validatable for DiffConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut seen_original: HashSet<&str> = HashSet::new();
        let mut seen_modified: HashSet<&str> = HashSet::new();

        for (idx, entry) in self.enabled_remaps().enumerate() {
            let field = format!("type_remaps[{idx}]");
            errors.extend(entry.validate().into_iter().map(|e| ConfigError {
                field: format!("{field}.{}", e.field),
                message: e.message,
            }));

            for name in &entry.original {
                if !seen_original.insert(name.as_str()) {
                    errors.push(ConfigError {
                        field: format!("{field}.original"),
                        message: format!("type '{name}' appears in more than one remap"),
                    });
                }
            }
            for name in &entry.modified {
                if !seen_modified.insert(name.as_str()) {
                    errors.push(ConfigError {
                        field: format!("{field}.modified"),
                        message: format!("type '{name}' appears in more than one remap"),
                    });
                }
            }
        }

        errors
    }
}

impl Validatable for TypeRemapEntry {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.original.is_empty() {
            errors.push(ConfigError {
                field: "original".to_string(),
                message: "must name at least one type".to_string(),
            });
        }
        if self.modified.is_empty() {
            errors.push(ConfigError {
                field: "modified".to_string(),
                message: "must name at least one type".to_string(),
            });
        }
        if self.original.len() > 1 && self.modified.len() > 1 {
            errors.push(ConfigError {
                field: "modified".to_string(),
                message: "many-to-many remaps are not supported".to_string(),
            });
        }
        errors
    }
}
