//! Configuration types for poldiff.
//!
//! All types derive `Serialize`/`Deserialize` for YAML and JSON files and
//! `JsonSchema` for schema generation.

use crate::diff::{DiffKind, DiffSelection};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Settings for one diff run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DiffConfig {
    /// Kinds to compare; `all` covers every kind
    pub selection: Vec<DiffKind>,
    /// Explicit correspondences between renamed or split types
    pub type_remaps: Vec<TypeRemapEntry>,
    /// Match types across policies through their aliases
    pub infer_type_map: bool,
    /// Report rules that only exist through a changed attribute membership
    pub derive_type_change_rules: bool,
    /// Compute independent kinds on the rayon thread pool
    pub parallel: bool,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            selection: vec![DiffKind::All],
            type_remaps: Vec::new(),
            infer_type_map: true,
            derive_type_change_rules: true,
            parallel: true,
        }
    }
}

impl DiffConfig {
    /// Start a builder from defaults.
    pub fn builder() -> DiffConfigBuilder {
        DiffConfigBuilder::default()
    }

    /// Selection flags for the engine.
    #[must_use]
    pub fn selection(&self) -> DiffSelection {
        self.selection.iter().copied().collect()
    }

    /// Remap entries that are switched on.
    pub fn enabled_remaps(&self) -> impl Iterator<Item = &TypeRemapEntry> {
        self.type_remaps.iter().filter(|e| e.enabled)
    }
}

/// Types in the original policy that correspond to types in the modified
/// policy. One side may name several types, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TypeRemapEntry {
    pub original: Vec<String>,
    pub modified: Vec<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl TypeRemapEntry {
    /// A one-to-one remap.
    pub fn new(original: impl Into<String>, modified: impl Into<String>) -> Self {
        Self {
            original: vec![original.into()],
            modified: vec![modified.into()],
            enabled: true,
        }
    }

    /// A remap where either side may list several types.
    pub fn many<I, J, S, T>(original: I, modified: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            original: original.into_iter().map(Into::into).collect(),
            modified: modified.into_iter().map(Into::into).collect(),
            enabled: true,
        }
    }
}

const fn default_true() -> bool {
    true
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`DiffConfig`].
#[derive(Debug, Default)]
#[must_use]
pub struct DiffConfigBuilder {
    config: DiffConfig,
}

impl DiffConfigBuilder {
    /// Replace the selection.
    pub fn selection<I: IntoIterator<Item = DiffKind>>(mut self, kinds: I) -> Self {
        self.config.selection = kinds.into_iter().collect();
        self
    }

    /// Add a type remap entry.
    pub fn type_remap(mut self, entry: TypeRemapEntry) -> Self {
        self.config.type_remaps.push(entry);
        self
    }

    /// Toggle alias-based type inference.
    pub const fn infer_type_map(mut self, enabled: bool) -> Self {
        self.config.infer_type_map = enabled;
        self
    }

    /// Toggle derived attribute-coverage rules.
    pub const fn derive_type_change_rules(mut self, enabled: bool) -> Self {
        self.config.derive_type_change_rules = enabled;
        self
    }

    /// Toggle rayon fan-out.
    pub const fn parallel(mut self, enabled: bool) -> Self {
        self.config.parallel = enabled;
        self
    }

    pub fn build(self) -> DiffConfig {
        self.config
    }
}
