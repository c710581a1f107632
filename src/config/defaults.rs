//! Named presets for common diff runs.

use super::types::DiffConfig;
use crate::diff::DiffKind;

/// Named configuration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPreset {
    /// Every kind, alias inference and derived rules on
    Default,
    /// Symbol tables only
    Components,
    /// Every rule family
    Rules,
    /// Categories, levels, users and range transitions
    Mls,
}

impl ConfigPreset {
    /// Get the preset name as a string.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Components => "components",
            Self::Rules => "rules",
            Self::Mls => "mls",
        }
    }

    /// Parse a preset from a string name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "default" | "all" => Some(Self::Default),
            "components" | "symbols" => Some(Self::Components),
            "rules" => Some(Self::Rules),
            "mls" => Some(Self::Mls),
            _ => None,
        }
    }

    /// Get a description of this preset.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Default => "Compare every symbol table and rule family",
            Self::Components => "Compare types, attributes, roles, classes, commons and booleans",
            Self::Rules => "Compare access-vector, type-enforcement, role and range rules",
            Self::Mls => "Compare categories, levels, users and range transitions",
        }
    }

    /// Get all available presets.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Default, Self::Components, Self::Rules, Self::Mls]
    }

    /// Kinds this preset selects.
    #[must_use]
    pub fn kinds(&self) -> Vec<DiffKind> {
        match self {
            Self::Default => vec![DiffKind::All],
            Self::Components => vec![DiffKind::Components],
            Self::Rules => vec![
                DiffKind::AccessRules,
                DiffKind::TypeEnforcementRules,
                DiffKind::RoleAllowRules,
                DiffKind::RoleTransitionRules,
                DiffKind::RangeTransitionRules,
            ],
            Self::Mls => vec![
                DiffKind::MlsCategories,
                DiffKind::MlsLevels,
                DiffKind::MlsUsers,
                DiffKind::RangeTransitionRules,
            ],
        }
    }
}

impl std::fmt::Display for ConfigPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl DiffConfig {
    /// Create a configuration from a preset.
    pub fn from_preset(preset: ConfigPreset) -> Self {
        Self {
            selection: preset.kinds(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_names_roundtrip() {
        for preset in ConfigPreset::all() {
            assert_eq!(ConfigPreset::from_name(preset.name()), Some(*preset));
            assert!(!preset.description().is_empty());
        }
        assert_eq!(ConfigPreset::from_name("MLS"), Some(ConfigPreset::Mls));
        assert_eq!(ConfigPreset::from_name("unknown"), None);
    }

    #[test]
    fn test_from_preset() {
        let config = DiffConfig::from_preset(ConfigPreset::Rules);
        let selection = config.selection();
        assert!(selection.contains(DiffKind::AccessRules));
        assert!(!selection.contains(DiffKind::Components));
        assert!(config.infer_type_map);
    }
}
