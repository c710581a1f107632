//! Which kinds a diff run covers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A selectable kind of difference.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum DiffKind {
    /// Types, attributes, roles, classes, commons and booleans
    Components,
    AccessRules,
    TypeEnforcementRules,
    RoleAllowRules,
    RoleTransitionRules,
    RangeTransitionRules,
    MlsCategories,
    MlsLevels,
    MlsUsers,
    All,
}

impl DiffKind {
    /// Every kind except [`DiffKind::All`].
    pub const INDIVIDUAL: [Self; 9] = [
        Self::Components,
        Self::AccessRules,
        Self::TypeEnforcementRules,
        Self::RoleAllowRules,
        Self::RoleTransitionRules,
        Self::RangeTransitionRules,
        Self::MlsCategories,
        Self::MlsLevels,
        Self::MlsUsers,
    ];

    const fn bit(self) -> u16 {
        1 << (self as u16)
    }

    /// Kinds that have nothing to compare without MLS data.
    #[must_use]
    pub const fn requires_mls(self) -> bool {
        matches!(
            self,
            Self::MlsCategories | Self::MlsLevels | Self::RangeTransitionRules
        )
    }

    /// Kebab-case name, as used in configuration files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Components => "components",
            Self::AccessRules => "access-rules",
            Self::TypeEnforcementRules => "type-enforcement-rules",
            Self::RoleAllowRules => "role-allow-rules",
            Self::RoleTransitionRules => "role-transition-rules",
            Self::RangeTransitionRules => "range-transition-rules",
            Self::MlsCategories => "mls-categories",
            Self::MlsLevels => "mls-levels",
            Self::MlsUsers => "mls-users",
            Self::All => "all",
        }
    }
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of [`DiffKind`]s.
///
/// `All` is remembered separately from the kinds it implies, so a run can
/// tell an explicit request for an MLS-only kind from one that merely came
/// along with `All`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DiffSelection {
    bits: u16,
}

impl DiffSelection {
    /// Nothing selected.
    pub const NONE: Self = Self { bits: 0 };

    /// Everything selected.
    pub const ALL: Self = Self {
        bits: DiffKind::All.bit(),
    };

    /// Build a selection from kinds.
    pub fn from_kinds<I: IntoIterator<Item = DiffKind>>(kinds: I) -> Self {
        kinds.into_iter().fold(Self::NONE, Self::with)
    }

    /// Add a kind.
    #[must_use]
    pub const fn with(self, kind: DiffKind) -> Self {
        Self {
            bits: self.bits | kind.bit(),
        }
    }

    /// Whether a kind takes part in the run.
    #[must_use]
    pub const fn contains(self, kind: DiffKind) -> bool {
        self.bits & (kind.bit() | DiffKind::All.bit()) != 0
    }

    /// Whether a kind was named itself rather than implied by `All`.
    #[must_use]
    pub const fn names_explicitly(self, kind: DiffKind) -> bool {
        self.bits & kind.bit() != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    /// Selected kinds, with `All` expanded.
    pub fn kinds(self) -> Vec<DiffKind> {
        DiffKind::INDIVIDUAL
            .into_iter()
            .filter(|k| self.contains(*k))
            .collect()
    }
}

impl From<DiffKind> for DiffSelection {
    fn from(kind: DiffKind) -> Self {
        Self::NONE.with(kind)
    }
}

impl FromIterator<DiffKind> for DiffSelection {
    fn from_iter<I: IntoIterator<Item = DiffKind>>(iter: I) -> Self {
        Self::from_kinds(iter)
    }
}
