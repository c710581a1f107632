//! Per-run state shared by every change computer.

use super::{MembershipDelta, PolicySide, TypeMap};
use crate::model::{MlsLevel, MlsRange, PolicyQuery, SymbolKind};

/// Keyword standing for a rule's own source type.
pub const SELF_TARGET: &str = "self";

/// Everything a change computer may read during one diff run.
///
/// Built once by the engine after the type map is known and then shared
/// read-only across workers.
#[derive(Clone, Copy)]
pub struct DiffContext<'a> {
    pub original: &'a dyn PolicyQuery,
    pub modified: &'a dyn PolicyQuery,
    pub type_map: &'a TypeMap,
    pub membership: &'a MembershipDelta,
    /// Emit rules implied by attribute membership changes
    pub derive_type_change_rules: bool,
}

impl<'a> DiffContext<'a> {
    #[must_use]
    pub fn policy(&self, side: PolicySide) -> &'a dyn PolicyQuery {
        match side {
            PolicySide::Original => self.original,
            PolicySide::Modified => self.modified,
        }
    }

    /// Both policies carry MLS data, so user levels and ranges compare.
    #[must_use]
    pub fn both_mls(&self) -> bool {
        self.original.is_mls() && self.modified.is_mls()
    }

    /// Canonical name of a type (not an attribute) named on one side.
    #[must_use]
    pub fn canonical_type(&self, side: PolicySide, name: &str) -> Option<String> {
        let primary = self.policy(side).primary_name(SymbolKind::Type, name)?;
        self.type_map
            .canonical(side, &primary)
            .map(str::to_string)
    }

    /// Resolve a type-valued rule side: a type, an attribute, or `self`.
    #[must_use]
    pub fn resolve_type_or_attribute(&self, side: PolicySide, name: &str) -> Option<String> {
        if name == SELF_TARGET {
            return Some(SELF_TARGET.to_string());
        }
        if self.policy(side).is_attribute(name) {
            return Some(name.to_string());
        }
        self.canonical_type(side, name)
    }

    /// A level with sensitivity and category aliases replaced.
    #[must_use]
    pub fn canonical_level(&self, side: PolicySide, level: &MlsLevel) -> Option<MlsLevel> {
        let policy = self.policy(side);
        let sensitivity = policy.primary_name(SymbolKind::Sensitivity, &level.sensitivity)?;
        let categories = level
            .categories
            .iter()
            .map(|c| policy.primary_name(SymbolKind::Category, c))
            .collect::<Option<_>>()?;
        Some(MlsLevel {
            sensitivity,
            categories,
        })
    }

    /// A range with both ends canonicalized.
    #[must_use]
    pub fn canonical_range(&self, side: PolicySide, range: &MlsRange) -> Option<MlsRange> {
        Some(MlsRange::new(
            self.canonical_level(side, &range.low)?,
            self.canonical_level(side, &range.high)?,
        ))
    }
}

impl std::fmt::Debug for DiffContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiffContext")
            .field("original_mls", &self.original.is_mls())
            .field("modified_mls", &self.modified.is_mls())
            .field("derive_type_change_rules", &self.derive_type_change_rules)
            .finish_non_exhaustive()
    }
}
