//! Diff items: one per changed symbol, level, user or rule.

use crate::model::{ConditionKey, MlsRange, RuleKind};
use crate::utils::SetDelta;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a diffed entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiffForm {
    Unchanged,
    Added,
    Removed,
    Modified,
    /// Access gained through an unchanged attribute rule whose attribute
    /// gained a member
    AddedByTypeChange,
    /// Access lost through an unchanged attribute rule whose attribute
    /// lost a member
    RemovedByTypeChange,
}

impl DiffForm {
    #[must_use]
    pub const fn is_change(self) -> bool {
        !matches!(self, Self::Unchanged)
    }

    #[must_use]
    pub const fn is_by_type_change(self) -> bool {
        matches!(self, Self::AddedByTypeChange | Self::RemovedByTypeChange)
    }
}

impl fmt::Display for DiffForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unchanged => "unchanged",
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Modified => "modified",
            Self::AddedByTypeChange => "added by type change",
            Self::RemovedByTypeChange => "removed by type change",
        };
        f.write_str(label)
    }
}

/// Anything that carries a [`DiffForm`].
pub trait DiffItem {
    fn form(&self) -> DiffForm;
}

// ============================================================================
// Symbols
// ============================================================================

/// A changed symbol.
///
/// `added` and `removed` are filled for `Modified` items only and hold the
/// associated-set members gained and lost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDiff {
    pub name: String,
    pub form: DiffForm,
    /// Original-policy names of a type matched under a different name
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub original_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<String>,
}

impl ComponentDiff {
    pub fn added(name: impl Into<String>) -> Self {
        Self::with_form(name, DiffForm::Added)
    }

    pub fn removed(name: impl Into<String>) -> Self {
        Self::with_form(name, DiffForm::Removed)
    }

    pub fn modified(name: impl Into<String>, delta: SetDelta) -> Self {
        Self {
            name: name.into(),
            form: DiffForm::Modified,
            original_names: Vec::new(),
            added: delta.added,
            removed: delta.removed,
        }
    }

    fn with_form(name: impl Into<String>, form: DiffForm) -> Self {
        Self {
            name: name.into(),
            form,
            original_names: Vec::new(),
            added: Vec::new(),
            removed: Vec::new(),
        }
    }
}

impl DiffItem for ComponentDiff {
    fn form(&self) -> DiffForm {
        self.form
    }
}

/// A changed boolean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooleanDiff {
    pub name: String,
    pub form: DiffForm,
    pub original_default: Option<bool>,
    pub modified_default: Option<bool>,
}

impl DiffItem for BooleanDiff {
    fn form(&self) -> DiffForm {
        self.form
    }
}

// ============================================================================
// MLS
// ============================================================================

/// Category changes of one sensitivity.
///
/// For `Added`/`Removed` levels the whole category set sits in
/// `added_cats`/`removed_cats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDiff {
    pub sensitivity: String,
    pub form: DiffForm,
    pub unmodified_cats: Vec<String>,
    pub added_cats: Vec<String>,
    pub removed_cats: Vec<String>,
}

impl DiffItem for LevelDiff {
    fn form(&self) -> DiffForm {
        self.form
    }
}

/// Difference between two ranges.
///
/// `min_added_cats`/`min_removed_cats` compare the low levels, the
/// categories held at every level of the range. `levels` lists the levels
/// spanned by either range that differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeDiff {
    pub form: DiffForm,
    pub original: Option<MlsRange>,
    pub modified: Option<MlsRange>,
    pub min_added_cats: Vec<String>,
    pub min_removed_cats: Vec<String>,
    pub levels: Vec<LevelDiff>,
}

impl DiffItem for RangeDiff {
    fn form(&self) -> DiffForm {
        self.form
    }
}

/// A changed user.
///
/// `default_level_diff` and `range_diff` are `None` unless both policies
/// are MLS. When present, an empty level list and an `Unchanged` range
/// mean no MLS change. A default level that moved to another sensitivity
/// shows up as a `Removed` entry followed by an `Added` one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDiff {
    pub name: String,
    pub form: DiffForm,
    pub added_roles: Vec<String>,
    pub removed_roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_level_diff: Option<Vec<LevelDiff>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_diff: Option<RangeDiff>,
}

impl DiffItem for UserDiff {
    fn form(&self) -> DiffForm {
        self.form
    }
}

// ============================================================================
// Rules
// ============================================================================

/// Identity of a rule after name normalization.
///
/// Field order is the canonical ordering of rule keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleKey {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// Discriminates rule subkinds sharing the key shape
    pub kind: RuleKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ConditionKey>,
}

impl RuleKey {
    /// Same key with other source and target.
    #[must_use]
    pub fn with_sides(&self, source: &str, target: Option<&str>) -> Self {
        Self {
            source: source.to_string(),
            target: target.map(str::to_string),
            class: self.class.clone(),
            kind: self.kind,
            condition: self.condition.clone(),
        }
    }
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.source)?;
        if let Some(target) = &self.target {
            write!(f, " {target}")?;
        }
        if let Some(class) = &self.class {
            write!(f, ":{class}")?;
        }
        if let Some(condition) = &self.condition {
            write!(f, " if {condition}")?;
        }
        Ok(())
    }
}

/// How a rule's value changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RuleDelta {
    /// Access-vector permissions
    Permissions(SetDelta),
    /// Role-allow target roles
    Roles(SetDelta),
    /// Default type or default role
    Default {
        original: Option<String>,
        modified: Option<String>,
    },
    /// Range-transition range
    Range(RangeDiff),
}

/// A changed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDiff {
    pub key: RuleKey,
    pub form: DiffForm,
    pub delta: RuleDelta,
    /// The unchanged attribute rule behind a by-type-change form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explained_by: Option<RuleKey>,
}

impl RuleDiff {
    /// Permissions kept on both sides.
    #[must_use]
    pub fn unmodified_perms(&self) -> &[String] {
        match &self.delta {
            RuleDelta::Permissions(d) => &d.unmodified,
            _ => &[],
        }
    }

    /// Permissions present only in the modified policy.
    #[must_use]
    pub fn added_perms(&self) -> &[String] {
        match &self.delta {
            RuleDelta::Permissions(d) => &d.added,
            _ => &[],
        }
    }

    /// Permissions present only in the original policy.
    #[must_use]
    pub fn removed_perms(&self) -> &[String] {
        match &self.delta {
            RuleDelta::Permissions(d) => &d.removed,
            _ => &[],
        }
    }

    #[must_use]
    pub fn original_default(&self) -> Option<&str> {
        match &self.delta {
            RuleDelta::Default { original, .. } => original.as_deref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn modified_default(&self) -> Option<&str> {
        match &self.delta {
            RuleDelta::Default { modified, .. } => modified.as_deref(),
            _ => None,
        }
    }
}

impl DiffItem for RuleDiff {
    fn form(&self) -> DiffForm {
        self.form
    }
}
