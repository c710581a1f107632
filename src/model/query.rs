//! The read-only query surface a diff run needs from one policy.

use super::{Conditional, MlsLevel, MlsRange};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Symbol tables the engine enumerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SymbolKind {
    /// Associated set: attributes the type belongs to
    Type,
    /// Associated set: member types
    Attribute,
    /// Associated set: types the role may enter
    Role,
    /// Associated set: roles
    User,
    /// Associated set: own and inherited permissions
    Class,
    /// Associated set: permissions
    Common,
    Boolean,
    Category,
    /// Associated set: categories allowed with the sensitivity
    Sensitivity,
}

impl SymbolKind {
    /// Lowercase label used in logs and warnings.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Attribute => "attribute",
            Self::Role => "role",
            Self::User => "user",
            Self::Class => "class",
            Self::Common => "common",
            Self::Boolean => "boolean",
            Self::Category => "category",
            Self::Sensitivity => "sensitivity",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rule subkinds; doubles as the discriminator inside rule keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleKind {
    Allow,
    AuditAllow,
    DontAudit,
    NeverAllow,
    TypeTransition,
    TypeChange,
    TypeMember,
    RoleAllow,
    RoleTransition,
    RangeTransition,
}

impl RuleKind {
    pub const ACCESS_VECTOR: [Self; 4] = [Self::Allow, Self::AuditAllow, Self::DontAudit, Self::NeverAllow];
    pub const TYPE_ENFORCEMENT: [Self; 3] = [Self::TypeTransition, Self::TypeChange, Self::TypeMember];

    /// Keyword as written in policy source.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::AuditAllow => "auditallow",
            Self::DontAudit => "dontaudit",
            Self::NeverAllow => "neverallow",
            Self::TypeTransition => "type_transition",
            Self::TypeChange => "type_change",
            Self::TypeMember => "type_member",
            Self::RoleAllow => "allow",
            Self::RoleTransition => "role_transition",
            Self::RangeTransition => "range_transition",
        }
    }

    /// Symbol table the source side resolves against.
    #[must_use]
    pub const fn source_kind(self) -> SymbolKind {
        match self {
            Self::RoleAllow | Self::RoleTransition => SymbolKind::Role,
            _ => SymbolKind::Type,
        }
    }

    /// Whether the source side may name a type attribute.
    #[must_use]
    pub const fn source_is_type(self) -> bool {
        matches!(self.source_kind(), SymbolKind::Type)
    }

    /// Whether the target side may name a type attribute.
    #[must_use]
    pub const fn target_is_type(self) -> bool {
        !matches!(self, Self::RoleAllow)
    }

    /// Whether the rule may sit inside a conditional block.
    #[must_use]
    pub const fn allows_condition(self) -> bool {
        !matches!(
            self,
            Self::RoleAllow | Self::RoleTransition | Self::RangeTransition
        )
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A symbol with its associated set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub members: BTreeSet<String>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, members: BTreeSet<String>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }
}

/// The value half of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleValue {
    Permissions(BTreeSet<String>),
    DefaultType(String),
    Roles(BTreeSet<String>),
    DefaultRole(String),
    Range(MlsRange),
}

/// A rule as authored, before any name normalization.
///
/// Role-allow rules have neither `target` nor `class`; their allowed roles
/// live in `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRule {
    pub kind: RuleKind,
    pub source: String,
    pub target: Option<String>,
    pub class: Option<String>,
    pub value: RuleValue,
    pub condition: Option<Conditional>,
}

/// MLS data attached to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserMls {
    pub default_level: MlsLevel,
    pub range: MlsRange,
}

/// Read-only queries over one loaded policy.
///
/// The engine only ever reads through this trait, so any loader can feed
/// it. Implementations must be cheap to share across threads.
pub trait PolicyQuery: Send + Sync {
    /// Whether the policy carries MLS data.
    fn is_mls(&self) -> bool;

    /// All primary symbols of a kind with their associated sets.
    ///
    /// For [`SymbolKind::Role`] attributes in a role's type list are already
    /// expanded to their member types.
    fn symbols(&self, kind: SymbolKind) -> Vec<Symbol>;

    /// Resolve a name (possibly an alias) to its primary name.
    fn primary_name(&self, kind: SymbolKind, name: &str) -> Option<String>;

    /// Aliases declared for a primary name.
    fn aliases(&self, kind: SymbolKind, primary: &str) -> Vec<String>;

    /// Whether `name` is a type attribute.
    fn is_attribute(&self, name: &str) -> bool;

    /// Current member types of an attribute.
    fn attribute_members(&self, attribute: &str) -> Option<BTreeSet<String>>;

    /// All rules of a subkind, as authored.
    fn rules(&self, kind: RuleKind) -> Vec<RawRule>;

    /// Default state of a boolean.
    fn boolean_default(&self, name: &str) -> Option<bool>;

    /// A user's default level and range, when the policy is MLS.
    fn user_mls(&self, user: &str) -> Option<UserMls>;

    /// Every level a range spans, in dominance order.
    ///
    /// Each level carries the high categories the sensitivity allows; the
    /// result is empty when an end of the range is not a known sensitivity.
    fn range_levels(&self, range: &MlsRange) -> Vec<MlsLevel>;
}
