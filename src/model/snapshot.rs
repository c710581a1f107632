//! Serializable policy snapshot.
//!
//! This is the on-disk shape of a loaded policy: plain declarations with
//! names as authored. [`Policy`](super::Policy) indexes a snapshot for
//! querying.

use super::{Conditional, MlsLevel, MlsRange, RuleKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySnapshot {
    pub name: Option<String>,
    pub mls: bool,
    pub types: Vec<TypeDecl>,
    /// Attributes; membership comes from [`TypeDecl::attributes`]
    pub attributes: Vec<String>,
    pub roles: Vec<RoleDecl>,
    pub users: Vec<UserDecl>,
    pub commons: Vec<CommonDecl>,
    pub classes: Vec<ClassDecl>,
    pub booleans: Vec<BoolDecl>,
    /// Sensitivities in dominance order, lowest first
    pub sensitivities: Vec<SensitivityDecl>,
    pub categories: Vec<CategoryDecl>,
    pub av_rules: Vec<AvRuleDecl>,
    pub te_rules: Vec<TeRuleDecl>,
    pub role_allows: Vec<RoleAllowDecl>,
    pub role_transitions: Vec<RoleTransitionDecl>,
    pub range_transitions: Vec<RangeTransitionDecl>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDecl {
    pub name: String,
    /// Types or attributes the role may enter
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDecl {
    pub name: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_level: Option<MlsLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<MlsRange>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonDecl {
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoolDecl {
    pub name: String,
    #[serde(default)]
    pub default: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitivityDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    /// Categories that may accompany this sensitivity
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvRuleDecl {
    pub kind: RuleKind,
    pub source: String,
    pub target: String,
    pub class: String,
    pub permissions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Conditional>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeRuleDecl {
    pub kind: RuleKind,
    pub source: String,
    pub target: String,
    pub class: String,
    pub default: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Conditional>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAllowDecl {
    pub source: String,
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleTransitionDecl {
    pub source: String,
    pub target: String,
    #[serde(default = "default_process_class")]
    pub class: String,
    pub default: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeTransitionDecl {
    pub source: String,
    pub target: String,
    #[serde(default = "default_process_class")]
    pub class: String,
    pub range: MlsRange,
}

/// Class assumed by transition rules written without one.
pub const DEFAULT_TRANSITION_CLASS: &str = "process";

fn default_process_class() -> String {
    DEFAULT_TRANSITION_CLASS.to_string()
}
