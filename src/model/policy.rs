//! In-memory policy: a snapshot plus its lookup index.

use super::{
    AvRuleDecl, BoolDecl, CategoryDecl, ClassDecl, CommonDecl, Conditional, MlsLevel, MlsRange,
    PolicyIndex, PolicyQuery, PolicySnapshot, RangeTransitionDecl, RawRule, RoleAllowDecl,
    RoleDecl, RoleTransitionDecl, RuleKind, RuleValue, SensitivityDecl, Symbol, SymbolKind,
    TeRuleDecl, TypeDecl, UserDecl, UserMls, DEFAULT_TRANSITION_CLASS,
};
use crate::error::Result;
use std::collections::BTreeSet;

/// An immutable, indexed policy snapshot.
#[derive(Debug, Clone)]
pub struct Policy {
    snapshot: PolicySnapshot,
    index: PolicyIndex,
}

impl Policy {
    /// Index a snapshot. Fails when names collide within a kind.
    pub fn from_snapshot(snapshot: PolicySnapshot) -> Result<Self> {
        let index = PolicyIndex::build(&snapshot)?;
        tracing::debug!(
            name = snapshot.name.as_deref().unwrap_or("<unnamed>"),
            types = index.types.len(),
            attributes = index.attributes.len(),
            av_rules = snapshot.av_rules.len(),
            te_rules = snapshot.te_rules.len(),
            "indexed policy snapshot"
        );
        Ok(Self { snapshot, index })
    }

    /// Start building a policy in code.
    pub fn builder() -> PolicyBuilder {
        PolicyBuilder::default()
    }

    /// The declarations this policy was built from.
    #[must_use]
    pub const fn snapshot(&self) -> &PolicySnapshot {
        &self.snapshot
    }

    /// Optional display name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.snapshot.name.as_deref()
    }

    #[must_use]
    pub const fn index(&self) -> &PolicyIndex {
        &self.index
    }

    fn type_members(&self, name: &str) -> BTreeSet<String> {
        if let Some(members) = self.index.attributes.get(name) {
            return members.clone();
        }
        let primary = self.index.types.resolve(name).unwrap_or(name);
        BTreeSet::from([primary.to_string()])
    }

    fn resolve_categories<'a>(&self, cats: impl IntoIterator<Item = &'a String>) -> BTreeSet<String> {
        cats.into_iter()
            .map(|c| self.index.categories.resolve(c).unwrap_or(c).to_string())
            .collect()
    }

    fn class_permissions(&self, class: &ClassDecl) -> BTreeSet<String> {
        let mut perms: BTreeSet<String> = class.permissions.iter().cloned().collect();
        let common = class
            .common
            .as_deref()
            .and_then(|c| self.index.commons.decl_index(c))
            .and_then(|idx| self.snapshot.commons.get(idx));
        if let Some(common) = common {
            perms.extend(common.permissions.iter().cloned());
        }
        perms
    }

    fn sensitivity_decl(&self, name: &str) -> Option<(usize, &SensitivityDecl)> {
        let primary = self.index.sensitivities.resolve(name)?;
        let idx = self.index.sensitivities.decl_index(primary)?;
        self.snapshot.sensitivities.get(idx).map(|d| (idx, d))
    }
}

impl PolicyQuery for Policy {
    fn is_mls(&self) -> bool {
        self.snapshot.mls
    }

    fn symbols(&self, kind: SymbolKind) -> Vec<Symbol> {
        let s = &self.snapshot;
        match kind {
            SymbolKind::Type => s
                .types
                .iter()
                .map(|t| Symbol::new(&t.name, t.attributes.iter().cloned().collect()))
                .collect(),
            SymbolKind::Attribute => self
                .index
                .attributes
                .iter()
                .map(|(name, members)| Symbol::new(name, members.clone()))
                .collect(),
            SymbolKind::Role => s
                .roles
                .iter()
                .map(|r| {
                    let types = r.types.iter().flat_map(|t| self.type_members(t)).collect();
                    Symbol::new(&r.name, types)
                })
                .collect(),
            SymbolKind::User => s
                .users
                .iter()
                .map(|u| Symbol::new(&u.name, u.roles.iter().cloned().collect()))
                .collect(),
            SymbolKind::Class => s
                .classes
                .iter()
                .map(|c| Symbol::new(&c.name, self.class_permissions(c)))
                .collect(),
            SymbolKind::Common => s
                .commons
                .iter()
                .map(|c| Symbol::new(&c.name, c.permissions.iter().cloned().collect()))
                .collect(),
            SymbolKind::Boolean => s
                .booleans
                .iter()
                .map(|b| Symbol::new(&b.name, BTreeSet::new()))
                .collect(),
            SymbolKind::Category => s
                .categories
                .iter()
                .map(|c| Symbol::new(&c.name, BTreeSet::new()))
                .collect(),
            SymbolKind::Sensitivity => s
                .sensitivities
                .iter()
                .map(|d| Symbol::new(&d.name, self.resolve_categories(&d.categories)))
                .collect(),
        }
    }

    fn primary_name(&self, kind: SymbolKind, name: &str) -> Option<String> {
        let table = match kind {
            SymbolKind::Type => &self.index.types,
            SymbolKind::Attribute => {
                return self.index.is_attribute(name).then(|| name.to_string());
            }
            SymbolKind::Role => &self.index.roles,
            SymbolKind::User => &self.index.users,
            SymbolKind::Class => &self.index.classes,
            SymbolKind::Common => &self.index.commons,
            SymbolKind::Boolean => &self.index.booleans,
            SymbolKind::Category => &self.index.categories,
            SymbolKind::Sensitivity => &self.index.sensitivities,
        };
        table.resolve(name).map(str::to_string)
    }

    fn aliases(&self, kind: SymbolKind, primary: &str) -> Vec<String> {
        match kind {
            SymbolKind::Type => self.index.types.aliases_of(primary),
            SymbolKind::Category => self.index.categories.aliases_of(primary),
            SymbolKind::Sensitivity => self.index.sensitivities.aliases_of(primary),
            _ => Vec::new(),
        }
    }

    fn is_attribute(&self, name: &str) -> bool {
        self.index.is_attribute(name)
    }

    fn attribute_members(&self, attribute: &str) -> Option<BTreeSet<String>> {
        self.index.attributes.get(attribute).cloned()
    }

    fn rules(&self, kind: RuleKind) -> Vec<RawRule> {
        let s = &self.snapshot;
        match kind {
            RuleKind::Allow | RuleKind::AuditAllow | RuleKind::DontAudit | RuleKind::NeverAllow => s
                .av_rules
                .iter()
                .filter(|r| r.kind == kind)
                .map(|r| RawRule {
                    kind,
                    source: r.source.clone(),
                    target: Some(r.target.clone()),
                    class: Some(r.class.clone()),
                    value: RuleValue::Permissions(r.permissions.iter().cloned().collect()),
                    condition: r.condition.clone(),
                })
                .collect(),
            RuleKind::TypeTransition | RuleKind::TypeChange | RuleKind::TypeMember => s
                .te_rules
                .iter()
                .filter(|r| r.kind == kind)
                .map(|r| RawRule {
                    kind,
                    source: r.source.clone(),
                    target: Some(r.target.clone()),
                    class: Some(r.class.clone()),
                    value: RuleValue::DefaultType(r.default.clone()),
                    condition: r.condition.clone(),
                })
                .collect(),
            RuleKind::RoleAllow => s
                .role_allows
                .iter()
                .map(|r| RawRule {
                    kind,
                    source: r.source.clone(),
                    target: None,
                    class: None,
                    value: RuleValue::Roles(r.targets.iter().cloned().collect()),
                    condition: None,
                })
                .collect(),
            RuleKind::RoleTransition => s
                .role_transitions
                .iter()
                .map(|r| RawRule {
                    kind,
                    source: r.source.clone(),
                    target: Some(r.target.clone()),
                    class: Some(r.class.clone()),
                    value: RuleValue::DefaultRole(r.default.clone()),
                    condition: None,
                })
                .collect(),
            RuleKind::RangeTransition => s
                .range_transitions
                .iter()
                .map(|r| RawRule {
                    kind,
                    source: r.source.clone(),
                    target: Some(r.target.clone()),
                    class: Some(r.class.clone()),
                    value: RuleValue::Range(r.range.clone()),
                    condition: None,
                })
                .collect(),
        }
    }

    fn boolean_default(&self, name: &str) -> Option<bool> {
        let idx = self.index.booleans.decl_index(name)?;
        self.snapshot.booleans.get(idx).map(|b| b.default)
    }

    fn user_mls(&self, user: &str) -> Option<UserMls> {
        if !self.snapshot.mls {
            return None;
        }
        let idx = self.index.users.decl_index(user)?;
        let decl = self.snapshot.users.get(idx)?;
        let default_level = decl.default_level.clone()?;
        let range = decl
            .range
            .clone()
            .unwrap_or_else(|| MlsRange::single(default_level.clone()));
        Some(UserMls {
            default_level: self.canonical_level(&default_level),
            range: MlsRange::new(
                self.canonical_level(&range.low),
                self.canonical_level(&range.high),
            ),
        })
    }

    fn range_levels(&self, range: &MlsRange) -> Vec<MlsLevel> {
        let (Some((low, _)), Some((high, _))) = (
            self.sensitivity_decl(&range.low.sensitivity),
            self.sensitivity_decl(&range.high.sensitivity),
        ) else {
            return Vec::new();
        };
        let high_cats = self.resolve_categories(&range.high.categories);

        self.snapshot
            .sensitivities
            .iter()
            .enumerate()
            .filter(|(rank, _)| (low..=high).contains(rank))
            .map(|(_, decl)| {
                let allowed = self.resolve_categories(&decl.categories);
                MlsLevel {
                    sensitivity: decl.name.clone(),
                    categories: high_cats.intersection(&allowed).cloned().collect(),
                }
            })
            .collect()
    }
}

impl Policy {
    /// Replace sensitivity and category aliases with primary names.
    pub fn canonical_level(&self, level: &MlsLevel) -> MlsLevel {
        let sensitivity = self
            .index
            .sensitivities
            .resolve(&level.sensitivity)
            .unwrap_or(&level.sensitivity)
            .to_string();
        MlsLevel {
            sensitivity,
            categories: self.resolve_categories(&level.categories),
        }
    }
}

/// Fluent construction of a [`Policy`], mostly for tests and tooling.
///
/// ```
/// use poldiff::model::Policy;
///
/// let policy = Policy::builder()
///     .attribute("mammal")
///     .typ("bear_t", &["mammal"])
///     .class("file", &["read", "write"])
///     .allow("user_t", "mammal", "file", &["read"])
///     .build()
///     .unwrap();
/// assert_eq!(policy.snapshot().av_rules.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct PolicyBuilder {
    snapshot: PolicySnapshot,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

impl PolicyBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.snapshot.name = Some(name.into());
        self
    }

    pub const fn mls(mut self, enabled: bool) -> Self {
        self.snapshot.mls = enabled;
        self
    }

    pub fn attribute(mut self, name: &str) -> Self {
        self.snapshot.attributes.push(name.to_string());
        self
    }

    /// Declare a type and the attributes it belongs to.
    pub fn typ(mut self, name: &str, attributes: &[&str]) -> Self {
        self.snapshot.types.push(TypeDecl {
            name: name.to_string(),
            aliases: Vec::new(),
            attributes: owned(attributes),
        });
        self
    }

    /// Add an alias to an already declared type.
    pub fn type_alias(mut self, name: &str, alias: &str) -> Self {
        if let Some(decl) = self.snapshot.types.iter_mut().find(|t| t.name == name) {
            decl.aliases.push(alias.to_string());
        }
        self
    }

    pub fn role(mut self, name: &str, types: &[&str]) -> Self {
        self.snapshot.roles.push(RoleDecl {
            name: name.to_string(),
            types: owned(types),
        });
        self
    }

    pub fn user(mut self, name: &str, roles: &[&str]) -> Self {
        self.snapshot.users.push(UserDecl {
            name: name.to_string(),
            roles: owned(roles),
            default_level: None,
            range: None,
        });
        self
    }

    /// Declare a user with a default level and range.
    pub fn mls_user(mut self, name: &str, roles: &[&str], level: MlsLevel, range: MlsRange) -> Self {
        self.snapshot.users.push(UserDecl {
            name: name.to_string(),
            roles: owned(roles),
            default_level: Some(level),
            range: Some(range),
        });
        self
    }

    pub fn common(mut self, name: &str, permissions: &[&str]) -> Self {
        self.snapshot.commons.push(CommonDecl {
            name: name.to_string(),
            permissions: owned(permissions),
        });
        self
    }

    pub fn class(mut self, name: &str, permissions: &[&str]) -> Self {
        self.snapshot.classes.push(ClassDecl {
            name: name.to_string(),
            common: None,
            permissions: owned(permissions),
        });
        self
    }

    pub fn class_with_common(mut self, name: &str, common: &str, permissions: &[&str]) -> Self {
        self.snapshot.classes.push(ClassDecl {
            name: name.to_string(),
            common: Some(common.to_string()),
            permissions: owned(permissions),
        });
        self
    }

    pub fn boolean(mut self, name: &str, default: bool) -> Self {
        self.snapshot.booleans.push(BoolDecl {
            name: name.to_string(),
            default,
        });
        self
    }

    pub fn category(mut self, name: &str) -> Self {
        if !self.snapshot.categories.iter().any(|c| c.name == name) {
            self.snapshot.categories.push(CategoryDecl {
                name: name.to_string(),
                aliases: Vec::new(),
            });
        }
        self
    }

    /// Declare the next sensitivity in dominance order; unknown
    /// categories are declared along the way.
    pub fn sensitivity(mut self, name: &str, categories: &[&str]) -> Self {
        for cat in categories {
            self = self.category(cat);
        }
        self.snapshot.sensitivities.push(SensitivityDecl {
            name: name.to_string(),
            aliases: Vec::new(),
            categories: owned(categories),
        });
        self
    }

    pub fn allow(self, source: &str, target: &str, class: &str, permissions: &[&str]) -> Self {
        self.av_rule(RuleKind::Allow, source, target, class, permissions)
    }

    pub fn av_rule(
        mut self,
        kind: RuleKind,
        source: &str,
        target: &str,
        class: &str,
        permissions: &[&str],
    ) -> Self {
        self.snapshot.av_rules.push(AvRuleDecl {
            kind,
            source: source.to_string(),
            target: target.to_string(),
            class: class.to_string(),
            permissions: owned(permissions),
            condition: None,
        });
        self
    }

    /// Add an access-vector rule guarded by a condition.
    pub fn conditional_av_rule(
        mut self,
        kind: RuleKind,
        (source, target, class): (&str, &str, &str),
        permissions: &[&str],
        condition: Conditional,
    ) -> Self {
        self.snapshot.av_rules.push(AvRuleDecl {
            kind,
            source: source.to_string(),
            target: target.to_string(),
            class: class.to_string(),
            permissions: owned(permissions),
            condition: Some(condition),
        });
        self
    }

    pub fn te_rule(
        mut self,
        kind: RuleKind,
        (source, target, class): (&str, &str, &str),
        default: &str,
    ) -> Self {
        self.snapshot.te_rules.push(TeRuleDecl {
            kind,
            source: source.to_string(),
            target: target.to_string(),
            class: class.to_string(),
            default: default.to_string(),
            condition: None,
        });
        self
    }

    pub fn role_allow(mut self, source: &str, targets: &[&str]) -> Self {
        self.snapshot.role_allows.push(RoleAllowDecl {
            source: source.to_string(),
            targets: owned(targets),
        });
        self
    }

    pub fn role_transition(mut self, source: &str, target: &str, default: &str) -> Self {
        self.snapshot.role_transitions.push(RoleTransitionDecl {
            source: source.to_string(),
            target: target.to_string(),
            class: DEFAULT_TRANSITION_CLASS.to_string(),
            default: default.to_string(),
        });
        self
    }

    pub fn range_transition(mut self, source: &str, target: &str, class: &str, range: MlsRange) -> Self {
        self.snapshot.range_transitions.push(RangeTransitionDecl {
            source: source.to_string(),
            target: target.to_string(),
            class: class.to_string(),
            range,
        });
        self
    }

    pub fn build(self) -> Result<Policy> {
        Policy::from_snapshot(self.snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(s: &str) -> MlsLevel {
        s.parse().unwrap()
    }

    fn mls_policy() -> Policy {
        Policy::builder()
            .mls(true)
            .sensitivity("s0", &["c0", "c1"])
            .sensitivity("s1", &["c0", "c1", "c2"])
            .sensitivity("s2", &["c0", "c1", "c2", "c3"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_role_symbols_expand_attributes() {
        let policy = Policy::builder()
            .attribute("domain")
            .typ("init_t", &["domain"])
            .typ("sshd_t", &["domain"])
            .typ("etc_t", &[])
            .role("system_r", &["domain", "etc_t"])
            .build()
            .unwrap();

        let roles = policy.symbols(SymbolKind::Role);
        assert_eq!(roles.len(), 1);
        let types: Vec<&str> = roles[0].members.iter().map(String::as_str).collect();
        assert_eq!(types, vec!["etc_t", "init_t", "sshd_t"]);
    }

    #[test]
    fn test_class_inherits_common_permissions() {
        let policy = Policy::builder()
            .common("file_common", &["read", "write"])
            .class_with_common("file", "file_common", &["execute"])
            .build()
            .unwrap();
        let classes = policy.symbols(SymbolKind::Class);
        assert_eq!(classes[0].members.len(), 3);
    }

    #[test]
    fn test_range_levels_restrict_categories() {
        let policy = mls_policy();
        let range = MlsRange::new(level("s0"), level("s2:c1,c3"));
        let levels = policy.range_levels(&range);
        let rendered: Vec<String> = levels.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["s0:c1", "s1:c1", "s2:c1,c3"]);
    }

    #[test]
    fn test_range_levels_unknown_sensitivity() {
        let policy = mls_policy();
        let range = MlsRange::new(level("s0"), level("s9"));
        assert!(policy.range_levels(&range).is_empty());
    }

    #[test]
    fn test_user_mls_requires_mls_policy() {
        let policy = Policy::builder()
            .mls_user("alice", &["staff_r"], level("s0"), "s0-s1".parse().unwrap())
            .build()
            .unwrap();
        assert!(policy.user_mls("alice").is_none());
    }

    #[test]
    fn test_rules_filtered_by_kind() {
        let policy = Policy::builder()
            .allow("a_t", "b_t", "file", &["read"])
            .av_rule(RuleKind::DontAudit, "a_t", "b_t", "file", &["write"])
            .build()
            .unwrap();
        assert_eq!(policy.rules(RuleKind::Allow).len(), 1);
        assert_eq!(policy.rules(RuleKind::DontAudit).len(), 1);
        assert!(policy.rules(RuleKind::NeverAllow).is_empty());
    }
}
