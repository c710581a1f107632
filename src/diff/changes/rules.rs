//! Rule change computer.
//!
//! Rules of both policies are normalized into keyed indexes, then every
//! key is classified. A key present on one side only is checked against
//! the unchanged attribute rules before it is reported as plainly added or
//! removed: if an attribute that gained (lost) the key's type has an
//! unchanged rule with the same value, the change is a consequence of the
//! membership change and is reported as `AddedByTypeChange`
//! (`RemovedByTypeChange`).

use super::ranges::diff_ranges;
use crate::diff::context::SELF_TARGET;
use crate::diff::traits::ChangeComputer;
use crate::diff::{
    ChangeSet, DiffContext, DiffForm, DiffKind, DiffWarning, PolicySide, ResultKind, RuleDelta,
    RuleDiff, RuleKey, WarningKind,
};
use crate::error::{ErrorContext, PolicyDiffError, Result};
use crate::model::{MlsRange, RawRule, RuleKind, RuleValue, SymbolKind};
use crate::utils::SetDelta;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Rule subkinds diffed together and reported in one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleFamily {
    AccessVector,
    TypeEnforcement,
    RoleAllow,
    RoleTransition,
    RangeTransition,
}

impl RuleFamily {
    pub const ALL: [Self; 5] = [
        Self::AccessVector,
        Self::TypeEnforcement,
        Self::RoleAllow,
        Self::RoleTransition,
        Self::RangeTransition,
    ];

    /// Subkinds in the family.
    #[must_use]
    pub fn kinds(self) -> &'static [RuleKind] {
        match self {
            Self::AccessVector => &RuleKind::ACCESS_VECTOR,
            Self::TypeEnforcement => &RuleKind::TYPE_ENFORCEMENT,
            Self::RoleAllow => &[RuleKind::RoleAllow],
            Self::RoleTransition => &[RuleKind::RoleTransition],
            Self::RangeTransition => &[RuleKind::RangeTransition],
        }
    }

    /// The selection flag that enables the family.
    #[must_use]
    pub const fn selection_kind(self) -> DiffKind {
        match self {
            Self::AccessVector => DiffKind::AccessRules,
            Self::TypeEnforcement => DiffKind::TypeEnforcementRules,
            Self::RoleAllow => DiffKind::RoleAllowRules,
            Self::RoleTransition => DiffKind::RoleTransitionRules,
            Self::RangeTransition => DiffKind::RangeTransitionRules,
        }
    }

    /// The result collection the family fills.
    #[must_use]
    pub const fn result_kind(self) -> ResultKind {
        match self {
            Self::AccessVector => ResultKind::AvRules,
            Self::TypeEnforcement => ResultKind::TeRules,
            Self::RoleAllow => ResultKind::RoleAllows,
            Self::RoleTransition => ResultKind::RoleTransitions,
            Self::RangeTransition => ResultKind::RangeTransitions,
        }
    }

    /// Whether a key side may name a type attribute, which is what makes
    /// the by-type-change forms possible.
    #[must_use]
    pub const fn has_type_sides(self) -> bool {
        !matches!(self, Self::RoleAllow)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AccessVector => "access vector rules",
            Self::TypeEnforcement => "type enforcement rules",
            Self::RoleAllow => "role allow rules",
            Self::RoleTransition => "role transition rules",
            Self::RangeTransition => "range transition rules",
        }
    }
}

impl fmt::Display for RuleFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Computes the changes of one rule family.
#[derive(Debug, Clone, Copy)]
pub struct RuleChangeComputer {
    family: RuleFamily,
}

impl RuleChangeComputer {
    #[must_use]
    pub const fn new(family: RuleFamily) -> Self {
        Self { family }
    }

    #[must_use]
    pub const fn family(&self) -> RuleFamily {
        self.family
    }
}

impl ChangeComputer for RuleChangeComputer {
    type ChangeSet = ChangeSet<RuleDiff>;

    fn compute(&self, ctx: &DiffContext<'_>, warnings: &mut Vec<DiffWarning>) -> Result<Self::ChangeSet> {
        let items = diff_rules(ctx, self.family, warnings).with_context(|| format!("diffing {}", self.family))?;
        tracing::debug!(family = %self.family, changes = items.len(), "diffed rules");
        Ok(ChangeSet::new(items))
    }

    fn name(&self) -> &str {
        self.family.label()
    }
}

type RuleIndex = HashMap<RuleKey, RuleValue>;

fn diff_rules(ctx: &DiffContext<'_>, family: RuleFamily, warnings: &mut Vec<DiffWarning>) -> Result<Vec<RuleDiff>> {
    let original = index_rules(ctx, PolicySide::Original, family.kinds(), warnings)?;
    let modified = index_rules(ctx, PolicySide::Modified, family.kinds(), warnings)?;
    let classifier = Classifier {
        ctx,
        original: &original,
        modified: &modified,
        typed: family.has_type_sides(),
    };

    let mut items = Vec::new();
    items
        .try_reserve(original.len().max(modified.len()))
        .map_err(|e| PolicyDiffError::exhausted(format!("rule diff items: {e}")))?;

    for (key, after) in &modified {
        match original.get(key) {
            Some(before) if before == after => {}
            Some(before) => items.push(RuleDiff {
                key: key.clone(),
                form: DiffForm::Modified,
                delta: value_delta(ctx, Some(before), Some(after)),
                explained_by: None,
            }),
            None => items.push(classifier.one_sided(key, after, PolicySide::Modified)),
        }
    }
    for (key, before) in &original {
        if !modified.contains_key(key) {
            items.push(classifier.one_sided(key, before, PolicySide::Original));
        }
    }

    if ctx.derive_type_change_rules && classifier.typed && !ctx.membership.is_empty() {
        items.extend(classifier.derived());
    }

    items.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(items)
}

// ============================================================================
// Indexing
// ============================================================================

/// Why a rule was left out of an index.
enum Skip {
    Unresolved(String),
    Condition(String),
}

/// Normalize every rule of `kinds` on one side into a keyed index.
///
/// Rules sharing a key merge: permission and role sets are unioned, while
/// conflicting defaults or ranges keep the smallest value and raise a
/// warning.
fn index_rules(
    ctx: &DiffContext<'_>,
    side: PolicySide,
    kinds: &[RuleKind],
    warnings: &mut Vec<DiffWarning>,
) -> Result<RuleIndex> {
    let policy = ctx.policy(side);
    let mut index = RuleIndex::new();
    let mut conflicts: BTreeMap<RuleKey, BTreeSet<RuleValue>> = BTreeMap::new();

    for &kind in kinds {
        let rules = policy.rules(kind);
        index
            .try_reserve(rules.len())
            .map_err(|e| PolicyDiffError::exhausted(format!("indexing {side} {kind} rules: {e}")))?;

        for rule in &rules {
            let (key, value) = match normalize(ctx, side, rule) {
                Ok(normalized) => normalized,
                Err(Skip::Unresolved(symbol)) => {
                    warnings.push(DiffWarning::new(WarningKind::UnresolvedSymbol, side, describe(rule), symbol));
                    continue;
                }
                Err(Skip::Condition(reason)) => {
                    warnings.push(DiffWarning::new(
                        WarningKind::UnsupportedCondition,
                        side,
                        describe(rule),
                        reason,
                    ));
                    continue;
                }
            };

            match index.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(value);
                }
                Entry::Occupied(mut slot) => {
                    if merge_sets(slot.get_mut(), &value) || *slot.get() == value {
                        continue;
                    }
                    let seen = conflicts.entry(slot.key().clone()).or_default();
                    seen.insert(slot.get().clone());
                    seen.insert(value.clone());
                    if value < *slot.get() {
                        slot.insert(value);
                    }
                }
            }
        }
    }

    for (key, values) in conflicts {
        let detail = values.iter().map(render_value).collect::<Vec<_>>().join(", ");
        warnings.push(DiffWarning::new(WarningKind::ConflictingDefault, side, key.to_string(), detail));
    }

    tracing::trace!(%side, rules = index.len(), "indexed rules");
    Ok(index)
}

/// Union set-valued rule values in place; false when the values are not
/// both sets of the same kind.
fn merge_sets(existing: &mut RuleValue, incoming: &RuleValue) -> bool {
    match (existing, incoming) {
        (RuleValue::Permissions(into), RuleValue::Permissions(from))
        | (RuleValue::Roles(into), RuleValue::Roles(from)) => {
            into.extend(from.iter().cloned());
            true
        }
        _ => false,
    }
}

fn normalize(ctx: &DiffContext<'_>, side: PolicySide, rule: &RawRule) -> std::result::Result<(RuleKey, RuleValue), Skip> {
    let policy = ctx.policy(side);
    let unresolved = |name: &str| Skip::Unresolved(name.to_string());

    let source = if rule.kind.source_is_type() {
        Some(rule.source.as_str())
            .filter(|s| *s != SELF_TARGET)
            .and_then(|s| ctx.resolve_type_or_attribute(side, s))
    } else {
        policy.primary_name(SymbolKind::Role, &rule.source)
    }
    .ok_or_else(|| unresolved(&rule.source))?;

    let target = rule
        .target
        .as_deref()
        .map(|t| ctx.resolve_type_or_attribute(side, t).ok_or_else(|| unresolved(t)))
        .transpose()?;

    let class = rule
        .class
        .as_deref()
        .map(|c| policy.primary_name(SymbolKind::Class, c).ok_or_else(|| unresolved(c)))
        .transpose()?;

    let condition = match &rule.condition {
        None => None,
        Some(_) if !rule.kind.allows_condition() => {
            return Err(Skip::Condition(format!("{} rules cannot be conditional", rule.kind)));
        }
        Some(cond) => {
            if let Some(missing) = cond
                .booleans()
                .into_iter()
                .find(|b| policy.primary_name(SymbolKind::Boolean, b).is_none())
            {
                return Err(unresolved(missing));
            }
            Some(cond.key().map_err(|e| Skip::Condition(e.to_string()))?)
        }
    };

    let value = match &rule.value {
        RuleValue::Permissions(perms) => RuleValue::Permissions(perms.clone()),
        RuleValue::DefaultType(name) => {
            RuleValue::DefaultType(ctx.canonical_type(side, name).ok_or_else(|| unresolved(name))?)
        }
        RuleValue::Roles(roles) => RuleValue::Roles(
            roles
                .iter()
                .map(|r| policy.primary_name(SymbolKind::Role, r).ok_or_else(|| unresolved(r)))
                .collect::<std::result::Result<_, _>>()?,
        ),
        RuleValue::DefaultRole(name) => {
            RuleValue::DefaultRole(policy.primary_name(SymbolKind::Role, name).ok_or_else(|| unresolved(name))?)
        }
        RuleValue::Range(range) => RuleValue::Range(
            ctx.canonical_range(side, range)
                .ok_or_else(|| Skip::Unresolved(range.to_string()))?,
        ),
    };

    let key = RuleKey {
        source,
        target,
        class,
        kind: rule.kind,
        condition,
    };
    Ok((key, value))
}

/// A rule as its author wrote it, for warnings.
fn describe(rule: &RawRule) -> String {
    RuleKey {
        source: rule.source.clone(),
        target: rule.target.clone(),
        class: rule.class.clone(),
        kind: rule.kind,
        condition: None,
    }
    .to_string()
}

fn render_value(value: &RuleValue) -> String {
    match value {
        RuleValue::Permissions(set) | RuleValue::Roles(set) => {
            format!("{{ {} }}", set.iter().cloned().collect::<Vec<_>>().join(" "))
        }
        RuleValue::DefaultType(name) | RuleValue::DefaultRole(name) => name.clone(),
        RuleValue::Range(range) => range.to_string(),
    }
}

// ============================================================================
// Classification
// ============================================================================

struct Classifier<'c, 'a> {
    ctx: &'c DiffContext<'a>,
    original: &'c RuleIndex,
    modified: &'c RuleIndex,
    typed: bool,
}

impl Classifier<'_, '_> {
    /// The value of a rule present and equal in both policies.
    fn unchanged(&self, key: &RuleKey) -> Option<&RuleValue> {
        let before = self.original.get(key)?;
        let after = self.modified.get(key)?;
        (before == after).then_some(after)
    }

    /// Classify a key authored on one side only.
    fn one_sided(&self, key: &RuleKey, value: &RuleValue, side: PolicySide) -> RuleDiff {
        let explained_by = if self.typed {
            self.explainer(key, value, side)
        } else {
            None
        };
        let (plain, by_type_change) = match side {
            PolicySide::Original => (DiffForm::Removed, DiffForm::RemovedByTypeChange),
            PolicySide::Modified => (DiffForm::Added, DiffForm::AddedByTypeChange),
        };
        let delta = match side {
            PolicySide::Original => value_delta(self.ctx, Some(value), None),
            PolicySide::Modified => value_delta(self.ctx, None, Some(value)),
        };
        RuleDiff {
            key: key.clone(),
            form: if explained_by.is_some() {
                by_type_change
            } else {
                plain
            },
            delta,
            explained_by,
        }
    }

    /// The smallest unchanged rule whose attribute side, expanded with
    /// `side`'s membership, yields `key` through a changed member.
    fn explainer(&self, key: &RuleKey, value: &RuleValue, side: PolicySide) -> Option<RuleKey> {
        let target = key.target.as_deref()?;
        let sources = self.side_candidates(&key.source, side, key.kind.source_is_type());
        let mut targets = self.side_candidates(target, side, true);
        if target == key.source {
            targets.push((SELF_TARGET.to_string(), false));
        }

        let mut best: Option<RuleKey> = None;
        for (source, source_changed) in &sources {
            for (target, target_changed) in &targets {
                if !(*source_changed || *target_changed) {
                    continue;
                }
                let candidate = key.with_sides(source, Some(target));
                if self.unchanged(&candidate) == Some(value) && best.as_ref().is_none_or(|b| candidate < *b) {
                    best = Some(candidate);
                }
            }
        }
        best
    }

    /// A key side itself plus every shared attribute containing it on
    /// `side`, flagged when the membership changed.
    fn side_candidates(&self, name: &str, side: PolicySide, is_type: bool) -> Vec<(String, bool)> {
        let mut candidates = vec![(name.to_string(), false)];
        if is_type {
            let membership = self.ctx.membership;
            candidates.extend(
                membership
                    .attributes_of(side, name)
                    .map(|attr| (attr.to_string(), membership.changed_member(side, attr, name))),
            );
        }
        candidates
    }

    /// Keys implied by unchanged attribute rules for members that joined or
    /// left their attribute, and authored in neither policy.
    ///
    /// A key is reported only when the access it is effectively granted
    /// differs between the policies. The form follows the direction of the
    /// change; a type that moved between attributes reports the value
    /// before and after in one item.
    fn derived(&self) -> Vec<RuleDiff> {
        let mut unchanged: Vec<(&RuleKey, &RuleValue)> = self
            .modified
            .iter()
            .filter(|(key, value)| self.original.get(*key) == Some(*value))
            .collect();
        unchanged.sort_by(|a, b| a.0.cmp(b.0));

        let gained = self.expand(&unchanged, PolicySide::Modified);
        let lost = self.expand(&unchanged, PolicySide::Original);
        let keys: BTreeSet<&RuleKey> = gained.keys().chain(lost.keys()).collect();

        let mut items = Vec::new();
        for key in keys {
            let before = self.effective(key, PolicySide::Original);
            let after = self.effective(key, PolicySide::Modified);
            if before == after {
                continue;
            }
            let gaining = match (&before, &after) {
                (None, _) => true,
                (_, None) => false,
                (Some(before), Some(after)) => grows(before, after),
            };
            let (form, rule) = match (gained.get(key), lost.get(key)) {
                (Some(rule), Some(_)) if gaining => (DiffForm::AddedByTypeChange, rule),
                (_, Some(rule)) => (DiffForm::RemovedByTypeChange, rule),
                (Some(rule), None) => (DiffForm::AddedByTypeChange, rule),
                (None, None) => continue,
            };
            items.push(RuleDiff {
                key: key.clone(),
                form,
                delta: value_delta(self.ctx, before.as_ref(), after.as_ref()),
                explained_by: Some(rule.clone()),
            });
        }
        items
    }

    /// Unchanged rules expanded through the members their attribute sides
    /// gained (`Modified`) or lost (`Original`), keyed by the expanded key
    /// and mapped to the smallest rule producing it.
    fn expand(&self, unchanged: &[(&RuleKey, &RuleValue)], side: PolicySide) -> BTreeMap<RuleKey, RuleKey> {
        let membership = self.ctx.membership;
        let mut out: BTreeMap<RuleKey, RuleKey> = BTreeMap::new();

        for &(rule, _) in unchanged {
            let mut expansions = Vec::new();
            if rule.kind.source_is_type() {
                if let Some(members) = membership.changed_members(side, &rule.source) {
                    expansions.extend(members.iter().map(|m| rule.with_sides(m, rule.target.as_deref())));
                }
            }
            if let Some(target) = rule.target.as_deref() {
                if let Some(members) = membership.changed_members(side, target) {
                    expansions.extend(members.iter().map(|m| rule.with_sides(&rule.source, Some(m))));
                }
            }

            for key in expansions {
                if self.original.contains_key(&key) || self.modified.contains_key(&key) {
                    continue;
                }
                out.entry(key).or_insert_with(|| rule.clone());
            }
        }
        out
    }

    /// The value `side` grants to `key` through every rule covering it: the
    /// literal rule plus rules on attributes its sides belong to.
    fn effective(&self, key: &RuleKey, side: PolicySide) -> Option<RuleValue> {
        let index = match side {
            PolicySide::Original => self.original,
            PolicySide::Modified => self.modified,
        };
        let target = key.target.as_deref()?;
        let sources = self.side_candidates(&key.source, side, key.kind.source_is_type());
        let mut targets = self.side_candidates(target, side, true);
        if target == key.source {
            targets.push((SELF_TARGET.to_string(), false));
        }

        let mut value: Option<RuleValue> = None;
        for (source, _) in &sources {
            for (target, _) in &targets {
                let Some(found) = index.get(&key.with_sides(source, Some(target))) else {
                    continue;
                };
                if let Some(current) = value.as_mut() {
                    if !merge_sets(current, found) && *found < *current {
                        *current = found.clone();
                    }
                } else {
                    value = Some(found.clone());
                }
            }
        }
        value
    }
}

/// Whether a change from `before` to `after` gains more than it loses.
/// Values that are not sets count as growing.
fn grows(before: &RuleValue, after: &RuleValue) -> bool {
    match (before, after) {
        (
            RuleValue::Permissions(before) | RuleValue::Roles(before),
            RuleValue::Permissions(after) | RuleValue::Roles(after),
        ) => after.difference(before).count() >= before.difference(after).count(),
        _ => true,
    }
}

/// Describe how a rule value changed; `None` stands for the rule being
/// absent on that side.
fn value_delta(ctx: &DiffContext<'_>, original: Option<&RuleValue>, modified: Option<&RuleValue>) -> RuleDelta {
    let empty = BTreeSet::new();
    let set = |v: Option<&RuleValue>| match v {
        Some(RuleValue::Permissions(s) | RuleValue::Roles(s)) => s.clone(),
        _ => empty.clone(),
    };
    let default = |v: Option<&RuleValue>| match v {
        Some(RuleValue::DefaultType(n) | RuleValue::DefaultRole(n)) => Some(n.clone()),
        _ => None,
    };
    let range = |v: Option<&RuleValue>| -> Option<MlsRange> {
        match v {
            Some(RuleValue::Range(r)) => Some(r.clone()),
            _ => None,
        }
    };

    match original.or(modified) {
        Some(RuleValue::Permissions(_)) => RuleDelta::Permissions(SetDelta::between(&set(original), &set(modified))),
        Some(RuleValue::Roles(_)) => RuleDelta::Roles(SetDelta::between(&set(original), &set(modified))),
        Some(RuleValue::Range(_)) => {
            RuleDelta::Range(diff_ranges(ctx, range(original).as_ref(), range(modified).as_ref()))
        }
        Some(RuleValue::DefaultType(_) | RuleValue::DefaultRole(_)) | None => RuleDelta::Default {
            original: default(original),
            modified: default(modified),
        },
    }
}
