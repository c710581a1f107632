//! Diff result structures.

use super::items::{BooleanDiff, ComponentDiff, DiffForm, DiffItem, LevelDiff, RuleDiff, UserDiff};
use super::warning::DiffWarning;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-form counts for one kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormStats {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub added_by_type_change: usize,
    pub removed_by_type_change: usize,
}

impl FormStats {
    pub fn record(&mut self, form: DiffForm) {
        match form {
            DiffForm::Unchanged => {}
            DiffForm::Added => self.added += 1,
            DiffForm::Removed => self.removed += 1,
            DiffForm::Modified => self.modified += 1,
            DiffForm::AddedByTypeChange => self.added_by_type_change += 1,
            DiffForm::RemovedByTypeChange => self.removed_by_type_change += 1,
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.added
            + self.removed
            + self.modified
            + self.added_by_type_change
            + self.removed_by_type_change
    }
}

/// Ordered, deduplicated diff items of one kind.
///
/// Unchanged items never make it into a change set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet<T> {
    items: Vec<T>,
}

impl<T: DiffItem> ChangeSet<T> {
    /// Wrap items already in their final order, dropping unchanged ones.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: items.into_iter().filter(|i| i.form().is_change()).collect(),
        }
    }

    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Items of one form, in order.
    pub fn of_form(&self, form: DiffForm) -> impl Iterator<Item = &T> {
        self.items.iter().filter(move |i| i.form() == form)
    }

    pub fn added(&self) -> impl Iterator<Item = &T> {
        self.of_form(DiffForm::Added)
    }

    pub fn removed(&self) -> impl Iterator<Item = &T> {
        self.of_form(DiffForm::Removed)
    }

    pub fn modified(&self) -> impl Iterator<Item = &T> {
        self.of_form(DiffForm::Modified)
    }

    #[must_use]
    pub fn stats(&self) -> FormStats {
        let mut stats = FormStats::default();
        for item in &self.items {
            stats.record(item.form());
        }
        stats
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl<T> Default for ChangeSet<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<'a, T> IntoIterator for &'a ChangeSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Result collections, one per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultKind {
    Types,
    Attributes,
    Roles,
    Users,
    Classes,
    Commons,
    Booleans,
    Categories,
    Levels,
    AvRules,
    TeRules,
    RoleAllows,
    RoleTransitions,
    RangeTransitions,
}

/// Summary statistics for the diff
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub total_changes: usize,
    pub per_kind: BTreeMap<ResultKind, FormStats>,
    pub warnings: usize,
}

/// Complete result of a policy diff.
///
/// A collection is `None` when its kind was not selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct DiffResult {
    pub summary: DiffSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<ChangeSet<ComponentDiff>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<ChangeSet<ComponentDiff>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<ChangeSet<ComponentDiff>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<ChangeSet<UserDiff>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<ChangeSet<ComponentDiff>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commons: Option<ChangeSet<ComponentDiff>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booleans: Option<ChangeSet<BooleanDiff>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<ChangeSet<ComponentDiff>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub levels: Option<ChangeSet<LevelDiff>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub av_rules: Option<ChangeSet<RuleDiff>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub te_rules: Option<ChangeSet<RuleDiff>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_allows: Option<ChangeSet<RuleDiff>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_transitions: Option<ChangeSet<RuleDiff>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_transitions: Option<ChangeSet<RuleDiff>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<DiffWarning>,
}

impl DiffResult {
    /// Create a new empty diff result
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculate and update summary statistics
    pub fn calculate_summary(&mut self) {
        let mut per_kind = BTreeMap::new();
        let mut put = |kind: ResultKind, stats: Option<FormStats>| {
            if let Some(stats) = stats {
                per_kind.insert(kind, stats);
            }
        };
        put(ResultKind::Types, self.types.as_ref().map(ChangeSet::stats));
        put(ResultKind::Attributes, self.attributes.as_ref().map(ChangeSet::stats));
        put(ResultKind::Roles, self.roles.as_ref().map(ChangeSet::stats));
        put(ResultKind::Users, self.users.as_ref().map(ChangeSet::stats));
        put(ResultKind::Classes, self.classes.as_ref().map(ChangeSet::stats));
        put(ResultKind::Commons, self.commons.as_ref().map(ChangeSet::stats));
        put(ResultKind::Booleans, self.booleans.as_ref().map(ChangeSet::stats));
        put(ResultKind::Categories, self.categories.as_ref().map(ChangeSet::stats));
        put(ResultKind::Levels, self.levels.as_ref().map(ChangeSet::stats));
        put(ResultKind::AvRules, self.av_rules.as_ref().map(ChangeSet::stats));
        put(ResultKind::TeRules, self.te_rules.as_ref().map(ChangeSet::stats));
        put(ResultKind::RoleAllows, self.role_allows.as_ref().map(ChangeSet::stats));
        put(
            ResultKind::RoleTransitions,
            self.role_transitions.as_ref().map(ChangeSet::stats),
        );
        put(
            ResultKind::RangeTransitions,
            self.range_transitions.as_ref().map(ChangeSet::stats),
        );

        self.summary = DiffSummary {
            total_changes: per_kind.values().map(FormStats::total).sum(),
            per_kind,
            warnings: self.warnings.len(),
        };
    }

    /// Check if there are any changes
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.summary.total_changes > 0
    }

    /// Rule collections that were computed, with their kinds.
    pub fn rule_sets(&self) -> impl Iterator<Item = (ResultKind, &ChangeSet<RuleDiff>)> {
        [
            (ResultKind::AvRules, self.av_rules.as_ref()),
            (ResultKind::TeRules, self.te_rules.as_ref()),
            (ResultKind::RoleAllows, self.role_allows.as_ref()),
            (ResultKind::RoleTransitions, self.role_transitions.as_ref()),
            (ResultKind::RangeTransitions, self.range_transitions.as_ref()),
        ]
        .into_iter()
        .filter_map(|(kind, set)| set.map(|s| (kind, s)))
    }

    /// Symbol collections that were computed, with their kinds.
    pub fn component_sets(&self) -> impl Iterator<Item = (ResultKind, &ChangeSet<ComponentDiff>)> {
        [
            (ResultKind::Types, self.types.as_ref()),
            (ResultKind::Attributes, self.attributes.as_ref()),
            (ResultKind::Roles, self.roles.as_ref()),
            (ResultKind::Classes, self.classes.as_ref()),
            (ResultKind::Commons, self.commons.as_ref()),
            (ResultKind::Categories, self.categories.as_ref()),
        ]
        .into_iter()
        .filter_map(|(kind, set)| set.map(|s| (kind, s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_set_drops_unchanged() {
        let set = ChangeSet::new(vec![
            ComponentDiff::added("a_t"),
            ComponentDiff {
                form: DiffForm::Unchanged,
                ..ComponentDiff::added("b_t")
            },
            ComponentDiff::removed("c_t"),
        ]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.added().count(), 1);
        assert_eq!(set.removed().count(), 1);
        assert_eq!(set.stats().total(), 2);
    }

    #[test]
    fn test_summary_counts_selected_kinds() {
        let mut result = DiffResult::new();
        result.types = Some(ChangeSet::new(vec![ComponentDiff::added("a_t")]));
        result.roles = Some(ChangeSet::default());
        result.calculate_summary();

        assert_eq!(result.summary.total_changes, 1);
        assert_eq!(result.summary.per_kind.len(), 2);
        assert!(result.has_changes());
        assert_eq!(result.component_sets().count(), 2);
        assert_eq!(result.rule_sets().count(), 0);
    }

    #[test]
    fn test_unselected_kinds_not_serialized() {
        let mut result = DiffResult::new();
        result.types = Some(ChangeSet::default());
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("types").is_some());
        assert!(json.get("av_rules").is_none());
    }
}
