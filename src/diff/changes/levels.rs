//! MLS level change computer.
//!
//! A level here is a sensitivity together with the categories it may be
//! combined with. Both sensitivities and categories are reported in
//! natural order.

use crate::diff::traits::ChangeComputer;
use crate::diff::{ChangeSet, DiffContext, DiffForm, DiffWarning, LevelDiff, PolicySide};
use crate::error::Result;
use crate::model::SymbolKind;
use crate::utils::{SetDelta, natural_cmp, sorted_natural};
use std::collections::{BTreeMap, BTreeSet};

/// Computes changes to the categories each sensitivity allows.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelChangeComputer;

impl LevelChangeComputer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ChangeComputer for LevelChangeComputer {
    type ChangeSet = ChangeSet<LevelDiff>;

    fn compute(&self, ctx: &DiffContext<'_>, _warnings: &mut Vec<DiffWarning>) -> Result<Self::ChangeSet> {
        let original = allowed_categories(ctx, PolicySide::Original);
        let modified = allowed_categories(ctx, PolicySide::Modified);

        let names: BTreeSet<&String> = original.keys().chain(modified.keys()).collect();
        let mut items: Vec<LevelDiff> = names
            .into_iter()
            .map(|name| diff_level(name, original.get(name), modified.get(name)))
            .filter(|item| item.form.is_change())
            .collect();
        items.sort_by(|a, b| natural_cmp(&a.sensitivity, &b.sensitivity));
        Ok(ChangeSet::new(items))
    }

    fn name(&self) -> &'static str {
        "LevelChangeComputer"
    }
}

fn allowed_categories(ctx: &DiffContext<'_>, side: PolicySide) -> BTreeMap<String, BTreeSet<String>> {
    ctx.policy(side)
        .symbols(SymbolKind::Sensitivity)
        .into_iter()
        .map(|s| (s.name, s.members))
        .collect()
}

/// Compare the category sets one sensitivity has on each side.
///
/// A set missing on one side makes the level `Added` or `Removed` with all
/// of its categories listed; equal sets give an `Unchanged` level.
pub fn diff_level(
    sensitivity: &str,
    original: Option<&BTreeSet<String>>,
    modified: Option<&BTreeSet<String>>,
) -> LevelDiff {
    match (original, modified) {
        (Some(before), Some(after)) => {
            let delta = SetDelta::between(before, after).sorted_by(natural_cmp);
            LevelDiff {
                sensitivity: sensitivity.to_string(),
                form: if delta.is_unchanged() {
                    DiffForm::Unchanged
                } else {
                    DiffForm::Modified
                },
                unmodified_cats: delta.unmodified,
                added_cats: delta.added,
                removed_cats: delta.removed,
            }
        }
        (Some(before), None) => whole_level(sensitivity, before, DiffForm::Removed),
        (None, Some(after)) => whole_level(sensitivity, after, DiffForm::Added),
        (None, None) => whole_level(sensitivity, &BTreeSet::new(), DiffForm::Unchanged),
    }
}

/// A level reported as entirely added or removed.
pub fn whole_level(sensitivity: &str, categories: &BTreeSet<String>, form: DiffForm) -> LevelDiff {
    let cats = sorted_natural(categories);
    let (added_cats, removed_cats) = match form {
        DiffForm::Removed | DiffForm::RemovedByTypeChange => (Vec::new(), cats),
        DiffForm::Added | DiffForm::AddedByTypeChange => (cats, Vec::new()),
        DiffForm::Unchanged | DiffForm::Modified => (Vec::new(), Vec::new()),
    };
    LevelDiff {
        sensitivity: sensitivity.to_string(),
        form,
        unmodified_cats: Vec::new(),
        added_cats,
        removed_cats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::test_support::with_context;
    use crate::model::Policy;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_category_added_to_level() {
        let diff = diff_level("s1", Some(&set(&["c1", "c2"])), Some(&set(&["c1", "c2", "c3"])));
        assert_eq!(diff.form, DiffForm::Modified);
        assert_eq!(diff.added_cats, ["c3"]);
        assert!(diff.removed_cats.is_empty());
        assert_eq!(diff.unmodified_cats, ["c1", "c2"]);
    }

    #[test]
    fn test_whole_level_natural_order() {
        let diff = whole_level("s0", &set(&["c10", "c2", "c1"]), DiffForm::Added);
        assert_eq!(diff.added_cats, ["c1", "c2", "c10"]);
        assert!(diff.removed_cats.is_empty());
    }

    #[test]
    fn test_level_computer() {
        let a = Policy::builder()
            .mls(true)
            .sensitivity("s0", &["c0"])
            .sensitivity("s1", &["c1", "c2"])
            .build()
            .unwrap();
        let b = Policy::builder()
            .mls(true)
            .sensitivity("s0", &["c0"])
            .sensitivity("s1", &["c1", "c2", "c3"])
            .sensitivity("s10", &[])
            .sensitivity("s2", &[])
            .build()
            .unwrap();

        let result = with_context(&a, &b, |ctx| {
            LevelChangeComputer::new().compute(ctx, &mut Vec::new()).unwrap()
        });
        let names: Vec<&str> = result.iter().map(|l| l.sensitivity.as_str()).collect();
        assert_eq!(names, ["s1", "s2", "s10"]);
        assert_eq!(result.items()[0].added_cats, ["c3"]);
    }
}
