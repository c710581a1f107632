//! Range comparison shared by users and range-transition rules.

use super::levels::diff_level;
use crate::diff::{DiffContext, DiffForm, LevelDiff, PolicySide, RangeDiff};
use crate::model::MlsRange;
use crate::utils::{SetDelta, natural_cmp, sorted_natural};
use std::collections::{BTreeMap, BTreeSet};

/// Compare a range from the original policy with one from the modified
/// policy.
///
/// Ranges must already use primary sensitivity and category names. The
/// floor delta compares the low levels; `levels` lists every spanned level
/// that differs, ordered by sensitivity.
pub fn diff_ranges(ctx: &DiffContext<'_>, original: Option<&MlsRange>, modified: Option<&MlsRange>) -> RangeDiff {
    let form = match (original, modified) {
        (Some(before), Some(after)) if before == after => DiffForm::Unchanged,
        (Some(_), Some(_)) => DiffForm::Modified,
        (Some(_), None) => DiffForm::Removed,
        (None, Some(_)) => DiffForm::Added,
        (None, None) => DiffForm::Unchanged,
    };

    let mut diff = RangeDiff {
        form,
        original: original.cloned(),
        modified: modified.cloned(),
        min_added_cats: Vec::new(),
        min_removed_cats: Vec::new(),
        levels: Vec::new(),
    };
    if form == DiffForm::Unchanged {
        return diff;
    }

    let empty = BTreeSet::new();
    let floor = SetDelta::between(
        original.map_or(&empty, |r| &r.low.categories),
        modified.map_or(&empty, |r| &r.low.categories),
    );
    diff.min_added_cats = sorted_natural(&floor.added);
    diff.min_removed_cats = sorted_natural(&floor.removed);

    let before = spanned_levels(ctx, PolicySide::Original, original);
    let after = spanned_levels(ctx, PolicySide::Modified, modified);
    let sensitivities: BTreeSet<&String> = before.keys().chain(after.keys()).collect();
    let mut levels: Vec<LevelDiff> = sensitivities
        .into_iter()
        .map(|s| diff_level(s, before.get(s), after.get(s)))
        .filter(|l| l.form.is_change())
        .collect();
    levels.sort_by(|a, b| natural_cmp(&a.sensitivity, &b.sensitivity));
    diff.levels = levels;
    diff
}

fn spanned_levels(
    ctx: &DiffContext<'_>,
    side: PolicySide,
    range: Option<&MlsRange>,
) -> BTreeMap<String, BTreeSet<String>> {
    range
        .map(|r| ctx.policy(side).range_levels(r))
        .unwrap_or_default()
        .into_iter()
        .map(|level| (level.sensitivity, level.categories))
        .collect()
}
