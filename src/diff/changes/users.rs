//! User change computer: roles plus, under MLS, default level and range.

use super::levels::{diff_level, whole_level};
use super::ranges::diff_ranges;
use crate::diff::traits::ChangeComputer;
use crate::diff::{ChangeSet, DiffContext, DiffForm, DiffWarning, LevelDiff, PolicySide, UserDiff};
use crate::error::Result;
use crate::model::{MlsLevel, SymbolKind, UserMls};
use crate::utils::SetDelta;
use std::collections::{BTreeMap, BTreeSet};

/// Computes user changes.
///
/// Level and range comparisons only happen when both policies are MLS;
/// otherwise the corresponding fields of every item stay `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserChangeComputer;

impl UserChangeComputer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ChangeComputer for UserChangeComputer {
    type ChangeSet = ChangeSet<UserDiff>;

    fn compute(&self, ctx: &DiffContext<'_>, _warnings: &mut Vec<DiffWarning>) -> Result<Self::ChangeSet> {
        let original = roles_by_user(ctx, PolicySide::Original);
        let modified = roles_by_user(ctx, PolicySide::Modified);
        let mls = ctx.both_mls();

        let names: BTreeSet<&String> = original.keys().chain(modified.keys()).collect();
        let items = names
            .into_iter()
            .filter_map(|name| {
                let user = match (original.get(name), modified.get(name)) {
                    (Some(roles), None) => one_sided(ctx, name, roles, PolicySide::Original, mls),
                    (None, Some(roles)) => one_sided(ctx, name, roles, PolicySide::Modified, mls),
                    (Some(before), Some(after)) => both_sides(ctx, name, before, after, mls),
                    (None, None) => return None,
                };
                user.form.is_change().then_some(user)
            })
            .collect();
        Ok(ChangeSet::new(items))
    }

    fn name(&self) -> &'static str {
        "UserChangeComputer"
    }
}

fn roles_by_user(ctx: &DiffContext<'_>, side: PolicySide) -> BTreeMap<String, BTreeSet<String>> {
    ctx.policy(side)
        .symbols(SymbolKind::User)
        .into_iter()
        .map(|u| (u.name, u.members))
        .collect()
}

fn user_mls(ctx: &DiffContext<'_>, side: PolicySide, name: &str) -> Option<UserMls> {
    let raw = ctx.policy(side).user_mls(name)?;
    Some(UserMls {
        default_level: ctx
            .canonical_level(side, &raw.default_level)
            .unwrap_or(raw.default_level),
        range: ctx.canonical_range(side, &raw.range).unwrap_or(raw.range),
    })
}

fn one_sided(ctx: &DiffContext<'_>, name: &str, roles: &BTreeSet<String>, side: PolicySide, mls: bool) -> UserDiff {
    let all_roles: Vec<String> = roles.iter().cloned().collect();
    let (form, added_roles, removed_roles) = match side {
        PolicySide::Original => (DiffForm::Removed, Vec::new(), all_roles),
        PolicySide::Modified => (DiffForm::Added, all_roles, Vec::new()),
    };

    let (default_level_diff, range_diff) = if mls {
        let data = user_mls(ctx, side, name);
        let level = data.as_ref().map(|d| &d.default_level);
        let range = data.as_ref().map(|d| &d.range);
        let levels = level
            .map(|l| vec![whole_level(&l.sensitivity, &l.categories, form)])
            .unwrap_or_default();
        let range_diff = match side {
            PolicySide::Original => diff_ranges(ctx, range, None),
            PolicySide::Modified => diff_ranges(ctx, None, range),
        };
        (Some(levels), Some(range_diff))
    } else {
        (None, None)
    };

    UserDiff {
        name: name.to_string(),
        form,
        added_roles,
        removed_roles,
        default_level_diff,
        range_diff,
    }
}

fn both_sides(
    ctx: &DiffContext<'_>,
    name: &str,
    before: &BTreeSet<String>,
    after: &BTreeSet<String>,
    mls: bool,
) -> UserDiff {
    let roles = SetDelta::between(before, after);
    let mut changed = !roles.is_unchanged();

    let (default_level_diff, range_diff) = if mls {
        let original = user_mls(ctx, PolicySide::Original, name);
        let modified = user_mls(ctx, PolicySide::Modified, name);
        let levels = default_level_changes(
            original.as_ref().map(|d| &d.default_level),
            modified.as_ref().map(|d| &d.default_level),
        );
        let range = diff_ranges(
            ctx,
            original.as_ref().map(|d| &d.range),
            modified.as_ref().map(|d| &d.range),
        );
        changed |= !levels.is_empty() || range.form.is_change();
        (Some(levels), Some(range))
    } else {
        (None, None)
    };

    UserDiff {
        name: name.to_string(),
        form: if changed {
            DiffForm::Modified
        } else {
            DiffForm::Unchanged
        },
        added_roles: roles.added,
        removed_roles: roles.removed,
        default_level_diff,
        range_diff,
    }
}

/// Changes between two default levels.
///
/// A move to another sensitivity reads as the old level removed and the
/// new one added.
fn default_level_changes(original: Option<&MlsLevel>, modified: Option<&MlsLevel>) -> Vec<LevelDiff> {
    match (original, modified) {
        (Some(before), Some(after)) if before.sensitivity == after.sensitivity => {
            let diff = diff_level(&before.sensitivity, Some(&before.categories), Some(&after.categories));
            if diff.form.is_change() { vec![diff] } else { Vec::new() }
        }
        (before, after) => before
            .map(|l| whole_level(&l.sensitivity, &l.categories, DiffForm::Removed))
            .into_iter()
            .chain(after.map(|l| whole_level(&l.sensitivity, &l.categories, DiffForm::Added)))
            .collect(),
    }
}
