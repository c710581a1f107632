//! Boolean change computer implementation.

use crate::diff::traits::ChangeComputer;
use crate::diff::{BooleanDiff, ChangeSet, DiffContext, DiffForm, DiffWarning, PolicySide};
use crate::error::Result;
use crate::model::SymbolKind;
use std::collections::BTreeMap;

/// Computes boolean changes: presence and default state.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanChangeComputer;

impl BooleanChangeComputer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ChangeComputer for BooleanChangeComputer {
    type ChangeSet = ChangeSet<BooleanDiff>;

    fn compute(&self, ctx: &DiffContext<'_>, _warnings: &mut Vec<DiffWarning>) -> Result<Self::ChangeSet> {
        let original = defaults(ctx, PolicySide::Original);
        let modified = defaults(ctx, PolicySide::Modified);

        let mut items = Vec::new();
        for (name, before) in &original {
            let after = modified.get(name).copied();
            let form = match after {
                None => DiffForm::Removed,
                Some(after) if after != *before => DiffForm::Modified,
                Some(_) => continue,
            };
            items.push(BooleanDiff {
                name: name.clone(),
                form,
                original_default: Some(*before),
                modified_default: after,
            });
        }
        for (name, after) in &modified {
            if !original.contains_key(name) {
                items.push(BooleanDiff {
                    name: name.clone(),
                    form: DiffForm::Added,
                    original_default: None,
                    modified_default: Some(*after),
                });
            }
        }
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(ChangeSet::new(items))
    }

    fn name(&self) -> &'static str {
        "BooleanChangeComputer"
    }
}

fn defaults(ctx: &DiffContext<'_>, side: PolicySide) -> BTreeMap<String, bool> {
    let policy = ctx.policy(side);
    policy
        .symbols(SymbolKind::Boolean)
        .into_iter()
        .map(|b| {
            let default = policy.boolean_default(&b.name).unwrap_or(false);
            (b.name, default)
        })
        .collect()
}
