//! Symbol change computer: types, attributes, roles, classes, commons and
//! categories.

use crate::diff::traits::ChangeComputer;
use crate::diff::{ChangeSet, ComponentDiff, DiffContext, DiffWarning, PolicySide};
use crate::error::Result;
use crate::model::SymbolKind;
use crate::utils::{SetDelta, natural_cmp};
use std::collections::{BTreeMap, BTreeSet};

/// Computes symbol-level changes for one [`SymbolKind`].
///
/// Symbols are keyed by primary name (canonical name for types). An item
/// is `Modified` when its associated set differs; the set members are
/// compared after type names went through the type map.
#[derive(Debug, Clone, Copy)]
pub struct SymbolChangeComputer {
    kind: SymbolKind,
}

impl SymbolChangeComputer {
    #[must_use]
    pub const fn new(kind: SymbolKind) -> Self {
        Self { kind }
    }

    #[must_use]
    pub const fn kind(&self) -> SymbolKind {
        self.kind
    }
}

impl ChangeComputer for SymbolChangeComputer {
    type ChangeSet = ChangeSet<ComponentDiff>;

    fn compute(&self, ctx: &DiffContext<'_>, _warnings: &mut Vec<DiffWarning>) -> Result<Self::ChangeSet> {
        let items = diff_symbols(ctx, self.kind);
        tracing::debug!(kind = %self.kind, changes = items.len(), "diffed symbols");
        Ok(ChangeSet::new(items))
    }

    fn name(&self) -> &str {
        self.kind.label()
    }
}

/// Diff the symbols of one kind, in result order.
pub fn diff_symbols(ctx: &DiffContext<'_>, kind: SymbolKind) -> Vec<ComponentDiff> {
    let original = symbol_table(ctx, PolicySide::Original, kind);
    let modified = symbol_table(ctx, PolicySide::Modified, kind);

    let names: BTreeSet<&String> = original.keys().chain(modified.keys()).collect();
    let mut items: Vec<ComponentDiff> = names
        .into_iter()
        .filter_map(|name| match (original.get(name), modified.get(name)) {
            (Some(_), None) => Some(ComponentDiff::removed(name.as_str())),
            (None, Some(_)) => Some(ComponentDiff::added(name.as_str())),
            (Some(before), Some(after)) => {
                let delta = SetDelta::between(before, after);
                (!delta.is_unchanged()).then(|| ComponentDiff::modified(name.as_str(), delta))
            }
            (None, None) => None,
        })
        .collect();

    match kind {
        SymbolKind::Type => {
            for item in &mut items {
                item.original_names = ctx.type_map.original_names(&item.name).to_vec();
            }
        }
        SymbolKind::Category => items.sort_by(|a, b| natural_cmp(&a.name, &b.name)),
        _ => {}
    }
    items
}

/// Name to associated set for one side, with type names canonicalized.
///
/// Several types mapped onto one canonical name merge their sets.
fn symbol_table(ctx: &DiffContext<'_>, side: PolicySide, kind: SymbolKind) -> BTreeMap<String, BTreeSet<String>> {
    let mut table: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for symbol in ctx.policy(side).symbols(kind) {
        let members: BTreeSet<String> = match kind {
            SymbolKind::Attribute | SymbolKind::Role => symbol
                .members
                .iter()
                .map(|t| ctx.type_map.canonical(side, t).unwrap_or(t).to_string())
                .collect(),
            _ => symbol.members,
        };
        let name = match kind {
            SymbolKind::Type => ctx
                .type_map
                .canonical(side, &symbol.name)
                .map_or(symbol.name, str::to_string),
            _ => symbol.name,
        };
        table.entry(name).or_default().extend(members);
    }
    table
}
