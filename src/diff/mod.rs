//! Semantic diff engine for policies.
//!
//! Two policy snapshots are compared kind by kind. Symbols are matched by
//! primary name (types through a [`TypeMap`] that follows renames and
//! aliases), rules by a normalized [`RuleKey`]. A rule that appears or
//! disappears only because an attribute gained or lost a member is
//! reported as [`DiffForm::AddedByTypeChange`] or
//! [`DiffForm::RemovedByTypeChange`] instead of a plain addition or
//! removal.
//!
//! # Architecture
//!
//! - [`DiffEngine`]: configures a run and assembles the [`DiffResult`]
//! - [`ChangeComputer`](traits::ChangeComputer): one implementation per
//!   kind in the [`changes`] module
//! - [`DiffContext`]: the read-only state every computer shares
//!
//! Independent kinds are computed on the rayon thread pool once the type
//! map is built. The first fatal error aborts the run.

pub mod changes;
mod context;
mod engine;
mod items;
mod membership;
mod result;
mod selection;
#[cfg(test)]
mod test_support;
pub mod traits;
mod type_map;
mod warning;

pub use context::{DiffContext, SELF_TARGET};
pub use engine::DiffEngine;
pub use items::{
    BooleanDiff, ComponentDiff, DiffForm, DiffItem, LevelDiff, RangeDiff, RuleDelta, RuleDiff, RuleKey,
    UserDiff,
};
pub use membership::MembershipDelta;
pub use result::{ChangeSet, DiffResult, DiffSummary, FormStats, ResultKind};
pub use selection::{DiffKind, DiffSelection};
pub use traits::ChangeComputer;
pub use type_map::TypeMap;
pub use warning::{DiffWarning, PolicySide, WarningKind};
