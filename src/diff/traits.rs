//! Trait definitions for diff computation strategies.
//!
//! Each selectable kind is computed by its own [`ChangeComputer`], which
//! keeps every differ independently testable and lets the engine fan the
//! work out over a thread pool.

use super::{DiffContext, DiffWarning};
use crate::error::Result;

/// Trait for computing one kind of difference between two policies.
pub trait ChangeComputer: Send + Sync {
    /// The type of changes this computer produces.
    type ChangeSet;

    /// Compute changes, appending recoverable problems to `warnings`.
    fn compute(&self, ctx: &DiffContext<'_>, warnings: &mut Vec<DiffWarning>) -> Result<Self::ChangeSet>;

    /// Get the name of this change computer for logging/debugging.
    fn name(&self) -> &str;
}
