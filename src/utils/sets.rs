//! Name-set algebra shared by every differ.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Partition of two name sets into kept, gained and lost members.
///
/// The three vectors are pairwise disjoint and sorted; `unmodified ∪ added`
/// is the modified set and `unmodified ∪ removed` the original set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct SetDelta {
    pub unmodified: Vec<String>,
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl SetDelta {
    /// Compare an original set against a modified one.
    pub fn between(original: &BTreeSet<String>, modified: &BTreeSet<String>) -> Self {
        Self {
            unmodified: original.intersection(modified).cloned().collect(),
            added: modified.difference(original).cloned().collect(),
            removed: original.difference(modified).cloned().collect(),
        }
    }

    /// Whether nothing was gained or lost.
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Re-sort every part with a custom ordering.
    pub fn sorted_by(mut self, cmp: impl Fn(&str, &str) -> std::cmp::Ordering + Copy) -> Self {
        self.unmodified.sort_by(|a, b| cmp(a, b));
        self.added.sort_by(|a, b| cmp(a, b));
        self.removed.sort_by(|a, b| cmp(a, b));
        self
    }
}
