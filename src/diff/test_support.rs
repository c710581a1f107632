//! Shared helpers for unit tests of the change computers.

use super::{DiffContext, MembershipDelta, TypeMap};
use crate::model::Policy;

/// Run `f` against a context over two policies with default options.
pub fn with_context<R>(original: &Policy, modified: &Policy, f: impl FnOnce(&DiffContext<'_>) -> R) -> R {
    let type_map = TypeMap::build(original, modified, &[], true).expect("type map");
    let membership = MembershipDelta::build(original, modified, &type_map);
    let ctx = DiffContext {
        original,
        modified,
        type_map: &type_map,
        membership: &membership,
        derive_type_change_rules: true,
    };
    f(&ctx)
}
