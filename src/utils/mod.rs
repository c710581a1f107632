//! Shared utilities.

mod natural;
mod sets;

pub use natural::{natural_cmp, sorted_natural};
pub use sets::SetDelta;
