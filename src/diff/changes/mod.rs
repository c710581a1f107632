//! Change computer implementations.
//!
//! One computer per family of differences: symbols with associated sets,
//! booleans, MLS levels, users and the rule families.

mod booleans;
mod components;
mod levels;
mod ranges;
mod rules;
mod users;

pub use booleans::BooleanChangeComputer;
pub use components::{SymbolChangeComputer, diff_symbols};
pub use levels::{LevelChangeComputer, diff_level, whole_level};
pub use ranges::diff_ranges;
pub use rules::{RuleChangeComputer, RuleFamily};
pub use users::UserChangeComputer;
