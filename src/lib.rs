//! **Semantic differences between two versions of an access-control policy.**
//!
//! `poldiff` compares an original and a modified policy snapshot and reports
//! what changed, kind by kind: types, attributes, roles, users, classes,
//! commons, booleans, MLS categories and levels, and the rule families
//! (access-vector, type-enforcement, role-allow, role-transition and
//! range-transition rules).
//!
//! Symbols are compared by name after alias normalization; types can also
//! be matched across renames. Rules are compared by a normalized key, and a
//! rule that appears or disappears only because a type joined or left an
//! attribute is classified as *added by type change* or *removed by type
//! change* rather than as a plain addition or removal.
//!
//! ## Core Concepts & Modules
//!
//! - **[`model`]**: the [`PolicyQuery`](model::PolicyQuery) trait the engine
//!   reads through, plus [`Policy`](model::Policy), an in-memory snapshot.
//! - **[`parsers`]**: loading JSON or YAML snapshots from disk.
//! - **[`diff`]**: the [`DiffEngine`] and the [`DiffResult`] it produces.
//! - **[`config`]**: run configuration, presets and config file discovery.
//!
//! ## Diffing Two Snapshots
//!
//! ```no_run
//! use std::path::Path;
//! use poldiff::{parse_policy, DiffEngine};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let original = parse_policy(Path::new("policy-v1.json"))?;
//!     let modified = parse_policy(Path::new("policy-v2.json"))?;
//!
//!     let result = DiffEngine::new().diff(&original, &modified)?;
//!
//!     if let Some(rules) = &result.av_rules {
//!         for rule in rules {
//!             println!("{:>24} {}", rule.form.to_string(), rule.key);
//!         }
//!     }
//!     for warning in &result.warnings {
//!         eprintln!("warning: {warning}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Selecting Kinds
//!
//! ```
//! use poldiff::{DiffEngine, DiffKind};
//! use poldiff::model::Policy;
//!
//! let original = Policy::builder()
//!     .attribute("mammal")
//!     .typ("user_t", &[])
//!     .typ("bear_t", &["mammal"])
//!     .typ("hippo_t", &[])
//!     .class("file", &["read"])
//!     .allow("user_t", "mammal", "file", &["read"])
//!     .build()?;
//! let modified = Policy::builder()
//!     .attribute("mammal")
//!     .typ("user_t", &[])
//!     .typ("bear_t", &["mammal"])
//!     .typ("hippo_t", &["mammal"])
//!     .class("file", &["read"])
//!     .allow("user_t", "mammal", "file", &["read"])
//!     .build()?;
//!
//! let result = DiffEngine::new()
//!     .with_selection([DiffKind::AccessRules])
//!     .diff(&original, &modified)?;
//! assert!(result.types.is_none());
//!
//! let rules = result.av_rules.as_ref().expect("selected");
//! assert_eq!(rules.stats().added_by_type_change, 1);
//! # Ok::<(), poldiff::PolicyDiffError>(())
//! ```

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
// Pedantic lints: allow categories that are design choices for this codebase
#![allow(
    // Doc completeness: # Errors / # Panics sections are aspirational
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    // Variable names like `before`/`after` or `original`/`modified` are clear in context
    clippy::similar_names,
    // Engine toggles are independent switches
    clippy::struct_excessive_bools
)]

pub mod config;
pub mod diff;
pub mod error;
pub mod model;
pub mod parsers;
pub mod utils;

// Re-export main types for convenience
pub use config::{ConfigError, ConfigPreset, DiffConfig, DiffConfigBuilder, TypeRemapEntry, Validatable};
pub use diff::{
    ChangeSet, DiffEngine, DiffForm, DiffKind, DiffResult, DiffSelection, DiffWarning, PolicySide, RuleKey,
    WarningKind,
};
pub use error::{ErrorContext, FatalInputKind, OptionContext, PolicyDiffError, Result};
pub use model::{Policy, PolicyQuery};
pub use parsers::{parse_policy, parse_policy_str};
