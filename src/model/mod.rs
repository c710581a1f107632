//! Policy model consumed by the diff engine.
//!
//! The engine reads policies only through the [`PolicyQuery`] trait. The
//! crate ships one implementation, [`Policy`], an indexed in-memory
//! snapshot that can be deserialized from JSON or YAML or assembled with
//! [`PolicyBuilder`].

mod condition;
mod index;
mod mls;
mod policy;
mod query;
mod snapshot;

pub use condition::*;
pub use index::*;
pub use mls::*;
pub use policy::*;
pub use query::*;
pub use snapshot::*;
