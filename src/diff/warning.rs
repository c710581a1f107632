//! Recoverable problems reported next to a successful result.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which input policy a warning is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicySide {
    Original,
    Modified,
}

impl fmt::Display for PolicySide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Original => "original",
            Self::Modified => "modified",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    /// A rule names a symbol its policy does not declare; the rule is skipped
    UnresolvedSymbol,
    /// A rule's condition cannot be canonicalized; the rule is skipped
    UnsupportedCondition,
    /// Two rules share a key but disagree on their default; the smallest wins
    ConflictingDefault,
}

/// One recoverable problem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DiffWarning {
    pub kind: WarningKind,
    pub side: PolicySide,
    /// The offending rule, as authored
    pub rule: String,
    /// The symbol or expression at fault
    pub detail: String,
}

impl DiffWarning {
    /// Build a warning and log it.
    pub fn new(
        kind: WarningKind,
        side: PolicySide,
        rule: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        let warning = Self {
            kind,
            side,
            rule: rule.into(),
            detail: detail.into(),
        };
        tracing::warn!("{warning}");
        warning
    }
}

impl fmt::Display for DiffWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            WarningKind::UnresolvedSymbol => write!(
                f,
                "{} policy: skipping '{}': unknown symbol '{}'",
                self.side, self.rule, self.detail
            ),
            WarningKind::UnsupportedCondition => write!(
                f,
                "{} policy: skipping '{}': {}",
                self.side, self.rule, self.detail
            ),
            WarningKind::ConflictingDefault => write!(
                f,
                "{} policy: '{}' has conflicting defaults: {}",
                self.side, self.rule, self.detail
            ),
        }
    }
}
