//! Conditional (boolean-guarded) rule expressions.
//!
//! Expressions are stored in postfix order. Two rules sit in the same
//! condition when their expressions agree on every assignment of the
//! booleans involved, so matching goes through [`ConditionKey`], a truth
//! table over the sorted boolean names.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Largest number of distinct booleans a truth table can cover.
pub const MAX_CONDITION_BOOLEANS: usize = 6;

/// One postfix token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CondToken {
    Bool(String),
    Not,
    And,
    Or,
    Xor,
    Eq,
    Neq,
}

impl From<String> for CondToken {
    fn from(token: String) -> Self {
        match token.as_str() {
            "!" => Self::Not,
            "&&" => Self::And,
            "||" => Self::Or,
            "^" => Self::Xor,
            "==" => Self::Eq,
            "!=" => Self::Neq,
            _ => Self::Bool(token),
        }
    }
}

impl From<CondToken> for String {
    fn from(token: CondToken) -> Self {
        match token {
            CondToken::Bool(name) => name,
            CondToken::Not => "!".to_string(),
            CondToken::And => "&&".to_string(),
            CondToken::Or => "||".to_string(),
            CondToken::Xor => "^".to_string(),
            CondToken::Eq => "==".to_string(),
            CondToken::Neq => "!=".to_string(),
        }
    }
}

/// The guard of a conditional rule: an expression and the branch the
/// rule lives in (`true` for the if-branch, `false` for else).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conditional {
    pub expression: Vec<CondToken>,
    #[serde(default = "default_branch")]
    pub branch: bool,
}

const fn default_branch() -> bool {
    true
}

/// Why an expression could not be canonicalized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConditionError {
    #[error("expression uses {0} booleans (limit {MAX_CONDITION_BOOLEANS})")]
    TooManyBooleans(usize),
    #[error("malformed postfix expression")]
    Malformed,
}

/// Canonical identity of a condition, independent of how it was written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConditionKey {
    pub booleans: Vec<String>,
    /// Bit `i` is the rule's activity when boolean `k` has value `(i >> k) & 1`.
    pub truth_table: u64,
}

impl Conditional {
    /// Build a guard from an expression and branch.
    pub fn new(expression: Vec<CondToken>, branch: bool) -> Self {
        Self { expression, branch }
    }

    /// Boolean names referenced by the expression.
    pub fn booleans(&self) -> BTreeSet<&str> {
        self.expression
            .iter()
            .filter_map(|t| match t {
                CondToken::Bool(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Compute the canonical key, folding the branch into the table.
    pub fn key(&self) -> Result<ConditionKey, ConditionError> {
        let booleans: Vec<String> = self.booleans().into_iter().map(str::to_string).collect();
        if booleans.len() > MAX_CONDITION_BOOLEANS {
            return Err(ConditionError::TooManyBooleans(booleans.len()));
        }

        let rows = 1usize << booleans.len();
        let mut truth_table = 0u64;
        for row in 0..rows {
            let value = |name: &str| {
                booleans
                    .iter()
                    .position(|b| b == name)
                    .is_some_and(|k| (row >> k) & 1 == 1)
            };
            if self.evaluate(value)? == self.branch {
                truth_table |= 1 << row;
            }
        }

        Ok(ConditionKey {
            booleans,
            truth_table,
        })
    }

    fn evaluate(&self, value: impl Fn(&str) -> bool) -> Result<bool, ConditionError> {
        let mut stack: Vec<bool> = Vec::with_capacity(self.expression.len());
        for token in &self.expression {
            let result = match token {
                CondToken::Bool(name) => value(name),
                CondToken::Not => !stack.pop().ok_or(ConditionError::Malformed)?,
                binary => {
                    let rhs = stack.pop().ok_or(ConditionError::Malformed)?;
                    let lhs = stack.pop().ok_or(ConditionError::Malformed)?;
                    match binary {
                        CondToken::And => lhs && rhs,
                        CondToken::Or => lhs || rhs,
                        CondToken::Xor | CondToken::Neq => lhs != rhs,
                        _ => lhs == rhs,
                    }
                }
            };
            stack.push(result);
        }
        match stack.as_slice() {
            [result] => Ok(*result),
            _ => Err(ConditionError::Malformed),
        }
    }
}

impl fmt::Display for ConditionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = 1usize << self.booleans.len();
        write!(
            f,
            "[{}]={:0width$b}",
            self.booleans.join(","),
            self.truth_table,
            width = width
        )
    }
}
