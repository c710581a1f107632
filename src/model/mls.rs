//! MLS levels and ranges.
//!
//! Both types serialize as their textual form (`s0:c0,c3` and
//! `s0-s2:c0.c5`) so snapshots stay readable.

use crate::utils::natural_cmp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A sensitivity plus a category set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MlsLevel {
    pub sensitivity: String,
    pub categories: BTreeSet<String>,
}

impl MlsLevel {
    /// Create a level from a sensitivity and category names.
    pub fn new<I, S>(sensitivity: impl Into<String>, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sensitivity: sensitivity.into(),
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }

    /// Categories in natural order.
    #[must_use]
    pub fn sorted_categories(&self) -> Vec<&str> {
        let mut cats: Vec<&str> = self.categories.iter().map(String::as_str).collect();
        cats.sort_by(|a, b| natural_cmp(a, b));
        cats
    }
}

impl fmt::Display for MlsLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sensitivity)?;
        if !self.categories.is_empty() {
            write!(f, ":{}", self.sorted_categories().join(","))?;
        }
        Ok(())
    }
}

/// Error for malformed level or range text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed MLS expression '{input}': {reason}")]
pub struct MlsParseError {
    pub input: String,
    pub reason: String,
}

impl MlsParseError {
    fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

impl FromStr for MlsLevel {
    type Err = MlsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (sens, cats) = match s.split_once(':') {
            Some((sens, cats)) => (sens.trim(), Some(cats)),
            None => (s, None),
        };
        if sens.is_empty() {
            return Err(MlsParseError::new(s, "missing sensitivity"));
        }

        let mut categories = BTreeSet::new();
        if let Some(cats) = cats {
            for part in cats.split(',').map(str::trim) {
                if part.is_empty() {
                    return Err(MlsParseError::new(s, "empty category"));
                }
                match part.split_once('.') {
                    Some((first, last)) => {
                        categories.extend(expand_category_span(s, first, last)?);
                    }
                    None => {
                        categories.insert(part.to_string());
                    }
                }
            }
        }

        Ok(Self {
            sensitivity: sens.to_string(),
            categories,
        })
    }
}

/// Expand `c0.c3` into `c0, c1, c2, c3`.
fn expand_category_span(input: &str, first: &str, last: &str) -> Result<Vec<String>, MlsParseError> {
    let split = |name: &str| -> Option<(String, u32)> {
        let digits = name.len() - name.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        if digits == 0 {
            return None;
        }
        let (prefix, number) = name.split_at(name.len() - digits);
        number.parse().ok().map(|n| (prefix.to_string(), n))
    };

    let (Some((prefix_a, lo)), Some((prefix_b, hi))) = (split(first), split(last)) else {
        return Err(MlsParseError::new(input, "category span needs numbered names"));
    };
    if prefix_a != prefix_b || lo > hi {
        return Err(MlsParseError::new(input, format!("bad category span {first}.{last}")));
    }
    Ok((lo..=hi).map(|n| format!("{prefix_a}{n}")).collect())
}

impl TryFrom<String> for MlsLevel {
    type Error = MlsParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MlsLevel> for String {
    fn from(level: MlsLevel) -> Self {
        level.to_string()
    }
}

/// A low level and a high level; the levels in between follow the
/// sensitivity dominance of the policy that owns the range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MlsRange {
    pub low: MlsLevel,
    pub high: MlsLevel,
}

impl MlsRange {
    /// Create a range from its two ends.
    pub const fn new(low: MlsLevel, high: MlsLevel) -> Self {
        Self { low, high }
    }

    /// A range spanning a single level.
    pub fn single(level: MlsLevel) -> Self {
        Self {
            high: level.clone(),
            low: level,
        }
    }
}

impl fmt::Display for MlsRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.low == self.high {
            write!(f, "{}", self.low)
        } else {
            write!(f, "{}-{}", self.low, self.high)
        }
    }
}

impl FromStr for MlsRange {
    type Err = MlsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('-') {
            Some((low, high)) => Ok(Self::new(low.parse()?, high.parse()?)),
            None => Ok(Self::single(s.parse()?)),
        }
    }
}

impl TryFrom<String> for MlsRange {
    type Error = MlsParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MlsRange> for String {
    fn from(range: MlsRange) -> Self {
        range.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_with_span() {
        let level: MlsLevel = "s1:c0.c2,c10".parse().unwrap();
        assert_eq!(level.sensitivity, "s1");
        assert_eq!(level.sorted_categories(), vec!["c0", "c1", "c2", "c10"]);
        assert_eq!(level.to_string(), "s1:c0,c1,c2,c10");
    }

    #[test]
    fn test_parse_bare_sensitivity() {
        let level: MlsLevel = "s0".parse().unwrap();
        assert!(level.categories.is_empty());
        assert_eq!(level.to_string(), "s0");
    }

    #[test]
    fn test_parse_errors() {
        assert!("".parse::<MlsLevel>().is_err());
        assert!("s0:".parse::<MlsLevel>().is_err());
        assert!("s0:c3.c1".parse::<MlsLevel>().is_err());
        assert!("s0:a.b".parse::<MlsLevel>().is_err());
    }

    #[test]
    fn test_range_roundtrip_text() {
        let range: MlsRange = "s0-s2:c1".parse().unwrap();
        assert_eq!(range.low, MlsLevel::new("s0", Vec::<String>::new()));
        assert_eq!(range.high, MlsLevel::new("s2", ["c1"]));
        assert_eq!(range.to_string(), "s0-s2:c1");

        let single: MlsRange = "s1".parse().unwrap();
        assert_eq!(single.low, single.high);
        assert_eq!(single.to_string(), "s1");
    }

    #[test]
    fn test_serde_as_string() {
        let range: MlsRange = serde_json::from_str("\"s0:c0-s1:c0.c1\"").unwrap();
        assert_eq!(range.high.categories.len(), 2);
        assert_eq!(serde_json::to_string(&range).unwrap(), "\"s0:c0-s1:c0,c1\"");
    }
}
