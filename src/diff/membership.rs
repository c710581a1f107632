//! Attribute membership changes between the two policies.

use super::{PolicySide, TypeMap};
use crate::model::{PolicyQuery, SymbolKind};
use std::collections::{BTreeSet, HashMap};

/// Which attributes each canonical type belongs to on both sides, and which
/// members every attribute gained or lost.
///
/// Only attributes declared in both policies take part; an attribute that
/// exists on one side only cannot explain a rule change.
#[derive(Debug, Clone, Default)]
pub struct MembershipDelta {
    original: HashMap<String, BTreeSet<String>>,
    modified: HashMap<String, BTreeSet<String>>,
    gained: HashMap<String, BTreeSet<String>>,
    lost: HashMap<String, BTreeSet<String>>,
}

impl MembershipDelta {
    pub fn build(original: &dyn PolicyQuery, modified: &dyn PolicyQuery, type_map: &TypeMap) -> Self {
        let mod_attrs: HashMap<String, BTreeSet<String>> = modified
            .symbols(SymbolKind::Attribute)
            .into_iter()
            .map(|s| (s.name, canonical_members(type_map, PolicySide::Modified, &s.members)))
            .collect();

        let mut delta = Self::default();
        for attr in original.symbols(SymbolKind::Attribute) {
            let Some(after) = mod_attrs.get(&attr.name) else {
                continue;
            };
            let before = canonical_members(type_map, PolicySide::Original, &attr.members);

            for member in &before {
                delta
                    .original
                    .entry(member.clone())
                    .or_default()
                    .insert(attr.name.clone());
            }
            for member in after {
                delta
                    .modified
                    .entry(member.clone())
                    .or_default()
                    .insert(attr.name.clone());
            }

            let gained: BTreeSet<String> = after.difference(&before).cloned().collect();
            let lost: BTreeSet<String> = before.difference(after).cloned().collect();
            if !gained.is_empty() {
                delta.gained.insert(attr.name.clone(), gained);
            }
            if !lost.is_empty() {
                delta.lost.insert(attr.name.clone(), lost);
            }
        }

        tracing::debug!(
            grown = delta.gained.len(),
            shrunk = delta.lost.len(),
            "computed attribute membership changes"
        );
        delta
    }

    /// Shared attributes containing a canonical type on one side.
    pub fn attributes_of(&self, side: PolicySide, canonical: &str) -> impl Iterator<Item = &str> {
        let table = match side {
            PolicySide::Original => &self.original,
            PolicySide::Modified => &self.modified,
        };
        table
            .get(canonical)
            .into_iter()
            .flat_map(|attrs| attrs.iter().map(String::as_str))
    }

    /// Members an attribute gained (modified side) or lost (original side).
    ///
    /// `PolicySide::Modified` asks what the attribute gained.
    #[must_use]
    pub fn changed_members(&self, side: PolicySide, attribute: &str) -> Option<&BTreeSet<String>> {
        match side {
            PolicySide::Original => self.lost.get(attribute),
            PolicySide::Modified => self.gained.get(attribute),
        }
    }

    /// Whether `canonical` joined (modified side) or left (original side) `attribute`.
    #[must_use]
    pub fn changed_member(&self, side: PolicySide, attribute: &str, canonical: &str) -> bool {
        self.changed_members(side, attribute)
            .is_some_and(|members| members.contains(canonical))
    }

    /// Whether any shared attribute changed its members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gained.is_empty() && self.lost.is_empty()
    }
}

fn canonical_members(type_map: &TypeMap, side: PolicySide, members: &BTreeSet<String>) -> BTreeSet<String> {
    members
        .iter()
        .map(|m| type_map.canonical(side, m).unwrap_or(m).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Policy;

    #[test]
    fn test_gained_member() {
        let a = Policy::builder()
            .attribute("mammal")
            .typ("bear_t", &["mammal"])
            .typ("hippo_t", &[])
            .build()
            .unwrap();
        let b = Policy::builder()
            .attribute("mammal")
            .typ("bear_t", &["mammal"])
            .typ("hippo_t", &["mammal"])
            .build()
            .unwrap();
        let map = TypeMap::build(&a, &b, &[], true).unwrap();
        let delta = MembershipDelta::build(&a, &b, &map);

        assert!(delta.changed_member(PolicySide::Modified, "mammal", "hippo_t"));
        assert!(!delta.changed_member(PolicySide::Modified, "mammal", "bear_t"));
        assert!(delta.changed_members(PolicySide::Original, "mammal").is_none());
        let attrs: Vec<&str> = delta.attributes_of(PolicySide::Modified, "hippo_t").collect();
        assert_eq!(attrs, ["mammal"]);
        assert_eq!(delta.attributes_of(PolicySide::Original, "hippo_t").count(), 0);
    }

    #[test]
    fn test_one_sided_attribute_ignored() {
        let a = Policy::builder().typ("bear_t", &[]).build().unwrap();
        let b = Policy::builder()
            .attribute("mammal")
            .typ("bear_t", &["mammal"])
            .build()
            .unwrap();
        let map = TypeMap::build(&a, &b, &[], true).unwrap();
        let delta = MembershipDelta::build(&a, &b, &map);
        assert!(delta.is_empty());
        assert_eq!(delta.attributes_of(PolicySide::Modified, "bear_t").count(), 0);
    }
}
