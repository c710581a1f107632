//! Correspondence between the types of two policies.
//!
//! Every type of either policy is assigned a canonical name. Types that
//! correspond share one, so type-keyed comparisons (type diffs, attribute
//! memberships, role types, rule keys) see renamed or aliased types as the
//! same symbol.

use super::PolicySide;
use crate::config::TypeRemapEntry;
use crate::error::{FatalInputKind, PolicyDiffError, Result};
use crate::model::{PolicyQuery, SymbolKind};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Canonical names for the primary types of both policies.
#[derive(Debug, Clone, Default)]
pub struct TypeMap {
    original: HashMap<String, String>,
    modified: HashMap<String, String>,
    /// Canonical name to the original names mapped onto it, when they differ
    renamed: BTreeMap<String, Vec<String>>,
}

impl TypeMap {
    /// Build the map from explicit remaps and, optionally, inference.
    ///
    /// Same-named primary types always correspond. Inference adds matches
    /// through aliases: a primary named like an alias on the other side, or
    /// two primaries carrying the same non-empty alias set.
    pub fn build(
        original: &dyn PolicyQuery,
        modified: &dyn PolicyQuery,
        remaps: &[&TypeRemapEntry],
        infer: bool,
    ) -> Result<Self> {
        let orig_types: BTreeSet<String> = primary_types(original);
        let mod_types: BTreeSet<String> = primary_types(modified);
        let mut builder = Builder::default();

        for entry in remaps {
            check_remap(entry)?;
            for name in &entry.original {
                require_primary(&orig_types, name, PolicySide::Original)?;
            }
            for name in &entry.modified {
                require_primary(&mod_types, name, PolicySide::Modified)?;
            }
            builder.link(&entry.original, &entry.modified)?;
        }

        for name in &orig_types {
            if mod_types.contains(name)
                && !builder.original.contains_key(name)
                && !builder.modified.contains_key(name)
            {
                builder.link(std::slice::from_ref(name), std::slice::from_ref(name))?;
            }
        }

        if infer {
            builder.infer_from_aliases(original, modified, &orig_types, &mod_types)?;
        }

        for name in &orig_types {
            if !builder.original.contains_key(name) {
                builder.claim(name, PolicySide::Original)?;
                builder.original.insert(name.clone(), name.clone());
            }
        }
        for name in &mod_types {
            if !builder.modified.contains_key(name) {
                builder.claim(name, PolicySide::Modified)?;
                builder.modified.insert(name.clone(), name.clone());
            }
        }

        let mut renamed: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (orig, canonical) in &builder.original {
            if orig != canonical {
                renamed.entry(canonical.clone()).or_default().push(orig.clone());
            }
        }
        for names in renamed.values_mut() {
            names.sort();
        }

        tracing::debug!(
            original = builder.original.len(),
            modified = builder.modified.len(),
            renamed = renamed.len(),
            "built type map"
        );

        Ok(Self {
            original: builder.original,
            modified: builder.modified,
            renamed,
        })
    }

    /// Canonical name of a primary type.
    #[must_use]
    pub fn canonical(&self, side: PolicySide, primary: &str) -> Option<&str> {
        let table = match side {
            PolicySide::Original => &self.original,
            PolicySide::Modified => &self.modified,
        };
        table.get(primary).map(String::as_str)
    }

    /// Original names mapped onto a canonical name they differ from.
    #[must_use]
    pub fn original_names(&self, canonical: &str) -> &[String] {
        self.renamed.get(canonical).map_or(&[], Vec::as_slice)
    }

    /// Canonical names of every primary type on one side.
    pub fn canonical_names(&self, side: PolicySide) -> BTreeSet<&str> {
        let table = match side {
            PolicySide::Original => &self.original,
            PolicySide::Modified => &self.modified,
        };
        table.values().map(String::as_str).collect()
    }
}

#[derive(Default)]
struct Builder {
    original: HashMap<String, String>,
    modified: HashMap<String, String>,
    /// Canonical name to the side(s) that produced it
    claimed: HashMap<String, Claim>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Claim {
    Linked,
    Only(PolicySide),
}

impl Builder {
    fn link(&mut self, original: &[String], modified: &[String]) -> Result<()> {
        let canonical = match (original, modified) {
            (_, [single]) => single.clone(),
            ([first, ..], _) => first.clone(),
            _ => return Err(remap_error("empty remap side".to_string())),
        };
        if self.claimed.insert(canonical.clone(), Claim::Linked).is_some() {
            return Err(remap_error(format!(
                "type name '{canonical}' would stand for two different types"
            )));
        }
        for name in original {
            self.original.insert(name.clone(), canonical.clone());
        }
        for name in modified {
            self.modified.insert(name.clone(), canonical.clone());
        }
        Ok(())
    }

    fn claim(&mut self, name: &str, side: PolicySide) -> Result<()> {
        match self.claimed.get(name) {
            None => {
                self.claimed.insert(name.to_string(), Claim::Only(side));
                Ok(())
            }
            Some(Claim::Only(other)) if *other != side => Err(remap_error(format!(
                "unmatched types named '{name}' exist in both policies but a remap separates them"
            ))),
            Some(_) => Err(remap_error(format!(
                "unmatched type '{name}' collides with a remapped type"
            ))),
        }
    }

    fn infer_from_aliases(
        &mut self,
        original: &dyn PolicyQuery,
        modified: &dyn PolicyQuery,
        orig_types: &BTreeSet<String>,
        mod_types: &BTreeSet<String>,
    ) -> Result<()> {
        // original primary known in the modified policy as an alias
        for name in orig_types {
            if self.original.contains_key(name) {
                continue;
            }
            if let Some(primary) = modified.primary_name(SymbolKind::Type, name) {
                if primary != *name && !self.modified.contains_key(&primary) {
                    self.link(std::slice::from_ref(name), std::slice::from_ref(&primary))?;
                }
            }
        }

        // modified primary known in the original policy as an alias
        for name in mod_types {
            if self.modified.contains_key(name) {
                continue;
            }
            if let Some(primary) = original.primary_name(SymbolKind::Type, name) {
                if primary != *name && !self.original.contains_key(&primary) {
                    self.link(std::slice::from_ref(&primary), std::slice::from_ref(name))?;
                }
            }
        }

        // same alias set on both sides
        let mut by_aliases: HashMap<Vec<String>, &String> = HashMap::new();
        for name in mod_types {
            if self.modified.contains_key(name) {
                continue;
            }
            let aliases = modified.aliases(SymbolKind::Type, name);
            if !aliases.is_empty() {
                by_aliases.entry(aliases).or_insert(name);
            }
        }
        for name in orig_types {
            if self.original.contains_key(name) {
                continue;
            }
            let aliases = original.aliases(SymbolKind::Type, name);
            if aliases.is_empty() {
                continue;
            }
            if let Some(target) = by_aliases.remove(&aliases) {
                self.link(std::slice::from_ref(name), std::slice::from_ref(target))?;
            }
        }

        Ok(())
    }
}

fn primary_types(policy: &dyn PolicyQuery) -> BTreeSet<String> {
    policy
        .symbols(SymbolKind::Type)
        .into_iter()
        .map(|s| s.name)
        .collect()
}

fn check_remap(entry: &TypeRemapEntry) -> Result<()> {
    if entry.original.is_empty() || entry.modified.is_empty() {
        return Err(remap_error("remap entries need types on both sides".to_string()));
    }
    if entry.original.len() > 1 && entry.modified.len() > 1 {
        return Err(remap_error(format!(
            "many-to-many remap {:?} -> {:?}",
            entry.original, entry.modified
        )));
    }
    Ok(())
}

fn require_primary(types: &BTreeSet<String>, name: &str, side: PolicySide) -> Result<()> {
    if types.contains(name) {
        Ok(())
    } else {
        Err(PolicyDiffError::fatal(
            "building type map",
            FatalInputKind::UnknownType {
                name: name.to_string(),
                side: side.to_string(),
            },
        ))
    }
}

fn remap_error(reason: String) -> PolicyDiffError {
    PolicyDiffError::fatal("building type map", FatalInputKind::InvalidTypeRemap { reason })
}
