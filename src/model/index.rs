//! Precomputed lookups over a policy snapshot.
//!
//! Building the index once turns every name resolution the diff engine
//! performs into a hash lookup instead of a scan over the declarations.

use super::PolicySnapshot;
use crate::error::{FatalInputKind, PolicyDiffError, Result};
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap};

/// Name tables for one symbol kind: primaries (declaration order) and aliases.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    primaries: IndexMap<String, usize>,
    aliases: HashMap<String, String>,
}

impl NameTable {
    fn insert_primary(&mut self, kind: &str, name: &str, idx: usize) -> Result<()> {
        if self.primaries.insert(name.to_string(), idx).is_some() {
            return Err(invalid(format!("duplicate {kind} '{name}'")));
        }
        Ok(())
    }

    fn insert_alias(&mut self, kind: &str, alias: &str, primary: &str) -> Result<()> {
        if self.primaries.contains_key(alias)
            || self
                .aliases
                .insert(alias.to_string(), primary.to_string())
                .is_some()
        {
            return Err(invalid(format!(
                "{kind} alias '{alias}' of '{primary}' collides with another name"
            )));
        }
        Ok(())
    }

    /// Resolve a name or alias to the primary name.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        if let Some((primary, _)) = self.primaries.get_key_value(name) {
            return Some(primary.as_str());
        }
        self.aliases.get(name).map(String::as_str)
    }

    /// Declaration position of a primary name.
    pub fn position(&self, primary: &str) -> Option<usize> {
        self.primaries.get_index_of(primary)
    }

    /// Index of the declaration behind a primary name.
    pub fn decl_index(&self, primary: &str) -> Option<usize> {
        self.primaries.get(primary).copied()
    }

    /// Aliases of a primary name, sorted.
    pub fn aliases_of(&self, primary: &str) -> Vec<String> {
        let mut out: Vec<String> = self
            .aliases
            .iter()
            .filter(|(_, p)| p.as_str() == primary)
            .map(|(a, _)| a.clone())
            .collect();
        out.sort();
        out
    }

    /// Primary names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.primaries.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.primaries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.primaries.is_empty()
    }
}

/// Precomputed index for a [`PolicySnapshot`].
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct PolicyIndex {
    pub types: NameTable,
    pub roles: NameTable,
    pub users: NameTable,
    pub classes: NameTable,
    pub commons: NameTable,
    pub booleans: NameTable,
    /// Position doubles as dominance rank
    pub sensitivities: NameTable,
    pub categories: NameTable,
    /// Attribute name to primary member types
    pub attributes: IndexMap<String, BTreeSet<String>>,
}

impl PolicyIndex {
    /// Build the index, rejecting snapshots whose names collide.
    ///
    /// This is O(n) in the number of declarations.
    pub fn build(snapshot: &PolicySnapshot) -> Result<Self> {
        let mut index = Self::default();

        for (idx, decl) in snapshot.types.iter().enumerate() {
            index.types.insert_primary("type", &decl.name, idx)?;
        }
        for decl in &snapshot.types {
            for alias in &decl.aliases {
                index.types.insert_alias("type", alias, &decl.name)?;
            }
        }

        let mut attribute_names: Vec<&str> = snapshot.attributes.iter().map(String::as_str).collect();
        attribute_names.extend(
            snapshot
                .types
                .iter()
                .flat_map(|t| t.attributes.iter().map(String::as_str)),
        );
        for name in attribute_names {
            if index.types.resolve(name).is_some() {
                return Err(invalid(format!("attribute '{name}' collides with a type")));
            }
            index.attributes.entry(name.to_string()).or_default();
        }
        for decl in &snapshot.types {
            for attr in &decl.attributes {
                if let Some(members) = index.attributes.get_mut(attr) {
                    members.insert(decl.name.clone());
                }
            }
        }

        fill_table(&mut index.roles, "role", snapshot.roles.iter().map(|r| r.name.as_str()))?;
        fill_table(&mut index.users, "user", snapshot.users.iter().map(|u| u.name.as_str()))?;
        fill_table(&mut index.classes, "class", snapshot.classes.iter().map(|c| c.name.as_str()))?;
        fill_table(&mut index.commons, "common", snapshot.commons.iter().map(|c| c.name.as_str()))?;
        fill_table(
            &mut index.booleans,
            "boolean",
            snapshot.booleans.iter().map(|b| b.name.as_str()),
        )?;

        for (idx, decl) in snapshot.sensitivities.iter().enumerate() {
            index.sensitivities.insert_primary("sensitivity", &decl.name, idx)?;
        }
        for decl in &snapshot.sensitivities {
            for alias in &decl.aliases {
                index.sensitivities.insert_alias("sensitivity", alias, &decl.name)?;
            }
        }
        for (idx, decl) in snapshot.categories.iter().enumerate() {
            index.categories.insert_primary("category", &decl.name, idx)?;
        }
        for decl in &snapshot.categories {
            for alias in &decl.aliases {
                index.categories.insert_alias("category", alias, &decl.name)?;
            }
        }

        Ok(index)
    }

    /// Whether a name is a known type attribute.
    pub fn is_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }
}

fn fill_table<'a>(
    table: &mut NameTable,
    kind: &str,
    names: impl Iterator<Item = &'a str>,
) -> Result<()> {
    for (idx, name) in names.enumerate() {
        table.insert_primary(kind, name, idx)?;
    }
    Ok(())
}

fn invalid(reason: String) -> PolicyDiffError {
    PolicyDiffError::fatal("indexing policy", FatalInputKind::InvalidPolicy { reason })
}
