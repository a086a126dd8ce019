//! Named expressions exchanged between submodels

use crate::errors::{RSBMError, RSBMResult};
use crate::symbol::Symbol;
use std::collections::btree_map;
use std::collections::BTreeMap;

/// Map from variable name to expression
///
/// Submodels publish their outputs here and read the outputs of other submodels from it.
/// Looking up a missing name fails with [`RSBMError::MissingVariable`], which is what lets
/// model assembly defer a submodel until its inputs exist.
#[derive(Debug, Clone, Default)]
pub struct Variables(BTreeMap<String, Symbol>);

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, symbol: Symbol) -> Option<Symbol> {
        self.0.insert(name.into(), symbol)
    }

    pub fn get(&self, name: &str) -> RSBMResult<&Symbol> {
        self.0.get(name).ok_or_else(|| RSBMError::MissingVariable {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Symbol> {
        self.0.iter()
    }

    /// Add entries from `other`, returning the names that were already present
    ///
    /// Existing entries are kept.
    pub fn extend_new(&mut self, other: Variables) -> Vec<String> {
        let mut skipped = vec![];
        for (name, symbol) in other.0 {
            match self.0.entry(name) {
                btree_map::Entry::Occupied(entry) => skipped.push(entry.key().clone()),
                btree_map::Entry::Vacant(entry) => {
                    entry.insert(symbol);
                }
            }
        }
        skipped
    }
}

impl<'a> IntoIterator for &'a Variables {
    type Item = (&'a String, &'a Symbol);
    type IntoIter = btree_map::Iter<'a, String, Symbol>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Variables {
    type Item = (String, Symbol);
    type IntoIter = btree_map::IntoIter<String, Symbol>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<S: Into<String>> FromIterator<(S, Symbol)> for Variables {
    fn from_iter<T: IntoIterator<Item = (S, Symbol)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
