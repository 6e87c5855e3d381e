//! Interned, hash-identified names.
//!
//! Every symbol the scanner reports is keyed by the hash of its fully scoped
//! text. The table only ever grows; a hash, once bound to a text, stays bound
//! to it for the lifetime of the owning database.

use crate::errors::{ReflError, Result};
use crate::hashing::hash_name;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameHash(pub u64);

impl NameHash {
    /// Reserved for the "no name" sentinel.
    pub const NONE: NameHash = NameHash(0);

    #[inline]
    pub fn is_none(self) -> bool { self.0 == 0 }
}

impl fmt::Display for NameHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name {
    pub hash: NameHash,
    pub text: String,
}

/// Shared sentinel for absent or unknown names.
pub static NO_NAME: Name = Name { hash: NameHash::NONE, text: String::new() };

impl Name {
    pub fn is_none(&self) -> bool { self.hash.is_none() }
}

#[derive(Debug, Clone, Default)]
pub struct NameTable {
    by_hash: HashMap<NameHash, usize>,
    names: Vec<Name>,
}

impl NameTable {
    pub fn new() -> Self { Self::default() }

    /// Intern `text`. Empty text resolves to [`NO_NAME`] without insertion.
    pub fn get_name(&mut self, text: &str) -> Result<&Name> {
        if text.is_empty() {
            return Ok(&NO_NAME);
        }
        let hash = NameHash(hash_name(text));
        self.bind(hash, text)
    }

    /// Same as [`get_name`](Self::get_name), with `None` standing in for a null string.
    pub fn get_optional_name(&mut self, text: Option<&str>) -> Result<&Name> {
        match text {
            Some(t) => self.get_name(t),
            None => Ok(&NO_NAME),
        }
    }

    /// Resolve a previously interned hash. Misses return [`NO_NAME`].
    pub fn get_name_by_hash(&self, hash: NameHash) -> &Name {
        match self.by_hash.get(&hash) {
            Some(&i) => &self.names[i],
            None => &NO_NAME,
        }
    }

    /// Re-intern a pair loaded from a serialized stream. The stored hash must
    /// be the hash of the text, and must not clash with anything already here.
    pub fn insert_name(&mut self, name: &Name) -> Result<&Name> {
        if name.text.is_empty() && name.hash.is_none() {
            return Ok(&NO_NAME);
        }
        let computed = NameHash(hash_name(&name.text));
        if computed != name.hash {
            return Err(ReflError::NameHashMismatch {
                text: name.text.clone(),
                stored: name.hash,
                computed,
            });
        }
        self.bind(computed, &name.text)
    }

    /// Bind `text` under an already computed `hash`. Merge uses this for
    /// tables whose entries were verified when they were built.
    pub(crate) fn bind(&mut self, hash: NameHash, text: &str) -> Result<&Name> {
        if hash.is_none() {
            tracing::error!(text, "non-empty name hashes onto the sentinel");
            return Err(ReflError::NameCollision {
                hash,
                existing: String::new(),
                incoming: text.to_string(),
            });
        }
        if let Some(&i) = self.by_hash.get(&hash) {
            let existing = &self.names[i];
            if existing.text != text {
                tracing::error!(%hash, existing = %existing.text, incoming = text, "name hash collision");
                return Err(ReflError::NameCollision {
                    hash,
                    existing: existing.text.clone(),
                    incoming: text.to_string(),
                });
            }
            return Ok(&self.names[i]);
        }
        let i = self.names.len();
        self.names.push(Name { hash, text: text.to_string() });
        self.by_hash.insert(hash, i);
        Ok(&self.names[i])
    }

    pub fn contains(&self, hash: NameHash) -> bool { self.by_hash.contains_key(&hash) }

    pub fn len(&self) -> usize { self.names.len() }

    pub fn is_empty(&self) -> bool { self.names.is_empty() }

    /// Interned names in insertion order. The sentinel is never listed.
    pub fn iter(&self) -> impl Iterator<Item = &Name> + '_ { self.names.iter() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_intern_is_stable() {
        let mut t = NameTable::new();
        let a = t.get_name("Engine::Renderer").unwrap().clone();
        let b = t.get_name("Engine::Renderer").unwrap().clone();
        assert_eq!(a, b);
        assert_eq!(t.len(), 1);
        assert_eq!(t.get_name_by_hash(a.hash), &a);
    }

    #[test]
    fn null_and_empty_are_the_sentinel() {
        let mut t = NameTable::new();
        let empty = t.get_name("").unwrap();
        assert_eq!(empty.hash, NameHash::NONE);
        assert!(empty.text.is_empty());
        let null = t.get_optional_name(None).unwrap();
        assert_eq!(null.hash, NameHash(0));
        assert!(null.text.is_empty());
        assert!(t.is_empty());
    }

    #[test]
    fn unknown_hash_resolves_to_sentinel() {
        let t = NameTable::new();
        assert!(t.get_name_by_hash(NameHash(42)).is_none());
    }

    #[test]
    fn forged_collision_is_rejected() {
        let mut t = NameTable::new();
        let real = t.get_name("float").unwrap().hash;
        // Plant a second text under the same hash the way a corrupt stream would.
        t.names.push(Name { hash: NameHash(77), text: "a".into() });
        t.by_hash.insert(NameHash(77), t.names.len() - 1);
        let err = t.bind(NameHash(77), "b").unwrap_err();
        assert!(matches!(err, ReflError::NameCollision { hash: NameHash(77), .. }));
        assert_eq!(t.get_name_by_hash(NameHash(77)).text, "a");
        assert_eq!(t.get_name_by_hash(real).text, "float");
    }

    #[test]
    fn insert_name_checks_the_hash() {
        let mut t = NameTable::new();
        let bad = Name { hash: NameHash(5), text: "double".into() };
        assert!(matches!(t.insert_name(&bad), Err(ReflError::NameHashMismatch { .. })));

        let good = Name { hash: NameHash(hash_name("double")), text: "double".into() };
        assert_eq!(t.insert_name(&good).unwrap(), &good);
        assert!(t.contains(good.hash));
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let mut t = NameTable::new();
        for s in ["c", "a", "b"] {
            t.get_name(s).unwrap();
        }
        let order: Vec<&str> = t.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(order, ["c", "a", "b"]);
    }
}
