//! Per-kind, append-only primitive storage.
//!
//! Each kind keeps its primitives in discovery order plus a multimap from name
//! hash to positions in that order. Nothing is ever removed, so a
//! [`PrimitiveRef`] stays valid for the lifetime of the store.

use crate::consts::PrimitiveKind;
use crate::names::NameHash;
use crate::primitive::Primitive;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Address-independent handle to a stored primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrimitiveRef {
    pub kind: PrimitiveKind,
    pub name: NameHash,
    pub index: usize,
}

#[derive(Debug, Clone, Default)]
struct KindTable {
    items: Vec<Primitive>,
    by_name: HashMap<NameHash, Vec<usize>>,
}

impl KindTable {
    fn find_identical(&self, p: &Primitive) -> Option<usize> {
        self.by_name
            .get(&p.name)?
            .iter()
            .copied()
            .find(|&i| self.items[i].same_definition(p))
    }

    fn push(&mut self, p: Primitive) -> usize {
        let i = self.items.len();
        self.by_name.entry(p.name).or_default().push(i);
        self.items.push(p);
        i
    }
}

#[derive(Debug, Clone)]
pub struct PrimitiveStore {
    tables: [KindTable; PrimitiveKind::COUNT],
}

impl Default for PrimitiveStore {
    fn default() -> Self {
        Self { tables: std::array::from_fn(|_| KindTable::default()) }
    }
}

impl PrimitiveStore {
    pub fn new() -> Self { Self::default() }

    /// Append `p` unless an equal definition is already stored. Callables
    /// compare by signature, so a re-declaration with other parameter names
    /// maps onto the first one. Returns the entry's handle and whether it was
    /// newly inserted.
    pub fn add(&mut self, p: Primitive) -> (PrimitiveRef, bool) {
        let kind = p.kind();
        let name = p.name;
        let table = &mut self.tables[kind.slot()];
        if let Some(index) = table.find_identical(&p) {
            return (PrimitiveRef { kind, name, index }, false);
        }
        let index = table.push(p);
        (PrimitiveRef { kind, name, index }, true)
    }

    /// Always appends, even when an identical primitive exists. Used when
    /// rebuilding from a snapshot, where order must be reproduced exactly.
    pub(crate) fn push_raw(&mut self, p: Primitive) -> PrimitiveRef {
        let kind = p.kind();
        let name = p.name;
        let index = self.tables[kind.slot()].push(p);
        PrimitiveRef { kind, name, index }
    }

    pub(crate) fn at(&self, kind: PrimitiveKind, index: usize) -> &Primitive {
        &self.tables[kind.slot()].items[index]
    }

    pub fn get(&self, r: PrimitiveRef) -> Option<&Primitive> {
        self.tables[r.kind.slot()].items.get(r.index)
    }

    /// All candidates of `kind` named `name`, in insertion order. No
    /// disambiguation happens here.
    pub fn lookup(&self, kind: PrimitiveKind, name: NameHash) -> Vec<&Primitive> {
        let table = &self.tables[kind.slot()];
        match table.by_name.get(&name) {
            Some(ix) => ix.iter().map(|&i| &table.items[i]).collect(),
            None => Vec::new(),
        }
    }

    pub(crate) fn lookup_refs(&self, kind: PrimitiveKind, name: NameHash) -> &[usize] {
        self.tables[kind.slot()]
            .by_name
            .get(&name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn find_callable(&self, kind: PrimitiveKind, name: NameHash, unique_id: u64) -> Option<&Primitive> {
        self.lookup(kind, name)
            .into_iter()
            .find(|p| p.unique_id() == Some(unique_id))
    }

    pub fn iter(&self, kind: PrimitiveKind) -> std::slice::Iter<'_, Primitive> {
        self.tables[kind.slot()].items.iter()
    }

    /// Every primitive of every kind, in kind order then insertion order.
    pub fn iter_all(&self) -> impl Iterator<Item = &Primitive> + '_ {
        PrimitiveKind::ALL.into_iter().flat_map(move |k| self.iter(k))
    }

    pub fn children(&self, parent: NameHash) -> Vec<&Primitive> {
        if parent.is_none() {
            return Vec::new();
        }
        self.iter_all().filter(|p| p.parent == parent).collect()
    }

    pub fn len_of(&self, kind: PrimitiveKind) -> usize { self.tables[kind.slot()].items.len() }

    pub fn len(&self) -> usize { self.tables.iter().map(|t| t.items.len()).sum() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::{Callable, PrimitiveBody};

    fn func(name: u64, uid: u64) -> Primitive {
        Primitive::new(
            NameHash(name),
            NameHash::NONE,
            PrimitiveBody::Function(Callable { unique_id: uid, return_field: None, parameters: vec![] }),
        )
    }

    #[test]
    fn overloads_share_a_name() {
        let mut s = PrimitiveStore::new();
        let (a, new_a) = s.add(func(7, 1));
        let (b, new_b) = s.add(func(7, 2));
        assert!(new_a && new_b);
        assert_ne!(a.index, b.index);

        let found = s.lookup(PrimitiveKind::Function, NameHash(7));
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].unique_id(), Some(1));
        assert_eq!(found[1].unique_id(), Some(2));
        assert_eq!(s.find_callable(PrimitiveKind::Function, NameHash(7), 2), Some(found[1]));
    }

    #[test]
    fn identical_re_add_is_idempotent() {
        let mut s = PrimitiveStore::new();
        let (first, _) = s.add(func(7, 1));
        let (again, inserted) = s.add(func(7, 1));
        assert!(!inserted);
        assert_eq!(first, again);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn missing_names_give_no_candidates() {
        let s = PrimitiveStore::new();
        assert!(s.lookup(PrimitiveKind::Class, NameHash(99)).is_empty());
        assert!(s.is_empty());
    }

    #[test]
    fn kinds_are_partitioned() {
        let mut s = PrimitiveStore::new();
        s.add(Primitive::new(NameHash(1), NameHash::NONE, PrimitiveBody::Type { size: 4 }));
        s.add(Primitive::new(NameHash(1), NameHash::NONE, PrimitiveBody::Namespace));
        assert_eq!(s.len_of(PrimitiveKind::Type), 1);
        assert_eq!(s.len_of(PrimitiveKind::Namespace), 1);
        let order: Vec<PrimitiveKind> = s.iter_all().map(Primitive::kind).collect();
        assert_eq!(order, [PrimitiveKind::Namespace, PrimitiveKind::Type]);
    }
}
