//! Folding per-unit databases into one.
//!
//! Identity is `(kind, name)` for non-callables and `(kind, name, unique_id)`
//! for callables. Inputs that agree collapse into one entry; inputs that
//! disagree on the same identity produce a [`Conflict`] and the first
//! definition seen is the one kept. Several same-named entries coming from a
//! single input are legitimate (e.g. enum constants in different scopes) and
//! are all kept.
//!
//! Kinds never interact, so each kind is folded over its own key space.

use crate::consts::PrimitiveKind;
use crate::database::Database;
use crate::errors::Result;
use crate::names::Name;
use crate::primitive::Primitive;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictSide {
    /// Source label of the contributing input, or `input #N`.
    pub source: String,
    pub primitive: Primitive,
}

/// Two inputs define the same identity differently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub kind: PrimitiveKind,
    pub name: Name,
    pub unique_id: Option<u64>,
    pub kept: ConflictSide,
    pub rejected: ConflictSide,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?} [{}]", self.kind, self.name.text, self.name.hash)?;
        if let Some(uid) = self.unique_id {
            write!(f, " uid={uid:016x}")?;
        }
        write!(f, " defined differently in {} and {}", self.kept.source, self.rejected.source)
    }
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub database: Database,
    pub conflicts: Vec<Conflict>,
}

impl MergeOutcome {
    pub fn is_clean(&self) -> bool { self.conflicts.is_empty() }
}

/// Collects frozen inputs, then folds them into a fresh database.
#[derive(Default)]
pub struct Merger<'a> {
    inputs: Vec<&'a Database>,
}

impl<'a> Merger<'a> {
    pub fn new() -> Self { Self { inputs: Vec::new() } }

    pub fn with_input(mut self, db: &'a Database) -> Self {
        self.inputs.push(db);
        self
    }

    pub fn add_input(&mut self, db: &'a Database) { self.inputs.push(db); }

    pub fn merge(self) -> Result<MergeOutcome> {
        let labels = self.inputs.iter().enumerate().map(|(i, db)| label(i, db)).collect();
        let mut acc = Accumulator::new(Database::new(), labels);

        for db in &self.inputs {
            acc.absorb_names(db)?;
        }
        for kind in PrimitiveKind::ALL {
            for (i, db) in self.inputs.iter().enumerate() {
                acc.fold_kind(kind, i, db);
            }
        }
        if self.inputs.iter().any(|db| db.has_base_types()) {
            acc.db.mark_base_types();
        }

        tracing::info!(
            inputs = self.inputs.len(),
            names = acc.db.names().len(),
            primitives = acc.db.len(),
            conflicts = acc.conflicts.len(),
            "merge finished"
        );
        Ok(MergeOutcome { database: acc.db, conflicts: acc.conflicts })
    }
}

pub fn merge(inputs: &[&Database]) -> Result<MergeOutcome> {
    let mut m = Merger::new();
    for db in inputs {
        m.add_input(db);
    }
    m.merge()
}

/// Fold one more unit into an existing accumulation. Everything already in
/// `acc` counts as coming from a single input.
pub fn merge_into(acc: &mut Database, db: &Database) -> Result<Vec<Conflict>> {
    let labels = vec![
        acc.source().map(str::to_owned).unwrap_or_else(|| "accumulated".to_string()),
        label(1, db),
    ];
    let base = std::mem::take(acc);
    let mut state = Accumulator::new(base, labels);
    // The existing entries all originate from input 0.
    for kind in PrimitiveKind::ALL {
        state.origins[kind.slot()] = vec![vec![0]; state.db.store().len_of(kind)];
    }

    let names = state.absorb_names(db);
    if let Err(e) = names {
        *acc = state.db;
        return Err(e);
    }
    for kind in PrimitiveKind::ALL {
        state.fold_kind(kind, 1, db);
    }
    if db.has_base_types() {
        state.db.mark_base_types();
    }
    *acc = state.db;
    Ok(state.conflicts)
}

fn label(i: usize, db: &Database) -> String {
    db.source().map(str::to_owned).unwrap_or_else(|| format!("input #{i}"))
}

struct Accumulator {
    db: Database,
    // per kind, per output entry: the inputs that carried an equal definition
    origins: [Vec<Vec<usize>>; PrimitiveKind::COUNT],
    labels: Vec<String>,
    conflicts: Vec<Conflict>,
}

impl Accumulator {
    fn new(db: Database, labels: Vec<String>) -> Self {
        Self {
            db,
            origins: std::array::from_fn(|_| Vec::new()),
            labels,
            conflicts: Vec::new(),
        }
    }

    fn absorb_names(&mut self, input: &Database) -> Result<()> {
        let names = self.db.names_mut();
        for n in input.names().iter() {
            names.bind(n.hash, &n.text)?;
        }
        Ok(())
    }

    /// Same-key entries already in the output; callables also match on uid.
    fn candidates(&self, kind: PrimitiveKind, p: &Primitive) -> Vec<usize> {
        let store = self.db.store();
        store
            .lookup_refs(kind, p.name)
            .iter()
            .copied()
            .filter(|&ix| !kind.is_callable() || store.at(kind, ix).unique_id() == p.unique_id())
            .collect()
    }

    /// Fold every entry of one kind from one input. Entries equal to an
    /// existing definition are collapsed first, so the verdict for the rest
    /// does not depend on their order inside the input.
    fn fold_kind(&mut self, kind: PrimitiveKind, input: usize, db: &Database) {
        let mut pending = Vec::new();
        for p in db.primitives(kind) {
            let store = self.db.store();
            let equal = self
                .candidates(kind, p)
                .into_iter()
                .find(|&ix| store.at(kind, ix).same_definition(p));
            match equal {
                Some(ix) => {
                    let origins = &mut self.origins[kind.slot()][ix];
                    if !origins.contains(&input) {
                        origins.push(input);
                    }
                }
                None => pending.push(p),
            }
        }

        // decided against the collapsed state, before anything is appended
        let rivals: Vec<Option<usize>> = pending.iter().map(|p| self.rival(kind, input, p)).collect();
        for (p, rival) in pending.into_iter().zip(rivals) {
            match rival {
                None => {
                    self.db.store_mut().push_raw(p.clone());
                    self.origins[kind.slot()].push(vec![input]);
                }
                Some(ix) => self.report(kind, input, ix, p),
            }
        }
    }

    /// The entry a new definition clashes with, if any. Same-key entries are
    /// fine when the input already contributed to that key.
    fn rival(&self, kind: PrimitiveKind, input: usize, p: &Primitive) -> Option<usize> {
        let candidates = self.candidates(kind, p);
        let origins = &self.origins[kind.slot()];
        if candidates.iter().any(|&ix| origins[ix].contains(&input)) {
            return None;
        }
        candidates.first().copied()
    }

    fn report(&mut self, kind: PrimitiveKind, input: usize, ix: usize, p: &Primitive) {
        let conflict = Conflict {
            kind,
            name: self.db.get_name_by_hash(p.name).clone(),
            unique_id: p.unique_id(),
            kept: ConflictSide {
                source: self.labels[self.origins[kind.slot()][ix][0]].clone(),
                primitive: self.db.store().at(kind, ix).clone(),
            },
            rejected: ConflictSide {
                source: self.labels[input].clone(),
                primitive: p.clone(),
            },
        };
        tracing::warn!(%conflict, "definition conflict");
        self.conflicts.push(conflict);
    }
}
