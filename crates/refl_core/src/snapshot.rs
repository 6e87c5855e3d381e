//! Serializer-facing view of a database.
//!
//! A [`Snapshot`] lists every referenced name as a (hash, text) pair, followed
//! by every primitive tagged with its kind, in kind order then insertion
//! order. Both the JSON files written here and the binary container in
//! [`crate::binary`] carry exactly this structure.

use crate::consts::{PrimitiveKind, FORMAT_VERSION};
use crate::database::Database;
use crate::errors::{ReflError, Result};
use crate::names::{Name, NameHash};
use crate::primitive::{Primitive, PrimitiveBody};
use crate::signature::calculate_unique_id;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveRecord {
    pub kind: u16,
    pub name: NameHash,
    pub parent: NameHash,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<u64>,
    pub payload: PrimitiveBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub base_types: bool,
    pub names: Vec<Name>,
    pub primitives: Vec<PrimitiveRecord>,
}

impl Database {
    pub fn snapshot(&self) -> Snapshot {
        let names = self.referenced_names().into_iter().cloned().collect();
        let primitives = self
            .all_primitives()
            .map(|p| PrimitiveRecord {
                kind: p.kind().tag(),
                name: p.name,
                parent: p.parent,
                unique_id: p.unique_id(),
                payload: p.body.clone(),
            })
            .collect();
        Snapshot {
            version: FORMAT_VERSION,
            source: self.source().map(str::to_owned),
            base_types: self.has_base_types(),
            names,
            primitives,
        }
    }

    /// Rebuild a database, re-checking every name hash and callable id.
    pub fn from_snapshot(snap: &Snapshot) -> Result<Database> {
        if snap.version != FORMAT_VERSION {
            return Err(ReflError::BadHeader);
        }
        let mut db = Database::new();
        db.set_source(snap.source.clone());
        for n in &snap.names {
            db.names_mut().insert_name(n)?;
        }
        for rec in &snap.primitives {
            let kind = PrimitiveKind::from_tag(rec.kind).ok_or(ReflError::UnknownKind(rec.kind))?;
            let p = Primitive::new(rec.name, rec.parent, rec.payload.clone());
            if p.kind() != kind || p.unique_id() != rec.unique_id {
                return Err(ReflError::Corrupt);
            }
            if let Some(c) = p.callable() {
                let computed = calculate_unique_id(c.return_field.as_ref(), &c.parameters, db.names());
                if computed != c.unique_id {
                    tracing::error!(name = %p.name, stored = c.unique_id, computed, "callable id does not match its signature");
                    return Err(ReflError::Corrupt);
                }
            }
            db.store_mut().push_raw(p);
        }
        if snap.base_types {
            db.mark_base_types();
        }
        Ok(db)
    }
}

/// Write `db` as pretty JSON through a temp file in the same directory, then
/// rename it into place.
pub fn save_json(db: &Database, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let dir = path.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(Path::new("."));
    fs::create_dir_all(dir)?;
    let mut tmp = tempfile::Builder::new().prefix(".refl_").tempfile_in(dir)?;
    serde_json::to_writer_pretty(tmp.as_file_mut(), &db.snapshot())?;
    tmp.as_file_mut().write_all(b"\n")?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}

pub fn load_json(path: impl AsRef<Path>) -> Result<Database> {
    let f = File::open(path)?;
    let snap: Snapshot = serde_json::from_reader(BufReader::new(f))?;
    Database::from_snapshot(&snap)
}
