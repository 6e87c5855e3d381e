//! Checksummed binary container for a [`Snapshot`].
//!
//! Layout (LE):
//!   magic[4]      = "RFDB"
//!   version[2]    = FORMAT_VERSION
//!   flags[2]      = bit 0: base types seeded
//!   names[4]      = name count
//!   prims[4]      = primitive count
//!   payload[8]    = payload length in bytes
//!   payload       = snapshot, serde-JSON encoded
//!   crc[4]        = crc32(payload)

use crate::consts::{FORMAT_VERSION, HDR_SIZE, MAGIC_DB, TRAILER_SIZE};
use crate::database::Database;
use crate::errors::{ReflError, Result};
use crate::snapshot::Snapshot;
use crate::utils::{crc32, read_u16, read_u32, read_u64, write_u16, write_u32, write_u64};
use memmap2::Mmap;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

const FLAG_BASE_TYPES: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u16,
    pub flags: u16,
    pub names: u32,
    pub primitives: u32,
    pub payload_len: u64,
}

impl Header {
    pub fn has_base_types(&self) -> bool { self.flags & FLAG_BASE_TYPES != 0 }
}

pub fn encode(db: &Database) -> Result<Vec<u8>> {
    let snap = db.snapshot();
    let payload = serde_json::to_vec(&snap)?;
    let flags = if snap.base_types { FLAG_BASE_TYPES } else { 0 };

    let mut out = Vec::with_capacity(HDR_SIZE + payload.len() + TRAILER_SIZE);
    out.extend_from_slice(MAGIC_DB);
    write_u16(&mut out, FORMAT_VERSION)?;
    write_u16(&mut out, flags)?;
    write_u32(&mut out, u32::try_from(snap.names.len()).map_err(|_| ReflError::Corrupt)?)?;
    write_u32(&mut out, u32::try_from(snap.primitives.len()).map_err(|_| ReflError::Corrupt)?)?;
    write_u64(&mut out, payload.len() as u64)?;
    out.extend_from_slice(&payload);
    write_u32(&mut out, crc32(&payload))?;
    Ok(out)
}

/// Validate magic, version, bounds and checksum; return the header and the payload.
pub fn check(bytes: &[u8]) -> Result<(Header, &[u8])> {
    if bytes.len() < HDR_SIZE + TRAILER_SIZE || &bytes[0..4] != MAGIC_DB {
        return Err(ReflError::BadHeader);
    }
    let mut cur = &bytes[4..HDR_SIZE];
    let hdr = Header {
        version: read_u16(&mut cur)?,
        flags: read_u16(&mut cur)?,
        names: read_u32(&mut cur)?,
        primitives: read_u32(&mut cur)?,
        payload_len: read_u64(&mut cur)?,
    };
    if hdr.version != FORMAT_VERSION {
        return Err(ReflError::BadHeader);
    }
    let end = usize::try_from(hdr.payload_len)
        .ok()
        .and_then(|n| HDR_SIZE.checked_add(n))
        .ok_or(ReflError::Corrupt)?;
    if end.checked_add(TRAILER_SIZE) != Some(bytes.len()) {
        return Err(ReflError::Corrupt);
    }
    let payload = &bytes[HDR_SIZE..end];
    let stored = read_u32(&mut &bytes[end..])?;
    let computed = crc32(payload);
    if stored != computed {
        return Err(ReflError::ChecksumMismatch { stored, computed });
    }
    Ok((hdr, payload))
}

pub fn decode(bytes: &[u8]) -> Result<Database> {
    let (hdr, payload) = check(bytes)?;
    let snap: Snapshot = serde_json::from_slice(payload)?;
    if snap.names.len() != hdr.names as usize
        || snap.primitives.len() != hdr.primitives as usize
        || snap.base_types != hdr.has_base_types()
    {
        return Err(ReflError::Corrupt);
    }
    Database::from_snapshot(&snap)
}

/// Write through a temp file in the target directory, then rename into place.
pub fn write_file(db: &Database, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let bytes = encode(db)?;
    let dir = path.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(Path::new("."));
    fs::create_dir_all(dir)?;
    let mut tmp = tempfile::Builder::new().prefix(".refl_").tempfile_in(dir)?;
    tmp.as_file_mut().write_all(&bytes)?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}

pub fn read_file(path: impl AsRef<Path>) -> Result<Database> {
    let f = File::open(path)?;
    let mmap = unsafe { Mmap::map(&f)? };
    decode(&mmap)
}

/// Header of a file whose framing and checksum are intact.
pub fn verify_file(path: impl AsRef<Path>) -> Result<Header> {
    let f = File::open(path)?;
    let mmap = unsafe { Mmap::map(&f)? };
    let (hdr, _) = check(&mmap)?;
    Ok(hdr)
}
