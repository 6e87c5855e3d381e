use crate::names::NameHash;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReflError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Persist: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("name hash collision on {hash}: existing {existing:?}, incoming {incoming:?}")]
    NameCollision {
        hash: NameHash,
        existing: String,
        incoming: String,
    },

    #[error("name {text:?} stored with hash {stored} but hashes to {computed}")]
    NameHashMismatch {
        text: String,
        stored: NameHash,
        computed: NameHash,
    },

    #[error("Bad magic or version")]
    BadHeader,

    #[error("checksum mismatch: stored {stored:08x}, computed {computed:08x}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    #[error("Corrupt record")]
    Corrupt,

    #[error("Unknown primitive kind tag {0}")]
    UnknownKind(u16),
}

pub type Result<T> = std::result::Result<T, ReflError>;
