pub mod consts;
pub mod errors;
pub mod utils;
pub mod hashing;
pub mod names;
pub mod primitive;
pub mod store;
pub mod signature;
pub mod database;
pub mod merge;
pub mod snapshot;
pub mod binary;

pub use consts::PrimitiveKind;
pub use database::{Database, KindCount};
pub use errors::{ReflError, Result};
pub use merge::{merge, merge_into, Conflict, MergeOutcome, Merger};
pub use names::{Name, NameHash, NameTable, NO_NAME};
pub use primitive::{Callable, Field, Modifier, Primitive, PrimitiveBody, TemplateArg};
pub use signature::calculate_unique_id;
pub use snapshot::{load_json, save_json, Snapshot};
pub use store::{PrimitiveRef, PrimitiveStore};
