//! Overload identity for functions and methods.
//!
//! A callable's `unique_id` is a pure function of the ordered
//! (const, type name, pointer/reference) triples of its return value and
//! parameters. Names, offsets and array lengths never take part, which is what
//! lets re-declarations of one callable in different units merge cleanly.

use crate::hashing::{hash_name, mix_hashes};
use crate::names::NameTable;
use crate::primitive::{Field, Modifier};

/// `"const "` + type text + `"*"`/`"&"`. A type hash missing from `names`
/// spells as empty text.
pub fn field_spelling(field: &Field, names: &NameTable) -> String {
    if !field.type_name.is_none() && !names.contains(field.type_name) {
        tracing::debug!(type_name = %field.type_name, "field type is not interned");
    }
    let base = &names.get_name_by_hash(field.type_name).text;
    let mut s = String::with_capacity(base.len() + 7);
    if field.is_const {
        s.push_str("const ");
    }
    s.push_str(base);
    match field.modifier {
        Modifier::Pointer => s.push('*'),
        Modifier::Reference => s.push('&'),
        Modifier::Value => {}
    }
    s
}

pub fn field_hash(field: &Field, names: &NameTable) -> u64 {
    hash_name(&field_spelling(field, names))
}

/// Seed with the return field's hash (0 when void), then fold in every
/// parameter in declaration order.
pub fn calculate_unique_id(return_field: Option<&Field>, parameters: &[Field], names: &NameTable) -> u64 {
    let seed = return_field.map_or(0, |r| field_hash(r, names));
    parameters
        .iter()
        .fold(seed, |id, p| mix_hashes(id, field_hash(p, names)))
}
