use crate::consts::PrimitiveKind;
use crate::errors::Result;
use crate::names::{Name, NameHash, NameTable};
use crate::primitive::{Callable, Field, Primitive, PrimitiveBody, TemplateArg};
use crate::signature::calculate_unique_id;
use crate::store::{PrimitiveRef, PrimitiveStore};
use std::collections::HashSet;
use std::ffi::{c_char, c_int, c_long, c_short, c_uchar, c_uint, c_ulong, c_ushort};
use std::mem::size_of;

/// Metadata extracted from one scanned unit, or the merge of several.
///
/// The database exclusively owns its names and primitives; primitives point
/// at each other only through [`NameHash`] keys, so nothing here depends on
/// insertion order or on where a record lives in memory.
#[derive(Debug, Clone, Default)]
pub struct Database {
    names: NameTable,
    store: PrimitiveStore,
    source: Option<String>,
    base_types_seeded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindCount {
    pub kind: PrimitiveKind,
    pub count: usize,
}

impl Database {
    pub fn new() -> Self { Self::default() }

    /// A fresh database with the scalar base types already present.
    pub fn with_base_types() -> Result<Self> {
        let mut db = Self::new();
        db.add_base_type_primitives()?;
        Ok(db)
    }

    /// Label the scanned unit this database came from; merge conflicts report it.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn source(&self) -> Option<&str> { self.source.as_deref() }

    pub fn set_source(&mut self, source: Option<String>) { self.source = source; }

    /// Seed the fundamental scalar types with this platform's sizes.
    pub fn add_base_type_primitives(&mut self) -> Result<()> {
        if self.base_types_seeded {
            tracing::debug!("base types already present");
            return Ok(());
        }
        let base: [(&str, usize); 12] = [
            ("void", 0),
            ("bool", size_of::<bool>()),
            ("char", size_of::<c_char>()),
            ("unsigned char", size_of::<c_uchar>()),
            ("short", size_of::<c_short>()),
            ("unsigned short", size_of::<c_ushort>()),
            ("int", size_of::<c_int>()),
            ("unsigned int", size_of::<c_uint>()),
            ("long", size_of::<c_long>()),
            ("unsigned long", size_of::<c_ulong>()),
            ("float", size_of::<f32>()),
            ("double", size_of::<f64>()),
        ];
        for (text, size) in base {
            self.add_type(text, NameHash::NONE, size as u32)?;
        }
        self.base_types_seeded = true;
        tracing::debug!(count = base.len(), "seeded base types");
        Ok(())
    }

    pub fn has_base_types(&self) -> bool { self.base_types_seeded }

    pub(crate) fn mark_base_types(&mut self) { self.base_types_seeded = true; }

    // ---- names ----

    pub fn get_name(&mut self, text: &str) -> Result<&Name> { self.names.get_name(text) }

    pub fn get_optional_name(&mut self, text: Option<&str>) -> Result<&Name> {
        self.names.get_optional_name(text)
    }

    pub fn get_name_by_hash(&self, hash: NameHash) -> &Name { self.names.get_name_by_hash(hash) }

    pub fn names(&self) -> &NameTable { &self.names }

    pub(crate) fn names_mut(&mut self) -> &mut NameTable { &mut self.names }

    fn intern(&mut self, text: &str) -> Result<NameHash> { Ok(self.names.get_name(text)?.hash) }

    // ---- primitives ----

    /// Store `p`, or return the existing entry if an equal definition is stored.
    pub fn add_primitive(&mut self, p: Primitive) -> PrimitiveRef {
        let (r, inserted) = self.store.add(p);
        if !inserted {
            tracing::debug!(kind = %r.kind, name = %r.name, "equal definition already stored");
        }
        r
    }

    pub(crate) fn store(&self) -> &PrimitiveStore { &self.store }

    pub(crate) fn store_mut(&mut self) -> &mut PrimitiveStore { &mut self.store }

    pub fn add_namespace(&mut self, name: &str, parent: NameHash) -> Result<PrimitiveRef> {
        let name = self.intern(name)?;
        Ok(self.add_primitive(Primitive::new(name, parent, PrimitiveBody::Namespace)))
    }

    pub fn add_type(&mut self, name: &str, parent: NameHash, size: u32) -> Result<PrimitiveRef> {
        let name = self.intern(name)?;
        Ok(self.add_primitive(Primitive::new(name, parent, PrimitiveBody::Type { size })))
    }

    /// The base class may be named before it has been added itself.
    pub fn add_class(&mut self, name: &str, parent: NameHash, size: u32, base_class: Option<&str>) -> Result<PrimitiveRef> {
        let name = self.intern(name)?;
        let base_class = self.names.get_optional_name(base_class)?.hash;
        Ok(self.add_primitive(Primitive::new(name, parent, PrimitiveBody::Class { size, base_class })))
    }

    pub fn add_enum(&mut self, name: &str, parent: NameHash, size: u32) -> Result<PrimitiveRef> {
        let name = self.intern(name)?;
        Ok(self.add_primitive(Primitive::new(name, parent, PrimitiveBody::Enum { size })))
    }

    pub fn add_enum_constant(&mut self, name: &str, parent: NameHash, value: i64) -> Result<PrimitiveRef> {
        let name = self.intern(name)?;
        Ok(self.add_primitive(Primitive::new(name, parent, PrimitiveBody::EnumConstant { value })))
    }

    /// Build a value field with both names interned.
    pub fn field(&mut self, name: &str, type_name: &str) -> Result<Field> {
        let name = self.intern(name)?;
        let type_name = self.intern(type_name)?;
        Ok(Field::new(name, type_name))
    }

    /// Store a data member of `parent`.
    pub fn add_field(&mut self, parent: NameHash, field: Field) -> PrimitiveRef {
        self.add_primitive(Primitive::new(field.name, parent, PrimitiveBody::Field(field)))
    }

    pub fn add_function(&mut self, name: &str, parent: NameHash, return_field: Option<Field>, parameters: Vec<Field>) -> Result<PrimitiveRef> {
        let name = self.intern(name)?;
        let callable = self.callable(return_field, parameters);
        Ok(self.add_primitive(Primitive::new(name, parent, PrimitiveBody::Function(callable))))
    }

    pub fn add_method(&mut self, name: &str, parent: NameHash, return_field: Option<Field>, parameters: Vec<Field>) -> Result<PrimitiveRef> {
        let name = self.intern(name)?;
        let callable = self.callable(return_field, parameters);
        Ok(self.add_primitive(Primitive::new(name, parent, PrimitiveBody::Method(callable))))
    }

    fn callable(&self, return_field: Option<Field>, parameters: Vec<Field>) -> Callable {
        let unique_id = calculate_unique_id(return_field.as_ref(), &parameters, &self.names);
        Callable { unique_id, return_field, parameters }
    }

    pub fn add_template(&mut self, name: &str, parent: NameHash) -> Result<PrimitiveRef> {
        let name = self.intern(name)?;
        Ok(self.add_primitive(Primitive::new(name, parent, PrimitiveBody::Template)))
    }

    /// `arguments` are (type name, is_pointer) pairs in declaration order.
    pub fn add_template_type(&mut self, name: &str, parent: NameHash, size: u32, arguments: &[(&str, bool)]) -> Result<PrimitiveRef> {
        let name = self.intern(name)?;
        let mut args = Vec::with_capacity(arguments.len());
        for &(type_name, is_pointer) in arguments {
            args.push(TemplateArg { type_name: self.intern(type_name)?, is_pointer });
        }
        Ok(self.add_primitive(Primitive::new(name, parent, PrimitiveBody::TemplateType { size, arguments: args })))
    }

    // ---- queries ----

    pub fn get(&self, r: PrimitiveRef) -> Option<&Primitive> { self.store.get(r) }

    pub fn lookup(&self, kind: PrimitiveKind, name: NameHash) -> Vec<&Primitive> { self.store.lookup(kind, name) }

    /// Convenience over [`lookup`](Self::lookup) for callers holding text.
    /// Unknown text yields no candidates.
    pub fn lookup_text(&self, kind: PrimitiveKind, text: &str) -> Vec<&Primitive> {
        let hash = NameHash(crate::hashing::hash_name(text));
        if !self.names.contains(hash) {
            return Vec::new();
        }
        self.store.lookup(kind, hash)
    }

    pub fn find_callable(&self, kind: PrimitiveKind, name: NameHash, unique_id: u64) -> Option<&Primitive> {
        self.store.find_callable(kind, name, unique_id)
    }

    pub fn primitives(&self, kind: PrimitiveKind) -> impl Iterator<Item = &Primitive> + '_ { self.store.iter(kind) }

    pub fn all_primitives(&self) -> impl Iterator<Item = &Primitive> + '_ { self.store.iter_all() }

    pub fn children(&self, parent: NameHash) -> Vec<&Primitive> { self.store.children(parent) }

    pub fn len(&self) -> usize { self.store.len() }

    pub fn is_empty(&self) -> bool { self.store.is_empty() }

    pub fn stats(&self) -> Vec<KindCount> {
        PrimitiveKind::ALL
            .into_iter()
            .map(|kind| KindCount { kind, count: self.store.len_of(kind) })
            .collect()
    }

    /// Names referenced by at least one stored primitive, in first-reference
    /// order. Interned names nothing points at are left out.
    pub fn referenced_names(&self) -> Vec<&Name> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for p in self.store.iter_all() {
            for h in p.referenced_names() {
                if seen.insert(h) {
                    let n = self.names.get_name_by_hash(h);
                    if !n.is_none() {
                        out.push(n);
                    }
                }
            }
        }
        out
    }
}
