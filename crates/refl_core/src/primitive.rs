use crate::consts::PrimitiveKind;
use crate::names::NameHash;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modifier {
    #[default]
    Value,
    Pointer,
    Reference,
}

/// A typed slot: struct member, parameter or return value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: NameHash,
    /// Name of the referenced type; never owned.
    pub type_name: NameHash,
    pub modifier: Modifier,
    pub is_const: bool,
    /// Byte offset inside the owning class, 0 for parameters.
    #[serde(default)]
    pub offset: u32,
    /// Element count for fixed arrays, 0 otherwise.
    #[serde(default)]
    pub array_len: u32,
}

impl Field {
    pub fn new(name: NameHash, type_name: NameHash) -> Self {
        Self { name, type_name, ..Self::default() }
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifier = modifier;
        self
    }

    pub fn with_const(mut self, is_const: bool) -> Self {
        self.is_const = is_const;
        self
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_array_len(mut self, array_len: u32) -> Self {
        self.array_len = array_len;
        self
    }

    /// The part of a field that participates in signature identity.
    pub fn type_projection(&self) -> (bool, NameHash, Modifier) {
        (self.is_const, self.type_name, self.modifier)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Callable {
    pub unique_id: u64,
    pub return_field: Option<Field>,
    pub parameters: Vec<Field>,
}

impl Callable {
    /// Same signature, ignoring parameter names and other per-declaration detail.
    pub fn same_signature(&self, other: &Callable) -> bool {
        self.unique_id == other.unique_id
            && self.return_field.as_ref().map(Field::type_projection)
                == other.return_field.as_ref().map(Field::type_projection)
            && self.parameters.len() == other.parameters.len()
            && self
                .parameters
                .iter()
                .zip(&other.parameters)
                .all(|(a, b)| a.type_projection() == b.type_projection())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateArg {
    pub type_name: NameHash,
    pub is_pointer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PrimitiveBody {
    Namespace,
    Type { size: u32 },
    Class { size: u32, base_class: NameHash },
    Enum { size: u32 },
    EnumConstant { value: i64 },
    Field(Field),
    Function(Callable),
    Method(Callable),
    Template,
    TemplateType { size: u32, arguments: Vec<TemplateArg> },
}

/// Anything extracted from a scanned unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Primitive {
    pub name: NameHash,
    /// Enclosing scope; a weak reference by name.
    pub parent: NameHash,
    pub body: PrimitiveBody,
}

impl Primitive {
    pub fn new(name: NameHash, parent: NameHash, body: PrimitiveBody) -> Self {
        Self { name, parent, body }
    }

    pub fn kind(&self) -> PrimitiveKind {
        match self.body {
            PrimitiveBody::Namespace => PrimitiveKind::Namespace,
            PrimitiveBody::Type { .. } => PrimitiveKind::Type,
            PrimitiveBody::Class { .. } => PrimitiveKind::Class,
            PrimitiveBody::Enum { .. } => PrimitiveKind::Enum,
            PrimitiveBody::EnumConstant { .. } => PrimitiveKind::EnumConstant,
            PrimitiveBody::Field(_) => PrimitiveKind::Field,
            PrimitiveBody::Function(_) => PrimitiveKind::Function,
            PrimitiveBody::Method(_) => PrimitiveKind::Method,
            PrimitiveBody::Template => PrimitiveKind::Template,
            PrimitiveBody::TemplateType { .. } => PrimitiveKind::TemplateType,
        }
    }

    /// Byte size, 0 when unknown or not applicable.
    pub fn size(&self) -> u32 {
        match &self.body {
            PrimitiveBody::Type { size }
            | PrimitiveBody::Class { size, .. }
            | PrimitiveBody::Enum { size }
            | PrimitiveBody::TemplateType { size, .. } => *size,
            _ => 0,
        }
    }

    pub fn callable(&self) -> Option<&Callable> {
        match &self.body {
            PrimitiveBody::Function(c) | PrimitiveBody::Method(c) => Some(c),
            _ => None,
        }
    }

    pub fn unique_id(&self) -> Option<u64> {
        self.callable().map(|c| c.unique_id)
    }

    /// Whether two primitives sharing an identity key describe the same entity.
    pub fn same_definition(&self, other: &Primitive) -> bool {
        if self.name != other.name || self.parent != other.parent {
            return false;
        }
        match (&self.body, &other.body) {
            (PrimitiveBody::Function(a), PrimitiveBody::Function(b))
            | (PrimitiveBody::Method(a), PrimitiveBody::Method(b)) => a.same_signature(b),
            (a, b) => a == b,
        }
    }

    /// Every name this primitive refers to, own name first.
    pub fn referenced_names(&self) -> Vec<NameHash> {
        let mut out = vec![self.name, self.parent];
        let push_field = |out: &mut Vec<NameHash>, f: &Field| {
            out.push(f.name);
            out.push(f.type_name);
        };
        match &self.body {
            PrimitiveBody::Class { base_class, .. } => out.push(*base_class),
            PrimitiveBody::Field(f) => push_field(&mut out, f),
            PrimitiveBody::Function(c) | PrimitiveBody::Method(c) => {
                if let Some(r) = &c.return_field {
                    push_field(&mut out, r);
                }
                for p in &c.parameters {
                    push_field(&mut out, p);
                }
            }
            PrimitiveBody::TemplateType { arguments, .. } => {
                out.extend(arguments.iter().map(|a| a.type_name));
            }
            _ => {}
        }
        out.retain(|h| !h.is_none());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(n: u64) -> NameHash { NameHash(n) }

    #[test]
    fn kind_follows_body() {
        let p = Primitive::new(h(1), NameHash::NONE, PrimitiveBody::Enum { size: 4 });
        assert_eq!(p.kind(), PrimitiveKind::Enum);
        assert_eq!(p.size(), 4);
        assert!(p.unique_id().is_none());
    }

    #[test]
    fn callables_ignore_parameter_names() {
        let sig = |pname: u64| Callable {
            unique_id: 9,
            return_field: None,
            parameters: vec![Field::new(h(pname), h(100)).with_const(true)],
        };
        let a = Primitive::new(h(1), h(2), PrimitiveBody::Function(sig(10)));
        let b = Primitive::new(h(1), h(2), PrimitiveBody::Function(sig(11)));
        assert!(a.same_definition(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn non_callables_compare_structurally() {
        let a = Primitive::new(h(1), NameHash::NONE, PrimitiveBody::Type { size: 4 });
        let b = Primitive::new(h(1), NameHash::NONE, PrimitiveBody::Type { size: 8 });
        assert!(!a.same_definition(&b));
        assert!(a.same_definition(&a.clone()));
    }

    #[test]
    fn referenced_names_skip_the_sentinel() {
        let f = Field::new(h(3), h(4)).with_modifier(Modifier::Pointer);
        let p = Primitive::new(h(1), NameHash::NONE, PrimitiveBody::Field(f));
        assert_eq!(p.referenced_names(), vec![h(1), h(3), h(4)]);
    }
}
