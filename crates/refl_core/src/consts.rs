// crates/refl_core/src/consts.rs

use core::mem::size_of;

pub const MAGIC_DB: &[u8; 4] = b"RFDB";
/// Bumped whenever the name hash, the mix function or the field spelling changes.
pub const FORMAT_VERSION: u16 = 1;

/// magic[4] version[2] flags[2] names[4] primitives[4] payload_len[8]
pub const HDR_SIZE: usize = 24;
pub const TRAILER_SIZE: usize = 4;

#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum PrimitiveKind {
    Namespace    = 1,
    Type         = 2,
    Class        = 3,
    Enum         = 4,
    EnumConstant = 5,
    Field        = 6,
    Function     = 7,
    Method       = 8,
    Template     = 9,
    TemplateType = 10,
}

impl PrimitiveKind {
    pub const COUNT: usize = 10;

    /// Declaration order; also the order snapshots and merges walk the kinds in.
    pub const ALL: [PrimitiveKind; Self::COUNT] = [
        PrimitiveKind::Namespace,
        PrimitiveKind::Type,
        PrimitiveKind::Class,
        PrimitiveKind::Enum,
        PrimitiveKind::EnumConstant,
        PrimitiveKind::Field,
        PrimitiveKind::Function,
        PrimitiveKind::Method,
        PrimitiveKind::Template,
        PrimitiveKind::TemplateType,
    ];

    #[inline]
    pub fn tag(self) -> u16 { self as u16 }

    pub fn from_tag(tag: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }

    /// Dense slot in per-kind tables.
    #[inline]
    pub(crate) fn slot(self) -> usize { (self as usize) - 1 }

    pub fn is_callable(self) -> bool {
        matches!(self, PrimitiveKind::Function | PrimitiveKind::Method)
    }

    pub fn label(self) -> &'static str {
        match self {
            PrimitiveKind::Namespace => "namespace",
            PrimitiveKind::Type => "type",
            PrimitiveKind::Class => "class",
            PrimitiveKind::Enum => "enum",
            PrimitiveKind::EnumConstant => "enum-constant",
            PrimitiveKind::Field => "field",
            PrimitiveKind::Function => "function",
            PrimitiveKind::Method => "method",
            PrimitiveKind::Template => "template",
            PrimitiveKind::TemplateType => "template-type",
        }
    }
}

impl std::fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

const _: () = { assert!(size_of::<[u8; 4]>() == 4); };
const _: () = { assert!(HDR_SIZE == 4 + 2 + 2 + 4 + 4 + 8); };
