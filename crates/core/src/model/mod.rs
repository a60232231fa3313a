//! ABI intermediate representation.
//!
//! Plain data describing everything that matters for binary compatibility of a
//! library interface:
//! - Types (records, enums, pointers, references, qualifiers, arrays, builtins,
//!   function types), stored as one closed sum type (`TypeIr` + `TypeBody`).
//! - Exported functions and global variables.
//! - ELF symbols that make up the exported-symbol set.
//!
//! Cross references between entities are always type ids (linker set keys),
//! never owning pointers, so cyclic type graphs are representable as-is.

mod symbols;
mod types;

use serde::{Deserialize, Serialize};

pub use symbols::*;
pub use types::*;

/// C++ access specifier attached to records, fields, bases, functions and globals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessSpecifier {
    #[default]
    Public,
    Protected,
    Private,
}

impl AccessSpecifier {
    /// Whether moving from `self` to `new` narrows visibility in a way that can break
    /// existing callers: `protected -> private`, or `public -> anything else`.
    pub fn is_downgraded_to(self, new: AccessSpecifier) -> bool {
        match self {
            AccessSpecifier::Public => new != AccessSpecifier::Public,
            AccessSpecifier::Protected => new == AccessSpecifier::Private,
            AccessSpecifier::Private => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccessSpecifier::Public => "public",
            AccessSpecifier::Protected => "protected",
            AccessSpecifier::Private => "private",
        }
    }

    pub fn is_public(&self) -> bool {
        *self == AccessSpecifier::Public
    }
}

/// Identity shared by every entity that takes part in linking.
///
/// `linker_set_key` is what correlates "the same" entity across two dumps;
/// `source_file` is provenance only and is never compared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Linkable {
    pub source_file: String,
    pub linker_set_key: String,
}

impl Linkable {
    pub fn new(linker_set_key: impl Into<String>, source_file: impl Into<String>) -> Self {
        Self { source_file: source_file.into(), linker_set_key: linker_set_key.into() }
    }
}

/// One unit handed to [`crate::module::Module::add_entity`] by an extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkableMessage {
    Type(TypeIr),
    Function(FunctionIr),
    GlobalVar(GlobalVarIr),
    ElfFunction(ElfSymbol),
    ElfObject(ElfSymbol),
}

impl LinkableMessage {
    /// Key the entity is stored under inside its collection.
    pub fn key(&self) -> &str {
        match self {
            LinkableMessage::Type(ty) => ty.type_id(),
            LinkableMessage::Function(func) => &func.linkable.linker_set_key,
            LinkableMessage::GlobalVar(var) => &var.linkable.linker_set_key,
            LinkableMessage::ElfFunction(sym) | LinkableMessage::ElfObject(sym) => &sym.name,
        }
    }
}

impl From<TypeIr> for LinkableMessage {
    fn from(value: TypeIr) -> Self {
        LinkableMessage::Type(value)
    }
}

impl From<FunctionIr> for LinkableMessage {
    fn from(value: FunctionIr) -> Self {
        LinkableMessage::Function(value)
    }
}

impl From<GlobalVarIr> for LinkableMessage {
    fn from(value: GlobalVarIr) -> Self {
        LinkableMessage::GlobalVar(value)
    }
}
