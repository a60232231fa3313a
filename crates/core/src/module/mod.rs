//! The IR container for one library version.
//!
//! A [`Module`] owns every entity produced for a library and indexes each
//! collection by linker set key (ELF symbols by name). It is populated once,
//! through [`Module::add_entity`], and only read afterwards; the diff engine
//! borrows two of them.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::model::{ElfSymbol, FunctionIr, GlobalVarIr, LinkableMessage, TypeIr};

/// Name reported for type ids that do not resolve inside a module.
pub const UNEXPORTED_TYPE_NAME: &str = "type-unexported";

/// Collection an entity lives in. Keys are unique per collection, not globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Type,
    Function,
    GlobalVar,
    ElfFunction,
    ElfObject,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Type => "type",
            EntityKind::Function => "function",
            EntityKind::GlobalVar => "global variable",
            EntityKind::ElfFunction => "ELF function",
            EntityKind::ElfObject => "ELF object",
        };
        f.write_str(label)
    }
}

/// Structural errors raised while populating a module.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModuleError {
    /// Two different entities claimed the same key within one collection.
    #[error("duplicate {kind} key `{key}`: two different entities share it")]
    DuplicateKey { kind: EntityKind, key: String },
}

pub type ModuleResult<T> = Result<T, ModuleError>;

/// Exported dynamic symbols, pre-filtered to what the library actually exports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportedSymbolSet {
    pub functions: BTreeMap<String, ElfSymbol>,
    pub objects: BTreeMap<String, ElfSymbol>,
}

impl ExportedSymbolSet {
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.objects.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Module {
    types: BTreeMap<String, TypeIr>,
    functions: BTreeMap<String, FunctionIr>,
    global_vars: BTreeMap<String, GlobalVarIr>,
    exported: ExportedSymbolSet,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a module from a sequence of entities, failing on the first duplicate.
    pub fn from_entities<I>(entities: I) -> ModuleResult<Self>
    where
        I: IntoIterator<Item = LinkableMessage>,
    {
        let mut module = Module::new();
        for entity in entities {
            module.add_entity(entity)?;
        }
        Ok(module)
    }

    /// Insert an entity under its key.
    ///
    /// Adding an entity identical to the one already stored is a no-op; a
    /// different entity under an occupied key is reported as
    /// [`ModuleError::DuplicateKey`] and leaves the module untouched.
    pub fn add_entity(&mut self, entity: impl Into<LinkableMessage>) -> ModuleResult<()> {
        match entity.into() {
            LinkableMessage::Type(ty) => {
                let key = ty.type_id().to_string();
                insert_unique(&mut self.types, EntityKind::Type, key, ty)
            }
            LinkableMessage::Function(func) => {
                let key = func.linker_set_key().to_string();
                insert_unique(&mut self.functions, EntityKind::Function, key, func)
            }
            LinkableMessage::GlobalVar(var) => {
                let key = var.linker_set_key().to_string();
                insert_unique(&mut self.global_vars, EntityKind::GlobalVar, key, var)
            }
            LinkableMessage::ElfFunction(sym) => {
                let key = sym.name.clone();
                insert_unique(&mut self.exported.functions, EntityKind::ElfFunction, key, sym)
            }
            LinkableMessage::ElfObject(sym) => {
                let key = sym.name.clone();
                insert_unique(&mut self.exported.objects, EntityKind::ElfObject, key, sym)
            }
        }
    }

    pub fn type_graph(&self) -> &BTreeMap<String, TypeIr> {
        &self.types
    }

    pub fn functions(&self) -> &BTreeMap<String, FunctionIr> {
        &self.functions
    }

    pub fn global_vars(&self) -> &BTreeMap<String, GlobalVarIr> {
        &self.global_vars
    }

    pub fn exported_symbols(&self) -> &ExportedSymbolSet {
        &self.exported
    }

    pub fn elf_functions(&self) -> &BTreeMap<String, ElfSymbol> {
        &self.exported.functions
    }

    pub fn elf_objects(&self) -> &BTreeMap<String, ElfSymbol> {
        &self.exported.objects
    }

    pub fn find_type(&self, id: &str) -> Option<&TypeIr> {
        self.types.get(id)
    }

    /// Human-readable name of a type id, or [`UNEXPORTED_TYPE_NAME`] when the id
    /// does not resolve in this module.
    pub fn type_name(&self, id: &str) -> &str {
        self.types.get(id).map(|ty| ty.name.as_str()).unwrap_or(UNEXPORTED_TYPE_NAME)
    }

    /// Non-anonymous records and enums, keyed by type id.
    pub fn user_defined_types(&self) -> impl Iterator<Item = (&str, &TypeIr)> {
        self.types.iter().filter(|(_, ty)| ty.is_user_defined()).map(|(k, ty)| (k.as_str(), ty))
    }

    /// Total number of entities across every collection.
    pub fn len(&self) -> usize {
        self.types.len()
            + self.functions.len()
            + self.global_vars.len()
            + self.exported.functions.len()
            + self.exported.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn insert_unique<T: PartialEq>(
    map: &mut BTreeMap<String, T>,
    kind: EntityKind,
    key: String,
    value: T,
) -> ModuleResult<()> {
    match map.entry(key) {
        Entry::Vacant(slot) => {
            slot.insert(value);
            Ok(())
        }
        Entry::Occupied(slot) if *slot.get() == value => Ok(()),
        Entry::Occupied(slot) => Err(ModuleError::DuplicateKey { kind, key: slot.key().clone() }),
    }
}
