//! Diff messages produced by the engine.
//!
//! Messages borrow from the two compared modules; nothing is copied until the
//! report emitter turns them into owned, name-resolved entries.

use crate::model::{
    AccessSpecifier, EnumField, EnumType, FunctionIr, GlobalVarIr, RecordField, RecordType,
    TypeIr,
};

use super::{Change, Reachability};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeInfoDiff {
    pub old_size: u64,
    pub new_size: u64,
    pub old_alignment: u32,
    pub new_alignment: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDiff<'a> {
    pub old: &'a RecordField,
    pub new: &'a RecordField,
}

/// A record whose own layout changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDiff<'a> {
    pub old_type: &'a TypeIr,
    pub new_type: &'a TypeIr,
    pub old: &'a RecordType,
    pub new: &'a RecordType,
    pub type_info_diff: Option<TypeInfoDiff>,
    pub access_diff: Option<(AccessSpecifier, AccessSpecifier)>,
    pub vtable_changed: bool,
    pub bases_changed: bool,
    pub fields_diff: Vec<FieldDiff<'a>>,
    pub fields_removed: Vec<&'a RecordField>,
    pub fields_added: Vec<&'a RecordField>,
}

impl RecordDiff<'_> {
    pub fn name(&self) -> &str {
        &self.old_type.name
    }

    pub fn linker_set_key(&self) -> &str {
        self.old_type.linker_set_key()
    }
}

/// An enum whose enumerators (or underlying type) changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDiff<'a> {
    pub old_type: &'a TypeIr,
    pub new_type: &'a TypeIr,
    pub old: &'a EnumType,
    pub new: &'a EnumType,
    /// Underlying type names (old, new) when they differ.
    pub underlying_type_diff: Option<(&'a str, &'a str)>,
    pub fields_added: Vec<&'a EnumField>,
    pub fields_removed: Vec<&'a EnumField>,
    pub fields_diff: Vec<(&'a EnumField, &'a EnumField)>,
}

impl EnumDiff<'_> {
    pub fn name(&self) -> &str {
        &self.old_type.name
    }

    pub fn linker_set_key(&self) -> &str {
        self.old_type.linker_set_key()
    }

    /// Only new enumerators: existing callers keep working.
    pub fn is_extended(&self) -> bool {
        self.fields_removed.is_empty()
            && self.fields_diff.is_empty()
            && self.underlying_type_diff.is_none()
            && !self.fields_added.is_empty()
    }

    pub fn is_incompatible(&self) -> bool {
        !self.fields_removed.is_empty()
            || !self.fields_diff.is_empty()
            || self.underlying_type_diff.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionDiff<'a> {
    pub old: &'a FunctionIr,
    pub new: &'a FunctionIr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalVarDiff<'a> {
    pub old: &'a GlobalVarIr,
    pub new: &'a GlobalVarIr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffMessage<'a> {
    Record(RecordDiff<'a>),
    Enum(EnumDiff<'a>),
    Function(FunctionDiff<'a>),
    GlobalVar(GlobalVarDiff<'a>),
}

impl DiffMessage<'_> {
    pub fn name(&self) -> &str {
        match self {
            DiffMessage::Record(diff) => diff.name(),
            DiffMessage::Enum(diff) => diff.name(),
            DiffMessage::Function(diff) => &diff.old.name,
            DiffMessage::GlobalVar(diff) => &diff.old.name,
        }
    }

    /// Whether this message, found among referenced entities, breaks callers.
    pub fn is_incompatible(&self) -> bool {
        match self {
            DiffMessage::Enum(diff) => diff.is_incompatible(),
            DiffMessage::Record(_) | DiffMessage::Function(_) | DiffMessage::GlobalVar(_) => true,
        }
    }
}

/// A diff message together with where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedDiff<'a> {
    pub reachability: Reachability,
    /// Names of the types being compared when the message was emitted, joined by `-> `.
    pub type_stack: String,
    pub message: DiffMessage<'a>,
}

/// An entity present on one side only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoneElement<'a> {
    Function(&'a FunctionIr),
    GlobalVar(&'a GlobalVarIr),
    Record(&'a TypeIr),
    Enum(&'a TypeIr),
}

impl LoneElement<'_> {
    pub fn key(&self) -> &str {
        match self {
            LoneElement::Function(func) => func.linker_set_key(),
            LoneElement::GlobalVar(var) => var.linker_set_key(),
            LoneElement::Record(ty) | LoneElement::Enum(ty) => ty.linker_set_key(),
        }
    }

    /// Functions and globals are exported by definition; lone user types only
    /// show up when every API is checked.
    pub fn reachability(&self) -> Reachability {
        match self {
            LoneElement::Function(_) | LoneElement::GlobalVar(_) => Reachability::Referenced,
            LoneElement::Record(_) | LoneElement::Enum(_) => Reachability::Unreferenced,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoneChange<'a> {
    pub change: Change,
    pub element: LoneElement<'a>,
}
