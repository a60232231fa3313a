//! Owned, name-resolved report entries.
//!
//! Every type id found in the IR is replaced with the name the owning module
//! gives it, or [`crate::module::UNEXPORTED_TYPE_NAME`] when it does not resolve.

use serde::{Deserialize, Serialize};

use crate::diff::{EnumDiff, FunctionDiff, GlobalVarDiff, RecordDiff};
use crate::model::{
    AccessSpecifier, BaseSpecifier, ElfBinding, ElfSymbol, EnumField, FunctionIr, GlobalVarIr,
    Param, RecordField, RecordKind, TypeIr, VTableComponent, VTableComponentKind,
};
use crate::module::Module;

fn is_false(value: &bool) -> bool {
    !*value
}

fn type_names(module: &Module, ids: &[String]) -> Vec<String> {
    ids.iter().map(|id| module.type_name(id).to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamEntry {
    pub referenced_type: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_default: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_this_ptr: bool,
}

impl ParamEntry {
    fn resolve(param: &Param, module: &Module) -> Self {
        Self {
            referenced_type: module.type_name(&param.referenced_type).to_string(),
            is_default: param.is_default,
            is_this_ptr: param.is_this_ptr,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionEntry {
    pub function_name: String,
    pub linker_set_key: String,
    pub source_file: String,
    pub return_type: String,
    pub parameters: Vec<ParamEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub template_args: Vec<String>,
    pub access: AccessSpecifier,
}

impl FunctionEntry {
    pub fn resolve(func: &FunctionIr, module: &Module) -> Self {
        let signature = &func.signature;
        Self {
            function_name: func.name.clone(),
            linker_set_key: func.linker_set_key().to_string(),
            source_file: func.linkable.source_file.clone(),
            return_type: module.type_name(&signature.return_type).to_string(),
            parameters: signature
                .parameters
                .iter()
                .map(|param| ParamEntry::resolve(param, module))
                .collect(),
            template_args: type_names(module, &signature.template_args),
            access: func.access,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalVarEntry {
    pub name: String,
    pub linker_set_key: String,
    pub source_file: String,
    pub referenced_type: String,
    pub access: AccessSpecifier,
}

impl GlobalVarEntry {
    pub fn resolve(var: &GlobalVarIr, module: &Module) -> Self {
        Self {
            name: var.name.clone(),
            linker_set_key: var.linker_set_key().to_string(),
            source_file: var.linkable.source_file.clone(),
            referenced_type: module.type_name(&var.referenced_type).to_string(),
            access: var.access,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub field_name: String,
    pub referenced_type: String,
    pub field_offset: u64,
    pub access: AccessSpecifier,
}

impl FieldEntry {
    fn resolve(field: &RecordField, module: &Module) -> Self {
        Self {
            field_name: field.name.clone(),
            referenced_type: module.type_name(&field.referenced_type).to_string(),
            field_offset: field.offset,
            access: field.access,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseEntry {
    pub referenced_type: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_virtual: bool,
    pub access: AccessSpecifier,
}

impl BaseEntry {
    fn resolve(base: &BaseSpecifier, module: &Module) -> Self {
        Self {
            referenced_type: module.type_name(&base.referenced_type).to_string(),
            is_virtual: base.is_virtual,
            access: base.access,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VTableEntry {
    pub kind: VTableComponentKind,
    pub mangled_component_name: String,
    pub component_value: i64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_pure: bool,
}

impl From<&VTableComponent> for VTableEntry {
    fn from(component: &VTableComponent) -> Self {
        Self {
            kind: component.kind,
            mangled_component_name: component.name.clone(),
            component_value: component.value,
            is_pure: component.is_pure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumFieldEntry {
    pub name: String,
    pub enum_field_value: i64,
}

impl From<&EnumField> for EnumFieldEntry {
    fn from(field: &EnumField) -> Self {
        Self { name: field.name.clone(), enum_field_value: field.value }
    }
}

/// A whole record, as listed among unreferenced additions and removals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordEntry {
    pub name: String,
    pub linker_set_key: String,
    pub source_file: String,
    pub size: u64,
    pub alignment: u32,
    pub record_kind: RecordKind,
    pub access: AccessSpecifier,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub base_specifiers: Vec<BaseEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vtable_components: Vec<VTableEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub template_args: Vec<String>,
}

impl RecordEntry {
    /// `None` when `ty` is not a record.
    pub fn resolve(ty: &TypeIr, module: &Module) -> Option<Self> {
        let record = ty.as_record()?;
        Some(Self {
            name: ty.name.clone(),
            linker_set_key: ty.linker_set_key().to_string(),
            source_file: ty.source_file().to_string(),
            size: ty.size,
            alignment: ty.alignment,
            record_kind: record.record_kind,
            access: record.access,
            fields: record.fields.iter().map(|f| FieldEntry::resolve(f, module)).collect(),
            base_specifiers: record.bases.iter().map(|b| BaseEntry::resolve(b, module)).collect(),
            vtable_components: record.vtable.iter().map(VTableEntry::from).collect(),
            template_args: type_names(module, &record.template_args),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumEntry {
    pub name: String,
    pub linker_set_key: String,
    pub source_file: String,
    pub size: u64,
    pub alignment: u32,
    pub underlying_type: String,
    pub enum_fields: Vec<EnumFieldEntry>,
    pub access: AccessSpecifier,
}

impl EnumEntry {
    /// `None` when `ty` is not an enum.
    pub fn resolve(ty: &TypeIr, module: &Module) -> Option<Self> {
        let enum_type = ty.as_enum()?;
        Some(Self {
            name: ty.name.clone(),
            linker_set_key: ty.linker_set_key().to_string(),
            source_file: ty.source_file().to_string(),
            size: ty.size,
            alignment: ty.alignment,
            underlying_type: module.type_name(&enum_type.underlying_type).to_string(),
            enum_fields: enum_type.fields.iter().map(EnumFieldEntry::from).collect(),
            access: enum_type.access,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInfoDiffEntry {
    pub old_size: u64,
    pub new_size: u64,
    pub old_alignment: u32,
    pub new_alignment: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDiffEntry {
    pub old_access: AccessSpecifier,
    pub new_access: AccessSpecifier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VTableLayoutDiff {
    pub old_vtable: Vec<VTableEntry>,
    pub new_vtable: Vec<VTableEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseSpecifierDiff {
    pub old_bases: Vec<BaseEntry>,
    pub new_bases: Vec<BaseEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDiffEntry {
    pub old_field: FieldEntry,
    pub new_field: FieldEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDiffEntry {
    pub name: String,
    pub linker_set_key: String,
    pub type_stack: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_info_diff: Option<TypeInfoDiffEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_diff: Option<AccessDiffEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vtable_layout_diff: Option<VTableLayoutDiff>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_specifier_diffs: Option<BaseSpecifierDiff>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields_diff: Vec<FieldDiffEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields_removed: Vec<FieldEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields_added: Vec<FieldEntry>,
}

impl RecordDiffEntry {
    pub fn resolve(diff: &RecordDiff<'_>, type_stack: &str, old: &Module, new: &Module) -> Self {
        let bases = |module: &Module, bases: &[BaseSpecifier]| -> Vec<BaseEntry> {
            bases.iter().map(|b| BaseEntry::resolve(b, module)).collect()
        };
        Self {
            name: diff.name().to_string(),
            linker_set_key: diff.linker_set_key().to_string(),
            type_stack: type_stack.to_string(),
            type_info_diff: diff.type_info_diff.map(|info| TypeInfoDiffEntry {
                old_size: info.old_size,
                new_size: info.new_size,
                old_alignment: info.old_alignment,
                new_alignment: info.new_alignment,
            }),
            access_diff: diff
                .access_diff
                .map(|(old_access, new_access)| AccessDiffEntry { old_access, new_access }),
            vtable_layout_diff: diff.vtable_changed.then(|| VTableLayoutDiff {
                old_vtable: diff.old.vtable.iter().map(VTableEntry::from).collect(),
                new_vtable: diff.new.vtable.iter().map(VTableEntry::from).collect(),
            }),
            base_specifier_diffs: diff.bases_changed.then(|| BaseSpecifierDiff {
                old_bases: bases(old, &diff.old.bases),
                new_bases: bases(new, &diff.new.bases),
            }),
            fields_diff: diff
                .fields_diff
                .iter()
                .map(|field| FieldDiffEntry {
                    old_field: FieldEntry::resolve(field.old, old),
                    new_field: FieldEntry::resolve(field.new, new),
                })
                .collect(),
            fields_removed: diff.fields_removed.iter().map(|f| FieldEntry::resolve(f, old)).collect(),
            fields_added: diff.fields_added.iter().map(|f| FieldEntry::resolve(f, new)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnderlyingTypeDiff {
    pub old_type: String,
    pub new_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumFieldDiffEntry {
    pub old_field: EnumFieldEntry,
    pub new_field: EnumFieldEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDiffEntry {
    pub name: String,
    pub linker_set_key: String,
    pub type_stack: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underlying_type_diff: Option<UnderlyingTypeDiff>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields_added: Vec<EnumFieldEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields_removed: Vec<EnumFieldEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields_diff: Vec<EnumFieldDiffEntry>,
}

impl EnumDiffEntry {
    pub fn resolve(diff: &EnumDiff<'_>, type_stack: &str) -> Self {
        Self {
            name: diff.name().to_string(),
            linker_set_key: diff.linker_set_key().to_string(),
            type_stack: type_stack.to_string(),
            underlying_type_diff: diff.underlying_type_diff.map(|(old_type, new_type)| {
                UnderlyingTypeDiff { old_type: old_type.to_string(), new_type: new_type.to_string() }
            }),
            fields_added: diff.fields_added.iter().copied().map(EnumFieldEntry::from).collect(),
            fields_removed: diff.fields_removed.iter().copied().map(EnumFieldEntry::from).collect(),
            fields_diff: diff
                .fields_diff
                .iter()
                .map(|(old_field, new_field)| EnumFieldDiffEntry {
                    old_field: EnumFieldEntry::from(*old_field),
                    new_field: EnumFieldEntry::from(*new_field),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDiffEntry {
    pub type_stack: String,
    pub old_function: FunctionEntry,
    pub new_function: FunctionEntry,
}

impl FunctionDiffEntry {
    pub fn resolve(diff: &FunctionDiff<'_>, type_stack: &str, old: &Module, new: &Module) -> Self {
        Self {
            type_stack: type_stack.to_string(),
            old_function: FunctionEntry::resolve(diff.old, old),
            new_function: FunctionEntry::resolve(diff.new, new),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalVarDiffEntry {
    pub type_stack: String,
    pub old_global_var: GlobalVarEntry,
    pub new_global_var: GlobalVarEntry,
}

impl GlobalVarDiffEntry {
    pub fn resolve(
        diff: &GlobalVarDiff<'_>,
        type_stack: &str,
        old: &Module,
        new: &Module,
    ) -> Self {
        Self {
            type_stack: type_stack.to_string(),
            old_global_var: GlobalVarEntry::resolve(diff.old, old),
            new_global_var: GlobalVarEntry::resolve(diff.new, new),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElfSymbolEntry {
    pub name: String,
    pub binding: ElfBinding,
}

impl From<&ElfSymbol> for ElfSymbolEntry {
    fn from(symbol: &ElfSymbol) -> Self {
        Self { name: symbol.name.clone(), binding: symbol.binding }
    }
}
