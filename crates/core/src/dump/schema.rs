//! Serde mirror of the on-disk dump document.
//!
//! Each top-level array holds one kind of entity. Field names follow the
//! extractor's JSON output exactly; defaults cover the values the extractor
//! omits (`access` = public, `record_kind` = struct, `binding` = global,
//! `self_type` = the linker set key).

use serde::{Deserialize, Serialize};

use crate::model::{
    AccessSpecifier, BaseSpecifier, BuiltinType, ElfBinding, ElfSymbol, EnumField, EnumType,
    FunctionIr, FunctionSignature, GlobalVarIr, Linkable, Param, Qualifiers, RecordField,
    RecordKind, RecordType, TypeBody, TypeIr, VTableComponent, VTableComponentKind,
};

fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DumpDocument {
    #[serde(default)]
    pub record_types: Vec<JsonRecordType>,
    #[serde(default)]
    pub enum_types: Vec<JsonEnumType>,
    #[serde(default)]
    pub pointer_types: Vec<JsonReferenceType>,
    #[serde(default)]
    pub lvalue_reference_types: Vec<JsonReferenceType>,
    #[serde(default)]
    pub rvalue_reference_types: Vec<JsonReferenceType>,
    #[serde(default)]
    pub builtin_types: Vec<JsonBuiltinType>,
    #[serde(default)]
    pub qualified_types: Vec<JsonQualifiedType>,
    #[serde(default)]
    pub array_types: Vec<JsonReferenceType>,
    #[serde(default)]
    pub function_types: Vec<JsonFunctionType>,
    #[serde(default)]
    pub functions: Vec<JsonFunction>,
    #[serde(default)]
    pub global_vars: Vec<JsonGlobalVar>,
    #[serde(default)]
    pub elf_functions: Vec<JsonElfSymbol>,
    #[serde(default)]
    pub elf_objects: Vec<JsonElfSymbol>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonRecordField {
    pub field_name: String,
    pub referenced_type: String,
    pub field_offset: u64,
    #[serde(default, skip_serializing_if = "is_default")]
    pub access: AccessSpecifier,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonBaseSpecifier {
    pub referenced_type: String,
    #[serde(default)]
    pub is_virtual: bool,
    #[serde(default, skip_serializing_if = "is_default")]
    pub access: AccessSpecifier,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonVTableComponent {
    pub kind: VTableComponentKind,
    #[serde(default)]
    pub component_value: i64,
    #[serde(default)]
    pub mangled_component_name: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_pure: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonRecordType {
    pub linker_set_key: String,
    #[serde(default)]
    pub source_file: String,
    pub name: String,
    pub size: u64,
    pub alignment: u32,
    #[serde(default)]
    pub referenced_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_type: Option<String>,
    #[serde(default)]
    pub fields: Vec<JsonRecordField>,
    #[serde(default)]
    pub base_specifiers: Vec<JsonBaseSpecifier>,
    #[serde(default)]
    pub vtable_components: Vec<JsonVTableComponent>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub record_kind: RecordKind,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub template_args: Vec<String>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub access: AccessSpecifier,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonEnumField {
    pub name: String,
    pub enum_field_value: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonEnumType {
    pub linker_set_key: String,
    #[serde(default)]
    pub source_file: String,
    pub name: String,
    pub size: u64,
    pub alignment: u32,
    #[serde(default)]
    pub referenced_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_type: Option<String>,
    pub underlying_type: String,
    #[serde(default)]
    pub enum_fields: Vec<JsonEnumField>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub access: AccessSpecifier,
}

/// Pointer, lvalue/rvalue reference and array entries share this shape.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonReferenceType {
    pub linker_set_key: String,
    #[serde(default)]
    pub source_file: String,
    pub name: String,
    pub size: u64,
    pub alignment: u32,
    pub referenced_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonBuiltinType {
    pub linker_set_key: String,
    #[serde(default)]
    pub source_file: String,
    pub name: String,
    pub size: u64,
    pub alignment: u32,
    #[serde(default)]
    pub referenced_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_type: Option<String>,
    #[serde(default)]
    pub is_unsigned: bool,
    #[serde(default)]
    pub is_integral: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonQualifiedType {
    pub linker_set_key: String,
    #[serde(default)]
    pub source_file: String,
    pub name: String,
    pub size: u64,
    pub alignment: u32,
    pub referenced_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_type: Option<String>,
    #[serde(default)]
    pub is_const: bool,
    #[serde(default)]
    pub is_volatile: bool,
    #[serde(default)]
    pub is_restricted: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonParam {
    pub referenced_type: String,
    #[serde(default)]
    pub default_arg: bool,
    #[serde(default)]
    pub is_this_ptr: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonFunctionType {
    pub linker_set_key: String,
    #[serde(default)]
    pub source_file: String,
    pub name: String,
    pub size: u64,
    pub alignment: u32,
    #[serde(default)]
    pub referenced_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_type: Option<String>,
    pub return_type: String,
    #[serde(default)]
    pub parameters: Vec<JsonParam>,
    #[serde(default)]
    pub template_args: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonFunction {
    pub function_name: String,
    pub linker_set_key: String,
    #[serde(default)]
    pub source_file: String,
    pub return_type: String,
    #[serde(default)]
    pub parameters: Vec<JsonParam>,
    #[serde(default)]
    pub template_args: Vec<String>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub access: AccessSpecifier,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonGlobalVar {
    pub name: String,
    pub linker_set_key: String,
    #[serde(default)]
    pub source_file: String,
    pub referenced_type: String,
    #[serde(default, skip_serializing_if = "is_default")]
    pub access: AccessSpecifier,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonElfSymbol {
    pub name: String,
    #[serde(default, skip_serializing_if = "is_default")]
    pub binding: ElfBinding,
}

// JSON -> model

fn params_from_json(params: Vec<JsonParam>) -> Vec<Param> {
    params
        .into_iter()
        .map(|p| Param {
            referenced_type: p.referenced_type,
            is_default: p.default_arg,
            is_this_ptr: p.is_this_ptr,
        })
        .collect()
}

impl From<JsonRecordType> for TypeIr {
    fn from(json: JsonRecordType) -> Self {
        let record = RecordType {
            fields: json
                .fields
                .into_iter()
                .map(|f| RecordField {
                    name: f.field_name,
                    referenced_type: f.referenced_type,
                    offset: f.field_offset,
                    access: f.access,
                })
                .collect(),
            bases: json
                .base_specifiers
                .into_iter()
                .map(|b| BaseSpecifier {
                    referenced_type: b.referenced_type,
                    is_virtual: b.is_virtual,
                    access: b.access,
                })
                .collect(),
            vtable: json
                .vtable_components
                .into_iter()
                .map(|c| VTableComponent {
                    kind: c.kind,
                    name: c.mangled_component_name,
                    value: c.component_value,
                    is_pure: c.is_pure,
                })
                .collect(),
            record_kind: json.record_kind,
            is_anonymous: json.is_anonymous,
            template_args: json.template_args,
            access: json.access,
        };
        TypeIr {
            self_type: json.self_type.unwrap_or_else(|| json.linker_set_key.clone()),
            linkable: Linkable::new(json.linker_set_key, json.source_file),
            name: json.name,
            referenced_type: json.referenced_type,
            size: json.size,
            alignment: json.alignment,
            body: TypeBody::Record(record),
        }
    }
}

impl From<JsonEnumType> for TypeIr {
    fn from(json: JsonEnumType) -> Self {
        let fields = json
            .enum_fields
            .into_iter()
            .map(|f| EnumField { name: f.name, value: f.enum_field_value })
            .collect();
        TypeIr {
            self_type: json.self_type.unwrap_or_else(|| json.linker_set_key.clone()),
            linkable: Linkable::new(json.linker_set_key, json.source_file),
            name: json.name,
            referenced_type: json.referenced_type,
            size: json.size,
            alignment: json.alignment,
            body: TypeBody::Enum(EnumType {
                underlying_type: json.underlying_type,
                fields,
                access: json.access,
            }),
        }
    }
}

impl JsonReferenceType {
    pub fn into_type(self, body: TypeBody) -> TypeIr {
        TypeIr {
            self_type: self.self_type.unwrap_or_else(|| self.linker_set_key.clone()),
            linkable: Linkable::new(self.linker_set_key, self.source_file),
            name: self.name,
            referenced_type: self.referenced_type,
            size: self.size,
            alignment: self.alignment,
            body,
        }
    }
}

impl From<JsonBuiltinType> for TypeIr {
    fn from(json: JsonBuiltinType) -> Self {
        TypeIr {
            self_type: json.self_type.unwrap_or_else(|| json.linker_set_key.clone()),
            linkable: Linkable::new(json.linker_set_key, json.source_file),
            name: json.name,
            referenced_type: json.referenced_type,
            size: json.size,
            alignment: json.alignment,
            body: TypeBody::Builtin(BuiltinType {
                is_unsigned: json.is_unsigned,
                is_integral: json.is_integral,
            }),
        }
    }
}

impl From<JsonQualifiedType> for TypeIr {
    fn from(json: JsonQualifiedType) -> Self {
        TypeIr {
            self_type: json.self_type.unwrap_or_else(|| json.linker_set_key.clone()),
            linkable: Linkable::new(json.linker_set_key, json.source_file),
            name: json.name,
            referenced_type: json.referenced_type,
            size: json.size,
            alignment: json.alignment,
            body: TypeBody::Qualified(Qualifiers {
                is_const: json.is_const,
                is_volatile: json.is_volatile,
                is_restricted: json.is_restricted,
            }),
        }
    }
}

impl From<JsonFunctionType> for TypeIr {
    fn from(json: JsonFunctionType) -> Self {
        TypeIr {
            self_type: json.self_type.unwrap_or_else(|| json.linker_set_key.clone()),
            linkable: Linkable::new(json.linker_set_key, json.source_file),
            name: json.name,
            referenced_type: json.referenced_type,
            size: json.size,
            alignment: json.alignment,
            body: TypeBody::Function(FunctionSignature {
                return_type: json.return_type,
                parameters: params_from_json(json.parameters),
                template_args: json.template_args,
            }),
        }
    }
}

impl From<JsonFunction> for FunctionIr {
    fn from(json: JsonFunction) -> Self {
        FunctionIr {
            linkable: Linkable::new(json.linker_set_key, json.source_file),
            name: json.function_name,
            signature: FunctionSignature {
                return_type: json.return_type,
                parameters: params_from_json(json.parameters),
                template_args: json.template_args,
            },
            access: json.access,
        }
    }
}

impl From<JsonGlobalVar> for GlobalVarIr {
    fn from(json: JsonGlobalVar) -> Self {
        GlobalVarIr {
            linkable: Linkable::new(json.linker_set_key, json.source_file),
            name: json.name,
            referenced_type: json.referenced_type,
            access: json.access,
        }
    }
}

impl From<JsonElfSymbol> for ElfSymbol {
    fn from(json: JsonElfSymbol) -> Self {
        ElfSymbol { name: json.name, binding: json.binding }
    }
}

// model -> JSON

fn params_to_json(params: &[Param]) -> Vec<JsonParam> {
    params
        .iter()
        .map(|p| JsonParam {
            referenced_type: p.referenced_type.clone(),
            default_arg: p.is_default,
            is_this_ptr: p.is_this_ptr,
        })
        .collect()
}

impl DumpDocument {
    /// Append one type to the array matching its kind.
    pub fn push_type(&mut self, ty: &TypeIr) {
        let key = ty.linker_set_key().to_string();
        let source_file = ty.source_file().to_string();
        let name = ty.name.clone();
        let referenced_type = ty.referenced_type.clone();
        let self_type = Some(ty.type_id().to_string());
        let (size, alignment) = (ty.size, ty.alignment);
        let reference = || JsonReferenceType {
            linker_set_key: key.clone(),
            source_file: source_file.clone(),
            name: name.clone(),
            size,
            alignment,
            referenced_type: referenced_type.clone(),
            self_type: self_type.clone(),
        };

        match &ty.body {
            TypeBody::Record(record) => self.record_types.push(JsonRecordType {
                linker_set_key: key.clone(),
                source_file: source_file.clone(),
                name: name.clone(),
                size,
                alignment,
                referenced_type: referenced_type.clone(),
                self_type: self_type.clone(),
                fields: record
                    .fields
                    .iter()
                    .map(|f| JsonRecordField {
                        field_name: f.name.clone(),
                        referenced_type: f.referenced_type.clone(),
                        field_offset: f.offset,
                        access: f.access,
                    })
                    .collect(),
                base_specifiers: record
                    .bases
                    .iter()
                    .map(|b| JsonBaseSpecifier {
                        referenced_type: b.referenced_type.clone(),
                        is_virtual: b.is_virtual,
                        access: b.access,
                    })
                    .collect(),
                vtable_components: record
                    .vtable
                    .iter()
                    .map(|c| JsonVTableComponent {
                        kind: c.kind,
                        component_value: c.value,
                        mangled_component_name: c.name.clone(),
                        is_pure: c.is_pure,
                    })
                    .collect(),
                record_kind: record.record_kind,
                is_anonymous: record.is_anonymous,
                template_args: record.template_args.clone(),
                access: record.access,
            }),
            TypeBody::Enum(enum_type) => self.enum_types.push(JsonEnumType {
                linker_set_key: key.clone(),
                source_file: source_file.clone(),
                name: name.clone(),
                size,
                alignment,
                referenced_type: referenced_type.clone(),
                self_type: self_type.clone(),
                underlying_type: enum_type.underlying_type.clone(),
                enum_fields: enum_type
                    .fields
                    .iter()
                    .map(|f| JsonEnumField { name: f.name.clone(), enum_field_value: f.value })
                    .collect(),
                access: enum_type.access,
            }),
            TypeBody::Pointer => self.pointer_types.push(reference()),
            TypeBody::LvalueReference => self.lvalue_reference_types.push(reference()),
            TypeBody::RvalueReference => self.rvalue_reference_types.push(reference()),
            TypeBody::Array => self.array_types.push(reference()),
            TypeBody::Builtin(builtin) => self.builtin_types.push(JsonBuiltinType {
                linker_set_key: key.clone(),
                source_file: source_file.clone(),
                name: name.clone(),
                size,
                alignment,
                referenced_type: referenced_type.clone(),
                self_type: self_type.clone(),
                is_unsigned: builtin.is_unsigned,
                is_integral: builtin.is_integral,
            }),
            TypeBody::Qualified(quals) => self.qualified_types.push(JsonQualifiedType {
                linker_set_key: key.clone(),
                source_file: source_file.clone(),
                name: name.clone(),
                size,
                alignment,
                referenced_type: referenced_type.clone(),
                self_type: self_type.clone(),
                is_const: quals.is_const,
                is_volatile: quals.is_volatile,
                is_restricted: quals.is_restricted,
            }),
            TypeBody::Function(signature) => self.function_types.push(JsonFunctionType {
                linker_set_key: key.clone(),
                source_file: source_file.clone(),
                name: name.clone(),
                size,
                alignment,
                referenced_type: referenced_type.clone(),
                self_type: self_type.clone(),
                return_type: signature.return_type.clone(),
                parameters: params_to_json(&signature.parameters),
                template_args: signature.template_args.clone(),
            }),
        }
    }
}

impl From<&FunctionIr> for JsonFunction {
    fn from(func: &FunctionIr) -> Self {
        JsonFunction {
            function_name: func.name.clone(),
            linker_set_key: func.linkable.linker_set_key.clone(),
            source_file: func.linkable.source_file.clone(),
            return_type: func.signature.return_type.clone(),
            parameters: params_to_json(&func.signature.parameters),
            template_args: func.signature.template_args.clone(),
            access: func.access,
        }
    }
}

impl From<&GlobalVarIr> for JsonGlobalVar {
    fn from(var: &GlobalVarIr) -> Self {
        JsonGlobalVar {
            name: var.name.clone(),
            linker_set_key: var.linkable.linker_set_key.clone(),
            source_file: var.linkable.source_file.clone(),
            referenced_type: var.referenced_type.clone(),
            access: var.access,
        }
    }
}

impl From<&ElfSymbol> for JsonElfSymbol {
    fn from(sym: &ElfSymbol) -> Self {
        JsonElfSymbol { name: sym.name.clone(), binding: sym.binding }
    }
}
