use std::fmt;

use serde::{Deserialize, Serialize};

use super::{AccessSpecifier, Linkable};

/// Discriminator of a [`TypeIr`]; callers dispatch on this instead of inspecting bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Record,
    Enum,
    Pointer,
    LvalueReference,
    RvalueReference,
    Qualified,
    Array,
    Builtin,
    Function,
}

impl TypeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeKind::Record => "record",
            TypeKind::Enum => "enum",
            TypeKind::Pointer => "pointer",
            TypeKind::LvalueReference => "lvalue_reference",
            TypeKind::RvalueReference => "rvalue_reference",
            TypeKind::Qualified => "qualified",
            TypeKind::Array => "array",
            TypeKind::Builtin => "builtin",
            TypeKind::Function => "function",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A type node in the module's type graph.
///
/// `referenced_type` is the id of the related type: pointee, qualified base, array
/// element. Kinds with nothing to reference carry an empty string or their own key,
/// whichever the extractor produced.
///
/// `self_type` is the id other entities use to reference this type and the key
/// of the type graph. It usually equals the linker set key; types defined more
/// than once carry a `#ODR:` suffixed id instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeIr {
    pub linkable: Linkable,
    pub self_type: String,
    pub name: String,
    pub referenced_type: String,
    pub size: u64,
    pub alignment: u32,
    pub body: TypeBody,
}

/// Kind-specific payload of a [`TypeIr`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeBody {
    Record(RecordType),
    Enum(EnumType),
    Pointer,
    LvalueReference,
    RvalueReference,
    Qualified(Qualifiers),
    Array,
    Builtin(BuiltinType),
    Function(FunctionSignature),
}

impl TypeIr {
    pub fn new(
        linker_set_key: impl Into<String>,
        name: impl Into<String>,
        size: u64,
        alignment: u32,
        body: TypeBody,
    ) -> Self {
        let linker_set_key = linker_set_key.into();
        Self {
            self_type: linker_set_key.clone(),
            linkable: Linkable::new(linker_set_key, ""),
            name: name.into(),
            referenced_type: String::new(),
            size,
            alignment,
            body,
        }
    }

    /// Builder-style setter for the referenced type id.
    pub fn referencing(mut self, referenced_type: impl Into<String>) -> Self {
        self.referenced_type = referenced_type.into();
        self
    }

    /// Builder-style setter for the type id, when it differs from the linker set key.
    pub fn with_self_type(mut self, self_type: impl Into<String>) -> Self {
        self.self_type = self_type.into();
        self
    }

    /// Builder-style setter for the provenance file.
    pub fn from_source(mut self, source_file: impl Into<String>) -> Self {
        self.linkable.source_file = source_file.into();
        self
    }

    pub fn kind(&self) -> TypeKind {
        match self.body {
            TypeBody::Record(_) => TypeKind::Record,
            TypeBody::Enum(_) => TypeKind::Enum,
            TypeBody::Pointer => TypeKind::Pointer,
            TypeBody::LvalueReference => TypeKind::LvalueReference,
            TypeBody::RvalueReference => TypeKind::RvalueReference,
            TypeBody::Qualified(_) => TypeKind::Qualified,
            TypeBody::Array => TypeKind::Array,
            TypeBody::Builtin(_) => TypeKind::Builtin,
            TypeBody::Function(_) => TypeKind::Function,
        }
    }

    pub fn linker_set_key(&self) -> &str {
        &self.linkable.linker_set_key
    }

    /// Id this type is stored under in the type graph.
    pub fn type_id(&self) -> &str {
        &self.self_type
    }

    pub fn source_file(&self) -> &str {
        &self.linkable.source_file
    }

    pub fn same_size_and_alignment(&self, other: &TypeIr) -> bool {
        self.size == other.size && self.alignment == other.alignment
    }

    pub fn as_record(&self) -> Option<&RecordType> {
        match &self.body {
            TypeBody::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumType> {
        match &self.body {
            TypeBody::Enum(enum_type) => Some(enum_type),
            _ => None,
        }
    }

    /// Records with a name of their own and every enum: the types whose layout a
    /// library author controls directly.
    pub fn is_user_defined(&self) -> bool {
        match &self.body {
            TypeBody::Record(record) => !record.is_anonymous,
            TypeBody::Enum(_) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    #[default]
    Struct,
    Class,
    Union,
}

/// Struct, class or union layout.
///
/// `fields`, `bases`, `vtable` and `template_args` keep the extractor's order,
/// which encodes declaration order and slot positions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordType {
    pub fields: Vec<RecordField>,
    pub bases: Vec<BaseSpecifier>,
    pub vtable: Vec<VTableComponent>,
    pub record_kind: RecordKind,
    pub is_anonymous: bool,
    pub template_args: Vec<String>,
    pub access: AccessSpecifier,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordField {
    pub name: String,
    pub referenced_type: String,
    /// Offset in bits from the start of the record.
    pub offset: u64,
    pub access: AccessSpecifier,
}

impl RecordField {
    pub fn new(name: impl Into<String>, referenced_type: impl Into<String>, offset: u64) -> Self {
        Self {
            name: name.into(),
            referenced_type: referenced_type.into(),
            offset,
            access: AccessSpecifier::Public,
        }
    }

    pub fn with_access(mut self, access: AccessSpecifier) -> Self {
        self.access = access;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseSpecifier {
    pub referenced_type: String,
    pub is_virtual: bool,
    pub access: AccessSpecifier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VTableComponentKind {
    VcallOffset,
    VbaseOffset,
    OffsetToTop,
    Rtti,
    FunctionPointer,
    CompleteDtorPointer,
    DeletingDtorPointer,
    UnusedFunctionPointer,
}

/// One vtable slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VTableComponent {
    pub kind: VTableComponentKind,
    /// Mangled name of the slot target (empty for offsets).
    pub name: String,
    pub value: i64,
    pub is_pure: bool,
}

impl VTableComponent {
    pub fn new(kind: VTableComponentKind, name: impl Into<String>, value: i64) -> Self {
        Self { kind, name: name.into(), value, is_pure: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnumType {
    pub underlying_type: String,
    pub fields: Vec<EnumField>,
    pub access: AccessSpecifier,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumField {
    pub name: String,
    pub value: i64,
}

impl EnumField {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self { name: name.into(), value }
    }
}

/// cv-qualifiers (plus `restrict`) of a qualified type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Qualifiers {
    pub is_const: bool,
    pub is_volatile: bool,
    pub is_restricted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BuiltinType {
    pub is_unsigned: bool,
    pub is_integral: bool,
}

/// Return type, parameters and template arguments shared by functions and
/// function types.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FunctionSignature {
    pub return_type: String,
    pub parameters: Vec<Param>,
    pub template_args: Vec<String>,
}

impl FunctionSignature {
    pub fn new(return_type: impl Into<String>, parameters: Vec<Param>) -> Self {
        Self { return_type: return_type.into(), parameters, template_args: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub referenced_type: String,
    pub is_default: bool,
    pub is_this_ptr: bool,
}

impl Param {
    pub fn new(referenced_type: impl Into<String>) -> Self {
        Self { referenced_type: referenced_type.into(), is_default: false, is_this_ptr: false }
    }
}
