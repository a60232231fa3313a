//! Fixture builder shared by the diff and report tests.
#![allow(dead_code)]

use abi_core::model::{
    AccessSpecifier, BuiltinType, ElfSymbol, EnumField, EnumType, FunctionIr, FunctionSignature,
    GlobalVarIr, LinkableMessage, Param, RecordField, RecordType, TypeBody, TypeIr,
};
use abi_core::module::Module;

/// Builds a [`Module`] programmatically, one entity at a time.
#[derive(Debug, Default)]
pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A module pre-populated with `int`, `unsigned int`, `long` and `char`.
    pub fn with_builtins() -> Self {
        Self::new()
            .builtin("int", "int", 4, false)
            .builtin("unsigned int", "unsigned int", 4, true)
            .builtin("long", "long", 8, false)
            .builtin("char", "char", 1, false)
    }

    pub fn entity(mut self, entity: impl Into<LinkableMessage>) -> Self {
        self.module.add_entity(entity).expect("add entity");
        self
    }

    pub fn builtin(self, key: &str, name: &str, size: u64, is_unsigned: bool) -> Self {
        let body = TypeBody::Builtin(BuiltinType { is_unsigned, is_integral: true });
        self.entity(TypeIr::new(key, name, size, size as u32, body))
    }

    pub fn pointer(self, key: &str, name: &str, pointee: &str) -> Self {
        self.entity(TypeIr::new(key, name, 8, 8, TypeBody::Pointer).referencing(pointee))
    }

    pub fn record(self, key: &str, name: &str, size: u64, fields: Vec<RecordField>) -> Self {
        let record = RecordType { fields, ..RecordType::default() };
        self.entity(TypeIr::new(key, name, size, 4, TypeBody::Record(record)))
    }

    pub fn record_with(self, key: &str, name: &str, size: u64, record: RecordType) -> Self {
        self.entity(TypeIr::new(key, name, size, 4, TypeBody::Record(record)))
    }

    pub fn enumeration(
        self,
        key: &str,
        name: &str,
        underlying: &str,
        fields: &[(&str, i64)],
    ) -> Self {
        let enum_type = EnumType {
            underlying_type: underlying.to_string(),
            fields: fields.iter().map(|(n, v)| EnumField::new(*n, *v)).collect(),
            access: AccessSpecifier::Public,
        };
        self.entity(TypeIr::new(key, name, 4, 4, TypeBody::Enum(enum_type)))
    }

    /// An exported function plus its global ELF symbol.
    pub fn function(self, key: &str, name: &str, return_type: &str, params: &[&str]) -> Self {
        let params = params.iter().map(|p| Param::new(*p)).collect();
        let func = FunctionIr::new(key, name, FunctionSignature::new(return_type, params));
        self.entity(func).elf_function(ElfSymbol::global(key))
    }

    /// An exported global variable plus its global ELF symbol.
    pub fn global_var(self, key: &str, name: &str, referenced_type: &str) -> Self {
        self.entity(GlobalVarIr::new(key, name, referenced_type))
            .elf_object(ElfSymbol::global(key))
    }

    pub fn elf_function(self, symbol: ElfSymbol) -> Self {
        self.entity(LinkableMessage::ElfFunction(symbol))
    }

    pub fn elf_object(self, symbol: ElfSymbol) -> Self {
        self.entity(LinkableMessage::ElfObject(symbol))
    }

    pub fn build(self) -> Module {
        self.module
    }
}

pub fn field(name: &str, referenced_type: &str, offset: u64) -> RecordField {
    RecordField::new(name, referenced_type, offset)
}
