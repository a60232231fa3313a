#![allow(dead_code)]

use std::path::{Path, PathBuf};

use abi_core::dump;
use abi_core::model::{
    BuiltinType, ElfSymbol, FunctionIr, FunctionSignature, GlobalVarIr, LinkableMessage, Param,
    RecordField, RecordType, TypeBody, TypeIr,
};
use abi_core::module::Module;

/// A small library dump: `int foo(<param>)`, `int g_count`, plus whatever
/// extra functions are named in `extra` (each `int name()`).
pub fn library(param: &str, extra: &[&str]) -> Module {
    let mut module = Module::new();
    for (name, unsigned) in [("int", false), ("unsigned int", true)] {
        let body = TypeBody::Builtin(BuiltinType { is_unsigned: unsigned, is_integral: true });
        module.add_entity(TypeIr::new(name, name, 4, 4, body)).expect("builtin");
    }
    add_function(&mut module, "_Z3fooi", "foo", vec![Param::new(param)]);
    for name in extra {
        add_function(&mut module, &format!("_Z{}{}v", name.len(), name), name, vec![]);
    }
    module.add_entity(GlobalVarIr::new("g_count", "g_count", "int")).expect("global var");
    module
        .add_entity(LinkableMessage::ElfObject(ElfSymbol::global("g_count")))
        .expect("elf object");
    module
}

fn add_function(module: &mut Module, key: &str, name: &str, params: Vec<Param>) {
    let func = FunctionIr::new(key, name, FunctionSignature::new("int", params));
    module.add_entity(func).expect("function");
    module.add_entity(LinkableMessage::ElfFunction(ElfSymbol::global(key))).expect("elf function");
}

/// Add an exported ELF function with no declaration behind it.
pub fn with_elf_only(mut module: Module, symbol: &str) -> Module {
    module
        .add_entity(LinkableMessage::ElfFunction(ElfSymbol::global(symbol)))
        .expect("elf function");
    module
}

/// Add a record nothing exported refers to.
pub fn with_private_record(mut module: Module, size: u64) -> Module {
    let record = RecordType { fields: vec![RecordField::new("a", "int", 0)], ..RecordType::default() };
    module
        .add_entity(TypeIr::new("_ZTI8Internal", "Internal", size, 4, TypeBody::Record(record)))
        .expect("record");
    module
}

pub fn write_dump(dir: &Path, file_name: &str, module: &Module) -> PathBuf {
    let path = dir.join(file_name);
    dump::save_path(module, &path).expect("write dump");
    path
}
