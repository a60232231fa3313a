//! Dump codec: JSON document <-> [`Module`].
//!
//! `load` is strict: a missing required field, an unknown key or an unknown enum
//! tag aborts with [`DumpError::Json`], and a key claimed by two different
//! entities aborts with [`DumpError::Module`]. `save` writes every collection
//! sorted by key so that `load(save(m)) == m` and repeated saves are
//! byte-identical.

pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

use crate::model::{FunctionIr, GlobalVarIr, LinkableMessage, TypeBody, TypeIr};
use crate::module::{Module, ModuleError};
use schema::{DumpDocument, JsonElfSymbol, JsonFunction, JsonGlobalVar};

/// Error type for reading and writing dump documents.
#[derive(Debug, Error)]
pub enum DumpError {
    /// The document is not valid JSON or violates the dump schema.
    #[error("malformed dump: {0}")]
    Json(#[from] serde_json::Error),

    /// The document is well-formed but describes an inconsistent module.
    #[error("invalid dump: {0}")]
    Module(#[from] ModuleError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type DumpResult<T> = Result<T, DumpError>;

/// Parse a dump document into a fully populated module.
pub fn load(bytes: &[u8]) -> DumpResult<Module> {
    let document: DumpDocument = serde_json::from_slice(bytes)?;
    let module = into_module(document)?;
    debug!(
        "loaded dump: {} types, {} functions, {} global vars",
        module.type_graph().len(),
        module.functions().len(),
        module.global_vars().len()
    );
    Ok(module)
}

/// Serialize a module into the canonical dump form (pretty JSON, trailing newline).
pub fn save(module: &Module) -> DumpResult<Vec<u8>> {
    let document = to_document(module);
    let mut bytes = serde_json::to_vec_pretty(&document)?;
    bytes.push(b'\n');
    Ok(bytes)
}

pub fn load_path(path: &Path) -> DumpResult<Module> {
    let bytes =
        fs::read(path).map_err(|source| DumpError::Io { path: path.to_path_buf(), source })?;
    load(&bytes)
}

pub fn save_path(module: &Module, path: &Path) -> DumpResult<()> {
    let bytes = save(module)?;
    fs::write(path, bytes).map_err(|source| DumpError::Io { path: path.to_path_buf(), source })
}

fn into_module(document: DumpDocument) -> Result<Module, ModuleError> {
    let DumpDocument {
        record_types,
        enum_types,
        pointer_types,
        lvalue_reference_types,
        rvalue_reference_types,
        builtin_types,
        qualified_types,
        array_types,
        function_types,
        functions,
        global_vars,
        elf_functions,
        elf_objects,
    } = document;

    let mut module = Module::new();
    for json in record_types {
        module.add_entity(TypeIr::from(json))?;
    }
    for json in enum_types {
        module.add_entity(TypeIr::from(json))?;
    }
    for json in pointer_types {
        module.add_entity(json.into_type(TypeBody::Pointer))?;
    }
    for json in lvalue_reference_types {
        module.add_entity(json.into_type(TypeBody::LvalueReference))?;
    }
    for json in rvalue_reference_types {
        module.add_entity(json.into_type(TypeBody::RvalueReference))?;
    }
    for json in builtin_types {
        module.add_entity(TypeIr::from(json))?;
    }
    for json in qualified_types {
        module.add_entity(TypeIr::from(json))?;
    }
    for json in array_types {
        module.add_entity(json.into_type(TypeBody::Array))?;
    }
    for json in function_types {
        module.add_entity(TypeIr::from(json))?;
    }
    for json in functions {
        module.add_entity(FunctionIr::from(json))?;
    }
    for json in global_vars {
        module.add_entity(GlobalVarIr::from(json))?;
    }
    for json in elf_functions {
        module.add_entity(LinkableMessage::ElfFunction(json.into()))?;
    }
    for json in elf_objects {
        module.add_entity(LinkableMessage::ElfObject(json.into()))?;
    }
    Ok(module)
}

fn to_document(module: &Module) -> DumpDocument {
    let mut document = DumpDocument::default();
    // The module's maps are ordered by key, so every array comes out sorted.
    for ty in module.type_graph().values() {
        document.push_type(ty);
    }
    document.functions = module.functions().values().map(JsonFunction::from).collect();
    document.global_vars = module.global_vars().values().map(JsonGlobalVar::from).collect();
    document.elf_functions = module.elf_functions().values().map(JsonElfSymbol::from).collect();
    document.elf_objects = module.elf_objects().values().map(JsonElfSymbol::from).collect();
    document
}
