use serde::{Deserialize, Serialize};

use super::{AccessSpecifier, FunctionSignature, Linkable};

/// An exported function declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionIr {
    pub linkable: Linkable,
    pub name: String,
    pub signature: FunctionSignature,
    pub access: AccessSpecifier,
}

impl FunctionIr {
    pub fn new(
        linker_set_key: impl Into<String>,
        name: impl Into<String>,
        signature: FunctionSignature,
    ) -> Self {
        Self {
            linkable: Linkable::new(linker_set_key, ""),
            name: name.into(),
            signature,
            access: AccessSpecifier::Public,
        }
    }

    pub fn linker_set_key(&self) -> &str {
        &self.linkable.linker_set_key
    }
}

/// An exported global variable declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalVarIr {
    pub linkable: Linkable,
    pub name: String,
    pub referenced_type: String,
    pub access: AccessSpecifier,
}

impl GlobalVarIr {
    pub fn new(
        linker_set_key: impl Into<String>,
        name: impl Into<String>,
        referenced_type: impl Into<String>,
    ) -> Self {
        Self {
            linkable: Linkable::new(linker_set_key, ""),
            name: name.into(),
            referenced_type: referenced_type.into(),
            access: AccessSpecifier::Public,
        }
    }

    pub fn linker_set_key(&self) -> &str {
        &self.linkable.linker_set_key
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElfBinding {
    #[default]
    Global,
    Weak,
}

impl ElfBinding {
    pub fn is_global(&self) -> bool {
        *self == ElfBinding::Global
    }
}

/// An exported dynamic symbol, independent of any C++-level type information.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElfSymbol {
    pub name: String,
    pub binding: ElfBinding,
}

impl ElfSymbol {
    pub fn global(name: impl Into<String>) -> Self {
        Self { name: name.into(), binding: ElfBinding::Global }
    }

    pub fn weak(name: impl Into<String>) -> Self {
        Self { name: name.into(), binding: ElfBinding::Weak }
    }

    pub fn is_weak(&self) -> bool {
        self.binding == ElfBinding::Weak
    }
}

/// Which of the two exported-symbol lists a symbol belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElfSymbolKind {
    Function,
    Object,
}
