use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use abi_core::diff::{CompatibilityStatus, DiffPolicy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// On-disk YAML configuration for `compare`.
///
/// Every key is optional; unknown keys are rejected so that a typo does not
/// silently weaken the check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiffConfig {
    pub lib_name: Option<String>,
    pub arch: Option<String>,

    pub treat_opaque_as_different: bool,
    pub check_all_apis: bool,
    pub allow_adding_removing_weak_symbols: bool,
    pub ignored_symbols: Vec<String>,

    pub allow_extensions: bool,
    pub allow_unreferenced_changes: bool,
    pub allow_unreferenced_elf_symbol_changes: bool,
    pub advice_only: bool,
}

impl DiffConfig {
    pub fn from_yaml(body: &str) -> Result<Self> {
        serde_yaml::from_str(body).context("Failed to parse diff config YAML")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let body = fs::read_to_string(path)
            .with_context(|| format!("Failed to read diff config at {}", path.display()))?;
        Self::from_yaml(&body).with_context(|| format!("Invalid diff config {}", path.display()))
    }

    pub fn policy(&self) -> DiffPolicy {
        DiffPolicy {
            treat_opaque_as_different: self.treat_opaque_as_different,
            check_all_apis: self.check_all_apis,
            allow_adding_removing_weak_symbols: self.allow_adding_removing_weak_symbols,
            ignored_symbols: self.ignored_symbols.iter().cloned().collect(),
        }
    }

    pub fn gate(&self) -> VerdictGate {
        VerdictGate {
            allow_extensions: self.allow_extensions,
            allow_unreferenced_changes: self.allow_unreferenced_changes,
            allow_unreferenced_elf_symbol_changes: self.allow_unreferenced_elf_symbol_changes,
            advice_only: self.advice_only,
        }
    }
}

/// Which raised compatibility bits still let `compare` exit successfully.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerdictGate {
    pub allow_extensions: bool,
    pub allow_unreferenced_changes: bool,
    pub allow_unreferenced_elf_symbol_changes: bool,
    pub advice_only: bool,
}

impl VerdictGate {
    pub fn allowed(&self) -> CompatibilityStatus {
        let mut allowed = CompatibilityStatus::empty();
        if self.allow_extensions {
            allowed |= CompatibilityStatus::EXTENSION;
        }
        if self.allow_unreferenced_changes {
            allowed |= CompatibilityStatus::UNREFERENCED_CHANGES;
        }
        if self.allow_unreferenced_elf_symbol_changes {
            allowed |= CompatibilityStatus::ELF_INCOMPATIBLE;
        }
        allowed
    }

    /// Process exit code for a verdict: the raised bits nobody allowed, or 0.
    ///
    /// `INCOMPATIBLE` can only be waved through with `advice_only`.
    pub fn exit_code(&self, status: CompatibilityStatus) -> i32 {
        if self.advice_only {
            return 0;
        }
        status.difference(self.allowed()).bits() as i32
    }
}

/// Parse a newline-separated list of linker set keys.
///
/// Blank lines and lines starting with `#` are skipped; surrounding
/// whitespace is trimmed.
pub fn parse_ignore_list(body: &str) -> BTreeSet<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub fn load_ignore_list(path: &Path) -> Result<BTreeSet<String>> {
    let body = fs::read_to_string(path)
        .with_context(|| format!("Failed to read ignore list at {}", path.display()))?;
    Ok(parse_ignore_list(&body))
}
