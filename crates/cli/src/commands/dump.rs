use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{load_dump, LoadedDump};

/// Entity counts of one dump, as printed by `inspect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DumpSummary {
    pub path: String,
    pub sha256: String,
    pub types: BTreeMap<&'static str, usize>,
    pub functions: usize,
    pub global_vars: usize,
    pub elf_functions: usize,
    pub elf_objects: usize,
}

/// Validate a dump and count what it holds.
pub fn summarize_dump(path: &Path) -> Result<DumpSummary> {
    let LoadedDump { module, sha256 } = load_dump(path)?;

    let mut types = BTreeMap::new();
    for ty in module.type_graph().values() {
        *types.entry(ty.kind().as_str()).or_insert(0) += 1;
    }

    Ok(DumpSummary {
        path: path.display().to_string(),
        sha256,
        types,
        functions: module.functions().len(),
        global_vars: module.global_vars().len(),
        elf_functions: module.elf_functions().len(),
        elf_objects: module.elf_objects().len(),
    })
}

pub fn inspect_command(dump: &Path, json: bool) -> Result<()> {
    let summary = summarize_dump(dump)?;

    if json {
        let serialized = serde_json::to_string_pretty(&summary)?;
        println!("{}", serialized);
        return Ok(());
    }

    println!("Dump: {}", summary.path);
    println!("  SHA-256: {}", summary.sha256);
    println!("  Types:");
    if summary.types.is_empty() {
        println!("    (none)");
    }
    for (kind, count) in &summary.types {
        println!("    - {}: {}", kind, count);
    }
    println!("  Functions: {}", summary.functions);
    println!("  Global vars: {}", summary.global_vars);
    println!("  ELF functions: {}", summary.elf_functions);
    println!("  ELF objects: {}", summary.elf_objects);

    Ok(())
}

/// Rewrite a dump in canonical form: every array sorted by key, defaults elided.
pub fn format_dump_command(dump: &Path, output: &Path) -> Result<()> {
    let module = load_dump(dump)?.module;
    abi_core::dump::save_path(&module, output)
        .with_context(|| format!("Failed to write dump {}", output.display()))?;

    println!("Formatted dump:");
    println!("  Input: {}", dump.display());
    println!("  Output: {}", output.display());
    println!("  Entities: {}", module.len());

    Ok(())
}
