use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use abi_core::diff::{compare, DiffPolicy};
use abi_core::report::DiffReport;
use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::commands::config::{load_ignore_list, DiffConfig, VerdictGate};
use crate::{infer_lib_name, load_dump};

/// Arguments of `abi-diff compare`.
#[derive(Args, Debug, Clone, Default)]
pub struct CompareArgs {
    /// Dump of the reference (previous) library version.
    #[arg(long)]
    pub old: PathBuf,

    /// Dump of the library version under test.
    #[arg(long)]
    pub new: PathBuf,

    /// Where to write the JSON diff report.
    #[arg(long)]
    pub output: PathBuf,

    /// Library name recorded in the report. Defaults to the new dump's file stem.
    #[arg(long)]
    pub lib: Option<String>,

    /// Target architecture recorded in the report.
    #[arg(long)]
    pub arch: Option<String>,

    /// YAML config file with policy and verdict settings.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// File of linker set keys to skip, one per line.
    #[arg(long)]
    pub ignore_symbols: Option<PathBuf>,

    /// Also diff records and enums no exported symbol reaches.
    #[arg(long, default_value_t = false)]
    pub check_all_apis: bool,

    /// Treat type ids that resolve on neither side as different when they differ.
    #[arg(long, default_value_t = false)]
    pub consider_opaque_types_different: bool,

    /// Do not report weak symbols that were added or removed.
    #[arg(long, default_value_t = false)]
    pub allow_adding_removing_weak_symbols: bool,

    /// Exit successfully when the only changes are extensions.
    #[arg(long, default_value_t = false)]
    pub allow_extensions: bool,

    /// Exit successfully on changes to unreferenced types.
    #[arg(long, default_value_t = false)]
    pub allow_unreferenced_changes: bool,

    /// Exit successfully when only exported ELF symbols were removed.
    #[arg(long, default_value_t = false)]
    pub allow_unreferenced_elf_symbol_changes: bool,

    /// Report only; always exit successfully.
    #[arg(long, default_value_t = false)]
    pub advice_only: bool,

    /// Print a machine-readable summary instead of text.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

/// Effective settings of one compare run after merging config file and flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareSettings {
    pub lib_name: String,
    pub arch: String,
    pub policy: DiffPolicy,
    pub gate: VerdictGate,
}

/// Merge the optional config file, the ignore list and the command-line flags.
///
/// A flag set on the command line always wins; a flag left unset keeps the
/// config file's value.
pub fn resolve_compare_settings(args: &CompareArgs) -> Result<CompareSettings> {
    let mut config = match &args.config {
        Some(path) => DiffConfig::load(path)?,
        None => DiffConfig::default(),
    };

    config.check_all_apis |= args.check_all_apis;
    config.treat_opaque_as_different |= args.consider_opaque_types_different;
    config.allow_adding_removing_weak_symbols |= args.allow_adding_removing_weak_symbols;
    config.allow_extensions |= args.allow_extensions;
    config.allow_unreferenced_changes |= args.allow_unreferenced_changes;
    config.allow_unreferenced_elf_symbol_changes |= args.allow_unreferenced_elf_symbol_changes;
    config.advice_only |= args.advice_only;

    let mut policy = config.policy();
    if let Some(path) = &args.ignore_symbols {
        policy.ignored_symbols.extend(load_ignore_list(path)?);
    }

    let lib_name = args
        .lib
        .clone()
        .or_else(|| config.lib_name.clone())
        .unwrap_or_else(|| infer_lib_name(&args.new));
    let arch = args.arch.clone().or_else(|| config.arch.clone()).unwrap_or_default();

    Ok(CompareSettings { lib_name, arch, policy, gate: config.gate() })
}

/// Load a dump, naming the file in the error chain.
#[derive(Debug, Serialize)]
struct CompareSummary<'a> {
    lib_name: &'a str,
    arch: &'a str,
    old_dump: String,
    old_sha256: String,
    new_dump: String,
    new_sha256: String,
    report: String,
    compatibility_status: &'a [String],
    compatibility_status_code: u32,
    exit_code: i32,
    counts: BTreeMap<&'static str, usize>,
}

/// Diff two dumps, write the report and return the process exit code.
pub fn compare_command(args: &CompareArgs) -> Result<i32> {
    let settings = resolve_compare_settings(args)?;

    // Both inputs must load before anything is written.
    let old = load_dump(&args.old)?;
    let new = load_dump(&args.new)?;

    let outcome = compare(&old.module, &new.module, &settings.policy);
    let report = DiffReport::build(&outcome, &settings.lib_name, &settings.arch);

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create report dir: {}", parent.display()))?;
    }
    report
        .write_to(&args.output)
        .with_context(|| format!("Failed to write diff report {}", args.output.display()))?;

    let exit_code = settings.gate.exit_code(outcome.status);

    if args.json {
        let summary = CompareSummary {
            lib_name: &settings.lib_name,
            arch: &settings.arch,
            old_dump: args.old.display().to_string(),
            old_sha256: old.sha256.clone(),
            new_dump: args.new.display().to_string(),
            new_sha256: new.sha256.clone(),
            report: args.output.display().to_string(),
            compatibility_status: &report.compatibility_status,
            compatibility_status_code: report.compatibility_status_code,
            exit_code,
            counts: report.summary().into_iter().collect(),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(exit_code);
    }

    println!("ABI diff for {}:", settings.lib_name);
    if !settings.arch.is_empty() {
        println!("  Arch: {}", settings.arch);
    }
    println!("  Status: {}", outcome.status);
    println!("  Report: {}", args.output.display());
    let counts = report.summary();
    if counts.is_empty() {
        println!("  (no changes)");
    }
    for (list, count) in counts {
        println!("  - {}: {}", list, count);
    }

    if !outcome.status.is_compatible() {
        eprintln!(
            "ABI changes detected in {} ({}); see {}",
            settings.lib_name,
            outcome.status,
            args.output.display()
        );
    }

    Ok(exit_code)
}
