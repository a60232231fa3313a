//! Diff report emitter.
//!
//! [`DiffReport::build`] turns a borrowed [`DiffOutcome`] into an owned,
//! serializable document: every finding lands in exactly one categorized list,
//! chosen by what it is, whether it was added, removed or changed, and whether
//! an exported symbol reaches it. Empty lists are left out of the JSON form.

mod entries;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diff::{Change, DiffMessage, DiffOutcome, LoneElement, Reachability};
use crate::model::ElfSymbolKind;

pub use entries::*;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to encode diff report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type ReportResult<T> = Result<T, ReportError>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffReport {
    pub lib_name: String,
    pub arch: String,
    pub compatibility_status: Vec<String>,
    pub compatibility_status_code: u32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub functions_removed: Vec<FunctionEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub functions_added: Vec<FunctionEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub global_vars_removed: Vec<GlobalVarEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub global_vars_added: Vec<GlobalVarEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub function_diffs: Vec<FunctionDiffEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub global_var_diffs: Vec<GlobalVarDiffEntry>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub record_type_diffs: Vec<RecordDiffEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unreferenced_record_type_diffs: Vec<RecordDiffEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unreferenced_record_types_removed: Vec<RecordEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unreferenced_record_types_added: Vec<RecordEntry>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_type_diffs: Vec<EnumDiffEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_type_extension_diffs: Vec<EnumDiffEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unreferenced_enum_type_diffs: Vec<EnumDiffEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unreferenced_enum_type_extension_diffs: Vec<EnumDiffEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unreferenced_enum_types_removed: Vec<EnumEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unreferenced_enum_types_added: Vec<EnumEntry>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_elf_functions: Vec<ElfSymbolEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_elf_objects: Vec<ElfSymbolEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added_elf_functions: Vec<ElfSymbolEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added_elf_objects: Vec<ElfSymbolEntry>,
}

impl DiffReport {
    pub fn build(outcome: &DiffOutcome<'_>, lib_name: &str, arch: &str) -> Self {
        let mut report = DiffReport {
            lib_name: lib_name.to_string(),
            arch: arch.to_string(),
            compatibility_status: outcome
                .status
                .flag_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            compatibility_status_code: outcome.status.bits(),
            ..DiffReport::default()
        };

        let (old, new) = (outcome.old, outcome.new);
        for reported in &outcome.diffs {
            let stack = reported.type_stack.as_str();
            let referenced = reported.reachability == Reachability::Referenced;
            match &reported.message {
                DiffMessage::Function(diff) => {
                    report.function_diffs.push(FunctionDiffEntry::resolve(diff, stack, old, new));
                }
                DiffMessage::GlobalVar(diff) => {
                    report.global_var_diffs.push(GlobalVarDiffEntry::resolve(diff, stack, old, new));
                }
                DiffMessage::Record(diff) => {
                    let entry = RecordDiffEntry::resolve(diff, stack, old, new);
                    if referenced {
                        report.record_type_diffs.push(entry);
                    } else {
                        report.unreferenced_record_type_diffs.push(entry);
                    }
                }
                DiffMessage::Enum(diff) => {
                    let entry = EnumDiffEntry::resolve(diff, stack);
                    let list = match (referenced, diff.is_extended()) {
                        (true, true) => &mut report.enum_type_extension_diffs,
                        (true, false) => &mut report.enum_type_diffs,
                        (false, true) => &mut report.unreferenced_enum_type_extension_diffs,
                        (false, false) => &mut report.unreferenced_enum_type_diffs,
                    };
                    list.push(entry);
                }
            }
        }

        for lone in &outcome.lone {
            let module = outcome.side(lone.change);
            let removed = lone.change == Change::Removed;
            match lone.element {
                LoneElement::Function(func) => {
                    let entry = FunctionEntry::resolve(func, module);
                    pick(removed, &mut report.functions_removed, &mut report.functions_added)
                        .push(entry);
                }
                LoneElement::GlobalVar(var) => {
                    let entry = GlobalVarEntry::resolve(var, module);
                    pick(removed, &mut report.global_vars_removed, &mut report.global_vars_added)
                        .push(entry);
                }
                LoneElement::Record(ty) => {
                    let list = pick(
                        removed,
                        &mut report.unreferenced_record_types_removed,
                        &mut report.unreferenced_record_types_added,
                    );
                    list.extend(RecordEntry::resolve(ty, module));
                }
                LoneElement::Enum(ty) => {
                    let list = pick(
                        removed,
                        &mut report.unreferenced_enum_types_removed,
                        &mut report.unreferenced_enum_types_added,
                    );
                    list.extend(EnumEntry::resolve(ty, module));
                }
            }
        }

        for elf in &outcome.elf_changes {
            let removed = elf.change == Change::Removed;
            let list = match elf.kind {
                ElfSymbolKind::Function => pick(
                    removed,
                    &mut report.removed_elf_functions,
                    &mut report.added_elf_functions,
                ),
                ElfSymbolKind::Object => {
                    pick(removed, &mut report.removed_elf_objects, &mut report.added_elf_objects)
                }
            };
            list.push(ElfSymbolEntry::from(elf.symbol));
        }

        report
    }

    /// Non-empty lists with their lengths, in document order.
    pub fn summary(&self) -> Vec<(&'static str, usize)> {
        let counts = [
            ("functions_removed", self.functions_removed.len()),
            ("functions_added", self.functions_added.len()),
            ("global_vars_removed", self.global_vars_removed.len()),
            ("global_vars_added", self.global_vars_added.len()),
            ("function_diffs", self.function_diffs.len()),
            ("global_var_diffs", self.global_var_diffs.len()),
            ("record_type_diffs", self.record_type_diffs.len()),
            ("unreferenced_record_type_diffs", self.unreferenced_record_type_diffs.len()),
            ("unreferenced_record_types_removed", self.unreferenced_record_types_removed.len()),
            ("unreferenced_record_types_added", self.unreferenced_record_types_added.len()),
            ("enum_type_diffs", self.enum_type_diffs.len()),
            ("enum_type_extension_diffs", self.enum_type_extension_diffs.len()),
            ("unreferenced_enum_type_diffs", self.unreferenced_enum_type_diffs.len()),
            (
                "unreferenced_enum_type_extension_diffs",
                self.unreferenced_enum_type_extension_diffs.len(),
            ),
            ("unreferenced_enum_types_removed", self.unreferenced_enum_types_removed.len()),
            ("unreferenced_enum_types_added", self.unreferenced_enum_types_added.len()),
            ("removed_elf_functions", self.removed_elf_functions.len()),
            ("removed_elf_objects", self.removed_elf_objects.len()),
            ("added_elf_functions", self.added_elf_functions.len()),
            ("added_elf_objects", self.added_elf_objects.len()),
        ];
        counts.into_iter().filter(|(_, count)| *count > 0).collect()
    }

    /// Pretty JSON with a trailing newline.
    pub fn to_json(&self) -> ReportResult<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    pub fn from_json(text: &str) -> ReportResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn write_to(&self, path: &Path) -> ReportResult<()> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|source| ReportError::Io { path: path.to_path_buf(), source })
    }
}

fn pick<'r, T>(removed: bool, removals: &'r mut Vec<T>, additions: &'r mut Vec<T>) -> &'r mut Vec<T> {
    if removed {
        removals
    } else {
        additions
    }
}
