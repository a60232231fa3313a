//! Top-level comparison of two modules.

use std::collections::BTreeMap;

use log::{debug, info};

use crate::model::{ElfSymbol, ElfSymbolKind, TypeBody, TypeIr};
use crate::module::Module;

use super::message::{DiffMessage, LoneChange, LoneElement, ReportedDiff};
use super::types::TypeDiffer;
use super::{Change, CompatibilityStatus, DiffPolicy, Reachability};

/// Lone keys carrying a source position are never stable ABI names.
const SOURCE_POSITION_MARKER: &str = " at ";

/// An exported symbol added to or removed from the ELF symbol set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElfChange<'a> {
    pub change: Change,
    pub kind: ElfSymbolKind,
    pub symbol: &'a ElfSymbol,
}

/// Everything one comparison found, borrowing from both modules.
#[derive(Debug)]
pub struct DiffOutcome<'a> {
    pub old: &'a Module,
    pub new: &'a Module,
    pub status: CompatibilityStatus,
    pub diffs: Vec<ReportedDiff<'a>>,
    pub lone: Vec<LoneChange<'a>>,
    pub elf_changes: Vec<ElfChange<'a>>,
}

impl<'a> DiffOutcome<'a> {
    /// Module a lone element or symbol came from.
    pub fn side(&self, change: Change) -> &'a Module {
        match change {
            Change::Added => self.new,
            Change::Removed => self.old,
        }
    }

    pub fn messages(&self) -> impl Iterator<Item = &DiffMessage<'a>> {
        self.diffs.iter().map(|diff| &diff.message)
    }

    pub fn is_empty(&self) -> bool {
        self.diffs.is_empty() && self.lone.is_empty() && self.elf_changes.is_empty()
    }
}

/// Compare `old` against `new` under `policy`.
///
/// The visited-pair cache lives for exactly this call and is shared by every
/// entity compared in it.
pub fn compare<'a>(old: &'a Module, new: &'a Module, policy: &DiffPolicy) -> DiffOutcome<'a> {
    let mut comparison = Comparison {
        old,
        new,
        policy,
        differ: TypeDiffer::new(old, new, policy),
        lone: Vec::new(),
        elf_changes: Vec::new(),
    };

    comparison.collect_functions();
    comparison.collect_global_vars();
    comparison.collect_elf_symbols(ElfSymbolKind::Function);
    comparison.collect_elf_symbols(ElfSymbolKind::Object);
    comparison.compare_common_exportables();
    // Referenced types are cached by now, so only types nothing exported reaches
    // produce messages here.
    if policy.check_all_apis {
        comparison.collect_user_defined_types();
    }

    let Comparison { differ, lone, elf_changes, .. } = comparison;
    let diffs = differ.into_reports();
    let status = compatibility_status(&diffs, &lone, &elf_changes);
    info!("compatibility status: {}", status);
    DiffOutcome { old, new, status, diffs, lone, elf_changes }
}

/// Fold every finding into one verdict.
pub fn compatibility_status(
    diffs: &[ReportedDiff<'_>],
    lone: &[LoneChange<'_>],
    elf_changes: &[ElfChange<'_>],
) -> CompatibilityStatus {
    let referenced_break = diffs.iter().any(|diff| {
        diff.reachability == Reachability::Referenced && diff.message.is_incompatible()
    });
    let exported_removed = lone.iter().any(|entry| {
        entry.change == Change::Removed && entry.element.reachability() == Reachability::Referenced
    });
    if referenced_break || exported_removed {
        return CompatibilityStatus::INCOMPATIBLE;
    }

    if elf_changes.iter().any(|elf| elf.change == Change::Removed) {
        return CompatibilityStatus::ELF_INCOMPATIBLE;
    }

    let mut status = CompatibilityStatus::COMPATIBLE;
    let enum_extended = diffs.iter().any(|diff| {
        diff.reachability == Reachability::Referenced
            && matches!(&diff.message, DiffMessage::Enum(enum_diff) if enum_diff.is_extended())
    });
    let exported_added = lone.iter().any(|entry| {
        entry.change == Change::Added && entry.element.reachability() == Reachability::Referenced
    });
    if enum_extended || exported_added {
        status |= CompatibilityStatus::EXTENSION;
    }

    let unreferenced = diffs.iter().any(|diff| diff.reachability == Reachability::Unreferenced)
        || lone.iter().any(|entry| entry.element.reachability() == Reachability::Unreferenced);
    if unreferenced {
        status |= CompatibilityStatus::UNREFERENCED_CHANGES;
    }
    status
}

struct Comparison<'a, 'p> {
    old: &'a Module,
    new: &'a Module,
    policy: &'p DiffPolicy,
    differ: TypeDiffer<'a>,
    lone: Vec<LoneChange<'a>>,
    elf_changes: Vec<ElfChange<'a>>,
}

impl<'a> Comparison<'a, '_> {
    fn collect_functions(&mut self) {
        let (old_module, new_module) = (self.old, self.new);
        let (old, new) = (old_module.functions(), new_module.functions());
        let (old_elf, new_elf) = (old_module.elf_functions(), new_module.elf_functions());
        for (key, func) in one_sided(old, new) {
            if self.keep_lone(key, old_elf, new_elf) {
                self.push_lone(Change::Removed, LoneElement::Function(func));
            }
        }
        for (key, func) in one_sided(new, old) {
            if self.keep_lone(key, new_elf, old_elf) {
                self.push_lone(Change::Added, LoneElement::Function(func));
            }
        }
    }

    fn collect_global_vars(&mut self) {
        let (old_module, new_module) = (self.old, self.new);
        let (old, new) = (old_module.global_vars(), new_module.global_vars());
        let (old_elf, new_elf) = (old_module.elf_objects(), new_module.elf_objects());
        for (key, var) in one_sided(old, new) {
            if self.keep_lone(key, old_elf, new_elf) {
                self.push_lone(Change::Removed, LoneElement::GlobalVar(var));
            }
        }
        for (key, var) in one_sided(new, old) {
            if self.keep_lone(key, new_elf, old_elf) {
                self.push_lone(Change::Added, LoneElement::GlobalVar(var));
            }
        }
    }

    /// Decide whether an entity present only in `from` is worth reporting.
    ///
    /// An entity whose symbol still exists on the other side is skipped: one
    /// build may implement it in assembly and carry no declaration for it.
    fn keep_lone(
        &self,
        key: &str,
        from_elf: &BTreeMap<String, ElfSymbol>,
        other_elf: &BTreeMap<String, ElfSymbol>,
    ) -> bool {
        if self.policy.is_ignored(key) || other_elf.contains_key(key) {
            return false;
        }
        if self.policy.allow_adding_removing_weak_symbols
            && from_elf.get(key).is_some_and(ElfSymbol::is_weak)
        {
            return false;
        }
        !key.contains(SOURCE_POSITION_MARKER)
    }

    fn collect_elf_symbols(&mut self, kind: ElfSymbolKind) {
        let (old_module, new_module) = (self.old, self.new);
        let (old, new) = match kind {
            ElfSymbolKind::Function => (old_module.elf_functions(), new_module.elf_functions()),
            ElfSymbolKind::Object => (old_module.elf_objects(), new_module.elf_objects()),
        };
        let sides = [(Change::Removed, old, new), (Change::Added, new, old)];
        for (change, from, other) in sides {
            for (_, symbol) in one_sided(from, other) {
                if self.policy.allow_adding_removing_weak_symbols && symbol.is_weak() {
                    continue;
                }
                debug!("ELF symbol {:?}: {}", change, symbol.name);
                self.elf_changes.push(ElfChange { change, kind, symbol });
            }
        }
    }

    fn compare_common_exportables(&mut self) {
        let (old, new) = (self.old, self.new);
        for (key, old_func) in old.functions() {
            let Some(new_func) = new.functions().get(key) else {
                continue;
            };
            if self.policy.is_ignored(key) {
                continue;
            }
            debug!("comparing function {}", key);
            self.differ.compare_function(old_func, new_func, Reachability::Referenced);
        }
        for (key, old_var) in old.global_vars() {
            let Some(new_var) = new.global_vars().get(key) else {
                continue;
            };
            if self.policy.is_ignored(key) {
                continue;
            }
            debug!("comparing global variable {}", key);
            self.differ.compare_global_var(old_var, new_var, Reachability::Referenced);
        }
    }

    /// Records first, then enums; each as lone additions/removals plus common diffs.
    fn collect_user_defined_types(&mut self) {
        let old_records = user_types(self.old, |ty| matches!(ty.body, TypeBody::Record(_)));
        let new_records = user_types(self.new, |ty| matches!(ty.body, TypeBody::Record(_)));
        self.collect_user_type_kind(&old_records, &new_records, LoneElement::Record);

        let old_enums = user_types(self.old, |ty| matches!(ty.body, TypeBody::Enum(_)));
        let new_enums = user_types(self.new, |ty| matches!(ty.body, TypeBody::Enum(_)));
        self.collect_user_type_kind(&old_enums, &new_enums, LoneElement::Enum);
    }

    fn collect_user_type_kind(
        &mut self,
        old: &BTreeMap<&'a str, &'a TypeIr>,
        new: &BTreeMap<&'a str, &'a TypeIr>,
        wrap: fn(&'a TypeIr) -> LoneElement<'a>,
    ) {
        let sides = [(Change::Removed, old, new), (Change::Added, new, old)];
        for (change, from, other) in sides {
            for (key, ty) in from {
                if other.contains_key(key)
                    || self.policy.is_ignored(key)
                    || key.contains(SOURCE_POSITION_MARKER)
                {
                    continue;
                }
                self.push_lone(change, wrap(*ty));
            }
        }
        for (key, old_ty) in old {
            let Some(new_ty) = new.get(key) else {
                continue;
            };
            if self.policy.is_ignored(key) {
                continue;
            }
            self.differ.compare_user_type(*old_ty, *new_ty, Reachability::Unreferenced);
        }
    }

    fn push_lone(&mut self, change: Change, element: LoneElement<'a>) {
        debug!("{:?}: {}", change, element.key());
        self.lone.push(LoneChange { change, element });
    }
}

/// Entries of `from` whose key is missing from `other`, in key order.
fn one_sided<'m, T, U>(
    from: &'m BTreeMap<String, T>,
    other: &'m BTreeMap<String, U>,
) -> impl Iterator<Item = (&'m str, &'m T)> {
    from.iter()
        .filter(|(key, _)| !other.contains_key(*key))
        .map(|(key, value)| (key.as_str(), value))
}

/// User types keyed by linker set key, so `#ODR:` variants of one type line up
/// across the two modules.
fn user_types<'a>(
    module: &'a Module,
    keep: impl Fn(&TypeIr) -> bool,
) -> BTreeMap<&'a str, &'a TypeIr> {
    module
        .user_defined_types()
        .filter(|(_, ty)| keep(ty))
        .map(|(_, ty)| (ty.linker_set_key(), ty))
        .collect()
}
