//! Recursive type-graph comparison.
//!
//! [`TypeDiffer`] walks the old and new type graphs in lockstep starting from a
//! pair of type ids. Every pair is recorded in a visited-pair cache before it is
//! inspected, so cyclic graphs terminate: a pair seen a second time reports
//! `NoDiff` and whatever it differs in has already been reported on the first
//! visit.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use log::{debug, warn};

use crate::model::{
    BaseSpecifier, BuiltinType, EnumType, FunctionIr, FunctionSignature, GlobalVarIr, Param,
    RecordField, RecordType, TypeBody, TypeIr, VTableComponent,
};
use crate::module::Module;

use super::message::{
    DiffMessage, EnumDiff, FieldDiff, FunctionDiff, GlobalVarDiff, RecordDiff, ReportedDiff,
    TypeInfoDiff,
};
use super::{DiffPolicy, DiffStatus, Reachability};

/// Suffix some extractors append to ids of types defined more than once.
const ODR_SUFFIX: &str = "#ODR:";

/// The two spellings compilers use for the `__va_list` type info.
const VA_LIST_TYPE_IDS: [&str; 2] = ["_ZTI9__va_list", "_ZTISt9__va_list"];

const THUNK_PREFIXES: [&str; 3] = ["_ZTv", "_ZTh", "_ZTc"];

pub struct TypeDiffer<'a> {
    old: &'a Module,
    new: &'a Module,
    treat_opaque_as_different: bool,
    ignored: BTreeSet<String>,
    visited: HashSet<(&'a str, &'a str)>,
    type_stack: Vec<&'a str>,
    reports: Vec<ReportedDiff<'a>>,
}

impl<'a> TypeDiffer<'a> {
    pub fn new(old: &'a Module, new: &'a Module, policy: &DiffPolicy) -> Self {
        Self {
            old,
            new,
            treat_opaque_as_different: policy.treat_opaque_as_different,
            ignored: policy.ignored_symbols.clone(),
            visited: HashSet::new(),
            type_stack: Vec::new(),
            reports: Vec::new(),
        }
    }

    /// Messages emitted so far, in emission order.
    pub fn into_reports(self) -> Vec<ReportedDiff<'a>> {
        self.reports
    }

    /// Compare two exported functions and emit a function diff when their
    /// signatures differ directly or their access changed.
    pub fn compare_function(
        &mut self,
        old: &'a FunctionIr,
        new: &'a FunctionIr,
        reach: Reachability,
    ) -> DiffStatus {
        self.type_stack.clear();
        self.type_stack.push(&old.name);
        let status = self.compare_signature(&old.signature, &new.signature, reach);
        if status.is_direct() || old.access != new.access {
            self.emit(reach, DiffMessage::Function(FunctionDiff { old, new }));
        }
        self.type_stack.clear();
        status
    }

    /// Compare two exported global variables.
    pub fn compare_global_var(
        &mut self,
        old: &'a GlobalVarIr,
        new: &'a GlobalVarIr,
        reach: Reachability,
    ) -> DiffStatus {
        self.type_stack.clear();
        self.type_stack.push(&old.name);
        let status = self.compare_type_ids(&old.referenced_type, &new.referenced_type, reach);
        if status.is_direct() || old.access != new.access {
            self.emit(reach, DiffMessage::GlobalVar(GlobalVarDiff { old, new }));
        }
        self.type_stack.clear();
        status
    }

    /// Compare a user-defined type present in both modules under the same key.
    pub fn compare_user_type(
        &mut self,
        old: &'a TypeIr,
        new: &'a TypeIr,
        reach: Reachability,
    ) -> DiffStatus {
        self.type_stack.clear();
        let status = self.compare_type_ids(old.type_id(), new.type_id(), reach);
        self.type_stack.clear();
        status
    }

    /// Entry point of every recursive comparison.
    pub fn compare_type_ids(
        &mut self,
        old_id: &'a str,
        new_id: &'a str,
        reach: Reachability,
    ) -> DiffStatus {
        if !self.visited.insert((old_id, new_id)) {
            return DiffStatus::NoDiff;
        }
        self.type_stack.push(self.old.type_name(old_id));
        let status = match (self.old.find_type(old_id), self.new.find_type(new_id)) {
            (Some(old_ty), Some(new_ty)) => self.compare_types(old_ty, new_ty, reach),
            _ => self.compare_opaque(old_id, new_id),
        };
        self.type_stack.pop();
        status
    }

    fn compare_types(
        &mut self,
        old_ty: &'a TypeIr,
        new_ty: &'a TypeIr,
        reach: Reachability,
    ) -> DiffStatus {
        if self.ignored.contains(new_ty.linker_set_key()) {
            debug!("skipping ignored type {}", new_ty.linker_set_key());
            return DiffStatus::NoDiff;
        }
        match (&old_ty.body, &new_ty.body) {
            (TypeBody::Builtin(old), TypeBody::Builtin(new)) => {
                compare_builtins(old_ty, new_ty, old, new)
            }
            (TypeBody::Qualified(old), TypeBody::Qualified(new)) => {
                if old != new {
                    return DiffStatus::DirectDiff;
                }
                self.compare_type_ids(&old_ty.referenced_type, &new_ty.referenced_type, reach)
            }
            (TypeBody::Pointer, TypeBody::Pointer)
            | (TypeBody::LvalueReference, TypeBody::LvalueReference)
            | (TypeBody::RvalueReference, TypeBody::RvalueReference) => {
                self.compare_type_ids(&old_ty.referenced_type, &new_ty.referenced_type, reach)
            }
            (TypeBody::Array, TypeBody::Array) => {
                if !old_ty.same_size_and_alignment(new_ty) {
                    return DiffStatus::DirectDiff;
                }
                self.compare_type_ids(&old_ty.referenced_type, &new_ty.referenced_type, reach)
            }
            (TypeBody::Enum(old), TypeBody::Enum(new)) => {
                self.compare_enums(old_ty, new_ty, old, new, reach)
            }
            (TypeBody::Record(old), TypeBody::Record(new)) => {
                self.compare_records(old_ty, new_ty, old, new, reach)
            }
            (TypeBody::Function(old), TypeBody::Function(new)) => {
                self.compare_signature(old, new, reach)
            }
            // Different kinds are never related.
            _ => {
                debug!(
                    "kind mismatch for {}: {} vs {}",
                    old_ty.name,
                    old_ty.kind(),
                    new_ty.kind()
                );
                DiffStatus::DirectDiff
            }
        }
    }

    fn compare_opaque(&self, old_id: &str, new_id: &str) -> DiffStatus {
        if !self.treat_opaque_as_different {
            return DiffStatus::NoDiff;
        }
        if strip_odr_suffix(old_id) == strip_odr_suffix(new_id)
            || (VA_LIST_TYPE_IDS.contains(&old_id) && VA_LIST_TYPE_IDS.contains(&new_id))
        {
            return DiffStatus::NoDiff;
        }
        DiffStatus::OpaqueDiff
    }

    /// Functions and function types are either identical or directly different.
    fn compare_signature(
        &mut self,
        old: &'a FunctionSignature,
        new: &'a FunctionSignature,
        reach: Reachability,
    ) -> DiffStatus {
        let mut status = self.compare_parameters(&old.parameters, &new.parameters, reach);
        if self.compare_type_ids(&old.return_type, &new.return_type, reach).is_direct() {
            status = DiffStatus::DirectDiff;
        }
        if old.template_args.len() != new.template_args.len() {
            status = DiffStatus::DirectDiff;
        } else {
            for (old_arg, new_arg) in old.template_args.iter().zip(&new.template_args) {
                self.compare_type_ids(old_arg, new_arg, reach);
            }
        }
        status
    }

    fn compare_parameters(
        &mut self,
        old: &'a [Param],
        new: &'a [Param],
        reach: Reachability,
    ) -> DiffStatus {
        if old.len() != new.len() {
            return DiffStatus::DirectDiff;
        }
        for (old_param, new_param) in old.iter().zip(new) {
            let type_status =
                self.compare_type_ids(&old_param.referenced_type, &new_param.referenced_type, reach);
            if type_status.is_direct() || old_param.is_default != new_param.is_default {
                return DiffStatus::DirectDiff;
            }
        }
        DiffStatus::NoDiff
    }

    /// Enum changes travel through the emitted message only; the caller always
    /// sees `NoDiff` unless the two enums are different types altogether.
    fn compare_enums(
        &mut self,
        old_ty: &'a TypeIr,
        new_ty: &'a TypeIr,
        old: &'a EnumType,
        new: &'a EnumType,
        reach: Reachability,
    ) -> DiffStatus {
        if old_ty.linker_set_key() != new_ty.linker_set_key() {
            return DiffStatus::DirectDiff;
        }

        let old_underlying = self.old.type_name(&old.underlying_type);
        let new_underlying = self.new.type_name(&new.underlying_type);
        let underlying_type_diff =
            (old_underlying != new_underlying).then_some((old_underlying, new_underlying));

        let old_by_name: BTreeMap<&str, _> =
            old.fields.iter().map(|f| (f.name.as_str(), f)).collect();
        let new_by_name: BTreeMap<&str, _> =
            new.fields.iter().map(|f| (f.name.as_str(), f)).collect();

        let fields_removed = old_by_name
            .iter()
            .filter(|(name, _)| !new_by_name.contains_key(*name))
            .map(|(_, field)| *field)
            .collect();
        let fields_added = new_by_name
            .iter()
            .filter(|(name, _)| !old_by_name.contains_key(*name))
            .map(|(_, field)| *field)
            .collect();
        let fields_diff = old_by_name
            .iter()
            .filter_map(|(name, old_field)| {
                let new_field = new_by_name.get(name)?;
                (old_field.value != new_field.value).then_some((*old_field, *new_field))
            })
            .collect();

        let diff = EnumDiff {
            old_type: old_ty,
            new_type: new_ty,
            old,
            new,
            underlying_type_diff,
            fields_added,
            fields_removed,
            fields_diff,
        };
        if diff.is_extended() || diff.is_incompatible() {
            self.emit(reach, DiffMessage::Enum(diff));
        }
        DiffStatus::NoDiff
    }

    /// Records only ever surface `IndirectDiff` to their caller; a change to the
    /// record's own layout is reported through a record diff message.
    fn compare_records(
        &mut self,
        old_ty: &'a TypeIr,
        new_ty: &'a TypeIr,
        old: &'a RecordType,
        new: &'a RecordType,
        reach: Reachability,
    ) -> DiffStatus {
        if !old.is_anonymous
            && !new.is_anonymous
            && old_ty.linker_set_key() != new_ty.linker_set_key()
        {
            return DiffStatus::DirectDiff;
        }

        let mut status = DiffStatus::NoDiff;

        let access_diff = (old.access != new.access).then_some((old.access, new.access));
        if old.access.is_downgraded_to(new.access) {
            status = status.combine(DiffStatus::DirectDiff);
        }

        let type_info_diff = (!old_ty.same_size_and_alignment(new_ty)).then_some(TypeInfoDiff {
            old_size: old_ty.size,
            new_size: new_ty.size,
            old_alignment: old_ty.alignment,
            new_alignment: new_ty.alignment,
        });
        if type_info_diff.is_some() {
            status = status.combine(DiffStatus::DirectDiff);
        }

        let vtable_changed = !vtables_equal(&old.vtable, &new.vtable);
        if vtable_changed {
            status = status.combine(DiffStatus::DirectDiff);
        }

        let fields = self.compare_record_fields(&old.fields, &new.fields, reach);
        status = status.combine(fields.status);

        let bases_changed = !self.bases_equal(&old.bases, &new.bases, reach);
        if bases_changed {
            status = status.combine(DiffStatus::DirectDiff);
        }

        if status.is_direct() {
            let diff = RecordDiff {
                old_type: old_ty,
                new_type: new_ty,
                old,
                new,
                type_info_diff,
                access_diff,
                vtable_changed,
                bases_changed,
                fields_diff: fields.diffed,
                fields_removed: fields.removed,
                fields_added: fields.added,
            };
            self.emit(reach, DiffMessage::Record(diff));
        }

        if old.template_args.len() != new.template_args.len() {
            status = status.combine(DiffStatus::DirectDiff);
        } else {
            for (old_arg, new_arg) in old.template_args.iter().zip(&new.template_args) {
                status = status.combine(self.compare_type_ids(old_arg, new_arg, reach));
            }
        }

        if status.has_diff() {
            DiffStatus::IndirectDiff
        } else {
            DiffStatus::NoDiff
        }
    }

    /// Match fields by name, then reconcile one-sided fields by offset so that a
    /// plain rename is not reported as remove + add.
    fn compare_record_fields(
        &mut self,
        old_fields: &'a [RecordField],
        new_fields: &'a [RecordField],
        reach: Reachability,
    ) -> FieldComparison<'a> {
        let mut verdicts = HashMap::new();
        let old_by_name = fields_by_name(old_fields);
        let new_by_name = fields_by_name(new_fields);
        let old_by_offset = fields_by_offset(old_fields);
        let new_by_offset = fields_by_offset(new_fields);

        // Unnamed fields cannot be matched by name; they start out one-sided.
        let mut removed: Vec<usize> = (0..old_fields.len())
            .filter(|&i| {
                let name = old_fields[i].name.as_str();
                name.is_empty() || !new_by_name.contains_key(name)
            })
            .collect();
        let mut added: Vec<usize> = (0..new_fields.len())
            .filter(|&i| {
                let name = new_fields[i].name.as_str();
                name.is_empty() || !old_by_name.contains_key(name)
            })
            .collect();

        let mut status = DiffStatus::NoDiff;
        removed.retain(|&oi| {
            let Some(&ni) = new_by_offset.get(&old_fields[oi].offset) else {
                return true;
            };
            let verdict = self.field_verdict(&mut verdicts, old_fields, new_fields, oi, ni, reach);
            if verdict.differs {
                return true;
            }
            status = status.combine(verdict.status);
            false
        });
        added.retain(|&ni| {
            let Some(&oi) = old_by_offset.get(&new_fields[ni].offset) else {
                return true;
            };
            let verdict = self.field_verdict(&mut verdicts, old_fields, new_fields, oi, ni, reach);
            if verdict.differs {
                return true;
            }
            status = status.combine(verdict.status);
            false
        });

        let mut diffed = Vec::new();
        for (name, &oi) in &old_by_name {
            let Some(&ni) = new_by_name.get(name) else {
                continue;
            };
            let verdict = self.field_verdict(&mut verdicts, old_fields, new_fields, oi, ni, reach);
            if verdict.differs {
                diffed.push(FieldDiff { old: &old_fields[oi], new: &new_fields[ni] });
            } else {
                status = status.combine(verdict.status);
            }
        }

        if !diffed.is_empty() || !removed.is_empty() {
            status = status.combine(DiffStatus::DirectDiff);
        }

        FieldComparison {
            status,
            diffed,
            removed: removed.into_iter().map(|i| &old_fields[i]).collect(),
            added: added.into_iter().map(|i| &new_fields[i]).collect(),
        }
    }

    /// Compare one (old, new) field pair, memoized per record comparison so the
    /// visited-pair cache cannot mask the result of a pair seen twice.
    fn field_verdict(
        &mut self,
        verdicts: &mut HashMap<(usize, usize), FieldVerdict>,
        old_fields: &'a [RecordField],
        new_fields: &'a [RecordField],
        oi: usize,
        ni: usize,
        reach: Reachability,
    ) -> FieldVerdict {
        if let Some(verdict) = verdicts.get(&(oi, ni)) {
            return *verdict;
        }
        let (old, new) = (&old_fields[oi], &new_fields[ni]);
        let type_status = self.compare_type_ids(&old.referenced_type, &new.referenced_type, reach);
        let verdict = FieldVerdict {
            differs: old.offset != new.offset
                || old.access.is_downgraded_to(new.access)
                || type_status.is_direct(),
            status: type_status,
        };
        verdicts.insert((oi, ni), verdict);
        verdict
    }

    fn bases_equal(
        &mut self,
        old: &'a [BaseSpecifier],
        new: &'a [BaseSpecifier],
        reach: Reachability,
    ) -> bool {
        if old.len() != new.len() {
            return false;
        }
        for (old_base, new_base) in old.iter().zip(new) {
            let type_status =
                self.compare_type_ids(&old_base.referenced_type, &new_base.referenced_type, reach);
            if type_status.is_direct() || old_base.access != new_base.access {
                return false;
            }
        }
        true
    }

    fn emit(&mut self, reachability: Reachability, message: DiffMessage<'a>) {
        let type_stack = self.type_stack.join("-> ");
        debug!("diff in {} (via {})", message.name(), type_stack);
        self.reports.push(ReportedDiff { reachability, type_stack, message });
    }
}

#[derive(Debug, Clone, Copy)]
struct FieldVerdict {
    differs: bool,
    status: DiffStatus,
}

struct FieldComparison<'a> {
    status: DiffStatus,
    diffed: Vec<FieldDiff<'a>>,
    removed: Vec<&'a RecordField>,
    added: Vec<&'a RecordField>,
}

fn fields_by_name(fields: &[RecordField]) -> BTreeMap<&str, usize> {
    fields
        .iter()
        .enumerate()
        .filter(|(_, f)| !f.name.is_empty())
        .map(|(i, f)| (f.name.as_str(), i))
        .collect()
}

/// First field at each offset wins (unions and bit-fields share offsets).
fn fields_by_offset(fields: &[RecordField]) -> BTreeMap<u64, usize> {
    let mut map = BTreeMap::new();
    for (i, field) in fields.iter().enumerate() {
        map.entry(field.offset).or_insert(i);
    }
    map
}

fn compare_builtins(
    old_ty: &TypeIr,
    new_ty: &TypeIr,
    old: &BuiltinType,
    new: &BuiltinType,
) -> DiffStatus {
    if !old_ty.same_size_and_alignment(new_ty)
        || old.is_unsigned != new.is_unsigned
        || old.is_integral != new.is_integral
    {
        DiffStatus::DirectDiff
    } else {
        DiffStatus::NoDiff
    }
}

fn strip_odr_suffix(id: &str) -> &str {
    match id.find(ODR_SUFFIX) {
        Some(pos) => &id[..pos],
        None => id,
    }
}

/// Drop the thunk adjustment from a mangled name: `_ZThn8_N3Foo3barEv` and
/// `_ZTv0_n24_N3Foo3barEv` both become `_ZN3Foo3barEv`.
pub fn remove_thunk_info(name: &str) -> String {
    if !THUNK_PREFIXES.iter().any(|prefix| name.starts_with(prefix)) {
        return name.to_string();
    }
    match name.find('N') {
        Some(pos) => format!("_Z{}", &name[pos..]),
        None => name.to_string(),
    }
}

fn vtable_components_equal(old: &VTableComponent, new: &VTableComponent) -> bool {
    if old.name != new.name {
        if remove_thunk_info(&old.name) != remove_thunk_info(&new.name) {
            return false;
        }
        warn!("ignoring vtable name difference between {} and {}", old.name, new.name);
    }
    old.value == new.value && old.kind == new.kind
}

fn vtables_equal(old: &[VTableComponent], new: &[VTableComponent]) -> bool {
    old.len() == new.len() && old.iter().zip(new).all(|(o, n)| vtable_components_equal(o, n))
}
