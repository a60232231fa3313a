mod common;

use abi_core::diff::{
    compare, Change, CompatibilityStatus, DiffMessage, DiffOutcome, DiffPolicy, LoneElement,
    Reachability,
};
use abi_core::model::{
    AccessSpecifier, ElfSymbol, FunctionIr, FunctionSignature, Param, Qualifiers, TypeBody, TypeIr,
};
use abi_core::module::Module;
use common::{field, ModuleBuilder};

fn library() -> ModuleBuilder {
    ModuleBuilder::with_builtins()
        .function("_Z3fooi", "foo", "int", &["int"])
        .global_var("g_count", "g_count", "int")
}

/// Comparing a module with itself yields no messages and a compatible verdict.
#[test]
fn identical_modules_are_compatible() {
    let module = library().build();
    let outcome = compare(&module, &module, &DiffPolicy::default());

    assert!(outcome.is_empty());
    assert_eq!(outcome.status, CompatibilityStatus::COMPATIBLE);
    assert!(outcome.status.is_compatible());
}

/// A parameter that changes signedness is a direct function diff.
#[test]
fn builtin_signedness_change_breaks_function() {
    let old = library().build();
    let new = ModuleBuilder::with_builtins()
        .function("_Z3fooi", "foo", "int", &["unsigned int"])
        .global_var("g_count", "g_count", "int")
        .build();

    let outcome = compare(&old, &new, &DiffPolicy::default());

    assert_eq!(outcome.status, CompatibilityStatus::INCOMPATIBLE);
    assert_eq!(outcome.diffs.len(), 1);
    let reported = &outcome.diffs[0];
    assert_eq!(reported.reachability, Reachability::Referenced);
    assert_eq!(reported.type_stack, "foo");
    match &reported.message {
        DiffMessage::Function(diff) => {
            assert_eq!(diff.old.name, "foo");
            assert_eq!(diff.new.signature.parameters[0].referenced_type, "unsigned int");
        }
        other => panic!("expected function diff, got {:?}", other),
    }
}

/// Adding a parameter changes the arity and is reported.
#[test]
fn parameter_count_change_breaks_function() {
    let old = library().build();
    let new = ModuleBuilder::with_builtins()
        .function("_Z3fooi", "foo", "int", &["int", "int"])
        .global_var("g_count", "g_count", "int")
        .build();

    let outcome = compare(&old, &new, &DiffPolicy::default());
    assert_eq!(outcome.status, CompatibilityStatus::INCOMPATIBLE);
    assert!(matches!(outcome.diffs[0].message, DiffMessage::Function(_)));
}

/// A return type change is a direct function diff as well.
#[test]
fn return_type_change_breaks_function() {
    let old = library().build();
    let new = ModuleBuilder::with_builtins()
        .function("_Z3fooi", "foo", "long", &["int"])
        .global_var("g_count", "g_count", "int")
        .build();

    let outcome = compare(&old, &new, &DiffPolicy::default());
    assert_eq!(outcome.status, CompatibilityStatus::INCOMPATIBLE);
    assert_eq!(outcome.diffs.len(), 1);
}

/// A change of access alone is enough to emit a function diff.
#[test]
fn function_access_change_is_reported() {
    let old = library().build();
    let signature = FunctionSignature::new("int", vec![Param::new("int")]);
    let mut func = FunctionIr::new("_Z3fooi", "foo", signature);
    func.access = AccessSpecifier::Protected;
    let new = ModuleBuilder::with_builtins()
        .entity(func)
        .elf_function(ElfSymbol::global("_Z3fooi"))
        .global_var("g_count", "g_count", "int")
        .build();

    let outcome = compare(&old, &new, &DiffPolicy::default());
    assert_eq!(outcome.status, CompatibilityStatus::INCOMPATIBLE);
    match &outcome.diffs[0].message {
        DiffMessage::Function(diff) => assert_eq!(diff.new.access, AccessSpecifier::Protected),
        other => panic!("expected function diff, got {:?}", other),
    }
}

/// A global variable whose type changes is reported with its own message.
#[test]
fn global_var_type_change_is_reported() {
    let old = library().build();
    let new = ModuleBuilder::with_builtins()
        .function("_Z3fooi", "foo", "int", &["int"])
        .global_var("g_count", "g_count", "long")
        .build();

    let outcome = compare(&old, &new, &DiffPolicy::default());
    assert_eq!(outcome.status, CompatibilityStatus::INCOMPATIBLE);
    assert_eq!(outcome.diffs.len(), 1);
    assert!(matches!(outcome.diffs[0].message, DiffMessage::GlobalVar(_)));
    assert_eq!(outcome.diffs[0].type_stack, "g_count");
}

/// Removing an exported function is incompatible even though its ELF symbol
/// disappears too.
#[test]
fn removed_function_is_incompatible() {
    let old = library().function("_Z3barv", "bar", "int", &[]).build();
    let new = library().build();

    let outcome = compare(&old, &new, &DiffPolicy::default());

    assert_eq!(outcome.status, CompatibilityStatus::INCOMPATIBLE);
    assert_eq!(outcome.lone.len(), 1);
    assert_eq!(outcome.lone[0].change, Change::Removed);
    assert!(matches!(outcome.lone[0].element, LoneElement::Function(f) if f.name == "bar"));
    assert_eq!(outcome.elf_changes.len(), 1);
    assert_eq!(outcome.elf_changes[0].symbol.name, "_Z3barv");
}

/// Adding a function is a compatible extension.
#[test]
fn added_function_is_extension() {
    let old = library().build();
    let new = library().function("_Z3barv", "bar", "int", &[]).build();

    let outcome = compare(&old, &new, &DiffPolicy::default());

    assert_eq!(outcome.status, CompatibilityStatus::EXTENSION);
    assert_eq!(outcome.lone.len(), 1);
    assert_eq!(outcome.lone[0].change, Change::Added);
}

/// Removing a global variable is incompatible.
#[test]
fn removed_global_var_is_incompatible() {
    let old = library().global_var("g_limit", "g_limit", "long").build();
    let new = library().build();

    let outcome = compare(&old, &new, &DiffPolicy::default());
    assert_eq!(outcome.status, CompatibilityStatus::INCOMPATIBLE);
    assert!(matches!(outcome.lone[0].element, LoneElement::GlobalVar(v) if v.name == "g_limit"));
}

/// A function whose declaration vanished but whose symbol is still exported
/// (e.g. now implemented in assembly) is not reported.
#[test]
fn function_still_exported_by_elf_is_not_lone() {
    let old = library().function("_Z3bazv", "baz", "int", &[]).build();
    let new = library().elf_function(ElfSymbol::global("_Z3bazv")).build();

    let outcome = compare(&old, &new, &DiffPolicy::default());

    assert!(outcome.is_empty());
    assert_eq!(outcome.status, CompatibilityStatus::COMPATIBLE);
}

/// An exported symbol disappearing with no IR entity behind it is an ELF-only break.
#[test]
fn removed_elf_symbol_is_elf_incompatible() {
    let old = library().elf_function(ElfSymbol::global("_Z6helperv")).build();
    let new = library().build();

    let outcome = compare(&old, &new, &DiffPolicy::default());

    assert_eq!(outcome.status, CompatibilityStatus::ELF_INCOMPATIBLE);
    assert!(outcome.lone.is_empty());
    assert_eq!(outcome.elf_changes.len(), 1);
    assert_eq!(outcome.elf_changes[0].change, Change::Removed);
}

/// Weak symbols may come and go when the policy allows it.
#[test]
fn weak_symbols_are_skipped_under_policy() {
    let weak = FunctionIr::new("_Z4weakv", "weak", FunctionSignature::new("int", vec![]));
    let old = library().entity(weak).elf_function(ElfSymbol::weak("_Z4weakv")).build();
    let new = library().build();

    let strict = compare(&old, &new, &DiffPolicy::default());
    assert_eq!(strict.status, CompatibilityStatus::INCOMPATIBLE);

    let policy = DiffPolicy { allow_adding_removing_weak_symbols: true, ..DiffPolicy::default() };
    let lenient = compare(&old, &new, &policy);
    assert!(lenient.is_empty());
    assert_eq!(lenient.status, CompatibilityStatus::COMPATIBLE);
}

/// Ignored keys are neither diffed nor listed as added or removed.
#[test]
fn ignored_symbols_are_skipped() {
    let old = library().function("_Z3barv", "bar", "int", &[]).build();
    let new = ModuleBuilder::with_builtins()
        .function("_Z3fooi", "foo", "int", &["long"])
        .global_var("g_count", "g_count", "int")
        .elf_function(ElfSymbol::global("_Z3barv"))
        .build();

    let mut policy = DiffPolicy::default();
    policy.ignored_symbols.insert("_Z3fooi".to_string());
    policy.ignored_symbols.insert("_Z3barv".to_string());

    let outcome = compare(&old, &new, &policy);
    assert!(outcome.is_empty());
    assert_eq!(outcome.status, CompatibilityStatus::COMPATIBLE);
}

/// Keys that encode a source position are never reported as added or removed.
#[test]
fn source_position_keys_are_not_lone() {
    let lambda = FunctionIr::new(
        "lambda at foo.cpp:12:3",
        "lambda",
        FunctionSignature::new("int", vec![]),
    );
    let old = library().entity(lambda).build();
    let new = library().build();

    let outcome = compare(&old, &new, &DiffPolicy::default());
    assert!(outcome.is_empty());
}

/// Only the messages are surfaced through `messages()`, in emission order.
#[test]
fn messages_follow_emission_order() {
    let old = library().build();
    let new = ModuleBuilder::with_builtins()
        .function("_Z3fooi", "foo", "long", &["int"])
        .global_var("g_count", "g_count", "char")
        .build();

    let outcome = compare(&old, &new, &DiffPolicy::default());
    let names: Vec<&str> = outcome.messages().map(|m| m.name()).collect();
    assert_eq!(names, vec!["foo", "g_count"]);
}

/// The visited-pair cache spans the whole run: a pair already compared for one
/// entity reports nothing new for the next.
#[test]
fn type_pair_is_compared_once_per_run() {
    let old = library().build();
    let new = ModuleBuilder::with_builtins()
        .function("_Z3fooi", "foo", "long", &["int"])
        .global_var("g_count", "g_count", "long")
        .build();

    let outcome = compare(&old, &new, &DiffPolicy::default());
    assert_eq!(outcome.diffs.len(), 1);
    assert!(matches!(outcome.diffs[0].message, DiffMessage::Function(_)));

    // A fresh run starts with an empty cache.
    let again = compare(&old, &new, &DiffPolicy::default());
    assert_eq!(again.diffs.len(), 1);
}

fn takes(param: TypeIr) -> Module {
    let key = param.type_id().to_string();
    ModuleBuilder::with_builtins()
        .entity(param)
        .function("_Z4peekv", "peek", "int", &[key.as_str()])
        .build()
}

fn only_function_diff(outcome: &DiffOutcome<'_>) {
    assert_eq!(outcome.diffs.len(), 1, "expected one message: {:?}", outcome.diffs);
    assert!(matches!(outcome.diffs[0].message, DiffMessage::Function(_)));
    assert_eq!(outcome.status, CompatibilityStatus::INCOMPATIBLE);
}

/// Adding `volatile` to a qualified parameter is a direct diff even with the same pointee.
#[test]
fn qualifier_change_breaks_function() {
    let qualified = |qualifiers: Qualifiers| {
        TypeIr::new("_ZTIKi", "const int", 4, 4, TypeBody::Qualified(qualifiers)).referencing("int")
    };
    let constant = Qualifiers { is_const: true, ..Qualifiers::default() };
    let const_volatile = Qualifiers { is_volatile: true, ..constant };

    let old = takes(qualified(constant));
    let new = takes(qualified(const_volatile));
    only_function_diff(&compare(&old, &new, &DiffPolicy::default()));

    let same_ir = takes(qualified(constant));
    let same = compare(&old, &same_ir, &DiffPolicy::default());
    assert!(same.is_empty());
}

/// An rvalue reference is compared through its referenced type.
#[test]
fn rvalue_reference_target_change_breaks_function() {
    let rvalue = |target: &str| {
        TypeIr::new("_ZTIOi", "int &&", 8, 8, TypeBody::RvalueReference).referencing(target)
    };

    let old = takes(rvalue("int"));
    let new = takes(rvalue("unsigned int"));
    only_function_diff(&compare(&old, &new, &DiffPolicy::default()));
}

fn templated(template_args: &[&str], box_size: u64) -> Module {
    let signature = FunctionSignature {
        template_args: template_args.iter().map(|arg| arg.to_string()).collect(),
        ..FunctionSignature::new("int", vec![])
    };
    ModuleBuilder::with_builtins()
        .record("_ZTI3Box", "Box", box_size, vec![field("a", "int", 0)])
        .entity(FunctionIr::new("_Z4makeI3BoxEiv", "make<Box>", signature))
        .elf_function(ElfSymbol::global("_Z4makeI3BoxEiv"))
        .build()
}

/// A function whose template argument count changes is a direct diff.
#[test]
fn function_template_arg_count_change_breaks_function() {
    let old = templated(&["_ZTI3Box"], 4);
    let new = templated(&["_ZTI3Box", "int"], 4);
    only_function_diff(&compare(&old, &new, &DiffPolicy::default()));
}

/// Template arguments of equal count are compared pairwise, reporting the changed type.
#[test]
fn function_template_arg_change_reports_the_argument() {
    let old = templated(&["_ZTI3Box"], 4);
    let new = templated(&["_ZTI3Box"], 8);

    let outcome = compare(&old, &new, &DiffPolicy::default());
    assert_eq!(outcome.diffs.len(), 1);
    assert_eq!(outcome.diffs[0].type_stack, "make<Box>-> Box");
    match &outcome.diffs[0].message {
        DiffMessage::Record(diff) => assert_eq!(diff.new_type.name, "Box"),
        other => panic!("expected record diff, got {:?}", other),
    }
}
