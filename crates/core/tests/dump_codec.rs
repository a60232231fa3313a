use abi_core::dump::{self, DumpError};
use abi_core::model::{AccessSpecifier, ElfBinding, TypeBody, VTableComponentKind};
use abi_core::module::{EntityKind, ModuleError};
use tempfile::tempdir;

const SAMPLE: &str = r#"{
  "builtin_types": [
    { "linker_set_key": "_ZTIi", "name": "int", "size": 4, "alignment": 4,
      "is_integral": true }
  ],
  "pointer_types": [
    { "linker_set_key": "_ZTIP6Widget", "name": "Widget *", "size": 8, "alignment": 8,
      "referenced_type": "_ZTI6Widget" }
  ],
  "record_types": [
    { "linker_set_key": "_ZTI6Widget", "source_file": "widget.h", "name": "Widget",
      "size": 16, "alignment": 8, "record_kind": "class",
      "fields": [
        { "field_name": "id", "referenced_type": "_ZTIi", "field_offset": 64,
          "access": "private" }
      ],
      "vtable_components": [
        { "kind": "offset_to_top" },
        { "kind": "rtti", "mangled_component_name": "_ZTI6Widget" },
        { "kind": "function_pointer", "mangled_component_name": "_ZN6Widget4drawEv",
          "is_pure": true }
      ]
    }
  ],
  "enum_types": [
    { "linker_set_key": "_ZTI5Color", "name": "Color", "size": 4, "alignment": 4,
      "underlying_type": "_ZTIj",
      "enum_fields": [ { "name": "RED", "enum_field_value": 0 } ] }
  ],
  "functions": [
    { "function_name": "Widget::draw", "linker_set_key": "_ZN6Widget4drawEv",
      "return_type": "_ZTIi",
      "parameters": [ { "referenced_type": "_ZTIP6Widget", "is_this_ptr": true } ] }
  ],
  "global_vars": [
    { "name": "g_widgets", "linker_set_key": "g_widgets", "referenced_type": "_ZTIi" }
  ],
  "elf_functions": [
    { "name": "_ZN6Widget4drawEv" },
    { "name": "_ZN6Widget5resetEv", "binding": "weak" }
  ],
  "elf_objects": [ { "name": "g_widgets" } ]
}"#;

/// A realistic dump loads into every collection with its fields intact.
#[test]
fn load_populates_every_collection() {
    let module = dump::load(SAMPLE.as_bytes()).expect("load sample");

    assert_eq!(module.type_graph().len(), 4);
    assert_eq!(module.functions().len(), 1);
    assert_eq!(module.global_vars().len(), 1);
    assert_eq!(module.elf_functions().len(), 2);
    assert_eq!(module.elf_objects().len(), 1);

    let widget = module.find_type("_ZTI6Widget").expect("Widget");
    assert_eq!(widget.linkable.source_file, "widget.h");
    match &widget.body {
        TypeBody::Record(record) => {
            assert_eq!(record.fields[0].access, AccessSpecifier::Private);
            assert_eq!(record.fields[0].offset, 64);
            assert_eq!(record.vtable.len(), 3);
            assert_eq!(record.vtable[0].kind, VTableComponentKind::OffsetToTop);
            assert!(record.vtable[2].is_pure);
        }
        other => panic!("expected a record body, got {:?}", other),
    }

    let draw = &module.functions()["_ZN6Widget4drawEv"];
    assert_eq!(draw.name, "Widget::draw");
    assert!(draw.signature.parameters[0].is_this_ptr);
    assert_eq!(module.elf_functions()["_ZN6Widget5resetEv"].binding, ElfBinding::Weak);
}

/// An empty object is a valid, empty dump.
#[test]
fn empty_document_is_empty_module() {
    let module = dump::load(b"{}").expect("load empty");
    assert!(module.is_empty());
}

/// A missing required field is a schema error.
#[test]
fn missing_required_field_is_rejected() {
    let text = r#"{ "enum_types": [
        { "linker_set_key": "_ZTI5Color", "name": "Color", "size": 4, "alignment": 4 }
    ] }"#;

    let err = dump::load(text.as_bytes()).unwrap_err();
    assert!(matches!(err, DumpError::Json(_)), "got {:?}", err);
    assert!(err.to_string().contains("underlying_type"));
}

/// Unknown enum tags are rejected rather than mapped to a default.
#[test]
fn unknown_tag_is_rejected() {
    let text = r#"{ "elf_objects": [ { "name": "g_x", "binding": "local" } ] }"#;
    let err = dump::load(text.as_bytes()).unwrap_err();
    assert!(matches!(err, DumpError::Json(_)), "got {:?}", err);
}

/// Unknown keys are rejected at every level.
#[test]
fn unknown_field_is_rejected() {
    let top_level = r#"{ "method_types": [] }"#;
    assert!(matches!(dump::load(top_level.as_bytes()), Err(DumpError::Json(_))));

    let nested = r#"{ "global_vars": [
        { "name": "g", "linker_set_key": "g", "referenced_type": "_ZTIi", "mutable": true }
    ] }"#;
    assert!(matches!(dump::load(nested.as_bytes()), Err(DumpError::Json(_))));
}

/// Two different entities under the same key make the dump invalid.
#[test]
fn conflicting_duplicate_key_is_a_module_error() {
    let text = r#"{ "builtin_types": [
        { "linker_set_key": "_ZTIi", "name": "int", "size": 4, "alignment": 4 },
        { "linker_set_key": "_ZTIi", "name": "int", "size": 8, "alignment": 8 }
    ] }"#;

    match dump::load(text.as_bytes()) {
        Err(DumpError::Module(ModuleError::DuplicateKey { kind, key })) => {
            assert_eq!(kind, EntityKind::Type);
            assert_eq!(key, "_ZTIi");
        }
        other => panic!("expected duplicate key error, got {:?}", other),
    }
}

/// Saving and reloading gives back the same module, and saving is deterministic.
#[test]
fn save_is_canonical() {
    let module = dump::load(SAMPLE.as_bytes()).expect("load sample");

    let first = dump::save(&module).expect("save");
    let reloaded = dump::load(&first).expect("reload");
    assert_eq!(reloaded, module);

    let second = dump::save(&reloaded).expect("save again");
    assert_eq!(first, second);
    assert!(first.ends_with(b"\n"));
}

/// Default-valued enums are left out of the saved document.
#[test]
fn save_elides_default_access_and_binding() {
    let module = dump::load(SAMPLE.as_bytes()).expect("load sample");
    let text = String::from_utf8(dump::save(&module).expect("save")).expect("utf8");
    let value: serde_json::Value = serde_json::from_str(&text).expect("json");

    let global = &value["global_vars"][0];
    assert!(global.get("access").is_none());

    let elf = value["elf_functions"].as_array().expect("elf functions");
    assert!(elf[0].get("binding").is_none());
    assert_eq!(elf[1]["binding"], "weak");

    assert_eq!(value["record_types"][0]["fields"][0]["access"], "private");
}

/// Path helpers round-trip through the filesystem and report I/O failures.
#[test]
fn path_helpers_use_the_filesystem() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("libwidget.so.lsdump");

    let module = dump::load(SAMPLE.as_bytes()).expect("load sample");
    dump::save_path(&module, &path).expect("save to disk");
    let reloaded = dump::load_path(&path).expect("load from disk");
    assert_eq!(reloaded, module);

    let missing = dir.path().join("missing.lsdump");
    match dump::load_path(&missing) {
        Err(DumpError::Io { path, .. }) => assert_eq!(path, missing),
        other => panic!("expected I/O error, got {:?}", other),
    }
}

/// A `self_type` id that differs from the linker set key keys the type graph and survives a save.
#[test]
fn odr_self_type_survives_save() {
    let text = r#"{
      "record_types": [
        { "linker_set_key": "_ZTI3Foo", "self_type": "_ZTI3Foo#ODR:a.h", "name": "Foo",
          "size": 4, "alignment": 4 }
      ],
      "pointer_types": [
        { "linker_set_key": "_ZTIP3Foo", "name": "Foo *", "size": 8, "alignment": 8,
          "referenced_type": "_ZTI3Foo#ODR:a.h" }
      ]
    }"#;

    let module = dump::load(text.as_bytes()).expect("load odr dump");
    let foo = module.find_type("_ZTI3Foo#ODR:a.h").expect("Foo by type id");
    assert_eq!(foo.linker_set_key(), "_ZTI3Foo");
    assert_eq!(foo.type_id(), "_ZTI3Foo#ODR:a.h");
    assert!(module.find_type("_ZTI3Foo").is_none());
    assert_eq!(module.type_name("_ZTI3Foo#ODR:a.h"), "Foo");

    let saved = String::from_utf8(dump::save(&module).expect("save")).expect("utf8");
    let value: serde_json::Value = serde_json::from_str(&saved).expect("json");
    assert_eq!(value["record_types"][0]["self_type"], "_ZTI3Foo#ODR:a.h");
    assert_eq!(value["record_types"][0]["linker_set_key"], "_ZTI3Foo");

    let reloaded = dump::load(saved.as_bytes()).expect("reload");
    assert_eq!(reloaded, module);
}
