//! End-to-end scenario tests driving the full pipeline (schema → job →
//! artifacts) rather than a single emitter in isolation.

use harisgen::emit::protocol::EnabledProtocols;
use harisgen::job::JobConfig;
use harisgen::schema::{ParsedSchema, ScalarType};

fn build(base: &std::path::Path, protocols: EnabledProtocols) -> (String, String) {
    let mut schema = ParsedSchema::new();

    // Scenario A: scalar reordering and offsets.
    let foo = schema.new_struct("Foo").unwrap();
    schema.add_scalar_field(foo, "a", ScalarType::Uint8).unwrap();
    schema.add_scalar_field(foo, "b", ScalarType::Uint64).unwrap();
    schema.add_scalar_field(foo, "c", ScalarType::Uint16).unwrap();
    schema.add_scalar_field(foo, "d", ScalarType::Int8).unwrap();

    // Scenario B: nullable struct child.
    let bar = schema.new_struct("Bar").unwrap();
    schema.add_struct_field(bar, "payload", true, foo).unwrap();

    // Scenario C: text child.
    let msg = schema.new_struct("Msg").unwrap();
    schema.add_text_field(msg, "body", false).unwrap();

    // Scenario D: enum values.
    let color = schema.new_enum("Color").unwrap();
    schema.add_enumerated_value(color, "RED").unwrap();
    schema.add_enumerated_value(color, "GREEN").unwrap();
    schema.add_enumerated_value(color, "BLUE").unwrap();

    // Scenario E: self-referential struct.
    let node = schema.new_struct("Node").unwrap();
    schema.add_struct_field(node, "next", true, node).unwrap();

    schema.finalize_schema().unwrap();

    let config = JobConfig::new("app_", base, protocols).unwrap();
    harisgen::job::run_job(&schema, &config).unwrap();

    let header = std::fs::read_to_string(config_header(&config)).unwrap();
    let source = std::fs::read_to_string(config_source(&config)).unwrap();
    (header, source)
}

fn config_header(config: &JobConfig) -> std::path::PathBuf {
    config.output.with_extension("h")
}

fn config_source(config: &JobConfig) -> std::path::PathBuf {
    config.output.with_extension("c")
}

#[test]
fn scenario_a_scalar_ordering_survives_full_pipeline() {
    let dir = tempfile::TempDir::new().unwrap();
    let (header, _source) = build(&dir.path().join("proto"), EnabledProtocols {
        buffer: true,
        ..EnabledProtocols::none()
    });
    let struct_start = header.find("typedef struct {").unwrap();
    let b_pos = header[struct_start..].find("haris_uint64_t b;").unwrap();
    let c_pos = header[struct_start..].find("haris_uint16_t c;").unwrap();
    let a_pos = header[struct_start..].find("haris_uint8_t a;").unwrap();
    let d_pos = header[struct_start..].find("haris_int8_t d;").unwrap();
    assert!(b_pos < c_pos && c_pos < a_pos && a_pos < d_pos);
}

#[test]
fn scenario_b_nullable_child_macros() {
    let dir = tempfile::TempDir::new().unwrap();
    let (header, _source) = build(&dir.path().join("proto"), EnabledProtocols {
        buffer: true,
        ..EnabledProtocols::none()
    });
    assert!(header.contains("#define app_Bar_null_payload(X)"));
    assert!(header.contains("#define app_Bar_nullify_payload(X)"));
    assert!(header.contains("#define app_Bar_get_payload(X)"));
    assert!(!header.contains("app_Bar_len_payload"));
}

#[test]
fn scenario_c_text_child_macros() {
    let dir = tempfile::TempDir::new().unwrap();
    let (header, _source) = build(&dir.path().join("proto"), EnabledProtocols {
        buffer: true,
        ..EnabledProtocols::none()
    });
    assert!(header.contains("#define app_Msg_len_body(X)"));
    assert!(header.contains("((char*)((X)->_body_info.ptr))"));
    assert!(!header.contains("app_Msg_null_body"));
}

#[test]
fn scenario_d_enum_value_numbering() {
    let dir = tempfile::TempDir::new().unwrap();
    let (header, _source) = build(&dir.path().join("proto"), EnabledProtocols {
        buffer: true,
        ..EnabledProtocols::none()
    });
    assert!(header.contains("#define app_Color_RED 0"));
    assert!(header.contains("#define app_Color_GREEN 1"));
    assert!(header.contains("#define app_Color_BLUE 2"));
}

#[test]
fn scenario_e_recursive_struct_unbounded() {
    let dir = tempfile::TempDir::new().unwrap();
    let (_header, source) = build(&dir.path().join("proto"), EnabledProtocols {
        buffer: true,
        ..EnabledProtocols::none()
    });
    // Node has one nullable struct child and no scalars: body_size 1,
    // reflective table row carries that body_size regardless of the
    // struct's own max_size being unbounded.
    assert!(source.contains("0, NULL, 1, _Node_lib_children, 1, sizeof(app_Node)"));
}

#[test]
fn every_enabled_protocol_contributes_public_entry_points_and_prototypes() {
    let dir = tempfile::TempDir::new().unwrap();
    let (header, source) = build(
        &dir.path().join("proto"),
        EnabledProtocols {
            buffer: true,
            file: true,
            fd: true,
        },
    );

    for transport in ["buffer", "file", "fd"] {
        let def = format!("app_Foo_to_{transport}(");
        assert!(source.contains(&def), "missing {def} definition");
        assert!(header.contains(&format!("app_Foo_to_{transport}(")), "missing {transport} prototype");
    }
    assert!(header.contains("#include <unistd.h>"));
}

#[test]
fn job_rejects_misconfiguration_before_touching_disk() {
    let dir = tempfile::TempDir::new().unwrap();
    let base = dir.path().join("proto");
    assert!(JobConfig::new("", base.clone(), EnabledProtocols { buffer: true, ..EnabledProtocols::none() }).is_err());
    assert!(JobConfig::new("app_", base.clone(), EnabledProtocols::none()).is_err());
    assert!(!base.with_extension("h").exists());
    assert!(!base.with_extension("c").exists());
}
