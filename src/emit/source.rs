//! Source emitter: writes the core reflective tables into the
//! implementation file (spec §4.4).
//!
//! `haris_lib_structures` is indexed by `schema_index`; each entry's
//! `scalars` and `children` arrays are themselves static arrays emitted
//! ahead of the table, since a struct-kind child's `struct_element` takes
//! the address of another entry in the very array being built.

use std::fmt::Write as _;

use crate::emit::EmitBuffer;
use crate::error::Result;
use crate::schema::{ChildKind, ParsedSchema};

pub fn write_source_tables(schema: &ParsedSchema, prefix: &str, buf: &mut EmitBuffer) -> Result<()> {
    buf.push_source("extern const HarisStructureInfo haris_lib_structures[];\n\n".to_string())?;

    for strct in &schema.structs {
        write_scalars_array(strct, buf)?;
        write_children_array(strct, buf)?;
    }

    write_structures_table(schema, prefix, buf)?;
    Ok(())
}

fn write_scalars_array(strct: &crate::schema::ParsedStruct, buf: &mut EmitBuffer) -> Result<()> {
    if strct.scalars.is_empty() {
        return Ok(());
    }
    let mut out = String::new();
    writeln!(
        out,
        "static const HarisScalar _{}_lib_scalars[] = {{",
        strct.name
    )
    .unwrap();
    for field in strct.scalars_by_size() {
        writeln!(out, "  {{ {}, {} }},", field.offset, field.ty.reflective_tag()).unwrap();
    }
    writeln!(out, "}};\n").unwrap();
    buf.push_source(out)
}

fn write_children_array(strct: &crate::schema::ParsedStruct, buf: &mut EmitBuffer) -> Result<()> {
    if strct.children.is_empty() {
        return Ok(());
    }
    let mut out = String::new();
    writeln!(
        out,
        "static const HarisChild _{}_lib_children[] = {{",
        strct.name
    )
    .unwrap();
    for (i, child) in strct.children.iter().enumerate() {
        let offset = strct.scalars.iter().map(|f| f.ty.size_of()).sum::<usize>() + i;
        let nullable = if child.nullable { 1 } else { 0 };
        let (scalar_element, struct_element, child_type) = match &child.kind {
            ChildKind::Text => ("HARIS_SCALAR_BLANK".to_string(), "NULL".to_string(), "HARIS_CHILD_TEXT"),
            ChildKind::ScalarList(ty) => (ty.reflective_tag().to_string(), "NULL".to_string(), "HARIS_CHILD_SCALAR_LIST"),
            ChildKind::StructList(r) => (
                "HARIS_SCALAR_BLANK".to_string(),
                format!("&haris_lib_structures[{}]", r.0),
                "HARIS_CHILD_STRUCT_LIST",
            ),
            ChildKind::Struct(r) => (
                "HARIS_SCALAR_BLANK".to_string(),
                format!("&haris_lib_structures[{}]", r.0),
                "HARIS_CHILD_STRUCT",
            ),
        };
        writeln!(
            out,
            "  {{ {offset}, {nullable}, {scalar_element}, {struct_element}, {child_type} }},"
        )
        .unwrap();
    }
    writeln!(out, "}};\n").unwrap();
    buf.push_source(out)
}

fn write_structures_table(schema: &ParsedSchema, prefix: &str, buf: &mut EmitBuffer) -> Result<()> {
    let mut out = String::new();
    writeln!(
        out,
        "const HarisStructureInfo haris_lib_structures[{}] = {{",
        schema.structs.len()
    )
    .unwrap();
    for strct in &schema.structs {
        let scalars_ptr = if strct.scalars.is_empty() {
            "NULL".to_string()
        } else {
            format!("_{}_lib_scalars", strct.name)
        };
        let children_ptr = if strct.children.is_empty() {
            "NULL".to_string()
        } else {
            format!("_{}_lib_children", strct.name)
        };
        writeln!(
            out,
            "  {{ {}, {}, {}, {}, {}, sizeof({prefix}{}) }},",
            strct.scalars.len(),
            scalars_ptr,
            strct.children.len(),
            children_ptr,
            strct.meta.body_size,
            strct.name,
        )
        .unwrap();
    }
    writeln!(out, "}};\n").unwrap();
    buf.push_source(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ParsedSchema, ScalarType};

    #[test]
    fn reflective_table_scenario_f() {
        let mut schema = ParsedSchema::new();
        let a = schema.new_struct("A").unwrap();
        schema.add_scalar_field(a, "x", ScalarType::Uint32).unwrap();
        let b = schema.new_struct("B").unwrap();
        schema.add_struct_field(b, "a", false, a).unwrap();
        schema.finalize_schema().unwrap();

        let mut buf = EmitBuffer::new();
        write_source_tables(&schema, "", &mut buf).unwrap();
        let rendered = buf.render_source_body().unwrap();

        assert!(rendered.contains("_A_lib_scalars[] = {"));
        assert!(rendered.contains("{ 0, HARIS_SCALAR_UINT32 },"));
        assert!(rendered.contains("_B_lib_children[] = {"));
        assert!(rendered.contains("&haris_lib_structures[0]"));
        assert!(rendered.contains("HARIS_CHILD_STRUCT }"));
        assert!(rendered.contains("haris_lib_structures[2]"));
        assert!(rendered.contains("1, _A_lib_scalars, 0, NULL, 4, sizeof(A)"));
        assert!(rendered.contains("0, NULL, 1, _B_lib_children, 1, sizeof(B)"));
    }
}
