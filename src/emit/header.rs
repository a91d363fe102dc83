//! Header emitter: writes the declarations file (spec §4.3).
//!
//! Boilerplate, limits and macros, reflective type declarations, and
//! per-struct layouts are pushed into `EmitBuffer::header_top` in the order
//! this module's functions run, since macros and types must textually
//! precede their uses in the generated C.

use std::fmt::Write as _;

use crate::emit::EmitBuffer;
use crate::error::Result;
use crate::schema::{ChildKind, ParsedSchema, ParsedStruct, ScalarType};

pub fn write_header_file(schema: &ParsedSchema, prefix: &str, buf: &mut EmitBuffer) -> Result<()> {
    write_header_boilerplate(buf)?;
    write_header_macros(schema, prefix, buf)?;
    write_header_structures(schema, prefix, buf)?;
    Ok(())
}

fn write_header_boilerplate(buf: &mut EmitBuffer) -> Result<()> {
    buf.push_header_top(
        "#include <stdio.h>\n\
#include <stdlib.h>\n\
#include <stddef.h>\n\
#include <string.h>\n\
#include <stdint.h>\n\n"
            .to_string(),
    )?;
    buf.push_header_top(
        "typedef uint_fast8_t    haris_uint8_t;\n\
typedef int_fast8_t     haris_int8_t;\n\
typedef uint_fast16_t   haris_uint16_t;\n\
typedef int_fast16_t    haris_int16_t;\n\
typedef uint_fast32_t   haris_uint32_t;\n\
typedef int_fast32_t    haris_int32_t;\n\
typedef uint_fast64_t   haris_uint64_t;\n\
typedef int_fast64_t    haris_int64_t;\n\n\
typedef float           haris_float32;\n\
typedef double          haris_float64;\n\n\
typedef enum {\n\
  HARIS_SUCCESS, HARIS_STRUCTURE_ERROR, HARIS_DEPTH_ERROR, HARIS_SIZE_ERROR,\n\
  HARIS_INPUT_ERROR, HARIS_MEM_ERROR\n\
} HarisStatus;\n\n\
typedef HarisStatus (*HarisStreamReader)(void *, haris_uint32_t,\n\
                                         const unsigned char **);\n\n\
typedef HarisStatus (*HarisStreamWriter)(void *, const unsigned char *,\n\
                                         haris_uint32_t);\n\n"
            .to_string(),
    )?;
    Ok(())
}

fn write_header_macros(schema: &ParsedSchema, prefix: &str, buf: &mut EmitBuffer) -> Result<()> {
    buf.push_header_top(
        "#define HARIS_DEPTH_LIMIT 64\n\
#define HARIS_MESSAGE_SIZE_LIMIT 1000000000\n\n\
#define HARIS_FLOAT32_SIGBITS 23\n\
#define HARIS_FLOAT32_BIAS    127\n\
#define HARIS_FLOAT64_SIGBITS 52\n\
#define HARIS_FLOAT64_BIAS    1023\n\n\
#define HARIS_DEALLOC_FACTOR 0.6\n\n\
#define HARIS_MALLOC(n) malloc(n)\n\
#define HARIS_REALLOC(p, n) realloc((p), (n))\n\
#define HARIS_FREE(p) free(p)\n\n\
#define HARIS_ASSERT(cond, err) if (!(cond)) return HARIS_ ## err ## _ERROR\n\n"
            .to_string(),
    )?;

    for strct in &schema.structs {
        for child in &strct.children {
            let mut out = String::new();
            let strct_name = &strct.name;
            let child_name = &child.name;
            if child.nullable {
                writeln!(
                    out,
                    "#define {prefix}{strct_name}_null_{child_name}(X) ((int)((X)->_{child_name}_info.null))"
                )
                .unwrap();
                writeln!(
                    out,
                    "#define {prefix}{strct_name}_nullify_{child_name}(X) ((X)->_{child_name}_info.null = 1)"
                )
                .unwrap();
            }
            if !matches!(child.kind, ChildKind::Struct(_)) {
                writeln!(
                    out,
                    "#define {prefix}{strct_name}_len_{child_name}(X) \
((haris_uint32_t)((X)->_{child_name}_info.len))"
                )
                .unwrap();
            }
            write!(out, "#define {prefix}{strct_name}_get_{child_name}(X) ").unwrap();
            match &child.kind {
                ChildKind::Text => write!(out, "((char*)").unwrap(),
                ChildKind::ScalarList(ty) => write!(out, "(({}*)", ty.c_type_name()).unwrap(),
                ChildKind::StructList(r) => {
                    write!(out, "(({prefix}{}*)", schema.structs[r.0].name).unwrap()
                }
                ChildKind::Struct(r) => {
                    write!(out, "(({prefix}{}*)", schema.structs[r.0].name).unwrap()
                }
            }
            writeln!(out, "((X)->_{child_name}_info.ptr))\n").unwrap();
            buf.push_header_top(out)?;
        }
    }

    for enm in &schema.enums {
        let mut out = String::new();
        writeln!(out, "/* enum {} */", enm.name).unwrap();
        for (i, value) in enm.values.iter().enumerate() {
            writeln!(out, "#define {prefix}{}_{value} {i}", enm.name).unwrap();
        }
        out.push('\n');
        buf.push_header_top(out)?;
    }

    Ok(())
}

fn write_reflective_structures(buf: &mut EmitBuffer) -> Result<()> {
    buf.push_header_top(
        "typedef enum {\n\
  HARIS_SCALAR_UINT8, HARIS_SCALAR_INT8, HARIS_SCALAR_UINT16,\n\
  HARIS_SCALAR_INT16, HARIS_SCALAR_UINT32, HARIS_SCALAR_INT32,\n\
  HARIS_SCALAR_UINT64, HARIS_SCALAR_INT64, HARIS_SCALAR_FLOAT32,\n\
  HARIS_SCALAR_FLOAT64, HARIS_SCALAR_BLANK\n\
} HarisScalarType;\n\n"
            .to_string(),
    )?;
    buf.push_header_top(
        "typedef enum {\n\
  HARIS_CHILD_TEXT, HARIS_CHILD_SCALAR_LIST, HARIS_CHILD_STRUCT_LIST,\n\
  HARIS_CHILD_STRUCT\n\
} HarisChildType;\n\n"
            .to_string(),
    )?;
    buf.push_header_top(
        "typedef struct {\n\
  void *         ptr;\n\
  haris_uint32_t len;\n\
  haris_uint32_t alloc;\n\
  char           null;\n\
} HarisListInfo;\n\n"
            .to_string(),
    )?;
    buf.push_header_top(
        "typedef struct {\n\
  void *ptr;\n\
  char null;\n\
} HarisSubstructInfo;\n\n"
            .to_string(),
    )?;
    buf.push_header_top("typedef struct HarisStructureInfo_ HarisStructureInfo;\n\n".to_string())?;
    buf.push_header_top(
        "typedef struct {\n\
  size_t offset;\n\
  HarisScalarType type;\n\
} HarisScalar;\n\n"
            .to_string(),
    )?;
    buf.push_header_top(
        "typedef struct {\n\
  size_t offset;\n\
  int nullable;\n\
  HarisScalarType scalar_element;\n\
  const HarisStructureInfo *struct_element;\n\
  HarisChildType child_type;\n\
} HarisChild;\n\n"
            .to_string(),
    )?;
    buf.push_header_top(
        "struct HarisStructureInfo_ {\n\
  int num_scalars;\n\
  const HarisScalar *scalars;\n\
  int num_children;\n\
  const HarisChild *children;\n\
  int body_size;\n\
  size_t size_of;\n\
};\n\n"
            .to_string(),
    )?;
    Ok(())
}

fn write_header_structures(schema: &ParsedSchema, prefix: &str, buf: &mut EmitBuffer) -> Result<()> {
    write_reflective_structures(buf)?;
    for strct in &schema.structs {
        write_structure_definition(prefix, strct, buf)?;
    }
    Ok(())
}

fn write_structure_definition(
    prefix: &str,
    strct: &ParsedStruct,
    buf: &mut EmitBuffer,
) -> Result<()> {
    let mut out = String::new();
    writeln!(out, "typedef struct {{").unwrap();
    for child in &strct.children {
        write_child_field(child, &mut out);
    }
    for field in strct.scalars_by_size() {
        writeln!(out, "  {} {};", field.ty.c_type_name(), field.name).unwrap();
    }
    writeln!(out, "}} {prefix}{};\n", strct.name).unwrap();
    buf.push_header_top(out)
}

fn write_child_field(child: &crate::schema::ChildField, out: &mut String) {
    match &child.kind {
        ChildKind::Text | ChildKind::ScalarList(_) | ChildKind::StructList(_) => {
            writeln!(out, "  HarisListInfo _{}_info;", child.name).unwrap();
        }
        ChildKind::Struct(_) => {
            writeln!(out, "  HarisSubstructInfo _{}_info;", child.name).unwrap();
        }
    }
}
