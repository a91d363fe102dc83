//! CLI entry point: parses the minimal built-in schema description format,
//! builds a `ParsedSchema`, and drives one generation job end to end.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use harisgen::emit::protocol::EnabledProtocols;
use harisgen::job::{run_job, JobConfig};
use harisgen::schema::{EnumRef, ParsedSchema, ScalarType, StructRef};

/// Generate a Haris runtime library (declarations + implementation files)
/// from a schema description.
#[derive(Parser, Debug)]
#[command(name = "harisgen", about = "Haris protocol code generator")]
struct Cli {
    /// Path to a schema file in the built-in line-oriented format.
    schema: PathBuf,

    /// Prefix prepended to every generated identifier.
    #[arg(long)]
    prefix: String,

    /// Output base name; writes `<output>.h` and `<output>.c`.
    #[arg(long)]
    output: PathBuf,

    /// Emit the in-memory buffer transport.
    #[arg(long)]
    buffer: bool,

    /// Emit the file-stream transport.
    #[arg(long)]
    file: bool,

    /// Emit the POSIX file-descriptor transport.
    #[arg(long)]
    fd: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let protocols = EnabledProtocols {
        buffer: cli.buffer,
        file: cli.file,
        fd: cli.fd,
    };

    let text = fs::read_to_string(&cli.schema)
        .with_context(|| format!("reading schema file {}", cli.schema.display()))?;
    let mut schema = parse_schema(&text)?;
    schema.finalize_schema().context("finalizing schema")?;

    let config = JobConfig::new(cli.prefix, cli.output, protocols).context("building job config")?;
    run_job(&schema, &config).context("running generation job")?;

    Ok(())
}

/// A struct or enum heading line: `struct Name` / `enum Name`.
enum Heading {
    Struct(String),
    Enum(String),
}

fn classify_heading(line: &str) -> Option<Heading> {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix("struct ") {
        Some(Heading::Struct(rest.trim().to_string()))
    } else if let Some(rest) = line.strip_prefix("enum ") {
        Some(Heading::Enum(rest.trim().to_string()))
    } else {
        None
    }
}

fn parse_scalar_type(name: &str, enums: &HashMap<String, EnumRef>) -> Result<ScalarType> {
    Ok(match name {
        "u8" => ScalarType::Uint8,
        "i8" => ScalarType::Int8,
        "u16" => ScalarType::Uint16,
        "i16" => ScalarType::Int16,
        "u32" => ScalarType::Uint32,
        "i32" => ScalarType::Int32,
        "u64" => ScalarType::Uint64,
        "i64" => ScalarType::Int64,
        "f32" => ScalarType::Float32,
        "f64" => ScalarType::Float64,
        "bool" => ScalarType::Bool,
        other => {
            let e = enums
                .get(other)
                .with_context(|| format!("unknown scalar or enum type {other:?}"))?;
            ScalarType::Enum(*e)
        }
    })
}

/// Parse the CLI's built-in schema description format (spec §D) into a
/// (not-yet-finalized) `ParsedSchema`. Two passes: first register every
/// struct/enum heading in declaration order so field lines can reference
/// types declared later in the file, then fill in each body.
fn parse_schema(text: &str) -> Result<ParsedSchema> {
    let mut schema = ParsedSchema::new();
    let mut structs: HashMap<String, StructRef> = HashMap::new();
    let mut enums: HashMap<String, EnumRef> = HashMap::new();

    for line in text.lines() {
        match classify_heading(line) {
            Some(Heading::Struct(name)) => {
                if schema.struct_name_collides(&name) {
                    bail!("duplicate struct name {name:?}");
                }
                let r = schema.new_struct(name.clone())?;
                structs.insert(name, r);
            }
            Some(Heading::Enum(name)) => {
                if schema.enum_name_collides(&name) {
                    bail!("duplicate enum name {name:?}");
                }
                let r = schema.new_enum(name.clone())?;
                enums.insert(name, r);
            }
            None => {}
        }
    }

    let mut current: Option<Heading> = None;
    for raw_line in text.lines() {
        if raw_line.trim().is_empty() {
            continue;
        }
        if let Some(heading) = classify_heading(raw_line) {
            current = Some(heading);
            continue;
        }
        let line = raw_line.trim();
        let mut words = line.split_whitespace();
        let kind = words
            .next()
            .with_context(|| format!("empty field line: {raw_line:?}"))?;
        let rest: Vec<&str> = words.collect();

        match current.as_ref() {
            Some(Heading::Enum(name)) => {
                let e = *enums.get(name).expect("registered in first pass");
                let value = kind;
                schema.add_enumerated_value(e, value)?;
            }
            Some(Heading::Struct(name)) => {
                let s = *structs.get(name).expect("registered in first pass");
                parse_struct_field(&mut schema, s, kind, &rest, &structs, &enums)?;
            }
            None => bail!("field line {raw_line:?} outside any struct/enum body"),
        }
    }

    Ok(schema)
}

fn parse_struct_field(
    schema: &mut ParsedSchema,
    s: StructRef,
    kind: &str,
    rest: &[&str],
    structs: &HashMap<String, StructRef>,
    enums: &HashMap<String, EnumRef>,
) -> Result<()> {
    let nullable = rest.last().map(|w| *w == "[null]").unwrap_or(false);

    match kind {
        "scalar" => {
            let (name, ty) = split_name_type(rest)?;
            schema.add_scalar_field(s, name, parse_scalar_type(ty, enums)?)?;
        }
        "enum" => {
            let (name, ty) = split_name_type(rest)?;
            let e = enums
                .get(ty)
                .with_context(|| format!("unknown enum type {ty:?}"))?;
            schema.add_enum_field(s, name, *e)?;
        }
        "text" => {
            let name = rest.first().with_context(|| "text field missing a name")?;
            schema.add_text_field(s, name.trim_end_matches(':'), nullable)?;
        }
        "struct" => {
            let (name, ty) = split_name_type(rest)?;
            let target = structs
                .get(ty)
                .with_context(|| format!("unknown struct type {ty:?}"))?;
            schema.add_struct_field(s, name, nullable, *target)?;
        }
        "scalar_list" => {
            let (name, ty) = split_name_type(rest)?;
            schema.add_list_of_scalars_field(s, name, nullable, parse_scalar_type(ty, enums)?)?;
        }
        "struct_list" => {
            let (name, ty) = split_name_type(rest)?;
            let target = structs
                .get(ty)
                .with_context(|| format!("unknown struct type {ty:?}"))?;
            schema.add_list_of_structs_field(s, name, nullable, *target)?;
        }
        other => bail!("unrecognized field kind {other:?}"),
    }
    Ok(())
}

/// `field_name: TypeName` → `("field_name", "TypeName")`, tolerating a
/// trailing `[null]` marker already stripped by the caller.
fn split_name_type<'a>(rest: &[&'a str]) -> Result<(&'a str, &'a str)> {
    let joined_name = rest.first().with_context(|| "field line missing a name")?;
    let name = joined_name.trim_end_matches(':');
    let ty = rest
        .get(1)
        .with_context(|| format!("field {name:?} missing a type"))?;
    Ok((name, ty))
}
