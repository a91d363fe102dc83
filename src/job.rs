//! Job Orchestrator: sequences the emitters and drains the emit buffer into
//! the two output artifacts (spec §4.6).

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::emit::protocol::{self, BufferProtocol, EnabledProtocols, FdProtocol, FileProtocol};
use crate::emit::{header, source, EmitBuffer};
use crate::error::{HarisError, Result};
use crate::schema::ParsedSchema;

/// Everything the orchestrator needs to run one job: a finalized schema, the
/// symbol prefix every generated identifier carries, the output base name
/// (declarations file is `<output>.h`, implementation file is `<output>.c`),
/// and which transports to emit protocol code for (spec §4.6, `CJobConfig`).
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub prefix: String,
    pub output: PathBuf,
    pub protocols: EnabledProtocols,
}

impl JobConfig {
    pub fn new(prefix: impl Into<String>, output: impl Into<PathBuf>, protocols: EnabledProtocols) -> Result<Self> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(HarisError::Job("prefix must be non-empty".into()));
        }
        if !protocols.any() {
            return Err(HarisError::Job("at least one transport protocol must be enabled".into()));
        }
        Ok(JobConfig {
            prefix,
            output: output.into(),
            protocols,
        })
    }

    fn header_path(&self) -> PathBuf {
        self.output.with_extension("h")
    }

    fn source_path(&self) -> PathBuf {
        self.output.with_extension("c")
    }

    fn include_guard(&self) -> String {
        let stem = self
            .output
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("HARIS_GENERATED");
        let mut guard = String::with_capacity(stem.len() + 8);
        guard.push_str("HARIS_");
        for ch in stem.chars() {
            if ch.is_ascii_alphanumeric() {
                guard.push(ch.to_ascii_uppercase());
            } else {
                guard.push('_');
            }
        }
        guard.push_str("_H");
        guard
    }
}

/// Run a single job to completion: header emitter, then source emitter, then
/// each enabled protocol emitter in the deterministic order (buffer, file,
/// fd), then drain the buffer to disk. The schema must already be finalized;
/// any emitter failure short-circuits before either file is written (spec
/// §4.6, "Failures short-circuit the pipeline").
#[instrument(skip(schema, config), fields(prefix = %config.prefix, output = %config.output.display()))]
pub fn run_job(schema: &ParsedSchema, config: &JobConfig) -> Result<()> {
    if !schema.is_finalized() {
        return Err(HarisError::Job(
            "schema must be finalized before a job can run".into(),
        ));
    }

    let mut buf = EmitBuffer::new();

    info!("emitting declarations header");
    header::write_header_file(schema, &config.prefix, &mut buf)?;

    info!("emitting reflective source tables");
    source::write_source_tables(schema, &config.prefix, &mut buf)?;

    if config.protocols.buffer {
        info!("emitting buffer protocol");
        protocol::write_protocol_funcs(&BufferProtocol, schema, &config.prefix, &mut buf)?;
    }
    if config.protocols.file {
        info!("emitting file protocol");
        protocol::write_protocol_funcs(&FileProtocol, schema, &config.prefix, &mut buf)?;
    }
    if config.protocols.fd {
        info!("emitting fd protocol");
        protocol::write_protocol_funcs(&FdProtocol, schema, &config.prefix, &mut buf)?;
    }

    buf.derive_prototypes()?;

    write_artifacts(config, &buf)?;
    info!("job complete");
    Ok(())
}

fn write_artifacts(config: &JobConfig, buf: &EmitBuffer) -> Result<()> {
    let guard = config.include_guard();
    let header_path = config.header_path();
    let source_path = config.source_path();

    let mut header_text = String::new();
    header_text.push_str(&format!("#ifndef {guard}\n#define {guard}\n\n"));
    header_text.push_str(&buf.render_header_body());
    header_text.push_str(&format!("\n#endif /* {guard} */\n"));

    let header_name = header_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("generated.h")
        .to_string();
    let mut source_text = String::new();
    source_text.push_str(&format!("#include \"{header_name}\"\n\n"));
    source_text.push_str(&buf.render_source_body()?);

    write_file(&header_path, &header_text)?;
    write_file(&source_path, &source_text)?;
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|source| HarisError::Io {
        artifact: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ScalarType;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn job_rejects_empty_prefix() {
        let protocols = EnabledProtocols {
            buffer: true,
            ..EnabledProtocols::none()
        };
        assert!(JobConfig::new("", "out", protocols).is_err());
    }

    #[test]
    fn job_rejects_no_protocols() {
        assert!(JobConfig::new("p_", "out", EnabledProtocols::none()).is_err());
    }

    #[test]
    fn job_rejects_unfinalized_schema() {
        let schema = ParsedSchema::new();
        let protocols = EnabledProtocols {
            buffer: true,
            ..EnabledProtocols::none()
        };
        let dir = TempDir::new().unwrap();
        let config = JobConfig::new("p_", dir.path().join("out"), protocols).unwrap();
        assert!(run_job(&schema, &config).is_err());
    }

    #[test]
    fn job_writes_both_artifacts_for_scenario_f() {
        let mut schema = ParsedSchema::new();
        let a = schema.new_struct("A").unwrap();
        schema.add_scalar_field(a, "x", ScalarType::Uint32).unwrap();
        let b = schema.new_struct("B").unwrap();
        schema.add_struct_field(b, "a", false, a).unwrap();
        schema.finalize_schema().unwrap();

        let protocols = EnabledProtocols {
            buffer: true,
            file: true,
            fd: false,
        };
        let dir = TempDir::new().unwrap();
        let config = JobConfig::new("p_", dir.path().join("ab"), protocols).unwrap();
        run_job(&schema, &config).unwrap();

        let header = fs::read_to_string(config.header_path()).unwrap();
        let source = fs::read_to_string(config.source_path()).unwrap();

        assert!(header.contains("#ifndef HARIS_AB_H"));
        assert!(header.contains("p_A_to_buffer"));
        assert!(header.contains("p_B_to_file"));
        assert!(source.contains("#include \"ab.h\""));
        assert!(source.contains("haris_lib_structures[2]"));
    }
}
