//! Error kinds surfaced by the schema model, the emitters, and the job
//! orchestrator (spec §7).

/// Every fallible operation in the core returns this error type. There is no
/// `Success` variant — success is `Ok(())`.
#[derive(Debug, thiserror::Error)]
pub enum HarisError {
    /// A structural inconsistency was discovered during finalization: a
    /// cycle in a non-nullable embedding chain, a duplicate name, or a
    /// reference to a struct/enum that does not belong to the schema.
    #[error("schema error: {0}")]
    Schema(String),

    /// The job was misconfigured: an empty prefix, no enabled protocols, or
    /// some other caller-supplied inconsistency that finalization cannot
    /// catch because it isn't about the schema.
    #[error("job error: {0}")]
    Job(String),

    /// Writing an output artifact failed.
    #[error("I/O error writing {artifact}")]
    Io {
        artifact: String,
        #[source]
        source: std::io::Error,
    },

    /// A fragment could not be appended to the emit buffer because the
    /// backing allocation could not be grown.
    #[error("allocation failure while emitting {0}")]
    Mem(&'static str),

    /// Propagated unchanged from an external schema parser. The core never
    /// constructs this variant itself; it exists so that a parser built on
    /// top of this crate can fold its own errors into the same type.
    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, HarisError>;
