//! Protocol emitters: one per transport, each contributing a transport
//! state record, private stream adapters, and public per-struct entry
//! points (spec §4.5). The file-stream transport is the exemplar spec.md
//! writes out in prose; buffer and fd generalize the same pattern, as §2's
//! component table and §6's CLI surface both name all three.

pub mod buffer;
pub mod fd;
pub mod file;

pub use buffer::BufferProtocol;
pub use fd::FdProtocol;
pub use file::FileProtocol;

use crate::emit::EmitBuffer;
use crate::error::Result;
use crate::schema::ParsedSchema;

/// Which transports a job should emit code for (spec §4.6, `CJobProtocols`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnabledProtocols {
    pub buffer: bool,
    pub file: bool,
    pub fd: bool,
}

impl EnabledProtocols {
    pub fn none() -> Self {
        EnabledProtocols::default()
    }

    pub fn any(&self) -> bool {
        self.buffer || self.file || self.fd
    }
}

/// One fragment contributed to the transport's header-level declarations
/// (state record), one list of private helper function fragments, and a
/// pair of public function fragments per struct.
pub trait Protocol {
    fn transport_state_record(&self) -> String;
    fn private_functions(&self) -> Vec<String>;
    fn public_functions(&self, prefix: &str, strct: &crate::schema::ParsedStruct) -> Vec<String>;
}

/// Write a single protocol's declarations file record, private helpers, and
/// per-struct public entry points into the emit buffer, in the order the
/// job orchestrator's deterministic sequence (buffer, file, fd) calls this
/// for each enabled protocol.
pub fn write_protocol_funcs(
    protocol: &dyn Protocol,
    schema: &ParsedSchema,
    prefix: &str,
    buf: &mut EmitBuffer,
) -> Result<()> {
    buf.push_header_top(protocol.transport_state_record())?;
    for fragment in protocol.private_functions() {
        buf.push_private_function(fragment)?;
    }
    for strct in &schema.structs {
        for fragment in protocol.public_functions(prefix, strct) {
            buf.push_public_function(fragment)?;
        }
    }
    Ok(())
}
