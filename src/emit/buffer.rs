//! The emit buffer: five ordered sequences of owned text fragments,
//! classified by destination file and role (spec §4.2).
//!
//! Every emitter is pure over `(schema, &mut EmitBuffer) -> Result<()>` —
//! there is no global or thread-local sink. Each `push_*` call transfers
//! ownership of the fragment into the buffer; callers must not retain a
//! reference to a string after pushing it.

use crate::error::{HarisError, Result};

fn try_push(v: &mut Vec<String>, fragment: String, what: &'static str) -> Result<()> {
    v.try_reserve(1).map_err(|_| HarisError::Mem(what))?;
    v.push(fragment);
    Ok(())
}

/// The structured accumulator every emitter appends into. Fragments within
/// a single stream are written out in the exact order they were pushed —
/// this is part of the output contract, since macros and types must
/// textually precede their uses.
#[derive(Debug, Default)]
pub struct EmitBuffer {
    /// Declarations file, head: includes, typedefs, macros, reflective
    /// types, struct layouts.
    header_top: Vec<String>,
    /// Declarations file, tail: prototypes of public functions, derived
    /// automatically from `public_functions` by `derive_prototypes`.
    header_bottom: Vec<String>,
    /// Implementation file: reflective tables, boilerplate.
    source: Vec<String>,
    /// Implementation file and (as derived prototypes) `header_bottom`:
    /// user-callable entry points. Each fragment is a complete function
    /// definition.
    public_functions: Vec<String>,
    /// Implementation file: file-local helpers.
    private_functions: Vec<String>,
}

impl EmitBuffer {
    pub fn new() -> Self {
        EmitBuffer::default()
    }

    pub fn push_header_top(&mut self, fragment: String) -> Result<()> {
        try_push(&mut self.header_top, fragment, "header_top")
    }

    pub fn push_header_bottom(&mut self, fragment: String) -> Result<()> {
        try_push(&mut self.header_bottom, fragment, "header_bottom")
    }

    pub fn push_source(&mut self, fragment: String) -> Result<()> {
        try_push(&mut self.source, fragment, "source")
    }

    pub fn push_public_function(&mut self, fragment: String) -> Result<()> {
        try_push(&mut self.public_functions, fragment, "public_functions")
    }

    pub fn push_private_function(&mut self, fragment: String) -> Result<()> {
        try_push(&mut self.private_functions, fragment, "private_functions")
    }

    /// Derive a prototype from every `public_functions` fragment and append
    /// it to `header_bottom`, in order (spec §4.2 contract, §4.6 step 2).
    /// A prototype is the function's signature — everything up to but not
    /// including the first `{` — followed by a `;` terminator.
    pub fn derive_prototypes(&mut self) -> Result<()> {
        for fragment in &self.public_functions {
            let prototype = derive_prototype(fragment)?;
            try_push(&mut self.header_bottom, prototype, "derived prototype")?;
        }
        Ok(())
    }

    /// Concatenate a stream into the final artifact text, in push order.
    fn join(stream: &[String]) -> String {
        let mut out = String::with_capacity(stream.iter().map(|s| s.len()).sum());
        for fragment in stream {
            out.push_str(fragment);
        }
        out
    }

    /// Declarations file: `header_top`, then derived prototypes
    /// (`header_bottom`), then a closing guard (spec §4.6 step 3). The
    /// guard itself is appended by the caller (the job orchestrator), which
    /// knows the output base name used to build the include guard macro.
    pub fn render_header_body(&self) -> String {
        let mut out = Self::join(&self.header_top);
        out.push_str(&Self::join(&self.header_bottom));
        out
    }

    /// Implementation file body: `source`, then `private_functions`
    /// (preceded by their static prototypes), then `public_functions`
    /// (spec §4.6 step 4). The `#include` of the declarations file is
    /// prepended by the caller.
    pub fn render_source_body(&self) -> Result<String> {
        let mut out = Self::join(&self.source);
        for fragment in &self.private_functions {
            let prototype = derive_prototype(fragment)?;
            out.push_str(&prototype);
        }
        out.push_str(&Self::join(&self.private_functions));
        out.push_str(&Self::join(&self.public_functions));
        Ok(out)
    }
}

fn derive_prototype(fragment: &str) -> Result<String> {
    let brace = fragment.find('{').ok_or_else(|| {
        HarisError::Job(format!(
            "public/private function fragment has no opening brace: {fragment:?}"
        ))
    })?;
    let signature = fragment[..brace].trim_end();
    Ok(format!("{signature};\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prototype_derivation_single_line() {
        let f = "HarisStatus Foo_to_buffer(Foo *s, unsigned char *buf)\n{\n  return HARIS_SUCCESS;\n}\n\n".to_string();
        let proto = derive_prototype(&f).unwrap();
        assert_eq!(proto, "HarisStatus Foo_to_buffer(Foo *s, unsigned char *buf);\n\n");
    }

    #[test]
    fn prototype_derivation_tolerates_multiline_signature_and_commas() {
        let f = "HarisStatus Foo_to_file(Foo *strct, FILE *f, \n                          haris_uint32_t *out_sz)\n{\n  return _public_to_file(strct, 0, f, out_sz);\n}\n\n".to_string();
        let proto = derive_prototype(&f).unwrap();
        assert!(proto.starts_with("HarisStatus Foo_to_file(Foo *strct, FILE *f, \n                          haris_uint32_t *out_sz);"));
    }

    #[test]
    fn prototype_derivation_requires_brace() {
        let f = "not a function".to_string();
        assert!(derive_prototype(&f).is_err());
    }

    #[test]
    fn streams_render_in_push_order() {
        let mut buf = EmitBuffer::new();
        buf.push_header_top("a".into()).unwrap();
        buf.push_header_top("b".into()).unwrap();
        assert_eq!(buf.render_header_body(), "ab");
    }

    #[test]
    fn every_public_function_yields_exactly_one_prototype() {
        let mut buf = EmitBuffer::new();
        buf.push_public_function("void f(void)\n{\n}\n\n".into()).unwrap();
        buf.push_public_function("void g(int x)\n{\n}\n\n".into()).unwrap();
        buf.derive_prototypes().unwrap();
        assert_eq!(buf.header_bottom.len(), 2);
        assert_eq!(buf.header_bottom[0], "void f(void);\n\n");
        assert_eq!(buf.header_bottom[1], "void g(int x);\n\n");
    }
}
