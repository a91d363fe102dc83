//! A code generator for the Haris binary serialization protocol: given a
//! schema of structs and enums, emits a declarations file and an
//! implementation file forming a C runtime library for constructing,
//! destroying, and transporting Haris messages.

pub mod emit;
pub mod error;
pub mod job;
pub mod schema;
