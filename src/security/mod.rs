//! Security pipeline (`spec.md` §4.5): encryption (applied while the document
//! is still being assembled, since the serializer encrypts each stream as it
//! is emitted), digital signing (a byte-level patch applied to the finished
//! file), and redaction (a mutator-style parse/edit/rewrite pass).

pub(crate) mod encryption;
pub(crate) mod redaction;
pub(crate) mod signature;

pub(crate) use redaction::tokenize;
pub use redaction::{apply as redact, RedactionMode, RedactionRequest};
