//! Crate-wide error and warning types.
//!
//! Fatal conditions are returned as `Err(Error)` and abort the call; non-fatal
//! conditions are pushed onto a request-local `Vec<Warning>` (see `diagnostics.rs`)
//! and the call still produces output bytes.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A condition that aborts the current generation, mutation, or security pass.
#[derive(Debug, Error)]
pub enum Error {
    #[error("template is invalid at {field_path}: {message}")]
    TemplateInvalid { field_path: String, message: String },

    #[error("custom font could not be parsed: {0}")]
    FontParseError(#[from] crate::fonts::FontError),

    #[error("mutator input lacks a valid xref/trailer: {0}")]
    PdfMalformed(String),

    #[error("owner password is required in security mode")]
    EncryptionKeyError,

    #[error("signature certificate or key could not be used: {0}")]
    SignatureCertError(String),

    #[error("requested page {page} is out of range (document has {page_count} pages)")]
    PageOutOfRange { page: usize, page_count: usize },

    #[error("object id {0} was emitted twice")]
    InvalidObjectId(u32),

    #[error("failed to write output: {0}")]
    IoWriteError(#[from] io::Error),

    #[error("failed to parse template JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not read file {path}: {source}")]
    FileRead { path: PathBuf, #[source] source: io::Error },
}

pub type Result<T> = std::result::Result<T, Error>;
