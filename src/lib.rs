//! `folium`: a PDF synthesis engine — layout, font embedding, and security
//! without a third-party PDF library (`spec.md` §1).
//!
//! `generate` is the one entry point that runs the whole pipeline end to
//! end: parse the template JSON, paginate it against the process-wide font
//! registry, assemble the object graph, optionally encrypt it while it is
//! still being serialized, finalize the xref/trailer, and optionally patch
//! in a detached signature afterward. Everything past that point —
//! `mutators::{merge, split, find_text, fill_form}` and
//! `security::{redact}` — operates on already-serialized PDF bytes instead.

mod arena;
mod assembler;
mod diagnostics;
mod error;
mod fonts;
mod lazy_arc;
mod layout;
mod mutators;
mod primitives;
mod security;
mod serializer;
mod template;
mod text;

pub use diagnostics::Warning;
pub use error::{Error, Result};
pub use fonts::{FontRegistry, RegistryError};
pub use mutators::{fill_form, find_text, merge, split, TextMatch};
pub use security::{redact, RedactionMode, RedactionRequest};
pub use template::Template;

use serializer::{PdfVersion, Serializer, XrefFormat};

lazy_static::lazy_static! {
    /// The process-wide registry `spec.md` §5 asks for: one `FontRegistry`
    /// shared by every call to `generate` in this process, so a custom font
    /// registered once is available to every later generation without the
    /// caller threading it through explicitly.
    static ref FONT_REGISTRY: FontRegistry = FontRegistry::new();
}

/// Registers a custom TrueType/OpenType font under `name` in the process-wide
/// registry, for later generations to reference from a template's font field.
pub fn register_font(name: impl Into<String>, bytes: Vec<u8>) -> std::result::Result<(), RegistryError> {
    FONT_REGISTRY.register(name, bytes)
}

fn random_file_id() -> [[u8; 16]; 2] {
    let mut id = [[0u8; 16]; 2];
    rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut id[0]);
    id[1] = id[0];
    id
}

/// Runs the full generation pipeline over a JSON template and returns the
/// finished PDF bytes plus any non-fatal diagnostics collected along the way.
pub fn generate(template_json: &[u8]) -> Result<(Vec<u8>, Vec<Warning>)> {
    let template = Template::from_json(template_json)?;
    let mut diagnostics = diagnostics::Diagnostics::new();

    let layout = layout::paginate(&template, &FONT_REGISTRY, &mut diagnostics);

    let version = if template.config.pdf_a { PdfVersion::V2_0 } else { PdfVersion::V1_7 };
    let mut serializer = Serializer::new(version);
    let file_id = random_file_id();

    // Stream encryption has to be installed before `assembler::assemble` runs
    // any `emit_stream` call, since the serializer encrypts each stream's
    // payload as it is written rather than as a final pass over the body.
    // The `/Encrypt` dictionary itself is emitted first, while it can still
    // borrow from `setup`, before `setup` is moved into the encryptor closure.
    let encrypt_id = if template.config.security.enabled {
        let setup = security::encryption::derive(&template.config.security, &file_id[0])?;
        let id = serializer.allocate();
        serializer.emit(id, &security::encryption::build_encrypt_dictionary(&setup))?;
        serializer.set_stream_encryption(security::encryption::make_stream_encryptor(setup));
        Some(id)
    } else {
        None
    };

    let assembled = assembler::assemble(&mut serializer, &layout, &template, &mut diagnostics);

    let mut pdf_bytes =
        serializer.finalize(assembled.root_id, assembled.info_id, file_id, encrypt_id, XrefFormat::Classical)?;

    if template.config.signature.enabled && assembled.has_signature_placeholder {
        security::signature::apply_detached_signature(
            &mut pdf_bytes,
            &template.config.signature.certificate_der,
            &template.config.signature.private_key_der,
        )?;
    }

    Ok((pdf_bytes, diagnostics.into_warnings()))
}
