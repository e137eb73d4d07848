//! Non-fatal conditions collected during generation and mutation.
//!
//! Every `Warning` corresponds to one of the "recorded as warning" outcomes in
//! the error-kind table: a malformed props string, a missing font, an
//! undecodable image, a page that overflowed but could be split, or a page that
//! a redaction pass could not touch.

use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    PropsMalformed { raw: String },
    FontNotFound { requested: String, substituted: &'static str },
    ImageDecodeError { name: String, reason: String },
    PageOverflowSplit { element_index: usize },
    RedactionCapability { page: usize, reason: &'static str },
    UnknownFormField { name: String },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::PropsMalformed { raw } => {
                write!(f, "props string {:?} is malformed; using defaults", raw)
            }
            Warning::FontNotFound { requested, substituted } => {
                write!(f, "font {:?} not found; substituting {}", requested, substituted)
            }
            Warning::ImageDecodeError { name, reason } => {
                write!(f, "image {:?} could not be decoded: {}", name, reason)
            }
            Warning::PageOverflowSplit { element_index } => {
                write!(f, "element {} overflowed a page and was split", element_index)
            }
            Warning::RedactionCapability { page, reason } => {
                write!(f, "page {} could not be text-redacted: {}", page, reason)
            }
            Warning::UnknownFormField { name } => {
                write!(f, "form field {:?} does not exist in the AcroForm; ignored", name)
            }
        }
    }
}

/// Diagnostics collected over the lifetime of a single generation or mutation call.
///
/// Never a `static`; one instance is owned per call and discarded at return.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: Warning) {
        warn!(%warning, "non-fatal diagnostic");
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

/// Counts and per-page capability report returned alongside a redaction pass,
/// mirroring the `RedactionApplyReport` shape from the external interfaces.
#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct RedactionApplyReport {
    #[serde(rename = "generatedRects")]
    pub generated_rects: usize,
    #[serde(rename = "matchedText")]
    pub matched_text: usize,
    pub applied: usize,
    pub warnings: Vec<String>,
    pub capabilities: Vec<PageCapability>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PageCapability {
    pub page: usize,
    #[serde(rename = "canTextRedact")]
    pub can_text_redact: bool,
    #[serde(rename = "canImageRedact")]
    pub can_image_redact: bool,
}
