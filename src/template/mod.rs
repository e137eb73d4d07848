//! The typed representation of the template tree the caller hands the engine,
//! mirroring the data model 1:1: `Config`, `Title`, `Elements`, `Table`, `Cell`,
//! `Footer`, `Spacer`, `Bookmarks`.

pub mod page;
pub mod props;

use serde::{Deserialize, Deserializer};

pub use page::{Margins, Orientation, PageBorders, PageSize};
pub use props::{Align, CellProps};

fn deserialize_props<'de, D>(deserializer: D) -> Result<CellProps, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(CellProps::parse(&raw).0)
}

fn deserialize_borders<'de, D>(deserializer: D) -> Result<PageBorders, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(PageBorders::parse(&raw))
}

fn deserialize_margins<'de, D>(deserializer: D) -> Result<Margins, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(Margins::parse(&raw))
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(rename = "ownerPassword", default)]
    pub owner_password: String,
    #[serde(rename = "userPassword", default)]
    pub user_password: String,
    #[serde(rename = "allowPrinting", default = "default_true")]
    pub allow_printing: bool,
    #[serde(rename = "allowCopying", default = "default_true")]
    pub allow_copying: bool,
    #[serde(rename = "allowModifying", default = "default_true")]
    pub allow_modifying: bool,
    #[serde(rename = "allowAnnotations", default = "default_true")]
    pub allow_annotations: bool,
    #[serde(rename = "allowFormFilling", default = "default_true")]
    pub allow_form_filling: bool,
    #[serde(rename = "allowAccessibility", default = "default_true")]
    pub allow_accessibility: bool,
    /// `rc4-128`, `aes-128`, or `aes-256`.
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
}

fn default_true() -> bool {
    true
}

fn default_algorithm() -> String {
    "aes-128".to_owned()
}

impl Default for SecurityConfig {
    fn default() -> Self {
        SecurityConfig {
            enabled: false,
            owner_password: String::new(),
            user_password: String::new(),
            allow_printing: true,
            allow_copying: true,
            allow_modifying: true,
            allow_annotations: true,
            allow_form_filling: true,
            allow_accessibility: true,
            algorithm: default_algorithm(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignatureConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(rename = "certificateDer", default)]
    pub certificate_der: Vec<u8>,
    #[serde(rename = "privateKeyDer", default)]
    pub private_key_der: Vec<u8>,
    #[serde(default)]
    pub page: usize,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default = "default_sig_width")]
    pub width: f32,
    #[serde(default = "default_sig_height")]
    pub height: f32,
}

fn default_sig_width() -> f32 {
    200.0
}
fn default_sig_height() -> f32 {
    60.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub page: PageSize,
    #[serde(rename = "pageAlignment", default)]
    pub page_alignment: Orientation,
    #[serde(rename = "pageBorders", default, deserialize_with = "deserialize_borders")]
    pub page_borders: PageBorders,
    #[serde(default, deserialize_with = "deserialize_margins")]
    pub margins: Margins,
    #[serde(default)]
    pub watermark: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "pdfA", default)]
    pub pdf_a: bool,
    #[serde(rename = "arlington20", default)]
    pub arlington_2_0: bool,
    #[serde(rename = "embedFonts", default)]
    pub embed_fonts: bool,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub signature: SignatureConfig,
}

impl Config {
    pub fn page_dimensions_pt(&self) -> (f32, f32) {
        let (w, h) = self.page.dimensions_pt();
        match self.page_alignment {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StyledText {
    #[serde(deserialize_with = "deserialize_props")]
    pub props: CellProps,
    pub text: String,
    #[serde(default)]
    pub bgcolor: Option<String>,
    #[serde(default)]
    pub textcolor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Title {
    Table(Table),
    Line(StyledText),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageData {
    pub name: String,
    pub data: String,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormField {
    #[serde(rename = "type")]
    pub field_type: FormFieldType,
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub checked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormFieldType {
    Text,
    Checkbox,
    Radio,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cell {
    #[serde(deserialize_with = "deserialize_props")]
    pub props: CellProps,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub image: Option<ImageData>,
    #[serde(rename = "form_field", default)]
    pub form_field: Option<FormField>,
    #[serde(default)]
    pub chequebox: bool,
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub height: Option<f32>,
    #[serde(default)]
    pub bgcolor: Option<String>,
    #[serde(default)]
    pub textcolor: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub dest: Option<String>,
    #[serde(default = "default_true")]
    pub wrap: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Row {
    #[serde(default = "default_row_height")]
    pub height: f32,
    pub cells: Vec<Cell>,
}

fn default_row_height() -> f32 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct Table {
    pub maxcolumns: u8,
    pub columnwidths: Vec<f32>,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Spacer {
    pub height: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Table { table: Table },
    Spacer { spacer: Spacer },
    Image { image: ImageData },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Footer {
    pub font: String,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Bookmark {
    pub title: String,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub dest: Option<String>,
    #[serde(default)]
    pub children: Vec<Bookmark>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Template {
    pub config: Config,
    #[serde(default)]
    pub title: Option<Title>,
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default)]
    pub footer: Option<Footer>,
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
}

impl Template {
    pub fn from_json(bytes: &[u8]) -> crate::error::Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_title_template_parses() {
        let json = r#"{
            "config": {"page": "A4", "pageAlignment": 1},
            "title": {"props": "Helvetica:18:100:center:0:0:0:0", "text": "Hello"}
        }"#;
        let template = Template::from_json(json.as_bytes()).unwrap();
        assert_eq!(template.config.page, PageSize::A4);
        match template.title.unwrap() {
            Title::Line(line) => {
                assert_eq!(line.text, "Hello");
                assert!(line.props.bold);
            }
            Title::Table(_) => panic!("expected a styled line"),
        }
    }
}
