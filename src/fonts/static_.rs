use crate::lazy_arc::LazyArc;
use std::sync::Arc;
use super::{Font, FontError};

/// Include a TrueType file with `include_bytes!()` and create a [`LazyStaticFont`] value.
///
/// This value can be used to initialize a `static` item:
///
/// ```rust
/// static MY_FONT: LazyStaticFont = include_font!("../my_font.ttf");
/// ```
///
/// [`LazyStaticFont`]: fonts/struct.LazyStaticFont.html
#[macro_export]
macro_rules! include_font {
    ($filename: expr) => {
        $crate::fonts::LazyStaticFont {
            bytes: include_bytes!($filename),
            lazy_arc: $crate::lazy_arc::LazyArc::INIT,
        }
    }
}

/// Fallback faces used when a template names a font family that is neither
/// one of the 14 standard PDF fonts nor a custom font supplied by the caller.
/// Liberation is metric-compatible with Arial/Times New Roman/Courier New, so
/// substituting it does not reflow text laid out assuming those metrics.
pub static LIBERATION_SANS_REGULAR: LazyStaticFont =
    include_font!("../../fonts/liberation/LiberationSans-Regular.ttf");
pub static LIBERATION_SANS_BOLD: LazyStaticFont =
    include_font!("../../fonts/liberation/LiberationSans-Bold.ttf");
pub static LIBERATION_SANS_ITALIC: LazyStaticFont =
    include_font!("../../fonts/liberation/LiberationSans-Italic.ttf");
pub static LIBERATION_SANS_BOLD_ITALIC: LazyStaticFont =
    include_font!("../../fonts/liberation/LiberationSans-BoldItalic.ttf");

pub static LIBERATION_SERIF_REGULAR: LazyStaticFont =
    include_font!("../../fonts/liberation/LiberationSerif-Regular.ttf");
pub static LIBERATION_SERIF_BOLD: LazyStaticFont =
    include_font!("../../fonts/liberation/LiberationSerif-Bold.ttf");
pub static LIBERATION_SERIF_ITALIC: LazyStaticFont =
    include_font!("../../fonts/liberation/LiberationSerif-Italic.ttf");
pub static LIBERATION_SERIF_BOLD_ITALIC: LazyStaticFont =
    include_font!("../../fonts/liberation/LiberationSerif-BoldItalic.ttf");

pub static LIBERATION_MONO_REGULAR: LazyStaticFont =
    include_font!("../../fonts/liberation/LiberationMono-Regular.ttf");
pub static LIBERATION_MONO_BOLD: LazyStaticFont =
    include_font!("../../fonts/liberation/LiberationMono-Bold.ttf");
pub static LIBERATION_MONO_ITALIC: LazyStaticFont =
    include_font!("../../fonts/liberation/LiberationMono-Italic.ttf");
pub static LIBERATION_MONO_BOLD_ITALIC: LazyStaticFont =
    include_font!("../../fonts/liberation/LiberationMono-BoldItalic.ttf");

/// Pick the embedded fallback face for a requested family name and style.
/// Unknown families fall back to sans-serif, matching [`Standard14::resolve`].
///
/// [`Standard14::resolve`]: super::Standard14::resolve
pub fn fallback_face(family: &str, bold: bool, italic: bool) -> &'static LazyStaticFont {
    match family.to_ascii_lowercase().as_str() {
        "times" | "times-roman" | "serif" => match (bold, italic) {
            (false, false) => &LIBERATION_SERIF_REGULAR,
            (true, false) => &LIBERATION_SERIF_BOLD,
            (false, true) => &LIBERATION_SERIF_ITALIC,
            (true, true) => &LIBERATION_SERIF_BOLD_ITALIC,
        },
        "courier" | "monospace" => match (bold, italic) {
            (false, false) => &LIBERATION_MONO_REGULAR,
            (true, false) => &LIBERATION_MONO_BOLD,
            (false, true) => &LIBERATION_MONO_ITALIC,
            (true, true) => &LIBERATION_MONO_BOLD_ITALIC,
        },
        _ => match (bold, italic) {
            (false, false) => &LIBERATION_SANS_REGULAR,
            (true, false) => &LIBERATION_SANS_BOLD,
            (false, true) => &LIBERATION_SANS_ITALIC,
            (true, true) => &LIBERATION_SANS_BOLD_ITALIC,
        },
    }
}

/// A lazily-parsed font backed by a static bytes slice.
pub struct LazyStaticFont {
    /// The raw data for this font
    pub bytes: &'static [u8],

    // This field needs to be public so that static initializers can construct it.
    // A `const fn` constructor would be better,
    // but these are not avaiable on stable as of this writing.
    #[doc(hidden)] pub lazy_arc: LazyArc<Font>,
}

impl LazyStaticFont {
    /// Return a new `Arc` reference to the singleton `Font` object.
    ///
    /// If this font's singleton was not already initialized,
    /// try to parse the font now (this may return an error) to initialize it.
    ///
    /// Calling this repeatedly will only parse once (until the process exits).
    pub fn get(&self) -> Result<Arc<Font>, FontError> {
        self.lazy_arc.get_or_create(|| Font::parse(self.bytes))
    }
}
