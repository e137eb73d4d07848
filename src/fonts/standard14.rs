//! Metrics for the 14 standard Type 1 fonts (ISO 32000 Annex D).
//!
//! Widths are in thousandths of an em (the unit PDF's `/Widths`/AFM tables use
//! for these fonts), indexed by ASCII code point 32..=126. Courier's family is
//! uniformly 600 units wide; Helvetica and Times vary per glyph.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Standard14 {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
    Symbol,
    ZapfDingbats,
}

impl Standard14 {
    /// Resolve a font family name plus bold/italic flags to a standard font,
    /// falling back to the closest Helvetica variant for unknown families.
    pub fn resolve(family: &str, bold: bool, italic: bool) -> Self {
        let family = family.to_ascii_lowercase();
        match family.as_str() {
            "times" | "times-roman" | "serif" => match (bold, italic) {
                (false, false) => Standard14::TimesRoman,
                (true, false) => Standard14::TimesBold,
                (false, true) => Standard14::TimesItalic,
                (true, true) => Standard14::TimesBoldItalic,
            },
            "courier" | "monospace" => match (bold, italic) {
                (false, false) => Standard14::Courier,
                (true, false) => Standard14::CourierBold,
                (false, true) => Standard14::CourierOblique,
                (true, true) => Standard14::CourierBoldOblique,
            },
            "symbol" => Standard14::Symbol,
            "zapfdingbats" => Standard14::ZapfDingbats,
            _ => match (bold, italic) {
                (false, false) => Standard14::Helvetica,
                (true, false) => Standard14::HelveticaBold,
                (false, true) => Standard14::HelveticaOblique,
                (true, true) => Standard14::HelveticaBoldOblique,
            },
        }
    }

    /// The PDF `/BaseFont` name for this standard font.
    pub fn base_font_name(self) -> &'static str {
        match self {
            Standard14::Helvetica => "Helvetica",
            Standard14::HelveticaBold => "Helvetica-Bold",
            Standard14::HelveticaOblique => "Helvetica-Oblique",
            Standard14::HelveticaBoldOblique => "Helvetica-BoldOblique",
            Standard14::TimesRoman => "Times-Roman",
            Standard14::TimesBold => "Times-Bold",
            Standard14::TimesItalic => "Times-Italic",
            Standard14::TimesBoldItalic => "Times-BoldItalic",
            Standard14::Courier => "Courier",
            Standard14::CourierBold => "Courier-Bold",
            Standard14::CourierOblique => "Courier-Oblique",
            Standard14::CourierBoldOblique => "Courier-BoldOblique",
            Standard14::Symbol => "Symbol",
            Standard14::ZapfDingbats => "ZapfDingbats",
        }
    }

    /// Advance width, in 1/1000 em, for an ASCII code point. Falls back to 500
    /// (Helvetica/Times) or 600 (Courier) for glyphs outside the printable
    /// ASCII range, matching `spec.md`'s documented "unknown glyph" fallback.
    pub fn width(self, code_point: u32) -> u32 {
        match self {
            Standard14::Courier
            | Standard14::CourierBold
            | Standard14::CourierOblique
            | Standard14::CourierBoldOblique => 600,
            Standard14::Helvetica | Standard14::HelveticaOblique => {
                helvetica_width(code_point).unwrap_or(500)
            }
            Standard14::HelveticaBold | Standard14::HelveticaBoldOblique => {
                helvetica_bold_width(code_point).unwrap_or(556)
            }
            Standard14::TimesRoman | Standard14::TimesItalic => {
                times_width(code_point).unwrap_or(500)
            }
            Standard14::TimesBold | Standard14::TimesBoldItalic => {
                times_bold_width(code_point).unwrap_or(500)
            }
            Standard14::Symbol | Standard14::ZapfDingbats => 600,
        }
    }
}

fn ascii_index(code_point: u32) -> Option<usize> {
    if (32..=126).contains(&code_point) {
        Some((code_point - 32) as usize)
    } else {
        None
    }
}

fn helvetica_width(code_point: u32) -> Option<u32> {
    ascii_index(code_point).map(|i| HELVETICA[i])
}
fn helvetica_bold_width(code_point: u32) -> Option<u32> {
    ascii_index(code_point).map(|i| HELVETICA_BOLD[i])
}
fn times_width(code_point: u32) -> Option<u32> {
    ascii_index(code_point).map(|i| TIMES[i])
}
fn times_bold_width(code_point: u32) -> Option<u32> {
    ascii_index(code_point).map(|i| TIMES_BOLD[i])
}

// AFM widths for ASCII 32 (space) through 126 (~).
#[rustfmt::skip]
static HELVETICA: [u32; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
static HELVETICA_BOLD: [u32; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[rustfmt::skip]
static TIMES: [u32; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

#[rustfmt::skip]
static TIMES_BOLD: [u32; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_families() {
        assert_eq!(Standard14::resolve("Times", true, false), Standard14::TimesBold);
        assert_eq!(Standard14::resolve("Courier", false, true), Standard14::CourierOblique);
        assert_eq!(Standard14::resolve("Helvetica", false, false), Standard14::Helvetica);
    }

    #[test]
    fn courier_is_monospace() {
        assert_eq!(Standard14::Courier.width('i' as u32), 600);
        assert_eq!(Standard14::Courier.width('m' as u32), 600);
    }

    #[test]
    fn unknown_family_falls_back_to_helvetica() {
        assert_eq!(Standard14::resolve("Comic Sans", false, false), Standard14::Helvetica);
    }
}
