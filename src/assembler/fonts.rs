//! Font object emission: converts a generation's `FontUsage` into PDF font
//! dictionaries. Follows `victor`'s `pdf/convert.rs` `add_font` (Type 0 /
//! CIDFontType2 / ToUnicode construction), generalized from "every font is
//! embedded" to "standard fonts stay unembedded unless the template asks
//! for embedding".
//!
//! Documented in `DESIGN.md`: the glyf table of an embedded font is not
//! physically trimmed down to the used glyph set (`victor` doesn't do this
//! either — `add_font` embeds the whole font program). Subsetting here is
//! "logical": the `/ToUnicode` CMap and the PostScript name tag cover only
//! the used code points; the font program itself is embedded whole.

use crate::fonts::usage::{subset_tag, FontUsage};
use crate::fonts::{Font, ResolvedFont, Standard14};
use crate::serializer::{IndirectObjectId, Object, Serializer, StreamFilter};
use crate::{array, dictionary};
use std::collections::{BTreeSet, HashMap};
use std::io::Write;
use std::sync::Arc;

#[derive(PartialEq, Eq, Hash, Clone, Copy)]
pub(crate) enum FontMapKey {
    Standard(Standard14),
    Custom(usize),
}

pub(crate) fn font_map_key(font: &ResolvedFont) -> FontMapKey {
    match font {
        ResolvedFont::Standard(std14) => FontMapKey::Standard(*std14),
        ResolvedFont::Custom(font) => FontMapKey::Custom(Arc::as_ptr(font) as usize),
    }
}

pub(crate) struct FontResource {
    pub object_id: IndirectObjectId,
    pub resource_name: String,
}

pub(crate) fn build_font_objects(
    usage: &FontUsage,
    embed_standard: bool,
    serializer: &mut Serializer,
) -> HashMap<FontMapKey, FontResource> {
    let mut out = HashMap::new();
    for (index, (_key, resolved, used)) in usage.iter().enumerate() {
        let resource_name = format!("F{}", index + 1);
        let object_id = match resolved {
            ResolvedFont::Standard(std14) if !embed_standard => emit_standard_font(serializer, *std14),
            ResolvedFont::Standard(std14) => match crate::fonts::fallback_face(
                family_name(*std14),
                is_bold(*std14),
                is_italic(*std14),
            )
            .get()
            {
                Ok(font) => emit_embedded_font(serializer, &font, used),
                Err(_) => emit_standard_font(serializer, *std14),
            },
            ResolvedFont::Custom(font) => emit_embedded_font(serializer, font, used),
        };
        out.insert(font_map_key(resolved), FontResource { object_id, resource_name });
    }
    out
}

fn family_name(std14: Standard14) -> &'static str {
    match std14 {
        Standard14::TimesRoman
        | Standard14::TimesBold
        | Standard14::TimesItalic
        | Standard14::TimesBoldItalic => "times",
        Standard14::Courier
        | Standard14::CourierBold
        | Standard14::CourierOblique
        | Standard14::CourierBoldOblique => "courier",
        _ => "helvetica",
    }
}

fn is_bold(std14: Standard14) -> bool {
    matches!(
        std14,
        Standard14::HelveticaBold
            | Standard14::HelveticaBoldOblique
            | Standard14::TimesBold
            | Standard14::TimesBoldItalic
            | Standard14::CourierBold
            | Standard14::CourierBoldOblique
    )
}

fn is_italic(std14: Standard14) -> bool {
    matches!(
        std14,
        Standard14::HelveticaOblique
            | Standard14::HelveticaBoldOblique
            | Standard14::TimesItalic
            | Standard14::TimesBoldItalic
            | Standard14::CourierOblique
            | Standard14::CourierBoldOblique
    )
}

fn emit_standard_font(serializer: &mut Serializer, std14: Standard14) -> IndirectObjectId {
    let id = serializer.allocate();
    let dict = dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => std14.base_font_name(),
        "Encoding" => "WinAnsiEncoding",
    };
    serializer.emit(id, &dict).expect("freshly allocated id");
    id
}

fn units_per_em(font: &Font) -> f32 {
    font.font_design_units_per_em.get() as f32
}

fn to_glyph_space(font: &Font, design_units: f32) -> i32 {
    (design_units / units_per_em(font) * 1000.0).round() as i32
}

fn emit_embedded_font(serializer: &mut Serializer, font: &Font, used: &BTreeSet<char>) -> IndirectObjectId {
    let tag = subset_tag(used);
    let tagged_name = format!("{}+{}", tag, font.postscript_name);

    let truetype_id = serializer.allocate();
    serializer
        .emit_stream(
            truetype_id,
            &dictionary! { "Length1" => font.bytes().len() },
            font.bytes(),
            StreamFilter::FlateDecode,
        )
        .expect("freshly allocated id");

    let descriptor_id = serializer.allocate();
    serializer
        .emit(
            descriptor_id,
            &dictionary! {
                "Type" => "FontDescriptor",
                "FontName" => &tagged_name,
                "FontBBox" => array![
                    to_glyph_space(font, font.min_x.get() as f32),
                    to_glyph_space(font, font.min_y.get() as f32),
                    to_glyph_space(font, font.max_x.get() as f32),
                    to_glyph_space(font, font.max_y.get() as f32),
                ],
                "Ascent" => to_glyph_space(font, font.ascender.get() as f32),
                "Descent" => to_glyph_space(font, font.descender.get() as f32),
                "FontFile2" => truetype_id,
                "ItalicAngle" => 0,
                "Flags" => 4,
                "CapHeight" => to_glyph_space(font, font.max_y.get() as f32),
                "StemV" => 80,
                "StemH" => 80,
            },
        )
        .expect("freshly allocated id");

    let to_unicode_id = serializer.allocate();
    let cmap_bytes = build_to_unicode_cmap(font, used);
    serializer
        .emit_stream(to_unicode_id, &dictionary! {}, &cmap_bytes, StreamFilter::FlateDecode)
        .expect("freshly allocated id");

    let width_objects: Vec<Object> = font
        .glyph_widths
        .iter()
        .map(|w| Object::from(to_glyph_space(font, w.get() as f32)))
        .collect();

    let font_id = serializer.allocate();
    serializer
        .emit(
            font_id,
            &dictionary! {
                "Type" => "Font",
                "Subtype" => "Type0",
                "BaseFont" => &tagged_name,
                "ToUnicode" => to_unicode_id,
                "Encoding" => "Identity-H",
                "DescendantFonts" => array![dictionary! {
                    "Type" => "Font",
                    "Subtype" => "CIDFontType2",
                    "BaseFont" => &tagged_name,
                    "CIDSystemInfo" => dictionary! {
                        "Registry" => Object::LiteralString(b"Adobe"),
                        "Ordering" => Object::LiteralString(b"Identity"),
                        "Supplement" => 0,
                    },
                    "FontDescriptor" => descriptor_id,
                    "CIDToGIDMap" => "Identity",
                    "W" => Object::Array(array![0, Object::Array(&width_objects)]),
                }],
            },
        )
        .expect("freshly allocated id");
    font_id
}

fn build_to_unicode_cmap(font: &Font, used: &BTreeSet<char>) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(
        b"/CIDInit /ProcSet findresource begin\n\
          12 dict begin\n\
          begincmap\n\
          /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
          /CMapName /Adobe-Identity-UCS def\n\
          /CMapType 2 def\n\
          1 begincodespacerange\n\
          <0000> <ffff>\n\
          endcodespacerange\n",
    );
    let entries: Vec<(char, u16)> = used
        .iter()
        .filter_map(|&ch| font.glyph_id(ch).ok().map(|g| (ch, g.0)))
        .collect();
    for chunk in entries.chunks(100) {
        write!(out, "{} beginbfchar\n", chunk.len()).unwrap();
        for (ch, gid) in chunk {
            write!(out, "<{:04x}> <", gid).unwrap();
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(out, "{:04x}", unit).unwrap();
            }
            out.extend_from_slice(b">\n");
        }
        out.extend_from_slice(b"endbfchar\n");
    }
    out.extend_from_slice(b"endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend");
    out
}
