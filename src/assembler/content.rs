//! Content-stream rendering: turns a page's `layout::Instruction` list into
//! PDF content-stream operators. Follows `victor`'s `pdf/convert.rs`
//! `InProgressPage` (the `cm`/`gs`/`re`/`f`/`rg`/`BT..ET`/`Tf`/`Tm`/`Tj`
//! operator set and its per-page alpha `ExtGState` caching via `op!`),
//! generalized from a live page-building API to rendering a flat
//! `Instruction` list produced ahead of time by the layout engine.

use crate::assembler::fonts::{font_map_key, FontMapKey, FontResource};
use crate::fonts::ResolvedFont;
use crate::layout::Instruction;
use crate::primitives::RGBA;
use crate::serializer::Object;
use std::collections::HashMap;

pub(crate) struct ContentResult {
    pub bytes: Vec<u8>,
    pub alpha_states: Vec<(String, f32)>,
    pub used_image_indices: Vec<usize>,
}

macro_rules! op {
    ($out: expr, $operator: expr) => {
        op!($out, $operator,)
    };
    ($out: expr, $operator: expr, $( $operand: expr ),*) => {
        {
            $(
                Object::from($operand).write(&mut $out).unwrap();
                $out.push(b' ');
            )*
            $out.extend_from_slice($operator.as_bytes());
            $out.push(b'\n');
        }
    }
}

pub(crate) fn render_page(
    instructions: &[Instruction],
    fonts: &HashMap<FontMapKey, FontResource>,
    image_names: &[String],
) -> ContentResult {
    let mut out = Vec::new();
    let mut current_color = (0.0f32, 0.0f32, 0.0f32);
    let mut alpha_states: Vec<(String, f32)> = Vec::new();
    let mut used_images = Vec::new();

    for instruction in instructions {
        match instruction {
            Instruction::Text { x, y, font, size, color, text } => {
                set_color(&mut out, &mut current_color, *color);
                set_alpha(&mut out, &mut alpha_states, color.3);
                let name = fonts.get(&font_map_key(font)).map(|r| r.resource_name.clone()).unwrap_or_default();
                op!(out, "BT");
                op!(out, "Tf", &*name, *size);
                op!(out, "Tm", 1.0, 0.0, 0.0, 1.0, *x, *y);
                write_show_text(&mut out, font, text);
                op!(out, "ET");
            }
            Instruction::RotatedText { x, y, font, size, color, angle_degrees, text } => {
                set_color(&mut out, &mut current_color, *color);
                set_alpha(&mut out, &mut alpha_states, color.3);
                let name = fonts.get(&font_map_key(font)).map(|r| r.resource_name.clone()).unwrap_or_default();
                let radians = angle_degrees.to_radians();
                let (cos, sin) = (radians.cos(), radians.sin());
                op!(out, "BT");
                op!(out, "Tf", &*name, *size);
                op!(out, "Tm", cos, sin, -sin, cos, *x, *y);
                write_show_text(&mut out, font, text);
                op!(out, "ET");
            }
            Instruction::Line { x0, y0, x1, y1, width } => {
                op!(out, "w", *width);
                op!(out, "m", *x0, *y0);
                op!(out, "l", *x1, *y1);
                op!(out, "S");
            }
            Instruction::FillRect { x, y, w, h, color } => {
                set_color(&mut out, &mut current_color, *color);
                set_alpha(&mut out, &mut alpha_states, color.3);
                op!(out, "re", *x, *y, *w, *h);
                op!(out, "f");
            }
            Instruction::Image { x, y, w, h, image_index } => {
                used_images.push(*image_index);
                let name = image_names.get(*image_index).cloned().unwrap_or_default();
                out.extend_from_slice(b"q\n");
                op!(out, "cm", *w, 0.0, 0.0, *h, *x, *y);
                op!(out, "Do", &*name);
                out.extend_from_slice(b"Q\n");
            }
        }
    }
    ContentResult { bytes: out, alpha_states, used_image_indices: used_images }
}

fn set_color(out: &mut Vec<u8>, current: &mut (f32, f32, f32), color: RGBA) {
    let rgb = (color.0, color.1, color.2);
    if *current != rgb {
        *current = rgb;
        op!(out, "rg", color.0, color.1, color.2);
    }
}

/// Quantizes alpha to 1/1000ths so near-identical rounding errors reuse the
/// same `ExtGState`, mirroring `victor`'s `u16`-keyed alpha-state cache.
fn set_alpha(out: &mut Vec<u8>, alpha_states: &mut Vec<(String, f32)>, alpha: f32) {
    if alpha >= 1.0 {
        return;
    }
    let key = (alpha.max(0.0).min(1.0) * 1000.0).round() as i32;
    let existing = alpha_states.iter().position(|(_, a)| (a * 1000.0).round() as i32 == key);
    let name = match existing {
        Some(i) => alpha_states[i].0.clone(),
        None => {
            let name = format!("GS{}", alpha_states.len() + 1);
            alpha_states.push((name.clone(), alpha));
            name
        }
    };
    op!(out, "gs", &*name);
}

fn write_show_text(out: &mut Vec<u8>, font: &ResolvedFont, text: &str) {
    match font {
        ResolvedFont::Standard(_) => {
            let mut bytes = Vec::with_capacity(text.len());
            for ch in text.chars() {
                bytes.push(if (ch as u32) < 128 { ch as u8 } else { b'?' });
            }
            op!(out, "Tj", Object::LiteralString(&bytes));
        }
        ResolvedFont::Custom(custom) => {
            let mut codes = Vec::with_capacity(text.chars().count() * 2);
            for ch in text.chars() {
                let id = custom.glyph_id(ch).map(|g| g.0).unwrap_or(0);
                codes.push((id >> 8) as u8);
                codes.push(id as u8);
            }
            op!(out, "Tj", Object::HexString(&codes));
        }
    }
}
