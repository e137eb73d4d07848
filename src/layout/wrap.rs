//! Text measurement and greedy whitespace wrapping (`spec.md` §4.3
//! "Text wrapping"), grounded in the Font Subsystem's `measure` operation
//! (§4.2) with the documented 500/1000-em fallback for unmeasurable runs.

use crate::fonts::ResolvedFont;

pub fn measure_pt(font: &ResolvedFont, size: f32, text: &str) -> f32 {
    match font {
        ResolvedFont::Standard(std14) => {
            text.chars().map(|ch| std14.width(ch as u32) as f32 / 1000.0 * size).sum()
        }
        ResolvedFont::Custom(custom) => match custom.measure(text) {
            Ok(em) => em.get() * size,
            Err(_) => text.chars().count() as f32 * size * 0.5,
        },
    }
}

/// Split `text` on whitespace and greedily append tokens to the current line
/// while it still fits `max_width`; a single token wider than `max_width` is
/// broken at character boundaries.
pub fn wrap(font: &ResolvedFont, size: f32, text: &str, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for token in text.split_whitespace() {
        let candidate = if current.is_empty() { token.to_owned() } else { format!("{} {}", current, token) };
        if measure_pt(font, size, &candidate) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if measure_pt(font, size, token) <= max_width {
            current = token.to_owned();
        } else {
            let mut pieces = break_token(font, size, token, max_width);
            if let Some(last) = pieces.pop() {
                lines.extend(pieces);
                current = last;
            }
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn break_token(font: &ResolvedFont, size: f32, token: &str, max_width: f32) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for ch in token.chars() {
        let mut candidate = current.clone();
        candidate.push(ch);
        if measure_pt(font, size, &candidate) > max_width && !current.is_empty() {
            out.push(std::mem::replace(&mut current, ch.to_string()));
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::Standard14;

    #[test]
    fn wraps_on_whitespace_within_width() {
        let font = ResolvedFont::Standard(Standard14::Helvetica);
        let lines = wrap(&font, 12.0, "the quick brown fox jumps", 60.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(measure_pt(&font, 12.0, line) <= 60.0 + 1.0);
        }
    }

    #[test]
    fn breaks_a_single_overlong_token() {
        let font = ResolvedFont::Standard(Standard14::Courier);
        let lines = wrap(&font, 12.0, "supercalifragilisticexpialidocious", 40.0);
        assert!(lines.len() > 1);
    }
}
