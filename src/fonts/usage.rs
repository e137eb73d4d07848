//! Per-generation glyph-usage tracking, grounded in `spec.md` §4.2's
//! `record_usage`/`emit_font_objects` contract and §5's rule that usage state
//! "MUST be reset between independent generations" — this is never a `static`,
//! one instance lives on the `GenerationContext` and is dropped at return.

use crate::fonts::registry::ResolvedFont;
use crate::fonts::Standard14;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Identifies one font slot within a single generation: a standard-14 family,
/// or a custom font keyed by the registry name the template asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontKey {
    Standard(Standard14),
    Custom(String),
}

impl FontKey {
    pub fn for_resolution(name: &str, resolved: &ResolvedFont) -> Self {
        match resolved {
            ResolvedFont::Standard(std14) => FontKey::Standard(*std14),
            ResolvedFont::Custom(_) => FontKey::Custom(name.to_owned()),
        }
    }
}

/// Tracks, per font actually drawn with during one generation, the set of
/// code points shown. Used both to decide which glyphs a subsetted embedded
/// font program must contain and to build each font's `ToUnicode` CMap.
#[derive(Default)]
pub struct FontUsage {
    entries: Vec<(FontKey, ResolvedFont, BTreeSet<char>)>,
}

impl FontUsage {
    pub fn new() -> Self {
        FontUsage { entries: Vec::new() }
    }

    pub fn record(&mut self, key: FontKey, resolved: &ResolvedFont, text: &str) {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _, _)| *k == key) {
            slot.2.extend(text.chars());
        } else {
            let mut used = BTreeSet::new();
            used.extend(text.chars());
            self.entries.push((key, resolved.clone(), used));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FontKey, &ResolvedFont, &BTreeSet<char>)> {
        self.entries.iter().map(|(k, r, u)| (k, r, u))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Standard-14 fonts have a fixed encoding and are never subsetted; only
/// custom embedded fonts get a subset tag.
pub fn custom_font_arc(resolved: &ResolvedFont) -> Option<Arc<crate::fonts::Font>> {
    match resolved {
        ResolvedFont::Standard(_) => None,
        ResolvedFont::Custom(font) => Some(Arc::clone(font)),
    }
}

/// 6-uppercase-letter subset tag derived from the used code-point set, per
/// `spec.md` §4.2 ("`ABCDEF+FontName`" convention used throughout ISO 32000).
pub fn subset_tag(used: &BTreeSet<char>) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    for ch in used {
        ch.hash(&mut hasher);
    }
    let mut hash = hasher.finish();
    let mut tag = String::with_capacity(6);
    for _ in 0..6 {
        tag.push((b'A' + (hash % 26) as u8) as char);
        hash /= 26;
    }
    tag
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subset_tag_is_six_uppercase_letters() {
        let mut used = BTreeSet::new();
        used.extend("Hello".chars());
        let tag = subset_tag(&used);
        assert_eq!(tag.len(), 6);
        assert!(tag.chars().all(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn recording_the_same_key_merges_code_points() {
        let mut usage = FontUsage::new();
        let resolved = ResolvedFont::Standard(Standard14::Helvetica);
        let key = FontKey::Standard(Standard14::Helvetica);
        usage.record(key.clone(), &resolved, "AB");
        usage.record(key, &resolved, "BC");
        let (_, _, used) = usage.iter().next().unwrap();
        assert_eq!(used.len(), 3);
    }
}
