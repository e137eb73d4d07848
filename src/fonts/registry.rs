//! Process-wide registry of custom-registered fonts.
//!
//! Registration takes exclusive access; resolution takes shared access, so
//! concurrent generations reading the registry never block each other.
//! Standard-14 definitions need no exclusion at all — they carry no bytes.

use crate::fonts::{Font, FontError, Standard14};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// A font resolvable by name: either one of the 14 standard PDF fonts (no
/// embedded program) or a custom TrueType/OpenType font registered by the
/// caller.
#[derive(Clone)]
pub enum ResolvedFont {
    Standard(Standard14),
    Custom(Arc<Font>),
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("font '{0}' is already registered")]
    AlreadyRegistered(String),
    #[error(transparent)]
    Font(#[from] FontError),
}

/// Process-wide store of custom fonts, keyed by the name templates use in
/// their `props` font field.
pub struct FontRegistry {
    custom: RwLock<HashMap<String, Arc<Font>>>,
}

impl FontRegistry {
    pub fn new() -> Self {
        FontRegistry { custom: RwLock::new(HashMap::new()) }
    }

    /// Parse and register a custom font under `name`. Exclusive access: this
    /// blocks concurrent `resolve` calls for the duration of the parse.
    pub fn register(&self, name: impl Into<String>, bytes: Vec<u8>) -> Result<(), RegistryError> {
        let name = name.into();
        let font = Font::parse(bytes)?;
        let mut custom = self.custom.write();
        if custom.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered(name));
        }
        custom.insert(name, font);
        Ok(())
    }

    /// Resolve a font name requested by a template. Falls back to the closest
    /// standard-14 substitute (and lets the caller record a `font-not-found`
    /// warning) when `name` is not a registered custom font and not itself
    /// one of the standard family names.
    pub fn resolve(&self, name: &str, bold: bool, italic: bool) -> ResolvedFont {
        if let Some(font) = self.custom.read().get(name) {
            return ResolvedFont::Custom(Arc::clone(font));
        }
        ResolvedFont::Standard(Standard14::resolve(name, bold, italic))
    }

    /// True if `name` is a registered custom font (used to decide whether a
    /// `font-not-found` warning should be recorded for an unresolved name).
    pub fn contains(&self, name: &str) -> bool {
        self.custom.read().contains_key(name)
    }

    /// Snapshot of currently-registered custom fonts, taken at generation
    /// start so subsetting within one generation does not race a concurrent
    /// registration.
    pub fn snapshot(&self) -> HashMap<String, Arc<Font>> {
        self.custom.read().clone()
    }
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_name_falls_back_to_standard14() {
        let registry = FontRegistry::new();
        match registry.resolve("Arial", false, false) {
            ResolvedFont::Standard(Standard14::Helvetica) => {}
            _ => panic!("expected Helvetica fallback"),
        }
    }

    #[test]
    fn empty_registry_snapshot_is_empty() {
        let registry = FontRegistry::new();
        assert!(registry.snapshot().is_empty());
    }
}
