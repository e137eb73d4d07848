//! PDF Mutators (`spec.md` §4.6): merge, split, form-fill, and find-text all
//! operate on a previously-serialized PDF rather than a `Template` — each is
//! "parse just enough structure, edit a handful of objects, re-emit the
//! whole graph through this crate's own `Serializer`" (`reader.rs` +
//! `rewrite.rs`).

pub(crate) mod find_text;
pub(crate) mod formfill;
pub(crate) mod merge;
pub(crate) mod reader;
pub(crate) mod rewrite;
pub(crate) mod split;

pub use find_text::{find_text, TextMatch};
pub use formfill::fill as fill_form;
pub use merge::merge;
pub use split::split;
