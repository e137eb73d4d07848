//! Re-emits a parsed document's object graph through this crate's own
//! `Serializer`, applying per-object content/dictionary overrides along the
//! way. Every mutator (merge, split, form-fill, redaction) is "parse, edit a
//! handful of objects, rewrite" — this module is the shared "rewrite" half,
//! grounded in the same `allocate`/`emit` contract `assembler::mod` already
//! uses for fresh generation.
//!
//! Scoped by the same Non-goal as `reader.rs`: only documents with
//! contiguous `1..=N` object numbering (i.e. ones this crate produced) are
//! supported, so source object numbers double as the new `IndirectObjectId`s
//! and no renumbering table is needed for a single-document rewrite. `merge`
//! (`merge.rs`) is the one place renumbering is unavoidable, and builds its
//! own offset-based remap on top of this module's `convert_value`.

use crate::arena::Arena;
use crate::error::{Error, Result};
use crate::mutators::reader::{ParsedDocument, PdfValue};
use crate::serializer::{Dictionary, IndirectObjectId, Object, PdfVersion, Serializer, StreamFilter, XrefFormat};
use std::collections::HashMap;

/// Converts a parsed value into a serializer `Object`, remapping `N G R`
/// references through `renumber`. Nested arrays/dictionaries are allocated
/// out of `arena` so their borrowed `Object` slices outlive the call that
/// built them, matching the pattern `assembler::mod` uses for inline arrays.
pub(crate) type ObjectArena<'a> = Arena<Vec<Object<'a>>>;
pub(crate) type PairsArena<'a> = Arena<Vec<(&'a [u8], Object<'a>)>>;
pub(crate) type KeyArena = Arena<Vec<u8>>;

pub(crate) fn convert_value<'a>(
    value: &PdfValue,
    renumber: &HashMap<u32, IndirectObjectId>,
    arena: &'a ObjectArena<'a>,
    pairs_arena: &'a PairsArena<'a>,
    key_arena: &'a KeyArena,
) -> Object<'a> {
    match value {
        PdfValue::Null => Object::Null,
        PdfValue::Bool(b) => Object::Bool(*b),
        PdfValue::Number(n) => {
            if n.fract() == 0.0 && n.abs() < i32::MAX as f64 {
                Object::I32(*n as i32)
            } else {
                Object::Float(*n as f32)
            }
        }
        PdfValue::Name(name) => Object::Name(key_arena.allocate(name.clone().into_bytes()).as_slice()),
        PdfValue::LiteralString(bytes) => Object::LiteralString(key_arena.allocate(bytes.clone()).as_slice()),
        PdfValue::HexString(bytes) => Object::HexString(key_arena.allocate(bytes.clone()).as_slice()),
        PdfValue::Array(items) => {
            let converted: Vec<Object<'a>> = items
                .iter()
                .map(|item| convert_value(item, renumber, arena, pairs_arena, key_arena))
                .collect();
            Object::Array(arena.allocate(converted).as_slice())
        }
        PdfValue::Dictionary(map) => {
            Object::Dictionary(convert_dict(map, renumber, arena, pairs_arena, key_arena))
        }
        PdfValue::Reference(num, _) => {
            let id = renumber.get(num).copied().unwrap_or(IndirectObjectId(*num));
            Object::Reference(id)
        }
    }
}

pub(crate) fn convert_dict<'a>(
    map: &HashMap<String, PdfValue>,
    renumber: &HashMap<u32, IndirectObjectId>,
    arena: &'a ObjectArena<'a>,
    pairs_arena: &'a PairsArena<'a>,
    key_arena: &'a KeyArena,
) -> Dictionary<'a> {
    let mut pairs: Vec<(&'a [u8], Object<'a>)> = Vec::with_capacity(map.len());
    for (key, value) in map {
        if key == "Length" {
            continue; // recomputed by `emit_stream`
        }
        let key_bytes = key_arena.allocate(key.clone().into_bytes()).as_slice();
        pairs.push((key_bytes, convert_value(value, renumber, arena, pairs_arena, key_arena)));
    }
    Dictionary { prev: None, pairs: pairs_arena.allocate(pairs).as_slice() }
}

/// Rewrites `doc`, substituting `content_overrides[num]` for that object's
/// stream payload and merging `dict_overrides[num]` into its dictionary, for
/// every object in the source xref table.
pub(crate) fn rewrite(
    doc: &ParsedDocument,
    content_overrides: &HashMap<u32, Vec<u8>>,
    dict_overrides: &HashMap<u32, HashMap<String, PdfValue>>,
) -> Result<Vec<u8>> {
    let numbers = doc.object_numbers();
    let max_num = *numbers.iter().max().ok_or_else(|| Error::PdfMalformed("document has no objects".into()))?;

    let mut serializer = Serializer::new(PdfVersion::V1_7);
    for _ in 0..max_num {
        serializer.allocate();
    }
    let renumber: HashMap<u32, IndirectObjectId> = HashMap::new();

    let object_arena = Arena::new();
    let pairs_arena = Arena::new();
    let key_arena = Arena::new();

    for &num in &numbers {
        let mut object = doc.object(num)?;
        if let Some(overrides) = dict_overrides.get(&num) {
            for (key, value) in overrides {
                object.dict.insert(key.clone(), value.clone());
            }
        }
        let id = IndirectObjectId(num);
        let payload = content_overrides.get(&num).cloned().or(object.stream.clone());
        let dict = convert_dict(&object.dict, &renumber, &object_arena, &pairs_arena, &key_arena);
        match payload {
            Some(payload) => {
                serializer.emit_stream(id, &dict, &payload, StreamFilter::FlateDecode)?;
            }
            None => {
                serializer.emit(id, &dict)?;
            }
        }
    }

    let (root_num, _) = doc
        .trailer
        .get("Root")
        .and_then(|v| v.as_reference())
        .ok_or_else(|| Error::PdfMalformed("trailer missing /Root".into()))?;
    let info_id = doc.trailer.get("Info").and_then(|v| v.as_reference()).map(|(n, _)| IndirectObjectId(n));
    let root_id = IndirectObjectId(root_num);

    let mut file_id = [[0u8; 16]; 2];
    rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut file_id[0]);
    file_id[1] = file_id[0];

    serializer
        .finalize(root_id, info_id.unwrap_or(root_id), file_id, None, XrefFormat::Classical)
        .map_err(Error::from)
}
