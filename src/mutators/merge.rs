//! Merge (`spec.md` §4.6): concatenates several PDFs' page trees into one
//! output, renumbering every source object by a per-document offset so none
//! collide, then builds a fresh flat `/Pages` node over the concatenated leaf
//! pages.
//!
//! Grounded in the same `allocate`-then-`emit` contract `assembler::mod` and
//! `mutators::rewrite` already use; the renumbering offset itself is the one
//! piece of bookkeeping `rewrite::rewrite` deliberately leaves to callers that
//! combine more than one source document (see that module's doc comment).

use crate::arena::Arena;
use crate::dictionary;
use crate::error::{Error, Result};
use crate::mutators::reader::ParsedDocument;
use crate::mutators::rewrite::convert_dict;
use crate::serializer::{IndirectObjectId, Object, PdfVersion, Serializer, StreamFilter, XrefFormat};
use std::collections::HashMap;

/// Source object numbers are only ever unique *within* one document; each
/// kept object is renumbered to `original + offset`, where `offset` is the
/// running total of all earlier documents' highest object number.
pub fn merge(documents: &[Vec<u8>]) -> Result<Vec<u8>> {
    if documents.len() == 1 {
        // `spec.md` §8: "Idempotence of merge: merge([A]) == A byte-for-byte."
        // A single source needs no renumbering or page-tree surgery at all,
        // so returning it untouched is both correct and the only way to hit
        // this property exactly (a full parse/re-emit pass would shuffle
        // offsets and mint a fresh random `/ID`).
        return Ok(documents[0].clone());
    }

    let parsed: Vec<ParsedDocument> =
        documents.iter().map(|bytes| ParsedDocument::parse(bytes)).collect::<Result<_>>()?;

    let mut renumber_maps: Vec<HashMap<u32, IndirectObjectId>> = Vec::with_capacity(parsed.len());
    let mut offset: u32 = 0;
    for doc in &parsed {
        let numbers = doc.object_numbers();
        let max_num = *numbers.iter().max().ok_or_else(|| Error::PdfMalformed("document has no objects".into()))?;
        renumber_maps.push(numbers.iter().map(|&n| (n, IndirectObjectId(n + offset))).collect());
        offset += max_num;
    }

    let mut serializer = Serializer::new(PdfVersion::V1_7);
    for _ in 0..offset {
        serializer.allocate();
    }

    let object_arena = Arena::new();
    let pairs_arena = Arena::new();
    let key_arena = Arena::new();

    let mut all_page_ids: Vec<IndirectObjectId> = Vec::new();
    for (doc, renumber) in parsed.iter().zip(&renumber_maps) {
        for &num in &doc.object_numbers() {
            let object = doc.object(num)?;
            let new_id = renumber[&num];
            let dict = convert_dict(&object.dict, renumber, &object_arena, &pairs_arena, &key_arena);
            match &object.stream {
                Some(payload) => {
                    serializer.emit_stream(new_id, &dict, payload, StreamFilter::FlateDecode)?;
                }
                None => {
                    serializer.emit(new_id, &dict)?;
                }
            }
        }
        for &page_num in &doc.page_object_numbers()? {
            all_page_ids.push(renumber[&page_num]);
        }
    }

    let pages_root = serializer.allocate();
    let kids: Vec<Object> = all_page_ids.iter().map(|&id| Object::Reference(id)).collect();
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Count" => all_page_ids.len(),
        "Kids" => Object::Array(&kids),
    };
    serializer.emit(pages_root, &pages_dict)?;

    let root_id = serializer.allocate();
    serializer.emit(root_id, &dictionary! { "Type" => "Catalog", "Pages" => pages_root })?;

    let info_id = serializer.allocate();
    serializer.emit(info_id, &dictionary! { "Producer" => "folium-core" })?;

    let mut file_id = [[0u8; 16]; 2];
    rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut file_id[0]);
    file_id[1] = file_id[0];

    serializer.finalize(root_id, info_id, file_id, None, XrefFormat::Classical).map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_document_merge_is_the_identity() {
        let bytes = b"%PDF-1.7\nnot a real pdf but never parsed".to_vec();
        let merged = merge(&[bytes.clone()]).unwrap();
        assert_eq!(merged, bytes);
    }
}
