//! Split (`spec.md` §4.6): parses a page specification like `"1-3,5,7-9"`
//! and produces one output PDF per comma-separated group, each a full copy of
//! the source document whose `/Pages` node is overridden to list only that
//! group's leaf pages.
//!
//! Grounded in `mutators::rewrite`'s `dict_overrides` parameter, which exists
//! precisely for this kind of single-object dictionary patch; the page nodes
//! this crate's own assembler never emits with inherited `/MediaBox` or
//! `/Resources` (`assembler::mod::emit_page` puts both on every leaf), so
//! dropping the original page-tree branches in favor of a flat override here
//! loses no per-page attributes.

use crate::error::{Error, Result};
use crate::mutators::reader::{ParsedDocument, PdfValue};
use crate::mutators::rewrite;
use std::collections::HashMap;

pub fn split(pdf_bytes: &[u8], page_spec: &str) -> Result<Vec<Vec<u8>>> {
    let doc = ParsedDocument::parse(pdf_bytes)?;
    let page_ids = doc.page_object_numbers()?;
    let groups = parse_page_spec(page_spec, page_ids.len())?;

    let (root_num, _) =
        doc.trailer.get("Root").and_then(|v| v.as_reference()).ok_or_else(|| Error::PdfMalformed("trailer missing /Root".into()))?;
    let root = doc.object(root_num)?;
    let (pages_num, _) = root
        .dict
        .get("Pages")
        .and_then(|v| v.as_reference())
        .ok_or_else(|| Error::PdfMalformed("catalog missing /Pages".into()))?;

    groups
        .into_iter()
        .map(|indices| {
            let selected: Vec<u32> = indices.iter().map(|&i| page_ids[i - 1]).collect();
            let kids: Vec<PdfValue> = selected.iter().map(|&num| PdfValue::Reference(num, 0)).collect();
            let mut pages_override = HashMap::new();
            pages_override.insert("Kids".to_owned(), PdfValue::Array(kids));
            pages_override.insert("Count".to_owned(), PdfValue::Number(selected.len() as f64));
            let mut dict_overrides = HashMap::new();
            dict_overrides.insert(pages_num, pages_override);
            rewrite::rewrite(&doc, &HashMap::new(), &dict_overrides)
        })
        .collect()
}

/// Parses `"1-3,5,7-9"` into one 1-indexed page-number group per
/// comma-separated term, validating every page against `page_count`.
fn parse_page_spec(spec: &str, page_count: usize) -> Result<Vec<Vec<usize>>> {
    let mut groups = Vec::new();
    for term in spec.split(',') {
        let term = term.trim();
        let pages: Vec<usize> = match term.split_once('-') {
            Some((start, end)) => {
                let start: usize = start.trim().parse().map_err(|_| malformed_spec(term))?;
                let end: usize = end.trim().parse().map_err(|_| malformed_spec(term))?;
                if start > end {
                    return Err(malformed_spec(term));
                }
                (start..=end).collect()
            }
            None => vec![term.parse().map_err(|_| malformed_spec(term))?],
        };
        for &page in &pages {
            if page == 0 || page > page_count {
                return Err(Error::PageOutOfRange { page, page_count });
            }
        }
        groups.push(pages);
    }
    Ok(groups)
}

fn malformed_spec(term: &str) -> Error {
    Error::PdfMalformed(format!("page spec term {:?} is not a page number or range", term))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_ranges_and_singletons() {
        let groups = parse_page_spec("1-3,5,7-9", 10).unwrap();
        assert_eq!(groups, vec![vec![1, 2, 3], vec![5], vec![7, 8, 9]]);
    }

    #[test]
    fn out_of_range_page_is_rejected() {
        let err = parse_page_spec("1-3,11", 10).unwrap_err();
        assert!(matches!(err, Error::PageOutOfRange { page: 11, page_count: 10 }));
    }

    #[test]
    fn reversed_range_is_malformed() {
        assert!(parse_page_spec("5-2", 10).is_err());
    }
}
