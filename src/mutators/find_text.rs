//! Find text occurrences (`spec.md` §4.6): "same tokenizer as the redaction
//! engine" — this module is a thin read-only wrapper around
//! `security::redaction::tokenize` that reports match rectangles instead of
//! applying them.

use crate::error::Result;
use crate::mutators::reader::ParsedDocument;
use crate::security::tokenize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMatch {
    pub page: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

pub fn find_text(pdf_bytes: &[u8], query: &str) -> Result<Vec<TextMatch>> {
    let doc = ParsedDocument::parse(pdf_bytes)?;
    let mut matches = Vec::new();
    for (page_index, &page_num) in doc.page_object_numbers()?.iter().enumerate() {
        let page = doc.object(page_num)?;
        let contents_ref = match page.dict.get("Contents").and_then(|v| v.as_reference()) {
            Some((num, _)) => num,
            None => continue,
        };
        let content = match doc.object(contents_ref)?.stream {
            Some(bytes) => bytes,
            None => continue,
        };
        for show in tokenize(&content) {
            if show.decodable && show.text.contains(query) {
                matches.push(TextMatch {
                    page: page_index,
                    x: show.rect.x,
                    y: show.rect.y,
                    width: show.rect.w,
                    height: show.rect.h,
                });
            }
        }
    }
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hand-built single-page classical-xref PDF with an uncompressed
    /// content stream, for exercising the reader/tokenizer pair without a
    /// full assembler pass.
    fn minimal_single_page_pdf(content: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(b"%PDF-1.7\n");
        let mut offsets = Vec::new();

        offsets.push(body.len());
        body.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

        offsets.push(body.len());
        body.extend_from_slice(b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n");

        offsets.push(body.len());
        body.extend_from_slice(
            b"3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << >> >>\nendobj\n",
        );

        offsets.push(body.len());
        body.extend_from_slice(format!("4 0 obj\n<< /Length {} >>\nstream\n", content.len()).as_bytes());
        body.extend_from_slice(content);
        body.extend_from_slice(b"\nendstream\nendobj\n");

        let xref_offset = body.len();
        body.extend_from_slice(format!("xref\n0 {}\n", offsets.len() + 1).as_bytes());
        body.extend_from_slice(b"0000000000 65535 f \n");
        for offset in &offsets {
            body.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        body.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF",
                offsets.len() + 1,
                xref_offset
            )
            .as_bytes(),
        );
        body
    }

    #[test]
    fn finds_a_known_phrase() {
        let pdf = minimal_single_page_pdf(b"BT /F1 12 Tf 1 0 0 1 50 700 Tm (Quarterly Report) Tj ET");
        let matches = find_text(&pdf, "Quarterly").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].page, 0);
    }

    #[test]
    fn no_match_returns_empty() {
        let pdf = minimal_single_page_pdf(b"BT /F1 12 Tf 1 0 0 1 50 700 Tm (Quarterly Report) Tj ET");
        assert!(find_text(&pdf, "Nonexistent").unwrap().is_empty());
    }
}
