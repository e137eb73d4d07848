//! Minimal structural PDF reader: parses just
//! enough of an existing PDF — trailer, classical xref table, page tree,
//! `/Resources`, `/AcroForm`, and content streams — to support merge, split,
//! form-fill, find-text, and redaction. Not a general object-model parser:
//! cross-reference *streams* (PDF 1.5+ compressed xref) are out of scope
//! — this crate only ever reads PDFs it or a compatible classical-xref writer
//! produced.
//!
//! Follows the same byte-oriented approach to PDF syntax that
//! `serializer/object.rs` writes, rather than pulling in a parser crate —
//! there's no dependency in this stack that parses PDF back down to objects.

use crate::error::{Error, Result};
use flate2::read::ZlibDecoder;
use std::collections::HashMap;
use std::io::Read;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PdfValue {
    Null,
    Bool(bool),
    Number(f64),
    Name(String),
    LiteralString(Vec<u8>),
    HexString(Vec<u8>),
    Array(Vec<PdfValue>),
    Dictionary(HashMap<String, PdfValue>),
    Reference(u32, u16),
}

impl PdfValue {
    pub fn as_dict(&self) -> Option<&HashMap<String, PdfValue>> {
        match self {
            PdfValue::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[PdfValue]> {
        match self {
            PdfValue::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            PdfValue::Name(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PdfValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<(u32, u16)> {
        match self {
            PdfValue::Reference(n, g) => Some((*n, *g)),
            _ => None,
        }
    }

    pub fn as_literal_string(&self) -> Option<&[u8]> {
        match self {
            PdfValue::LiteralString(bytes) => Some(bytes),
            _ => None,
        }
    }
}

pub(crate) struct ParsedObject {
    pub dict: HashMap<String, PdfValue>,
    pub stream: Option<Vec<u8>>,
}

pub(crate) struct ParsedDocument {
    bytes: Vec<u8>,
    offsets: HashMap<u32, usize>,
    pub trailer: HashMap<String, PdfValue>,
}

impl ParsedDocument {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let trailer_pos = rfind(bytes, b"trailer")
            .ok_or_else(|| Error::PdfMalformed("no trailer keyword found".into()))?;
        let mut cursor = Cursor { bytes, pos: trailer_pos + b"trailer".len() };
        cursor.skip_whitespace();
        let trailer = match cursor.parse_value()? {
            PdfValue::Dictionary(d) => d,
            _ => return Err(Error::PdfMalformed("trailer is not a dictionary".into())),
        };

        let startxref_pos = rfind(bytes, b"startxref")
            .ok_or_else(|| Error::PdfMalformed("no startxref keyword found".into()))?;
        let mut sx_cursor = Cursor { bytes, pos: startxref_pos + b"startxref".len() };
        sx_cursor.skip_whitespace();
        let xref_offset = sx_cursor.parse_integer()? as usize;

        let offsets = parse_classical_xref(bytes, xref_offset)?;
        Ok(ParsedDocument { bytes: bytes.to_vec(), offsets, trailer })
    }

    pub fn object_numbers(&self) -> Vec<u32> {
        let mut numbers: Vec<u32> = self.offsets.keys().copied().collect();
        numbers.sort_unstable();
        numbers
    }

    pub fn resolve(&self, value: &PdfValue) -> Result<PdfValue> {
        match value {
            PdfValue::Reference(num, _) => Ok(PdfValue::Dictionary(self.object(*num)?.dict)),
            other => Ok(other.clone()),
        }
    }

    pub fn object(&self, number: u32) -> Result<ParsedObject> {
        let offset = *self
            .offsets
            .get(&number)
            .ok_or_else(|| Error::PdfMalformed(format!("object {} not in xref", number)))?;
        let mut cursor = Cursor { bytes: &self.bytes, pos: offset };
        cursor.parse_integer()?; // object number
        cursor.skip_whitespace();
        cursor.parse_integer()?; // generation
        cursor.skip_whitespace();
        cursor.expect_keyword(b"obj")?;
        cursor.skip_whitespace();
        let dict = match cursor.parse_value()? {
            PdfValue::Dictionary(d) => d,
            other => {
                let mut d = HashMap::new();
                d.insert("__scalar".to_owned(), other);
                d
            }
        };
        cursor.skip_whitespace();
        let stream = if cursor.peek_keyword(b"stream") {
            cursor.expect_keyword(b"stream")?;
            if cursor.bytes.get(cursor.pos) == Some(&b'\r') {
                cursor.pos += 1;
            }
            if cursor.bytes.get(cursor.pos) == Some(&b'\n') {
                cursor.pos += 1;
            }
            let length = dict
                .get("Length")
                .and_then(|v| v.as_number())
                .ok_or_else(|| Error::PdfMalformed("stream missing /Length".into()))? as usize;
            let raw = cursor.bytes[cursor.pos..cursor.pos + length].to_vec();
            let decoded = if dict.get("Filter").and_then(|v| v.as_name()) == Some("FlateDecode") {
                inflate(&raw)?
            } else {
                raw
            };
            Some(decoded)
        } else {
            None
        };
        Ok(ParsedObject { dict, stream })
    }

    /// Walks `/Root/Pages` depth-first and returns every leaf page's object number.
    pub fn page_object_numbers(&self) -> Result<Vec<u32>> {
        let root_ref = self
            .trailer
            .get("Root")
            .ok_or_else(|| Error::PdfMalformed("trailer missing /Root".into()))?;
        let (root_num, _) =
            root_ref.as_reference().ok_or_else(|| Error::PdfMalformed("/Root is not a reference".into()))?;
        let root = self.object(root_num)?;
        let pages_ref = root
            .dict
            .get("Pages")
            .ok_or_else(|| Error::PdfMalformed("catalog missing /Pages".into()))?;
        let (pages_num, _) =
            pages_ref.as_reference().ok_or_else(|| Error::PdfMalformed("/Pages is not a reference".into()))?;
        let mut out = Vec::new();
        self.collect_pages(pages_num, &mut out)?;
        Ok(out)
    }

    fn collect_pages(&self, number: u32, out: &mut Vec<u32>) -> Result<()> {
        let node = self.object(number)?;
        match node.dict.get("Type").and_then(|v| v.as_name()) {
            Some("Page") => out.push(number),
            _ => {
                let kids = node
                    .dict
                    .get("Kids")
                    .and_then(|v| v.as_array())
                    .ok_or_else(|| Error::PdfMalformed("page tree node missing /Kids".into()))?;
                for kid in kids {
                    if let Some((num, _)) = kid.as_reference() {
                        self.collect_pages(num, out)?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).map_err(|e| Error::PdfMalformed(format!("inflate failed: {}", e)))?;
    Ok(out)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (0..=haystack.len() - needle.len()).rev().find(|&i| &haystack[i..i + needle.len()] == needle)
}

fn parse_classical_xref(bytes: &[u8], offset: usize) -> Result<HashMap<u32, usize>> {
    let mut cursor = Cursor { bytes, pos: offset };
    cursor.expect_keyword(b"xref")?;
    cursor.skip_whitespace();
    let mut offsets = HashMap::new();
    loop {
        if cursor.peek_keyword(b"trailer") || cursor.pos >= bytes.len() {
            break;
        }
        let start = cursor.parse_integer()? as u32;
        cursor.skip_whitespace();
        let count = cursor.parse_integer()? as u32;
        cursor.skip_whitespace();
        for i in 0..count {
            let entry_start = cursor.pos;
            let line = &bytes[entry_start..entry_start + 20.min(bytes.len() - entry_start)];
            let text = String::from_utf8_lossy(line);
            let mut fields = text.split_whitespace();
            let entry_offset: usize = fields.next().unwrap_or("0").parse().unwrap_or(0);
            let _generation = fields.next();
            let kind = fields.next().unwrap_or("f");
            if kind == "n" {
                offsets.insert(start + i, entry_offset);
            }
            cursor.pos += 20;
        }
        cursor.skip_whitespace();
    }
    Ok(offsets)
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else if b == b'%' {
                while self.peek().map(|b| b != b'\n').unwrap_or(false) {
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    fn peek_keyword(&self, keyword: &[u8]) -> bool {
        self.bytes[self.pos..].starts_with(keyword)
    }

    fn expect_keyword(&mut self, keyword: &[u8]) -> Result<()> {
        if self.peek_keyword(keyword) {
            self.pos += keyword.len();
            Ok(())
        } else {
            Err(Error::PdfMalformed(format!("expected {:?}", String::from_utf8_lossy(keyword))))
        }
    }

    fn parse_integer(&mut self) -> Result<i64> {
        self.skip_whitespace();
        let start = self.pos;
        if self.peek() == Some(b'-') || self.peek() == Some(b'+') {
            self.pos += 1;
        }
        while self.peek().map(|b| b.is_ascii_digit()).unwrap_or(false) {
            self.pos += 1;
        }
        std::str::from_utf8(&self.bytes[start..self.pos])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| Error::PdfMalformed("expected integer".into()))
    }

    fn parse_number(&mut self) -> Result<f64> {
        self.skip_whitespace();
        let start = self.pos;
        if self.peek() == Some(b'-') || self.peek() == Some(b'+') {
            self.pos += 1;
        }
        while self.peek().map(|b| b.is_ascii_digit() || b == b'.').unwrap_or(false) {
            self.pos += 1;
        }
        std::str::from_utf8(&self.bytes[start..self.pos])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| Error::PdfMalformed("expected number".into()))
    }

    /// Parses one PDF object value, resolving `N G R` reference triples by
    /// look-ahead rather than backtracking.
    fn parse_value(&mut self) -> Result<PdfValue> {
        self.skip_whitespace();
        match self.peek() {
            Some(b'/') => {
                self.pos += 1;
                let start = self.pos;
                while self
                    .peek()
                    .map(|b| !b.is_ascii_whitespace() && !b"/()<>[]".contains(&b))
                    .unwrap_or(false)
                {
                    self.pos += 1;
                }
                Ok(PdfValue::Name(String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned()))
            }
            Some(b'(') => {
                self.pos += 1;
                let start = self.pos;
                let mut depth = 1;
                while depth > 0 && self.pos < self.bytes.len() {
                    match self.bytes[self.pos] {
                        b'\\' => self.pos += 1,
                        b'(' => depth += 1,
                        b')' => depth -= 1,
                        _ => {}
                    }
                    self.pos += 1;
                }
                Ok(PdfValue::LiteralString(self.bytes[start..self.pos - 1].to_vec()))
            }
            Some(b'<') if self.bytes.get(self.pos + 1) == Some(&b'<') => {
                self.pos += 2;
                let mut map = HashMap::new();
                loop {
                    self.skip_whitespace();
                    if self.peek_keyword(b">>") {
                        self.pos += 2;
                        break;
                    }
                    let key = match self.parse_value()? {
                        PdfValue::Name(n) => n,
                        _ => return Err(Error::PdfMalformed("dictionary key is not a name".into())),
                    };
                    let value = self.parse_value()?;
                    map.insert(key, value);
                }
                Ok(PdfValue::Dictionary(map))
            }
            Some(b'<') => {
                self.pos += 1;
                let start = self.pos;
                while self.peek().map(|b| b != b'>').unwrap_or(false) {
                    self.pos += 1;
                }
                let hex_text: String =
                    String::from_utf8_lossy(&self.bytes[start..self.pos]).chars().filter(|c| !c.is_whitespace()).collect();
                self.pos += 1;
                Ok(PdfValue::HexString(hex::decode(hex_text).unwrap_or_default()))
            }
            Some(b'[') => {
                self.pos += 1;
                let mut items = Vec::new();
                loop {
                    self.skip_whitespace();
                    if self.peek() == Some(b']') {
                        self.pos += 1;
                        break;
                    }
                    items.push(self.parse_value()?);
                }
                Ok(PdfValue::Array(items))
            }
            Some(b't') if self.peek_keyword(b"true") => {
                self.pos += 4;
                Ok(PdfValue::Bool(true))
            }
            Some(b'f') if self.peek_keyword(b"false") => {
                self.pos += 5;
                Ok(PdfValue::Bool(false))
            }
            Some(b'n') if self.peek_keyword(b"null") => {
                self.pos += 4;
                Ok(PdfValue::Null)
            }
            Some(b) if b.is_ascii_digit() || b == b'-' || b == b'+' || b == b'.' => {
                let checkpoint = self.pos;
                let first = self.parse_number()?;
                let checkpoint_after_first = self.pos;
                self.skip_whitespace();
                if self.peek().map(|b| b.is_ascii_digit()).unwrap_or(false) {
                    let second_checkpoint = self.pos;
                    if let Ok(generation) = self.parse_integer() {
                        self.skip_whitespace();
                        if self.peek() == Some(b'R')
                            && self.bytes.get(self.pos + 1).map(|b| !b.is_ascii_alphanumeric()).unwrap_or(true)
                        {
                            self.pos += 1;
                            return Ok(PdfValue::Reference(first as u32, generation as u16));
                        }
                    }
                    self.pos = second_checkpoint;
                }
                self.pos = checkpoint_after_first;
                let _ = checkpoint;
                Ok(PdfValue::Number(first))
            }
            other => Err(Error::PdfMalformed(format!("unexpected byte {:?} at {}", other, self.pos))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_and_number() {
        let bytes = b"/Type /Page 42 0 R";
        let mut cursor = Cursor { bytes, pos: 0 };
        assert_eq!(cursor.parse_value().unwrap(), PdfValue::Name("Type".into()));
        assert_eq!(cursor.parse_value().unwrap(), PdfValue::Name("Page".into()));
        assert_eq!(cursor.parse_value().unwrap(), PdfValue::Reference(42, 0));
    }

    #[test]
    fn parses_nested_dictionary() {
        let bytes = b"<< /MediaBox [0 0 612 792] /Resources << /Font << >> >> >>";
        let mut cursor = Cursor { bytes, pos: 0 };
        let value = cursor.parse_value().unwrap();
        let dict = value.as_dict().unwrap();
        assert!(dict.contains_key("MediaBox"));
        assert!(dict.contains_key("Resources"));
    }

    #[test]
    fn missing_trailer_is_malformed() {
        assert!(ParsedDocument::parse(b"not a pdf").is_err());
    }
}
