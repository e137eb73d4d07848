//! Form fill: parses an XFDF payload and patches the
//! matching AcroForm widgets' `/V` in place, clearing `/AP` and setting
//! `/NeedAppearances true` so the viewer regenerates appearances rather than
//! this crate having to render glyphs into an appearance stream itself.
//!
//! Follows `victor`'s `dom/xml.rs` `xml_rs::EventReader` walk for the
//! XFDF parse; the dictionary patch itself reuses `mutators::rewrite`'s
//! `dict_overrides`, the same mechanism `split.rs` uses for its `/Pages`
//! override.

use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{Error, Result};
use crate::mutators::reader::{ParsedDocument, PdfValue};
use crate::mutators::rewrite;
use std::collections::HashMap;
use xml_rs::reader::XmlEvent;

/// `name -> value` pairs parsed out of an XFDF `<fields>` tree, keyed by the
/// dotted hierarchical name (`"parent.child"`) XFDF nesting implies.
fn parse_xfdf(xfdf: &[u8]) -> Result<HashMap<String, String>> {
    let mut values = HashMap::new();
    let mut name_stack: Vec<String> = Vec::new();
    let mut in_value = false;
    let mut current_value = String::new();

    for event in xml_rs::EventReader::new(xfdf) {
        let event = event.map_err(|e| Error::PdfMalformed(format!("invalid XFDF: {}", e)))?;
        match event {
            XmlEvent::StartElement { name, attributes, .. } => match name.local_name.as_str() {
                "field" => {
                    let field_name = attributes
                        .iter()
                        .find(|a| a.name.local_name == "name")
                        .map(|a| a.value.clone())
                        .ok_or_else(|| Error::PdfMalformed("XFDF <field> missing name attribute".into()))?;
                    name_stack.push(field_name);
                }
                "value" => {
                    in_value = true;
                    current_value.clear();
                }
                _ => {}
            },
            XmlEvent::Characters(text) | XmlEvent::CData(text) if in_value => {
                current_value.push_str(&text);
            }
            XmlEvent::EndElement { name } => match name.local_name.as_str() {
                "value" => {
                    in_value = false;
                    if let Some(dotted) = name_stack.last() {
                        values.insert(dotted.clone(), current_value.clone());
                    }
                }
                "field" => {
                    name_stack.pop();
                }
                _ => {}
            },
            _ => {}
        }
    }
    Ok(values)
}

/// Applies every `<field>/<value>` pair in `xfdf` to `pdf_bytes`'s AcroForm,
/// returning the patched document and any non-fatal warnings.
pub fn fill(pdf_bytes: &[u8], xfdf: &[u8]) -> Result<(Vec<u8>, Vec<String>)> {
    let values = parse_xfdf(xfdf)?;
    let doc = ParsedDocument::parse(pdf_bytes)?;

    let (root_num, _) =
        doc.trailer.get("Root").and_then(|v| v.as_reference()).ok_or_else(|| Error::PdfMalformed("trailer missing /Root".into()))?;
    let root = doc.object(root_num)?;
    let (acroform_num, _) = root
        .dict
        .get("AcroForm")
        .and_then(|v| v.as_reference())
        .ok_or_else(|| Error::PdfMalformed("document has no AcroForm".into()))?;
    let acroform = doc.object(acroform_num)?;
    let field_refs = acroform
        .dict
        .get("Fields")
        .and_then(|v| v.as_array())
        .ok_or_else(|| Error::PdfMalformed("AcroForm missing /Fields".into()))?;

    let mut field_by_name: HashMap<String, u32> = HashMap::new();
    for field in field_refs {
        if let Some((num, _)) = field.as_reference() {
            let widget = doc.object(num)?;
            if let Some(name) = widget.dict.get("T").and_then(|v| v.as_literal_string()) {
                field_by_name.insert(String::from_utf8_lossy(name).into_owned(), num);
            }
        }
    }

    let mut diagnostics = Diagnostics::new();
    let mut dict_overrides: HashMap<u32, HashMap<String, PdfValue>> = HashMap::new();

    for (name, value) in &values {
        let field_num = match field_by_name.get(name) {
            Some(&num) => num,
            None => {
                diagnostics.push(Warning::UnknownFormField { name: name.clone() });
                continue;
            }
        };
        let widget = doc.object(field_num)?;
        let mut bytes = value.clone().into_bytes();
        if let Some(max_len) = widget.dict.get("MaxLen").and_then(|v| v.as_number()) {
            bytes.truncate(max_len as usize);
        }
        let mut overrides = HashMap::new();
        overrides.insert("V".to_owned(), PdfValue::LiteralString(bytes));
        overrides.insert("AP".to_owned(), PdfValue::Null);
        dict_overrides.insert(field_num, overrides);
    }

    let mut acroform_override = HashMap::new();
    acroform_override.insert("NeedAppearances".to_owned(), PdfValue::Bool(true));
    dict_overrides.insert(acroform_num, acroform_override);

    let patched = rewrite::rewrite(&doc, &HashMap::new(), &dict_overrides)?;
    let warnings = diagnostics.into_warnings().iter().map(|w| w.to_string()).collect();
    Ok((patched, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_field_values() {
        let xfdf = br#"<?xml version="1.0"?>
        <xfdf xmlns="http://ns.adobe.com/xfdf/">
          <fields>
            <field name="name"><value>Jane Doe</value></field>
            <field name="address">
              <field name="city"><value>Springfield</value></field>
            </field>
          </fields>
        </xfdf>"#;
        let values = parse_xfdf(xfdf).unwrap();
        assert_eq!(values.get("name").unwrap(), "Jane Doe");
        assert_eq!(values.get("city").unwrap(), "Springfield");
    }
}
