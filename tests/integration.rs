//! End-to-end coverage of the pipeline's observable output: `generate`
//! produces bytes whose xref, page tree, and trailer agree with each other,
//! and the public mutators round-trip against that output.

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

fn count(haystack: &[u8], needle: &[u8]) -> usize {
    let mut n = 0;
    let mut start = 0;
    while let Some(pos) = find(&haystack[start..], needle) {
        n += 1;
        start += pos + needle.len();
    }
    n
}

/// Pulls the four numbers out of a `/MediaBox [a b c d]` array.
fn media_box(pdf: &[u8]) -> [f32; 4] {
    let key = b"/MediaBox [";
    let start = find(pdf, key).expect("no /MediaBox in output") + key.len();
    let end = find(&pdf[start..], b"]").expect("unterminated /MediaBox") + start;
    let text = std::str::from_utf8(&pdf[start..end]).unwrap();
    let mut numbers = text.split_whitespace().map(|s| s.parse::<f32>().unwrap());
    [
        numbers.next().unwrap(),
        numbers.next().unwrap(),
        numbers.next().unwrap(),
        numbers.next().unwrap(),
    ]
}

/// Parses a classical `xref` table's `n`-entries into `(object_number, offset)`.
fn xref_offsets(pdf: &[u8]) -> Vec<(u32, u32)> {
    let xref_pos = find(pdf, b"\nxref\n").expect("no xref table") + 1;
    let rest = std::str::from_utf8(&pdf[xref_pos..]).unwrap();
    let mut lines = rest.lines();
    let header = lines.next().unwrap(); // "xref"
    assert_eq!(header, "xref");
    let subsection = lines.next().unwrap(); // "0 <size>"
    let mut parts = subsection.split_whitespace();
    let first: u32 = parts.next().unwrap().parse().unwrap();
    let size: u32 = parts.next().unwrap().parse().unwrap();

    let mut result = Vec::new();
    for (i, line) in lines.take(size as usize).enumerate() {
        let object_number = first + i as u32;
        if line.trim_end().ends_with('n') {
            let offset: u32 = line[..10].parse().unwrap();
            result.push((object_number, offset));
        }
    }
    result
}

fn minimal_title_json() -> &'static str {
    r#"{
        "config": {"page": "A4", "pageAlignment": 1},
        "title": {"props": "Helvetica:18:100:center:0:0:0:0", "text": "Hello"}
    }"#
}

#[test]
fn minimal_title_is_one_a4_page_with_the_title_text() {
    let (pdf, warnings) = folium::generate(minimal_title_json().as_bytes()).unwrap();
    assert!(warnings.is_empty());
    assert!(pdf.starts_with(b"%PDF-1.7"));
    assert_eq!(media_box(&pdf), [0.0, 0.0, 595.0, 842.0]);
    assert_eq!(count(&pdf, b"/Type /Page "), 1, "expected exactly one page object");
    assert!(find(&pdf, b"Hello").is_some(), "title text not found in output bytes");
}

#[test]
fn every_xref_offset_points_at_its_own_object_header() {
    let (pdf, _) = folium::generate(minimal_title_json().as_bytes()).unwrap();
    let entries = xref_offsets(&pdf);
    assert!(!entries.is_empty());
    for (object_number, offset) in entries {
        let header = format!("{} 0 obj", object_number);
        let region = &pdf[offset as usize..offset as usize + header.len()];
        assert_eq!(
            std::str::from_utf8(region).unwrap(),
            header,
            "xref offset for object {} does not point at its header",
            object_number
        );
    }
}

#[test]
fn trailer_root_resolves_to_a_catalog() {
    let (pdf, _) = folium::generate(minimal_title_json().as_bytes()).unwrap();
    let trailer_pos = find(&pdf, b"trailer\n").unwrap();
    let trailer_text = std::str::from_utf8(&pdf[trailer_pos..]).unwrap();
    let root_key = "/Root ";
    let root_start = trailer_text.find(root_key).unwrap() + root_key.len();
    let root_number: u32 = trailer_text[root_start..]
        .split_whitespace()
        .next()
        .unwrap()
        .parse()
        .unwrap();

    let header = format!("{} 0 obj", root_number);
    let header_pos = find(&pdf, header.as_bytes()).unwrap();
    let object_text = std::str::from_utf8(&pdf[header_pos..header_pos + 400]).unwrap();
    assert!(object_text.contains("/Type /Catalog"));
}

#[test]
fn merging_a_single_document_is_the_identity() {
    let (pdf, _) = folium::generate(minimal_title_json().as_bytes()).unwrap();
    let merged = folium::merge(&[pdf.clone()]).unwrap();
    assert_eq!(merged, pdf);
}

#[test]
fn a_200_row_table_paginates_into_multiple_pages() {
    let mut rows = String::new();
    for i in 0..200 {
        rows.push_str(&format!(
            r#"{{"height":1.0,"cells":[{{"props":"Helvetica:12:000:left:1:1:1:1","text":"row {}"}}]}}"#,
            i
        ));
        if i != 199 {
            rows.push(',');
        }
    }
    let json = format!(
        r#"{{"config":{{"page":"A4","pageAlignment":1}},
            "elements":[{{"type":"table","table":{{"maxcolumns":1,"columnwidths":[1],"rows":[{}]}}}}]}}"#,
        rows
    );
    let (pdf, _) = folium::generate(json.as_bytes()).unwrap();
    let page_count = count(&pdf, b"/Type /Page ");
    assert!(page_count >= 6, "expected at least 6 pages for 200 rows, got {}", page_count);
}

#[test]
fn splitting_a_multi_page_document_keeps_requested_pages() {
    let mut rows = String::new();
    for i in 0..60 {
        rows.push_str(&format!(
            r#"{{"height":1.0,"cells":[{{"props":"Helvetica:12:000:left:1:1:1:1","text":"row {}"}}]}}"#,
            i
        ));
        if i != 59 {
            rows.push(',');
        }
    }
    let json = format!(
        r#"{{"config":{{"page":"A4","pageAlignment":1}},
            "elements":[{{"type":"table","table":{{"maxcolumns":1,"columnwidths":[1],"rows":[{}]}}}}]}}"#,
        rows
    );
    let (pdf, _) = folium::generate(json.as_bytes()).unwrap();
    let total_pages = count(&pdf, b"/Type /Page ");
    assert!(total_pages >= 2);

    let parts = folium::split(&pdf, "1").unwrap();
    assert_eq!(parts.len(), 1);
    assert_eq!(count(&parts[0], b"/Type /Page "), 1);
}

#[test]
fn encrypted_generation_adds_an_encrypt_entry_and_hides_plaintext() {
    let json = r#"{
        "config": {
            "page": "A4",
            "pageAlignment": 1,
            "security": {"enabled": true, "ownerPassword": "owner", "userPassword": "", "allowCopying": false}
        },
        "title": {"props": "Helvetica:18:100:center:0:0:0:0", "text": "Confidential"}
    }"#;
    let (pdf, _) = folium::generate(json.as_bytes()).unwrap();
    assert!(find(&pdf, b"/Encrypt").is_some());
    assert!(find(&pdf, b"Confidential").is_none(), "title text leaked into an encrypted stream");
}
