//! Image decoding for cell/element images (`spec.md` §4.3 "Images"):
//! base64 payload -> pixel dimensions + a content hash for deduplication.

use crate::diagnostics::{Diagnostics, Warning};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

#[derive(Clone)]
pub struct ImageResource {
    pub content_hash: u64,
    pub bytes: Vec<u8>,
    pub is_jpeg: bool,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

pub fn decode_image(name: &str, base64_data: &str, diagnostics: &mut Diagnostics) -> Option<ImageResource> {
    let bytes = match base64::decode(base64_data) {
        Ok(bytes) => bytes,
        Err(err) => {
            diagnostics.push(Warning::ImageDecodeError { name: name.to_owned(), reason: err.to_string() });
            return None;
        }
    };
    let is_jpeg = bytes.starts_with(&[0xFF, 0xD8]);
    let dimensions = match image::load_from_memory(&bytes) {
        Ok(decoded) => {
            use image::GenericImageView;
            decoded.dimensions()
        }
        Err(err) => {
            diagnostics.push(Warning::ImageDecodeError { name: name.to_owned(), reason: err.to_string() });
            return None;
        }
    };
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    Some(ImageResource {
        content_hash: hasher.finish(),
        bytes,
        is_jpeg,
        pixel_width: dimensions.0,
        pixel_height: dimensions.1,
    })
}

/// Scale `(natural_w, natural_h)` to fit within `(max_w, max_h)` preserving
/// aspect ratio.
pub fn fit_aspect(natural_w: f32, natural_h: f32, max_w: f32, max_h: f32) -> (f32, f32) {
    if natural_w <= 0.0 || natural_h <= 0.0 {
        return (max_w, max_h);
    }
    let scale = (max_w / natural_w).min(max_h / natural_h);
    (natural_w * scale, natural_h * scale)
}
