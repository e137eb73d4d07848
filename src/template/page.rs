//! Page size, orientation, borders, and margins.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PageSize {
    A3,
    A4,
    A5,
    Letter,
    Legal,
}

impl PageSize {
    /// Width and height in points, portrait orientation.
    pub fn dimensions_pt(self) -> (f32, f32) {
        match self {
            PageSize::A3 => (842.0, 1191.0),
            PageSize::A4 => (595.0, 842.0),
            PageSize::A5 => (420.0, 595.0),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
        }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::A4
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[repr(u8)]
pub enum Orientation {
    Portrait = 1,
    Landscape = 2,
}

impl Default for Orientation {
    fn default() -> Self {
        Orientation::Portrait
    }
}

/// Four colon-separated integers `"L:R:T:B"`. Missing or non-numeric fields
/// default to `0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBorders {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl Default for PageBorders {
    fn default() -> Self {
        PageBorders { left: 0, right: 0, top: 0, bottom: 0 }
    }
}

/// Four colon-separated floats `"L:R:T:B"` in points. Missing or non-numeric
/// fields default to `72`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Default for Margins {
    fn default() -> Self {
        Margins { left: 72.0, right: 72.0, top: 72.0, bottom: 72.0 }
    }
}

fn parse_four<T, F>(raw: &str, default: T, parse_one: F) -> (T, T, T, T)
where
    T: Copy,
    F: Fn(&str) -> Option<T>,
{
    let fields: Vec<&str> = raw.split(':').collect();
    let at = |i: usize| fields.get(i).and_then(|s| parse_one(s)).unwrap_or(default);
    (at(0), at(1), at(2), at(3))
}

impl PageBorders {
    pub fn parse(raw: &str) -> Self {
        let (left, right, top, bottom) = parse_four(raw, 0u32, |s| s.parse().ok());
        PageBorders { left, right, top, bottom }
    }
}

impl Margins {
    pub fn parse(raw: &str) -> Self {
        let (left, right, top, bottom) = parse_four(raw, 72.0f32, |s| s.parse().ok());
        Margins { left, right, top, bottom }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn borders_default_on_garbage() {
        let borders = PageBorders::parse("1:x:3");
        assert_eq!(borders, PageBorders { left: 1, right: 0, top: 3, bottom: 0 });
    }

    #[test]
    fn margins_default_to_72() {
        let margins = Margins::parse("");
        assert_eq!(margins, Margins::default());
    }
}
