use crate::text;

/// Origin at the top-left corner of a page, unit `1pt` (1/72 inch), matching
/// the unit the PDF page content stream and `/MediaBox` are expressed in.
pub struct Pt;

pub use euclid::rect;
pub use euclid::point2 as point;
pub type Length<U> = euclid::Length<f32, U>;
pub type Point<U> = euclid::TypedPoint2D<f32, U>;
pub type Size<U> = euclid::TypedSize2D<f32, U>;
pub type Rect<U> = euclid::TypedRect<f32, U>;
pub type SideOffsets<U> = euclid::TypedSideOffsets2D<f32, U>;
pub type Scale<Src, Dest> = euclid::TypedScale<f32, Src, Dest>;

#[derive(Copy, Clone, PartialEq)]
pub struct RGBA(pub f32, pub f32, pub f32, pub f32);

impl RGBA {
    pub const BLACK: RGBA = RGBA(0., 0., 0., 1.);
    pub const WHITE: RGBA = RGBA(1., 1., 1., 1.);
}

pub struct TextRun {
    pub segment: text::ShapedSegment,
    pub font_size: Length<Pt>,
    pub origin: Point<Pt>,
}
