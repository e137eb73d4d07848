//! The cell "props" string: `font:size:style:align:bl:br:bt:bb`.
//!
//! `style` is three ASCII digits (bold, italic, underline). `align` is one of
//! `left`/`center`/`right`. The four border flags are `0`/`1`. Any malformed
//! input falls back to `Helvetica:12:000:left:0:0:0:0`.

use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellProps {
    pub font: String,
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub align: Align,
    pub border_left: bool,
    pub border_right: bool,
    pub border_top: bool,
    pub border_bottom: bool,
}

impl Default for CellProps {
    fn default() -> Self {
        CellProps {
            font: "Helvetica".to_owned(),
            size: 12.0,
            bold: false,
            italic: false,
            underline: false,
            align: Align::Left,
            border_left: false,
            border_right: false,
            border_top: false,
            border_bottom: false,
        }
    }
}

impl CellProps {
    /// Parse a props string, returning the documented defaults (and `false`) on
    /// any malformed input rather than an error; callers are expected to record
    /// a `props-malformed` warning when this returns `false`.
    pub fn parse(raw: &str) -> (Self, bool) {
        match Self::try_parse(raw) {
            Some(props) => (props, true),
            None => (Self::default(), false),
        }
    }

    fn try_parse(raw: &str) -> Option<Self> {
        let fields: Vec<&str> = raw.split(':').collect();
        if fields.len() != 8 {
            return None;
        }
        let font = fields[0].to_owned();
        let size = fields[1].parse::<f32>().ok()?;
        let style = fields[2].as_bytes();
        if style.len() != 3 {
            return None;
        }
        let bold = flag(style[0])?;
        let italic = flag(style[1])?;
        let underline = flag(style[2])?;
        let align = match fields[3] {
            "left" => Align::Left,
            "center" => Align::Center,
            "right" => Align::Right,
            _ => return None,
        };
        let border_left = bit(fields[4])?;
        let border_right = bit(fields[5])?;
        let border_top = bit(fields[6])?;
        let border_bottom = bit(fields[7])?;
        Some(CellProps {
            font,
            size,
            bold,
            italic,
            underline,
            align,
            border_left,
            border_right,
            border_top,
            border_bottom,
        })
    }
}

fn flag(byte: u8) -> Option<bool> {
    match byte {
        b'0' => Some(false),
        b'1' => Some(true),
        _ => None,
    }
}

fn bit(field: &str) -> Option<bool> {
    match field {
        "0" => Some(false),
        "1" => Some(true),
        _ => None,
    }
}

impl FromStr for CellProps {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::try_parse(raw).ok_or(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_props() {
        let (props, ok) = CellProps::parse("Helvetica:12:100:center:1:0:1:0");
        assert!(ok);
        assert_eq!(props.font, "Helvetica");
        assert_eq!(props.size, 12.0);
        assert!(props.bold);
        assert!(!props.italic);
        assert!(!props.underline);
        assert_eq!(props.align, Align::Center);
        assert!(props.border_left);
        assert!(!props.border_right);
        assert!(props.border_top);
        assert!(!props.border_bottom);
    }

    #[test]
    fn falls_back_to_defaults_on_short_input() {
        let (props, ok) = CellProps::parse("Helvetica:12:000:left");
        assert!(!ok);
        assert_eq!(props, CellProps::default());
    }

    #[test]
    fn falls_back_to_defaults_on_bad_align() {
        let (props, ok) = CellProps::parse("Helvetica:12:000:middle:0:0:0:0");
        assert!(!ok);
        assert_eq!(props, CellProps::default());
    }
}
