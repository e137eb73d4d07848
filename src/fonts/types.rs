//! Scalar field types used by the sfnt table layouts in `tables.rs`.

use crate::fonts::parsing::ReadFromBytes;
use crate::fonts::{Em, FontDesignUnit, FontError};
use std::fmt;

pub(in crate::fonts) type FontDesignUnitsPerEmFactorU16 =
    euclid::TypedScale<u16, Em, FontDesignUnit>;

pub(in crate::fonts) type FWord = euclid::Length<i16, FontDesignUnit>;
pub(in crate::fonts) type UFWord = euclid::Length<u16, FontDesignUnit>;

/// 32-bit signed fixed-point number (16.16). Only the raw bits are kept; no
/// table we read needs the fractional part.
#[derive(Debug, Copy, Clone)]
pub(in crate::fonts) struct FixedPoint(pub u32);

/// Instant in time as seconds since 1904-01-01 midnight UTC.
#[derive(Debug, Copy, Clone)]
pub(in crate::fonts) struct LongDateTime(pub i64);

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(in crate::fonts) struct Tag(pub [u8; 4]);

impl Tag {
    pub(in crate::fonts) const fn new(tag: &[u8; 4]) -> Self {
        Tag(*tag)
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for &b in &self.0 {
            f.write_str(if b' ' <= b && b <= b'~' { (b as char).to_string() } else { "?".to_owned() }.as_str())?
        }
        Ok(())
    }
}

impl From<LongDateTime> for std::time::SystemTime {
    fn from(instant: LongDateTime) -> Self {
        use std::time::{Duration, UNIX_EPOCH};

        // `date --utc -d 1904-01-01 +%s`
        let truetype_epoch = UNIX_EPOCH - Duration::from_secs(2_082_844_800);

        let seconds_since_truetype_epoch = instant.0;
        if seconds_since_truetype_epoch >= 0 {
            truetype_epoch + Duration::from_secs(seconds_since_truetype_epoch as u64)
        } else {
            truetype_epoch - Duration::from_secs((-seconds_since_truetype_epoch) as u64)
        }
    }
}

impl ReadFromBytes for Tag {
    fn read_from(bytes: &[u8]) -> Result<Self, FontError> {
        let bytes = bytes.get(..4).ok_or(FontError::OffsetPlusLengthBeyondEof)?;
        Ok(Tag([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

impl ReadFromBytes for FixedPoint {
    fn read_from(bytes: &[u8]) -> Result<Self, FontError> {
        Ok(FixedPoint(u32::read_from(bytes)?))
    }
}

impl ReadFromBytes for LongDateTime {
    fn read_from(bytes: &[u8]) -> Result<Self, FontError> {
        let hi = u32::read_from(bytes)? as i64;
        let lo = u32::read_from(bytes.get(4..).ok_or(FontError::OffsetPlusLengthBeyondEof)?)? as i64;
        Ok(LongDateTime((hi << 32) | lo))
    }
}

impl ReadFromBytes for FWord {
    fn read_from(bytes: &[u8]) -> Result<Self, FontError> {
        Ok(euclid::Length::new(i16::read_from(bytes)?))
    }
}

impl ReadFromBytes for UFWord {
    fn read_from(bytes: &[u8]) -> Result<Self, FontError> {
        Ok(euclid::Length::new(u16::read_from(bytes)?))
    }
}

impl ReadFromBytes for FontDesignUnitsPerEmFactorU16 {
    fn read_from(bytes: &[u8]) -> Result<Self, FontError> {
        Ok(euclid::TypedScale::new(u16::read_from(bytes)?))
    }
}
