//! Metadata extraction from a decoded raster.
//!
//! A picture value caches a small metadata record next to its payload:
//! geometry, colorspace and the capture settings found in the EXIF
//! attributes. Everything here is derived from the raster alone, so it can
//! always be recomputed from the payload.
//!
//! ## Attribute parsing
//!
//! EXIF attributes are free text, frequently missing and sometimes vendor
//! malformed. Parsing is permissive: a field either yields a value or is
//! absent, and extraction as a whole never fails.
//!
//! | Field | Attribute | Accepted text |
//! |---|---|---|
//! | capture timestamp | `DateTimeOriginal` | `YYYY:MM:DD HH:MM:SS`, ≥ 19 chars |
//! | ISO speed | `ISOSpeedRatings` | leading integer, e.g. `200` or `200, 400` |
//! | exposure time | `ExposureTime` | `a/b` rational or decimal, e.g. `1/125` |
//! | f-number | `FNumber` | `a/b` rational or decimal, e.g. `4/1`, `2.8` |
//! | focal length | `FocalLength` | `a/b` rational or decimal |
//!
//! Zero, negative and non-finite numbers are treated as absent.

use crate::colorspace::{Colorspace, ColorspaceTable};
use crate::imaging::ImageCodec;
use crate::timestamp::Timestamp;
use serde::Serialize;

pub const TAG_DATE_TIME_ORIGINAL: &str = "DateTimeOriginal";
pub const TAG_ISO_SPEED: &str = "ISOSpeedRatings";
pub const TAG_EXPOSURE_TIME: &str = "ExposureTime";
pub const TAG_F_NUMBER: &str = "FNumber";
pub const TAG_FOCAL_LENGTH: &str = "FocalLength";

/// Minimum length of a `DateTimeOriginal` value.
const DATE_TIME_LEN: usize = 19;

/// Cached metadata of a picture value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metadata {
    pub timestamp: Option<Timestamp>,
    pub width: u32,
    pub height: u32,
    pub colorspace: Colorspace,
    pub iso_speed: Option<u32>,
    pub f_number: Option<f64>,
    pub exposure_time: Option<f64>,
    pub focal_length: Option<f64>,
}

/// Builds [`Metadata`] from a raster through an [`ImageCodec`].
#[derive(Debug, Clone, Copy)]
pub struct MetadataExtractor<'a> {
    table: &'a ColorspaceTable,
}

impl<'a> MetadataExtractor<'a> {
    pub fn new(table: &'a ColorspaceTable) -> Self {
        Self { table }
    }

    pub fn extract<C: ImageCodec>(&self, codec: &C, raster: &C::Raster) -> Metadata {
        let dims = codec.dimensions(raster);
        let attr = |key: &str| codec.attribute(raster, key);

        Metadata {
            timestamp: attr(TAG_DATE_TIME_ORIGINAL).and_then(|s| parse_timestamp(&s)),
            width: dims.width,
            height: dims.height,
            colorspace: self.table.from_native_tag(&codec.colorspace_tag(raster)),
            iso_speed: attr(TAG_ISO_SPEED).and_then(|s| parse_iso(&s)),
            f_number: attr(TAG_F_NUMBER).and_then(|s| parse_number(&s)),
            exposure_time: attr(TAG_EXPOSURE_TIME).and_then(|s| parse_number(&s)),
            focal_length: attr(TAG_FOCAL_LENGTH).and_then(|s| parse_number(&s)),
        }
    }
}

/// Value of the leading decimal digits of `bytes`; 0 when there are none.
fn leading_digits(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .fold(0u32, |acc, b| acc.saturating_mul(10).saturating_add((b - b'0') as u32))
}

/// Parse an EXIF date-time such as `2010:05:01 12:30:00`.
///
/// Only the digit positions matter; separators are not checked. Short or
/// out-of-range input yields `None`.
pub fn parse_timestamp(text: &str) -> Option<Timestamp> {
    let bytes = text.as_bytes();
    if bytes.len() < DATE_TIME_LEN {
        if !text.trim().is_empty() {
            tracing::warn!(value = text, "could not parse date");
        }
        return None;
    }
    let field = |start: usize, end: usize| leading_digits(&bytes[start..end]);

    let parsed = Timestamp::from_civil(
        field(0, 4) as i32,
        field(5, 7),
        field(8, 10),
        field(11, 13),
        field(14, 16),
        field(17, 19),
    );
    if parsed.is_none() {
        tracing::warn!(value = text, "could not parse date");
    }
    parsed
}

/// Parse the leading integer of an ISO speed value.
pub fn parse_iso(text: &str) -> Option<u32> {
    let digits: &str = {
        let t = text.trim_start();
        let end = t.find(|c: char| !c.is_ascii_digit()).unwrap_or(t.len());
        &t[..end]
    };
    if digits.is_empty() {
        return None;
    }
    digits.parse::<u32>().ok().filter(|&v| v <= i32::MAX as u32)
}

/// Parse a positive decimal or `a/b` rational.
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let value = match text.split_once('/') {
        Some((num, denom)) => {
            let denom = leading_float(denom)?;
            if denom == 0.0 {
                return None;
            }
            leading_float(num)? / denom
        }
        None => leading_float(text)?,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Longest parseable decimal prefix, e.g. `"2.8 mm"` → 2.8.
fn leading_float(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let end = text
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '+' | '-' | 'e' | 'E')))
        .unwrap_or(text.len());
    let candidate = &text[..end];
    (1..=candidate.len())
        .rev()
        .find_map(|len| candidate[..len].parse::<f64>().ok())
}
