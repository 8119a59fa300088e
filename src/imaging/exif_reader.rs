//! EXIF attribute reading and re-embedding.
//!
//! Attributes are read with `kamadak-exif` from whatever container the
//! payload uses (JPEG, TIFF, PNG, WebP). Every field of the primary image
//! (IFD0 plus its Exif sub-IFD) is rendered to text and keyed by its tag
//! name, e.g. `DateTimeOriginal`, `FNumber`, `ExposureTime`.
//!
//! The raw TIFF block is kept so it can be written back into re-encoded
//! JPEG output as an APP1 segment. Blocks that cannot go there verbatim
//! (a TIFF source file, anything over [`MAX_TIFF_BLOCK`]) are rebuilt from
//! their capture fields first:
//!
//! ```text
//! FF D8                 SOI
//! FF E0 ...             APP0 (JFIF, written by the encoder)
//! FF E1 len "Exif\0\0"  APP1 ← inserted here
//! <tiff block>
//! ...                   rest of the stream
//! ```

use exif::experimental::Writer;
use exif::{Context, Exif, In, Reader, Tag, Value};
use std::collections::BTreeMap;
use std::io::Cursor;

/// Attribute key for the ISO speed under its legacy EXIF 2.2 name.
pub const ISO_LEGACY_KEY: &str = "ISOSpeedRatings";

const APP1_MARKER: [u8; 2] = [0xFF, 0xE1];
const APP0_MARKER: [u8; 2] = [0xFF, 0xE0];
const SOI_MARKER: [u8; 2] = [0xFF, 0xD8];
const EXIF_HEADER: &[u8; 6] = b"Exif\0\0";

/// EXIF data of one image: raw TIFF block plus rendered attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExifBlock {
    pub raw: Vec<u8>,
    pub attributes: BTreeMap<String, String>,
}

impl ExifBlock {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Largest TIFF block that fits one APP1 segment next to its `Exif` header.
pub const MAX_TIFF_BLOCK: usize = u16::MAX as usize - 2 - EXIF_HEADER.len();

/// Tags describing the source file's own raster layout. They are wrong for
/// any re-encoded payload, so rebuilt blocks leave them out.
const LAYOUT_TAGS: [Tag; 10] = [
    Tag::ImageWidth,
    Tag::ImageLength,
    Tag::BitsPerSample,
    Tag::Compression,
    Tag::PhotometricInterpretation,
    Tag::SamplesPerPixel,
    Tag::RowsPerStrip,
    Tag::PlanarConfiguration,
    Tag(Context::Tiff, 0x142), // TileWidth
    Tag(Context::Tiff, 0x143), // TileLength
];

/// Read EXIF from an encoded image. Returns `None` when there is none.
///
/// The returned block is the one re-encoded payloads will carry, and its
/// attributes are read from that block. A TIFF source is a whole image file,
/// and some blocks are too large for an APP1 segment; both are rebuilt from
/// their primary capture fields. When nothing usable fits, there is no block.
pub fn read_exif(bytes: &[u8]) -> Option<ExifBlock> {
    let exif = match Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif,
        Err(e) => {
            tracing::trace!("no EXIF data: {e}");
            return None;
        }
    };

    let whole_file = bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*");
    if !whole_file && exif.buf().len() <= MAX_TIFF_BLOCK {
        return Some(ExifBlock {
            raw: exif.buf().to_vec(),
            attributes: attributes_of(&exif),
        });
    }

    let raw = rebuild(&exif)?;
    if raw.len() > MAX_TIFF_BLOCK {
        tracing::debug!("EXIF block of {} bytes does not fit a JPEG segment", raw.len());
        return None;
    }
    match Reader::new().read_raw(raw.clone()) {
        Ok(rebuilt) => Some(ExifBlock {
            raw,
            attributes: attributes_of(&rebuilt),
        }),
        Err(e) => {
            tracing::debug!("rebuilt EXIF block is unreadable: {e}");
            None
        }
    }
}

/// Write a fresh TIFF block holding the primary non-layout fields.
fn rebuild(exif: &Exif) -> Option<Vec<u8>> {
    let mut writer = Writer::new();
    let mut kept = 0;
    for field in exif.fields().filter(|f| f.ifd_num == In::PRIMARY) {
        if LAYOUT_TAGS.contains(&field.tag) || matches!(field.value, Value::Unknown(..)) {
            continue;
        }
        writer.push_field(field);
        kept += 1;
    }
    if kept == 0 {
        return None;
    }

    let mut out = Cursor::new(Vec::new());
    match writer.write(&mut out, exif.little_endian()) {
        Ok(()) => Some(out.into_inner()),
        Err(e) => {
            tracing::debug!("cannot rebuild EXIF block: {e}");
            None
        }
    }
}

fn attributes_of(exif: &Exif) -> BTreeMap<String, String> {
    let mut attributes = BTreeMap::new();
    for field in exif.fields().filter(|f| f.ifd_num == In::PRIMARY) {
        let Some(text) = value_text(&field.value) else {
            continue;
        };
        if field.tag == Tag::PhotographicSensitivity {
            attributes
                .entry(ISO_LEGACY_KEY.to_string())
                .or_insert_with(|| text.clone());
        }
        attributes.entry(field.tag.to_string()).or_insert(text);
    }
    attributes
}

/// Render an EXIF value as attribute text.
///
/// ASCII values lose their NUL terminators, integer lists are joined with
/// `", "` and rationals are kept as `num/denom` so callers can parse them
/// exactly.
pub fn value_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Ascii(parts) => parts
            .iter()
            .map(|p| String::from_utf8_lossy(p).trim_end_matches('\0').to_string())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Byte(v) => join(v),
        Value::Short(v) => join(v),
        Value::Long(v) => join(v),
        Value::SByte(v) => join(v),
        Value::SShort(v) => join(v),
        Value::SLong(v) => join(v),
        Value::Float(v) => join(v),
        Value::Double(v) => join(v),
        Value::Rational(v) => v
            .iter()
            .map(|r| format!("{}/{}", r.num, r.denom))
            .collect::<Vec<_>>()
            .join(", "),
        Value::SRational(v) => v
            .iter()
            .map(|r| format!("{}/{}", r.num, r.denom))
            .collect::<Vec<_>>()
            .join(", "),
        Value::Undefined(bytes, _) => String::from_utf8_lossy(bytes)
            .trim_end_matches('\0')
            .to_string(),
        _ => return None,
    };
    Some(text)
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Insert a TIFF block into a JPEG stream as an `Exif` APP1 segment.
///
/// The segment goes right after SOI, or after a leading JFIF APP0. Streams
/// that are not JPEG, or blocks too large for one segment, are returned
/// unchanged.
pub fn embed_in_jpeg(jpeg: Vec<u8>, tiff: &[u8]) -> Vec<u8> {
    let segment_len = 2 + EXIF_HEADER.len() + tiff.len();
    if jpeg.len() < 4 || jpeg[..2] != SOI_MARKER || segment_len > u16::MAX as usize {
        return jpeg;
    }

    let mut insert_at = 2;
    if jpeg[2..4] == APP0_MARKER && jpeg.len() >= 6 {
        let app0_len = u16::from_be_bytes([jpeg[4], jpeg[5]]) as usize;
        if 4 + app0_len <= jpeg.len() {
            insert_at = 4 + app0_len;
        }
    }

    let mut out = Vec::with_capacity(jpeg.len() + 2 + segment_len);
    out.extend_from_slice(&jpeg[..insert_at]);
    out.extend_from_slice(&APP1_MARKER);
    out.extend_from_slice(&(segment_len as u16).to_be_bytes());
    out.extend_from_slice(EXIF_HEADER);
    out.extend_from_slice(tiff);
    out.extend_from_slice(&jpeg[insert_at..]);
    out
}
