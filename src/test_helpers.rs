//! Shared test utilities for the postpic test suite.
//!
//! Builds small encoded images in memory, optionally carrying an EXIF block
//! assembled byte by byte, so codec and metadata tests need no fixture files.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let bytes = jpeg_with_exif(1600, 1200, &ExifFixture::sample());
//! let value = pipeline.import(&bytes).unwrap();
//! assert_eq!(value.metadata.iso_speed, Some(200));
//! ```

use image::{ExtendedColorType, GrayImage, ImageEncoder, RgbImage};

// =========================================================================
// Plain images
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Encode an RGB gradient as JPEG.
pub fn plain_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    out
}

/// Encode a grayscale gradient as JPEG.
pub fn gray_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = GrayImage::from_fn(width, height, |x, _| image::Luma([(x % 256) as u8]));
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, ExtendedColorType::L8)
        .unwrap();
    out
}

/// Encode an RGB gradient as PNG.
pub fn plain_png(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    out
}

/// Encode an RGB gradient as TIFF.
pub fn plain_tiff(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut out = std::io::Cursor::new(Vec::new());
    image::codecs::tiff::TiffEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    out.into_inner()
}

// =========================================================================
// EXIF fixtures
// =========================================================================

/// Capture settings written into a synthetic EXIF block.
#[derive(Debug, Clone, Default)]
pub struct ExifFixture {
    /// `YYYY:MM:DD HH:MM:SS`
    pub date_time_original: Option<String>,
    pub exposure_time: Option<(u32, u32)>,
    pub f_number: Option<(u32, u32)>,
    pub iso: Option<u16>,
    pub focal_length: Option<(u32, u32)>,
    /// 1 = sRGB
    pub color_space: Option<u16>,
}

impl ExifFixture {
    /// 2010-05-01 12:30:00, 1/125 s, f/4, ISO 200, 50 mm, sRGB.
    pub fn sample() -> Self {
        Self {
            date_time_original: Some("2010:05:01 12:30:00".into()),
            exposure_time: Some((1, 125)),
            f_number: Some((4, 1)),
            iso: Some(200),
            focal_length: Some((50, 1)),
            color_space: Some(1),
        }
    }
}

const TYPE_ASCII: u16 = 2;
const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
const TYPE_RATIONAL: u16 = 5;

struct Entry {
    tag: u16,
    kind: u16,
    count: u32,
    data: Vec<u8>,
}

/// Assemble a big-endian TIFF block: IFD0 holding only the Exif IFD
/// pointer, followed by the Exif IFD and its out-of-line values.
pub fn exif_tiff(fixture: &ExifFixture) -> Vec<u8> {
    let rational = |(num, denom): (u32, u32)| {
        let mut data = num.to_be_bytes().to_vec();
        data.extend_from_slice(&denom.to_be_bytes());
        data
    };

    let mut entries = Vec::new();
    if let Some(r) = fixture.exposure_time {
        entries.push(Entry {
            tag: 0x829A,
            kind: TYPE_RATIONAL,
            count: 1,
            data: rational(r),
        });
    }
    if let Some(r) = fixture.f_number {
        entries.push(Entry {
            tag: 0x829D,
            kind: TYPE_RATIONAL,
            count: 1,
            data: rational(r),
        });
    }
    if let Some(iso) = fixture.iso {
        entries.push(Entry {
            tag: 0x8827,
            kind: TYPE_SHORT,
            count: 1,
            data: iso.to_be_bytes().to_vec(),
        });
    }
    if let Some(dt) = &fixture.date_time_original {
        let mut data = dt.as_bytes().to_vec();
        data.push(0);
        entries.push(Entry {
            tag: 0x9003,
            kind: TYPE_ASCII,
            count: data.len() as u32,
            data,
        });
    }
    if let Some(r) = fixture.focal_length {
        entries.push(Entry {
            tag: 0x920A,
            kind: TYPE_RATIONAL,
            count: 1,
            data: rational(r),
        });
    }
    if let Some(cs) = fixture.color_space {
        entries.push(Entry {
            tag: 0xA001,
            kind: TYPE_SHORT,
            count: 1,
            data: cs.to_be_bytes().to_vec(),
        });
    }

    let ifd0_offset: u32 = 8;
    let exif_ifd_offset = ifd0_offset + 2 + 12 + 4;
    let mut data_offset = exif_ifd_offset + 2 + 12 * entries.len() as u32 + 4;

    let mut out = Vec::new();
    out.extend_from_slice(b"MM");
    out.extend_from_slice(&42u16.to_be_bytes());
    out.extend_from_slice(&ifd0_offset.to_be_bytes());

    // IFD0: ExifIFDPointer only
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&0x8769u16.to_be_bytes());
    out.extend_from_slice(&TYPE_LONG.to_be_bytes());
    out.extend_from_slice(&1u32.to_be_bytes());
    out.extend_from_slice(&exif_ifd_offset.to_be_bytes());
    out.extend_from_slice(&0u32.to_be_bytes());

    let mut tail = Vec::new();
    out.extend_from_slice(&(entries.len() as u16).to_be_bytes());
    for entry in &entries {
        out.extend_from_slice(&entry.tag.to_be_bytes());
        out.extend_from_slice(&entry.kind.to_be_bytes());
        out.extend_from_slice(&entry.count.to_be_bytes());
        if entry.data.len() <= 4 {
            let mut inline = entry.data.clone();
            inline.resize(4, 0);
            out.extend_from_slice(&inline);
        } else {
            out.extend_from_slice(&data_offset.to_be_bytes());
            tail.extend_from_slice(&entry.data);
            if entry.data.len() % 2 == 1 {
                tail.push(0);
            }
            data_offset = exif_ifd_offset + 2 + 12 * entries.len() as u32 + 4 + tail.len() as u32;
        }
    }
    out.extend_from_slice(&0u32.to_be_bytes());
    out.extend_from_slice(&tail);
    out
}

/// JPEG gradient with an `Exif` APP1 segment right after SOI.
pub fn jpeg_with_exif(width: u32, height: u32, fixture: &ExifFixture) -> Vec<u8> {
    let jpeg = plain_jpeg(width, height);
    let tiff = exif_tiff(fixture);
    let segment_len = (2 + 6 + tiff.len()) as u16;

    let mut out = vec![0xFF, 0xD8, 0xFF, 0xE1];
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// PNG gradient with an `eXIf` chunk holding `tiff`, placed after IHDR.
pub fn png_with_exif(width: u32, height: u32, tiff: &[u8]) -> Vec<u8> {
    let png = plain_png(width, height);
    // signature (8) + IHDR chunk (4 + 4 + 13 + 4)
    let after_ihdr = 8 + 25;

    let mut chunk = b"eXIf".to_vec();
    chunk.extend_from_slice(tiff);
    let mut out = png[..after_ihdr].to_vec();
    out.extend_from_slice(&(tiff.len() as u32).to_be_bytes());
    out.extend_from_slice(&chunk);
    out.extend_from_slice(&crc32(&chunk).to_be_bytes());
    out.extend_from_slice(&png[after_ihdr..]);
    out
}

fn crc32(bytes: &[u8]) -> u32 {
    let mut crc = !0u32;
    for &b in bytes {
        crc ^= u32::from(b);
        for _ in 0..8 {
            crc = if crc & 1 == 1 { (crc >> 1) ^ 0xEDB8_8320 } else { crc >> 1 };
        }
    }
    !crc
}
