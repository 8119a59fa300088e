//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Info
//!
//! ```text
//! holiday.pic (1600x1200, sRGB)
//!     Taken: 2010-05-01 12:30:00
//!     Aperture: f/4
//!     Exposure: 1/125 s
//!     ISO: 200
//!     Focal length: 50 mm
//!     Payload: 48213 bytes
//! ```
//!
//! Absent metadata fields are left out rather than shown as `-1`.
//!
//! ## Transforms
//!
//! ```text
//! thumbnail: 1600x1200 → 400x300 (thumb.pic)
//! ```
//!
//! ## Colors
//!
//! ```text
//! RGBA#11223344
//!     Colorspace: RGBA
//!     Pixel: 17 34 51 opacity 68
//! ```
//!
//! Each display has a `format_*` function (returns `Vec<String>` or `String`)
//! for testability and a `print_*` wrapper that writes to stdout.

use crate::color::ColorValue;
use crate::metadata::Metadata;
use crate::value::PictureValue;
use serde_json::json;
use std::path::Path;

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn geometry(metadata: &Metadata) -> String {
    format!("{}x{}", metadata.width, metadata.height)
}

/// `0.008` reads as `1/125 s`; anything a second or longer stays decimal.
fn format_exposure(seconds: f64) -> String {
    if seconds < 1.0 {
        let denominator = (1.0 / seconds).round();
        if ((1.0 / denominator) - seconds).abs() < seconds * 0.01 {
            return format!("1/{denominator} s");
        }
    }
    format!("{seconds} s")
}

// ============================================================================
// Info
// ============================================================================

pub fn format_info(value: &PictureValue, source: &Path) -> Vec<String> {
    let m = &value.metadata;
    let mut lines = vec![format!(
        "{} ({}, {})",
        source.display(),
        geometry(m),
        m.colorspace.name()
    )];

    if let Some(ts) = m.timestamp {
        lines.push(format!("{}Taken: {ts}", indent(1)));
    }
    if let Some(f) = m.f_number {
        lines.push(format!("{}Aperture: f/{f}", indent(1)));
    }
    if let Some(t) = m.exposure_time {
        lines.push(format!("{}Exposure: {}", indent(1), format_exposure(t)));
    }
    if let Some(iso) = m.iso_speed {
        lines.push(format!("{}ISO: {iso}", indent(1)));
    }
    if let Some(mm) = m.focal_length {
        lines.push(format!("{}Focal length: {mm} mm", indent(1)));
    }
    lines.push(format!("{}Payload: {} bytes", indent(1), value.payload.len()));
    lines
}

pub fn print_info(value: &PictureValue, source: &Path) {
    for line in format_info(value, source) {
        println!("{line}");
    }
}

/// Metadata as a JSON object, plus the payload size.
pub fn format_info_json(value: &PictureValue) -> Result<String, serde_json::Error> {
    let m = &value.metadata;
    let doc = json!({
        "timestamp": m.timestamp,
        "width": m.width,
        "height": m.height,
        "colorspace": m.colorspace.name(),
        "iso_speed": m.iso_speed,
        "f_number": m.f_number,
        "exposure_time": m.exposure_time,
        "focal_length": m.focal_length,
        "payload_bytes": value.payload.len(),
        "summary": value.summary(),
    });
    serde_json::to_string_pretty(&doc)
}

// ============================================================================
// Transforms
// ============================================================================

pub fn format_transform(
    operation: &str,
    before: &Metadata,
    after: &Metadata,
    dest: &Path,
) -> String {
    format!(
        "{operation}: {} → {} ({})",
        geometry(before),
        geometry(after),
        dest.display()
    )
}

/// Operations that create a value from nothing or from several inputs.
pub fn format_created(operation: &str, inputs: usize, after: &Metadata, dest: &Path) -> String {
    match inputs {
        0 => format!("{operation}: {} ({})", geometry(after), dest.display()),
        1 => format!("{operation}: 1 image → {} ({})", geometry(after), dest.display()),
        n => format!("{operation}: {n} images → {} ({})", geometry(after), dest.display()),
    }
}

// ============================================================================
// Colors
// ============================================================================

pub fn format_color(color: ColorValue) -> Vec<String> {
    let pixel = color.to_pixel();
    vec![
        color.to_string(),
        format!("{}Colorspace: {}", indent(1), color.colorspace.name()),
        format!(
            "{}Pixel: {} {} {} opacity {}",
            indent(1),
            pixel.red,
            pixel.green,
            pixel.blue,
            pixel.opacity
        ),
    ]
}

pub fn print_color(color: ColorValue) {
    for line in format_color(color) {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colorspace::Colorspace;
    use crate::timestamp::Timestamp;

    fn sample() -> PictureValue {
        let metadata = Metadata {
            timestamp: Timestamp::from_civil(2010, 5, 1, 12, 30, 0),
            width: 1600,
            height: 1200,
            colorspace: Colorspace::Srgb,
            iso_speed: Some(200),
            f_number: Some(4.0),
            exposure_time: Some(0.008),
            focal_length: Some(50.0),
        };
        PictureValue::new(metadata, vec![0; 42])
    }

    // =========================================================================
    // Info
    // =========================================================================

    #[test]
    fn info_lists_present_fields() {
        let lines = format_info(&sample(), Path::new("holiday.pic"));
        assert_eq!(
            lines,
            vec![
                "holiday.pic (1600x1200, sRGB)",
                "    Taken: 2010-05-01 12:30:00",
                "    Aperture: f/4",
                "    Exposure: 1/125 s",
                "    ISO: 200",
                "    Focal length: 50 mm",
                "    Payload: 42 bytes",
            ]
        );
    }

    #[test]
    fn info_skips_absent_fields() {
        let value = PictureValue::new(
            Metadata {
                width: 10,
                height: 20,
                colorspace: Colorspace::Gray,
                ..Metadata::default()
            },
            vec![1, 2, 3],
        );
        let lines = format_info(&value, Path::new("a.pic"));
        assert_eq!(lines, vec!["a.pic (10x20, Gray)", "    Payload: 3 bytes"]);
    }

    #[test]
    fn info_json_uses_null_for_absent() {
        let value = PictureValue::new(Metadata::default(), vec![]);
        let doc: serde_json::Value =
            serde_json::from_str(&format_info_json(&value).unwrap()).unwrap();
        assert!(doc["timestamp"].is_null());
        assert!(doc["iso_speed"].is_null());
        assert_eq!(doc["summary"], "|0|0|-1|-1|-1");
    }

    #[test]
    fn info_json_fields() {
        let doc: serde_json::Value =
            serde_json::from_str(&format_info_json(&sample()).unwrap()).unwrap();
        assert_eq!(doc["timestamp"], "2010-05-01 12:30:00");
        assert_eq!(doc["colorspace"], "sRGB");
        assert_eq!(doc["iso_speed"], 200);
        assert_eq!(doc["payload_bytes"], 42);
    }

    #[test]
    fn exposure_formatting() {
        assert_eq!(format_exposure(0.008), "1/125 s");
        assert_eq!(format_exposure(0.5), "1/2 s");
        assert_eq!(format_exposure(2.0), "2 s");
        assert_eq!(format_exposure(0.3), "0.3 s");
    }

    // =========================================================================
    // Transforms and colors
    // =========================================================================

    #[test]
    fn transform_line() {
        let before = sample().metadata;
        let after = Metadata {
            width: 400,
            height: 300,
            ..before.clone()
        };
        assert_eq!(
            format_transform("thumbnail", &before, &after, Path::new("thumb.pic")),
            "thumbnail: 1600x1200 → 400x300 (thumb.pic)"
        );
    }

    #[test]
    fn created_line_counts_inputs() {
        let after = sample().metadata;
        assert_eq!(
            format_created("montage", 3, &after, Path::new("m.pic")),
            "montage: 3 images → 1600x1200 (m.pic)"
        );
        assert_eq!(
            format_created("canvas", 0, &after, Path::new("c.pic")),
            "canvas: 1600x1200 (c.pic)"
        );
    }

    #[test]
    fn color_lines() {
        let lines = format_color(ColorValue::new(Colorspace::Rgba, 0x11223344));
        assert_eq!(lines[0], "RGBA#11223344");
        assert_eq!(lines[1], "    Colorspace: RGBA");
        assert_eq!(lines[2], "    Pixel: 17 34 51 opacity 68");
    }
}
