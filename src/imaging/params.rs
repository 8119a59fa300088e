//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the [`operations`](super::operations) pipeline (which
//! resolves caller options and defaults) and the
//! [`backend`](super::backend) (which does the pixel work).
//!
//! ## Types
//!
//! - [`Quality`] — JPEG encoding quality (1–100, default 85). Clamped on construction.
//! - [`CropRect`] — Origin plus size of a crop window.
//! - [`Rect`] — Two corners of a filled rectangle.
//! - [`DrawTextOptions`] — Caller-facing optional text settings, resolved once into [`TextParams`].
//! - [`MontageParams`] — Grid columns, title and styling of a montage.

use crate::color::{ColorValue, PixelQuad};

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Crop window: top-left corner plus size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Rectangle given by two inclusive corners, in any order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl Rect {
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Same rectangle with `x0 <= x1` and `y0 <= y1`.
    pub fn canonical(self) -> Self {
        Self {
            x0: self.x0.min(self.x1),
            y0: self.y0.min(self.y1),
            x1: self.x0.max(self.x1),
            y1: self.y0.max(self.y1),
        }
    }

    /// Inclusive width. Spans the full `i32` range without overflowing.
    pub fn width(self) -> u64 {
        u64::from(self.x1.abs_diff(self.x0)) + 1
    }

    pub fn height(self) -> u64 {
        u64::from(self.y1.abs_diff(self.y0)) + 1
    }

    /// The part of the rectangle that lies on a `width × height` canvas, or
    /// `None` when they do not overlap.
    pub fn clip(self, width: u32, height: u32) -> Option<CropRect> {
        let r = self.canonical();
        let x0 = i64::from(r.x0).max(0);
        let y0 = i64::from(r.y0).max(0);
        let x1 = (i64::from(r.x1) + 1).min(i64::from(width));
        let y1 = (i64::from(r.y1) + 1).min(i64::from(height));
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some(CropRect {
            x: u32::try_from(x0).ok()?,
            y: u32::try_from(y0).ok()?,
            width: u32::try_from(x1 - x0).ok()?,
            height: u32::try_from(y1 - y0).ok()?,
        })
    }
}

/// Optional text settings as supplied by a caller.
///
/// Every field left as `None` falls back to [`TextDefaults`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawTextOptions {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
    pub color: Option<ColorValue>,
}

/// Defaults applied to [`DrawTextOptions`].
#[derive(Debug, Clone, PartialEq)]
pub struct TextDefaults {
    pub x: i32,
    pub y: i32,
    pub font_size: f32,
    pub font_family: Option<String>,
    pub color: Option<ColorValue>,
}

impl Default for TextDefaults {
    fn default() -> Self {
        Self {
            x: 20,
            y: 20,
            font_size: 10.0,
            font_family: None,
            color: None,
        }
    }
}

/// Fully resolved text overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct TextParams {
    pub text: String,
    /// Top-left corner of the text box.
    pub x: i32,
    pub y: i32,
    /// `None` leaves the codec's default sans-serif face.
    pub font_family: Option<String>,
    pub font_size: f32,
    /// `None` leaves the codec's default fill (opaque black).
    pub fill: Option<PixelQuad>,
}

impl DrawTextOptions {
    pub fn resolve(self, text: &str, defaults: &TextDefaults) -> TextParams {
        TextParams {
            text: text.to_string(),
            x: self.x.unwrap_or(defaults.x),
            y: self.y.unwrap_or(defaults.y),
            font_family: self.font_family.or_else(|| defaults.font_family.clone()),
            font_size: self.font_size.unwrap_or(defaults.font_size),
            fill: self.color.or(defaults.color).map(ColorValue::to_pixel),
        }
    }
}

/// Spacing around every montage cell, in pixels.
pub const MONTAGE_SPACING: u32 = 4;
/// Offset of the drop shadow behind each tile.
pub const MONTAGE_SHADOW_OFFSET: u32 = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct MontageParams {
    pub title: String,
    pub columns: u32,
    pub spacing: u32,
    pub shadow: bool,
    pub background: PixelQuad,
    pub title_font_size: f32,
}

impl MontageParams {
    pub fn new(title: &str, columns: u32) -> Self {
        Self {
            title: title.to_string(),
            columns,
            spacing: MONTAGE_SPACING,
            shadow: true,
            background: PixelQuad {
                red: 255,
                green: 255,
                blue: 255,
                opacity: 0,
            },
            title_font_size: 14.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colorspace::Colorspace;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn rect_canonical_orders_corners() {
        let r = Rect::new(50, 40, 10, 5).canonical();
        assert_eq!(r, Rect::new(10, 5, 50, 40));
        assert_eq!((r.width(), r.height()), (41, 36));
    }

    #[test]
    fn rect_spanning_all_of_i32() {
        let r = Rect::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        assert_eq!(r.width(), 1 << 32);
        assert_eq!(r.height(), 1 << 32);
    }

    #[test]
    fn rect_clip_to_canvas() {
        let r = Rect::new(-10, -10, i32::MAX, i32::MAX);
        assert_eq!(
            r.clip(10, 8),
            Some(CropRect {
                x: 0,
                y: 0,
                width: 10,
                height: 8
            })
        );
        let r = Rect::new(i32::MIN, 0, i32::MAX, 0);
        assert_eq!(r.clip(10, 10).map(|c| (c.width, c.height)), Some((10, 1)));
        let r = Rect::new(8, 2, 3, 4);
        assert_eq!(r.clip(10, 10).map(|c| (c.x, c.width)), Some((3, 6)));
    }

    #[test]
    fn rect_clip_outside_canvas_is_none() {
        assert_eq!(Rect::new(10, 0, 20, 5).clip(10, 10), None);
        assert_eq!(Rect::new(-5, -5, -1, -1).clip(10, 10), None);
        assert_eq!(Rect::new(i32::MAX, 0, i32::MAX, 0).clip(10, 10), None);
    }

    #[test]
    fn draw_text_defaults_apply_only_when_unset() {
        let params = DrawTextOptions::default().resolve("hello", &TextDefaults::default());
        assert_eq!((params.x, params.y), (20, 20));
        assert_eq!(params.font_size, 10.0);
        assert_eq!(params.font_family, None);
        assert_eq!(params.fill, None);
    }

    #[test]
    fn draw_text_explicit_options_win() {
        let options = DrawTextOptions {
            x: Some(5),
            y: None,
            font_family: Some("Serif".into()),
            font_size: Some(24.0),
            color: Some(ColorValue::new(Colorspace::Rgb, 0xff0000)),
        };
        let params = options.resolve("hi", &TextDefaults::default());
        assert_eq!((params.x, params.y), (5, 20));
        assert_eq!(params.font_family.as_deref(), Some("Serif"));
        assert_eq!(params.font_size, 24.0);
        assert_eq!(params.fill.map(|p| p.red), Some(0xff));
    }

    #[test]
    fn montage_defaults() {
        let params = MontageParams::new("Trip", 3);
        assert_eq!(params.spacing, 4);
        assert!(params.shadow);
        assert_eq!(params.background.to_rgba(), [255, 255, 255, 255]);
    }
}
