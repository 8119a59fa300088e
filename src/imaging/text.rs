//! Text rasterization with cosmic-text.
//!
//! Fonts come from the system font database, loaded once per
//! [`FontContext`]. A family that is not installed falls back to whatever
//! cosmic-text picks; when no fonts exist at all nothing is drawn.

use cosmic_text::{Attrs, Buffer, Color, Family, FontSystem, Metrics, Shaping, SwashCache};
use image::RgbImage;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT: f32 = 1.2;

/// Font database plus glyph cache.
pub struct FontContext {
    font_system: FontSystem,
    swash_cache: SwashCache,
}

impl FontContext {
    pub fn new() -> Self {
        Self {
            font_system: FontSystem::new(),
            swash_cache: SwashCache::new(),
        }
    }

    fn layout(&mut self, text: &str, font_size: f32, family: Option<&str>) -> Buffer {
        let metrics = Metrics::new(font_size, font_size * LINE_HEIGHT);
        let mut buffer = Buffer::new(&mut self.font_system, metrics);
        buffer.set_size(&mut self.font_system, None, None);
        let attrs = Attrs::new().family(family_for(family));
        buffer.set_text(&mut self.font_system, text, &attrs, Shaping::Advanced);
        buffer.shape_until_scroll(&mut self.font_system, false);
        buffer
    }

    /// Size of the laid-out text box in pixels.
    pub fn measure(&mut self, text: &str, font_size: f32, family: Option<&str>) -> (u32, u32) {
        let buffer = self.layout(text, font_size, family);
        let mut width = 0.0f32;
        let mut lines = 0u32;
        for run in buffer.layout_runs() {
            width = width.max(run.line_w);
            lines = lines.max(run.line_i as u32 + 1);
        }
        let height = lines as f32 * font_size * LINE_HEIGHT;
        (width.ceil() as u32, height.ceil() as u32)
    }

    /// Draw `text` with its box's top-left corner at `(x, y)`, blending
    /// glyph coverage over the existing pixels.
    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &mut self,
        canvas: &mut RgbImage,
        text: &str,
        x: i32,
        y: i32,
        font_size: f32,
        family: Option<&str>,
        rgba: [u8; 4],
    ) {
        let buffer = self.layout(text, font_size, family);
        let color = Color::rgba(rgba[0], rgba[1], rgba[2], rgba[3]);
        let (cw, ch) = (i64::from(canvas.width()), i64::from(canvas.height()));
        let (x, y) = (i64::from(x), i64::from(y));

        buffer.draw(
            &mut self.font_system,
            &mut self.swash_cache,
            color,
            |gx, gy, w, h, color| {
                let alpha = color.a() as u32;
                if alpha == 0 {
                    return;
                }
                for dy in 0..i64::from(h) {
                    for dx in 0..i64::from(w) {
                        let (px, py) = (x + i64::from(gx) + dx, y + i64::from(gy) + dy);
                        if px < 0 || py < 0 || px >= cw || py >= ch {
                            continue;
                        }
                        let dst = canvas.get_pixel_mut(px as u32, py as u32);
                        let src = [color.r(), color.g(), color.b()];
                        for (d, s) in dst.0.iter_mut().zip(src) {
                            *d = blend(*d, s, alpha);
                        }
                    }
                }
            },
        );
    }
}

impl Default for FontContext {
    fn default() -> Self {
        Self::new()
    }
}

/// `src` over `dst` with 8-bit alpha.
pub fn blend(dst: u8, src: u8, alpha: u32) -> u8 {
    ((src as u32 * alpha + dst as u32 * (255 - alpha) + 127) / 255) as u8
}

fn family_for(name: Option<&str>) -> Family<'_> {
    match name.map(str::trim) {
        None | Some("") => Family::SansSerif,
        Some(n) if n.eq_ignore_ascii_case("sans-serif") || n.eq_ignore_ascii_case("sans") => {
            Family::SansSerif
        }
        Some(n) if n.eq_ignore_ascii_case("serif") => Family::Serif,
        Some(n) if n.eq_ignore_ascii_case("monospace") || n.eq_ignore_ascii_case("mono") => {
            Family::Monospace
        }
        Some(n) => Family::Name(n),
    }
}
