//! Pure Rust codec built on the `image` crate ecosystem.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::load_from_memory` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` + EXIF APP1 re-injection |
//! | EXIF attributes | `kamadak-exif` via [`exif_reader`](super::exif_reader) |
//! | Thumbnail | `DynamicImage::thumbnail_exact` |
//! | Resize | `DynamicImage::resize_exact` with `CatmullRom` (cubic) |
//! | Crop | `DynamicImage::crop_imm`, window clamped to the image |
//! | Rotate | `rotate90/180/270`, otherwise `imageproc::rotate_about_center` |
//! | Rectangles, shadows | `imageproc::drawing::draw_filled_rect_mut` |
//! | Text | `cosmic-text` via [`text`](super::text) |
//! | Montage | composed in memory, round-tripped through a `tempfile` JPEG |
//!
//! Rasters are kept as 8-bit gray or 8-bit RGB so that every raster can be
//! encoded to JPEG without changing its colorspace. The EXIF block of the
//! decoded source travels with the raster, so metadata stays derivable from
//! the payload after a transform.

use super::backend::{CodecError, Dimensions, ImageCodec};
use super::calculations::{clamp_crop, quarter_turns, rotated_bounds, MontageLayout};
use super::exif_reader::{embed_in_jpeg, read_exif, ExifBlock};
use super::params::{CropRect, MontageParams, Quality, Rect, TextParams};
use super::text::{blend, FontContext};
use crate::color::PixelQuad;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageReader, Luma, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

const WHITE: PixelQuad = PixelQuad {
    red: 255,
    green: 255,
    blue: 255,
    opacity: 0,
};
const BLACK: PixelQuad = PixelQuad {
    red: 0,
    green: 0,
    blue: 0,
    opacity: 0,
};
const SHADOW: Rgb<u8> = Rgb([128, 128, 128]);
const TITLE_INK: [u8; 4] = [0, 0, 0, 255];

/// A decoded image plus the EXIF block it was decoded with.
#[derive(Debug, Clone)]
pub struct Raster {
    image: DynamicImage,
    exif: Option<ExifBlock>,
}

impl Raster {
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Same EXIF, new pixels.
    fn with_image(self, image: DynamicImage) -> Self {
        Self {
            image: normalize(image),
            exif: self.exif,
        }
    }
}

/// Codec using the `image` crate for pixels and `kamadak-exif` for attributes.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustCodec {
    quality: Quality,
    scratch_dir: Option<PathBuf>,
    fonts: OnceLock<Mutex<FontContext>>,
}

impl RustCodec {
    pub fn new(quality: Quality) -> Self {
        Self {
            quality,
            scratch_dir: None,
            fonts: OnceLock::new(),
        }
    }

    /// Directory for montage scratch files instead of the system temp dir.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    fn with_fonts<T>(&self, f: impl FnOnce(&mut FontContext) -> T) -> Result<T, CodecError> {
        let fonts = self.fonts.get_or_init(|| Mutex::new(FontContext::new()));
        let mut guard = fonts
            .lock()
            .map_err(|_| CodecError::Operation("font context poisoned".into()))?;
        Ok(f(&mut guard))
    }

    fn encode_jpeg(&self, image: &DynamicImage) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut out, self.quality.value() as u8);
        image
            .write_with_encoder(encoder)
            .map_err(|e| CodecError::Encode(format!("JPEG encode failed: {e}")))?;
        Ok(out)
    }

    /// Write the composed montage to a scratch JPEG and decode it back.
    /// The scratch file is removed when `scratch` drops, on every path.
    fn materialize(&self, composed: &DynamicImage) -> Result<DynamicImage, CodecError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("postpic-montage-").suffix(".jpg");
        let mut scratch = match &self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        scratch.write_all(&self.encode_jpeg(composed)?)?;
        scratch.flush()?;

        ImageReader::open(scratch.path())?
            .with_guessed_format()?
            .decode()
            .map_err(|e| {
                CodecError::Decode(format!(
                    "Failed to decode {}: {e}",
                    scratch.path().display()
                ))
            })
    }
}

impl Default for RustCodec {
    fn default() -> Self {
        Self::new(Quality::default())
    }
}

/// Reduce any decoded image to 8-bit gray or 8-bit RGB. Alpha is
/// composited over white before it is dropped.
fn normalize(image: DynamicImage) -> DynamicImage {
    let color = image.color();
    match image {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => image,
        _ if color.has_alpha() && !color.has_color() => {
            let gray = image.to_luma_alpha8();
            DynamicImage::ImageLuma8(GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
                let [l, a] = gray.get_pixel(x, y).0;
                Luma([blend(255, l, a as u32)])
            }))
        }
        _ if color.has_alpha() => {
            let rgba = image.to_rgba8();
            DynamicImage::ImageRgb8(RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
                let [r, g, b, a] = rgba.get_pixel(x, y).0;
                let a = a as u32;
                Rgb([blend(255, r, a), blend(255, g, a), blend(255, b, a)])
            }))
        }
        _ if !color.has_color() => DynamicImage::ImageLuma8(image.to_luma8()),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

/// Color of `fill` once composited over white.
fn flatten(fill: PixelQuad) -> Rgb<u8> {
    let alpha = fill.alpha() as u32;
    Rgb([
        blend(255, fill.red, alpha),
        blend(255, fill.green, alpha),
        blend(255, fill.blue, alpha),
    ])
}

fn is_neutral(fill: PixelQuad) -> bool {
    fill.red == fill.green && fill.green == fill.blue
}

/// Paint onto an RGB copy of `image`. Gray images stay gray when the paint is
/// neutral and are promoted to RGB otherwise.
fn paint(image: DynamicImage, fill: PixelQuad, f: impl FnOnce(&mut RgbImage)) -> DynamicImage {
    let keep_gray = matches!(image, DynamicImage::ImageLuma8(_)) && is_neutral(fill);
    let mut rgb = image.to_rgb8();
    f(&mut rgb);
    let painted = DynamicImage::ImageRgb8(rgb);
    if keep_gray {
        DynamicImage::ImageLuma8(painted.to_luma8())
    } else {
        painted
    }
}

fn rotate_arbitrary(image: &DynamicImage, degrees: f64) -> DynamicImage {
    let (bw, bh) = rotated_bounds(image.width(), image.height(), degrees);
    let x = (bw as i64 - image.width() as i64) / 2;
    let y = (bh as i64 - image.height() as i64) / 2;
    let theta = degrees.to_radians() as f32;

    match image {
        DynamicImage::ImageLuma8(gray) => {
            let mut canvas = GrayImage::from_pixel(bw, bh, Luma([255]));
            image::imageops::overlay(&mut canvas, gray, x, y);
            DynamicImage::ImageLuma8(rotate_about_center(
                &canvas,
                theta,
                Interpolation::Bilinear,
                Luma([255]),
            ))
        }
        other => {
            let mut canvas = RgbImage::from_pixel(bw, bh, Rgb([255, 255, 255]));
            image::imageops::overlay(&mut canvas, &other.to_rgb8(), x, y);
            DynamicImage::ImageRgb8(rotate_about_center(
                &canvas,
                theta,
                Interpolation::Bilinear,
                Rgb([255, 255, 255]),
            ))
        }
    }
}

/// Fill the inclusive rectangle, clipped to the canvas.
fn fill_rect(canvas: &mut RgbImage, rect: Rect, fill: PixelQuad) {
    let alpha = fill.alpha() as u32;
    let Some(area) = rect.clip(canvas.width(), canvas.height()) else {
        return;
    };
    if alpha == 0 {
        return;
    }
    if alpha == 255 {
        // Clipped extent is within the canvas, so it fits in i32.
        let at = imageproc::rect::Rect::at(area.x as i32, area.y as i32)
            .of_size(area.width, area.height);
        draw_filled_rect_mut(canvas, at, Rgb([fill.red, fill.green, fill.blue]));
        return;
    }

    for y in area.y..area.y + area.height {
        for x in area.x..area.x + area.width {
            let px = canvas.get_pixel_mut(x, y);
            for (d, s) in px.0.iter_mut().zip([fill.red, fill.green, fill.blue]) {
                *d = blend(*d, s, alpha);
            }
        }
    }
}

fn non_empty(width: u32, height: u32, what: &str) -> Result<(), CodecError> {
    if width == 0 || height == 0 {
        return Err(CodecError::Operation(format!(
            "{what}: invalid geometry {width}x{height}"
        )));
    }
    Ok(())
}

impl ImageCodec for RustCodec {
    type Raster = Raster;

    fn decode(&self, bytes: &[u8]) -> Result<Raster, CodecError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| CodecError::Decode(format!("Failed to decode image: {e}")))?;
        Ok(Raster {
            image: normalize(image),
            exif: read_exif(bytes),
        })
    }

    fn encode(&self, raster: &Raster) -> Result<Vec<u8>, CodecError> {
        let jpeg = self.encode_jpeg(&raster.image)?;
        Ok(match &raster.exif {
            Some(exif) => embed_in_jpeg(jpeg, &exif.raw),
            None => jpeg,
        })
    }

    fn dimensions(&self, raster: &Raster) -> Dimensions {
        Dimensions {
            width: raster.image.width(),
            height: raster.image.height(),
        }
    }

    fn colorspace_tag(&self, raster: &Raster) -> String {
        let tag = match &raster.image {
            DynamicImage::ImageLuma8(_) => "Gray",
            _ if raster
                .exif
                .as_ref()
                .and_then(|e| e.get("ColorSpace"))
                .is_some_and(|cs| cs.trim() == "1") =>
            {
                "sRGB"
            }
            _ => "RGB",
        };
        tag.to_string()
    }

    fn attribute(&self, raster: &Raster, key: &str) -> Option<String> {
        raster.exif.as_ref()?.get(key).map(str::to_string)
    }

    fn canvas(&self, width: u32, height: u32, fill: PixelQuad) -> Result<Raster, CodecError> {
        non_empty(width, height, "canvas")?;
        Ok(Raster {
            image: DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, flatten(fill))),
            exif: None,
        })
    }

    fn thumbnail(&self, raster: Raster, width: u32, height: u32) -> Result<Raster, CodecError> {
        non_empty(raster.image.width(), raster.image.height(), "thumbnail")?;
        non_empty(width, height, "thumbnail")?;
        let image = raster.image.thumbnail_exact(width, height);
        Ok(raster.with_image(image))
    }

    fn resize(&self, raster: Raster, width: u32, height: u32) -> Result<Raster, CodecError> {
        non_empty(width, height, "resize")?;
        let image = raster
            .image
            .resize_exact(width, height, FilterType::CatmullRom);
        Ok(raster.with_image(image))
    }

    fn crop(&self, raster: Raster, rect: CropRect) -> Result<Raster, CodecError> {
        let source = (raster.image.width(), raster.image.height());
        let window = clamp_crop(source, rect).ok_or_else(|| {
            CodecError::Operation(format!(
                "geometry does not contain image: {}x{}+{}+{} outside {}x{}",
                rect.width, rect.height, rect.x, rect.y, source.0, source.1
            ))
        })?;
        let image = raster
            .image
            .crop_imm(window.x, window.y, window.width, window.height);
        Ok(raster.with_image(image))
    }

    fn rotate(&self, raster: Raster, degrees: f64) -> Result<Raster, CodecError> {
        if !degrees.is_finite() {
            return Err(CodecError::Operation(format!("invalid angle {degrees}")));
        }
        let image = match quarter_turns(degrees) {
            Some(0) => return Ok(raster),
            Some(1) => raster.image.rotate90(),
            Some(2) => raster.image.rotate180(),
            Some(_) => raster.image.rotate270(),
            None => rotate_arbitrary(&raster.image, degrees),
        };
        Ok(raster.with_image(image))
    }

    fn draw_text(&self, raster: Raster, params: &TextParams) -> Result<Raster, CodecError> {
        let fill = params.fill.unwrap_or(BLACK);
        let Raster { image, exif } = raster;
        let image = self.with_fonts(|fonts| {
            paint(image, fill, |canvas| {
                fonts.draw(
                    canvas,
                    &params.text,
                    params.x,
                    params.y,
                    params.font_size,
                    params.font_family.as_deref(),
                    fill.to_rgba(),
                )
            })
        })?;
        Ok(Raster {
            image: normalize(image),
            exif,
        })
    }

    fn draw_rect(&self, raster: Raster, rect: Rect, fill: PixelQuad) -> Result<Raster, CodecError> {
        let Raster { image, exif } = raster;
        let image = paint(image, fill, |canvas| fill_rect(canvas, rect, fill));
        Ok(Raster {
            image: normalize(image),
            exif,
        })
    }

    fn montage(&self, tiles: Vec<Raster>, params: &MontageParams) -> Result<Raster, CodecError> {
        let sizes: Vec<(u32, u32)> = tiles
            .iter()
            .map(|t| (t.image.width(), t.image.height()))
            .collect();
        let layout = MontageLayout::plan(&sizes, params).ok_or_else(|| {
            CodecError::Operation(format!(
                "cannot lay out {} tiles in {} columns",
                tiles.len(),
                params.columns
            ))
        })?;

        let background = flatten(params.background);
        let mut canvas = RgbImage::from_pixel(layout.width, layout.height, background);
        for (index, tile) in tiles.iter().enumerate() {
            let (tw, th) = sizes[index];
            let (x, y) = layout.tile_origin(index, (tw, th));
            if layout.shadow_offset > 0 {
                let off = layout.shadow_offset as i32;
                let shadow =
                    imageproc::rect::Rect::at(x as i32 + off, y as i32 + off).of_size(tw, th);
                draw_filled_rect_mut(&mut canvas, shadow, SHADOW);
            }
            image::imageops::overlay(&mut canvas, &tile.image.to_rgb8(), x as i64, y as i64);
        }
        drop(tiles);

        let title = params.title.trim();
        if !title.is_empty() {
            self.with_fonts(|fonts| {
                let (text_w, _) = fonts.measure(title, params.title_font_size, None);
                let x = (layout.width as i32 - text_w as i32) / 2;
                let y = layout.spacing as i32;
                fonts.draw(
                    &mut canvas,
                    title,
                    x.max(0),
                    y,
                    params.title_font_size,
                    None,
                    TITLE_INK,
                );
            })?;
        }

        let composed = DynamicImage::ImageRgb8(canvas);
        let image = self.materialize(&composed)?;
        Ok(Raster {
            image: normalize(image),
            exif: None,
        })
    }
}
