//! High-level picture transforms.
//!
//! Every operation takes picture value(s) plus parameters and returns a new
//! [`PictureValue`]. The pattern is always the same:
//!
//! ```text
//! payload ──decode──▶ raster ──codec op(s)──▶ raster ──encode──▶ payload'
//!                                                  └──extract──▶ metadata'
//! ```
//!
//! Dimension math lives in [`calculations`](super::calculations); this module
//! resolves caller options and defaults, checks arguments, and drives the
//! codec. Rasters are owned values, so every early return releases them.

use super::backend::ImageCodec;
use super::calculations::{square_plan, thumbnail_dimensions};
use super::params::{CropRect, DrawTextOptions, MontageParams, Rect, TextDefaults};
use crate::color::{ColorValue, PixelQuad};
use crate::colorspace::{Colorspace, ColorspaceTable};
use crate::error::{PicError, Result};
use crate::imaging::CodecError;
use crate::metadata::MetadataExtractor;
use crate::value::PictureValue;
use tracing::debug;

/// Styling applied to every montage.
#[derive(Debug, Clone, PartialEq)]
pub struct MontageStyle {
    pub background: PixelQuad,
    pub title_font_size: f32,
}

impl Default for MontageStyle {
    fn default() -> Self {
        let defaults = MontageParams::new("", 1);
        Self {
            background: defaults.background,
            title_font_size: defaults.title_font_size,
        }
    }
}

/// Picture transforms over an [`ImageCodec`].
pub struct TransformPipeline<'a, C: ImageCodec> {
    codec: &'a C,
    extractor: MetadataExtractor<'a>,
    text_defaults: TextDefaults,
    montage_style: MontageStyle,
}

impl<'a, C: ImageCodec> TransformPipeline<'a, C> {
    pub fn new(codec: &'a C, table: &'a ColorspaceTable) -> Self {
        Self {
            codec,
            extractor: MetadataExtractor::new(table),
            text_defaults: TextDefaults::default(),
            montage_style: MontageStyle::default(),
        }
    }

    pub fn with_text_defaults(mut self, defaults: TextDefaults) -> Self {
        self.text_defaults = defaults;
        self
    }

    pub fn with_montage_style(mut self, style: MontageStyle) -> Self {
        self.montage_style = style;
        self
    }

    pub fn codec(&self) -> &C {
        self.codec
    }

    fn open(&self, value: &PictureValue) -> Result<C::Raster> {
        Ok(self.codec.decode(&value.payload)?)
    }

    /// Encode a raster and derive its metadata.
    fn seal(&self, raster: C::Raster) -> Result<PictureValue> {
        let payload = self.codec.encode(&raster)?;
        let metadata = self.extractor.extract(self.codec, &raster);
        Ok(PictureValue::new(metadata, payload))
    }

    /// Build a picture value from encoded image bytes.
    ///
    /// The bytes are decoded and re-encoded so the payload is always the
    /// codec's own output.
    pub fn import(&self, bytes: &[u8]) -> Result<PictureValue> {
        let raster = self.codec.decode(bytes)?;
        let value = self.seal(raster)?;
        debug!(
            width = value.metadata.width,
            height = value.metadata.height,
            "imported picture"
        );
        Ok(value)
    }

    /// Solid-color canvas. The color must name a concrete pixel layout.
    pub fn canvas(&self, width: u32, height: u32, color: ColorValue) -> Result<PictureValue> {
        if matches!(color.colorspace, Colorspace::Cmyk | Colorspace::Unknown) {
            return Err(PicError::UnsupportedColorspace(
                color.colorspace.name().to_string(),
            ));
        }
        if width == 0 || height == 0 {
            return Err(PicError::InvalidArgument(format!(
                "canvas size {width}x{height} must be positive"
            )));
        }
        debug!(width, height, %color, "canvas");
        let raster = self.codec.canvas(width, height, color.to_pixel())?;
        self.seal(raster)
    }

    /// Scale so the longer side equals `max_size`.
    pub fn thumbnail(&self, value: &PictureValue, max_size: u32) -> Result<PictureValue> {
        if max_size == 0 {
            return Err(PicError::InvalidArgument("thumbnail size must be positive".into()));
        }
        let raster = self.open(value)?;
        let dims = self.codec.dimensions(&raster);
        let (width, height) = thumbnail_dimensions((dims.width, dims.height), max_size)
            .ok_or_else(|| {
                CodecError::Operation(format!(
                    "cannot thumbnail a {}x{} image",
                    dims.width, dims.height
                ))
            })?;
        debug!(from_w = dims.width, from_h = dims.height, width, height, "thumbnail");
        self.seal(self.codec.thumbnail(raster, width, height)?)
    }

    /// Scale the shorter side to `size`, then center-crop to `size × size`.
    pub fn square(&self, value: &PictureValue, size: u32) -> Result<PictureValue> {
        if size == 0 {
            return Err(PicError::InvalidArgument("square size must be positive".into()));
        }
        let raster = self.open(value)?;
        let dims = self.codec.dimensions(&raster);
        let plan = square_plan((dims.width, dims.height), size).ok_or_else(|| {
            CodecError::Operation(format!(
                "cannot square a {}x{} image",
                dims.width, dims.height
            ))
        })?;
        debug!(
            scaled_w = plan.scaled.0,
            scaled_h = plan.scaled.1,
            x = plan.crop.x,
            y = plan.crop.y,
            size,
            "square"
        );
        let raster = self.codec.thumbnail(raster, plan.scaled.0, plan.scaled.1)?;
        self.seal(self.codec.crop(raster, plan.crop)?)
    }

    /// Resample to exactly `width × height`.
    pub fn resize(&self, value: &PictureValue, width: u32, height: u32) -> Result<PictureValue> {
        if width == 0 || height == 0 {
            return Err(PicError::InvalidArgument(format!(
                "resize target {width}x{height} must be positive"
            )));
        }
        let raster = self.open(value)?;
        debug!(width, height, "resize");
        self.seal(self.codec.resize(raster, width, height)?)
    }

    /// Extract a region; the window is clamped to the image by the codec.
    pub fn crop(&self, value: &PictureValue, rect: CropRect) -> Result<PictureValue> {
        if rect.width == 0 || rect.height == 0 {
            return Err(PicError::InvalidArgument(format!(
                "crop size {}x{} must be positive",
                rect.width, rect.height
            )));
        }
        let raster = self.open(value)?;
        debug!(x = rect.x, y = rect.y, width = rect.width, height = rect.height, "crop");
        self.seal(self.codec.crop(raster, rect)?)
    }

    /// Rotate clockwise; the canvas grows to the rotated bounds.
    pub fn rotate(&self, value: &PictureValue, degrees: f64) -> Result<PictureValue> {
        if !degrees.is_finite() {
            return Err(PicError::InvalidArgument(format!("invalid angle {degrees}")));
        }
        let raster = self.open(value)?;
        debug!(degrees, "rotate");
        self.seal(self.codec.rotate(raster, degrees)?)
    }

    /// Overlay text; unset options fall back to the pipeline's text defaults.
    pub fn draw_text(
        &self,
        value: &PictureValue,
        text: &str,
        options: DrawTextOptions,
    ) -> Result<PictureValue> {
        let params = options.resolve(text, &self.text_defaults);
        if !(params.font_size.is_finite() && params.font_size > 0.0) {
            return Err(PicError::InvalidArgument(format!(
                "font size {} must be positive",
                params.font_size
            )));
        }
        let raster = self.open(value)?;
        debug!(x = params.x, y = params.y, size = params.font_size, "draw text");
        self.seal(self.codec.draw_text(raster, &params)?)
    }

    /// Fill a rectangle. Corners may be given in any order.
    pub fn draw_rect(
        &self,
        value: &PictureValue,
        rect: Rect,
        color: ColorValue,
    ) -> Result<PictureValue> {
        let rect = rect.canonical();
        let raster = self.open(value)?;
        debug!(x0 = rect.x0, y0 = rect.y0, x1 = rect.x1, y1 = rect.y1, %color, "draw rect");
        self.seal(self.codec.draw_rect(raster, rect, color.to_pixel())?)
    }

    /// Arrange pictures in a grid of `columns` columns under `title`.
    pub fn montage(
        &self,
        values: &[PictureValue],
        title: &str,
        columns: u32,
    ) -> Result<PictureValue> {
        if values.is_empty() {
            return Err(PicError::EmptyInput);
        }
        if columns == 0 {
            return Err(PicError::InvalidArgument("montage needs at least one column".into()));
        }
        let tiles = values
            .iter()
            .map(|v| self.open(v))
            .collect::<Result<Vec<_>>>()?;

        let mut params = MontageParams::new(title, columns);
        params.background = self.montage_style.background;
        params.title_font_size = self.montage_style.title_font_size;

        debug!(tiles = tiles.len(), columns, title, "montage");
        self.seal(self.codec.montage(tiles, &params)?)
    }
}
