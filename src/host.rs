//! Host-facing entry points.
//!
//! [`Host`] owns everything a call needs (configuration, colorspace table,
//! codec and blob store) and exposes each operation twice: as a typed method
//! and by name through [`Host::call`], which takes its arguments as
//! [`Datum`]s the way a database host passes them.
//!
//! ## Functions
//!
//! | Name | Arguments | Result |
//! |---|---|---|
//! | `image_in`, `image_create_from_loid` | blob id | picture |
//! | `image_import` | bytes | picture |
//! | `image_out` | picture | text `date\|w\|h\|f\|exp\|iso` |
//! | `image_new` | width, height, color | picture |
//! | `image_data` | picture | bytes |
//! | `image_width`, `image_height` | picture | int |
//! | `image_date` | picture | timestamp or null |
//! | `image_iso` | picture | int or null |
//! | `image_f_number`, `image_exposure_time`, `image_focal_length` | picture | float or null |
//! | `image_colorspace` | picture | text |
//! | `image_thumbnail`, `image_square` | picture, size | picture |
//! | `image_resize` | picture, width, height | picture |
//! | `image_crop` | picture, x, y, width, height | picture |
//! | `image_rotate` | picture, degrees | picture |
//! | `image_draw_text` | picture, text [, x, y [, family [, size [, color]]]] | picture |
//! | `image_draw_rect` | picture, x0, y0, x1, y1, color | picture |
//! | `image_montage` | picture[], title, columns | picture |
//! | `color_in` / `color_out` | text / color | color / text |
//! | `postpic_version` | | text |
//! | `postpic_version_release/major/minor` | | int |
//!
//! Calls are strict: a null required argument yields a null result without
//! running the operation. Optional trailing arguments may be omitted or null.

use crate::blob::BlobStore;
use crate::color::{ColorCodec, ColorValue};
use crate::colorspace::ColorspaceTable;
use crate::config::{ConfigError, PicConfig};
use crate::error::{PicError, Result};
use crate::imaging::{
    CropRect, DrawTextOptions, ImageCodec, MontageStyle, Rect, RustCodec, TextDefaults,
    TransformPipeline,
};
use crate::timestamp::Timestamp;
use crate::value::PictureValue;
use thiserror::Error;

pub const VERSION_RELEASE: i32 = 1;
pub const VERSION_MAJOR: i32 = 0;
pub const VERSION_MINOR: i32 = 0;

/// `PostPic version R.M.m`
pub fn postpic_version() -> String {
    format!("PostPic version {VERSION_RELEASE}.{VERSION_MAJOR}.{VERSION_MINOR}")
}

/// A value crossing the host boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(Timestamp),
    Picture(PictureValue),
    Color(ColorValue),
    Array(Vec<Datum>),
}

impl Datum {
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    fn type_name(&self) -> &'static str {
        match self {
            Datum::Null => "null",
            Datum::Int(_) => "int",
            Datum::Float(_) => "float",
            Datum::Text(_) => "text",
            Datum::Bytes(_) => "bytes",
            Datum::Timestamp(_) => "timestamp",
            Datum::Picture(_) => "picture",
            Datum::Color(_) => "color",
            Datum::Array(_) => "array",
        }
    }
}

impl From<Option<i64>> for Datum {
    fn from(v: Option<i64>) -> Self {
        v.map_or(Datum::Null, Datum::Int)
    }
}

impl From<Option<f64>> for Datum {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Datum::Null, Datum::Float)
    }
}

#[derive(Error, Debug)]
pub enum HostError {
    #[error("function {0}() does not exist")]
    UnknownFunction(String),
    #[error("{name}() takes {expected} arguments, got {got}")]
    Arity {
        name: String,
        expected: String,
        got: usize,
    },
    #[error("{name}(): argument {index} must be {expected}, got {got}")]
    ArgumentType {
        name: String,
        index: usize,
        expected: &'static str,
        got: &'static str,
    },
    #[error(transparent)]
    Pic(#[from] PicError),
}

/// Arguments of one call, with typed accessors that report the function name.
struct Args<'a> {
    name: &'a str,
    values: Vec<Datum>,
}

impl<'a> Args<'a> {
    fn new(
        name: &'a str,
        values: Vec<Datum>,
        min: usize,
        max: usize,
    ) -> std::result::Result<Self, HostError> {
        let got = values.len();
        if got < min || got > max {
            let expected = if min == max {
                min.to_string()
            } else {
                format!("{min} to {max}")
            };
            return Err(HostError::Arity {
                name: name.to_string(),
                expected,
                got,
            });
        }
        Ok(Self { name, values })
    }

    /// Whether any of the first `required` arguments is null.
    fn any_null(&self, required: usize) -> bool {
        self.values.iter().take(required).any(Datum::is_null)
    }

    fn mismatch(&self, index: usize, expected: &'static str) -> HostError {
        HostError::ArgumentType {
            name: self.name.to_string(),
            index: index + 1,
            expected,
            got: self.values.get(index).map_or("nothing", Datum::type_name),
        }
    }

    /// Argument `index`, or `None` when omitted or null.
    fn get(&self, index: usize) -> Option<&Datum> {
        self.values.get(index).filter(|d| !d.is_null())
    }

    fn picture(&self, index: usize) -> std::result::Result<&PictureValue, HostError> {
        match self.get(index) {
            Some(Datum::Picture(p)) => Ok(p),
            _ => Err(self.mismatch(index, "picture")),
        }
    }

    fn pictures(&self, index: usize) -> std::result::Result<Vec<PictureValue>, HostError> {
        match self.get(index) {
            Some(Datum::Array(items)) => items
                .iter()
                .map(|d| match d {
                    Datum::Picture(p) => Ok(p.clone()),
                    _ => Err(self.mismatch(index, "picture[]")),
                })
                .collect(),
            _ => Err(self.mismatch(index, "picture[]")),
        }
    }

    fn opt_int(&self, index: usize) -> std::result::Result<Option<i64>, HostError> {
        match self.get(index) {
            None => Ok(None),
            Some(Datum::Int(v)) => Ok(Some(*v)),
            Some(_) => Err(self.mismatch(index, "int")),
        }
    }

    fn int(&self, index: usize) -> std::result::Result<i64, HostError> {
        self.opt_int(index)?.ok_or_else(|| self.mismatch(index, "int"))
    }

    fn i32(&self, index: usize) -> std::result::Result<i32, HostError> {
        let v = self.int(index)?;
        i32::try_from(v).map_err(|_| {
            PicError::InvalidArgument(format!("{}(): {v} is out of range", self.name)).into()
        })
    }

    fn u32(&self, index: usize) -> std::result::Result<u32, HostError> {
        let v = self.int(index)?;
        u32::try_from(v).map_err(|_| {
            PicError::InvalidArgument(format!("{}(): {v} must be a non-negative size", self.name))
                .into()
        })
    }

    fn opt_float(&self, index: usize) -> std::result::Result<Option<f64>, HostError> {
        match self.get(index) {
            None => Ok(None),
            Some(Datum::Float(v)) => Ok(Some(*v)),
            Some(Datum::Int(v)) => Ok(Some(*v as f64)),
            Some(_) => Err(self.mismatch(index, "float")),
        }
    }

    fn float(&self, index: usize) -> std::result::Result<f64, HostError> {
        self.opt_float(index)?.ok_or_else(|| self.mismatch(index, "float"))
    }

    fn opt_text(&self, index: usize) -> std::result::Result<Option<&str>, HostError> {
        match self.get(index) {
            None => Ok(None),
            Some(Datum::Text(s)) => Ok(Some(s)),
            Some(_) => Err(self.mismatch(index, "text")),
        }
    }

    fn text(&self, index: usize) -> std::result::Result<&str, HostError> {
        self.opt_text(index)?.ok_or_else(|| self.mismatch(index, "text"))
    }

    fn bytes(&self, index: usize) -> std::result::Result<&[u8], HostError> {
        match self.get(index) {
            Some(Datum::Bytes(b)) => Ok(b),
            _ => Err(self.mismatch(index, "bytes")),
        }
    }

    /// A color value, or a color literal to be parsed with `codec`.
    fn opt_color(
        &self,
        index: usize,
        codec: &ColorCodec<'_>,
    ) -> std::result::Result<Option<ColorValue>, HostError> {
        match self.get(index) {
            None => Ok(None),
            Some(Datum::Color(c)) => Ok(Some(*c)),
            Some(Datum::Text(s)) => Ok(Some(codec.parse(s)?)),
            Some(_) => Err(self.mismatch(index, "color")),
        }
    }

    fn color(
        &self,
        index: usize,
        codec: &ColorCodec<'_>,
    ) -> std::result::Result<ColorValue, HostError> {
        self.opt_color(index, codec)?
            .ok_or_else(|| self.mismatch(index, "color"))
    }
}

/// Entry points over one codec and blob store.
pub struct Host<C: ImageCodec = RustCodec> {
    config: PicConfig,
    table: ColorspaceTable,
    codec: C,
    blobs: Box<dyn BlobStore>,
    text_defaults: TextDefaults,
    montage_style: MontageStyle,
}

impl Host<RustCodec> {
    /// Host over the pure Rust codec, configured from `config`.
    pub fn from_config(
        config: PicConfig,
        blobs: Box<dyn BlobStore>,
    ) -> std::result::Result<Self, ConfigError> {
        let codec = RustCodec::new(config.quality());
        Self::new(config, codec, blobs)
    }
}

impl<C: ImageCodec> Host<C> {
    pub fn new(
        config: PicConfig,
        codec: C,
        blobs: Box<dyn BlobStore>,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let table = ColorspaceTable::new();
        let text_defaults = config.text_defaults(&table)?;
        let montage_style = config.montage_style(&table)?;
        Ok(Self {
            config,
            table,
            codec,
            blobs,
            text_defaults,
            montage_style,
        })
    }

    pub fn config(&self) -> &PicConfig {
        &self.config
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn pipeline(&self) -> TransformPipeline<'_, C> {
        TransformPipeline::new(&self.codec, &self.table)
            .with_text_defaults(self.text_defaults.clone())
            .with_montage_style(self.montage_style.clone())
    }

    pub fn color_codec(&self) -> ColorCodec<'_> {
        ColorCodec::new(&self.table).strict(self.config.colors.strict_names)
    }

    // =========================================================================
    // Typed entry points
    // =========================================================================

    /// Import the blob `id` from the blob store.
    pub fn image_in(&self, id: &str) -> Result<PictureValue> {
        let bytes = self.blobs.read_all(id)?;
        self.pipeline().import(&bytes)
    }

    pub fn image_import(&self, bytes: &[u8]) -> Result<PictureValue> {
        self.pipeline().import(bytes)
    }

    pub fn image_out(&self, value: &PictureValue) -> String {
        value.summary()
    }

    pub fn image_new(&self, width: u32, height: u32, color: ColorValue) -> Result<PictureValue> {
        self.pipeline().canvas(width, height, color)
    }

    pub fn color_in(&self, text: &str) -> Result<ColorValue> {
        self.color_codec().parse(text)
    }

    pub fn color_out(&self, color: ColorValue) -> String {
        self.color_codec().format(color)
    }

    // =========================================================================
    // Dispatch by name
    // =========================================================================

    /// Run the entry point `name` with host-style arguments.
    pub fn call(&self, name: &str, args: Vec<Datum>) -> std::result::Result<Datum, HostError> {
        let pipeline = self.pipeline();
        let colors = self.color_codec();

        let result = match name {
            "postpic_version" => {
                Args::new(name, args, 0, 0)?;
                Datum::Text(postpic_version())
            }
            "postpic_version_release" | "postpic_version_major" | "postpic_version_minor" => {
                Args::new(name, args, 0, 0)?;
                let v = match name {
                    "postpic_version_release" => VERSION_RELEASE,
                    "postpic_version_major" => VERSION_MAJOR,
                    _ => VERSION_MINOR,
                };
                Datum::Int(i64::from(v))
            }
            "image_in" | "image_create_from_loid" => {
                let a = Args::new(name, args, 1, 1)?;
                if a.any_null(1) {
                    return Ok(Datum::Null);
                }
                let id = match a.get(0) {
                    Some(Datum::Int(id)) => id.to_string(),
                    Some(Datum::Text(id)) => id.clone(),
                    _ => return Err(a.mismatch(0, "blob id")),
                };
                Datum::Picture(self.image_in(&id)?)
            }
            "image_import" => {
                let a = Args::new(name, args, 1, 1)?;
                if a.any_null(1) {
                    return Ok(Datum::Null);
                }
                Datum::Picture(pipeline.import(a.bytes(0)?)?)
            }
            "image_new" => {
                let a = Args::new(name, args, 3, 3)?;
                if a.any_null(3) {
                    return Ok(Datum::Null);
                }
                Datum::Picture(pipeline.canvas(a.u32(0)?, a.u32(1)?, a.color(2, &colors)?)?)
            }
            "color_in" => {
                let a = Args::new(name, args, 1, 1)?;
                if a.any_null(1) {
                    return Ok(Datum::Null);
                }
                Datum::Color(colors.parse(a.text(0)?)?)
            }
            "color_out" => {
                let a = Args::new(name, args, 1, 1)?;
                if a.any_null(1) {
                    return Ok(Datum::Null);
                }
                Datum::Text(colors.format(a.color(0, &colors)?))
            }
            "image_montage" => {
                let a = Args::new(name, args, 3, 3)?;
                if a.any_null(3) {
                    return Ok(Datum::Null);
                }
                let values = a.pictures(0)?;
                Datum::Picture(pipeline.montage(&values, a.text(1)?, a.u32(2)?)?)
            }
            _ => return self.call_on_picture(name, args, &pipeline, &colors),
        };
        Ok(result)
    }

    /// Entry points whose first argument is a picture.
    fn call_on_picture(
        &self,
        name: &str,
        args: Vec<Datum>,
        pipeline: &TransformPipeline<'_, C>,
        colors: &ColorCodec<'_>,
    ) -> std::result::Result<Datum, HostError> {
        let (min, max) = match name {
            "image_out" | "image_data" | "image_width" | "image_height" | "image_date"
            | "image_iso" | "image_f_number" | "image_exposure_time" | "image_focal_length"
            | "image_colorspace" => (1, 1),
            "image_thumbnail" | "image_square" | "image_rotate" => (2, 2),
            "image_resize" => (3, 3),
            "image_crop" => (5, 5),
            "image_draw_text" => (2, 7),
            "image_draw_rect" => (6, 6),
            _ => return Err(HostError::UnknownFunction(name.to_string())),
        };
        let a = Args::new(name, args, min, max)?;
        if a.any_null(min) {
            return Ok(Datum::Null);
        }
        let value = a.picture(0)?;
        let m = &value.metadata;

        let result = match name {
            "image_out" => Datum::Text(self.image_out(value)),
            "image_data" => Datum::Bytes(value.payload.clone()),
            "image_width" => Datum::Int(i64::from(m.width)),
            "image_height" => Datum::Int(i64::from(m.height)),
            "image_date" => m.timestamp.map_or(Datum::Null, Datum::Timestamp),
            "image_iso" => m.iso_speed.map(i64::from).into(),
            "image_f_number" => m.f_number.into(),
            "image_exposure_time" => m.exposure_time.into(),
            "image_focal_length" => m.focal_length.into(),
            "image_colorspace" => Datum::Text(m.colorspace.name().to_string()),
            "image_thumbnail" => Datum::Picture(pipeline.thumbnail(value, a.u32(1)?)?),
            "image_square" => Datum::Picture(pipeline.square(value, a.u32(1)?)?),
            "image_rotate" => Datum::Picture(pipeline.rotate(value, a.float(1)?)?),
            "image_resize" => Datum::Picture(pipeline.resize(value, a.u32(1)?, a.u32(2)?)?),
            "image_crop" => {
                let rect = CropRect {
                    x: a.u32(1)?,
                    y: a.u32(2)?,
                    width: a.u32(3)?,
                    height: a.u32(4)?,
                };
                Datum::Picture(pipeline.crop(value, rect)?)
            }
            "image_draw_text" => {
                let to_i32 = |v: Option<i64>| -> std::result::Result<Option<i32>, HostError> {
                    v.map(|v| {
                        i32::try_from(v).map_err(|_| {
                            HostError::from(PicError::InvalidArgument(format!(
                                "{name}(): {v} is out of range"
                            )))
                        })
                    })
                    .transpose()
                };
                let options = DrawTextOptions {
                    x: to_i32(a.opt_int(2)?)?,
                    y: to_i32(a.opt_int(3)?)?,
                    font_family: a.opt_text(4)?.map(str::to_string),
                    font_size: a.opt_float(5)?.map(|s| s as f32),
                    color: a.opt_color(6, colors)?,
                };
                Datum::Picture(pipeline.draw_text(value, a.text(1)?, options)?)
            }
            "image_draw_rect" => {
                let rect = Rect::new(a.i32(1)?, a.i32(2)?, a.i32(3)?, a.i32(4)?);
                Datum::Picture(pipeline.draw_rect(value, rect, a.color(5, colors)?)?)
            }
            _ => return Err(HostError::UnknownFunction(name.to_string())),
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::MemoryBlobStore;
    use crate::colorspace::Colorspace;
    use crate::imaging::backend::tests::MockCodec;

    fn host() -> Host<MockCodec> {
        let mut blobs = MemoryBlobStore::new();
        blobs.insert("42", MockCodec::encoded(1600, 1200));
        blobs.insert("garbage", b"not an image".to_vec());
        Host::new(PicConfig::default(), MockCodec::new(), Box::new(blobs)).unwrap()
    }

    fn picture(host: &Host<MockCodec>, w: u32, h: u32) -> Datum {
        Datum::Picture(host.image_import(&MockCodec::encoded(w, h)).unwrap())
    }

    #[test]
    fn version_functions() {
        let h = host();
        assert_eq!(
            h.call("postpic_version", vec![]).unwrap(),
            Datum::Text("PostPic version 1.0.0".into())
        );
        assert_eq!(h.call("postpic_version_release", vec![]).unwrap(), Datum::Int(1));
        assert_eq!(h.call("postpic_version_minor", vec![]).unwrap(), Datum::Int(0));
    }

    #[test]
    fn version_matches_package() {
        assert_eq!(
            format!("{VERSION_RELEASE}.{VERSION_MAJOR}.{VERSION_MINOR}"),
            env!("CARGO_PKG_VERSION")
        );
    }

    #[test]
    fn image_in_reads_blob_store() {
        let h = host();
        for id in [Datum::Text("42".into()), Datum::Int(42)] {
            let Datum::Picture(p) = h.call("image_in", vec![id]).unwrap() else {
                panic!("expected a picture");
            };
            assert_eq!((p.metadata.width, p.metadata.height), (1600, 1200));
        }
    }

    #[test]
    fn image_in_surfaces_codec_and_blob_errors() {
        let h = host();
        let err = h.call("image_in", vec![Datum::Text("garbage".into())]).unwrap_err();
        assert!(matches!(err, HostError::Pic(PicError::Codec(_))));
        let err = h.call("image_in", vec![Datum::Text("missing".into())]).unwrap_err();
        assert!(matches!(err, HostError::Pic(PicError::Blob(_))));
    }

    #[test]
    fn getters_report_absent_as_null() {
        let h = host();
        let p = picture(&h, 640, 480);
        assert_eq!(h.call("image_width", vec![p.clone()]).unwrap(), Datum::Int(640));
        assert_eq!(h.call("image_height", vec![p.clone()]).unwrap(), Datum::Int(480));
        assert_eq!(h.call("image_date", vec![p.clone()]).unwrap(), Datum::Null);
        assert_eq!(h.call("image_iso", vec![p.clone()]).unwrap(), Datum::Null);
        assert_eq!(h.call("image_f_number", vec![p.clone()]).unwrap(), Datum::Null);
        assert_eq!(
            h.call("image_colorspace", vec![p.clone()]).unwrap(),
            Datum::Text("RGB".into())
        );
        assert_eq!(
            h.call("image_out", vec![p]).unwrap(),
            Datum::Text("|640|480|-1|-1|-1".into())
        );
    }

    #[test]
    fn image_data_returns_payload() {
        let h = host();
        let p = picture(&h, 10, 10);
        assert_eq!(
            h.call("image_data", vec![p]).unwrap(),
            Datum::Bytes(MockCodec::encoded(10, 10))
        );
    }

    #[test]
    fn transforms_by_name() {
        let h = host();
        let p = picture(&h, 1600, 1200);

        let Datum::Picture(thumb) = h
            .call("image_thumbnail", vec![p.clone(), Datum::Int(400)])
            .unwrap()
        else {
            panic!("expected a picture");
        };
        assert_eq!((thumb.metadata.width, thumb.metadata.height), (400, 300));

        let Datum::Picture(sq) = h.call("image_square", vec![p.clone(), Datum::Int(64)]).unwrap()
        else {
            panic!("expected a picture");
        };
        assert_eq!((sq.metadata.width, sq.metadata.height), (64, 64));

        let Datum::Picture(cropped) = h
            .call(
                "image_crop",
                vec![p, Datum::Int(0), Datum::Int(0), Datum::Int(100), Datum::Int(50)],
            )
            .unwrap()
        else {
            panic!("expected a picture");
        };
        assert_eq!((cropped.metadata.width, cropped.metadata.height), (100, 50));
    }

    #[test]
    fn draw_text_optional_arguments() {
        let h = host();
        let p = picture(&h, 100, 100);
        assert!(h.call("image_draw_text", vec![p.clone(), Datum::Text("hi".into())]).is_ok());
        assert!(h
            .call(
                "image_draw_text",
                vec![
                    p.clone(),
                    Datum::Text("hi".into()),
                    Datum::Null,
                    Datum::Null,
                    Datum::Text("serif".into()),
                    Datum::Float(12.0),
                    Datum::Text("RGB#ff0000".into()),
                ],
            )
            .is_ok());
        assert!(matches!(
            h.call("image_draw_text", vec![p]),
            Err(HostError::Arity { .. })
        ));
    }

    #[test]
    fn montage_takes_array() {
        let h = host();
        let tiles = Datum::Array(vec![picture(&h, 10, 10), picture(&h, 20, 20)]);
        assert!(matches!(
            h.call("image_montage", vec![tiles, Datum::Text("t".into()), Datum::Int(2)]),
            Ok(Datum::Picture(_))
        ));

        let err = h
            .call(
                "image_montage",
                vec![Datum::Array(vec![]), Datum::Text("t".into()), Datum::Int(2)],
            )
            .unwrap_err();
        assert!(matches!(err, HostError::Pic(PicError::EmptyInput)));
    }

    #[test]
    fn colors_by_name() {
        let h = host();
        let c = h
            .call("color_in", vec![Datum::Text("RGBA#11223344".into())])
            .unwrap();
        assert_eq!(c, Datum::Color(ColorValue::new(Colorspace::Rgba, 0x11223344)));
        assert_eq!(
            h.call("color_out", vec![c]).unwrap(),
            Datum::Text("RGBA#11223344".into())
        );
    }

    #[test]
    fn image_new_rejects_cmyk() {
        let h = host();
        let err = h
            .call(
                "image_new",
                vec![Datum::Int(10), Datum::Int(10), Datum::Text("CMYK#00000000".into())],
            )
            .unwrap_err();
        assert!(matches!(err, HostError::Pic(PicError::UnsupportedColorspace(_))));
    }

    #[test]
    fn null_input_yields_null() {
        let h = host();
        assert_eq!(h.call("image_width", vec![Datum::Null]).unwrap(), Datum::Null);
        assert_eq!(
            h.call("image_thumbnail", vec![picture(&h, 5, 5), Datum::Null]).unwrap(),
            Datum::Null
        );
    }

    #[test]
    fn call_errors() {
        let h = host();
        assert!(matches!(
            h.call("image_explode", vec![]),
            Err(HostError::UnknownFunction(_))
        ));
        assert!(matches!(
            h.call("image_width", vec![]),
            Err(HostError::Arity { .. })
        ));
        let err = h.call("image_width", vec![Datum::Int(3)]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "image_width(): argument 1 must be picture, got int"
        );
        assert!(matches!(
            h.call("image_thumbnail", vec![picture(&h, 5, 5), Datum::Int(-3)]),
            Err(HostError::Pic(PicError::InvalidArgument(_)))
        ));
    }
}
