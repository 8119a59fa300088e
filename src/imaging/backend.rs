//! Image codec trait and shared types.
//!
//! The [`ImageCodec`] trait is everything the picture pipeline needs from a
//! raster library: decode/encode, geometry and attribute queries, and the
//! pixel operations. Raster handles are plain owned values (`Self::Raster`);
//! dropping one releases its pixel buffer, so every exit path of an operation
//! cleans up without explicit destroy calls.
//!
//! The production implementation is
//! [`RustCodec`](super::rust_backend::RustCodec). Tests use the recording
//! `MockCodec` in this module.

use super::params::{CropRect, MontageParams, Rect, TextParams};
use crate::color::PixelQuad;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Decode(String),
    #[error("{0}")]
    Encode(String),
    #[error("{0}")]
    Operation(String),
}

/// Pixel geometry of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Raster library used by the picture pipeline.
///
/// Transform methods consume their input raster and return a new one.
pub trait ImageCodec {
    type Raster;

    /// Decode encoded image bytes into a raster.
    fn decode(&self, bytes: &[u8]) -> Result<Self::Raster, CodecError>;

    /// Encode a raster into the codec's storage format.
    fn encode(&self, raster: &Self::Raster) -> Result<Vec<u8>, CodecError>;

    fn dimensions(&self, raster: &Self::Raster) -> Dimensions;

    /// Native colorspace tag (e.g. `"RGB"`, `"Gray"`).
    fn colorspace_tag(&self, raster: &Self::Raster) -> String;

    /// Look up a string attribute such as `"DateTimeOriginal"`.
    fn attribute(&self, raster: &Self::Raster, key: &str) -> Option<String>;

    /// Solid-color raster.
    fn canvas(&self, width: u32, height: u32, fill: PixelQuad)
    -> Result<Self::Raster, CodecError>;

    /// Fast downscale to exact dimensions.
    fn thumbnail(
        &self,
        raster: Self::Raster,
        width: u32,
        height: u32,
    ) -> Result<Self::Raster, CodecError>;

    /// Cubic resample to exact dimensions.
    fn resize(
        &self,
        raster: Self::Raster,
        width: u32,
        height: u32,
    ) -> Result<Self::Raster, CodecError>;

    fn crop(&self, raster: Self::Raster, rect: CropRect) -> Result<Self::Raster, CodecError>;

    /// Rotate clockwise by `degrees`; the canvas may grow to fit.
    fn rotate(&self, raster: Self::Raster, degrees: f64) -> Result<Self::Raster, CodecError>;

    fn draw_text(
        &self,
        raster: Self::Raster,
        params: &TextParams,
    ) -> Result<Self::Raster, CodecError>;

    fn draw_rect(
        &self,
        raster: Self::Raster,
        rect: Rect,
        fill: PixelQuad,
    ) -> Result<Self::Raster, CodecError>;

    /// Compose tiles into one labeled grid. Any scratch files the codec
    /// needs are removed before this returns.
    fn montage(
        &self,
        tiles: Vec<Self::Raster>,
        params: &MontageParams,
    ) -> Result<Self::Raster, CodecError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Raster stand-in: geometry, a colorspace tag and attributes.
    #[derive(Debug, Clone, PartialEq)]
    pub struct MockRaster {
        pub width: u32,
        pub height: u32,
        pub tag: String,
        pub attributes: BTreeMap<String, String>,
    }

    impl MockRaster {
        pub fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                tag: "RGB".to_string(),
                attributes: BTreeMap::new(),
            }
        }

        pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
            self.attributes.insert(key.to_string(), value.to_string());
            self
        }
    }

    /// Mock codec that records operations and computes geometry only.
    ///
    /// Its "encoded" form is the text `MOCK <width> <height> <tag>`, so decode
    /// of anything else fails like a real codec would on garbage bytes.
    #[derive(Default)]
    pub struct MockCodec {
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode,
        Encode,
        Canvas { width: u32, height: u32 },
        Thumbnail { width: u32, height: u32 },
        Resize { width: u32, height: u32 },
        Crop(CropRect),
        Rotate(f64),
        DrawText(TextParams),
        DrawRect { rect: Rect, fill: PixelQuad },
        Montage { tiles: usize, title: String, columns: u32 },
    }

    impl MockCodec {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        fn record(&self, op: RecordedOp) {
            self.operations.lock().unwrap().push(op);
        }

        pub fn encoded(width: u32, height: u32) -> Vec<u8> {
            format!("MOCK {width} {height} RGB").into_bytes()
        }
    }

    impl ImageCodec for MockCodec {
        type Raster = MockRaster;

        fn decode(&self, bytes: &[u8]) -> Result<MockRaster, CodecError> {
            self.record(RecordedOp::Decode);
            let text = std::str::from_utf8(bytes)
                .map_err(|_| CodecError::Decode("no decode delegate for this image".into()))?;
            let parts: Vec<&str> = text.split(' ').collect();
            match parts.as_slice() {
                ["MOCK", w, h, tag] => {
                    let parse = |s: &str| {
                        s.parse::<u32>()
                            .map_err(|e| CodecError::Decode(format!("bad geometry: {e}")))
                    };
                    let mut raster = MockRaster::new(parse(w)?, parse(h)?);
                    raster.tag = tag.to_string();
                    Ok(raster)
                }
                _ => Err(CodecError::Decode(
                    "no decode delegate for this image".into(),
                )),
            }
        }

        fn encode(&self, raster: &MockRaster) -> Result<Vec<u8>, CodecError> {
            self.record(RecordedOp::Encode);
            Ok(format!("MOCK {} {} {}", raster.width, raster.height, raster.tag).into_bytes())
        }

        fn dimensions(&self, raster: &MockRaster) -> Dimensions {
            Dimensions {
                width: raster.width,
                height: raster.height,
            }
        }

        fn colorspace_tag(&self, raster: &MockRaster) -> String {
            raster.tag.clone()
        }

        fn attribute(&self, raster: &MockRaster, key: &str) -> Option<String> {
            raster.attributes.get(key).cloned()
        }

        fn canvas(
            &self,
            width: u32,
            height: u32,
            _fill: PixelQuad,
        ) -> Result<MockRaster, CodecError> {
            self.record(RecordedOp::Canvas { width, height });
            Ok(MockRaster::new(width, height))
        }

        fn thumbnail(
            &self,
            raster: MockRaster,
            width: u32,
            height: u32,
        ) -> Result<MockRaster, CodecError> {
            self.record(RecordedOp::Thumbnail { width, height });
            Ok(MockRaster {
                width,
                height,
                ..raster
            })
        }

        fn resize(
            &self,
            raster: MockRaster,
            width: u32,
            height: u32,
        ) -> Result<MockRaster, CodecError> {
            self.record(RecordedOp::Resize { width, height });
            Ok(MockRaster {
                width,
                height,
                ..raster
            })
        }

        fn crop(&self, raster: MockRaster, rect: CropRect) -> Result<MockRaster, CodecError> {
            self.record(RecordedOp::Crop(rect));
            Ok(MockRaster {
                width: rect.width,
                height: rect.height,
                ..raster
            })
        }

        fn rotate(&self, raster: MockRaster, degrees: f64) -> Result<MockRaster, CodecError> {
            self.record(RecordedOp::Rotate(degrees));
            let (width, height) =
                super::super::calculations::rotated_bounds(raster.width, raster.height, degrees);
            Ok(MockRaster {
                width,
                height,
                ..raster
            })
        }

        fn draw_text(
            &self,
            raster: MockRaster,
            params: &TextParams,
        ) -> Result<MockRaster, CodecError> {
            self.record(RecordedOp::DrawText(params.clone()));
            Ok(raster)
        }

        fn draw_rect(
            &self,
            raster: MockRaster,
            rect: Rect,
            fill: PixelQuad,
        ) -> Result<MockRaster, CodecError> {
            self.record(RecordedOp::DrawRect { rect, fill });
            Ok(raster)
        }

        fn montage(
            &self,
            tiles: Vec<MockRaster>,
            params: &MontageParams,
        ) -> Result<MockRaster, CodecError> {
            self.record(RecordedOp::Montage {
                tiles: tiles.len(),
                title: params.title.clone(),
                columns: params.columns,
            });
            let sizes: Vec<(u32, u32)> = tiles.iter().map(|t| (t.width, t.height)).collect();
            let layout = super::super::calculations::MontageLayout::plan(&sizes, params)
                .ok_or_else(|| CodecError::Operation("empty montage".into()))?;
            Ok(MockRaster::new(layout.width, layout.height))
        }
    }

    #[test]
    fn mock_decode_rejects_garbage() {
        let codec = MockCodec::new();
        let err = codec.decode(b"\xff\xd8 not really").unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }

    #[test]
    fn mock_records_operations_in_order() {
        let codec = MockCodec::new();
        let raster = codec.decode(&MockCodec::encoded(800, 600)).unwrap();
        let raster = codec.resize(raster, 400, 300).unwrap();
        codec.encode(&raster).unwrap();

        assert_eq!(
            codec.get_operations(),
            vec![
                RecordedOp::Decode,
                RecordedOp::Resize {
                    width: 400,
                    height: 300
                },
                RecordedOp::Encode,
            ]
        );
    }

    #[test]
    fn codec_errors_display_diagnostic_verbatim() {
        let err = CodecError::Decode("Improper image header (bad.jpg)".into());
        assert_eq!(err.to_string(), "Improper image header (bad.jpg)");
    }
}
