//! Image processing — pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode / encode** | `image` (JPEG output, JPEG/PNG/TIFF/WebP input) |
//! | **EXIF attributes** | `kamadak-exif` |
//! | **Rotate, rectangles** | `imageproc` |
//! | **Text** | `cosmic-text` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageCodec`] trait + [`RustCodec`]
//! - **Operations**: [`TransformPipeline`], combining calculations + codec

pub mod backend;
pub mod calculations;
pub mod exif_reader;
pub mod operations;
pub mod params;
pub mod rust_backend;
mod text;

pub use backend::{CodecError, Dimensions, ImageCodec};
pub use operations::{MontageStyle, TransformPipeline};
pub use params::{CropRect, DrawTextOptions, Quality, Rect, TextDefaults};
pub use rust_backend::RustCodec;
