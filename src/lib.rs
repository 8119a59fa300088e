//! # PostPic
//!
//! A picture value for a relational database host: an encoded image payload
//! packaged together with the metadata a query wants to filter on (capture
//! date, geometry, colorspace, exposure settings), plus a color value and a
//! set of pure transforms that produce new pictures from old ones.
//!
//! # Architecture
//!
//! ```text
//! image bytes ──decode──▶ raster ──extract──▶ Metadata ─┐
//!                           │                           ├─▶ PictureValue ──encode──▶ binary value
//!                           └──────encode (JPEG)──▶ payload
//! ```
//!
//! Every operation that produces a picture goes through the same seal step:
//! encode the raster to a payload, then derive the metadata from that raster.
//! Metadata is never copied from an input value, so it always describes the
//! payload it travels with.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`value`] | Binary layout of a picture value: fixed metadata header + payload |
//! | [`metadata`] | Metadata extraction from a decoded raster (EXIF, geometry, colorspace) |
//! | [`color`] | Color value and its `name#hex` text form |
//! | [`colorspace`] | Colorspace ids, names and the per-process lookup table |
//! | [`timestamp`] | Microsecond timestamps, EXIF date parsing target |
//! | [`imaging`] | Codec trait, pure Rust codec, transform pipeline |
//! | [`blob`] | Blob stores that import reads image bytes from |
//! | [`host`] | Named entry points with host-style arguments |
//! | [`config`] | `postpic.toml` loading, validation and merging |
//! | [`output`] | CLI output formatting |
//! | [`error`] | Error taxonomy |
//!
//! # Design Decisions
//!
//! ## One Payload Format
//!
//! Whatever format an import reads, the stored payload is JPEG. Grayscale
//! sources stay single-channel and everything else becomes 8-bit RGB, so the
//! colorspace recorded in the header is always the colorspace of the payload.
//!
//! ## Codec Behind a Trait
//!
//! [`imaging::ImageCodec`] is the only place pixels are touched. The pipeline
//! does dimension math and metadata bookkeeping, and its tests run against a
//! recording mock without encoding a single image.
//!
//! ## Explicit Context
//!
//! The colorspace table and configuration are passed to the codecs and the
//! pipeline that need them. There is no process-wide registry.

pub mod blob;
pub mod color;
pub mod colorspace;
pub mod config;
pub mod error;
pub mod host;
pub mod imaging;
pub mod metadata;
pub mod output;
pub mod timestamp;
pub mod value;

#[cfg(test)]
pub(crate) mod test_helpers;
