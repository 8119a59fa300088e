//! Error taxonomy for picture and color values.
//!
//! Codec failures keep the codec's own diagnostic text; they are never
//! retried. Missing or unparseable metadata is not an error at all: it
//! resolves to an absent field.

use crate::imaging::CodecError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PicError {
    /// The codec failed; `CodecError::Decode` is the "payload is not an image" case.
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("malformed value: {0}")]
    MalformedValue(String),
    #[error("unsupported colorspace: {0}")]
    UnsupportedColorspace(String),
    #[error("montage needs at least one image")]
    EmptyInput,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("blob store error: {0}")]
    Blob(String),
}

pub type Result<T> = std::result::Result<T, PicError>;
