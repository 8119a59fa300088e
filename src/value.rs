//! Picture values and their single-buffer binary form.
//!
//! ## Layout
//!
//! All numbers are big-endian.
//!
//! ```text
//! offset  size  field
//!      0     4  u32  total length, this prefix included
//!      4     8  i64  capture timestamp (µs since 2000-01-01), i64::MIN = absent
//!     12     4  i32  width
//!     16     4  i32  height
//!     20     4  i32  colorspace id
//!     24     4  i32  ISO speed, -1 = absent
//!     28     8  f64  f-number, -1 = absent
//!     36     8  f64  exposure time, -1 = absent
//!     44     8  f64  focal length, -1 = absent
//!     52     4  u32  payload length
//!     56     n  payload
//! ```
//!
//! The payload block carries its own length so it can be sliced out and
//! handed around as a standalone encoded image ([`payload_of`]). Reading the
//! metadata never touches the image codec.

use crate::colorspace::Colorspace;
use crate::error::{PicError, Result};
use crate::metadata::Metadata;
use crate::timestamp::{self, NO_TIMESTAMP, Timestamp};

/// Size of the fixed block including the outer length prefix and the
/// payload length slot.
pub const HEADER_SIZE: usize = 56;

const ABSENT_INT: i32 = -1;
const ABSENT_FLOAT: f64 = -1.0;

/// A picture: cached metadata plus the codec-encoded image bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct PictureValue {
    pub metadata: Metadata,
    pub payload: Vec<u8>,
}

impl PictureValue {
    pub fn new(metadata: Metadata, payload: Vec<u8>) -> Self {
        Self { metadata, payload }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode(&self.metadata, &self.payload)
    }

    pub fn from_bytes(buffer: &[u8]) -> Result<Self> {
        let (metadata, payload) = decode(buffer)?;
        Ok(Self::new(metadata, payload.to_vec()))
    }

    /// Text form `date|width|height|f_number|exposure|iso`.
    ///
    /// Absent numbers render as `-1`, an absent date as the empty string.
    pub fn summary(&self) -> String {
        let m = &self.metadata;
        let float = |v: Option<f64>| v.unwrap_or(ABSENT_FLOAT).to_string();
        format!(
            "{}|{}|{}|{}|{}|{}",
            timestamp::format_optional(m.timestamp),
            m.width,
            m.height,
            float(m.f_number),
            float(m.exposure_time),
            m.iso_speed.map_or(ABSENT_INT as i64, i64::from),
        )
    }
}

fn to_i32(value: u32, field: &str) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| PicError::InvalidArgument(format!("{field} {value} does not fit the value")))
}

/// Pack metadata and payload into one buffer.
pub fn encode(metadata: &Metadata, payload: &[u8]) -> Result<Vec<u8>> {
    let total = u32::try_from(HEADER_SIZE + payload.len()).map_err(|_| {
        PicError::InvalidArgument(format!("payload of {} bytes is too large", payload.len()))
    })?;
    let iso = match metadata.iso_speed {
        Some(v) => to_i32(v, "ISO speed")?,
        None => ABSENT_INT,
    };

    let mut out = Vec::with_capacity(total as usize);
    out.extend_from_slice(&total.to_be_bytes());
    out.extend_from_slice(
        &metadata
            .timestamp
            .map_or(NO_TIMESTAMP, Timestamp::micros)
            .to_be_bytes(),
    );
    out.extend_from_slice(&to_i32(metadata.width, "width")?.to_be_bytes());
    out.extend_from_slice(&to_i32(metadata.height, "height")?.to_be_bytes());
    out.extend_from_slice(&metadata.colorspace.id().to_be_bytes());
    out.extend_from_slice(&iso.to_be_bytes());
    for slot in [metadata.f_number, metadata.exposure_time, metadata.focal_length] {
        out.extend_from_slice(&slot.unwrap_or(ABSENT_FLOAT).to_be_bytes());
    }
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    Ok(out)
}

/// Big-endian field reader over the fixed block.
struct Fields<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Fields<'a> {
    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    fn u32(&mut self) -> u32 {
        u32::from_be_bytes(self.take())
    }

    fn i32(&mut self) -> i32 {
        i32::from_be_bytes(self.take())
    }

    fn i64(&mut self) -> i64 {
        i64::from_be_bytes(self.take())
    }

    fn f64(&mut self) -> f64 {
        f64::from_be_bytes(self.take())
    }
}

fn malformed(msg: impl Into<String>) -> PicError {
    PicError::MalformedValue(msg.into())
}

/// Positive, finite slot value; anything else is absent.
fn present(value: f64) -> Option<f64> {
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Validate the framing of a buffer and return its payload length.
fn check_framing(buffer: &[u8]) -> Result<usize> {
    if buffer.len() < HEADER_SIZE {
        return Err(malformed(format!(
            "buffer of {} bytes is shorter than the {HEADER_SIZE}-byte header",
            buffer.len()
        )));
    }
    let total = u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as usize;
    let payload_len =
        u32::from_be_bytes([buffer[52], buffer[53], buffer[54], buffer[55]]) as usize;
    if total != buffer.len() {
        return Err(malformed(format!(
            "declared length {total} does not match buffer length {}",
            buffer.len()
        )));
    }
    if HEADER_SIZE + payload_len != total {
        return Err(malformed(format!(
            "payload length {payload_len} does not fill declared length {total}"
        )));
    }
    Ok(payload_len)
}

/// Unpack a buffer into metadata and a borrowed payload.
pub fn decode(buffer: &[u8]) -> Result<(Metadata, &[u8])> {
    check_framing(buffer)?;

    let mut fields = Fields { buf: buffer, pos: 4 };
    let timestamp = Timestamp::from_micros(fields.i64());
    let width = fields.i32();
    let height = fields.i32();
    let colorspace_id = fields.i32();
    let iso = fields.i32();
    let f_number = fields.f64();
    let exposure_time = fields.f64();
    let focal_length = fields.f64();

    if width < 0 || height < 0 {
        return Err(malformed(format!("negative geometry {width}x{height}")));
    }
    let colorspace = Colorspace::from_id(colorspace_id)
        .ok_or_else(|| malformed(format!("unknown colorspace id {colorspace_id}")))?;

    let metadata = Metadata {
        timestamp,
        width: width as u32,
        height: height as u32,
        colorspace,
        iso_speed: u32::try_from(iso).ok(),
        f_number: present(f_number),
        exposure_time: present(exposure_time),
        focal_length: present(focal_length),
    };
    Ok((metadata, &buffer[HEADER_SIZE..]))
}

/// The payload block of a buffer, without decoding the metadata.
pub fn payload_of(buffer: &[u8]) -> Result<&[u8]> {
    check_framing(buffer)?;
    Ok(&buffer[HEADER_SIZE..])
}
