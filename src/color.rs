//! Color values: `name#hex` literals, their packed binary form, and the
//! conversion to pixel byte lanes.
//!
//! ## Literal format
//!
//! ```text
//! RGBA#11223344   → colorspace RGBA, channel data 0x11223344
//! RGB#ff8000      → colorspace RGB,  channel data 0x00ff8000
//! #ff8000         → no name: ≤ 6 hex digits is RGB, more is RGBA
//! Lab#12          → unknown name: coerced to Unknown (or rejected when strict)
//! ```
//!
//! Formatting renders the hex digits without zero padding, so `RGB#00ff00`
//! formats back as `RGB#ff00`. Callers must not assume a fixed width.
//!
//! ## Pixel lanes
//!
//! Three-channel colorspaces (RGB, sRGB) carry no opacity in their literal.
//! Their 24-bit value is shifted into the top three bytes before being split
//! into red/green/blue/opacity lanes, leaving opacity at zero. Every other
//! colorspace splits the 32-bit value directly. Opacity follows the codec
//! convention where zero means fully opaque.

use crate::colorspace::{Colorspace, ColorspaceTable};
use crate::error::{PicError, Result};
use serde::Serialize;
use std::fmt;

/// Size of the packed binary form: colorspace id + channel data.
pub const COLOR_VALUE_SIZE: usize = 8;

const MAX_HEX_DIGITS: usize = 8;
const THREE_CHANNEL_MAX_DIGITS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColorValue {
    pub colorspace: Colorspace,
    pub channel_data: u32,
}

/// Red, green, blue and opacity byte lanes of a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelQuad {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    /// 0 = fully opaque, 255 = fully transparent.
    pub opacity: u8,
}

impl PixelQuad {
    pub fn alpha(self) -> u8 {
        255 - self.opacity
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.red, self.green, self.blue, self.alpha()]
    }
}

impl ColorValue {
    pub fn new(colorspace: Colorspace, channel_data: u32) -> Self {
        Self {
            colorspace,
            channel_data,
        }
    }

    /// Opaque black, the default fill for drawing.
    pub fn black() -> Self {
        Self::new(Colorspace::Rgb, 0)
    }

    pub fn to_pixel(self) -> PixelQuad {
        let packed = if self.colorspace.is_three_channel() {
            self.channel_data << 8
        } else {
            self.channel_data
        };
        let [red, green, blue, opacity] = packed.to_be_bytes();
        PixelQuad {
            red,
            green,
            blue,
            opacity,
        }
    }

    pub fn to_bytes(self) -> [u8; COLOR_VALUE_SIZE] {
        let mut out = [0u8; COLOR_VALUE_SIZE];
        out[..4].copy_from_slice(&self.colorspace.id().to_be_bytes());
        out[4..].copy_from_slice(&self.channel_data.to_be_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != COLOR_VALUE_SIZE {
            return Err(PicError::MalformedValue(format!(
                "color value must be {COLOR_VALUE_SIZE} bytes, got {}",
                bytes.len()
            )));
        }
        let id = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let colorspace = Colorspace::from_id(id)
            .ok_or_else(|| PicError::MalformedValue(format!("unknown colorspace id {id}")))?;
        let channel_data = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        Ok(Self::new(colorspace, channel_data))
    }
}

impl fmt::Display for ColorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{:x}", self.colorspace.name(), self.channel_data)
    }
}

/// Parses and formats color literals against a [`ColorspaceTable`].
#[derive(Debug, Clone, Copy)]
pub struct ColorCodec<'a> {
    table: &'a ColorspaceTable,
    strict_names: bool,
}

impl<'a> ColorCodec<'a> {
    pub fn new(table: &'a ColorspaceTable) -> Self {
        Self {
            table,
            strict_names: false,
        }
    }

    /// Reject unknown colorspace names instead of coercing them to Unknown.
    pub fn strict(mut self, strict_names: bool) -> Self {
        self.strict_names = strict_names;
        self
    }

    pub fn parse(&self, text: &str) -> Result<ColorValue> {
        let (name, hex) = text.split_once('#').ok_or_else(|| {
            PicError::MalformedValue(format!("color literal '{text}' has no '#'"))
        })?;

        if hex.is_empty()
            || hex.len() > MAX_HEX_DIGITS
            || !hex.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(PicError::MalformedValue(format!(
                "color literal '{text}' needs 1 to {MAX_HEX_DIGITS} hex digits"
            )));
        }
        let channel_data = u32::from_str_radix(hex, 16).map_err(|e| {
            PicError::MalformedValue(format!("color literal '{text}': {e}"))
        })?;

        let colorspace = if name.is_empty() {
            if hex.len() > THREE_CHANNEL_MAX_DIGITS {
                Colorspace::Rgba
            } else {
                Colorspace::Rgb
            }
        } else {
            match self.table.lookup(name) {
                Some(c) => c,
                None if self.strict_names => {
                    return Err(PicError::UnsupportedColorspace(name.to_string()));
                }
                None => Colorspace::Unknown,
            }
        };

        Ok(ColorValue::new(colorspace, channel_data))
    }

    pub fn format(&self, color: ColorValue) -> String {
        color.to_string()
    }
}
