//! The closed colorspace enumeration shared by picture and color values.
//!
//! Both the binary layouts and the textual color literals refer to a
//! colorspace, either by its numeric id (binary) or by its name (text). The
//! name → colorspace mapping lives in a [`ColorspaceTable`] built once at
//! startup and passed by reference to whoever needs it: the color literal
//! parser and the metadata extractor (which maps the codec's native tag).
//!
//! | Id | Name | Channels in a color literal |
//! |---|---|---|
//! | 0 | `Unknown` | 4 bytes |
//! | 1 | `RGB` | 3 bytes |
//! | 2 | `RGBA` | 4 bytes |
//! | 3 | `Gray` | 4 bytes |
//! | 4 | `sRGB` | 3 bytes |
//! | 5 | `CMYK` | 4 bytes |

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Colorspace {
    #[default]
    Unknown,
    #[serde(rename = "RGB")]
    Rgb,
    #[serde(rename = "RGBA")]
    Rgba,
    Gray,
    #[serde(rename = "sRGB")]
    Srgb,
    #[serde(rename = "CMYK")]
    Cmyk,
}

impl Colorspace {
    pub const ALL: [Colorspace; 6] = [
        Colorspace::Unknown,
        Colorspace::Rgb,
        Colorspace::Rgba,
        Colorspace::Gray,
        Colorspace::Srgb,
        Colorspace::Cmyk,
    ];

    /// Stable numeric id stored in binary values.
    pub fn id(self) -> i32 {
        match self {
            Colorspace::Unknown => 0,
            Colorspace::Rgb => 1,
            Colorspace::Rgba => 2,
            Colorspace::Gray => 3,
            Colorspace::Srgb => 4,
            Colorspace::Cmyk => 5,
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }

    /// Canonical, case-sensitive name used in color literals.
    pub fn name(self) -> &'static str {
        match self {
            Colorspace::Unknown => "Unknown",
            Colorspace::Rgb => "RGB",
            Colorspace::Rgba => "RGBA",
            Colorspace::Gray => "Gray",
            Colorspace::Srgb => "sRGB",
            Colorspace::Cmyk => "CMYK",
        }
    }

    /// Whether a color in this colorspace carries only three channel bytes.
    pub fn is_three_channel(self) -> bool {
        matches!(self, Colorspace::Rgb | Colorspace::Srgb)
    }
}

impl fmt::Display for Colorspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Name → colorspace lookup, built once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct ColorspaceTable {
    by_name: HashMap<&'static str, Colorspace>,
}

impl ColorspaceTable {
    pub fn new() -> Self {
        let by_name = Colorspace::ALL.into_iter().map(|c| (c.name(), c)).collect();
        Self { by_name }
    }

    /// Exact, case-sensitive lookup.
    pub fn lookup(&self, name: &str) -> Option<Colorspace> {
        self.by_name.get(name).copied()
    }

    /// Map a codec's native colorspace tag; anything unrecognized is `Unknown`.
    pub fn from_native_tag(&self, tag: &str) -> Colorspace {
        self.lookup(tag).unwrap_or(Colorspace::Unknown)
    }
}

impl Default for ColorspaceTable {
    fn default() -> Self {
        Self::new()
    }
}
