//! Configuration module.
//!
//! Handles loading, validating, and merging `postpic.toml`. Stock defaults
//! are serialized to a TOML table and the user file is merged on top, so a
//! config file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [codec]
//! quality = 85              # JPEG quality of every produced payload (1-100)
//!
//! [text]
//! x = 20                    # draw-text anchor when no position is given
//! y = 20
//! font_size = 10.0
//! # font_family = "serif"   # unset: the codec's sans-serif face
//! # color = "RGB#000000"    # unset: opaque black
//!
//! [montage]
//! background = "RGB#ffffff"
//! title_font_size = 14.0
//!
//! [colors]
//! strict_names = false      # reject unknown colorspace names in literals
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::color::{ColorCodec, ColorValue};
use crate::colorspace::{Colorspace, ColorspaceTable};
use crate::imaging::{MontageStyle, Quality, TextDefaults};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "postpic.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `postpic.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PicConfig {
    /// Encoder settings.
    pub codec: CodecConfig,
    /// Defaults for draw-text.
    pub text: TextConfig,
    /// Montage styling.
    pub montage: MontageConfig,
    /// Color literal parsing.
    pub colors: ColorsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodecConfig {
    pub quality: u32,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            quality: Quality::default().value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextConfig {
    pub x: i32,
    pub y: i32,
    pub font_size: f32,
    pub font_family: Option<String>,
    /// Color literal, e.g. `"RGB#ff0000"`.
    pub color: Option<String>,
}

impl Default for TextConfig {
    fn default() -> Self {
        let defaults = TextDefaults::default();
        Self {
            x: defaults.x,
            y: defaults.y,
            font_size: defaults.font_size,
            font_family: None,
            color: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MontageConfig {
    /// Color literal of the canvas behind the tiles.
    pub background: String,
    pub title_font_size: f32,
}

impl Default for MontageConfig {
    fn default() -> Self {
        Self {
            background: "RGB#ffffff".to_string(),
            title_font_size: MontageStyle::default().title_font_size,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorsConfig {
    /// Reject unknown colorspace names instead of coercing them to Unknown.
    pub strict_names: bool,
}

impl PicConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.codec.quality) {
            return Err(ConfigError::Validation(
                "codec.quality must be 1-100".into(),
            ));
        }
        if !(self.text.font_size.is_finite() && self.text.font_size > 0.0) {
            return Err(ConfigError::Validation(
                "text.font_size must be positive".into(),
            ));
        }
        if !(self.montage.title_font_size.is_finite() && self.montage.title_font_size > 0.0) {
            return Err(ConfigError::Validation(
                "montage.title_font_size must be positive".into(),
            ));
        }

        let table = ColorspaceTable::new();
        if let Some(literal) = &self.text.color {
            self.parse_color(&table, literal, "text.color")?;
        }
        let background = self.parse_color(&table, &self.montage.background, "montage.background")?;
        if matches!(background.colorspace, Colorspace::Cmyk | Colorspace::Unknown) {
            return Err(ConfigError::Validation(format!(
                "montage.background: colorspace {} has no pixel layout",
                background.colorspace
            )));
        }
        Ok(())
    }

    fn parse_color(
        &self,
        table: &ColorspaceTable,
        literal: &str,
        key: &str,
    ) -> Result<ColorValue, ConfigError> {
        ColorCodec::new(table)
            .strict(self.colors.strict_names)
            .parse(literal)
            .map_err(|e| ConfigError::Validation(format!("{key}: {e}")))
    }

    pub fn quality(&self) -> Quality {
        Quality::new(self.codec.quality)
    }

    /// Resolved draw-text defaults.
    pub fn text_defaults(&self, table: &ColorspaceTable) -> Result<TextDefaults, ConfigError> {
        let color = self
            .text
            .color
            .as_deref()
            .map(|literal| self.parse_color(table, literal, "text.color"))
            .transpose()?;
        Ok(TextDefaults {
            x: self.text.x,
            y: self.text.y,
            font_size: self.text.font_size,
            font_family: self.text.font_family.clone(),
            color,
        })
    }

    /// Resolved montage styling.
    pub fn montage_style(&self, table: &ColorspaceTable) -> Result<MontageStyle, ConfigError> {
        let background = self.parse_color(table, &self.montage.background, "montage.background")?;
        Ok(MontageStyle {
            background: background.to_pixel(),
            title_font_size: self.montage.title_font_size,
        })
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(PicConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PicConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PicConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing file yields the stock defaults.
pub fn load_config(path: &Path) -> Result<PicConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `postpic.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# PostPic Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Encoding
# ---------------------------------------------------------------------------
[codec]
# JPEG quality (1-100) of every payload produced by import or a transform.
quality = 85

# ---------------------------------------------------------------------------
# draw-text defaults
# ---------------------------------------------------------------------------
[text]
# Top-left corner of the text box when the caller gives no position.
x = 20
y = 20
# Font size in pixels.
font_size = 10.0
# Font family; unset uses the default sans-serif face.
# font_family = "serif"
# Fill color literal; unset draws opaque black.
# color = "RGB#000000"

# ---------------------------------------------------------------------------
# Montage styling
# ---------------------------------------------------------------------------
[montage]
# Canvas color behind the tiles. Must be RGB, RGBA, Gray or sRGB.
background = "RGB#ffffff"
# Font size of the title band.
title_font_size = 14.0

# ---------------------------------------------------------------------------
# Color literals (NAME#hex)
# ---------------------------------------------------------------------------
[colors]
# false: an unknown NAME becomes the Unknown colorspace.
# true:  an unknown NAME is an error.
strict_names = false
"##
}
