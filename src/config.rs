// src/config.rs

//! Defines the device configuration consumed by the renderer.
//!
//! A `DeviceConfig` describes one sign (or sign group): its pixel geometry,
//! character-cell geometry, color scheme, default colors and font, the set of
//! markup tags it supports, and default page timing and justification.
//!
//! Configurations can be deserialized from JSON; every field has a default so
//! partial documents are accepted.

use std::path::Path;
use std::sync::Arc;

use anyhow::{ensure, Context, Result};
use bitflags::bitflags;
use log::{debug, info};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::color::{ClassicColor, DmsColor};
use crate::multi::{JustificationLine, JustificationPage};

/// Global default configuration, used when no configuration file is given.
pub static DEFAULT_CONFIG: Lazy<Arc<DeviceConfig>> =
    Lazy::new(|| Arc::new(DeviceConfig::default()));

/// One of the four pixel-encoding models a sign can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScheme {
    #[default]
    Monochrome1Bit,
    Monochrome8Bit,
    ColorClassic,
    Color24Bit,
}

/// How the pixels of a sign are grouped into character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignType {
    /// Fixed character cells in both directions.
    CharMatrix,
    /// Fixed rows of characters, proportional within a row.
    LineMatrix,
    #[default]
    FullMatrix,
}

bitflags! {
    /// Markup tags a device declares support for.
    ///
    /// Bit numbers follow the NTCIP `dmsSupportedMultiTags` bitmap.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct TagSupport: u32 {
        const COLOR_BACKGROUND   = 1 << 0;
        const COLOR_FOREGROUND   = 1 << 1;
        const FLASHING           = 1 << 2;
        const FONT               = 1 << 3;
        const GRAPHIC            = 1 << 4;
        const HEX_CHARACTER      = 1 << 5;
        const JUSTIFICATION_LINE = 1 << 6;
        const JUSTIFICATION_PAGE = 1 << 7;
        const MANUFACTURER       = 1 << 8;
        const MOVING_TEXT        = 1 << 9;
        const NEW_LINE           = 1 << 10;
        const NEW_PAGE           = 1 << 11;
        const PAGE_TIME          = 1 << 12;
        const SPACING_CHARACTER  = 1 << 13;
        const TEXT_RECTANGLE     = 1 << 27;
        const COLOR_RECTANGLE    = 1 << 28;
        const PAGE_BACKGROUND    = 1 << 29;
    }
}

impl TagSupport {
    /// Builds a capability set from a raw bitmap, ignoring unknown bits.
    pub fn from_mask(mask: u32) -> Self {
        TagSupport::from_bits_truncate(mask)
    }

    /// Returns true if bit number `bit` is set.
    pub fn has_bit(&self, bit: u32) -> bool {
        bit < 32 && self.bits() & (1 << bit) != 0
    }
}

impl Default for TagSupport {
    fn default() -> Self {
        TagSupport::all().difference(
            TagSupport::FLASHING
                | TagSupport::HEX_CHARACTER
                | TagSupport::MANUFACTURER
                | TagSupport::MOVING_TEXT,
        )
    }
}

/// Complete description of one sign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Sign or sign-group name, used only in log output.
    pub name: String,
    pub pixel_width: usize,
    pub pixel_height: usize,
    /// Character cell width; 0 for proportional (line/full matrix) signs.
    pub char_width: usize,
    /// Character cell height; 0 for full matrix signs.
    pub char_height: usize,
    pub color_scheme: ColorScheme,
    pub sign_type: SignType,
    pub default_font: i32,
    /// Default background tag value. Derived from the color scheme when absent.
    pub default_bg: Option<Vec<i32>>,
    /// Default foreground tag value. Derived from the color scheme when absent.
    pub default_fg: Option<Vec<i32>>,
    /// LED color of a lit pixel on monochrome signs.
    pub monochrome_fg: DmsColor,
    /// LED color of an unlit pixel on monochrome signs.
    pub monochrome_bg: DmsColor,
    pub supported_tags: TagSupport,
    pub max_pages: usize,
    pub max_multi_len: usize,
    pub face_width_mm: u32,
    pub face_height_mm: u32,
    pub border_horiz_mm: u32,
    pub border_vert_mm: u32,
    pub pitch_horiz_mm: u32,
    pub pitch_vert_mm: u32,
    pub default_justification_line: JustificationLine,
    pub default_justification_page: JustificationPage,
    /// Default page-on time, tenths of a second.
    pub page_on_time: i32,
    /// Default page-off time, tenths of a second.
    pub page_off_time: i32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            name: "default".to_string(),
            pixel_width: 96,
            pixel_height: 25,
            char_width: 0,
            char_height: 0,
            color_scheme: ColorScheme::Monochrome1Bit,
            sign_type: SignType::FullMatrix,
            default_font: 1,
            default_bg: None,
            default_fg: None,
            monochrome_fg: DmsColor::AMBER,
            monochrome_bg: DmsColor::BLACK,
            supported_tags: TagSupport::default(),
            max_pages: 6,
            max_multi_len: 312,
            face_width_mm: 2540,
            face_height_mm: 760,
            border_horiz_mm: 80,
            border_vert_mm: 40,
            pitch_horiz_mm: 25,
            pitch_vert_mm: 25,
            default_justification_line: JustificationLine::Center,
            default_justification_page: JustificationPage::Top,
            page_on_time: 28,
            page_off_time: 0,
        }
    }
}

impl DeviceConfig {
    /// Parses a JSON document, then validates it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: DeviceConfig =
            serde_json::from_str(json).context("Failed to parse device configuration JSON")?;
        cfg.validate()?;
        debug!("Parsed device configuration '{}'", cfg.name);
        Ok(cfg)
    }

    /// Reads and parses a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration '{}'", path.display()))?;
        let cfg = Self::from_json_str(&text)
            .with_context(|| format!("Invalid configuration '{}'", path.display()))?;
        info!(
            "Loaded configuration '{}': {}x{} {:?}",
            cfg.name, cfg.pixel_width, cfg.pixel_height, cfg.color_scheme
        );
        Ok(cfg)
    }

    /// Checks that the configuration can be rendered with.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.pixel_width > 0 && self.pixel_height > 0,
            "Sign size must be non-zero (got {}x{})",
            self.pixel_width,
            self.pixel_height
        );
        ensure!(
            self.char_width <= self.pixel_width && self.char_height <= self.pixel_height,
            "Character cell {}x{} larger than sign {}x{}",
            self.char_width,
            self.char_height,
            self.pixel_width,
            self.pixel_height
        );
        Ok(())
    }

    /// Default background tag value, falling back to the scheme default.
    pub fn default_bg_tagval(&self) -> Vec<i32> {
        self.default_bg.clone().unwrap_or_else(|| match self.color_scheme {
            ColorScheme::Color24Bit => vec![0, 0, 0],
            _ => vec![0],
        })
    }

    /// Default foreground tag value, falling back to the scheme default.
    pub fn default_fg_tagval(&self) -> Vec<i32> {
        self.default_fg.clone().unwrap_or_else(|| match self.color_scheme {
            ColorScheme::Monochrome1Bit => vec![1],
            ColorScheme::Monochrome8Bit => vec![255],
            ColorScheme::ColorClassic => vec![ClassicColor::Amber.index()],
            ColorScheme::Color24Bit => {
                let c = DmsColor::AMBER;
                vec![c.red as i32, c.green as i32, c.blue as i32]
            }
        })
    }

    /// Display color of the default background.
    pub fn default_bg_color(&self) -> DmsColor {
        self.tagval_color(&self.default_bg_tagval())
    }

    /// Display color of the default foreground.
    pub fn default_fg_color(&self) -> DmsColor {
        self.tagval_color(&self.default_fg_tagval())
    }

    fn tagval_color(&self, tagval: &[i32]) -> DmsColor {
        match (self.color_scheme, tagval) {
            (ColorScheme::Monochrome1Bit, [0]) => self.monochrome_bg,
            (ColorScheme::Monochrome1Bit, _) => self.monochrome_fg,
            (ColorScheme::Monochrome8Bit, [v]) => {
                self.monochrome_fg.scaled((*v).clamp(0, 255) as u8)
            }
            (_, [r, g, b]) => DmsColor::new(
                (*r).clamp(0, 255) as u8,
                (*g).clamp(0, 255) as u8,
                (*b).clamp(0, 255) as u8,
            ),
            (_, [idx]) => ClassicColor::from_index(*idx)
                .map(|c| c.to_rgb())
                .unwrap_or(DmsColor::BLACK),
            _ => DmsColor::BLACK,
        }
    }

    /// Character cell width used by layout (never zero).
    pub fn layout_char_width(&self) -> i32 {
        self.char_width.max(1) as i32
    }

    /// Character cell height used by layout (never zero).
    pub fn layout_char_height(&self) -> i32 {
        self.char_height.max(1) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = DeviceConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.default_bg_tagval(), vec![0]);
        assert_eq!(cfg.default_fg_tagval(), vec![1]);
        assert_eq!(cfg.default_fg_color(), DmsColor::AMBER);
        assert_eq!(cfg.layout_char_width(), 1);
        assert_eq!(cfg.layout_char_height(), 1);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg = DeviceConfig::from_json_str(
            r#"{ "pixel_width": 50, "pixel_height": 14, "char_width": 5,
                 "char_height": 7, "color_scheme": "color_classic",
                 "sign_type": "char_matrix" }"#,
        )
        .expect("config should parse");
        assert_eq!(cfg.pixel_width, 50);
        assert_eq!(cfg.color_scheme, ColorScheme::ColorClassic);
        assert_eq!(cfg.sign_type, SignType::CharMatrix);
        assert_eq!(cfg.default_font, 1);
        assert_eq!(cfg.default_fg_tagval(), vec![9]);
        assert_eq!(cfg.default_fg_color(), DmsColor::AMBER);
    }

    #[test]
    fn test_zero_size_rejected() {
        let err = DeviceConfig::from_json_str(r#"{ "pixel_width": 0 }"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_tag_support_bits() {
        let tags = TagSupport::default();
        assert!(tags.has_bit(3));
        assert!(tags.has_bit(29));
        assert!(!tags.has_bit(2));
        assert!(!tags.has_bit(40));
        let only_font = TagSupport::from_mask(1 << 3);
        assert!(only_font.contains(TagSupport::FONT));
        assert!(!only_font.contains(TagSupport::GRAPHIC));
    }

    #[test]
    fn test_mono8_default_colors() {
        let cfg = DeviceConfig {
            color_scheme: ColorScheme::Monochrome8Bit,
            ..Default::default()
        };
        assert_eq!(cfg.default_fg_tagval(), vec![255]);
        assert_eq!(cfg.default_fg_color(), DmsColor::AMBER.scaled(255));
        assert_eq!(cfg.default_bg_color(), DmsColor::BLACK);
    }
}
