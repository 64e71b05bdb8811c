// src/color.rs

//! Defines sign color types (`DmsColor`, `ClassicColor`) and conversion helpers.

use log::warn;
use serde::{Deserialize, Serialize};

/// A 24-bit RGB color as displayed by a sign or a preview image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DmsColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl DmsColor {
    pub const BLACK: DmsColor = DmsColor::new(0, 0, 0);
    pub const WHITE: DmsColor = DmsColor::new(255, 255, 255);
    pub const AMBER: DmsColor = DmsColor::new(255, 208, 0);
    /// Fuchsia, used for pixels flagged with the error sentinel.
    pub const ERROR: DmsColor = DmsColor::new(255, 0, 255);
    pub const DARK_GRAY: DmsColor = DmsColor::new(64, 64, 64);
    pub const LIGHT_GRAY: DmsColor = DmsColor::new(192, 192, 192);
    /// Fill color of the plain (module-divided) preview image.
    pub const PREVIEW_FILL: DmsColor = DmsColor::new(50, 50, 50);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        DmsColor { red, green, blue }
    }

    /// Builds a color from a packed `0xRRGGBB` value. Bits above 24 are ignored.
    pub fn from_rgb(rgb: i32) -> Self {
        DmsColor {
            red: ((rgb >> 16) & 0xff) as u8,
            green: ((rgb >> 8) & 0xff) as u8,
            blue: (rgb & 0xff) as u8,
        }
    }

    /// Packs the color into `0xRRGGBB`.
    pub fn rgb(&self) -> i32 {
        ((self.red as i32) << 16) | ((self.green as i32) << 8) | self.blue as i32
    }

    /// Scales an LED base color by an 8-bit intensity: `(base * i) >> 8`.
    pub fn scaled(&self, intensity: u8) -> Self {
        let scale = |c: u8| ((c as u32 * intensity as u32) >> 8) as u8;
        DmsColor::new(scale(self.red), scale(self.green), scale(self.blue))
    }

    /// Perceptual gray level in `0..=max_gray`, used by the ASCII gray dump.
    pub fn gray(&self, max_gray: i32) -> i32 {
        let gray =
            0.21 * self.red as f64 + 0.72 * self.green as f64 + 0.07 * self.blue as f64;
        (gray * max_gray as f64 / 256.0).round() as i32
    }
}

/// The ten NTCIP 1203 "classic" colors (indices 0-9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ClassicColor {
    Black = 0,
    Red = 1,
    Yellow = 2,
    Green = 3,
    Cyan = 4,
    Blue = 5,
    Magenta = 6,
    White = 7,
    Orange = 8,
    Amber = 9,
}

impl ClassicColor {
    const ALL: [ClassicColor; 10] = [
        ClassicColor::Black,
        ClassicColor::Red,
        ClassicColor::Yellow,
        ClassicColor::Green,
        ClassicColor::Cyan,
        ClassicColor::Blue,
        ClassicColor::Magenta,
        ClassicColor::White,
        ClassicColor::Orange,
        ClassicColor::Amber,
    ];

    /// Converts a classic color index. Returns `None` for anything outside 0-9.
    pub fn from_index(idx: i32) -> Option<Self> {
        let color = usize::try_from(idx)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied());
        if color.is_none() {
            warn!("Invalid classic color index: {}", idx);
        }
        color
    }

    pub fn index(&self) -> i32 {
        *self as i32
    }

    pub fn to_rgb(&self) -> DmsColor {
        match self {
            ClassicColor::Black => DmsColor::new(0, 0, 0),
            ClassicColor::Red => DmsColor::new(255, 0, 0),
            ClassicColor::Yellow => DmsColor::new(255, 255, 0),
            ClassicColor::Green => DmsColor::new(0, 255, 0),
            ClassicColor::Cyan => DmsColor::new(0, 255, 255),
            ClassicColor::Blue => DmsColor::new(0, 0, 255),
            ClassicColor::Magenta => DmsColor::new(255, 0, 255),
            ClassicColor::White => DmsColor::new(255, 255, 255),
            ClassicColor::Orange => DmsColor::new(255, 165, 0),
            ClassicColor::Amber => DmsColor::AMBER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_rgb_pack_unpack() {
        let c = DmsColor::new(0x12, 0x34, 0x56);
        assert_eq!(c.rgb(), 0x123456);
        assert_eq!(DmsColor::from_rgb(0x123456), c);
    }

    #[test]
    fn test_scaled_intensity() {
        assert_eq!(DmsColor::AMBER.scaled(255), DmsColor::new(254, 207, 0));
        assert_eq!(DmsColor::AMBER.scaled(0), DmsColor::BLACK);
        assert_eq!(DmsColor::WHITE.scaled(128), DmsColor::new(127, 127, 127));
    }

    #[test]
    fn test_classic_palette() {
        assert_eq!(ClassicColor::from_index(8), Some(ClassicColor::Orange));
        assert_eq!(ClassicColor::Orange.to_rgb(), DmsColor::new(255, 165, 0));
        assert_eq!(ClassicColor::from_index(9).map(|c| c.to_rgb()), Some(DmsColor::AMBER));
        assert_eq!(ClassicColor::from_index(10), None);
        assert_eq!(ClassicColor::from_index(-1), None);
    }

    #[test]
    fn test_gray_levels() {
        assert_eq!(DmsColor::BLACK.gray(9), 0);
        assert_eq!(DmsColor::WHITE.gray(9), 9);
    }
}
