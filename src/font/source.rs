// src/font/source.rs

//! Backing store for font definitions.
//!
//! This module defines the `GlyphSource` trait, the seam between the font
//! cache and wherever font bitmaps actually live (a database, a file, the
//! built-in table). `MemoryGlyphSource` is the in-process implementation,
//! loadable from JSON.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::ColorScheme;
use crate::raster::Raster;

/// Lit pixel in a glyph row.
pub const ROW_LIT: char = '#';
/// Unlit pixel in a glyph row.
pub const ROW_UNLIT: char = '.';

/// Store-provided font definitions, looked up by font number.
///
/// Implementors only fetch data; the `FontCache` builds and memoizes fonts.
pub trait GlyphSource: Send + Sync {
    /// Fetches the definition of one font, or `None` if the store has none.
    fn font_def(&self, number: i32) -> Option<FontDef>;

    /// Font numbers this store knows about.
    fn font_numbers(&self) -> Vec<i32>;
}

/// One glyph as stored: a code point and its bitmap rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlyphDef {
    pub code_point: u32,
    /// Rows of `#` (lit) and `.` (unlit), all the same length.
    pub rows: Vec<String>,
}

impl GlyphDef {
    pub fn new(ch: char, rows: &[&str]) -> Self {
        GlyphDef {
            code_point: ch as u32,
            rows: rows.iter().map(|r| r.to_string()).collect(),
        }
    }

    /// Glyph width in pixels (length of the first row).
    pub fn width(&self) -> usize {
        self.rows.first().map(|r| r.chars().count()).unwrap_or(0)
    }

    /// Builds a 1-bit raster of the glyph, `height` rows tall.
    pub fn to_raster(&self, height: usize) -> Result<Raster> {
        if self.rows.len() != height {
            bail!(
                "Glyph U+{:04X} has {} rows, font height is {}",
                self.code_point,
                self.rows.len(),
                height
            );
        }
        let width = self.width();
        let mut raster = Raster::new(ColorScheme::Monochrome1Bit, width, height);
        for (y, row) in self.rows.iter().enumerate() {
            if row.chars().count() != width {
                bail!("Glyph U+{:04X} row {} is not {} pixels wide", self.code_point, y, width);
            }
            for (x, c) in row.chars().enumerate() {
                let pixel = match c {
                    ROW_LIT => 1,
                    ROW_UNLIT => 0,
                    other => bail!("Glyph U+{:04X}: bad pixel character '{}'", self.code_point, other),
                };
                raster.set_pixel(x as i32, y as i32, pixel)?;
            }
        }
        Ok(raster)
    }
}

/// One font as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontDef {
    pub number: i32,
    pub name: String,
    pub height: usize,
    /// Fixed character width, or 0 for proportional fonts.
    #[serde(default)]
    pub width: usize,
    #[serde(default)]
    pub char_spacing: i32,
    #[serde(default)]
    pub line_spacing: i32,
    pub glyphs: Vec<GlyphDef>,
}

/// Font definitions held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryGlyphSource {
    fonts: HashMap<i32, FontDef>,
}

impl MemoryGlyphSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a font definition.
    pub fn insert(&mut self, def: FontDef) {
        debug!("MemoryGlyphSource: adding font {} '{}'", def.number, def.name);
        self.fonts.insert(def.number, def);
    }

    pub fn with_font(mut self, def: FontDef) -> Self {
        self.insert(def);
        self
    }

    /// Parses a JSON array of font definitions.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let defs: Vec<FontDef> =
            serde_json::from_str(json).context("Failed to parse font definitions")?;
        let mut source = MemoryGlyphSource::new();
        for def in defs {
            source.insert(def);
        }
        Ok(source)
    }

    /// Reads a JSON font file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read font file '{}'", path.display()))?;
        let source = Self::from_json_str(&text)
            .with_context(|| format!("Invalid font file '{}'", path.display()))?;
        info!("Loaded {} font(s) from '{}'", source.fonts.len(), path.display());
        Ok(source)
    }
}

impl GlyphSource for MemoryGlyphSource {
    fn font_def(&self, number: i32) -> Option<FontDef> {
        self.fonts.get(&number).cloned()
    }

    fn font_numbers(&self) -> Vec<i32> {
        let mut nums: Vec<i32> = self.fonts.keys().copied().collect();
        nums.sort_unstable();
        nums
    }
}
