// src/font/mod.rs

//! Fonts, glyphs, and the lazily populated font cache.
//!
//! A `Font` is built once per font number from a `GlyphSource`, preloading
//! every glyph, and shared as `Arc<Font>` for the rest of the session.

pub mod builtin;
pub mod source;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use log::{debug, trace, warn};

use crate::cache::MemoCache;
use crate::raster::Raster;
pub use builtin::BUILTIN_FONT_NUMBER;
pub use source::{FontDef, GlyphDef, GlyphSource, MemoryGlyphSource};

/// One character bitmap (1-bit, font height tall).
#[derive(Debug, Clone)]
pub struct Glyph {
    pub ch: char,
    pub width: usize,
    pub bitmap: Raster,
}

/// An immutable, fully loaded font.
#[derive(Debug, Clone)]
pub struct Font {
    number: i32,
    name: String,
    height: usize,
    width: usize,
    char_spacing: i32,
    line_spacing: i32,
    glyphs: HashMap<char, Arc<Glyph>>,
    max_char_width: usize,
}

impl Font {
    /// Builds a font from its stored definition.
    ///
    /// Glyphs with malformed bitmaps or invalid code points are skipped with a
    /// warning; the rest of the font stays usable.
    pub fn from_def(def: &FontDef) -> Self {
        let mut glyphs = HashMap::with_capacity(def.glyphs.len());
        let mut max_char_width = 0;
        for gd in &def.glyphs {
            let ch = match char::from_u32(gd.code_point) {
                Some(c) => c,
                None => {
                    warn!("Font {}: invalid code point {}", def.number, gd.code_point);
                    continue;
                }
            };
            match gd.to_raster(def.height) {
                Ok(bitmap) => {
                    let width = bitmap.width();
                    max_char_width = max_char_width.max(width);
                    glyphs.insert(ch, Arc::new(Glyph { ch, width, bitmap }));
                }
                Err(e) => warn!("Font {}: skipping glyph: {:#}", def.number, e),
            }
        }
        debug!(
            "Font {} '{}': {} glyphs, height {}, max width {}",
            def.number,
            def.name,
            glyphs.len(),
            def.height,
            max_char_width
        );
        Font {
            number: def.number,
            name: def.name.clone(),
            height: def.height,
            width: def.width,
            char_spacing: def.char_spacing,
            line_spacing: def.line_spacing,
            glyphs,
            max_char_width,
        }
    }

    pub fn number(&self) -> i32 {
        self.number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn height(&self) -> i32 {
        self.height as i32
    }

    /// Fixed character width, 0 when proportional.
    pub fn width(&self) -> i32 {
        self.width as i32
    }

    pub fn char_spacing(&self) -> i32 {
        self.char_spacing
    }

    pub fn line_spacing(&self) -> i32 {
        self.line_spacing
    }

    /// Widest glyph in the font.
    pub fn max_char_width(&self) -> i32 {
        self.max_char_width as i32
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Glyph for a character. Absence is not an error; the caller decides.
    pub fn glyph(&self, ch: char) -> Option<&Arc<Glyph>> {
        let g = self.glyphs.get(&ch);
        if g.is_none() {
            trace!("Font {}: no glyph for '{}' (U+{:04X})", self.number, ch, ch as u32);
        }
        g
    }

    /// Pixel width of a string.
    ///
    /// Sums glyph widths plus `spacing` (the font's own spacing when `None`)
    /// between glyphs, with no trailing spacing. Characters without a glyph
    /// count as zero wide.
    pub fn text_width(&self, text: &str, spacing: Option<i32>) -> i32 {
        let spacing = spacing.unwrap_or(self.char_spacing);
        let mut width: i32 = 0;
        let mut count: i32 = 0;
        for ch in text.chars() {
            width = width.saturating_add(self.glyph(ch).map_or(0, |g| g.width as i32));
            count = count.saturating_add(1);
        }
        if count > 1 {
            width = width.saturating_add(spacing.saturating_mul(count - 1));
        }
        width
    }

    /// Widest rendering of any integer in `lo..=hi`.
    pub fn max_int_width(&self, lo: i32, hi: i32, spacing: Option<i32>) -> i32 {
        (lo..=hi)
            .map(|i| self.text_width(&i.to_string(), spacing))
            .max()
            .unwrap_or(0)
    }
}

/// Per-font-number memoized cache in front of a `GlyphSource`.
pub struct FontCache {
    source: Box<dyn GlyphSource>,
    fonts: MemoCache<i32, Font>,
}

impl fmt::Debug for FontCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontCache")
            .field("known", &self.source.font_numbers())
            .field("requested", &self.fonts.len())
            .finish()
    }
}

impl FontCache {
    pub fn new<S: GlyphSource + 'static>(source: S) -> Self {
        FontCache { source: Box::new(source), fonts: MemoCache::new() }
    }

    /// Cache holding only the built-in 5x7 font.
    pub fn builtin() -> Self {
        Self::new(builtin::builtin_source())
    }

    /// Cache over a JSON font file; the built-in font is added unless the
    /// file redefines its number.
    pub fn from_json_file(path: &std::path::Path) -> Result<Self> {
        let mut source = MemoryGlyphSource::load(path)?;
        if source.font_def(BUILTIN_FONT_NUMBER).is_none() {
            source.insert(builtin::builtin_font_def());
        }
        Ok(Self::new(source))
    }

    /// Looks up a font, loading and preloading its glyphs on first use.
    pub fn font(&self, number: i32) -> Option<Arc<Font>> {
        self.fonts.get_or_init(number, || {
            let def = self.source.font_def(number)?;
            Some(Font::from_def(&def))
        })
    }

    /// Glyph lookup by font number and character.
    pub fn glyph(&self, number: i32, ch: char) -> Option<Arc<Glyph>> {
        self.font(number).and_then(|f| f.glyph(ch).cloned())
    }

    /// Font numbers known to the backing store.
    pub fn font_numbers(&self) -> Vec<i32> {
        self.source.font_numbers()
    }
}

impl Default for FontCache {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests;
