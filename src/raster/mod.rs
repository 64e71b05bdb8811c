// src/raster/mod.rs

//! Pixel buffers for the four sign color schemes.
//!
//! A `Raster` is a row-major buffer of pixel codes. What a code means depends
//! on the raster's `ColorScheme`; all scheme-specific behavior (valid code
//! range, tag-value conversion, display color, wire codec) lives behind the
//! `SchemeCodec` trait, with one implementation per scheme.
//!
//! Three generic sentinels may be passed to `set_pixel`:
//! `DEFAULT_BG` and `DEFAULT_FG` are resolved to the raster's concrete
//! defaults, `ERROR_PIXEL` is stored as-is and written leniently (an
//! out-of-bounds error write is silently dropped).

mod classic;
mod color24;
mod mono1;
mod mono8;
pub mod preview;

use std::fmt;
use std::sync::Arc;

use log::{trace, warn};

use crate::color::DmsColor;
use crate::config::{ColorScheme, DeviceConfig, SignType};

pub use preview::{PreviewImage, PreviewMap};

/// Unlit pixel code, identical in every scheme.
pub const BLACK: i32 = 0;
/// Resolved to the raster's default background pixel.
pub const DEFAULT_BG: i32 = -1;
/// Resolved to the raster's default foreground pixel.
pub const DEFAULT_FG: i32 = -2;
/// Marks content that had to be drawn although it is in error.
pub const ERROR_PIXEL: i32 = -3;

/// LED colors used to display monochrome pixel codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedColors {
    pub fg: DmsColor,
    pub bg: DmsColor,
}

/// Per-scheme pixel semantics and wire codec.
pub(crate) trait SchemeCodec: Sync {
    /// Largest valid (non-sentinel) pixel code.
    fn max_pixel(&self) -> i32;
    /// Longest tag value this scheme accepts (1 or 3).
    fn max_taglen(&self) -> usize;
    /// Length in bytes of the wire encoding of `count` pixels.
    fn encoded_len(&self, count: usize) -> usize;
    /// Encodes concrete pixel codes into the wire format.
    fn encode(&self, pixels: &[i32]) -> Vec<u8>;
    /// Decodes wire bytes (already length-checked) into pixel codes.
    fn decode(&self, bytes: &[u8], pixels: &mut [i32]);
    fn pixel_to_color(&self, pixel: i32, leds: &LedColors) -> DmsColor;
    /// Converts a 1- or 3-element tag value; `None` when unconvertible.
    fn tagval_to_pixel(&self, tagval: &[i32]) -> Option<i32>;
    /// Converts a classic color index (deprecated `[cb]` tag).
    fn classic_to_pixel(&self, cco: i32) -> Option<i32>;
    /// Concrete code written to the wire for an error pixel.
    fn error_code(&self) -> i32;
    /// Pixel used to draw IRIS tag placeholder boxes.
    fn tag_box_pixel(&self) -> i32;
}

impl ColorScheme {
    pub(crate) fn codec(&self) -> &'static dyn SchemeCodec {
        match self {
            ColorScheme::Monochrome1Bit => &mono1::Mono1,
            ColorScheme::Monochrome8Bit => &mono8::Mono8,
            ColorScheme::ColorClassic => &classic::Classic,
            ColorScheme::Color24Bit => &color24::Color24,
        }
    }
}

/// Failures of raster operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterError {
    /// A write or read landed outside the raster.
    OutOfBounds { x: i32, y: i32 },
    /// A pixel code is not valid for the raster's color scheme.
    BadPixel(i32),
    /// Wire data has the wrong length.
    BadLength { expected: usize, actual: usize },
    /// Source and target color schemes cannot be composited.
    SchemeMismatch { source: ColorScheme, target: ColorScheme },
}

impl fmt::Display for RasterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RasterError::OutOfBounds { x, y } => write!(f, "pixel ({}, {}) out of bounds", x, y),
            RasterError::BadPixel(p) => write!(f, "bad pixel code {}", p),
            RasterError::BadLength { expected, actual } => {
                write!(f, "expected {} bytes of pixel data, got {}", expected, actual)
            }
            RasterError::SchemeMismatch { source, target } => {
                write!(f, "cannot copy {:?} pixels onto {:?} raster", source, target)
            }
        }
    }
}

impl std::error::Error for RasterError {}

/// Sign geometry kept for preview generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ModuleGeometry {
    pub sign_type: SignType,
    pub char_width: usize,
    pub char_height: usize,
}

/// A width x height buffer of pixel codes in one color scheme.
#[derive(Debug, Clone)]
pub struct Raster {
    scheme: ColorScheme,
    width: usize,
    height: usize,
    pixels: Vec<i32>,
    default_bg_pixel: i32,
    default_fg_pixel: i32,
    default_bg: DmsColor,
    default_fg: DmsColor,
    leds: LedColors,
    module_w: usize,
    module_h: usize,
    geometry: Option<ModuleGeometry>,
    config: Option<Arc<DeviceConfig>>,
    preview: Option<PreviewMap>,
}

impl PartialEq for Raster {
    /// Rasters are equal when scheme, size and pixel codes match.
    fn eq(&self, other: &Self) -> bool {
        self.scheme == other.scheme
            && self.width == other.width
            && self.height == other.height
            && self.pixels == other.pixels
    }
}

impl Raster {
    /// Creates a bare raster: black background, pixel 1 foreground, amber LEDs.
    pub fn new(scheme: ColorScheme, width: usize, height: usize) -> Self {
        Raster {
            scheme,
            width,
            height,
            pixels: vec![BLACK; width * height],
            default_bg_pixel: 0,
            default_fg_pixel: 1,
            default_bg: DmsColor::BLACK,
            default_fg: DmsColor::AMBER,
            leds: LedColors { fg: DmsColor::AMBER, bg: DmsColor::BLACK },
            module_w: width,
            module_h: height,
            geometry: None,
            config: None,
            preview: None,
        }
    }

    /// Creates a blank raster sized and colored for a device.
    pub fn from_config(cfg: &Arc<DeviceConfig>) -> Self {
        let mut r = Raster::new(cfg.color_scheme, cfg.pixel_width, cfg.pixel_height);
        r.leds = LedColors { fg: cfg.monochrome_fg, bg: cfg.monochrome_bg };
        r.default_bg = cfg.default_bg_color();
        r.default_fg = cfg.default_fg_color();
        let bg = cfg.default_bg_tagval();
        let fg = cfg.default_fg_tagval();
        r.default_bg_pixel = r.tagval_to_pixel(Some(bg.as_slice()), Some(0)).unwrap_or(0);
        r.default_fg_pixel = r.tagval_to_pixel(Some(fg.as_slice()), Some(1)).unwrap_or(1);
        r.module_w = cfg.char_width;
        r.module_h = cfg.char_height;
        r.geometry = Some(ModuleGeometry {
            sign_type: cfg.sign_type,
            char_width: cfg.char_width,
            char_height: cfg.char_height,
        });
        r.config = Some(Arc::clone(cfg));
        r.pixels.fill(r.default_bg_pixel);
        r
    }

    /// Creates a new blank raster of the same scheme, size and defaults.
    pub fn blank_like(&self) -> Self {
        match &self.config {
            Some(cfg) => Raster::from_config(cfg),
            None => Raster::new(self.scheme, self.width, self.height),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn scheme(&self) -> ColorScheme {
        self.scheme
    }

    pub fn default_bg_pixel(&self) -> i32 {
        self.default_bg_pixel
    }

    pub fn default_fg_pixel(&self) -> i32 {
        self.default_fg_pixel
    }

    /// Display color of the default background.
    pub fn default_bg(&self) -> DmsColor {
        self.default_bg
    }

    /// Display color of the default foreground.
    pub fn default_fg(&self) -> DmsColor {
        self.default_fg
    }

    pub fn max_pixel(&self) -> i32 {
        self.scheme.codec().max_pixel()
    }

    pub fn is_valid_pixel(&self, pixel: i32) -> bool {
        (0..=self.max_pixel()).contains(&pixel)
    }

    /// Raw pixel codes, row-major.
    pub fn pixels(&self) -> &[i32] {
        &self.pixels
    }

    fn pixel_index(&self, x: i32, y: i32) -> Result<usize, RasterError> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return Err(RasterError::OutOfBounds { x, y });
        }
        Ok(y as usize * self.width + x as usize)
    }

    /// Reads a pixel code (0-based coordinates).
    pub fn pixel(&self, x: i32, y: i32) -> Result<i32, RasterError> {
        Ok(self.pixels[self.pixel_index(x, y)?])
    }

    /// Writes a pixel code (0-based coordinates).
    ///
    /// Default sentinels are resolved first. Error pixels skip validation and
    /// out-of-bounds error writes are dropped.
    pub fn set_pixel(&mut self, x: i32, y: i32, pixel: i32) -> Result<(), RasterError> {
        let pixel = match pixel {
            DEFAULT_BG => self.default_bg_pixel,
            DEFAULT_FG => self.default_fg_pixel,
            ERROR_PIXEL => {
                if let Ok(i) = self.pixel_index(x, y) {
                    self.pixels[i] = ERROR_PIXEL;
                }
                return Ok(());
            }
            p => p,
        };
        if !self.is_valid_pixel(pixel) {
            return Err(RasterError::BadPixel(pixel));
        }
        let i = self.pixel_index(x, y)?;
        self.pixels[i] = pixel;
        Ok(())
    }

    /// Display color of the pixel at (x, y).
    pub fn color_at(&self, x: i32, y: i32) -> Result<DmsColor, RasterError> {
        Ok(self.pixel_to_color(self.pixel(x, y)?))
    }

    /// Display color of a pixel code.
    pub fn pixel_to_color(&self, pixel: i32) -> DmsColor {
        match pixel {
            ERROR_PIXEL => DmsColor::ERROR,
            DEFAULT_BG => self.default_bg,
            DEFAULT_FG => self.default_fg,
            p => self.scheme.codec().pixel_to_color(p, &self.leds),
        }
    }

    pub fn is_lit(pixel: i32) -> bool {
        pixel != BLACK
    }

    /// True when every pixel has the same code.
    pub fn is_blank(&self) -> bool {
        match self.pixels.first() {
            None => true,
            Some(p1) => self.pixels.iter().all(|p2| p2 == p1),
        }
    }

    pub fn lit_count(&self) -> usize {
        self.pixels.iter().filter(|p| Raster::is_lit(**p)).count()
    }

    /// Number of error-sentinel pixels.
    pub fn error_count(&self) -> usize {
        self.pixels.iter().filter(|p| **p == ERROR_PIXEL).count()
    }

    /// Copies the common region of `b`, centering the smaller on the larger.
    pub fn copy_centered(&mut self, b: &Raster) -> Result<(), RasterError> {
        let x0 = self.width.saturating_sub(b.width) / 2;
        let x1 = b.width.saturating_sub(self.width) / 2;
        let y0 = self.height.saturating_sub(b.height) / 2;
        let y1 = b.height.saturating_sub(self.height) / 2;
        let w = self.width.min(b.width);
        let h = self.height.min(b.height);
        for y in 0..h {
            for x in 0..w {
                let v = b.pixel((x1 + x) as i32, (y1 + y) as i32)?;
                self.set_pixel((x0 + x) as i32, (y0 + y) as i32, v)?;
            }
        }
        Ok(())
    }

    /// Copies the lit pixels of `src` with their own codes ("transparent black").
    ///
    /// A 24-bit target accepts sources of any scheme, converting each pixel
    /// through its display color. Other targets require matching schemes.
    /// Pixels falling outside this raster are skipped and reported.
    pub fn copy_transparent(&mut self, src: &Raster, x0: i32, y0: i32) -> Result<(), RasterError> {
        let convert = match (src.scheme, self.scheme) {
            (s, t) if s == t => false,
            (_, ColorScheme::Color24Bit) => true,
            (source, target) => return Err(RasterError::SchemeMismatch { source, target }),
        };
        let mut result = Ok(());
        for y in 0..src.height as i32 {
            for x in 0..src.width as i32 {
                let c = src.pixels[y as usize * src.width + x as usize];
                if !Raster::is_lit(c) {
                    continue;
                }
                let c = if convert && c != ERROR_PIXEL {
                    src.pixel_to_color(c).rgb()
                } else {
                    c
                };
                if let Err(e) = self.set_pixel(x0.saturating_add(x), y0.saturating_add(y), c) {
                    trace!("copy_transparent: {}", e);
                    result = Err(e);
                }
            }
        }
        result
    }

    /// Stamps every lit pixel of `src` onto this raster as `fg`.
    ///
    /// Used for glyphs and 1-bit graphics. Off-raster pixels are skipped and
    /// reported.
    pub fn copy_with_fg(&mut self, src: &Raster, x0: i32, y0: i32, fg: i32) -> Result<(), RasterError> {
        let mut result = Ok(());
        for y in 0..src.height as i32 {
            for x in 0..src.width as i32 {
                if !Raster::is_lit(src.pixels[y as usize * src.width + x as usize]) {
                    continue;
                }
                if let Err(e) = self.set_pixel(x0.saturating_add(x), y0.saturating_add(y), fg) {
                    result = Err(e);
                }
            }
        }
        result
    }

    /// Fills a w x h box at (x0, y0). Only the part on the raster is
    /// visited; a box reaching past the edge is reported as out of bounds
    /// (silently for error pixels).
    pub fn draw_solid_box(&mut self, pixel: i32, x0: i32, y0: i32, w: i32, h: i32) -> Result<(), RasterError> {
        if w <= 0 || h <= 0 {
            return Ok(());
        }
        let resolved = match pixel {
            DEFAULT_BG => self.default_bg_pixel,
            DEFAULT_FG => self.default_fg_pixel,
            p => p,
        };
        if resolved != ERROR_PIXEL && !self.is_valid_pixel(resolved) {
            return Err(RasterError::BadPixel(resolved));
        }
        // i64 so huge tag parameters cannot overflow
        let (left, top) = (i64::from(x0), i64::from(y0));
        let (right, bottom) = (left + i64::from(w), top + i64::from(h));
        let xs = left.max(0);
        let ys = top.max(0);
        let xe = right.min(self.width as i64);
        let ye = bottom.min(self.height as i64);
        for y in ys..ye {
            for x in xs..xe {
                self.pixels[y as usize * self.width + x as usize] = resolved;
            }
        }
        let clipped = xs != left || ys != top || xe != right || ye != bottom;
        if clipped && resolved != ERROR_PIXEL {
            let (x, y) = if xs != left || ys != top {
                (x0, y0)
            } else {
                (x0.saturating_add(w - 1), y0.saturating_add(h - 1))
            };
            return Err(RasterError::OutOfBounds { x, y });
        }
        Ok(())
    }

    /// Turns off every pixel that is unlit in `other`.
    ///
    /// # Panics
    /// Panics if the rasters differ in size.
    pub fn union(&mut self, other: &Raster) {
        self.assert_same_size(other);
        for (p, o) in self.pixels.iter_mut().zip(&other.pixels) {
            if !Raster::is_lit(*o) {
                *p = BLACK;
            }
        }
    }

    /// Turns off every pixel that is lit in `other`.
    ///
    /// # Panics
    /// Panics if the rasters differ in size.
    pub fn difference(&mut self, other: &Raster) {
        self.assert_same_size(other);
        for (p, o) in self.pixels.iter_mut().zip(&other.pixels) {
            if Raster::is_lit(*o) {
                *p = BLACK;
            }
        }
    }

    fn assert_same_size(&self, other: &Raster) {
        assert_eq!(self.width, other.width, "width mismatch");
        assert_eq!(self.height, other.height, "height mismatch");
    }

    // --- Tag value conversion ---

    /// Converts a tag value, using `default` when it is absent or malformed.
    ///
    /// Empty, 2-element, or over-long tag values yield `default`; otherwise
    /// the scheme decides, returning `None` when the value is unconvertible.
    pub fn tagval_to_pixel(&self, tagval: Option<&[i32]>, default: Option<i32>) -> Option<i32> {
        let tagval = match tagval {
            None => return default,
            Some(tv) => tv,
        };
        let len = tagval.len();
        if len == 0 || len == 2 || len > self.scheme.codec().max_taglen() {
            return default;
        }
        self.scheme.codec().tagval_to_pixel(tagval)
    }

    pub fn tagval_to_bg_pixel(&self, tagval: Option<&[i32]>) -> Option<i32> {
        self.tagval_to_pixel(tagval, Some(self.default_bg_pixel))
    }

    pub fn tagval_to_fg_pixel(&self, tagval: Option<&[i32]>) -> Option<i32> {
        self.tagval_to_pixel(tagval, Some(self.default_fg_pixel))
    }

    pub fn classic_color_to_pixel(&self, cco: i32) -> Option<i32> {
        self.scheme.codec().classic_to_pixel(cco)
    }

    /// Pixel used for IRIS placeholder boxes on this scheme.
    pub fn tag_box_pixel(&self) -> i32 {
        self.scheme.codec().tag_box_pixel()
    }

    // --- Wire codec ---

    /// Expected wire length for this raster.
    pub fn encoded_len(&self) -> usize {
        self.scheme.codec().encoded_len(self.pixels.len())
    }

    /// Encodes the pixels into the scheme's wire format.
    ///
    /// Error pixels are written as the scheme's error code.
    pub fn encode(&self) -> Vec<u8> {
        let codec = self.scheme.codec();
        let resolved: Vec<i32> = self
            .pixels
            .iter()
            .map(|&p| if p == ERROR_PIXEL { codec.error_code() } else { p })
            .collect();
        codec.encode(&resolved)
    }

    /// Replaces the pixels with decoded wire data.
    pub fn decode(&mut self, bytes: &[u8]) -> Result<(), RasterError> {
        let expected = self.encoded_len();
        if bytes.len() != expected {
            warn!("Raster decode: expected {} bytes, got {}", expected, bytes.len());
            return Err(RasterError::BadLength { expected, actual: bytes.len() });
        }
        self.scheme.codec().decode(bytes, &mut self.pixels);
        Ok(())
    }

    // --- Text dumps ---

    /// One line per row, `X` for lit and `.` for unlit pixels.
    pub fn dump_bw(&self) -> String {
        let mut out = String::new();
        for y in 0..self.height {
            out.push_str(&format!("row{:02}=", y));
            for x in 0..self.width {
                let lit = Raster::is_lit(self.pixels[y * self.width + x]);
                out.push_str(if lit { " X" } else { " ." });
            }
            out.push('\n');
        }
        out
    }

    /// One line per row, each pixel as a doubled gray-ramp character.
    pub fn dump_gray(&self) -> String {
        const RAMP: &[u8] = b" .-:=+x#%@";
        let max = RAMP.len() as i32 - 1;
        let mut out = String::new();
        for y in 0..self.height {
            out.push_str(&format!("row{:02}=", y));
            for x in 0..self.width {
                let gray = self.pixel_to_color(self.pixels[y * self.width + x]).gray(max);
                let ch = RAMP[gray.clamp(0, max) as usize] as char;
                out.push(ch);
                out.push(ch);
            }
            out.push('\n');
        }
        out
    }
}
