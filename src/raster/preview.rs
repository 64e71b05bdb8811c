// src/raster/preview.rs
//
// Preview mapping - the raster's "unrenderer".
//
// Maps between native sign pixels and an enlarged preview image that shows
// LED gaps, module gaps and the sign border. Each preview axis gets one
// array indexed by preview pixel; entries are either a 0-based sign pixel
// index or one of the negative markers below.

use anyhow::{bail, ensure, Result};
use log::{debug, trace};

use super::Raster;
use crate::color::DmsColor;
use crate::config::SignType;

/// Gap between two LEDs.
pub const PIXEL_SEPARATOR: i32 = -1;
/// Gap between two modules (character cells or line rows).
pub const MODULE_SEPARATOR: i32 = -2;
/// Sign border.
pub const SIGN_BORDER: i32 = -3;
/// Past the edge of the sign.
pub const OFF_SIGN: i32 = -4;

/// Preview pixels reserved for the border on each side.
const BORDER_PIX: usize = 20;
/// Horizontal module gap, in LED widths.
const MODULE_GAP_X: f32 = 1.5;
/// Vertical module gap, in LED heights.
const MODULE_GAP_Y: f32 = 4.0;
/// Below this LED size a separate inter-LED gap is not drawn.
const MIN_LED_WITH_GAP: f32 = 1.9;

/// An RGB image produced from a raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<DmsColor>,
}

impl PreviewImage {
    fn filled(width: usize, height: usize, color: DmsColor) -> Self {
        PreviewImage { width, height, data: vec![color; width * height] }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<DmsColor> {
        if x < self.width && y < self.height {
            Some(self.data[y * self.width + x])
        } else {
            None
        }
    }

    fn set(&mut self, x: usize, y: usize, color: DmsColor) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = color;
        }
    }
}

/// Coordinate arrays for one preview size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewMap {
    pub width: usize,
    pub height: usize,
    pub horiz: Vec<i32>,
    pub vert: Vec<i32>,
}

/// Fills a fixed-length array, carrying fractional run lengths forward.
struct CoordArrayGen {
    values: Vec<i32>,
    max_len: usize,
    excess: f32,
    overflow: bool,
}

impl CoordArrayGen {
    fn new(max_len: usize) -> Self {
        CoordArrayGen { values: Vec::with_capacity(max_len), max_len, excess: 0.0, overflow: false }
    }

    fn push(&mut self, val: i32) {
        if self.values.len() < self.max_len {
            self.values.push(val);
        } else {
            self.overflow = true;
        }
    }

    fn push_n(&mut self, val: i32, len: usize) {
        for _ in 0..len {
            self.push(val);
        }
    }

    fn push_f(&mut self, val: i32, flen: f32) {
        let flen = flen + self.excess;
        let len = flen as i32;
        self.excess = flen - len as f32;
        self.push_n(val, len.max(0) as usize);
    }

    fn finish(mut self) -> Vec<i32> {
        if self.overflow {
            debug!("Preview coordinate array truncated at {} entries", self.max_len);
        }
        while self.values.len() < self.max_len {
            self.values.push(OFF_SIGN);
        }
        self.values
    }
}

fn gen_coord_array(
    array_len: usize,
    modules: usize,
    module_sep: f32,
    leds_per_module: usize,
    pix_per_led: f32,
) -> Vec<i32> {
    let mut gen = CoordArrayGen::new(array_len);
    gen.push_n(SIGN_BORDER, BORDER_PIX);
    let mut pix_num = 0;
    for module in 0..modules {
        if module > 0 {
            gen.push_f(MODULE_SEPARATOR, module_sep);
        }
        for led in 0..leds_per_module {
            if pix_per_led < MIN_LED_WITH_GAP {
                if led == 0 {
                    gen.push(SIGN_BORDER);
                }
                gen.push_f(pix_num, pix_per_led + 1.0);
            } else {
                if led == 0 {
                    gen.push(PIXEL_SEPARATOR);
                }
                gen.push_f(pix_num, pix_per_led);
                gen.push(PIXEL_SEPARATOR);
            }
            pix_num += 1;
        }
    }
    gen.push_n(SIGN_BORDER, BORDER_PIX);
    gen.finish()
}

/// Nearest sign pixel (1-based) for a preview index.
fn closest_sign_coord(coords: &[i32], max_coord: usize, wc: i32) -> i32 {
    if wc < 0 {
        return 1;
    }
    let wc = wc as usize;
    if wc >= coords.len() {
        return max_coord as i32;
    }
    if coords[wc] >= 0 {
        return coords[wc] + 1;
    }
    let below = (0..wc).rev().find(|&i| coords[i] >= 0);
    let above = (wc + 1..coords.len()).find(|&i| coords[i] >= 0);
    match (below, above) {
        (Some(d1), Some(d2)) => {
            if wc - d1 <= d2 - wc {
                coords[d1] + 1
            } else {
                coords[d2] + 1
            }
        }
        (Some(d1), None) => coords[d1] + 1,
        (None, Some(d2)) => coords[d2] + 1,
        // set_preview_size only accepts arrays holding at least one LED
        (None, None) => 1,
    }
}

/// First/last preview index of a 1-based sign pixel, or its adjacent separator.
fn preview_coord(coords: &[i32], sc: i32, first: bool, sep: bool) -> i32 {
    let target = sc - 1;
    let mut found = false;
    for (i, &c) in coords.iter().enumerate() {
        let i = i as i32;
        if !found {
            if c == target {
                if first {
                    return if sep { i - 1 } else { i };
                }
                found = true;
            }
        } else if c != target {
            return if sep { i } else { i - 1 };
        }
    }
    -1
}

impl Raster {
    /// Computes the preview coordinate arrays for a preview of the given size.
    ///
    /// Fails when the raster has no device geometry, either size is zero, or
    /// the preview is too small to show a single LED. The previous mapping is
    /// kept on failure.
    pub fn set_preview_size(&mut self, pix_width: usize, pix_height: usize) -> Result<()> {
        let geom = match self.geometry {
            Some(g) => g,
            None => bail!("Raster has no device configuration"),
        };
        ensure!(self.width > 0 && self.height > 0, "Invalid sign size");
        ensure!(pix_width > 0 && pix_height > 0, "Invalid preview size");

        let (leds_x, leds_y) = (self.width, self.height);
        let (mod_leds_x, mod_leds_y, modules_x, modules_y, sep_x, sep_y) = match geom.sign_type {
            SignType::CharMatrix => {
                let mx = if geom.char_width == 0 { leds_x } else { geom.char_width };
                let my = if geom.char_height == 0 { leds_y } else { geom.char_height };
                let (nx, ny) = (leds_x / mx, leds_y / my);
                (mx, my, nx, ny, leds_x + nx, leds_y + ny)
            }
            SignType::LineMatrix => {
                let my = if geom.char_height == 0 { leds_y } else { geom.char_height };
                let ny = leds_y / my;
                (leds_x, my, 1, ny, leds_x + 1, leds_y + ny)
            }
            SignType::FullMatrix => (leds_x, leds_y, 1, 1, leds_x + 1, leds_y + 1),
        };

        let spaces_x = self.width as f32 + (modules_x as f32 - 1.0) * MODULE_GAP_X;
        let spaces_y = self.height as f32 + (modules_y as f32 - 1.0) * MODULE_GAP_Y;
        let face_x = pix_width as f32 - (sep_x + BORDER_PIX * 2) as f32;
        let face_y = pix_height as f32 - (sep_y + BORDER_PIX * 2) as f32;
        let pix_per_led = (face_x / spaces_x).min(face_y / spaces_y);
        debug!(
            "Preview {}x{}: {} x {} modules, {:.2} preview pixels per LED",
            pix_width, pix_height, modules_x, modules_y, pix_per_led
        );

        let horiz = gen_coord_array(pix_width, modules_x, pix_per_led * MODULE_GAP_X, mod_leds_x, pix_per_led);
        let vert = gen_coord_array(pix_height, modules_y, pix_per_led * MODULE_GAP_Y, mod_leds_y, pix_per_led);
        let shows_leds = |coords: &[i32]| coords.iter().any(|&c| c >= 0);
        ensure!(
            shows_leds(&horiz[..]) && shows_leds(&vert[..]),
            "Preview {}x{} is too small for a {}x{} sign",
            pix_width,
            pix_height,
            self.width,
            self.height
        );
        self.preview = Some(PreviewMap { width: pix_width, height: pix_height, horiz, vert });
        Ok(())
    }

    pub fn has_preview(&self) -> bool {
        self.preview.is_some()
    }

    pub fn preview_map(&self) -> Option<&PreviewMap> {
        self.preview.as_ref()
    }

    fn preview_or_panic(&self) -> &PreviewMap {
        match &self.preview {
            Some(p) => p,
            None => panic!("Preview coordinates used before set_preview_size"),
        }
    }

    /// Renders the preview image using the coordinate arrays.
    ///
    /// # Panics
    /// Panics if `set_preview_size` has not been called.
    pub fn preview_image(&self) -> PreviewImage {
        let map = self.preview_or_panic();
        let mut img = PreviewImage::filled(map.width, map.height, DmsColor::BLACK);
        for (x, &sx) in map.horiz.iter().enumerate() {
            for (y, &sy) in map.vert.iter().enumerate() {
                let color = match sx.min(sy) {
                    PIXEL_SEPARATOR => DmsColor::DARK_GRAY,
                    MODULE_SEPARATOR | SIGN_BORDER => DmsColor::BLACK,
                    OFF_SIGN => DmsColor::LIGHT_GRAY,
                    _ => self.color_at(sx, sy).unwrap_or(DmsColor::ERROR),
                };
                img.set(x, y, color);
            }
        }
        trace!("Rendered {}x{} preview image", map.width, map.height);
        img
    }

    /// A small preview: each LED one pixel, with module dividers and a border.
    pub fn module_preview_image(&self) -> PreviewImage {
        const DIVIDER_X: usize = 2;
        const DIVIDER_Y: usize = 3;
        const BORDER: usize = 5;
        let module_w = if self.module_w < 2 { self.width } else { self.module_w };
        let module_h = if self.module_h < 2 { self.height } else { self.module_h };
        let mut w2 = self.width + BORDER * 2;
        let mut h2 = self.height + BORDER * 2;
        if module_w > 1 {
            w2 += (self.width / module_w).saturating_sub(1) * DIVIDER_X;
        }
        if module_h > 1 {
            h2 += (self.height / module_h).saturating_sub(1) * DIVIDER_Y;
        }
        let mut img = PreviewImage::filled(w2, h2, DmsColor::PREVIEW_FILL);
        let mut y2 = BORDER;
        for y in 0..self.height {
            let mut x2 = BORDER;
            for x in 0..self.width {
                let color = self.pixel_to_color(self.pixels[y * self.width + x]);
                img.set(x2, y2, color);
                x2 += 1;
                if (x + 1) % module_w.max(1) == 0 {
                    x2 += DIVIDER_X;
                }
            }
            y2 += 1;
            if (y + 1) % module_h.max(1) == 0 {
                y2 += DIVIDER_Y;
            }
        }
        img
    }

    /// Nearest 1-based sign column for a preview x coordinate.
    ///
    /// # Panics
    /// Panics if `set_preview_size` has not been called.
    pub fn preview_to_sign_x(&self, x: i32) -> i32 {
        closest_sign_coord(&self.preview_or_panic().horiz, self.width, x)
    }

    /// Nearest 1-based sign row for a preview y coordinate.
    ///
    /// # Panics
    /// Panics if `set_preview_size` has not been called.
    pub fn preview_to_sign_y(&self, y: i32) -> i32 {
        closest_sign_coord(&self.preview_or_panic().vert, self.height, y)
    }

    /// Preview x for a 1-based sign column: first or last preview pixel of
    /// that LED, or the separator just before/after it when `sep` is set.
    /// Returns -1 if the column is not in the preview.
    pub fn sign_to_preview_x(&self, x: i32, first: bool, sep: bool) -> i32 {
        preview_coord(&self.preview_or_panic().horiz, x, first, sep)
    }

    /// Preview y for a 1-based sign row; see `sign_to_preview_x`.
    pub fn sign_to_preview_y(&self, y: i32, first: bool, sep: bool) -> i32 {
        preview_coord(&self.preview_or_panic().vert, y, first, sep)
    }
}
