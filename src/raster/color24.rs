// src/raster/color24.rs

//! 24-bit color: pixel codes are packed `0xRRGGBB`, three bytes on the wire
//! in blue, green, red order.

use super::{LedColors, SchemeCodec};
use crate::color::{ClassicColor, DmsColor};

/// Box color for IRIS tags on full-color signs.
const TAG_BOX_COLOR: DmsColor = DmsColor::new(110, 163, 120);

pub(crate) struct Color24;

impl SchemeCodec for Color24 {
    fn max_pixel(&self) -> i32 {
        0x00ff_ffff
    }

    fn max_taglen(&self) -> usize {
        3
    }

    fn encoded_len(&self, count: usize) -> usize {
        count * 3
    }

    fn encode(&self, pixels: &[i32]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(pixels.len() * 3);
        for &p in pixels {
            let c = DmsColor::from_rgb(p);
            bytes.extend_from_slice(&[c.blue, c.green, c.red]);
        }
        bytes
    }

    fn decode(&self, bytes: &[u8], pixels: &mut [i32]) {
        for (p, bgr) in pixels.iter_mut().zip(bytes.chunks_exact(3)) {
            *p = DmsColor::new(bgr[2], bgr[1], bgr[0]).rgb();
        }
    }

    fn pixel_to_color(&self, pixel: i32, _leds: &LedColors) -> DmsColor {
        DmsColor::from_rgb(pixel)
    }

    fn tagval_to_pixel(&self, tagval: &[i32]) -> Option<i32> {
        match tagval {
            [idx] => self.classic_to_pixel(*idx),
            [r @ 0..=255, g @ 0..=255, b @ 0..=255] => {
                Some(DmsColor::new(*r as u8, *g as u8, *b as u8).rgb())
            }
            _ => None,
        }
    }

    fn classic_to_pixel(&self, cco: i32) -> Option<i32> {
        ClassicColor::from_index(cco).map(|c| c.to_rgb().rgb())
    }

    fn error_code(&self) -> i32 {
        DmsColor::ERROR.rgb()
    }

    fn tag_box_pixel(&self) -> i32 {
        TAG_BOX_COLOR.rgb()
    }
}
