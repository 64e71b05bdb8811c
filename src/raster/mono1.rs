// src/raster/mono1.rs

//! 1-bit monochrome: pixel codes 0/1, packed MSB-first on the wire.

use super::{LedColors, SchemeCodec};
use crate::color::DmsColor;

pub(crate) struct Mono1;

impl SchemeCodec for Mono1 {
    fn max_pixel(&self) -> i32 {
        1
    }

    fn max_taglen(&self) -> usize {
        1
    }

    fn encoded_len(&self, count: usize) -> usize {
        (count + 7) / 8
    }

    fn encode(&self, pixels: &[i32]) -> Vec<u8> {
        let mut bytes = vec![0u8; self.encoded_len(pixels.len())];
        for (i, &p) in pixels.iter().enumerate() {
            if p != 0 {
                bytes[i / 8] |= 0x80 >> (i % 8);
            }
        }
        bytes
    }

    fn decode(&self, bytes: &[u8], pixels: &mut [i32]) {
        for (i, p) in pixels.iter_mut().enumerate() {
            *p = ((bytes[i / 8] >> (7 - (i % 8))) & 1) as i32;
        }
    }

    fn pixel_to_color(&self, pixel: i32, leds: &LedColors) -> DmsColor {
        if pixel == 0 {
            leds.bg
        } else {
            leds.fg
        }
    }

    fn tagval_to_pixel(&self, tagval: &[i32]) -> Option<i32> {
        match tagval {
            [v @ 0..=1] => Some(*v),
            _ => None,
        }
    }

    fn classic_to_pixel(&self, cco: i32) -> Option<i32> {
        self.tagval_to_pixel(&[cco])
    }

    fn error_code(&self) -> i32 {
        1
    }

    fn tag_box_pixel(&self) -> i32 {
        1
    }
}
