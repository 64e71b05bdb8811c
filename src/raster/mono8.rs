// src/raster/mono8.rs

//! 8-bit monochrome: one intensity byte per pixel.

use super::{LedColors, SchemeCodec};
use crate::color::DmsColor;

pub(crate) struct Mono8;

impl SchemeCodec for Mono8 {
    fn max_pixel(&self) -> i32 {
        255
    }

    fn max_taglen(&self) -> usize {
        1
    }

    fn encoded_len(&self, count: usize) -> usize {
        count
    }

    fn encode(&self, pixels: &[i32]) -> Vec<u8> {
        pixels.iter().map(|&p| p as u8).collect()
    }

    fn decode(&self, bytes: &[u8], pixels: &mut [i32]) {
        for (p, b) in pixels.iter_mut().zip(bytes) {
            *p = *b as i32;
        }
    }

    fn pixel_to_color(&self, pixel: i32, leds: &LedColors) -> DmsColor {
        leds.fg.scaled(pixel.clamp(0, 255) as u8)
    }

    fn tagval_to_pixel(&self, tagval: &[i32]) -> Option<i32> {
        match tagval {
            [v @ 0..=255] => Some(*v),
            _ => None,
        }
    }

    fn classic_to_pixel(&self, cco: i32) -> Option<i32> {
        self.tagval_to_pixel(&[cco])
    }

    fn error_code(&self) -> i32 {
        255
    }

    fn tag_box_pixel(&self) -> i32 {
        255
    }
}
