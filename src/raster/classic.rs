// src/raster/classic.rs

//! Classic color: pixel codes are palette indices 0-9, one byte each.

use super::{LedColors, SchemeCodec};
use crate::color::{ClassicColor, DmsColor};

pub(crate) struct Classic;

impl SchemeCodec for Classic {
    fn max_pixel(&self) -> i32 {
        ClassicColor::Amber.index()
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

    fn pixel_to_color(&self, pixel: i32, _leds: &LedColors) -> DmsColor {
        ClassicColor::from_index(pixel)
            .map(|c| c.to_rgb())
            .unwrap_or(DmsColor::ERROR)
    }

    fn tagval_to_pixel(&self, tagval: &[i32]) -> Option<i32> {
        match tagval {
            [v] => self.classic_to_pixel(*v),
            _ => None,
        }
    }

    fn classic_to_pixel(&self, cco: i32) -> Option<i32> {
        ClassicColor::from_index(cco).map(|c| c.index())
    }

    fn error_code(&self) -> i32 {
        ClassicColor::Magenta.index()
    }

    fn tag_box_pixel(&self) -> i32 {
        ClassicColor::Green.index()
    }
}
