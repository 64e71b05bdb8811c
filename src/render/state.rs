// src/render/state.rs

//! Graphic state carried through a render pass.

use std::sync::Arc;

use log::warn;

use crate::config::DeviceConfig;
use crate::font::{Font, FontCache};
use crate::multi::{JustificationLine, JustificationPage};
use crate::raster::Raster;
use crate::token::Rect;

/// Everything tags can change between one token and the next. Carries over
/// from page to page; only the text rectangle is reset on a new page.
#[derive(Debug, Clone)]
pub struct RenderState {
    pub font: Option<Arc<Font>>,
    /// `[sc]` override; `None` means each font's own spacing.
    pub char_spacing: Option<i32>,
    pub fg_pixel: i32,
    pub bg_pixel: i32,
    pub just_line: JustificationLine,
    pub just_page: JustificationPage,
    pub page_on: i32,
    pub page_off: i32,
    /// Text rectangle, 1-based.
    pub tr: Rect,
}

impl RenderState {
    pub fn new(cfg: &DeviceConfig, fonts: &FontCache, raster: &Raster) -> Self {
        let font = fonts.font(cfg.default_font);
        if font.is_none() {
            warn!("RenderState: default font {} not available", cfg.default_font);
        }
        RenderState {
            font,
            char_spacing: None,
            fg_pixel: raster.default_fg_pixel(),
            bg_pixel: raster.default_bg_pixel(),
            just_line: cfg.default_justification_line,
            just_page: cfg.default_justification_page,
            page_on: cfg.page_on_time,
            page_off: cfg.page_off_time,
            tr: full_rect(raster),
        }
    }

    pub fn reset_text_rectangle(&mut self, raster: &Raster) {
        self.tr = full_rect(raster);
    }

    /// Selects font `num` (the device default when `None`), falling back to
    /// the device default if it does not exist. Returns false, leaving the
    /// current font in place, when neither is available.
    pub fn set_font(&mut self, num: Option<i32>, cfg: &DeviceConfig, fonts: &FontCache) -> bool {
        let requested = num.unwrap_or(cfg.default_font);
        let font = fonts.font(requested).or_else(|| {
            warn!(
                "RenderState: font {} not found, using default {}",
                requested, cfg.default_font
            );
            fonts.font(cfg.default_font)
        });
        match font {
            Some(f) => {
                self.font = Some(f);
                true
            }
            None => false,
        }
    }

    pub fn font_num(&self) -> Option<i32> {
        self.font.as_ref().map(|f| f.number())
    }
}

fn full_rect(raster: &Raster) -> Rect {
    Rect::new(1, 1, raster.width() as i32, raster.height() as i32)
}
