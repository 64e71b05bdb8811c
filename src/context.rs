// src/context.rs

//! The resources one rendering session shares: fonts and graphics.

use std::path::Path;

use anyhow::Result;
use log::info;

use crate::font::FontCache;
use crate::graphic::{GraphicCache, MemoryGraphicSource};

/// Session-scoped caches, passed explicitly to the renderer.
#[derive(Debug, Default)]
pub struct RenderContext {
    pub fonts: FontCache,
    pub graphics: GraphicCache,
}

impl RenderContext {
    pub fn new(fonts: FontCache, graphics: GraphicCache) -> Self {
        RenderContext { fonts, graphics }
    }

    /// Builds a context from optional JSON font and graphic files. Without a
    /// font file only the built-in font is available.
    pub fn from_files(fonts: Option<&Path>, graphics: Option<&Path>) -> Result<Self> {
        let fonts = match fonts {
            Some(path) => FontCache::from_json_file(path)?,
            None => FontCache::builtin(),
        };
        let graphics = match graphics {
            Some(path) => GraphicCache::new(MemoryGraphicSource::load(path)?),
            None => GraphicCache::empty(),
        };
        info!("Render context ready: fonts {:?}", fonts.font_numbers());
        Ok(RenderContext { fonts, graphics })
    }
}
