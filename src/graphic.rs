// src/graphic.rs

//! Graphics: numbered rasters looked up by the `[g]` tag.
//!
//! Stored graphics carry their pixels in the wire format of their own color
//! scheme. They are decoded once per session on first use.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::cache::MemoCache;
use crate::config::ColorScheme;
use crate::raster::Raster;

/// Store-provided graphic definitions.
pub trait GraphicSource: Send + Sync {
    fn graphic_def(&self, number: i32) -> Option<GraphicDef>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphicDef {
    pub number: i32,
    #[serde(default)]
    pub name: String,
    pub width: usize,
    pub height: usize,
    pub color_scheme: ColorScheme,
    /// Wire-encoded pixels.
    pub pixels: Vec<u8>,
}

impl GraphicDef {
    /// Encodes a raster into a definition.
    pub fn from_raster(number: i32, name: &str, raster: &Raster) -> Self {
        GraphicDef {
            number,
            name: name.to_string(),
            width: raster.width(),
            height: raster.height(),
            color_scheme: raster.scheme(),
            pixels: raster.encode(),
        }
    }

    pub fn to_raster(&self) -> Result<Raster> {
        let mut raster = Raster::new(self.color_scheme, self.width, self.height);
        raster
            .decode(&self.pixels)
            .with_context(|| format!("Graphic {} '{}' has bad pixel data", self.number, self.name))?;
        Ok(raster)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryGraphicSource {
    graphics: HashMap<i32, GraphicDef>,
}

impl MemoryGraphicSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, def: GraphicDef) {
        self.graphics.insert(def.number, def);
    }

    pub fn with_graphic(mut self, def: GraphicDef) -> Self {
        self.insert(def);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let defs: Vec<GraphicDef> =
            serde_json::from_str(json).context("Failed to parse graphic definitions")?;
        let mut source = MemoryGraphicSource::new();
        for def in defs {
            source.insert(def);
        }
        Ok(source)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read graphics file '{}'", path.display()))?;
        let source = Self::from_json_str(&text)
            .with_context(|| format!("Invalid graphics file '{}'", path.display()))?;
        info!("Loaded {} graphic(s) from '{}'", source.graphics.len(), path.display());
        Ok(source)
    }
}

impl GraphicSource for MemoryGraphicSource {
    fn graphic_def(&self, number: i32) -> Option<GraphicDef> {
        self.graphics.get(&number).cloned()
    }
}

/// Memoized, decoded graphics.
pub struct GraphicCache {
    source: Box<dyn GraphicSource>,
    graphics: MemoCache<i32, Raster>,
}

impl fmt::Debug for GraphicCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphicCache").field("requested", &self.graphics.len()).finish()
    }
}

impl GraphicCache {
    pub fn new<S: GraphicSource + 'static>(source: S) -> Self {
        GraphicCache { source: Box::new(source), graphics: MemoCache::new() }
    }

    /// A cache with no graphics.
    pub fn empty() -> Self {
        Self::new(MemoryGraphicSource::new())
    }

    /// Looks up a graphic. A stored graphic that fails to decode is treated
    /// as missing.
    pub fn graphic(&self, number: i32) -> Option<Arc<Raster>> {
        self.graphics.get_or_init(number, || {
            let def = self.source.graphic_def(number)?;
            match def.to_raster() {
                Ok(r) => {
                    debug!("Graphic {}: {}x{} {:?}", number, r.width(), r.height(), r.scheme());
                    Some(r)
                }
                Err(e) => {
                    warn!("{:#}", e);
                    None
                }
            }
        })
    }
}

impl Default for GraphicCache {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_graphic_decodes_once() {
        let mut r = Raster::new(ColorScheme::Monochrome1Bit, 3, 3);
        r.set_pixel(1, 1, 1).unwrap();
        let cache = GraphicCache::new(
            MemoryGraphicSource::new().with_graphic(GraphicDef::from_raster(2, "dot", &r)),
        );
        let g = cache.graphic(2).expect("graphic 2");
        assert_eq!(*g, r);
        assert!(Arc::ptr_eq(&g, &cache.graphic(2).unwrap()));
        assert!(cache.graphic(3).is_none());
    }

    #[test]
    fn test_bad_pixel_data_is_missing() {
        let def = GraphicDef {
            number: 5,
            name: "short".to_string(),
            width: 4,
            height: 4,
            color_scheme: ColorScheme::Monochrome8Bit,
            pixels: vec![0; 3],
        };
        assert!(def.to_raster().is_err());
        let cache = GraphicCache::new(MemoryGraphicSource::new().with_graphic(def));
        assert!(cache.graphic(5).is_none());
    }

    #[test]
    fn test_graphics_json() {
        let json = r#"[{ "number": 1, "width": 2, "height": 1,
                         "color_scheme": "color24_bit", "pixels": [0, 0, 255, 0, 255, 0] }]"#;
        let cache = GraphicCache::new(MemoryGraphicSource::from_json_str(json).unwrap());
        let g = cache.graphic(1).unwrap();
        assert_eq!(g.pixels(), &[0xff0000, 0x00ff00]);
    }
}
