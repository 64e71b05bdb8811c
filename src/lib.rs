// src/lib.rs

//! MULTI markup rendering for NTCIP dynamic message signs.
//!
//! Markup is parsed into a [`Message`] of pages and tokens, then rendered
//! page by page into [`Raster`]s sized and colored for one sign
//! ([`DeviceConfig`]). Rendering annotates every token with its sign
//! coordinates and any diagnostics, so editors can map clicks on a preview
//! image back to markup and flag bad tags in place.

pub mod cache;
pub mod color;
pub mod config;
pub mod context;
pub mod error;
pub mod font;
pub mod graphic;
pub mod message;
pub mod multi;
pub mod page;
pub mod raster;
pub mod render;
pub mod token;

pub use color::DmsColor;
pub use config::{ColorScheme, DeviceConfig, SignType, TagSupport, DEFAULT_CONFIG};
pub use context::RenderContext;
pub use error::{ErrorManager, ErrorRecord, SyntaxError, TokenLocation};
pub use message::Message;
pub use page::Page;
pub use raster::Raster;
pub use token::{Rect, Tag, Token, TokenKind};
