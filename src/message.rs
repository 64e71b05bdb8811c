// src/message.rs

//! A parsed message: an ordered list of pages, never empty.
//!
//! Besides editing and rendering, `Message` offers the text views other
//! parts of a sign system rely on: plain text, normalized markup, per-page
//! lines, and the font in effect on each page.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use log::debug;
use once_cell::sync::Lazy;

use crate::config::DeviceConfig;
use crate::context::RenderContext;
use crate::error::ErrorManager;
use crate::multi::{self, MessageBuilder, MultiSink};
use crate::page::Page;
use crate::render;
use crate::token::{LinesCategory, Tag, Token, TokenKind};

/// Page separator yielded by `Message::tokens`.
static NEW_PAGE: Lazy<Token> = Lazy::new(|| Token::new(Tag::NewPage));

#[derive(Debug, Clone)]
pub struct Message {
    pages: Vec<Page>,
    changed: bool,
}

impl Default for Message {
    fn default() -> Self {
        Message { pages: vec![Page::new()], changed: true }
    }
}

impl Message {
    /// An empty single-page message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses markup into a new message.
    pub fn parse(markup: &str) -> Self {
        let mut msg = Message::new();
        msg.reset(markup);
        msg
    }

    /// Replaces the whole content with freshly parsed markup.
    pub fn reset(&mut self, markup: &str) {
        self.pages = vec![Page::new()];
        let mut builder = MessageBuilder::new(self);
        multi::parse(markup, &mut builder);
        self.changed = true;
        debug!("Message: parsed {} page(s) from '{}'", self.pages.len(), markup);
    }

    // --- Pages ---

    /// Appends an empty page and returns it.
    pub fn new_page(&mut self) -> &mut Page {
        self.changed = true;
        self.pages.push(Page::new());
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Removes a page (0-based). A message never becomes page-less: removing
    /// the only page leaves one empty page behind.
    pub fn remove_page(&mut self, index: usize) -> Option<Page> {
        if index >= self.pages.len() {
            return None;
        }
        self.changed = true;
        let page = self.pages.remove(index);
        if self.pages.is_empty() {
            self.pages.push(Page::new());
        }
        Some(page)
    }

    /// Inserts a page at `index` (0-based).
    ///
    /// # Panics
    ///
    /// Panics if `index > page_count`.
    pub fn insert_page(&mut self, index: usize, page: Page) {
        self.changed = true;
        self.pages.insert(index, page);
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page by 0-based index.
    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn page_mut(&mut self, index: usize) -> Option<&mut Page> {
        self.pages.get_mut(index)
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub(crate) fn pages_mut(&mut self) -> &mut [Page] {
        &mut self.pages
    }

    pub fn single_page(&self) -> bool {
        self.pages.len() <= 1
    }

    /// True if the message was edited since it was last rendered.
    pub fn is_changed(&self) -> bool {
        self.changed || self.pages.iter().any(Page::is_changed)
    }

    pub(crate) fn clear_changed(&mut self) {
        self.changed = false;
        for p in &mut self.pages {
            p.clear_changed();
        }
    }

    // --- Tokens ---

    /// Every token in order, with a new-page token between pages.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> + '_ {
        let last = self.pages.len().saturating_sub(1);
        self.pages.iter().enumerate().flat_map(move |(i, p)| {
            let sep = if i < last { Some(&*NEW_PAGE) } else { None };
            p.tokens().iter().chain(sep)
        })
    }

    pub fn tokens_of_kind(&self, kind: TokenKind) -> Vec<&Token> {
        self.pages.iter().flat_map(|p| p.tokens_of_kind(kind)).collect()
    }

    pub fn contains_any(&self, kind: TokenKind) -> bool {
        self.pages.iter().any(|p| p.contains_any(kind))
    }

    // --- Export ---

    /// Canonical markup, pages joined by `[np]`.
    pub fn to_multi(&self) -> String {
        self.pages.iter().map(Page::multi).collect::<Vec<_>>().join("[np]")
    }

    /// Markup of one page (0-based); empty when out of range.
    pub fn page_multi(&self, index: usize) -> String {
        self.pages.get(index).map(Page::multi).unwrap_or_default()
    }

    pub fn emit(&self, sink: &mut dyn MultiSink) {
        for (i, p) in self.pages.iter().enumerate() {
            if i > 0 {
                sink.add_page();
            }
            p.emit(sink);
        }
    }

    // --- Views ---

    /// Valid when every page is valid.
    pub fn is_valid(&self) -> bool {
        self.pages.iter().all(Page::is_valid)
    }

    /// True when no token would draw anything.
    pub fn is_blank(&self) -> bool {
        self.tokens().all(Token::is_blank)
    }

    /// Plain text with tags and runs of blanks collapsed to single spaces.
    /// A leading tag or blank yields a leading space; trailing ones are
    /// dropped.
    pub fn as_text(&self) -> String {
        let mut out = String::new();
        let mut between_words = false;
        for t in self.tokens() {
            match t.as_char() {
                Some(c) if !c.is_whitespace() => {
                    if between_words {
                        out.push(' ');
                    }
                    between_words = false;
                    out.push_str(t.multi());
                }
                _ => between_words = true,
            }
        }
        out
    }

    /// Markup of valid tokens only.
    pub fn normalize(&self) -> String {
        self.tokens().filter(|t| t.is_valid()).map(Token::multi).collect()
    }

    /// Markup reduced to what matters for a single line of text.
    pub fn normalize_line(&self) -> String {
        self.tokens()
            .filter(|t| t.kind().is_normalize_line())
            .map(Token::multi)
            .collect()
    }

    /// Like `normalize_line`, but also drops font tags.
    pub fn normalize_line2(&self) -> String {
        self.tokens()
            .filter(|t| t.kind().is_normalize_line2())
            .map(Token::multi)
            .collect()
    }

    /// Compares against markup text by normalized form.
    pub fn equals_multi(&self, markup: &str) -> bool {
        self.normalize() == Message::parse(markup).normalize()
    }

    /// Splits the message into `n_lines` lines per page.
    ///
    /// Each line holds the markup of its included tokens followed by the
    /// breaking tag. Lines past `n_lines` on a page are dropped.
    pub fn lines(&self, n_lines: usize) -> Vec<String> {
        if n_lines == 0 {
            return Vec::new();
        }
        let page_count = self.page_count();
        let mut lines = vec![String::new(); n_lines * page_count];
        let mut it = self.tokens();
        let mut cat = LinesCategory::PageBreak;
        for pg in 0..page_count {
            let mut ln = pg * n_lines;
            for _ in 0..n_lines {
                let mut line = String::new();
                for t in it.by_ref() {
                    cat = t.kind().lines_category();
                    match cat {
                        LinesCategory::Ignore => continue,
                        LinesCategory::Include => line.push_str(t.multi()),
                        LinesCategory::LineBreak | LinesCategory::PageBreak => {
                            line.push_str(t.multi());
                            break;
                        }
                    }
                }
                lines[ln] = line;
                ln += 1;
                if cat == LinesCategory::PageBreak {
                    break;
                }
            }
            if cat != LinesCategory::PageBreak {
                // too many lines on this page: skip to the next page break
                for t in it.by_ref() {
                    if t.kind().lines_category() == LinesCategory::PageBreak {
                        break;
                    }
                }
            }
        }
        lines
    }

    /// Font number in effect on each page, starting from `default_font`.
    /// Empty when `default_font` is outside 1..=255.
    pub fn fonts(&self, default_font: i32) -> Vec<i32> {
        if !(1..=255).contains(&default_font) {
            return Vec::new();
        }
        let mut fonts = vec![0; self.page_count()];
        let mut page = 0;
        let mut font_num = default_font;
        for t in self.tokens() {
            match t.tag() {
                Tag::Font { num, .. } => {
                    font_num = num.unwrap_or(default_font);
                    fonts[page] = font_num;
                }
                Tag::NewPage if page + 1 < fonts.len() => {
                    page += 1;
                    fonts[page] = font_num;
                }
                Tag::TextChar(_) => fonts[page] = font_num,
                _ => {}
            }
        }
        fonts
    }

    /// Token dump of every page, for debugging.
    pub fn dump_tokens(&self) -> String {
        let mut out = String::new();
        for (i, p) in self.pages.iter().enumerate() {
            out.push_str(&format!("Page {}:\n", i + 1));
            out.push_str(&p.dump_tokens());
        }
        out
    }

    // --- Rendering ---

    /// Renders every page, storing a raster and timing on each. Diagnostics
    /// go onto the tokens and, if given, into `errors`.
    pub fn render(
        &mut self,
        cfg: &Arc<DeviceConfig>,
        ctx: &RenderContext,
        errors: Option<&mut ErrorManager>,
    ) {
        render::render_message(self, cfg, ctx, errors);
        self.clear_changed();
    }

    /// Sizes the preview image of every rendered page.
    pub fn set_preview_size(&mut self, width: usize, height: usize) -> Result<()> {
        for p in &mut self.pages {
            p.set_preview_size(width, height)?;
        }
        Ok(())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_multi())
    }
}

impl PartialEq for Message {
    /// Messages are equal when their normalized markup is.
    fn eq(&self, other: &Self) -> bool {
        self.normalize() == other.normalize()
    }
}
