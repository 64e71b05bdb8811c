// src/render/mod.rs

//! Render engine: walks a message's tokens, maintains the graphic state,
//! lays out text, and paints one raster per page.
//!
//! Rendering never fails. Problems are attached to the offending token (and
//! to the caller's `ErrorManager`, if any) and the engine keeps going with a
//! best-effort raster, marking misplaced text with error pixels.

mod layout;
mod state;

use std::sync::Arc;

use log::{debug, trace, warn};

use crate::config::{ColorScheme, DeviceConfig};
use crate::context::RenderContext;
use crate::error::{ErrorManager, ErrorRecord, SyntaxError, TokenLocation};
use crate::font::Font;
use crate::message::Message;
use crate::multi::{JustificationLine, JustificationPage};
use crate::page::Page;
use crate::raster::{Raster, ERROR_PIXEL};
use crate::token::{AnchorLoc, NextLine, Rect, Tag};

use layout::{AnchorTarget, Block, Cell, CellKind, Fragment, Line, Metrics};
pub use state::RenderState;

/// Renders every page of `msg`. State other than the text rectangle carries
/// over from one page to the next.
pub fn render_message(
    msg: &mut Message,
    cfg: &Arc<DeviceConfig>,
    ctx: &RenderContext,
    errors: Option<&mut ErrorManager>,
) {
    let mut r = Renderer::new(cfg, ctx, errors);
    for (i, page) in msg.pages_mut().iter_mut().enumerate() {
        r.page_no = i + 1;
        r.render_page(page);
        r.complete(page);
        page.set_raster(r.raster.clone());
        r.new_page(page);
    }
}

/// Single-pass renderer over the pages of one message.
pub struct Renderer<'a> {
    cfg: Arc<DeviceConfig>,
    ctx: &'a RenderContext,
    state: RenderState,
    blocks: Vec<Block>,
    raster: Raster,
    errors: Option<&'a mut ErrorManager>,
    /// 1-based number of the page being rendered.
    page_no: usize,
}

impl<'a> Renderer<'a> {
    pub fn new(
        cfg: &Arc<DeviceConfig>,
        ctx: &'a RenderContext,
        errors: Option<&'a mut ErrorManager>,
    ) -> Self {
        let raster = Raster::from_config(cfg);
        let state = RenderState::new(cfg, &ctx.fonts, &raster);
        Renderer {
            cfg: Arc::clone(cfg),
            ctx,
            state,
            blocks: Vec::new(),
            raster,
            errors,
            page_no: 1,
        }
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    fn is_char_matrix(&self) -> bool {
        self.cfg.layout_char_width() > 1
    }

    fn metrics(&self) -> Metrics {
        Metrics {
            char_width: self.cfg.layout_char_width(),
            char_height: self.cfg.layout_char_height(),
            full_matrix: self.cfg.layout_char_height() == 1,
            tr: self.state.tr,
        }
    }

    // --- Pages ---

    /// Lays out one page's tokens. Text is painted by `complete`.
    pub fn render_page(&mut self, page: &mut Page) {
        debug!("Renderer: page {} ({} tokens)", self.page_no, page.len());
        for t in page.tokens_mut() {
            t.clear_metadata();
        }
        for idx in 0..page.len() {
            let kind = page.tokens()[idx].kind();
            match kind.anchor_loc() {
                AnchorLoc::Before => {
                    self.add_anchor(AnchorTarget::Token(idx));
                    self.render_token(page, idx);
                }
                AnchorLoc::None => self.render_token(page, idx),
                AnchorLoc::After => {
                    self.render_token(page, idx);
                    self.add_anchor(AnchorTarget::Token(idx));
                }
                AnchorLoc::Conditional => {
                    self.render_token(page, idx);
                    if page.tokens()[idx].is_blank() {
                        self.add_anchor(AnchorTarget::Token(idx));
                    }
                }
            }
        }
        let last = page.len().checked_sub(1);
        self.add_anchor(AnchorTarget::PageEnd { last });
        page.set_page_timing(self.state.page_on, self.state.page_off);
    }

    /// Paints any text still pending.
    pub fn complete(&mut self, page: &mut Page) {
        self.draw_text(page);
    }

    /// Starts a fresh raster filled with the current background.
    fn new_page(&mut self, page: &mut Page) {
        self.draw_text(page);
        self.raster = self.raster.blank_like();
        self.fill_background();
        self.state.reset_text_rectangle(&self.raster);
    }

    fn fill_background(&mut self) {
        let (w, h) = (self.raster.width() as i32, self.raster.height() as i32);
        if let Err(e) = self.raster.draw_solid_box(self.state.bg_pixel, 0, 0, w, h) {
            warn!("Renderer: background fill failed: {}", e);
        }
    }

    // --- Errors ---

    fn report(&mut self, page: &mut Page, idx: Option<usize>, kind: SyntaxError) {
        let token = idx.and_then(|i| page.tokens_mut().get_mut(i)).map(|t| {
            t.add_error(kind);
            t.multi().to_string()
        });
        match &token {
            Some(tok) => warn!("Renderer: page {}: {} at '{}'", self.page_no, kind.key(), tok),
            None => warn!("Renderer: page {}: {}", self.page_no, kind.key()),
        }
        if let Some(em) = self.errors.as_deref_mut() {
            em.add(ErrorRecord {
                kind,
                location: idx.map(|index| TokenLocation { page: self.page_no, index }),
                token,
            });
        }
    }

    // --- Tokens ---

    fn render_token(&mut self, page: &mut Page, idx: usize) {
        let tag = page.tokens()[idx].tag().clone();
        let kind = tag.kind();
        trace!("Renderer: token {} {:?}", idx, tag);
        if !kind.supported_by(self.cfg.supported_tags) {
            self.report(page, Some(idx), SyntaxError::UnsupportedTag);
        }
        match tag {
            Tag::TextChar(ch) => self.render_text(page, idx, ch),
            Tag::ColorBackground(c) => self.render_color_background(page, idx, c),
            Tag::PageBackground(c) => {
                let tv = c.map(|c| c.tagval());
                match self.raster.tagval_to_bg_pixel(tv.as_deref()) {
                    Some(pix) => {
                        self.state.bg_pixel = pix;
                        self.fill_background();
                    }
                    None => self.report(page, Some(idx), SyntaxError::UnsupportedTagValue),
                }
            }
            Tag::ColorForeground(c) => {
                let tv = c.map(|c| c.tagval());
                match self.raster.tagval_to_fg_pixel(tv.as_deref()) {
                    Some(pix) => self.state.fg_pixel = pix,
                    None => self.report(page, Some(idx), SyntaxError::UnsupportedTagValue),
                }
            }
            Tag::ColorRectangle { x, y, w, h, color } => {
                let tv = color.tagval();
                match self.raster.tagval_to_pixel(Some(tv.as_slice()), None) {
                    Some(pix) => self.render_color_rectangle(page, idx, (x, y, w, h), pix),
                    None => self.report(page, Some(idx), SyntaxError::UnsupportedTagValue),
                }
            }
            Tag::Font { num, .. } => {
                if !self.state.set_font(num, &self.cfg, &self.ctx.fonts) {
                    self.report(page, Some(idx), SyntaxError::FontNotDefined);
                }
            }
            Tag::Graphic { num, x, y, .. } => {
                self.render_graphic(page, idx, num, x.unwrap_or(1), y.unwrap_or(1))
            }
            Tag::JustificationLine(jl) => {
                match jl.map_or(Some(self.cfg.default_justification_line), JustificationLine::from_ordinal) {
                    Some(j) => self.state.just_line = j,
                    None => self.report(page, Some(idx), SyntaxError::UnsupportedTagValue),
                }
            }
            Tag::JustificationPage(jp) => self.render_justification_page(page, idx, jp),
            Tag::NewLine(spacing) => self.render_new_line(page, idx, spacing),
            Tag::NewPage => self.new_page(page),
            Tag::PageTime { on, off } => self.render_page_times(page, idx, on, off),
            Tag::CharSpacing(sc) => self.state.char_spacing = sc,
            Tag::TextRectangle { x, y, w, h } => self.render_text_rectangle(page, idx, (x, y, w, h)),
            Tag::Feed(_) | Tag::Locator(_) => {}
            Tag::Unsupported(_) => {}
            ref t if t.kind().is_iris() => self.render_iris_box(page, idx, t),
            _ => {}
        }
    }

    fn char_spacing_for(&self, font: Option<&Arc<Font>>) -> i32 {
        if self.is_char_matrix() {
            return 0;
        }
        match (self.state.char_spacing, font) {
            (Some(sc), _) => sc,
            (None, Some(f)) => f.char_spacing(),
            (None, None) => 1,
        }
    }

    fn cell(&self, kind: CellKind, token: Option<usize>, fg: i32) -> Cell {
        let font = self.state.font.clone();
        let c_space = self.char_spacing_for(font.as_ref());
        Cell { kind, token, font, fg, c_space }
    }

    fn current_block(&mut self) -> &mut Block {
        if self.blocks.is_empty() {
            self.blocks.push(Block::new(self.state.just_page));
        }
        let last = self.blocks.len() - 1;
        &mut self.blocks[last]
    }

    /// Adds a cell to the current line. A line-justification conflict has no
    /// single offending token, so it is reported without one.
    fn add_cell(&mut self, page: &mut Page, cell: Cell) {
        let justl = self.state.just_line;
        if self.current_block().add(cell, justl) {
            self.report(page, None, SyntaxError::TagConflict);
        }
    }

    fn add_anchor(&mut self, target: AnchorTarget) {
        let cell = self.cell(CellKind::Anchor(target), None, self.state.fg_pixel);
        let justl = self.state.just_line;
        // conflicts are reported for content cells only
        self.current_block().add(cell, justl);
    }

    fn render_text(&mut self, page: &mut Page, idx: usize, ch: char) {
        let glyph = self.state.font.as_ref().and_then(|f| f.glyph(ch).cloned());
        let fg = self.state.fg_pixel;
        let color = self.raster.pixel_to_color(fg);
        page.tokens_mut()[idx].set_text_style(self.state.font_num(), color);
        let cell = self.cell(CellKind::Glyph { glyph }, Some(idx), fg);
        self.add_cell(page, cell);
        if self.state.font.is_none() {
            self.report(page, Some(idx), SyntaxError::FontNotDefined);
        }
    }

    fn render_iris_box(&mut self, page: &mut Page, idx: usize, tag: &Tag) {
        let width = match &self.state.font {
            Some(f) => iris_box_width(tag, f, self.state.char_spacing),
            None => 0,
        };
        page.tokens_mut()[idx].set_box_width(width);
        let pixel = self.raster.tag_box_pixel();
        let cell = self.cell(CellKind::IrisBox { width }, Some(idx), pixel);
        self.add_cell(page, cell);
        if self.state.font.is_none() {
            self.report(page, Some(idx), SyntaxError::FontNotDefined);
        }
    }

    fn render_color_background(&mut self, page: &mut Page, idx: usize, color: Option<i32>) {
        let pix = match color {
            None => Some(self.raster.default_bg_pixel()),
            Some(c) => self.raster.classic_color_to_pixel(c),
        };
        match pix {
            Some(p) => {
                self.state.bg_pixel = p;
                self.fill_background();
            }
            None => self.report(page, Some(idx), SyntaxError::UnsupportedTagValue),
        }
    }

    fn render_color_rectangle(&mut self, page: &mut Page, idx: usize, rect: (i32, i32, i32, i32), pix: i32) {
        let (x, y, mut w, mut h) = rect;
        let (x0, y0) = (x.saturating_sub(1), y.saturating_sub(1));
        if w == 0 {
            w = (self.raster.width() as i32).saturating_sub(x0);
        }
        if h == 0 {
            h = (self.raster.height() as i32).saturating_sub(y0);
        }
        page.tokens_mut()[idx].set_coords(x0, y0, w, h);
        if self.raster.draw_solid_box(pix, x0, y0, w, h).is_err() {
            self.report(page, Some(idx), SyntaxError::UnsupportedTagValue);
        }
    }

    fn render_text_rectangle(&mut self, page: &mut Page, idx: usize, rect: (i32, i32, i32, i32)) {
        self.draw_text(page);
        let (x, y, mut w, mut h) = rect;
        let (sw, sh) = (self.raster.width() as i32, self.raster.height() as i32);
        let (x0, y0) = (x.saturating_sub(1), y.saturating_sub(1));
        if w == 0 {
            w = sw.saturating_sub(x0);
        }
        if h == 0 {
            h = sh.saturating_sub(y0);
        }
        self.state.tr = Rect::new(x, y, w, h);
        page.tokens_mut()[idx].set_coords(x0, y0, w, h);
        let past_edge = |pos: i32, len: i32, edge: i32| i64::from(pos) + i64::from(len) > i64::from(edge) + 1;
        if x < 1 || y < 1 || past_edge(x, w, sw) || past_edge(y, h, sh) {
            self.report(page, Some(idx), SyntaxError::UnsupportedTagValue);
        }
    }

    fn render_graphic(&mut self, page: &mut Page, idx: usize, num: i32, x1: i32, y1: i32) {
        let (x0, y0) = (x1.saturating_sub(1), y1.saturating_sub(1));
        let Some(g) = self.ctx.graphics.graphic(num) else {
            page.tokens_mut()[idx].set_coords(x0, y0, 5, 5);
            self.report(page, Some(idx), SyntaxError::GraphicNotDefined);
            return;
        };
        let drawn = if g.scheme() == ColorScheme::Monochrome1Bit {
            self.raster.copy_with_fg(&g, x0, y0, self.state.fg_pixel)
        } else {
            self.raster.copy_transparent(&g, x0, y0)
        };
        page.tokens_mut()[idx].set_coords(x0, y0, g.width() as i32, g.height() as i32);
        if let Err(e) = drawn {
            debug!("Renderer: graphic {}: {}", num, e);
            self.report(page, Some(idx), SyntaxError::Other);
        }
    }

    fn render_justification_page(&mut self, page: &mut Page, idx: usize, jp: Option<i32>) {
        let justp = match jp.map_or(Some(self.cfg.default_justification_page), JustificationPage::from_ordinal) {
            Some(j) => j,
            None => {
                self.report(page, Some(idx), SyntaxError::UnsupportedTagValue);
                return;
            }
        };
        self.state.just_page = justp;
        let block = self.current_block();
        if !block.has_content() {
            block.justp = justp;
        } else if justp < block.justp {
            self.report(page, Some(idx), SyntaxError::TagConflict);
        } else if justp > block.justp {
            self.blocks.push(Block::new(justp));
        }
    }

    fn render_page_times(&mut self, page: &mut Page, idx: usize, on: Option<i32>, off: Option<i32>) {
        let mut bad = false;
        match on {
            None => self.state.page_on = self.cfg.page_on_time,
            Some(t) if (1..=255).contains(&t) => self.state.page_on = t,
            Some(_) => bad = true,
        }
        match off {
            None => self.state.page_off = self.cfg.page_off_time,
            Some(t) if (1..=255).contains(&t) => self.state.page_off = t,
            Some(_) => bad = true,
        }
        if bad {
            self.report(page, Some(idx), SyntaxError::UnsupportedTagValue);
        }
    }

    /// Ends the current line and records where the next one starts.
    fn render_new_line(&mut self, page: &mut Page, idx: usize, spacing: Option<i32>) {
        let m = self.metrics();
        self.current_block().add_line(spacing);
        let anchor = self.cell(CellKind::Anchor(AnchorTarget::Blank), None, self.state.fg_pixel);
        let justl = self.state.just_line;
        let block = self.current_block();
        block.add(anchor, justl);

        let n = block.lines.len();
        let (prev, line) = (&block.lines[n - 2], &block.lines[n - 1]);
        let step = prev.height().saturating_add(line.spacing_after(Some(prev), &m));
        let above = i32::try_from(n - 1).unwrap_or(i32::MAX);
        let top = block
            .top(block.extra_height(&m), &m)
            .saturating_add(above.saturating_mul(step));
        let left = line
            .fragments
            .last()
            .map_or(m.tr.x, |f: &Fragment| f.left(f.extra_width(&m), &m));
        let nl = NextLine {
            top: top.saturating_sub(1),
            height: line.height(),
            left: left.saturating_sub(1),
        };
        page.tokens_mut()[idx].set_next_line(nl);
    }

    // --- Drawing ---

    /// Lays out and paints all pending blocks.
    fn draw_text(&mut self, page: &mut Page) {
        let blocks = std::mem::take(&mut self.blocks);
        let m = self.metrics();
        for block in &blocks {
            self.draw_block(page, block, &m);
        }
    }

    fn draw_block(&mut self, page: &mut Page, block: &Block, m: &Metrics) {
        let extra = block.extra_height(m);
        let too_tall = extra < 0;
        if too_tall {
            self.report(page, None, SyntaxError::TextTooBig);
        }
        let top = block.top(extra, m);
        let mut y: i32 = 0;
        let mut prev: Option<&Line> = None;
        for line in &block.lines {
            y = y.saturating_add(line.spacing_after(prev, m)).saturating_add(line.height());
            for frag in &line.fragments {
                self.draw_fragment(page, frag, top.saturating_add(y), too_tall, m);
            }
            prev = Some(line);
        }
    }

    fn draw_fragment(&mut self, page: &mut Page, frag: &Fragment, base: i32, too_tall: bool, m: &Metrics) {
        let extra = frag.extra_width(m);
        let too_wide = extra < 0;
        if too_wide {
            self.report(page, None, SyntaxError::TextTooBig);
        }
        let left = frag.left(extra, m);
        let mut x: i32 = 0;
        let mut prev: Option<&Cell> = None;
        for cell in &frag.cells {
            if !cell.is_anchor() {
                x = x.saturating_add(cell.spacing_after(prev));
                prev = Some(cell);
            }
            self.draw_cell(page, cell, left.saturating_add(x), base, too_tall, too_wide);
            x = x.saturating_add(cell.width());
        }
    }

    /// Paints one cell with its left edge at `x` and its bottom row just
    /// above `base` (1-based). Glyphs and boxes record their width plus
    /// their own spacing, so the next cell starts at the right edge.
    fn draw_cell(&mut self, page: &mut Page, cell: &Cell, x: i32, base: i32, too_tall: bool, too_wide: bool) {
        let h = cell.height();
        let y = base.saturating_sub(h);
        let (x0, y0) = (x.saturating_sub(1), y.saturating_sub(1));
        let misplaced = too_tall || too_wide;
        let fg = if misplaced { ERROR_PIXEL } else { cell.fg };
        if misplaced {
            if let Some(idx) = cell.token {
                self.report_too_big(page, idx);
            }
        }
        match &cell.kind {
            CellKind::Glyph { glyph } => {
                let Some(idx) = cell.token else { return };
                let w = match glyph {
                    None => {
                        self.report(page, Some(idx), SyntaxError::CharacterNotDefined);
                        0
                    }
                    Some(g) => {
                        if self.raster.copy_with_fg(&g.bitmap, x0, y0, fg).is_err() {
                            self.report_too_big(page, idx);
                        }
                        (g.width as i32).saturating_add(cell.c_space)
                    }
                };
                page.tokens_mut()[idx].set_coords(x0, y0, w, h);
            }
            CellKind::IrisBox { width } => {
                let Some(idx) = cell.token else { return };
                let mut w = (*width).max(0);
                if w > 0 {
                    if self.raster.draw_solid_box(fg, x0, y0, w, h).is_err() {
                        self.report_too_big(page, idx);
                    }
                    w = w.saturating_add(cell.c_space);
                }
                page.tokens_mut()[idx].set_coords(x0, y0, w, h);
            }
            CellKind::Anchor(AnchorTarget::Token(idx)) => {
                page.tokens_mut()[*idx].set_coords(x0, y0, 0, h);
            }
            CellKind::Anchor(AnchorTarget::Blank) => {}
            CellKind::Anchor(AnchorTarget::PageEnd { last }) => {
                match last.and_then(|i| page.tokens()[i].coords()) {
                    Some(r) => page.set_eop(r.right(), r.y, 0, r.h),
                    None => page.set_eop(x0, y0, 0, h),
                }
            }
        }
    }

    /// Flags `textTooBig` on a token once.
    fn report_too_big(&mut self, page: &mut Page, idx: usize) {
        if !page.tokens()[idx].has_error(SyntaxError::TextTooBig) {
            self.report(page, Some(idx), SyntaxError::TextTooBig);
        }
    }
}

/// Width of the placeholder box for an IRIS tag, sized for the widest
/// value the tag could expand to.
fn iris_box_width(tag: &Tag, font: &Font, spacing: Option<i32>) -> i32 {
    let text = |s: &str| font.text_width(s, spacing);
    match tag {
        Tag::TravelTime { over_text, .. } => {
            let over = over_text.as_deref().map_or(0, text);
            font.max_int_width(1, 60, spacing).max(over)
        }
        Tag::SpeedAdvisory => font.max_int_width(10, 99, spacing),
        Tag::SlowWarning { speed, dist, mode } => match mode.as_deref() {
            Some("dist") => text(&dist.to_string()),
            Some("speed") => text(&speed.to_string()),
            _ => 0,
        },
        Tag::Tolling { mode, .. } if mode == "p" => text("$9.99"),
        Tag::Tolling { .. } => 0,
        Tag::Parking { low, closed, .. } => {
            let labels = widest(font, spacing, [low, closed].into_iter().flatten());
            font.max_int_width(0, 999, spacing).max(labels)
        }
        Tag::CapTime { first, active, past } => {
            widest(font, spacing, [first, active, past].into_iter().flatten())
        }
        Tag::CapResponse(items) | Tag::CapUrgency(items) => widest(font, spacing, items),
        _ => 0,
    }
}

fn widest<'s>(font: &Font, spacing: Option<i32>, items: impl IntoIterator<Item = &'s String>) -> i32 {
    items
        .into_iter()
        .map(|s| font.text_width(s, spacing))
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests;
