// src/render/layout.rs

//! Text layout tree.
//!
//! Text collects into blocks (one page justification each), blocks into
//! lines, lines into fragments (one line justification each), and fragments
//! into cells. Nothing is drawn until the tree is complete, because a
//! block's position depends on its total height and a fragment's on its
//! total width.
//!
//! All positions here are 1-based sign pixels, like tag parameters.

use std::sync::Arc;

use crate::font::{Font, Glyph};
use crate::multi::{JustificationLine, JustificationPage};
use crate::token::Rect;

/// Sign geometry that layout arithmetic depends on.
#[derive(Debug, Clone, Copy)]
pub struct Metrics {
    /// Character cell width, at least 1.
    pub char_width: i32,
    /// Character cell height, at least 1.
    pub char_height: i32,
    /// Line spacing only applies on full-matrix signs.
    pub full_matrix: bool,
    /// Current text rectangle.
    pub tr: Rect,
}

/// What a zero-width anchor records when drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorTarget {
    /// Coordinates of the token at this index.
    Token(usize),
    /// Only occupies height (start of a new line).
    Blank,
    /// End-of-page cursor, placed after the last token when it has
    /// coordinates.
    PageEnd { last: Option<usize> },
}

#[derive(Debug, Clone)]
pub enum CellKind {
    Glyph { glyph: Option<Arc<Glyph>> },
    IrisBox { width: i32 },
    Anchor(AnchorTarget),
}

/// One positioned element of a fragment.
#[derive(Debug, Clone)]
pub struct Cell {
    pub kind: CellKind,
    /// Token that owns a glyph or box cell.
    pub token: Option<usize>,
    pub font: Option<Arc<Font>>,
    pub fg: i32,
    /// This cell's preferred spacing to its neighbours.
    pub c_space: i32,
}

impl Cell {
    pub fn is_anchor(&self) -> bool {
        matches!(self.kind, CellKind::Anchor(_))
    }

    pub fn width(&self) -> i32 {
        match &self.kind {
            CellKind::Glyph { glyph } => glyph.as_ref().map_or(0, |g| g.width as i32),
            CellKind::IrisBox { width } => (*width).max(0),
            CellKind::Anchor(_) => 0,
        }
    }

    pub fn height(&self) -> i32 {
        self.font.as_ref().map_or(0, |f| f.height())
    }

    pub fn line_spacing(&self) -> i32 {
        self.font.as_ref().map_or(0, |f| f.line_spacing())
    }

    /// Gap between `prev` and this cell: the rounded average of both
    /// preferred spacings, 0 at the start of a fragment.
    pub fn spacing_after(&self, prev: Option<&Cell>) -> i32 {
        match prev {
            None => 0,
            Some(p) => round_half(self.c_space.saturating_add(p.c_space)),
        }
    }
}

/// `n / 2` rounded half away from zero.
pub fn round_half(n: i32) -> i32 {
    // the f64 result always fits back into i32
    (f64::from(n) / 2.0).round() as i32
}

/// Cells sharing one line justification.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub cells: Vec<Cell>,
    pub justl: JustificationLine,
    /// True once a glyph or box (not just anchors) was added.
    pub has_content: bool,
}

impl Fragment {
    fn new(justl: JustificationLine) -> Self {
        Fragment { cells: Vec::new(), justl, has_content: false }
    }

    pub fn height(&self) -> i32 {
        self.cells.iter().map(Cell::height).max().unwrap_or(0)
    }

    pub fn line_spacing(&self) -> i32 {
        self.cells.iter().map(Cell::line_spacing).max().unwrap_or(0)
    }

    /// Width of the non-anchor cells including inter-cell spacing.
    pub fn width(&self) -> i32 {
        let mut w: i32 = 0;
        let mut prev: Option<&Cell> = None;
        for c in self.cells.iter().filter(|c| !c.is_anchor()) {
            w = w.saturating_add(c.spacing_after(prev)).saturating_add(c.width());
            prev = Some(c);
        }
        w
    }

    /// Free width in the text rectangle, whole character cells only.
    /// Negative when the fragment does not fit.
    pub fn extra_width(&self, m: &Metrics) -> i32 {
        let cw = m.char_width;
        (m.tr.w / cw).saturating_sub(self.width() / cw).saturating_mul(cw)
    }

    pub fn left(&self, extra: i32, m: &Metrics) -> i32 {
        match self.justl {
            JustificationLine::Left => m.tr.x,
            JustificationLine::Center => m.tr.x.saturating_add(extra / 2 / m.char_width * m.char_width),
            JustificationLine::Right => m.tr.x.saturating_add(extra),
            _ => m.tr.x,
        }
    }

    fn add(&mut self, cell: Cell) {
        if !cell.is_anchor() {
            self.has_content = true;
        }
        self.cells.push(cell);
    }
}

#[derive(Debug, Clone)]
pub struct Line {
    pub fragments: Vec<Fragment>,
    /// Explicit `[nlN]` spacing above this line.
    pub spacing: Option<i32>,
}

impl Line {
    fn new(spacing: Option<i32>) -> Self {
        Line { fragments: Vec::new(), spacing }
    }

    pub fn height(&self) -> i32 {
        self.fragments.iter().map(Fragment::height).max().unwrap_or(0)
    }

    fn fragment_spacing(&self) -> i32 {
        self.fragments.iter().map(Fragment::line_spacing).max().unwrap_or(0)
    }

    /// Spacing between `prev` and this line.
    pub fn spacing_after(&self, prev: Option<&Line>, m: &Metrics) -> i32 {
        if !m.full_matrix {
            return 0;
        }
        match (self.spacing, prev) {
            (Some(s), _) => s,
            (None, None) => 0,
            (None, Some(p)) => round_half(self.fragment_spacing().saturating_add(p.fragment_spacing())),
        }
    }

    pub fn current_fragment(&mut self, justl: JustificationLine) -> &mut Fragment {
        if self.fragments.is_empty() {
            self.fragments.push(Fragment::new(justl));
        }
        let last = self.fragments.len() - 1;
        &mut self.fragments[last]
    }

    /// Adds a cell under line justification `justl`. Returns true if `justl`
    /// conflicts with content already on the line.
    fn add(&mut self, cell: Cell, justl: JustificationLine) -> bool {
        let mut conflict = false;
        let cf = self.current_fragment(justl);
        if cf.has_content {
            if justl < cf.justl {
                conflict = true;
            } else if justl > cf.justl {
                self.fragments.push(Fragment::new(justl));
            }
        } else {
            cf.justl = justl;
        }
        self.current_fragment(justl).add(cell);
        conflict
    }
}

/// Lines sharing one page justification.
#[derive(Debug, Clone)]
pub struct Block {
    pub lines: Vec<Line>,
    pub justp: JustificationPage,
}

impl Block {
    pub fn new(justp: JustificationPage) -> Self {
        Block { lines: Vec::new(), justp }
    }

    pub fn current_line(&mut self) -> &mut Line {
        if self.lines.is_empty() {
            self.lines.push(Line::new(None));
        }
        let last = self.lines.len() - 1;
        &mut self.lines[last]
    }

    pub fn add_line(&mut self, spacing: Option<i32>) {
        // the line being ended must exist even if nothing was added to it
        self.current_line();
        self.lines.push(Line::new(spacing));
    }

    /// See `Line::add`.
    pub fn add(&mut self, cell: Cell, justl: JustificationLine) -> bool {
        self.current_line().add(cell, justl)
    }

    pub fn has_content(&self) -> bool {
        self.lines.iter().flat_map(|l| &l.fragments).any(|f| f.has_content)
    }

    /// Height of the non-empty lines plus the spacing between them.
    pub fn height(&self, m: &Metrics) -> i32 {
        let mut h: i32 = 0;
        let mut prev: Option<&Line> = None;
        for line in &self.lines {
            let lh = line.height();
            if lh > 0 {
                h = h.saturating_add(line.spacing_after(prev, m)).saturating_add(lh);
                prev = Some(line);
            }
        }
        h
    }

    /// Free height in the text rectangle, whole character cells only.
    /// Negative when the block does not fit.
    pub fn extra_height(&self, m: &Metrics) -> i32 {
        let ch = m.char_height;
        (m.tr.h / ch).saturating_sub(self.height(m) / ch).saturating_mul(ch)
    }

    pub fn top(&self, extra: i32, m: &Metrics) -> i32 {
        match self.justp {
            JustificationPage::Top => m.tr.y,
            JustificationPage::Middle => m.tr.y.saturating_add(extra / 2 / m.char_height * m.char_height),
            JustificationPage::Bottom => m.tr.y.saturating_add(extra),
            _ => m.tr.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FontCache;
    use test_log::test;

    fn metrics(w: i32, h: i32) -> Metrics {
        Metrics { char_width: 1, char_height: 1, full_matrix: true, tr: Rect::new(1, 1, w, h) }
    }

    fn glyph_cell(fonts: &FontCache, ch: char, c_space: i32) -> Cell {
        let font = fonts.font(1);
        let glyph = font.as_ref().and_then(|f| f.glyph(ch).cloned());
        Cell { kind: CellKind::Glyph { glyph }, token: None, font, fg: 1, c_space }
    }

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round_half(3), 2);
        assert_eq!(round_half(2), 1);
        assert_eq!(round_half(-3), -2);
        assert_eq!(round_half(0), 0);
    }

    #[test]
    fn test_fragment_width_and_justification() {
        let fonts = FontCache::builtin();
        let mut line = Line::new(None);
        for ch in "AB".chars() {
            assert!(!line.add(glyph_cell(&fonts, ch, 1), JustificationLine::Center));
        }
        let f = &line.fragments[0];
        // 5 + 1 + 5
        assert_eq!(f.width(), 11);
        let m = metrics(20, 7);
        assert_eq!(f.extra_width(&m), 9);
        assert_eq!(f.left(9, &m), 1 + 4);
    }

    #[test]
    fn test_mixed_spacing_rounds_up() {
        let fonts = FontCache::builtin();
        let mut line = Line::new(None);
        line.add(glyph_cell(&fonts, 'A', 1), JustificationLine::Left);
        line.add(glyph_cell(&fonts, 'B', 2), JustificationLine::Left);
        // (1 + 2) / 2 = 1.5 rounds to 2
        assert_eq!(line.fragments[0].width(), 12);
    }

    #[test]
    fn test_line_justification_split_and_conflict() {
        let fonts = FontCache::builtin();
        let mut line = Line::new(None);
        line.add(glyph_cell(&fonts, 'A', 1), JustificationLine::Left);
        assert!(!line.add(glyph_cell(&fonts, 'B', 1), JustificationLine::Right));
        assert_eq!(line.fragments.len(), 2);
        assert!(line.add(glyph_cell(&fonts, 'C', 1), JustificationLine::Left));
        assert_eq!(line.fragments.len(), 2);
    }

    #[test]
    fn test_block_height_and_top() {
        let fonts = FontCache::builtin();
        let mut block = Block::new(JustificationPage::Middle);
        block.add(glyph_cell(&fonts, 'A', 1), JustificationLine::Center);
        block.add_line(None);
        block.add(glyph_cell(&fonts, 'B', 1), JustificationLine::Center);
        let m = metrics(30, 25);
        // 7 + 3 + 7 with the built-in font's line spacing of 3
        assert_eq!(block.height(&m), 17);
        assert_eq!(block.extra_height(&m), 8);
        assert_eq!(block.top(8, &m), 5);

        let char_matrix = Metrics { full_matrix: false, ..m };
        assert_eq!(block.height(&char_matrix), 14);
    }

    #[test]
    fn test_explicit_line_spacing_wins() {
        let fonts = FontCache::builtin();
        let mut block = Block::new(JustificationPage::Top);
        block.add(glyph_cell(&fonts, 'A', 1), JustificationLine::Center);
        block.add_line(Some(1));
        block.add(glyph_cell(&fonts, 'B', 1), JustificationLine::Center);
        assert_eq!(block.height(&metrics(30, 25)), 15);
    }
}
