// src/page.rs

//! One page of a message: an ordered token list plus what the last render
//! pass produced for it (raster, timing, end-of-page cursor).

use std::fmt::Write;

use anyhow::{anyhow, Result};

use crate::multi::MultiSink;
use crate::raster::Raster;
use crate::token::{AnchorLoc, Rect, Token, TokenKind};

#[derive(Debug, Clone, Default)]
pub struct Page {
    tokens: Vec<Token>,
    raster: Option<Raster>,
    page_on: i32,
    page_off: i32,
    eop: Rect,
    changed: bool,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Tokens ---

    pub fn add(&mut self, tok: Token) {
        self.tokens.push(tok);
        self.changed = true;
    }

    /// Inserts a token at `index`, shifting later tokens right.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, tok: Token) {
        self.tokens.insert(index, tok);
        self.changed = true;
    }

    pub fn remove(&mut self, index: usize) -> Option<Token> {
        if index >= self.tokens.len() {
            return None;
        }
        self.changed = true;
        Some(self.tokens.remove(index))
    }

    /// Removes every token of `kind`; true if anything was removed.
    pub fn remove_all(&mut self, kind: TokenKind) -> bool {
        let before = self.tokens.len();
        self.tokens.retain(|t| !t.is_kind(kind));
        let removed = self.tokens.len() != before;
        self.changed |= removed;
        removed
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn token(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub(crate) fn tokens_mut(&mut self) -> &mut [Token] {
        &mut self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn is_last(&self, index: usize) -> bool {
        !self.tokens.is_empty() && index == self.tokens.len() - 1
    }

    pub fn contains_any(&self, kind: TokenKind) -> bool {
        self.tokens.iter().any(|t| t.is_kind(kind))
    }

    pub fn tokens_of_kind(&self, kind: TokenKind) -> Vec<&Token> {
        self.tokens.iter().filter(|t| t.is_kind(kind)).collect()
    }

    /// A page is valid when no token carries an error and none is an
    /// unsupported tag.
    pub fn is_valid(&self) -> bool {
        self.tokens
            .iter()
            .all(|t| t.is_valid() && !t.is_kind(TokenKind::UnsupportedTag))
    }

    /// Concatenated canonical markup of the page's tokens.
    pub fn multi(&self) -> String {
        self.tokens.iter().map(Token::multi).collect()
    }

    pub fn emit(&self, sink: &mut dyn MultiSink) {
        for t in &self.tokens {
            t.emit(sink);
        }
    }

    pub(crate) fn is_changed(&self) -> bool {
        self.changed
    }

    pub(crate) fn clear_changed(&mut self) {
        self.changed = false;
    }

    // --- Render results ---

    pub fn raster(&self) -> Option<&Raster> {
        self.raster.as_ref()
    }

    pub fn raster_mut(&mut self) -> Option<&mut Raster> {
        self.raster.as_mut()
    }

    pub fn set_raster(&mut self, raster: Raster) {
        self.raster = Some(raster);
    }

    /// Sizes the preview image of the rendered raster.
    pub fn set_preview_size(&mut self, width: usize, height: usize) -> Result<()> {
        self.raster
            .as_mut()
            .ok_or_else(|| anyhow!("Page not rendered"))?
            .set_preview_size(width, height)
    }

    /// Page-on time in tenths of a second, as of the last render.
    pub fn page_on(&self) -> i32 {
        self.page_on
    }

    /// Page-off time in tenths of a second, as of the last render.
    pub fn page_off(&self) -> i32 {
        self.page_off
    }

    pub fn set_page_timing(&mut self, on: i32, off: i32) {
        self.page_on = on;
        self.page_off = off;
    }

    /// End-of-page cursor rectangle (0-based sign pixels).
    pub fn eop(&self) -> Rect {
        self.eop
    }

    pub fn set_eop(&mut self, x: i32, y: i32, w: i32, h: i32) {
        self.eop = Rect::new(x, y, w, h);
    }

    // --- Queries ---

    /// Index of the rendered token nearest to a sign point.
    ///
    /// Only printable text is considered unless `include_non_print` is set, in
    /// which case any token with coordinates qualifies. A token containing the
    /// point wins; otherwise the nearest centroid on the same line, then the
    /// nearest centroid anywhere.
    pub fn closest_text_token(&self, x: i32, y: i32, include_non_print: bool) -> Option<usize> {
        let candidates: Vec<(usize, &Token)> = self
            .tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.coords().is_some())
            .filter(|(_, t)| include_non_print || t.is_printable_text())
            .collect();
        if let Some((i, _)) = candidates.iter().find(|(_, t)| t.is_inside(x, y)) {
            return Some(*i);
        }
        let nearest = |same_line: bool| {
            candidates
                .iter()
                .filter(|(_, t)| !same_line || t.same_line(y))
                .filter_map(|(i, t)| t.distance(x, y).map(|d| (*i, d)))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(i, _)| i)
        };
        nearest(true).or_else(|| nearest(false))
    }

    /// One line per token with its anchor marker and coordinates, errors
    /// indented below, then the end-of-page cursor.
    pub fn dump_tokens(&self) -> String {
        let mut out = String::new();
        for t in &self.tokens {
            let marker = match t.kind().anchor_loc() {
                AnchorLoc::Before => "< ",
                AnchorLoc::After => "> ",
                _ => "  ",
            };
            let _ = writeln!(out, "{}{} {}", marker, fmt_rect(t.coords()), t);
            for e in t.errors() {
                let _ = writeln!(out, "\t{}", e);
            }
        }
        let _ = writeln!(out, "{} <EOP>", fmt_rect(Some(self.eop)));
        out
    }
}

fn fmt_rect(r: Option<Rect>) -> String {
    match r {
        Some(r) => format!("{{{:4}, {:4}, {:4}, {:4}}}", r.x, r.y, r.w, r.h),
        None => "{null, null, null, null}".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Tag;
    use test_log::test;

    fn text_page(s: &str) -> Page {
        let mut p = Page::new();
        for c in s.chars() {
            p.add(Token::text_char(c));
        }
        p
    }

    #[test]
    fn test_edit_tokens() {
        let mut p = text_page("AC");
        p.insert(1, Token::text_char('B'));
        assert_eq!(p.multi(), "ABC");
        assert!(p.is_last(2));
        assert_eq!(p.remove(0).map(|t| t.to_string()), Some("A".to_string()));
        assert!(p.remove(9).is_none());
        p.add(Token::new(Tag::NewLine(None)));
        p.add(Token::new(Tag::NewLine(Some(2))));
        assert!(p.contains_any(TokenKind::NewLine));
        assert_eq!(p.tokens_of_kind(TokenKind::NewLine).len(), 2);
        assert!(p.remove_all(TokenKind::NewLine));
        assert!(!p.remove_all(TokenKind::NewLine));
        assert_eq!(p.multi(), "BC");
        assert!(p.is_changed());
    }

    #[test]
    fn test_unsupported_makes_page_invalid() {
        let mut p = text_page("OK");
        assert!(p.is_valid());
        p.add(Token::new(Tag::Unsupported("[zz]".into())));
        assert!(!p.is_valid());
    }

    #[test]
    fn test_preview_requires_render() {
        let mut p = text_page("A");
        assert!(p.set_preview_size(100, 50).is_err());
    }

    #[test]
    fn test_closest_text_token() {
        let mut p = text_page("AB");
        p.add(Token::new(Tag::NewLine(None)));
        p.add(Token::text_char('C'));
        p.tokens_mut()[0].set_coords(0, 0, 5, 7);
        p.tokens_mut()[1].set_coords(6, 0, 5, 7);
        p.tokens_mut()[2].set_coords(11, 0, 0, 7);
        p.tokens_mut()[3].set_coords(0, 10, 5, 7);

        assert_eq!(p.closest_text_token(7, 3, false), Some(1));
        // right of the first line: nearest on that line, not the anchor
        assert_eq!(p.closest_text_token(20, 2, false), Some(1));
        assert_eq!(p.closest_text_token(20, 2, true), Some(2));
        assert_eq!(p.closest_text_token(1, 30, false), Some(3));
        assert_eq!(Page::new().closest_text_token(0, 0, true), None);
    }

    #[test]
    fn test_dump_tokens() {
        let mut p = text_page("A");
        p.add(Token::new(Tag::JustificationLine(Some(2))));
        p.tokens_mut()[0].set_coords(0, 0, 5, 7);
        p.set_eop(5, 0, 0, 7);
        let dump = p.dump_tokens();
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines[0], "  {   0,    0,    5,    7} A");
        assert_eq!(lines[1], "> {null, null, null, null} [jl2]");
        assert_eq!(lines[2], "{   5,    0,    0,    7} <EOP>");
    }
}
