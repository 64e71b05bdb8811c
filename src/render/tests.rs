// src/render/tests.rs

use std::sync::Arc;

use super::*;
use crate::config::{SignType, TagSupport, DEFAULT_CONFIG};
use crate::font::{FontCache, MemoryGlyphSource};
use crate::graphic::{GraphicCache, GraphicDef, MemoryGraphicSource};
use crate::token::{NextLine, Rect, TokenKind};
use test_log::test;

fn render(markup: &str) -> (Message, ErrorManager) {
    render_with(markup, &DEFAULT_CONFIG, &RenderContext::default())
}

fn render_with(markup: &str, cfg: &Arc<DeviceConfig>, ctx: &RenderContext) -> (Message, ErrorManager) {
    let mut msg = Message::parse(markup);
    let mut em = ErrorManager::new();
    msg.render(cfg, ctx, Some(&mut em));
    (msg, em)
}

fn raster(msg: &Message, page: usize) -> &Raster {
    msg.page(page).and_then(|p| p.raster()).expect("page rendered")
}

fn coords(msg: &Message, page: usize, idx: usize) -> Option<Rect> {
    msg.page(page).and_then(|p| p.token(idx)).and_then(|t| t.coords())
}

/// A 30x7 character-matrix sign with 5x7 cells.
fn char_matrix() -> Arc<DeviceConfig> {
    Arc::new(DeviceConfig {
        pixel_width: 30,
        pixel_height: 7,
        char_width: 5,
        char_height: 7,
        sign_type: SignType::CharMatrix,
        ..Default::default()
    })
}

// --- Text ---

#[test]
fn test_plain_text_renders_centered() {
    let (msg, em) = render("HELLO");
    assert!(em.is_empty(), "{:?}", em.records());
    assert!(msg.is_valid());
    let r = raster(&msg, 0);
    assert!(r.lit_count() > 0);
    assert_eq!(r.error_count(), 0);
    // 5 glyphs of 5 plus 4 gaps of 1 on a 96-wide sign; each glyph's width
    // includes its own spacing
    assert_eq!(coords(&msg, 0, 0), Some(Rect::new(33, 0, 6, 7)));
    assert_eq!(coords(&msg, 0, 1), Some(Rect::new(39, 0, 6, 7)));
    // top-left and top-right corners of the 'H'
    assert_eq!(r.pixel(33, 0), Ok(1));
    assert_eq!(r.pixel(34, 0), Ok(0));
    assert_eq!(r.pixel(37, 0), Ok(1));
    assert_eq!(msg.page(0).map(|p| p.eop()), Some(Rect::new(63, 0, 0, 7)));
}

#[test]
fn test_text_tokens_capture_style() {
    let (msg, _) = render("A");
    let t = msg.page(0).and_then(|p| p.token(0)).expect("token");
    assert_eq!(t.font_num(), Some(1));
    assert_eq!(t.color(), Some(DEFAULT_CONFIG.monochrome_fg));
}

#[test]
fn test_render_is_idempotent() {
    let mut msg = Message::parse("[jl4]AB[nl]C~[g9]");
    let ctx = RenderContext::default();
    msg.render(&DEFAULT_CONFIG, &ctx, None);
    let first = raster(&msg, 0).clone();
    let errors: Vec<_> = msg.tokens().map(|t| t.errors().to_vec()).collect();
    assert!(!msg.is_changed());
    msg.render(&DEFAULT_CONFIG, &ctx, None);
    assert_eq!(raster(&msg, 0), &first);
    let again: Vec<_> = msg.tokens().map(|t| t.errors().to_vec()).collect();
    assert_eq!(errors, again);
}

#[test]
fn test_glyphs_stay_inside_text_rectangle() {
    let (msg, em) = render("[tr10,5,40,10]HI");
    assert!(em.is_empty(), "{:?}", em.records());
    let tr = Rect::new(9, 4, 40, 10);
    for t in msg.tokens().filter(|t| t.is_kind(TokenKind::TextChar)) {
        let c = t.coords().expect("coords");
        assert!(c.x >= tr.x && c.right() <= tr.right(), "{:?}", c);
        assert!(c.y >= tr.y && c.bottom() <= tr.bottom(), "{:?}", c);
    }
}

#[test]
fn test_missing_glyph_is_zero_width() {
    let (msg, em) = render("A~B");
    assert_eq!(em.count(SyntaxError::CharacterNotDefined), 1);
    let p = msg.page(0).expect("page");
    assert!(p.tokens()[1].has_error(SyntaxError::CharacterNotDefined));
    assert_eq!(coords(&msg, 0, 1).map(|r| r.w), Some(0));
    let a = coords(&msg, 0, 0).expect("A");
    let b = coords(&msg, 0, 2).expect("B");
    // glyph, gap, empty cell, gap
    assert_eq!(b.x - a.x, 5 + 1 + 1);
}

#[test]
fn test_missing_font_falls_back_to_default() {
    let (msg, em) = render("[fo9]A");
    assert!(em.is_empty(), "{:?}", em.records());
    assert!(raster(&msg, 0).lit_count() > 0);
}

#[test]
fn test_no_font_at_all() {
    let ctx = RenderContext::new(FontCache::new(MemoryGlyphSource::new()), GraphicCache::empty());
    let (msg, em) = render_with("A", &DEFAULT_CONFIG, &ctx);
    assert_eq!(em.count(SyntaxError::FontNotDefined), 1);
    assert!(!msg.is_valid());
    assert_eq!(raster(&msg, 0).lit_count(), 0);
}

#[test]
fn test_char_spacing_override() {
    let (msg, _) = render("[sc3]AB[/sc]CD");
    let x: Vec<i32> = [1, 2, 4, 5]
        .into_iter()
        .filter_map(|i| coords(&msg, 0, i).map(|r| r.x))
        .collect();
    // A-B gap 3; B-C gap round((3 + 1) / 2) = 2; C-D gap 1
    assert_eq!(x[1] - x[0], 5 + 3);
    assert_eq!(x[2] - x[1], 5 + 2);
    assert_eq!(x[3] - x[2], 5 + 1);
}

// --- Lines and justification ---

#[test]
fn test_new_line_records_next_line() {
    let (msg, em) = render("A[nl]B");
    assert!(em.is_empty(), "{:?}", em.records());
    let nl = msg.page(0).and_then(|p| p.token(1)).and_then(|t| t.next_line());
    // second line starts after 7 rows plus 3 rows of line spacing
    assert_eq!(nl, Some(NextLine { top: 10, height: 7, left: 48 }));
    assert_eq!(coords(&msg, 0, 2).map(|r| r.y), Some(10));
}

#[test]
fn test_explicit_line_spacing() {
    let (msg, _) = render("A[nl1]B");
    assert_eq!(coords(&msg, 0, 2).map(|r| r.y), Some(8));
}

#[test]
fn test_page_justification() {
    let (msg, _) = render("[jp4]A");
    // bottom of a 25-row sign
    assert_eq!(coords(&msg, 0, 1).map(|r| r.y), Some(18));
    let (msg, _) = render("[jp3]A");
    assert_eq!(coords(&msg, 0, 1).map(|r| r.y), Some(9));
}

#[test]
fn test_line_justification() {
    let (msg, _) = render("[jl2]A[jl4]B");
    assert_eq!(coords(&msg, 0, 1).map(|r| r.x), Some(0));
    assert_eq!(coords(&msg, 0, 3).map(|r| r.x), Some(91));
}

#[test]
fn test_justification_conflicts() {
    let (_, em) = render("[jl4]A[jl2]B");
    assert_eq!(em.count(SyntaxError::TagConflict), 1);
    assert_eq!(em.records()[0].token, None);

    let (msg, em) = render("[jp4]A[jp2]B");
    assert_eq!(em.count(SyntaxError::TagConflict), 1);
    assert!(msg.page(0).map_or(false, |p| p.tokens()[2].has_error(SyntaxError::TagConflict)));

    // no content yet: a less specific value just replaces the first
    let (_, em) = render("[jp4][jp2]A");
    assert!(em.is_empty(), "{:?}", em.records());
}

#[test]
fn test_bad_justification_value() {
    let (msg, em) = render("[jl9]A");
    assert_eq!(em.count(SyntaxError::UnsupportedTagValue), 1);
    assert!(!msg.is_valid());
}

// --- Overflow ---

#[test]
fn test_narrow_rectangle_on_char_matrix() {
    let (msg, em) = render_with("[tr1,1,5,7]AB", &char_matrix(), &RenderContext::default());
    assert!(em.contains(SyntaxError::TextTooBig));
    let p = msg.page(0).expect("page");
    assert!(p.tokens()[1].has_error(SyntaxError::TextTooBig));
    assert!(p.tokens()[2].has_error(SyntaxError::TextTooBig));
    assert!(raster(&msg, 0).error_count() > 0);
}

#[test]
fn test_too_many_lines() {
    let cfg = Arc::new(DeviceConfig { pixel_width: 30, pixel_height: 7, ..Default::default() });
    let (msg, em) = render_with("A[nl]B", &cfg, &RenderContext::default());
    // one record for the block plus one per glyph in it
    assert_eq!(em.count(SyntaxError::TextTooBig), 3);
    assert_eq!(em.records().iter().filter(|r| r.token.is_none()).count(), 1);
    let p = msg.page(0).expect("page");
    assert!(p.tokens()[0].has_error(SyntaxError::TextTooBig));
    assert!(p.tokens()[2].has_error(SyntaxError::TextTooBig));
    assert!(!p.tokens()[1].has_error(SyntaxError::TextTooBig));
    assert!(raster(&msg, 0).error_count() > 0);
}

#[test]
fn test_too_many_lines_flags_boxes() {
    let cfg = Arc::new(DeviceConfig { pixel_width: 30, pixel_height: 7, ..Default::default() });
    let (msg, _) = render_with("[vsa][nl]B", &cfg, &RenderContext::default());
    let p = msg.page(0).expect("page");
    assert!(p.tokens()[0].has_error(SyntaxError::TextTooBig));
}

#[test]
fn test_extreme_parameters_do_not_panic() {
    for markup in [
        "[tr2147483647,1,10,10]A",
        "[tr-2147483648,-2147483648,0,0]A",
        "[sc2147483647]AB",
        "[sc-2147483648]AB",
        "[cr-2147483648,1,0,1,1]",
        "[cr1,1,2000000000,2000000000,1]",
        "[g1,-2147483648,-2147483648]",
        "A[nl2147483647]B[nl2147483647]C",
    ] {
        let (msg, _) = render(markup);
        assert!(msg.page(0).and_then(|p| p.raster()).is_some(), "markup {}", markup);
    }
}

#[test]
fn test_huge_color_rectangle_is_clipped() {
    let (msg, em) = render("[cr1,1,2000000000,2000000000,1]");
    assert_eq!(em.count(SyntaxError::UnsupportedTagValue), 1);
    // the visible part still covers the whole sign
    assert_eq!(raster(&msg, 0).lit_count(), 96 * 25);
}

#[test]
fn test_rectangle_outside_sign() {
    let (msg, em) = render("[tr90,1,20,5]");
    assert_eq!(em.count(SyntaxError::UnsupportedTagValue), 1);
    assert_eq!(coords(&msg, 0, 0), Some(Rect::new(89, 0, 20, 5)));
}

// --- Tags ---

#[test]
fn test_unsupported_tag_reported_once() {
    let (msg, em) = render("[zz]TEXT");
    assert_eq!(em.count(SyntaxError::UnsupportedTag), 1);
    assert_eq!(em.len(), 1);
    assert!(!msg.is_valid());
    assert!(raster(&msg, 0).lit_count() > 0);
    let rec = &em.records()[0];
    assert_eq!(rec.token.as_deref(), Some("[zz]"));
    assert_eq!(rec.location, Some(TokenLocation { page: 1, index: 0 }));
}

#[test]
fn test_tag_not_supported_by_device() {
    let cfg = Arc::new(DeviceConfig { supported_tags: TagSupport::empty(), ..Default::default() });
    let (msg, em) = render_with("[jl2]A", &cfg, &RenderContext::default());
    assert_eq!(em.count(SyntaxError::UnsupportedTag), 1);
    // still applied
    assert_eq!(coords(&msg, 0, 1).map(|r| r.x), Some(0));
}

#[test]
fn test_bad_color_rectangle_leaves_pixels() {
    let (msg, em) = render("[cr1,1,10,5,7]");
    assert_eq!(em.count(SyntaxError::UnsupportedTagValue), 1);
    assert_eq!(raster(&msg, 0).lit_count(), 0);
}

#[test]
fn test_color_rectangle() {
    let (msg, em) = render("[cr2,2,3,0,1]");
    assert!(em.is_empty(), "{:?}", em.records());
    // zero height runs to the bottom edge
    assert_eq!(raster(&msg, 0).lit_count(), 3 * 24);
    assert_eq!(coords(&msg, 0, 0), Some(Rect::new(1, 1, 3, 24)));
}

#[test]
fn test_page_background_fills_and_carries_over() {
    let (msg, em) = render("[pb1][np]");
    assert!(em.is_empty(), "{:?}", em.records());
    assert_eq!(raster(&msg, 0).lit_count(), 96 * 25);
    assert_eq!(raster(&msg, 1).lit_count(), 96 * 25);
}

#[test]
fn test_bad_foreground_keeps_previous() {
    let (msg, em) = render("[cf0][cf5]A");
    assert_eq!(em.count(SyntaxError::UnsupportedTagValue), 1);
    assert_eq!(raster(&msg, 0).lit_count(), 0);
}

#[test]
fn test_page_times() {
    let (msg, em) = render("[pt20o5]A");
    assert!(em.is_empty());
    let p = msg.page(0).expect("page");
    assert_eq!((p.page_on(), p.page_off()), (20, 5));

    let (msg, em) = render("[pt300]A");
    assert_eq!(em.count(SyntaxError::UnsupportedTagValue), 1);
    assert_eq!(msg.page(0).map(|p| p.page_on()), Some(DEFAULT_CONFIG.page_on_time));
}

#[test]
fn test_graphics() {
    let mut g = Raster::new(ColorScheme::Monochrome1Bit, 3, 3);
    for i in 0..3 {
        g.set_pixel(i, i, 1).expect("in bounds");
    }
    let graphics = GraphicCache::new(
        MemoryGraphicSource::new().with_graphic(GraphicDef::from_raster(2, "diag", &g)),
    );
    let ctx = RenderContext::new(FontCache::builtin(), graphics);
    let (msg, em) = render_with("[g2,4,4][g7]", &DEFAULT_CONFIG, &ctx);
    assert_eq!(em.count(SyntaxError::GraphicNotDefined), 1);
    let r = raster(&msg, 0);
    assert_eq!(r.lit_count(), 3);
    assert_eq!(r.pixel(3, 3), Ok(1));
    assert_eq!(r.pixel(5, 5), Ok(1));
    assert_eq!(coords(&msg, 0, 0), Some(Rect::new(3, 3, 3, 3)));
    // missing graphics get a 5x5 placeholder at the default position
    assert_eq!(coords(&msg, 0, 1), Some(Rect::new(0, 0, 5, 5)));
}

#[test]
fn test_iris_boxes() {
    let (msg, em) = render("[vsa]");
    assert!(em.is_empty(), "{:?}", em.records());
    let t = msg.page(0).and_then(|p| p.token(0)).expect("token");
    // two digits of 5 plus one gap
    assert_eq!(t.box_width(), Some(11));
    assert!(!t.is_blank());
    assert_eq!(raster(&msg, 0).lit_count(), 11 * 7);

    let (msg, _) = render("[feed1]");
    assert_eq!(raster(&msg, 0).lit_count(), 0);
    assert!(msg.is_blank());
}

// --- Pages ---

#[test]
fn test_multi_page() {
    let (msg, em) = render("PAGE1[np]PAGE2");
    assert!(em.is_empty(), "{:?}", em.records());
    assert_eq!(msg.page_count(), 2);
    let (r1, r2) = (raster(&msg, 0), raster(&msg, 1));
    assert!(r1.lit_count() > 0 && r2.lit_count() > 0);
    assert_ne!(r1, r2);
}

#[test]
fn test_text_rectangle_resets_per_page() {
    let (msg, _) = render("[tr1,1,20,7]A[np]A");
    // page 2 centers on the full sign again
    assert_eq!(coords(&msg, 1, 0).map(|r| r.x), Some(45));
}

#[test]
fn test_empty_page_end_cursor() {
    let (msg, _) = render("");
    assert_eq!(msg.page(0).map(|p| p.eop()), Some(Rect::new(48, 0, 0, 7)));
}

#[test]
fn test_preview_after_render() {
    let (mut msg, _) = render("A[np]B");
    assert!(msg.set_preview_size(400, 150).is_ok());
    assert!(msg.page(1).and_then(|p| p.raster()).map_or(false, |r| r.has_preview()));
}
