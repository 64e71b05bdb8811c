// src/font/tests.rs

use super::*;
use crate::font::source::GlyphDef;
use test_log::test;

fn tiny_font() -> FontDef {
    FontDef {
        number: 4,
        name: "tiny".to_string(),
        height: 2,
        width: 0,
        char_spacing: 2,
        line_spacing: 1,
        glyphs: vec![
            GlyphDef::new('1', &["#", "#"]),
            GlyphDef::new('2', &["##", ".#"]),
            GlyphDef::new('3', &["###", "#.#"]),
            // wrong row count, skipped
            GlyphDef::new('4', &["##"]),
        ],
    }
}

#[test]
fn test_builtin_font_loads() {
    let cache = FontCache::builtin();
    let font = cache.font(BUILTIN_FONT_NUMBER).expect("builtin font");
    assert_eq!(font.height(), 7);
    assert_eq!(font.char_spacing(), 1);
    assert_eq!(font.max_char_width(), 5);
    let a = font.glyph('A').expect("glyph A");
    assert_eq!(a.width, 5);
    assert_eq!(a.bitmap.height(), 7);
    assert!(a.bitmap.lit_count() > 0);
    assert!(font.glyph('a').is_none());
}

#[test]
fn test_malformed_glyph_is_skipped() {
    let font = Font::from_def(&tiny_font());
    assert_eq!(font.glyph_count(), 3);
    assert!(font.glyph('4').is_none());
    assert_eq!(font.max_char_width(), 3);
}

#[test]
fn test_text_width_trims_trailing_spacing() {
    let font = Font::from_def(&tiny_font());
    assert_eq!(font.text_width("", None), 0);
    assert_eq!(font.text_width("1", None), 1);
    // 1 + 2 + 3 wide, two gaps of 2
    assert_eq!(font.text_width("123", None), 10);
    assert_eq!(font.text_width("123", Some(0)), 6);
    // missing glyphs count as zero wide but keep their gaps
    assert_eq!(font.text_width("1x", None), 3);
}

#[test]
fn test_max_int_width() {
    let font = Font::from_def(&tiny_font());
    // "3" is widest single digit in 1..=3
    assert_eq!(font.max_int_width(1, 3, None), 3);
    // "13" = 1 + 2 + 3; "23" = 2 + 2 + 3
    assert_eq!(font.max_int_width(13, 23, None), 7);
    assert_eq!(font.max_int_width(5, 1, None), 0);
}

#[test]
fn test_cache_missing_font() {
    let cache = FontCache::new(MemoryGlyphSource::new().with_font(tiny_font()));
    assert!(cache.font(BUILTIN_FONT_NUMBER).is_none());
    assert!(cache.font(4).is_some());
    assert!(cache.glyph(4, '2').is_some());
    assert!(cache.glyph(4, '9').is_none());
    assert_eq!(cache.font_numbers(), vec![4]);
}

#[test]
fn test_cache_returns_shared_font() {
    let cache = FontCache::builtin();
    let a = cache.font(1).unwrap();
    let b = cache.font(1).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn test_font_json() {
    let json = r##"[{ "number": 2, "name": "j", "height": 1,
                      "glyphs": [{ "code_point": 65, "rows": ["#.#"] }] }]"##;
    let source = MemoryGlyphSource::from_json_str(json).unwrap();
    let cache = FontCache::new(source);
    let font = cache.font(2).unwrap();
    assert_eq!(font.char_spacing(), 0);
    assert_eq!(font.glyph('A').unwrap().width, 3);
    assert!(MemoryGlyphSource::from_json_str("{").is_err());
}
