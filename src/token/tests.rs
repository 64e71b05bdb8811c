// src/token/tests.rs

use super::*;
use crate::config::TagSupport;
use crate::error::SyntaxError;
use crate::multi::ColorTag;
use test_log::test;

#[test]
fn test_canonical_text() {
    assert_eq!(Token::text_char('A').multi(), "A");
    assert_eq!(Token::text_char('[').multi(), "[[");
    assert_eq!(Token::new(Tag::NewLine(Some(3))).multi(), "[nl3]");
    assert_eq!(Token::new(Tag::Font { num: Some(2), id: Some("1a2b".into()) }).multi(), "[fo2,1a2b]");
    assert_eq!(
        Token::new(Tag::ColorForeground(Some(ColorTag::Rgb(255, 0, 0)))).to_string(),
        "[cf255,0,0]"
    );
    assert_eq!(Token::new(Tag::Unsupported("[zz]".into())).multi(), "[zz]");
}

#[test]
fn test_move_by_updates_markup() {
    let mut t = Token::new(Tag::TextRectangle { x: 1, y: 1, w: 10, h: 8 });
    assert!(t.move_by(2, 3));
    assert_eq!(t.multi(), "[tr3,4,10,8]");
    assert_eq!(t.param_x(), Some(3));

    let mut g = Token::new(Tag::Graphic { num: 4, x: None, y: None, id: None });
    assert!(!g.move_by(1, 1));
    assert_eq!(g.multi(), "[g4]");

    let mut t = Token::text_char('x');
    assert!(!t.move_by(1, 1));
}

#[test]
fn test_geometry_prefers_coords() {
    let mut t = Token::new(Tag::ColorRectangle {
        x: 1,
        y: 1,
        w: 4,
        h: 4,
        color: ColorTag::Single(1),
    });
    // before rendering the tag parameters are used
    assert_eq!(t.centroid(), Some((3, 3)));
    assert!(t.is_inside(4, 4));
    assert!(!t.is_inside(5, 4));
    t.set_coords(0, 0, 4, 4);
    assert_eq!(t.centroid(), Some((2, 2)));
    assert_eq!(t.right_edge(), Some(4));
    assert_eq!(t.bottom_edge(), Some(4));
    assert!(t.is_inside(0, 0));
    assert!(!t.is_inside(4, 0));
    assert!(t.same_line(4));
    assert_eq!(t.distance(2, 5), Some(3.0));
}

#[test]
fn test_text_without_coords_has_no_geometry() {
    let t = Token::text_char('A');
    assert_eq!(t.centroid(), None);
    assert!(!t.is_inside(0, 0));
    assert!(!t.same_line(0));
    assert_eq!(t.distance(0, 0), None);
}

#[test]
fn test_clear_metadata() {
    let mut t = Token::text_char('A');
    t.set_coords(1, 2, 3, 4);
    t.add_error(SyntaxError::CharacterNotDefined);
    assert!(!t.is_valid());
    assert!(t.has_error(SyntaxError::CharacterNotDefined));
    t.clear_metadata();
    assert!(t.is_valid());
    assert_eq!(t.coords(), None);
}

#[test]
fn test_blank_rules() {
    assert!(Token::text_char(' ').is_blank());
    assert!(!Token::text_char('A').is_blank());
    assert!(Token::new(Tag::JustificationLine(Some(2))).is_blank());
    assert!(!Token::new(Tag::Graphic { num: 1, x: None, y: None, id: None }).is_blank());

    let mut vsa = Token::new(Tag::SpeedAdvisory);
    assert!(vsa.is_blank());
    assert!(vsa.is_printable_text());
    vsa.set_box_width(12);
    assert!(!vsa.is_blank());
    vsa.set_box_width(0);
    assert!(vsa.is_blank());
}

#[test]
fn test_kind_policies() {
    assert_eq!(TokenKind::NewLine.anchor_loc(), AnchorLoc::Before);
    assert_eq!(TokenKind::TextChar.anchor_loc(), AnchorLoc::None);
    assert_eq!(TokenKind::TravelTime.anchor_loc(), AnchorLoc::Conditional);
    assert_eq!(TokenKind::PageTime.anchor_loc(), AnchorLoc::After);

    assert_eq!(TokenKind::NewPage.lines_category(), LinesCategory::PageBreak);
    assert_eq!(TokenKind::ColorForeground.lines_category(), LinesCategory::Include);
    assert_eq!(TokenKind::ColorBackground.lines_category(), LinesCategory::Ignore);

    assert!(TokenKind::Font.is_normalize_line());
    assert!(!TokenKind::Font.is_normalize_line2());
    assert!(TokenKind::ColorBackground.is_normalize_line2());
    assert!(!TokenKind::NewLine.is_normalize_line());

    assert!(!TokenKind::TextChar.is_tag());
    assert!(TokenKind::TextRectangle.is_rect());
}

#[test]
fn test_supported_by() {
    let none = TagSupport::empty();
    assert!(TokenKind::TextChar.supported_by(none));
    assert!(TokenKind::TravelTime.supported_by(none));
    assert!(!TokenKind::Font.supported_by(none));
    assert!(!TokenKind::UnsupportedTag.supported_by(TagSupport::all()));
    assert!(TokenKind::PageBackground.supported_by(TagSupport::from_mask(1 << 29)));
}

#[test]
fn test_description() {
    assert_eq!(Token::text_char('Q').description(), "Text Character: 'Q'");
    assert_eq!(Token::new(Tag::NewPage).description(), "New page tag: '[np]'");
}
