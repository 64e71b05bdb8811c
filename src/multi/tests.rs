// src/multi/tests.rs

use super::*;
use crate::message::Message;
use crate::token::{Tag, TokenKind};
use test_log::test;

/// Lexes `markup` straight into canonical markup.
fn canonical(markup: &str) -> String {
    let mut b = MultiBuilder::new();
    parse(markup, &mut b);
    b.into_string()
}

#[test]
fn test_canonical_forms_are_stable() {
    for m in [
        "HELLO",
        "[cb3][pb0][cf255,0,0]A",
        "[cr1,1,10,5,255,208,0][cr2,2,3,3,1]",
        "[fo2][fo3,1a2b][fo]",
        "[g1][g2,10,3][g3,1,1,00ff]",
        "[jl2][jp3][jl][jp]",
        "[nl][nl4]",
        "[pt][pt25o5][pto3][pt20o]",
        "[sc2]AB[/sc]",
        "[tr1,1,40,8]",
        "[tt100][tt100,prepend,OVER ][tt7,,LIMIT]",
        "[vsa][slow45,10][slow45,10,dist]",
        "[feedabc][locrd]",
        "[tzp,z1,z2][pa7][pa7,LOW,CLOSED][pa7,,CLOSED]",
        "[captime,a,b][capresponse,r1,r2][capurgency,u]",
    ] {
        assert_eq!(canonical(m), m, "markup {}", m);
    }
}

#[test]
fn test_tag_ids_are_case_insensitive() {
    assert_eq!(canonical("[JL3][Fo2][NP][VSA]"), "[jl3][fo2][np][vsa]");
    assert_eq!(canonical("[PT20O5]"), "[pt20o5]");
    assert_eq!(canonical("[TT1,APPEND]"), "[tt1,append]");
}

#[test]
fn test_bracket_escapes() {
    assert_eq!(canonical("A[[B]]C"), "A[[B]]C");
    // a lone close bracket is literal text
    assert_eq!(canonical("A]B"), "A]]B");

    let msg = Message::parse("[[x]]");
    let chars: Vec<char> = msg.tokens().filter_map(|t| t.as_char()).collect();
    assert_eq!(chars, vec!['[', 'x', ']']);
}

#[test]
fn test_unknown_and_malformed_tags_pass_through() {
    for raw in ["[zz]", "[jlx]", "[np2]", "[cr1,2,3]", "[g]", "[g1,2]", "[sc]", "[vsax]", "[tt]"] {
        let msg = Message::parse(raw);
        let toks: Vec<_> = msg.tokens().collect();
        assert_eq!(toks.len(), 1, "markup {}", raw);
        assert_eq!(toks[0].tag(), &Tag::Unsupported(raw.to_string()));
        assert_eq!(msg.to_multi(), raw);
    }
}

#[test]
fn test_unterminated_tag_keeps_rest_verbatim() {
    let msg = Message::parse("AB[fo2");
    let kinds: Vec<TokenKind> = msg.tokens().map(|t| t.kind()).collect();
    assert_eq!(kinds, vec![TokenKind::TextChar, TokenKind::TextChar, TokenKind::UnsupportedTag]);
    assert_eq!(msg.to_multi(), "AB[fo2");
}

#[test]
fn test_parser_builds_pages() {
    let msg = Message::parse("ONE[nl]TWO[np][jp3]THREE");
    assert_eq!(msg.page_count(), 2);
    assert_eq!(msg.page_multi(0), "ONE[nl]TWO");
    assert_eq!(msg.page_multi(1), "[jp3]THREE");
    assert_eq!(msg.page(1).map(|p| p.len()), Some(6));
}

#[test]
fn test_out_of_range_values_are_kept_for_render() {
    let msg = Message::parse("[jl9][pt300]");
    let tags: Vec<&Tag> = msg.tokens().map(|t| t.tag()).collect();
    assert_eq!(tags[0], &Tag::JustificationLine(Some(9)));
    assert_eq!(tags[1], &Tag::PageTime { on: Some(300), off: None });
}

#[test]
fn test_message_emit_round_trip() {
    let msg = Message::parse("[cf1]A[np]B[nl2]C");
    let mut b = MultiBuilder::new();
    msg.emit(&mut b);
    assert_eq!(b.as_str(), "[cf1]A[np]B[nl2]C");
}

#[test]
fn test_justification_ordinals() {
    assert_eq!(JustificationLine::from_ordinal(3), Some(JustificationLine::Center));
    assert_eq!(JustificationLine::from_ordinal(6), None);
    assert!(JustificationLine::Left < JustificationLine::Right);
    assert_eq!(JustificationPage::Bottom.ordinal(), 4);
    assert_eq!(JustificationPage::from_ordinal(-1), None);
}
