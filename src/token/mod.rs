// src/token/mod.rs

//! Message tokens.
//!
//! A token is one text character or one tag. It carries its decoded tag
//! parameters plus the metadata the last render pass attached to it:
//! on-sign coordinates (0-based pixels), errors, and a few kind-specific
//! layout results.

mod kind;

use crate::color::DmsColor;
use crate::error::SyntaxError;
use crate::multi::{ColorTag, MultiBuilder, MultiSink, OverLimitMode};

pub use kind::{AnchorLoc, LinesCategory, TokenKind};

/// An axis-aligned rectangle in sign pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Rect { x, y, w, h }
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.w)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.h)
    }

    /// Half-open containment test.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub fn centroid(&self) -> (i32, i32) {
        (self.x.saturating_add(self.w / 2), self.y.saturating_add(self.h / 2))
    }
}

/// Where the line after a `[nl]` starts, as computed by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextLine {
    pub top: i32,
    pub height: i32,
    pub left: i32,
}

/// Decoded tag parameters, one variant per token kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    TextChar(char),
    ColorBackground(Option<i32>),
    ColorForeground(Option<ColorTag>),
    PageBackground(Option<ColorTag>),
    ColorRectangle { x: i32, y: i32, w: i32, h: i32, color: ColorTag },
    Font { num: Option<i32>, id: Option<String> },
    Graphic { num: i32, x: Option<i32>, y: Option<i32>, id: Option<String> },
    JustificationLine(Option<i32>),
    JustificationPage(Option<i32>),
    NewLine(Option<i32>),
    NewPage,
    PageTime { on: Option<i32>, off: Option<i32> },
    CharSpacing(Option<i32>),
    TextRectangle { x: i32, y: i32, w: i32, h: i32 },
    TravelTime { sid: String, mode: Option<OverLimitMode>, over_text: Option<String> },
    SpeedAdvisory,
    SlowWarning { speed: i32, dist: i32, mode: Option<String> },
    Feed(String),
    Tolling { mode: String, zones: Vec<String> },
    Parking { pid: String, low: Option<String>, closed: Option<String> },
    Locator(String),
    CapTime { first: Option<String>, active: Option<String>, past: Option<String> },
    CapResponse(Vec<String>),
    CapUrgency(Vec<String>),
    /// Raw text of a tag that was not recognized, brackets included.
    Unsupported(String),
}

impl Tag {
    pub fn kind(&self) -> TokenKind {
        match self {
            Tag::TextChar(_) => TokenKind::TextChar,
            Tag::ColorBackground(_) => TokenKind::ColorBackground,
            Tag::ColorForeground(_) => TokenKind::ColorForeground,
            Tag::PageBackground(_) => TokenKind::PageBackground,
            Tag::ColorRectangle { .. } => TokenKind::ColorRectangle,
            Tag::Font { .. } => TokenKind::Font,
            Tag::Graphic { .. } => TokenKind::Graphic,
            Tag::JustificationLine(_) => TokenKind::JustificationLine,
            Tag::JustificationPage(_) => TokenKind::JustificationPage,
            Tag::NewLine(_) => TokenKind::NewLine,
            Tag::NewPage => TokenKind::NewPage,
            Tag::PageTime { .. } => TokenKind::PageTime,
            Tag::CharSpacing(_) => TokenKind::CharSpacing,
            Tag::TextRectangle { .. } => TokenKind::TextRectangle,
            Tag::TravelTime { .. } => TokenKind::TravelTime,
            Tag::SpeedAdvisory => TokenKind::SpeedAdvisory,
            Tag::SlowWarning { .. } => TokenKind::SlowWarning,
            Tag::Feed(_) => TokenKind::FeedMsg,
            Tag::Tolling { .. } => TokenKind::Tolling,
            Tag::Parking { .. } => TokenKind::ParkingAvail,
            Tag::Locator(_) => TokenKind::IncidentLoc,
            Tag::CapTime { .. } => TokenKind::CapTime,
            Tag::CapResponse(_) => TokenKind::CapResponse,
            Tag::CapUrgency(_) => TokenKind::CapUrgency,
            Tag::Unsupported(_) => TokenKind::UnsupportedTag,
        }
    }

    /// Replays this tag into a sink.
    pub fn emit(&self, sink: &mut dyn MultiSink) {
        match self {
            Tag::TextChar(c) => {
                let mut buf = [0u8; 4];
                sink.add_span(c.encode_utf8(&mut buf));
            }
            Tag::ColorBackground(c) => sink.set_color_background(*c),
            Tag::ColorForeground(c) => sink.set_color_foreground(*c),
            Tag::PageBackground(c) => sink.set_page_background(*c),
            Tag::ColorRectangle { x, y, w, h, color } => {
                sink.add_color_rectangle(*x, *y, *w, *h, *color)
            }
            Tag::Font { num, id } => sink.set_font(*num, id.as_deref()),
            Tag::Graphic { num, x, y, id } => sink.add_graphic(*num, *x, *y, id.as_deref()),
            Tag::JustificationLine(j) => sink.set_justification_line(*j),
            Tag::JustificationPage(j) => sink.set_justification_page(*j),
            Tag::NewLine(s) => sink.add_line(*s),
            Tag::NewPage => sink.add_page(),
            Tag::PageTime { on, off } => sink.set_page_times(*on, *off),
            Tag::CharSpacing(s) => sink.set_char_spacing(*s),
            Tag::TextRectangle { x, y, w, h } => sink.set_text_rectangle(*x, *y, *w, *h),
            Tag::TravelTime { sid, mode, over_text } => {
                sink.add_travel_time(sid, *mode, over_text.as_deref())
            }
            Tag::SpeedAdvisory => sink.add_speed_advisory(),
            Tag::SlowWarning { speed, dist, mode } => {
                sink.add_slow_warning(*speed, *dist, mode.as_deref())
            }
            Tag::Feed(fid) => sink.add_feed(fid),
            Tag::Tolling { mode, zones } => sink.add_tolling(mode, zones),
            Tag::Parking { pid, low, closed } => {
                sink.add_parking(pid, low.as_deref(), closed.as_deref())
            }
            Tag::Locator(code) => sink.add_locator(code),
            Tag::CapTime { first, active, past } => {
                sink.add_cap_time(first.as_deref(), active.as_deref(), past.as_deref())
            }
            Tag::CapResponse(r) => sink.add_cap_response(r),
            Tag::CapUrgency(u) => sink.add_cap_urgency(u),
            Tag::Unsupported(raw) => sink.unsupported_tag(raw),
        }
    }

    fn canonical(&self) -> String {
        let mut b = MultiBuilder::new();
        self.emit(&mut b);
        b.into_string()
    }
}

/// One message element plus its render metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    tag: Tag,
    text: String,
    coords: Option<Rect>,
    errors: Vec<SyntaxError>,
    /// Font in effect when a text character was rendered.
    font_num: Option<i32>,
    /// Foreground color in effect when a text character was rendered.
    color: Option<DmsColor>,
    next_line: Option<NextLine>,
    box_width: Option<i32>,
}

impl Token {
    pub fn new(tag: Tag) -> Self {
        let text = tag.canonical();
        Token {
            tag,
            text,
            coords: None,
            errors: Vec::new(),
            font_num: None,
            color: None,
            next_line: None,
            box_width: None,
        }
    }

    pub fn text_char(c: char) -> Self {
        Token::new(Tag::TextChar(c))
    }

    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    pub fn kind(&self) -> TokenKind {
        self.tag.kind()
    }

    pub fn is_kind(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    /// Canonical markup of this token.
    pub fn multi(&self) -> &str {
        &self.text
    }

    pub fn emit(&self, sink: &mut dyn MultiSink) {
        self.tag.emit(sink);
    }

    /// "Label tag: 'markup'" for diagnostics.
    pub fn description(&self) -> String {
        let tag = if self.kind().is_tag() { " tag" } else { "" };
        format!("{}{}: '{}'", self.kind().label(), tag, self.text)
    }

    // --- Parameters ---

    /// Position and size from the tag itself (1-based, as written), for
    /// tokens that carry them.
    pub fn params(&self) -> Option<Rect> {
        match self.tag {
            Tag::TextRectangle { x, y, w, h } | Tag::ColorRectangle { x, y, w, h, .. } => {
                Some(Rect::new(x, y, w, h))
            }
            _ => None,
        }
    }

    pub fn param_x(&self) -> Option<i32> {
        match self.tag {
            Tag::Graphic { x, .. } => x,
            _ => self.params().map(|r| r.x),
        }
    }

    pub fn param_y(&self) -> Option<i32> {
        match self.tag {
            Tag::Graphic { y, .. } => y,
            _ => self.params().map(|r| r.y),
        }
    }

    pub fn param_w(&self) -> Option<i32> {
        self.params().map(|r| r.w)
    }

    pub fn param_h(&self) -> Option<i32> {
        self.params().map(|r| r.h)
    }

    /// Moves a positioned tag (graphic with a position, text or color
    /// rectangle) and refreshes its markup. Returns false for other tokens.
    pub fn move_by(&mut self, dx: i32, dy: i32) -> bool {
        let moved = match &mut self.tag {
            Tag::Graphic { x: Some(x), y: Some(y), .. }
            | Tag::TextRectangle { x, y, .. }
            | Tag::ColorRectangle { x, y, .. } => {
                *x = x.saturating_add(dx);
                *y = y.saturating_add(dy);
                true
            }
            _ => false,
        };
        if moved {
            self.text = self.tag.canonical();
        }
        moved
    }

    // --- Render metadata ---

    /// Forgets coordinates, errors, and layout results from the last render.
    pub fn clear_metadata(&mut self) {
        self.coords = None;
        self.errors.clear();
        self.font_num = None;
        self.color = None;
        self.next_line = None;
        self.box_width = None;
    }

    pub fn coords(&self) -> Option<Rect> {
        self.coords
    }

    pub fn set_coords(&mut self, x: i32, y: i32, w: i32, h: i32) {
        self.coords = Some(Rect::new(x, y, w, h));
    }

    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    pub fn add_error(&mut self, err: SyntaxError) {
        self.errors.push(err);
    }

    pub fn has_error(&self, err: SyntaxError) -> bool {
        self.errors.contains(&err)
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn font_num(&self) -> Option<i32> {
        self.font_num
    }

    pub fn color(&self) -> Option<DmsColor> {
        self.color
    }

    pub(crate) fn set_text_style(&mut self, font_num: Option<i32>, color: DmsColor) {
        self.font_num = font_num;
        self.color = Some(color);
    }

    pub fn next_line(&self) -> Option<NextLine> {
        self.next_line
    }

    pub(crate) fn set_next_line(&mut self, nl: NextLine) {
        self.next_line = Some(nl);
    }

    /// Width of the placeholder box drawn for an IRIS tag.
    pub fn box_width(&self) -> Option<i32> {
        self.box_width
    }

    pub(crate) fn set_box_width(&mut self, w: i32) {
        self.box_width = Some(w);
    }

    // --- Geometry ---

    /// Rendered coordinates, falling back to tag parameters.
    fn extent(&self) -> Option<Rect> {
        self.coords.or_else(|| self.params())
    }

    pub fn centroid(&self) -> Option<(i32, i32)> {
        self.extent().map(|r| r.centroid())
    }

    pub fn right_edge(&self) -> Option<i32> {
        self.extent().map(|r| r.right())
    }

    pub fn bottom_edge(&self) -> Option<i32> {
        self.extent().map(|r| r.bottom())
    }

    pub fn is_inside(&self, x: i32, y: i32) -> bool {
        self.extent().is_some_and(|r| r.contains(x, y))
    }

    /// True when `y` falls within the token's rendered rows (inclusive of the
    /// bottom edge).
    pub fn same_line(&self, y: i32) -> bool {
        self.coords.is_some_and(|r| y >= r.y && y <= r.bottom())
    }

    /// Distance from a point to the token's centroid.
    pub fn distance(&self, x: i32, y: i32) -> Option<f64> {
        self.centroid().map(|(cx, cy)| {
            let dx = f64::from(cx) - f64::from(x);
            let dy = f64::from(cy) - f64::from(y);
            (dx * dx + dy * dy).sqrt()
        })
    }

    // --- Classification ---

    /// Whitespace text, non-drawing tags, and IRIS tags that rendered no
    /// box count as blank.
    pub fn is_blank(&self) -> bool {
        match &self.tag {
            Tag::TextChar(c) => c.is_whitespace(),
            Tag::Graphic { .. } | Tag::ColorRectangle { .. } => false,
            t if t.kind().is_iris() => self.box_width.map_or(true, |w| w < 1),
            _ => true,
        }
    }

    /// Text characters and IRIS tags, which render as text.
    pub fn is_printable_text(&self) -> bool {
        matches!(self.tag, Tag::TextChar(_)) || self.kind().is_iris()
    }

    /// The character of a text token.
    pub fn as_char(&self) -> Option<char> {
        match self.tag {
            Tag::TextChar(c) => Some(c),
            _ => None,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests;
