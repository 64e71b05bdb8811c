// src/multi/parser.rs

//! `MultiSink` that builds a `Message`: one token per tag or character, a
//! new page per `[np]`.

use log::trace;

use super::{ColorTag, MultiSink, OverLimitMode};
use crate::message::Message;
use crate::token::{Tag, Token};

/// Appends parsed tokens to a message, starting on its last page.
pub struct MessageBuilder<'m> {
    msg: &'m mut Message,
    page: usize,
}

impl<'m> MessageBuilder<'m> {
    pub fn new(msg: &'m mut Message) -> Self {
        let page = msg.page_count().saturating_sub(1);
        MessageBuilder { msg, page }
    }

    fn push(&mut self, tag: Tag) {
        trace!("MessageBuilder: page {} <- {:?}", self.page, tag);
        let tok = Token::new(tag);
        match self.msg.page_mut(self.page) {
            Some(p) => p.add(tok),
            None => self.msg.new_page().add(tok),
        }
    }
}

fn owned(s: Option<&str>) -> Option<String> {
    s.map(str::to_string)
}

impl MultiSink for MessageBuilder<'_> {
    fn add_span(&mut self, span: &str) {
        for c in span.chars() {
            self.push(Tag::TextChar(c));
        }
    }

    fn set_color_background(&mut self, color: Option<i32>) {
        self.push(Tag::ColorBackground(color));
    }

    fn set_page_background(&mut self, color: Option<ColorTag>) {
        self.push(Tag::PageBackground(color));
    }

    fn set_color_foreground(&mut self, color: Option<ColorTag>) {
        self.push(Tag::ColorForeground(color));
    }

    fn add_color_rectangle(&mut self, x: i32, y: i32, w: i32, h: i32, color: ColorTag) {
        self.push(Tag::ColorRectangle { x, y, w, h, color });
    }

    fn set_font(&mut self, num: Option<i32>, id: Option<&str>) {
        self.push(Tag::Font { num, id: owned(id) });
    }

    fn add_graphic(&mut self, num: i32, x: Option<i32>, y: Option<i32>, id: Option<&str>) {
        self.push(Tag::Graphic { num, x, y, id: owned(id) });
    }

    fn set_justification_line(&mut self, jl: Option<i32>) {
        self.push(Tag::JustificationLine(jl));
    }

    fn set_justification_page(&mut self, jp: Option<i32>) {
        self.push(Tag::JustificationPage(jp));
    }

    fn add_line(&mut self, spacing: Option<i32>) {
        self.push(Tag::NewLine(spacing));
    }

    fn add_page(&mut self) {
        self.msg.new_page();
        self.page = self.msg.page_count() - 1;
    }

    fn set_page_times(&mut self, on: Option<i32>, off: Option<i32>) {
        self.push(Tag::PageTime { on, off });
    }

    fn set_char_spacing(&mut self, sc: Option<i32>) {
        self.push(Tag::CharSpacing(sc));
    }

    fn set_text_rectangle(&mut self, x: i32, y: i32, w: i32, h: i32) {
        self.push(Tag::TextRectangle { x, y, w, h });
    }

    fn add_travel_time(&mut self, sid: &str, mode: Option<OverLimitMode>, over_text: Option<&str>) {
        self.push(Tag::TravelTime { sid: sid.to_string(), mode, over_text: owned(over_text) });
    }

    fn add_speed_advisory(&mut self) {
        self.push(Tag::SpeedAdvisory);
    }

    fn add_slow_warning(&mut self, speed: i32, dist: i32, mode: Option<&str>) {
        self.push(Tag::SlowWarning { speed, dist, mode: owned(mode) });
    }

    fn add_feed(&mut self, fid: &str) {
        self.push(Tag::Feed(fid.to_string()));
    }

    fn add_tolling(&mut self, mode: &str, zones: &[String]) {
        self.push(Tag::Tolling { mode: mode.to_string(), zones: zones.to_vec() });
    }

    fn add_parking(&mut self, pid: &str, low_text: Option<&str>, closed_text: Option<&str>) {
        self.push(Tag::Parking {
            pid: pid.to_string(),
            low: owned(low_text),
            closed: owned(closed_text),
        });
    }

    fn add_locator(&mut self, code: &str) {
        self.push(Tag::Locator(code.to_string()));
    }

    fn add_cap_time(&mut self, first: Option<&str>, active: Option<&str>, past: Option<&str>) {
        self.push(Tag::CapTime { first: owned(first), active: owned(active), past: owned(past) });
    }

    fn add_cap_response(&mut self, rtypes: &[String]) {
        self.push(Tag::CapResponse(rtypes.to_vec()));
    }

    fn add_cap_urgency(&mut self, uvals: &[String]) {
        self.push(Tag::CapUrgency(uvals.to_vec()));
    }

    fn unsupported_tag(&mut self, raw: &str) {
        self.push(Tag::Unsupported(raw.to_string()));
    }
}
