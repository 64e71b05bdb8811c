// src/multi/builder.rs

//! `MultiSink` that writes canonical MULTI markup.

use std::fmt::Write;

use super::{ColorTag, MultiSink, OverLimitMode};

/// Accumulates canonical markup text.
#[derive(Debug, Clone, Default)]
pub struct MultiBuilder {
    out: String,
}

impl MultiBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn into_string(self) -> String {
        self.out
    }

    fn opt_int(&mut self, prefix: &str, v: Option<i32>) {
        self.out.push('[');
        self.out.push_str(prefix);
        if let Some(n) = v {
            let _ = write!(self.out, "{}", n);
        }
        self.out.push(']');
    }

    fn opt_color(&mut self, prefix: &str, color: Option<ColorTag>) {
        self.out.push('[');
        self.out.push_str(prefix);
        if let Some(c) = color {
            let _ = write!(self.out, "{}", c);
        }
        self.out.push(']');
    }

    fn list(&mut self, prefix: &str, items: &[&str]) {
        self.out.push('[');
        self.out.push_str(prefix);
        for item in items {
            self.out.push(',');
            self.out.push_str(item);
        }
        self.out.push(']');
    }
}

impl MultiSink for MultiBuilder {
    fn add_span(&mut self, span: &str) {
        for c in span.chars() {
            match c {
                '[' => self.out.push_str("[["),
                ']' => self.out.push_str("]]"),
                _ => self.out.push(c),
            }
        }
    }

    fn set_color_background(&mut self, color: Option<i32>) {
        self.opt_int("cb", color);
    }

    fn set_page_background(&mut self, color: Option<ColorTag>) {
        self.opt_color("pb", color);
    }

    fn set_color_foreground(&mut self, color: Option<ColorTag>) {
        self.opt_color("cf", color);
    }

    fn add_color_rectangle(&mut self, x: i32, y: i32, w: i32, h: i32, color: ColorTag) {
        let _ = write!(self.out, "[cr{},{},{},{},{}]", x, y, w, h, color);
    }

    fn set_font(&mut self, num: Option<i32>, id: Option<&str>) {
        match (num, id) {
            (Some(n), Some(id)) => {
                let _ = write!(self.out, "[fo{},{}]", n, id);
            }
            (n, _) => self.opt_int("fo", n),
        }
    }

    fn add_graphic(&mut self, num: i32, x: Option<i32>, y: Option<i32>, id: Option<&str>) {
        let _ = write!(self.out, "[g{}", num);
        if let (Some(x), Some(y)) = (x, y) {
            let _ = write!(self.out, ",{},{}", x, y);
            if let Some(id) = id {
                let _ = write!(self.out, ",{}", id);
            }
        }
        self.out.push(']');
    }

    fn set_justification_line(&mut self, jl: Option<i32>) {
        self.opt_int("jl", jl);
    }

    fn set_justification_page(&mut self, jp: Option<i32>) {
        self.opt_int("jp", jp);
    }

    fn add_line(&mut self, spacing: Option<i32>) {
        self.opt_int("nl", spacing);
    }

    fn add_page(&mut self) {
        self.out.push_str("[np]");
    }

    fn set_page_times(&mut self, on: Option<i32>, off: Option<i32>) {
        if on.is_none() && off.is_none() {
            self.out.push_str("[pt]");
            return;
        }
        self.out.push_str("[pt");
        if let Some(on) = on {
            let _ = write!(self.out, "{}", on);
        }
        self.out.push('o');
        if let Some(off) = off {
            let _ = write!(self.out, "{}", off);
        }
        self.out.push(']');
    }

    fn set_char_spacing(&mut self, sc: Option<i32>) {
        match sc {
            Some(n) => {
                let _ = write!(self.out, "[sc{}]", n);
            }
            None => self.out.push_str("[/sc]"),
        }
    }

    fn set_text_rectangle(&mut self, x: i32, y: i32, w: i32, h: i32) {
        let _ = write!(self.out, "[tr{},{},{},{}]", x, y, w, h);
    }

    fn add_travel_time(&mut self, sid: &str, mode: Option<OverLimitMode>, over_text: Option<&str>) {
        let _ = write!(self.out, "[tt{}", sid);
        if mode.is_some() || over_text.is_some() {
            self.out.push(',');
            self.out.push_str(mode.map(|m| m.as_str()).unwrap_or(""));
        }
        if let Some(txt) = over_text {
            let _ = write!(self.out, ",{}", txt);
        }
        self.out.push(']');
    }

    fn add_speed_advisory(&mut self) {
        self.out.push_str("[vsa]");
    }

    fn add_slow_warning(&mut self, speed: i32, dist: i32, mode: Option<&str>) {
        let _ = write!(self.out, "[slow{},{}", speed, dist);
        if let Some(mode) = mode {
            let _ = write!(self.out, ",{}", mode);
        }
        self.out.push(']');
    }

    fn add_feed(&mut self, fid: &str) {
        let _ = write!(self.out, "[feed{}]", fid);
    }

    fn add_tolling(&mut self, mode: &str, zones: &[String]) {
        let zones: Vec<&str> = zones.iter().map(String::as_str).collect();
        self.list(&format!("tz{}", mode), &zones);
    }

    fn add_parking(&mut self, pid: &str, low_text: Option<&str>, closed_text: Option<&str>) {
        let _ = write!(self.out, "[pa{}", pid);
        if low_text.is_some() || closed_text.is_some() {
            let _ = write!(self.out, ",{}", low_text.unwrap_or(""));
        }
        if let Some(c) = closed_text {
            let _ = write!(self.out, ",{}", c);
        }
        self.out.push(']');
    }

    fn add_locator(&mut self, code: &str) {
        let _ = write!(self.out, "[loc{}]", code);
    }

    fn add_cap_time(&mut self, first: Option<&str>, active: Option<&str>, past: Option<&str>) {
        let mut parts = vec![first.unwrap_or(""), active.unwrap_or(""), past.unwrap_or("")];
        while parts.last().is_some_and(|p| p.is_empty()) {
            parts.pop();
        }
        self.list("captime", &parts);
    }

    fn add_cap_response(&mut self, rtypes: &[String]) {
        let items: Vec<&str> = rtypes.iter().map(String::as_str).collect();
        self.list("capresponse", &items);
    }

    fn add_cap_urgency(&mut self, uvals: &[String]) {
        let items: Vec<&str> = uvals.iter().map(String::as_str).collect();
        self.list("capurgency", &items);
    }

    fn unsupported_tag(&mut self, raw: &str) {
        self.out.push_str(raw);
    }
}
