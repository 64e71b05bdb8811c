// src/multi/mod.rs

//! MULTI markup: shared value types, the `MultiSink` callback interface, the
//! lexer that drives a sink from text, the parser sink that builds a
//! `Message`, and the builder sink that writes canonical markup.

mod builder;
mod lexer;
mod parser;

use serde::{Deserialize, Serialize};

pub use builder::MultiBuilder;
pub use lexer::parse;
pub use parser::MessageBuilder;

/// Line justification. Ordinals match `[jlN]` tag values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JustificationLine {
    Undefined,
    Other,
    Left,
    Center,
    Right,
    Full,
}

impl JustificationLine {
    pub fn from_ordinal(n: i32) -> Option<Self> {
        match n {
            0 => Some(JustificationLine::Undefined),
            1 => Some(JustificationLine::Other),
            2 => Some(JustificationLine::Left),
            3 => Some(JustificationLine::Center),
            4 => Some(JustificationLine::Right),
            5 => Some(JustificationLine::Full),
            _ => None,
        }
    }

    pub fn ordinal(&self) -> i32 {
        *self as i32
    }
}

/// Page justification. Ordinals match `[jpN]` tag values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JustificationPage {
    Undefined,
    Other,
    Top,
    Middle,
    Bottom,
}

impl JustificationPage {
    pub fn from_ordinal(n: i32) -> Option<Self> {
        match n {
            0 => Some(JustificationPage::Undefined),
            1 => Some(JustificationPage::Other),
            2 => Some(JustificationPage::Top),
            3 => Some(JustificationPage::Middle),
            4 => Some(JustificationPage::Bottom),
            _ => None,
        }
    }

    pub fn ordinal(&self) -> i32 {
        *self as i32
    }
}

/// Travel time over-limit handling for `[tt]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverLimitMode {
    Blank,
    Prepend,
    Append,
}

impl OverLimitMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "blank" => Some(OverLimitMode::Blank),
            "prepend" => Some(OverLimitMode::Prepend),
            "append" => Some(OverLimitMode::Append),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OverLimitMode::Blank => "blank",
            OverLimitMode::Prepend => "prepend",
            OverLimitMode::Append => "append",
        }
    }
}

/// Color parameter of `[cf]`, `[pb]` and `[cr]`: a single value (classic
/// index or intensity, depending on the scheme) or an RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorTag {
    Single(i32),
    Rgb(i32, i32, i32),
}

impl ColorTag {
    /// Builds a color from 1 or 3 values.
    pub fn from_values(v: &[i32]) -> Option<Self> {
        match *v {
            [n] => Some(ColorTag::Single(n)),
            [r, g, b] => Some(ColorTag::Rgb(r, g, b)),
            _ => None,
        }
    }

    /// The tag value as handed to raster conversion.
    pub fn tagval(&self) -> Vec<i32> {
        match *self {
            ColorTag::Single(n) => vec![n],
            ColorTag::Rgb(r, g, b) => vec![r, g, b],
        }
    }
}

impl std::fmt::Display for ColorTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorTag::Single(n) => write!(f, "{}", n),
            ColorTag::Rgb(r, g, b) => write!(f, "{},{},{}", r, g, b),
        }
    }
}

/// Consumer of MULTI content, one method per tag kind.
///
/// The lexer drives a sink from markup text; tokens and messages drive a
/// sink to export themselves. Numeric parameters are passed through as
/// written; range checks belong to the consumer.
pub trait MultiSink {
    /// Literal text (unescaped).
    fn add_span(&mut self, span: &str);
    /// `[cb]` / `[cbN]` (deprecated message background).
    fn set_color_background(&mut self, color: Option<i32>);
    /// `[pb]` / `[pbN]` / `[pbR,G,B]`.
    fn set_page_background(&mut self, color: Option<ColorTag>);
    /// `[cf]` / `[cfN]` / `[cfR,G,B]`.
    fn set_color_foreground(&mut self, color: Option<ColorTag>);
    /// `[crX,Y,W,H,N]` / `[crX,Y,W,H,R,G,B]`.
    fn add_color_rectangle(&mut self, x: i32, y: i32, w: i32, h: i32, color: ColorTag);
    /// `[fo]` / `[foN]` / `[foN,id]`.
    fn set_font(&mut self, num: Option<i32>, id: Option<&str>);
    /// `[gN]` / `[gN,X,Y]` / `[gN,X,Y,id]`.
    fn add_graphic(&mut self, num: i32, x: Option<i32>, y: Option<i32>, id: Option<&str>);
    /// `[jl]` / `[jlN]`.
    fn set_justification_line(&mut self, jl: Option<i32>);
    /// `[jp]` / `[jpN]`.
    fn set_justification_page(&mut self, jp: Option<i32>);
    /// `[nl]` / `[nlN]`.
    fn add_line(&mut self, spacing: Option<i32>);
    /// `[np]`.
    fn add_page(&mut self);
    /// `[ptNoM]` with either part optional.
    fn set_page_times(&mut self, on: Option<i32>, off: Option<i32>);
    /// `[scN]`, or `[/sc]` when `None`.
    fn set_char_spacing(&mut self, sc: Option<i32>);
    /// `[trX,Y,W,H]`.
    fn set_text_rectangle(&mut self, x: i32, y: i32, w: i32, h: i32);
    fn add_travel_time(&mut self, sid: &str, mode: Option<OverLimitMode>, over_text: Option<&str>);
    fn add_speed_advisory(&mut self);
    fn add_slow_warning(&mut self, speed: i32, dist: i32, mode: Option<&str>);
    fn add_feed(&mut self, fid: &str);
    fn add_tolling(&mut self, mode: &str, zones: &[String]);
    fn add_parking(&mut self, pid: &str, low_text: Option<&str>, closed_text: Option<&str>);
    fn add_locator(&mut self, code: &str);
    fn add_cap_time(&mut self, first: Option<&str>, active: Option<&str>, past: Option<&str>);
    fn add_cap_response(&mut self, rtypes: &[String]);
    fn add_cap_urgency(&mut self, uvals: &[String]);
    /// Anything that looks like a tag but is not recognized, passed verbatim
    /// including its brackets.
    fn unsupported_tag(&mut self, raw: &str);
}

#[cfg(test)]
mod tests;
