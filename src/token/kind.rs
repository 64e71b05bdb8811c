// src/token/kind.rs

//! The closed catalog of token kinds and the per-kind policies consumers
//! consult: capability bit, single-line normalization, line splitting, and
//! anchor placement.

use serde::{Deserialize, Serialize};

use crate::config::TagSupport;

/// Every kind of token a message can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    ColorBackground,
    ColorForeground,
    Font,
    Graphic,
    JustificationLine,
    JustificationPage,
    NewLine,
    NewPage,
    PageTime,
    CharSpacing,
    TextRectangle,
    ColorRectangle,
    PageBackground,
    TravelTime,
    SpeedAdvisory,
    SlowWarning,
    FeedMsg,
    Tolling,
    ParkingAvail,
    IncidentLoc,
    CapTime,
    CapResponse,
    CapUrgency,
    TextChar,
    UnsupportedTag,
}

/// How a token contributes to `Message::lines`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinesCategory {
    Ignore,
    Include,
    LineBreak,
    PageBreak,
}

/// When the renderer places a zero-width anchor for a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorLoc {
    Before,
    None,
    After,
    /// After rendering, only if the token turned out blank.
    Conditional,
}

impl TokenKind {
    /// Bit number in the device's supported-tag mask. `None` for kinds that
    /// are not NTCIP tags.
    pub fn bit(&self) -> Option<u32> {
        use TokenKind::*;
        match self {
            ColorBackground => Some(0),
            ColorForeground => Some(1),
            Font => Some(3),
            Graphic => Some(4),
            JustificationLine => Some(6),
            JustificationPage => Some(7),
            NewLine => Some(10),
            NewPage => Some(11),
            PageTime => Some(12),
            CharSpacing => Some(13),
            TextRectangle => Some(27),
            ColorRectangle => Some(28),
            PageBackground => Some(29),
            _ => None,
        }
    }

    /// True if a device with capability set `tags` accepts this kind.
    pub fn supported_by(&self, tags: TagSupport) -> bool {
        match (self, self.bit()) {
            (TokenKind::UnsupportedTag, _) => false,
            (_, Some(bit)) => tags.has_bit(bit),
            (_, None) => true,
        }
    }

    pub fn label(&self) -> &'static str {
        use TokenKind::*;
        match self {
            ColorBackground => "Message background color (deprecated)",
            ColorForeground => "Foreground color",
            Font => "Font",
            Graphic => "Graphic",
            JustificationLine => "Line justification",
            JustificationPage => "Page justification",
            NewLine => "New line",
            NewPage => "New page",
            PageTime => "Page timing",
            CharSpacing => "Character spacing",
            TextRectangle => "Text rectangle",
            ColorRectangle => "Color rectangle",
            PageBackground => "Page background color",
            TravelTime => "Travel Time",
            SpeedAdvisory => "Speed Advisory",
            SlowWarning => "Slow Warning",
            FeedMsg => "Feed Message",
            Tolling => "Tolling",
            ParkingAvail => "Parking Availability",
            IncidentLoc => "Incident Locator",
            CapTime => "CAP Time",
            CapResponse => "CAP Response Type",
            CapUrgency => "CAP Urgency",
            TextChar => "Text Character",
            UnsupportedTag => "Unsupported Tag",
        }
    }

    /// IRIS action tags, rendered as placeholder boxes.
    pub fn is_iris(&self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            TravelTime
                | SpeedAdvisory
                | SlowWarning
                | FeedMsg
                | Tolling
                | ParkingAvail
                | IncidentLoc
                | CapTime
                | CapResponse
                | CapUrgency
        )
    }

    pub fn is_tag(&self) -> bool {
        *self != TokenKind::TextChar
    }

    /// Text and color rectangles.
    pub fn is_rect(&self) -> bool {
        matches!(self, TokenKind::TextRectangle | TokenKind::ColorRectangle)
    }

    /// Kept by `Message::normalize_line`.
    pub fn is_normalize_line(&self) -> bool {
        use TokenKind::*;
        match self {
            TextChar | JustificationLine | Font | CharSpacing | ColorForeground
            | ColorBackground => true,
            k => k.is_iris(),
        }
    }

    /// Kept by `Message::normalize_line2`. Differs from `is_normalize_line`
    /// only for fonts.
    pub fn is_normalize_line2(&self) -> bool {
        match self {
            TokenKind::Font => false,
            k => k.is_normalize_line(),
        }
    }

    pub fn lines_category(&self) -> LinesCategory {
        use TokenKind::*;
        match self {
            NewLine => LinesCategory::LineBreak,
            NewPage => LinesCategory::PageBreak,
            TextChar | Font | JustificationLine | CharSpacing | ColorForeground => {
                LinesCategory::Include
            }
            k if k.is_iris() => LinesCategory::Include,
            _ => LinesCategory::Ignore,
        }
    }

    pub fn anchor_loc(&self) -> AnchorLoc {
        use TokenKind::*;
        match self {
            TextChar | Graphic | ColorRectangle | TextRectangle => AnchorLoc::None,
            NewLine => AnchorLoc::Before,
            k if k.is_iris() => AnchorLoc::Conditional,
            _ => AnchorLoc::After,
        }
    }
}
