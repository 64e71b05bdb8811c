// src/error.rs

//! Render diagnostics.
//!
//! Every problem found while rendering a message is one of the closed
//! `SyntaxError` kinds. Errors are recorded on the offending token and, when
//! the caller supplies one, collected by an `ErrorManager`. Neither affects
//! the pixels produced by a render pass.

use log::debug;
use serde::{Deserialize, Serialize};

/// Closed taxonomy of recoverable markup/render errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyntaxError {
    UnsupportedTag,
    UnsupportedTagValue,
    TagConflict,
    FontNotDefined,
    CharacterNotDefined,
    GraphicNotDefined,
    TextTooBig,
    Other,
}

impl SyntaxError {
    /// Short machine-readable key.
    pub fn key(&self) -> &'static str {
        match self {
            SyntaxError::UnsupportedTag => "unsupportedTag",
            SyntaxError::UnsupportedTagValue => "unsupportedTagValue",
            SyntaxError::TagConflict => "tagConflict",
            SyntaxError::FontNotDefined => "fontNotDefined",
            SyntaxError::CharacterNotDefined => "characterNotDefined",
            SyntaxError::GraphicNotDefined => "graphicNotDefined",
            SyntaxError::TextTooBig => "textTooBig",
            SyntaxError::Other => "other",
        }
    }

    /// Best-effort human description.
    pub fn description(&self) -> &'static str {
        match self {
            SyntaxError::UnsupportedTag => "Tag is not supported by this sign",
            SyntaxError::UnsupportedTagValue => "Tag value is out of range for this sign",
            SyntaxError::TagConflict => "Tag conflicts with an earlier tag",
            SyntaxError::FontNotDefined => "Font is not defined",
            SyntaxError::CharacterNotDefined => "Character is not defined in the font",
            SyntaxError::GraphicNotDefined => "Graphic is not defined",
            SyntaxError::TextTooBig => "Text does not fit in the text rectangle",
            SyntaxError::Other => "Other error",
        }
    }
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.key(), self.description())
    }
}

impl std::error::Error for SyntaxError {}

/// Position of a token inside a message (1-based page, 0-based token index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenLocation {
    pub page: usize,
    pub index: usize,
}

/// One collected diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub kind: SyntaxError,
    /// Canonical markup of the offending token, if any.
    pub token: Option<String>,
    pub location: Option<TokenLocation>,
}

impl std::fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.token, self.location) {
            (Some(tok), Some(loc)) => write!(
                f,
                "{} (page {}, token {}: '{}')",
                self.kind, loc.page, loc.index, tok
            ),
            (Some(tok), None) => write!(f, "{} ('{}')", self.kind, tok),
            _ => write!(f, "{}", self.kind),
        }
    }
}

/// Aggregates diagnostics across one or more render passes.
#[derive(Debug, Clone, Default)]
pub struct ErrorManager {
    records: Vec<ErrorRecord>,
}

impl ErrorManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, record: ErrorRecord) {
        debug!("ErrorManager: {}", record);
        self.records.push(record);
    }

    pub fn records(&self) -> &[ErrorRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Number of records of one kind.
    pub fn count(&self, kind: SyntaxError) -> usize {
        self.records.iter().filter(|r| r.kind == kind).count()
    }

    pub fn contains(&self, kind: SyntaxError) -> bool {
        self.records.iter().any(|r| r.kind == kind)
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_keys_are_stable() {
        assert_eq!(SyntaxError::TextTooBig.key(), "textTooBig");
        assert_eq!(SyntaxError::UnsupportedTagValue.to_string(),
            "unsupportedTagValue: Tag value is out of range for this sign");
    }

    #[test]
    fn test_manager_counts() {
        let mut em = ErrorManager::new();
        assert!(em.is_empty());
        em.add(ErrorRecord { kind: SyntaxError::TagConflict, token: None, location: None });
        em.add(ErrorRecord {
            kind: SyntaxError::FontNotDefined,
            token: Some("[fo7]".to_string()),
            location: Some(TokenLocation { page: 1, index: 0 }),
        });
        em.add(ErrorRecord { kind: SyntaxError::TagConflict, token: None, location: None });
        assert_eq!(em.len(), 3);
        assert_eq!(em.count(SyntaxError::TagConflict), 2);
        assert!(em.contains(SyntaxError::FontNotDefined));
        assert!(!em.contains(SyntaxError::Other));
        assert_eq!(
            em.records()[1].to_string(),
            "fontNotDefined: Font is not defined (page 1, token 0: '[fo7]')"
        );
        em.clear();
        assert!(em.is_empty());
    }
}
