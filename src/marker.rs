use crate::data::Capacity;

const FULL_TOKENS: [&str; 4] = ["〇", "○", "OK", "全"];
const PARTIAL_TOKENS: [&str; 4] = ["△", "▲", "半", "1"];
// students may also write how many lessons they can take
const STUDENT_COUNT_TOKENS: [&str; 3] = ["1", "2", "3"];
const UNAVAILABLE_TOKENS: [&str; 4] = ["×", "✕", "✖", "NG"];

/// A grid cell, classified once at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Full,
    Partial,
    Unavailable,
    Unrecognized,
}

fn contains_any(text: &str, tokens: &[&str]) -> bool {
    tokens.iter().any(|t| text.contains(t))
}

impl Marker {
    /// Classifies a teacher cell. Full tokens take precedence over partial ones.
    pub fn teacher(text: &str) -> Marker {
        if contains_any(text, &FULL_TOKENS) {
            Marker::Full
        } else if contains_any(text, &PARTIAL_TOKENS) {
            Marker::Partial
        } else if contains_any(text, &UNAVAILABLE_TOKENS) {
            Marker::Unavailable
        } else {
            Marker::Unrecognized
        }
    }

    /// Classifies a student cell; lesson counts 1–3 read as available.
    pub fn student(text: &str) -> Marker {
        if contains_any(text, &FULL_TOKENS) {
            Marker::Full
        } else if contains_any(text, &PARTIAL_TOKENS) || contains_any(text, &STUDENT_COUNT_TOKENS)
        {
            Marker::Partial
        } else if contains_any(text, &UNAVAILABLE_TOKENS) {
            Marker::Unavailable
        } else {
            Marker::Unrecognized
        }
    }

    pub fn capacity(self) -> Option<Capacity> {
        match self {
            Marker::Full => Some(Capacity::Full),
            Marker::Partial => Some(Capacity::Partial),
            Marker::Unavailable | Marker::Unrecognized => None,
        }
    }

    pub fn is_available(self) -> bool {
        matches!(self, Marker::Full | Marker::Partial)
    }
}
