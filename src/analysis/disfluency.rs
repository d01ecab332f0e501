//! Stutter-like event detection over a transcript.
//!
//! Works on adjacent tokens only. Flags repeated words ("the the"), short
//! false starts ("b ball") and doubled initial letters ("ssnake") following
//! a token with the same initial.

use serde::Serialize;
use std::fmt;

/// Lowercases `text`, blanks out punctuation and splits on whitespace.
///
/// Letters, digits, `_` and `'` survive; every other non-space character
/// becomes a separator.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '\'' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().map(str::to_owned).collect()
}

/// Whitespace word count, as shown to the user.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisfluencyKind {
    Repetition,
    PrefixRepeat,
    Prolongation,
}

impl fmt::Display for DisfluencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Repetition => "repetition",
            Self::PrefixRepeat => "prefix repeat",
            Self::Prolongation => "prolongation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisfluencyEvent {
    pub kind: DisfluencyKind,
    /// Index of the offending token in the tokenized transcript.
    pub token_index: usize,
    pub token: String,
}

/// Scans a transcript for disfluency events.
///
/// A non-repetition token can raise both a prefix repeat and a prolongation.
pub fn detect(transcript: &str) -> Vec<DisfluencyEvent> {
    detect_tokens(&tokenize(transcript))
}

/// Same as [`detect`] on an already tokenized transcript.
pub fn detect_tokens(tokens: &[String]) -> Vec<DisfluencyEvent> {
    let mut events = Vec::new();

    for i in 1..tokens.len() {
        let current = &tokens[i];
        let previous = &tokens[i - 1];

        if current == previous {
            events.push(event(DisfluencyKind::Repetition, i, current));
            continue;
        }

        if previous.chars().count() <= 2 && current.starts_with(previous.as_str()) {
            events.push(event(DisfluencyKind::PrefixRepeat, i, current));
        }

        if i >= 2 && is_prolongation(current, &tokens[i - 2]) {
            events.push(event(DisfluencyKind::Prolongation, i, current));
        }
    }

    events
}

/// `token` has at least 3 chars, a doubled first char, and shares that first
/// char with `two_back`.
fn is_prolongation(token: &str, two_back: &str) -> bool {
    if token.chars().count() < 3 {
        return false;
    }
    let mut chars = token.chars();
    let (Some(first), Some(second)) = (chars.next(), chars.next()) else {
        return false;
    };
    first == second && two_back.chars().next() == Some(first)
}

fn event(kind: DisfluencyKind, token_index: usize, token: &str) -> DisfluencyEvent {
    DisfluencyEvent {
        kind,
        token_index,
        token: token.to_string(),
    }
}
