//! Live transcript assembled from recognizer updates.

use crate::speech::recognizer::TranscriptUpdate;

/// Accumulates recognition updates for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptBuffer {
    finals: Vec<String>,
    interim: String,
    updates: usize,
}

impl TranscriptBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, update: TranscriptUpdate) {
        self.updates += 1;
        if update.is_final {
            let text = update.text.trim();
            if !text.is_empty() {
                self.finals.push(text.to_string());
            }
            self.interim.clear();
        } else {
            self.interim = update.text;
        }
    }

    /// Live view: finals followed by the pending interim.
    pub fn display_text(&self) -> String {
        let mut text = self.finals.join(" ");
        let interim = self.interim.trim();
        if !interim.is_empty() {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(interim);
        }
        text
    }

    /// Text analysed after stop: the concatenated finals, or the latest
    /// interim when no final ever arrived.
    pub fn snapshot(&self) -> String {
        if self.finals.is_empty() {
            self.interim.trim().to_string()
        } else {
            self.finals.join(" ")
        }
    }

    /// Number of updates applied, interim ones included.
    pub fn update_count(&self) -> usize {
        self.updates
    }

    pub fn has_final(&self) -> bool {
        !self.finals.is_empty()
    }
}
