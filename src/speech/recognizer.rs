//! Speech recognition collaborator.
//!
//! The recognition engine is external. A [`Recognizer`] pushes
//! [`TranscriptUpdate`]s into the session's channel while capture runs and
//! finalizes when asked to stop. Dropping its sender tells the session no more
//! updates will come.

use crate::error::{FluentError, Result};
use crossbeam_channel::Sender;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// One recognition delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptUpdate {
    pub text: String,
    /// Final results are appended; interim results replace the previous interim.
    pub is_final: bool,
}

impl TranscriptUpdate {
    pub fn interim(text: &str) -> Self {
        Self {
            text: text.to_string(),
            is_final: false,
        }
    }

    pub fn final_result(text: &str) -> Self {
        Self {
            text: text.to_string(),
            is_final: true,
        }
    }
}

/// Trait for speech recognizers.
///
/// Allows swapping the engine-backed implementation for a fixed transcript or
/// a mock.
pub trait Recognizer: Send {
    /// Begin recognition, sending updates to `updates`.
    ///
    /// # Errors
    /// `FluentError::RecognitionUnavailable` when no engine can be reached.
    /// The session keeps capturing audio without a transcript.
    fn start(&mut self, updates: Sender<TranscriptUpdate>) -> Result<()>;

    /// Request finalization. Pending results may still be delivered after
    /// this returns; the sender is released once they are.
    fn stop(&mut self) -> Result<()>;

    fn name(&self) -> &str;
}

impl Recognizer for Box<dyn Recognizer> {
    fn start(&mut self, updates: Sender<TranscriptUpdate>) -> Result<()> {
        (**self).start(updates)
    }

    fn stop(&mut self) -> Result<()> {
        (**self).stop()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Send an update, ignoring a session that has already stopped listening.
fn deliver(updates: &Sender<TranscriptUpdate>, update: TranscriptUpdate) {
    if updates.send(update).is_err() {
        tracing::debug!("transcript receiver gone, update dropped");
    }
}

/// Recognizer that reports a transcript known in advance.
///
/// Used by the terminal front end with `--transcript`/`--transcript-file`,
/// where recognition happens outside this program. The text is delivered as a
/// single final result on stop.
#[derive(Debug, Clone)]
pub struct StaticRecognizer {
    text: String,
    updates: Option<Sender<TranscriptUpdate>>,
}

impl StaticRecognizer {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.trim().to_string(),
            updates: None,
        }
    }

    /// Reads the transcript from a text file.
    ///
    /// # Errors
    /// `RecognitionUnavailable` when the file cannot be read.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            FluentError::RecognitionUnavailable {
                message: format!("cannot read transcript {}: {}", path.display(), e),
            }
        })?;
        Ok(Self::new(&text))
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Recognizer for StaticRecognizer {
    fn start(&mut self, updates: Sender<TranscriptUpdate>) -> Result<()> {
        self.updates = Some(updates);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(updates) = self.updates.take() {
            deliver(&updates, TranscriptUpdate::final_result(&self.text));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Recognizer standing in for a missing engine: start always fails.
#[derive(Debug, Clone, Default)]
pub struct UnavailableRecognizer {
    reason: String,
}

impl UnavailableRecognizer {
    pub fn new(reason: &str) -> Self {
        Self {
            reason: reason.to_string(),
        }
    }
}

impl Recognizer for UnavailableRecognizer {
    fn start(&mut self, _updates: Sender<TranscriptUpdate>) -> Result<()> {
        Err(FluentError::RecognitionUnavailable {
            message: self.reason.clone(),
        })
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

/// Mock recognizer for testing.
///
/// Sends the configured `on_start` updates as soon as it starts and the
/// `on_stop` updates when stopped, then releases the channel unless told to
/// hold it open.
#[derive(Debug, Clone)]
pub struct MockRecognizer {
    on_start: Vec<TranscriptUpdate>,
    on_stop: Vec<TranscriptUpdate>,
    updates: Option<Sender<TranscriptUpdate>>,
    held: Vec<Sender<TranscriptUpdate>>,
    hold_open: bool,
    should_fail_start: bool,
    starts: Arc<AtomicUsize>,
    stopped: Arc<AtomicBool>,
}

impl MockRecognizer {
    pub fn new() -> Self {
        Self {
            on_start: Vec::new(),
            on_stop: Vec::new(),
            updates: None,
            held: Vec::new(),
            hold_open: false,
            should_fail_start: false,
            starts: Arc::new(AtomicUsize::new(0)),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Queue an interim result sent right after start
    pub fn with_interim(mut self, text: &str) -> Self {
        self.on_start.push(TranscriptUpdate::interim(text));
        self
    }

    /// Queue a final result sent right after start
    pub fn with_final(mut self, text: &str) -> Self {
        self.on_start.push(TranscriptUpdate::final_result(text));
        self
    }

    /// Queue a final result sent while finalizing
    pub fn with_final_on_stop(mut self, text: &str) -> Self {
        self.on_stop.push(TranscriptUpdate::final_result(text));
        self
    }

    /// Keep the channel open after stop, as an engine that never finalizes
    pub fn with_hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    /// Configure the mock to fail on start
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    /// Number of successful starts, observable after the mock was moved.
    pub fn start_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.starts)
    }

    /// Flag set once `stop` was called.
    pub fn stopped_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stopped)
    }
}

impl Default for MockRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Recognizer for MockRecognizer {
    fn start(&mut self, updates: Sender<TranscriptUpdate>) -> Result<()> {
        if self.should_fail_start {
            return Err(FluentError::RecognitionUnavailable {
                message: "mock recognizer unavailable".to_string(),
            });
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.stopped.store(false, Ordering::SeqCst);
        for update in &self.on_start {
            deliver(&updates, update.clone());
        }
        self.updates = Some(updates);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.stopped.store(true, Ordering::SeqCst);
        if let Some(updates) = self.updates.take() {
            for update in &self.on_stop {
                deliver(&updates, update.clone());
            }
            if self.hold_open {
                self.held.push(updates);
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_static_recognizer_sends_final_on_stop() {
        let (tx, rx) = unbounded();
        let mut recognizer = StaticRecognizer::new("  hello there \n");

        recognizer.start(tx).unwrap();
        assert!(rx.try_recv().is_err());

        recognizer.stop().unwrap();
        assert_eq!(
            rx.recv().unwrap(),
            TranscriptUpdate::final_result("hello there")
        );
        // Sender released after finalization
        assert!(rx.recv().is_err());
    }

    #[test]
    fn test_static_recognizer_stop_without_start() {
        let mut recognizer = StaticRecognizer::new("text");
        assert!(recognizer.stop().is_ok());
    }

    #[test]
    fn test_static_recognizer_from_missing_file() {
        let result = StaticRecognizer::from_file(Path::new("/nonexistent/transcript.txt"));
        assert!(matches!(
            result,
            Err(FluentError::RecognitionUnavailable { .. })
        ));
    }

    #[test]
    fn test_static_recognizer_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.txt");
        std::fs::write(&path, "one two three\n").unwrap();
        let recognizer = StaticRecognizer::from_file(&path).unwrap();
        assert_eq!(recognizer.text(), "one two three");
    }

    #[test]
    fn test_unavailable_recognizer_fails_start() {
        let (tx, _rx) = unbounded();
        let mut recognizer = UnavailableRecognizer::new("no engine configured");
        match recognizer.start(tx) {
            Err(FluentError::RecognitionUnavailable { message }) => {
                assert_eq!(message, "no engine configured");
            }
            other => panic!("Expected RecognitionUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_mock_recognizer_script() {
        let (tx, rx) = unbounded();
        let mut recognizer = MockRecognizer::new()
            .with_interim("hel")
            .with_final("hello")
            .with_final_on_stop("world");
        let stopped = recognizer.stopped_flag();

        recognizer.start(tx).unwrap();
        assert_eq!(rx.recv().unwrap(), TranscriptUpdate::interim("hel"));
        assert_eq!(rx.recv().unwrap(), TranscriptUpdate::final_result("hello"));

        recognizer.stop().unwrap();
        assert!(stopped.load(Ordering::SeqCst));
        assert_eq!(rx.recv().unwrap(), TranscriptUpdate::final_result("world"));
        assert!(rx.recv().is_err());
    }

    #[test]
    fn test_mock_recognizer_hold_open_keeps_channel() {
        let (tx, rx) = unbounded();
        let mut recognizer = MockRecognizer::new().with_hold_open();
        recognizer.start(tx).unwrap();
        recognizer.stop().unwrap();
        assert!(matches!(
            rx.try_recv(),
            Err(crossbeam_channel::TryRecvError::Empty)
        ));
    }

    #[test]
    fn test_mock_recognizer_closed_receiver_is_not_an_error() {
        let (tx, rx) = unbounded();
        drop(rx);
        let mut recognizer = MockRecognizer::new().with_final("late");
        assert!(recognizer.start(tx).is_ok());
        assert!(recognizer.stop().is_ok());
    }

    #[test]
    fn test_mock_recognizer_restart_counts() {
        let mut recognizer = MockRecognizer::new();
        let starts = recognizer.start_counter();
        for _ in 0..2 {
            let (tx, _rx) = unbounded();
            recognizer.start(tx).unwrap();
            recognizer.stop().unwrap();
        }
        assert_eq!(starts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_recognizer_trait_is_object_safe() {
        let mut recognizer: Box<dyn Recognizer> = Box::new(StaticRecognizer::new("x"));
        let (tx, rx) = unbounded();
        recognizer.start(tx).unwrap();
        recognizer.stop().unwrap();
        assert_eq!(recognizer.name(), "static");
        assert_eq!(rx.recv().unwrap().text, "x");
    }
}
