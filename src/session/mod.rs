//! Practice session lifecycle.
//!
//! A session owns its capture state: the audio producer thread, the
//! recognizer and the transcript channel. Nothing is analysed until the
//! session is stopped; a cancelled session leaves no trace.

pub mod producer;

use crate::analysis::metrics::{SessionAnalyzer, SessionInput, SessionReport};
use crate::analysis::scoring::ScoringConfig;
use crate::assessment::{Prompt, SkillType};
use crate::audio::recorder::AudioSource;
use crate::audio::vad::{Clock, SystemClock};
use crate::audio::wav::WavRecorder;
use crate::defaults;
use crate::error::{FluentError, Result};
use crate::speech::recognizer::{Recognizer, TranscriptUpdate};
use crate::speech::transcript::TranscriptBuffer;
use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use producer::{AudioProducer, ProducerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Tunables for one session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub frame_samples: usize,
    pub silence_threshold: f32,
    pub max_session_secs: u64,
    pub finalize_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub min_pause_secs: f64,
    pub scoring: ScoringConfig,
    /// Stream the captured audio to this WAV file.
    pub record_to: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frame_samples: defaults::FRAME_SAMPLES,
            silence_threshold: defaults::SILENCE_THRESHOLD,
            max_session_secs: defaults::MAX_SESSION_SECS,
            finalize_timeout_ms: defaults::FINALIZE_TIMEOUT_MS,
            poll_interval_ms: defaults::POLL_INTERVAL_MS,
            min_pause_secs: defaults::MIN_PAUSE_SECS,
            scoring: ScoringConfig::default(),
            record_to: None,
        }
    }
}

/// Result of a stopped session.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub report: SessionReport,
    /// Saved WAV recording, when one was requested and written.
    pub recording: Option<PathBuf>,
}

/// The single active practice session.
pub struct Session {
    skill: SkillType,
    prompt: Prompt,
    config: SessionConfig,
    clock: Arc<dyn Clock>,
    started_at: Instant,
    producer: AudioProducer,
    recognizer: Box<dyn Recognizer>,
    updates: Option<Receiver<TranscriptUpdate>>,
    transcript: TranscriptBuffer,
}

impl Session {
    /// Start capture and recognition for `prompt`.
    ///
    /// # Errors
    /// `DeviceUnavailable` when the audio source cannot start; the session
    /// never begins. A recognizer that fails to start is logged and the
    /// session continues without a transcript.
    pub fn start(
        skill: SkillType,
        prompt: Prompt,
        source: Box<dyn AudioSource>,
        recognizer: Box<dyn Recognizer>,
        config: SessionConfig,
    ) -> Result<Self> {
        Self::start_with_clock(
            skill,
            prompt,
            source,
            recognizer,
            config,
            Arc::new(SystemClock),
        )
    }

    pub fn start_with_clock(
        skill: SkillType,
        prompt: Prompt,
        source: Box<dyn AudioSource>,
        mut recognizer: Box<dyn Recognizer>,
        config: SessionConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let recorder = match &config.record_to {
            Some(path) => Some(WavRecorder::create(path, source.sample_rate())?),
            None => None,
        };

        let producer = AudioProducer::spawn(
            source,
            ProducerConfig {
                frame_samples: config.frame_samples,
                silence_threshold: config.silence_threshold,
                max_session_secs: config.max_session_secs,
                poll_interval_ms: config.poll_interval_ms,
            },
            recorder,
        )
        .inspect_err(|_| {
            // The recorder already created its file; a session that never ran keeps nothing.
            if let Some(path) = &config.record_to
                && let Err(e) = std::fs::remove_file(path)
            {
                tracing::debug!("could not remove {}: {}", path.display(), e);
            }
        })?;
        let started_at = clock.now();

        let (tx, rx) = crossbeam_channel::unbounded();
        let updates = match recognizer.start(tx) {
            Ok(()) => Some(rx),
            Err(e @ FluentError::RecognitionUnavailable { .. }) => {
                tracing::warn!("{}; continuing without a transcript", e);
                None
            }
            Err(e) => {
                tracing::warn!(
                    recognizer = recognizer.name(),
                    "recognizer failed to start: {}; continuing without a transcript",
                    e
                );
                None
            }
        };

        tracing::debug!(
            skill = %skill,
            recognizer = recognizer.name(),
            "session started"
        );

        Ok(Self {
            skill,
            prompt,
            config,
            clock,
            started_at,
            producer,
            recognizer,
            updates,
            transcript: TranscriptBuffer::new(),
        })
    }

    pub fn skill(&self) -> SkillType {
        self.skill
    }

    pub fn prompt(&self) -> &Prompt {
        &self.prompt
    }

    /// Wall time since start.
    pub fn elapsed(&self) -> Duration {
        self.clock.now().saturating_duration_since(self.started_at)
    }

    /// True while the audio producer is still running.
    pub fn is_capturing(&self) -> bool {
        self.producer.is_capturing()
    }

    /// Block until a finite source runs dry or `timeout` passes. Returns
    /// true if capture finished on its own.
    pub fn wait_for_source(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let poll = Duration::from_millis(self.config.poll_interval_ms.max(1));
        while self.is_capturing() {
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(poll);
        }
        true
    }

    /// False when the recognizer could not start.
    pub fn has_recognition(&self) -> bool {
        self.updates.is_some()
    }

    /// Apply pending transcript updates without blocking and return the live
    /// transcript text.
    pub fn poll_transcript(&mut self) -> String {
        if let Some(rx) = &self.updates {
            loop {
                match rx.try_recv() {
                    Ok(update) => self.transcript.apply(update),
                    Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
                }
            }
        }
        self.transcript.display_text()
    }

    /// Stop both producers, finalize the transcript and analyse the session.
    ///
    /// Order: audio first (the device is released before this touches the
    /// recognizer), then recognizer finalization, then a bounded drain of the
    /// transcript channel.
    pub fn stop(mut self) -> Result<SessionOutcome> {
        let wall = self.elapsed();
        let capture = self.producer.stop()?;

        if let Err(e) = self.recognizer.stop() {
            tracing::warn!("recognizer failed to stop cleanly: {}", e);
        }

        let transcript = match self.updates.take() {
            Some(rx) => {
                drain(
                    &rx,
                    &mut self.transcript,
                    Duration::from_millis(self.config.finalize_timeout_ms),
                );
                Some(self.transcript.snapshot())
            }
            None => None,
        };

        // File-backed sources replay faster than real time; their own
        // timeline is the session length.
        let duration_seconds = if capture.exhausted {
            capture.audio_seconds
        } else {
            wall.as_secs_f64()
        };

        let frames_dropped = capture.history.dropped();
        let frames = capture.history.into_vec();
        let analyzer = SessionAnalyzer::new(self.config.min_pause_secs, self.config.scoring);
        let report = analyzer.analyze(SessionInput {
            skill: self.skill,
            prompt: &self.prompt,
            frames: &frames,
            duration_seconds,
            transcript: transcript.as_deref(),
            frames_dropped,
        });

        Ok(SessionOutcome {
            report,
            recording: capture.recording,
        })
    }

    /// Abandon the session: both producers stop, buffers and any partial
    /// recording are discarded.
    pub fn cancel(mut self) {
        match self.producer.stop() {
            Ok(capture) => {
                if let Some(path) = capture.recording
                    && let Err(e) = std::fs::remove_file(&path)
                {
                    tracing::debug!("could not remove {}: {}", path.display(), e);
                }
            }
            Err(e) => tracing::warn!("{}", e),
        }
        if let Err(e) = self.recognizer.stop() {
            tracing::debug!("recognizer stop during cancel failed: {}", e);
        }
        self.updates = None;
        tracing::debug!(skill = %self.skill, "session cancelled");
    }
}

/// Apply updates until the channel disconnects or `timeout` elapses.
fn drain(rx: &Receiver<TranscriptUpdate>, buffer: &mut TranscriptBuffer, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    loop {
        match rx.recv_deadline(deadline) {
            Ok(update) => buffer.apply(update),
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                tracing::debug!(
                    timeout_ms = timeout.as_millis() as u64,
                    "recognizer did not finalize in time; using partial transcript"
                );
                break;
            }
        }
    }
}
