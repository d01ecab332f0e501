//! Voice Activity Detection (VAD) module.
//!
//! Classifies fixed-size sample buffers as voiced or unvoiced using a plain
//! RMS energy threshold. Runs on every captured buffer, so it does no
//! allocation and is linear in the buffer length.

use crate::audio::frame::AudioFrame;
use crate::defaults;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Trait for time operations, allowing mock time in tests.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// Real system clock using `std::time::Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Mock clock for testing that allows manual time advancement.
#[derive(Debug, Clone)]
pub struct MockClock {
    current: Arc<Mutex<Instant>>,
}

impl MockClock {
    /// Creates a new mock clock starting at the current instant.
    pub fn new() -> Self {
        Self {
            current: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Advances the mock clock by the given duration.
    pub fn advance(&self, duration: Duration) {
        if let Ok(mut current) = self.current.lock() {
            *current += duration;
        }
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.current
            .lock()
            .map(|current| *current)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }
}

/// Configuration for frame classification.
#[derive(Debug, Clone, Copy)]
pub struct FrameClassifierConfig {
    /// RMS threshold for voiced frames (0.0 to 1.0, inclusive).
    pub silence_threshold: f32,
    /// Sample rate in Hz, used to derive frame times and durations.
    pub sample_rate: u32,
}

impl Default for FrameClassifierConfig {
    fn default() -> Self {
        Self {
            silence_threshold: defaults::SILENCE_THRESHOLD,
            sample_rate: defaults::SAMPLE_RATE,
        }
    }
}

/// Energy-threshold frame classifier.
///
/// Tracks how many samples it has seen so each frame is stamped with its
/// position on the session timeline.
#[derive(Debug, Clone)]
pub struct FrameClassifier {
    config: FrameClassifierConfig,
    samples_seen: u64,
}

impl FrameClassifier {
    pub fn new(config: FrameClassifierConfig) -> Self {
        Self {
            config,
            samples_seen: 0,
        }
    }

    /// Classifies the next buffer on the session timeline.
    pub fn classify(&mut self, samples: &[i16]) -> AudioFrame {
        let frame = self.classify_at(samples, self.elapsed_seconds());
        self.samples_seen += samples.len() as u64;
        frame
    }

    /// Classifies a buffer with an explicit start time.
    pub fn classify_at(&self, samples: &[i16], time_seconds: f64) -> AudioFrame {
        let energy = calculate_rms(samples);
        AudioFrame {
            time_seconds,
            duration_seconds: self.samples_to_seconds(samples.len() as u64),
            energy,
            voiced: energy >= self.config.silence_threshold,
        }
    }

    /// Session time covered so far, in seconds.
    pub fn elapsed_seconds(&self) -> f64 {
        self.samples_to_seconds(self.samples_seen)
    }

    fn samples_to_seconds(&self, samples: u64) -> f64 {
        samples as f64 / f64::from(self.config.sample_rate.max(1))
    }

    pub fn threshold(&self) -> f32 {
        self.config.silence_threshold
    }

    /// Updates the voiced threshold without resetting the timeline.
    pub fn set_threshold(&mut self, threshold: f32) {
        self.config.silence_threshold = threshold;
    }

    /// Rewinds the timeline to zero.
    pub fn reset(&mut self) {
        self.samples_seen = 0;
    }
}

impl Default for FrameClassifier {
    fn default() -> Self {
        Self::new(FrameClassifierConfig::default())
    }
}

/// Calculates the Root Mean Square (RMS) of audio samples.
///
/// # Arguments
/// * `samples` - Audio samples as 16-bit PCM
///
/// # Returns
/// Normalized RMS value (0.0 to 1.0), where:
/// - 0.0 represents silence
/// - ~0.707 represents a full-scale sine wave
/// - 1.0 represents maximum amplitude
pub fn calculate_rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = samples
        .iter()
        .map(|&sample| {
            let normalized = sample as f64 / i16::MAX as f64;
            normalized * normalized
        })
        .sum();

    let mean_square = sum_squares / samples.len() as f64;
    mean_square.sqrt() as f32
}

/// RMS of float samples already normalised to [-1.0, 1.0].
pub fn calculate_rms_f32(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    (sum_squares / samples.len() as f64).sqrt() as f32
}
