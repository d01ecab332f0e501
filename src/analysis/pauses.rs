//! Pause segmentation over classified frames.

use crate::audio::frame::AudioFrame;
use crate::defaults;
use serde::Serialize;

/// One silence run long enough to count as a pause.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PauseSegment {
    pub start_time: f64,
    pub end_time: f64,
    pub duration_seconds: f64,
}

/// Pauses found in one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PauseAnalysis {
    pub pauses: Vec<PauseSegment>,
    pub count: usize,
    /// Mean pause length; 0 when there are no pauses.
    pub avg_duration_seconds: f64,
}

impl PauseAnalysis {
    pub fn total_pause_seconds(&self) -> f64 {
        self.pauses.iter().map(|p| p.duration_seconds).sum()
    }
}

/// Extracts silence runs of at least `min_pause_secs` from a frame sequence.
#[derive(Debug, Clone, Copy)]
pub struct PauseAnalyzer {
    min_pause_secs: f64,
}

impl PauseAnalyzer {
    pub fn new(min_pause_secs: f64) -> Self {
        Self { min_pause_secs }
    }

    pub fn min_pause_secs(&self) -> f64 {
        self.min_pause_secs
    }

    /// Single left-to-right scan.
    ///
    /// A run closes at the first voiced frame after it. A run still open at the
    /// end of the stream closes at the last frame's start time, so the final
    /// frame's own length is not counted.
    pub fn analyze(&self, frames: &[AudioFrame]) -> PauseAnalysis {
        let mut pauses = Vec::new();
        let mut silence_start: Option<f64> = None;

        for frame in frames {
            match (frame.voiced, silence_start) {
                (false, None) => silence_start = Some(frame.time_seconds),
                (true, Some(start)) => {
                    self.keep_if_long(&mut pauses, start, frame.time_seconds);
                    silence_start = None;
                }
                _ => {}
            }
        }

        if let (Some(start), Some(last)) = (silence_start, frames.last()) {
            self.keep_if_long(&mut pauses, start, last.time_seconds);
        }

        let count = pauses.len();
        let avg_duration_seconds = if count == 0 {
            0.0
        } else {
            pauses.iter().map(|p| p.duration_seconds).sum::<f64>() / count as f64
        };

        PauseAnalysis {
            pauses,
            count,
            avg_duration_seconds,
        }
    }

    fn keep_if_long(&self, pauses: &mut Vec<PauseSegment>, start: f64, end: f64) {
        let duration_seconds = end - start;
        if duration_seconds >= self.min_pause_secs {
            pauses.push(PauseSegment {
                start_time: start,
                end_time: end,
                duration_seconds,
            });
        }
    }
}

impl Default for PauseAnalyzer {
    fn default() -> Self {
        Self::new(defaults::MIN_PAUSE_SECS)
    }
}
