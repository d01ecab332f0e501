//! Composite 0-100 fluency score.

use crate::defaults;
use serde::{Deserialize, Serialize};

/// Relative weight of each sub-score in the composite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub wpm: f64,
    pub stutter: f64,
    pub pause: f64,
    pub speaking: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            wpm: defaults::WEIGHT_WPM,
            stutter: defaults::WEIGHT_STUTTER,
            pause: defaults::WEIGHT_PAUSE,
            speaking: defaults::WEIGHT_SPEAKING,
        }
    }
}

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.wpm + self.stutter + self.pause + self.speaking
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Speaking rate that earns a full rate score.
    pub ideal_wpm: f64,
    /// Deviation from `ideal_wpm` at which the rate score reaches 0.
    pub wpm_tolerance: f64,
    pub weights: ScoringWeights,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            ideal_wpm: defaults::IDEAL_WPM,
            wpm_tolerance: defaults::WPM_TOLERANCE,
            weights: ScoringWeights::default(),
        }
    }
}

/// Raw signals of one session.
///
/// `wpm`, `word_count` and `stutter_count` come from the transcript and are
/// `None` when recognition was unavailable.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FluencyInputs {
    pub wpm: Option<f64>,
    pub speaking_seconds: f64,
    pub duration_seconds: f64,
    pub pause_count: usize,
    pub avg_pause_seconds: f64,
    pub stutter_count: Option<usize>,
    pub word_count: Option<usize>,
}

/// Per-term scores, each in 0..=1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubScores {
    pub wpm: f64,
    pub pause: f64,
    pub stutter: f64,
    pub speaking: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FluencyScorer {
    config: ScoringConfig,
}

impl FluencyScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn sub_scores(&self, inputs: &FluencyInputs) -> SubScores {
        let speaking = finite(inputs.speaking_seconds);
        let duration = finite(inputs.duration_seconds);
        let avg_pause = finite(inputs.avg_pause_seconds);

        let wpm = match inputs.wpm {
            Some(wpm) => {
                let tolerance = self.config.wpm_tolerance;
                let deviation = (finite(wpm) - self.config.ideal_wpm).abs();
                if tolerance > 0.0 {
                    1.0 - (deviation / tolerance).min(1.0)
                } else if deviation == 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            None => 0.0,
        };

        let paused = inputs.pause_count as f64 * avg_pause;
        let pause = 1.0
            - (paused / speaking.max(defaults::MIN_SPEAKING_SECS_FOR_PAUSE)).min(1.0);

        let stutter = match (inputs.stutter_count, inputs.word_count) {
            (Some(stutters), Some(words)) => {
                1.0 - (stutters as f64 / words.max(1) as f64).min(1.0)
            }
            _ => 0.0,
        };

        let speaking_ratio = speaking / duration.max(defaults::MIN_DURATION_SECS);

        SubScores {
            wpm: wpm.clamp(0.0, 1.0),
            pause: pause.clamp(0.0, 1.0),
            stutter: stutter.clamp(0.0, 1.0),
            speaking: speaking_ratio.clamp(0.0, 1.0),
        }
    }

    /// Weighted composite, rounded and clamped to 0..=100.
    pub fn score(&self, inputs: &FluencyInputs) -> u8 {
        let sub = self.sub_scores(inputs);
        let w = &self.config.weights;
        let composite =
            w.wpm * sub.wpm + w.stutter * sub.stutter + w.pause * sub.pause + w.speaking * sub.speaking;
        let score = finite(composite * 100.0).round();
        score.clamp(0.0, f64::from(defaults::MAX_SCORE)) as u8
    }
}

fn finite(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}
