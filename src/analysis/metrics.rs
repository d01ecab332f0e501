//! Per-session metric assembly.
//!
//! Runs once, synchronously, on the frozen frame history and transcript
//! snapshot of a stopped session.

use crate::analysis::alignment::{self, AlignmentResult};
use crate::analysis::disfluency::{self, DisfluencyEvent};
use crate::analysis::pauses::{PauseAnalysis, PauseAnalyzer};
use crate::analysis::scoring::{FluencyInputs, FluencyScorer, ScoringConfig};
use crate::assessment::{Prompt, SkillType};
use crate::audio::frame::AudioFrame;
use crate::defaults;
use serde::Serialize;

/// Scalar outcome of one completed session.
///
/// Transcript-derived fields are `None` when recognition was unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FluencyMetrics {
    pub wpm: Option<u32>,
    pub speaking_seconds: f64,
    pub duration_seconds: f64,
    pub pause_count: usize,
    pub avg_pause_seconds: f64,
    pub stutter_count: Option<usize>,
    pub word_count: Option<usize>,
    /// Word error rate in percent; `None` without a reference or transcript.
    pub wer_percent: Option<f64>,
    /// `max(0, round((1 - wer) * 100))`, present exactly when `wer_percent` is.
    pub accuracy_percent: Option<u8>,
    pub fluency_score: u8,
}

impl FluencyMetrics {
    /// Stutter events per word, used for the overview's max likelihood.
    pub fn stutter_ratio(&self) -> f64 {
        match (self.stutter_count, self.word_count) {
            (Some(stutters), Some(words)) => stutters as f64 / words.max(1) as f64,
            _ => 0.0,
        }
    }
}

/// Everything shown to the user after a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub skill: SkillType,
    pub prompt: Prompt,
    pub metrics: FluencyMetrics,
    pub pauses: PauseAnalysis,
    pub events: Vec<DisfluencyEvent>,
    pub alignment: Option<AlignmentResult>,
    /// Snapshot text; `None` when recognition was unavailable.
    pub transcript: Option<String>,
    /// Stutter events per 100 words, one decimal.
    pub percent_words_stuttered: Option<f64>,
    /// Frames evicted from the history before analysis.
    pub frames_dropped: u64,
}

/// Raw material of one stopped session.
#[derive(Debug, Clone, Copy)]
pub struct SessionInput<'a> {
    pub skill: SkillType,
    pub prompt: &'a Prompt,
    pub frames: &'a [AudioFrame],
    /// Wall time between start and stop.
    pub duration_seconds: f64,
    pub transcript: Option<&'a str>,
    pub frames_dropped: u64,
}

/// Pause segmentation plus scoring with one set of thresholds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionAnalyzer {
    pauses: PauseAnalyzer,
    scorer: FluencyScorer,
}

impl SessionAnalyzer {
    pub fn new(min_pause_secs: f64, scoring: ScoringConfig) -> Self {
        Self {
            pauses: PauseAnalyzer::new(min_pause_secs),
            scorer: FluencyScorer::new(scoring),
        }
    }

    pub fn analyze(&self, input: SessionInput<'_>) -> SessionReport {
        let speaking_seconds = speaking_seconds(input.frames);
        let pauses = self.pauses.analyze(input.frames);

        let transcript = input.transcript.map(str::trim);
        let word_count = transcript.map(disfluency::count_words);
        let events = transcript.map(disfluency::detect).unwrap_or_default();
        let stutter_count = transcript.map(|_| events.len());
        let wpm = word_count.map(|words| words_per_minute(words, speaking_seconds));

        let reference = input.prompt.text.trim();
        let alignment = match transcript {
            Some(text) if !text.is_empty() && !reference.is_empty() => {
                Some(alignment::align(reference, text))
            }
            _ => None,
        };

        let percent_words_stuttered = match (stutter_count, word_count) {
            (Some(_), Some(0)) => Some(0.0),
            (Some(stutters), Some(words)) => {
                Some(round1(stutters as f64 / words.max(1) as f64 * 100.0))
            }
            _ => None,
        };

        let fluency_score = self.scorer.score(&FluencyInputs {
            wpm: wpm.map(f64::from),
            speaking_seconds,
            duration_seconds: input.duration_seconds,
            pause_count: pauses.count,
            avg_pause_seconds: pauses.avg_duration_seconds,
            stutter_count,
            word_count,
        });

        let metrics = FluencyMetrics {
            wpm,
            speaking_seconds,
            duration_seconds: input.duration_seconds,
            pause_count: pauses.count,
            avg_pause_seconds: pauses.avg_duration_seconds,
            stutter_count,
            word_count,
            wer_percent: alignment.map(|a| a.wer * 100.0),
            accuracy_percent: alignment.map(|a| a.accuracy_percent()),
            fluency_score,
        };

        tracing::debug!(
            skill = %input.skill,
            frames = input.frames.len(),
            speaking = speaking_seconds,
            pauses = pauses.count,
            score = fluency_score,
            "session analysed"
        );

        SessionReport {
            skill: input.skill,
            prompt: input.prompt.clone(),
            metrics,
            pauses,
            events,
            alignment,
            transcript: transcript.map(str::to_owned),
            percent_words_stuttered,
            frames_dropped: input.frames_dropped,
        }
    }
}

/// Sum of voiced frame durations.
pub fn speaking_seconds(frames: &[AudioFrame]) -> f64 {
    frames
        .iter()
        .filter(|f| f.voiced)
        .map(|f| f.duration_seconds)
        .sum()
}

/// `round(words / (speaking / 60))`, 0 without speech.
pub fn words_per_minute(words: usize, speaking_seconds: f64) -> u32 {
    if speaking_seconds > 0.0 && speaking_seconds.is_finite() {
        (words as f64 / (speaking_seconds / 60.0)).round() as u32
    } else {
        0
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Convenience wrapper with default thresholds.
pub fn analyze_session(input: SessionInput<'_>) -> SessionReport {
    SessionAnalyzer::new(defaults::MIN_PAUSE_SECS, ScoringConfig::default()).analyze(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::disfluency::DisfluencyKind;

    const DT: f64 = 0.03;

    fn frames(voiced: &[bool]) -> Vec<AudioFrame> {
        voiced
            .iter()
            .enumerate()
            .map(|(i, &v)| AudioFrame {
                time_seconds: i as f64 * DT,
                duration_seconds: DT,
                energy: if v { 0.1 } else { 0.0 },
                voiced: v,
            })
            .collect()
    }

    fn read_prompt() -> Prompt {
        Prompt::new(
            "Read this aloud:",
            "The quick brown fox jumps over the lazy dog.",
        )
    }

    fn input<'a>(
        prompt: &'a Prompt,
        frames: &'a [AudioFrame],
        transcript: Option<&'a str>,
    ) -> SessionInput<'a> {
        SessionInput {
            skill: SkillType::Read,
            prompt,
            frames,
            duration_seconds: frames.len() as f64 * DT,
            transcript,
            frames_dropped: 0,
        }
    }

    #[test]
    fn test_speaking_seconds_sums_voiced_durations() {
        let f = frames(&[true, false, true, true]);
        assert!((speaking_seconds(&f) - 0.09).abs() < 1e-12);
    }

    #[test]
    fn test_words_per_minute() {
        assert_eq!(words_per_minute(9, 3.6), 150);
        assert_eq!(words_per_minute(9, 0.0), 0);
        assert_eq!(words_per_minute(0, 3.0), 0);
    }

    #[test]
    fn test_perfect_read_scores_full_accuracy() {
        let prompt = read_prompt();
        let f = frames(&[true; 120]); // 3.6 s of speech
        let report = analyze_session(input(
            &prompt,
            &f,
            Some("the quick brown fox jumps over the lazy dog"),
        ));

        let m = report.metrics;
        assert_eq!(m.word_count, Some(9));
        assert_eq!(m.wpm, Some(150));
        assert_eq!(m.wer_percent, Some(0.0));
        assert_eq!(m.accuracy_percent, Some(100));
        assert_eq!(m.stutter_count, Some(0));
        assert_eq!(m.pause_count, 0);
        assert_eq!(m.fluency_score, 100);
        assert_eq!(report.percent_words_stuttered, Some(0.0));
    }

    #[test]
    fn test_recognition_unavailable_leaves_transcript_fields_empty() {
        let prompt = read_prompt();
        let f = frames(&[true; 100]);
        let report = analyze_session(input(&prompt, &f, None));

        let m = report.metrics;
        assert_eq!(m.wpm, None);
        assert_eq!(m.word_count, None);
        assert_eq!(m.stutter_count, None);
        assert_eq!(m.wer_percent, None);
        assert!(report.alignment.is_none());
        assert!(report.transcript.is_none());
        // pause 0.20 + speaking 0.15
        assert_eq!(m.fluency_score, 35);
    }

    #[test]
    fn test_empty_transcript_has_no_wer() {
        let prompt = read_prompt();
        let f = frames(&[true; 10]);
        let report = analyze_session(input(&prompt, &f, Some("   ")));

        assert_eq!(report.metrics.word_count, Some(0));
        assert_eq!(report.metrics.wpm, Some(0));
        assert_eq!(report.metrics.wer_percent, None);
        assert_eq!(report.transcript.as_deref(), Some(""));
    }

    #[test]
    fn test_stutter_percentage_rounded_to_one_decimal() {
        let prompt = read_prompt();
        let f = frames(&[true; 10]);
        let report = analyze_session(input(&prompt, &f, Some("the the quick brown fox jumps")));

        assert_eq!(report.events.len(), 1);
        assert_eq!(report.events[0].kind, DisfluencyKind::Repetition);
        // 1 of 6 words = 16.666 -> 16.7
        assert_eq!(report.percent_words_stuttered, Some(16.7));
        assert!((report.metrics.stutter_ratio() - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_mid_session_pause_is_reported() {
        let prompt = read_prompt();
        let mut pattern = vec![true; 20];
        pattern.extend([false; 10]); // 0.30 s
        pattern.extend([true; 20]);
        let f = frames(&pattern);
        let report = analyze_session(input(&prompt, &f, Some("the quick brown fox")));

        assert_eq!(report.metrics.pause_count, 1);
        assert!((report.metrics.avg_pause_seconds - 0.30).abs() < 1e-9);
    }

    #[test]
    fn test_wrong_words_lower_accuracy() {
        let prompt = Prompt::new("Say this word:", "Innovation");
        let f = frames(&[true; 10]);
        let report = analyze_session(input(&prompt, &f, Some("renovation")));

        assert_eq!(report.metrics.wer_percent, Some(100.0));
        assert_eq!(report.metrics.accuracy_percent, Some(0));
    }

    #[test]
    fn test_frames_dropped_carried_through() {
        let prompt = read_prompt();
        let f = frames(&[true; 4]);
        let report = analyze_session(SessionInput {
            frames_dropped: 7,
            ..input(&prompt, &f, None)
        });
        assert_eq!(report.frames_dropped, 7);
    }
}
