use crate::analysis::metrics::FluencyMetrics;
use crate::assessment::SkillType;
use crate::profile::store::Profile;

/// Folds completed sessions into a profile.
///
/// Call exactly once per completed session. Cancelled sessions never reach
/// here.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionAggregator;

impl SessionAggregator {
    pub fn record(profile: &mut Profile, skill: SkillType, metrics: &FluencyMetrics) {
        profile.scores.set(skill, metrics.fluency_score);

        let overview = &mut profile.overview;
        overview.samples += 1;
        overview.time_spent_seconds += whole_seconds(metrics.duration_seconds);

        let n = overview.samples as f64;
        let accuracy = session_accuracy(metrics);
        overview.accuracy = rolling_mean(overview.accuracy, accuracy, n);
        overview.fluency = rolling_mean(overview.fluency, f64::from(metrics.fluency_score), n);

        overview.max_stutter_likelihood =
            overview.max_stutter_likelihood.max(metrics.stutter_ratio());

        tracing::debug!(
            skill = %skill,
            samples = overview.samples,
            fluency = overview.fluency,
            "profile updated"
        );
    }
}

/// `(1 - wer) * 100`, unrounded. Goes negative when insertions push WER past 1.
fn session_accuracy(metrics: &FluencyMetrics) -> f64 {
    metrics
        .wer_percent
        .filter(|wer| wer.is_finite())
        .map_or(0.0, |wer| 100.0 - wer)
}

/// Mean of `n` values given the mean of the first `n - 1`.
fn rolling_mean(previous: f64, value: f64, n: f64) -> f64 {
    previous * (n - 1.0) / n + value / n
}

fn whole_seconds(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    }
}
