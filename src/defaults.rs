//! Default configuration constants for fluentme.
//!
//! Every tunable threshold of the analysis pipeline lives here so that the
//! config layer, the analyzers and the tests agree on the same numbers.

/// Default audio sample rate in Hz.
///
/// 16kHz is the usual rate for speech work and keeps per-frame RMS cheap.
pub const SAMPLE_RATE: u32 = 16000;

/// Default number of samples per classified frame.
///
/// 480 samples at 16kHz is a 30ms frame.
pub const FRAME_SAMPLES: usize = 480;

/// Default RMS threshold (linear amplitude, 0.0 to 1.0) at or above which a
/// frame counts as voiced.
pub const SILENCE_THRESHOLD: f32 = 0.01;

/// Minimum silence run, in seconds, that is reported as a pause.
pub const MIN_PAUSE_SECS: f64 = 0.25;

/// Target speaking rate in words per minute.
pub const IDEAL_WPM: f64 = 150.0;

/// Deviation from [`IDEAL_WPM`] at which the rate sub-score reaches zero.
pub const WPM_TOLERANCE: f64 = 150.0;

/// Weight of the speaking-rate sub-score in the composite fluency score.
pub const WEIGHT_WPM: f64 = 0.30;

/// Weight of the disfluency sub-score.
pub const WEIGHT_STUTTER: f64 = 0.35;

/// Weight of the pause sub-score.
pub const WEIGHT_PAUSE: f64 = 0.20;

/// Weight of the speaking-ratio sub-score.
pub const WEIGHT_SPEAKING: f64 = 0.15;

/// Floor for the speaking time used as the pause-score denominator (seconds).
pub const MIN_SPEAKING_SECS_FOR_PAUSE: f64 = 0.5;

/// Floor for the session duration used as the speaking-ratio denominator (seconds).
pub const MIN_DURATION_SECS: f64 = 0.1;

/// Longest session the frame history is sized for, in seconds.
///
/// Frames beyond this are still classified but the oldest ones are evicted
/// from the ring.
pub const MAX_SESSION_SECS: u64 = 300;

/// Upper bound accepted for `session.max_session_secs`.
pub const MAX_SESSION_SECS_LIMIT: u64 = 3600;

/// How long stopping a session waits for the recognizer's final result (ms).
pub const FINALIZE_TIMEOUT_MS: u64 = 750;

/// Polling interval of the audio producer when the source has no samples (ms).
pub const POLL_INTERVAL_MS: u64 = 10;

/// Upper bound for a persisted per-skill score.
pub const MAX_SCORE: u8 = 100;

/// Profile file name inside the data directory.
pub const PROFILE_FILE: &str = "profile.json";

/// Application directory name under the XDG config/data directories.
pub const APP_DIR: &str = "fluentme";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_frame_is_thirty_milliseconds() {
        let ms = FRAME_SAMPLES as f64 * 1000.0 / SAMPLE_RATE as f64;
        assert!((ms - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn scoring_weights_sum_to_one() {
        let sum = WEIGHT_WPM + WEIGHT_STUTTER + WEIGHT_PAUSE + WEIGHT_SPEAKING;
        assert!((sum - 1.0).abs() < 1e-9, "weights sum to {sum}");
    }
}
