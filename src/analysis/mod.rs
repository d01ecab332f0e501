//! Speech fluency analysis.
//!
//! Frames feed [`pauses`]; the transcript feeds [`disfluency`] and, together
//! with the prompt text, [`alignment`]. [`scoring`] folds the signals into a
//! single score and [`metrics`] assembles the per-session report.

pub mod alignment;
pub mod disfluency;
pub mod metrics;
pub mod pauses;
pub mod scoring;

pub use alignment::{AlignmentResult, compute_wer};
pub use disfluency::{DisfluencyEvent, DisfluencyKind};
pub use metrics::{FluencyMetrics, SessionAnalyzer, SessionInput, SessionReport};
pub use pauses::{PauseAnalysis, PauseAnalyzer, PauseSegment};
pub use scoring::{FluencyInputs, FluencyScorer, ScoringConfig, ScoringWeights};
