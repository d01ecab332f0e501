//! fluentme - Speech fluency practice
//!
//! Speak a prompt, get pauses, stutter-like events, word error rate and a
//! 0-100 fluency score, tracked per skill in a local profile.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod analysis;
pub mod assessment;
pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod output;
pub mod profile;
pub mod session;
pub mod speech;

// Collaborator traits (audio in, transcript in, speech out)
pub use audio::recorder::AudioSource;
pub use speech::recognizer::Recognizer;
pub use speech::tts::Speaker;

// Analysis
pub use analysis::metrics::{FluencyMetrics, SessionAnalyzer, SessionInput, SessionReport};
pub use analysis::scoring::{FluencyScorer, ScoringConfig};

// Assessment and session lifecycle
pub use assessment::{Prompt, QuestionBank, SkillType};
pub use session::{Session, SessionConfig, SessionOutcome};

// Profile
pub use profile::{Profile, ProfileStore, SessionAggregator};

// Error handling
pub use error::{FluentError, Result};

// Config
pub use config::Config;

/// Version with optional git commit hash, as shown by `fluentme --version`.
///
/// `"0.1.0+abc1234"` when the build saw a git checkout, `"0.1.0"` otherwise.
pub const VERSION: &str = env!("FLUENTME_VERSION");

pub fn version_string() -> String {
    VERSION.to_string()
}
