//! Persisted per-skill scores and the rolling session overview.

pub mod aggregator;
pub mod store;

pub use aggregator::SessionAggregator;
pub use store::{Profile, ProfileStore, Scores, SessionOverview};
