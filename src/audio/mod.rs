//! Audio capture, framing and voice activity classification.

#[cfg(feature = "cpal-audio")]
pub mod capture;
pub mod frame;
pub mod recorder;
pub mod vad;
pub mod wav;
