//! Speech collaborators: recognition in, text-to-speech out.

pub mod recognizer;
pub mod transcript;
pub mod tts;

pub use recognizer::{
    MockRecognizer, Recognizer, StaticRecognizer, TranscriptUpdate, UnavailableRecognizer,
};
pub use transcript::TranscriptBuffer;
pub use tts::{CommandSpeaker, NullSpeaker, RecordingSpeaker, Speaker};
