//! Text-to-speech for the "pronounce" action.
//!
//! Playback is fire-and-forget: the speaker starts the utterance and returns.

use crate::error::{FluentError, Result};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};

/// Trait for text-to-speech backends.
pub trait Speaker: Send + Sync {
    /// Start speaking `text` without waiting for playback to finish.
    fn speak(&self, text: &str) -> Result<()>;

    fn name(&self) -> &str;
}

/// Known TTS command line tools, tried in order.
const TTS_COMMANDS: &[&str] = &["spd-say", "espeak-ng", "espeak"];

/// Speaker that spawns an external TTS command per utterance.
#[derive(Debug, Clone)]
pub struct CommandSpeaker {
    program: String,
    args: Vec<String>,
}

impl CommandSpeaker {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// First TTS tool found on `PATH`.
    pub fn detect() -> Option<Self> {
        let path = std::env::var_os("PATH")?;
        TTS_COMMANDS
            .iter()
            .find(|tool| std::env::split_paths(&path).any(|dir| is_executable(&dir.join(tool))))
            .map(|tool| Self::new(tool, &[]))
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

impl Speaker for CommandSpeaker {
    fn speak(&self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    FluentError::Other(format!("text-to-speech tool '{}' not found", self.program))
                } else {
                    FluentError::Other(format!("failed to run {}: {}", self.program, e))
                }
            })?;

        // Reap in the background so the child never lingers as a zombie.
        std::thread::spawn(move || {
            let mut child = child;
            if let Err(e) = child.wait() {
                tracing::debug!("text-to-speech process wait failed: {}", e);
            }
        });
        Ok(())
    }

    fn name(&self) -> &str {
        &self.program
    }
}

/// Speaker used when no TTS tool is installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSpeaker;

impl Speaker for NullSpeaker {
    fn speak(&self, text: &str) -> Result<()> {
        tracing::debug!(chars = text.len(), "no text-to-speech backend, skipping");
        Ok(())
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// Speaker that records what it was asked to say.
#[derive(Debug, Clone, Default)]
pub struct RecordingSpeaker {
    spoken: Arc<Mutex<Vec<String>>>,
}

impl RecordingSpeaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken
            .lock()
            .map(|s| s.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl Speaker for RecordingSpeaker {
    fn speak(&self, text: &str) -> Result<()> {
        match self.spoken.lock() {
            Ok(mut spoken) => spoken.push(text.to_string()),
            Err(poisoned) => poisoned.into_inner().push(text.to_string()),
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}
