use crate::defaults;
use crate::error::{FluentError, Result};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Trait for audio source devices.
///
/// This trait allows swapping implementations (real audio device, WAV file, mock).
pub trait AudioSource: Send {
    /// Start capturing audio from the source.
    ///
    /// # Errors
    /// `FluentError::DeviceUnavailable` when the device cannot be opened.
    fn start(&mut self) -> Result<()>;

    /// Stop capturing audio and release the device.
    fn stop(&mut self) -> Result<()>;

    /// Read whatever samples arrived since the last call.
    ///
    /// # Returns
    /// 16-bit PCM mono samples; an empty vector when nothing is buffered yet
    fn read_samples(&mut self) -> Result<Vec<i16>>;

    /// Sample rate of the samples returned by `read_samples`.
    fn sample_rate(&self) -> u32 {
        defaults::SAMPLE_RATE
    }

    /// True once the source has delivered everything it ever will.
    ///
    /// Live devices never run dry; file-backed sources do.
    fn is_exhausted(&self) -> bool {
        false
    }
}

impl AudioSource for Box<dyn AudioSource> {
    fn start(&mut self) -> Result<()> {
        (**self).start()
    }

    fn stop(&mut self) -> Result<()> {
        (**self).stop()
    }

    fn read_samples(&mut self) -> Result<Vec<i16>> {
        (**self).read_samples()
    }

    fn sample_rate(&self) -> u32 {
        (**self).sample_rate()
    }

    fn is_exhausted(&self) -> bool {
        (**self).is_exhausted()
    }
}

/// Mock audio source for testing.
///
/// Either repeats one buffer forever or plays a script of buffers once.
#[derive(Debug, Clone)]
pub struct MockAudioSource {
    is_started: bool,
    samples: Vec<i16>,
    script: Option<VecDeque<Vec<i16>>>,
    sample_rate: u32,
    released: Arc<AtomicBool>,
    should_fail_start: bool,
    should_fail_read: bool,
    error_message: String,
}

impl MockAudioSource {
    /// Create a new mock audio source with default settings
    pub fn new() -> Self {
        Self {
            is_started: false,
            samples: vec![0i16; defaults::FRAME_SAMPLES],
            script: None,
            sample_rate: defaults::SAMPLE_RATE,
            released: Arc::new(AtomicBool::new(false)),
            should_fail_start: false,
            should_fail_read: false,
            error_message: "mock audio error".to_string(),
        }
    }

    /// Configure the mock to return the same samples on every read
    pub fn with_samples(mut self, samples: Vec<i16>) -> Self {
        self.samples = samples;
        self
    }

    /// Configure the mock to play these buffers once, then run dry
    pub fn with_script(mut self, buffers: Vec<Vec<i16>>) -> Self {
        self.script = Some(buffers.into());
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Configure the mock to fail on start
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    /// Configure the mock to fail on read
    pub fn with_read_failure(mut self) -> Self {
        self.should_fail_read = true;
        self
    }

    /// Configure the error message for failures
    pub fn with_error_message(mut self, message: &str) -> Self {
        self.error_message = message.to_string();
        self
    }

    /// Check if the audio source is started
    pub fn is_started(&self) -> bool {
        self.is_started
    }

    /// Flag set once `stop` released the device, observable after the mock
    /// has been moved into a capture thread.
    pub fn released_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.released)
    }
}

impl Default for MockAudioSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSource for MockAudioSource {
    fn start(&mut self) -> Result<()> {
        if self.should_fail_start {
            Err(FluentError::DeviceUnavailable {
                message: self.error_message.clone(),
            })
        } else {
            self.is_started = true;
            self.released.store(false, Ordering::SeqCst);
            Ok(())
        }
    }

    fn stop(&mut self) -> Result<()> {
        self.is_started = false;
        self.released.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<i16>> {
        if self.should_fail_read {
            return Err(FluentError::AudioCapture {
                message: self.error_message.clone(),
            });
        }
        match self.script.as_mut() {
            Some(script) => Ok(script.pop_front().unwrap_or_default()),
            None => Ok(self.samples.clone()),
        }
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn is_exhausted(&self) -> bool {
        self.script.as_ref().is_some_and(|s| s.is_empty())
    }
}
