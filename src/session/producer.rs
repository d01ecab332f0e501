//! Audio producer thread.
//!
//! Polls the audio source, cuts samples into fixed-size frames, classifies
//! each one and appends it to the session's bounded frame history. Nothing
//! else happens on this thread apart from optionally streaming the raw
//! samples to a WAV file.

use crate::audio::frame::{FrameAssembler, FrameHistory};
use crate::audio::recorder::AudioSource;
use crate::audio::vad::{FrameClassifier, FrameClassifierConfig};
use crate::audio::wav::WavRecorder;
use crate::error::{FluentError, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ProducerConfig {
    pub frame_samples: usize,
    pub silence_threshold: f32,
    pub max_session_secs: u64,
    pub poll_interval_ms: u64,
}

/// What the producer hands back when joined.
#[derive(Debug)]
pub struct CaptureOutput {
    pub history: FrameHistory,
    /// Length of the captured audio timeline in seconds.
    pub audio_seconds: f64,
    /// True when the source ran dry on its own (file-backed sources).
    pub exhausted: bool,
    pub recording: Option<PathBuf>,
}

/// Handle to a running producer thread.
pub struct AudioProducer {
    running: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    handle: JoinHandle<CaptureOutput>,
}

impl AudioProducer {
    /// Start the source and spawn the capture loop.
    ///
    /// # Errors
    /// `DeviceUnavailable` when the source cannot start. The source is not
    /// left running in that case.
    pub fn spawn<A>(
        mut source: A,
        config: ProducerConfig,
        recorder: Option<WavRecorder>,
    ) -> Result<Self>
    where
        A: AudioSource + 'static,
    {
        source.start().map_err(|e| match e {
            FluentError::DeviceUnavailable { .. } => e,
            other => FluentError::DeviceUnavailable {
                message: other.to_string(),
            },
        })?;

        let running = Arc::new(AtomicBool::new(true));
        let finished = Arc::new(AtomicBool::new(false));
        let thread_running = Arc::clone(&running);
        let thread_finished = Arc::clone(&finished);

        let handle = thread::Builder::new()
            .name("fluentme-audio".to_string())
            .spawn(move || {
                let output = capture_loop(&mut source, &config, recorder, &thread_running);
                thread_finished.store(true, Ordering::SeqCst);
                output
            })?;

        Ok(Self {
            running,
            finished,
            handle,
        })
    }

    /// False once the loop has exited, either on request or because the
    /// source ran dry.
    pub fn is_capturing(&self) -> bool {
        !self.finished.load(Ordering::SeqCst)
    }

    /// Signal the loop to stop and wait for it. The source is stopped before
    /// this returns.
    pub fn stop(self) -> Result<CaptureOutput> {
        self.running.store(false, Ordering::SeqCst);
        self.handle.join().map_err(|_| FluentError::AudioCapture {
            message: "audio capture thread panicked".to_string(),
        })
    }
}

fn capture_loop<A: AudioSource>(
    source: &mut A,
    config: &ProducerConfig,
    mut recorder: Option<WavRecorder>,
    running: &AtomicBool,
) -> CaptureOutput {
    let sample_rate = source.sample_rate();
    let mut classifier = FrameClassifier::new(FrameClassifierConfig {
        silence_threshold: config.silence_threshold,
        sample_rate,
    });
    let mut assembler = FrameAssembler::new(config.frame_samples);
    let mut history =
        FrameHistory::for_session(config.max_session_secs, sample_rate, config.frame_samples);
    let poll_interval = Duration::from_millis(config.poll_interval_ms);
    let mut exhausted = false;

    while running.load(Ordering::SeqCst) {
        match source.read_samples() {
            Ok(samples) if !samples.is_empty() => {
                if let Some(rec) = recorder.as_mut()
                    && let Err(e) = rec.write(&samples)
                {
                    tracing::warn!("recording disabled: {}", e);
                    recorder = None;
                }
                assembler.push(&samples, |frame| history.push(classifier.classify(frame)));
            }
            Ok(_) => {
                if source.is_exhausted() {
                    exhausted = true;
                    break;
                }
                thread::sleep(poll_interval);
            }
            Err(e) => {
                tracing::warn!("audio capture ended early: {}", e);
                break;
            }
        }
    }

    assembler.flush(|frame| history.push(classifier.classify(frame)));

    if let Err(e) = source.stop() {
        tracing::warn!("failed to stop audio source: {}", e);
    }

    let recording = recorder.and_then(|rec| match rec.finalize() {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::warn!("recording not saved: {}", e);
            None
        }
    });

    if history.dropped() > 0 {
        tracing::warn!(
            dropped = history.dropped(),
            kept = history.len(),
            "session exceeded the frame history; oldest frames were discarded"
        );
    }

    CaptureOutput {
        history,
        audio_seconds: classifier.elapsed_seconds(),
        exhausted,
        recording,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::recorder::MockAudioSource;

    fn config() -> ProducerConfig {
        ProducerConfig {
            frame_samples: 160,
            silence_threshold: 0.01,
            max_session_secs: 10,
            poll_interval_ms: 1,
        }
    }

    fn wait_until_finished(producer: &AudioProducer) {
        for _ in 0..500 {
            if !producer.is_capturing() {
                return;
            }
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_scripted_source_runs_dry_and_is_released() {
        let source =
            MockAudioSource::new().with_script(vec![vec![3000i16; 320], vec![0i16; 160]]);
        let released = source.released_flag();

        let producer = AudioProducer::spawn(source, config(), None).unwrap();
        wait_until_finished(&producer);
        let output = producer.stop().unwrap();

        assert!(output.exhausted);
        assert!(released.load(Ordering::SeqCst));
        let frames = output.history.into_vec();
        assert_eq!(frames.len(), 3);
        assert!(frames[0].voiced && frames[1].voiced);
        assert!(!frames[2].voiced);
        assert!((output.audio_seconds - 480.0 / 16000.0).abs() < 1e-12);
    }

    #[test]
    fn test_partial_frame_is_flushed() {
        let source = MockAudioSource::new().with_script(vec![vec![0i16; 200]]);
        let producer = AudioProducer::spawn(source, config(), None).unwrap();
        wait_until_finished(&producer);
        let frames = producer.stop().unwrap().history.into_vec();

        assert_eq!(frames.len(), 2);
        assert!((frames[1].duration_seconds - 40.0 / 16000.0).abs() < 1e-12);
    }

    #[test]
    fn test_stop_signal_ends_live_capture() {
        let source = MockAudioSource::new().with_samples(vec![1000i16; 160]);
        let released = source.released_flag();

        let producer = AudioProducer::spawn(source, config(), None).unwrap();
        thread::sleep(Duration::from_millis(20));
        assert!(producer.is_capturing());
        let output = producer.stop().unwrap();

        assert!(!output.exhausted);
        assert!(!output.history.is_empty());
        assert!(released.load(Ordering::SeqCst));
    }

    #[test]
    fn test_start_failure_is_device_unavailable() {
        let source = MockAudioSource::new().with_start_failure();
        let result = AudioProducer::spawn(source, config(), None);
        assert!(matches!(result, Err(FluentError::DeviceUnavailable { .. })));
    }

    #[test]
    fn test_read_failure_keeps_source_released() {
        let source = MockAudioSource::new().with_read_failure();
        let released = source.released_flag();
        let producer = AudioProducer::spawn(source, config(), None).unwrap();
        wait_until_finished(&producer);
        let output = producer.stop().unwrap();

        assert!(output.history.is_empty());
        assert!(released.load(Ordering::SeqCst));
    }

    #[test]
    fn test_history_is_bounded() {
        let source = MockAudioSource::new().with_script(vec![vec![0i16; 16000 * 3]]);
        let config = ProducerConfig {
            max_session_secs: 1,
            ..config()
        };
        let producer = AudioProducer::spawn(source, config, None).unwrap();
        wait_until_finished(&producer);
        let output = producer.stop().unwrap();

        assert_eq!(output.history.len(), 100);
        assert_eq!(output.history.dropped(), 200);
    }

    #[test]
    fn test_recording_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.wav");
        let recorder = WavRecorder::create(&path, 16000).unwrap();
        let source = MockAudioSource::new().with_script(vec![vec![5i16; 100]]);

        let producer = AudioProducer::spawn(source, config(), Some(recorder)).unwrap();
        wait_until_finished(&producer);
        let output = producer.stop().unwrap();

        assert_eq!(output.recording.as_deref(), Some(path.as_path()));
        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.len(), 100);
    }
}
