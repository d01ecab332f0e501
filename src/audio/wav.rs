//! WAV file support: an audio source for offline analysis and a writer for
//! saving captured sessions.

use crate::audio::recorder::AudioSource;
use crate::defaults;
use crate::error::{FluentError, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};

/// Audio source that replays WAV file data.
///
/// Accepts arbitrary sample rates and channel counts; samples are mixed down to
/// mono and resampled to the configured rate.
pub struct WavAudioSource {
    samples: Vec<i16>,
    position: usize,
    chunk_size: usize,
    sample_rate: u32,
}

impl WavAudioSource {
    /// Create from any reader, resampling to `target_rate`.
    pub fn from_reader(
        reader: Box<dyn Read + Send>,
        target_rate: u32,
        chunk_size: usize,
    ) -> Result<Self> {
        let mut wav_reader =
            hound::WavReader::new(reader).map_err(|e| FluentError::AudioCapture {
                message: format!("Failed to parse WAV file: {}", e),
            })?;

        let spec = wav_reader.spec();
        let raw_samples: Vec<i16> = wav_reader
            .samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| FluentError::AudioCapture {
                message: format!("Failed to read WAV samples: {}", e),
            })?;

        let mono_samples = downmix(raw_samples, spec.channels);
        let samples = resample(&mono_samples, spec.sample_rate, target_rate);

        Ok(Self {
            samples,
            position: 0,
            chunk_size: chunk_size.max(1),
            sample_rate: target_rate,
        })
    }

    /// Open a WAV file from disk.
    pub fn open(path: &Path, target_rate: u32, chunk_size: usize) -> Result<Self> {
        let file = File::open(path).map_err(|e| FluentError::AudioCapture {
            message: format!("Failed to open {}: {}", path.display(), e),
        })?;
        Self::from_reader(Box::new(BufReader::new(file)), target_rate, chunk_size)
    }

    /// Length of the decoded audio in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate.max(1))
    }

    /// Consume the source and return all samples as a single buffer.
    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }
}

impl AudioSource for WavAudioSource {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<i16>> {
        if self.position >= self.samples.len() {
            return Ok(Vec::new());
        }

        let end = std::cmp::min(self.position + self.chunk_size, self.samples.len());
        let chunk = self.samples[self.position..end].to_vec();
        self.position = end;

        Ok(chunk)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn is_exhausted(&self) -> bool {
        self.position >= self.samples.len()
    }
}

/// Average interleaved channels into one.
fn downmix(raw: Vec<i16>, channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return raw;
    }
    let channels = usize::from(channels);
    raw.chunks_exact(channels)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| i32::from(s)).sum();
            (sum / channels as i32) as i16
        })
        .collect()
}

/// Simple linear interpolation resampling.
pub(crate) fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate || samples.is_empty() || to_rate == 0 {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = (source_pos.floor() as usize).min(samples.len() - 1);
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples[source_idx]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as i16
            }
        })
        .collect()
}

/// Streams captured samples into a 16-bit mono WAV file.
pub struct WavRecorder {
    writer: hound::WavWriter<BufWriter<File>>,
    path: PathBuf,
    samples_written: u64,
}

impl WavRecorder {
    pub fn create(path: &Path, sample_rate: u32) -> Result<Self> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let writer = hound::WavWriter::create(path, spec).map_err(|e| FluentError::AudioCapture {
            message: format!("Failed to create {}: {}", path.display(), e),
        })?;
        Ok(Self {
            writer,
            path: path.to_path_buf(),
            samples_written: 0,
        })
    }

    /// Build a timestamped file name for a session recording in `dir`.
    pub fn session_path(dir: &Path, skill: &str, unix_millis: u128) -> PathBuf {
        dir.join(format!("{}-{}-{}.wav", defaults::APP_DIR, skill, unix_millis))
    }

    pub fn write(&mut self, samples: &[i16]) -> Result<()> {
        for &sample in samples {
            self.writer
                .write_sample(sample)
                .map_err(|e| FluentError::AudioCapture {
                    message: format!("Failed to write {}: {}", self.path.display(), e),
                })?;
        }
        self.samples_written += samples.len() as u64;
        Ok(())
    }

    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    /// Flush the header and close the file.
    pub fn finalize(self) -> Result<PathBuf> {
        let path = self.path;
        self.writer
            .finalize()
            .map_err(|e| FluentError::AudioCapture {
                message: format!("Failed to finalize {}: {}", path.display(), e),
            })?;
        Ok(path)
    }
}
