//! Live microphone capture using CPAL (Cross-Platform Audio Library).
//!
//! The device callback only converts and appends samples to a shared buffer.
//! Classification happens on the session's audio producer thread.

use crate::audio::recorder::AudioSource;
use crate::error::{FluentError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Redirects fd 2 to /dev/null until dropped.
///
/// ALSA and JACK print probe noise on stderr while CPAL enumerates devices,
/// which would land in the middle of the practice prompt.
struct StderrSilencer {
    saved: libc::c_int,
}

impl StderrSilencer {
    fn engage() -> Self {
        // SAFETY: plain fd juggling on descriptor 2. Device probing runs on the
        // main thread before the session starts, so nothing else writes fd 2.
        unsafe {
            let saved = libc::dup(2);
            let null = libc::open(c"/dev/null".as_ptr(), libc::O_WRONLY);
            if saved >= 0 && null >= 0 {
                libc::dup2(null, 2);
            }
            if null >= 0 {
                libc::close(null);
            }
            Self { saved }
        }
    }
}

impl Drop for StderrSilencer {
    fn drop(&mut self) {
        if self.saved < 0 {
            return;
        }
        // SAFETY: `saved` is the descriptor duplicated in `engage`.
        unsafe {
            libc::dup2(self.saved, 2);
            libc::close(self.saved);
        }
    }
}

fn quietly<R>(probe: impl FnOnce() -> R) -> R {
    let _silencer = StderrSilencer::engage();
    probe()
}

/// How an input device name should be treated when picking a microphone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeviceRole {
    /// Output-only ALSA aliases; never a microphone.
    Playback,
    /// Sound-server bridges that follow the desktop's chosen microphone.
    SoundServer,
    Other,
}

fn device_role(name: &str) -> DeviceRole {
    const PLAYBACK: &[&str] = &[
        "surround", "front:", "rear:", "center:", "side:", "digital output", "hdmi", "s/pdif",
    ];
    const SOUND_SERVERS: &[&str] = &["pipewire", "pulse"];

    let lower = name.to_lowercase();
    if PLAYBACK.iter().any(|p| lower.contains(p)) {
        DeviceRole::Playback
    } else if SOUND_SERVERS.iter().any(|p| lower.contains(p)) {
        DeviceRole::SoundServer
    } else {
        DeviceRole::Other
    }
}

/// An input device offered to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDevice {
    pub name: String,
    /// Sound-server bridges are the safest pick on desktop Linux.
    pub recommended: bool,
}

impl fmt::Display for InputDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.recommended {
            write!(f, "{} [recommended]", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

fn unavailable(context: &str, err: impl fmt::Display) -> FluentError {
    FluentError::DeviceUnavailable {
        message: format!("{context}: {err}"),
    }
}

/// Input devices that can plausibly be a microphone.
pub fn list_devices() -> Result<Vec<InputDevice>> {
    let devices = quietly(|| cpal::default_host().input_devices())
        .map_err(|e| unavailable("cannot enumerate input devices", e))?;

    Ok(devices
        .filter_map(|device| device.name().ok())
        .filter_map(|name| match device_role(&name) {
            DeviceRole::Playback => None,
            role => Some(InputDevice {
                name,
                recommended: role == DeviceRole::SoundServer,
            }),
        })
        .collect())
}

/// An exact name match, else the first sound-server bridge, else the host default.
fn open_device(wanted: Option<&str>) -> Result<cpal::Device> {
    quietly(|| {
        let host = cpal::default_host();
        let mut devices = host
            .input_devices()
            .map_err(|e| unavailable("cannot enumerate input devices", e))?;

        if let Some(wanted) = wanted {
            return devices
                .find(|d| d.name().is_ok_and(|name| name == wanted))
                .ok_or_else(|| FluentError::DeviceUnavailable {
                    message: format!("input device '{wanted}' not found"),
                });
        }

        devices
            .find(|d| {
                d.name()
                    .is_ok_and(|name| device_role(&name) == DeviceRole::SoundServer)
            })
            .or_else(|| host.default_input_device())
            .ok_or_else(|| FluentError::DeviceUnavailable {
                message: "no microphone found".to_string(),
            })
    })
}

/// Owns the CPAL stream so the source can cross to the producer thread.
///
/// SAFETY: the stream is only reached through the Mutex in `CpalAudioSource`.
struct StreamHandle(cpal::Stream);

unsafe impl Send for StreamHandle {}

/// Streaming downmix and linear resample from the device format to the
/// session rate.
///
/// The read position carries over between callbacks, so chunk boundaries
/// neither add nor drop samples. The mono scratch buffer is reused.
struct MonoConverter {
    channels: usize,
    passthrough: bool,
    step: f64,
    /// Position of the next output sample, relative to the current chunk.
    /// `-1.0` addresses `previous`.
    position: f64,
    previous: Option<f64>,
    mono: Vec<f64>,
}

impl MonoConverter {
    fn new(channels: usize, device_rate: u32, session_rate: u32) -> Self {
        Self {
            channels: channels.max(1),
            passthrough: device_rate == session_rate || session_rate == 0,
            step: f64::from(device_rate) / f64::from(session_rate.max(1)),
            position: 0.0,
            previous: None,
            mono: Vec::new(),
        }
    }

    fn convert<T: Copy>(&mut self, interleaved: &[T], to_i16: impl Fn(T) -> i16, out: &mut Vec<i16>) {
        let channels = self.channels;
        self.mono.clear();
        self.mono.extend(interleaved.chunks_exact(channels).map(|frame| {
            let sum: i32 = frame.iter().map(|&s| i32::from(to_i16(s))).sum();
            f64::from(sum / channels as i32)
        }));

        if self.passthrough {
            out.extend(self.mono.iter().map(|&s| s as i16));
            return;
        }

        let Some(&last) = self.mono.last() else {
            return;
        };
        let end = (self.mono.len() - 1) as f64;
        let mut pos = self.position;
        while pos < end {
            let index = pos.floor();
            let fraction = pos - index;
            let left = if index < 0.0 {
                self.previous.unwrap_or(self.mono[0])
            } else {
                self.mono[index as usize]
            };
            let right = self.mono[(index + 1.0) as usize];
            out.push((left + (right - left) * fraction) as i16);
            pos += self.step;
        }
        self.position = pos - self.mono.len() as f64;
        self.previous = Some(last);
    }
}

/// Written by the device callback and drained by `read_samples`.
struct CaptureSink {
    pending: Arc<Mutex<Vec<i16>>>,
    captured: Arc<AtomicU64>,
    converter: MonoConverter,
}

impl CaptureSink {
    fn push<T: Copy>(&mut self, interleaved: &[T], to_i16: impl Fn(T) -> i16) {
        let Ok(mut pending) = self.pending.lock() else {
            return;
        };
        let before = pending.len();
        self.converter.convert(interleaved, to_i16, &mut pending);
        self.captured
            .fetch_add((pending.len() - before) as u64, Ordering::Relaxed);
    }
}

/// Microphone capture at the session's sample rate, mono, 16-bit.
///
/// The device runs at its native config; channels are averaged and the
/// signal is resampled in software.
pub struct CpalAudioSource {
    device: cpal::Device,
    stream: Mutex<Option<StreamHandle>>,
    pending: Arc<Mutex<Vec<i16>>>,
    captured: Arc<AtomicU64>,
    sample_rate: u32,
}

impl CpalAudioSource {
    /// Open `device_name`, or the best available microphone when `None`.
    ///
    /// # Errors
    /// `FluentError::DeviceUnavailable` when no matching device exists.
    pub fn new(device_name: Option<&str>, sample_rate: u32) -> Result<Self> {
        Ok(Self {
            device: open_device(device_name)?,
            stream: Mutex::new(None),
            pending: Arc::new(Mutex::new(Vec::new())),
            captured: Arc::new(AtomicU64::new(0)),
            sample_rate,
        })
    }

    /// Session-rate samples delivered by the device so far.
    pub fn samples_captured(&self) -> u64 {
        self.captured.load(Ordering::Relaxed)
    }

    fn open_stream(&self) -> Result<cpal::Stream> {
        let native = self
            .device
            .default_input_config()
            .map_err(|e| unavailable("cannot read microphone config", e))?;

        let channels = usize::from(native.channels());
        let device_rate = native.sample_rate().0;
        let mut sink = CaptureSink {
            pending: Arc::clone(&self.pending),
            captured: Arc::clone(&self.captured),
            converter: MonoConverter::new(channels, device_rate, self.sample_rate),
        };
        tracing::debug!(
            channels,
            device_rate,
            format = ?native.sample_format(),
            "opening microphone"
        );

        let config: cpal::StreamConfig = native.clone().into();
        let on_error = |err| tracing::warn!(error = %err, "microphone stream error");

        let stream = match native.sample_format() {
            cpal::SampleFormat::I16 => self.device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| sink.push(data, |s| s),
                on_error,
                None,
            ),
            cpal::SampleFormat::F32 => self.device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| sink.push(data, f32_to_i16),
                on_error,
                None,
            ),
            other => {
                return Err(FluentError::DeviceUnavailable {
                    message: format!("microphone sample format {other:?} is not supported"),
                });
            }
        };
        stream.map_err(|e| unavailable("cannot open microphone stream", e))
    }

    fn stream_slot(&self) -> Result<std::sync::MutexGuard<'_, Option<StreamHandle>>> {
        self.stream.lock().map_err(|e| FluentError::AudioCapture {
            message: format!("microphone state poisoned: {e}"),
        })
    }
}

fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
}

impl AudioSource for CpalAudioSource {
    fn start(&mut self) -> Result<()> {
        let mut slot = self.stream_slot()?;
        if slot.is_some() {
            return Ok(());
        }
        let stream = self.open_stream()?;
        stream
            .play()
            .map_err(|e| unavailable("cannot start microphone", e))?;
        *slot = Some(StreamHandle(stream));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let handle = self.stream_slot()?.take();
        // Dropping the handle releases the device.
        if let Some(StreamHandle(stream)) = handle {
            stream.pause().map_err(|e| FluentError::AudioCapture {
                message: format!("cannot pause microphone: {e}"),
            })?;
            tracing::debug!(samples = self.samples_captured(), "microphone closed");
        }
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<i16>> {
        let mut pending = self.pending.lock().map_err(|e| FluentError::AudioCapture {
            message: format!("microphone buffer poisoned: {e}"),
        })?;
        Ok(std::mem::take(&mut *pending))
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
