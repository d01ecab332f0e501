//! Frame types for the capture path.
//!
//! The audio producer turns raw sample buffers into [`AudioFrame`]s and keeps
//! them in a [`FrameHistory`] until the session stops.

use std::collections::VecDeque;

/// One classified audio frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioFrame {
    /// Session time of the frame's first sample, in seconds.
    pub time_seconds: f64,
    /// Length of the frame in seconds, derived from sample count and rate.
    pub duration_seconds: f64,
    /// RMS energy of the frame (0.0 to 1.0).
    pub energy: f32,
    /// Whether the energy reached the silence threshold.
    pub voiced: bool,
}

impl AudioFrame {
    /// Session time just past the frame's last sample.
    pub fn end_seconds(&self) -> f64 {
        self.time_seconds + self.duration_seconds
    }
}

/// Bounded ring of frames for one session.
///
/// Once full, each push evicts the oldest frame. The number of evicted frames
/// is kept so callers can tell the analysis only covers the tail.
#[derive(Debug, Clone)]
pub struct FrameHistory {
    frames: VecDeque<AudioFrame>,
    capacity: usize,
    dropped: u64,
}

impl FrameHistory {
    /// Creates an empty history holding at most `capacity` frames.
    ///
    /// Storage grows with the frames pushed; `capacity` only bounds it.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            frames: VecDeque::new(),
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    /// Sizes a history for `max_secs` of audio cut into `frame_samples` frames.
    pub fn for_session(max_secs: u64, sample_rate: u32, frame_samples: usize) -> Self {
        let total_samples = max_secs.saturating_mul(u64::from(sample_rate));
        let frames = total_samples.div_ceil(frame_samples.max(1) as u64);
        Self::with_capacity(usize::try_from(frames).unwrap_or(usize::MAX))
    }

    /// Appends a frame, evicting the oldest one when full.
    pub fn push(&mut self, frame: AudioFrame) {
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
            self.dropped += 1;
        }
        self.frames.push_back(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of frames evicted because the ring was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn iter(&self) -> impl Iterator<Item = &AudioFrame> {
        self.frames.iter()
    }

    /// Freezes the history into a contiguous, time-ordered vector.
    pub fn into_vec(self) -> Vec<AudioFrame> {
        self.frames.into()
    }
}

/// Cuts arbitrarily sized sample buffers into fixed-size frames.
///
/// Leftover samples are carried to the next call. The pending buffer never
/// grows past one frame.
#[derive(Debug)]
pub struct FrameAssembler {
    frame_samples: usize,
    pending: Vec<i16>,
}

impl FrameAssembler {
    pub fn new(frame_samples: usize) -> Self {
        let frame_samples = frame_samples.max(1);
        Self {
            frame_samples,
            pending: Vec::with_capacity(frame_samples),
        }
    }

    /// Feeds samples and calls `emit` once per completed frame.
    pub fn push<F>(&mut self, mut samples: &[i16], mut emit: F)
    where
        F: FnMut(&[i16]),
    {
        if !self.pending.is_empty() {
            let needed = self.frame_samples - self.pending.len();
            let take = needed.min(samples.len());
            self.pending.extend_from_slice(&samples[..take]);
            samples = &samples[take..];
            if self.pending.len() < self.frame_samples {
                return;
            }
            emit(&self.pending);
            self.pending.clear();
        }

        let mut chunks = samples.chunks_exact(self.frame_samples);
        for chunk in &mut chunks {
            emit(chunk);
        }
        self.pending.extend_from_slice(chunks.remainder());
    }

    /// Emits the trailing partial frame, if any.
    pub fn flush<F>(&mut self, mut emit: F)
    where
        F: FnMut(&[i16]),
    {
        if !self.pending.is_empty() {
            emit(&self.pending);
            self.pending.clear();
        }
    }

    pub fn frame_samples(&self) -> usize {
        self.frame_samples
    }
}
