// src/audio/waveform.rs
//! In-memory decoded audio and the handful of editing operations the mixer needs.

use rodio::buffer::SamplesBuffer;
use rodio::source::UniformSourceIterator;

/// Convert a gain in decibels to a linear amplitude factor.
pub fn db_to_amplitude(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Decoded, interleaved `f32` samples at a fixed rate and channel count.
///
/// Every operation returns a new waveform; the receiver is never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    channels: u16,
    sample_rate: u32,
    samples: Vec<f32>,
}

impl Waveform {
    /// Build a waveform from interleaved samples. Trailing samples that do not
    /// fill a whole frame are dropped.
    pub fn new(channels: u16, sample_rate: u32, mut samples: Vec<f32>) -> Self {
        let channels = channels.max(1);
        let whole = samples.len() - samples.len() % channels as usize;
        samples.truncate(whole);
        Self {
            channels,
            sample_rate: sample_rate.max(1),
            samples,
        }
    }

    /// Digital silence of the given length.
    pub fn silent(channels: u16, sample_rate: u32, duration_ms: u64) -> Self {
        let frames = frames_for(sample_rate, duration_ms);
        Self::new(channels, sample_rate, vec![0.0; frames * channels.max(1) as usize])
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in whole milliseconds, rounded to nearest.
    pub fn duration_ms(&self) -> u64 {
        let rate = self.sample_rate as u64;
        (self.frame_count() as u64 * 1000 + rate / 2) / rate
    }

    pub fn duration_secs(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Frame index for a millisecond offset, clamped to the buffer.
    fn frame_at(&self, ms: u64) -> usize {
        frames_for(self.sample_rate, ms).min(self.frame_count())
    }

    fn slice_frames(&self, start: usize, end: usize) -> Self {
        let ch = self.channels as usize;
        let end = end.min(self.frame_count());
        let start = start.min(end);
        Self {
            channels: self.channels,
            sample_rate: self.sample_rate,
            samples: self.samples[start * ch..end * ch].to_vec(),
        }
    }

    /// The `[start_ms, end_ms)` window; out-of-range bounds are clamped.
    pub fn slice_ms(&self, start_ms: u64, end_ms: u64) -> Self {
        self.slice_frames(self.frame_at(start_ms), self.frame_at(end_ms))
    }

    /// At most the first `ms` milliseconds.
    pub fn head_ms(&self, ms: u64) -> Self {
        self.slice_frames(0, self.frame_at(ms))
    }

    /// Everything from `ms` onwards.
    pub fn skip_ms(&self, ms: u64) -> Self {
        self.slice_frames(self.frame_at(ms), self.frame_count())
    }

    /// Exactly `frames` frames, cut short if the buffer is shorter.
    pub fn truncate_frames(&self, frames: usize) -> Self {
        self.slice_frames(0, frames)
    }

    pub fn with_gain_db(&self, db: f32) -> Self {
        let factor = db_to_amplitude(db);
        Self {
            channels: self.channels,
            sample_rate: self.sample_rate,
            samples: self.samples.iter().map(|s| s * factor).collect(),
        }
    }

    /// This waveform played back-to-back `times` times.
    pub fn repeated(&self, times: usize) -> Self {
        Self {
            channels: self.channels,
            sample_rate: self.sample_rate,
            samples: self.samples.repeat(times),
        }
    }

    /// Resample and remix to the requested layout via rodio's uniform source.
    pub fn conform(&self, channels: u16, sample_rate: u32) -> Self {
        if channels == self.channels && sample_rate == self.sample_rate {
            return self.clone();
        }
        let source = SamplesBuffer::new(self.channels, self.sample_rate, self.samples.clone());
        let samples: Vec<f32> =
            UniformSourceIterator::<SamplesBuffer<f32>, f32>::new(source, channels, sample_rate)
                .collect();
        Self::new(channels, sample_rate, samples)
    }

    /// Append `next`, blending the last `crossfade_ms` of `self` into the first
    /// `crossfade_ms` of `next` with a linear ramp.
    ///
    /// The overlap is shared, so the result is `len(self) + len(next) - overlap`.
    /// The overlap is clamped to the shorter of the two sides.
    pub fn append_crossfade(&self, next: &Waveform, crossfade_ms: u64) -> Self {
        let next = next.conform(self.channels, self.sample_rate);
        let ch = self.channels as usize;
        let overlap = frames_for(self.sample_rate, crossfade_ms)
            .min(self.frame_count())
            .min(next.frame_count());

        let head_frames = self.frame_count() - overlap;
        let mut samples = Vec::with_capacity(self.samples.len() + next.samples.len() - overlap * ch);
        samples.extend_from_slice(&self.samples[..head_frames * ch]);

        for frame in 0..overlap {
            let t = frame as f32 / overlap as f32;
            for c in 0..ch {
                let out = self.samples[(head_frames + frame) * ch + c];
                let inc = next.samples[frame * ch + c];
                samples.push(out * (1.0 - t) + inc * t);
            }
        }
        samples.extend_from_slice(&next.samples[overlap * ch..]);

        Self {
            channels: self.channels,
            sample_rate: self.sample_rate,
            samples,
        }
    }

    /// Mix `other` into `self` starting at `position_ms`, sample by sample.
    ///
    /// The result keeps the length of `self`; anything of `other` past the end
    /// is dropped. Sums are clipped to `[-1.0, 1.0]`.
    pub fn overlay(&self, other: &Waveform, position_ms: u64) -> Self {
        let other = other.conform(self.channels, self.sample_rate);
        let ch = self.channels as usize;
        let mut samples = self.samples.clone();
        let offset = self.frame_at(position_ms) * ch;

        for (dst, src) in samples[offset..].iter_mut().zip(other.samples.iter()) {
            *dst = (*dst + src).clamp(-1.0, 1.0);
        }

        Self {
            channels: self.channels,
            sample_rate: self.sample_rate,
            samples,
        }
    }

    /// Hand the buffer to rodio as a playable source.
    pub fn into_source(self) -> SamplesBuffer<f32> {
        SamplesBuffer::new(self.channels, self.sample_rate, self.samples)
    }
}

/// Number of frames covering `ms` milliseconds at `sample_rate`.
pub(crate) fn frames_for(sample_rate: u32, ms: u64) -> usize {
    (ms * sample_rate as u64 / 1000) as usize
}
