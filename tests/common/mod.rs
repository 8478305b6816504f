//! Fixture audio written with hound.

use std::f32::consts::TAU;
use std::path::Path;

/// Write a 16-bit sine wave of `duration_ms` to `path`.
pub fn write_sine(path: &Path, channels: u16, sample_rate: u32, duration_ms: u64, freq: f32) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let frames = sample_rate as u64 * duration_ms / 1000;
    for n in 0..frames {
        let value = (TAU * freq * n as f32 / sample_rate as f32).sin() * 0.3;
        for _ in 0..channels {
            writer.write_sample((value * i16::MAX as f32) as i16).unwrap();
        }
    }
    writer.finalize().unwrap();
}

/// Duration of a wav file in milliseconds, from its header.
#[allow(dead_code)]
pub fn wav_duration_ms(path: &Path) -> u64 {
    let reader = hound::WavReader::open(path).unwrap();
    let spec = reader.spec();
    reader.duration() as u64 * 1000 / spec.sample_rate as u64
}
