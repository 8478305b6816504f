// src/audio/export.rs
//! Encode a [`Waveform`] into the container named by the output path.

use std::fs;
use std::path::Path;

use mp3lame_encoder::{Bitrate, Builder, FlushNoGap, InterleavedPcm, MonoPcm, Quality};
use tracing::info;

use super::format::AudioFormat;
use super::waveform::Waveform;
use crate::error::{Error, Result};

/// Write `waveform` to `path`, creating parent directories as needed.
///
/// Returns the format that was written. Only wav and mp3 have encoders; the
/// other recognised formats fail with [`Error::EncoderUnavailable`].
pub fn export(waveform: &Waveform, path: &Path) -> Result<AudioFormat> {
    let format = AudioFormat::from_path(path)?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }

    match format {
        AudioFormat::Wav => write_wav(waveform, path)?,
        AudioFormat::Mp3 => write_mp3(waveform, path)?,
        other => return Err(Error::EncoderUnavailable(other)),
    }

    info!(
        path = %path.display(),
        %format,
        mime = %format.mime(),
        duration_ms = waveform.duration_ms(),
        "exported audio"
    );
    Ok(format)
}

/// Scale a float sample to 16-bit PCM.
fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

fn write_wav(waveform: &Waveform, path: &Path) -> Result<()> {
    let spec = hound::WavSpec {
        channels: waveform.channels(),
        sample_rate: waveform.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let encode_err = |e: hound::Error| Error::Encode {
        format: AudioFormat::Wav,
        details: e.to_string(),
    };

    let mut writer = hound::WavWriter::create(path, spec).map_err(encode_err)?;
    for &sample in waveform.samples() {
        writer.write_sample(to_pcm16(sample)).map_err(encode_err)?;
    }
    writer.finalize().map_err(encode_err)
}

fn write_mp3(waveform: &Waveform, path: &Path) -> Result<()> {
    let encode_err = |details: String| Error::Encode {
        format: AudioFormat::Mp3,
        details,
    };

    // LAME takes mono or interleaved stereo only
    let waveform = if waveform.channels() > 2 {
        waveform.conform(2, waveform.sample_rate())
    } else {
        waveform.clone()
    };

    let mut builder = Builder::new().ok_or_else(|| encode_err("LAME init failed".into()))?;
    builder
        .set_num_channels(waveform.channels() as u8)
        .map_err(|e| encode_err(format!("channels: {e:?}")))?;
    builder
        .set_sample_rate(waveform.sample_rate())
        .map_err(|e| encode_err(format!("sample rate: {e:?}")))?;
    builder
        .set_brate(Bitrate::Kbps192)
        .map_err(|e| encode_err(format!("bitrate: {e:?}")))?;
    builder
        .set_quality(Quality::Best)
        .map_err(|e| encode_err(format!("quality: {e:?}")))?;
    let mut encoder = builder
        .build()
        .map_err(|e| encode_err(format!("build: {e:?}")))?;

    let pcm: Vec<i16> = waveform.samples().iter().map(|&s| to_pcm16(s)).collect();
    let mut out: Vec<u8> = Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(pcm.len()));

    let encoded = if waveform.channels() == 1 {
        encoder.encode_to_vec(MonoPcm(&pcm), &mut out)
    } else {
        encoder.encode_to_vec(InterleavedPcm(&pcm), &mut out)
    };
    encoded.map_err(|e| encode_err(format!("encode: {e:?}")))?;

    // room for the last LAME frames
    out.reserve(7200);
    encoder
        .flush_to_vec::<FlushNoGap>(&mut out)
        .map_err(|e| encode_err(format!("flush: {e:?}")))?;

    fs::write(path, out)?;
    Ok(())
}
