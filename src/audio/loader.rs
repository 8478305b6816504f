// src/audio/loader.rs
//! Decode audio files into [`Waveform`]s using rodio's decoders.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rodio::decoder::{DecoderError, Mp4Type};
use rodio::{Decoder, Source};
use tracing::debug;

use super::format::AudioFormat;
use super::waveform::Waveform;
use crate::error::{Error, Result};

/// Decode `path` fully into memory.
///
/// The format comes from the extension and is checked before the file is
/// opened, so an unknown extension never reaches a decoder.
pub fn load_audio(path: &Path) -> Result<Waveform> {
    let format = AudioFormat::from_path(path)?;
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let reader = BufReader::new(File::open(path)?);
    let decoder = open_decoder(format, reader).map_err(|e| Error::Decode {
        format,
        details: e.to_string(),
    })?;

    let channels = decoder.channels();
    let sample_rate = decoder.sample_rate();
    let samples: Vec<f32> = decoder.convert_samples::<f32>().collect();
    let waveform = Waveform::new(channels, sample_rate, samples);

    debug!(
        path = %path.display(),
        %format,
        channels,
        sample_rate,
        duration_ms = waveform.duration_ms(),
        "decoded audio"
    );
    Ok(waveform)
}

/// Pick the decoder matching the extension instead of letting rodio sniff.
fn open_decoder(
    format: AudioFormat,
    reader: BufReader<File>,
) -> std::result::Result<Decoder<BufReader<File>>, DecoderError> {
    match format {
        AudioFormat::Wav => Decoder::new_wav(reader),
        AudioFormat::Mp3 => Decoder::new_mp3(reader),
        AudioFormat::Flac => Decoder::new_flac(reader),
        AudioFormat::Ogg => Decoder::new_vorbis(reader),
        AudioFormat::Aac => Decoder::new_aac(reader),
        AudioFormat::M4a => Decoder::new_mp4(reader, Mp4Type::M4a),
        // No WMA demuxer exists in the symphonia stack rodio builds on.
        AudioFormat::Wma => Err(DecoderError::UnrecognizedFormat),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_extension_fails_before_io() {
        // the file does not exist either; the format check must win
        let err = load_audio(Path::new("/definitely/missing/voice.xyz")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_audio(Path::new("/definitely/missing/voice.wav")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }

    #[test]
    fn wma_is_recognised_but_not_decodable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wma");
        std::fs::write(&path, b"not really wma").unwrap();
        let err = load_audio(&path).unwrap_err();
        assert!(matches!(err, Error::Decode { format: AudioFormat::Wma, .. }));
    }
}
