// src/audio/mixer.rs
//! Lay a voice track over a looped, attenuated music bed.

use tracing::{debug, warn};

use super::waveform::{frames_for, Waveform};
use crate::error::{Error, Result};

/// Length of the music-only intro before the voice comes in.
pub const DEFAULT_INTRO_MS: u64 = 3000;
/// Overlap between the intro tail and the voice head.
pub const DEFAULT_CROSSFADE_MS: u64 = 1000;
pub const DEFAULT_BG_VOLUME: f32 = 0.5;

/// Knobs for [`mix_background`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixSettings {
    /// Background level in `0.0..=1.0`.
    pub bg_volume: f32,
    pub intro_ms: u64,
    pub crossfade_ms: u64,
}

impl Default for MixSettings {
    fn default() -> Self {
        Self {
            bg_volume: DEFAULT_BG_VOLUME,
            intro_ms: DEFAULT_INTRO_MS,
            crossfade_ms: DEFAULT_CROSSFADE_MS,
        }
    }
}

/// Gain applied to the music bed, in decibels.
///
/// Linear in `volume` on the decibel scale: 1.0 leaves the music untouched and
/// 0.0 drops it by 10 dB. It never reaches silence.
pub fn background_gain_db(volume: f32) -> f32 {
    -10.0 * (1.0 - volume)
}

/// Repeat `music` until it covers `length_ms`, then cut it to exactly that length.
pub fn loop_to_length(music: &Waveform, length_ms: u64) -> Result<Waveform> {
    if music.is_empty() {
        return Err(Error::EmptyAudioSource("background music".into()));
    }
    let target = frames_for(music.sample_rate(), length_ms);
    let repetitions = target.div_ceil(music.frame_count()).max(1);
    Ok(music.repeated(repetitions).truncate_frames(target))
}

/// Produce the mixed track: music intro, crossfade into the voice, then the
/// music bed underneath the rest of the voice.
///
/// Both inputs are first brought to a shared layout (the wider channel count
/// and the higher sample rate).
pub fn mix_background(voice: &Waveform, music: &Waveform, settings: &MixSettings) -> Result<Waveform> {
    if !(0.0..=1.0).contains(&settings.bg_volume) {
        return Err(Error::InvalidVolume(settings.bg_volume));
    }
    if music.is_empty() {
        return Err(Error::EmptyAudioSource("background music".into()));
    }
    if voice.is_empty() {
        warn!("voice track is empty; output will contain only the intro");
    }

    let channels = voice.channels().max(music.channels());
    let sample_rate = voice.sample_rate().max(music.sample_rate());
    let voice = voice.conform(channels, sample_rate);
    let music = music
        .conform(channels, sample_rate)
        .with_gain_db(background_gain_db(settings.bg_volume));

    let intro = music.head_ms(settings.intro_ms);
    let bed = loop_to_length(&music, voice.duration_ms())?;

    debug!(
        voice_ms = voice.duration_ms(),
        music_ms = music.duration_ms(),
        intro_ms = intro.duration_ms(),
        crossfade_ms = settings.crossfade_ms,
        gain_db = background_gain_db(settings.bg_volume),
        "mixing background"
    );

    let joined = intro.append_crossfade(&voice, settings.crossfade_ms);
    Ok(joined.overlay(&bed.skip_ms(settings.crossfade_ms), 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(ms: u64, level: f32) -> Waveform {
        let w = Waveform::silent(1, 8000, ms);
        Waveform::new(1, 8000, vec![level; w.samples().len()])
    }

    #[test]
    fn gain_is_linear_in_decibels() {
        assert_eq!(background_gain_db(1.0), 0.0);
        assert_eq!(background_gain_db(0.0), -10.0);
        assert_eq!(background_gain_db(0.5), -5.0);
    }

    #[test]
    fn bed_is_looped_then_truncated() {
        let music = tone(3000, 0.1);
        for voice_ms in [500, 3000, 7000, 10_001] {
            let bed = loop_to_length(&music, voice_ms).unwrap();
            assert_eq!(bed.duration_ms(), voice_ms);
            let reps = (voice_ms as usize).div_ceil(3000);
            assert!(music.duration_ms() as usize * reps >= voice_ms as usize);
        }
    }

    #[test]
    fn empty_music_is_rejected() {
        let empty = Waveform::new(1, 8000, Vec::new());
        assert!(matches!(loop_to_length(&empty, 1000), Err(Error::EmptyAudioSource(_))));
        assert!(matches!(
            mix_background(&tone(1000, 0.1), &empty, &MixSettings::default()),
            Err(Error::EmptyAudioSource(_))
        ));
    }

    #[test]
    fn volume_out_of_range_is_rejected() {
        let settings = MixSettings { bg_volume: 1.5, ..MixSettings::default() };
        assert!(matches!(
            mix_background(&tone(1000, 0.1), &tone(1000, 0.1), &settings),
            Err(Error::InvalidVolume(_))
        ));
    }

    #[test]
    fn output_is_intro_plus_voice_minus_overlap() {
        let out = mix_background(&tone(10_000, 0.2), &tone(4000, 0.1), &MixSettings::default()).unwrap();
        assert_eq!(out.duration_ms(), 12_000);
    }

    #[test]
    fn full_volume_leaves_music_level_in_intro() {
        let settings = MixSettings { bg_volume: 1.0, ..MixSettings::default() };
        let out = mix_background(&tone(10_000, 0.0), &tone(5000, 0.25), &settings).unwrap();
        // first sample: intro (0.25) plus the bed offset by the crossfade (0.25)
        assert!((out.samples()[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn zero_volume_attenuates_by_ten_decibels() {
        let settings = MixSettings { bg_volume: 0.0, ..MixSettings::default() };
        let out = mix_background(&tone(10_000, 0.0), &tone(5000, 0.25), &settings).unwrap();
        let expected = 2.0 * 0.25 * crate::audio::waveform::db_to_amplitude(-10.0);
        assert!((out.samples()[0] - expected).abs() < 1e-5);
        assert!(out.samples()[0] > 0.0);
    }

    #[test]
    fn layouts_are_reconciled() {
        let voice = Waveform::silent(1, 8000, 2000);
        let music = Waveform::silent(2, 16_000, 1000);
        let out = mix_background(&voice, &music, &MixSettings::default()).unwrap();
        assert_eq!(out.channels(), 2);
        assert_eq!(out.sample_rate(), 16_000);
    }
}
