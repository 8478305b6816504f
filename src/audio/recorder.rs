// src/audio/recorder.rs
//! Fixed-length clips from the default input device.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use rodio::cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rodio::cpal::{self, FromSample, Sample, SampleFormat, SizedSample, StreamConfig};
use tracing::{debug, info, warn};

use super::export::export;
use super::waveform::Waveform;
use crate::error::{Error, Result};

/// Rate and layout the recognizer expects.
pub const RECOGNITION_RATE: u32 = 16_000;

type Captured = Arc<Mutex<Vec<f32>>>;

pub struct Microphone {
    device: cpal::Device,
    config: StreamConfig,
    format: SampleFormat,
}

fn recording_err(e: impl ToString) -> Error {
    Error::Recording(e.to_string())
}

impl Microphone {
    /// The host's default input device in its default configuration.
    pub fn open_default() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| recording_err("no default input device"))?;
        let supported = device.default_input_config().map_err(recording_err)?;
        debug!(
            device = %device.name().unwrap_or_default(),
            channels = supported.channels(),
            rate = supported.sample_rate().0,
            format = ?supported.sample_format(),
            "input device opened"
        );
        Ok(Self {
            format: supported.sample_format(),
            config: supported.config(),
            device,
        })
    }

    /// Capture `duration` of audio in the device's own layout.
    pub fn record(&self, duration: Duration) -> Result<Waveform> {
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));
        let stream = match self.format {
            SampleFormat::F32 => self.input_stream::<f32>(&captured)?,
            SampleFormat::I16 => self.input_stream::<i16>(&captured)?,
            SampleFormat::U16 => self.input_stream::<u16>(&captured)?,
            other => return Err(recording_err(format!("unsupported sample format {other:?}"))),
        };

        stream.play().map_err(recording_err)?;
        info!(seconds = duration.as_secs_f32(), "listening");
        thread::sleep(duration);
        drop(stream);

        let samples = captured
            .lock()
            .map(|s| s.clone())
            .map_err(|_| recording_err("capture buffer poisoned"))?;
        Ok(Waveform::new(self.config.channels, self.config.sample_rate.0, samples))
    }

    /// Record a mono 16 kHz wav clip for speech recognition.
    pub fn record_wav(&self, duration: Duration, path: &Path) -> Result<()> {
        let clip = self.record(duration)?.conform(1, RECOGNITION_RATE);
        export(&clip, path)?;
        Ok(())
    }

    fn input_stream<T>(&self, captured: &Captured) -> Result<cpal::Stream>
    where
        T: SizedSample,
        f32: FromSample<T>,
    {
        let sink = Arc::clone(captured);
        self.device
            .build_input_stream(
                &self.config,
                move |data: &[T], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut s) = sink.lock() {
                        s.extend(data.iter().map(|&x| x.to_sample::<f32>()));
                    }
                },
                |err| warn!(error = %err, "input stream error"),
                None,
            )
            .map_err(recording_err)
    }
}
