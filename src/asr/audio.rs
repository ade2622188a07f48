//! Audio input plumbing.
//!
//! The engine consumes 16 kHz mono `f32` samples; uploads arrive as WAV
//! files in whatever layout the client recorded. This module reads a WAV
//! file, downmixes to mono, and resamples to the engine rate.

use std::borrow::Cow;
use std::path::Path;

use crate::config::audio::SAMPLE_RATE;
use crate::error::{AppError, Result};

/// Get the length of audio in seconds at the engine sample rate.
pub fn audio_len_secs(samples: &[f32]) -> f64 {
    samples.len() as f64 / SAMPLE_RATE as f64
}

/// Read a WAV file and return mono f32 samples at 16 kHz.
///
/// Supports 16-bit integer and 32-bit float PCM. Multi-channel input is
/// downmixed by averaging; other sample rates are resampled with linear
/// interpolation.
pub fn read_wav_mono_16k(path: &Path) -> Result<Vec<f32>> {
    let mut reader = hound::WavReader::open(path)
        .map_err(|e| AppError::Audio(format!("failed to open WAV file: {e}")))?;
    let spec = reader.spec();

    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .map(|s| s.map_err(|e| AppError::Audio(e.to_string())))
            .collect::<Result<_>>()?,
        (hound::SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| {
                s.map(|v| v as f32 / 32768.0)
                    .map_err(|e| AppError::Audio(e.to_string()))
            })
            .collect::<Result<_>>()?,
        (format, bits) => {
            return Err(AppError::Audio(format!(
                "unsupported WAV format: {bits}-bit {format:?}"
            )))
        }
    };

    let mono = downmix(&interleaved, channels);
    Ok(resample_linear(&mono, spec.sample_rate, SAMPLE_RATE).into_owned())
}

/// Average interleaved frames down to a single channel.
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels == 1 {
        return interleaved.to_vec();
    }

    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Resample audio using linear interpolation.
fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Cow<'_, [f32]> {
    if from_rate == to_rate {
        return Cow::Borrowed(samples);
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let new_len = (samples.len() as f64 * ratio) as usize;
    let mut output = Vec::with_capacity(new_len);
    for i in 0..new_len {
        let src_idx = i as f64 / ratio;
        let idx = src_idx.floor() as usize;
        let frac = src_idx.fract() as f32;
        let sample = if idx + 1 < samples.len() {
            samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
        } else if idx < samples.len() {
            samples[idx]
        } else {
            0.0
        };
        output.push(sample);
    }
    Cow::Owned(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_wav_i16(dir: &Path, name: &str, rate: u32, channels: u16, frames: usize) -> PathBuf {
        let path = dir.join(name);
        let spec = hound::WavSpec {
            channels,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..frames {
            for _ in 0..channels {
                writer.write_sample((i % 100) as i16 * 100).unwrap();
            }
        }
        writer.finalize().unwrap();
        path
    }

    #[test]
    fn test_mono_16k_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_wav_i16(dir.path(), "mono.wav", 16000, 1, 1600);
        let samples = read_wav_mono_16k(&path).unwrap();
        assert_eq!(samples.len(), 1600);
        assert!((audio_len_secs(&samples) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_stereo_is_downmixed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_wav_i16(dir.path(), "stereo.wav", 16000, 2, 800);
        let samples = read_wav_mono_16k(&path).unwrap();
        assert_eq!(samples.len(), 800);
    }

    #[test]
    fn test_8k_input_is_resampled() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_wav_i16(dir.path(), "slow.wav", 8000, 1, 800);
        let samples = read_wav_mono_16k(&path).unwrap();
        assert_eq!(samples.len(), 1600);
    }

    #[test]
    fn test_f32_format_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..160 {
            writer.write_sample(0.25f32).unwrap();
        }
        writer.finalize().unwrap();

        let samples = read_wav_mono_16k(&path).unwrap();
        assert_eq!(samples.len(), 160);
        assert!((samples[0] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_unreadable_file_is_an_audio_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-audio.wav");
        std::fs::write(&path, b"definitely not a wav").unwrap();
        let err = read_wav_mono_16k(&path).unwrap_err();
        assert!(matches!(err, AppError::Audio(_)));
    }

    #[test]
    fn test_resample_identity() {
        let samples = vec![0.0, 0.5, 1.0];
        let out = resample_linear(&samples, 16000, 16000);
        assert_eq!(out.as_ref(), samples.as_slice());
    }
}
