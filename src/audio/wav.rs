//! WAV read/write for recognition scratch files.
//!
//! Segments are written as 16-bit PCM (the format speech engines expect)
//! and read back as normalized f32, with mono downmix and resampling for
//! files that do not match the pipeline's native format.

use crate::defaults::SAMPLE_RATE;
use crate::error::{EchoscribeError, Result};
use std::path::Path;

/// Write mono f32 samples to `path` as a 16-bit PCM WAV.
///
/// Samples are clamped to [-1.0, 1.0] before quantization.
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec).map_err(|e| {
        EchoscribeError::Resource {
            message: format!("Failed to create WAV at {}: {}", path.display(), e),
        }
    })?;

    for &sample in samples {
        let quantized = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(quantized)
            .map_err(|e| EchoscribeError::Resource {
                message: format!("Failed to write WAV sample: {}", e),
            })?;
    }

    writer.finalize().map_err(|e| EchoscribeError::Resource {
        message: format!("Failed to finalize WAV: {}", e),
    })
}

/// Read a WAV file back as mono f32 at the pipeline sample rate.
///
/// Handles 16-bit integer and 32-bit float sources, downmixes multi-channel
/// audio by averaging, and resamples when the file rate differs from 16kHz.
pub fn read_wav(path: &Path) -> Result<Vec<f32>> {
    let mut reader = hound::WavReader::open(path).map_err(|e| EchoscribeError::Resource {
        message: format!("Failed to open WAV at {}: {}", path.display(), e),
    })?;

    let spec = reader.spec();
    let source_rate = spec.sample_rate;
    let channels = spec.channels as usize;

    let raw: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| EchoscribeError::Resource {
                message: format!("Failed to read WAV samples: {}", e),
            })?,
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| EchoscribeError::Resource {
                message: format!("Failed to read WAV samples: {}", e),
            })?,
    };

    // Downmix to mono by averaging channels
    let mono: Vec<f32> = if channels <= 1 {
        raw
    } else {
        raw.chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    // Resample to the pipeline rate if needed
    if source_rate == SAMPLE_RATE {
        Ok(mono)
    } else {
        Ok(resample(&mono, source_rate, SAMPLE_RATE))
    }
}

/// Simple linear interpolation resampling.
pub(crate) fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = (source_pos - source_idx as f64) as f32;

            if source_idx + 1 >= samples.len() {
                samples[samples.len() - 1]
            } else {
                let left = samples[source_idx];
                let right = samples[source_idx + 1];
                left + (right - left) * fraction
            }
        })
        .collect()
}
