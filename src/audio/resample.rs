//! Resampling of the analysis window
//!
//! The engine sees every track at the same rate regardless of the source
//! file, so its tempo and key models are calibrated once. Only the
//! windowed mono buffer is resampled, never the whole decode.

use crate::types::AudioBuffer;
use rubato::{FftFixedInOut, Resampler};
use tracing::debug;

/// Default rate fed to the feature engine
pub const ANALYSIS_SAMPLE_RATE: u32 = 44100;

/// Frames per rubato chunk
const CHUNK_SIZE: usize = 1024;

/// Resample a mono buffer to `to_rate`; a no-op when the rates already match
pub fn resample_buffer(buffer: AudioBuffer, to_rate: u32) -> AudioBuffer {
    if buffer.sample_rate == to_rate || buffer.sample_rate == 0 || buffer.is_empty() {
        return buffer;
    }
    let samples = resample(&buffer.samples, buffer.sample_rate, to_rate);
    AudioBuffer::new(samples, to_rate)
}

/// FFT-based resampling with an anti-aliasing filter
///
/// Falls back to linear interpolation if rubato cannot be set up for the
/// requested ratio.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate {
        return samples.to_vec();
    }

    let mut resampler =
        match FftFixedInOut::<f32>::new(from_rate as usize, to_rate as usize, CHUNK_SIZE, 1) {
            Ok(r) => r,
            Err(e) => {
                debug!("Rubato initialization failed ({}), using linear fallback", e);
                return resample_linear(samples, from_rate, to_rate);
            }
        };

    let chunk_in = resampler.input_frames_next();
    let chunk_out = resampler.output_frames_next();

    let ratio = to_rate as f64 / from_rate as f64;
    let mut output = Vec::with_capacity((samples.len() as f64 * ratio).ceil() as usize);

    let mut pos = 0;
    while pos < samples.len() {
        let end = (pos + chunk_in).min(samples.len());
        let mut chunk = samples[pos..end].to_vec();
        // Zero-pad the final chunk
        chunk.resize(chunk_in, 0.0);

        match resampler.process(&[chunk], None) {
            Ok(resampled) => {
                if let Some(channel) = resampled.first() {
                    let valid = if end - pos < chunk_in {
                        ((end - pos) as f64 * ratio).ceil() as usize
                    } else {
                        chunk_out
                    };
                    output.extend_from_slice(&channel[..valid.min(channel.len())]);
                }
            }
            Err(e) => {
                debug!("Rubato processing error ({}), using linear fallback for the rest", e);
                output.extend(resample_linear(&samples[pos..], from_rate, to_rate));
                break;
            }
        }

        pos += chunk_in;
    }

    output
}

/// Linear interpolation; may alias, used only when rubato is unavailable
fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let step = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / step) as usize;
    let last = samples.len() - 1;

    (0..output_len)
        .map(|i| {
            let src = i as f64 * step;
            let idx = src as usize;
            let frac = (src - idx as f64) as f32;
            if idx < last {
                samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
            } else {
                samples[last]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_identity() {
        let samples = vec![0.1, 0.2, 0.3, 0.4, 0.5];
        assert_eq!(resample(&samples, 44100, 44100), samples);
    }

    #[test]
    fn test_resample_downsample_length() {
        let samples: Vec<f32> = (0..1000).map(|i| i as f32 / 1000.0).collect();
        let result = resample(&samples, 88200, 44100);
        assert!((result.len() as f64 - 500.0).abs() < 2.0);
    }

    #[test]
    fn test_resample_upsample_length() {
        let samples: Vec<f32> = (0..1000).map(|i| i as f32 / 1000.0).collect();
        let result = resample(&samples, 22050, 44100);
        assert!((result.len() as f64 - 2000.0).abs() < 10.0);
    }

    #[test]
    fn test_resample_buffer_updates_rate() {
        let buffer = AudioBuffer::new(vec![0.0; 4800], 48000);
        let out = resample_buffer(buffer, ANALYSIS_SAMPLE_RATE);
        assert_eq!(out.sample_rate, ANALYSIS_SAMPLE_RATE);
        assert!((out.len() as f64 - 4410.0).abs() < 5.0);
    }

    #[test]
    fn test_linear_fallback_length() {
        let samples: Vec<f32> = (0..100).map(|i| i as f32 / 100.0).collect();
        let result = resample_linear(&samples, 44100, 22050);
        assert!((result.len() as f64 - 50.0).abs() < 2.0);
    }
}
