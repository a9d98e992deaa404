//! Analysis window selection
//!
//! Tempo and key are stable enough that a minute of audio from the middle
//! of a track is representative, and far cheaper to analyze than the whole
//! file. Intros and outros are the least representative parts of a DJ
//! track, so the window is centered.

use crate::types::{AudioBuffer, DecodedAudio};

/// Default analysis window length in seconds
pub const DEFAULT_WINDOW_SECONDS: f64 = 60.0;

/// Frame range `[start, start + len)` of the centered window
pub fn window_bounds(total_frames: usize, sample_rate: u32, window_seconds: f64) -> (usize, usize) {
    let requested = (window_seconds.max(0.0) * sample_rate as f64).floor() as usize;
    let len = total_frames.min(requested);
    let start = (total_frames - len) / 2;
    (start, len)
}

/// Select the centered window and downmix it to mono
///
/// Channels are averaged sample by sample, so a hard-panned part carries
/// the same weight as one mixed to the center.
pub fn select_window(audio: &DecodedAudio, window_seconds: f64) -> AudioBuffer {
    let (start, len) = window_bounds(audio.frames(), audio.sample_rate, window_seconds);
    let end = start + len;

    let samples = match audio.channels.as_slice() {
        [] => Vec::new(),
        [mono] => mono[start..end].to_vec(),
        channels => {
            let scale = 1.0 / channels.len() as f32;
            let mut mixed = vec![0.0f32; len];
            for channel in channels {
                for (out, sample) in mixed.iter_mut().zip(&channel[start..end]) {
                    *out += *sample * scale;
                }
            }
            mixed
        }
    };

    AudioBuffer::new(samples, audio.sample_rate)
}
