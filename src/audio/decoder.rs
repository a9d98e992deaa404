//! Audio decoding using symphonia
//!
//! Decodes a whole file to planar f32 PCM at its native sample rate.
//! Window selection, downmixing and resampling happen afterwards, on the
//! analysis window only.

use crate::cancel::CancelToken;
use crate::error::DecodeError;
use crate::types::DecodedAudio;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, trace};

/// Maximum file size we'll attempt to decode (2GB)
/// Prevents OOM on extremely large files
const MAX_FILE_SIZE: u64 = 2 * 1024 * 1024 * 1024;

/// Turns a file path into planar PCM
pub trait AudioDecoder: Send + Sync {
    /// Decode `path`, polling `cancel` between packets
    fn decode(&self, path: &Path, cancel: &CancelToken) -> Result<DecodedAudio, DecodeError>;
}

impl<D: AudioDecoder + ?Sized> AudioDecoder for std::sync::Arc<D> {
    fn decode(&self, path: &Path, cancel: &CancelToken) -> Result<DecodedAudio, DecodeError> {
        (**self).decode(path, cancel)
    }
}

/// Whole-file decoder backed by symphonia
#[derive(Debug, Clone, Default)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl AudioDecoder for SymphoniaDecoder {
    fn decode(&self, path: &Path, cancel: &CancelToken) -> Result<DecodedAudio, DecodeError> {
        decode(path, cancel)
    }
}

/// Decode an audio file to planar samples
pub fn decode(path: &Path, cancel: &CancelToken) -> Result<DecodedAudio, DecodeError> {
    // Check file size before attempting to decode
    let metadata = std::fs::metadata(path)
        .map_err(|e| DecodeError::failed(path, format!("Failed to read file metadata: {}", e)))?;

    if metadata.len() > MAX_FILE_SIZE {
        return Err(DecodeError::failed(
            path,
            format!(
                "File too large ({:.1} GB). Maximum supported size is 2 GB.",
                metadata.len() as f64 / (1024.0 * 1024.0 * 1024.0)
            ),
        ));
    }

    let file = std::fs::File::open(path)
        .map_err(|e| DecodeError::failed(path, format!("Failed to open file: {}", e)))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Provide a hint based on file extension
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| DecodeError::failed(path, format!("Failed to probe format: {}", e)))?;

    let mut format = probed.format;

    // Find the first audio track
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| DecodeError::failed(path, "No audio tracks found"))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let mut sample_rate = codec_params.sample_rate.unwrap_or(0);

    debug!(
        "Decoding: {} @ {}Hz, {} channels",
        path.display(),
        sample_rate,
        codec_params.channels.map(|c| c.count()).unwrap_or(0)
    );

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::failed(path, format!("Failed to create decoder: {}", e)))?;

    let mut channels: Vec<Vec<f32>> = Vec::new();

    loop {
        if cancel.is_cancelled() {
            debug!("Decode of {} abandoned", path.display());
            return Err(DecodeError::Cancelled(path.to_path_buf()));
        }

        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break; // End of stream
            }
            Err(e) => {
                return Err(DecodeError::failed(path, format!("Failed to read packet: {}", e)));
            }
        };

        // Skip packets from other tracks
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(symphonia::core::errors::Error::DecodeError(e)) => {
                // Skip corrupted frames
                trace!("Skipping corrupted frame: {}", e);
                continue;
            }
            Err(e) => {
                return Err(DecodeError::failed(path, format!("Decode error: {}", e)));
            }
        };

        let spec = *decoded.spec();
        let channel_count = spec.channels.count();
        if channel_count == 0 {
            continue;
        }
        if sample_rate == 0 {
            sample_rate = spec.rate;
        }
        if channels.is_empty() {
            channels = vec![Vec::new(); channel_count];
        }

        let num_frames = decoded.frames();
        let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        deinterleave_into(&mut channels, sample_buf.samples());
    }

    if channels.is_empty() || channels[0].is_empty() {
        return Err(DecodeError::failed(path, "File contains no audio samples"));
    }
    if sample_rate == 0 {
        return Err(DecodeError::failed(path, "Unknown sample rate"));
    }

    let audio = DecodedAudio::new(channels, sample_rate);
    debug!(
        "Decoded {} frames x {} channels ({:.2}s)",
        audio.frames(),
        audio.channel_count(),
        audio.duration()
    );

    Ok(audio)
}

/// Append interleaved frames to per-channel vectors
///
/// Frames are split by `channels.len()`; a trailing partial frame is dropped.
fn deinterleave_into(channels: &mut [Vec<f32>], interleaved: &[f32]) {
    let channel_count = channels.len();
    if channel_count == 0 {
        return;
    }

    for frame in interleaved.chunks_exact(channel_count) {
        for (channel, sample) in channels.iter_mut().zip(frame) {
            channel.push(*sample);
        }
    }
}
