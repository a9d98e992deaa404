//! Stratum-DSP based feature extraction
//!
//! Binds the stratum-dsp library, a pure-Rust tempo/key analyzer designed
//! for DJ applications, behind the [`FeatureEngine`] contract.
//!
//! stratum-dsp owns no global state, so one `StratumEngine` can be shared
//! by concurrent sessions. Its one-pass cache only hands a result back for
//! the buffer it was computed from; anything else is analyzed afresh.

use crate::analysis::traits::FeatureEngine;
use crate::error::EngineFault;
use crate::types::{AudioBuffer, KeyEstimate, PitchClass, Scale};
use std::sync::Mutex;
use stratum_dsp::{analyze_audio, AnalysisConfig, Key};
use tracing::debug;

const ENGINE_NAME: &str = "stratum-dsp";

/// Identity of a buffer: address, length, rate and the edge samples
#[derive(Debug, Clone, Copy, PartialEq)]
struct BufferId {
    ptr: usize,
    len: usize,
    sample_rate: u32,
    first: u32,
    last: u32,
}

impl BufferId {
    fn of(buffer: &AudioBuffer) -> Self {
        Self {
            ptr: buffer.samples.as_ptr() as usize,
            len: buffer.len(),
            sample_rate: buffer.sample_rate,
            first: buffer.samples.first().map_or(0, |s| s.to_bits()),
            last: buffer.samples.last().map_or(0, |s| s.to_bits()),
        }
    }
}

/// Both features from one stratum-dsp pass
#[derive(Debug, Clone)]
struct Features {
    bpm: f64,
    key: Option<KeyEstimate>,
}

/// Feature engine using stratum-dsp
///
/// Tempo uses autocorrelation and comb filterbank analysis; key uses
/// chroma-based template matching. stratum-dsp computes both in one pass,
/// so the tempo call keeps its result for the key call on the same buffer.
/// The key call takes it back out, leaving nothing cached between tracks.
pub struct StratumEngine {
    /// Tempo search bounds handed to stratum-dsp, before octave folding
    search_range: Option<(f32, f32)>,
    last: Mutex<Option<(BufferId, Features)>>,
}

impl StratumEngine {
    pub fn new() -> Self {
        Self {
            search_range: None,
            last: Mutex::new(None),
        }
    }

    /// Restrict the tempo candidates stratum-dsp considers
    pub fn with_search_range(min_bpm: f32, max_bpm: f32) -> Self {
        Self {
            search_range: Some((min_bpm, max_bpm)),
            last: Mutex::new(None),
        }
    }

    fn config(&self) -> AnalysisConfig {
        match self.search_range {
            Some((min_bpm, max_bpm)) => AnalysisConfig {
                min_bpm,
                max_bpm,
                ..AnalysisConfig::default()
            },
            None => AnalysisConfig::default(),
        }
    }

    fn analyze(&self, buffer: &AudioBuffer) -> Result<Features, EngineFault> {
        debug!(
            "Analyzing with stratum-dsp ({} samples, {}Hz)",
            buffer.len(),
            buffer.sample_rate
        );

        let result = analyze_audio(&buffer.samples, buffer.sample_rate, self.config())
            .map_err(|e| EngineFault::new(ENGINE_NAME, format!("analysis failed: {}", e)))?;

        let bpm = result.bpm as f64;
        debug!(
            "Detected tempo: {:.2} (confidence: {:.2})",
            bpm, result.bpm_confidence
        );

        // Zero confidence is stratum-dsp's way of saying it did not find a key
        let key = if result.key_confidence > 0.0 {
            let key = key_estimate(&result.key);
            debug!(
                "Detected key: {} (confidence: {:.2})",
                key, result.key_confidence
            );
            Some(key)
        } else {
            debug!("No key detected (confidence 0)");
            None
        };

        Ok(Features {
            bpm: if bpm.is_finite() && bpm > 0.0 { bpm } else { 0.0 },
            key,
        })
    }

    fn remember(&self, id: BufferId, features: Features) {
        *self.last.lock().unwrap_or_else(|e| e.into_inner()) = Some((id, features));
    }

    fn take_remembered(&self, id: BufferId) -> Option<Features> {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        match last.take() {
            Some((cached, features)) if cached == id => Some(features),
            _ => None,
        }
    }
}

impl Default for StratumEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureEngine for StratumEngine {
    fn estimate_tempo(&self, buffer: &AudioBuffer) -> Result<f64, EngineFault> {
        let features = self.analyze(buffer)?;
        let bpm = features.bpm;
        self.remember(BufferId::of(buffer), features);
        Ok(bpm)
    }

    fn estimate_key(&self, buffer: &AudioBuffer) -> Result<Option<KeyEstimate>, EngineFault> {
        let features = match self.take_remembered(BufferId::of(buffer)) {
            Some(features) => features,
            None => self.analyze(buffer)?,
        };
        Ok(features.key)
    }

    fn name(&self) -> &'static str {
        ENGINE_NAME
    }
}

/// Convert a stratum-dsp key to our spelling (sharps, as stratum-dsp names them)
fn key_estimate(key: &Key) -> KeyEstimate {
    let (index, scale) = match key {
        Key::Major(i) => (*i, Scale::Major),
        Key::Minor(i) => (*i, Scale::Minor),
    };
    let pitch = PitchClass::from_index((index % 12) as u8);
    KeyEstimate::new(pitch.to_standard_notation(), scale)
}
