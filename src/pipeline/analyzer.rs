//! Single-track analysis
//!
//! decode → window → tempo → key → fold → Camelot, with cancellation
//! checked between steps. Only decoding can fail a track; engine faults
//! leave the affected field undetermined.

use crate::analysis::bpm::normalize_in;
use crate::analysis::key::key_to_camelot;
use crate::analysis::traits::FeatureEngine;
use crate::audio::decoder::AudioDecoder;
use crate::audio::resample::{resample_buffer, ANALYSIS_SAMPLE_RATE};
use crate::audio::window::{select_window, DEFAULT_WINDOW_SECONDS};
use crate::cancel::CancelToken;
use crate::error::{AnalysisError, DecodeError};
use crate::types::{AnalysisResult, BpmRange, TrackAnalysis, TrackRef};
use std::sync::Arc;
use tracing::debug;

/// Tuning for the analyzer
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    /// Length of the centered window handed to the engine
    pub window_seconds: f64,
    /// Rate the window is resampled to before analysis; `None` keeps the source rate
    pub analysis_sample_rate: Option<u32>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            window_seconds: DEFAULT_WINDOW_SECONDS,
            analysis_sample_rate: Some(ANALYSIS_SAMPLE_RATE),
        }
    }
}

/// Runs one track through decoder and engine
#[derive(Clone)]
pub struct TrackAnalyzer {
    decoder: Arc<dyn AudioDecoder>,
    engine: Arc<dyn FeatureEngine>,
    config: AnalyzerConfig,
}

impl TrackAnalyzer {
    pub fn new(decoder: Arc<dyn AudioDecoder>, engine: Arc<dyn FeatureEngine>) -> Self {
        Self::with_config(decoder, engine, AnalyzerConfig::default())
    }

    pub fn with_config(
        decoder: Arc<dyn AudioDecoder>,
        engine: Arc<dyn FeatureEngine>,
        config: AnalyzerConfig,
    ) -> Self {
        Self {
            decoder,
            engine,
            config,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze one track, folding its tempo into `range`
    pub fn analyze(
        &self,
        track: &TrackRef,
        range: &BpmRange,
        cancel: &CancelToken,
    ) -> Result<TrackAnalysis, AnalysisError> {
        debug!("Analyzing: {}", track.path.display());
        self.checkpoint(track, cancel)?;

        let decoded = self.decoder.decode(&track.path, cancel).map_err(|e| match e {
            DecodeError::Cancelled(_) => AnalysisError::cancelled(&track.id),
            DecodeError::Failed { reason, .. } => AnalysisError::decode_failed(&track.id, reason),
        })?;

        self.checkpoint(track, cancel)?;

        let window = select_window(&decoded, self.config.window_seconds);
        // The full decode can be hundreds of MB; release it before DSP work
        drop(decoded);

        if window.is_empty() {
            return Err(AnalysisError::decode_failed(&track.id, "decoded audio is empty"));
        }

        let window = match self.config.analysis_sample_rate {
            Some(rate) => resample_buffer(window, rate),
            None => window,
        };

        let raw_bpm = match self.engine.estimate_tempo(&window) {
            Ok(bpm) if bpm.is_finite() && bpm > 0.0 => bpm,
            Ok(_) => 0.0,
            Err(fault) => {
                debug!("Tempo undetermined for {}: {}", track.id, fault);
                0.0
            }
        };

        self.checkpoint(track, cancel)?;

        let key = match self.engine.estimate_key(&window) {
            Ok(key) => key,
            Err(fault) => {
                debug!("Key undetermined for {}: {}", track.id, fault);
                None
            }
        };
        drop(window);

        let camelot = key_to_camelot(key.as_ref()).to_string();
        let result = AnalysisResult {
            bpm: normalize_in(raw_bpm, range),
            key,
            camelot,
        };

        debug!(
            "Analyzed {}: raw BPM={:.1}, BPM={:.1}, Key={}",
            track.id, raw_bpm, result.bpm, result.camelot
        );

        Ok(TrackAnalysis { raw_bpm, result })
    }

    fn checkpoint(&self, track: &TrackRef, cancel: &CancelToken) -> Result<(), AnalysisError> {
        if cancel.is_cancelled() {
            debug!("Cancellation observed while analyzing {}", track.id);
            return Err(AnalysisError::cancelled(&track.id));
        }
        Ok(())
    }
}
