//! Analysis trait abstractions
//!
//! The DSP engine is an opaque capability with two operations. The default
//! backend binds stratum-dsp; tests and alternative backends implement the
//! same trait, so orchestration never depends on a specific library.

use crate::error::EngineFault;
use crate::types::{AudioBuffer, KeyEstimate};

/// Tempo and key estimation backend
///
/// Implementations must be callable from the session worker thread. An
/// engine wrapping a process-global, non-reentrant native library must
/// serialize access itself (e.g. behind a `Mutex`) when several sessions
/// share it; the pipeline does not coordinate engines across sessions.
///
/// Any intermediate buffers an engine allocates for a call must be released
/// before that call returns, on success and on fault alike.
pub trait FeatureEngine: Send + Sync {
    /// Estimate the unfolded tempo in BPM; 0 means "could not tell"
    fn estimate_tempo(&self, buffer: &AudioBuffer) -> Result<f64, EngineFault>;

    /// Estimate the key; `None` means "could not tell"
    fn estimate_key(&self, buffer: &AudioBuffer) -> Result<Option<KeyEstimate>, EngineFault>;

    /// Get the name of this engine (for logging)
    fn name(&self) -> &'static str;
}

impl<E: FeatureEngine + ?Sized> FeatureEngine for std::sync::Arc<E> {
    fn estimate_tempo(&self, buffer: &AudioBuffer) -> Result<f64, EngineFault> {
        (**self).estimate_tempo(buffer)
    }

    fn estimate_key(&self, buffer: &AudioBuffer) -> Result<Option<KeyEstimate>, EngineFault> {
        (**self).estimate_key(buffer)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
