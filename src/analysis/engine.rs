//! Engine composition
//!
//! Tempo estimators disagree on hard material: one may fail to converge
//! where a simpler one still produces an answer. `FallbackEngine` asks a
//! secondary engine only when the primary faults or gives up.

use crate::analysis::traits::FeatureEngine;
use crate::error::EngineFault;
use crate::types::{AudioBuffer, KeyEstimate};
use tracing::debug;

/// Primary engine with a secondary consulted on fault
pub struct FallbackEngine<P, S> {
    primary: P,
    secondary: S,
}

impl<P: FeatureEngine, S: FeatureEngine> FallbackEngine<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

impl<P: FeatureEngine, S: FeatureEngine> FeatureEngine for FallbackEngine<P, S> {
    /// Tempo from the primary; the secondary runs on fault or a zero estimate
    fn estimate_tempo(&self, buffer: &AudioBuffer) -> Result<f64, EngineFault> {
        match self.primary.estimate_tempo(buffer) {
            Ok(bpm) if bpm > 0.0 => Ok(bpm),
            Ok(_) => {
                debug!(
                    "{} returned no tempo, trying {}",
                    self.primary.name(),
                    self.secondary.name()
                );
                self.secondary.estimate_tempo(buffer)
            }
            Err(fault) => {
                debug!("{}, trying {}", fault, self.secondary.name());
                self.secondary.estimate_tempo(buffer)
            }
        }
    }

    /// Key from the primary; the secondary runs only on fault
    fn estimate_key(&self, buffer: &AudioBuffer) -> Result<Option<KeyEstimate>, EngineFault> {
        match self.primary.estimate_key(buffer) {
            Ok(key) => Ok(key),
            Err(fault) => {
                debug!("{}, trying {}", fault, self.secondary.name());
                self.secondary.estimate_key(buffer)
            }
        }
    }

    fn name(&self) -> &'static str {
        self.primary.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Scale;

    struct Fixed {
        tempo: Result<f64, EngineFault>,
        key: Result<Option<KeyEstimate>, EngineFault>,
    }

    impl FeatureEngine for Fixed {
        fn estimate_tempo(&self, _buffer: &AudioBuffer) -> Result<f64, EngineFault> {
            self.tempo.clone()
        }

        fn estimate_key(&self, _buffer: &AudioBuffer) -> Result<Option<KeyEstimate>, EngineFault> {
            self.key.clone()
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    fn fault() -> EngineFault {
        EngineFault::new("fixed", "did not converge")
    }

    fn buffer() -> AudioBuffer {
        AudioBuffer::new(vec![0.0; 16], 8)
    }

    #[test]
    fn test_primary_tempo_wins() {
        let engine = FallbackEngine::new(
            Fixed { tempo: Ok(124.0), key: Ok(None) },
            Fixed { tempo: Ok(62.0), key: Ok(None) },
        );
        assert_eq!(engine.estimate_tempo(&buffer()), Ok(124.0));
    }

    #[test]
    fn test_secondary_tempo_on_fault_or_zero() {
        let faulty = FallbackEngine::new(
            Fixed { tempo: Err(fault()), key: Ok(None) },
            Fixed { tempo: Ok(62.0), key: Ok(None) },
        );
        assert_eq!(faulty.estimate_tempo(&buffer()), Ok(62.0));

        let silent = FallbackEngine::new(
            Fixed { tempo: Ok(0.0), key: Ok(None) },
            Fixed { tempo: Ok(62.0), key: Ok(None) },
        );
        assert_eq!(silent.estimate_tempo(&buffer()), Ok(62.0));
    }

    #[test]
    fn test_key_falls_back_only_on_fault() {
        let am = KeyEstimate::new("A", Scale::Minor);

        let undetermined = FallbackEngine::new(
            Fixed { tempo: Ok(0.0), key: Ok(None) },
            Fixed { tempo: Ok(0.0), key: Ok(Some(am.clone())) },
        );
        assert_eq!(undetermined.estimate_key(&buffer()), Ok(None));

        let faulty = FallbackEngine::new(
            Fixed { tempo: Ok(0.0), key: Err(fault()) },
            Fixed { tempo: Ok(0.0), key: Ok(Some(am.clone())) },
        );
        assert_eq!(faulty.estimate_key(&buffer()), Ok(Some(am)));
    }
}
