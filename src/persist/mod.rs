//! Persistence of accepted features

pub mod json;

use crate::error::PersistError;
use crate::types::AnalysisResult;
use serde::{Deserialize, Serialize};

pub use json::JsonLibrarySink;

/// Field updates for one track; `None` means "leave the stored value alone"
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackFeatures {
    pub bpm: Option<f64>,
    pub camelot: Option<String>,
}

impl TrackFeatures {
    /// Drop undetermined values (bpm 0, Camelot "?")
    pub fn from_result(result: &AnalysisResult) -> Self {
        Self {
            bpm: result.has_bpm().then_some(result.bpm),
            camelot: result.has_camelot().then(|| result.camelot.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bpm.is_none() && self.camelot.is_none()
    }
}

/// Durable store for a track's accepted BPM and key
pub trait FeatureSink {
    fn update_track_features(
        &mut self,
        track_id: &str,
        features: &TrackFeatures,
    ) -> Result<(), PersistError>;
}
