//! Audio analysis modules
//!
//! The [`FeatureEngine`] trait is the seam between the pipeline and the DSP
//! backend, so engines can be swapped or chained without touching the
//! session code.

pub mod bpm;
pub mod engine;
pub mod key;
pub mod metadata;
pub mod stratum;
pub mod traits;

pub use bpm::{normalize, normalize_in};
pub use engine::FallbackEngine;
pub use key::{from_camelot, key_to_camelot, to_camelot};
pub use stratum::StratumEngine;
pub use traits::FeatureEngine;
