//! cratedig - tempo and key analysis for DJ track libraries
//!
//! Decodes audio files, estimates tempo and musical key from a centered
//! window, folds the tempo into a genre range and maps the key onto the
//! Camelot wheel. Accepted results can be saved to a track library.
//!
//! # Architecture
//!
//! - `config`: CLI argument parsing and runtime settings
//! - `discovery`: File scanning and track ID generation
//! - `audio`: Decoding, window selection and resampling
//! - `analysis`: Tempo folding, Camelot mapping and feature engines
//! - `pipeline`: Single-track analysis, batch sessions and result staging
//! - `persist`: Feature sinks (JSON library file)
//!
//! # Example
//!
//! ```no_run
//! use cratedig::analysis::StratumEngine;
//! use cratedig::audio::SymphoniaDecoder;
//! use cratedig::pipeline::{run_analysis, TrackAnalyzer};
//! use cratedig::types::BpmRange;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let tracks = cratedig::discovery::scan(Path::new("music"), true).expect("scan failed");
//! let analyzer = TrackAnalyzer::new(Arc::new(SymphoniaDecoder), Arc::new(StratumEngine::new()));
//! let mut session = run_analysis(analyzer, tracks, BpmRange::default()).expect("spawn failed");
//! session.wait();
//! println!("{:?}", session.snapshot().summary());
//! ```

pub mod analysis;
pub mod audio;
pub mod cancel;
pub mod config;
pub mod discovery;
pub mod error;
pub mod persist;
pub mod pipeline;
pub mod types;

// Re-export key types at crate root
pub use cancel::CancelToken;
pub use error::{AnalysisError, CratedigError, Result};
pub use types::{AnalysisResult, AudioBuffer, BpmRange, KeyEstimate, Scale, TrackRef};
