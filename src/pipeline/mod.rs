//! Analysis pipeline
//!
//! A [`TrackAnalyzer`] handles one track, a [`SessionHandle`] walks a batch
//! of tracks on a single background worker, and the stager hands accepted
//! results to a [`FeatureSink`](crate::persist::FeatureSink).

pub mod analyzer;
pub mod session;
pub mod stager;

pub use analyzer::{AnalyzerConfig, TrackAnalyzer};
pub use session::{
    run_analysis, Progress, RecordState, SessionEvent, SessionHandle, SessionSnapshot,
    SessionSummary, TrackAnalysisRecord,
};
pub use stager::commit_records;
