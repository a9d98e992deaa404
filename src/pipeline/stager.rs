//! Committing staged results
//!
//! Results live in the session until the user accepts them. Commit writes
//! the successful rows through a sink; pending and failed rows are skipped.
//! Undetermined fields are sent as "no update" so they never overwrite a
//! value the library already knows.

use crate::error::CommitError;
use crate::persist::{FeatureSink, TrackFeatures};
use crate::pipeline::session::TrackAnalysisRecord;
use tracing::{debug, info};

/// Write every successful record, in session order
///
/// Stops at the first sink failure. Records written before it stay
/// written and are counted in the error.
pub fn commit_records(
    records: &[TrackAnalysisRecord],
    sink: &mut dyn FeatureSink,
) -> Result<usize, CommitError> {
    let mut persisted = 0;

    for record in records {
        let Some(result) = record.result.as_ref() else {
            continue;
        };

        let features = TrackFeatures::from_result(result);
        debug!(
            "Saving {}: bpm={:?}, key={:?}",
            record.track.id, features.bpm, features.camelot
        );

        sink.update_track_features(&record.track.id, &features)
            .map_err(|source| CommitError { persisted, source })?;
        persisted += 1;
    }

    info!("Committed {} track(s)", persisted);
    Ok(persisted)
}
