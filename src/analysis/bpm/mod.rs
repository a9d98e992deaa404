//! Tempo octave folding
//!
//! Tempo estimators routinely report half or double the tempo a DJ would
//! count. Folding doubles or halves the raw estimate until it lands in the
//! genre range the user picked.

use crate::types::BpmRange;

/// Upper bound on doublings, and separately on halvings, per fold
pub const MAX_OCTAVE_STEPS: u32 = 10;

/// Fold a raw tempo estimate into `[min, max]`
///
/// - `raw_bpm <= 0` (or not finite) is "undetermined" and returns 0.
/// - Doubles while below `min`, then halves while above `max`.
/// - Needing more than [`MAX_OCTAVE_STEPS`] steps in either direction returns 0.
///
/// When `max < 2 * min` a value can end up one octave below `min`
/// (190 in 100..180 folds to 95); the result is still a fixed point, so
/// folding twice gives the same answer as folding once.
///
/// Callers must pass `min < max`; use [`BpmRange::new`] to validate.
pub fn normalize(raw_bpm: f64, min: f64, max: f64) -> f64 {
    if !raw_bpm.is_finite() || raw_bpm <= 0.0 {
        return 0.0;
    }

    let mut bpm = raw_bpm;

    let mut steps = 0;
    while bpm < min && bpm > 0.0 {
        if steps == MAX_OCTAVE_STEPS {
            return 0.0;
        }
        bpm *= 2.0;
        steps += 1;
    }

    steps = 0;
    while bpm > max {
        if steps == MAX_OCTAVE_STEPS {
            return 0.0;
        }
        bpm /= 2.0;
        steps += 1;
    }

    bpm
}

/// [`normalize`] against a validated range
pub fn normalize_in(raw_bpm: f64, range: &BpmRange) -> f64 {
    normalize(raw_bpm, range.min, range.max)
}
