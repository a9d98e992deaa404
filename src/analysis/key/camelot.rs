//! Camelot Wheel notation mapping
//!
//! The Camelot Wheel is a visual representation of musical keys that
//! makes harmonic mixing intuitive for DJs.
//!
//! - Numbers 1-12 represent positions on the wheel
//! - 'A' suffix = minor key, 'B' suffix = major key
//! - Same number, different letter = relative major/minor
//!
//! Key estimators spell tonics either way ("F#" or "Gb"), so lookups go
//! through [`PitchClass::parse`] and every enharmonic spelling lands on the
//! same wheel position.

use crate::types::{KeyEstimate, PitchClass, Scale, UNKNOWN_CAMELOT};

/// The 24 wheel positions: (pitch, scale, code, spelling returned by reverse lookup)
const WHEEL: [(PitchClass, Scale, &str, &str); 24] = [
    // Minor keys (A)
    (PitchClass::Gs, Scale::Minor, "1A", "G#"),
    (PitchClass::Ds, Scale::Minor, "2A", "Eb"),
    (PitchClass::As, Scale::Minor, "3A", "Bb"),
    (PitchClass::F, Scale::Minor, "4A", "F"),
    (PitchClass::C, Scale::Minor, "5A", "C"),
    (PitchClass::G, Scale::Minor, "6A", "G"),
    (PitchClass::D, Scale::Minor, "7A", "D"),
    (PitchClass::A, Scale::Minor, "8A", "A"),
    (PitchClass::E, Scale::Minor, "9A", "E"),
    (PitchClass::B, Scale::Minor, "10A", "B"),
    (PitchClass::Fs, Scale::Minor, "11A", "F#"),
    (PitchClass::Cs, Scale::Minor, "12A", "C#"),
    // Major keys (B)
    (PitchClass::B, Scale::Major, "1B", "B"),
    (PitchClass::Fs, Scale::Major, "2B", "F#"),
    (PitchClass::Cs, Scale::Major, "3B", "Db"),
    (PitchClass::Gs, Scale::Major, "4B", "Ab"),
    (PitchClass::Ds, Scale::Major, "5B", "Eb"),
    (PitchClass::As, Scale::Major, "6B", "Bb"),
    (PitchClass::F, Scale::Major, "7B", "F"),
    (PitchClass::C, Scale::Major, "8B", "C"),
    (PitchClass::G, Scale::Major, "9B", "G"),
    (PitchClass::D, Scale::Major, "10B", "D"),
    (PitchClass::A, Scale::Major, "11B", "A"),
    (PitchClass::E, Scale::Major, "12B", "E"),
];

/// Map a tonic/scale pair to its Camelot code
///
/// Returns "?" for anything the wheel does not know (unparseable tonic,
/// scale other than major/minor).
pub fn to_camelot(tonic: &str, scale: &str) -> &'static str {
    match (PitchClass::parse(tonic), Scale::parse(scale)) {
        (Some(pitch), Some(scale)) => camelot_for(pitch, scale),
        _ => UNKNOWN_CAMELOT,
    }
}

/// Camelot code for an estimated key, "?" when the key is absent or unknown
pub fn key_to_camelot(key: Option<&KeyEstimate>) -> &'static str {
    match key {
        Some(key) => match PitchClass::parse(&key.tonic) {
            Some(pitch) => camelot_for(pitch, key.scale),
            None => UNKNOWN_CAMELOT,
        },
        None => UNKNOWN_CAMELOT,
    }
}

fn camelot_for(pitch: PitchClass, scale: Scale) -> &'static str {
    WHEEL
        .iter()
        .find(|(p, s, _, _)| *p == pitch && *s == scale)
        .map(|(_, _, code, _)| *code)
        .unwrap_or(UNKNOWN_CAMELOT)
}

/// Reverse lookup: Camelot code to one canonical (tonic, scale) spelling
///
/// Accepts lowercase letters and surrounding whitespace; returns `None` for
/// anything that is not one of the 24 codes.
pub fn from_camelot(code: &str) -> Option<(&'static str, Scale)> {
    let code = code.trim().to_ascii_uppercase();
    WHEEL
        .iter()
        .find(|(_, _, c, _)| *c == code)
        .map(|(_, scale, _, spelling)| (*spelling, *scale))
}

/// Check whether a string is one of the 24 Camelot codes
pub fn is_camelot_code(code: &str) -> bool {
    from_camelot(code).is_some()
}
