//! Core data types for cratedig
//!
//! These types represent the domain model and flow through the pipeline.

use crate::error::CratedigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// =============================================================================
// Tracks
// =============================================================================

/// A library track handed to the pipeline. Never mutated by analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRef {
    /// Library identifier, used as the persistence key
    pub id: String,
    /// Source audio file
    pub path: PathBuf,
    pub title: String,
    pub artist: String,
}

impl TrackRef {
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            title: String::new(),
            artist: String::new(),
        }
    }

    pub fn with_display(mut self, title: impl Into<String>, artist: impl Into<String>) -> Self {
        self.title = title.into();
        self.artist = artist.into();
        self
    }
}

// =============================================================================
// Tempo ranges
// =============================================================================

/// Built-in ranges offered to the user: (min, max, label)
pub const PRESET_RANGES: [(f64, f64, &str); 5] = [
    (100.0, 180.0, "Electronic (100-180)"),
    (70.0, 140.0, "Hip-Hop (70-140)"),
    (60.0, 120.0, "Slow (60-120)"),
    (120.0, 200.0, "Fast (120-200)"),
    (60.0, 200.0, "Wide (60-200)"),
];

/// Target octave range for tempo folding. Always `0 < min < max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BpmRange {
    pub min: f64,
    pub max: f64,
    pub label: String,
}

impl BpmRange {
    /// Build a validated range
    pub fn new(min: f64, max: f64, label: impl Into<String>) -> Result<Self, CratedigError> {
        if !(min.is_finite() && max.is_finite()) || min <= 0.0 || min >= max {
            return Err(CratedigError::InvalidRange(format!(
                "expected 0 < min < max, got {}..{}",
                min, max
            )));
        }
        Ok(Self {
            min,
            max,
            label: label.into(),
        })
    }

    /// Build a range with a generated label
    pub fn custom(min: f64, max: f64) -> Result<Self, CratedigError> {
        Self::new(min, max, format!("Custom ({}-{})", min, max))
    }

    /// All built-in ranges, in display order
    pub fn presets() -> Vec<BpmRange> {
        PRESET_RANGES
            .iter()
            .map(|(min, max, label)| BpmRange {
                min: *min,
                max: *max,
                label: (*label).to_string(),
            })
            .collect()
    }

    /// Find a built-in range by the first word of its label ("hip-hop", "wide", ...)
    pub fn preset(name: &str) -> Option<BpmRange> {
        let wanted = name.trim().to_lowercase();
        Self::presets().into_iter().find(|range| {
            range
                .label
                .split_whitespace()
                .next()
                .map(|word| word.to_lowercase() == wanted)
                .unwrap_or(false)
        })
    }

    pub fn contains(&self, bpm: f64) -> bool {
        bpm >= self.min && bpm <= self.max
    }
}

impl Default for BpmRange {
    fn default() -> Self {
        let (min, max, label) = PRESET_RANGES[0];
        Self {
            min,
            max,
            label: label.to_string(),
        }
    }
}

impl fmt::Display for BpmRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

// =============================================================================
// Key
// =============================================================================

/// The 12 pitch classes in Western music
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PitchClass {
    C,
    Cs, // C#/Db
    D,
    Ds, // D#/Eb
    E,
    F,
    Fs, // F#/Gb
    G,
    Gs, // G#/Ab
    A,
    As, // A#/Bb
    B,
}

impl PitchClass {
    const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::Cs,
        PitchClass::D,
        PitchClass::Ds,
        PitchClass::E,
        PitchClass::F,
        PitchClass::Fs,
        PitchClass::G,
        PitchClass::Gs,
        PitchClass::A,
        PitchClass::As,
        PitchClass::B,
    ];

    /// Convert from numeric index (0 = C, 1 = C#, ..., 11 = B), wrapping at 12
    pub fn from_index(index: u8) -> Self {
        Self::ALL[(index % 12) as usize]
    }

    /// Convert to numeric index (0 = C, 1 = C#, ..., 11 = B)
    pub fn to_index(self) -> u8 {
        self as u8
    }

    /// Parse a note name in any enharmonic spelling ("F#", "Gb", "Cb", "E♭", "bb")
    pub fn parse(name: &str) -> Option<Self> {
        let mut chars = name.trim().chars();
        let natural: i32 = match chars.next()?.to_ascii_uppercase() {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return None,
        };

        let mut offset = 0i32;
        for c in chars {
            match c {
                '#' | '♯' => offset += 1,
                'b' | '♭' => offset -= 1,
                _ => return None,
            }
        }

        Some(Self::from_index((natural + offset).rem_euclid(12) as u8))
    }

    /// Standard notation (e.g., "C", "F#", "A#")
    pub fn to_standard_notation(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::Cs => "C#",
            PitchClass::D => "D",
            PitchClass::Ds => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::Fs => "F#",
            PitchClass::G => "G",
            PitchClass::Gs => "G#",
            PitchClass::A => "A",
            PitchClass::As => "A#",
            PitchClass::B => "B",
        }
    }
}

/// Major or minor scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    Major,
    Minor,
}

impl Scale {
    pub fn as_str(self) -> &'static str {
        match self {
            Scale::Major => "major",
            Scale::Minor => "minor",
        }
    }

    /// Parse the scale labels key estimators emit ("major", "Minor", "min", ...)
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "major" | "maj" => Some(Scale::Major),
            "minor" | "min" => Some(Scale::Minor),
            _ => None,
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key reported by the DSP engine. The tonic keeps the engine's spelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEstimate {
    pub tonic: String,
    pub scale: Scale,
}

impl KeyEstimate {
    pub fn new(tonic: impl Into<String>, scale: Scale) -> Self {
        Self {
            tonic: tonic.into(),
            scale,
        }
    }
}

impl fmt::Display for KeyEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.tonic, self.scale)
    }
}

// =============================================================================
// Analysis results
// =============================================================================

/// Camelot code for an unknown key
pub const UNKNOWN_CAMELOT: &str = "?";

/// Features extracted for one track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Folded tempo; 0 means undetermined
    pub bpm: f64,
    /// Estimated key; `None` when undetermined
    pub key: Option<KeyEstimate>,
    /// Camelot code, or "?" when unknown
    pub camelot: String,
}

impl AnalysisResult {
    pub fn tonic(&self) -> Option<&str> {
        self.key.as_ref().map(|k| k.tonic.as_str())
    }

    pub fn scale(&self) -> Option<Scale> {
        self.key.as_ref().map(|k| k.scale)
    }

    pub fn has_bpm(&self) -> bool {
        self.bpm > 0.0
    }

    pub fn has_camelot(&self) -> bool {
        self.camelot != UNKNOWN_CAMELOT
    }
}

/// Track analyzer output: the folded result plus the unfolded engine estimate
#[derive(Debug, Clone, PartialEq)]
pub struct TrackAnalysis {
    /// Engine tempo before octave folding; 0 means undetermined
    pub raw_bpm: f64,
    pub result: AnalysisResult,
}

// =============================================================================
// Audio buffer types
// =============================================================================

/// Planar PCM as produced by a decoder
#[derive(Debug, Clone, Default)]
pub struct DecodedAudio {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// One sample vector per channel, all of equal length
    pub channels: Vec<Vec<f32>>,
}

impl DecodedAudio {
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel (shortest channel wins if lengths disagree)
    pub fn frames(&self) -> usize {
        self.channels.iter().map(Vec::len).min().unwrap_or(0)
    }

    pub fn duration(&self) -> f64 {
        if self.sample_rate > 0 {
            self.frames() as f64 / self.sample_rate as f64
        } else {
            0.0
        }
    }
}

/// Mono samples ready for analysis
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Mono samples normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Duration in seconds
    pub duration: f64,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        // Guard against division by zero - use 0 duration for invalid sample rate
        let duration = if sample_rate > 0 {
            samples.len() as f64 / sample_rate as f64
        } else {
            0.0
        };
        Self {
            samples,
            sample_rate,
            duration,
        }
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

// =============================================================================
// Supported formats
// =============================================================================

/// Audio formats accepted by discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
    Flac,
    Aiff,
    M4a,
    Ogg,
}

impl AudioFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "mp3" => Some(AudioFormat::Mp3),
            "wav" => Some(AudioFormat::Wav),
            "flac" => Some(AudioFormat::Flac),
            "aiff" | "aif" => Some(AudioFormat::Aiff),
            "m4a" => Some(AudioFormat::M4a),
            "ogg" => Some(AudioFormat::Ogg),
            _ => None,
        }
    }

    /// Check if a path has a supported extension
    pub fn is_supported_path(path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_validation() {
        assert!(BpmRange::new(100.0, 180.0, "x").is_ok());
        assert!(BpmRange::new(180.0, 100.0, "x").is_err());
        assert!(BpmRange::new(0.0, 100.0, "x").is_err());
        assert!(BpmRange::new(120.0, 120.0, "x").is_err());
        assert!(BpmRange::new(f64::NAN, 120.0, "x").is_err());
    }

    #[test]
    fn test_preset_lookup() {
        let hiphop = BpmRange::preset("hip-hop").unwrap();
        assert_eq!((hiphop.min, hiphop.max), (70.0, 140.0));
        assert_eq!(BpmRange::preset("WIDE").unwrap().max, 200.0);
        assert!(BpmRange::preset("polka").is_none());
        assert_eq!(BpmRange::default().label, "Electronic (100-180)");
    }

    #[test]
    fn test_pitch_class_enharmonics() {
        assert_eq!(PitchClass::parse("F#"), Some(PitchClass::Fs));
        assert_eq!(PitchClass::parse("Gb"), Some(PitchClass::Fs));
        assert_eq!(PitchClass::parse("Cb"), Some(PitchClass::B));
        assert_eq!(PitchClass::parse("B#"), Some(PitchClass::C));
        assert_eq!(PitchClass::parse("E♭"), Some(PitchClass::Ds));
        assert_eq!(PitchClass::parse("bb"), Some(PitchClass::As));
        assert_eq!(PitchClass::parse("H"), None);
        assert_eq!(PitchClass::parse("C#m"), None);
        assert_eq!(PitchClass::parse(""), None);
    }

    #[test]
    fn test_pitch_class_index_round_trip() {
        for i in 0..12u8 {
            assert_eq!(PitchClass::from_index(i).to_index(), i);
        }
        assert_eq!(PitchClass::from_index(13), PitchClass::Cs);
    }

    #[test]
    fn test_scale_parse() {
        assert_eq!(Scale::parse("Minor"), Some(Scale::Minor));
        assert_eq!(Scale::parse(" major "), Some(Scale::Major));
        assert_eq!(Scale::parse("dorian"), None);
    }

    #[test]
    fn test_decoded_audio_frames_uses_shortest_channel() {
        let audio = DecodedAudio::new(vec![vec![0.0; 10], vec![0.0; 8]], 4);
        assert_eq!(audio.frames(), 8);
        assert!((audio.duration() - 2.0).abs() < 1e-9);
    }
}
