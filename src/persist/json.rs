//! JSON library file sink
//!
//! Stores accepted features per track id. Every update rewrites the file
//! atomically, so a failure on one track never corrupts tracks already saved.

use crate::error::PersistError;
use crate::persist::{FeatureSink, TrackFeatures};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Library schema version
const SCHEMA_VERSION: &str = "1.0";

/// Top-level JSON structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryJson {
    /// Schema version for forward compatibility
    pub version: String,
    /// Timestamp of the last write
    pub updated_at: String,
    pub tracks: BTreeMap<String, StoredFeatures>,
}

impl Default for LibraryJson {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            updated_at: chrono::Utc::now().to_rfc3339(),
            tracks: BTreeMap::new(),
        }
    }
}

/// Features stored for one track
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredFeatures {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bpm: Option<f64>,
    /// Camelot code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub updated_at: String,
}

/// Sink writing to a JSON library file
#[derive(Debug)]
pub struct JsonLibrarySink {
    path: PathBuf,
    library: LibraryJson,
}

impl JsonLibrarySink {
    /// Open a library file, starting empty if it does not exist yet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let path = path.into();
        let library = if path.exists() {
            read_library(&path)?
        } else {
            debug!("No library file at {}, starting empty", path.display());
            LibraryJson::default()
        };
        Ok(Self { path, library })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, track_id: &str) -> Option<&StoredFeatures> {
        self.library.tracks.get(track_id)
    }

    pub fn len(&self) -> usize {
        self.library.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.library.tracks.is_empty()
    }
}

impl FeatureSink for JsonLibrarySink {
    fn update_track_features(
        &mut self,
        track_id: &str,
        features: &TrackFeatures,
    ) -> Result<(), PersistError> {
        let mut updated = self.library.clone();
        let now = chrono::Utc::now().to_rfc3339();

        let entry = updated.tracks.entry(track_id.to_string()).or_default();
        if let Some(bpm) = features.bpm {
            entry.bpm = Some(bpm);
        }
        if let Some(camelot) = &features.camelot {
            entry.key = Some(camelot.clone());
        }
        entry.updated_at = now.clone();
        updated.updated_at = now;

        write_library(&updated, &self.path)?;
        // Only adopt the new state once it is on disk
        self.library = updated;
        Ok(())
    }
}

fn read_library(path: &Path) -> Result<LibraryJson, PersistError> {
    let file = File::open(path).map_err(|e| PersistError::write_error(path, &e))?;
    let reader = BufReader::new(file);
    let library: LibraryJson =
        serde_json::from_reader(reader).map_err(|e| PersistError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    debug!(
        "Loaded {} stored tracks from {}",
        library.tracks.len(),
        path.display()
    );
    Ok(library)
}

/// Write the library using a temp file and rename
fn write_library(library: &LibraryJson, path: &Path) -> Result<(), PersistError> {
    // Same directory keeps the rename on one filesystem
    let temp_path = path.with_extension("json.tmp");

    let file = File::create(&temp_path).map_err(|e| PersistError::write_error(path, &e))?;
    if let Err(e) = write_contents(library, file) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(PersistError::Write {
            path: path.to_path_buf(),
            reason: e.to_string(),
        });
    }

    std::fs::rename(&temp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        PersistError::write_error(path, &e)
    })?;

    info!(
        "Wrote {} tracks to {}",
        library.tracks.len(),
        path.display()
    );
    Ok(())
}

/// Serialize into `file` and make sure every byte reached the disk
///
/// The flush is explicit: `BufWriter` drops flush errors, and a small
/// library is written almost entirely by the final flush.
fn write_contents<W: Write + SyncFile>(library: &LibraryJson, file: W) -> io::Result<()> {
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, library)?;
    writer.flush()?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_file()
}

/// Durability hook so the write path can be exercised without a real disk
trait SyncFile {
    fn sync_file(&self) -> io::Result<()>;
}

impl SyncFile for File {
    fn sync_file(&self) -> io::Result<()> {
        self.sync_all()
    }
}
