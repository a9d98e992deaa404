//! File discovery and scanning

use crate::analysis::metadata::read_display_tags;
use crate::error::{CratedigError, Result};
use crate::types::{AudioFormat, TrackRef};
use hash32::FnvHasher;
use std::hash::Hasher;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Scan a path (file or directory) and build a track list
///
/// Directory results are sorted by path so the batch order is stable
/// between runs.
pub fn scan(input: &Path, recursive: bool) -> Result<Vec<TrackRef>> {
    if !input.exists() {
        return Err(CratedigError::FileNotFound(input.to_path_buf()));
    }

    let mut paths = Vec::new();

    if input.is_file() {
        if !AudioFormat::is_supported_path(input) {
            return Err(CratedigError::UnsupportedFormat {
                path: input.to_path_buf(),
                format: input
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("unknown")
                    .to_string(),
            });
        }
        paths.push(input.to_path_buf());
    } else if input.is_dir() {
        let walker = if recursive {
            WalkDir::new(input)
        } else {
            WalkDir::new(input).max_depth(1)
        };

        for entry in walker.sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.is_file() && AudioFormat::is_supported_path(path) {
                debug!("Discovered: {}", path.display());
                paths.push(path.to_path_buf());
            }
        }
    }

    info!("Discovered {} audio files", paths.len());

    if paths.is_empty() {
        warn!("No supported audio files found in {}", input.display());
    }

    Ok(paths.iter().map(|p| track_ref_for(p)).collect())
}

/// Build a track reference for one file, labelled from its tags
pub fn track_ref_for(path: &Path) -> TrackRef {
    let tags = read_display_tags(path);
    let title = tags.title.unwrap_or_else(|| {
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string()
    });

    TrackRef::new(generate_track_id(path), path).with_display(title, tags.artist.unwrap_or_default())
}

/// Generate a deterministic track ID from a file path
///
/// FNV-1a over the normalized path, rendered as 8 hex digits.
pub fn generate_track_id(path: &Path) -> String {
    use hash32::Hasher as Hash32Hasher;

    let normalized = normalize_path_for_hash(path);

    let mut hasher = FnvHasher::default();
    hasher.write(normalized.as_bytes());
    format!("{:08x}", hasher.finish32())
}

/// Normalize a path string for consistent hashing across platforms
fn normalize_path_for_hash(path: &Path) -> String {
    let path_str = path.to_string_lossy();

    // Convert backslashes to forward slashes
    let normalized = path_str.replace('\\', "/");

    // Lowercase for case-insensitive filesystems
    normalized.to_lowercase()
}
