//! Display tags for track rows
//!
//! Uses lofty to read ID3v2 (MP3), Vorbis comments (FLAC/OGG), MP4 atoms
//! and AIFF tags. Only title and artist are needed to label a row.

use lofty::{Accessor, Probe, TaggedFileExt};
use std::path::Path;
use tracing::{debug, warn};

/// Title and artist as found in the file's tags
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayTags {
    pub title: Option<String>,
    pub artist: Option<String>,
}

/// Read display tags from an audio file
///
/// On error (corrupt tags, missing file) returns empty tags; a row
/// without a title is still analyzable.
pub fn read_display_tags(path: &Path) -> DisplayTags {
    match read_display_tags_inner(path) {
        Ok(tags) => tags,
        Err(e) => {
            warn!("Failed to read tags from {}: {}", path.display(), e);
            DisplayTags::default()
        }
    }
}

fn read_display_tags_inner(path: &Path) -> Result<DisplayTags, lofty::error::LoftyError> {
    let tagged_file = Probe::open(path)?.read()?;
    let tag = tagged_file.primary_tag().or_else(|| tagged_file.first_tag());

    let tags = match tag {
        Some(tag) => DisplayTags {
            title: tag.title().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            artist: tag.artist().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
        },
        None => {
            debug!("No tags found in {}", path.display());
            DisplayTags::default()
        }
    };

    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_empty_tags() {
        let tags = read_display_tags(Path::new("/definitely/not/here.mp3"));
        assert_eq!(tags, DisplayTags::default());
    }
}
