//! Building track lists from the filesystem

pub mod scanner;

pub use scanner::{generate_track_id, scan, track_ref_for};
