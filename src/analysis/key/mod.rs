//! Key notation

pub mod camelot;

pub use camelot::{from_camelot, is_camelot_code, key_to_camelot, to_camelot};
