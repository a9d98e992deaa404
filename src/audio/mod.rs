//! Audio input: decoding, window selection and resampling

pub mod decoder;
pub mod resample;
pub mod window;

pub use decoder::{AudioDecoder, SymphoniaDecoder};
pub use resample::{resample_buffer, ANALYSIS_SAMPLE_RATE};
pub use window::{select_window, DEFAULT_WINDOW_SECONDS};
