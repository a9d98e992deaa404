//! CLI argument parsing

use clap::Parser;
use std::path::PathBuf;

/// cratedig - tempo and Camelot key analysis for DJ libraries
///
/// Analyzes audio files one at a time, folds tempos into a genre range and
/// optionally saves the accepted BPM/key into a JSON library file.
#[derive(Parser, Debug)]
#[command(name = "cratedig")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Input path (file or directory)
    #[arg(short, long, value_name = "PATH")]
    pub input: PathBuf,

    /// Scan subdirectories recursively (--recursive false to stay at the top level)
    #[arg(short, long, default_value_t = true, action = clap::ArgAction::Set)]
    pub recursive: bool,

    /// Tempo range preset
    #[arg(long, value_name = "PRESET", default_value = "electronic")]
    #[arg(value_parser = ["electronic", "hip-hop", "slow", "fast", "wide"])]
    pub range: String,

    /// Custom range lower bound (requires --max, overrides --range)
    #[arg(long, value_name = "BPM", requires = "max")]
    pub min: Option<f64>,

    /// Custom range upper bound (requires --min, overrides --range)
    #[arg(long, value_name = "BPM", requires = "min")]
    pub max: Option<f64>,

    /// Seconds of audio analyzed per track, centered on the middle
    #[arg(long, value_name = "SECONDS", default_value = "60")]
    pub window: f64,

    /// JSON library file receiving committed results
    #[arg(short, long, value_name = "FILE")]
    pub library: Option<PathBuf>,

    /// Save successful results to the library after analysis
    #[arg(long, default_value = "false", requires = "library")]
    pub commit: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress progress bars)
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

impl Cli {
    /// Get the log filter based on verbosity flags
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
