//! Runtime configuration settings

use crate::error::{CratedigError, Result};
use crate::pipeline::AnalyzerConfig;
use crate::types::BpmRange;
use std::path::PathBuf;

/// Runtime settings for an analysis run
#[derive(Debug, Clone)]
pub struct Settings {
    /// Input path (file or directory)
    pub input: PathBuf,
    /// Scan recursively
    pub recursive: bool,
    /// Initial tempo range
    pub range: BpmRange,
    /// Decode window and analysis rate
    pub analyzer: AnalyzerConfig,
    /// JSON library file
    pub library: Option<PathBuf>,
    /// Save successful results after analysis
    pub commit: bool,
    /// Show progress bars
    pub show_progress: bool,
}

impl Settings {
    /// Create settings from CLI arguments, validating the range and window
    pub fn from_cli(cli: &super::cli::Cli) -> Result<Self> {
        let range = match (cli.min, cli.max) {
            (Some(min), Some(max)) => BpmRange::custom(min, max)?,
            _ => BpmRange::preset(&cli.range).ok_or_else(|| {
                CratedigError::ConfigError(format!("Unknown range preset '{}'", cli.range))
            })?,
        };

        if !(cli.window.is_finite() && cli.window > 0.0) {
            return Err(CratedigError::ConfigError(format!(
                "Window must be a positive number of seconds, got {}",
                cli.window
            )));
        }

        Ok(Self {
            input: cli.input.clone(),
            recursive: cli.recursive,
            range,
            analyzer: AnalyzerConfig {
                window_seconds: cli.window,
                ..AnalyzerConfig::default()
            },
            library: cli.library.clone(),
            commit: cli.commit,
            show_progress: !cli.quiet,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input: PathBuf::from("."),
            recursive: true,
            range: BpmRange::default(),
            analyzer: AnalyzerConfig::default(),
            library: None,
            commit: false,
            show_progress: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Cli;
    use clap::Parser;

    #[test]
    fn test_preset_range_from_cli() {
        let cli = Cli::parse_from(["cratedig", "-i", "m", "--range", "hip-hop"]);
        let settings = Settings::from_cli(&cli).unwrap();
        assert_eq!((settings.range.min, settings.range.max), (70.0, 140.0));
    }

    #[test]
    fn test_custom_range_from_cli() {
        let cli = Cli::parse_from(["cratedig", "-i", "m", "--min", "85", "--max", "175"]);
        let settings = Settings::from_cli(&cli).unwrap();
        assert_eq!(settings.range.label, "Custom (85-175)");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let inverted = Cli::parse_from(["cratedig", "-i", "m", "--min", "175", "--max", "85"]);
        assert!(matches!(
            Settings::from_cli(&inverted),
            Err(CratedigError::InvalidRange(_))
        ));

        let zero_window = Cli::parse_from(["cratedig", "-i", "m", "--window", "0"]);
        assert!(matches!(
            Settings::from_cli(&zero_window),
            Err(CratedigError::ConfigError(_))
        ));
    }
}
