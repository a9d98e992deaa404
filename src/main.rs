//! cratedig CLI entry point

use clap::Parser;
use cratedig::analysis::{FallbackEngine, StratumEngine};
use cratedig::audio::SymphoniaDecoder;
use cratedig::config::{Cli, Settings};
use cratedig::discovery;
use cratedig::persist::JsonLibrarySink;
use cratedig::pipeline::{RecordState, SessionEvent, SessionHandle, TrackAnalyzer};
use indicatif::{ProgressBar, ProgressStyle};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Wider tempo search used when the default pass finds nothing
const FALLBACK_MIN_BPM: f32 = 60.0;
const FALLBACK_MAX_BPM: f32 = 200.0;

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(&cli);

    if let Err(e) = validate_inputs(&cli) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let settings = match Settings::from_cli(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&settings) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Fatal error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(settings: &Settings) -> cratedig::Result<ExitCode> {
    let tracks = discovery::scan(&settings.input, settings.recursive)?;
    if tracks.is_empty() {
        println!("No supported audio files found in {}", settings.input.display());
        return Ok(ExitCode::SUCCESS);
    }

    // Open the library up front so a corrupt file is reported before analysis
    let mut sink = match (&settings.library, settings.commit) {
        (Some(path), true) => Some(JsonLibrarySink::open(path)?),
        _ => None,
    };

    let analyzer = TrackAnalyzer::with_config(
        Arc::new(SymphoniaDecoder::new()),
        Arc::new(FallbackEngine::new(
            StratumEngine::new(),
            StratumEngine::with_search_range(FALLBACK_MIN_BPM, FALLBACK_MAX_BPM),
        )),
        settings.analyzer.clone(),
    );

    println!(
        "Analyzing {} tracks, range {}",
        tracks.len(),
        settings.range
    );

    let mut session = SessionHandle::new(analyzer, tracks, settings.range.clone());
    let events = session.events();
    session.start()?;

    let pb = if settings.show_progress {
        let pb = ProgressBar::new(session.progress().total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    for event in events.iter() {
        match event {
            SessionEvent::TrackFinished {
                record, progress, ..
            } => {
                if let Some(pb) = &pb {
                    pb.set_position(progress.current as u64);
                    pb.set_message(match &record.result {
                        Some(result) => format!(
                            "{} ({:.1} BPM, {})",
                            record.track.title, result.bpm, result.camelot
                        ),
                        None => format!("{} (failed)", record.track.title),
                    });
                }
            }
            SessionEvent::Finished { .. } => break,
            _ => {}
        }
    }

    session.wait();
    if let Some(pb) = &pb {
        pb.finish_with_message("Analysis complete");
    }

    let snapshot = session.snapshot();
    println!();
    for record in &snapshot.records {
        let label = if record.track.artist.is_empty() {
            record.track.title.clone()
        } else {
            format!("{} - {}", record.track.artist, record.track.title)
        };
        match (record.state(), &record.result, &record.error) {
            (RecordState::Succeeded, Some(result), _) => {
                let bpm = if result.has_bpm() {
                    format!("{:6.1}", result.bpm)
                } else {
                    format!("{:>6}", "-")
                };
                println!("  {}  {:>3}  {}", bpm, result.camelot, label);
            }
            (RecordState::Failed, _, Some(error)) => {
                println!("  {:>6}  {:>3}  {} ({})", "ERR", "", label, error.reason);
            }
            _ => println!("  {:>6}  {:>3}  {}", "", "", label),
        }
    }

    let summary = snapshot.summary();
    println!();
    println!(
        "Summary: {} successful, {} failed, {} pending (of {} total)",
        summary.succeeded,
        summary.failed,
        summary.pending,
        snapshot.records.len()
    );

    if let Some(sink) = sink.as_mut() {
        let saved = session.commit(sink)?;
        println!("Saved {} tracks to {}", saved, sink.path().display());
    }

    Ok(if summary.failed > 0 {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

fn init_logging(cli: &Cli) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with_target(false)
        .init();
}

fn validate_inputs(cli: &Cli) -> Result<(), String> {
    if !cli.input.exists() {
        return Err(format!(
            "Input path does not exist: {}\n\n  Tip: Check the path is correct and accessible.\n  Examples:\n    cratedig -i ~/Music/DJ\n    cratedig -i ./track.mp3 --range hip-hop",
            cli.input.display()
        ));
    }

    if let Some(library) = &cli.library {
        if let Some(parent) = library.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(format!(
                    "Library directory does not exist: {}\n\n  Tip: Create it first.\n  Example: mkdir -p {}",
                    parent.display(),
                    parent.display()
                ));
            }
        }
    }

    Ok(())
}
