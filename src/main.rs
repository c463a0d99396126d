mod app;
mod ui;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use chimegrid::audio::AudioEngine;
use chimegrid::command::CommandBus;
use chimegrid::config::{GridPreset, SequencerConfig};
use chimegrid::project::renderer::export_wav;
use chimegrid::sequencer::{AudioClock, Grid, SequencerDriver, StepScheduler, WallClock};
use chimegrid::share::ShareLink;
use chimegrid::synth::NoteSink;

use app::App;
use ui::Theme;

const DEFAULT_SHARE_BASE: &str = "http://localhost:3000/";

/// Chimegrid - pentatonic bell step sequencer for the terminal
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Grid preset: single (1x8), double (2x8) or full (16x16)
    #[arg(long)]
    preset: Option<String>,

    /// Number of rows (overrides preset)
    #[arg(long)]
    rows: Option<usize>,

    /// Number of columns (overrides preset)
    #[arg(long)]
    cols: Option<usize>,

    /// Seconds per column
    #[arg(long)]
    step: Option<f64>,

    /// Lookahead window in seconds
    #[arg(long)]
    lookahead: Option<f64>,

    /// Poll interval in milliseconds
    #[arg(long)]
    poll_ms: Option<u64>,

    /// Start muted
    #[arg(long)]
    muted: bool,

    /// Disable cell flashes
    #[arg(long)]
    no_animate: bool,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Load the grid from a share link or bare token
    #[arg(long)]
    share: Option<String>,

    /// Base URL for share links
    #[arg(long, default_value = DEFAULT_SHARE_BASE)]
    share_base: String,

    /// Print the share link for the loaded grid and exit
    #[arg(long)]
    print_share: bool,

    /// Render the grid to a WAV file and exit
    #[arg(long)]
    export: Option<PathBuf>,

    /// Passes over the grid when exporting
    #[arg(long, default_value_t = 2)]
    loops: usize,

    /// Run without an audio device
    #[arg(long)]
    silent: bool,

    /// Theme to use for the interface
    #[arg(long, default_value = "default")]
    theme: String,

    /// List available themes and exit
    #[arg(long)]
    list_themes: bool,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

/// Log to a file; the terminal belongs to the TUI
fn init_logging(verbose: bool) {
    use simplelog::*;

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    let log_path = dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("chimegrid")
        .join("chimegrid.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = match File::create(&log_path)
        .or_else(|_| File::create(std::env::temp_dir().join("chimegrid.log")))
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Warning: cannot create log file: {}", e);
            return;
        }
    };

    if WriteLogger::init(log_level, Config::default(), log_file).is_err() {
        eprintln!("Warning: logger already initialized");
        return;
    }

    log::info!("chimegrid starting (log level: {:?})", log_level);
}

/// Config file or preset, then individual flags
fn build_config(args: &Args) -> Result<SequencerConfig> {
    let mut config = match &args.config {
        Some(path) => SequencerConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SequencerConfig::default(),
    };

    if let Some(name) = &args.preset {
        let (rows, cols) = GridPreset::from_name(name)?.dimensions();
        config.rows = rows;
        config.cols = cols;
    }
    if let Some(rows) = args.rows {
        config.rows = rows;
    }
    if let Some(cols) = args.cols {
        config.cols = cols;
    }
    if let Some(step) = args.step {
        config.step_seconds = step;
    }
    if let Some(lookahead) = args.lookahead {
        config.lookahead_seconds = lookahead;
    }
    if let Some(poll_ms) = args.poll_ms {
        config.poll_interval_ms = poll_ms;
    }
    if args.muted {
        config.muted = true;
    }
    if args.no_animate {
        config.animate = false;
    }

    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.list_themes {
        println!("Available themes:");
        for theme in Theme::available_themes() {
            println!("  {}", theme);
        }
        return Ok(());
    }

    init_logging(args.verbose);

    let config = build_config(&args)?;
    log::debug!("config: {:?}", config);

    let grid = match &args.share {
        Some(link) => ShareLink::parse(link, config.rows, config.cols),
        None => Grid::new(config.rows, config.cols),
    };

    if args.print_share {
        println!("{}", ShareLink::build(&args.share_base, &grid)?);
        return Ok(());
    }

    if let Some(path) = &args.export {
        let result = export_wav(&config, &grid, args.loops, path)?;
        println!(
            "Exported {} notes ({:.1}s) to {}",
            result.notes,
            result.duration_secs,
            path.display()
        );
        return Ok(());
    }

    let theme = Theme::from_name(&args.theme).unwrap_or_else(|| {
        eprintln!(
            "Warning: Unknown theme '{}', using default. Use --list-themes to see available themes.",
            args.theme
        );
        Theme::default()
    });

    // Fall back to silent mode when no device can be opened
    let audio = if args.silent {
        None
    } else {
        match AudioEngine::new() {
            Ok(engine) => Some(engine),
            Err(e) => {
                log::error!("Audio unavailable, running silent: {:#}", e);
                None
            }
        }
    };

    let (clock, sink) = match &audio {
        Some(engine) => {
            let clock: Arc<dyn AudioClock> = engine.clock();
            let sink: Box<dyn NoteSink> = Box::new(engine.synthesizer());
            (clock, Some(sink))
        }
        None => {
            let clock: Arc<dyn AudioClock> = Arc::new(WallClock::new());
            (clock, None)
        }
    };

    let mut scheduler = StepScheduler::new(&config, sink);
    scheduler.set_grid(grid)?;

    let bus = CommandBus::new();
    let driver = SequencerDriver::spawn(scheduler, clock, config.poll_interval(), &bus)?;

    let mut app = App::new(theme, audio, driver, config, args.share_base.clone());
    app.run()
}
