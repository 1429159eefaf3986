// envtty: step through an environment-model trace in the terminal

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::prelude::*;

use envtty::config::AnimationSettings;
use envtty::snapshot::{SnapshotManager, Trace};
use envtty::ui::App;

/// Snapshot history limit (1 GB)
const HISTORY_LIMIT: usize = 1024 * 1024 * 1024;

#[derive(Debug, Parser)]
#[command(name = "envtty", version, about = "Animated environment-model diagrams in the terminal")]
struct Cli {
    /// Trace file (JSON) to step through
    trace: PathBuf,

    /// Write logs to this file; the terminal belongs to the viewer
    #[arg(long, default_value = "envtty.log")]
    log: PathBuf,

    /// Base duration of one animation, in milliseconds
    #[arg(long, value_name = "MS")]
    base_duration_ms: Option<u64>,

    /// Jump between snapshots without animating
    #[arg(long)]
    no_animate: bool,

    /// Snapshot to start at, counting from 1
    #[arg(long, default_value_t = 1)]
    step: usize,
}

fn init_logging(path: &PathBuf) -> io::Result<()> {
    let file = File::create(path)?;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("ENVTTY_LOG")
                .unwrap_or_else(|_| "info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if !cli.trace.exists() {
        eprintln!("Error: File '{}' not found", cli.trace.display());
        eprintln!("Usage: envtty <trace.json>");
        std::process::exit(1);
    }

    init_logging(&cli.log)?;

    let trace = match Trace::load(&cli.trace) {
        Ok(trace) => trace,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let config = trace.config.clone();
    let history = SnapshotManager::from_trace(trace, HISTORY_LIMIT)?;
    tracing::info!(
        snapshots = history.len(),
        memory = history.memory_usage(),
        "trace loaded"
    );

    let mut settings = AnimationSettings::default();
    if let Some(ms) = cli.base_duration_ms {
        settings.base_duration = Duration::from_millis(ms);
    }
    settings.enabled = !cli.no_animate;

    let mut app = App::new(history, config, settings);
    if cli.step > 1 {
        app.show(cli.step - 1, false);
    }

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
