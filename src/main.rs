mod app;
mod busy;
mod cache;
mod catalog;
mod config;
mod constants;
mod dispatch;
mod engine;
mod info;
mod input;
mod model;
mod organizer;
mod resolver;
mod theme;
mod tree;
mod ui;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use directories::ProjectDirs;
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use app::App;
use cache::Caches;
use catalog::{Catalog, HttpCatalog};
use config::Config;
use constants::constants;
use dispatch::{ProcessLauncher, command_available};
use engine::Engine;
use model::VodTypes;
use resolver::Resolver;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(
  author,
  version = env!("CARGO_PKG_VERSION"),
  about = "Browse and play the F1TV archive from the terminal",
  long_about = None
)]
struct Args {
  /// Show the debug pane and the "GET URL" action
  #[arg(short, long)]
  debug: bool,

  /// Configuration file (default: config.toml in the platform config directory)
  #[arg(short, long, value_name = "PATH")]
  config: Option<PathBuf>,

  /// Print shell completions and exit
  #[arg(long, value_name = "SHELL")]
  completions: Option<Shell>,
}

// --- Logging ---

/// Log to a daily file in the platform data directory; the terminal belongs to the TUI.
fn init_logging() -> Result<WorkerGuard> {
  let dirs = ProjectDirs::from("", "", &constants().app_name).context("Could not determine a data directory")?;
  let log_dir = dirs.data_dir().join("logs");
  std::fs::create_dir_all(&log_dir).with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

  let file_appender = tracing_appender::rolling::daily(&log_dir, &constants().log_file_prefix);
  let (writer, guard) = tracing_appender::non_blocking(file_appender);
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt().with_writer(writer).with_env_filter(filter).with_ansi(false).with_target(false).init();
  Ok(guard)
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(shell) = args.completions {
    clap_complete::generate(shell, &mut Args::command(), env!("CARGO_PKG_NAME"), &mut std::io::stdout());
    return Ok(());
  }

  let _guard = init_logging()?;
  // A missing config file yields defaults; a malformed one is fatal.
  let config = Config::load(args.config.as_deref())?;
  info!(debug = args.debug, options = config.custom_playback_options.len(), "starting");

  if !command_available("mpv") {
    warn!("mpv not found on PATH; \"Play with MPV\" will fail");
  }

  let catalog = Arc::new(HttpCatalog::new().context("Failed to build HTTP client")?);
  let (categories, startup_error) = match catalog.fetch_vod_categories().await {
    Ok(categories) => (categories, None),
    Err(e) => {
      error!(err = %e, "could not load VOD categories");
      (VodTypes::default(), Some(format!("Could not load categories: {}", e)))
    }
  };

  let (tx, rx) = mpsc::unbounded_channel();
  let resolver = Resolver::new(Arc::clone(&catalog), Arc::new(Caches::new()));
  let engine =
    Engine::new(catalog, resolver, Arc::new(ProcessLauncher), Arc::new(config), categories, tx, args.debug);
  let mut app = App::new(engine, rx, args.debug);
  app.status_message = startup_error;

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, &mut app).await;
  ratatui::restore();
  result
}

async fn run(terminal: &mut DefaultTerminal, app: &mut App<HttpCatalog>) -> Result<()> {
  loop {
    app.check_pending();

    terminal.draw(|frame| ui::ui(frame, app))?;

    // Poll briefly and yield so worker tasks and blink timers keep running.
    if event::poll(Duration::from_millis(50))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => input::handle_key_event(app, key),
        _ => {}
      }
    }
    tokio::task::yield_now().await;

    if app.should_quit {
      break;
    }
  }
  info!("exiting");
  Ok(())
}
