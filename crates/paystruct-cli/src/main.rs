//! `paystruct`: terminal client for the PayStruct contractor management API.
//!
//! # Usage
//!
//! ```
//! paystruct signin --email me@example.com --password secret
//! paystruct --api-url https://pay.example/api/v1
//! paystruct statement add --contract-id 12 --from 1403/01/01 --to 1403/01/31
//! ```

mod app;
mod commands;
mod settings;
mod ui;

use std::{fs::OpenOptions, io, path::PathBuf, sync::Mutex, time::Duration};

use anyhow::{Context, Result};
use app::App;
use chrono::{Local, Utc};
use clap::Parser;
use commands::Command;
use crossterm::{
  event::{self, Event, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use paystruct_client::{ApiClient, Session, TokenStore};
use ratatui::{Terminal, backend::CrosstermBackend};
use settings::Settings;
use tracing::{level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "paystruct", version, about = "Contractor financial management client")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "paystruct.toml")]
  config: PathBuf,

  /// Base URL of the management API; overrides the config file.
  #[arg(long, env = "PAYSTRUCT_API_URL")]
  api_url: Option<String>,

  #[command(subcommand)]
  command: Option<Command>,
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  let settings = Settings::load(&cli.config, cli.api_url.as_deref())?;
  let command = cli.command.unwrap_or(Command::Tui);

  if matches!(command, Command::Tui) {
    // The terminal belongs to the UI; logs go to a file.
    let file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(&settings.log_file)
      .with_context(|| format!("opening log file {}", settings.log_file.display()))?;
    tracing_subscriber::fmt()
      .with_env_filter(env_filter())
      .with_writer(Mutex::new(file))
      .with_ansi(false)
      .init();
  } else {
    tracing_subscriber::fmt()
      .with_env_filter(env_filter())
      .with_writer(io::stderr)
      .init();
  }

  commands::run(command, settings).await
}

fn env_filter() -> EnvFilter {
  EnvFilter::builder()
    .with_default_directive(LevelFilter::INFO.into())
    .from_env_lossy()
}

// ─── TUI ─────────────────────────────────────────────────────────────────────

/// Run the interactive UI until the user quits.
pub fn run_tui(settings: &Settings, store: &dyn TokenStore) -> Result<()> {
  let mut client = ApiClient::new(&settings.api_url)?;
  // Without a session every list shows the authorization error instead.
  match Session::load(store, Utc::now()) {
    Ok(session) => client = client.with_session(session),
    Err(err) => warn!(error = %err, "starting without a session"),
  }

  let mut app = App::new(client, Local::now().date_naive());
  app.start();

  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  let result = run_event_loop(&mut terminal, &mut app);

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  result
}

fn run_event_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
  loop {
    app.tick();
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event
      && key.kind == KeyEventKind::Press
      && !app.handle_key(key)
    {
      break;
    }
  }

  Ok(())
}
