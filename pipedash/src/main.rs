//! pipedash - Pipeline assistant dashboard
//!
//! Terminal UI for chatting with the assistant, running its pipeline, and
//! browsing the report, chart, and data it produces.

mod app;
mod message_format;
mod ui;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use pipedash_core::chart::ChartStore;
use pipedash_core::{Config, Controller, Gateway, HttpBackend, ServerStatus};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::app::App;

#[derive(Parser, Debug)]
#[command(name = "pipedash")]
#[command(about = "Terminal dashboard for a pipeline assistant")]
#[command(version)]
struct Args {
    /// Backend base URL (overrides the config file)
    #[arg(long, value_name = "URL")]
    server: Option<String>,

    /// Load configuration from this file instead of the default location
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Probe the backend, print its status, and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Config::load().context("failed to load configuration")?,
    };
    if let Some(server) = args.server {
        config.server.base_url = server;
    }
    config
        .server
        .validate()
        .context("invalid server configuration")?;

    // Initialize logging (to file, not stdout since we have a TUI)
    let _log_guard =
        pipedash_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let backend = HttpBackend::new(&config.server).context("failed to create HTTP client")?;
    let server_label = backend.base_url().to_string();
    tracing::info!(server = %server_label, "pipedash starting up");

    let charts = ChartStore::open(Config::chart_dir()).context("failed to open chart store")?;
    let gateway = Gateway::new(Arc::new(backend), charts);

    if args.check {
        return check(&gateway, &server_label).await;
    }

    let controller = Controller::new(gateway, config.view.column_strategy);
    let mut app = App::new(controller, server_label);
    app.start();

    // Setup terminal
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal")?;

    // Run the main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;

    // Dropping the app aborts outstanding requests and releases the chart
    drop(app);
    tracing::info!("pipedash shutting down");

    result
}

/// Run the main application loop.
fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        // Apply whatever the background requests have posted
        app.tick();

        // Render
        terminal.draw(|frame| ui::render(frame, app))?;

        // Handle events
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        // Check if we should quit
        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Non-interactive status probe for `--check`.
async fn check(gateway: &Gateway, server: &str) -> Result<()> {
    match gateway.check_status().await {
        ServerStatus::Online(status) => {
            println!("{}: {}", server, status);
            Ok(())
        }
        _ => bail!("backend at {} is unreachable", server),
    }
}
