use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use billed_core::{Session, UserType};
use billed_store::{BlockingStore, HttpStore, MemoryStore};
use billed_tui::app::App;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;

fn main() -> Result<()> {
    // Logs stay off unless BILLED_LOG is set; the terminal is in raw mode.
    let filter = tracing_subscriber::EnvFilter::try_from_env("BILLED_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("off"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    // Parse CLI: billed [--server URL] [--token KEY] [--session PATH]
    // No --server → run against the in-memory fixture store (demo mode)
    let server_url = arg_value(&args, "--server")?;
    let token = match arg_value(&args, "--token")? {
        Some(token) => Some(token),
        None => std::env::var("BILLED_TOKEN").ok().filter(|t| !t.is_empty()),
    };

    let session = load_session(arg_value(&args, "--session")?, server_url.is_none())?;

    let store = match &server_url {
        Some(url) => {
            let http = match token {
                Some(token) => HttpStore::with_token(url, token),
                None => HttpStore::new(url),
            };
            let store = BlockingStore::new(http);
            store
                .health_check()
                .with_context(|| format!("bills backend unreachable at {url}"))?;
            store
        }
        None => BlockingStore::new(MemoryStore::with_fixtures()),
    };

    run_tui(store, session)
}

fn arg_value(args: &[String], flag: &str) -> Result<Option<String>> {
    match args.iter().position(|a| a == flag) {
        Some(pos) => {
            let value = args
                .get(pos + 1)
                .with_context(|| format!("{flag} requires a value"))?;
            Ok(Some(value.clone()))
        }
        None => Ok(None),
    }
}

/// Resolve the signed-in user: explicit --session path, then
/// $BILLED_SESSION, then the default config location. Demo mode falls back
/// to a demo employee; against a real backend a missing session is the
/// unauthenticated error.
fn load_session(explicit: Option<String>, demo_mode: bool) -> Result<Session> {
    if let Some(path) = explicit {
        return Ok(Session::load(Path::new(&path))?);
    }

    let path = default_session_path();
    match &path {
        Some(path) if path.exists() => Ok(Session::load(path)?),
        _ if demo_mode => Ok(Session {
            user_type: UserType::Employee,
            email: "employee@test.tld".into(),
        }),
        Some(path) => Ok(Session::load(path)?),
        None => anyhow::bail!("no session path; set BILLED_SESSION or pass --session"),
    }
}

fn default_session_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("BILLED_SESSION") {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".config/billed/session.json"))
}

fn run_tui(store: BlockingStore, session: Session) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, store, session);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        eprintln!("Error: {e}");
    }

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    store: BlockingStore,
    session: Session,
) -> Result<()> {
    let mut app = App::new(store, session);

    loop {
        terminal.draw(|frame| app.render(frame))?;

        if let Event::Key(key) = event::read()? {
            // Ctrl+C always quits
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                break;
            }
            // q quits unless we're in an input mode
            if key.code == KeyCode::Char('q') && !app.is_input_mode() {
                break;
            }
            app.handle_key(key);
        }
    }

    Ok(())
}
