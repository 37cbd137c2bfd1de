use std::io;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use ratatui::Terminal;
use ratatui::crossterm::event;
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::prelude::CrosstermBackend;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

mod action;
mod app;
mod backend;
mod input;
mod theme;
mod tui_event;
mod view;

use app::{App, Effect};
use sieve_core::{
    BookmarkSaver, HttpConfig, HttpTransport, ReadStateSynchronizer, WarningPresenter,
};
use tui_event::UiEvent;

/// Keyboard-driven triage of unread feed references against a sieve
/// service.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Sieve resource url, e.g. https://example.org/u/alice/sieve/
    sieve_url: String,

    /// Bookmark collection url (default: derived from the sieve url)
    #[arg(long)]
    collection_url: Option<String>,

    /// Session cookie value
    #[arg(long)]
    session: Option<String>,

    /// CSRF token sent on writes
    #[arg(long)]
    csrf_token: Option<String>,

    /// Browse without pushing read state to the server
    #[arg(long)]
    no_sync: bool,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Resolve credentials from CLI flags > env vars
    let session = args.session.or_else(|| std::env::var("SIEVE_SESSION").ok());
    let csrf_token = args
        .csrf_token
        .or_else(|| std::env::var("SIEVE_CSRFTOKEN").ok());

    let config = HttpConfig {
        sieve_url: args.sieve_url,
        collection_url: args.collection_url,
        session_cookie: session,
        csrf_token,
        timeout_secs: args.timeout,
    };
    let transport = Arc::new(HttpTransport::new(config)?);

    let (tx, mut rx) = mpsc::unbounded_channel::<UiEvent>();
    let warnings: Arc<dyn WarningPresenter> =
        Arc::new(backend::ChannelPresenter::new(tx.clone()));
    let sync = Arc::new(ReadStateSynchronizer::new(
        Arc::clone(&transport),
        warnings.clone(),
        !args.no_sync,
    ));
    let saver = Arc::new(BookmarkSaver::new(Arc::clone(&transport), warnings));
    let mut app = App::new(Arc::clone(&sync), saver);

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    // Install panic hook that restores terminal before printing panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let terminal_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(terminal_backend)?;

    // Drain any stray input events (e.g. Enter keypress from launching the command)
    while event::poll(Duration::from_millis(50)).unwrap_or(false) {
        let _ = event::read();
    }

    let cancel = CancellationToken::new();

    // Initial fetch
    tokio::spawn(backend::load_sieve(
        Arc::clone(&transport),
        tx.clone(),
        cancel.clone(),
    ));

    // Also handle Ctrl+C at the OS level for clean shutdown
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_for_signal.cancel();
        }
    });

    // Main event loop
    let tick_rate = Duration::from_millis(100);

    loop {
        terminal.draw(|f| app.view(f))?;

        tokio::select! {
            // Background task events (non-blocking drain)
            maybe_event = rx.recv() => {
                if let Some(ui_event) = maybe_event {
                    let effect = app.handle_ui_event(ui_event);
                    run_effect(effect, &transport, &sync, &tx, &cancel);
                    while let Ok(ui_event) = rx.try_recv() {
                        let effect = app.handle_ui_event(ui_event);
                        run_effect(effect, &transport, &sync, &tx, &cancel);
                    }
                }
            }
            // Terminal input events
            _ = async {
                if event::poll(tick_rate).unwrap_or(false) {
                    if let Ok(evt) = event::read() {
                        let action = input::map_event(&evt);
                        let effect = app.update(action);
                        run_effect(effect, &transport, &sync, &tx, &cancel);
                    }
                }
            } => {}
        }

        // Process tick
        app.update(action::Action::Tick);

        if app.should_quit || cancel.is_cancelled() {
            cancel.cancel();
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    // Session summary
    let sieve = app.controller.sieve();
    println!(
        "{} items in the sieve, {} read, {} saved",
        sieve.len(),
        sieve.read_count(),
        sieve.saved_count()
    );

    Ok(())
}

/// Run an effect requested by the app: spawn the matching background task
/// or hand a url to the system browser.
fn run_effect(
    effect: Effect,
    transport: &Arc<HttpTransport>,
    sync: &Arc<ReadStateSynchronizer<HttpTransport>>,
    tx: &mpsc::UnboundedSender<UiEvent>,
    cancel: &CancellationToken,
) {
    match effect {
        Effect::None => {}
        Effect::OpenUrl(url) => open_in_browser(&url),
        Effect::Refetch => {
            tokio::spawn(backend::load_sieve(
                Arc::clone(transport),
                tx.clone(),
                cancel.clone(),
            ));
        }
        Effect::Drain => {
            tokio::spawn(backend::drain_for_reload(Arc::clone(sync), tx.clone()));
        }
    }
}

fn open_in_browser(url: &str) {
    #[cfg(target_os = "macos")]
    let _ = std::process::Command::new("open").arg(url).spawn();
    #[cfg(target_os = "linux")]
    let _ = std::process::Command::new("xdg-open").arg(url).spawn();
    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    let _ = url;
}
