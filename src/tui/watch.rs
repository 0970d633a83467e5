//! The watch screen: live connectivity state, quotas and notifications.

use crate::config::AppConfig;
use crate::connectivity::{self, Connectivity, ConnectivityDetector};
use crate::credentials::{ApiKeyStore, Provider};
use crate::debug_log::app_log;
use crate::prefs::Preferences;
use crate::tui::event::{Event, EventHandler};
use crate::tui::ui;
use crate::usage::UsageLedger;
use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyModifiers};
use std::time::Duration;
use tokio::sync::mpsc;

/// Tour identifier for the first-visit help hint.
const WATCH_TOUR: &str = "watch";

/// Notifications kept on screen.
const MAX_TOASTS: usize = 6;

pub struct WatchApp {
    pub detector: ConnectivityDetector,
    pub prefs: Preferences,
    pub ledger: UsageLedger,
    /// Newest toast last; capped at [`MAX_TOASTS`].
    pub toasts: Vec<String>,
    /// (feature, remaining, quota) lines refreshed each frame.
    pub quota_lines: Vec<(String, u32, u32)>,
    pub key_status: Vec<(Provider, bool)>,
    pub show_help: bool,
}

impl WatchApp {
    fn new(
        initial: Connectivity,
        prefs: Preferences,
        ledger: UsageLedger,
        keys: &ApiKeyStore,
    ) -> Self {
        let key_status = Provider::ALL.iter().map(|p| (*p, keys.has(*p))).collect();
        Self {
            detector: ConnectivityDetector::new(initial),
            prefs,
            ledger,
            toasts: Vec::new(),
            quota_lines: Vec::new(),
            key_status,
            show_help: false,
        }
    }

    fn refresh(&mut self) {
        let features: Vec<String> = self
            .ledger
            .tracked_features()
            .map(str::to_string)
            .collect();
        self.quota_lines = features
            .into_iter()
            .map(|feature| {
                let remaining = self.ledger.get_remaining(&feature);
                let quota = self.ledger.quota(&feature);
                (feature, remaining, quota)
            })
            .collect();
    }

    fn push_toast(&mut self, text: String) {
        let stamp = chrono::Local::now().format("%H:%M:%S");
        self.toasts.push(format!("{}  {}", stamp, text));
        if self.toasts.len() > MAX_TOASTS {
            self.toasts.remove(0);
        }
    }

    /// The offline banner is persistent while offline, unless dismissed.
    pub fn banner_visible(&self) -> bool {
        !self.detector.is_online() && !self.prefs.connectivity_banner_dismissed()
    }

    pub fn tour_hint_visible(&self) -> bool {
        !self.prefs.is_tour_completed(WATCH_TOUR)
    }
}

pub async fn run_watch(config: AppConfig) -> Result<()> {
    let prefs = Preferences::open_default()?;
    let ledger = UsageLedger::open_default(config.effective_quotas())?;
    let keys = ApiKeyStore::open_default()?;

    // Initial state comes from a probe before the screen opens.
    let startup_url = config.probe_url.clone();
    let initial = tokio::task::spawn_blocking(move || connectivity::probe(&startup_url))
        .await
        .context("Startup probe task failed")?;

    let mut app = WatchApp::new(initial, prefs, ledger, &keys);
    app.prefs.push_screen("watch");
    app_log("watch", &format!("started, initial state {}", initial.label()));

    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut event_handler = EventHandler::new(Duration::from_millis(200));
    let (conn_tx, mut conn_rx) = mpsc::unbounded_channel();
    let monitor = connectivity::spawn_monitor(
        config.probe_url.clone(),
        Duration::from_secs(config.probe_interval_secs),
        conn_tx,
    );

    let result = run_loop(&mut terminal, &mut event_handler, &mut conn_rx, &mut app).await;

    monitor.abort();
    restore_terminal(&mut terminal)?;
    result
}

async fn run_loop(
    terminal: &mut ratatui::Terminal<ratatui::backend::CrosstermBackend<std::io::Stdout>>,
    event_handler: &mut EventHandler,
    conn_rx: &mut mpsc::UnboundedReceiver<Connectivity>,
    app: &mut WatchApp,
) -> Result<()> {
    loop {
        app.refresh();
        terminal.draw(|frame| ui::draw(frame, app))?;

        tokio::select! {
            event = event_handler.next() => match event? {
                Event::Key(key) => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(());
                    }
                    KeyCode::Char('d') => {
                        app.prefs.dismiss_connectivity_banner();
                    }
                    KeyCode::Char('h') => {
                        app.show_help = !app.show_help;
                        app.prefs.mark_tour_completed(WATCH_TOUR);
                    }
                    _ => {}
                },
                Event::Tick | Event::Resize => {}
            },
            observed = conn_rx.recv() => {
                if let Some(observed) = observed {
                    if let Some(transition) = app.detector.apply(observed) {
                        app_log(
                            "watch",
                            &format!("{} -> {}", transition.from.label(), transition.to.label()),
                        );
                        app.push_toast(transition.toast());
                    }
                }
            }
        }
    }
}

fn restore_terminal(
    terminal: &mut ratatui::Terminal<ratatui::backend::CrosstermBackend<std::io::Stdout>>,
) -> Result<()> {
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::terminal::LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;
    Ok(())
}
