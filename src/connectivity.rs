//! Online/offline detection.
//!
//! A two-state machine fed by probe observations. Every state change emits a
//! [`Transition`] that callers turn into a one-time toast; repeated
//! observations of the same state emit nothing, and no transition is
//! suppressed or debounced — rapid flapping produces one notification per
//! change. Consumers read the current state synchronously and branch to
//! cached/canned code paths themselves; nothing queues actions attempted
//! while offline.

use std::time::Duration;
use tokio::sync::mpsc;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Online,
    Offline,
}

impl Connectivity {
    pub fn is_online(&self) -> bool {
        matches!(self, Connectivity::Online)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Connectivity::Online => "en ligne",
            Connectivity::Offline => "hors ligne",
        }
    }
}

/// A state change observed by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Connectivity,
    pub to: Connectivity,
}

impl Transition {
    /// User-visible notification text for this transition.
    pub fn toast(&self) -> String {
        match self.to {
            Connectivity::Online => {
                "Connexion rétablie : les fonctionnalités en ligne sont de nouveau disponibles."
                    .to_string()
            }
            Connectivity::Offline => {
                "Vous êtes hors ligne : l'application bascule sur le contenu local.".to_string()
            }
        }
    }
}

/// Tracks the current connectivity state.
pub struct ConnectivityDetector {
    state: Connectivity,
}

impl ConnectivityDetector {
    /// Creates a detector with the state observed at startup.
    pub fn new(initial: Connectivity) -> Self {
        Self { state: initial }
    }

    pub fn state(&self) -> Connectivity {
        self.state
    }

    pub fn is_online(&self) -> bool {
        self.state.is_online()
    }

    /// Feeds an observation into the detector. Returns the transition when
    /// the state changed, `None` otherwise.
    pub fn apply(&mut self, observed: Connectivity) -> Option<Transition> {
        if observed == self.state {
            return None;
        }
        let transition = Transition {
            from: self.state,
            to: observed,
        };
        self.state = observed;
        Some(transition)
    }
}

fn probe_agent() -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(PROBE_TIMEOUT))
        .build()
        .into()
}

/// Probes `url` once. Any response from the server, including an HTTP error
/// status, counts as online; only transport failures count as offline.
pub fn probe(url: &str) -> Connectivity {
    let agent = probe_agent();
    match agent.head(url).call() {
        Ok(_) => Connectivity::Online,
        Err(ureq::Error::StatusCode(_)) => Connectivity::Online,
        Err(e) => {
            tracing::debug!(url, error = %e, "connectivity probe failed");
            Connectivity::Offline
        }
    }
}

/// Spawns the background monitor feeding probe observations into `tx` every
/// `interval`. The task ends when the receiving side is dropped.
pub fn spawn_monitor(
    probe_url: String,
    interval: Duration,
    tx: mpsc::UnboundedSender<Connectivity>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let url = probe_url.clone();
            let observed = tokio::task::spawn_blocking(move || probe(&url))
                .await
                .unwrap_or(Connectivity::Offline);
            if tx.send(observed).is_err() {
                break;
            }
        }
    })
}
