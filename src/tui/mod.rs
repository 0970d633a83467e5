//! Terminal UI for the connectivity watch screen.

mod event;
mod ui;
mod watch;

pub use watch::run_watch;
