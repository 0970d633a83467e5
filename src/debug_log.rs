//! Shared debug logging utility.
//!
//! The `tag` parameter identifies the source component (e.g., "watch",
//! "monitor") to aid debugging.
//!
//! Writes to ~/.mrc-poche/logs/debug.log

use std::io::Write;

pub fn app_log(tag: &str, msg: &str) {
    if let Ok(log_path) = crate::app_paths::debug_log_path() {
        if let Ok(mut file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
        {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let _ = writeln!(file, "[{}] [{}] {}", now, tag, msg);
        }
    }
}
