//! Centralized home-based storage paths for all mrc-poche persistence.
//!
//! This module provides helpers for unified storage under `~/.mrc-poche/`:
//! - `settings.json` - User preferences
//! - `usage.json` - Monthly feature usage counters
//! - `api_keys.json` - Third-party API credentials
//! - `config.yaml` - Application configuration
//! - `logs/debug.log` - Debug log

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// The name of the mrc-poche directory.
const APP_DIR: &str = ".mrc-poche";

#[cfg(test)]
thread_local! {
    static TEST_HOME: std::cell::RefCell<Option<PathBuf>> =
        const { std::cell::RefCell::new(None) };
}

/// Overrides the home directory for the current test thread.
///
/// The override is cleared when the returned guard is dropped.
#[cfg(test)]
pub fn set_home_for_test(home: PathBuf) -> TestHomeGuard {
    TEST_HOME.with(|h| *h.borrow_mut() = Some(home));
    TestHomeGuard
}

#[cfg(test)]
pub struct TestHomeGuard;

#[cfg(test)]
impl Drop for TestHomeGuard {
    fn drop(&mut self) {
        TEST_HOME.with(|h| *h.borrow_mut() = None);
    }
}

fn home_dir() -> Result<PathBuf> {
    #[cfg(test)]
    if let Some(home) = TEST_HOME.with(|h| h.borrow().clone()) {
        return Ok(home);
    }
    dirs::home_dir().context("Could not determine home directory for local storage")
}

/// Returns the home-based app directory: `~/.mrc-poche/`
///
/// Creates the directory if it doesn't exist.
///
/// # Errors
///
/// Returns an error if:
/// - Home directory cannot be determined
/// - Directory creation fails
pub fn app_home_dir() -> Result<PathBuf> {
    let app_dir = home_dir()?.join(APP_DIR);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("Failed to create app directory: {}", app_dir.display()))?;
    Ok(app_dir)
}

/// Returns the preferences file path: `~/.mrc-poche/settings.json`
pub fn settings_path() -> Result<PathBuf> {
    Ok(app_home_dir()?.join("settings.json"))
}

/// Returns the usage counters file path: `~/.mrc-poche/usage.json`
pub fn usage_path() -> Result<PathBuf> {
    Ok(app_home_dir()?.join("usage.json"))
}

/// Returns the API credentials file path: `~/.mrc-poche/api_keys.json`
pub fn api_keys_path() -> Result<PathBuf> {
    Ok(app_home_dir()?.join("api_keys.json"))
}

/// Returns the app configuration file path: `~/.mrc-poche/config.yaml`
pub fn config_path() -> Result<PathBuf> {
    Ok(app_home_dir()?.join("config.yaml"))
}

/// Returns the debug log path: `~/.mrc-poche/logs/debug.log`
///
/// Creates the logs directory if it doesn't exist.
pub fn debug_log_path() -> Result<PathBuf> {
    let logs = app_home_dir()?.join("logs");
    fs::create_dir_all(&logs)
        .with_context(|| format!("Failed to create logs directory: {}", logs.display()))?;
    Ok(logs.join("debug.log"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_app_home_dir_created_under_override() {
        let temp = TempDir::new().unwrap();
        let _guard = set_home_for_test(temp.path().to_path_buf());

        let dir = app_home_dir().unwrap();
        assert!(dir.ends_with(".mrc-poche"));
        assert!(dir.exists());
        assert!(dir.starts_with(temp.path()));
    }

    #[test]
    #[serial]
    fn test_storage_paths_share_home() {
        let temp = TempDir::new().unwrap();
        let _guard = set_home_for_test(temp.path().to_path_buf());

        assert!(settings_path().unwrap().ends_with("settings.json"));
        assert!(usage_path().unwrap().ends_with("usage.json"));
        assert!(api_keys_path().unwrap().ends_with("api_keys.json"));
        assert!(config_path().unwrap().ends_with("config.yaml"));
    }

    #[test]
    #[serial]
    fn test_debug_log_path_creates_logs_dir() {
        let temp = TempDir::new().unwrap();
        let _guard = set_home_for_test(temp.path().to_path_buf());

        let path = debug_log_path().unwrap();
        assert!(path.parent().unwrap().exists());
        assert!(path.ends_with("logs/debug.log"));
    }

    #[test]
    #[serial]
    fn test_override_cleared_on_drop() {
        let temp = TempDir::new().unwrap();
        {
            let _guard = set_home_for_test(temp.path().to_path_buf());
            assert!(app_home_dir().unwrap().starts_with(temp.path()));
        }
        // After the guard drops, the override no longer applies.
        if let Ok(dir) = app_home_dir() {
            assert!(!dir.starts_with(temp.path()));
        }
    }
}
