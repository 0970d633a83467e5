//! User preferences persisted in `settings.json`.
//!
//! Each setting has an explicit default applied at read time; a missing or
//! mistyped stored value is indistinguishable from "never set". Resets are
//! ad hoc per feature (there is no generic clear-all), matching how the
//! product exposes them.

use crate::app_paths;
use crate::storage::LocalStore;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Storage keys for individual settings.
pub mod keys {
    pub const THEME: &str = "display.theme";
    pub const FONT_SIZE: &str = "display.font_size";
    pub const DENSITY: &str = "display.density";
    pub const CONNECTIVITY_BANNER_DISMISSED: &str = "banners.connectivity_dismissed";
    pub const COMPLETED_TOURS: &str = "tours.completed";
    pub const NAV_HISTORY: &str = "nav.history";
}

/// Maximum number of screens kept in the navigation history.
const NAV_HISTORY_LIMIT: usize = 20;

pub const DEFAULT_FONT_SIZE: u32 = 16;

/// Theme mode options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    /// Follow system preference
    #[default]
    System,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }
}

/// Layout density options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    #[default]
    Comfortable,
    Compact,
}

impl Density {
    pub fn as_str(&self) -> &'static str {
        match self {
            Density::Comfortable => "comfortable",
            Density::Compact => "compact",
        }
    }
}

/// Typed facade over the preferences store.
pub struct Preferences {
    store: LocalStore,
}

impl Preferences {
    /// Opens the preferences store at its default location under
    /// `~/.mrc-poche/`.
    pub fn open_default() -> Result<Self> {
        Ok(Self::open_at(&app_paths::settings_path()?))
    }

    pub fn open_at(path: &Path) -> Self {
        Self {
            store: LocalStore::open(path),
        }
    }

    pub fn theme(&self) -> Theme {
        self.store.get_or(keys::THEME, Theme::default())
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.store.set(keys::THEME, &theme);
    }

    pub fn font_size(&self) -> u32 {
        self.store.get_or(keys::FONT_SIZE, DEFAULT_FONT_SIZE)
    }

    pub fn set_font_size(&mut self, size: u32) {
        self.store.set(keys::FONT_SIZE, &size);
    }

    pub fn density(&self) -> Density {
        self.store.get_or(keys::DENSITY, Density::default())
    }

    pub fn set_density(&mut self, density: Density) {
        self.store.set(keys::DENSITY, &density);
    }

    pub fn connectivity_banner_dismissed(&self) -> bool {
        self.store.get_or(keys::CONNECTIVITY_BANNER_DISMISSED, false)
    }

    pub fn dismiss_connectivity_banner(&mut self) {
        self.store.set(keys::CONNECTIVITY_BANNER_DISMISSED, &true);
    }

    /// Guided tours the user has finished, in completion order.
    pub fn completed_tours(&self) -> Vec<String> {
        self.store.get_or(keys::COMPLETED_TOURS, Vec::new())
    }

    pub fn is_tour_completed(&self, tour_id: &str) -> bool {
        self.completed_tours().iter().any(|t| t == tour_id)
    }

    pub fn mark_tour_completed(&mut self, tour_id: &str) {
        let mut tours = self.completed_tours();
        if !tours.iter().any(|t| t == tour_id) {
            tours.push(tour_id.to_string());
            self.store.set(keys::COMPLETED_TOURS, &tours);
        }
    }

    /// Forgets all completed tours so they replay on next visit.
    pub fn reset_tours(&mut self) {
        self.store.remove(keys::COMPLETED_TOURS);
    }

    /// Most-recently-visited screens, newest first, capped at
    /// [`NAV_HISTORY_LIMIT`].
    pub fn navigation_history(&self) -> Vec<String> {
        self.store.get_or(keys::NAV_HISTORY, Vec::new())
    }

    pub fn push_screen(&mut self, screen: &str) {
        let mut history = self.navigation_history();
        history.retain(|s| s != screen);
        history.insert(0, screen.to_string());
        history.truncate(NAV_HISTORY_LIMIT);
        self.store.set(keys::NAV_HISTORY, &history);
    }

    /// Raw read used by the `prefs get` CLI command.
    pub fn raw(&self, key: &str) -> Option<serde_json::Value> {
        self.store.get(key)
    }

    /// Raw write used by the `prefs set` CLI command.
    pub fn set_raw(&mut self, key: &str, value: &serde_json::Value) {
        self.store.set(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn prefs_in(temp: &TempDir) -> Preferences {
        Preferences::open_at(&temp.path().join("settings.json"))
    }

    #[test]
    fn test_defaults_when_unset() {
        let temp = TempDir::new().unwrap();
        let prefs = prefs_in(&temp);

        assert_eq!(prefs.theme(), Theme::System);
        assert_eq!(prefs.font_size(), DEFAULT_FONT_SIZE);
        assert_eq!(prefs.density(), Density::Comfortable);
        assert!(!prefs.connectivity_banner_dismissed());
        assert!(prefs.completed_tours().is_empty());
        assert!(prefs.navigation_history().is_empty());
    }

    #[test]
    fn test_theme_roundtrip() {
        let temp = TempDir::new().unwrap();
        let mut prefs = prefs_in(&temp);

        prefs.set_theme(Theme::Dark);
        assert_eq!(prefs.theme(), Theme::Dark);

        // Stored as a plain lowercase string, like the web app did.
        assert_eq!(
            prefs.raw(keys::THEME),
            Some(serde_json::Value::String("dark".to_string()))
        );
    }

    #[test]
    fn test_mistyped_value_falls_back_to_default() {
        let temp = TempDir::new().unwrap();
        let mut prefs = prefs_in(&temp);

        prefs.set_raw(keys::FONT_SIZE, &serde_json::json!("seize"));
        assert_eq!(prefs.font_size(), DEFAULT_FONT_SIZE);

        prefs.set_raw(keys::THEME, &serde_json::json!(42));
        assert_eq!(prefs.theme(), Theme::System);
    }

    #[test]
    fn test_tours_complete_and_reset() {
        let temp = TempDir::new().unwrap();
        let mut prefs = prefs_in(&temp);

        prefs.mark_tour_completed("onboarding");
        prefs.mark_tour_completed("quiz");
        prefs.mark_tour_completed("onboarding"); // no duplicate

        assert_eq!(prefs.completed_tours(), vec!["onboarding", "quiz"]);
        assert!(prefs.is_tour_completed("quiz"));

        prefs.reset_tours();
        assert!(prefs.completed_tours().is_empty());
    }

    #[test]
    fn test_nav_history_dedup_and_cap() {
        let temp = TempDir::new().unwrap();
        let mut prefs = prefs_in(&temp);

        for i in 0..25 {
            prefs.push_screen(&format!("screen-{}", i));
        }
        prefs.push_screen("screen-24"); // re-visit moves to front, no growth

        let history = prefs.navigation_history();
        assert_eq!(history.len(), 20);
        assert_eq!(history.first().map(String::as_str), Some("screen-24"));
    }

    #[test]
    fn test_banner_dismissal_persists() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.json");

        let mut prefs = Preferences::open_at(&path);
        prefs.dismiss_connectivity_banner();
        drop(prefs);

        let reopened = Preferences::open_at(&path);
        assert!(reopened.connectivity_banner_dismissed());
    }
}
