//! User-supplied API credentials for third-party integrations.
//!
//! Keys live in `api_keys.json` as a provider→secret mapping, the same
//! plain-JSON blob the product has always used. A missing key means the
//! corresponding feature is unavailable; no format or liveness validation
//! happens here — validity is discovered when the external call fails.
//! Consumers check [`ApiKeyStore::has`] before attempting a live call so a
//! missing key surfaces as a configuration prompt, not a doomed round trip.

use crate::app_paths;
use crate::storage::LocalStore;
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;

/// External integrations that take a user-supplied key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Provider {
    /// AI completion API behind the assistant.
    Perplexity,
    /// Payment checkout provider.
    Stripe,
    /// Video metadata lookup for the analysis feature.
    Youtube,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Perplexity, Provider::Stripe, Provider::Youtube];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Perplexity => "perplexity",
            Provider::Stripe => "stripe",
            Provider::Youtube => "youtube",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "perplexity" => Some(Provider::Perplexity),
            "stripe" => Some(Provider::Stripe),
            "youtube" => Some(Provider::Youtube),
            _ => None,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Credential store backed by `api_keys.json`.
pub struct ApiKeyStore {
    store: LocalStore,
}

impl ApiKeyStore {
    /// Opens the credential store at its default location under
    /// `~/.mrc-poche/`.
    pub fn open_default() -> Result<Self> {
        Ok(Self::open_at(&app_paths::api_keys_path()?))
    }

    pub fn open_at(path: &Path) -> Self {
        Self {
            store: LocalStore::open(path),
        }
    }

    /// All configured credentials. Fails soft to an empty mapping when the
    /// underlying file is missing or corrupt.
    pub fn load_all(&self) -> BTreeMap<Provider, String> {
        Provider::ALL
            .iter()
            .filter_map(|p| self.get(*p).map(|key| (*p, key)))
            .collect()
    }

    pub fn get(&self, provider: Provider) -> Option<String> {
        self.store
            .get::<String>(provider.as_str())
            .filter(|key| !key.is_empty())
    }

    pub fn has(&self, provider: Provider) -> bool {
        self.get(provider).is_some()
    }

    pub fn save(&mut self, provider: Provider, key: &str) {
        self.store.set(provider.as_str(), &key);
    }

    pub fn forget(&mut self, provider: Provider) {
        self.store.remove(provider.as_str());
    }
}

/// Masks a secret for display: first and last four characters with the
/// middle elided.
pub fn masked(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars.iter().take(4).collect();
    let tail: String = chars.iter().rev().take(4).rev().collect();
    format!("{}****{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn keys_in(temp: &TempDir) -> ApiKeyStore {
        ApiKeyStore::open_at(&temp.path().join("api_keys.json"))
    }

    #[test]
    fn test_has_false_then_true_after_save() {
        let temp = TempDir::new().unwrap();
        let mut keys = keys_in(&temp);

        assert!(!keys.has(Provider::Perplexity));
        keys.save(Provider::Perplexity, "pplx-0123456789abcdef");
        assert!(keys.has(Provider::Perplexity));
        assert!(!keys.has(Provider::Stripe));
    }

    #[test]
    fn test_load_all_fails_soft_on_corrupt_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("api_keys.json");
        std::fs::write(&path, "garbage").unwrap();

        let keys = ApiKeyStore::open_at(&path);
        assert!(keys.load_all().is_empty());
    }

    #[test]
    fn test_load_all_returns_saved_keys() {
        let temp = TempDir::new().unwrap();
        let mut keys = keys_in(&temp);

        keys.save(Provider::Stripe, "sk_test_abcdef012345");
        keys.save(Provider::Youtube, "AIzaSy-example-key");

        let all = keys.load_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all.get(&Provider::Stripe).map(String::as_str), Some("sk_test_abcdef012345"));
    }

    #[test]
    fn test_empty_key_counts_as_absent() {
        let temp = TempDir::new().unwrap();
        let mut keys = keys_in(&temp);

        keys.save(Provider::Youtube, "");
        assert!(!keys.has(Provider::Youtube));
    }

    #[test]
    fn test_forget() {
        let temp = TempDir::new().unwrap();
        let mut keys = keys_in(&temp);

        keys.save(Provider::Perplexity, "pplx-0123456789abcdef");
        keys.forget(Provider::Perplexity);
        assert!(!keys.has(Provider::Perplexity));
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!(Provider::parse("Perplexity"), Some(Provider::Perplexity));
        assert_eq!(Provider::parse("STRIPE"), Some(Provider::Stripe));
        assert_eq!(Provider::parse("vimeo"), None);
    }

    #[test]
    fn test_masked() {
        assert_eq!(masked("sk_test_abcdef012345"), "sk_t****2345");
        assert_eq!(masked("short"), "****");
    }
}
