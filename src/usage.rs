//! Monthly usage accounting for rate-limited features.
//!
//! Each feature accumulates a count over a calendar-month window; the count
//! resets to zero the first time it is touched after the month rolls over.
//! The ledger is advisory accounting for display purposes, not an
//! enforcement gate: `record_use` never blocks the action that triggered it,
//! and callers that want gating check `get_remaining() > 0` before acting.
//! There is no authoritative server-side counter behind this, so a hard
//! client-side gate would only pretend to enforce.

use crate::app_paths;
use crate::storage::LocalStore;
use anyhow::Result;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Feature identifiers with a monthly quota.
pub mod features {
    pub const PDF_EXPORT: &str = "pdf_export";
    pub const AI_QUESTIONS: &str = "ai_questions";
}

/// Compiled-in monthly quotas, overridable from the config file.
pub fn default_quotas() -> BTreeMap<String, u32> {
    BTreeMap::from([
        (features::PDF_EXPORT.to_string(), 3),
        (features::AI_QUESTIONS.to_string(), 20),
    ])
}

/// One feature's usage within the current quota period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub feature_id: String,
    pub count: u32,
    /// Start of the current period, RFC3339. A record whose period start
    /// falls in an earlier calendar month is stale and resets on next touch.
    pub period_start: String,
}

impl UsageRecord {
    fn fresh(feature_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            feature_id: feature_id.to_string(),
            count: 0,
            period_start: now.to_rfc3339(),
        }
    }

    /// True if `now` is still inside this record's calendar month.
    fn in_current_period(&self, now: DateTime<Utc>) -> bool {
        match DateTime::parse_from_rfc3339(&self.period_start) {
            Ok(start) => {
                let start = start.with_timezone(&Utc);
                start.year() == now.year() && start.month() == now.month()
            }
            // Unparseable period start counts as stale.
            Err(_) => false,
        }
    }
}

/// Per-feature monthly usage ledger backed by `usage.json`.
pub struct UsageLedger {
    store: LocalStore,
    quotas: BTreeMap<String, u32>,
}

impl UsageLedger {
    /// Opens the ledger at its default location under `~/.mrc-poche/`.
    pub fn open_default(quotas: BTreeMap<String, u32>) -> Result<Self> {
        Ok(Self::open_at(&app_paths::usage_path()?, quotas))
    }

    pub fn open_at(path: &Path, quotas: BTreeMap<String, u32>) -> Self {
        Self {
            store: LocalStore::open(path),
            quotas,
        }
    }

    /// Monthly quota for `feature`. Features without a configured quota
    /// report zero, so unknown features read as exhausted rather than
    /// unlimited.
    pub fn quota(&self, feature: &str) -> u32 {
        self.quotas.get(feature).copied().unwrap_or(0)
    }

    /// Features this ledger tracks, in stable order.
    pub fn tracked_features(&self) -> impl Iterator<Item = &str> {
        self.quotas.keys().map(String::as_str)
    }

    /// Remaining uses of `feature` in the current calendar month.
    pub fn get_remaining(&mut self, feature: &str) -> u32 {
        self.get_remaining_at(feature, Utc::now())
    }

    /// Records one use of `feature` and returns the new remaining count.
    ///
    /// Saturates at zero: recording past the quota keeps counting uses but
    /// never reports a negative remainder.
    pub fn record_use(&mut self, feature: &str) -> u32 {
        self.record_use_at(feature, Utc::now())
    }

    /// Clock-injected variant of [`get_remaining`](Self::get_remaining).
    pub fn get_remaining_at(&mut self, feature: &str, now: DateTime<Utc>) -> u32 {
        let record = self.current_record(feature, now);
        self.quota(feature).saturating_sub(record.count)
    }

    /// Clock-injected variant of [`record_use`](Self::record_use).
    pub fn record_use_at(&mut self, feature: &str, now: DateTime<Utc>) -> u32 {
        let mut record = self.current_record(feature, now);
        record.count = record.count.saturating_add(1);
        self.store.set(feature, &record);
        self.quota(feature).saturating_sub(record.count)
    }

    /// Loads the record for `feature`, resetting it first if the calendar
    /// month rolled over since `period_start`. The reset is persisted so a
    /// plain read also repairs a stale record.
    fn current_record(&mut self, feature: &str, now: DateTime<Utc>) -> UsageRecord {
        let record = self
            .store
            .get::<UsageRecord>(feature)
            .filter(|r| r.in_current_period(now));

        match record {
            Some(record) => record,
            None => {
                let fresh = UsageRecord::fresh(feature, now);
                self.store.set(feature, &fresh);
                fresh
            }
        }
    }
}

#[cfg(test)]
#[path = "usage_tests.rs"]
mod tests;
