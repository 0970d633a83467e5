//! Tests for the monthly usage ledger.

use super::*;
use chrono::TimeZone;
use proptest::prelude::*;
use tempfile::TempDir;

fn ledger_in(temp: &TempDir) -> UsageLedger {
    UsageLedger::open_at(&temp.path().join("usage.json"), default_quotas())
}

fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

#[test]
fn test_full_quota_when_never_used() {
    let temp = TempDir::new().unwrap();
    let mut ledger = ledger_in(&temp);

    assert_eq!(ledger.get_remaining_at(features::PDF_EXPORT, at(2025, 3, 10)), 3);
    assert_eq!(ledger.get_remaining_at(features::AI_QUESTIONS, at(2025, 3, 10)), 20);
}

#[test]
fn test_record_use_decrements_remaining() {
    let temp = TempDir::new().unwrap();
    let mut ledger = ledger_in(&temp);
    let now = at(2025, 3, 10);

    assert_eq!(ledger.record_use_at(features::PDF_EXPORT, now), 2);
    assert_eq!(ledger.record_use_at(features::PDF_EXPORT, now), 1);
    assert_eq!(ledger.get_remaining_at(features::PDF_EXPORT, now), 1);
}

#[test]
fn test_pdf_export_scenario() {
    // Quota 3, use all, keep recording, roll into next month.
    let temp = TempDir::new().unwrap();
    let mut ledger = ledger_in(&temp);
    let march = at(2025, 3, 28);

    for _ in 0..3 {
        ledger.record_use_at(features::PDF_EXPORT, march);
    }
    assert_eq!(ledger.get_remaining_at(features::PDF_EXPORT, march), 0);

    // A fourth use is still recorded but remaining never goes negative.
    assert_eq!(ledger.record_use_at(features::PDF_EXPORT, march), 0);

    let april = at(2025, 4, 1);
    assert_eq!(ledger.get_remaining_at(features::PDF_EXPORT, april), 3);
}

#[test]
fn test_rollover_applies_across_year_boundary() {
    let temp = TempDir::new().unwrap();
    let mut ledger = ledger_in(&temp);

    ledger.record_use_at(features::PDF_EXPORT, at(2024, 12, 31));
    assert_eq!(ledger.get_remaining_at(features::PDF_EXPORT, at(2025, 1, 1)), 3);
}

#[test]
fn test_same_month_does_not_reset() {
    let temp = TempDir::new().unwrap();
    let mut ledger = ledger_in(&temp);

    ledger.record_use_at(features::PDF_EXPORT, at(2025, 3, 1));
    assert_eq!(ledger.get_remaining_at(features::PDF_EXPORT, at(2025, 3, 31)), 2);
}

#[test]
fn test_rollover_reset_is_persisted() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("usage.json");

    let mut ledger = UsageLedger::open_at(&path, default_quotas());
    ledger.record_use_at(features::PDF_EXPORT, at(2025, 3, 10));
    drop(ledger);

    // A plain read in April repairs the stale record on disk.
    let mut ledger = UsageLedger::open_at(&path, default_quotas());
    assert_eq!(ledger.get_remaining_at(features::PDF_EXPORT, at(2025, 4, 2)), 3);
    drop(ledger);

    let mut ledger = UsageLedger::open_at(&path, default_quotas());
    assert_eq!(ledger.record_use_at(features::PDF_EXPORT, at(2025, 4, 2)), 2);
}

#[test]
fn test_corrupt_period_start_resets() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("usage.json");
    std::fs::write(
        &path,
        r#"{"pdf_export":{"feature_id":"pdf_export","count":2,"period_start":"pas une date"}}"#,
    )
    .unwrap();

    let mut ledger = UsageLedger::open_at(&path, default_quotas());
    assert_eq!(ledger.get_remaining_at(features::PDF_EXPORT, at(2025, 3, 10)), 3);
}

#[test]
fn test_unknown_feature_reads_as_exhausted() {
    let temp = TempDir::new().unwrap();
    let mut ledger = ledger_in(&temp);

    assert_eq!(ledger.get_remaining_at("video_analysis", at(2025, 3, 10)), 0);
    assert_eq!(ledger.record_use_at("video_analysis", at(2025, 3, 10)), 0);
}

#[test]
fn test_tracked_features_order() {
    let temp = TempDir::new().unwrap();
    let ledger = ledger_in(&temp);
    let tracked: Vec<&str> = ledger.tracked_features().collect();
    assert_eq!(tracked, vec![features::AI_QUESTIONS, features::PDF_EXPORT]);
}

proptest! {
    // Remaining never underflows no matter how many uses are recorded.
    #[test]
    fn prop_remaining_never_negative(uses in 0usize..40) {
        let temp = TempDir::new().unwrap();
        let mut ledger = ledger_in(&temp);
        let now = at(2025, 6, 15);

        let mut last = ledger.get_remaining_at(features::PDF_EXPORT, now);
        for _ in 0..uses {
            let remaining = ledger.record_use_at(features::PDF_EXPORT, now);
            prop_assert!(remaining <= last);
            last = remaining;
        }
        prop_assert_eq!(last, 3u32.saturating_sub(uses as u32));
    }

    // A month rollover always restores the full quota, whatever came before.
    #[test]
    fn prop_rollover_restores_quota(uses in 0usize..10, month in 1u32..12) {
        let temp = TempDir::new().unwrap();
        let mut ledger = ledger_in(&temp);
        let before = at(2025, month, 5);
        let after = at(2025, month + 1, 5);

        for _ in 0..uses {
            ledger.record_use_at(features::PDF_EXPORT, before);
        }
        prop_assert_eq!(ledger.get_remaining_at(features::PDF_EXPORT, after), 3);
    }
}
