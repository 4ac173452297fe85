//! Scan history deletion against the SQLite record store.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use common::harness::PATIENT_ID;
use common::*;
use dermascan::records::ScanRecord;
use dermascan::workflow::{ConfirmRequest, DeleteOutcome, ScanError, ScanRequest};

fn record(n: u64) -> ScanRecord {
    ScanRecord {
        image_url: format!("https://store/Uploads/{}_scan.jpg", n),
        file_name: format!("scan-{}.jpg", n),
        file_size_bytes: 100_000 * n,
        predicted_label: "Nevus".to_string(),
        clinical_note: String::new(),
        created_at: Utc.timestamp_opt(1_700_000_000 + n as i64, 0).unwrap(),
    }
}

async fn seeded(count: u64) -> (TestHarness, Vec<ScanRecord>) {
    let h = TestHarness::with_patient().await;
    let scans: Vec<ScanRecord> = (1..=count).map(record).collect();
    h.seed_scans(PATIENT_ID, &scans).await;
    (h, scans)
}

#[tokio::test]
async fn test_delete_one_removes_exactly_the_target() {
    let (h, scans) = seeded(4).await;
    let mut history = h.history(PATIENT_ID).await;
    let confirm = ScriptedConfirm::yes();

    let outcome = history.delete_one(1, &confirm).await.unwrap();

    assert_eq!(outcome, DeleteOutcome::Deleted { remaining: 3 });
    let expected = vec![scans[0].clone(), scans[2].clone(), scans[3].clone()];
    assert_eq!(history.scans(), expected.as_slice());
    assert_eq!(h.patient(PATIENT_ID).await.scans, expected);
    assert_eq!(
        confirm.asked(),
        vec![ConfirmRequest::DeleteOne {
            index: 1,
            record: scans[1].clone()
        }]
    );
}

#[tokio::test]
async fn test_delete_one_keeps_scans_added_after_load() {
    let (h, scans) = seeded(3).await;
    let mut history = h.history(PATIENT_ID).await;

    // Another writer appends while the view is open.
    let service = h.service(
        Arc::new(ScriptedClassifier::label("Melanoma")),
        Arc::new(FakeObjectStore::new()),
    );
    let added = service
        .run(
            ScanRequest::new(PATIENT_ID, source_file("new.jpg", 10)),
            &CollectingReporter::new(),
        )
        .await
        .unwrap()
        .record;

    history
        .delete_one(0, &ScriptedConfirm::yes())
        .await
        .unwrap();

    let stored = h.patient(PATIENT_ID).await.scans;
    assert_eq!(stored, vec![scans[1].clone(), scans[2].clone(), added]);
    assert_eq!(history.scans(), stored.as_slice());
}

#[tokio::test]
async fn test_delete_one_of_already_removed_scan() {
    let (h, scans) = seeded(2).await;
    let mut history = h.history(PATIENT_ID).await;
    h.seed_scans(PATIENT_ID, &scans[1..]).await;

    let outcome = history
        .delete_one(0, &ScriptedConfirm::yes())
        .await
        .unwrap();

    assert_eq!(outcome, DeleteOutcome::NothingToDelete);
    assert_eq!(history.scans(), &scans[1..]);
}

#[tokio::test]
async fn test_delete_one_out_of_range() {
    let (h, _) = seeded(2).await;
    let mut history = h.history(PATIENT_ID).await;
    let confirm = ScriptedConfirm::yes();

    let result = history.delete_one(2, &confirm).await;

    assert!(matches!(result, Err(ScanError::Validation(_))));
    assert!(confirm.asked().is_empty());
    assert_eq!(h.patient(PATIENT_ID).await.scans.len(), 2);
}

#[tokio::test]
async fn test_cancelled_delete_changes_nothing() {
    let (h, scans) = seeded(3).await;
    let mut history = h.history(PATIENT_ID).await;

    assert_eq!(
        history.delete_one(0, &ScriptedConfirm::no()).await.unwrap(),
        DeleteOutcome::Cancelled
    );
    assert_eq!(
        history.delete_all(&ScriptedConfirm::no()).await.unwrap(),
        DeleteOutcome::Cancelled
    );

    assert_eq!(history.scans(), scans.as_slice());
    assert_eq!(h.patient(PATIENT_ID).await.scans, scans);
}

#[tokio::test]
async fn test_failed_write_leaves_view_untouched() {
    let (h, scans) = seeded(3).await;
    let mut history = h.history(PATIENT_ID).await;
    h.records.fail_replace.store(true, Ordering::SeqCst);

    let one = history.delete_one(1, &ScriptedConfirm::yes()).await;
    let all = history.delete_all(&ScriptedConfirm::yes()).await;

    assert!(matches!(one, Err(ScanError::Delete(_))));
    assert!(matches!(all, Err(ScanError::Delete(_))));
    assert_eq!(history.scans(), scans.as_slice());

    h.records.fail_replace.store(false, Ordering::SeqCst);
    assert_eq!(h.patient(PATIENT_ID).await.scans, scans);
}

#[tokio::test]
async fn test_delete_all_empties_history() {
    let (h, _) = seeded(3).await;
    let mut history = h.history(PATIENT_ID).await;
    let confirm = ScriptedConfirm::yes();

    let outcome = history.delete_all(&confirm).await.unwrap();

    assert_eq!(outcome, DeleteOutcome::Deleted { remaining: 0 });
    assert!(history.scans().is_empty());
    assert!(h.patient(PATIENT_ID).await.scans.is_empty());
    assert_eq!(confirm.asked(), vec![ConfirmRequest::DeleteAll { count: 3 }]);

    // Nothing left, so no second confirmation.
    assert_eq!(
        history.delete_all(&confirm).await.unwrap(),
        DeleteOutcome::NothingToDelete
    );
    assert_eq!(confirm.asked().len(), 1);
}

#[tokio::test]
async fn test_total_size_label() {
    let h = TestHarness::with_patient().await;
    let mut history = h.history(PATIENT_ID).await;
    assert_eq!(history.total_size_label(), "0 MB");

    // 100_000 + 200_000 + 300_000 bytes
    h.seed_scans(PATIENT_ID, &[record(1), record(2), record(3)])
        .await;
    history.refresh().await.unwrap();
    assert_eq!(history.total_size_label(), "585.94 KB");

    h.seed_scans(PATIENT_ID, &[record(20)]).await;
    history.refresh().await.unwrap();
    assert_eq!(history.total_size_label(), "1.91 MB");
}
