//! レビューの一連の流れ（抽出 → 編集 → 確定 → 書き出し）
//!
//! バックエンドはメモリ上のモックで代用する

use futures::executor::block_on;
use receipt_review::review::{available_actions, write_queue_report, ReviewAction};
use receipt_review_common::error::{Error, Result};
use receipt_review_common::queue::FileOutcome;
use receipt_review_common::types::{BatchExtraction, ExtractionResult, FieldName, ReceiptPayload};
use receipt_review_common::{ConfirmOutcome, NewFile, NotificationKind, ReceiptApi, ReviewStore};
use receipt_review_common::workflow;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::PathBuf;
use tempfile::tempdir;

struct MemoryBackend {
    saved: RefCell<HashSet<String>>,
}

impl MemoryBackend {
    fn new(existing: &[&str]) -> Self {
        Self {
            saved: RefCell::new(existing.iter().map(|s| s.to_string()).collect()),
        }
    }
}

/// ファイル名 "T123.jpg" → 取引番号 "T123"。"broken" を含む名前は失敗
fn extraction_for(path: &PathBuf) -> Result<ExtractionResult> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    if stem.contains("broken") {
        return Err(Error::from_response(422, Some(serde_json::json!({"message": "unreadable image"}))));
    }
    let mut result = ExtractionResult {
        overall_confidence: 0.95,
        ..Default::default()
    };
    result.data.set_value(FieldName::TransactionId, stem);
    result.data.set_value(FieldName::Amount, "250.00");
    Ok(result)
}

impl ReceiptApi for MemoryBackend {
    type Upload = PathBuf;

    async fn extract_single(&self, upload: &PathBuf) -> Result<ExtractionResult> {
        extraction_for(upload)
    }

    async fn extract_batch(&self, _uploads: &[PathBuf]) -> Result<BatchExtraction> {
        Err(Error::Network("batch disabled".into()))
    }

    async fn check_duplicate(&self, transaction_id: &str) -> Result<bool> {
        Ok(self.saved.borrow().contains(transaction_id))
    }

    async fn save_receipt(&self, payload: &ReceiptPayload) -> Result<Value> {
        self.saved.borrow_mut().insert(payload.transaction_id.clone());
        Ok(serde_json::json!({"id": payload.transaction_id}))
    }
}

fn files(names: &[&str]) -> Vec<NewFile<PathBuf>> {
    names
        .iter()
        .map(|n| NewFile {
            name: n.to_string(),
            upload: PathBuf::from(n),
            image_url: n.to_string(),
        })
        .collect()
}

#[test]
fn test_full_review_session() {
    let backend = MemoryBackend::new(&["T2"]);
    let store = RefCell::new(ReviewStore::new());

    let summary = block_on(workflow::process_intake(
        &store,
        &backend,
        files(&["T1.jpg", "T2.jpg", "broken.jpg"]),
    ))
    .expect("store is attached");
    assert_eq!(summary.total, 3);
    assert_eq!(summary.duplicates, 1);
    assert_eq!(summary.failed, 1);

    // 重複と失敗は確定できない
    {
        let s = store.borrow();
        assert!(s.notifications.count_of(NotificationKind::Warning) >= 1);
        let t2 = s.queue.items().iter().position(|i| i.name == "T2.jpg").unwrap();
        assert!(!s.queue.can_confirm(t2, false));
        let broken = s.queue.items().iter().position(|i| i.name == "broken.jpg").unwrap();
        assert_eq!(s.queue.items()[broken].error.as_deref(), Some("unreadable image"));
    }

    // T1 を確定
    store.borrow_mut().select(0);
    assert_eq!(available_actions(&store.borrow())[0], ReviewAction::Confirm);
    let outcome = block_on(workflow::confirm_current(&store, &backend));
    assert!(matches!(outcome, ConfirmOutcome::Saved { advance_to: Some(_) }));
    assert!(backend.saved.borrow().contains("T1"));

    // 保存済み項目の編集は無視される
    let edit = block_on(workflow::edit_field(&store, &backend, FieldName::Amount, "1"));
    assert_eq!(edit, Some(receipt_review_common::EditOutcome::Ignored));

    // 失敗した項目を削除
    let broken = store
        .borrow()
        .queue
        .items()
        .iter()
        .position(|i| i.name == "broken.jpg")
        .unwrap();
    assert_eq!(store.borrow_mut().remove(broken), Some("broken.jpg".to_string()));
    assert_eq!(store.borrow().queue.len(), 2);

    for item in store.borrow().queue.items() {
        assert!(!(item.saved && item.is_duplicate));
    }

    // 書き出し
    let dir = tempdir().expect("Failed to create temp dir");
    let output = dir.path().join("queue.json");
    write_queue_report(&store.borrow(), &output).unwrap();

    let report: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(report["total"], 2);
    assert_eq!(report["saved"], 1);
    assert_eq!(report["items"][0]["name"], "T1.jpg");
    assert_eq!(report["items"][0]["saved"], true);
    assert_eq!(report["items"][1]["is_duplicate"], true);
    assert!(report["items"][0].get("upload").is_none());
}

#[test]
fn test_batch_failure_marks_every_file() {
    let backend = MemoryBackend::new(&[]);
    let store = RefCell::new(ReviewStore::new());

    let summary = block_on(workflow::process_intake_batch(&store, &backend, files(&["a.jpg", "b.jpg"])))
        .expect("store is attached");
    assert_eq!(summary.failed, 2);

    let s = store.borrow();
    assert!(s.queue.items().iter().all(|i| i.processed && i.error.is_some()));
    assert!(!s.processing());
    assert_eq!(s.notifications.count_of(NotificationKind::Error), 1);
}

/// 結果の到着順が違っても同じ状態になる
#[test]
fn test_merge_order_independent() {
    let outcomes: Vec<(&str, FileOutcome)> = ["T1.jpg", "T2.jpg", "T3.jpg"]
        .iter()
        .map(|n| {
            let result = extraction_for(&PathBuf::from(n)).unwrap();
            (*n, FileOutcome::Extracted { result, is_duplicate: false })
        })
        .collect();

    let run = |order: &[usize]| {
        let mut store: ReviewStore<PathBuf> = ReviewStore::new();
        let mut intake = store.add_files(files(&["T1.jpg", "T2.jpg", "T3.jpg"]));
        for &i in order {
            let (name, outcome) = &outcomes[i];
            store.merge_outcome(&mut intake, name, outcome.clone());
        }
        store
            .queue
            .items()
            .iter()
            .map(|i| (i.name.clone(), i.transaction_id().map(str::to_string)))
            .collect::<Vec<_>>()
    };

    assert_eq!(run(&[0, 1, 2]), run(&[2, 0, 1]));
}
