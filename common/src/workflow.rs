//! 処理・確定のワークフロー
//!
//! 1ファイルずつバックグラウンドで抽出する（一括処理はCLIのオプション）。
//! - ファイル受付 → 各ファイルの抽出を並行実行 → 重複チェック → 到着順にマージ
//! - 全件完了後に集計通知を1回だけ出す
//!
//! 重複チェックの失敗は「重複なし」とみなす（フェイルオープン）。

use crate::error::Result;
use crate::queue::{EditOutcome, FileOutcome};
use crate::store::{ConfirmOutcome, NewFile, ProcessingSummary, StoreHandle};
use crate::types::{BatchExtraction, ExtractionResult, FieldName, ReceiptPayload};
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;

/// レビューに必要なバックエンド操作
#[allow(async_fn_in_trait)]
pub trait ReceiptApi {
    /// アップロードの実体
    type Upload;

    async fn extract_single(&self, upload: &Self::Upload) -> Result<ExtractionResult>;

    async fn extract_batch(&self, uploads: &[Self::Upload]) -> Result<BatchExtraction>;

    /// 取引番号が保存済みか
    async fn check_duplicate(&self, transaction_id: &str) -> Result<bool>;

    async fn save_receipt(&self, payload: &ReceiptPayload) -> Result<Value>;
}

/// 重複チェック（失敗時は重複なし）
pub async fn is_duplicate_fail_open<A: ReceiptApi>(api: &A, transaction_id: &str) -> bool {
    match api.check_duplicate(transaction_id).await {
        Ok(exists) => exists,
        Err(e) => {
            tracing::warn!(transaction_id, error = %e, "duplicate check failed, treating as new");
            false
        }
    }
}

/// 抽出結果に重複チェックを付けて処理結果にする
pub async fn outcome_for<A: ReceiptApi>(api: &A, result: ExtractionResult) -> FileOutcome {
    let is_duplicate = match result.data.transaction_id() {
        Some(id) => is_duplicate_fail_open(api, id).await,
        None => false,
    };
    FileOutcome::Extracted { result, is_duplicate }
}

/// 1ファイルを抽出して重複チェックまで行う
pub async fn extract_file<A: ReceiptApi>(api: &A, name: &str, upload: &A::Upload) -> FileOutcome {
    match api.extract_single(upload).await {
        Ok(result) => outcome_for(api, result).await,
        Err(e) => {
            tracing::warn!(file = name, error = %e, "extraction failed");
            FileOutcome::Failed {
                message: e.message(),
            }
        }
    }
}

/// ファイルを受け付けて、1件ずつ並行に処理する
///
/// 結果は届いた順にファイル名でマージする。
/// 画面が破棄された場合は `None`（以降の結果は捨てる）。
pub async fn process_intake<A, H>(
    handle: &H,
    api: &A,
    files: Vec<NewFile<A::Upload>>,
) -> Option<ProcessingSummary>
where
    A: ReceiptApi,
    A::Upload: Clone,
    H: StoreHandle<A::Upload>,
{
    let jobs: Vec<(String, A::Upload)> = files
        .iter()
        .map(|f| (f.name.clone(), f.upload.clone()))
        .collect();
    let mut intake = handle.update(|s| s.add_files(files))?;

    let mut pending: FuturesUnordered<_> = jobs
        .into_iter()
        .map(|(name, upload)| async move {
            let outcome = extract_file(api, &name, &upload).await;
            (name, outcome)
        })
        .collect();

    let mut summary = ProcessingSummary::default();

    while let Some((name, outcome)) = pending.next().await {
        summary.record(&outcome);
        handle.update(|s| s.merge_outcome(&mut intake, &name, outcome))?;
    }

    handle.update(|s| s.finish_processing(&intake, &summary))?;
    Some(summary)
}

/// 一括抽出で処理する
///
/// 応答の `filename` でマージし、リクエスト全体が失敗したら全件を失敗にする
pub async fn process_intake_batch<A, H>(
    handle: &H,
    api: &A,
    files: Vec<NewFile<A::Upload>>,
) -> Option<ProcessingSummary>
where
    A: ReceiptApi,
    A::Upload: Clone,
    H: StoreHandle<A::Upload>,
{
    let names: Vec<String> = files.iter().map(|f| f.name.clone()).collect();
    let uploads: Vec<A::Upload> = files.iter().map(|f| f.upload.clone()).collect();
    let mut intake = handle.update(|s| s.add_files(files))?;

    let outcomes: Vec<(String, FileOutcome)> = match api.extract_batch(&uploads).await {
        Ok(batch) => {
            let mut outcomes = Vec::with_capacity(batch.results.len());
            for item in batch.results {
                let outcome = match item.error {
                    Some(message) => FileOutcome::Failed { message },
                    None => outcome_for(api, item.result).await,
                };
                outcomes.push((item.filename, outcome));
            }
            outcomes
        }
        Err(e) => {
            tracing::warn!(files = names.len(), error = %e, "batch extraction failed");
            let message = e.message();
            names
                .into_iter()
                .map(|name| (name, FileOutcome::Failed { message: message.clone() }))
                .collect()
        }
    };

    let mut summary = ProcessingSummary::default();
    for (name, outcome) in outcomes {
        summary.record(&outcome);
        handle.update(|s| s.merge_outcome(&mut intake, &name, outcome))?;
    }

    handle.update(|s| s.finish_processing(&intake, &summary))?;
    Some(summary)
}

/// 表示中の項目のフィールドを編集する
///
/// 取引番号の変更時はバックエンドで重複を再確認する
pub async fn edit_field<A, H>(handle: &H, api: &A, field: FieldName, value: &str) -> Option<EditOutcome>
where
    A: ReceiptApi,
    H: StoreHandle<A::Upload>,
{
    let outcome = handle.update(|s| s.edit_current_field(field, value))?;

    if let EditOutcome::RecheckDuplicate {
        item_id,
        transaction_id,
    } = &outcome
    {
        let exists = is_duplicate_fail_open(api, transaction_id).await;
        handle.update(|s| s.apply_duplicate_recheck(*item_id, transaction_id, exists))?;
    }
    Some(outcome)
}

/// 表示中の項目を確定して保存する
pub async fn confirm_current<A, H>(handle: &H, api: &A) -> ConfirmOutcome
where
    A: ReceiptApi,
    H: StoreHandle<A::Upload>,
{
    let (item_id, payload) = match handle.update(|s| s.begin_confirm()) {
        None => return ConfirmOutcome::Detached,
        Some(Err(block)) => return ConfirmOutcome::Blocked(block),
        Some(Ok(prepared)) => prepared,
    };

    let result = api.save_receipt(&payload).await.map(|_| ()).map_err(|e| {
        tracing::warn!(file = %payload.filename, error = %e, "save failed");
        e.message()
    });

    handle
        .update(|s| s.finish_confirm(item_id, result))
        .unwrap_or(ConfirmOutcome::Detached)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::notify::NotificationKind;
    use crate::queue::ConfirmBlock;
    use crate::store::ReviewStore;
    use crate::types::{BatchItem, FieldValue};
    use futures::executor::block_on;
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};

    /// ファイル名をアップロードとして扱うモック
    #[derive(Default)]
    struct MockApi {
        extractions: HashMap<String, ExtractionResult>,
        existing: RefCell<HashSet<String>>,
        duplicate_check_fails: bool,
        save_fails: bool,
        saved: RefCell<Vec<ReceiptPayload>>,
    }

    impl MockApi {
        fn with_receipt(mut self, file: &str, tid: &str, needs_review: bool) -> Self {
            let mut result = ExtractionResult {
                overall_confidence: 0.88,
                needs_review,
                temp_id: Some(format!("tmp-{}", file)),
                ..Default::default()
            };
            result.data.transaction_id = Some(FieldValue {
                value: tid.to_string(),
                confidence: Some(0.7),
                needs_review,
            });
            result.data.set_value(FieldName::Amount, "100");
            self.extractions.insert(file.to_string(), result);
            self
        }

        fn with_existing(self, tid: &str) -> Self {
            self.existing.borrow_mut().insert(tid.to_string());
            self
        }
    }

    impl ReceiptApi for MockApi {
        type Upload = String;

        async fn extract_single(&self, upload: &String) -> Result<ExtractionResult> {
            self.extractions
                .get(upload)
                .cloned()
                .ok_or_else(|| Error::from_response(500, None))
        }

        async fn extract_batch(&self, uploads: &[String]) -> Result<BatchExtraction> {
            let results = uploads
                .iter()
                .map(|name| match self.extractions.get(name) {
                    Some(result) => BatchItem {
                        filename: name.clone(),
                        error: None,
                        result: result.clone(),
                    },
                    None => BatchItem {
                        filename: name.clone(),
                        error: Some("unreadable".into()),
                        result: ExtractionResult::default(),
                    },
                })
                .collect();
            Ok(BatchExtraction { results })
        }

        async fn check_duplicate(&self, transaction_id: &str) -> Result<bool> {
            if self.duplicate_check_fails {
                return Err(Error::Network("offline".into()));
            }
            Ok(self.existing.borrow().contains(transaction_id))
        }

        async fn save_receipt(&self, payload: &ReceiptPayload) -> Result<Value> {
            if self.save_fails {
                return Err(Error::from_response(409, Some(serde_json::json!({"detail": "conflict"}))));
            }
            self.existing.borrow_mut().insert(payload.transaction_id.clone());
            self.saved.borrow_mut().push(payload.clone());
            Ok(serde_json::json!({"status": "ok"}))
        }
    }

    fn files(names: &[&str]) -> Vec<NewFile<String>> {
        names
            .iter()
            .map(|n| NewFile {
                name: n.to_string(),
                upload: n.to_string(),
                image_url: format!("blob:{}", n),
            })
            .collect()
    }

    #[test]
    fn test_duplicate_upload_warns_once_and_blocks_confirm() {
        let api = MockApi::default()
            .with_receipt("a.jpg", "T-OLD", false)
            .with_receipt("b.jpg", "T-NEW", false)
            .with_existing("T-OLD");
        let store = RefCell::new(ReviewStore::new());

        let summary = block_on(process_intake(&store, &api, files(&["a.jpg", "b.jpg"]))).unwrap();
        assert_eq!(summary.duplicates, 1);

        let store = store.into_inner();
        let warnings: Vec<_> = store
            .notifications
            .items()
            .iter()
            .filter(|n| n.kind == NotificationKind::Warning)
            .collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("مكررة"));

        let dup_index = store.queue.items().iter().position(|i| i.name == "a.jpg").unwrap();
        assert!(store.queue.get(dup_index).unwrap().is_duplicate);
        assert_eq!(store.queue.confirm_block(dup_index, false), Some(ConfirmBlock::Duplicate));
        assert!(!store.processing());
    }

    #[test]
    fn test_failed_file_stays_in_queue() {
        let api = MockApi::default().with_receipt("ok.jpg", "T1", false);
        let store = RefCell::new(ReviewStore::new());

        let summary = block_on(process_intake(&store, &api, files(&["bad.jpg", "ok.jpg"]))).unwrap();
        assert_eq!(summary.failed, 1);

        let store = store.borrow();
        let bad = &store.queue.items()[0];
        assert!(bad.processed);
        assert_eq!(bad.error.as_deref(), Some("Request failed"));
        assert_eq!(store.queue.current().unwrap().name, "ok.jpg");
    }

    #[test]
    fn test_duplicate_check_failure_is_fail_open() {
        let api = MockApi {
            duplicate_check_fails: true,
            ..MockApi::default().with_receipt("a.jpg", "T1", false)
        };
        let store = RefCell::new(ReviewStore::new());

        block_on(process_intake(&store, &api, files(&["a.jpg"])));
        assert!(!store.borrow().queue.items()[0].is_duplicate);
    }

    #[test]
    fn test_editing_transaction_id_to_existing_flags_duplicate() {
        let api = MockApi::default()
            .with_receipt("a.jpg", "T1", false)
            .with_existing("T-SAVED");
        let store = RefCell::new(ReviewStore::new());
        block_on(process_intake(&store, &api, files(&["a.jpg"])));
        store.borrow_mut().clear_notifications();

        let outcome = block_on(edit_field(&store, &api, FieldName::TransactionId, "T-SAVED"));
        assert!(matches!(outcome, Some(EditOutcome::RecheckDuplicate { .. })));

        let store = store.borrow();
        assert!(store.queue.items()[0].is_duplicate);
        assert_eq!(store.notifications.count_of(NotificationKind::Warning), 1);
        assert!(api.saved.borrow().is_empty());
    }

    #[test]
    fn test_confirm_last_of_three_reports_total() {
        let api = MockApi::default()
            .with_receipt("1.jpg", "T1", false)
            .with_receipt("2.jpg", "T2", false)
            .with_receipt("3.jpg", "T3", false);
        let store = RefCell::new(ReviewStore::new());
        block_on(process_intake(&store, &api, files(&["1.jpg", "2.jpg", "3.jpg"])));

        for index in 0..3 {
            store.borrow_mut().select(index);
            let outcome = block_on(confirm_current(&store, &api));
            assert!(matches!(outcome, ConfirmOutcome::Saved { .. }));
        }

        let store = store.borrow();
        let last = store.notifications.last().unwrap();
        assert_eq!(last.kind, NotificationKind::Success);
        assert!(last.message.contains('3'));
        assert_eq!(api.saved.borrow().len(), 3);
        assert_eq!(api.saved.borrow()[0].temp_id.as_deref(), Some("tmp-1.jpg"));
        assert!(store.queue.items().iter().all(|i| !(i.saved && i.is_duplicate)));
    }

    #[test]
    fn test_confirm_failure_keeps_item_unsaved() {
        let api = MockApi {
            save_fails: true,
            ..MockApi::default().with_receipt("a.jpg", "T1", false)
        };
        let store = RefCell::new(ReviewStore::new());
        block_on(process_intake(&store, &api, files(&["a.jpg"])));

        let outcome = block_on(confirm_current(&store, &api));
        assert_eq!(outcome, ConfirmOutcome::Failed("conflict".into()));
        assert!(!store.borrow().queue.items()[0].saved);
        assert!(!store.borrow().saving());
    }

    /// 指定回目の更新の直前に「最初からやり直す」と新規追加を挟むハンドル
    struct RestartBefore {
        store: RefCell<ReviewStore<String>>,
        calls: std::cell::Cell<u32>,
        restart_at: u32,
    }

    impl StoreHandle<String> for RestartBefore {
        fn update<R>(&self, f: impl FnOnce(&mut ReviewStore<String>) -> R) -> Option<R> {
            let call = self.calls.get() + 1;
            self.calls.set(call);
            let mut store = self.store.borrow_mut();
            if call == self.restart_at {
                store.remove_all();
                store.add_files(files(&["b.jpg"]));
            }
            Some(f(&mut store))
        }
    }

    #[test]
    fn test_start_over_mid_intake_ignores_old_results() {
        let api = MockApi::default()
            .with_receipt("a.jpg", "T1", false)
            .with_receipt("b.jpg", "T2", false)
            .with_existing("T2");
        let handle = RestartBefore {
            store: RefCell::new(ReviewStore::new()),
            calls: std::cell::Cell::new(0),
            restart_at: 3,
        };

        block_on(process_intake(&handle, &api, files(&["a.jpg", "b.jpg"])));

        let store = handle.store.into_inner();
        assert_eq!(store.queue.len(), 1);
        let fresh = &store.queue.items()[0];
        assert!(!fresh.processed);
        assert!(!fresh.is_duplicate);
        assert!(store.processing());
        assert!(store.notifications.is_empty());
    }

    #[test]
    fn test_confirm_blocked_while_pending() {
        let api = MockApi::default();
        let store = RefCell::new(ReviewStore::<String>::new());
        store.borrow_mut().add_files(files(&["a.jpg"]));
        let outcome = block_on(confirm_current(&store, &api));
        assert_eq!(outcome, ConfirmOutcome::Blocked(ConfirmBlock::NotProcessed));
    }

    #[test]
    fn test_batch_mode_merges_by_filename() {
        let api = MockApi::default()
            .with_receipt("a.jpg", "T1", true)
            .with_existing("T9");
        let store = RefCell::new(ReviewStore::new());

        let summary = block_on(process_intake_batch(&store, &api, files(&["x.jpg", "a.jpg"]))).unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.needs_review, 1);
        assert_eq!(summary.failed, 1);

        let store = store.borrow();
        assert_eq!(store.queue.items()[0].error.as_deref(), Some("unreadable"));
        assert!(store.queue.items()[1].needs_review);
        assert_eq!(store.queue.current_index(), 1);
    }
}
