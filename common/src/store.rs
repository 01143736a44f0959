//! レビュー画面の状態（キュー・通知・処理中フラグ）
//!
//! 画面側はこの構造体を1つ保持し、ハンドラ経由で更新する。
//! 非同期処理との接続は `workflow` を参照。

use crate::notify::{messages, NotificationCenter, NotificationKind};
use crate::queue::{ConfirmBlock, EditOutcome, FileOutcome, ProcessingQueue};
use crate::types::{FieldName, ReceiptPayload};
use std::cell::RefCell;

/// キューへ追加するファイル
#[derive(Debug, Clone)]
pub struct NewFile<U> {
    pub name: String,
    pub upload: U,
    pub image_url: String,
}

/// 一連の処理結果の集計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessingSummary {
    pub total: usize,
    pub duplicates: usize,
    pub needs_review: usize,
    pub failed: usize,
}

impl ProcessingSummary {
    pub fn record(&mut self, outcome: &FileOutcome) {
        self.total += 1;
        if !outcome.is_success() {
            self.failed += 1;
        }
        if outcome.is_duplicate() {
            self.duplicates += 1;
        }
        if outcome.needs_review() {
            self.needs_review += 1;
        }
    }

    /// 集計通知: 重複 → 要確認 → 失敗 → (どれも無く2件以上なら) 全件成功
    pub fn notifications(&self) -> Vec<(NotificationKind, String)> {
        let mut out = Vec::new();
        if self.duplicates > 0 {
            out.push((NotificationKind::Warning, messages::duplicates_found(self.duplicates)));
        }
        if self.needs_review > 0 {
            out.push((NotificationKind::Info, messages::needs_review(self.needs_review)));
        }
        if self.failed > 0 {
            out.push((
                NotificationKind::Error,
                format!("{} ({})", messages::extraction_failed(), self.failed),
            ));
        }
        if self.duplicates == 0 && self.needs_review == 0 && self.failed == 0 && self.total > 1 {
            out.push((NotificationKind::Success, messages::all_processed(self.total)));
        }
        out
    }
}

/// 1回分の受付
///
/// 「最初からやり直す」の後に届いた古い受付の結果は捨てる
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intake {
    epoch: u64,
    /// 空のキューへの追加で全画面スピナーを出したか
    pub show_spinner: bool,
    first_merged: bool,
}

/// 確定処理の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Blocked(ConfirmBlock),
    /// 保存成功。`advance_to` は次に表示する項目のID
    Saved { advance_to: Option<u64> },
    Failed(String),
    /// 保存中に項目が削除された、または重複と判定された
    Stale,
    /// 画面が破棄された
    Detached,
}

/// レビュー画面の状態
#[derive(Debug, Clone)]
pub struct ReviewStore<U> {
    pub queue: ProcessingQueue<U>,
    pub notifications: NotificationCenter,
    processing: bool,
    saving: bool,
    epoch: u64,
}

impl<U> Default for ReviewStore<U> {
    fn default() -> Self {
        Self {
            queue: ProcessingQueue::new(),
            notifications: NotificationCenter::new(),
            processing: false,
            saving: false,
            epoch: 0,
        }
    }
}

impl<U> ReviewStore<U> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 全画面スピナー表示中か
    pub fn processing(&self) -> bool {
        self.processing
    }

    pub fn saving(&self) -> bool {
        self.saving
    }

    pub fn set_processing(&mut self, processing: bool) {
        self.processing = processing;
    }

    pub fn notify(&mut self, kind: NotificationKind, message: impl Into<String>) -> u64 {
        self.notifications.push(kind, message)
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        self.notifications.dismiss(id)
    }

    pub fn clear_notifications(&mut self) {
        self.notifications.clear();
    }

    /// ファイルを受け付ける。空のキューへの追加ならスピナーを表示する
    pub fn add_files(&mut self, files: Vec<NewFile<U>>) -> Intake {
        let had_existing = !self.queue.is_empty();
        let count = files.len();

        for file in files {
            self.queue.push(file.name, file.upload, file.image_url);
        }

        self.clear_notifications();
        if had_existing {
            self.notify(NotificationKind::Success, messages::files_added(count));
        } else {
            self.processing = true;
        }
        Intake {
            epoch: self.epoch,
            show_spinner: !had_existing,
            first_merged: false,
        }
    }

    fn is_current(&self, intake: &Intake) -> bool {
        intake.epoch == self.epoch
    }

    /// 1件の処理結果をマージする
    ///
    /// 最初の成功結果でスピナーを消し、その項目を表示する
    pub fn merge_outcome(&mut self, intake: &mut Intake, name: &str, outcome: FileOutcome) -> Option<usize> {
        if !self.is_current(intake) {
            tracing::debug!(file = name, "result for a cleared queue dropped");
            return None;
        }
        let success = outcome.is_success();
        let index = self.queue.apply_outcome(name, outcome)?;

        if success && !intake.first_merged {
            intake.first_merged = true;
            if intake.show_spinner {
                self.processing = false;
            }
            self.queue.select(index);
            if self.queue.pending_count() > 0 {
                self.notify(NotificationKind::Info, messages::processing_in_background());
            }
        }
        Some(index)
    }

    /// 全件の処理完了。やり直し前の受付なら何もしない
    pub fn finish_processing(&mut self, intake: &Intake, summary: &ProcessingSummary) -> bool {
        if !self.is_current(intake) {
            return false;
        }
        if intake.show_spinner {
            self.processing = false;
        }
        for (kind, message) in summary.notifications() {
            self.notify(kind, message);
        }
        true
    }

    pub fn select(&mut self, index: usize) -> bool {
        self.queue.select(index)
    }

    pub fn next(&mut self) -> bool {
        let moved = self.queue.next();
        if moved {
            self.clear_notifications();
        }
        moved
    }

    pub fn previous(&mut self) -> bool {
        let moved = self.queue.previous();
        if moved {
            self.clear_notifications();
        }
        moved
    }

    /// スキップ（次へと同じ）
    pub fn skip(&mut self) -> bool {
        self.next()
    }

    /// 保存後の自動移動（対象が削除済みなら何もしない）
    pub fn advance_to(&mut self, item_id: u64) -> bool {
        match self.queue.position_of(item_id) {
            Some(index) => {
                self.queue.select(index);
                self.clear_notifications();
                true
            }
            None => false,
        }
    }

    /// 1件削除して、解放すべきURLを返す
    pub fn remove(&mut self, index: usize) -> Option<String> {
        self.queue.remove(index)
    }

    /// 全件削除（最初からやり直す）して、解放すべきURLを返す
    pub fn remove_all(&mut self) -> Vec<String> {
        self.clear_notifications();
        self.processing = false;
        self.epoch += 1;
        self.queue.remove_all()
    }

    /// 表示中の項目のフィールドを編集
    pub fn edit_current_field(&mut self, field: FieldName, value: &str) -> EditOutcome {
        let index = self.queue.current_index();
        self.queue.edit_field(index, field, value)
    }

    /// 重複再確認の結果を反映する
    ///
    /// 確認中に取引番号が再度変わっていれば破棄する
    pub fn apply_duplicate_recheck(&mut self, item_id: u64, transaction_id: &str, exists: bool) -> bool {
        let still_current = self
            .queue
            .by_id(item_id)
            .and_then(|i| i.transaction_id())
            .map(|id| id == transaction_id)
            .unwrap_or(false);
        if !still_current {
            return false;
        }

        let applied = self.queue.set_duplicate(item_id, exists);
        if applied && exists {
            self.notify(NotificationKind::Warning, messages::duplicate_transaction());
        }
        applied
    }

    /// 表示中の項目の確定を始める: 送信データを組み立てて保存中にする
    pub fn begin_confirm(&mut self) -> Result<(u64, ReceiptPayload), ConfirmBlock> {
        let index = self.queue.current_index();
        if let Some(block) = self.queue.confirm_block(index, self.saving) {
            return Err(block);
        }
        let item = self.queue.current().ok_or(ConfirmBlock::NoItem)?;
        let data = item.extracted_data.as_ref().ok_or(ConfirmBlock::NotProcessed)?;

        let payload = ReceiptPayload::assemble(
            &item.name,
            data,
            item.receipt_type.as_deref(),
            item.confidence,
            item.temp_id.as_deref(),
        );
        let item_id = item.id;

        self.saving = true;
        self.clear_notifications();
        Ok((item_id, payload))
    }

    /// 確定の完了
    pub fn finish_confirm(&mut self, item_id: u64, result: Result<(), String>) -> ConfirmOutcome {
        self.saving = false;

        match result {
            Ok(()) => {
                if !self.queue.mark_saved(item_id) {
                    self.notify(NotificationKind::Warning, messages::save_not_applied());
                    return ConfirmOutcome::Stale;
                }
                self.notify(NotificationKind::Success, messages::saved());

                let next = self
                    .queue
                    .position_of(item_id)
                    .and_then(|pos| self.queue.next_unsaved_after(pos))
                    .and_then(|idx| self.queue.get(idx))
                    .map(|i| i.id);

                if next.is_none() {
                    let saved = self.queue.saved_count();
                    self.notify(NotificationKind::Success, messages::all_saved(saved));
                }
                ConfirmOutcome::Saved { advance_to: next }
            }
            Err(message) => {
                let text = messages::or_fallback(&message, messages::save_failed());
                self.notify(NotificationKind::Error, text.clone());
                ConfirmOutcome::Failed(text)
            }
        }
    }
}

/// 状態の持ち主への更新窓口
///
/// 破棄済みなら `None` を返し、非同期処理はそこで打ち切る
pub trait StoreHandle<U> {
    fn update<R>(&self, f: impl FnOnce(&mut ReviewStore<U>) -> R) -> Option<R>;
}

impl<U> StoreHandle<U> for RefCell<ReviewStore<U>> {
    fn update<R>(&self, f: impl FnOnce(&mut ReviewStore<U>) -> R) -> Option<R> {
        Some(f(&mut self.borrow_mut()))
    }
}
