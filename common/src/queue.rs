//! 処理キューのモデル
//!
//! アップロードされたファイル1件ごとの状態を保持する。
//! `U` はアップロードの実体（ブラウザでは `web_sys::File`、CLIではパス）。
//!
//! 抽出結果のマージはファイル名で対象を探す。結果の到着順に依存しない。

use crate::types::{ExtractedData, ExtractionResult, FieldName, Issue};
use serde::Serialize;

/// キュー項目
#[derive(Debug, Clone, Serialize)]
pub struct QueueItem<U> {
    /// キュー内で一意なID
    pub id: u64,
    pub name: String,
    #[serde(skip)]
    pub upload: U,
    /// プレビュー用URL（ブラウザではObject URL）
    pub image_url: String,
    pub processed: bool,
    pub saved: bool,
    pub is_duplicate: bool,
    pub error: Option<String>,
    pub extracted_data: Option<ExtractedData>,
    pub confidence: Option<f64>,
    pub needs_review: bool,
    pub issues: Vec<Issue>,
    pub receipt_type: Option<String>,
    pub temp_id: Option<String>,
    pub archive_path: Option<String>,
}

/// キュー項目の表示ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueStatus {
    Pending,
    Processed,
    NeedsReview,
    Duplicate,
    Failed,
    Saved,
}

impl QueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Pending => "pending",
            QueueStatus::Processed => "processed",
            QueueStatus::NeedsReview => "needs-review",
            QueueStatus::Duplicate => "duplicate",
            QueueStatus::Failed => "failed",
            QueueStatus::Saved => "saved",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QueueStatus::Pending => "قيد الانتظار",
            QueueStatus::Processed => "معالج",
            QueueStatus::NeedsReview => "يحتاج مراجعة",
            QueueStatus::Duplicate => "مكرر",
            QueueStatus::Failed => "فشل",
            QueueStatus::Saved => "محفوظ",
        }
    }
}

impl<U> QueueItem<U> {
    fn new(id: u64, name: String, upload: U, image_url: String) -> Self {
        Self {
            id,
            name,
            upload,
            image_url,
            processed: false,
            saved: false,
            is_duplicate: false,
            error: None,
            extracted_data: None,
            confidence: None,
            needs_review: false,
            issues: Vec::new(),
            receipt_type: None,
            temp_id: None,
            archive_path: None,
        }
    }

    pub fn status(&self) -> QueueStatus {
        if self.saved {
            QueueStatus::Saved
        } else if !self.processed {
            QueueStatus::Pending
        } else if self.error.is_some() {
            QueueStatus::Failed
        } else if self.is_duplicate {
            QueueStatus::Duplicate
        } else if self.needs_review {
            QueueStatus::NeedsReview
        } else {
            QueueStatus::Processed
        }
    }

    pub fn critical_issues(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.is_critical())
    }

    pub fn has_critical_issues(&self) -> bool {
        self.critical_issues().next().is_some()
    }

    /// 抽出データ中の取引番号
    pub fn transaction_id(&self) -> Option<&str> {
        self.extracted_data.as_ref().and_then(|d| d.transaction_id())
    }
}

/// 1ファイル分の処理結果
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Extracted {
        result: ExtractionResult,
        is_duplicate: bool,
    },
    Failed {
        message: String,
    },
}

impl FileOutcome {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, FileOutcome::Extracted { is_duplicate: true, .. })
    }

    /// 要確認（重複は除く）
    pub fn needs_review(&self) -> bool {
        matches!(
            self,
            FileOutcome::Extracted { result, is_duplicate: false } if result.needs_review
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FileOutcome::Extracted { .. })
    }
}

/// フィールド編集の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// 対象なし、または保存済みで変更不可
    Ignored,
    Updated,
    /// 取引番号が変わったので重複を再確認する
    RecheckDuplicate { item_id: u64, transaction_id: String },
}

/// 確定できない理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmBlock {
    NoItem,
    NotProcessed,
    AlreadySaved,
    Saving,
    Duplicate,
    CriticalIssues,
}

/// 処理キュー
#[derive(Debug, Clone)]
pub struct ProcessingQueue<U> {
    items: Vec<QueueItem<U>>,
    current: usize,
    next_id: u64,
}

impl<U> Default for ProcessingQueue<U> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            current: 0,
            next_id: 0,
        }
    }
}

impl<U> ProcessingQueue<U> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新しいファイルを末尾に追加してIDを返す
    pub fn push(&mut self, name: impl Into<String>, upload: U, image_url: impl Into<String>) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.items
            .push(QueueItem::new(id, name.into(), upload, image_url.into()));
        id
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[QueueItem<U>] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&QueueItem<U>> {
        self.items.get(index)
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&QueueItem<U>> {
        self.items.get(self.current)
    }

    pub fn position_of(&self, item_id: u64) -> Option<usize> {
        self.items.iter().position(|i| i.id == item_id)
    }

    pub fn by_id(&self, item_id: u64) -> Option<&QueueItem<U>> {
        self.items.iter().find(|i| i.id == item_id)
    }

    fn by_id_mut(&mut self, item_id: u64) -> Option<&mut QueueItem<U>> {
        self.items.iter_mut().find(|i| i.id == item_id)
    }

    /// 処理結果をファイル名で該当項目にマージする
    ///
    /// 同名が複数ある場合は未処理の先頭が対象。
    /// 対象が無い（処理中に削除された）場合は何もしない。
    pub fn apply_outcome(&mut self, name: &str, outcome: FileOutcome) -> Option<usize> {
        let index = self
            .items
            .iter()
            .position(|i| i.name == name && !i.processed)?;
        let item = &mut self.items[index];
        item.processed = true;

        match outcome {
            FileOutcome::Extracted { result, is_duplicate } => {
                item.error = None;
                item.extracted_data = Some(result.data);
                item.confidence = Some(result.overall_confidence);
                item.needs_review = result.needs_review;
                item.issues = result.issues;
                item.receipt_type = result.receipt_type;
                item.temp_id = result.temp_id;
                item.archive_path = result.archive_path;
                item.is_duplicate = is_duplicate;
            }
            FileOutcome::Failed { message } => {
                item.error = Some(message);
            }
        }

        tracing::debug!(file = name, index, "merged extraction outcome");
        Some(index)
    }

    /// 表示中の項目を切り替える（範囲外は無視）
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.items.len() {
            self.current = index;
            true
        } else {
            false
        }
    }

    pub fn next(&mut self) -> bool {
        if self.current + 1 < self.items.len() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    pub fn previous(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    pub fn has_next(&self) -> bool {
        self.current + 1 < self.items.len()
    }

    pub fn has_previous(&self) -> bool {
        self.current > 0
    }

    /// 1件削除して、解放すべきプレビューURLを返す
    pub fn remove(&mut self, index: usize) -> Option<String> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(index);

        if index < self.current {
            self.current -= 1;
        }
        if self.current >= self.items.len() {
            self.current = self.items.len().saturating_sub(1);
        }

        Some(removed.image_url)
    }

    /// 全件削除して、解放すべきプレビューURLをすべて返す
    pub fn remove_all(&mut self) -> Vec<String> {
        self.current = 0;
        self.items.drain(..).map(|i| i.image_url).collect()
    }

    /// フィールドを編集する（保存済みは変更不可）
    pub fn edit_field(&mut self, index: usize, field: FieldName, value: &str) -> EditOutcome {
        let Some(item) = self.items.get_mut(index) else {
            return EditOutcome::Ignored;
        };
        if item.saved {
            return EditOutcome::Ignored;
        }
        let Some(data) = item.extracted_data.as_mut() else {
            return EditOutcome::Ignored;
        };

        data.set_value(field, value);

        if field == FieldName::TransactionId && !value.trim().is_empty() {
            EditOutcome::RecheckDuplicate {
                item_id: item.id,
                transaction_id: value.trim().to_string(),
            }
        } else {
            EditOutcome::Updated
        }
    }

    /// 重複フラグを更新する（保存済みは変更しない）
    pub fn set_duplicate(&mut self, item_id: u64, exists: bool) -> bool {
        match self.by_id_mut(item_id) {
            Some(item) if !item.saved => {
                item.is_duplicate = exists;
                true
            }
            _ => false,
        }
    }

    /// 保存済みにする（重複は保存済みにしない）
    pub fn mark_saved(&mut self, item_id: u64) -> bool {
        match self.by_id_mut(item_id) {
            Some(item) if !item.is_duplicate => {
                item.saved = true;
                true
            }
            _ => false,
        }
    }

    /// 確定できない理由（確定可能ならNone）
    pub fn confirm_block(&self, index: usize, saving: bool) -> Option<ConfirmBlock> {
        let Some(item) = self.items.get(index) else {
            return Some(ConfirmBlock::NoItem);
        };

        if saving {
            Some(ConfirmBlock::Saving)
        } else if item.saved {
            Some(ConfirmBlock::AlreadySaved)
        } else if !item.processed || item.extracted_data.is_none() {
            Some(ConfirmBlock::NotProcessed)
        } else if item.is_duplicate {
            Some(ConfirmBlock::Duplicate)
        } else if item.has_critical_issues() {
            Some(ConfirmBlock::CriticalIssues)
        } else {
            None
        }
    }

    pub fn can_confirm(&self, index: usize, saving: bool) -> bool {
        self.confirm_block(index, saving).is_none()
    }

    /// 指定位置より後ろで最初の未保存項目
    pub fn next_unsaved_after(&self, index: usize) -> Option<usize> {
        self.items
            .iter()
            .enumerate()
            .skip(index + 1)
            .find(|(_, i)| !i.saved)
            .map(|(idx, _)| idx)
    }

    pub fn saved_count(&self) -> usize {
        self.items.iter().filter(|i| i.saved).count()
    }

    pub fn pending_count(&self) -> usize {
        self.items.iter().filter(|i| !i.processed).count()
    }
}
