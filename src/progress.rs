//! 抽出の進捗表示（indicatif）

use indicatif::{ProgressBar, ProgressStyle};
use receipt_review_common::error::Result;
use receipt_review_common::types::{BatchExtraction, ExtractionResult, ReceiptPayload};
use receipt_review_common::ReceiptApi;
use serde_json::Value;

pub fn extraction_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    let style = ProgressStyle::with_template("  {bar:30.cyan/blue} {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉░");
    bar.set_style(style);
    bar
}

/// 抽出が1件終わるたびにバーを進めるラッパー
pub struct Tracked<'a, A> {
    inner: &'a A,
    bar: ProgressBar,
}

impl<'a, A> Tracked<'a, A> {
    pub fn new(inner: &'a A, bar: ProgressBar) -> Self {
        Self { inner, bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl<A: ReceiptApi> ReceiptApi for Tracked<'_, A> {
    type Upload = A::Upload;

    async fn extract_single(&self, upload: &A::Upload) -> Result<ExtractionResult> {
        let result = self.inner.extract_single(upload).await;
        self.bar.inc(1);
        result
    }

    async fn extract_batch(&self, uploads: &[A::Upload]) -> Result<BatchExtraction> {
        self.bar.set_message("一括抽出中...");
        let result = self.inner.extract_batch(uploads).await;
        self.bar.inc(uploads.len() as u64);
        result
    }

    async fn check_duplicate(&self, transaction_id: &str) -> Result<bool> {
        self.inner.check_duplicate(transaction_id).await
    }

    async fn save_receipt(&self, payload: &ReceiptPayload) -> Result<Value> {
        self.inner.save_receipt(payload).await
    }
}
