//! バックエンドAPIクライアント（reqwest）
//!
//! レビューに必要な4操作は `ReceiptApi` として実装し、
//! 検索・口座管理・アーカイブ等は固有メソッドとして持つ。

use crate::config::Config;
use crate::error::Result as CliResult;
use receipt_review_common::endpoints;
use receipt_review_common::error::{Error, Result};
use receipt_review_common::types::{
    AccountSuggestion, BatchExtraction, DuplicateCheck, ExportFormat, ExtractionResult,
    KnownAccount, ReceiptPayload, ReceiverSuggestion, Transaction, TransactionFilters,
    TransactionPage,
};
use receipt_review_common::ReceiptApi;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

const USER_AGENT: &str = concat!("receipt-review/", env!("CARGO_PKG_VERSION"));

pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

fn network_error(e: reqwest::Error) -> Error {
    Error::Network(e.to_string())
}

/// 画像のMIMEタイプ（拡張子から推定）
fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        _ => "image/jpeg",
    }
}

async fn file_part(path: &Path) -> Result<Part> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| Error::File(format!("{}: {}", path.display(), e)))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(mime_for(path))
        .map_err(network_error)
}

/// 応答ボディを型に変換する（形式違いは通信エラーと区別する）
fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(body)?)
}

impl ApiClient {
    pub fn new(config: &Config) -> CliResult<Self> {
        Self::with_base(config, config.api_base())
    }

    /// 接続先を指定して作る（`--api-base` 用）
    pub fn with_base(config: &Config, base: String) -> CliResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { http, base })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        endpoints::join(&self.base, path)
    }

    /// 送信してステータスを確認する（エラー応答はボディからメッセージを取る）
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(network_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let payload = response.json::<Value>().await.ok();
        tracing::debug!(status = status.as_u16(), "backend returned error");
        Err(Error::from_response(status.as_u16(), payload))
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let body = self.bytes(request).await?;
        decode(&body)
    }

    async fn bytes(&self, request: RequestBuilder) -> Result<Vec<u8>> {
        let response = self.send(request).await?;
        let bytes = response.bytes().await.map_err(network_error)?;
        Ok(bytes.to_vec())
    }

    /// ルートに1回だけ問い合わせる
    pub async fn health(&self) -> bool {
        match self.http.get(self.url(endpoints::HEALTH)).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "health check failed");
                false
            }
        }
    }

    /// 起動可能になるまで一定間隔で問い合わせる
    pub async fn wait_for_backend(&self, attempts: u32, interval_ms: u64) -> bool {
        for attempt in 1..=attempts {
            if self.health().await {
                return true;
            }
            tracing::debug!(attempt, attempts, "backend not ready");
            if attempt < attempts {
                tokio::time::sleep(Duration::from_millis(interval_ms)).await;
            }
        }
        false
    }

    pub async fn known_accounts(&self) -> Result<Vec<KnownAccount>> {
        self.json(self.http.get(self.url(endpoints::KNOWN_ACCOUNTS))).await
    }

    pub async fn add_account(&self, account: &KnownAccount) -> Result<Value> {
        self.json(self.http.post(self.url(endpoints::ADD_ACCOUNT)).json(account))
            .await
    }

    pub async fn delete_account(&self, account_number: &str) -> Result<Value> {
        self.json(self.http.delete(self.url(&endpoints::delete_account(account_number))))
            .await
    }

    pub async fn search_accounts(&self, query: &str) -> Result<Vec<AccountSuggestion>> {
        self.json(self.http.get(self.url(&endpoints::search_accounts(query))))
            .await
    }

    pub async fn search_receivers(
        &self,
        query: &str,
        to_account: Option<&str>,
    ) -> Result<Vec<ReceiverSuggestion>> {
        self.json(self.http.get(self.url(&endpoints::search_receivers(query, to_account))))
            .await
    }

    pub async fn transactions(&self, filters: &TransactionFilters) -> Result<TransactionPage> {
        self.json(self.http.get(self.url(&endpoints::transactions(filters))))
            .await
    }

    pub async fn transaction(&self, transaction_id: &str) -> Result<Transaction> {
        self.json(self.http.get(self.url(&endpoints::transaction(transaction_id))))
            .await
    }

    pub async fn export_transactions(
        &self,
        filters: &TransactionFilters,
        format: ExportFormat,
    ) -> Result<Vec<u8>> {
        self.bytes(self.http.get(self.url(&endpoints::export_transactions(filters, format))))
            .await
    }

    pub async fn archive(&self, receipt_id: &str) -> Result<Vec<u8>> {
        self.bytes(self.http.get(self.url(&endpoints::archive(receipt_id))))
            .await
    }

    pub async fn delete_receipt(&self, receipt_id: &str) -> Result<Value> {
        self.json(self.http.delete(self.url(&endpoints::receipt(receipt_id))))
            .await
    }

    pub async fn statistics(&self) -> Result<Value> {
        self.json(self.http.get(self.url(endpoints::STATISTICS))).await
    }
}

impl ReceiptApi for ApiClient {
    type Upload = PathBuf;

    async fn extract_single(&self, upload: &PathBuf) -> Result<ExtractionResult> {
        let form = Form::new().part(endpoints::SINGLE_FIELD, file_part(upload).await?);
        self.json(self.http.post(self.url(endpoints::EXTRACT_SINGLE)).multipart(form))
            .await
    }

    async fn extract_batch(&self, uploads: &[PathBuf]) -> Result<BatchExtraction> {
        let mut form = Form::new();
        for upload in uploads {
            form = form.part(endpoints::BATCH_FIELD, file_part(upload).await?);
        }
        self.json(self.http.post(self.url(endpoints::EXTRACT_BATCH)).multipart(form))
            .await
    }

    async fn check_duplicate(&self, transaction_id: &str) -> Result<bool> {
        let check: DuplicateCheck = self
            .json(self.http.get(self.url(&endpoints::check_duplicate(transaction_id))))
            .await?;
        Ok(check.exists)
    }

    async fn save_receipt(&self, payload: &ReceiptPayload) -> Result<Value> {
        self.json(self.http.post(self.url(endpoints::RECEIPTS)).json(payload))
            .await
    }
}
