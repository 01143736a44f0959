//! fetchによるバックエンドクライアント
//!
//! レビューの4操作は `ReceiptApi` として実装する。
//! 画像やエクスポートの応答はBlobのObject URLで返す。

use receipt_review_common::endpoints::{self, DEFAULT_API_BASE};
use receipt_review_common::error::{Error, Result};
use receipt_review_common::types::{
    AccountSuggestion, BatchExtraction, DuplicateCheck, ExportFormat, ExtractionResult,
    KnownAccount, ReceiptPayload, ReceiverSuggestion, TransactionFilters, TransactionPage,
};
use receipt_review_common::ReceiptApi;
use serde::de::DeserializeOwned;
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, File, FormData, HtmlAnchorElement, Request, RequestInit, RequestMode, Response, Url};

fn js_error(e: JsValue) -> Error {
    Error::Network(e.as_string().unwrap_or_else(|| format!("{:?}", e)))
}

/// 送信ボディ
enum Body {
    Empty,
    Json(String),
    Form(FormData),
}

#[derive(Clone)]
pub struct WebClient {
    base: String,
}

impl Default for WebClient {
    fn default() -> Self {
        Self {
            base: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl WebClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn url(&self, path: &str) -> String {
        endpoints::join(&self.base, path)
    }

    /// 送信してステータスを確認する（エラー応答はボディからメッセージを取る）
    async fn send(&self, method: &str, path: &str, body: Body) -> Result<Response> {
        let opts = RequestInit::new();
        opts.set_method(method);
        opts.set_mode(RequestMode::Cors);
        let mut json = false;
        match &body {
            Body::Empty => {}
            Body::Json(text) => {
                opts.set_body(&JsValue::from_str(text));
                json = true;
            }
            Body::Form(form) => opts.set_body(form.as_ref()),
        }

        let request = Request::new_with_str_and_init(&self.url(path), &opts).map_err(js_error)?;
        if json {
            request
                .headers()
                .set("Content-Type", "application/json")
                .map_err(js_error)?;
        }

        let window = web_sys::window().ok_or_else(|| Error::Network("no window".into()))?;
        let resp_value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(js_error)?;
        let resp: Response = resp_value.dyn_into().map_err(js_error)?;

        if resp.ok() {
            return Ok(resp);
        }

        let status = resp.status();
        let payload = match Self::text(&resp).await {
            Ok(text) => serde_json::from_str::<Value>(&text).ok(),
            Err(_) => None,
        };
        Err(Error::from_response(status, payload))
    }

    async fn text(resp: &Response) -> Result<String> {
        let text = JsFuture::from(resp.text().map_err(js_error)?)
            .await
            .map_err(js_error)?;
        Ok(text.as_string().unwrap_or_default())
    }

    async fn json<T: DeserializeOwned>(&self, method: &str, path: &str, body: Body) -> Result<T> {
        let resp = self.send(method, path, body).await?;
        let text = Self::text(&resp).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// 応答をBlobとして受け取り、Object URLを返す
    async fn object_url(&self, path: &str) -> Result<String> {
        let resp = self.send("GET", path, Body::Empty).await?;
        let blob: Blob = JsFuture::from(resp.blob().map_err(js_error)?)
            .await
            .map_err(js_error)?
            .dyn_into()
            .map_err(js_error)?;
        Url::create_object_url_with_blob(&blob).map_err(js_error)
    }

    fn form_with(field: &str, files: &[File]) -> Result<FormData> {
        let form = FormData::new().map_err(js_error)?;
        for file in files {
            form.append_with_blob_and_filename(field, file, &file.name())
                .map_err(js_error)?;
        }
        Ok(form)
    }

    /// ルートに1回だけ問い合わせる
    pub async fn health(&self) -> bool {
        self.send("GET", endpoints::HEALTH, Body::Empty).await.is_ok()
    }

    pub async fn known_accounts(&self) -> Result<Vec<KnownAccount>> {
        self.json("GET", endpoints::KNOWN_ACCOUNTS, Body::Empty).await
    }

    pub async fn add_account(&self, account: &KnownAccount) -> Result<Value> {
        let body = Body::Json(serde_json::to_string(account)?);
        self.json("POST", endpoints::ADD_ACCOUNT, body).await
    }

    pub async fn delete_account(&self, account_number: &str) -> Result<Value> {
        self.json("DELETE", &endpoints::delete_account(account_number), Body::Empty)
            .await
    }

    pub async fn search_accounts(&self, query: &str) -> Result<Vec<AccountSuggestion>> {
        self.json("GET", &endpoints::search_accounts(query), Body::Empty)
            .await
    }

    pub async fn search_receivers(
        &self,
        query: &str,
        to_account: Option<&str>,
    ) -> Result<Vec<ReceiverSuggestion>> {
        self.json("GET", &endpoints::search_receivers(query, to_account), Body::Empty)
            .await
    }

    pub async fn transactions(&self, filters: &TransactionFilters) -> Result<TransactionPage> {
        self.json("GET", &endpoints::transactions(filters), Body::Empty)
            .await
    }

    /// エクスポートファイルのObject URL
    pub async fn export_url(&self, filters: &TransactionFilters, format: ExportFormat) -> Result<String> {
        self.object_url(&endpoints::export_transactions(filters, format))
            .await
    }

    /// 保存済み画像のObject URL
    pub async fn archive_url(&self, receipt_id: &str) -> Result<String> {
        self.object_url(&endpoints::archive(receipt_id)).await
    }

    pub async fn delete_receipt(&self, receipt_id: &str) -> Result<Value> {
        self.json("DELETE", &endpoints::receipt(receipt_id), Body::Empty)
            .await
    }
}

impl ReceiptApi for WebClient {
    type Upload = File;

    async fn extract_single(&self, upload: &File) -> Result<ExtractionResult> {
        let form = Self::form_with(endpoints::SINGLE_FIELD, std::slice::from_ref(upload))?;
        self.json("POST", endpoints::EXTRACT_SINGLE, Body::Form(form))
            .await
    }

    async fn extract_batch(&self, uploads: &[File]) -> Result<BatchExtraction> {
        let form = Self::form_with(endpoints::BATCH_FIELD, uploads)?;
        self.json("POST", endpoints::EXTRACT_BATCH, Body::Form(form))
            .await
    }

    async fn check_duplicate(&self, transaction_id: &str) -> Result<bool> {
        let check: DuplicateCheck = self
            .json("GET", &endpoints::check_duplicate(transaction_id), Body::Empty)
            .await?;
        Ok(check.exists)
    }

    async fn save_receipt(&self, payload: &ReceiptPayload) -> Result<Value> {
        let body = Body::Json(serde_json::to_string(payload)?);
        self.json("POST", endpoints::RECEIPTS, body).await
    }
}

/// Object URLを解放する
pub fn revoke_url(url: &str) {
    if url.starts_with("blob:") {
        let _ = Url::revoke_object_url(url);
    }
}

/// Object URLをファイルとしてダウンロードさせてから解放する
pub fn download_url(url: &str, file_name: &str) -> Result<()> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| Error::Network("no document".into()))?;
    let anchor: HtmlAnchorElement = document
        .create_element("a")
        .map_err(js_error)?
        .dyn_into()
        .map_err(|_| Error::Network("anchor element".into()))?;
    anchor.set_href(url);
    anchor.set_download(file_name);
    anchor.click();
    revoke_url(url);
    Ok(())
}
