//! バックエンドのエンドポイント
//!
//! パスとクエリ文字列の組み立てのみ。通信は各クライアントが行う。

use crate::types::{ExportFormat, TransactionFilters};

/// 既定のバックエンドURL
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// ヘルスチェック（ルート）
pub const HEALTH: &str = "/";
/// 起動時のヘルスチェック回数と間隔
pub const HEALTH_ATTEMPTS: u32 = 10;
pub const HEALTH_INTERVAL_MS: u32 = 500;
pub const EXTRACT_BATCH: &str = "/api/extract/batch";
pub const EXTRACT_SINGLE: &str = "/api/extract/single";
pub const RECEIPTS: &str = "/api/receipts";
pub const KNOWN_ACCOUNTS: &str = "/api/accounts/known";
pub const ADD_ACCOUNT: &str = "/api/accounts/add";
pub const STATISTICS: &str = "/api/statistics";

/// 一括抽出のmultipartフィールド名
pub const BATCH_FIELD: &str = "files";
/// 単体抽出のmultipartフィールド名
pub const SINGLE_FIELD: &str = "file";

fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// ベースURLとパスを結合（末尾の `/` は1つにまとめる）
pub fn join(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

pub fn check_duplicate(transaction_id: &str) -> String {
    format!("/api/receipts/check-duplicate/{}", encode(transaction_id))
}

pub fn delete_account(account_number: &str) -> String {
    format!("/api/accounts/{}", encode(account_number))
}

pub fn search_accounts(query: &str) -> String {
    format!("/api/accounts/search?q={}", encode(query))
}

/// 受取人名検索（宛先口座があれば優先表示のため付与）
pub fn search_receivers(query: &str, to_account: Option<&str>) -> String {
    let mut url = format!("/api/receivers/search?q={}", encode(query));
    if let Some(account) = to_account.map(str::trim).filter(|a| !a.is_empty()) {
        url.push_str("&to_account=");
        url.push_str(&encode(account));
    }
    url
}

fn filter_query(filters: &TransactionFilters) -> Vec<String> {
    filters
        .active_pairs()
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, encode(v)))
        .collect()
}

pub fn transactions(filters: &TransactionFilters) -> String {
    format!("/api/transactions?{}", filter_query(filters).join("&"))
}

pub fn transaction(transaction_id: &str) -> String {
    format!("/api/transactions/{}", encode(transaction_id))
}

pub fn export_transactions(filters: &TransactionFilters, format: ExportFormat) -> String {
    let mut params = filter_query(filters);
    params.push(format!("format={}", format.as_str()));
    format!("/api/transactions/export?{}", params.join("&"))
}

pub fn archive(receipt_id: &str) -> String {
    format!("/api/receipts/{}/archive", encode(receipt_id))
}

pub fn receipt(receipt_id: &str) -> String {
    format!("/api/receipts/{}", encode(receipt_id))
}
