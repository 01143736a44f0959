//! エラー型定義

use serde_json::Value;
use thiserror::Error;

/// バックエンドがメッセージを返さなかった場合の既定メッセージ
pub const DEFAULT_FAILURE_MESSAGE: &str = "Request failed";

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    /// HTTPエラー応答（status 0 はネットワーク到達不可）
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        payload: Option<Value>,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// 送信する画像ファイルを読めなかった
    #[error("File error: {0}")]
    File(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// エラー応答のボディからAPIエラーを組み立てる
    ///
    /// `message` → `detail` の順でメッセージを探し、無ければ既定メッセージを使う
    pub fn from_response(status: u16, payload: Option<Value>) -> Self {
        let message = payload
            .as_ref()
            .and_then(|p| {
                p.get("message")
                    .or_else(|| p.get("detail"))
                    .and_then(Value::as_str)
            })
            .unwrap_or(DEFAULT_FAILURE_MESSAGE)
            .to_string();

        Error::Api {
            status,
            message,
            payload,
        }
    }

    /// HTTPステータス（ネットワークエラーは0）
    pub fn status(&self) -> u16 {
        match self {
            Error::Api { status, .. } => *status,
            _ => 0,
        }
    }

    /// 利用者向けに表示するメッセージ本体
    pub fn message(&self) -> String {
        match self {
            Error::Api { message, .. } => message.clone(),
            Error::Network(msg) | Error::File(msg) | Error::Config(msg) => msg.clone(),
            Error::Json(e) => e.to_string(),
        }
    }
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
