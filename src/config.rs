use crate::error::{ReceiptError, Result};
use receipt_review_common::endpoints::{DEFAULT_API_BASE, HEALTH_ATTEMPTS, HEALTH_INTERVAL_MS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// バックエンドURLを上書きする環境変数
pub const API_BASE_ENV: &str = "RECEIPT_API_BASE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base: String,
    pub timeout_seconds: u64,
    /// 起動時ヘルスチェックの試行回数
    pub health_attempts: u32,
    pub health_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.into(),
            timeout_seconds: 120,
            health_attempts: HEALTH_ATTEMPTS,
            health_interval_ms: HEALTH_INTERVAL_MS as u64,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ReceiptError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("receipt-review").join("config.json"))
    }

    /// 実際に使うバックエンドURL（環境変数を優先）
    pub fn api_base(&self) -> String {
        match std::env::var(API_BASE_ENV) {
            Ok(base) if !base.trim().is_empty() => base.trim().to_string(),
            _ => self.api_base.clone(),
        }
    }

    pub fn set_api_base(&mut self, base: String) -> Result<()> {
        let base = base.trim().trim_end_matches('/').to_string();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ReceiptError::Config(format!("URLが不正です: {}", base)));
        }
        self.api_base = base;
        self.save()
    }
}
