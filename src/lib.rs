//! Receipt Review CLI
//!
//! バックエンドでレシート画像を抽出し、端末上で確認・保存する

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod progress;
pub mod review;
pub mod scanner;
