//! バックエンドAPI連携

mod client;

pub use client::{download_url, revoke_url, WebClient};
