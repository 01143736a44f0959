//! Receipt Review Common Library
//!
//! CLIとWeb(WASM)で共有される型・レビュー状態・処理フロー

pub mod types;
pub mod error;
pub mod fields;
pub mod notify;
pub mod queue;
pub mod debounce;
pub mod linkage;
pub mod endpoints;
pub mod store;
pub mod preview;
pub mod workflow;

pub use types::{ExtractedData, ExtractionResult, FieldName, FieldValue, ReceiptPayload};
pub use error::{Error, Result};
pub use notify::{Notification, NotificationCenter, NotificationKind};
pub use queue::{ConfirmBlock, EditOutcome, FileOutcome, ProcessingQueue, QueueItem, QueueStatus};
pub use store::{ConfirmOutcome, Intake, NewFile, ProcessingSummary, ReviewStore, StoreHandle};
pub use workflow::ReceiptApi;
