//! 遅延実行の取り消し
//!
//! 予約するたびに前の予約のトークンを取り消して新しいトークンを渡す。
//! 待機中の処理はトークンの取り消しで即座に終わり、通信後の結果も捨てる。

use std::sync::{Arc, Mutex, PoisonError};

pub use tokio_util::sync::CancellationToken;

/// 受取人名の候補検索
pub const AUTOCOMPLETE_DEBOUNCE_MS: u32 = 300;
/// 紐付け名による自動置換
pub const AUTO_REPLACE_DEBOUNCE_MS: u32 = 500;
/// 取引検索
pub const SEARCH_DEBOUNCE_MS: u32 = 500;
/// 保存後に次の項目へ進むまで
pub const AUTO_ADVANCE_MS: u32 = 800;
/// 候補リストのフォーカス外れから閉じるまで
pub const BLUR_CLOSE_MS: u32 = 200;

/// 予約の発行元（複製しても同じ予約を共有する）
#[derive(Debug, Clone, Default)]
pub struct Debouncer {
    current: Arc<Mutex<CancellationToken>>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以前の予約を取り消して新しい予約を返す
    pub fn schedule(&self) -> CancellationToken {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        current.cancel();
        *current = CancellationToken::new();
        current.clone()
    }

    /// 予約中のものを取り消す
    pub fn cancel(&self) {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn test_latest_ticket_stays_active() {
        let debouncer = Debouncer::new();
        let first = debouncer.schedule();
        let second = debouncer.schedule();
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
    }

    #[test]
    fn test_cancel_invalidates_pending() {
        let debouncer = Debouncer::new();
        let ticket = debouncer.schedule();
        debouncer.cancel();
        assert!(ticket.is_cancelled());
        assert!(!debouncer.schedule().is_cancelled());
    }

    #[test]
    fn test_clones_share_schedule() {
        let debouncer = Debouncer::new();
        let handle = debouncer.clone();
        let ticket = debouncer.schedule();
        handle.schedule();
        assert!(ticket.is_cancelled());
    }

    #[test]
    fn test_waiter_wakes_on_reschedule() {
        let debouncer = Debouncer::new();
        let ticket = debouncer.schedule();
        debouncer.schedule();
        // 取り消し済みなら待たずに終わる
        block_on(ticket.cancelled());
    }
}
