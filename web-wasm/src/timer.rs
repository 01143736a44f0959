//! タイマー待ちと予約取り消しの組み合わせ

use futures::future::{select, Either};
use gloo::timers::future::TimeoutFuture;
use receipt_review_common::debounce::CancellationToken;

/// `ms` 待つ。途中で取り消されたらすぐにfalseを返す
pub async fn sleep_unless_cancelled(token: &CancellationToken, ms: u32) -> bool {
    let timeout = TimeoutFuture::new(ms);
    let cancelled = token.cancelled();
    futures::pin_mut!(timeout, cancelled);
    match select(timeout, cancelled).await {
        Either::Left(_) => !token.is_cancelled(),
        Either::Right(_) => false,
    }
}

#[cfg(all(target_arch = "wasm32", test))]
mod wasm_tests {
    use super::*;
    use receipt_review_common::debounce::Debouncer;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    async fn wasm_sleep_completes_when_active() {
        let debouncer = Debouncer::new();
        let ticket = debouncer.schedule();
        assert!(sleep_unless_cancelled(&ticket, 10).await);
    }

    #[wasm_bindgen_test]
    async fn wasm_sleep_ends_early_when_rescheduled() {
        let debouncer = Debouncer::new();
        let ticket = debouncer.schedule();
        debouncer.schedule();
        assert!(!sleep_unless_cancelled(&ticket, 60_000).await);
    }
}
