//! 起動画面（ブランド表示 → バックエンド接続確認）

use crate::api::WebClient;
use gloo::timers::future::TimeoutFuture;
use leptos::prelude::*;
use leptos::task::spawn_local;
use receipt_review_common::endpoints::{HEALTH_ATTEMPTS, HEALTH_INTERVAL_MS};
use receipt_review_common::notify::messages;

/// ブランド表示の最短時間
const BRANDING_MS: u32 = 1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SplashStatus {
    Branding,
    /// 試行回数
    Checking(u32),
    Failed,
}

/// 接続できるまで一定間隔で問い合わせる
async fn wait_for_backend(client: &WebClient, set_status: WriteSignal<SplashStatus>) -> bool {
    for attempt in 1..=HEALTH_ATTEMPTS {
        set_status.set(SplashStatus::Checking(attempt));
        if client.health().await {
            return true;
        }
        if attempt < HEALTH_ATTEMPTS {
            TimeoutFuture::new(HEALTH_INTERVAL_MS).await;
        }
    }
    false
}

#[component]
pub fn Splash<F>(client: WebClient, on_ready: F) -> impl IntoView
where
    F: Fn() + Clone + Send + Sync + 'static,
{
    let (status, set_status) = signal(SplashStatus::Branding);

    let start = move |with_branding: bool| {
        let client = client.clone();
        let on_ready = on_ready.clone();
        spawn_local(async move {
            if with_branding {
                set_status.set(SplashStatus::Branding);
                TimeoutFuture::new(BRANDING_MS).await;
            }
            if wait_for_backend(&client, set_status).await {
                on_ready();
            } else {
                gloo::console::warn!("backend unreachable");
                set_status.set(SplashStatus::Failed);
            }
        });
    };

    start(true);
    let retry = start.clone();

    view! {
        <div class="splash">
            <div class="splash-logo">"🧾"</div>
            <h1>"نظام معالجة الإيصالات"</h1>
            {move || match status.get() {
                SplashStatus::Branding => view! {
                    <p class="text-muted">"جاري التحميل..."</p>
                }.into_any(),
                SplashStatus::Checking(attempt) => view! {
                    <p class="text-muted">
                        {format!("جاري الاتصال بالخادم... ({}/{})", attempt, HEALTH_ATTEMPTS)}
                    </p>
                }.into_any(),
                SplashStatus::Failed => {
                    let retry = retry.clone();
                    view! {
                        <div class="splash-error">
                            <p>{messages::backend_unreachable()}</p>
                            <button class="btn btn-primary" on:click=move |_| retry(false)>
                                "إعادة المحاولة"
                            </button>
                        </div>
                    }.into_any()
                }
            }}
        </div>
    }
}
