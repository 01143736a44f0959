//! メインアプリケーションコンポーネント

use crate::api::{revoke_url, WebClient};
use crate::components::{sidebar::Sidebar, splash::Splash};
use crate::pages::{dashboard::DashboardPage, processing::ProcessingPage, search::SearchPage};
use crate::state::{Page, ReviewHandle};
use leptos::prelude::*;
use receipt_review_common::StoreHandle;

/// メインアプリケーションコンポーネント
#[component]
pub fn App() -> impl IntoView {
    let client = WebClient::new();
    // ページを切り替えてもキューは残す
    let store = ReviewHandle::new();
    let page = RwSignal::new(Page::Processing);
    let (ready, set_ready) = signal(false);

    on_cleanup(move || {
        for url in store.update(|s| s.remove_all()).unwrap_or_default() {
            revoke_url(&url);
        }
    });

    let on_ready = move || {
        gloo::console::log!("backend ready");
        set_ready.set(true);
    };

    let splash_client = client.clone();

    view! {
        <Show
            when=move || ready.get()
            fallback=move || view! { <Splash client=splash_client.clone() on_ready=on_ready /> }
        >
            {
                let client = client.clone();
                view! {
                    <div class="app">
                        <Sidebar page=page />
                        <main class="content">
                            {move || match page.get() {
                                Page::Processing => view! {
                                    <ProcessingPage store=store client=client.clone() />
                                }.into_any(),
                                Page::Search => view! { <SearchPage client=client.clone() /> }.into_any(),
                                Page::Dashboard => view! { <DashboardPage client=client.clone() /> }.into_any(),
                            }}
                        </main>
                    </div>
                }
            }
        </Show>
    }
}
