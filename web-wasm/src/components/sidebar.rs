//! サイドバー（ページ切り替え）

use crate::state::Page;
use leptos::prelude::*;

#[component]
pub fn Sidebar(page: RwSignal<Page>) -> impl IntoView {
    let (collapsed, set_collapsed) = signal(false);

    view! {
        <aside class=move || if collapsed.get() { "sidebar collapsed" } else { "sidebar" }>
            <div class="sidebar-header">
                <Show when=move || !collapsed.get()>
                    <h1>"نظام الإشعارات"</h1>
                </Show>
                <button
                    class="sidebar-toggle"
                    on:click=move |_| set_collapsed.update(|c| *c = !*c)
                >
                    {move || if collapsed.get() { "☰" } else { "✕" }}
                </button>
            </div>

            <nav class="sidebar-nav">
                {Page::ALL
                    .into_iter()
                    .map(|item| {
                        view! {
                            <button
                                class="sidebar-item"
                                class:active=move || page.get() == item
                                title=item.label()
                                on:click=move |_| page.set(item)
                            >
                                <span class="sidebar-icon">{item.icon()}</span>
                                <Show when=move || !collapsed.get()>
                                    <span>{item.label()}</span>
                                </Show>
                            </button>
                        }
                    })
                    .collect_view()}
            </nav>
        </aside>
    }
}
