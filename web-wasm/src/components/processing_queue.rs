//! 処理キューの一覧

use crate::state::ReviewHandle;
use leptos::prelude::*;
use receipt_review_common::fields::confidence_percent;
use receipt_review_common::QueueStatus;

/// 1行分の表示データ
#[derive(Clone, PartialEq)]
struct QueueRow {
    index: usize,
    name: String,
    status: QueueStatus,
    confidence: Option<u32>,
    current: bool,
}

#[component]
pub fn ProcessingQueue<S, R, A>(
    store: ReviewHandle,
    on_select: S,
    on_remove: R,
    on_remove_all: A,
) -> impl IntoView
where
    S: Fn(usize) + Clone + Send + Sync + 'static,
    R: Fn(usize) + Clone + Send + Sync + 'static,
    A: Fn() + Clone + Send + Sync + 'static,
{
    let rows = move || {
        store.with(|s| {
            let current = s.queue.current_index();
            s.queue
                .items()
                .iter()
                .enumerate()
                .map(|(index, item)| QueueRow {
                    index,
                    name: item.name.clone(),
                    status: item.status(),
                    confidence: item.confidence.map(confidence_percent),
                    current: index == current,
                })
                .collect::<Vec<_>>()
        })
    };
    let count = move || store.with(|s| s.queue.len());

    view! {
        <div class="queue">
            <div class="queue-header">
                <h3>{move || format!("قائمة الانتظار ({})", count())}</h3>
                <button class="btn-link danger" on:click=move |_| on_remove_all()>
                    "حذف الكل"
                </button>
            </div>
            <ul class="queue-list">
                {move || {
                    rows()
                        .into_iter()
                        .map(|row| {
                            let on_select = on_select.clone();
                            let on_remove = on_remove.clone();
                            let index = row.index;
                            view! {
                                <li
                                    class="queue-item"
                                    class:current=row.current
                                    on:click=move |_| on_select(index)
                                >
                                    <div class="queue-item-top">
                                        <span class="queue-name" title=row.name.clone()>{row.name.clone()}</span>
                                        <button
                                            class="queue-remove"
                                            title="حذف"
                                            on:click=move |ev| {
                                                ev.stop_propagation();
                                                on_remove(index);
                                            }
                                        >
                                            "×"
                                        </button>
                                    </div>
                                    <span class=format!("badge status-{}", row.status.as_str())>
                                        {row.status.label()}
                                    </span>
                                    {row.confidence.map(|percent| view! {
                                        <div class="confidence-bar">
                                            <div class="confidence-fill" style=format!("width: {}%", percent)></div>
                                        </div>
                                    })}
                                </li>
                            }
                        })
                        .collect_view()
                }}
            </ul>
        </div>
    }
}
