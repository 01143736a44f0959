//! 通知バー（成功・情報は一定時間で自動的に消える）

use crate::state::ReviewHandle;
use gloo::timers::callback::Timeout;
use leptos::prelude::*;
use receipt_review_common::notify::AUTO_DISMISS_MS;
use receipt_review_common::{Notification, NotificationKind, StoreHandle};
use std::collections::HashMap;

fn icon(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Success => "✓",
        NotificationKind::Error => "✕",
        NotificationKind::Warning => "⚠",
        NotificationKind::Info => "ℹ",
    }
}

#[component]
pub fn NotificationBar(store: ReviewHandle) -> impl IntoView {
    let notifications = Memo::new(move |_| store.with(|s| s.notifications.items().to_vec()));
    // 通知IDごとの自動消去タイマー（手放すと取り消される）
    let timers = StoredValue::new_local(HashMap::<u64, Timeout>::new());

    // 新しく出た通知ごとに1回だけタイマーを予約し、消えた通知のタイマーは手放す
    Effect::new(move |_| {
        let current = notifications.get();
        timers.try_update_value(|timers| {
            timers.retain(|id, _| current.iter().any(|n| n.id == *id));
            for notification in current.iter().filter(|n| n.kind.auto_dismisses()) {
                let id = notification.id;
                timers.entry(id).or_insert_with(|| {
                    Timeout::new(AUTO_DISMISS_MS, move || {
                        store.update(|s| s.dismiss(id));
                    })
                });
            }
        });
    });

    on_cleanup(move || {
        timers.try_update_value(|timers| timers.clear());
    });

    view! {
        <div class="notifications">
            <For
                each=move || notifications.get()
                key=|n: &Notification| n.id
                children=move |n: Notification| {
                    let id = n.id;
                    view! {
                        <div class=format!("notification notification-{}", n.kind.as_str())>
                            <span class="notification-icon">{icon(n.kind)}</span>
                            <span class="notification-message">{n.message.clone()}</span>
                            {n.dismissible.then(|| view! {
                                <button
                                    class="notification-close"
                                    on:click=move |_| {
                                        store.update(|s| s.dismiss(id));
                                    }
                                >
                                    "×"
                                </button>
                            })}
                        </div>
                    }
                }
            />
        </div>
    }
}
