//! 受取人名の入力（候補表示・宛先口座に紐付いた名前への自動置換）

use crate::api::WebClient;
use crate::components::extraction_form::ConfidenceBadge;
use crate::timer::sleep_unless_cancelled;
use gloo::timers::callback::Timeout;
use leptos::prelude::*;
use leptos::task::spawn_local;
use receipt_review_common::debounce::{AUTOCOMPLETE_DEBOUNCE_MS, AUTO_REPLACE_DEBOUNCE_MS, BLUR_CLOSE_MS};
use receipt_review_common::fields::{self, should_highlight};
use receipt_review_common::linkage::{is_linked, KeyOutcome, ReceiverLinkage, SuggestionKey};
use receipt_review_common::FieldName;
use web_sys::KeyboardEvent;

#[component]
pub fn ReceiverInput<F>(
    client: WebClient,
    /// 表示中の項目ID（切り替わったら状態をリセット）
    #[prop(into)]
    item_id: Signal<Option<u64>>,
    #[prop(into)] value: Signal<String>,
    #[prop(into)] to_account: Signal<String>,
    #[prop(into)] confidence: Signal<Option<f64>>,
    #[prop(into)] needs_review: Signal<bool>,
    on_change: F,
) -> impl IntoView
where
    F: Fn(String) + Clone + Send + Sync + 'static,
{
    let linkage = RwSignal::new(ReceiverLinkage::new());
    // 破棄（置き換え）でタイマーも止まる
    let blur_timer = StoredValue::new_local(None::<Timeout>);
    let definition = fields::definition(FieldName::ReceiverName);

    {
        let client = client.clone();
        let on_change = on_change.clone();
        Effect::new(move |shown: Option<Option<u64>>| {
            let id = item_id.get();
            if shown != Some(id) {
                linkage.update(|l| l.reset());
            }

            let value = value.get();
            let to_account = to_account.get();
            let timers = linkage.with_untracked(|l| l.on_inputs_changed());

            // 候補検索
            {
                let client = client.clone();
                let (value, to_account) = (value.clone(), to_account.clone());
                let ticket = timers.autocomplete;
                spawn_local(async move {
                    if !sleep_unless_cancelled(&ticket, AUTOCOMPLETE_DEBOUNCE_MS).await {
                        return;
                    }
                    let Some(query) = linkage.try_update(|l| l.autocomplete_query(&value)).flatten() else {
                        return;
                    };
                    let account = Some(to_account.as_str()).filter(|a| !a.trim().is_empty());
                    let results = client.search_receivers(&query, account).await;
                    if ticket.is_cancelled() {
                        return;
                    }
                    match results {
                        Ok(results) => linkage.update(|l| l.apply_suggestions(results)),
                        Err(e) => {
                            gloo::console::warn!(format!("receiver search failed: {}", e));
                            linkage.update(|l| l.fail_suggestions());
                        }
                    }
                });
            }

            // 紐付け名への自動置換
            {
                let client = client.clone();
                let on_change = on_change.clone();
                let ticket = timers.auto_replace;
                spawn_local(async move {
                    if !sleep_unless_cancelled(&ticket, AUTO_REPLACE_DEBOUNCE_MS).await
                        || !linkage.with_untracked(|l| l.wants_auto_replace(&value, &to_account))
                    {
                        return;
                    }
                    let results = match client.search_receivers(&value, Some(&to_account)).await {
                        Ok(results) => results,
                        Err(e) => {
                            gloo::console::warn!(format!("auto-replace check failed: {}", e));
                            return;
                        }
                    };
                    if ticket.is_cancelled() {
                        return;
                    }
                    let replacement = linkage
                        .with_untracked(|l| l.auto_replace_candidate(&value, &to_account, &results));
                    if let Some(name) = replacement {
                        linkage.update(|l| l.mark_auto_replaced());
                        on_change(name);
                    }
                });
            }

            id
        });
    }

    on_cleanup(move || {
        linkage.try_with_untracked(|l| l.cancel_timers());
        blur_timer.try_update_value(|t| *t = None);
    });

    let on_input = {
        let on_change = on_change.clone();
        move |ev| {
            linkage.update(|l| l.on_user_typed());
            on_change(event_target_value(&ev));
        }
    };

    let on_keydown = {
        let on_change = on_change.clone();
        move |ev: KeyboardEvent| {
            let key = SuggestionKey::from_key(&ev.key());
            match linkage.try_update(|l| l.on_key(key)) {
                Some(KeyOutcome::Moved) => ev.prevent_default(),
                Some(KeyOutcome::Picked(name)) => {
                    ev.prevent_default();
                    on_change(name);
                }
                _ => {}
            }
        }
    };

    let on_focus = move |_| {
        blur_timer.set_value(None);
        linkage.update(|l| l.reopen());
    };

    let on_blur = move |_| {
        let close = Timeout::new(BLUR_CLOSE_MS, move || {
            linkage.try_update(|l| l.close());
        });
        blur_timer.set_value(Some(close));
    };

    let highlight = move || should_highlight(FieldName::ReceiverName, needs_review.get(), confidence.get());

    view! {
        <div class="field receiver-field" class:highlight=highlight>
            <label class="field-label">
                <span>{definition.icon}" "{definition.label}</span>
                <Show when=move || definition.show_confidence>
                    <ConfidenceBadge confidence=confidence />
                </Show>
                <Show when=move || linkage.with(|l| l.shows_auto_replaced())>
                    <span class="badge badge-linked">"⚡ اسم محفوظ"</span>
                </Show>
            </label>
            <div class="autocomplete">
                <input
                    type="text"
                    dir=definition.dir.as_str()
                    placeholder="ابحث أو أدخل الاسم..."
                    autocomplete="off"
                    prop:value=move || value.get()
                    on:input=on_input
                    on:keydown=on_keydown
                    on:focus=on_focus
                    on:blur=on_blur
                />
                <Show when=move || linkage.with(|l| l.is_loading())>
                    <span class="spinner-inline"></span>
                </Show>
                <Show when=move || linkage.with(|l| l.is_open())>
                    <ul class="suggestions">
                        {let on_change = on_change.clone(); move || {
                            let account = to_account.get();
                            let selected = linkage.with(|l| l.selected());
                            linkage
                                .with(|l| l.suggestions().to_vec())
                                .into_iter()
                                .enumerate()
                                .map(|(index, suggestion)| {
                                    let on_change = on_change.clone();
                                    let linked = is_linked(&suggestion, &account);
                                    view! {
                                        <li
                                            class="suggestion"
                                            class:selected=selected == Some(index)
                                            class:linked=linked
                                            on:mousedown=move |ev| {
                                                ev.prevent_default();
                                                if let Some(name) = linkage.try_update(|l| l.pick(index)).flatten() {
                                                    on_change(name);
                                                }
                                            }
                                        >
                                            <span class="suggestion-value">{suggestion.value.clone()}</span>
                                            <span class="suggestion-meta">
                                                {linked.then(|| view! { <span class="badge badge-linked">"🔗"</span> })}
                                                {suggestion.verified.then(|| view! { <span class="badge badge-verified">"✓"</span> })}
                                                {format!("{} مرة", suggestion.frequency)}
                                            </span>
                                        </li>
                                    }
                                })
                                .collect_view()
                        }}
                    </ul>
                </Show>
            </div>
        </div>
    }
}
