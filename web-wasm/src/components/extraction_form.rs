//! 抽出結果の確認・修正フォーム

use crate::api::WebClient;
use crate::components::receiver_input::ReceiverInput;
use crate::state::ReviewHandle;
use leptos::prelude::*;
use receipt_review_common::fields::{
    self, confidence_percent, is_converted_date, should_highlight, ConfidenceLevel, FieldDefinition,
};
use receipt_review_common::types::Issue;
use receipt_review_common::{FieldName, FieldValue};

/// 信頼度バッジ
#[component]
pub fn ConfidenceBadge(#[prop(into)] confidence: Signal<Option<f64>>) -> impl IntoView {
    move || {
        confidence.get().map(|c| {
            view! {
                <span class=format!("badge confidence-{}", ConfidenceLevel::from_score(c).as_str())>
                    {format!("{}%", confidence_percent(c))}
                </span>
            }
        })
    }
}

fn current_field(store: ReviewHandle, name: FieldName) -> Option<FieldValue> {
    store.with(|s| {
        s.queue
            .current()
            .and_then(|i| i.extracted_data.as_ref())
            .and_then(|d| d.get(name))
            .cloned()
    })
}

/// 1フィールド分の入力欄
#[component]
fn FieldInput<F>(store: ReviewHandle, definition: &'static FieldDefinition, on_change: F) -> impl IntoView
where
    F: Fn(FieldName, String) + Clone + Send + Sync + 'static,
{
    let name = definition.name;
    let field = Memo::new(move |_| current_field(store, name));
    let value = move || field.with(|f| f.as_ref().map(|f| f.value.clone()).unwrap_or_default());
    let confidence = Signal::derive(move || field.with(|f| f.as_ref().and_then(|f| f.confidence)));
    let highlight = move || {
        field.with(|f| {
            f.as_ref()
                .map(|f| should_highlight(name, f.needs_review, f.confidence))
                .unwrap_or(false)
        })
    };

    view! {
        <div class="field" class:highlight=highlight>
            <label class="field-label">
                <span>{definition.icon}" "{definition.label}</span>
                <Show when=move || definition.show_confidence>
                    <ConfidenceBadge confidence=confidence />
                </Show>
                <Show when=move || is_converted_date(name, &value())>
                    <span class="badge badge-converted">"تم التحويل تلقائياً"</span>
                </Show>
            </label>
            <input
                type="text"
                dir=definition.dir.as_str()
                class:align-right=definition.align_right
                prop:value=value
                on:input=move |ev| on_change(name, event_target_value(&ev))
            />
        </div>
    }
}

#[component]
pub fn ExtractionForm<F, C, K>(
    store: ReviewHandle,
    client: WebClient,
    on_field_change: F,
    on_confirm: C,
    on_skip: K,
) -> impl IntoView
where
    F: Fn(FieldName, String) + Clone + Send + Sync + 'static,
    C: Fn() + Clone + Send + Sync + 'static,
    K: Fn() + Clone + Send + Sync + 'static,
{
    let item_id = Memo::new(move |_| store.with(|s| s.queue.current().map(|i| i.id)));
    // 表示の切り替えは処理状態が変わったときだけ
    let body_state = Memo::new(move |_| {
        store.with(|s| s.queue.current().map(|i| (i.processed, i.error.clone())))
    });
    let processed = move || body_state.with(|b| matches!(b, Some((true, _))));
    let needs_review = move || store.with(|s| s.queue.current().map(|i| i.needs_review).unwrap_or(false));
    let overall = move || store.with(|s| s.queue.current().and_then(|i| i.confidence));
    let is_duplicate = move || store.with(|s| s.queue.current().map(|i| i.is_duplicate).unwrap_or(false));
    let saving = move || store.with(|s| s.saving());
    let can_confirm = move || store.with(|s| s.queue.can_confirm(s.queue.current_index(), s.saving()));

    let issues = Memo::new(move |_| -> (Vec<Issue>, Vec<Issue>) {
        store.with(|s| {
            s.queue
                .current()
                .map(|i| i.issues.iter().cloned().partition(|issue| issue.is_critical()))
                .unwrap_or_default()
        })
    });

    let receiver = Memo::new(move |_| current_field(store, FieldName::ReceiverName).unwrap_or_default());
    let receiver_value = Memo::new(move |_| receiver.with(|f| f.value.clone()));
    let receiver_confidence = Memo::new(move |_| receiver.with(|f| f.confidence));
    let receiver_needs_review = Memo::new(move |_| receiver.with(|f| f.needs_review));
    let to_account = Memo::new(move |_| {
        current_field(store, FieldName::ToAccount)
            .map(|f| f.value)
            .unwrap_or_default()
    });

    let (compact, regular): (Vec<_>, Vec<_>) = fields::definitions().iter().partition(|d| d.compact);

    let form_fields = {
        let on_field_change = on_field_change.clone();
        let client = client.clone();
        move || {
            let compact_view = compact
                .iter()
                .map(|definition| {
                    view! { <FieldInput store=store definition=*definition on_change=on_field_change.clone() /> }
                })
                .collect_view();

            let regular_view = regular
                .iter()
                .map(|definition| {
                    if definition.autocomplete {
                        let on_field_change = on_field_change.clone();
                        view! {
                            <ReceiverInput
                                client=client.clone()
                                item_id=item_id
                                value=receiver_value
                                to_account=to_account
                                confidence=receiver_confidence
                                needs_review=receiver_needs_review
                                on_change=move |value| on_field_change(FieldName::ReceiverName, value)
                            />
                        }
                        .into_any()
                    } else {
                        view! { <FieldInput store=store definition=*definition on_change=on_field_change.clone() /> }
                            .into_any()
                    }
                })
                .collect_view();

            view! {
                <div class="fields-compact">{compact_view}</div>
                {regular_view}
            }
        }
    };

    view! {
        <div class="form">
            <div class="form-header">
                <h3>"البيانات المستخرجة"</h3>
                <Show when=processed>
                    <span class=move || if needs_review() { "badge badge-warning" } else { "badge badge-success" }>
                        {move || if needs_review() { "يحتاج مراجعة" } else { "جاهز للحفظ" }}
                    </span>
                    {move || overall().map(|c| view! {
                        <span class="overall-confidence">{format!("الدقة: {}%", confidence_percent(c))}</span>
                    })}
                </Show>
                <Show when=is_duplicate>
                    <span class="badge badge-duplicate">"مكرر"</span>
                </Show>
            </div>

            {move || {
                let (critical, warnings) = issues.get();
                // 重大な問題がある間は警告を出さない
                let shown = if critical.is_empty() { warnings } else { Vec::new() };
                view! {
                    {(!critical.is_empty()).then(|| view! {
                        <div class="issues issues-critical">
                            {critical.iter().map(|i| view! { <div>"• "{i.message.clone()}</div> }).collect_view()}
                        </div>
                    })}
                    {(!shown.is_empty()).then(|| view! {
                        <div class="issues issues-warning">
                            {shown.iter().map(|i| view! { <div>"• "{i.message.clone()}</div> }).collect_view()}
                        </div>
                    })}
                }
            }}

            <div class="form-body">
                {move || match body_state.get() {
                    None => ().into_any(),
                    Some((false, _)) => view! {
                        <div class="form-pending">
                            <span class="spinner-inline"></span>
                            <p>"جاري استخراج البيانات..."</p>
                        </div>
                    }.into_any(),
                    Some((true, Some(message))) => view! {
                        <div class="form-error">
                            <p>"فشلت معالجة الإشعار"</p>
                            <p class="text-muted">{message}</p>
                        </div>
                    }.into_any(),
                    Some((true, None)) => form_fields().into_any(),
                }}
            </div>

            <div class="form-actions">
                <button class="btn btn-outline" on:click=move |_| on_skip()>
                    "⏭ تخطي"
                </button>
                <button
                    class="btn btn-primary"
                    disabled=move || !can_confirm()
                    on:click=move |_| on_confirm()
                >
                    {move || if saving() { "جاري الحفظ..." } else { "تأكيد وحفظ" }}
                </button>
            </div>
        </div>
    }
}
