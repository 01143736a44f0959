//! 検索ページ（フィルタ・並べ替え・エクスポート）

use crate::api::{download_url, WebClient};
use crate::timer::sleep_unless_cancelled;
use gloo::timers::callback::Timeout;
use leptos::prelude::*;
use leptos::task::spawn_local;
use receipt_review_common::debounce::{Debouncer, BLUR_CLOSE_MS, SEARCH_DEBOUNCE_MS};
use receipt_review_common::linkage::MIN_QUERY_CHARS;
use receipt_review_common::notify::messages;
use receipt_review_common::types::{
    sort_transactions, AccountSuggestion, ExportFormat, TransactionFilters, TransactionPage,
};

/// 結果表の列（キー, 見出し, 文字方向）
const COLUMNS: [(&str, &str, &str); 8] = [
    ("id", "#", "ltr"),
    ("transaction_id", "رقم العملية", "ltr"),
    ("datetime", "التاريخ والوقت", "ltr"),
    ("from_account", "من حساب", "ltr"),
    ("to_account", "إلى حساب", "ltr"),
    ("receiver_name", "اسم المستلم", "rtl"),
    ("comment", "التعليق", "rtl"),
    ("amount", "المبلغ", "ltr"),
];

/// 今日の日付（YYYY-MM-DD）
fn today() -> String {
    let iso: String = js_sys::Date::new_0().to_iso_string().into();
    iso.chars().take(10).collect()
}

/// 口座番号の候補付き入力
#[component]
fn AccountInput(
    client: WebClient,
    label: &'static str,
    field: &'static str,
    filters: RwSignal<TransactionFilters>,
) -> impl IntoView {
    let suggestions = RwSignal::new(Vec::<AccountSuggestion>::new());
    let (open, set_open) = signal(false);
    let (loading, set_loading) = signal(false);
    let lookup = Debouncer::new();
    let blur_timer = StoredValue::new_local(None::<Timeout>);

    let value = move || filters.with(|f| f.get(field).to_string());

    let on_input = {
        let lookup = lookup.clone();
        move |ev| {
            let text = event_target_value(&ev);
            filters.update(|f| f.set(field, text.clone()));

            let ticket = lookup.schedule();
            if text.trim().chars().count() < MIN_QUERY_CHARS {
                suggestions.set(Vec::new());
                set_open.set(false);
                return;
            }
            let client = client.clone();
            set_loading.set(true);
            spawn_local(async move {
                let results = client.search_accounts(text.trim()).await;
                if ticket.is_cancelled() {
                    return;
                }
                set_loading.set(false);
                match results {
                    Ok(results) => {
                        set_open.set(!results.is_empty());
                        suggestions.set(results);
                    }
                    Err(e) => gloo::console::warn!(format!("account search failed: {}", e)),
                }
            });
        }
    };

    let on_blur = move |_| {
        let close = Timeout::new(BLUR_CLOSE_MS, move || {
            set_open.try_set(false);
        });
        blur_timer.set_value(Some(close));
    };

    on_cleanup(move || {
        lookup.cancel();
        blur_timer.try_update_value(|t| *t = None);
    });

    view! {
        <div class="filter autocomplete">
            <label>{label}</label>
            <input
                type="text"
                dir="ltr"
                placeholder="رقم الحساب"
                autocomplete="off"
                prop:value=value
                on:input=on_input
                on:focus=move |_| {
                    blur_timer.set_value(None);
                    if suggestions.with(|s| !s.is_empty()) {
                        set_open.set(true);
                    }
                }
                on:blur=on_blur
            />
            <Show when=move || loading.get()>
                <span class="spinner-inline"></span>
            </Show>
            <Show when=move || open.get()>
                <ul class="suggestions">
                    {move || {
                        suggestions
                            .get()
                            .into_iter()
                            .map(|s| {
                                let picked = s.value.clone();
                                view! {
                                    <li
                                        class="suggestion"
                                        on:mousedown=move |ev| {
                                            ev.prevent_default();
                                            filters.update(|f| f.set(field, picked.clone()));
                                            set_open.set(false);
                                        }
                                    >
                                        <span class="suggestion-value">
                                            {s.display_name.clone().unwrap_or_else(|| s.value.clone())}
                                        </span>
                                        <span class="suggestion-meta">{s.value.clone()}</span>
                                    </li>
                                }
                            })
                            .collect_view()
                    }}
                </ul>
            </Show>
        </div>
    }
}

/// 通常の入力欄
#[component]
fn FilterInput(
    label: &'static str,
    field: &'static str,
    filters: RwSignal<TransactionFilters>,
    #[prop(default = "text")] input_type: &'static str,
    #[prop(default = "ltr")] dir: &'static str,
    #[prop(optional)] placeholder: &'static str,
) -> impl IntoView {
    let value = move || filters.with(|f| f.get(field).to_string());

    view! {
        <div class="filter">
            <label>{label}</label>
            <input
                type=input_type
                dir=dir
                placeholder=placeholder
                prop:value=value
                on:input=move |ev| filters.update(|f| f.set(field, event_target_value(&ev)))
            />
        </div>
    }
}

#[component]
pub fn SearchPage(client: WebClient) -> impl IntoView {
    let filters = RwSignal::new(TransactionFilters::default());
    let page = RwSignal::new(TransactionPage::default());
    let (loading, set_loading) = signal(false);
    let (error, set_error) = signal(None::<String>);
    let (expanded, set_expanded) = signal(true);
    let (columns_open, set_columns_open) = signal(false);
    let (exporting, set_exporting) = signal(false);
    let sort = RwSignal::new(("id".to_string(), false));
    let selected_columns = RwSignal::new(COLUMNS.iter().map(|(k, _, _)| *k).collect::<Vec<&'static str>>());
    let search_timer = Debouncer::new();

    // フィルタ変更から一定時間後に検索
    {
        let client = client.clone();
        let search_timer = search_timer.clone();
        Effect::new(move |_| {
            let current = filters.get();
            let ticket = search_timer.schedule();
            let client = client.clone();
            spawn_local(async move {
                if !sleep_unless_cancelled(&ticket, SEARCH_DEBOUNCE_MS).await {
                    return;
                }
                set_loading.set(true);
                set_error.set(None);
                let result = client.transactions(&current).await;
                if ticket.is_cancelled() {
                    return;
                }
                set_loading.set(false);
                match result {
                    Ok(result) => page.set(result),
                    Err(e) => {
                        gloo::console::error!(format!("search failed: {}", e));
                        page.set(TransactionPage::default());
                        set_error.set(Some(messages::or_fallback(&e.message(), messages::load_failed())));
                    }
                }
            });
        });
    }

    {
        let search_timer = search_timer.clone();
        on_cleanup(move || search_timer.cancel());
    }

    let on_sort = move |column: &'static str| {
        sort.update(|(current, ascending)| {
            if current == column {
                *ascending = !*ascending;
            } else {
                *current = column.to_string();
                *ascending = true;
            }
        });
    };

    let toggle_column = move |column: &'static str| {
        selected_columns.update(|cols| {
            if let Some(pos) = cols.iter().position(|c| *c == column) {
                // 最低1列は残す
                if cols.len() > 1 {
                    cols.remove(pos);
                }
            } else {
                cols.push(column);
                cols.sort_by_key(|c| COLUMNS.iter().position(|(k, _, _)| k == c));
            }
        });
    };

    let export = {
        let client = client.clone();
        move |format: ExportFormat| {
            let client = client.clone();
            let current = filters.get_untracked();
            set_exporting.set(true);
            spawn_local(async move {
                let file_name = format!("transactions_{}.{}", today(), format.extension());
                let result = match client.export_url(&current, format).await {
                    Ok(url) => download_url(&url, &file_name),
                    Err(e) => Err(e),
                };
                if let Err(e) = result {
                    gloo::console::error!(format!("export failed: {}", e));
                    set_error.set(Some(messages::or_fallback(&e.message(), messages::load_failed())));
                }
                set_exporting.set(false);
            });
        }
    };
    let export_csv = export.clone();
    let export_json = export;

    let rows = move || {
        let (column, ascending) = sort.get();
        let mut transactions = page.with(|p| p.transactions.clone());
        sort_transactions(&mut transactions, &column, ascending);
        transactions
    };
    let visible_columns = move || {
        let selected = selected_columns.get();
        COLUMNS
            .iter()
            .filter(|(k, _, _)| selected.contains(k))
            .copied()
            .collect::<Vec<_>>()
    };

    view! {
        <div class="page search-page">
            <div class="page-header">
                <h2>"البحث والاستعلام"</h2>
                <div class="page-actions">
                    <button class="btn btn-outline" disabled=move || exporting.get() on:click=move |_| export_csv(ExportFormat::Csv)>
                        "⬇ CSV"
                    </button>
                    <button class="btn btn-outline" disabled=move || exporting.get() on:click=move |_| export_json(ExportFormat::Json)>
                        "⬇ JSON"
                    </button>
                </div>
            </div>

            <div class="panel">
                <button class="panel-header" on:click=move |_| set_expanded.update(|e| *e = !*e)>
                    <h3>"فلاتر البحث"</h3>
                    <Show when=move || filters.with(|f| !f.is_empty())>
                        <span class="badge badge-success">"نشط"</span>
                    </Show>
                    <span>{move || if expanded.get() { "▲" } else { "▼" }}</span>
                </button>
                <Show when=move || expanded.get()>
                    <div class="filters-grid">
                        <FilterInput label="رقم العملية" field="transaction_id" filters=filters placeholder="TRX123456" />
                        <AccountInput client=client.clone() label="من حساب" field="from_account" filters=filters />
                        <AccountInput client=client.clone() label="إلى حساب" field="to_account" filters=filters />
                        <FilterInput label="اسم المستلم" field="receiver_name" filters=filters dir="rtl" placeholder="ابحث بالاسم" />
                        <FilterInput label="من تاريخ" field="date_from" filters=filters input_type="date" />
                        <FilterInput label="إلى تاريخ" field="date_to" filters=filters input_type="date" />
                        <FilterInput label="أقل مبلغ" field="min_amount" filters=filters input_type="number" placeholder="0.00" />
                        <FilterInput label="أقصى مبلغ" field="max_amount" filters=filters input_type="number" placeholder="10000.00" />
                    </div>
                    <Show when=move || filters.with(|f| !f.is_empty())>
                        <button class="btn-link" on:click=move |_| filters.set(TransactionFilters::default())>
                            "مسح الفلاتر"
                        </button>
                    </Show>
                </Show>
            </div>

            <div class="cards">
                <div class="card">
                    <p class="text-muted">"إجمالي النتائج"</p>
                    <p class="card-value">{move || page.with(|p| p.total)}</p>
                </div>
                <div class="card">
                    <p class="text-muted">"المجموع الكلي"</p>
                    <p class="card-value">{move || format!("{:.2}", page.with(|p| p.total_amount()))}</p>
                </div>
            </div>

            <Show when=move || error.with(|e| e.is_some())>
                <div class="alert alert-error">{move || error.get().unwrap_or_default()}</div>
            </Show>

            <div class="panel">
                <div class="table-toolbar">
                    <button class="btn btn-outline" on:click=move |_| set_columns_open.update(|o| *o = !*o)>
                        {move || format!("الأعمدة ({})", selected_columns.with(|c| c.len()))}
                    </button>
                    <Show when=move || columns_open.get()>
                        <div class="column-selector">
                            {COLUMNS
                                .iter()
                                .map(|(key, label, _)| {
                                    let key = *key;
                                    view! {
                                        <label>
                                            <input
                                                type="checkbox"
                                                prop:checked=move || selected_columns.with(|c| c.contains(&key))
                                                on:change=move |_| toggle_column(key)
                                            />
                                            {*label}
                                        </label>
                                    }
                                })
                                .collect_view()}
                        </div>
                    </Show>
                    <Show when=move || loading.get()>
                        <span class="spinner-inline"></span>
                    </Show>
                </div>

                <table class="results">
                    <thead>
                        <tr>
                            {move || {
                                let (sorted, ascending) = sort.get();
                                visible_columns()
                                    .into_iter()
                                    .map(|(key, label, _)| {
                                        let arrow = if sorted == key {
                                            if ascending { "↑" } else { "↓" }
                                        } else {
                                            "↕"
                                        };
                                        view! {
                                            <th on:click=move |_| on_sort(key)>{label}" "{arrow}</th>
                                        }
                                    })
                                    .collect_view()
                            }}
                        </tr>
                    </thead>
                    <tbody>
                        {move || {
                            let columns = visible_columns();
                            let rows = rows();
                            if rows.is_empty() {
                                return view! {
                                    <tr><td class="empty" colspan=columns.len().to_string()>"لا توجد نتائج"</td></tr>
                                }
                                .into_any();
                            }
                            rows.into_iter()
                                .map(|tx| {
                                    let cells = columns
                                        .iter()
                                        .map(|(key, _, dir)| {
                                            let value = if *key == "id" { tx.id_text() } else { tx.field(key) };
                                            let value = if value.is_empty() { "-".to_string() } else { value };
                                            view! { <td dir=*dir>{value}</td> }
                                        })
                                        .collect_view();
                                    view! { <tr>{cells}</tr> }
                                })
                                .collect_view()
                                .into_any()
                        }}
                    </tbody>
                </table>
            </div>
        </div>
    }
}
