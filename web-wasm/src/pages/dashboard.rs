//! ダッシュボード（登録済み口座・保存済みレシートのアーカイブ）

use crate::api::{download_url, revoke_url, WebClient};
use leptos::prelude::*;
use leptos::task::spawn_local;
use receipt_review_common::notify::messages;
use receipt_review_common::types::{KnownAccount, Transaction, TransactionFilters};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Home,
    Accounts,
    Archive,
}

fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}

#[component]
pub fn DashboardPage(client: WebClient) -> impl IntoView {
    let (section, set_section) = signal(Section::Home);

    view! {
        <div class="page dashboard-page">
            {move || match section.get() {
                Section::Home => view! {
                    <div class="page-header">
                        <h2>"لوحة التحكم"</h2>
                        <p class="text-muted">"إدارة وتكوين النظام"</p>
                    </div>
                    <div class="cards">
                        <div class="card">
                            <h3>"👥 الحسابات المعروفة"</h3>
                            <p class="text-muted">"إدارة الحسابات للإكمال التلقائي"</p>
                            <button class="btn btn-primary" on:click=move |_| set_section.set(Section::Accounts)>"فتح"</button>
                        </div>
                        <div class="card">
                            <h3>"🗄 أرشيف الإيصالات"</h3>
                            <p class="text-muted">"عرض صور الإيصالات المحفوظة"</p>
                            <button class="btn btn-primary" on:click=move |_| set_section.set(Section::Archive)>"فتح"</button>
                        </div>
                    </div>
                }.into_any(),
                other => {
                    let client = client.clone();
                    view! {
                        <button class="btn-link" on:click=move |_| set_section.set(Section::Home)>
                            "→ العودة إلى لوحة التحكم"
                        </button>
                        {match other {
                            Section::Accounts => view! { <KnownAccounts client=client /> }.into_any(),
                            _ => view! { <Archive client=client /> }.into_any(),
                        }}
                    }.into_any()
                }
            }}
        </div>
    }
}

/// 登録済み口座の管理
#[component]
fn KnownAccounts(client: WebClient) -> impl IntoView {
    let accounts = RwSignal::new(Vec::<KnownAccount>::new());
    let (loading, set_loading) = signal(true);
    let (saving, set_saving) = signal(false);
    let (error, set_error) = signal(None::<String>);
    let (success, set_success) = signal(None::<String>);
    let (show_form, set_show_form) = signal(false);
    let (number, set_number) = signal(String::new());
    let (name, set_name) = signal(String::new());

    let load = {
        let client = client.clone();
        move || {
            let client = client.clone();
            spawn_local(async move {
                set_loading.set(true);
                set_error.set(None);
                match client.known_accounts().await {
                    Ok(list) => accounts.set(list),
                    Err(e) => {
                        gloo::console::error!(format!("failed to load accounts: {}", e));
                        set_error.set(Some("فشل تحميل الحسابات".to_string()));
                    }
                }
                set_loading.set(false);
            });
        }
    };
    load();

    let add = {
        let client = client.clone();
        let load = load.clone();
        move |_: leptos::ev::MouseEvent| {
            let account = KnownAccount {
                account_number: number.get_untracked().trim().to_string(),
                owner_name: name.get_untracked().trim().to_string(),
            };
            if account.account_number.is_empty() || account.owner_name.is_empty() {
                set_error.set(Some("يرجى ملء جميع الحقول".to_string()));
                return;
            }
            let client = client.clone();
            let load = load.clone();
            set_saving.set(true);
            set_error.set(None);
            spawn_local(async move {
                match client.add_account(&account).await {
                    Ok(_) => {
                        set_success.set(Some("تم إضافة الحساب بنجاح".to_string()));
                        set_number.set(String::new());
                        set_name.set(String::new());
                        set_show_form.set(false);
                        load();
                    }
                    Err(e) => {
                        gloo::console::error!(format!("failed to add account: {}", e));
                        set_error.set(Some("فشل إضافة الحساب".to_string()));
                    }
                }
                set_saving.set(false);
            });
        }
    };

    let remove = move |account_number: String| {
        if !confirm("هل أنت متأكد من حذف هذا الحساب؟") {
            return;
        }
        let client = client.clone();
        let load = load.clone();
        spawn_local(async move {
            set_error.set(None);
            match client.delete_account(&account_number).await {
                Ok(_) => {
                    set_success.set(Some("تم حذف الحساب بنجاح".to_string()));
                    load();
                }
                Err(e) => {
                    gloo::console::error!(format!("failed to delete account: {}", e));
                    set_error.set(Some("فشل حذف الحساب".to_string()));
                }
            }
        });
    };

    view! {
        <div class="panel">
            <div class="panel-header">
                <h3>{move || format!("الحسابات المعروفة ({})", accounts.with(|a| a.len()))}</h3>
                <button class="btn btn-primary" on:click=move |_| set_show_form.update(|s| *s = !*s)>
                    {move || if show_form.get() { "إلغاء" } else { "➕ إضافة حساب" }}
                </button>
            </div>

            <Show when=move || error.with(|e| e.is_some())>
                <div class="alert alert-error">{move || error.get().unwrap_or_default()}</div>
            </Show>
            <Show when=move || success.with(|s| s.is_some())>
                <div class="alert alert-success">{move || success.get().unwrap_or_default()}</div>
            </Show>

            <Show when=move || show_form.get()>
                <div class="account-form">
                    <input
                        type="text"
                        dir="ltr"
                        placeholder="أدخل رقم الحساب"
                        prop:value=move || number.get()
                        on:input=move |ev| set_number.set(event_target_value(&ev))
                    />
                    <input
                        type="text"
                        placeholder="أدخل اسم صاحب الحساب"
                        prop:value=move || name.get()
                        on:input=move |ev| set_name.set(event_target_value(&ev))
                    />
                    <button class="btn btn-primary" disabled=move || saving.get() on:click=add.clone()>
                        {move || if saving.get() { "جاري الحفظ..." } else { "حفظ الحساب" }}
                    </button>
                </div>
            </Show>

            {move || {
                if loading.get() {
                    return view! { <p class="text-muted">"جاري التحميل..."</p> }.into_any();
                }
                let list = accounts.get();
                if list.is_empty() {
                    return view! {
                        <div class="empty">
                            <p>"لا توجد حسابات محفوظة"</p>
                            <p class="text-muted">"ابدأ بإضافة حساب جديد"</p>
                        </div>
                    }
                    .into_any();
                }
                view! {
                    <ul class="account-list">
                        {list
                            .into_iter()
                            .map(|account| {
                                let remove = remove.clone();
                                let number = account.account_number.clone();
                                view! {
                                    <li class="account-item">
                                        <span class="account-number" dir="ltr">{account.account_number.clone()}</span>
                                        <span class="account-owner">{account.owner_name.clone()}</span>
                                        <button class="btn-link danger" on:click=move |_| remove(number.clone())>
                                            "حذف"
                                        </button>
                                    </li>
                                }
                            })
                            .collect_view()}
                    </ul>
                }
                .into_any()
            }}
        </div>
    }
}

/// 保存済みレシートの一覧と画像表示
#[component]
fn Archive(client: WebClient) -> impl IntoView {
    let transactions = RwSignal::new(Vec::<Transaction>::new());
    let (loading, set_loading) = signal(true);
    let (error, set_error) = signal(None::<String>);
    let (query, set_query) = signal(String::new());
    // (取引番号, Object URL)
    let viewer = RwSignal::new(None::<(String, String)>);

    let load = {
        let client = client.clone();
        move || {
            let client = client.clone();
            spawn_local(async move {
                set_loading.set(true);
                set_error.set(None);
                match client.transactions(&TransactionFilters::default()).await {
                    Ok(page) => transactions.set(page.transactions),
                    Err(e) => {
                        gloo::console::error!(format!("failed to load archive: {}", e));
                        set_error.set(Some(messages::load_failed()));
                    }
                }
                set_loading.set(false);
            });
        }
    };
    load();

    let close_viewer = move || {
        if let Some((_, url)) = viewer.get_untracked() {
            revoke_url(&url);
        }
        viewer.set(None);
    };

    let view_receipt = {
        let client = client.clone();
        move |transaction_id: String| {
            let client = client.clone();
            spawn_local(async move {
                match client.archive_url(&transaction_id).await {
                    Ok(url) => {
                        close_viewer();
                        viewer.set(Some((transaction_id, url)));
                    }
                    Err(e) => {
                        gloo::console::error!(format!("failed to load image {}: {}", transaction_id, e));
                        set_error.set(Some("فشل التحميل".to_string()));
                    }
                }
            });
        }
    };

    let download = {
        let client = client.clone();
        move |transaction_id: String| {
            let client = client.clone();
            spawn_local(async move {
                let result = match client.archive_url(&transaction_id).await {
                    Ok(url) => download_url(&url, &format!("{}.jpg", transaction_id)),
                    Err(e) => Err(e),
                };
                if let Err(e) = result {
                    gloo::console::error!(format!("download failed: {}", e));
                    set_error.set(Some("فشل التحميل".to_string()));
                }
            });
        }
    };

    let remove = {
        let client = client.clone();
        let load = load.clone();
        move |receipt_id: String, transaction_id: String| {
            let prompt = format!(
                "هل أنت متأكد من حذف الإيصال {}؟\nسيتم حذف الصورة المؤرشفة أيضاً.",
                transaction_id
            );
            if !confirm(&prompt) {
                return;
            }
            let client = client.clone();
            let load = load.clone();
            spawn_local(async move {
                match client.delete_receipt(&receipt_id).await {
                    Ok(_) => load(),
                    Err(e) => {
                        gloo::console::error!(format!("failed to delete receipt: {}", e));
                        set_error.set(Some(messages::or_fallback(&e.message(), messages::load_failed())));
                    }
                }
            });
        }
    };

    on_cleanup(move || {
        if let Some((_, url)) = viewer.try_get_untracked().flatten() {
            revoke_url(&url);
        }
    });

    let filtered = move || {
        let q = query.get();
        transactions.with(|list| list.iter().filter(|t| t.matches_text(&q)).cloned().collect::<Vec<_>>())
    };

    view! {
        <div class="panel">
            <div class="panel-header">
                <h3>"أرشيف الإيصالات"</h3>
                <button class="btn btn-outline" on:click={
                    let load = load.clone();
                    move |_| load()
                }>
                    "تحديث"
                </button>
            </div>
            <input
                type="text"
                class="archive-search"
                placeholder="ابحث برقم المعاملة، اسم المستلم، رقم الحساب، أو التعليق..."
                prop:value=move || query.get()
                on:input=move |ev| set_query.set(event_target_value(&ev))
            />

            <Show when=move || error.with(|e| e.is_some())>
                <div class="alert alert-error">{move || error.get().unwrap_or_default()}</div>
            </Show>

            {move || {
                if loading.get() {
                    return view! { <p class="text-muted">"جاري تحميل الأرشيف..."</p> }.into_any();
                }
                let rows = filtered();
                if rows.is_empty() {
                    return view! {
                        <div class="empty">
                            <p>"لا توجد إيصالات مؤرشفة"</p>
                            <p class="text-muted">"الإيصالات المحفوظة ستظهر هنا"</p>
                        </div>
                    }
                    .into_any();
                }
                view! {
                    <div class="archive-grid">
                        {rows
                            .into_iter()
                            .map(|tx| {
                                let transaction_id = tx.field("transaction_id");
                                let has_archive = tx.has_archive();
                                let (view_receipt, download, remove) = (view_receipt.clone(), download.clone(), remove.clone());
                                let (for_view, for_download, for_remove) =
                                    (transaction_id.clone(), transaction_id.clone(), transaction_id.clone());
                                let receipt_id = tx.id_text();
                                view! {
                                    <div class="archive-card">
                                        <p class="strong" dir="ltr">{transaction_id.clone()}</p>
                                        <p>{tx.field("receiver_name")}</p>
                                        <p dir="ltr">{tx.field("amount")}</p>
                                        <p class="text-muted" dir="ltr">
                                            {tx.created_at.clone().unwrap_or_else(|| tx.field("datetime"))}
                                        </p>
                                        <div class="archive-actions">
                                            {if has_archive {
                                                view! {
                                                    <button class="btn-link" on:click=move |_| view_receipt(for_view.clone())>
                                                        "انقر للعرض"
                                                    </button>
                                                    <button class="btn-link" on:click=move |_| download(for_download.clone())>
                                                        "تحميل"
                                                    </button>
                                                }
                                                .into_any()
                                            } else {
                                                view! { <span class="text-muted">"بدون صورة"</span> }.into_any()
                                            }}
                                            <button
                                                class="btn-link danger"
                                                on:click=move |_| remove(receipt_id.clone(), for_remove.clone())
                                            >
                                                "حذف"
                                            </button>
                                        </div>
                                    </div>
                                }
                            })
                            .collect_view()}
                    </div>
                }
                .into_any()
            }}

            {move || {
                viewer.get().map(|(transaction_id, url)| {
                    view! {
                        <div class="modal" on:click=move |_| close_viewer()>
                            <div class="modal-body">
                                <p class="strong" dir="ltr">{transaction_id}</p>
                                <img src=url alt="receipt" />
                            </div>
                        </div>
                    }
                })
            }}
        </div>
    }
}
