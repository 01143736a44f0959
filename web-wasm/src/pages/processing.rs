//! 処理ページ（アップロード → 抽出 → 確認 → 保存）

use crate::api::{revoke_url, WebClient};
use crate::components::{
    extraction_form::ExtractionForm, notification_bar::NotificationBar,
    processing_queue::ProcessingQueue, receipt_preview::ReceiptPreview, upload_zone::UploadZone,
};
use crate::state::ReviewHandle;
use gloo::timers::callback::Timeout;
use leptos::prelude::*;
use leptos::task::spawn_local;
use receipt_review_common::debounce::AUTO_ADVANCE_MS;
use receipt_review_common::{workflow, ConfirmOutcome, FieldName, NewFile, ReviewStore, StoreHandle};
use web_sys::{File, Url};

/// 画面の表示モード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Empty,
    Processing,
    Review,
}

/// キューに入れるファイル（プレビュー用のObject URLを作る）
fn new_files(files: Vec<File>) -> Vec<NewFile<File>> {
    files
        .into_iter()
        .map(|file| NewFile {
            name: file.name(),
            image_url: Url::create_object_url_with_blob(&file).unwrap_or_default(),
            upload: file,
        })
        .collect()
}

#[component]
pub fn ProcessingPage(store: ReviewHandle, client: WebClient) -> impl IntoView {
    // 保存後の自動移動（手放すと取り消される）
    let advance_timer = StoredValue::new_local(None::<Timeout>);

    let on_files_selected = {
        let client = client.clone();
        move |files: Vec<File>| {
            let files = new_files(files);
            gloo::console::log!(format!("{} file(s) selected", files.len()));
            let client = client.clone();
            spawn_local(async move {
                if workflow::process_intake(&store, &client, files).await.is_none() {
                    gloo::console::warn!("processing page was closed during extraction");
                }
            });
        }
    };

    let on_field_change = {
        let client = client.clone();
        move |field: FieldName, value: String| {
            let client = client.clone();
            spawn_local(async move {
                workflow::edit_field(&store, &client, field, &value).await;
            });
        }
    };

    let on_confirm = {
        let client = client.clone();
        move || {
            let client = client.clone();
            spawn_local(async move {
                match workflow::confirm_current(&store, &client).await {
                    ConfirmOutcome::Saved { advance_to: Some(item_id) } => {
                        let advance = Timeout::new(AUTO_ADVANCE_MS, move || {
                            store.update(|s| s.advance_to(item_id));
                        });
                        advance_timer.try_update_value(|t| *t = Some(advance));
                    }
                    ConfirmOutcome::Failed(message) => {
                        gloo::console::warn!(format!("save failed: {}", message));
                    }
                    _ => {}
                }
            });
        }
    };

    // 手動で移動したら自動移動は取り消す
    let navigate = move |step: fn(&mut ReviewStore<File>) -> bool| {
        advance_timer.set_value(None);
        store.update(|s| step(s));
    };

    let on_select = move |index: usize| {
        advance_timer.set_value(None);
        store.update(|s| s.select(index));
    };

    let on_remove = move |index: usize| {
        if let Some(url) = store.update(|s| s.remove(index)).flatten() {
            revoke_url(&url);
        }
    };

    let start_over = move || {
        advance_timer.set_value(None);
        for url in store.update(|s| s.remove_all()).unwrap_or_default() {
            revoke_url(&url);
        }
    };

    on_cleanup(move || {
        advance_timer.try_update_value(|t| *t = None);
    });

    let mode = Memo::new(move |_| {
        store.with(|s| {
            if s.queue.is_empty() {
                Mode::Empty
            } else if s.processing() {
                Mode::Processing
            } else {
                Mode::Review
            }
        })
    });
    let position = move || store.with(|s| (s.queue.current_index(), s.queue.len()));
    let current_name = move || store.with(|s| s.queue.current().map(|i| i.name.clone()).unwrap_or_default());
    let current_duplicate = move || store.with(|s| s.queue.current().map(|i| i.is_duplicate).unwrap_or(false));
    let current_saved = move || store.with(|s| s.queue.current().map(|i| i.saved).unwrap_or(false));
    let has_next = move || store.with(|s| s.queue.has_next());
    let has_previous = move || store.with(|s| s.queue.has_previous());
    let image_url = Memo::new(move |_| {
        store.with(|s| s.queue.current().map(|i| i.image_url.clone()).filter(|u| !u.is_empty()))
    });

    let empty_view = {
        let on_files_selected = on_files_selected.clone();
        move || {
            view! {
                <div class="page-center">
                    <UploadZone on_files_selected=on_files_selected.clone() />
                </div>
            }
        }
    };

    let spinner_view = move || {
        view! {
            <div class="page-center processing-spinner">
                <div class="spinner"></div>
                <h3>"جاري معالجة الإشعارات..."</h3>
                <p>{move || format!("يتم استخراج البيانات من {} إشعار", position().1)}</p>
                <p class="text-muted">"جاري فحص التكرارات والتحقق من الدقة"</p>
            </div>
        }
    };

    let main_view = move || {
        let next = navigate.clone();
        let previous = navigate.clone();
        let skip = navigate.clone();
        view! {
            <NotificationBar store=store />

            <div class="topbar">
                <div class="topbar-actions">
                    <button class="btn btn-outline" disabled=move || !has_next() on:click=move |_| next(|s| s.next())>
                        "التالي"
                    </button>
                    <UploadZone on_files_selected=on_files_selected.clone() compact=true />
                    <button class="btn btn-secondary" on:click={
                        let start_over = start_over.clone();
                        move |_| start_over()
                    }>
                        "🔄 بداية جديدة"
                    </button>
                </div>
                <div class="topbar-title">
                    <p class="strong">
                        {move || {
                            let (index, total) = position();
                            format!("إشعار {} من {}", index + 1, total)
                        }}
                    </p>
                    <p class="text-muted">
                        {current_name}
                        <Show when=current_duplicate>
                            <span class="badge badge-duplicate">"مكرر"</span>
                        </Show>
                        <Show when=current_saved>
                            <span class="badge badge-success">"✓ محفوظ"</span>
                        </Show>
                    </p>
                </div>
                <button class="btn btn-outline" disabled=move || !has_previous() on:click=move |_| previous(|s| s.previous())>
                    "السابق"
                </button>
            </div>

            <div class="workspace">
                <div class="col-queue">
                    <ProcessingQueue
                        store=store
                        on_select=on_select.clone()
                        on_remove=on_remove
                        on_remove_all=start_over.clone()
                    />
                </div>
                <div class="col-preview">
                    <ReceiptPreview image_url=image_url />
                </div>
                <div class="col-form">
                    <ExtractionForm
                        store=store
                        client=client.clone()
                        on_field_change=on_field_change.clone()
                        on_confirm=on_confirm.clone()
                        on_skip=move || skip(|s| s.skip())
                    />
                </div>
            </div>
        }
    };

    view! {
        <div class="page processing-page">
            {move || match mode.get() {
                Mode::Empty => empty_view().into_any(),
                Mode::Processing => spinner_view().into_any(),
                Mode::Review => main_view().into_any(),
            }}
        </div>
    }
}

