//! アップロードエリアコンポーネント

use leptos::html::Input;
use leptos::prelude::*;
use web_sys::{DragEvent, File, FileList, HtmlInputElement};

/// 画像ファイルだけを取り出す
fn image_files(files: FileList) -> Vec<File> {
    (0..files.length())
        .filter_map(|i| files.get(i))
        .filter(|f| f.type_().starts_with("image/"))
        .collect()
}

/// `compact` はキューがある状態のヘッダー用ボタン表示
#[component]
pub fn UploadZone<F>(on_files_selected: F, #[prop(optional)] compact: bool) -> impl IntoView
where
    F: Fn(Vec<File>) + Clone + Send + Sync + 'static,
{
    let (is_dragover, set_is_dragover) = signal(false);
    let input_ref: NodeRef<Input> = NodeRef::new();

    let handle_files = move |files: FileList| {
        let files = image_files(files);
        if !files.is_empty() {
            on_files_selected(files);
        }
    };

    let on_drop = {
        let handle_files = handle_files.clone();
        move |ev: DragEvent| {
            ev.prevent_default();
            set_is_dragover.set(false);
            if let Some(files) = ev.data_transfer().and_then(|dt| dt.files()) {
                handle_files(files);
            }
        }
    };

    let on_change = move |ev: web_sys::Event| {
        let input: HtmlInputElement = event_target(&ev);
        if let Some(files) = input.files() {
            handle_files(files);
        }
        // 同じファイルを選び直せるようにする
        input.set_value("");
    };

    let open_dialog = move |_| {
        if let Some(input) = input_ref.get() {
            input.click();
        }
    };

    view! {
        <input
            node_ref=input_ref
            type="file"
            accept="image/*"
            multiple=true
            style="display: none"
            on:change=on_change
        />
        <Show
            when=move || !compact
            fallback=move || view! {
                <button class="btn btn-outline" on:click=open_dialog>
                    "➕ إضافة إشعارات"
                </button>
            }
        >
            <div
                class=move || if is_dragover.get() { "upload-zone dragover" } else { "upload-zone" }
                on:drop=on_drop.clone()
                on:dragover=move |ev: DragEvent| {
                    ev.prevent_default();
                    set_is_dragover.set(true);
                }
                on:dragleave=move |_: DragEvent| set_is_dragover.set(false)
            >
                <div class="upload-icon">"📤"</div>
                <p>"اسحب الإشعارات وأفلتها هنا"</p>
                <p class="text-muted">"أو"</p>
                <button class="btn btn-primary" on:click=open_dialog>
                    "اختر الملفات"
                </button>
                <p class="text-muted">"JPG, PNG"</p>
            </div>
        </Show>
    }
}
