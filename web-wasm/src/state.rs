//! 画面全体で共有する状態

use leptos::prelude::*;
use receipt_review_common::{ReviewStore, StoreHandle};
use web_sys::File;

/// 処理ページの状態への窓口
///
/// `web_sys::File` はスレッド間で送れないためローカルストレージのシグナルに置く
#[derive(Clone, Copy)]
pub struct ReviewHandle(RwSignal<ReviewStore<File>, LocalStorage>);

impl ReviewHandle {
    pub fn new() -> Self {
        Self(RwSignal::new_local(ReviewStore::new()))
    }

    /// 読み取り（リアクティブに追跡される）
    pub fn with<R>(&self, f: impl FnOnce(&ReviewStore<File>) -> R) -> R {
        self.0.with(f)
    }
}

impl StoreHandle<File> for ReviewHandle {
    /// シグナルが破棄済みなら `None`
    fn update<R>(&self, f: impl FnOnce(&mut ReviewStore<File>) -> R) -> Option<R> {
        self.0.try_update(f)
    }
}

/// 表示中のページ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Processing,
    Search,
    Dashboard,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Processing, Page::Search, Page::Dashboard];

    pub fn label(&self) -> &'static str {
        match self {
            Page::Processing => "معالجة الإشعارات",
            Page::Search => "البحث والاستعلام",
            Page::Dashboard => "لوحة التحكم",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Page::Processing => "🧾",
            Page::Search => "🔍",
            Page::Dashboard => "📊",
        }
    }
}

#[cfg(all(target_arch = "wasm32", test))]
mod wasm_tests {
    use super::*;
    use receipt_review_common::NewFile;
    use wasm_bindgen::JsValue;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn file(name: &str) -> File {
        let parts = js_sys::Array::of1(&JsValue::from_str("data"));
        File::new_with_str_sequence(&parts, name).expect("File constructor failed")
    }

    #[wasm_bindgen_test]
    fn wasm_handle_updates_queue_through_signal() {
        let store = ReviewHandle::new();
        let added = store.update(|s| {
            s.add_files(vec![NewFile {
                name: "a.jpg".to_string(),
                image_url: String::new(),
                upload: file("a.jpg"),
            }])
            .show_spinner
        });
        assert_eq!(added, Some(true));
        assert_eq!(store.with(|s| s.queue.len()), 1);
        assert_eq!(store.update(|s| s.remove_all().len()), Some(1));
        assert!(store.with(|s| s.queue.is_empty()));
    }

    #[wasm_bindgen_test]
    fn wasm_pages_have_labels() {
        for page in Page::ALL {
            assert!(!page.label().is_empty());
            assert!(!page.icon().is_empty());
        }
    }
}
