//! レシート画像プレビュー（拡大・回転・ドラッグ移動）

use leptos::prelude::*;
use receipt_review_common::preview::{PreviewView, MAX_ZOOM, MIN_ZOOM};
use web_sys::{MouseEvent, WheelEvent};

#[component]
pub fn ReceiptPreview(#[prop(into)] image_url: Signal<Option<String>>) -> impl IntoView {
    let view_state = RwSignal::new(PreviewView::new());

    // 表示する画像が変わったら初期状態に戻す
    Effect::new(move |_| {
        image_url.track();
        view_state.update(|v| v.reset());
    });

    let zoom = move || view_state.with(|v| v.zoom);

    view! {
        <div class="preview">
            <div class="preview-toolbar">
                <button
                    class="btn-icon"
                    disabled=move || zoom() <= MIN_ZOOM
                    on:click=move |_| view_state.update(|v| v.zoom_out())
                >
                    "−"
                </button>
                <span class="preview-zoom">{move || format!("{}%", zoom())}</span>
                <button
                    class="btn-icon"
                    disabled=move || zoom() >= MAX_ZOOM
                    on:click=move |_| view_state.update(|v| v.zoom_in())
                >
                    "+"
                </button>
                <button class="btn-icon" title="تدوير" on:click=move |_| view_state.update(|v| v.rotate())>
                    "⟳"
                </button>
                <button class="btn-icon" title="إعادة تعيين" on:click=move |_| view_state.update(|v| v.reset())>
                    "↺"
                </button>
            </div>

            <Show
                when=move || image_url.with(|u| u.is_some())
                fallback=|| view! {
                    <div class="preview-empty">
                        <div class="upload-icon">"🖼"</div>
                        <p>"لا توجد صورة"</p>
                    </div>
                }
            >
                <div
                    class="preview-stage"
                    class:pannable=move || view_state.with(|v| v.can_pan())
                    class:dragging=move || view_state.with(|v| v.dragging())
                    on:wheel=move |ev: WheelEvent| {
                        ev.prevent_default();
                        view_state.update(|v| v.wheel(ev.delta_y()));
                    }
                    on:mousedown=move |ev: MouseEvent| {
                        let (x, y) = (ev.client_x() as f64, ev.client_y() as f64);
                        view_state.update(|v| {
                            v.begin_drag(x, y);
                        });
                    }
                    on:mousemove=move |ev: MouseEvent| {
                        if view_state.with_untracked(|v| v.dragging()) {
                            let (x, y) = (ev.client_x() as f64, ev.client_y() as f64);
                            view_state.update(|v| v.drag_to(x, y));
                        }
                    }
                    on:mouseup=move |_: MouseEvent| view_state.update(|v| v.end_drag())
                    on:mouseleave=move |_: MouseEvent| view_state.update(|v| v.end_drag())
                >
                    <img
                        src=move || image_url.get().unwrap_or_default()
                        alt="receipt"
                        draggable="false"
                        style=move || format!("transform: {}", view_state.with(|v| v.css_transform()))
                    />
                </div>
                <Show when=move || view_state.with(|v| v.can_pan())>
                    <p class="preview-hint">"اسحب للتنقل"</p>
                </Show>
            </Show>
        </div>
    }
}
