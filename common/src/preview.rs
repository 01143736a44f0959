//! レシート画像プレビューの表示状態（拡大・回転・移動）

pub const MIN_ZOOM: u32 = 50;
pub const MAX_ZOOM: u32 = 200;
pub const ZOOM_STEP: u32 = 25;
pub const DEFAULT_ZOOM: u32 = 100;

/// プレビューの表示状態
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewView {
    /// 拡大率（%）
    pub zoom: u32,
    /// 回転角（0, 90, 180, 270）
    pub rotation: u32,
    pub offset_x: f64,
    pub offset_y: f64,
    drag_origin: Option<(f64, f64)>,
}

impl Default for PreviewView {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            rotation: 0,
            offset_x: 0.0,
            offset_y: 0.0,
            drag_origin: None,
        }
    }
}

impl PreviewView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + ZOOM_STEP).min(MAX_ZOOM);
    }

    /// 縮小（100%以下に戻ったら位置もリセット）
    pub fn zoom_out(&mut self) {
        self.zoom = self.zoom.saturating_sub(ZOOM_STEP).max(MIN_ZOOM);
        if !self.can_pan() {
            self.offset_x = 0.0;
            self.offset_y = 0.0;
            self.drag_origin = None;
        }
    }

    /// ホイール操作（上方向で拡大）
    pub fn wheel(&mut self, delta_y: f64) {
        if delta_y < 0.0 {
            self.zoom_in();
        } else if delta_y > 0.0 {
            self.zoom_out();
        }
    }

    pub fn rotate(&mut self) {
        self.rotation = (self.rotation + 90) % 360;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// 100%を超えている間だけドラッグで移動できる
    pub fn can_pan(&self) -> bool {
        self.zoom > DEFAULT_ZOOM
    }

    pub fn begin_drag(&mut self, x: f64, y: f64) -> bool {
        if !self.can_pan() {
            return false;
        }
        self.drag_origin = Some((x - self.offset_x, y - self.offset_y));
        true
    }

    pub fn drag_to(&mut self, x: f64, y: f64) {
        if let Some((ox, oy)) = self.drag_origin {
            self.offset_x = x - ox;
            self.offset_y = y - oy;
        }
    }

    pub fn end_drag(&mut self) {
        self.drag_origin = None;
    }

    pub fn dragging(&self) -> bool {
        self.drag_origin.is_some()
    }

    /// CSS `transform` の値
    pub fn css_transform(&self) -> String {
        format!(
            "translate({}px, {}px) scale({}) rotate({}deg)",
            self.offset_x,
            self.offset_y,
            self.zoom as f64 / 100.0,
            self.rotation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_is_clamped() {
        let mut view = PreviewView::new();
        for _ in 0..10 {
            view.zoom_in();
        }
        assert_eq!(view.zoom, MAX_ZOOM);
        for _ in 0..10 {
            view.zoom_out();
        }
        assert_eq!(view.zoom, MIN_ZOOM);
    }

    #[test]
    fn test_rotation_wraps() {
        let mut view = PreviewView::new();
        for _ in 0..5 {
            view.rotate();
        }
        assert_eq!(view.rotation, 90);
    }

    #[test]
    fn test_pan_only_when_zoomed() {
        let mut view = PreviewView::new();
        assert!(!view.begin_drag(10.0, 10.0));

        view.zoom_in();
        assert!(view.begin_drag(10.0, 10.0));
        view.drag_to(30.0, 5.0);
        view.end_drag();
        assert_eq!((view.offset_x, view.offset_y), (20.0, -5.0));

        // 100%に戻すと位置もリセット
        view.zoom_out();
        assert_eq!((view.offset_x, view.offset_y), (0.0, 0.0));
    }

    #[test]
    fn test_wheel_and_transform() {
        let mut view = PreviewView::new();
        view.wheel(-120.0);
        view.rotate();
        assert_eq!(view.css_transform(), "translate(0px, 0px) scale(1.25) rotate(90deg)");

        view.reset();
        assert_eq!(view, PreviewView::default());
    }
}
