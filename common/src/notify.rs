//! 通知（トースト）の管理
//!
//! 成功・情報の通知は一定時間後に自動で消える。
//! タイマーは呼び出し側が持ち、期限が来たら `dismiss` を呼ぶ。

use serde::{Deserialize, Serialize};

/// 自動で消えるまでの時間（ミリ秒）
pub const AUTO_DISMISS_MS: u32 = 5000;

/// 通知の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
            NotificationKind::Warning => "warning",
            NotificationKind::Info => "info",
        }
    }

    pub fn auto_dismisses(&self) -> bool {
        matches!(self, NotificationKind::Success | NotificationKind::Info)
    }
}

/// 通知
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
    pub dismissible: bool,
}

/// 通知の一覧
#[derive(Debug, Clone, Default)]
pub struct NotificationCenter {
    next_id: u64,
    items: Vec<Notification>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 通知を追加してIDを返す
    pub fn push(&mut self, kind: NotificationKind, message: impl Into<String>) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.items.push(Notification {
            id,
            kind,
            message: message.into(),
            dismissible: true,
        });
        id
    }

    /// 通知を消す（見つかればtrue）
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    pub fn get(&self, id: u64) -> Option<&Notification> {
        self.items.iter().find(|n| n.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count_of(&self, kind: NotificationKind) -> usize {
        self.items.iter().filter(|n| n.kind == kind).count()
    }

    pub fn last(&self) -> Option<&Notification> {
        self.items.last()
    }
}

/// 利用者向けメッセージ（アラビア語）
pub mod messages {
    pub fn files_added(count: usize) -> String {
        format!("تمت إضافة {} إشعار(ات) إلى قائمة الانتظار.", count)
    }

    pub fn processing_in_background() -> String {
        "يتم معالجة الإشعارات المتبقية في الخلفية...".to_string()
    }

    pub fn duplicates_found(count: usize) -> String {
        format!("تم العثور على {} إشعار(ات) مكررة. لن يتم حفظها.", count)
    }

    pub fn needs_review(count: usize) -> String {
        format!("{} إشعار(ات) تحتاج إلى مراجعة.", count)
    }

    pub fn all_processed(count: usize) -> String {
        format!("تمت معالجة جميع الـ {} إشعارات بنجاح!", count)
    }

    pub fn processing_failed() -> String {
        "فشلت معالجة الإشعارات. يرجى المحاولة مرة أخرى.".to_string()
    }

    pub fn extraction_failed() -> String {
        "فشلت معالجة الإشعار".to_string()
    }

    pub fn duplicate_transaction() -> String {
        "رقم العملية موجود مسبقاً في قاعدة البيانات.".to_string()
    }

    pub fn saved() -> String {
        "تم حفظ الإشعار بنجاح!".to_string()
    }

    pub fn all_saved(count: usize) -> String {
        format!("تم حفظ {} إشعار(ات) بنجاح! 🎉", count)
    }

    /// 保存はできたが、その間に項目が削除されたか重複と判定された
    pub fn save_not_applied() -> String {
        "تم إرسال الإشعار لكن حالته تغيرت أثناء الحفظ. يرجى المراجعة.".to_string()
    }

    pub fn save_failed() -> String {
        "فشل حفظ الإشعار. يرجى المحاولة مرة أخرى.".to_string()
    }

    pub fn backend_unreachable() -> String {
        "تعذر الاتصال بالخادم. يرجى التأكد من تشغيل الخادم.".to_string()
    }

    pub fn load_failed() -> String {
        "فشل تحميل البيانات".to_string()
    }

    /// バックエンドのメッセージがあればそれを、無ければ既定文を使う
    pub fn or_fallback(message: &str, fallback: String) -> String {
        if message.trim().is_empty() {
            fallback
        } else {
            message.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_assigns_increasing_ids() {
        let mut center = NotificationCenter::new();
        let a = center.push(NotificationKind::Info, "a");
        let b = center.push(NotificationKind::Error, "b");
        assert!(b > a);
        assert_eq!(center.len(), 2);
        assert!(center.get(a).unwrap().dismissible);
    }

    #[test]
    fn test_dismiss_and_clear() {
        let mut center = NotificationCenter::new();
        let a = center.push(NotificationKind::Success, "a");
        center.push(NotificationKind::Warning, "b");

        assert!(center.dismiss(a));
        assert!(!center.dismiss(a));
        assert_eq!(center.count_of(NotificationKind::Warning), 1);

        center.clear();
        assert!(center.is_empty());
    }

    #[test]
    fn test_ids_not_reused_after_clear() {
        let mut center = NotificationCenter::new();
        let a = center.push(NotificationKind::Info, "a");
        center.clear();
        let b = center.push(NotificationKind::Info, "b");
        assert_ne!(a, b);
    }

    #[test]
    fn test_auto_dismiss_kinds() {
        assert!(NotificationKind::Success.auto_dismisses());
        assert!(NotificationKind::Info.auto_dismisses());
        assert!(!NotificationKind::Warning.auto_dismisses());
        assert!(!NotificationKind::Error.auto_dismisses());
    }

    #[test]
    fn test_messages_embed_counts() {
        assert!(messages::all_saved(3).contains('3'));
        assert!(messages::duplicates_found(1).contains('1'));
        assert_eq!(messages::or_fallback("  ", messages::save_failed()), messages::save_failed());
        assert_eq!(messages::or_fallback("boom", messages::save_failed()), "boom");
    }
}
