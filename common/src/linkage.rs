//! 受取人名の入力補助
//!
//! 2つの独立した動作を持つ:
//! 1. 候補検索: 入力から300ms後に検索し、最大10件をキーボードで選択できる
//! 2. 自動置換: 500ms後、宛先口座に紐付いた名前が現在値と異なれば置き換える。
//!    利用者が編集した後は行わない
//!
//! 入力のたびに両方のタイマーを予約し直す（古い予約は無効）。

use crate::debounce::{CancellationToken, Debouncer};
use crate::types::ReceiverSuggestion;

/// 候補の最大件数
pub const MAX_SUGGESTIONS: usize = 10;
/// 検索を始める最小文字数
pub const MIN_QUERY_CHARS: usize = 2;

/// 口座番号の比較用（空白を除去）
pub fn normalize_account(account: &str) -> String {
    account.chars().filter(|c| !c.is_whitespace()).collect()
}

/// 候補が宛先口座に紐付いているか
pub fn is_linked(suggestion: &ReceiverSuggestion, to_account: &str) -> bool {
    let target = normalize_account(to_account);
    if target.is_empty() {
        return false;
    }
    suggestion
        .display_name
        .as_deref()
        .map(|d| normalize_account(d) == target)
        .unwrap_or(false)
}

/// 宛先口座に紐付いた最初の候補
pub fn find_linked<'a>(
    suggestions: &'a [ReceiverSuggestion],
    to_account: &str,
) -> Option<&'a ReceiverSuggestion> {
    suggestions.iter().find(|s| is_linked(s, to_account))
}

/// 候補リストで扱うキー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionKey {
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
    Tab,
    Other,
}

impl SuggestionKey {
    /// `KeyboardEvent.key` の値から変換
    pub fn from_key(key: &str) -> Self {
        match key {
            "ArrowDown" => SuggestionKey::ArrowDown,
            "ArrowUp" => SuggestionKey::ArrowUp,
            "Enter" => SuggestionKey::Enter,
            "Escape" => SuggestionKey::Escape,
            "Tab" => SuggestionKey::Tab,
            _ => SuggestionKey::Other,
        }
    }
}

/// キー操作の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored,
    Moved,
    /// 候補を選択した（値を入力欄へ反映する）
    Picked(String),
    Closed,
}

/// 1回の入力変化で予約されるタイマー
#[derive(Debug, Clone)]
pub struct LinkageTimers {
    pub autocomplete: CancellationToken,
    pub auto_replace: CancellationToken,
}

/// 受取人名入力の状態
#[derive(Debug, Clone, Default)]
pub struct ReceiverLinkage {
    suggestions: Vec<ReceiverSuggestion>,
    open: bool,
    selected: Option<usize>,
    loading: bool,
    user_edited: bool,
    auto_replaced: bool,
    autocomplete_timer: Debouncer,
    auto_replace_timer: Debouncer,
}

impl ReceiverLinkage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 別の項目に切り替わったとき
    pub fn reset(&mut self) {
        self.cancel_timers();
        self.suggestions.clear();
        self.open = false;
        self.selected = None;
        self.loading = false;
        self.user_edited = false;
        self.auto_replaced = false;
    }

    /// 予約済みのタイマーをすべて無効にする
    pub fn cancel_timers(&self) {
        self.autocomplete_timer.cancel();
        self.auto_replace_timer.cancel();
    }

    /// 値または宛先口座が変わった: 両方のタイマーを予約し直す
    pub fn on_inputs_changed(&self) -> LinkageTimers {
        LinkageTimers {
            autocomplete: self.autocomplete_timer.schedule(),
            auto_replace: self.auto_replace_timer.schedule(),
        }
    }

    /// 利用者のキー入力
    pub fn on_user_typed(&mut self) {
        self.user_edited = true;
        self.auto_replaced = false;
    }

    /// 候補検索に使うクエリ（短すぎる場合は候補を閉じてNone）
    pub fn autocomplete_query(&mut self, value: &str) -> Option<String> {
        let query = value.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            self.suggestions.clear();
            self.open = false;
            self.selected = None;
            return None;
        }
        self.loading = true;
        Some(query.to_string())
    }

    /// 検索結果を反映（最大10件）
    pub fn apply_suggestions(&mut self, mut results: Vec<ReceiverSuggestion>) {
        results.truncate(MAX_SUGGESTIONS);
        self.open = !results.is_empty();
        self.suggestions = results;
        self.selected = None;
        self.loading = false;
    }

    /// 検索失敗
    pub fn fail_suggestions(&mut self) {
        self.suggestions.clear();
        self.open = false;
        self.selected = None;
        self.loading = false;
    }

    /// 自動置換の確認をするべきか（通信前の判定）
    pub fn wants_auto_replace(&self, value: &str, to_account: &str) -> bool {
        !to_account.trim().is_empty()
            && !value.is_empty()
            && !self.user_edited
            && !self.auto_replaced
    }

    /// 自動置換する値（紐付いた名前が現在値と異なる場合）
    pub fn auto_replace_candidate(
        &self,
        value: &str,
        to_account: &str,
        results: &[ReceiverSuggestion],
    ) -> Option<String> {
        if !self.wants_auto_replace(value, to_account) {
            return None;
        }
        find_linked(results, to_account)
            .filter(|linked| linked.value != value)
            .map(|linked| linked.value.clone())
    }

    pub fn mark_auto_replaced(&mut self) {
        self.auto_replaced = true;
    }

    /// キー操作
    pub fn on_key(&mut self, key: SuggestionKey) -> KeyOutcome {
        if !self.open || self.suggestions.is_empty() {
            return KeyOutcome::Ignored;
        }

        match key {
            SuggestionKey::ArrowDown => {
                self.selected = match self.selected {
                    None => Some(0),
                    Some(i) if i + 1 < self.suggestions.len() => Some(i + 1),
                    other => other,
                };
                KeyOutcome::Moved
            }
            SuggestionKey::ArrowUp => {
                self.selected = match self.selected {
                    Some(i) if i > 0 => Some(i - 1),
                    _ => None,
                };
                KeyOutcome::Moved
            }
            SuggestionKey::Enter => match self.selected {
                Some(i) => self
                    .pick(i)
                    .map(KeyOutcome::Picked)
                    .unwrap_or(KeyOutcome::Ignored),
                None => KeyOutcome::Ignored,
            },
            SuggestionKey::Escape | SuggestionKey::Tab => {
                self.close();
                KeyOutcome::Closed
            }
            SuggestionKey::Other => KeyOutcome::Ignored,
        }
    }

    /// 候補を選ぶ（利用者による編集として扱う）
    pub fn pick(&mut self, index: usize) -> Option<String> {
        let value = self.suggestions.get(index)?.value.clone();
        self.user_edited = true;
        self.close();
        Some(value)
    }

    pub fn close(&mut self) {
        self.open = false;
        self.selected = None;
    }

    /// フォーカス時: 候補があれば再表示
    pub fn reopen(&mut self) {
        if !self.suggestions.is_empty() {
            self.open = true;
        }
    }

    pub fn suggestions(&self) -> &[ReceiverSuggestion] {
        &self.suggestions
    }

    pub fn is_open(&self) -> bool {
        self.open && !self.suggestions.is_empty()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn user_edited(&self) -> bool {
        self.user_edited
    }

    /// 自動置換済みバッジを表示するか
    pub fn shows_auto_replaced(&self) -> bool {
        self.auto_replaced && !self.user_edited
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion(value: &str, account: Option<&str>) -> ReceiverSuggestion {
        ReceiverSuggestion {
            value: value.to_string(),
            display_name: account.map(str::to_string),
            frequency: 1,
            verified: false,
        }
    }

    #[test]
    fn test_linked_ignores_whitespace() {
        let s = suggestion("محمد", Some("1234 5678"));
        assert!(is_linked(&s, "12345678"));
        assert!(is_linked(&s, " 1234 5678 "));
        assert!(!is_linked(&s, "1234"));
        assert!(!is_linked(&s, ""));
        assert!(!is_linked(&suggestion("x", None), "1"));
    }

    #[test]
    fn test_query_requires_two_chars() {
        let mut linkage = ReceiverLinkage::new();
        assert_eq!(linkage.autocomplete_query(" م "), None);
        assert_eq!(linkage.autocomplete_query("مح").as_deref(), Some("مح"));
        assert!(linkage.is_loading());
    }

    #[test]
    fn test_suggestions_truncated_and_opened() {
        let mut linkage = ReceiverLinkage::new();
        let results = (0..15).map(|i| suggestion(&format!("n{}", i), None)).collect();
        linkage.apply_suggestions(results);
        assert_eq!(linkage.suggestions().len(), MAX_SUGGESTIONS);
        assert!(linkage.is_open());

        linkage.apply_suggestions(Vec::new());
        assert!(!linkage.is_open());
    }

    #[test]
    fn test_keyboard_navigation() {
        let mut linkage = ReceiverLinkage::new();
        linkage.apply_suggestions(vec![suggestion("a", None), suggestion("b", None)]);

        assert_eq!(linkage.on_key(SuggestionKey::Enter), KeyOutcome::Ignored);
        linkage.on_key(SuggestionKey::ArrowDown);
        linkage.on_key(SuggestionKey::ArrowDown);
        linkage.on_key(SuggestionKey::ArrowDown);
        assert_eq!(linkage.selected(), Some(1));
        linkage.on_key(SuggestionKey::ArrowUp);
        linkage.on_key(SuggestionKey::ArrowUp);
        assert_eq!(linkage.selected(), None);

        linkage.on_key(SuggestionKey::ArrowDown);
        assert_eq!(linkage.on_key(SuggestionKey::Enter), KeyOutcome::Picked("a".into()));
        assert!(!linkage.is_open());
        assert!(linkage.user_edited());
    }

    #[test]
    fn test_escape_and_tab_close() {
        let mut linkage = ReceiverLinkage::new();
        linkage.apply_suggestions(vec![suggestion("a", None)]);
        assert_eq!(linkage.on_key(SuggestionKey::Escape), KeyOutcome::Closed);
        linkage.reopen();
        assert!(linkage.is_open());
        assert_eq!(linkage.on_key(SuggestionKey::from_key("Tab")), KeyOutcome::Closed);
        assert_eq!(linkage.on_key(SuggestionKey::ArrowDown), KeyOutcome::Ignored);
    }

    #[test]
    fn test_auto_replace_until_user_edits() {
        let mut linkage = ReceiverLinkage::new();
        let results = vec![suggestion("OCR name", None), suggestion("Linked Co", Some("99 88"))];

        assert_eq!(
            linkage.auto_replace_candidate("OCR name", "9988", &results).as_deref(),
            Some("Linked Co")
        );
        linkage.mark_auto_replaced();
        assert!(linkage.shows_auto_replaced());
        assert_eq!(linkage.auto_replace_candidate("Linked Co", "9988", &results), None);

        linkage.on_user_typed();
        assert!(!linkage.shows_auto_replaced());
        assert_eq!(linkage.auto_replace_candidate("Other", "9988", &results), None);
    }

    #[test]
    fn test_no_replace_when_already_linked_value() {
        let linkage = ReceiverLinkage::new();
        let results = vec![suggestion("Linked Co", Some("9988"))];
        assert_eq!(linkage.auto_replace_candidate("Linked Co", "9988", &results), None);
        assert_eq!(linkage.auto_replace_candidate("", "9988", &results), None);
        assert_eq!(linkage.auto_replace_candidate("x", "", &results), None);
    }

    #[test]
    fn test_keystroke_cancels_pending_timers() {
        let linkage = ReceiverLinkage::new();
        let first = linkage.on_inputs_changed();
        let second = linkage.on_inputs_changed();
        assert!(first.autocomplete.is_cancelled());
        assert!(first.auto_replace.is_cancelled());
        assert!(!second.autocomplete.is_cancelled());

        linkage.cancel_timers();
        assert!(second.auto_replace.is_cancelled());
    }

    #[test]
    fn test_reset_clears_flags() {
        let mut linkage = ReceiverLinkage::new();
        linkage.on_user_typed();
        linkage.mark_auto_replaced();
        linkage.apply_suggestions(vec![suggestion("a", None)]);
        let timers = linkage.on_inputs_changed();
        linkage.reset();
        assert!(!linkage.user_edited());
        assert!(!linkage.is_open());
        assert!(timers.autocomplete.is_cancelled());
    }
}
