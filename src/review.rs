//! 対話式レビューモジュール
//!
//! 処理キューを1件ずつ表示し、確定・編集・スキップ・削除を行う。
//! 状態の更新はすべて `ReviewStore` 経由（ブラウザ版と同じ規則）。

use crate::client::ApiClient;
use crate::error::Result;
use dialoguer::{Confirm, Input, Select};
use receipt_review_common::debounce::AUTO_ADVANCE_MS;
use receipt_review_common::fields::{self, ConfidenceLevel};
use receipt_review_common::linkage::{self, ReceiverLinkage};
use receipt_review_common::notify::{Notification, NotificationCenter, NotificationKind};
use receipt_review_common::queue::{ConfirmBlock, QueueItem};
use receipt_review_common::store::{ConfirmOutcome, ReviewStore};
use receipt_review_common::types::FieldName;
use receipt_review_common::workflow;
use serde::Serialize;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 対話アクション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    /// 確定して保存
    Confirm,
    /// フィールドを編集
    Edit,
    /// この項目をスキップ
    Skip,
    Previous,
    /// 項目一覧から選ぶ
    Jump,
    /// キューから削除
    Remove,
    /// 終了
    Quit,
}

impl ReviewAction {
    pub fn label(&self) -> &'static str {
        match self {
            ReviewAction::Confirm => "確定して保存",
            ReviewAction::Edit => "フィールドを編集",
            ReviewAction::Skip => "スキップ",
            ReviewAction::Previous => "前へ",
            ReviewAction::Jump => "一覧から選ぶ",
            ReviewAction::Remove => "キューから削除",
            ReviewAction::Quit => "終了",
        }
    }
}

/// 現在の項目で選べる操作
pub fn available_actions<U>(store: &ReviewStore<U>) -> Vec<ReviewAction> {
    let queue = &store.queue;
    let index = queue.current_index();
    let mut actions = Vec::new();

    if queue.can_confirm(index, store.saving()) {
        actions.push(ReviewAction::Confirm);
    }
    if queue.current().map(|i| i.extracted_data.is_some() && !i.saved).unwrap_or(false) {
        actions.push(ReviewAction::Edit);
    }
    if queue.has_next() {
        actions.push(ReviewAction::Skip);
    }
    if queue.has_previous() {
        actions.push(ReviewAction::Previous);
    }
    if queue.len() > 1 {
        actions.push(ReviewAction::Jump);
    }
    if !queue.is_empty() {
        actions.push(ReviewAction::Remove);
    }
    actions.push(ReviewAction::Quit);
    actions
}

/// 確定できない理由の説明
pub fn block_reason(block: ConfirmBlock) -> &'static str {
    match block {
        ConfirmBlock::NoItem => "項目がありません",
        ConfirmBlock::NotProcessed => "抽出が終わっていません",
        ConfirmBlock::AlreadySaved => "保存済みです",
        ConfirmBlock::Saving => "保存中です",
        ConfirmBlock::Duplicate => "重複した取引のため保存できません",
        ConfirmBlock::CriticalIssues => "重大な問題があるため保存できません",
    }
}

pub fn notification_line(notification: &Notification) -> String {
    let icon = match notification.kind {
        NotificationKind::Success => "✔",
        NotificationKind::Error => "✖",
        NotificationKind::Warning => "⚠",
        NotificationKind::Info => "ℹ",
    };
    format!("{} {}", icon, notification.message)
}

/// 項目の表示行
pub fn item_lines<U>(item: &QueueItem<U>, position: usize, total: usize) -> Vec<String> {
    let mut lines = vec![format!(
        "[{}/{}] {} ({})",
        position + 1,
        total,
        item.name,
        item.status().label()
    )];

    if let Some(error) = &item.error {
        lines.push(format!("  ✖ {}", error));
        return lines;
    }

    let Some(data) = &item.extracted_data else {
        return lines;
    };

    if let Some(confidence) = item.confidence {
        lines.push(format!("  信頼度: {}%", fields::confidence_percent(confidence)));
    }

    for def in fields::definitions() {
        let value = data.value(def.name);
        let entry = data.get(def.name);
        let mut line = format!("  {} {}: {}", def.icon, def.label, value);

        if def.show_confidence {
            if let Some(c) = entry.and_then(|e| e.confidence) {
                line.push_str(&format!(" ({}% {})", fields::confidence_percent(c), ConfidenceLevel::from_score(c).as_str()));
            }
        }
        let needs_review = entry.map(|e| e.needs_review).unwrap_or(false);
        if fields::should_highlight(def.name, needs_review, entry.and_then(|e| e.confidence)) {
            line.push_str(" ⚠");
        }
        if fields::is_converted_date(def.name, value) {
            line.push_str(" [変換済み]");
        }
        lines.push(line);
    }

    for issue in &item.issues {
        let mark = if issue.is_critical() { "✖" } else { "⚠" };
        lines.push(format!("  {} {}", mark, issue.message));
    }
    lines
}

/// 新しい通知だけを表示する
#[derive(Debug, Default)]
pub struct NoticePrinter {
    last_seen: u64,
}

impl NoticePrinter {
    pub fn unseen<'a>(&mut self, center: &'a NotificationCenter) -> Vec<&'a Notification> {
        let fresh: Vec<&Notification> = center
            .items()
            .iter()
            .filter(|n| n.id > self.last_seen)
            .collect();
        if let Some(max) = fresh.iter().map(|n| n.id).max() {
            self.last_seen = max;
        }
        fresh
    }

    pub fn print(&mut self, center: &NotificationCenter) {
        for notification in self.unseen(center) {
            println!("{}", notification_line(notification));
        }
    }
}

/// キュー状態の書き出し形式
#[derive(Debug, Serialize)]
pub struct QueueReport<'a, U> {
    pub generated_at: String,
    pub total: usize,
    pub saved: usize,
    pub items: &'a [QueueItem<U>],
}

impl<'a, U> QueueReport<'a, U> {
    pub fn new(store: &'a ReviewStore<U>) -> Self {
        Self {
            generated_at: chrono::Local::now().to_rfc3339(),
            total: store.queue.len(),
            saved: store.queue.saved_count(),
            items: store.queue.items(),
        }
    }
}

/// キュー状態をJSONで保存
pub fn write_queue_report<U: Serialize>(store: &ReviewStore<U>, output: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&QueueReport::new(store))?;
    std::fs::write(output, json)?;
    Ok(())
}

/// 宛先口座に紐付いた受取人名があれば置き換える（項目ごとに1回）
async fn auto_replace_receiver(
    store: &RefCell<ReviewStore<PathBuf>>,
    client: &ApiClient,
    linkage: &mut ReceiverLinkage,
) -> Result<()> {
    let (value, to_account) = {
        let store = store.borrow();
        let Some(data) = store.queue.current().and_then(|i| i.extracted_data.as_ref()) else {
            return Ok(());
        };
        (
            data.value(FieldName::ReceiverName).to_string(),
            data.value(FieldName::ToAccount).to_string(),
        )
    };

    if !linkage.wants_auto_replace(&value, &to_account) {
        return Ok(());
    }

    let results = match client.search_receivers(&value, Some(&to_account)).await {
        Ok(results) => results,
        Err(e) => {
            tracing::debug!(error = %e, "receiver lookup failed");
            return Ok(());
        }
    };

    if let Some(replacement) = linkage.auto_replace_candidate(&value, &to_account, &results) {
        workflow::edit_field(store, client, FieldName::ReceiverName, &replacement).await;
        linkage.mark_auto_replaced();
        println!("  🔗 受取人名を口座の登録名に置き換えました: {} → {}", value, replacement);
    }
    Ok(())
}

/// 受取人名の入力（候補から選択可）
async fn prompt_receiver_name(
    client: &ApiClient,
    linkage: &mut ReceiverLinkage,
    current: &str,
    to_account: &str,
) -> Result<String> {
    let typed: String = Input::new()
        .with_prompt(fields::definition(FieldName::ReceiverName).label)
        .with_initial_text(current)
        .allow_empty(true)
        .interact_text()?;
    linkage.on_user_typed();

    let Some(query) = linkage.autocomplete_query(&typed) else {
        return Ok(typed);
    };
    let account = Some(to_account).filter(|a| !a.trim().is_empty());
    match client.search_receivers(&query, account).await {
        Ok(results) => linkage.apply_suggestions(results),
        Err(e) => {
            tracing::debug!(error = %e, "receiver search failed");
            linkage.fail_suggestions();
        }
    }

    if !linkage.is_open() {
        return Ok(typed);
    }

    let mut choices = vec![format!("{} (入力のまま)", typed)];
    for suggestion in linkage.suggestions() {
        let mark = if linkage::is_linked(suggestion, to_account) { "🔗 " } else { "" };
        choices.push(format!("{}{} ×{}", mark, suggestion.value, suggestion.frequency));
    }

    let picked = Select::new()
        .with_prompt("候補")
        .items(&choices)
        .default(0)
        .interact()?;

    if picked == 0 {
        linkage.close();
        return Ok(typed);
    }
    Ok(linkage.pick(picked - 1).unwrap_or(typed))
}

async fn edit_current(
    store: &RefCell<ReviewStore<PathBuf>>,
    client: &ApiClient,
    linkage: &mut ReceiverLinkage,
) -> Result<()> {
    let labels: Vec<&str> = fields::definitions().iter().map(|d| d.label).collect();
    let picked = Select::new()
        .with_prompt("編集するフィールド")
        .items(&labels)
        .default(0)
        .interact()?;
    let field = fields::definitions()[picked].name;

    let (current, to_account) = {
        let store = store.borrow();
        let data = store.queue.current().and_then(|i| i.extracted_data.clone()).unwrap_or_default();
        (
            data.value(field).to_string(),
            data.value(FieldName::ToAccount).to_string(),
        )
    };

    let value = if field == FieldName::ReceiverName {
        prompt_receiver_name(client, linkage, &current, &to_account).await?
    } else {
        Input::<String>::new()
            .with_prompt(fields::definition(field).label)
            .with_initial_text(current)
            .allow_empty(true)
            .interact_text()?
    };

    workflow::edit_field(store, client, field, &value).await;
    Ok(())
}

async fn confirm(store: &RefCell<ReviewStore<PathBuf>>, client: &ApiClient) {
    match workflow::confirm_current(store, client).await {
        ConfirmOutcome::Saved {
            advance_to: Some(next),
        } => {
            tokio::time::sleep(Duration::from_millis(AUTO_ADVANCE_MS as u64)).await;
            store.borrow_mut().advance_to(next);
        }
        ConfirmOutcome::Blocked(block) => println!("  {}", block_reason(block)),
        ConfirmOutcome::Saved { advance_to: None }
        | ConfirmOutcome::Failed(_)
        | ConfirmOutcome::Stale
        | ConfirmOutcome::Detached => {}
    }
}

fn jump(store: &RefCell<ReviewStore<PathBuf>>) -> Result<()> {
    let (choices, current) = {
        let store = store.borrow();
        let choices: Vec<String> = store
            .queue
            .items()
            .iter()
            .map(|i| format!("{} ({})", i.name, i.status().label()))
            .collect();
        (choices, store.queue.current_index())
    };

    let picked = Select::new()
        .with_prompt("項目")
        .items(&choices)
        .default(current)
        .interact()?;
    store.borrow_mut().select(picked);
    Ok(())
}

/// キューを対話式でレビューする
pub async fn run_interactive_review(
    store: &RefCell<ReviewStore<PathBuf>>,
    client: &ApiClient,
) -> Result<()> {
    let mut printer = NoticePrinter::default();
    let mut linkage = ReceiverLinkage::new();
    let mut shown_item: Option<u64> = None;

    printer.print(&store.borrow().notifications);

    loop {
        let current_id = store.borrow().queue.current().map(|i| i.id);
        let Some(item_id) = current_id else {
            println!("キューは空です");
            break;
        };

        if shown_item != Some(item_id) {
            linkage.reset();
            shown_item = Some(item_id);
            auto_replace_receiver(store, client, &mut linkage).await?;
        }

        let actions = {
            let store = store.borrow();
            let queue = &store.queue;
            println!();
            if let Some(item) = queue.current() {
                for line in item_lines(item, queue.current_index(), queue.len()) {
                    println!("{}", line);
                }
                if let Some(block) = queue.confirm_block(queue.current_index(), store.saving()) {
                    if !matches!(block, ConfirmBlock::AlreadySaved) {
                        println!("  ({})", block_reason(block));
                    }
                }
            }
            available_actions(&store)
        };

        let labels: Vec<&str> = actions.iter().map(|a| a.label()).collect();
        let picked = Select::new()
            .with_prompt("操作")
            .items(&labels)
            .default(0)
            .interact()?;

        match actions[picked] {
            ReviewAction::Confirm => confirm(store, client).await,
            ReviewAction::Edit => edit_current(store, client, &mut linkage).await?,
            ReviewAction::Skip => {
                store.borrow_mut().skip();
            }
            ReviewAction::Previous => {
                store.borrow_mut().previous();
            }
            ReviewAction::Jump => jump(store)?,
            ReviewAction::Remove => {
                let sure = Confirm::new()
                    .with_prompt("この項目をキューから削除しますか？")
                    .default(false)
                    .interact()?;
                if sure {
                    let index = store.borrow().queue.current_index();
                    store.borrow_mut().remove(index);
                }
            }
            ReviewAction::Quit => break,
        }

        printer.print(&store.borrow().notifications);
    }

    let store = store.borrow();
    println!(
        "\n保存済み: {}件 / 全{}件",
        store.queue.saved_count(),
        store.queue.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use receipt_review_common::queue::FileOutcome;
    use receipt_review_common::store::{Intake, NewFile};
    use receipt_review_common::types::{ExtractionResult, Issue, IssueSeverity};

    fn store_with(names: &[&str]) -> (ReviewStore<()>, Intake) {
        let mut store = ReviewStore::new();
        let intake = store.add_files(
            names
                .iter()
                .map(|n| NewFile {
                    name: n.to_string(),
                    upload: (),
                    image_url: String::new(),
                })
                .collect(),
        );
        (store, intake)
    }

    fn extracted(tid: &str) -> FileOutcome {
        let mut result = ExtractionResult::default();
        result.data.set_value(FieldName::TransactionId, tid);
        FileOutcome::Extracted {
            result,
            is_duplicate: false,
        }
    }

    #[test]
    fn test_pending_item_cannot_confirm() {
        let (store, _) = store_with(&["a.jpg", "b.jpg"]);
        let actions = available_actions(&store);
        assert!(!actions.contains(&ReviewAction::Confirm));
        assert!(!actions.contains(&ReviewAction::Edit));
        assert!(actions.contains(&ReviewAction::Skip));
        assert!(!actions.contains(&ReviewAction::Previous));
        assert_eq!(actions.last(), Some(&ReviewAction::Quit));
    }

    #[test]
    fn test_processed_item_offers_confirm_first() {
        let (mut store, mut intake) = store_with(&["a.jpg"]);
        store.merge_outcome(&mut intake, "a.jpg", extracted("T1"));
        let actions = available_actions(&store);
        assert_eq!(actions[0], ReviewAction::Confirm);
        assert!(actions.contains(&ReviewAction::Edit));
    }

    #[test]
    fn test_critical_issue_blocks_confirm() {
        let (mut store, mut intake) = store_with(&["a.jpg"]);
        let mut result = ExtractionResult::default();
        result.data.set_value(FieldName::TransactionId, "T1");
        result.issues.push(Issue {
            severity: IssueSeverity::Error,
            message: "amount missing".into(),
            field: Some("amount".into()),
        });
        store.merge_outcome(
            &mut intake,
            "a.jpg",
            FileOutcome::Extracted { result, is_duplicate: false },
        );
        assert!(!available_actions(&store).contains(&ReviewAction::Confirm));

        let lines = item_lines(store.queue.current().unwrap(), 0, 1);
        assert!(lines.iter().any(|l| l.contains("✖ amount missing")));
    }

    #[test]
    fn test_item_lines_show_error() {
        let (mut store, mut intake) = store_with(&["bad.jpg"]);
        store.merge_outcome(&mut intake, "bad.jpg", FileOutcome::Failed { message: "timeout".into() });
        let lines = item_lines(&store.queue.items()[0], 0, 1);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[1/1] bad.jpg"));
        assert!(lines[1].contains("timeout"));
    }

    #[test]
    fn test_notice_printer_skips_seen() {
        let mut center = NotificationCenter::new();
        let mut printer = NoticePrinter::default();
        center.push(NotificationKind::Info, "one");
        assert_eq!(printer.unseen(&center).len(), 1);
        assert!(printer.unseen(&center).is_empty());
        center.push(NotificationKind::Warning, "two");
        let fresh = printer.unseen(&center);
        assert_eq!(fresh.len(), 1);
        assert_eq!(notification_line(fresh[0]), "⚠ two");
    }
}
