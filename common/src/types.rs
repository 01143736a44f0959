//! バックエンドとやり取りする型の定義
//!
//! CLIとWeb(WASM)で共有される型:
//! - ExtractionResult: `/api/extract/single` の出力
//! - BatchExtraction: `/api/extract/batch` の出力
//! - ReceiptPayload: `/api/receipts` へ送る確定データ
//! - Transaction / TransactionFilters: 検索・エクスポート

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// 抽出対象フィールド
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    TransactionId,
    Datetime,
    FromAccount,
    ToAccount,
    ReceiverName,
    Comment,
    Amount,
}

impl FieldName {
    /// 表示順
    pub const ALL: [FieldName; 7] = [
        FieldName::TransactionId,
        FieldName::Datetime,
        FieldName::FromAccount,
        FieldName::ToAccount,
        FieldName::ReceiverName,
        FieldName::Comment,
        FieldName::Amount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::TransactionId => "transaction_id",
            FieldName::Datetime => "datetime",
            FieldName::FromAccount => "from_account",
            FieldName::ToAccount => "to_account",
            FieldName::ReceiverName => "receiver_name",
            FieldName::Comment => "comment",
            FieldName::Amount => "amount",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.as_str() == name)
    }
}

/// 文字列・数値・nullのいずれでも受け付ける
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// 1フィールド分の抽出値
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    #[serde(default, deserialize_with = "lenient_string")]
    pub value: String,

    #[serde(default)]
    pub confidence: Option<f64>,

    #[serde(default)]
    pub needs_review: bool,
}

/// 抽出データ（フィールドごとに任意）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_account: Option<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_account: Option<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver_name: Option<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<FieldValue>,
}

impl ExtractedData {
    fn slot(&self, field: FieldName) -> &Option<FieldValue> {
        match field {
            FieldName::TransactionId => &self.transaction_id,
            FieldName::Datetime => &self.datetime,
            FieldName::FromAccount => &self.from_account,
            FieldName::ToAccount => &self.to_account,
            FieldName::ReceiverName => &self.receiver_name,
            FieldName::Comment => &self.comment,
            FieldName::Amount => &self.amount,
        }
    }

    fn slot_mut(&mut self, field: FieldName) -> &mut Option<FieldValue> {
        match field {
            FieldName::TransactionId => &mut self.transaction_id,
            FieldName::Datetime => &mut self.datetime,
            FieldName::FromAccount => &mut self.from_account,
            FieldName::ToAccount => &mut self.to_account,
            FieldName::ReceiverName => &mut self.receiver_name,
            FieldName::Comment => &mut self.comment,
            FieldName::Amount => &mut self.amount,
        }
    }

    pub fn get(&self, field: FieldName) -> Option<&FieldValue> {
        self.slot(field).as_ref()
    }

    /// 値（未抽出は空文字）
    pub fn value(&self, field: FieldName) -> &str {
        self.get(field).map(|f| f.value.as_str()).unwrap_or("")
    }

    /// 利用者による編集: 値を置き換え、要確認フラグを下ろす
    ///
    /// 信頼度は残す（表示用）。エントリが無ければ作成する
    pub fn set_value(&mut self, field: FieldName, value: impl Into<String>) {
        let slot = self.slot_mut(field).get_or_insert_with(FieldValue::default);
        slot.value = value.into();
        slot.needs_review = false;
    }

    /// 要確認のフィールド数
    pub fn pending_review_count(&self) -> usize {
        FieldName::ALL
            .iter()
            .filter(|f| self.get(**f).map(|v| v.needs_review).unwrap_or(false))
            .count()
    }

    /// 取引番号（空白のみは無しとみなす）
    pub fn transaction_id(&self) -> Option<&str> {
        let id = self.value(FieldName::TransactionId).trim();
        if id.is_empty() {
            None
        } else {
            Some(id)
        }
    }
}

/// 問題の重要度
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Error,
    Warning,
    #[default]
    #[serde(other)]
    Info,
}

/// バックエンドが検出した問題
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default)]
    pub severity: IssueSeverity,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl Issue {
    /// 確定をブロックする問題か
    pub fn is_critical(&self) -> bool {
        self.severity == IssueSeverity::Error
    }
}

/// 1枚分の抽出結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(default)]
    pub data: ExtractedData,

    #[serde(default)]
    pub overall_confidence: f64,

    #[serde(default)]
    pub needs_review: bool,

    #[serde(default)]
    pub issues: Vec<Issue>,

    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub receipt_type: Option<String>,

    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub temp_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub archive_path: Option<String>,
}

/// 一括抽出の1件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    #[serde(default)]
    pub filename: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(flatten)]
    pub result: ExtractionResult,
}

/// 一括抽出の応答
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchExtraction {
    #[serde(default)]
    pub results: Vec<BatchItem>,
}

/// 重複チェックの応答
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateCheck {
    #[serde(default)]
    pub exists: bool,
}

/// 確定データ（フラットなJSON）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceiptPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_id: Option<String>,
    pub filename: String,
    pub transaction_id: String,
    pub datetime: String,
    pub from_account: String,
    pub to_account: String,
    pub receiver_name: String,
    pub comment: String,
    pub amount: String,
    pub receipt_type: String,
    pub confidence: f64,
}

impl ReceiptPayload {
    /// 抽出データとメタデータから組み立てる（欠損は空文字）
    pub fn assemble(
        filename: &str,
        data: &ExtractedData,
        receipt_type: Option<&str>,
        confidence: Option<f64>,
        temp_id: Option<&str>,
    ) -> Self {
        Self {
            temp_id: temp_id.map(str::to_string),
            filename: filename.to_string(),
            transaction_id: data.value(FieldName::TransactionId).to_string(),
            datetime: data.value(FieldName::Datetime).to_string(),
            from_account: data.value(FieldName::FromAccount).to_string(),
            to_account: data.value(FieldName::ToAccount).to_string(),
            receiver_name: data.value(FieldName::ReceiverName).to_string(),
            comment: data.value(FieldName::Comment).to_string(),
            amount: data.value(FieldName::Amount).to_string(),
            receipt_type: receipt_type.unwrap_or_default().to_string(),
            confidence: confidence.unwrap_or(0.0),
        }
    }
}

/// 受取人名の候補
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceiverSuggestion {
    #[serde(default, deserialize_with = "lenient_string")]
    pub value: String,

    /// 紐付いた口座番号
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub display_name: Option<String>,

    #[serde(default)]
    pub frequency: u32,

    #[serde(default)]
    pub verified: bool,
}

/// 口座番号の候補
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountSuggestion {
    #[serde(default, deserialize_with = "lenient_string")]
    pub value: String,

    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub display_name: Option<String>,
}

/// 登録済み口座
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnownAccount {
    #[serde(default, alias = "value", deserialize_with = "lenient_string")]
    pub account_number: String,

    #[serde(default, alias = "display_name", deserialize_with = "lenient_string")]
    pub owner_name: String,
}

/// 検索フィルタ（空の値はクエリに含めない）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionFilters {
    pub transaction_id: String,
    pub from_account: String,
    pub to_account: String,
    pub receiver_name: String,
    pub date_from: String,
    pub date_to: String,
    pub min_amount: String,
    pub max_amount: String,
}

impl TransactionFilters {
    /// 空でない (キー, 値) の組
    pub fn active_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("transaction_id", self.transaction_id.as_str()),
            ("from_account", self.from_account.as_str()),
            ("to_account", self.to_account.as_str()),
            ("receiver_name", self.receiver_name.as_str()),
            ("date_from", self.date_from.as_str()),
            ("date_to", self.date_to.as_str()),
            ("min_amount", self.min_amount.as_str()),
            ("max_amount", self.max_amount.as_str()),
        ]
        .into_iter()
        .filter(|(_, v)| !v.trim().is_empty())
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.active_pairs().is_empty()
    }

    /// キー名で値を取得（未知のキーは空文字）
    pub fn get(&self, key: &str) -> &str {
        match key {
            "transaction_id" => &self.transaction_id,
            "from_account" => &self.from_account,
            "to_account" => &self.to_account,
            "receiver_name" => &self.receiver_name,
            "date_from" => &self.date_from,
            "date_to" => &self.date_to,
            "min_amount" => &self.min_amount,
            "max_amount" => &self.max_amount,
            _ => "",
        }
    }

    /// キー名で値を設定（未知のキーは無視）
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let slot = match key {
            "transaction_id" => &mut self.transaction_id,
            "from_account" => &mut self.from_account,
            "to_account" => &mut self.to_account,
            "receiver_name" => &mut self.receiver_name,
            "date_from" => &mut self.date_from,
            "date_to" => &mut self.date_to,
            "min_amount" => &mut self.min_amount,
            "max_amount" => &mut self.max_amount,
            _ => return,
        };
        *slot = value.into();
    }
}

/// 保存済み取引（`fields.<name>.field_value` 形式）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub id: Value,

    #[serde(default)]
    pub fields: Map<String, Value>,

    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub created_at: Option<String>,

    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub archive_path: Option<String>,
}

impl Transaction {
    /// 表示用ID
    pub fn id_text(&self) -> String {
        match &self.id {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// フィールド値（無ければ空文字）
    pub fn field(&self, name: &str) -> String {
        match self.fields.get(name).and_then(|f| f.get("field_value")) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// 取引番号・受取人名・口座・コメントのいずれかに含むか（大文字小文字は区別しない）
    pub fn matches_text(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        ["transaction_id", "receiver_name", "from_account", "to_account", "comment"]
            .iter()
            .any(|name| self.field(name).to_lowercase().contains(&query))
    }

    pub fn has_archive(&self) -> bool {
        self.archive_path.as_deref().map(|p| !p.is_empty()).unwrap_or(false)
    }

    /// 金額（数値化できなければ0）
    pub fn amount(&self) -> f64 {
        self.field("amount")
            .replace(',', "")
            .trim()
            .parse()
            .unwrap_or(0.0)
    }
}

/// 検索結果ページ
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionPage {
    #[serde(default)]
    pub transactions: Vec<Transaction>,

    #[serde(default)]
    pub total: u64,
}

impl TransactionPage {
    /// 金額の合計
    pub fn total_amount(&self) -> f64 {
        self.transactions.iter().map(Transaction::amount).sum()
    }
}

/// 列で並べ替え（"id" はID、それ以外はフィールド値）
pub fn sort_transactions(transactions: &mut [Transaction], column: &str, ascending: bool) {
    transactions.sort_by(|a, b| {
        let ordering = if column == "id" {
            a.id_text().cmp(&b.id_text())
        } else if column == "amount" {
            a.amount().total_cmp(&b.amount())
        } else {
            a.field(column).cmp(&b.field(column))
        };
        if ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
}

/// エクスポート形式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    #[default]
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(format!("Unknown format: {}. Use csv or json", s)),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_name_roundtrip_str() {
        for field in FieldName::ALL {
            assert_eq!(FieldName::parse(field.as_str()), Some(field));
        }
        assert_eq!(FieldName::parse("unknown"), None);
    }

    #[test]
    fn test_extraction_result_deserialize() {
        let json = r#"{
            "data": {
                "transaction_id": {"value": "TRX-1001", "confidence": 0.97, "needs_review": false},
                "amount": {"value": 1500.5, "confidence": 0.62, "needs_review": true},
                "comment": {"value": null},
                "bank_logo": {"value": "ignored"}
            },
            "overall_confidence": 0.81,
            "needs_review": true,
            "issues": [{"severity": "error", "message": "amount unreadable", "field": "amount"}],
            "receipt_type": "transfer",
            "temp_id": 42,
            "archive_path": "archive/2026/a.jpg"
        }"#;

        let result: ExtractionResult = serde_json::from_str(json).expect("デシリアライズ失敗");
        assert_eq!(result.data.value(FieldName::TransactionId), "TRX-1001");
        assert_eq!(result.data.value(FieldName::Amount), "1500.5");
        assert_eq!(result.data.value(FieldName::Comment), "");
        assert_eq!(result.data.value(FieldName::ToAccount), "");
        assert_eq!(result.data.pending_review_count(), 1);
        assert_eq!(result.temp_id.as_deref(), Some("42"));
        assert!(result.issues[0].is_critical());
    }

    #[test]
    fn test_extraction_result_minimal() {
        let result: ExtractionResult = serde_json::from_str("{}").expect("デシリアライズ失敗");
        assert_eq!(result.overall_confidence, 0.0);
        assert!(result.issues.is_empty());
        assert!(result.data.transaction_id().is_none());
    }

    #[test]
    fn test_unknown_severity_is_info() {
        let issue: Issue = serde_json::from_value(json!({"severity": "notice", "message": "x"}))
            .expect("デシリアライズ失敗");
        assert_eq!(issue.severity, IssueSeverity::Info);
        assert!(!issue.is_critical());
    }

    #[test]
    fn test_set_value_clears_needs_review_and_creates_entry() {
        let mut data = ExtractedData {
            amount: Some(FieldValue {
                value: "10".into(),
                confidence: Some(0.3),
                needs_review: true,
            }),
            ..Default::default()
        };
        data.set_value(FieldName::Amount, "100");
        data.set_value(FieldName::Comment, "rent");

        let amount = data.get(FieldName::Amount).unwrap();
        assert_eq!(amount.value, "100");
        assert!(!amount.needs_review);
        assert_eq!(amount.confidence, Some(0.3));
        assert_eq!(data.value(FieldName::Comment), "rent");
    }

    #[test]
    fn test_batch_extraction_deserialize() {
        let json = r#"{"results": [
            {"filename": "a.jpg", "data": {"transaction_id": {"value": "1"}}, "overall_confidence": 0.9},
            {"filename": "b.jpg", "error": "unreadable image"}
        ]}"#;

        let batch: BatchExtraction = serde_json::from_str(json).expect("デシリアライズ失敗");
        assert_eq!(batch.results.len(), 2);
        assert_eq!(batch.results[0].result.data.value(FieldName::TransactionId), "1");
        assert_eq!(batch.results[1].error.as_deref(), Some("unreadable image"));
    }

    #[test]
    fn test_payload_assemble_fills_missing_with_empty() {
        let mut data = ExtractedData::default();
        data.set_value(FieldName::TransactionId, "TRX-9");
        data.set_value(FieldName::Amount, "250");

        let payload = ReceiptPayload::assemble("r1.jpg", &data, None, None, Some("tmp-1"));
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["filename"], "r1.jpg");
        assert_eq!(json["transaction_id"], "TRX-9");
        assert_eq!(json["to_account"], "");
        assert_eq!(json["receipt_type"], "");
        assert_eq!(json["confidence"], 0.0);
        assert_eq!(json["temp_id"], "tmp-1");
    }

    #[test]
    fn test_payload_omits_missing_temp_id() {
        let payload = ReceiptPayload::assemble("r.jpg", &ExtractedData::default(), Some("x"), Some(0.5), None);
        let json = serde_json::to_string(&payload).unwrap();
        assert!(!json.contains("temp_id"));
    }

    #[test]
    fn test_filters_skip_empty_values() {
        let mut filters = TransactionFilters::default();
        assert!(filters.is_empty());
        filters.set("to_account", "12345");
        filters.set("receiver_name", "  ");
        filters.set("nonsense", "x");
        assert_eq!(filters.active_pairs(), vec![("to_account", "12345")]);
        assert_eq!(filters.get("receiver_name"), "  ");
        assert_eq!(filters.get("nonsense"), "");
    }

    #[test]
    fn test_transaction_fields_and_sort() {
        let page: TransactionPage = serde_json::from_value(json!({
            "transactions": [
                {"id": 2, "fields": {"amount": {"field_value": "1,000"}, "receiver_name": {"field_value": "ب"}}},
                {"id": 1, "fields": {"amount": {"field_value": 50}}, "archive_path": "a.jpg"}
            ],
            "total": 2
        }))
        .unwrap();

        assert_eq!(page.total_amount(), 1050.0);
        assert!(page.transactions[1].has_archive());
        assert_eq!(page.transactions[1].field("receiver_name"), "");

        let mut rows = page.transactions.clone();
        sort_transactions(&mut rows, "amount", true);
        assert_eq!(rows[0].id_text(), "1");
        sort_transactions(&mut rows, "id", false);
        assert_eq!(rows[0].id_text(), "2");
    }

    #[test]
    fn test_transaction_text_match() {
        let tx: Transaction = serde_json::from_value(json!({
            "id": 7,
            "fields": {
                "transaction_id": {"field_value": "TRX900"},
                "comment": {"field_value": "Rent March"}
            }
        }))
        .unwrap();

        assert!(tx.matches_text(""));
        assert!(tx.matches_text("trx9"));
        assert!(tx.matches_text(" rent "));
        assert!(!tx.matches_text("salary"));
    }

    #[test]
    fn test_known_account_aliases() {
        let account: KnownAccount =
            serde_json::from_value(json!({"value": "0011", "display_name": "شركة"})).unwrap();
        assert_eq!(account.account_number, "0011");
        assert_eq!(account.owner_name, "شركة");
    }
}
