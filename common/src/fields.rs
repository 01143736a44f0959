//! フィールド定義と信頼度の区分

use crate::types::FieldName;

/// 入力欄の文字方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDir {
    Ltr,
    Rtl,
}

impl TextDir {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextDir::Ltr => "ltr",
            TextDir::Rtl => "rtl",
        }
    }
}

/// フィールドの表示定義
#[derive(Debug, Clone, Copy)]
pub struct FieldDefinition {
    pub name: FieldName,
    pub label: &'static str,
    pub icon: &'static str,
    pub dir: TextDir,
    pub align_right: bool,
    /// 要確認かつ低信頼度のとき強調表示する
    pub critical: bool,
    pub show_confidence: bool,
    /// 2列レイアウトの上段に並べる
    pub compact: bool,
    pub is_date: bool,
    /// 受取人名の候補入力を使う
    pub autocomplete: bool,
}

const DEFINITIONS: [FieldDefinition; 7] = [
    FieldDefinition {
        name: FieldName::TransactionId,
        label: "رقم العملية",
        icon: "🔢",
        dir: TextDir::Ltr,
        align_right: false,
        critical: true,
        show_confidence: true,
        compact: true,
        is_date: false,
        autocomplete: false,
    },
    FieldDefinition {
        name: FieldName::Datetime,
        label: "التاريخ",
        icon: "📅",
        dir: TextDir::Ltr,
        align_right: false,
        critical: false,
        show_confidence: true,
        compact: true,
        is_date: true,
        autocomplete: false,
    },
    FieldDefinition {
        name: FieldName::FromAccount,
        label: "من حساب",
        icon: "🏦",
        dir: TextDir::Ltr,
        align_right: false,
        critical: true,
        show_confidence: true,
        compact: false,
        is_date: false,
        autocomplete: false,
    },
    FieldDefinition {
        name: FieldName::ToAccount,
        label: "إلى حساب",
        icon: "🏦",
        dir: TextDir::Ltr,
        align_right: false,
        critical: true,
        show_confidence: true,
        compact: false,
        is_date: false,
        autocomplete: false,
    },
    FieldDefinition {
        name: FieldName::ReceiverName,
        label: "اسم المرسل إليه",
        icon: "👤",
        dir: TextDir::Rtl,
        align_right: true,
        critical: false,
        show_confidence: false,
        compact: false,
        is_date: false,
        autocomplete: true,
    },
    FieldDefinition {
        name: FieldName::Comment,
        label: "التعليق",
        icon: "💬",
        dir: TextDir::Ltr,
        align_right: true,
        critical: false,
        show_confidence: false,
        compact: false,
        is_date: false,
        autocomplete: false,
    },
    FieldDefinition {
        name: FieldName::Amount,
        label: "المبلغ",
        icon: "💰",
        dir: TextDir::Ltr,
        align_right: false,
        critical: true,
        show_confidence: true,
        compact: false,
        is_date: false,
        autocomplete: false,
    },
];

/// 全フィールド定義（表示順）
pub fn definitions() -> &'static [FieldDefinition] {
    &DEFINITIONS
}

pub fn definition(name: FieldName) -> &'static FieldDefinition {
    DEFINITIONS
        .iter()
        .find(|d| d.name == name)
        .unwrap_or(&DEFINITIONS[0])
}

/// 強調表示のしきい値
pub const HIGHLIGHT_THRESHOLD: f64 = 0.9;

/// 信頼度バッジの区分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    /// 0.9以上: 高、0.75以上: 中、それ未満: 低
    pub fn from_score(confidence: f64) -> Self {
        if confidence >= 0.9 {
            ConfidenceLevel::High
        } else if confidence >= 0.75 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
        }
    }
}

/// 信頼度のパーセント表示（四捨五入）
pub fn confidence_percent(confidence: f64) -> u32 {
    (confidence * 100.0).round().clamp(0.0, 100.0) as u32
}

/// 入力欄を強調表示するか
pub fn should_highlight(name: FieldName, needs_review: bool, confidence: Option<f64>) -> bool {
    definition(name).critical
        && needs_review
        && confidence.map(|c| c < HIGHLIGHT_THRESHOLD).unwrap_or(true)
}

/// 日付が自動変換された形式か（"/" 区切り）
pub fn is_converted_date(name: FieldName, value: &str) -> bool {
    definition(name).is_date && value.contains('/')
}
