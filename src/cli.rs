use clap::{Args, Parser, Subcommand};
use receipt_review_common::types::{ExportFormat, TransactionFilters};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "receipt-review")]
#[command(about = "銀行振込レシートの抽出結果レビューツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// バックエンドURL（設定ファイルより優先）
    #[arg(long, global = true)]
    pub api_base: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// バックエンドの起動確認
    Health,

    /// レシート画像を抽出してレビュー
    Process {
        /// 画像ファイルまたはフォルダ
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// 一括抽出エンドポイントを使う
        #[arg(long)]
        batch: bool,

        /// 対話レビューを行わない
        #[arg(long)]
        no_review: bool,

        /// キューの状態をJSONで保存
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 保存済み取引を検索
    Search {
        #[command(flatten)]
        filters: FilterArgs,

        /// 並べ替える列
        #[arg(long)]
        sort: Option<String>,

        /// 降順で並べ替え
        #[arg(long)]
        desc: bool,
    },

    /// 検索結果をファイルに出力
    Export {
        #[command(flatten)]
        filters: FilterArgs,

        /// 出力形式 (csv/json)
        #[arg(short, long, default_value = "json")]
        format: ExportFormat,

        /// 出力ファイル（デフォルト: transactions_日付.形式）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 既知口座の管理
    Accounts {
        #[command(subcommand)]
        action: AccountAction,
    },

    /// 受取人名を検索
    Receivers {
        /// 検索語（2文字以上）
        #[arg(required = true)]
        query: String,

        /// 宛先口座（紐付いた名前を優先）
        #[arg(long)]
        to_account: Option<String>,
    },

    /// 取引の詳細を表示
    Show {
        /// 取引番号
        #[arg(required = true)]
        id: String,
    },

    /// 統計を表示
    Stats,

    /// 保存済みレシート画像を取得
    Archive {
        /// レシートID
        #[arg(required = true)]
        id: String,

        /// 出力ファイル
        #[arg(short, long)]
        output: PathBuf,
    },

    /// 保存済みレシートを削除
    Delete {
        /// レシートID
        #[arg(required = true)]
        id: String,

        /// 確認せずに削除
        #[arg(short, long)]
        yes: bool,
    },

    /// 設定を表示/編集
    Config {
        /// バックエンドURLを設定
        #[arg(long)]
        set_api_base: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[derive(Subcommand)]
pub enum AccountAction {
    /// 一覧
    List,
    /// 追加
    Add {
        account_number: String,
        owner_name: String,
    },
    /// 削除
    Remove { account_number: String },
    /// 番号・名前で検索
    Search { query: String },
}

/// 取引の検索条件
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    #[arg(long)]
    pub transaction_id: Option<String>,
    #[arg(long)]
    pub from_account: Option<String>,
    #[arg(long)]
    pub to_account: Option<String>,
    #[arg(long)]
    pub receiver_name: Option<String>,
    /// 開始日 (YYYY-MM-DD)
    #[arg(long)]
    pub date_from: Option<String>,
    /// 終了日 (YYYY-MM-DD)
    #[arg(long)]
    pub date_to: Option<String>,
    #[arg(long)]
    pub min_amount: Option<String>,
    #[arg(long)]
    pub max_amount: Option<String>,
}

impl FilterArgs {
    pub fn to_filters(&self) -> TransactionFilters {
        let mut filters = TransactionFilters::default();
        let pairs = [
            ("transaction_id", &self.transaction_id),
            ("from_account", &self.from_account),
            ("to_account", &self.to_account),
            ("receiver_name", &self.receiver_name),
            ("date_from", &self.date_from),
            ("date_to", &self.date_to),
            ("min_amount", &self.min_amount),
            ("max_amount", &self.max_amount),
        ];
        for (key, value) in pairs {
            if let Some(value) = value {
                filters.set(key, value.trim());
            }
        }
        filters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_args() {
        let cli = Cli::parse_from(["receipt-review", "process", "a.jpg", "dir", "--batch", "-o", "out.json"]);
        match cli.command {
            Commands::Process { paths, batch, no_review, output } => {
                assert_eq!(paths.len(), 2);
                assert!(batch);
                assert!(!no_review);
                assert_eq!(output, Some(PathBuf::from("out.json")));
            }
            _ => panic!("process expected"),
        }
    }

    #[test]
    fn test_export_filters() {
        let cli = Cli::parse_from([
            "receipt-review", "export", "--format", "csv", "--from-account", " 111 ", "--min-amount", "50",
        ]);
        match cli.command {
            Commands::Export { filters, format, output } => {
                assert_eq!(format, ExportFormat::Csv);
                assert!(output.is_none());
                let filters = filters.to_filters();
                assert_eq!(filters.active_pairs(), vec![("from_account", "111"), ("min_amount", "50")]);
            }
            _ => panic!("export expected"),
        }
    }

    #[test]
    fn test_unknown_export_format_rejected() {
        let result = Cli::try_parse_from(["receipt-review", "export", "--format", "xlsx"]);
        assert!(result.is_err());
    }
}
