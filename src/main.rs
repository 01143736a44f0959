use clap::Parser;
use receipt_review::{cli, client, config, error, progress, review, scanner};
use cli::{AccountAction, Cli, Commands};
use client::ApiClient;
use config::Config;
use error::{ReceiptError, Result};
use receipt_review_common::fields;
use receipt_review_common::linkage;
use receipt_review_common::notify::messages;
use receipt_review_common::store::{NewFile, ReviewStore};
use receipt_review_common::types::{sort_transactions, KnownAccount};
use receipt_review_common::workflow;
use std::cell::RefCell;
use std::path::PathBuf;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = Config::load()?;

    let base = cli.api_base.clone().unwrap_or_else(|| config.api_base());
    let client = ApiClient::with_base(&config, base)?;

    match cli.command {
        Commands::Health => {
            println!("🔌 バックエンド確認: {}", client.base());
            if client
                .wait_for_backend(config.health_attempts, config.health_interval_ms)
                .await
            {
                println!("✔ 接続OK");
            } else {
                println!("✖ {}", messages::backend_unreachable());
                return Err(ReceiptError::BackendUnreachable(client.base().to_string()));
            }
        }

        Commands::Process { paths, batch, no_review, output } => {
            println!("🧾 receipt-review - レシート処理\n");

            // 1. 接続確認
            println!("[1/3] バックエンドを確認中...");
            if !client
                .wait_for_backend(config.health_attempts, config.health_interval_ms)
                .await
            {
                println!("✖ {}", messages::backend_unreachable());
                return Err(ReceiptError::BackendUnreachable(client.base().to_string()));
            }
            println!("✔ 接続OK\n");

            // 2. 画像スキャン
            println!("[2/3] 画像をスキャン中...");
            let images = scanner::collect_images(&paths)?;
            if images.is_empty() {
                let target: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
                return Err(ReceiptError::NoImagesFound(target.join(", ")));
            }
            println!("✔ {}枚のレシートを検出\n", images.len());

            // 3. 抽出
            println!("[3/3] 抽出中...{}", if batch { " (一括)" } else { "" });
            let files: Vec<NewFile<PathBuf>> = images
                .into_iter()
                .map(|image| NewFile {
                    name: image.file_name,
                    image_url: image.path.display().to_string(),
                    upload: image.path,
                })
                .collect();

            let store = RefCell::new(ReviewStore::new());
            let tracked = progress::Tracked::new(&client, progress::extraction_bar(files.len() as u64));
            let summary = if batch {
                workflow::process_intake_batch(&store, &tracked, files).await
            } else {
                workflow::process_intake(&store, &tracked, files).await
            };
            tracked.finish();

            if let Some(summary) = summary {
                println!(
                    "✔ 抽出完了 (全{}件 / 重複{}件 / 要確認{}件 / 失敗{}件)",
                    summary.total, summary.duplicates, summary.needs_review, summary.failed
                );
            }

            if !no_review {
                review::run_interactive_review(&store, &client).await?;
            } else {
                let mut printer = review::NoticePrinter::default();
                printer.print(&store.borrow().notifications);
            }

            if let Some(output) = output {
                review::write_queue_report(&store.borrow(), &output)?;
                println!("✔ キューを保存: {}", output.display());
            }

            println!("\n✅ 完了");
        }

        Commands::Search { filters, sort, desc } => {
            let filters = filters.to_filters();
            let mut page = client.transactions(&filters).await?;
            if let Some(column) = sort.as_deref() {
                sort_transactions(&mut page.transactions, column, !desc);
            }

            println!("🔍 検索結果: {}件", page.total);
            for tx in &page.transactions {
                println!(
                    "  {} | {} | {} → {} | {} | {}",
                    tx.field("transaction_id"),
                    tx.field("datetime"),
                    tx.field("from_account"),
                    tx.field("to_account"),
                    tx.field("receiver_name"),
                    tx.field("amount"),
                );
            }
            println!("  合計金額: {:.2}", page.total_amount());
        }

        Commands::Export { filters, format, output } => {
            let filters = filters.to_filters();
            let output = output.unwrap_or_else(|| {
                let date = chrono::Local::now().format("%Y-%m-%d");
                PathBuf::from(format!("transactions_{}.{}", date, format.extension()))
            });

            println!("📄 エクスポート中 ({})...", format);
            let bytes = client.export_transactions(&filters, format).await?;
            std::fs::write(&output, bytes)?;
            println!("✔ 保存しました: {}", output.display());
        }

        Commands::Accounts { action } => match action {
            AccountAction::List => {
                let accounts = client.known_accounts().await?;
                println!("既知口座: {}件", accounts.len());
                for account in accounts {
                    println!("  {}  {}", account.account_number, account.owner_name);
                }
            }
            AccountAction::Add { account_number, owner_name } => {
                let account = KnownAccount {
                    account_number: account_number.trim().to_string(),
                    owner_name: owner_name.trim().to_string(),
                };
                client.add_account(&account).await?;
                println!("✔ 追加しました: {}", account.account_number);
            }
            AccountAction::Remove { account_number } => {
                client.delete_account(&account_number).await?;
                println!("✔ 削除しました: {}", account_number);
            }
            AccountAction::Search { query } => {
                for account in client.search_accounts(&query).await? {
                    println!(
                        "  {}  {}",
                        account.value,
                        account.display_name.as_deref().unwrap_or("")
                    );
                }
            }
        },

        Commands::Receivers { query, to_account } => {
            let to_account = to_account.unwrap_or_default();
            let results = client
                .search_receivers(&query, Some(to_account.as_str()))
                .await?;
            for suggestion in &results {
                let mark = if linkage::is_linked(suggestion, &to_account) {
                    "🔗"
                } else {
                    "  "
                };
                println!(
                    "{} {} ×{}{}",
                    mark,
                    suggestion.value,
                    suggestion.frequency,
                    if suggestion.verified { " ✔" } else { "" }
                );
            }
        }

        Commands::Show { id } => {
            let tx = client.transaction(&id).await?;
            println!("取引 {}", tx.id_text());
            for def in fields::definitions() {
                println!("  {} {}: {}", def.icon, def.label, tx.field(def.name.as_str()));
            }
            if let Some(created_at) = &tx.created_at {
                println!("  登録日時: {}", created_at);
            }
            println!("  画像: {}", if tx.has_archive() { "あり" } else { "なし" });
        }

        Commands::Stats => {
            let stats = client.statistics().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }

        Commands::Archive { id, output } => {
            let bytes = client.archive(&id).await?;
            std::fs::write(&output, bytes)?;
            println!("✔ 画像を保存: {}", output.display());
        }

        Commands::Delete { id, yes } => {
            let sure = yes
                || dialoguer::Confirm::new()
                    .with_prompt(format!("レシート {} を削除しますか？", id))
                    .default(false)
                    .interact()?;
            if sure {
                client.delete_receipt(&id).await?;
                println!("✔ 削除しました: {}", id);
            }
        }

        Commands::Config { set_api_base, show } => {
            let mut config = config;

            if let Some(base) = set_api_base {
                config.set_api_base(base)?;
                println!("✔ バックエンドURLを設定しました");
            }

            if show {
                println!("設定:");
                println!("  バックエンドURL: {}", config.api_base());
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!(
                    "  起動確認: {}回 × {}ms",
                    config.health_attempts, config.health_interval_ms
                );
            }
        }
    }

    Ok(())
}
