use crate::progress;
use crate::utils;
use cloudbox_build::StackManager;
use cloudbox_config::{BuildFailurePolicy, StackPaths};
use colored::Colorize;

pub async fn handle(paths: &StackPaths, policy: BuildFailurePolicy) -> anyhow::Result<()> {
    let settings = cloudbox_config::load_settings(paths)?;
    let config = cloudbox_config::load_config(paths)?;

    println!("{}", "スタックを構成中...".yellow());
    println!("ルート: {}", paths.root().display().to_string().cyan());
    println!("ビルド失敗時: {}", policy.as_str().cyan());
    utils::print_modes(&config);
    println!();

    let (reporter, display) = progress::spawn("Configuring stack...");

    let mut manager = StackManager::new(paths.clone())
        .with_reporter(reporter)
        .with_policy(policy);
    let result = manager.configure(settings, config).await;
    // 送信側をすべて閉じて表示タスクを終わらせる
    drop(manager);
    display.await?;

    let report = result?;
    println!();
    println!(
        "{} {} サービス",
        "✓ 構成が完了しました:".green().bold(),
        report.service_count
    );
    println!("  • {}", report.manifest_path.display().to_string().cyan());
    println!("  • {}", report.credentials_path.display().to_string().cyan());

    if !report.is_clean() {
        println!();
        println!(
            "{} {}",
            "⚠ ビルドに失敗したサービス:".yellow().bold(),
            report.failed.join(", ")
        );
        println!("  詳細は {} を確認してください", paths.logs_dir().display());
    }

    Ok(())
}
