use crate::progress;
use cloudbox_build::StackManager;
use cloudbox_config::StackPaths;
use colored::Colorize;

/// Kibana の公開ポート
const KIBANA_URL: &str = "http://localhost:5601";

pub async fn handle(paths: &StackPaths) -> anyhow::Result<()> {
    if !paths.manifest_file().is_file() {
        anyhow::bail!(
            "{} が見つかりません。先に `cloudbox build` を実行してください。",
            paths.manifest_file().display()
        );
    }
    let credentials = cloudbox_config::load_credentials(paths)?;

    let (reporter, display) = progress::spawn("Starting stack...");

    let manager = StackManager::new(paths.clone()).with_reporter(reporter);
    let result = manager.up().await;
    drop(manager);
    display.await?;
    result?;

    println!("{}", "✓ スタックを起動しました".green().bold());
    println!();
    println!(
        "  Mongo:  {}",
        credentials.mongo_url("localhost").cyan()
    );
    println!("  Kibana: {}", KIBANA_URL.cyan());
    println!(
        "  ログ:   {}",
        paths.log_file("stack-init.log").display()
    );

    Ok(())
}
