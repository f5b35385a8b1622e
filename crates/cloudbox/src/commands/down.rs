use crate::progress;
use cloudbox_build::StackManager;
use cloudbox_config::StackPaths;
use colored::Colorize;

pub async fn handle(paths: &StackPaths) -> anyhow::Result<()> {
    println!("{}", "スタックを停止中...".yellow());

    let (reporter, display) = progress::spawn("Stopping stack...");

    let manager = StackManager::new(paths.clone()).with_reporter(reporter);
    let result = manager.down().await;
    drop(manager);
    display.await?;
    result?;

    println!("{}", "✓ スタックを停止しました".green().bold());
    Ok(())
}
