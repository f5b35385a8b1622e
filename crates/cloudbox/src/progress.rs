use cloudbox_build::{Reporter, StackEvent};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// 構成処理の進捗表示
///
/// status はスピナーのメッセージを更新し、milestone はスピナーの上に行として残す。
pub struct StackProgress {
    progress_bar: ProgressBar,
}

impl StackProgress {
    pub fn new(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb.set_message(message.to_string());

        Self { progress_bar: pb }
    }

    pub fn handle(&self, event: &StackEvent) {
        match event {
            StackEvent::Status(message) => self.progress_bar.set_message(message.clone()),
            StackEvent::Milestone(message) => self
                .progress_bar
                .println(format!("  {} {}", "✓".green(), message)),
        }
    }

    pub fn finish(&self) {
        self.progress_bar.finish_and_clear();
    }
}

/// 進捗表示タスクを起動し、そこへ送る Reporter を返す
///
/// Reporter（とその複製）がすべて破棄されるとタスクは終了する。
pub fn spawn(message: &'static str) -> (Reporter, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let display = tokio::spawn(async move {
        let progress = StackProgress::new(message);
        while let Some(event) = rx.recv().await {
            progress.handle(&event);
        }
        progress.finish();
    });
    (Reporter::new(tx), display)
}
