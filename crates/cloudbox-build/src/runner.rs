//! 外部コマンドの実行
//!
//! docker / ssh-keygen / openssl などの呼び出しは全て [`CommandRunner`] を経由する。
//! テストでは [`RecordingRunner`] に差し替えてコマンド文字列を検証する。

use crate::error::ProcessError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Mutex;
use tokio::process::Command;

/// 起動直前に呼ばれるコールバック
pub type StartCallback<'a> = Box<dyn FnOnce() + Send + 'a>;

/// 実行するコマンド
pub struct ProcessCommand<'a> {
    /// シェルに渡すコマンドライン
    pub command: String,
    /// 作業ディレクトリ（未指定ならカレントディレクトリ）
    pub working_dir: Option<PathBuf>,
    /// 成功時に出力を書き出すファイル
    pub log_file: Option<PathBuf>,
    pub on_start: Option<StartCallback<'a>>,
}

impl<'a> ProcessCommand<'a> {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            working_dir: None,
            log_file: None,
            on_start: None,
        }
    }

    pub fn working_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn log_file(mut self, path: impl AsRef<Path>) -> Self {
        self.log_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn on_start(mut self, callback: impl FnOnce() + Send + 'a) -> Self {
        self.on_start = Some(Box::new(callback));
        self
    }
}

impl std::fmt::Debug for ProcessCommand<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessCommand")
            .field("command", &self.command)
            .field("working_dir", &self.working_dir)
            .field("log_file", &self.log_file)
            .field("on_start", &self.on_start.is_some())
            .finish()
    }
}

/// 外部コマンドの実行ポート
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// コマンドを実行し、終了を待つ
    ///
    /// 非ゼロ終了は [`ProcessError::Failed`]。リトライはしない。
    async fn execute(&self, command: ProcessCommand<'_>) -> Result<(), ProcessError>;
}

/// `sh -c` でコマンドを実行するランナー
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn execute(&self, command: ProcessCommand<'_>) -> Result<(), ProcessError> {
        let ProcessCommand {
            command,
            working_dir,
            log_file,
            on_start,
        } = command;

        if let Some(callback) = on_start {
            callback();
        }

        tracing::debug!(
            "Running: {} (cwd: {})",
            command,
            working_dir
                .as_deref()
                .map_or_else(|| ".".to_string(), |d| d.display().to_string())
        );

        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(&command);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        if let Some(dir) = &working_dir {
            cmd.current_dir(dir);
        }

        let output = match cmd.output().await {
            Ok(output) => output,
            Err(source) => return Err(ProcessError::Spawn { command, source }),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ProcessError::Failed {
                command,
                code: output.status.code(),
                stderr,
            });
        }

        if let Some(path) = log_file {
            // stdout が空ならstderrを残す（ssh-keygen などは stderr に出力する）
            let body = if output.stdout.is_empty() {
                &output.stderr
            } else {
                &output.stdout
            };
            if let Err(source) = tokio::fs::write(&path, body).await {
                return Err(ProcessError::LogWrite { path, source });
            }
        }

        Ok(())
    }
}

/// 記録されたコマンド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommand {
    pub command: String,
    pub working_dir: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

/// 実行せずにコマンドを記録するランナー（テスト用）
///
/// `on_start` は実際のランナーと同じく呼び出す。
#[derive(Debug, Default)]
pub struct RecordingRunner {
    executed: Mutex<Vec<RecordedCommand>>,
    failing: Vec<String>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// `pattern` を含むコマンドを失敗させる
    pub fn failing_on(mut self, pattern: impl Into<String>) -> Self {
        self.failing.push(pattern.into());
        self
    }

    pub fn executed(&self) -> Vec<RecordedCommand> {
        self.lock().clone()
    }

    /// 実行順のコマンド文字列
    pub fn commands(&self) -> Vec<String> {
        self.lock().iter().map(|c| c.command.clone()).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<RecordedCommand>> {
        self.executed.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn execute(&self, command: ProcessCommand<'_>) -> Result<(), ProcessError> {
        let ProcessCommand {
            command,
            working_dir,
            log_file,
            on_start,
        } = command;

        if let Some(callback) = on_start {
            callback();
        }

        self.lock().push(RecordedCommand {
            command: command.clone(),
            working_dir,
            log_file,
        });

        if self.failing.iter().any(|pattern| command.contains(pattern)) {
            return Err(ProcessError::Failed {
                command,
                code: Some(1),
                stderr: "simulated failure".to_string(),
            });
        }

        Ok(())
    }
}
