use std::path::PathBuf;
use thiserror::Error;

/// 外部コマンドの実行エラー
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("コマンドを起動できません: {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("コマンドが失敗しました (exit {}): {command}: {stderr}", exit_label(.code))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("ログを書き込めません: {path}: {source}")]
    LogWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

/// 個別ビルダーのエラー
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("ファイル操作に失敗しました: {path}: {source}")]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("テンプレートの展開に失敗しました: {name}: {source}")]
    Template {
        name: &'static str,
        #[source]
        source: tera::Error,
    },

    #[error("{service} のソースディレクトリが設定されていません")]
    SourceDirectoryMissing { service: &'static str },
}

impl BuildError {
    pub(crate) fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileSystem {
            path: path.into(),
            source,
        }
    }

    /// ユーザー向けの分かりやすいエラーメッセージ
    pub fn user_message(&self) -> String {
        match self {
            BuildError::Process(ProcessError::Spawn { command, .. }) => {
                let program = command.split_whitespace().next().unwrap_or(command);
                format!(
                    "コマンドを起動できません: {}\n\
                     \n\
                     {} がインストールされ、PATH が通っているか確認してください。",
                    command, program
                )
            }
            BuildError::Process(ProcessError::Failed { command, stderr, .. }) => {
                format!(
                    "コマンドが失敗しました: {}\n\
                     \n\
                     {}\n\
                     \n\
                     詳細は ~/.mds/stack/logs/ のログを確認してください。",
                    command, stderr
                )
            }
            BuildError::SourceDirectoryMissing { service } => {
                format!(
                    "{} のソースディレクトリが設定されていません。\n\
                     \n\
                     local / localDev モードを使う場合は `cloudbox init` で\n\
                     ソースディレクトリを指定してください。",
                    service
                )
            }
            _ => format!("{}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;

/// 構成処理全体のエラー
#[derive(Debug, Error)]
pub enum StackError {
    #[error("設定ディレクトリを初期化できません: {path}: {source}")]
    DirectoryReset {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("マニフェストを書き込めません: {path}: {source}")]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("認証情報を書き込めません: {path}: {source}")]
    CredentialsWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("認証情報をシリアライズできません: {0}")]
    CredentialsEncode(#[from] serde_json::Error),

    #[error("ビルドに失敗したサービスがあります: {}", .failed.join(", "))]
    BuildsFailed { failed: Vec<String> },

    #[error("スタックの操作に失敗しました: {0}")]
    Lifecycle(#[from] ProcessError),
}
