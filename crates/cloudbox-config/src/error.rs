use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("ホームディレクトリが見つかりません")]
    HomeDirNotFound,

    #[error("{path} が見つかりません。{hint}")]
    ArtifactNotFound { path: PathBuf, hint: &'static str },

    #[error("{path} の解析に失敗しました: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("不明なビルド失敗ポリシー: {0} (lenient / abort / omit-failed)")]
    InvalidPolicy(String),

    #[error("JSONエラー: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
