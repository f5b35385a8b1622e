//! cloudbox のスタックディレクトリと設定ファイル
//!
//! スタックのルートは `$MDS_STACK_ROOT`、未設定なら `~/.mds/stack`。
//!
//! ```text
//! <root>/
//! ├── configs/            各サービスの設定（構成のたびに作り直す）
//! ├── logs/               外部コマンドのログ
//! ├── docker-compose.yml
//! ├── settings.json
//! ├── config.json
//! └── stack-creds.json
//! ```

pub mod error;
pub mod policy;

pub use error::*;
pub use policy::{BuildFailurePolicy, POLICY_ENV};

use cloudbox_core::{StackConfig, StackCredentials, StackSettings};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// スタックのルートを指定する環境変数
pub const STACK_ROOT_ENV: &str = "MDS_STACK_ROOT";

pub const MANIFEST_FILE: &str = "docker-compose.yml";
pub const SETTINGS_FILE: &str = "settings.json";
pub const CONFIG_FILE: &str = "config.json";
pub const CREDENTIALS_FILE: &str = "stack-creds.json";

/// スタックディレクトリ内の各パス
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackPaths {
    root: PathBuf,
}

impl StackPaths {
    /// 相対パスはカレントディレクトリ基準で絶対パスにする
    ///
    /// マニフェストのバインドマウント元はこのルートから組み立てられるため。
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = std::path::absolute(root)?;
        Ok(Self { root })
    }

    /// 環境変数またはホームディレクトリからルートを決定
    pub fn discover() -> Result<Self> {
        if let Ok(root) = std::env::var(STACK_ROOT_ENV)
            && !root.is_empty()
        {
            return Self::new(root);
        }

        let home = dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)?;
        Self::new(home.join(".mds").join("stack"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 生成される設定ファイルのルート
    pub fn configs_dir(&self) -> PathBuf {
        self.root.join("configs")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn log_file(&self, name: &str) -> PathBuf {
        self.logs_dir().join(name)
    }

    pub fn manifest_file(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn credentials_file(&self) -> PathBuf {
        self.root.join(CREDENTIALS_FILE)
    }

    /// ルートと logs/ を作成
    pub fn ensure(&self) -> Result<()> {
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}

/// settings.json を読み込む
pub fn load_settings(paths: &StackPaths) -> Result<StackSettings> {
    read_json(
        &paths.settings_file(),
        "`cloudbox init` で作成してください。",
    )
}

pub fn save_settings(paths: &StackPaths, settings: &StackSettings) -> Result<()> {
    write_json(&paths.settings_file(), settings)
}

/// config.json を読み込む
///
/// ファイルが無い場合は全サービス `stable` として扱う。
pub fn load_config(paths: &StackPaths) -> Result<StackConfig> {
    let path = paths.config_file();
    if !path.exists() {
        return Ok(StackConfig::default());
    }
    read_json(&path, "")
}

pub fn save_config(paths: &StackPaths, config: &StackConfig) -> Result<()> {
    write_json(&paths.config_file(), config)
}

/// 直近の構成で生成された認証情報を読み込む
pub fn load_credentials(paths: &StackPaths) -> Result<StackCredentials> {
    read_json(
        &paths.credentials_file(),
        "先に `cloudbox build` を実行してください。",
    )
}

fn read_json<T: DeserializeOwned>(path: &Path, hint: &'static str) -> Result<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::ArtifactNotFound {
                path: path.to_path_buf(),
                hint,
            });
        }
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// 整形済みJSONとして書き出す（親ディレクトリは必要なら作成）
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}
