//! ボリューム定義

use std::path::Path;

/// ボリュームマッピング
///
/// `source` がパス区切り (`/`) を含む場合はバインドマウント、
/// 含まない場合はマニフェスト全体で宣言される名前付きボリュームとして扱う。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMapping {
    pub source: String,
    pub container_path: String,
    /// アクセスモード（`ro`, `ro,Z` など）。そのまま末尾に付加される
    pub mode: Option<String>,
}

impl VolumeMapping {
    /// ホストパスのバインドマウント
    pub fn bind(host: impl AsRef<Path>, container_path: impl Into<String>) -> Self {
        Self {
            source: host.as_ref().display().to_string(),
            container_path: container_path.into(),
            mode: None,
        }
    }

    /// 名前付きボリューム
    pub fn named(name: impl Into<String>, container_path: impl Into<String>) -> Self {
        Self {
            source: name.into(),
            container_path: container_path.into(),
            mode: None,
        }
    }

    pub fn mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    /// 読み取り専用
    pub fn read_only(self) -> Self {
        self.mode("ro")
    }

    pub fn is_named(&self) -> bool {
        !self.source.contains('/')
    }
}
