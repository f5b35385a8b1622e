//! デプロイモード定義

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// サービスごとのデプロイモード
///
/// JSON形式: `"stable" | "latest" | "local" | "localDev"`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeploymentMode {
    /// 公開済みの安定版イメージ（デフォルト）
    #[default]
    Stable,
    /// 公開済みの最新イメージ
    Latest,
    /// ローカルのソースツリーからイメージをビルド
    Local,
    /// ホスト上で直接実行（コンテナ構成には含めない）
    LocalDev,
}

impl DeploymentMode {
    pub const ALL: [DeploymentMode; 4] = [
        DeploymentMode::Stable,
        DeploymentMode::Latest,
        DeploymentMode::Local,
        DeploymentMode::LocalDev,
    ];

    /// 文字列からパース
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "stable" => Some(Self::Stable),
            "latest" => Some(Self::Latest),
            "local" => Some(Self::Local),
            "localDev" | "local-dev" | "localdev" => Some(Self::LocalDev),
            _ => None,
        }
    }

    /// 設定ファイルで使用する文字列に変換
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Latest => "latest",
            Self::Local => "local",
            Self::LocalDev => "localDev",
        }
    }

    /// イメージをローカルでビルドするか
    pub fn builds_image(&self) -> bool {
        matches!(self, Self::Local)
    }

    /// サービスがホスト上で動作するか（ループバック経由で接続する）
    pub fn runs_on_host(&self) -> bool {
        matches!(self, Self::LocalDev)
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| CoreError::UnknownDeploymentMode(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_config_strings() {
        for mode in DeploymentMode::ALL {
            assert_eq!(DeploymentMode::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(DeploymentMode::parse("local-dev"), Some(DeploymentMode::LocalDev));
        assert_eq!(DeploymentMode::parse("nightly"), None);
    }

    #[test]
    fn test_from_str_error() {
        let err = "nightly".parse::<DeploymentMode>().unwrap_err();
        assert!(matches!(err, CoreError::UnknownDeploymentMode(ref s) if s == "nightly"));
    }

    #[test]
    fn test_serde_uses_camel_case() {
        let json = serde_json::to_string(&DeploymentMode::LocalDev).unwrap();
        assert_eq!(json, "\"localDev\"");

        let mode: DeploymentMode = serde_json::from_str("\"latest\"").unwrap();
        assert_eq!(mode, DeploymentMode::Latest);
    }

    #[test]
    fn test_mode_branches_are_exclusive() {
        assert!(DeploymentMode::Local.builds_image());
        assert!(!DeploymentMode::Local.runs_on_host());
        assert!(DeploymentMode::LocalDev.runs_on_host());
        assert!(!DeploymentMode::LocalDev.builds_image());
        assert!(!DeploymentMode::Stable.builds_image());
        assert!(!DeploymentMode::Latest.runs_on_host());
    }
}
