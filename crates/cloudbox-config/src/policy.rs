//! ビルド失敗時の扱い

use crate::error::{ConfigError, Result};
use std::fmt;
use std::str::FromStr;

/// ポリシーを指定する環境変数
pub const POLICY_ENV: &str = "CLOUDBOX_BUILD_FAILURE_POLICY";

/// 個別サービスのビルドが失敗したときの扱い
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildFailurePolicy {
    /// ログに記録し、全サービスをマニフェストに含める（デフォルト）
    #[default]
    Lenient,
    /// 成果物を書き出さずにエラーを返す
    Abort,
    /// 失敗したビルダーのサービスだけを除外する
    OmitFailed,
}

impl BuildFailurePolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "lenient" => Some(Self::Lenient),
            "abort" => Some(Self::Abort),
            "omit-failed" | "omit_failed" | "omitfailed" => Some(Self::OmitFailed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lenient => "lenient",
            Self::Abort => "abort",
            Self::OmitFailed => "omit-failed",
        }
    }

    /// 環境変数から取得（未設定ならデフォルト）
    pub fn from_env() -> Result<Self> {
        match std::env::var(POLICY_ENV) {
            Ok(value) if !value.trim().is_empty() => value.trim().parse(),
            _ => Ok(Self::default()),
        }
    }
}

impl fmt::Display for BuildFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildFailurePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ConfigError::InvalidPolicy(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse() {
        assert_eq!(BuildFailurePolicy::parse("abort"), Some(BuildFailurePolicy::Abort));
        assert_eq!(
            BuildFailurePolicy::parse("OMIT_FAILED"),
            Some(BuildFailurePolicy::OmitFailed)
        );
        assert_eq!(BuildFailurePolicy::parse("retry"), None);
        assert!(matches!(
            "retry".parse::<BuildFailurePolicy>(),
            Err(ConfigError::InvalidPolicy(_))
        ));
    }

    #[test]
    #[serial]
    fn test_from_env_defaults_to_lenient() {
        temp_env::with_var_unset(POLICY_ENV, || {
            assert_eq!(BuildFailurePolicy::from_env().unwrap(), BuildFailurePolicy::Lenient);
        });
        temp_env::with_var(POLICY_ENV, Some(""), || {
            assert_eq!(BuildFailurePolicy::from_env().unwrap(), BuildFailurePolicy::Lenient);
        });
    }

    #[test]
    #[serial]
    fn test_from_env() {
        temp_env::with_var(POLICY_ENV, Some("omit-failed"), || {
            assert_eq!(
                BuildFailurePolicy::from_env().unwrap(),
                BuildFailurePolicy::OmitFailed
            );
        });
        temp_env::with_var(POLICY_ENV, Some("sometimes"), || {
            assert!(BuildFailurePolicy::from_env().is_err());
        });
    }
}
