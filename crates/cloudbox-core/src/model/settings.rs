//! スタック設定（settings.json / config.json）

use super::mode::DeploymentMode;
use crate::error::CoreError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// デプロイモードを選択できるアプリケーションサービス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackService {
    Identity,
    Notification,
    Queue,
    File,
    ServerlessFunctions,
    DockerMinion,
    StateMachine,
}

impl StackService {
    /// 表示順
    pub const ALL: [StackService; 7] = [
        StackService::Identity,
        StackService::Notification,
        StackService::Queue,
        StackService::File,
        StackService::ServerlessFunctions,
        StackService::DockerMinion,
        StackService::StateMachine,
    ];

    /// config.json のキー
    pub fn key(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Notification => "notification",
            Self::Queue => "queue",
            Self::File => "file",
            Self::ServerlessFunctions => "serverlessFunctions",
            Self::DockerMinion => "dockerMinion",
            Self::StateMachine => "stateMachine",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Notification => "notification service",
            Self::Queue => "queue service",
            Self::File => "file service",
            Self::ServerlessFunctions => "serverless functions service",
            Self::DockerMinion => "docker minion",
            Self::StateMachine => "state machine service",
        }
    }
}

impl fmt::Display for StackService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for StackService {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|service| service.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::UnknownService(s.to_string()))
    }
}

/// ローカル環境の設定（settings.json）
///
/// 各サービスのソースディレクトリと、デフォルトの管理者パスワードを保持する。
/// ソースディレクトリは `local` / `localDev` モードでのみ必要。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackSettings {
    #[serde(
        default,
        deserialize_with = "deserialize_source_dir",
        skip_serializing_if = "Option::is_none"
    )]
    pub identity_service_source_directory: Option<PathBuf>,
    #[serde(
        default,
        deserialize_with = "deserialize_source_dir",
        skip_serializing_if = "Option::is_none"
    )]
    pub notification_service_source_directory: Option<PathBuf>,
    #[serde(
        default,
        deserialize_with = "deserialize_source_dir",
        skip_serializing_if = "Option::is_none"
    )]
    pub queue_service_source_directory: Option<PathBuf>,
    #[serde(
        default,
        deserialize_with = "deserialize_source_dir",
        skip_serializing_if = "Option::is_none"
    )]
    pub file_service_source_directory: Option<PathBuf>,
    #[serde(
        default,
        deserialize_with = "deserialize_source_dir",
        skip_serializing_if = "Option::is_none"
    )]
    pub serverless_functions_service_source_directory: Option<PathBuf>,
    #[serde(
        default,
        deserialize_with = "deserialize_source_dir",
        skip_serializing_if = "Option::is_none"
    )]
    pub docker_minion_service_source_directory: Option<PathBuf>,
    #[serde(
        default,
        deserialize_with = "deserialize_source_dir",
        skip_serializing_if = "Option::is_none"
    )]
    pub state_machine_service_source_directory: Option<PathBuf>,
    #[serde(default)]
    pub default_admin_password: String,
}

impl StackSettings {
    /// サービスのソースディレクトリを取得
    pub fn source_directory(&self, service: StackService) -> Option<&Path> {
        let dir = match service {
            StackService::Identity => &self.identity_service_source_directory,
            StackService::Notification => &self.notification_service_source_directory,
            StackService::Queue => &self.queue_service_source_directory,
            StackService::File => &self.file_service_source_directory,
            StackService::ServerlessFunctions => {
                &self.serverless_functions_service_source_directory
            }
            StackService::DockerMinion => &self.docker_minion_service_source_directory,
            StackService::StateMachine => &self.state_machine_service_source_directory,
        };
        dir.as_deref()
    }

    /// サービスのソースディレクトリを設定（末尾の `/` は取り除く）
    pub fn set_source_directory(&mut self, service: StackService, dir: impl Into<PathBuf>) {
        let dir = normalize_dir(dir.into());
        let slot = match service {
            StackService::Identity => &mut self.identity_service_source_directory,
            StackService::Notification => &mut self.notification_service_source_directory,
            StackService::Queue => &mut self.queue_service_source_directory,
            StackService::File => &mut self.file_service_source_directory,
            StackService::ServerlessFunctions => {
                &mut self.serverless_functions_service_source_directory
            }
            StackService::DockerMinion => &mut self.docker_minion_service_source_directory,
            StackService::StateMachine => &mut self.state_machine_service_source_directory,
        };
        *slot = Some(dir);
    }
}

/// settings.json を手で編集した場合も `set_source_directory` と同じ形にそろえる
fn deserialize_source_dir<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<PathBuf>::deserialize(deserializer)?.map(normalize_dir))
}

fn normalize_dir(dir: PathBuf) -> PathBuf {
    let raw = dir.to_string_lossy();
    if raw.len() > 1 && raw.ends_with('/') {
        PathBuf::from(raw.trim_end_matches('/'))
    } else {
        dir
    }
}

/// サービスごとのデプロイモード選択（config.json）
///
/// 未指定のサービスは `stable` として扱う。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackConfig {
    #[serde(default)]
    pub identity: DeploymentMode,
    #[serde(default)]
    pub notification: DeploymentMode,
    #[serde(default)]
    pub queue: DeploymentMode,
    #[serde(default)]
    pub file: DeploymentMode,
    #[serde(default)]
    pub serverless_functions: DeploymentMode,
    #[serde(default)]
    pub docker_minion: DeploymentMode,
    #[serde(default)]
    pub state_machine: DeploymentMode,
}

impl StackConfig {
    /// 全サービスを同じモードにした設定
    pub fn uniform(mode: DeploymentMode) -> Self {
        Self {
            identity: mode,
            notification: mode,
            queue: mode,
            file: mode,
            serverless_functions: mode,
            docker_minion: mode,
            state_machine: mode,
        }
    }

    pub fn mode(&self, service: StackService) -> DeploymentMode {
        match service {
            StackService::Identity => self.identity,
            StackService::Notification => self.notification,
            StackService::Queue => self.queue,
            StackService::File => self.file,
            StackService::ServerlessFunctions => self.serverless_functions,
            StackService::DockerMinion => self.docker_minion,
            StackService::StateMachine => self.state_machine,
        }
    }

    pub fn set_mode(&mut self, service: StackService, mode: DeploymentMode) {
        let slot = match service {
            StackService::Identity => &mut self.identity,
            StackService::Notification => &mut self.notification,
            StackService::Queue => &mut self.queue,
            StackService::File => &mut self.file,
            StackService::ServerlessFunctions => &mut self.serverless_functions,
            StackService::DockerMinion => &mut self.docker_minion,
            StackService::StateMachine => &mut self.state_machine,
        };
        *slot = mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_json_keys() {
        let json = r#"{
            "identityServiceSourceDirectory": "/src/identity",
            "serverlessFunctionsServiceSourceDirectory": "/src/sf",
            "defaultAdminPassword": "secret"
        }"#;
        let settings: StackSettings = serde_json::from_str(json).unwrap();

        assert_eq!(
            settings.source_directory(StackService::Identity),
            Some(Path::new("/src/identity"))
        );
        assert_eq!(
            settings.source_directory(StackService::ServerlessFunctions),
            Some(Path::new("/src/sf"))
        );
        assert_eq!(settings.source_directory(StackService::Queue), None);
        assert_eq!(settings.default_admin_password, "secret");
    }

    #[test]
    fn test_loaded_source_directories_are_normalized() {
        let json = r#"{
            "identityServiceSourceDirectory": "/src/identity/",
            "stateMachineServiceSourceDirectory": "/src/sm//",
            "fileServiceSourceDirectory": null,
            "defaultAdminPassword": "secret"
        }"#;
        let settings: StackSettings = serde_json::from_str(json).unwrap();

        assert_eq!(
            settings.source_directory(StackService::Identity),
            Some(Path::new("/src/identity"))
        );
        assert_eq!(
            settings.source_directory(StackService::StateMachine),
            Some(Path::new("/src/sm"))
        );
        assert_eq!(settings.source_directory(StackService::File), None);
    }

    #[test]
    fn test_set_source_directory_strips_trailing_slash() {
        let mut settings = StackSettings::default();
        settings.set_source_directory(StackService::DockerMinion, "/src/minion/");
        assert_eq!(
            settings.source_directory(StackService::DockerMinion),
            Some(Path::new("/src/minion"))
        );

        settings.set_source_directory(StackService::File, "/");
        assert_eq!(settings.source_directory(StackService::File), Some(Path::new("/")));
    }

    #[test]
    fn test_config_missing_keys_default_to_stable() {
        let config: StackConfig =
            serde_json::from_str(r#"{"identity": "localDev", "dockerMinion": "local"}"#).unwrap();

        assert_eq!(config.mode(StackService::Identity), DeploymentMode::LocalDev);
        assert_eq!(config.mode(StackService::DockerMinion), DeploymentMode::Local);
        assert_eq!(config.mode(StackService::Queue), DeploymentMode::Stable);
    }

    #[test]
    fn test_config_rejects_unknown_mode() {
        let result: Result<StackConfig, _> = serde_json::from_str(r#"{"identity": "nightly"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_set_mode_and_uniform() {
        let mut config = StackConfig::uniform(DeploymentMode::Latest);
        config.set_mode(StackService::StateMachine, DeploymentMode::Local);

        assert_eq!(config.mode(StackService::Identity), DeploymentMode::Latest);
        assert_eq!(config.mode(StackService::StateMachine), DeploymentMode::Local);
    }

    #[test]
    fn test_service_from_key() {
        assert_eq!(
            "serverlessFunctions".parse::<StackService>().unwrap(),
            StackService::ServerlessFunctions
        );
        assert_eq!("dockerminion".parse::<StackService>().unwrap(), StackService::DockerMinion);
        assert!("billing".parse::<StackService>().is_err());
    }
}
