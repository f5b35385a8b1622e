//! スタック構成のオーケストレーション
//!
//! 設定ディレクトリを初期化し、全ビルダーを並行に実行して
//! `docker-compose.yml` と `stack-creds.json` を書き出す。

use crate::builders::{self, ServiceBuilder};
use crate::context::BuildContext;
use crate::error::StackError;
use crate::reporter::Reporter;
use crate::runner::{CommandRunner, ProcessCommand, ShellRunner};
use cloudbox_config::{BuildFailurePolicy, StackPaths};
use cloudbox_core::{
    BuildArguments, ComposeFile, ComposeService, RandomSecrets, SecretGenerator, StackConfig,
    StackCredentials, StackSettings,
};
use futures_util::future::join_all;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// docker compose のプロジェクト名
pub const PROJECT_NAME: &str = "mds-stack";

/// 構成処理の段階
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigureStage {
    #[default]
    Idle,
    ResettingConfigRoot,
    GeneratingCredentials,
    RunningBuilders,
    AggregatingManifest,
    WritingArtifacts,
    Done,
    Failed,
}

impl ConfigureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ResettingConfigRoot => "resetting config root",
            Self::GeneratingCredentials => "generating credentials",
            Self::RunningBuilders => "running builders",
            Self::AggregatingManifest => "aggregating manifest",
            Self::WritingArtifacts => "writing artifacts",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ConfigureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `configure` の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigureReport {
    pub manifest_path: PathBuf,
    pub credentials_path: PathBuf,
    /// マニフェストに載ったサービス数
    pub service_count: usize,
    /// ビルドに失敗したビルダーの識別子（登録順）
    pub failed: Vec<String>,
}

impl ConfigureReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// スタック全体の構成と起動・停止
pub struct StackManager {
    paths: StackPaths,
    runner: Arc<dyn CommandRunner>,
    secrets: Arc<dyn SecretGenerator>,
    reporter: Reporter,
    policy: BuildFailurePolicy,
    builders: Vec<Box<dyn ServiceBuilder>>,
    stage: ConfigureStage,
}

impl StackManager {
    /// シェル実行・乱数生成・登録済みの全ビルダーで初期化
    pub fn new(paths: StackPaths) -> Self {
        Self {
            paths,
            runner: Arc::new(ShellRunner),
            secrets: Arc::new(RandomSecrets),
            reporter: Reporter::silent(),
            policy: BuildFailurePolicy::default(),
            builders: builders::registry(),
            stage: ConfigureStage::Idle,
        }
    }

    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_secrets(mut self, secrets: Arc<dyn SecretGenerator>) -> Self {
        self.secrets = secrets;
        self
    }

    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_policy(mut self, policy: BuildFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// ビルダー一覧を差し替える（登録順がマニフェストの順序になる）
    pub fn with_builders(mut self, builders: Vec<Box<dyn ServiceBuilder>>) -> Self {
        self.builders = builders;
        self
    }

    pub fn paths(&self) -> &StackPaths {
        &self.paths
    }

    pub fn policy(&self) -> BuildFailurePolicy {
        self.policy
    }

    pub fn stage(&self) -> ConfigureStage {
        self.stage
    }

    fn enter(&mut self, stage: ConfigureStage) {
        tracing::info!(stage = %stage, "Stack configuration stage");
        self.stage = stage;
    }

    /// スタックを構成する
    ///
    /// ビルダーの失敗は `BuildFailurePolicy` に従って扱う。
    /// ディレクトリ初期化と成果物の書き込みの失敗は常にエラー。
    pub async fn configure(
        &mut self,
        settings: StackSettings,
        config: StackConfig,
    ) -> Result<ConfigureReport, StackError> {
        self.enter(ConfigureStage::ResettingConfigRoot);
        let configs = self.paths.configs_dir();
        let manifest_path = self.paths.manifest_file();
        let (reset, ()) = tokio::join!(reset_dir(&configs), remove_stale_manifest(&manifest_path));
        let prepared = match reset {
            Ok(()) => ensure_logs_dir(&self.paths).await,
            Err(e) => Err(e),
        };
        if let Err(e) = prepared {
            self.enter(ConfigureStage::Failed);
            return Err(e);
        }

        self.enter(ConfigureStage::GeneratingCredentials);
        let credentials = StackCredentials::generate(self.secrets.as_ref());
        let args = BuildArguments::new(settings, config, credentials);

        self.enter(ConfigureStage::RunningBuilders);
        let (fragments, failed) = self.run_builders(&args).await;

        if !failed.is_empty() && self.policy == BuildFailurePolicy::Abort {
            self.enter(ConfigureStage::Failed);
            return Err(StackError::BuildsFailed { failed });
        }

        self.enter(ConfigureStage::AggregatingManifest);
        let services: Vec<ComposeService> = fragments
            .into_iter()
            .filter(|(identifier, _)| {
                self.policy != BuildFailurePolicy::OmitFailed
                    || !failed.iter().any(|f| f == identifier)
            })
            .flat_map(|(_, services)| services)
            .collect();
        let compose = ComposeFile::new(services);
        let service_count = compose.services.len();
        let manifest = compose.render();

        self.enter(ConfigureStage::WritingArtifacts);
        let credentials_path = self.paths.credentials_file();
        if let Err(e) = write_artifacts(&manifest_path, &manifest, &credentials_path, &args).await
        {
            self.enter(ConfigureStage::Failed);
            return Err(e);
        }

        self.enter(ConfigureStage::Done);
        Ok(ConfigureReport {
            manifest_path,
            credentials_path,
            service_count,
            failed,
        })
    }

    /// 全ビルダーを並行実行し、(識別子, 断片) の一覧と失敗した識別子を返す
    ///
    /// 断片は実行前に登録順で確定させるため、完了順に依存しない。
    async fn run_builders(
        &self,
        args: &BuildArguments,
    ) -> (Vec<(&'static str, Vec<ComposeService>)>, Vec<String>) {
        let ctx = BuildContext::new(self.runner.clone(), self.secrets.clone(), self.paths.clone())
            .with_reporter(self.reporter.clone());

        let mut fragments = Vec::with_capacity(self.builders.len());
        let mut builds = Vec::with_capacity(self.builders.len());
        for builder in &self.builders {
            let identifier = builder.identifier();
            fragments.push((identifier, builder.manifest_fragments(&self.paths, args)));

            let scoped = ctx.scoped(identifier);
            builds.push(async move { builder.build(&scoped, args).await });
        }

        let results = join_all(builds).await;

        let mut failed = Vec::new();
        for ((identifier, _), result) in fragments.iter().zip(results) {
            if let Err(e) = result {
                tracing::error!(builder = %identifier, error = %e, "{}", e.user_message());
                failed.push(identifier.to_string());
            }
        }

        (fragments, failed)
    }

    /// `docker compose up -d` でスタックを起動
    pub async fn up(&self) -> Result<(), StackError> {
        self.compose("up -d", "stack-init.log", "Starting stack").await
    }

    /// `docker compose down -v` でスタックを停止し、ボリュームも削除
    pub async fn down(&self) -> Result<(), StackError> {
        self.compose("down -v", "stack-down.log", "Stopping stack").await
    }

    async fn compose(
        &self,
        action: &str,
        log_name: &str,
        announce: &str,
    ) -> Result<(), StackError> {
        ensure_logs_dir(&self.paths).await?;
        let command = format!("docker compose -p {} {}", PROJECT_NAME, action);
        tracing::debug!(command = %command, "Running compose command");

        let reporter = self.reporter.clone();
        let announce = announce.to_string();
        self.runner
            .execute(
                ProcessCommand::new(command)
                    .working_dir(self.paths.root())
                    .log_file(self.paths.log_file(log_name))
                    .on_start(move || reporter.status(announce)),
            )
            .await?;
        Ok(())
    }
}

impl fmt::Debug for StackManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let identifiers: Vec<_> = self.builders.iter().map(|b| b.identifier()).collect();
        f.debug_struct("StackManager")
            .field("paths", &self.paths)
            .field("policy", &self.policy)
            .field("builders", &identifiers)
            .field("stage", &self.stage)
            .finish_non_exhaustive()
    }
}

/// 削除して作り直す（存在しなくてもよい）
async fn reset_dir(path: &Path) -> Result<(), StackError> {
    let reset_error = |source| StackError::DirectoryReset {
        path: path.to_path_buf(),
        source,
    };

    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(reset_error(e)),
    }
    tokio::fs::create_dir_all(path).await.map_err(reset_error)
}

async fn remove_stale_manifest(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(path = %path.display(), error = %e, "Failed to remove previous manifest");
    }
}

async fn ensure_logs_dir(paths: &StackPaths) -> Result<(), StackError> {
    let logs = paths.logs_dir();
    tokio::fs::create_dir_all(&logs)
        .await
        .map_err(|source| StackError::DirectoryReset {
            path: logs.clone(),
            source,
        })
}

async fn write_artifacts(
    manifest_path: &Path,
    manifest: &str,
    credentials_path: &Path,
    args: &BuildArguments,
) -> Result<(), StackError> {
    tokio::fs::write(manifest_path, manifest)
        .await
        .map_err(|source| StackError::ManifestWrite {
            path: manifest_path.to_path_buf(),
            source,
        })?;

    let credentials = serde_json::to_string_pretty(&args.credentials)?;
    tokio::fs::write(credentials_path, credentials)
        .await
        .map_err(|source| StackError::CredentialsWrite {
            path: credentials_path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::RedisBuilder;
    use crate::builders::test_support::FixedSecrets;
    use crate::error::{BuildError, Result as BuildResult};
    use crate::runner::RecordingRunner;
    use async_trait::async_trait;
    use cloudbox_core::DeploymentMode;
    use std::time::Duration;

    /// 指定時間待ってから完了（または失敗）するビルダー
    struct Delayed {
        identifier: &'static str,
        key: &'static str,
        delay_ms: u64,
        fail: bool,
    }

    #[async_trait]
    impl ServiceBuilder for Delayed {
        fn identifier(&self) -> &'static str {
            self.identifier
        }

        async fn write_configs(
            &self,
            _ctx: &BuildContext,
            _args: &BuildArguments,
        ) -> BuildResult<()> {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            if self.fail {
                return Err(BuildError::SourceDirectoryMissing { service: "test" });
            }
            Ok(())
        }

        fn manifest_fragments(
            &self,
            _paths: &StackPaths,
            _args: &BuildArguments,
        ) -> Vec<ComposeService> {
            vec![ComposeService::new(self.key).image("busybox")]
        }
    }

    fn manager(root: &Path, builders: Vec<Box<dyn ServiceBuilder>>) -> StackManager {
        StackManager::new(StackPaths::new(root).unwrap())
            .with_runner(Arc::new(RecordingRunner::new()))
            .with_secrets(Arc::new(FixedSecrets))
            .with_builders(builders)
    }

    fn delayed(
        identifier: &'static str,
        key: &'static str,
        delay_ms: u64,
        fail: bool,
    ) -> Box<dyn ServiceBuilder> {
        Box::new(Delayed {
            identifier,
            key,
            delay_ms,
            fail,
        })
    }

    #[tokio::test]
    async fn test_fragment_order_follows_registration() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = manager(
            dir.path(),
            vec![
                delayed("Slow", "slow", 50, false),
                delayed("Fast", "fast", 0, false),
            ],
        );

        let report = manager
            .configure(StackSettings::default(), StackConfig::default())
            .await
            .unwrap();

        let manifest = std::fs::read_to_string(&report.manifest_path).unwrap();
        let slow = manifest.find("  slow:").unwrap();
        let fast = manifest.find("  fast:").unwrap();
        assert!(slow < fast);
        assert_eq!(report.service_count, 2);
        assert!(report.is_clean());
        assert_eq!(manager.stage(), ConfigureStage::Done);
    }

    #[tokio::test]
    async fn test_reset_clears_previous_configs() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("configs/old/file.txt");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, "old").unwrap();

        let mut manager = manager(dir.path(), vec![Box::new(RedisBuilder)]);
        manager
            .configure(StackSettings::default(), StackConfig::default())
            .await
            .unwrap();

        assert!(!stale.exists());
        assert!(dir.path().join("configs").is_dir());
        assert!(dir.path().join("logs").is_dir());
    }

    #[tokio::test]
    async fn test_lenient_policy_keeps_failed_fragments() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = manager(
            dir.path(),
            vec![delayed("Broken", "broken", 0, true), delayed("Ok", "ok", 0, false)],
        );

        let report = manager
            .configure(StackSettings::default(), StackConfig::default())
            .await
            .unwrap();

        assert_eq!(report.failed, vec!["Broken"]);
        assert_eq!(report.service_count, 2);
        assert!(dir.path().join("stack-creds.json").is_file());
    }

    #[tokio::test]
    async fn test_omit_failed_policy_drops_fragments() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = manager(
            dir.path(),
            vec![delayed("Broken", "broken", 0, true), delayed("Ok", "ok", 0, false)],
        )
        .with_policy(BuildFailurePolicy::OmitFailed);

        let report = manager
            .configure(StackSettings::default(), StackConfig::default())
            .await
            .unwrap();

        let manifest = std::fs::read_to_string(&report.manifest_path).unwrap();
        assert!(!manifest.contains("broken:"));
        assert!(manifest.contains("  ok:"));
        assert_eq!(report.service_count, 1);
    }

    #[tokio::test]
    async fn test_abort_policy_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = manager(dir.path(), vec![delayed("Broken", "broken", 0, true)])
            .with_policy(BuildFailurePolicy::Abort);

        let err = manager
            .configure(StackSettings::default(), StackConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(err, StackError::BuildsFailed { ref failed } if failed == &["Broken"]));
        assert!(!dir.path().join("docker-compose.yml").exists());
        assert!(!dir.path().join("stack-creds.json").exists());
        assert_eq!(manager.stage(), ConfigureStage::Failed);
    }

    #[tokio::test]
    async fn test_credentials_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = manager(dir.path(), vec![Box::new(RedisBuilder)]);

        let report = manager
            .configure(StackSettings::default(), StackConfig::uniform(DeploymentMode::Stable))
            .await
            .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(report.credentials_path).unwrap())
                .unwrap();
        assert_eq!(json["mongoRootUser"], "dbuser");
        assert_eq!(json["mongoRootPass"], "x".repeat(24));
    }

    #[tokio::test]
    async fn test_up_and_down_run_compose_in_stack_root() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(RecordingRunner::new());
        let manager =
            StackManager::new(StackPaths::new(dir.path()).unwrap()).with_runner(runner.clone());

        manager.up().await.unwrap();
        manager.down().await.unwrap();

        let executed = runner.executed();
        assert_eq!(executed[0].command, "docker compose -p mds-stack up -d");
        assert_eq!(executed[1].command, "docker compose -p mds-stack down -v");
        assert_eq!(executed[0].working_dir.as_deref(), Some(dir.path()));
        assert_eq!(
            executed[1].log_file,
            Some(dir.path().join("logs/stack-down.log"))
        );
    }

    #[tokio::test]
    async fn test_up_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let manager = StackManager::new(StackPaths::new(dir.path()).unwrap())
            .with_runner(Arc::new(RecordingRunner::new().failing_on("up -d")));

        let err = manager.up().await.unwrap_err();
        assert!(matches!(err, StackError::Lifecycle(_)));
    }
}
