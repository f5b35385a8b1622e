//! サービスイメージの解決とローカルビルド

use super::source_directory;
use crate::context::BuildContext;
use crate::error::Result;
use crate::runner::ProcessCommand;
use cloudbox_core::{BuildArguments, DeploymentMode, StackService};

/// 公開イメージの名前空間
const PUBLISHED_NAMESPACE: &str = "mdscloud";
/// ローカルビルドしたイメージの名前空間
const LOCAL_NAMESPACE: &str = "local";

/// アプリケーションサービスのイメージ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceImage {
    pub service: StackService,
    /// リポジトリ名（`mds-cloud-identity` など）
    pub name: &'static str,
    /// `logs/<log_name>DockerBuild.log`
    pub log_name: &'static str,
    pub build_arg: Option<(&'static str, &'static str)>,
}

impl ServiceImage {
    pub const fn new(service: StackService, name: &'static str, log_name: &'static str) -> Self {
        Self {
            service,
            name,
            log_name,
            build_arg: None,
        }
    }

    pub const fn with_build_arg(mut self, key: &'static str, value: &'static str) -> Self {
        self.build_arg = Some((key, value));
        self
    }

    /// デプロイモードに対応するイメージタグ
    ///
    /// `latest` / `local` 以外は安定版タグ。
    pub fn tag(&self, mode: DeploymentMode) -> String {
        match mode {
            DeploymentMode::Latest => format!("{}/{}:latest", PUBLISHED_NAMESPACE, self.name),
            DeploymentMode::Local => format!("{}/{}:latest", LOCAL_NAMESPACE, self.name),
            DeploymentMode::Stable | DeploymentMode::LocalDev => {
                format!("{}/{}:stable", PUBLISHED_NAMESPACE, self.name)
            }
        }
    }

    /// ソースディレクトリで実行するビルドコマンド
    pub fn build_command(&self) -> String {
        let mut command = String::from("docker build");
        if let Some((key, value)) = self.build_arg {
            command.push_str(&format!(" --build-arg {}={}", key, value));
        }
        command.push_str(&format!(" -t {} .", self.tag(DeploymentMode::Local)));
        command
    }

    /// `local` モードならソースからビルド、それ以外はスキップを通知
    pub async fn acquire(&self, ctx: &BuildContext, args: &BuildArguments) -> Result<()> {
        let mode = args.mode(self.service);
        if !mode.builds_image() {
            ctx.reporter()
                .milestone(format!("Bypassing container build due to {} configuration", mode));
            return Ok(());
        }

        let source = source_directory(args, self.service)?;
        let log_file = ctx
            .paths()
            .log_file(&format!("{}DockerBuild.log", self.log_name));
        let reporter = ctx.reporter().clone();
        let announce = format!("Building container locally at {}", source.display());

        tracing::info!("Building image {} from {}", self.tag(mode), source.display());
        ctx.runner()
            .execute(
                ProcessCommand::new(self.build_command())
                    .working_dir(source)
                    .log_file(log_file)
                    .on_start(move || reporter.milestone(announce)),
            )
            .await?;

        Ok(())
    }
}
