//! サービスビルダー
//!
//! 各ビルダーは (1) 必要ならイメージをローカルビルドし、(2) 設定ファイルを
//! 書き出し、(3) マニフェストに載せるサービス定義を返す。
//! (3) は (1)(2) と独立に呼べる純粋な射影。

mod docker_minion;
mod elk;
mod file;
mod identity;
mod image;
mod mongo;
mod notification;
mod queue;
mod redis;
mod serverless_functions;
mod state_machine;

pub use docker_minion::DockerMinionBuilder;
pub use elk::ElkBuilder;
pub use file::FileServiceBuilder;
pub use identity::IdentityBuilder;
pub use image::ServiceImage;
pub use mongo::MongoBuilder;
pub use notification::NotificationServiceBuilder;
pub use queue::QueueServiceBuilder;
pub use redis::RedisBuilder;
pub use serverless_functions::ServerlessFunctionsServiceBuilder;
pub use state_machine::StateMachineServiceBuilder;

use crate::context::BuildContext;
use crate::error::{BuildError, Result};
use async_trait::async_trait;
use cloudbox_config::StackPaths;
use cloudbox_core::{BuildArguments, ComposeService, StackService};
use std::path::Path;

/// 全サービスが参加するネットワーク
pub const APP_NETWORK: &str = "app";

/// ホスト上のサービスへ到達するための extra_hosts エントリ
pub const HOST_GATEWAY: &str = "host.docker.internal:host-gateway";

pub(crate) const LOG_URL: &str = "http://logstash:6002";
pub(crate) const REDIS_URL: &str = "redis://redis:6379";
pub(crate) const IDENTITY_URL: &str = "http://mds-identity-proxy:80";
pub(crate) const ORID_PROVIDER_KEY: &str = "mdsCloud";
pub(crate) const SYSTEM_USER: &str = "admin";
pub(crate) const SYSTEM_ACCOUNT: &str = "1";

/// 生成スクリプトのパーミッション
pub(crate) const EXECUTABLE_MODE: u32 = 0o774;

#[async_trait]
pub trait ServiceBuilder: Send + Sync {
    /// 通知の名前空間に使う識別子
    fn identifier(&self) -> &'static str;

    /// イメージの取得（`local` モードのみビルド）
    async fn build_image(&self, _ctx: &BuildContext, _args: &BuildArguments) -> Result<()> {
        Ok(())
    }

    /// 設定ファイルの書き出し
    async fn write_configs(&self, _ctx: &BuildContext, _args: &BuildArguments) -> Result<()> {
        Ok(())
    }

    /// イメージ取得 → 設定書き出しの順で実行
    async fn build(&self, ctx: &BuildContext, args: &BuildArguments) -> Result<()> {
        self.build_image(ctx, args).await?;
        self.write_configs(ctx, args).await
    }

    /// マニフェストに載せるサービス定義
    fn manifest_fragments(
        &self,
        paths: &StackPaths,
        args: &BuildArguments,
    ) -> Vec<ComposeService>;
}

/// 登録順のビルダー一覧
pub fn registry() -> Vec<Box<dyn ServiceBuilder>> {
    vec![
        Box::new(MongoBuilder),
        Box::new(RedisBuilder),
        Box::new(ElkBuilder),
        Box::new(IdentityBuilder),
        Box::new(NotificationServiceBuilder),
        Box::new(QueueServiceBuilder),
        Box::new(FileServiceBuilder),
        Box::new(ServerlessFunctionsServiceBuilder),
        Box::new(DockerMinionBuilder),
        Box::new(StateMachineServiceBuilder),
    ]
}

/// ルートユーザーでの Mongo 接続文字列（コンテナネットワーク内）
pub(crate) fn mongo_url(args: &BuildArguments) -> String {
    args.credentials.mongo_url("mongo")
}

pub(crate) fn source_directory(args: &BuildArguments, service: StackService) -> Result<&Path> {
    args.settings
        .source_directory(service)
        .ok_or(BuildError::SourceDirectoryMissing {
            service: service.display_name(),
        })
}

pub(crate) async fn ensure_dir(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| BuildError::fs(path, e))
}

pub(crate) async fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| BuildError::fs(path, e))
}

/// 書き出して実行権限を付与
pub(crate) async fn write_executable(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    write_file(path, contents).await?;
    set_executable(path).await
}

#[cfg(unix)]
pub(crate) async fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(EXECUTABLE_MODE))
        .await
        .map_err(|e| BuildError::fs(path, e))
}

#[cfg(not(unix))]
pub(crate) async fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}
