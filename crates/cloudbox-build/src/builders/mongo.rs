//! MongoDB

use super::{APP_NETWORK, ServiceBuilder, ensure_dir, write_file};
use crate::context::BuildContext;
use crate::error::Result;
use crate::templates;
use async_trait::async_trait;
use cloudbox_config::StackPaths;
use cloudbox_core::{BuildArguments, ComposeService, RestartPolicy, VolumeMapping};
use tera::Context;

/// 共有データベース
///
/// 初期化スクリプトで identity 用のDBユーザーを作成する。
pub struct MongoBuilder;

#[async_trait]
impl ServiceBuilder for MongoBuilder {
    fn identifier(&self) -> &'static str {
        "Mongo"
    }

    async fn write_configs(&self, ctx: &BuildContext, args: &BuildArguments) -> Result<()> {
        ctx.reporter().milestone("Writing configs");
        let scripts = ctx.config_dir("mongo").join("scripts");
        ensure_dir(&scripts).await?;

        let mut context = Context::new();
        context.insert("identity_user", &args.credentials.identity.db_user);
        context.insert("identity_pass", &args.credentials.identity.db_password);
        let script = templates::MONGO_IDENTITY_INIT.render(&context)?;

        write_file(&scripts.join("00-identity-init.js"), script).await
    }

    fn manifest_fragments(&self, paths: &StackPaths, args: &BuildArguments) -> Vec<ComposeService> {
        let scripts = paths.configs_dir().join("mongo").join("scripts");

        vec![
            ComposeService::new("mongo")
                .image("mongo")
                .restart(RestartPolicy::Always)
                .env("MONGO_INITDB_ROOT_USERNAME", &args.credentials.mongo_root_user)
                .env("MONGO_INITDB_ROOT_PASSWORD", &args.credentials.mongo_root_pass)
                .port(27017, 27017)
                .volume(VolumeMapping::named("mongo-db", "/data/db"))
                .volume(VolumeMapping::bind(scripts, "/docker-entrypoint-initdb.d").read_only())
                .logging_driver("none")
                .network(APP_NETWORK),
        ]
    }
}
