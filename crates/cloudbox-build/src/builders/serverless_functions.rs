//! サーバーレス関数サービス

use super::{
    APP_NETWORK, HOST_GATEWAY, IDENTITY_URL, LOG_URL, ORID_PROVIDER_KEY, SYSTEM_ACCOUNT,
    SYSTEM_USER, ServiceBuilder, ServiceImage, ensure_dir, mongo_url, write_file,
};
use crate::context::BuildContext;
use crate::error::Result;
use crate::templates;
use async_trait::async_trait;
use cloudbox_config::StackPaths;
use cloudbox_core::{BuildArguments, ComposeService, RestartPolicy, StackService, VolumeMapping};
use std::path::PathBuf;
use tera::Context;

const IMAGE: ServiceImage = ServiceImage::new(
    StackService::ServerlessFunctions,
    "mds-serverless-functions",
    "serverlessFunctions",
);

const PROVIDER_CONFIG: &str = "provider-config.json";

pub struct ServerlessFunctionsServiceBuilder;

fn config_dir(configs: PathBuf) -> PathBuf {
    configs.join("serverlessFunctionsService").join("config")
}

/// 関数を実行するプロバイダ（docker minion）の URL
fn provider_url(args: &BuildArguments) -> &'static str {
    if args.mode(StackService::DockerMinion).runs_on_host() {
        "http://host.docker.internal:8888"
    } else {
        "http://mds-sf-dockerMinion:8888"
    }
}

#[async_trait]
impl ServiceBuilder for ServerlessFunctionsServiceBuilder {
    fn identifier(&self) -> &'static str {
        "Serverless Functions Service"
    }

    async fn build_image(&self, ctx: &BuildContext, args: &BuildArguments) -> Result<()> {
        IMAGE.acquire(ctx, args).await
    }

    async fn write_configs(&self, ctx: &BuildContext, args: &BuildArguments) -> Result<()> {
        ctx.reporter().milestone("Writing configs");
        let dir = config_dir(ctx.paths().configs_dir());
        ensure_dir(&dir).await?;
        if args.mode(StackService::ServerlessFunctions).runs_on_host() {
            return Ok(());
        }

        ctx.reporter().status("Generating provider config");
        let mut context = Context::new();
        context.insert("provider_type", ORID_PROVIDER_KEY);
        context.insert("provider_url", provider_url(args));
        let config = templates::SERVERLESS_PROVIDER_CONFIG.render(&context)?;

        write_file(&dir.join(PROVIDER_CONFIG), config).await
    }

    fn manifest_fragments(&self, paths: &StackPaths, args: &BuildArguments) -> Vec<ComposeService> {
        let mode = args.mode(StackService::ServerlessFunctions);
        if mode.runs_on_host() {
            return Vec::new();
        }
        let minion_on_host = args.mode(StackService::DockerMinion).runs_on_host();

        let mut sf = ComposeService::new("mds-sf")
            .image(IMAGE.tag(mode))
            .restart(RestartPolicy::Always)
            .port(8085, 8888);
        if minion_on_host {
            sf = sf.extra_host(HOST_GATEWAY);
        }

        let mut depends_on = vec![
            "logstash",
            "mongo",
            "mds-qs",
            "mds-fs",
            "mds-ns",
            "mds-identity-proxy",
        ];
        if !minion_on_host {
            depends_on.push("mds-sf-dockerMinion");
        }

        let sf = sf
            .env("NODE_ENV", "production")
            .env("MDS_FN_MONGO_URL", mongo_url(args))
            .env("MDS_LOG_URL", LOG_URL)
            .env("MDS_FN_MONGO_DB_NAME", "mdsCloudServerlessFunctions")
            .env("MDS_IDENTITY_URL", IDENTITY_URL)
            .env("ORID_PROVIDER_KEY", ORID_PROVIDER_KEY)
            .env("MDS_FN_SYS_USER", SYSTEM_USER)
            .env("MDS_FN_SYS_ACCOUNT", SYSTEM_ACCOUNT)
            .env("MDS_FN_SYS_PASSWORD", args.admin_password())
            .env("MDS_FN_SYS_ALLOW_SELFSIGN_CERT", "true")
            .env("MDS_FN_PROVIDER_CONFIG", "/configs/provider-config.json")
            .env("MDS_SDK_VERBOSE", "true")
            .volume(
                VolumeMapping::bind(
                    config_dir(paths.configs_dir()).join(PROVIDER_CONFIG),
                    "/configs/provider-config.json",
                )
                .read_only(),
            )
            .depends_on(depends_on)
            .network(APP_NETWORK);

        vec![sf]
    }
}
