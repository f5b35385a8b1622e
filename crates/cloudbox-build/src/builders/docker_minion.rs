//! 関数コンテナを実行する docker minion と専用レジストリ

use super::{
    APP_NETWORK, IDENTITY_URL, LOG_URL, ORID_PROVIDER_KEY, REDIS_URL, SYSTEM_ACCOUNT,
    SYSTEM_USER, ServiceBuilder, ServiceImage, ensure_dir, mongo_url, source_directory,
    write_executable, write_file,
};
use crate::context::BuildContext;
use crate::error::Result;
use crate::templates;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cloudbox_config::StackPaths;
use cloudbox_core::{BuildArguments, ComposeService, RestartPolicy, StackService, VolumeMapping};
use tera::Context;

const IMAGE: ServiceImage =
    ServiceImage::new(StackService::DockerMinion, "mds-docker-minion", "dockerMinion");

/// 関数コンテナが参加する compose ネットワーク
const CONTAINER_NETWORK: &str = "mds-stack_app";

/// minion から各サービスへの接続先
struct Endpoints {
    registry: &'static str,
    ns: &'static str,
    qs: &'static str,
    fs: &'static str,
    identity: &'static str,
    mongo_host: &'static str,
}

const HOST_ENDPOINTS: Endpoints = Endpoints {
    registry: "127.0.0.1:5000",
    ns: "http://127.0.0.1:8082",
    qs: "http://127.0.0.1:8083",
    fs: "http://127.0.0.1:8084",
    identity: "http://127.0.0.1:8079",
    mongo_host: "localhost",
};

const CONTAINER_ENDPOINTS: Endpoints = Endpoints {
    registry: "docker-registry:5000",
    ns: "http://mds-ns:8082",
    qs: "http://mds-qs:8083",
    fs: "http://mds-fs:8084",
    identity: "http://mds-identity-proxy:80",
    mongo_host: "mongo",
};

pub struct DockerMinionBuilder;

/// レジストリ通知に付ける Basic 認証ヘッダー
fn registry_auth_header(args: &BuildArguments) -> String {
    let token = STANDARD.encode(format!("{}:{}", SYSTEM_USER, args.admin_password()));
    format!("Bearer {}", token)
}

fn app_config(args: &BuildArguments, endpoints: &Endpoints) -> Result<String> {
    let mut context = Context::new();
    context.insert("registry_url", endpoints.registry);
    context.insert("registry_user", SYSTEM_USER);
    context.insert("registry_pass", args.admin_password());
    context.insert("container_network", CONTAINER_NETWORK);
    context.insert("ns_url", endpoints.ns);
    context.insert("qs_url", endpoints.qs);
    context.insert("fs_url", endpoints.fs);
    context.insert("identity_url", endpoints.identity);
    context.insert("sdk_account", SYSTEM_ACCOUNT);
    context.insert("sdk_user", SYSTEM_USER);
    context.insert("sdk_pass", args.admin_password());
    context.insert(
        "db_conn_string",
        &args.credentials.mongo_url(endpoints.mongo_host),
    );
    context.insert("db_name", "mdsCloudDockerMinion");
    context.insert("orid_provider_key", ORID_PROVIDER_KEY);
    context.insert("log_level", "trace");
    templates::DOCKER_MINION_APP_CONFIG.render(&context)
}

#[async_trait]
impl ServiceBuilder for DockerMinionBuilder {
    fn identifier(&self) -> &'static str {
        "Docker Minion"
    }

    async fn build_image(&self, ctx: &BuildContext, args: &BuildArguments) -> Result<()> {
        IMAGE.acquire(ctx, args).await
    }

    async fn write_configs(&self, ctx: &BuildContext, args: &BuildArguments) -> Result<()> {
        ctx.reporter().milestone("Writing configs");
        let root = ctx.config_dir("dockerMinion");
        let registry = root.join("registry");
        let app = root.join("app");
        tokio::try_join!(ensure_dir(&registry), ensure_dir(&app))?;

        ctx.reporter().status("Generating docker registry config");
        let mut context = Context::new();
        context.insert("auth_header", &registry_auth_header(args));
        let registry_config = templates::DOCKER_MINION_REGISTRY_CONFIG.render(&context)?;
        write_file(&registry.join("config.yml"), registry_config).await?;

        ctx.reporter().status("Generating app config");
        if args.mode(StackService::DockerMinion).runs_on_host() {
            let target = source_directory(args, StackService::DockerMinion)?.join("config");
            ensure_dir(&target).await?;
            let config = app_config(args, &HOST_ENDPOINTS)?;
            return write_file(&target.join("localdev.js"), config).await;
        }

        let config = app_config(args, &CONTAINER_ENDPOINTS)?;
        write_file(&app.join("local.js"), config).await?;

        ctx.reporter().status("Generating entrypoint script");
        write_executable(
            &app.join("entry-point.sh"),
            templates::DOCKER_MINION_ENTRY_POINT.source(),
        )
        .await
    }

    fn manifest_fragments(&self, paths: &StackPaths, args: &BuildArguments) -> Vec<ComposeService> {
        let mode = args.mode(StackService::DockerMinion);
        let root = paths.configs_dir().join("dockerMinion");

        // ホスト実行時もレジストリはコンテナで動かす
        let registry = ComposeService::new("docker-registry")
            .image("registry")
            .port(5000, 5000)
            .volume(
                VolumeMapping::bind(
                    root.join("registry").join("config.yml"),
                    "/etc/docker/registry/config.yml",
                )
                .read_only(),
            )
            .depends_on(["mds-ns"])
            .logging_driver("none")
            .network(APP_NETWORK);

        if mode.runs_on_host() {
            return vec![registry];
        }

        let app = root.join("app");
        let minion = ComposeService::new("mds-sf-dockerMinion")
            .image(IMAGE.tag(mode))
            .restart(RestartPolicy::Always)
            .env("NODE_ENV", "production")
            .env("MDS_IDENTITY_URL", IDENTITY_URL)
            .env("ORID_PROVIDER_KEY", ORID_PROVIDER_KEY)
            .env("MDS_LOG_URL", LOG_URL)
            .env("MDS_FN_RUNTIMES", "node")
            .env("MDS_FN_MONGO_URL", mongo_url(args))
            .env("MDS_FN_CONTAINER_HOST", CONTAINER_ENDPOINTS.registry)
            .env("MDS_FN_CONTAINER_NETWORK", CONTAINER_NETWORK)
            .env("MDS_FN_SYS_USER", SYSTEM_USER)
            .env("MDS_FN_SYS_ACCOUNT", SYSTEM_ACCOUNT)
            .env("MDS_FN_SYS_PASSWORD", args.admin_password())
            .env("MDS_REDIS_URL", REDIS_URL)
            .env("MDS_SDK_VERBOSE", "true")
            .command(["./entry-point.sh"])
            .volume(VolumeMapping::bind(
                "/var/run/docker.sock",
                "/var/run/docker.sock",
            ))
            .volume(VolumeMapping::bind(
                app.join("local.js"),
                "/usr/src/app/config/local.js",
            ))
            .volume(VolumeMapping::bind(
                app.join("entry-point.sh"),
                "/usr/src/app/entry-point.sh",
            ))
            .depends_on([
                "redis",
                "logstash",
                "mongo",
                "mds-fs",
                "docker-registry",
                "mds-identity-proxy",
            ])
            .network(APP_NETWORK);

        vec![registry, minion]
    }
}
