//! 認証サービス（identity）と前段の TLS プロキシ

use super::{
    APP_NETWORK, HOST_GATEWAY, ServiceBuilder, ServiceImage, ensure_dir, source_directory,
    write_executable, write_file,
};
use crate::context::BuildContext;
use crate::error::Result;
use crate::runner::ProcessCommand;
use crate::templates;
use async_trait::async_trait;
use cloudbox_config::StackPaths;
use cloudbox_core::{
    BuildArguments, ComposeService, DeploymentMode, RestartPolicy, StackService, VolumeMapping,
};
use std::path::Path;
use tera::Context;

const IMAGE: ServiceImage =
    ServiceImage::new(StackService::Identity, "mds-cloud-identity", "identity")
        .with_build_arg("SERVICE", "identity");

/// 秘密鍵パスフレーズの長さ
const KEY_PASSPHRASE_LENGTH: usize = 12;

const PRIVATE_KEY_COMMAND: &str = "ssh-keygen -f ./key -t rsa -b 4096 -m PKCS8 -N";
const PUBLIC_KEY_COMMAND: &str = "ssh-keygen -f ./key.pub -e -m pem";
const CERTIFICATE_COMMAND: &str = "openssl req -x509 -nodes -days 365 -newkey rsa:2048 \
     -keyout nginx-selfsigned.key -out nginx-selfsigned.crt -batch -subj /";

/// 署名鍵と TLS 証明書を生成し、プロキシ経由で identity を公開する
pub struct IdentityBuilder;

/// upstream に並べるサーバー行
fn upstream_servers(mode: DeploymentMode) -> &'static str {
    if mode.runs_on_host() {
        "        server host.docker.internal:8888;"
    } else {
        "        server mds-identity-1:8888;"
    }
}

impl IdentityBuilder {
    async fn generate_keys(&self, ctx: &BuildContext, keys: &Path) -> Result<String> {
        let reporter = ctx.reporter();

        reporter.status("Generating SSH keys for identity service (pass)");
        let passphrase = ctx.secrets().generate(KEY_PASSPHRASE_LENGTH);
        write_file(&keys.join("pass"), &passphrase).await?;

        reporter.status("Generating SSH keys for identity service (private ssh key)");
        ctx.runner()
            .execute(
                ProcessCommand::new(format!("{} {}", PRIVATE_KEY_COMMAND, passphrase))
                    .working_dir(keys),
            )
            .await?;

        reporter.status("Generating SSH keys for identity service (public ssh key pem)");
        ctx.runner()
            .execute(
                ProcessCommand::new(PUBLIC_KEY_COMMAND)
                    .working_dir(keys)
                    .log_file(keys.join("key.pub.pem")),
            )
            .await?;

        Ok(passphrase)
    }

    async fn generate_certificate(&self, ctx: &BuildContext, proxy: &Path) -> Result<()> {
        ctx.reporter()
            .status("Generating SSH keys for identity service (openssl certs)");
        ctx.runner()
            .execute(ProcessCommand::new(CERTIFICATE_COMMAND).working_dir(proxy))
            .await?;
        Ok(())
    }

    /// ホストで動かす identity 用の設定をソースツリーへ書き出す
    async fn write_localdev_config(
        &self,
        ctx: &BuildContext,
        args: &BuildArguments,
        keys: &Path,
        passphrase: &str,
    ) -> Result<()> {
        ctx.reporter().status("Generating localdev app config");
        let source = source_directory(args, StackService::Identity)?;
        let target = source.join("packages/identity/config");
        ensure_dir(&target).await?;

        let mut context = Context::new();
        context.insert(
            "db_conn_string",
            &identity_db_url(args, "localhost"),
        );
        context.insert("private_key_path", &keys.join("key").display().to_string());
        context.insert("private_key_pass", passphrase);
        context.insert(
            "public_key_path",
            &keys.join("key.pub.pem").display().to_string(),
        );
        context.insert("system_pass", args.admin_password());
        let config = templates::IDENTITY_LOCALDEV_CONFIG.render(&context)?;

        write_file(&target.join("localdev.js"), config).await
    }

    /// コンテナにマウントする設定とエントリポイント
    async fn write_container_config(
        &self,
        ctx: &BuildContext,
        args: &BuildArguments,
        root: &Path,
        passphrase: &str,
    ) -> Result<()> {
        ctx.reporter().status("Generating override app config");
        let mut context = Context::new();
        context.insert("db_conn_string", &identity_db_url(args, "mongo"));
        context.insert("private_key_pass", passphrase);
        context.insert("sys_password", args.admin_password());
        let config = templates::IDENTITY_APP_CONFIG.render(&context)?;
        write_file(&root.join("config").join("local.js"), config).await?;

        ctx.reporter().status("Generating entrypoint script");
        write_executable(
            &root.join("entry-point.sh"),
            templates::IDENTITY_ENTRY_POINT.source(),
        )
        .await
    }
}

fn identity_db_url(args: &BuildArguments, host: &str) -> String {
    let identity = &args.credentials.identity;
    format!(
        "mongodb://{}:{}@{}:27017/mds-identity",
        identity.db_user, identity.db_password, host
    )
}

#[async_trait]
impl ServiceBuilder for IdentityBuilder {
    fn identifier(&self) -> &'static str {
        "Identity"
    }

    async fn build_image(&self, ctx: &BuildContext, args: &BuildArguments) -> Result<()> {
        IMAGE.acquire(ctx, args).await
    }

    async fn write_configs(&self, ctx: &BuildContext, args: &BuildArguments) -> Result<()> {
        ctx.reporter().milestone("Writing configs");
        let mode = args.mode(StackService::Identity);
        let root = ctx.config_dir("identity");
        let keys = root.join("keys");
        let proxy = root.join("proxy");
        let config_dir = root.join("config");

        tokio::try_join!(ensure_dir(&keys), ensure_dir(&proxy), ensure_dir(&config_dir))?;

        let passphrase = self.generate_keys(ctx, &keys).await?;
        self.generate_certificate(ctx, &proxy).await?;

        ctx.reporter().status("Generating NGINX config");
        let mut context = Context::new();
        context.insert("servers", upstream_servers(mode));
        let nginx = templates::IDENTITY_NGINX_CONF.render(&context)?;
        write_file(&proxy.join("nginx.conf"), nginx).await?;

        if mode.runs_on_host() {
            self.write_localdev_config(ctx, args, &keys, &passphrase)
                .await
        } else {
            self.write_container_config(ctx, args, &root, &passphrase)
                .await
        }
    }

    fn manifest_fragments(&self, paths: &StackPaths, args: &BuildArguments) -> Vec<ComposeService> {
        let mode = args.mode(StackService::Identity);
        let root = paths.configs_dir().join("identity");
        let proxy_dir = root.join("proxy");

        let mut proxy = ComposeService::new("mds-identity-proxy")
            .image("nginx")
            .restart(RestartPolicy::Always)
            .port(8079, 80)
            .port(8081, 443)
            .volume(
                VolumeMapping::bind(proxy_dir.join("nginx.conf"), "/etc/nginx/nginx.conf")
                    .read_only(),
            )
            .volume(
                VolumeMapping::bind(
                    proxy_dir.join("nginx-selfsigned.crt"),
                    "/etc/nginx/nginx-selfsigned.crt",
                )
                .read_only(),
            )
            .volume(
                VolumeMapping::bind(
                    proxy_dir.join("nginx-selfsigned.key"),
                    "/etc/nginx/nginx-selfsigned.key",
                )
                .read_only(),
            )
            .logging_driver("none")
            .network(APP_NETWORK);

        if mode.runs_on_host() {
            proxy = proxy.extra_host(HOST_GATEWAY);
            return vec![proxy];
        }

        let identity = ComposeService::new("mds-identity-1")
            .image(IMAGE.tag(mode))
            .restart(RestartPolicy::Always)
            .env("MDS_SYS_PASSWORD", args.admin_password())
            .env("MDS_SDK_VERBOSE", "true")
            .command(["./entry-point.sh"])
            .volume(VolumeMapping::bind(root.join("keys"), "/root/keys").read_only())
            .volume(
                VolumeMapping::bind(
                    root.join("config").join("local.js"),
                    "/usr/src/app/config/local.js",
                )
                .read_only(),
            )
            .volume(VolumeMapping::bind(
                root.join("entry-point.sh"),
                "/usr/src/app/entry-point.sh",
            ))
            .depends_on(["mongo", "logstash"])
            .network(APP_NETWORK);

        vec![proxy, identity]
    }
}
