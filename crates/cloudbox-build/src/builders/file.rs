//! ファイルサービス

use super::{
    APP_NETWORK, ServiceBuilder, ServiceImage, ensure_dir, write_executable, write_file,
};
use crate::context::BuildContext;
use crate::error::Result;
use crate::templates;
use async_trait::async_trait;
use cloudbox_config::StackPaths;
use cloudbox_core::{BuildArguments, ComposeService, RestartPolicy, StackService, VolumeMapping};

const IMAGE: ServiceImage =
    ServiceImage::new(StackService::File, "mds-file-service", "fileService");

/// アップロードされたファイルを保持する名前付きボリューム
const DATA_VOLUME: &str = "file-service-data";

pub struct FileServiceBuilder;

#[async_trait]
impl ServiceBuilder for FileServiceBuilder {
    fn identifier(&self) -> &'static str {
        "File Service"
    }

    async fn build_image(&self, ctx: &BuildContext, args: &BuildArguments) -> Result<()> {
        IMAGE.acquire(ctx, args).await
    }

    async fn write_configs(&self, ctx: &BuildContext, args: &BuildArguments) -> Result<()> {
        ctx.reporter().milestone("Writing configs");
        let root = ctx.config_dir("fileService");
        let config_dir = root.join("config");
        ensure_dir(&config_dir).await?;
        if args.mode(StackService::File).runs_on_host() {
            return Ok(());
        }

        ctx.reporter().status("Generating override app config");
        write_file(
            &config_dir.join("local.js"),
            templates::FILE_SERVICE_APP_CONFIG.source(),
        )
        .await?;

        ctx.reporter().status("Generating entrypoint script");
        write_executable(
            &root.join("entry-point.sh"),
            templates::FILE_SERVICE_ENTRY_POINT.source(),
        )
        .await
    }

    fn manifest_fragments(
        &self,
        paths: &StackPaths,
        args: &BuildArguments,
    ) -> Vec<ComposeService> {
        let mode = args.mode(StackService::File);
        if mode.runs_on_host() {
            return Vec::new();
        }
        let root = paths.configs_dir().join("fileService");

        vec![
            ComposeService::new("mds-fs")
                .image(IMAGE.tag(mode))
                .restart(RestartPolicy::Always)
                .port(8084, 8888)
                .env("NODE_ENV", "production")
                .env("MDS_SDK_VERBOSE", "true")
                .command(["./entry-point.sh"])
                .volume(VolumeMapping::bind(
                    root.join("entry-point.sh"),
                    "/usr/src/app/entry-point.sh",
                ))
                .volume(
                    VolumeMapping::bind(
                        root.join("config").join("local.js"),
                        "/usr/src/app/config/local.js",
                    )
                    .read_only(),
                )
                .volume(VolumeMapping::named(DATA_VOLUME, "/UploadService"))
                .depends_on(["logstash", "mds-identity-proxy"])
                .network(APP_NETWORK),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::test_support::Harness;
    use crate::reporter::StackEvent;
    use cloudbox_core::DeploymentMode;

    #[tokio::test]
    async fn test_writes_config_and_entry_point() {
        let harness = Harness::new("File Service");
        let args = harness.arguments(DeploymentMode::Stable);

        FileServiceBuilder.build(&harness.ctx, &args).await.unwrap();

        let root = harness.paths().configs_dir().join("fileService");
        let config = std::fs::read_to_string(root.join("config/local.js")).unwrap();
        assert!(config.contains("uploadFolder: '/UploadService'"));
        assert!(root.join("entry-point.sh").is_file());
    }

    #[tokio::test]
    async fn test_reports_each_generated_file() {
        let mut harness = Harness::new("File Service");
        let args = harness.arguments(DeploymentMode::Stable);

        FileServiceBuilder.build(&harness.ctx, &args).await.unwrap();

        let messages: Vec<_> = harness.messages();
        assert_eq!(
            messages[1..],
            [
                StackEvent::Milestone("File Service: Writing configs".to_string()),
                StackEvent::Status("File Service: Generating override app config".to_string()),
                StackEvent::Status("File Service: Generating entrypoint script".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_local_dev_only_prepares_directory() {
        let mut harness = Harness::new("File Service");
        let args = harness.arguments(DeploymentMode::LocalDev);

        FileServiceBuilder.build(&harness.ctx, &args).await.unwrap();

        let root = harness.paths().configs_dir().join("fileService");
        assert!(root.join("config").is_dir());
        assert!(!root.join("config/local.js").exists());
        assert!(!root.join("entry-point.sh").exists());
        assert_eq!(
            harness.messages(),
            vec![
                StackEvent::Milestone(
                    "File Service: Bypassing container build due to localDev configuration"
                        .to_string()
                ),
                StackEvent::Milestone("File Service: Writing configs".to_string()),
            ]
        );
        assert!(FileServiceBuilder
            .manifest_fragments(harness.paths(), &args)
            .is_empty());
    }

    #[test]
    fn test_fragment_declares_data_volume() {
        let harness = Harness::new("File Service");
        let fragments = FileServiceBuilder
            .manifest_fragments(harness.paths(), &harness.arguments(DeploymentMode::Stable));

        let fs = &fragments[0];
        assert_eq!(fs.key, "mds-fs");
        assert_eq!(fs.named_volumes().collect::<Vec<_>>(), vec![DATA_VOLUME]);
        assert_eq!(fs.command, Some(vec!["./entry-point.sh".to_string()]));
        assert_eq!(fs.depends_on, vec!["logstash", "mds-identity-proxy"]);
    }
}
