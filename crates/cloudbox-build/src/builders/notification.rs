//! 通知サービス

use super::{
    APP_NETWORK, IDENTITY_URL, LOG_URL, ORID_PROVIDER_KEY, REDIS_URL, ServiceBuilder,
    ServiceImage,
};
use crate::context::BuildContext;
use crate::error::Result;
use async_trait::async_trait;
use cloudbox_config::StackPaths;
use cloudbox_core::{BuildArguments, ComposeService, RestartPolicy, StackService};

const IMAGE: ServiceImage = ServiceImage::new(
    StackService::Notification,
    "mds-notification-service",
    "notificationService",
);

pub struct NotificationServiceBuilder;

#[async_trait]
impl ServiceBuilder for NotificationServiceBuilder {
    fn identifier(&self) -> &'static str {
        "Notification Service"
    }

    async fn build_image(&self, ctx: &BuildContext, args: &BuildArguments) -> Result<()> {
        IMAGE.acquire(ctx, args).await
    }

    fn manifest_fragments(
        &self,
        _paths: &StackPaths,
        args: &BuildArguments,
    ) -> Vec<ComposeService> {
        let mode = args.mode(StackService::Notification);
        if mode.runs_on_host() {
            return Vec::new();
        }

        vec![
            ComposeService::new("mds-ns")
                .image(IMAGE.tag(mode))
                .restart(RestartPolicy::Always)
                .port(8082, 8888)
                .env("MDS_LOG_URL", LOG_URL)
                .env("REDIS_URL", REDIS_URL)
                .env("ORID_PROVIDER_KEY", ORID_PROVIDER_KEY)
                .env("MDS_IDENTITY_URL", IDENTITY_URL)
                .env("MDS_SDK_VERBOSE", "true")
                .depends_on(["redis", "logstash", "mds-identity-proxy"])
                .network(APP_NETWORK),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::test_support::Harness;
    use cloudbox_core::DeploymentMode;

    #[tokio::test]
    async fn test_build_writes_nothing() {
        let harness = Harness::new("Notification Service");
        let args = harness.arguments(DeploymentMode::Latest);

        NotificationServiceBuilder.build(&harness.ctx, &args).await.unwrap();

        assert!(harness.runner.commands().is_empty());
        assert!(!harness.paths().configs_dir().exists());
    }

    #[test]
    fn test_fragment() {
        let harness = Harness::new("Notification Service");
        let fragments = NotificationServiceBuilder
            .manifest_fragments(harness.paths(), &harness.arguments(DeploymentMode::Latest));

        assert_eq!(fragments.len(), 1);
        let ns = &fragments[0];
        assert_eq!(ns.key, "mds-ns");
        assert_eq!(ns.image.as_deref(), Some("mdscloud/mds-notification-service:latest"));
        assert_eq!(ns.env_value("REDIS_URL"), Some("redis://redis:6379"));
        assert_eq!(ns.ports[0].host, 8082);
    }

    #[test]
    fn test_local_dev_has_no_fragment() {
        let harness = Harness::new("Notification Service");
        let fragments = NotificationServiceBuilder
            .manifest_fragments(harness.paths(), &harness.arguments(DeploymentMode::LocalDev));
        assert!(fragments.is_empty());
    }
}
