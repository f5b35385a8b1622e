//! キューサービス

use super::{
    APP_NETWORK, IDENTITY_URL, LOG_URL, ORID_PROVIDER_KEY, REDIS_URL, SYSTEM_ACCOUNT,
    SYSTEM_USER, ServiceBuilder, ServiceImage,
};
use crate::context::BuildContext;
use crate::error::Result;
use async_trait::async_trait;
use cloudbox_config::StackPaths;
use cloudbox_core::{BuildArguments, ComposeService, RestartPolicy, StackService};

const IMAGE: ServiceImage =
    ServiceImage::new(StackService::Queue, "mds-queue-service", "queueService");

pub struct QueueServiceBuilder;

#[async_trait]
impl ServiceBuilder for QueueServiceBuilder {
    fn identifier(&self) -> &'static str {
        "Queue Service"
    }

    async fn build_image(&self, ctx: &BuildContext, args: &BuildArguments) -> Result<()> {
        IMAGE.acquire(ctx, args).await
    }

    fn manifest_fragments(
        &self,
        _paths: &StackPaths,
        args: &BuildArguments,
    ) -> Vec<ComposeService> {
        let mode = args.mode(StackService::Queue);
        if mode.runs_on_host() {
            return Vec::new();
        }

        vec![
            ComposeService::new("mds-qs")
                .image(IMAGE.tag(mode))
                .restart(RestartPolicy::Always)
                .port(8083, 8888)
                .env("MDS_LOG_URL", LOG_URL)
                .env("MDS_QS_DB_URL", REDIS_URL)
                .env("ORID_PROVIDER_KEY", ORID_PROVIDER_KEY)
                .env("MDS_IDENTITY_URL", IDENTITY_URL)
                .env("MDS_QS_SF_URL", "http://mds-sf:8888")
                .env("MDS_QS_SM_URL", "http://mds-sf:8888")
                .env("MDS_QS_SYS_USER", SYSTEM_USER)
                .env("MDS_QS_SYS_ACCOUNT", SYSTEM_ACCOUNT)
                .env("MDS_QS_SYS_PASSWORD", args.admin_password())
                .env("MDS_LOG_ALL_REQUESTS", "false")
                .env("MDS_SDK_VERBOSE", "true")
                .depends_on(["redis", "logstash", "mds-identity-proxy"])
                .network(APP_NETWORK),
        ]
    }
}
