//! ステートマシンサービス

use super::{
    APP_NETWORK, IDENTITY_URL, ORID_PROVIDER_KEY, SYSTEM_ACCOUNT, SYSTEM_USER, ServiceBuilder,
    ServiceImage, mongo_url,
};
use crate::context::BuildContext;
use crate::error::Result;
use async_trait::async_trait;
use cloudbox_config::StackPaths;
use cloudbox_core::{BuildArguments, ComposeService, RestartPolicy, StackService};

const IMAGE: ServiceImage =
    ServiceImage::new(StackService::StateMachine, "mds-state-machine", "stateMachine");

const PENDING_QUEUE: &str = "orid:1:mdsCloud:::1:qs:mds-sm-pendingQueue";
const IN_FLIGHT_QUEUE: &str = "orid:1:mdsCloud:::1:qs:mds-sm-inFlightQueue";

pub struct StateMachineServiceBuilder;

#[async_trait]
impl ServiceBuilder for StateMachineServiceBuilder {
    fn identifier(&self) -> &'static str {
        "State Machine Service"
    }

    async fn build_image(&self, ctx: &BuildContext, args: &BuildArguments) -> Result<()> {
        IMAGE.acquire(ctx, args).await
    }

    fn manifest_fragments(
        &self,
        _paths: &StackPaths,
        args: &BuildArguments,
    ) -> Vec<ComposeService> {
        let mode = args.mode(StackService::StateMachine);
        if mode.runs_on_host() {
            return Vec::new();
        }

        vec![
            ComposeService::new("mds-sm")
                .image(IMAGE.tag(mode))
                .restart(RestartPolicy::Always)
                .port(8086, 8888)
                .command(["server"])
                .env("NODE_ENV", "production")
                // 内部ワーカーで実行キューを処理する
                .env("FORCE_INTERNAL_WORKER", "true")
                .env("MDS_SM_DB_URL", mongo_url(args))
                .env("ORID_PROVIDER_KEY", ORID_PROVIDER_KEY)
                .env("PENDING_QUEUE_NAME", PENDING_QUEUE)
                .env("IN_FLIGHT_QUEUE_NAME", IN_FLIGHT_QUEUE)
                .env("MDS_IDENTITY_URL", IDENTITY_URL)
                .env("MDS_SM_QS_URL", "http://mds-qs:8888")
                .env("MDS_SM_SF_URL", "http://mds-sf:8888")
                .env("MDS_FN_SYS_USER", SYSTEM_USER)
                .env("MDS_FN_SYS_ACCOUNT", SYSTEM_ACCOUNT)
                .env("MDS_FN_SYS_PASSWORD", args.admin_password())
                .env("MDS_SDK_VERBOSE", "true")
                .depends_on(["mongo", "mds-qs", "mds-identity-proxy"])
                .network(APP_NETWORK),
        ]
    }
}
