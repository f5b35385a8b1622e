//! Redis

use super::{APP_NETWORK, ServiceBuilder};
use async_trait::async_trait;
use cloudbox_config::StackPaths;
use cloudbox_core::{BuildArguments, ComposeService, RestartPolicy};

/// キャッシュ。イメージも設定ファイルも持たない
pub struct RedisBuilder;

#[async_trait]
impl ServiceBuilder for RedisBuilder {
    fn identifier(&self) -> &'static str {
        "Redis"
    }

    fn manifest_fragments(
        &self,
        _paths: &StackPaths,
        _args: &BuildArguments,
    ) -> Vec<ComposeService> {
        vec![
            ComposeService::new("redis")
                .image("redis")
                .restart(RestartPolicy::Always)
                .port(6379, 6379)
                .logging_driver("none")
                .network(APP_NETWORK),
        ]
    }
}
