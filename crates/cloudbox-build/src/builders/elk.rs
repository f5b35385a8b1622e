//! ログ基盤（Elasticsearch / Logstash / Kibana）

use super::{APP_NETWORK, ServiceBuilder, ensure_dir, set_executable, write_file};
use crate::context::BuildContext;
use crate::error::Result;
use crate::templates::{self, Template};
use async_trait::async_trait;
use cloudbox_config::StackPaths;
use cloudbox_core::{
    BuildArguments, BuildSettings, ComposeService, RestartPolicy, VolumeMapping,
};
use std::path::{Path, PathBuf};

/// イメージのビルド引数に渡すバージョン
pub const ELK_VERSION: &str = "8.6.2";

const DEFAULT_PASSWORD_VARS: [&str; 8] = [
    "ELASTIC_PASSWORD",
    "LOGSTASH_INTERNAL_PASSWORD",
    "KIBANA_SYSTEM_PASSWORD",
    "METRICBEAT_INTERNAL_PASSWORD",
    "FILEBEAT_INTERNAL_PASSWORD",
    "HEARTBEAT_INTERNAL_PASSWORD",
    "MONITORING_INTERNAL_PASSWORD",
    "BEATS_SYSTEM_PASSWORD",
];

const SETUP_COMMENTS: [&str; 9] = [
    "Reference: https://github.com/deviantony/docker-elk",
    "",
    "The \"setup\" service runs a one-off script which initializes users inside",
    "Elasticsearch, such as \"logstash_internal\" and \"kibana_system\", with the",
    "values of the passwords defined in the \".env\" file.",
    "",
    "This task is only performed during the *initial* startup of the stack. On all",
    "subsequent runs, the service simply returns immediately, without performing",
    "any modification to existing users.",
];

/// setup / elasticsearch / logstash / kibana の4サービス
///
/// イメージは compose 側でビルドするため、ここでは Dockerfile と設定を置くだけ。
pub struct ElkBuilder;

struct ElkDirs {
    setup: PathBuf,
    elasticsearch: PathBuf,
    logstash: PathBuf,
    kibana: PathBuf,
}

impl ElkDirs {
    fn new(configs: &Path) -> Self {
        let root = configs.join("elk");
        Self {
            setup: root.join("setup"),
            elasticsearch: root.join("elasticsearch"),
            logstash: root.join("logstash"),
            kibana: root.join("kibana"),
        }
    }
}

async fn write_all(dir: &Path, files: &[(&str, Template)]) -> Result<()> {
    for (name, template) in files {
        write_file(&dir.join(name), template.source()).await?;
    }
    Ok(())
}

static SETUP_FILES: [(&str, Template); 3] = [
    ("Dockerfile", templates::ELK_SETUP_DOCKERFILE),
    ("entrypoint.sh", templates::ELK_SETUP_ENTRYPOINT),
    ("lib.sh", templates::ELK_SETUP_LIB),
];

static ELASTICSEARCH_FILES: [(&str, Template); 2] = [
    ("Dockerfile", templates::ELK_ELASTICSEARCH_DOCKERFILE),
    ("elasticsearch.yml", templates::ELK_ELASTICSEARCH_CONFIG),
];

static LOGSTASH_FILES: [(&str, Template); 3] = [
    ("Dockerfile", templates::ELK_LOGSTASH_DOCKERFILE),
    ("logstash.conf", templates::ELK_LOGSTASH_PIPELINE),
    ("logstash.yml", templates::ELK_LOGSTASH_CONFIG),
];

static KIBANA_FILES: [(&str, Template); 2] = [
    ("Dockerfile", templates::ELK_KIBANA_DOCKERFILE),
    ("kibana.yml", templates::ELK_KIBANA_CONFIG),
];

/// setup のスクリプトは実行権限付き
async fn write_setup(dir: &Path) -> Result<()> {
    write_all(dir, &SETUP_FILES).await?;
    set_executable(&dir.join("entrypoint.sh")).await?;
    set_executable(&dir.join("lib.sh")).await
}

fn build_settings(dir: &Path) -> BuildSettings {
    BuildSettings::new(format!("{}/", dir.display())).arg("ELK_VERSION", ELK_VERSION)
}

#[async_trait]
impl ServiceBuilder for ElkBuilder {
    fn identifier(&self) -> &'static str {
        "ELK Stack"
    }

    async fn write_configs(&self, ctx: &BuildContext, _args: &BuildArguments) -> Result<()> {
        ctx.reporter().milestone("Writing configs");
        let dirs = ElkDirs::new(&ctx.paths().configs_dir());

        tokio::try_join!(
            ensure_dir(&dirs.setup),
            ensure_dir(&dirs.elasticsearch),
            ensure_dir(&dirs.logstash),
            ensure_dir(&dirs.kibana),
        )?;

        tokio::try_join!(
            write_setup(&dirs.setup),
            write_all(&dirs.elasticsearch, &ELASTICSEARCH_FILES),
            write_all(&dirs.logstash, &LOGSTASH_FILES),
            write_all(&dirs.kibana, &KIBANA_FILES),
        )?;

        Ok(())
    }

    fn manifest_fragments(
        &self,
        paths: &StackPaths,
        _args: &BuildArguments,
    ) -> Vec<ComposeService> {
        let dirs = ElkDirs::new(&paths.configs_dir());

        let mut setup = ComposeService::new("elk-setup")
            .comments(SETUP_COMMENTS)
            .build(build_settings(&dirs.setup))
            .init(true)
            .volume(
                VolumeMapping::bind(dirs.setup.join("entrypoint.sh"), "/entrypoint.sh")
                    .mode("ro,Z"),
            )
            .volume(VolumeMapping::bind(dirs.setup.join("lib.sh"), "/lib.sh").mode("ro,Z"))
            .volume(VolumeMapping::named("elasticsearch-setup-roles", "/roles").mode("ro,Z"))
            .volume(VolumeMapping::named("elasticsearch-setup-state", "/state").mode("Z"));
        for var in DEFAULT_PASSWORD_VARS {
            setup = setup.env(var, format!("${{{}:-changeme}}", var));
        }
        let setup = setup.network(APP_NETWORK).depends_on(["elasticsearch"]);

        let elasticsearch = ComposeService::new("elasticsearch")
            .build(build_settings(&dirs.elasticsearch))
            .restart(RestartPolicy::Always)
            .volume(
                VolumeMapping::bind(
                    dirs.elasticsearch.join("elasticsearch.yml"),
                    "/usr/share/elasticsearch/config/elasticsearch.yml",
                )
                .read_only(),
            )
            .volume(VolumeMapping::named("elasticsearch", "/usr/share/elasticsearch/data"))
            .port(9200, 9200)
            .port(9300, 9300)
            .env("ES_JAVA_OPTS", "-Xmx256m -Xms256m")
            // 本番モードのブートストラップチェックを無効化
            .env("discovery.type", "single-node")
            .env("ELASTIC_PASSWORD", "${ELASTIC_PASSWORD:-changeme}")
            .logging_driver("none")
            .network(APP_NETWORK);

        let logstash = ComposeService::new("logstash")
            .build(build_settings(&dirs.logstash))
            .restart(RestartPolicy::Always)
            .volume(
                VolumeMapping::bind(
                    dirs.logstash.join("logstash.yml"),
                    "/usr/share/logstash/config/logstash.yml",
                )
                .read_only(),
            )
            .volume(
                VolumeMapping::bind(
                    dirs.logstash.join("logstash.conf"),
                    "/usr/share/logstash/pipeline/logstash.conf",
                )
                .read_only(),
            )
            .port(6000, 6000)
            .port(6001, 6001)
            .port(6002, 6002)
            .port(9600, 9600)
            .env("LS_JAVA_OPTS", "-Xmx256m -Xms256m")
            .depends_on(["elasticsearch"])
            .logging_driver("none")
            .network(APP_NETWORK);

        let kibana = ComposeService::new("kibana")
            .build(build_settings(&dirs.kibana))
            .restart(RestartPolicy::Always)
            .volume(
                VolumeMapping::bind(
                    dirs.kibana.join("kibana.yml"),
                    "/usr/share/kibana/config/kibana.yml",
                )
                .read_only(),
            )
            .port(5601, 5601)
            .depends_on(["logstash", "elasticsearch"])
            .logging_driver("none")
            .network(APP_NETWORK);

        vec![setup, elasticsearch, logstash, kibana]
    }
}
