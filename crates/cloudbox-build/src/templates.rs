//! 設定ファイルのテンプレート
//!
//! `.tera` で終わるものは変数を展開して、それ以外はそのまま書き出す。

use crate::error::{BuildError, Result};
use tera::{Context, Tera};

/// 埋め込みテンプレート
#[derive(Debug, Clone, Copy)]
pub struct Template {
    name: &'static str,
    source: &'static str,
}

impl Template {
    const fn new(name: &'static str, source: &'static str) -> Self {
        Self { name, source }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 展開せずにそのまま返す
    pub fn source(&self) -> &'static str {
        self.source
    }

    /// 変数を展開（HTMLエスケープなし）
    pub fn render(&self, context: &Context) -> Result<String> {
        Tera::one_off(self.source, context, false).map_err(|source| BuildError::Template {
            name: self.name,
            source,
        })
    }
}

macro_rules! template {
    ($path:literal) => {
        Template::new($path, include_str!(concat!("../templates/", $path)))
    };
}

pub const MONGO_IDENTITY_INIT: Template = template!("mongo/identity-init.js.tera");

pub const ELK_SETUP_DOCKERFILE: Template = template!("elk/setup/Dockerfile");
pub const ELK_SETUP_ENTRYPOINT: Template = template!("elk/setup/entrypoint.sh");
pub const ELK_SETUP_LIB: Template = template!("elk/setup/lib.sh");
pub const ELK_ELASTICSEARCH_DOCKERFILE: Template = template!("elk/elasticsearch/Dockerfile");
pub const ELK_ELASTICSEARCH_CONFIG: Template = template!("elk/elasticsearch/elasticsearch.yml");
pub const ELK_LOGSTASH_DOCKERFILE: Template = template!("elk/logstash/Dockerfile");
pub const ELK_LOGSTASH_PIPELINE: Template = template!("elk/logstash/logstash.conf");
pub const ELK_LOGSTASH_CONFIG: Template = template!("elk/logstash/logstash.yml");
pub const ELK_KIBANA_DOCKERFILE: Template = template!("elk/kibana/Dockerfile");
pub const ELK_KIBANA_CONFIG: Template = template!("elk/kibana/kibana.yml");

pub const IDENTITY_NGINX_CONF: Template = template!("identity/nginx.conf.tera");
pub const IDENTITY_APP_CONFIG: Template = template!("identity/local.js.tera");
pub const IDENTITY_LOCALDEV_CONFIG: Template = template!("identity/localdev.js.tera");
pub const IDENTITY_ENTRY_POINT: Template = template!("identity/entry-point.sh");

pub const FILE_SERVICE_APP_CONFIG: Template = template!("file-service/local.js");
pub const FILE_SERVICE_ENTRY_POINT: Template = template!("file-service/entry-point.sh");

pub const SERVERLESS_PROVIDER_CONFIG: Template =
    template!("serverless-functions/provider-config.json.tera");

pub const DOCKER_MINION_REGISTRY_CONFIG: Template =
    template!("docker-minion/registry-config.yml.tera");
pub const DOCKER_MINION_APP_CONFIG: Template = template!("docker-minion/app-config.js.tera");
pub const DOCKER_MINION_ENTRY_POINT: Template = template!("docker-minion/entry-point.sh");
