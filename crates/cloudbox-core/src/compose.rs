//! compose マニフェストの生成
//!
//! docker compose ファイルのうち、スタック構成で使う部分集合だけを
//! 決定的に出力する書き出し専用のエミッタ。読み込み側は存在しない。

use crate::model::{ComposeService, VolumeMapping};

/// 出力するマニフェストのフォーマットバージョン
pub const COMPOSE_VERSION: &str = "3.2";

/// 1段あたりのインデント
const INDENT: &str = "  ";

/// マニフェスト全体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeFile {
    pub version: String,
    /// 登録順のサービス一覧
    pub services: Vec<ComposeService>,
    /// 参照されている全ネットワーク（初出順、重複なし）
    pub networks: Vec<String>,
    /// 参照されている全名前付きボリューム（初出順、重複なし）
    pub volumes: Vec<String>,
}

impl ComposeFile {
    /// サービス一覧からネットワークとボリュームを導出して作成
    pub fn new(services: Vec<ComposeService>) -> Self {
        let mut networks = Vec::new();
        let mut volumes = Vec::new();
        for service in &services {
            for network in &service.networks {
                push_unique(&mut networks, network);
            }
            for volume in service.named_volumes() {
                push_unique(&mut volumes, volume);
            }
        }

        Self {
            version: COMPOSE_VERSION.to_string(),
            services,
            networks,
            volumes,
        }
    }

    pub fn service(&self, key: &str) -> Option<&ComposeService> {
        self.services.iter().find(|s| s.key == key)
    }

    /// テキストに変換
    pub fn render(&self) -> String {
        render(self)
    }
}

fn push_unique(set: &mut Vec<String>, value: &str) {
    if !set.iter().any(|v| v == value) {
        set.push(value.to_string());
    }
}

/// マニフェストをテキストに変換
///
/// 末尾の `networks:` / `volumes:` ブロックはサービスを走査した際に
/// 収集したものから出力する。
pub fn render(file: &ComposeFile) -> String {
    let mut writer = ComposeWriter::default();
    writer.write_file(file);
    writer.finish()
}

#[derive(Default)]
struct ComposeWriter {
    buffer: String,
    networks: Vec<String>,
    volumes: Vec<String>,
}

impl ComposeWriter {
    fn line(&mut self, data: &str, indent: usize) {
        for _ in 0..indent {
            self.buffer.push_str(INDENT);
        }
        self.buffer.push_str(data);
        self.buffer.push('\n');
    }

    fn blank(&mut self) {
        self.buffer.push('\n');
    }

    fn element(&mut self, key: &str, value: &str, indent: usize) {
        self.line(&format!("{} {}", key, value), indent);
    }

    fn write_file(&mut self, file: &ComposeFile) {
        self.line(&format!("version: '{}'", file.version), 0);
        self.blank();
        self.line("services:", 0);
        self.blank();

        for (index, service) in file.services.iter().enumerate() {
            if index > 0 {
                self.blank();
            }
            self.write_service(service);
        }

        if !self.networks.is_empty() {
            self.blank();
            self.line("networks:", 0);
            for network in std::mem::take(&mut self.networks) {
                self.line(&format!("{}:", network), 1);
            }
        }

        if !self.volumes.is_empty() {
            self.blank();
            self.line("volumes:", 0);
            for volume in std::mem::take(&mut self.volumes) {
                self.line(&format!("{}:", volume), 1);
            }
        }
    }

    fn write_service(&mut self, service: &ComposeService) {
        for comment in &service.comments {
            if comment.is_empty() || comment.starts_with('#') {
                self.line(comment, 1);
            } else {
                self.line(&format!("# {}", comment), 1);
            }
        }

        self.line(&format!("{}:", service.key), 1);

        if let Some(build) = &service.build {
            self.line("build:", 2);
            self.element("context:", &build.context, 3);
            if !build.args.is_empty() {
                self.line("args:", 3);
                for (key, value) in &build.args {
                    self.element(&format!("{}:", key), value, 4);
                }
            }
        }

        if let Some(init) = service.init {
            self.element("init:", if init { "true" } else { "false" }, 2);
        }
        if let Some(image) = &service.image {
            self.element("image:", image, 2);
        }
        if let Some(restart) = service.restart {
            self.element("restart:", restart.as_str(), 2);
        }

        if !service.extra_hosts.is_empty() {
            self.line("extra_hosts:", 2);
            for host in &service.extra_hosts {
                self.element("-", host, 3);
            }
        }

        if !service.environment.is_empty() {
            self.line("environment:", 2);
            for (key, value) in &service.environment {
                self.element(&format!("{}:", key), &quote_env_value(value), 3);
            }
        }

        if !service.ports.is_empty() {
            self.line("ports:", 2);
            for port in &service.ports {
                self.element("-", &format!("\"{}:{}\"", port.host, port.container), 3);
            }
        }

        if let Some(command) = &service.command {
            let args: Vec<String> = command.iter().map(|arg| format!("'{}'", arg)).collect();
            self.line(&format!("command: [{}]", args.join(", ")), 2);
        }

        if !service.volumes.is_empty() {
            self.line("volumes:", 2);
            for volume in &service.volumes {
                if volume.is_named() {
                    push_unique(&mut self.volumes, &volume.source);
                }
                self.element("-", &volume_entry(volume), 3);
            }
        }

        if let Some(logging) = &service.logging {
            self.line("logging:", 2);
            self.element("driver:", &logging.driver, 3);
        }

        if !service.networks.is_empty() {
            self.line("networks:", 2);
            for network in &service.networks {
                push_unique(&mut self.networks, network);
                self.element("-", network, 3);
            }
        }

        if !service.depends_on.is_empty() {
            self.line("depends_on:", 2);
            for dependency in &service.depends_on {
                self.element("-", dependency, 3);
            }
        }
    }

    fn finish(self) -> String {
        self.buffer
    }
}

/// 空白を含む値はダブルクォートで囲む
fn quote_env_value(value: &str) -> String {
    if value.contains(' ') {
        format!("\"{}\"", value)
    } else {
        value.to_string()
    }
}

fn volume_entry(volume: &VolumeMapping) -> String {
    match &volume.mode {
        Some(mode) => format!("{}:{}:{}", volume.source, volume.container_path, mode),
        None => format!("{}:{}", volume.source, volume.container_path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BuildSettings, RestartPolicy};

    fn sample() -> ComposeFile {
        ComposeFile::new(vec![
            ComposeService::new("mongo")
                .image("mongo")
                .restart(RestartPolicy::Always)
                .env("MONGO_INITDB_ROOT_USERNAME", "dbuser")
                .port(27017, 27017)
                .volume(VolumeMapping::named("mongo-db", "/data/db"))
                .volume(VolumeMapping::bind("/stack/configs/mongo/scripts", "/init").read_only())
                .logging_driver("none")
                .network("app"),
            ComposeService::new("api")
                .image("api:stable")
                .env("JAVA_OPTS", "-Xmx256m -Xms256m")
                .command(["./entry-point.sh", "--verbose"])
                .network("app")
                .network("edge")
                .depends_on(["mongo"]),
        ])
    }

    #[test]
    fn test_render_full_document() {
        let expected = "\
version: '3.2'

services:

  mongo:
    image: mongo
    restart: always
    environment:
      MONGO_INITDB_ROOT_USERNAME: dbuser
    ports:
      - \"27017:27017\"
    volumes:
      - mongo-db:/data/db
      - /stack/configs/mongo/scripts:/init:ro
    logging:
      driver: none
    networks:
      - app

  api:
    image: api:stable
    environment:
      JAVA_OPTS: \"-Xmx256m -Xms256m\"
    command: ['./entry-point.sh', '--verbose']
    networks:
      - app
      - edge
    depends_on:
      - mongo

networks:
  app:
  edge:

volumes:
  mongo-db:
";
        assert_eq!(sample().render(), expected);
    }

    #[test]
    fn test_env_quoting() {
        let file = ComposeFile::new(vec![
            ComposeService::new("svc")
                .env("WITH_SPACE", "admin:pw with space")
                .env("PLAIN", "adminpw"),
        ]);
        let output = file.render();

        assert!(output.contains("      WITH_SPACE: \"admin:pw with space\"\n"));
        assert!(output.contains("      PLAIN: adminpw\n"));
    }

    #[test]
    fn test_comments_and_build_section() {
        let file = ComposeFile::new(vec![
            ComposeService::new("setup")
                .comments(["Reference: docker-elk", "", "# already a comment"])
                .build(BuildSettings::new("/stack/configs/elk/setup/").arg("ELK_VERSION", "8.6.2"))
                .init(true)
                .network("app"),
        ]);
        let output = file.render();

        // 空のコメント行はインデントのみの行になる
        let expected_head = concat!(
            "  # Reference: docker-elk\n",
            "  \n",
            "  # already a comment\n",
            "  setup:\n",
            "    build:\n",
            "      context: /stack/configs/elk/setup/\n",
            "      args:\n",
            "        ELK_VERSION: 8.6.2\n",
            "    init: true\n",
            "    networks:\n",
        );
        assert!(output.contains(expected_head), "{}", output);
    }

    #[test]
    fn test_extra_hosts_and_empty_sections_omitted() {
        let file = ComposeFile::new(vec![
            ComposeService::new("proxy")
                .image("nginx")
                .extra_host("host.docker.internal:host-gateway"),
        ]);
        let output = file.render();

        assert!(output.contains("    extra_hosts:\n      - host.docker.internal:host-gateway\n"));
        assert!(!output.contains("environment:"));
        assert!(!output.contains("networks:"));
        assert!(!output.contains("volumes:"));
    }

    #[test]
    fn test_bind_sources_never_become_volumes() {
        let file = ComposeFile::new(vec![
            ComposeService::new("svc")
                .volume(VolumeMapping::bind("/var/run/docker.sock", "/var/run/docker.sock"))
                .volume(VolumeMapping::named("data", "/data").mode("Z")),
        ]);
        let output = file.render();

        assert!(output.ends_with("volumes:\n  data:\n"));
        assert!(!output.contains("  /var/run/docker.sock:\n"));
        assert_eq!(file.volumes, vec!["data"]);
    }

    #[test]
    fn test_derived_sets_match_rendered_blocks() {
        let file = sample();
        assert_eq!(file.networks, vec!["app", "edge"]);
        assert_eq!(file.volumes, vec!["mongo-db"]);

        let yaml: serde_yaml::Value = serde_yaml::from_str(&file.render()).unwrap();
        let networks: Vec<_> = yaml["networks"]
            .as_mapping()
            .unwrap()
            .keys()
            .map(|k| k.as_str().unwrap().to_string())
            .collect();
        assert_eq!(networks, file.networks);

        let volumes: Vec<_> = yaml["volumes"]
            .as_mapping()
            .unwrap()
            .keys()
            .map(|k| k.as_str().unwrap().to_string())
            .collect();
        assert_eq!(volumes, file.volumes);
    }

    #[test]
    fn test_render_is_valid_yaml() {
        let yaml: serde_yaml::Value = serde_yaml::from_str(&sample().render()).unwrap();

        assert_eq!(yaml["version"].as_str(), Some("3.2"));
        assert_eq!(yaml["services"]["mongo"]["image"].as_str(), Some("mongo"));
        assert_eq!(
            yaml["services"]["api"]["environment"]["JAVA_OPTS"].as_str(),
            Some("-Xmx256m -Xms256m")
        );
        assert_eq!(
            yaml["services"]["api"]["command"][1].as_str(),
            Some("--verbose")
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        assert_eq!(sample().render(), sample().render());
    }
}
