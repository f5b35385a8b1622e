//! compose サービス定義（マニフェストの断片）

use super::port::PortMapping;
use super::volume::VolumeMapping;

/// マニフェストに出力される1サービス分の定義
///
/// 出力時のキー順序は [`crate::compose::render`] で固定されるため、
/// ここでのフィールド順は意味を持たない。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeService {
    /// サービス名（コンテナ名）
    pub key: String,
    /// サービス定義の直前に出力するコメント行
    pub comments: Vec<String>,
    pub build: Option<BuildSettings>,
    pub init: Option<bool>,
    pub image: Option<String>,
    pub restart: Option<RestartPolicy>,
    pub extra_hosts: Vec<String>,
    /// 環境変数（宣言順を保持）
    pub environment: Vec<(String, String)>,
    pub ports: Vec<PortMapping>,
    pub command: Option<Vec<String>>,
    pub volumes: Vec<VolumeMapping>,
    pub logging: Option<LoggingSettings>,
    pub networks: Vec<String>,
    pub depends_on: Vec<String>,
}

impl ComposeService {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn comments<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.comments = lines.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(mut self, build: BuildSettings) -> Self {
        self.build = Some(build);
        self
    }

    pub fn init(mut self, init: bool) -> Self {
        self.init = Some(init);
        self
    }

    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn restart(mut self, policy: RestartPolicy) -> Self {
        self.restart = Some(policy);
        self
    }

    pub fn extra_host(mut self, host: impl Into<String>) -> Self {
        self.extra_hosts.push(host.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.push((key.into(), value.into()));
        self
    }

    pub fn port(mut self, host: u16, container: u16) -> Self {
        self.ports.push(PortMapping::new(host, container));
        self
    }

    pub fn command<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = Some(args.into_iter().map(Into::into).collect());
        self
    }

    pub fn volume(mut self, volume: VolumeMapping) -> Self {
        self.volumes.push(volume);
        self
    }

    pub fn logging_driver(mut self, driver: impl Into<String>) -> Self {
        self.logging = Some(LoggingSettings {
            driver: driver.into(),
        });
        self
    }

    pub fn network(mut self, network: impl Into<String>) -> Self {
        self.networks.push(network.into());
        self
    }

    pub fn depends_on<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on.extend(keys.into_iter().map(Into::into));
        self
    }

    /// 環境変数を名前で取得
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.environment
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// パス区切りを含まない（名前付き）ボリューム
    pub fn named_volumes(&self) -> impl Iterator<Item = &str> {
        self.volumes
            .iter()
            .filter(|v| v.is_named())
            .map(|v| v.source.as_str())
    }
}

/// 再起動ポリシー
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RestartPolicy {
    /// 再起動しない（デフォルト）
    #[default]
    No,
    /// 常に再起動
    Always,
    /// 異常終了時のみ再起動
    OnFailure,
    /// 明示的に停止しない限り再起動
    UnlessStopped,
}

impl RestartPolicy {
    /// 文字列からパース
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "no" => Some(Self::No),
            "always" => Some(Self::Always),
            "on-failure" | "on_failure" => Some(Self::OnFailure),
            "unless-stopped" | "unless_stopped" => Some(Self::UnlessStopped),
            _ => None,
        }
    }

    /// compose ファイルで使用する文字列に変換
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::No => "no",
            Self::Always => "always",
            Self::OnFailure => "on-failure",
            Self::UnlessStopped => "unless-stopped",
        }
    }
}

/// ビルド設定
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSettings {
    /// ビルドコンテキストのパス
    pub context: String,
    /// ビルド引数（宣言順を保持）
    pub args: Vec<(String, String)>,
}

impl BuildSettings {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.push((key.into(), value.into()));
        self
    }
}

/// ログ設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub driver: String,
}
