//! モデル定義
//!
//! スタック構成で使用されるデータモデルを定義します。

mod credentials;
mod mode;
mod port;
mod service;
mod settings;
mod volume;

// Re-exports
pub use credentials::*;
pub use mode::*;
pub use port::*;
pub use service::*;
pub use settings::*;
pub use volume::*;

/// 1回の構成処理で全ビルダーに渡される引数
///
/// 構成開始時に一度だけ作られ、以降は読み取り専用で共有される。
#[derive(Debug, Clone)]
pub struct BuildArguments {
    pub settings: StackSettings,
    pub config: StackConfig,
    pub credentials: StackCredentials,
}

impl BuildArguments {
    pub fn new(
        settings: StackSettings,
        config: StackConfig,
        credentials: StackCredentials,
    ) -> Self {
        Self {
            settings,
            config,
            credentials,
        }
    }

    /// サービスのデプロイモード
    pub fn mode(&self, service: StackService) -> DeploymentMode {
        self.config.mode(service)
    }

    pub fn admin_password(&self) -> &str {
        &self.settings.default_admin_password
    }
}
