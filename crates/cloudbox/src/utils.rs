use cloudbox_config::{ConfigError, StackPaths};
use cloudbox_core::{StackConfig, StackService, StackSettings};
use colored::Colorize;

/// パスワードを伏せ字にする
pub fn mask_password(password: &str) -> String {
    if password.is_empty() {
        "(未設定)".to_string()
    } else {
        "*".repeat(8)
    }
}

/// settings.json を読み込む（存在しなければ空の設定）
pub fn load_settings_or_default(paths: &StackPaths) -> anyhow::Result<StackSettings> {
    match cloudbox_config::load_settings(paths) {
        Ok(settings) => Ok(settings),
        Err(ConfigError::ArtifactNotFound { .. }) => Ok(StackSettings::default()),
        Err(e) => Err(e.into()),
    }
}

/// サービスごとのデプロイモードを表示
pub fn print_modes(config: &StackConfig) {
    for service in StackService::ALL {
        println!(
            "  • {:<22} {}",
            service.key(),
            config.mode(service).as_str().cyan()
        );
    }
}
