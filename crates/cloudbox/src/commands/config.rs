use crate::utils;
use cloudbox_config::StackPaths;
use cloudbox_core::{DeploymentMode, StackService};
use colored::Colorize;

pub fn show(paths: &StackPaths) -> anyhow::Result<()> {
    let settings = utils::load_settings_or_default(paths)?;
    let config = cloudbox_config::load_config(paths)?;

    println!("{}", "スタック設定".bold());
    println!("  ルート: {}", paths.root().display().to_string().cyan());
    println!(
        "  管理者パスワード: {}",
        utils::mask_password(&settings.default_admin_password)
    );

    println!();
    println!("{}", "ソースディレクトリ:".bold());
    for service in StackService::ALL {
        let dir = settings
            .source_directory(service)
            .map(|d| d.display().to_string())
            .unwrap_or_else(|| "-".dimmed().to_string());
        println!("  • {:<22} {}", service.key(), dir);
    }

    println!();
    println!("{}", "デプロイモード:".bold());
    utils::print_modes(&config);

    Ok(())
}

pub fn set(paths: &StackPaths, service: StackService, mode: DeploymentMode) -> anyhow::Result<()> {
    let mut config = cloudbox_config::load_config(paths)?;
    let previous = config.mode(service);
    config.set_mode(service, mode);

    paths.ensure()?;
    cloudbox_config::save_config(paths, &config)?;

    println!(
        "{} {}: {} → {}",
        "✓".green(),
        service.key(),
        previous.as_str(),
        mode.as_str().cyan()
    );
    if matches!(mode, DeploymentMode::Local | DeploymentMode::LocalDev) {
        let settings = utils::load_settings_or_default(paths)?;
        if settings.source_directory(service).is_none() {
            println!(
                "  {} {} のソースディレクトリが未設定です",
                "⚠".yellow(),
                service.display_name()
            );
            println!("    {} を参照してください", "cloudbox init --help".cyan());
        }
    }

    Ok(())
}
