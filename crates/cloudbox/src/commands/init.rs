use crate::utils;
use clap::Args;
use cloudbox_config::StackPaths;
use cloudbox_core::StackService;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub struct InitArgs {
    /// 各サービスの管理者パスワード
    #[arg(long)]
    pub admin_password: Option<String>,
    /// identity のソースディレクトリ
    #[arg(long)]
    pub identity_source: Option<PathBuf>,
    /// notification service のソースディレクトリ
    #[arg(long)]
    pub notification_source: Option<PathBuf>,
    /// queue service のソースディレクトリ
    #[arg(long)]
    pub queue_source: Option<PathBuf>,
    /// file service のソースディレクトリ
    #[arg(long)]
    pub file_source: Option<PathBuf>,
    /// serverless functions service のソースディレクトリ
    #[arg(long)]
    pub serverless_functions_source: Option<PathBuf>,
    /// docker minion のソースディレクトリ
    #[arg(long)]
    pub docker_minion_source: Option<PathBuf>,
    /// state machine service のソースディレクトリ
    #[arg(long)]
    pub state_machine_source: Option<PathBuf>,
}

impl InitArgs {
    fn sources(self) -> [(StackService, Option<PathBuf>); 7] {
        [
            (StackService::Identity, self.identity_source),
            (StackService::Notification, self.notification_source),
            (StackService::Queue, self.queue_source),
            (StackService::File, self.file_source),
            (StackService::ServerlessFunctions, self.serverless_functions_source),
            (StackService::DockerMinion, self.docker_minion_source),
            (StackService::StateMachine, self.state_machine_source),
        ]
    }
}

/// 既存の settings.json に指定された値だけを上書きして保存
pub fn handle(paths: &StackPaths, mut args: InitArgs) -> anyhow::Result<()> {
    let mut settings = utils::load_settings_or_default(paths)?;

    if let Some(password) = args.admin_password.take() {
        settings.default_admin_password = password;
    }
    if settings.default_admin_password.is_empty() {
        anyhow::bail!(
            "管理者パスワードが未設定です: --admin-password を指定してください"
        );
    }

    for (service, dir) in args.sources() {
        if let Some(dir) = dir {
            settings.set_source_directory(service, dir);
        }
    }

    paths.ensure()?;
    cloudbox_config::save_settings(paths, &settings)?;

    println!(
        "{} {}",
        "✓ 設定を保存しました:".green(),
        paths.settings_file().display().to_string().cyan()
    );
    println!(
        "  管理者パスワード: {}",
        utils::mask_password(&settings.default_admin_password)
    );
    for service in StackService::ALL {
        if let Some(dir) = settings.source_directory(service) {
            println!("  • {}: {}", service.display_name(), dir.display());
        }
    }

    Ok(())
}
