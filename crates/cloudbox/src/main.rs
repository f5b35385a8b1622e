mod commands;
mod progress;
mod utils;

use clap::{Parser, Subcommand};
use cloudbox_config::{BuildFailurePolicy, STACK_ROOT_ENV, StackPaths};
use cloudbox_core::{DeploymentMode, StackService};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cloudbox")]
#[command(about = "手元で動くクラウド一式を、docker compose で。", long_about = None)]
struct Cli {
    /// スタックのルートディレクトリ（デフォルト: ~/.mds/stack）
    #[arg(long, global = true, env = STACK_ROOT_ENV)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// settings.json を作成・更新
    Init(commands::init::InitArgs),
    /// サービスごとのデプロイモードを表示・変更
    #[command(subcommand)]
    Config(ConfigCommands),
    /// 設定ファイルと docker-compose.yml を生成
    Build {
        /// ビルド失敗時の扱い (lenient, abort, omit-failed)
        /// 未指定時は CLOUDBOX_BUILD_FAILURE_POLICY 環境変数
        #[arg(long)]
        on_build_failure: Option<BuildFailurePolicy>,
    },
    /// スタックを起動
    Up,
    /// スタックを停止（ボリュームも削除）
    Down,
    /// バージョン情報を表示
    Version,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// 現在の設定を表示
    Show,
    /// サービスのデプロイモードを変更
    Set {
        /// サービス名 (identity, notification, queue, file,
        /// serverlessFunctions, dockerMinion, stateMachine)
        service: StackService,
        /// デプロイモード (stable, latest, local, localDev)
        mode: DeploymentMode,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout は表示用なので、ログは stderr へ
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    // Versionコマンドはスタックディレクトリ不要
    if matches!(cli.command, Commands::Version) {
        println!("cloudbox {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let paths = match cli.root {
        Some(root) => StackPaths::new(root)?,
        None => StackPaths::discover()?,
    };
    tracing::debug!(root = %paths.root().display(), "Using stack root");

    match cli.command {
        Commands::Init(args) => commands::init::handle(&paths, args)?,
        Commands::Config(ConfigCommands::Show) => commands::config::show(&paths)?,
        Commands::Config(ConfigCommands::Set { service, mode }) => {
            commands::config::set(&paths, service, mode)?
        }
        Commands::Build { on_build_failure } => {
            let policy = match on_build_failure {
                Some(policy) => policy,
                None => BuildFailurePolicy::from_env()?,
            };
            commands::build::handle(&paths, policy).await?
        }
        Commands::Up => commands::up::handle(&paths).await?,
        Commands::Down => commands::down::handle(&paths).await?,
        Commands::Version => {
            unreachable!("Version is handled before resolving the stack root");
        }
    }

    Ok(())
}
