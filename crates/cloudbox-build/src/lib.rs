//! スタック構成のビルド機能
//!
//! 外部コマンドの実行、進捗通知、設定テンプレート、各サービスのビルダー、
//! それらをまとめて `docker-compose.yml` を生成する `StackManager` を提供します。

pub mod builders;
pub mod context;
pub mod error;
pub mod manager;
pub mod reporter;
pub mod runner;
pub mod templates;

pub use builders::{ServiceBuilder, registry};
pub use context::BuildContext;
pub use error::{BuildError, ProcessError, Result, StackError};
pub use manager::{ConfigureReport, ConfigureStage, PROJECT_NAME, StackManager};
pub use reporter::{Reporter, StackEvent};
pub use runner::{CommandRunner, ProcessCommand, RecordingRunner, ShellRunner};
