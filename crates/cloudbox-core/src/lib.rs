//! cloudbox のスタックモデル
//!
//! ローカル開発用クラウドスタックの設定モデル、認証情報、
//! および docker compose マニフェストの生成を提供します。

pub mod compose;
pub mod error;
pub mod model;
pub mod secrets;

pub use compose::{COMPOSE_VERSION, ComposeFile, render};
pub use error::{CoreError, Result};
pub use model::*;
pub use secrets::{RandomSecrets, SecretGenerator, generate_random_string};
