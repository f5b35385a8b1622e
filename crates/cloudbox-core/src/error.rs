use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("不明なデプロイモード: {0} (stable / latest / local / localDev)")]
    UnknownDeploymentMode(String),

    #[error("不明なサービス: {0}")]
    UnknownService(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
