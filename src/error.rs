use thiserror::Error;
use tokio::io;

use crate::storage::StoreError;

pub type ServiceResult<T> = core::result::Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    FromString(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("{0}")]
    IoError(#[from] io::Error),
    #[error("{0}")]
    SerdeJsonError(#[from] serde_json::Error),
    #[error("{0}")]
    Store(#[from] StoreError),
    #[error("Invalid address: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
}
