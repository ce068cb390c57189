use compact_str::CompactString;
use thiserror::Error;

use crate::client::ClientError;

pub type Result<T> = std::result::Result<T, ExporterError>;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("Failure reading configuration file: {0}")]
    ConfigError(CompactString),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    GeneralError(CompactString),
}
