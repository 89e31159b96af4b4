use proofport_primitives::PipelineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("Failed to read config file: {0}")]
    ConfigFileError(#[from] std::io::Error),
    #[error("Failed to parse config JSON: {0}")]
    ConfigParseError(#[from] serde_json::Error),
    #[error("Failed to parse url: {0}")]
    UrlParsingError(#[from] url::ParseError),
    #[error("Relay channel error: {0}")]
    ChannelError(String),
    #[error("Relay state error: {0}")]
    RelayStateError(String),
    #[error("Pipeline error: {0}")]
    PipelineError(#[from] PipelineError),
}

pub type Result<T> = core::result::Result<T, ClientError>;
