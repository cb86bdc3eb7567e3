use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdresseError {
    #[error("Backend error: {0}")]
    Backend(#[from] crate::backend::BackendError),
    #[error("missing search text: a non-empty 'q' parameter is required")]
    MissingQueryText,
    #[error("document {0} has no coordinate")]
    MissingCoordinate(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Init Logging error: {0}")]
    InitLoggingError(#[from] tracing_subscriber::filter::ParseError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AdresseError>;
