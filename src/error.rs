use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("No configuration for meter {0}")]
    UnknownMeter(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected totals payload: {0}")]
    UnexpectedPayload(String),

    #[error("Key '{0}' not found in totals payload")]
    MissingTotal(String),

    #[error("Invalid total value '{0}'")]
    InvalidTotal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No '{prefix}...*Wh)' line in {path}")]
    NoMatchingLine { prefix: String, path: String },

    #[error("Invalid meter reading '{0}'")]
    InvalidReading(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
