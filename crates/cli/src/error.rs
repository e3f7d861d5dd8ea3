use engine_config::error::ConfigError;
use engine_core::error::RunError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read or write a file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to load the configuration tree: {0}")]
    Config(#[from] ConfigError),

    #[error("Polling run failed: {0}")]
    Run(#[from] RunError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("Invalid database driver: {0}")]
    InvalidDriver(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}
