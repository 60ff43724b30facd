use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid configuration: {field} must be positive and finite, got {value}")]
    InvalidConfig { field: &'static str, value: f64 },

    #[error("Invalid delay {0}: delays must be non-negative")]
    InvalidDelay(f64),

    #[error("Failed to read config {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Trace sink error: {0}")]
    Trace(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
