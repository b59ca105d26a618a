// Error types for the decision engine and its configuration

use thiserror::Error;

/// Malformed board input. These are never recovered inside the engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("board dimensions must be positive (got {width}x{height})")]
    InvalidDimensions { width: i32, height: i32 },

    #[error("snake '{id}' is not present on the board")]
    MissingSelf { id: String },

    #[error("snake '{id}' has an empty body")]
    EmptyBody { id: String },
}

/// Failure to load `Snake.toml`
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}
