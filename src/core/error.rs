use thiserror::Error;

use crate::rules::RulesError;

#[derive(Error, Debug)]
pub enum OrdnanceError {
    #[error("Rules error: {0}")]
    Rules(#[from] RulesError),

    #[error("Invalid simulation config: {0}")]
    InvalidConfig(String),

    #[error("Scenario error: {0}")]
    Scenario(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, OrdnanceError>;
