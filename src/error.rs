//! Error types for the combat engine
//!
//! Gameplay never fails through these: bad numbers degrade and missing
//! collaborators are skipped. Errors only surface from configuration,
//! notation parsing and the CLI.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CombatError {
    #[error("Invalid notation: {0}")]
    InvalidNotation(String),

    #[error("Invalid battle config: {0}")]
    InvalidConfig(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, CombatError>;
