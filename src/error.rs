//! Error types shared across the crate

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid dataset: {reason}")]
    Dataset { reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Model artifact error: {reason}")]
    Model { reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing failed: {reason}")]
    PasswordHash { reason: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;
