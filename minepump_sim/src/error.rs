//! Error types for the simulation driver.

use minepump_env::EnvError;
use thiserror::Error;

/// Errors surfaced by the driver and its exporters.
#[derive(Debug, Error)]
pub enum SimError {
    /// The driver produced input the core boundary rejects
    #[error("Invalid driver input: {0}")]
    Boundary(#[from] EnvError),

    /// Export file could not be written
    #[error("Export I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Export could not be serialized
    #[error("Export serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
