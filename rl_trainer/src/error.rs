//! Error types for buffers, environments, checkpoints and the training loop.
//!
//! Each concern gets its own enum; [`TrainError`] is what the control loop
//! returns and wraps the others.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Invalid buffer construction parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// Capacity must be positive.
    #[error("buffer capacity must be > 0, got {0}")]
    InvalidCapacity(usize),
    /// A per-field dimensionality must be positive.
    #[error("{field} must be > 0, got {value}")]
    InvalidDimension { field: &'static str, value: usize },
    /// Reading device storage back to the host failed.
    #[error("failed to read buffer storage: {0}")]
    Readback(String),
}

/// Failure raised by an environment implementation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvError {
    /// The environment could not be reset.
    #[error("environment reset failed: {0}")]
    Reset(String),
    /// The environment rejected or failed on a step.
    #[error("environment step failed: {0}")]
    Step(String),
    /// The action does not fit the environment's action space.
    #[error("invalid action: {0}")]
    InvalidAction(String),
}

/// Error type for checkpointing operations.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// IO error during save/load.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Burn recorder error.
    #[error("recorder error: {0}")]
    Recorder(String),
    /// No checkpoint has been written at the expected path.
    #[error("no checkpoint found at {}", .0.display())]
    NoCheckpoint(PathBuf),
}

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A count parameter must be positive.
    #[error("{field} must be > 0, got {value}")]
    InvalidCount { field: &'static str, value: usize },
    /// A parameter is outside its valid range.
    #[error("{field} must be in [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    /// The agent and the environment disagree on a dimensionality.
    #[error("{field} mismatch: environment declares {expected}, agent uses {actual}")]
    DimensionMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    /// Working directory preparation or config file reading failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// The config file is not valid TOML for [`crate::config::TrainConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level error returned by the training loop.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error(transparent)]
    Env(#[from] EnvError),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
    /// Failure reported by the agent during collection or update.
    #[error("agent failure: {0}")]
    Agent(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
