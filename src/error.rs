//! Error types for the planner

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlanError {
    /// Invalid input detected before any tree growth.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The rejection-sampling loop never produced a collision-free edge.
    #[error("Iteration {iteration} stalled after {attempts} rejected samples")]
    StalledIteration { iteration: usize, attempts: usize },

    #[error("Tree store is full (capacity {capacity})")]
    TreeFull { capacity: usize },

    /// Slots are created strictly in iteration order.
    #[error("Expected to record slot {expected}, got {got}")]
    OutOfOrder { expected: usize, got: usize },

    #[error("Corrupt tree: {0}")]
    CorruptTree(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, PlanError>;
