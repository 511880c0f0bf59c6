//! Error types for the voxel builder.

use crate::types::BlockPosition;
use thiserror::Error;

/// Result type alias using BuilderError.
pub type Result<T> = std::result::Result<T, BuilderError>;

/// Main error type for planning and build sessions.
#[derive(Error, Debug)]
pub enum BuilderError {
    /// Failed to parse embedded or caller-supplied JSON data.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The block registry has no entry for a state id.
    #[error("Unknown block state id: {0}")]
    UnknownState(u32),

    /// A blueprint was queried outside of its grid.
    #[error("Position {0:?} is outside the blueprint")]
    OutsideBlueprint(BlockPosition),

    /// A voxel grid was built with a state buffer that does not match its size.
    #[error("Invalid voxel grid: {0}")]
    InvalidGrid(String),

    /// `continue` was requested but no build is in progress.
    #[error("No build to continue")]
    NothingToContinue,
}
