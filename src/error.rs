//! Error types for the erosion core
//!
//! Grid lookups that fall outside the field are not errors; they come back as
//! `None` and drive particle culling.

use std::collections::TryReserveError;

/// Everything that can go wrong while building or stepping an engine
#[derive(Debug, thiserror::Error)]
pub enum ErosionError {
    /// Backing storage for the height array, pool arena or a scratch buffer could not grow
    #[error("allocation failed: {0}")]
    Allocation(#[from] TryReserveError),

    /// World rectangle / cell size combination yields an empty or invalid grid
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A tunable parameter is outside its physical range
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParams { name: &'static str, reason: String },

    #[error("config parse error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ErosionError>;
