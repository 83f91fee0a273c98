// error_handling.rs - Error taxonomy for maze generation and the solver family

use std::time::Duration;
use thiserror::Error;

use crate::cell::Location;

/// Errors raised by operations on individual cells.
#[derive(Error, Debug)]
pub enum CellError {
    #[error("cell {from:?} is not adjacent to cell {to:?}")]
    InvalidAdjacency { from: Location, to: Location },
}

/// Errors raised while generating a maze or resolving its entry and exit.
#[derive(Error, Debug)]
pub enum MazeError {
    #[error("maze dimensions {columns}x{rows} are invalid; both must be at least 1")]
    InvalidDimensions { columns: usize, rows: usize },

    #[error(transparent)]
    Cell(#[from] CellError),

    #[error("longest path search failed: {0}")]
    Solve(#[from] SolverError),

    #[error("solver produced no usable entry and exit")]
    EmptySolution,
}

/// Errors raised by the longest-path solver family.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("the candidate entry-cell set is empty")]
    EmptyCandidateSet,

    #[error("no worker reply within {timeout:?} ({active} workers outstanding)")]
    WorkerTimeout { timeout: Duration, active: usize },

    #[error("solve was cancelled")]
    Cancelled,

    #[error("worker {index} received a follow-up task before the maze snapshot")]
    MissingSnapshot { index: usize },

    #[error("worker channel closed unexpectedly")]
    ChannelClosed,

    #[error("task message encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("background solve task failed: {0}")]
    TaskJoin(String),
}

pub type Result<T, E = MazeError> = std::result::Result<T, E>;
