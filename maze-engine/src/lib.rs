// lib.rs - Library exports for maze-engine
// Perfect-maze generation and the longest-path solver family.

pub mod cell;
pub mod error_handling;
pub mod maze;
pub mod snapshot;
pub mod solvers;

// Re-export commonly used types
pub use cell::{Cell, Location, Side};
pub use error_handling::{CellError, MazeError, SolverError};
pub use maze::{Maze, StepEvent, StepState};
pub use snapshot::{MazeConfiguration, SerializedCell, SerializedMaze};
pub use solvers::{
    BinaryWorkerPoolSolver, CancelToken, CandidateSet, LongestPathSolver, SequentialSolver,
    Solution, WorkerPoolSolver, DEFAULT_NUMBER_OF_THREADS,
};
