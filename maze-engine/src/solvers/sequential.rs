// solvers/sequential.rs - Single-threaded longest-path solver

use std::time::Instant;

use futures::future::BoxFuture;
use futures::FutureExt;
use log::debug;

use crate::error_handling::SolverError;
use crate::maze::Maze;
use crate::snapshot::SerializedMaze;
use crate::solvers::candidates::{determine_potential_entry_cells, CandidateSet};
use crate::solvers::search::{longest_path_from, rng_for_start};
use crate::solvers::{CancelToken, LongestPathSolver, Solution};

/// Longest-path solver that walks every candidate entry cell on a single
/// blocking task, pruning the candidate set with each discovered path.
pub struct SequentialSolver {
    seed: Option<u64>,
    cancel: CancelToken,
}

impl SequentialSolver {
    pub fn new() -> Self {
        Self {
            seed: None,
            cancel: CancelToken::new(),
        }
    }

    /// Pins the per-candidate search randomness for reproducible results.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

impl Default for SequentialSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl LongestPathSolver for SequentialSolver {
    fn solve(&self, maze: &Maze) -> BoxFuture<'static, Result<Solution, SolverError>> {
        let snapshot = maze.serialize();
        let seed = self.seed;
        let cancel = self.cancel.clone();

        async move {
            tokio::task::spawn_blocking(move || solve_snapshot(snapshot, seed, cancel))
                .await
                .map_err(|error| SolverError::TaskJoin(error.to_string()))?
        }
        .boxed()
    }
}

fn solve_snapshot(
    maze: SerializedMaze,
    seed: Option<u64>,
    cancel: CancelToken,
) -> Result<Solution, SolverError> {
    let overall = Instant::now();

    let mut candidates = CandidateSet::from_cells(&determine_potential_entry_cells(&maze));
    let mut best = Solution::empty();
    let mut attempts = 0usize;

    while !candidates.is_empty() {
        if cancel.is_cancelled() {
            return Err(SolverError::Cancelled);
        }

        let start_cell = candidates.shift()?;
        let discovery = Instant::now();
        let mut rng = rng_for_start(seed, start_cell);
        let solution = longest_path_from(&maze, start_cell, &mut rng);
        attempts += 1;

        debug!(
            "path from {:?} covers {} cells ({:?})",
            start_cell,
            solution.path.len(),
            discovery.elapsed()
        );

        candidates.prune(&solution.path);
        best.absorb_if_longer(solution);
    }

    debug!(
        "sequential solve finished after {} attempts in {:?}, longest path covers {} cells",
        attempts,
        overall.elapsed(),
        best.path.len()
    );
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn generated_maze(columns: usize, rows: usize, seed: u64) -> Maze {
        let mut maze = Maze::new(columns, rows);
        let mut rng = StdRng::seed_from_u64(seed);
        maze.generate_with_rng(&mut rng).unwrap();
        maze
    }

    #[tokio::test]
    async fn test_solve_returns_endpoint_with_outer_wall() {
        let maze = generated_maze(10, 8, 13);
        let solver = SequentialSolver::new().with_seed(4);

        let solution = solver.solve(&maze).await.unwrap();
        assert!(solution.path.len() >= 2);

        let to_cell = solution.to_cell.unwrap();
        assert_ne!(to_cell.outer_walls, 0);
        assert_eq!(
            to_cell.location,
            solution.path.last().unwrap().location
        );
    }

    #[tokio::test]
    async fn test_seeded_solve_is_reproducible() {
        let maze = generated_maze(15, 15, 2);

        let first = SequentialSolver::new().with_seed(11).solve(&maze).await.unwrap();
        let second = SequentialSolver::new().with_seed(11).solve(&maze).await.unwrap();

        assert_eq!(first.path.len(), second.path.len());
        assert_eq!(first.from_location, second.from_location);
        assert_eq!(
            first.to_cell.unwrap().location,
            second.to_cell.unwrap().location
        );
    }

    #[tokio::test]
    async fn test_single_cell_maze_yields_trivial_solution() {
        let maze = generated_maze(1, 1, 0);
        let solver = SequentialSolver::new();

        let solution = solver.solve(&maze).await.unwrap();
        assert_eq!(solution.path.len(), 1);
        assert_eq!(
            solution.from_location,
            solution.to_cell.map(|cell| cell.location)
        );
    }

    #[tokio::test]
    async fn test_pre_cancelled_solve_fails_fast() {
        let maze = generated_maze(6, 6, 1);
        let cancel = CancelToken::new();
        cancel.cancel();
        let solver = SequentialSolver::new().with_cancel_token(cancel);

        let result = solver.solve(&maze).await;
        assert!(matches!(result, Err(SolverError::Cancelled)));
    }
}
