// solvers/search.rs - Randomized depth-first longest-path walk

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::cell::Location;
use crate::snapshot::{cell_at, SerializedCell, SerializedMaze};
use crate::solvers::Solution;

/// Derives the RNG for one start cell. The stream depends only on the seed
/// and the start location, so identical seeds reproduce identical walks no
/// matter which solver variant or worker performs them.
pub(crate) fn rng_for_start(seed: Option<u64>, start: Location) -> StdRng {
    match seed {
        Some(seed) => {
            StdRng::seed_from_u64(seed ^ ((start.column as u64) << 32) ^ start.row as u64)
        }
        None => StdRng::from_entropy(),
    }
}

/// Single-sample longest-path estimate from one start cell.
///
/// Walks the passage graph depth first with an explicit stack, choosing
/// uniformly among unvisited passage neighbors. A dead end is recorded as the
/// new longest path when the walk is deeper than the best so far and the cell
/// qualifies as an endpoint (it has at least one outer wall). Because the
/// neighbor choice is randomized rather than exhaustive, repeating the walk
/// with a different seed can legitimately yield a different estimate.
pub(crate) fn longest_path_from(
    maze: &SerializedMaze,
    start: Location,
    rng: &mut StdRng,
) -> Solution {
    let mut visited: HashSet<Location> = HashSet::new();
    let mut stack: Vec<&SerializedCell> = Vec::new();
    let mut best = Solution::empty();

    let mut cell = cell_at(maze, start);
    while let Some(current) = cell {
        visited.insert(current.location);

        match random_unvisited_neighbor(current, &visited, rng) {
            None => {
                if stack.len() + 1 > best.path.len() && current.outer_walls != 0 {
                    let mut path: Vec<SerializedCell> =
                        stack.iter().map(|cell| (*cell).clone()).collect();
                    path.push(current.clone());
                    best = Solution {
                        from_location: Some(start),
                        to_cell: Some(current.clone()),
                        path,
                    };
                }
                cell = stack.pop();
            }
            Some(next) => {
                stack.push(current);
                cell = cell_at(maze, next);
            }
        }
    }

    best.from_location = Some(start);
    best
}

fn random_unvisited_neighbor(
    cell: &crate::snapshot::SerializedCell,
    visited: &HashSet<Location>,
    rng: &mut StdRng,
) -> Option<Location> {
    let valid: Vec<Location> = cell
        .paths
        .iter()
        .copied()
        .filter(|location| !visited.contains(location))
        .collect();

    match valid.len() {
        0 => None,
        1 => Some(valid[0]),
        count => Some(valid[rng.gen_range(0..count)]),
    }
}
