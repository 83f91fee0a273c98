// snapshot.rs - Plain-data maze snapshot passed across the solver concurrency boundary

use serde::{Deserialize, Serialize};

use crate::cell::{Cell, Location};

/// Wire descriptor of a single cell. Carries no live references so it can be
/// shipped to solver workers and back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedCell {
    pub id: String,
    pub location: Location,
    pub number_of_neighbors: usize,
    pub outer_walls: u8,
    pub paths: Vec<Location>,
}

impl SerializedCell {
    pub fn from_cell(cell: &Cell) -> Self {
        Self {
            id: cell.id(),
            location: cell.location(),
            number_of_neighbors: cell.number_of_neighbors(),
            outer_walls: cell.outer_walls(),
            paths: cell.paths().to_vec(),
        }
    }

    /// True when the cell is a straight through-passage (exactly two
    /// passages on opposite sides). Orthogonal neighbors share either the
    /// cell's row or its column, so two colinear passages are necessarily
    /// opposite.
    pub(crate) fn is_through_corridor(&self) -> bool {
        match self.paths.as_slice() {
            [a, b] => a.column == b.column || a.row == b.row,
            _ => false,
        }
    }
}

/// Per-row arrays of cell descriptors; the wire format consumed by solver
/// workers. Indexed as `maze[row][column]`.
pub type SerializedMaze = Vec<Vec<SerializedCell>>;

pub(crate) fn cell_at(maze: &SerializedMaze, location: Location) -> Option<&SerializedCell> {
    maze.get(location.row)?.get(location.column)
}

/// Maze facts consumed by the external visualiser.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MazeConfiguration {
    pub columns: usize,
    pub rows: usize,
    pub entry_cell: Option<Location>,
    pub exit_cell: Option<Location>,
}
