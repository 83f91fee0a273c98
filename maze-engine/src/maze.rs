// maze.rs - Maze grid ownership, randomized depth-first generation, step events

use std::collections::HashSet;

use log::debug;
use rand::Rng;

use crate::cell::{Cell, Location, Side};
use crate::error_handling::MazeError;
use crate::snapshot::{MazeConfiguration, SerializedCell, SerializedMaze};
use crate::solvers::{LongestPathSolver, Solution};

/// Kind of progress made by one generation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Discovery,
    Backtrack,
}

/// Event emitted once per generation step; consumed by the external
/// visualiser to drive animation frame-by-frame.
#[derive(Debug, Clone, Copy)]
pub struct StepEvent {
    pub cell: Location,
    pub state: StepState,
    pub walls: u8,
}

type StepObserver = Box<dyn FnMut(&StepEvent) + Send>;

/// A rows×columns grid of cells forming a perfect maze: once generation
/// finishes, every cell is reachable from every other cell through exactly
/// one simple path.
pub struct Maze {
    columns: usize,
    rows: usize,
    cells: Vec<Cell>,
    entry: Option<Location>,
    exit: Option<Location>,
    observers: Vec<StepObserver>,
}

impl Maze {
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            cells: Vec::new(),
            entry: None,
            exit: None,
            observers: Vec::new(),
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// The cell at the given location, or `None` when the location falls
    /// outside the grid.
    pub fn cell(&self, column: usize, row: usize) -> Option<&Cell> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        self.cells.get(row * self.columns + column)
    }

    pub fn cell_at(&self, location: Location) -> Option<&Cell> {
        self.cell(location.column, location.row)
    }

    pub fn entry_cell(&self) -> Option<&Cell> {
        self.entry.and_then(|location| self.cell_at(location))
    }

    pub fn exit_cell(&self) -> Option<&Cell> {
        self.exit.and_then(|location| self.cell_at(location))
    }

    /// Registers a step observer. Observers are delivered every step event
    /// synchronously, in registration order.
    pub fn on_step_taken(&mut self, observer: impl FnMut(&StepEvent) + Send + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Rebuilds the cell matrix and carves a perfect maze with thread-local
    /// randomness. Entry and exit are cleared; use
    /// [`Maze::find_entry_and_exit`] afterwards, or [`Maze::generate_maze`]
    /// for the whole pipeline.
    pub fn generate(&mut self) -> Result<(), MazeError> {
        let mut rng = rand::thread_rng();
        self.generate_with_rng(&mut rng)
    }

    /// Same as [`Maze::generate`] with caller-provided randomness, so layouts
    /// can be pinned for tests and benchmarks.
    pub fn generate_with_rng<R: Rng>(&mut self, rng: &mut R) -> Result<(), MazeError> {
        if self.columns == 0 || self.rows == 0 {
            return Err(MazeError::InvalidDimensions {
                columns: self.columns,
                rows: self.rows,
            });
        }

        let columns = self.columns;
        let rows = self.rows;
        let mut cells = build_cells(columns, rows);

        self.entry = None;
        self.exit = None;

        let start = Location::new(rng.gen_range(0..columns), rng.gen_range(0..rows));
        let mut visited: HashSet<Location> = HashSet::with_capacity(columns * rows);
        visited.insert(start);

        let mut stack: Vec<Location> = Vec::new();
        let mut current = Some(start);

        while let Some(location) = current {
            let candidates = unvisited_neighbors(&cells, columns, rows, location, &visited);

            if candidates.is_empty() {
                let walls = cells[location.row * columns + location.column].active_walls();
                let event = StepEvent {
                    cell: location,
                    state: StepState::Backtrack,
                    walls,
                };
                for observer in &mut self.observers {
                    observer(&event);
                }
                current = stack.pop();
                continue;
            }

            let next = candidates[rng.gen_range(0..candidates.len())];
            stack.push(location);

            let (cell, neighbor) = cell_pair_mut(
                &mut cells,
                location.row * columns + location.column,
                next.row * columns + next.column,
            );
            cell.create_path_to(neighbor)?;

            let event = StepEvent {
                cell: location,
                state: StepState::Discovery,
                walls: cell.active_walls(),
            };
            for observer in &mut self.observers {
                observer(&event);
            }

            visited.insert(next);
            current = Some(next);
        }

        self.cells = cells;
        debug!("generated {}x{} maze starting at {:?}", columns, rows, start);
        Ok(())
    }

    /// Delegates to the solver for the longest-path endpoints, punches an
    /// opening in each, and stores them as entry and exit. Returns the
    /// solution the endpoints came from.
    pub async fn find_entry_and_exit<S>(&mut self, solver: &S) -> Result<Solution, MazeError>
    where
        S: LongestPathSolver + ?Sized,
    {
        let solution = solver.solve(self).await?;

        let entry = solution.from_location.ok_or(MazeError::EmptySolution)?;
        let exit = solution
            .to_cell
            .as_ref()
            .map(|cell| cell.location)
            .ok_or(MazeError::EmptySolution)?;

        let mut rng = rand::thread_rng();
        self.punch_opening(entry, &mut rng)?;
        // A 1x1 maze yields coinciding endpoints; it gets a single opening.
        if exit != entry {
            self.punch_opening(exit, &mut rng)?;
        }

        self.entry = Some(entry);
        self.exit = Some(exit);
        debug!(
            "entry {:?}, exit {:?}, longest path covers {} cells",
            entry,
            exit,
            solution.path.len()
        );
        Ok(solution)
    }

    /// Generates the maze and resolves its entry and exit in one call.
    pub async fn generate_maze<S>(&mut self, solver: &S) -> Result<Solution, MazeError>
    where
        S: LongestPathSolver + ?Sized,
    {
        self.generate()?;
        self.find_entry_and_exit(solver).await
    }

    fn punch_opening<R: Rng>(&mut self, location: Location, rng: &mut R) -> Result<(), MazeError> {
        let index = location.row * self.columns + location.column;
        let cell = self
            .cells
            .get_mut(index)
            .ok_or(MazeError::EmptySolution)?;
        cell.remove_random_outer_wall(rng);
        Ok(())
    }

    /// Plain nested-array snapshot of the grid; the wire format handed to
    /// solver workers. Contains no live references.
    pub fn serialize(&self) -> SerializedMaze {
        (0..self.rows)
            .map(|row| {
                (0..self.columns)
                    .map(|column| {
                        SerializedCell::from_cell(&self.cells[row * self.columns + column])
                    })
                    .collect()
            })
            .collect()
    }

    pub fn configuration(&self) -> MazeConfiguration {
        MazeConfiguration {
            columns: self.columns,
            rows: self.rows,
            entry_cell: self.entry,
            exit_cell: self.exit,
        }
    }

    /// Walls-and-openings dump of the grid for terminals and debugging. The
    /// entry and exit cells are marked `E` and `X`.
    pub fn render_ascii(&self) -> String {
        let mut out = String::new();
        if self.cells.is_empty() {
            return out;
        }

        for row in 0..self.rows {
            for column in 0..self.columns {
                let cell = &self.cells[row * self.columns + column];
                out.push('+');
                out.push_str(if cell.has_wall(Side::Top) { "---" } else { "   " });
            }
            out.push_str("+\n");

            for column in 0..self.columns {
                let cell = &self.cells[row * self.columns + column];
                out.push(if cell.has_wall(Side::Left) { '|' } else { ' ' });
                let location = Location::new(column, row);
                if self.entry == Some(location) {
                    out.push_str(" E ");
                } else if self.exit == Some(location) {
                    out.push_str(" X ");
                } else {
                    out.push_str("   ");
                }
            }
            let last = &self.cells[row * self.columns + self.columns - 1];
            out.push(if last.has_wall(Side::Right) { '|' } else { ' ' });
            out.push('\n');
        }

        for column in 0..self.columns {
            let cell = &self.cells[(self.rows - 1) * self.columns + column];
            out.push('+');
            out.push_str(if cell.has_wall(Side::Bottom) { "---" } else { "   " });
        }
        out.push_str("+\n");
        out
    }
}

fn build_cells(columns: usize, rows: usize) -> Vec<Cell> {
    let mut cells = Vec::with_capacity(columns * rows);
    for row in 0..rows {
        for column in 0..columns {
            let mut cell = Cell::new(column, row);
            if column == 0 {
                cell.set_outer_wall(Side::Left);
            }
            if column == columns - 1 {
                cell.set_outer_wall(Side::Right);
            }
            if row == 0 {
                cell.set_outer_wall(Side::Top);
            }
            if row == rows - 1 {
                cell.set_outer_wall(Side::Bottom);
            }
            cells.push(cell);
        }
    }
    cells
}

fn unvisited_neighbors(
    cells: &[Cell],
    columns: usize,
    rows: usize,
    location: Location,
    visited: &HashSet<Location>,
) -> Vec<Location> {
    cells[location.row * columns + location.column]
        .neighbor_locations()
        .into_iter()
        .filter(|neighbor| neighbor.column < columns && neighbor.row < rows)
        .filter(|neighbor| !visited.contains(neighbor))
        .collect()
}

/// Mutable access to two distinct cells of the grid at once, so a wall can be
/// removed from both sides atomically.
fn cell_pair_mut(cells: &mut [Cell], a: usize, b: usize) -> (&mut Cell, &mut Cell) {
    debug_assert_ne!(a, b);
    if a < b {
        let (left, right) = cells.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = cells.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}
