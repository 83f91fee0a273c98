// cell.rs - A single grid position with wall state and lazily discovered passages

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error_handling::CellError;

/// Location of a cell within the maze grid. Both axes are 0-bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub column: usize,
    pub row: usize,
}

impl Location {
    pub const fn new(column: usize, row: usize) -> Self {
        Self { column, row }
    }

    /// Deterministic string key for set/map membership across serialization
    /// boundaries.
    pub fn id(&self) -> String {
        format!("{}_{}", self.column, self.row)
    }
}

/// The four sides of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

    /// Bit used for this side in wall masks.
    pub const fn mask(self) -> u8 {
        match self {
            Side::Top => 0b0001,
            Side::Right => 0b0010,
            Side::Bottom => 0b0100,
            Side::Left => 0b1000,
        }
    }

    pub const fn opposite(self) -> Side {
        match self {
            Side::Top => Side::Bottom,
            Side::Right => Side::Left,
            Side::Bottom => Side::Top,
            Side::Left => Side::Right,
        }
    }
}

/// Mask with all four walls present.
pub const ALL_SIDES: u8 = 0b1111;

/// Wall masks of cells that are a straight through-passage; such cells can
/// never be an endpoint of the longest path.
const THROUGH_CORRIDOR_MASKS: [u8; 2] = [
    Side::Top.mask() | Side::Bottom.mask(),
    Side::Left.mask() | Side::Right.mask(),
];

/// A maze cell. Created once per grid position, mutated only by wall-removal
/// operations during generation, read-only afterwards.
#[derive(Debug, Clone)]
pub struct Cell {
    location: Location,
    walls: u8,
    outer_walls: u8,
    paths: Vec<Location>,
}

impl Cell {
    pub fn new(column: usize, row: usize) -> Self {
        Self {
            location: Location::new(column, row),
            walls: ALL_SIDES,
            outer_walls: 0,
            paths: Vec::new(),
        }
    }

    pub fn column(&self) -> usize {
        self.location.column
    }

    pub fn row(&self) -> usize {
        self.location.row
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn id(&self) -> String {
        self.location.id()
    }

    /// Bitmask of the walls still present.
    pub fn active_walls(&self) -> u8 {
        self.walls
    }

    /// Bitmask of the sides that lie on the maze boundary.
    pub fn outer_walls(&self) -> u8 {
        self.outer_walls
    }

    /// Neighbor locations reachable through removed walls, in the order the
    /// passages were created.
    pub fn paths(&self) -> &[Location] {
        &self.paths
    }

    pub fn number_of_neighbors(&self) -> usize {
        self.paths.len()
    }

    pub fn has_wall(&self, side: Side) -> bool {
        self.walls & side.mask() != 0
    }

    /// True when the cell's only missing walls are an opposite pair, making
    /// it a straight through-passage.
    pub fn is_through_corridor(&self) -> bool {
        THROUGH_CORRIDOR_MASKS.contains(&self.walls)
    }

    /// Marks a side as an outer wall. Additive; called once per boundary side
    /// at construction.
    pub fn set_outer_wall(&mut self, side: Side) {
        self.outer_walls |= side.mask();
    }

    fn remove_wall(&mut self, side: Side) {
        self.walls &= !side.mask();
    }

    /// The side this cell shares with the other cell, when they are adjacent.
    /// Adjacency is Manhattan distance 1 along exactly one axis.
    fn shared_side(&self, other: &Cell) -> Option<Side> {
        let column_difference = other.location.column as i64 - self.location.column as i64;
        let row_difference = other.location.row as i64 - self.location.row as i64;

        match (column_difference, row_difference) {
            (1, 0) => Some(Side::Right),
            (-1, 0) => Some(Side::Left),
            (0, 1) => Some(Side::Bottom),
            (0, -1) => Some(Side::Top),
            _ => None,
        }
    }

    pub fn is_neighbors_with(&self, other: &Cell) -> bool {
        self.shared_side(other).is_some()
    }

    /// Removes the shared wall between this cell and an adjacent cell, on
    /// both sides atomically, and records the reciprocal passage in each
    /// cell's `paths`.
    pub fn create_path_to(&mut self, other: &mut Cell) -> Result<(), CellError> {
        let side = self
            .shared_side(other)
            .ok_or(CellError::InvalidAdjacency {
                from: self.location,
                to: other.location,
            })?;

        self.remove_wall(side);
        other.remove_wall(side.opposite());
        self.paths.push(other.location);
        other.paths.push(self.location);
        Ok(())
    }

    /// True iff the shared side with the other cell has no wall.
    pub fn has_path_to(&self, other: &Cell) -> bool {
        match self.shared_side(other) {
            Some(side) => !self.has_wall(side),
            None => false,
        }
    }

    /// Removes one outer wall, chosen uniformly among the outer walls still
    /// present. Returns the removed side, or `None` when no outer wall
    /// remains.
    pub fn remove_random_outer_wall<R: Rng>(&mut self, rng: &mut R) -> Option<Side> {
        let removable: Vec<Side> = Side::ALL
            .iter()
            .copied()
            .filter(|side| self.outer_walls & side.mask() != 0 && self.has_wall(*side))
            .collect();

        let side = removable.choose(rng).copied()?;
        self.remove_wall(side);
        Some(side)
    }

    /// The four orthogonal neighbor locations, regardless of grid bounds.
    /// Coordinates below zero wrap to `usize::MAX` and fail the grid bounds
    /// check just like any other invalid location; bounds-checking is the
    /// caller's responsibility.
    pub fn neighbor_locations(&self) -> [Location; 4] {
        let Location { column, row } = self.location;
        [
            Location::new(column.wrapping_sub(1), row),
            Location::new(column + 1, row),
            Location::new(column, row.wrapping_sub(1)),
            Location::new(column, row + 1),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_new_cell_has_all_walls() {
        let cell = Cell::new(2, 3);
        assert_eq!(cell.active_walls(), ALL_SIDES);
        assert_eq!(cell.outer_walls(), 0);
        assert_eq!(cell.number_of_neighbors(), 0);
        assert_eq!(cell.id(), "2_3");
    }

    #[test]
    fn test_create_path_removes_walls_on_both_sides() {
        let mut left = Cell::new(0, 0);
        let mut right = Cell::new(1, 0);

        left.create_path_to(&mut right).unwrap();

        assert!(!left.has_wall(Side::Right));
        assert!(!right.has_wall(Side::Left));
        assert!(left.has_path_to(&right));
        assert!(right.has_path_to(&left));
        assert_eq!(left.paths(), &[Location::new(1, 0)]);
        assert_eq!(right.paths(), &[Location::new(0, 0)]);
    }

    #[test]
    fn test_create_path_rejects_non_adjacent_cells() {
        let mut a = Cell::new(0, 0);
        let mut b = Cell::new(1, 1);

        let result = a.create_path_to(&mut b);
        assert!(matches!(result, Err(CellError::InvalidAdjacency { .. })));
        assert_eq!(a.active_walls(), ALL_SIDES);
        assert_eq!(b.active_walls(), ALL_SIDES);
    }

    #[test]
    fn test_has_path_to_requires_removed_wall() {
        let a = Cell::new(0, 0);
        let b = Cell::new(0, 1);
        assert!(a.is_neighbors_with(&b));
        assert!(!a.has_path_to(&b));
    }

    #[test]
    fn test_remove_random_outer_wall_only_touches_outer_sides() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut cell = Cell::new(0, 0);
        cell.set_outer_wall(Side::Left);
        cell.set_outer_wall(Side::Top);

        let removed = cell.remove_random_outer_wall(&mut rng).unwrap();
        assert!(matches!(removed, Side::Left | Side::Top));
        assert!(!cell.has_wall(removed));

        // The second call removes the remaining outer wall, the third is a
        // no-op.
        let second = cell.remove_random_outer_wall(&mut rng).unwrap();
        assert_ne!(removed, second);
        assert_eq!(cell.remove_random_outer_wall(&mut rng), None);
        assert_eq!(cell.active_walls() & 0b0110, 0b0110);
    }

    #[test]
    fn test_neighbor_locations_ignore_bounds() {
        let cell = Cell::new(0, 0);
        let neighbors = cell.neighbor_locations();
        assert!(neighbors.contains(&Location::new(usize::MAX, 0)));
        assert!(neighbors.contains(&Location::new(1, 0)));
        assert!(neighbors.contains(&Location::new(0, usize::MAX)));
        assert!(neighbors.contains(&Location::new(0, 1)));
    }

    #[test]
    fn test_corridor_masks_are_opposite_pairs() {
        assert_eq!(THROUGH_CORRIDOR_MASKS[0], 0b0101);
        assert_eq!(THROUGH_CORRIDOR_MASKS[1], 0b1010);
        for side in Side::ALL {
            assert_eq!(side.opposite().opposite(), side);
        }
    }

    #[test]
    fn test_through_corridor_requires_opposite_openings() {
        // Passages left and right leave only the top and bottom walls.
        let mut left = Cell::new(0, 0);
        let mut middle = Cell::new(1, 0);
        let mut right = Cell::new(2, 0);
        left.create_path_to(&mut middle).unwrap();
        middle.create_path_to(&mut right).unwrap();

        assert!(middle.is_through_corridor());
        assert!(!left.is_through_corridor());

        // A corner opening is not a corridor.
        let mut below = Cell::new(1, 1);
        middle.create_path_to(&mut below).unwrap();
        assert!(!middle.is_through_corridor());
    }
}
