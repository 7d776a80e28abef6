use bitvec::prelude::*;
use serde::de::{Deserialize, Deserializer, Error as _};
use serde::ser::{Serialize, Serializer};

use crate::error::{EngineError, Result};

/// Signed evaluation, positive favours the machine side in every game.
pub type Score = i32;

/// Which of the two players an occupant belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[serde(alias = "ai")]
    Machine,
    #[serde(alias = "player")]
    Human,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Side::Machine => Side::Human,
            Side::Human => Side::Machine,
        }
    }

    /// +1 for the machine, -1 for the human.
    pub fn sign(self) -> Score {
        match self {
            Side::Machine => 1,
            Side::Human => -1,
        }
    }
}

/// A square on the board, `(row, col)` with row 0 at the machine's edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl From<(usize, usize)> for Coord {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl Serialize for Coord {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> where S: Serializer {
        [self.row, self.col].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Coord {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error> where D: Deserializer<'de> {
        let arr = Vec::<usize>::deserialize(deserializer)?;
        match arr.as_slice() {
            [row, col] => Ok(Coord::new(*row, *col)),
            _ => Err(D::Error::invalid_length(arr.len(), &"a [row, col] pair")),
        }
    }
}

/// Square grid of optional occupants, stored row-major.
///
/// Rule code never mutates a grid it was handed; applying a move clones the
/// grid and edits the copy, so sibling search branches never see each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Grid<T> {
    size: usize,
    cells: Vec<Option<T>>,
}

impl<T> Grid<T> {
    pub fn empty(size: usize) -> Self {
        Self {
            size,
            cells: (0..size * size).map(|_| None).collect(),
        }
    }

    pub fn from_rows(rows: Vec<Vec<Option<T>>>) -> Result<Self> {
        let size = rows.len();
        if let Some(bad) = rows.iter().find(|row| row.len() != size) {
            return Err(EngineError::BoardSize {
                expected: size,
                found: format!("a row of {} cells in a board of {} rows", bad.len(), size),
            });
        }
        Ok(Self {
            size,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    /// Checks that the grid has the dimension a game requires.
    pub fn expect_size(self, size: usize) -> Result<Self> {
        self.check_size(size)?;
        Ok(self)
    }

    pub fn check_size(&self, size: usize) -> Result<()> {
        if self.size == size {
            Ok(())
        } else {
            Err(EngineError::BoardSize {
                expected: size,
                found: format!("{0}x{0}", self.size),
            })
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn contains(&self, coord: Coord) -> bool {
        coord.row < self.size && coord.col < self.size
    }

    /// Validates a caller-supplied coordinate before it is used for grid access.
    pub fn check(&self, coord: Coord) -> Result<Coord> {
        if self.contains(coord) {
            Ok(coord)
        } else {
            Err(EngineError::OutOfBounds { row: coord.row, col: coord.col, size: self.size })
        }
    }

    /// Offsets `coord` by `(dr, dc)`, or `None` when that leaves the board.
    pub fn step(&self, coord: Coord, dr: isize, dc: isize) -> Option<Coord> {
        let row = coord.row.checked_add_signed(dr)?;
        let col = coord.col.checked_add_signed(dc)?;
        let next = Coord::new(row, col);
        self.contains(next).then_some(next)
    }

    fn index(&self, coord: Coord) -> Option<usize> {
        self.contains(coord).then(|| coord.row * self.size + coord.col)
    }

    pub fn get(&self, coord: Coord) -> Option<&T> {
        self.index(coord).and_then(|idx| self.cells[idx].as_ref())
    }

    pub fn is_empty_at(&self, coord: Coord) -> bool {
        self.contains(coord) && self.get(coord).is_none()
    }

    /// Replaces the occupant at `coord`, returning the previous one.
    /// Out-of-range coordinates leave the grid untouched.
    pub fn set(&mut self, coord: Coord, occupant: Option<T>) -> Option<T> {
        match self.index(coord) {
            Some(idx) => std::mem::replace(&mut self.cells[idx], occupant),
            None => None,
        }
    }

    pub fn place(&mut self, coord: Coord, occupant: T) -> Option<T> {
        self.set(coord, Some(occupant))
    }

    pub fn take(&mut self, coord: Coord) -> Option<T> {
        self.set(coord, None)
    }

    /// Every square in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> {
        let size = self.size;
        (0..size * size).map(move |idx| Coord::new(idx / size, idx % size))
    }

    /// Occupied squares in row-major order.
    pub fn occupied(&self) -> impl Iterator<Item = (Coord, &T)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(idx, cell)| cell.as_ref().map(|occ| (Coord::new(idx / self.size, idx % self.size), occ)))
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Option<T>]> + '_ {
        self.cells.chunks(self.size.max(1))
    }

    /// Copy flipped top-to-bottom with every occupant passed through `f`.
    pub fn mirrored<U>(&self, f: impl Fn(&T) -> U) -> Grid<U> {
        let mut out = Grid::empty(self.size);
        for (at, occ) in self.occupied() {
            out.place(Coord::new(self.size - 1 - at.row, at.col), f(occ));
        }
        out
    }
}

impl<T: Serialize> Serialize for Grid<T> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> where S: Serializer {
        serializer.collect_seq(self.rows())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Grid<T> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error> where D: Deserializer<'de> {
        let rows = Vec::<Vec<Option<T>>>::deserialize(deserializer)?;
        Grid::from_rows(rows).map_err(D::Error::custom)
    }
}

/// One bit per square of a grid, row-major.
pub type Mask = BitVec<u64, Lsb0>;

pub trait CoordMask {
    fn for_grid(size: usize) -> Self;
    fn set_coord(&mut self, coord: Coord, size: usize, value: bool);
    fn coords(&self, size: usize) -> Vec<Coord>;
}

impl CoordMask for Mask {
    fn for_grid(size: usize) -> Self {
        bitvec![u64, Lsb0; 0; size * size]
    }

    fn set_coord(&mut self, coord: Coord, size: usize, value: bool) {
        if coord.row < size && coord.col < size {
            self.set(coord.row * size + coord.col, value);
        }
    }

    fn coords(&self, size: usize) -> Vec<Coord> {
        self.iter_ones().map(|idx| Coord::new(idx / size, idx % size)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_rejects_coordinates_off_the_board() {
        let grid: Grid<u8> = Grid::empty(5);
        assert_eq!(grid.step(Coord::new(0, 0), -1, 0), None);
        assert_eq!(grid.step(Coord::new(0, 4), 0, 1), None);
        assert_eq!(grid.step(Coord::new(4, 4), 1, 1), None);
        assert_eq!(grid.step(Coord::new(2, 2), 2, -2), Some(Coord::new(4, 0)));
    }

    #[test]
    fn check_reports_out_of_bounds() {
        let grid: Grid<u8> = Grid::empty(8);
        assert!(grid.check(Coord::new(7, 7)).is_ok());
        assert!(matches!(
            grid.check(Coord::new(8, 0)),
            Err(EngineError::OutOfBounds { row: 8, col: 0, size: 8 })
        ));
    }

    #[test]
    fn set_outside_grid_is_ignored() {
        let mut grid: Grid<u8> = Grid::empty(3);
        assert_eq!(grid.place(Coord::new(0, 3), 1), None);
        assert_eq!(grid.occupied().count(), 0);
    }

    #[test]
    fn from_rows_rejects_ragged_boards() {
        let rows = vec![vec![None, Some(1u8)], vec![None]];
        assert!(matches!(Grid::from_rows(rows), Err(EngineError::BoardSize { .. })));
    }

    #[test]
    fn grid_json_is_a_list_of_rows() {
        let mut grid: Grid<u8> = Grid::empty(2);
        grid.place(Coord::new(1, 0), 7);
        let json = serde_json::to_string(&grid).unwrap();
        assert_eq!(json, "[[null,null],[7,null]]");
        let back: Grid<u8> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, grid);
    }

    #[test]
    fn coord_json_requires_a_pair() {
        assert_eq!(serde_json::from_str::<Coord>("[2,3]").unwrap(), Coord::new(2, 3));
        assert!(serde_json::from_str::<Coord>("[2]").is_err());
    }

    #[test]
    fn mask_iterates_set_coords_row_major() {
        let mut mask = Mask::for_grid(8);
        mask.set_coord(Coord::new(3, 4), 8, true);
        mask.set_coord(Coord::new(0, 1), 8, true);
        let coords = mask.coords(8);
        assert_eq!(coords, vec![Coord::new(0, 1), Coord::new(3, 4)]);

        let mut wide = Mask::for_grid(10);
        wide.set_coord(Coord::new(9, 9), 10, true);
        assert_eq!(wide.coords(10), vec![Coord::new(9, 9)]);
    }

    #[test]
    fn side_json_accepts_ai_and_player() {
        assert_eq!(serde_json::from_str::<Side>("\"ai\"").unwrap(), Side::Machine);
        assert_eq!(serde_json::from_str::<Side>("\"player\"").unwrap(), Side::Human);
        assert_eq!(serde_json::to_string(&Side::Machine).unwrap(), "\"machine\"");
    }
}
