//! 8x8 Reversi. The machine plays white, the human plays black.

use serde::{Deserialize, Serialize};

use crate::board::{Coord, CoordMask, Grid, Mask, Score, Side};
use crate::error::Result;
use crate::rules::{Outcome, Rules};

pub const SIZE: usize = 8;
/// Score of a finished game, signed toward the side with more stones.
pub const WIN: Score = 100_000;

const DIRECTIONS: [(isize, isize); 8] = [(-1, -1), (-1, 0), (-1, 1), (0, -1), (0, 1), (1, -1), (1, 0), (1, 1)];

/// Corners are worth most, the squares touching them are traps, edges are mildly good.
const CELL_VALUES: [[Score; SIZE]; SIZE] = [
    [100, -20, 10, 5, 5, 10, -20, 100],
    [-20, -50, -2, -2, -2, -2, -50, -20],
    [10, -2, 5, 1, 1, 5, -2, 10],
    [5, -2, 1, 1, 1, 1, -2, 5],
    [5, -2, 1, 1, 1, 1, -2, 5],
    [10, -2, 5, 1, 1, 5, -2, 10],
    [-20, -50, -2, -2, -2, -2, -50, -20],
    [100, -20, 10, 5, 5, 10, -20, 100],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stone {
    Black,
    White,
}

impl Stone {
    pub fn of(side: Side) -> Self {
        match side {
            Side::Machine => Stone::White,
            Side::Human => Stone::Black,
        }
    }

    pub fn owner(self) -> Side {
        match self {
            Stone::White => Side::Machine,
            Stone::Black => Side::Human,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Stone::Black => Stone::White,
            Stone::White => Stone::Black,
        }
    }
}

pub type Board = Grid<Stone>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    pub position: Coord,
}

impl Placement {
    pub const fn new(position: Coord) -> Self {
        Self { position }
    }
}

/// Zero off the 8x8 board.
pub fn cell_value(at: Coord) -> Score {
    CELL_VALUES.get(at.row).and_then(|row| row.get(at.col)).copied().unwrap_or(0)
}

/// Stones that placing `stone` on `at` would turn over, across all eight directions.
pub fn flips(board: &Board, at: Coord, stone: Stone) -> Mask {
    let mut mask = Mask::for_grid(board.size());
    if !board.is_empty_at(at) {
        return mask;
    }
    for (dr, dc) in DIRECTIONS {
        let mut run = Vec::new();
        let mut cursor = board.step(at, dr, dc);
        while let Some(c) = cursor.filter(|&c| board.get(c) == Some(&stone.flipped())) {
            run.push(c);
            cursor = board.step(c, dr, dc);
        }
        let closed = cursor.is_some_and(|c| board.get(c) == Some(&stone));
        if closed && !run.is_empty() {
            for c in run {
                mask.set_coord(c, board.size(), true);
            }
        }
    }
    mask
}

/// `(black, white)` stone counts.
pub fn stone_counts(board: &Board) -> (usize, usize) {
    board.occupied().fold((0, 0), |(black, white), (_, stone)| match stone {
        Stone::Black => (black + 1, white),
        Stone::White => (black, white + 1),
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReversiRules;

impl ReversiRules {
    pub fn is_legal(&self, board: &Board, at: Coord, side: Side) -> bool {
        flips(board, at, Stone::of(side)).any()
    }

    fn final_score(board: &Board) -> Score {
        let (black, white) = stone_counts(board);
        match white.cmp(&black) {
            std::cmp::Ordering::Greater => Stone::White.owner().sign() * WIN,
            std::cmp::Ordering::Less => Stone::Black.owner().sign() * WIN,
            std::cmp::Ordering::Equal => 0,
        }
    }

    fn finished(&self, board: &Board) -> bool {
        self.all_moves(board, Side::Machine).is_empty() && self.all_moves(board, Side::Human).is_empty()
    }
}

impl Rules for ReversiRules {
    type Position = Board;
    type Move = Placement;

    const NAME: &'static str = "reversi";
    const SEARCH_DEPTH: u32 = 4;

    fn initial_position(&self) -> Board {
        let mut board = Board::empty(SIZE);
        board.place(Coord::new(3, 3), Stone::White);
        board.place(Coord::new(3, 4), Stone::Black);
        board.place(Coord::new(4, 3), Stone::Black);
        board.place(Coord::new(4, 4), Stone::White);
        board
    }

    fn check_position(&self, board: &Board) -> Result<()> {
        board.check_size(SIZE)
    }

    fn moves_from(&self, board: &Board, from: Coord, side: Side) -> Result<Vec<Placement>> {
        self.check_position(board)?;
        let from = board.check(from)?;
        Ok(self.is_legal(board, from, side).then(|| Placement::new(from)).into_iter().collect())
    }

    fn all_moves(&self, board: &Board, side: Side) -> Vec<Placement> {
        board
            .coords()
            .filter(|&at| self.is_legal(board, at, side))
            .map(Placement::new)
            .collect()
    }

    fn apply(&self, board: &Board, mv: &Placement, side: Side) -> Board {
        let stone = Stone::of(side);
        let turned = flips(board, mv.position, stone);
        let mut next = board.clone();
        next.place(mv.position, stone);
        for at in turned.coords(board.size()) {
            next.place(at, stone);
        }
        next
    }

    fn evaluate(&self, board: &Board) -> Score {
        board
            .occupied()
            .map(|(at, stone)| stone.owner().sign() * cell_value(at))
            .sum()
    }

    /// A side without a placement passes; if neither side can place, the game is over.
    fn stalled(&self, board: &Board, side: Side) -> Score {
        if self.all_moves(board, side.opponent()).is_empty() {
            Self::final_score(board)
        } else {
            self.evaluate(board)
        }
    }

    fn order_key(&self, _board: &Board, mv: &Placement) -> Score {
        cell_value(mv.position)
    }

    fn outcome(&self, board: &Board) -> Option<Outcome> {
        if !self.finished(board) {
            return None;
        }
        Some(match Self::final_score(board).signum() {
            1 => Outcome::Winner(Side::Machine),
            -1 => Outcome::Winner(Side::Human),
            _ => Outcome::Draw,
        })
    }
}
