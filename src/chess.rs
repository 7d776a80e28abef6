//! 8x8 chess-like variant.
//!
//! The machine plays black from rows 0-1, the human white from rows 6-7.
//! There is no check detection: the game ends when a king is captured, so a
//! missing king is the terminal condition the evaluator looks for.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::board::{Coord, Grid, Score, Side};
use crate::error::{EngineError, Result};
use crate::rules::{Outcome, Rules};

pub const SIZE: usize = 8;
/// Terminal magnitude, above any reachable material plus positional sum.
pub const MATE: Score = 100_000;
const CENTER_BONUS: Score = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    #[serde(rename = "K")]
    King,
    #[serde(rename = "Q")]
    Queen,
    #[serde(rename = "R")]
    Rook,
    #[serde(rename = "B")]
    Bishop,
    #[serde(rename = "N")]
    Knight,
    #[serde(rename = "P")]
    Pawn,
}

const KING_STEPS: [(isize, isize); 8] = [(-1, -1), (-1, 0), (-1, 1), (0, -1), (0, 1), (1, -1), (1, 0), (1, 1)];
const KNIGHT_STEPS: [(isize, isize); 8] = [(-2, -1), (-2, 1), (-1, -2), (-1, 2), (1, -2), (1, 2), (2, -1), (2, 1)];
const ROOK_RAYS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const BISHOP_RAYS: [(isize, isize); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
const QUEEN_RAYS: [(isize, isize); 8] = [(-1, 0), (1, 0), (0, -1), (0, 1), (-1, -1), (-1, 1), (1, -1), (1, 1)];

impl Kind {
    pub fn value(self) -> Score {
        match self {
            Kind::King => 50_000,
            Kind::Queen => 900,
            Kind::Rook => 500,
            Kind::Bishop => 330,
            Kind::Knight => 320,
            Kind::Pawn => 100,
        }
    }

    fn slides(self) -> bool {
        matches!(self, Kind::Rook | Kind::Bishop | Kind::Queen)
    }

    fn directions(self) -> &'static [(isize, isize)] {
        match self {
            Kind::King => &KING_STEPS,
            Kind::Knight => &KNIGHT_STEPS,
            Kind::Rook => &ROOK_RAYS,
            Kind::Bishop => &BISHOP_RAYS,
            Kind::Queen => &QUEEN_RAYS,
            Kind::Pawn => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    #[serde(rename = "type")]
    pub kind: Kind,
    pub owner: Side,
}

impl Piece {
    pub const fn new(kind: Kind, owner: Side) -> Self {
        Self { kind, owner }
    }
}

pub type Board = Grid<Piece>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Coord,
    pub to: Coord,
}

impl Move {
    pub const fn new(from: Coord, to: Coord) -> Self {
        Self { from, to }
    }
}

lazy_static! {
    // 10 minus the Manhattan distance to the (3.5, 3.5) centre. Both terms
    // are odd when doubled, so the halved sum is exact.
    static ref POSITION_BONUS: Vec<Score> = (0..SIZE * SIZE)
        .map(|idx| {
            let (row, col) = ((idx / SIZE) as Score, (idx % SIZE) as Score);
            let last = (SIZE - 1) as Score;
            CENTER_BONUS - ((last - 2 * row).abs() + (last - 2 * col).abs()) / 2
        })
        .collect();
}

/// Zero off the 8x8 board.
pub fn position_bonus(at: Coord) -> Score {
    if at.row >= SIZE || at.col >= SIZE {
        return 0;
    }
    POSITION_BONUS.get(at.row * SIZE + at.col).copied().unwrap_or(0)
}

fn forward(owner: Side) -> isize {
    match owner {
        Side::Machine => 1,
        Side::Human => -1,
    }
}

fn pawn_start_row(owner: Side) -> usize {
    match owner {
        Side::Machine => 1,
        Side::Human => SIZE - 2,
    }
}

fn promotion_row(owner: Side) -> usize {
    match owner {
        Side::Machine => SIZE - 1,
        Side::Human => 0,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChessRules;

impl ChessRules {
    fn piece_moves(&self, board: &Board, from: Coord, piece: Piece, out: &mut Vec<Move>) {
        if piece.kind == Kind::Pawn {
            self.pawn_moves(board, from, piece.owner, out);
            return;
        }
        for &(dr, dc) in piece.kind.directions() {
            let mut cursor = board.step(from, dr, dc);
            while let Some(to) = cursor {
                match board.get(to) {
                    None => out.push(Move::new(from, to)),
                    Some(target) => {
                        if target.owner != piece.owner {
                            out.push(Move::new(from, to));
                        }
                        break;
                    }
                }
                if !piece.kind.slides() {
                    break;
                }
                cursor = board.step(to, dr, dc);
            }
        }
    }

    fn pawn_moves(&self, board: &Board, from: Coord, owner: Side, out: &mut Vec<Move>) {
        let dr = forward(owner);
        if let Some(one) = board.step(from, dr, 0).filter(|&to| board.is_empty_at(to)) {
            out.push(Move::new(from, one));
            if from.row == pawn_start_row(owner) {
                if let Some(two) = board.step(one, dr, 0).filter(|&to| board.is_empty_at(to)) {
                    out.push(Move::new(from, two));
                }
            }
        }
        for dc in [-1, 1] {
            if let Some(to) = board.step(from, dr, dc) {
                if board.get(to).is_some_and(|target| target.owner != owner) {
                    out.push(Move::new(from, to));
                }
            }
        }
    }

    fn has_king(board: &Board, owner: Side) -> bool {
        board.occupied().any(|(_, p)| p.kind == Kind::King && p.owner == owner)
    }

    /// The piece a move would capture, for callers keeping a captured list.
    pub fn captured(&self, board: &Board, mv: &Move) -> Option<Piece> {
        let mover = board.get(mv.from)?;
        board.get(mv.to).filter(|target| target.owner != mover.owner).copied()
    }
}

impl Rules for ChessRules {
    type Position = Board;
    type Move = Move;

    const NAME: &'static str = "chess";
    const SEARCH_DEPTH: u32 = 3;

    fn initial_position(&self) -> Board {
        const BACK_RANK: [Kind; SIZE] = [
            Kind::Rook,
            Kind::Knight,
            Kind::Bishop,
            Kind::Queen,
            Kind::King,
            Kind::Bishop,
            Kind::Knight,
            Kind::Rook,
        ];
        let mut board = Board::empty(SIZE);
        for (col, &kind) in BACK_RANK.iter().enumerate() {
            board.place(Coord::new(0, col), Piece::new(kind, Side::Machine));
            board.place(Coord::new(1, col), Piece::new(Kind::Pawn, Side::Machine));
            board.place(Coord::new(SIZE - 2, col), Piece::new(Kind::Pawn, Side::Human));
            board.place(Coord::new(SIZE - 1, col), Piece::new(kind, Side::Human));
        }
        board
    }

    fn check_position(&self, board: &Board) -> Result<()> {
        board.check_size(SIZE)
    }

    fn moves_from(&self, board: &Board, from: Coord, side: Side) -> Result<Vec<Move>> {
        self.check_position(board)?;
        let from = board.check(from)?;
        let piece = board.get(from).ok_or(EngineError::EmptySquare { row: from.row, col: from.col })?;
        let mut moves = Vec::new();
        if piece.owner == side {
            self.piece_moves(board, from, *piece, &mut moves);
        }
        Ok(moves)
    }

    fn all_moves(&self, board: &Board, side: Side) -> Vec<Move> {
        let mut moves = Vec::new();
        for (from, piece) in board.occupied().filter(|(_, p)| p.owner == side) {
            self.piece_moves(board, from, *piece, &mut moves);
        }
        moves
    }

    fn apply(&self, board: &Board, mv: &Move, _side: Side) -> Board {
        let mut next = board.clone();
        if let Some(mut piece) = next.take(mv.from) {
            if piece.kind == Kind::Pawn && mv.to.row == promotion_row(piece.owner) {
                piece.kind = Kind::Queen;
            }
            next.place(mv.to, piece);
        }
        next
    }

    fn evaluate(&self, board: &Board) -> Score {
        if let Some(score) = self.decided(board) {
            return score;
        }
        board
            .occupied()
            .map(|(at, piece)| piece.owner.sign() * (piece.kind.value() + position_bonus(at)))
            .sum()
    }

    fn decided(&self, board: &Board) -> Option<Score> {
        if !Self::has_king(board, Side::Human) {
            Some(MATE)
        } else if !Self::has_king(board, Side::Machine) {
            Some(-MATE)
        } else {
            None
        }
    }

    /// No legal move is treated as a loss for the side to move.
    fn stalled(&self, _board: &Board, side: Side) -> Score {
        -side.sign() * MATE
    }

    fn order_key(&self, board: &Board, mv: &Move) -> Score {
        self.captured(board, mv).map_or(0, |victim| victim.kind.value())
    }

    fn outcome(&self, board: &Board) -> Option<Outcome> {
        self.decided(board).map(|score| {
            Outcome::Winner(if score > 0 { Side::Machine } else { Side::Human })
        })
    }
}
