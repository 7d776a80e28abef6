//! 5x5 reduced shogi: kings, golds and silvers, with captured pieces held in
//! hand and dropped back onto any empty square.
//!
//! The machine starts on row 0 and moves toward row 4, so its "forward" is +1
//! and the human's direction tables are the machine's mirrored top-to-bottom.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::board::{Coord, Grid, Score, Side};
use crate::error::{EngineError, Result};
use crate::rules::{Outcome, Rules};

pub const SIZE: usize = 5;
pub const MATE: Score = 100_000;
const CENTER_BONUS: Score = 5;
/// Extra worth of a piece in hand over its board value.
const HAND_BONUS: Score = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    #[serde(rename = "K", alias = "王")]
    King,
    #[serde(rename = "G", alias = "金")]
    Gold,
    #[serde(rename = "S", alias = "銀")]
    Silver,
}

const KING_STEPS: [(isize, isize); 8] = [(-1, -1), (-1, 0), (-1, 1), (0, -1), (0, 1), (1, -1), (1, 0), (1, 1)];
const GOLD_STEPS: [(isize, isize); 6] = [(1, -1), (1, 0), (1, 1), (0, -1), (0, 1), (-1, 0)];
const SILVER_STEPS: [(isize, isize); 5] = [(1, -1), (1, 0), (1, 1), (-1, -1), (-1, 1)];

fn mirror(steps: &[(isize, isize)]) -> Vec<(isize, isize)> {
    steps.iter().map(|&(dr, dc)| (-dr, dc)).collect()
}

lazy_static! {
    static ref HUMAN_GOLD_STEPS: Vec<(isize, isize)> = mirror(&GOLD_STEPS);
    static ref HUMAN_SILVER_STEPS: Vec<(isize, isize)> = mirror(&SILVER_STEPS);
}

impl Kind {
    pub fn value(self) -> Score {
        match self {
            Kind::King => 50_000,
            Kind::Gold => 200,
            Kind::Silver => 150,
        }
    }

    fn steps(self, owner: Side) -> &'static [(isize, isize)] {
        match (self, owner) {
            (Kind::King, _) => &KING_STEPS,
            (Kind::Gold, Side::Machine) => &GOLD_STEPS,
            (Kind::Gold, Side::Human) => &HUMAN_GOLD_STEPS,
            (Kind::Silver, Side::Machine) => &SILVER_STEPS,
            (Kind::Silver, Side::Human) => &HUMAN_SILVER_STEPS,
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

/// Captured pieces per side, in capture order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hands {
    #[serde(default, alias = "ai")]
    pub machine: Vec<Kind>,
    #[serde(default, alias = "player")]
    pub human: Vec<Kind>,
}

impl Hands {
    pub fn of(&self, side: Side) -> &[Kind] {
        match side {
            Side::Machine => &self.machine,
            Side::Human => &self.human,
        }
    }

    fn of_mut(&mut self, side: Side) -> &mut Vec<Kind> {
        match side {
            Side::Machine => &mut self.machine,
            Side::Human => &mut self.human,
        }
    }

    /// Removes one `kind` from `side`'s hand. `index` is trusted only while
    /// it still names that kind; otherwise the first matching entry goes.
    fn remove(&mut self, side: Side, kind: Kind, index: usize) -> Option<Kind> {
        let hand = self.of_mut(side);
        let idx = match hand.get(index) {
            Some(&k) if k == kind => Some(index),
            _ => hand.iter().position(|&k| k == kind),
        }?;
        Some(hand.remove(idx))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub board: Grid<Piece>,
    #[serde(default)]
    pub hands: Hands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Move {
    #[serde(rename = "move")]
    Step { from: Coord, to: Coord },
    #[serde(rename = "drop")]
    Drop {
        #[serde(rename = "pieceType")]
        kind: Kind,
        position: Coord,
        #[serde(rename = "inventoryIndex", alias = "index")]
        index: usize,
    },
}

pub fn position_bonus(at: Coord) -> Score {
    let center = (SIZE / 2) as isize;
    CENTER_BONUS - ((center - at.row as isize).abs() + (center - at.col as isize).abs()) as Score
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ShogiRules;

impl ShogiRules {
    fn piece_moves(&self, board: &Grid<Piece>, from: Coord, piece: Piece, out: &mut Vec<Move>) {
        for &(dr, dc) in piece.kind.steps(piece.owner) {
            if let Some(to) = board.step(from, dr, dc) {
                if board.get(to).map_or(true, |target| target.owner != piece.owner) {
                    out.push(Move::Step { from, to });
                }
            }
        }
    }

    fn has_king(board: &Grid<Piece>, owner: Side) -> bool {
        board.occupied().any(|(_, p)| p.kind == Kind::King && p.owner == owner)
    }
}

impl Rules for ShogiRules {
    type Position = Position;
    type Move = Move;

    const NAME: &'static str = "shogi";
    const SEARCH_DEPTH: u32 = 4;

    fn initial_position(&self) -> Position {
        const BACK_RANK: [Kind; SIZE] = [Kind::Silver, Kind::Gold, Kind::King, Kind::Gold, Kind::Silver];
        let mut board = Grid::empty(SIZE);
        for (col, &kind) in BACK_RANK.iter().enumerate() {
            board.place(Coord::new(0, col), Piece::new(kind, Side::Machine));
            board.place(Coord::new(SIZE - 1, col), Piece::new(kind, Side::Human));
        }
        Position { board, hands: Hands::default() }
    }

    fn check_position(&self, position: &Position) -> Result<()> {
        position.board.check_size(SIZE)
    }

    fn moves_from(&self, position: &Position, from: Coord, side: Side) -> Result<Vec<Move>> {
        self.check_position(position)?;
        let from = position.board.check(from)?;
        let piece = position
            .board
            .get(from)
            .ok_or(EngineError::EmptySquare { row: from.row, col: from.col })?;
        let mut moves = Vec::new();
        if piece.owner == side {
            self.piece_moves(&position.board, from, *piece, &mut moves);
        }
        Ok(moves)
    }

    /// Board moves first, then drops by hand index and row-major target.
    fn all_moves(&self, position: &Position, side: Side) -> Vec<Move> {
        let board = &position.board;
        let mut moves = Vec::new();
        for (from, piece) in board.occupied().filter(|(_, p)| p.owner == side) {
            self.piece_moves(board, from, *piece, &mut moves);
        }
        for (index, &kind) in position.hands.of(side).iter().enumerate() {
            for at in board.coords().filter(|&at| board.get(at).is_none()) {
                moves.push(Move::Drop { kind, position: at, index });
            }
        }
        moves
    }

    fn apply(&self, position: &Position, mv: &Move, side: Side) -> Position {
        let mut next = position.clone();
        match *mv {
            Move::Step { from, to } => {
                if let Some(piece) = next.board.take(from) {
                    if let Some(captured) = next.board.place(to, piece) {
                        next.hands.of_mut(piece.owner).push(captured.kind);
                    }
                }
            }
            Move::Drop { kind, position: at, index } => {
                if next.hands.remove(side, kind, index).is_some() {
                    next.board.place(at, Piece::new(kind, side));
                }
            }
        }
        next
    }

    fn evaluate(&self, position: &Position) -> Score {
        if let Some(score) = self.decided(position) {
            return score;
        }
        let on_board: Score = position
            .board
            .occupied()
            .map(|(at, piece)| piece.owner.sign() * (piece.kind.value() + position_bonus(at)))
            .sum();
        let in_hand: Score = [Side::Machine, Side::Human]
            .into_iter()
            .flat_map(|side| position.hands.of(side).iter().map(move |kind| side.sign() * (kind.value() + HAND_BONUS)))
            .sum();
        on_board + in_hand
    }

    fn decided(&self, position: &Position) -> Option<Score> {
        if !Self::has_king(&position.board, Side::Human) {
            Some(MATE)
        } else if !Self::has_king(&position.board, Side::Machine) {
            Some(-MATE)
        } else {
            None
        }
    }

    fn stalled(&self, _position: &Position, side: Side) -> Score {
        -side.sign() * MATE
    }

    fn order_key(&self, position: &Position, mv: &Move) -> Score {
        match *mv {
            Move::Step { from, to } => {
                let mover = position.board.get(from).map(|p| p.owner);
                match position.board.get(to) {
                    Some(target) if Some(target.owner) != mover => target.kind.value(),
                    _ => 0,
                }
            }
            Move::Drop { .. } => 0,
        }
    }

    fn outcome(&self, position: &Position) -> Option<Outcome> {
        self.decided(position).map(|score| {
            Outcome::Winner(if score > 0 { Side::Machine } else { Side::Human })
        })
    }
}
