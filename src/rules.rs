//! The capability pair every game plugs into the shared search.
//!
//! A [`Rules`] implementation is both the RuleSet (move enumeration and
//! application) and the Evaluator for one game. Scores are always from the
//! machine's point of view: positive is good for [`Side::Machine`].

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::board::{Coord, Score, Side};
use crate::error::{EngineError, Result};

/// Bound used for open alpha-beta windows. Negates cleanly.
pub const INFINITY: Score = Score::MAX;

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Winner(Side),
    Draw,
}

pub trait Rules {
    type Position: Clone + Debug;
    type Move: Clone + PartialEq + Debug + Serialize + DeserializeOwned;

    const NAME: &'static str;
    /// Plies searched below a candidate move by the hard tier.
    const SEARCH_DEPTH: u32;

    fn initial_position(&self) -> Self::Position;

    /// Rejects positions this game's tables do not cover. Every entry point
    /// taking a caller's position runs it; `all_moves`, `apply` and
    /// `evaluate` assume it has passed.
    fn check_position(&self, position: &Self::Position) -> Result<()>;

    /// Moves `side` can make from `from`: the piece standing there, or for
    /// placement games the placement on `from` itself. Empty when the piece
    /// belongs to the other side.
    fn moves_from(&self, position: &Self::Position, from: Coord, side: Side) -> Result<Vec<Self::Move>>;

    /// Every move `side` may make, row-major by origin then direction-table order.
    fn all_moves(&self, position: &Self::Position, side: Side) -> Vec<Self::Move>;

    /// Produces the successor position. `position` is left untouched.
    fn apply(&self, position: &Self::Position, mv: &Self::Move, side: Side) -> Self::Position;

    fn evaluate(&self, position: &Self::Position) -> Score;

    /// Score of a position that ends the game, regardless of search depth left.
    fn decided(&self, _position: &Self::Position) -> Option<Score> {
        None
    }

    /// Score when `side` is to move and has nothing to play.
    fn stalled(&self, position: &Self::Position, side: Side) -> Score;

    /// Higher keys are searched first. Only affects search cost.
    fn order_key(&self, _position: &Self::Position, _mv: &Self::Move) -> Score {
        0
    }

    fn outcome(&self, position: &Self::Position) -> Option<Outcome>;

    /// `apply` for moves coming from outside the engine: rejects anything
    /// `side` could not have generated.
    fn play(&self, position: &Self::Position, mv: &Self::Move, side: Side) -> Result<Self::Position> {
        self.check_position(position)?;
        if self.all_moves(position, side).contains(mv) {
            Ok(self.apply(position, mv, side))
        } else {
            Err(EngineError::IllegalMove(format!("{:?} for {:?} in {}", mv, side, Self::NAME)))
        }
    }
}
