//! Adversarial search for three small board games: an 8x8 chess-like game,
//! Reversi and 5x5 reduced shogi.
//!
//! Each game implements [`rules::Rules`]; [`search`] and [`engine`] work over
//! any implementation. Scores are positive when they favour the machine.

pub mod board;
pub mod chess;
pub mod config;
pub mod engine;
pub mod error;
pub mod protocol;
pub mod reversi;
pub mod rules;
pub mod search;
pub mod shogi;

pub use engine::{Difficulty, Engine};
pub use error::{EngineError, Result};
pub use rules::{Outcome, Rules};
