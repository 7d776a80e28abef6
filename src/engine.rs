use std::fmt;
use std::str::FromStr;

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::{Score, Side};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::rules::{Rules, INFINITY};
use crate::search::Search;

/// How hard the machine tries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Usually plays like `Normal`, sometimes picks one of its weakest moves.
    Easy,
    /// Best move by static evaluation one ply ahead.
    #[default]
    Normal,
    /// Alpha-beta search below every candidate.
    Hard,
}

impl FromStr for Difficulty {
    type Err = EngineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(EngineError::UnknownDifficulty(s.to_string())),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        };
        f.write_str(label)
    }
}

/// Picks the machine's move for one game. Holds no position between calls.
pub struct Engine<R: Rules> {
    rules: R,
    config: EngineConfig,
}

impl<R: Rules> Engine<R> {
    pub fn new(rules: R, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { rules, config })
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Machine moves with their one-ply evaluation, weakest first. Equal
    /// scores keep enumeration order.
    pub fn rate_moves(&self, position: &R::Position) -> Result<Vec<(R::Move, Score)>> {
        self.rules.check_position(position)?;
        Ok(self.rated(position))
    }

    pub fn easy_move<G: Rng + ?Sized>(&self, position: &R::Position, rng: &mut G) -> Result<Option<R::Move>> {
        self.rules.check_position(position)?;
        Ok(self.easy(position, rng))
    }

    pub fn normal_move(&self, position: &R::Position) -> Result<Option<R::Move>> {
        self.rules.check_position(position)?;
        Ok(self.normal(position))
    }

    pub fn hard_move(&self, position: &R::Position) -> Result<Option<R::Move>> {
        self.rules.check_position(position)?;
        Ok(self.hard(position))
    }

    fn rated(&self, position: &R::Position) -> Vec<(R::Move, Score)> {
        let mut rated: Vec<(R::Move, Score)> = self
            .rules
            .all_moves(position, Side::Machine)
            .into_iter()
            .map(|mv| {
                let score = self.rules.evaluate(&self.rules.apply(position, &mv, Side::Machine));
                (mv, score)
            })
            .collect();
        rated.sort_by_key(|&(_, score)| score);
        rated
    }

    fn easy<G: Rng + ?Sized>(&self, position: &R::Position, rng: &mut G) -> Option<R::Move> {
        if !rng.gen_bool(self.config.blunder_rate) {
            debug!("{} easy: no blunder, playing normal", R::NAME);
            return self.normal(position);
        }
        let mut rated = self.rated(position);
        if rated.is_empty() {
            debug!("{} easy: depth 1, 0 nodes, 0 cutoffs, no move", R::NAME);
            return None;
        }
        let pick = rng.gen_range(0..self.config.blunder_pool.min(rated.len()));
        debug!(
            "{} easy: depth 1, {} nodes, 0 cutoffs, blunder pick {} of the weakest",
            R::NAME,
            rated.len(),
            pick
        );
        Some(rated.swap_remove(pick).0)
    }

    fn normal(&self, position: &R::Position) -> Option<R::Move> {
        let mut nodes = 0u64;
        let mut best: Option<(R::Move, Score)> = None;
        for mv in self.rules.all_moves(position, Side::Machine) {
            nodes += 1;
            let score = self.rules.evaluate(&self.rules.apply(position, &mv, Side::Machine));
            if best.as_ref().map_or(true, |&(_, best_score)| score > best_score) {
                best = Some((mv, score));
            }
        }
        debug!(
            "{} normal: depth 1, score {:?}, {} nodes, 0 cutoffs",
            R::NAME,
            best.as_ref().map(|&(_, score)| score),
            nodes
        );
        best.map(|(mv, _)| mv)
    }

    /// Searches below each candidate with the human to move. The best root
    /// score so far is passed down as alpha; a candidate that cannot beat it
    /// returns a bound no greater than it and is never chosen.
    fn hard(&self, position: &R::Position) -> Option<R::Move> {
        let depth = self.config.search_depth(R::SEARCH_DEPTH);
        let mut search = Search::new(&self.rules);
        let mut best: Option<R::Move> = None;
        let mut best_score = -INFINITY;
        // Candidates go in `order_key` order (victim value in chess and shogi,
        // not a plain capture flag), so among equal scores the capture of the
        // more valuable piece wins.
        for mv in search.ordered_moves(position, Side::Machine) {
            let child = self.rules.apply(position, &mv, Side::Machine);
            let score = search.alphabeta(&child, depth, best_score, INFINITY, false);
            if best.is_none() || score > best_score {
                best_score = score;
                best = Some(mv);
            }
        }
        debug!(
            "{} hard: depth {}, score {}, {} nodes, {} cutoffs",
            R::NAME,
            depth,
            best_score,
            search.nodes,
            search.cutoffs
        );
        best
    }

    /// `None` when the machine has no legal move; an error when the position
    /// does not fit the game.
    pub fn find_best_move<G: Rng + ?Sized>(
        &self,
        difficulty: Difficulty,
        position: &R::Position,
        rng: &mut G,
    ) -> Result<Option<R::Move>> {
        self.rules.check_position(position)?;
        Ok(match difficulty {
            Difficulty::Easy => self.easy(position, rng),
            Difficulty::Normal => self.normal(position),
            Difficulty::Hard => self.hard(position),
        })
    }
}
