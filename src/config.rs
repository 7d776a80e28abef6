//! Tuning knobs shared by every game.

use clap::Args;

use crate::error::{EngineError, Result};

#[derive(Args, Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Search depth in plies for the hard tier, overriding each game's default
    #[arg(long)]
    pub depth: Option<u32>,

    /// Search one ply shallower (never below one) for slow callers
    #[arg(long)]
    pub constrained: bool,

    /// Probability that the easy tier deliberately picks a weak move
    #[arg(long, default_value_t = 0.3)]
    pub blunder_rate: f64,

    /// How many of the weakest moves the easy tier chooses among
    #[arg(long, default_value_t = 3)]
    pub blunder_pool: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            depth: None,
            constrained: false,
            blunder_rate: 0.3,
            blunder_pool: 3,
        }
    }
}

impl EngineConfig {
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Effective depth given a game's default.
    pub fn search_depth(&self, default: u32) -> u32 {
        let depth = self.depth.unwrap_or(default);
        if self.constrained {
            depth.saturating_sub(1).max(1)
        } else {
            depth.max(1)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.blunder_rate) {
            return Err(EngineError::InvalidMessage(format!(
                "blunder rate {} is not a probability",
                self.blunder_rate
            )));
        }
        if self.blunder_pool == 0 {
            return Err(EngineError::InvalidMessage("blunder pool must hold at least one move".to_string()));
        }
        if self.depth == Some(0) {
            return Err(EngineError::InvalidMessage("search depth must be at least 1".to_string()));
        }
        Ok(())
    }
}
