//! Depth-bounded minimax with alpha-beta pruning over any [`Rules`].
//!
//! The machine is always the maximizing side. Every child is a fresh position
//! produced by [`Rules::apply`], so the walk has no shared mutable state.

use std::cmp::Reverse;

use crate::board::{Score, Side};
use crate::rules::{Rules, INFINITY};

fn side_to_move(maximizing: bool) -> Side {
    if maximizing {
        Side::Machine
    } else {
        Side::Human
    }
}

/// A single search, counting the nodes it visits.
#[derive(Debug)]
pub struct Search<'a, R: Rules> {
    rules: &'a R,
    pub nodes: u64,
    pub cutoffs: u64,
}

impl<'a, R: Rules> Search<'a, R> {
    pub fn new(rules: &'a R) -> Self {
        Self { rules, nodes: 0, cutoffs: 0 }
    }

    /// `side`'s moves, most promising first. The sort is stable, so equal keys
    /// keep enumeration order.
    pub fn ordered_moves(&self, position: &R::Position, side: Side) -> Vec<R::Move> {
        let mut moves = self.rules.all_moves(position, side);
        moves.sort_by_cached_key(|mv| Reverse(self.rules.order_key(position, mv)));
        moves
    }

    pub fn alphabeta(
        &mut self,
        position: &R::Position,
        depth: u32,
        mut alpha: Score,
        mut beta: Score,
        maximizing: bool,
    ) -> Score {
        self.nodes += 1;
        if depth == 0 {
            return self.rules.evaluate(position);
        }
        if let Some(score) = self.rules.decided(position) {
            return score;
        }

        let side = side_to_move(maximizing);
        let moves = self.ordered_moves(position, side);
        if moves.is_empty() {
            return self.rules.stalled(position, side);
        }

        if maximizing {
            let mut best = -INFINITY;
            for mv in &moves {
                let child = self.rules.apply(position, mv, side);
                let score = self.alphabeta(&child, depth - 1, alpha, beta, false);
                best = best.max(score);
                alpha = alpha.max(score);
                if beta <= alpha {
                    self.cutoffs += 1;
                    break;
                }
            }
            best
        } else {
            let mut best = INFINITY;
            for mv in &moves {
                let child = self.rules.apply(position, mv, side);
                let score = self.alphabeta(&child, depth - 1, alpha, beta, true);
                best = best.min(score);
                beta = beta.min(score);
                if beta <= alpha {
                    self.cutoffs += 1;
                    break;
                }
            }
            best
        }
    }
}

pub fn alphabeta<R: Rules>(
    rules: &R,
    position: &R::Position,
    depth: u32,
    alpha: Score,
    beta: Score,
    maximizing: bool,
) -> Score {
    Search::new(rules).alphabeta(position, depth, alpha, beta, maximizing)
}

/// Exhaustive minimax with the same terminal handling as [`alphabeta`] and no pruning.
pub fn minimax<R: Rules>(rules: &R, position: &R::Position, depth: u32, maximizing: bool) -> Score {
    if depth == 0 {
        return rules.evaluate(position);
    }
    if let Some(score) = rules.decided(position) {
        return score;
    }
    let side = side_to_move(maximizing);
    let moves = rules.all_moves(position, side);
    if moves.is_empty() {
        return rules.stalled(position, side);
    }
    let scores = moves
        .iter()
        .map(|mv| minimax(rules, &rules.apply(position, mv, side), depth - 1, !maximizing));
    if maximizing {
        scores.max().unwrap_or(-INFINITY)
    } else {
        scores.min().unwrap_or(INFINITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Coord, Grid};
    use crate::chess::{self, ChessRules};
    use crate::reversi::ReversiRules;
    use crate::shogi::{self, ShogiRules};

    fn skirmish() -> chess::Board {
        use chess::{Kind, Piece};
        let mut board = Grid::empty(chess::SIZE);
        board.place(Coord::new(0, 4), Piece::new(Kind::King, Side::Machine));
        board.place(Coord::new(7, 4), Piece::new(Kind::King, Side::Human));
        board.place(Coord::new(2, 2), Piece::new(Kind::Knight, Side::Machine));
        board.place(Coord::new(3, 5), Piece::new(Kind::Bishop, Side::Machine));
        board.place(Coord::new(4, 3), Piece::new(Kind::Rook, Side::Human));
        board.place(Coord::new(5, 6), Piece::new(Kind::Pawn, Side::Human));
        board.place(Coord::new(1, 0), Piece::new(Kind::Pawn, Side::Machine));
        board
    }

    #[test]
    fn test_alphabeta_matches_minimax_chess() {
        let rules = ChessRules;
        let board = skirmish();
        for depth in 1..=3 {
            for maximizing in [true, false] {
                assert_eq!(
                    alphabeta(&rules, &board, depth, -INFINITY, INFINITY, maximizing),
                    minimax(&rules, &board, depth, maximizing),
                    "depth {} maximizing {}",
                    depth,
                    maximizing
                );
            }
        }
    }

    #[test]
    fn test_alphabeta_matches_minimax_reversi() {
        let rules = ReversiRules;
        let board = rules.initial_position();
        for depth in 1..=4 {
            assert_eq!(
                alphabeta(&rules, &board, depth, -INFINITY, INFINITY, false),
                minimax(&rules, &board, depth, false)
            );
        }
    }

    #[test]
    fn test_alphabeta_matches_minimax_shogi_with_hands() {
        let rules = ShogiRules;
        let mut position = rules.initial_position();
        position.board.take(Coord::new(4, 0));
        position.hands.machine.push(shogi::Kind::Silver);
        for depth in 1..=2 {
            assert_eq!(
                alphabeta(&rules, &position, depth, -INFINITY, INFINITY, true),
                minimax(&rules, &position, depth, true)
            );
        }
    }

    #[test]
    fn test_pruning_visits_fewer_nodes() {
        let rules = ReversiRules;
        let board = rules.initial_position();
        let mut search = Search::new(&rules);
        search.alphabeta(&board, 4, -INFINITY, INFINITY, false);
        assert!(search.cutoffs > 0);

        fn count(rules: &ReversiRules, board: &crate::reversi::Board, depth: u32, side: Side) -> u64 {
            if depth == 0 {
                return 1;
            }
            let moves = rules.all_moves(board, side);
            1 + moves
                .iter()
                .map(|mv| count(rules, &rules.apply(board, mv, side), depth - 1, side.opponent()))
                .sum::<u64>()
        }
        assert!(search.nodes < count(&rules, &board, 4, Side::Human));
    }

    #[test]
    fn test_depth_zero_is_static_evaluation() {
        let rules = ChessRules;
        let board = skirmish();
        assert_eq!(alphabeta(&rules, &board, 0, -INFINITY, INFINITY, true), rules.evaluate(&board));
    }

    #[test]
    fn test_king_capture_is_found() {
        use chess::{Kind, Piece};
        let rules = ChessRules;
        let mut board = Grid::empty(chess::SIZE);
        board.place(Coord::new(0, 0), Piece::new(Kind::King, Side::Machine));
        board.place(Coord::new(7, 7), Piece::new(Kind::King, Side::Human));
        board.place(Coord::new(0, 7), Piece::new(Kind::Rook, Side::Machine));
        // machine to move takes the king on the open file
        assert_eq!(alphabeta(&rules, &board, 2, -INFINITY, INFINITY, true), chess::MATE);
    }

    #[test]
    fn test_stalled_side_loses_in_shogi() {
        let rules = ShogiRules;
        let position = rules.initial_position();
        assert_eq!(rules.stalled(&position, Side::Human), shogi::MATE);
        assert_eq!(rules.stalled(&position, Side::Machine), -shogi::MATE);
    }

    #[test]
    fn test_ordering_puts_captures_first() {
        let rules = ChessRules;
        let board = skirmish();
        let search = Search::new(&rules);
        let moves = search.ordered_moves(&board, Side::Machine);
        // knight takes rook
        assert_eq!(moves[0], chess::Move::new(Coord::new(2, 2), Coord::new(4, 3)));
        assert_eq!(moves.len(), rules.all_moves(&board, Side::Machine).len());
    }
}
