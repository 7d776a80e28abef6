//! JSON messages exchanged with the presentation layer.
//!
//! Every request is an object with exactly one command key:
//!
//! ```text
//! {"start": "reversi"}
//! {"legal_moves": {"game": "chess", "position": {...}, "side": "human", "from": [6, 4]}}
//! {"apply": {"game": "shogi", "position": {...}, "side": "human", "move": {...}}}
//! {"best_move": {"game": "chess", "position": {...}, "difficulty": "hard", "depth": 2}}
//! ```
//!
//! Requests carry the whole position, so nothing is kept between them.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::board::{Coord, Grid, Side};
use crate::chess::{self, ChessRules};
use crate::config::EngineConfig;
use crate::engine::{Difficulty, Engine};
use crate::error::{EngineError, Result};
use crate::reversi::{self, ReversiRules};
use crate::rules::Rules;
use crate::shogi::{self, ShogiRules};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Chess,
    Reversi,
    Shogi,
}

fn human() -> Side {
    Side::Human
}

/// Body shared by every command that works on a caller-supplied position.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub game: GameKind,
    pub position: Value,
    #[serde(default = "human")]
    pub side: Side,
    #[serde(default)]
    pub from: Option<Coord>,
    #[serde(default, rename = "move")]
    pub mv: Option<Value>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub depth: Option<u32>,
}

#[derive(Debug, Clone)]
pub enum Command {
    Start(GameKind),
    LegalMoves(Request),
    Apply(Request),
    BestMove(Request),
}

impl Command {
    pub fn parse(data: Value) -> Result<Self> {
        let Value::Object(mut map) = data else {
            return Err(EngineError::InvalidMessage("expected an object".to_string()));
        };
        if map.len() != 1 {
            return Err(EngineError::InvalidMessage(format!("expected one command key, found {}", map.len())));
        }
        if let Some(game) = map.remove("start") {
            return Ok(Command::Start(serde_json::from_value(game)?));
        }
        let request = |map: &mut Map<String, Value>, key: &str| -> Option<Result<Request>> {
            map.remove(key).map(|body| serde_json::from_value(body).map_err(EngineError::from))
        };
        if let Some(body) = request(&mut map, "legal_moves") {
            Ok(Command::LegalMoves(body?))
        } else if let Some(body) = request(&mut map, "apply") {
            Ok(Command::Apply(body?))
        } else if let Some(body) = request(&mut map, "best_move") {
            Ok(Command::BestMove(body?))
        } else {
            let key = map.keys().next().cloned().unwrap_or_default();
            Err(EngineError::InvalidMessage(format!("unknown command: {}", key)))
        }
    }

    pub fn game(&self) -> GameKind {
        match self {
            Command::Start(game) => *game,
            Command::LegalMoves(req) | Command::Apply(req) | Command::BestMove(req) => req.game,
        }
    }
}

/// Position encoding for one game.
pub trait Wire: Rules {
    fn decode(&self, value: Value) -> Result<Self::Position>;
    fn encode(&self, position: &Self::Position) -> Value;
}

#[derive(Deserialize)]
struct BoardOnly<T> {
    board: Grid<T>,
}

impl Wire for ChessRules {
    fn decode(&self, value: Value) -> Result<chess::Board> {
        let BoardOnly { board } = serde_json::from_value(value)?;
        board.expect_size(chess::SIZE)
    }

    fn encode(&self, board: &chess::Board) -> Value {
        json!({ "board": board })
    }
}

impl Wire for ReversiRules {
    fn decode(&self, value: Value) -> Result<reversi::Board> {
        let BoardOnly { board } = serde_json::from_value(value)?;
        board.expect_size(reversi::SIZE)
    }

    fn encode(&self, board: &reversi::Board) -> Value {
        json!({ "board": board })
    }
}

impl Wire for ShogiRules {
    fn decode(&self, value: Value) -> Result<shogi::Position> {
        let shogi::Position { board, hands } = serde_json::from_value(value)?;
        Ok(shogi::Position { board: board.expect_size(shogi::SIZE)?, hands })
    }

    fn encode(&self, position: &shogi::Position) -> Value {
        json!({ "board": position.board, "hands": position.hands })
    }
}

/// Answers one command.
pub fn respond<G: Rng + ?Sized>(command: Command, config: &EngineConfig, rng: &mut G) -> Result<Value> {
    match command.game() {
        GameKind::Chess => run(ChessRules, command, config, rng),
        GameKind::Reversi => run(ReversiRules, command, config, rng),
        GameKind::Shogi => run(ShogiRules, command, config, rng),
    }
}

fn run<R: Wire, G: Rng + ?Sized>(rules: R, command: Command, config: &EngineConfig, rng: &mut G) -> Result<Value> {
    match command {
        Command::Start(_) => Ok(start(&rules)),
        Command::LegalMoves(req) => legal_moves(&rules, req),
        Command::Apply(req) => apply(&rules, req),
        Command::BestMove(req) => best_move(rules, req, config, rng),
    }
}

fn start<R: Wire>(rules: &R) -> Value {
    let position = rules.initial_position();
    json!({
        "game": R::NAME,
        "position": rules.encode(&position),
        "legal_moves": rules.all_moves(&position, Side::Human),
    })
}

fn legal_moves<R: Wire>(rules: &R, req: Request) -> Result<Value> {
    let position = rules.decode(req.position)?;
    let moves = match req.from {
        Some(from) => rules.moves_from(&position, from, req.side)?,
        None => rules.all_moves(&position, req.side),
    };
    Ok(json!({ "legal_moves": moves }))
}

fn apply<R: Wire>(rules: &R, req: Request) -> Result<Value> {
    let position = rules.decode(req.position)?;
    let body = req.mv.ok_or_else(|| EngineError::InvalidMessage("missing field: move".to_string()))?;
    let mv: R::Move = serde_json::from_value(body)?;
    let next = rules.play(&position, &mv, req.side)?;
    Ok(json!({
        "position": rules.encode(&next),
        "outcome": rules.outcome(&next),
        "legal_moves": rules.all_moves(&next, req.side.opponent()),
    }))
}

fn best_move<R: Wire, G: Rng + ?Sized>(rules: R, req: Request, config: &EngineConfig, rng: &mut G) -> Result<Value> {
    let position = rules.decode(req.position)?;
    let difficulty = match req.difficulty.as_deref() {
        Some(label) => label.parse::<Difficulty>()?,
        None => Difficulty::default(),
    };
    let mut config = config.clone();
    if let Some(depth) = req.depth {
        config = config.with_depth(depth);
    }
    let engine = Engine::new(rules, config)?;
    let mv = engine.find_best_move(difficulty, &position, rng)?;
    Ok(json!({ "move": mv }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn answer(data: Value) -> Result<Value> {
        let mut rng = SmallRng::seed_from_u64(3);
        respond(Command::parse(data)?, &EngineConfig::default(), &mut rng)
    }

    #[test]
    fn test_start_each_game() {
        let chess = answer(json!({ "start": "chess" })).unwrap();
        assert_eq!(chess["game"], "chess");
        assert_eq!(chess["legal_moves"].as_array().unwrap().len(), 20);

        let reversi = answer(json!({ "start": "reversi" })).unwrap();
        assert_eq!(reversi["position"]["board"][3][3], "white");
        assert_eq!(reversi["legal_moves"][0], json!({ "position": [2, 3] }));

        let shogi = answer(json!({ "start": "shogi" })).unwrap();
        assert_eq!(shogi["position"]["board"][0][2], json!({ "type": "K", "owner": "machine" }));
        assert_eq!(shogi["position"]["hands"], json!({ "machine": [], "human": [] }));
    }

    #[test]
    fn test_apply_reversi_opening() {
        let start = answer(json!({ "start": "reversi" })).unwrap();
        let reply = answer(json!({
            "apply": { "game": "reversi", "position": start["position"], "move": { "position": [2, 3] } }
        }))
        .unwrap();
        assert_eq!(reply["position"]["board"][2][3], "black");
        assert_eq!(reply["position"]["board"][3][3], "black");
        assert_eq!(reply["outcome"], Value::Null);
        assert!(!reply["legal_moves"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_apply_rejects_illegal_move() {
        let start = answer(json!({ "start": "shogi" })).unwrap();
        let err = answer(json!({
            "apply": {
                "game": "shogi",
                "position": start["position"],
                "move": { "type": "move", "from": [4, 0], "to": [2, 0] }
            }
        }))
        .unwrap_err();
        assert!(matches!(err, EngineError::IllegalMove(_)));
    }

    #[test]
    fn test_legal_moves_from_square() {
        let start = answer(json!({ "start": "shogi" })).unwrap();
        let reply = answer(json!({
            "legal_moves": { "game": "shogi", "position": start["position"], "from": [4, 0] }
        }))
        .unwrap();
        let moves = reply["legal_moves"].as_array().unwrap();
        assert!(moves.contains(&json!({ "type": "move", "from": [4, 0], "to": [3, 0] })));
        assert!(moves.iter().all(|m| m["from"] == json!([4, 0])));
    }

    #[test]
    fn test_best_move_accepts_kanji_pieces() {
        let position = json!({
            "board": [
                [null, null, { "type": "王", "owner": "ai" }, null, null],
                [null, null, null, null, null],
                [null, null, { "type": "金", "owner": "player" }, null, null],
                [null, null, null, null, null],
                [null, null, { "type": "王", "owner": "player" }, null, null]
            ],
            "hands": { "ai": ["銀"], "player": [] }
        });
        let reply = answer(json!({
            "best_move": { "game": "shogi", "position": position, "difficulty": "hard", "depth": 2 }
        }))
        .unwrap();
        assert!(reply["move"].is_object());
    }

    #[test]
    fn test_best_move_null_without_moves() {
        let mut rows = vec![vec![Value::Null; 8]; 8];
        rows[7][4] = json!({ "type": "K", "owner": "human" });
        let reply = answer(json!({
            "best_move": { "game": "chess", "position": { "board": rows } }
        }))
        .unwrap();
        assert_eq!(reply["move"], Value::Null);
    }

    #[test]
    fn test_rejects_malformed_requests() {
        assert!(matches!(answer(json!([1, 2])), Err(EngineError::InvalidMessage(_))));
        assert!(matches!(answer(json!({ "resign": true })), Err(EngineError::InvalidMessage(_))));
        assert!(matches!(answer(json!({ "start": "go" })), Err(EngineError::Json(_))));

        let start = answer(json!({ "start": "chess" })).unwrap();
        let err = answer(json!({
            "best_move": { "game": "chess", "position": start["position"], "difficulty": "brutal" }
        }))
        .unwrap_err();
        assert!(matches!(err, EngineError::UnknownDifficulty(_)));

        let empty = vec![vec![Value::Null; 8]; 8];
        let err = answer(json!({
            "best_move": { "game": "shogi", "position": { "board": empty } }
        }))
        .unwrap_err();
        assert!(matches!(err, EngineError::BoardSize { .. }));

        let err = answer(json!({
            "legal_moves": { "game": "chess", "position": start["position"], "from": [8, 0] }
        }))
        .unwrap_err();
        assert!(matches!(err, EngineError::OutOfBounds { .. }));

        let err = answer(json!({
            "best_move": { "game": "chess", "position": start["position"], "depth": 0 }
        }))
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidMessage(_)));
    }
}
