//! Match Logic for Rock-Paper-Scissors
//!
//! Core game logic for bot-vs-bot and human-vs-bot Rock-Paper-Scissors.
//! This crate is compiled to:
//! - Native (for terminal and desktop front ends)
//! - WASM (for browser match replay)

mod error;
mod game;
mod moves;
mod pairing;
mod player;
mod predictor;
mod random;

#[cfg(feature = "wasm")]
mod wasm;

pub use error::{Error, Result};
pub use game::{play, play_match, run_match, MatchConfig, MatchResult, Outcome, RoundResult, Tally, WinRatePoint};
pub use moves::Move;
pub use pairing::{match_count, round_robin_pairs, run_round_robin, Pairing, RoundRobin, Standing};
pub use player::{
    from_fn, BotKind, ConstantBot, CycleBot, FnPlayer, FrequencyCounterBot, HumanPlayer, MirrorCounterBot, Player,
    RandomBot, TableDrivenBot,
};
pub use predictor::{
    AdaptivePredictor, Detector, Frequency, PatternKey, PatternTable, Prediction, MAX_JOINT_LEN, MAX_PATTERN_LEN,
    OPENING_MOVE,
};
pub use random::SeededRng;

/// Outcome of one round given participant 1's and participant 2's moves
pub fn winner_of(a: Move, b: Move) -> Outcome {
    match (a, b) {
        (Move::Paper, Move::Rock) | (Move::Rock, Move::Scissors) | (Move::Scissors, Move::Paper) => Outcome::Player1,
        (Move::Rock, Move::Paper) | (Move::Scissors, Move::Rock) | (Move::Paper, Move::Scissors) => Outcome::Player2,
        (Move::Rock, Move::Rock) | (Move::Paper, Move::Paper) | (Move::Scissors, Move::Scissors) => Outcome::Tie,
    }
}
