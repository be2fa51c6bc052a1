//! WASM bindings for frontend match replay

#![cfg(feature = "wasm")]

use wasm_bindgen::prelude::*;

use crate::{run_match, run_round_robin, winner_of, BotKind, MatchConfig, Move};

/// Parse a bot selection.
///
/// Accepts the short id (`"adaptive"`, `"rock"`) or the serialized
/// `BotKind` JSON (`"Adaptive"`, `{"Always": "Rock"}`).
fn parse_bot(selection: &str) -> Result<BotKind, String> {
    if let Ok(bot) = selection.parse::<BotKind>() {
        return Ok(bot);
    }
    serde_json::from_str::<BotKind>(selection).map_err(|e| format!("Invalid bot: {}", e))
}

/// Replay a match with full round-by-round details
///
/// # Arguments
/// * `bot_1` - bot id or JSON for participant 1
/// * `bot_2` - bot id or JSON for participant 2
/// * `rounds` - number of rounds to play
/// * `seed` - seed for bots that use randomness
///
/// # Returns
/// JSON serialized MatchResult
#[wasm_bindgen]
pub fn replay_match(bot_1: &str, bot_2: &str, rounds: u32, seed: u64) -> Result<JsValue, JsError> {
    let bot_1 = parse_bot(bot_1).map_err(|e| JsError::new(&format!("Invalid bot 1: {}", e)))?;
    let bot_2 = parse_bot(bot_2).map_err(|e| JsError::new(&format!("Invalid bot 2: {}", e)))?;

    let config = MatchConfig::new(rounds).recorded().with_seed(seed);
    let result = run_match(bot_1, bot_2, &config).map_err(|e| JsError::new(&e.to_string()))?;

    serde_wasm_bindgen::to_value(&result).map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// Cumulative win percentages per round, for the win-rate chart
#[wasm_bindgen]
pub fn get_win_rate_series(bot_1: &str, bot_2: &str, rounds: u32, seed: u64) -> Result<JsValue, JsError> {
    let bot_1 = parse_bot(bot_1).map_err(|e| JsError::new(&format!("Invalid bot 1: {}", e)))?;
    let bot_2 = parse_bot(bot_2).map_err(|e| JsError::new(&format!("Invalid bot 2: {}", e)))?;

    let config = MatchConfig::new(rounds).recorded().with_seed(seed);
    let result = run_match(bot_1, bot_2, &config).map_err(|e| JsError::new(&e.to_string()))?;

    serde_wasm_bindgen::to_value(&result.win_rate_series())
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// Judge a single round from two move strings (`"R"`, `"rock"`, ...).
///
/// Returns `"p1"`, `"p2"` or `"tie"`.
#[wasm_bindgen]
pub fn judge_round(move_1: &str, move_2: &str) -> Result<String, JsError> {
    let move_1: Move = move_1.parse().map_err(|e: crate::Error| JsError::new(&e.to_string()))?;
    let move_2: Move = move_2.parse().map_err(|e: crate::Error| JsError::new(&e.to_string()))?;

    serde_json::to_value(winner_of(move_1, move_2))
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .ok_or_else(|| JsError::new("Serialization error"))
}

#[derive(serde::Serialize)]
struct BotInfo {
    id: &'static str,
    description: &'static str,
}

/// Get all selectable bots
#[wasm_bindgen]
pub fn get_bot_types() -> Result<JsValue, JsError> {
    let bots: Vec<BotInfo> = BotKind::ROSTER
        .into_iter()
        .map(|bot| BotInfo { id: bot.id(), description: bot.description() })
        .collect();

    serde_wasm_bindgen::to_value(&bots).map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// Round robin over a JSON array of bot ids; returns the ranked standings.
#[wasm_bindgen]
pub fn compare_bots(roster_json: &str, rounds: u32, seed: u64) -> Result<JsValue, JsError> {
    let ids: Vec<String> =
        serde_json::from_str(roster_json).map_err(|e| JsError::new(&format!("Invalid roster: {}", e)))?;
    let roster = ids
        .iter()
        .map(|id| parse_bot(id))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| JsError::new(&e))?;

    let config = MatchConfig::new(rounds).with_seed(seed);
    let outcome = run_round_robin(&roster, &config).map_err(|e| JsError::new(&e.to_string()))?;

    serde_wasm_bindgen::to_value(&outcome.ranked())
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}
