//! Match execution engine

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::moves::Move;
use crate::player::{BotKind, Player};
use crate::winner_of;

/// Upper bound on the round log reserved before a recorded match starts.
const PREALLOCATED_ROUNDS: u32 = 1024;

/// Who took a round
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "p1")]
    Player1,
    #[serde(rename = "p2")]
    Player2,
    #[serde(rename = "tie")]
    Tie,
}

/// Rounds won by each side plus ties
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub p1: u32,
    pub p2: u32,
    pub tie: u32,
}

impl Tally {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Player1 => self.p1 += 1,
            Outcome::Player2 => self.p2 += 1,
            Outcome::Tie => self.tie += 1,
        }
    }

    pub fn rounds(&self) -> u32 {
        self.p1 + self.p2 + self.tie
    }

    /// Player 1's share of decided rounds, in percent. Zero if every round tied.
    pub fn win_rate(&self) -> f64 {
        let decided = self.p1 + self.p2;
        if decided == 0 {
            0.0
        } else {
            self.p1 as f64 / decided as f64 * 100.0
        }
    }
}

/// Result of a single round
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    /// 1-indexed round number
    pub round: u32,
    pub move_1: Move,
    pub move_2: Move,
    pub outcome: Outcome,
    pub cumulative: Tally,
}

/// Result of a complete match
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Empty unless rounds were recorded.
    pub rounds: Vec<RoundResult>,
    pub tally: Tally,
    pub round_count: u32,
}

/// Cumulative win percentages after a given round
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WinRatePoint {
    pub round: u32,
    pub p1: f64,
    pub p2: f64,
}

impl MatchResult {
    pub fn outcomes(&self) -> impl Iterator<Item = Outcome> + '_ {
        self.rounds.iter().map(|r| r.outcome)
    }

    /// Each side's wins as a percentage of all rounds played so far, one
    /// point per recorded round.
    pub fn win_rate_series(&self) -> Vec<WinRatePoint> {
        self.rounds
            .iter()
            .map(|r| {
                let played = r.round as f64;
                WinRatePoint {
                    round: r.round,
                    p1: 100.0 * r.cumulative.p1 as f64 / played,
                    p2: 100.0 * r.cumulative.p2 as f64 / played,
                }
            })
            .collect()
    }
}

/// Match parameters supplied by whoever runs the match
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    pub rounds: u32,
    /// Keep the round-by-round log in the result.
    #[serde(default)]
    pub record_rounds: bool,
    /// Seed for bots that use randomness.
    #[serde(default)]
    pub seed: u64,
}

impl MatchConfig {
    pub fn new(rounds: u32) -> Self {
        Self { rounds, record_rounds: false, seed: 0 }
    }

    /// Short recorded match, the default for bot-vs-bot comparisons
    pub fn quick() -> Self {
        Self { rounds: 50, record_rounds: true, seed: 0 }
    }

    /// Long match for measuring a bot against the classic opponents
    pub fn benchmark() -> Self {
        Self { rounds: 1000, record_rounds: false, seed: 0 }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn recorded(mut self) -> Self {
        self.record_rounds = true;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.rounds == 0 {
            return Err(Error::InvalidConfiguration {
                message: "a match needs at least one round".to_string(),
            });
        }
        Ok(())
    }
}

/// Play `rounds` rounds and return the tally.
///
/// Round one passes `None` to both players; afterwards each sees the other's
/// previous move. The first player error ends the match.
pub fn play<A, B>(player_1: &mut A, player_2: &mut B, rounds: u32) -> Result<Tally>
where
    A: Player + ?Sized,
    B: Player + ?Sized,
{
    drive(player_1, player_2, rounds, false).map(|result| result.tally)
}

/// Play a match according to `config`.
pub fn play_match<A, B>(player_1: &mut A, player_2: &mut B, config: &MatchConfig) -> Result<MatchResult>
where
    A: Player + ?Sized,
    B: Player + ?Sized,
{
    config.validate()?;
    drive(player_1, player_2, config.rounds, config.record_rounds)
}

/// Build both bots fresh and play them against each other.
pub fn run_match(bot_1: BotKind, bot_2: BotKind, config: &MatchConfig) -> Result<MatchResult> {
    let mut player_1 = bot_1.build(config.seed, 0);
    let mut player_2 = bot_2.build(config.seed, 1);
    let result = play_match(&mut player_1, &mut player_2, config)?;
    debug!(
        %bot_1,
        %bot_2,
        p1 = result.tally.p1,
        p2 = result.tally.p2,
        tie = result.tally.tie,
        "match finished"
    );
    Ok(result)
}

fn drive<A, B>(player_1: &mut A, player_2: &mut B, rounds: u32, record: bool) -> Result<MatchResult>
where
    A: Player + ?Sized,
    B: Player + ?Sized,
{
    let mut log = Vec::with_capacity(if record { rounds.min(PREALLOCATED_ROUNDS) as usize } else { 0 });
    let mut tally = Tally::default();
    let mut previous_1: Option<Move> = None;
    let mut previous_2: Option<Move> = None;

    for round in 1..=rounds {
        let move_1 = player_1.next_move(previous_2)?;
        let move_2 = player_2.next_move(previous_1)?;

        let outcome = winner_of(move_1, move_2);
        tally.record(outcome);

        if record {
            log.push(RoundResult { round, move_1, move_2, outcome, cumulative: tally });
        }

        previous_1 = Some(move_1);
        previous_2 = Some(move_2);
    }

    Ok(MatchResult { rounds: log, tally, round_count: rounds })
}
