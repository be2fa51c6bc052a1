//! Round-robin comparison of several bots
//!
//! Every unordered pair of roster entries plays one match. Each match builds
//! its own players, so no model state leaks between pairings.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::game::{run_match, MatchConfig, MatchResult};
use crate::player::BotKind;
use crate::random::SeededRng;

/// Totals for one bot across all of its matches
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub bot: BotKind,
    pub rounds_won: u64,
    pub rounds_lost: u64,
    pub rounds_tied: u64,
    pub matches_won: u32,
}

impl Standing {
    fn new(bot: BotKind) -> Self {
        Self { bot, rounds_won: 0, rounds_lost: 0, rounds_tied: 0, matches_won: 0 }
    }

    /// Add one match seen from this bot's side.
    fn record(&mut self, won: u32, lost: u32, tied: u32) {
        self.rounds_won += u64::from(won);
        self.rounds_lost += u64::from(lost);
        self.rounds_tied += u64::from(tied);
        if won > lost {
            self.matches_won += 1;
        }
    }

    /// Share of decided rounds won, in percent
    pub fn win_rate(&self) -> f64 {
        let decided = self.rounds_won + self.rounds_lost;
        if decided == 0 {
            0.0
        } else {
            self.rounds_won as f64 / decided as f64 * 100.0
        }
    }
}

/// One played pairing
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Pairing {
    pub index_1: u32,
    pub index_2: u32,
    pub result: MatchResult,
}

/// Outcome of a full round robin
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundRobin {
    pub pairings: Vec<Pairing>,
    /// In roster order
    pub standings: Vec<Standing>,
}

impl RoundRobin {
    /// Standings sorted by win rate, best first. Equal rates keep roster order.
    pub fn ranked(&self) -> Vec<&Standing> {
        let mut ranked: Vec<&Standing> = self.standings.iter().collect();
        ranked.sort_by(|a, b| b.win_rate().total_cmp(&a.win_rate()));
        ranked
    }
}

/// Number of matches in a round robin over `n` entries
pub fn match_count(n: u32) -> u32 {
    if n < 2 {
        0
    } else {
        n * (n - 1) / 2
    }
}

/// All pairs `(a, b)` with `a < b < n`, in colexicographic order
pub fn round_robin_pairs(n: u32) -> Vec<(u32, u32)> {
    (0..match_count(n)).map(unrank_pair).collect()
}

/// Play every pairing of `roster` once.
///
/// Each match gets its own seed derived from `config.seed` and the match
/// index, so a seeded round robin replays exactly.
pub fn run_round_robin(roster: &[BotKind], config: &MatchConfig) -> Result<RoundRobin> {
    config.validate()?;
    let n = u32::try_from(roster.len()).map_err(|_| Error::InvalidConfiguration {
        message: format!("roster of {} bots is too large", roster.len()),
    })?;
    if n < 2 {
        return Err(Error::InvalidConfiguration {
            message: "a round robin needs at least two bots".to_string(),
        });
    }

    let mut standings: Vec<Standing> = roster.iter().copied().map(Standing::new).collect();
    let mut pairings = Vec::with_capacity(match_count(n) as usize);

    for (match_index, (a, b)) in round_robin_pairs(n).into_iter().enumerate() {
        let seed = SeededRng::new(config.seed, match_index as u32).next_u64();
        let match_config = config.clone().with_seed(seed);
        let result = run_match(roster[a as usize], roster[b as usize], &match_config)?;

        let tally = result.tally;
        standings[a as usize].record(tally.p1, tally.p2, tally.tie);
        standings[b as usize].record(tally.p2, tally.p1, tally.tie);

        pairings.push(Pairing { index_1: a, index_2: b, result });
    }

    debug!(bots = n, matches = pairings.len(), "round robin finished");
    Ok(RoundRobin { pairings, standings })
}

/// Colexicographic combination unranking: rank → (a, b) with a < b.
///
/// rank = C(b,2) + a = b*(b−1)/2 + a
fn unrank_pair(rank: u32) -> (u32, u32) {
    // Estimate b via integer floor(sqrt(1 + 8·rank))
    let val = 1u64 + 8 * rank as u64;
    let mut s = val;
    let mut t = (s + 1) / 2;
    while t < s {
        s = t;
        t = (s + val / s) / 2;
    }
    let mut b = ((1 + s) / 2) as u32;

    while b > 0 && b * (b - 1) / 2 > rank {
        b -= 1;
    }
    while (b + 1) * b / 2 <= rank {
        b += 1;
    }

    let a = rank - b * (b - 1) / 2;
    (a, b)
}
