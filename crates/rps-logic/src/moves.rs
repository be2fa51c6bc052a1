//! Move definitions and the fixed beats relation

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A move in Rock-Paper-Scissors
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Move {
    Rock,
    Paper,
    Scissors,
}

impl Move {
    /// All moves in tie-break preference order.
    pub const ALL: [Move; 3] = [Move::Rock, Move::Paper, Move::Scissors];

    /// The unique move that defeats this one.
    pub fn counter(self) -> Move {
        match self {
            Move::Rock => Move::Paper,
            Move::Paper => Move::Scissors,
            Move::Scissors => Move::Rock,
        }
    }

    /// True if `self` beats `other`.
    pub fn beats(self, other: Move) -> bool {
        matches!(
            (self, other),
            (Move::Paper, Move::Rock) | (Move::Rock, Move::Scissors) | (Move::Scissors, Move::Paper)
        )
    }

    /// Single-letter code: `R`, `P` or `S`.
    pub fn code(self) -> char {
        match self {
            Move::Rock => 'R',
            Move::Paper => 'P',
            Move::Scissors => 'S',
        }
    }

    /// Parse a single-letter code (case-insensitive).
    pub fn from_code(code: char) -> Result<Move, Error> {
        match code.to_ascii_uppercase() {
            'R' => Ok(Move::Rock),
            'P' => Ok(Move::Paper),
            'S' => Ok(Move::Scissors),
            _ => Err(Error::InvalidMove { value: code.to_string() }),
        }
    }

    /// Position in [`Move::ALL`], used to index per-move counters.
    pub(crate) fn index(self) -> usize {
        match self {
            Move::Rock => 0,
            Move::Paper => 1,
            Move::Scissors => 2,
        }
    }

    /// Most frequent move in `moves`; ties go to the earlier entry of [`Move::ALL`].
    pub fn most_frequent(moves: &[Move]) -> Move {
        let mut counts = [0usize; 3];
        for m in moves {
            counts[m.index()] += 1;
        }
        most_counted(&counts)
    }
}

/// Pick the move with the largest count, preferring Rock, then Paper, then Scissors.
pub(crate) fn most_counted<T: PartialOrd + Copy>(counts: &[T; 3]) -> Move {
    let mut best = Move::Rock;
    for m in Move::ALL {
        if counts[m.index()] > counts[best.index()] {
            best = m;
        }
    }
    best
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::Rock => "Rock",
            Move::Paper => "Paper",
            Move::Scissors => "Scissors",
        };
        f.write_str(name)
    }
}

impl FromStr for Move {
    type Err = Error;

    /// Accepts `r`/`rock`, `p`/`paper`, `s`/`scissor`/`scissors`, ignoring case
    /// and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "r" | "rock" => Ok(Move::Rock),
            "p" | "paper" => Ok(Move::Paper),
            "s" | "scissor" | "scissors" => Ok(Move::Scissors),
            _ => Err(Error::InvalidMove { value: s.trim().to_string() }),
        }
    }
}
