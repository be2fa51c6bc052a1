//! Player definitions and the built-in bot roster

use std::collections::VecDeque;
use std::fmt;
use std::io::{BufRead, Write};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::moves::{most_counted, Move};
use crate::predictor::AdaptivePredictor;
use crate::random::SeededRng;

/// Anything that can take part in a match.
///
/// Receives the opponent's previous move (`None` on the first round of a
/// match) and returns its own move for this round. A player that cannot
/// produce a move returns an error; the driver stops the match.
pub trait Player {
    fn next_move(&mut self, opponent_previous: Option<Move>) -> Result<Move>;
}

impl<P: Player + ?Sized> Player for Box<P> {
    fn next_move(&mut self, opponent_previous: Option<Move>) -> Result<Move> {
        (**self).next_move(opponent_previous)
    }
}

impl<P: Player + ?Sized> Player for &mut P {
    fn next_move(&mut self, opponent_previous: Option<Move>) -> Result<Move> {
        (**self).next_move(opponent_previous)
    }
}

impl Player for AdaptivePredictor {
    fn next_move(&mut self, opponent_previous: Option<Move>) -> Result<Move> {
        Ok(AdaptivePredictor::next_move(self, opponent_previous))
    }
}

/// Player backed by a closure, see [`from_fn`].
pub struct FnPlayer<F>(F);

/// Wrap a plain decision function as a [`Player`].
pub fn from_fn<F>(f: F) -> FnPlayer<F>
where
    F: FnMut(Option<Move>) -> Move,
{
    FnPlayer(f)
}

impl<F> Player for FnPlayer<F>
where
    F: FnMut(Option<Move>) -> Move,
{
    fn next_move(&mut self, opponent_previous: Option<Move>) -> Result<Move> {
        Ok((self.0)(opponent_previous))
    }
}

/// Always plays the same move.
#[derive(Clone, Copy, Debug)]
pub struct ConstantBot(pub Move);

impl Player for ConstantBot {
    fn next_move(&mut self, _: Option<Move>) -> Result<Move> {
        Ok(self.0)
    }
}

/// Steps through a fixed five-move cycle, starting one step in.
#[derive(Clone, Debug, Default)]
pub struct CycleBot {
    step: usize,
}

impl CycleBot {
    const CHOICES: [Move; 5] = [Move::Rock, Move::Rock, Move::Paper, Move::Paper, Move::Scissors];
}

impl Player for CycleBot {
    fn next_move(&mut self, opponent_previous: Option<Move>) -> Result<Move> {
        if opponent_previous.is_none() {
            self.step = 0;
        }
        self.step += 1;
        Ok(Self::CHOICES[self.step % Self::CHOICES.len()])
    }
}

/// Counters the opponent's most frequent move over its last ten inputs.
///
/// The missing move of round one is remembered as an entry of its own; while
/// it is the most common entry the bot assumes Scissors.
#[derive(Clone, Debug, Default)]
pub struct FrequencyCounterBot {
    seen: VecDeque<Option<Move>>,
}

impl FrequencyCounterBot {
    const WINDOW: usize = 10;
}

impl Player for FrequencyCounterBot {
    fn next_move(&mut self, opponent_previous: Option<Move>) -> Result<Move> {
        if opponent_previous.is_none() {
            self.seen.clear();
        }
        self.seen.push_back(opponent_previous);
        if self.seen.len() > Self::WINDOW {
            self.seen.pop_front();
        }

        let mut counts = [0usize; 3];
        let mut missing = 0usize;
        for entry in &self.seen {
            match entry {
                Some(m) => counts[m.index()] += 1,
                None => missing += 1,
            }
        }

        let leader = most_counted(&counts);
        let expected = if missing > counts[leader.index()] {
            Move::Scissors
        } else {
            leader
        };
        Ok(expected.counter())
    }
}

/// Plays the counter of the opponent's previous move (Paper on round one).
#[derive(Clone, Copy, Debug, Default)]
pub struct MirrorCounterBot;

impl Player for MirrorCounterBot {
    fn next_move(&mut self, opponent_previous: Option<Move>) -> Result<Move> {
        Ok(opponent_previous.unwrap_or(Move::Rock).counter())
    }
}

/// Counts the opponent's two-move transitions and counters the most likely
/// follow-up to its last move.
#[derive(Clone, Debug, Default)]
pub struct TableDrivenBot {
    last: Option<Move>,
    transitions: [[u32; 3]; 3],
}

impl Player for TableDrivenBot {
    fn next_move(&mut self, opponent_previous: Option<Move>) -> Result<Move> {
        if opponent_previous.is_none() {
            self.last = None;
            self.transitions = [[0; 3]; 3];
        }
        let current = opponent_previous.unwrap_or(Move::Rock);
        if let Some(previous) = self.last {
            self.transitions[previous.index()][current.index()] += 1;
        }
        self.last = Some(current);

        let expected = most_counted(&self.transitions[current.index()]);
        Ok(expected.counter())
    }
}

/// Uniformly random moves from a seeded generator.
#[derive(Clone, Debug)]
pub struct RandomBot {
    rng: SeededRng,
}

impl RandomBot {
    pub fn new(rng: SeededRng) -> Self {
        Self { rng }
    }
}

impl Player for RandomBot {
    fn next_move(&mut self, _: Option<Move>) -> Result<Move> {
        Ok(self.rng.next_move())
    }
}

/// Interactive player reading moves from a line-based input.
///
/// Re-prompts until a valid move is typed. End of input is an error.
pub struct HumanPlayer<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> HumanPlayer<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }
}

impl<R: BufRead, W: Write> Player for HumanPlayer<R, W> {
    fn next_move(&mut self, _: Option<Move>) -> Result<Move> {
        loop {
            write!(self.output, "[R]ock, [P]aper, [S]cissors? ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(Error::InputClosed);
            }
            match line.parse::<Move>() {
                Ok(m) => return Ok(m),
                Err(e) => {
                    debug!(input = line.trim(), "rejected move");
                    writeln!(self.output, "{}", e)?;
                }
            }
        }
    }
}

/// Selectable bot types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BotKind {
    /// Fixed five-move cycle.
    Cycle,
    /// Counters the opponent's most frequent recent move.
    FrequencyCounter,
    /// Counters the opponent's last move.
    MirrorCounter,
    /// Two-move transition table.
    TableDriven,
    /// Pattern-table predictor without behaviour detectors.
    Markov,
    /// Full adaptive predictor.
    Adaptive,
    /// Uniformly random.
    Random,
    /// Always the same move.
    Always(Move),
}

impl BotKind {
    /// The bots offered to a player picking an opponent.
    pub const ROSTER: [BotKind; 7] = [
        BotKind::Cycle,
        BotKind::FrequencyCounter,
        BotKind::MirrorCounter,
        BotKind::TableDriven,
        BotKind::Markov,
        BotKind::Adaptive,
        BotKind::Random,
    ];

    /// Build a fresh player. `seed` and `stream` only matter for [`BotKind::Random`].
    pub fn build(self, seed: u64, stream: u32) -> Box<dyn Player + Send> {
        match self {
            BotKind::Cycle => Box::new(CycleBot::default()),
            BotKind::FrequencyCounter => Box::new(FrequencyCounterBot::default()),
            BotKind::MirrorCounter => Box::new(MirrorCounterBot),
            BotKind::TableDriven => Box::new(TableDrivenBot::default()),
            BotKind::Markov => Box::new(AdaptivePredictor::statistical_only()),
            BotKind::Adaptive => Box::new(AdaptivePredictor::new()),
            BotKind::Random => Box::new(RandomBot::new(SeededRng::new(seed, stream))),
            BotKind::Always(m) => Box::new(ConstantBot(m)),
        }
    }

    /// Stable identifier, accepted by [`BotKind::from_str`].
    pub fn id(self) -> &'static str {
        match self {
            BotKind::Cycle => "cycle",
            BotKind::FrequencyCounter => "frequency",
            BotKind::MirrorCounter => "mirror",
            BotKind::TableDriven => "table",
            BotKind::Markov => "markov",
            BotKind::Adaptive => "adaptive",
            BotKind::Random => "random",
            BotKind::Always(Move::Rock) => "rock",
            BotKind::Always(Move::Paper) => "paper",
            BotKind::Always(Move::Scissors) => "scissors",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            BotKind::Cycle => "Repeats Rock, Paper, Paper, Scissors, Rock.",
            BotKind::FrequencyCounter => "Counters your most frequent move of the last ten.",
            BotKind::MirrorCounter => "Counters your previous move.",
            BotKind::TableDriven => "Learns which move you play after each move.",
            BotKind::Markov => "Predicts you from the longest confident move pattern.",
            BotKind::Adaptive => "Spots known bot behaviours, then falls back to move patterns.",
            BotKind::Random => "Picks uniformly at random.",
            BotKind::Always(Move::Rock) => "Always plays Rock.",
            BotKind::Always(Move::Paper) => "Always plays Paper.",
            BotKind::Always(Move::Scissors) => "Always plays Scissors.",
        }
    }
}

impl fmt::Display for BotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for BotKind {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        BotKind::ROSTER
            .into_iter()
            .chain(Move::ALL.into_iter().map(BotKind::Always))
            .find(|bot| bot.id() == wanted)
            .ok_or_else(|| Error::UnknownBot { name: s.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use Move::*;

    fn run<P: Player>(player: &mut P, inputs: &[Option<Move>]) -> Vec<Move> {
        inputs.iter().map(|m| player.next_move(*m).unwrap()).collect()
    }

    #[test]
    fn test_cycle_bot_sequence() {
        let mut bot = CycleBot::default();
        let moves = run(&mut bot, &[None, Some(Rock), Some(Rock), Some(Rock), Some(Rock), Some(Rock)]);
        assert_eq!(moves, vec![Rock, Paper, Paper, Scissors, Rock, Rock]);
    }

    #[test]
    fn test_cycle_bot_restarts_on_new_match() {
        let mut bot = CycleBot::default();
        let first = run(&mut bot, &[None, Some(Rock), Some(Rock)]);
        let second = run(&mut bot, &[None, Some(Rock), Some(Rock)]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_frequency_counter_first_round() {
        let mut bot = FrequencyCounterBot::default();
        // Only the missing move seen so far: assume Scissors, answer Rock.
        assert_eq!(bot.next_move(None).unwrap(), Rock);
    }

    #[test]
    fn test_frequency_counter_tracks_most_common() {
        let mut bot = FrequencyCounterBot::default();
        let moves = run(&mut bot, &[None, Some(Paper), Some(Paper), Some(Rock)]);
        assert_eq!(moves[3], Scissors);
    }

    #[test]
    fn test_frequency_counter_window() {
        let mut bot = FrequencyCounterBot::default();
        let mut inputs = vec![None];
        inputs.extend(std::iter::repeat(Some(Rock)).take(6));
        inputs.extend(std::iter::repeat(Some(Scissors)).take(7));
        let moves = run(&mut bot, &inputs);
        // Last ten inputs: three Rock, seven Scissors
        assert_eq!(*moves.last().unwrap(), Rock);
    }

    #[test]
    fn test_frequency_counter_keeps_only_window() {
        let mut bot = FrequencyCounterBot::default();
        let mut inputs = vec![None];
        inputs.extend(std::iter::repeat(Some(Paper)).take(50));
        run(&mut bot, &inputs);
        assert_eq!(bot.seen.len(), FrequencyCounterBot::WINDOW);
        assert!(bot.seen.iter().all(|m| *m == Some(Paper)));
    }

    #[test]
    fn test_mirror_counter_bot() {
        let mut bot = MirrorCounterBot;
        assert_eq!(bot.next_move(None).unwrap(), Paper);
        assert_eq!(bot.next_move(Some(Paper)).unwrap(), Scissors);
        assert_eq!(bot.next_move(Some(Scissors)).unwrap(), Rock);
    }

    #[test]
    fn test_table_driven_bot() {
        let mut bot = TableDrivenBot::default();
        // No transitions yet: ties resolve to Rock, answer Paper
        assert_eq!(bot.next_move(None).unwrap(), Paper);
        // Opponent alternates Rock and Scissors
        let moves = run(&mut bot, &[Some(Scissors), Some(Rock), Some(Scissors), Some(Rock)]);
        // After Rock the opponent has always played Scissors
        assert_eq!(*moves.last().unwrap(), Rock);
    }

    #[test]
    fn test_random_bot_is_seeded() {
        let mut a = RandomBot::new(SeededRng::new(9, 1));
        let mut b = RandomBot::new(SeededRng::new(9, 1));
        let inputs = vec![Some(Rock); 50];
        assert_eq!(run(&mut a, &inputs), run(&mut b, &inputs));
    }

    #[test]
    fn test_from_fn_player() {
        let mut calls = 0;
        let mut player = from_fn(|_| {
            calls += 1;
            Scissors
        });
        assert_eq!(player.next_move(None).unwrap(), Scissors);
        assert_eq!(player.next_move(Some(Rock)).unwrap(), Scissors);
        drop(player);
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_human_player_reprompts() {
        let input = Cursor::new("banana\n  Rock \n");
        let mut human = HumanPlayer::new(input, Vec::new());
        assert_eq!(human.next_move(None).unwrap(), Rock);

        let (_, output) = human.into_inner();
        let output = String::from_utf8(output).unwrap();
        assert_eq!(output.matches("[R]ock").count(), 2);
        assert!(output.contains("invalid move"));
    }

    #[test]
    fn test_human_player_input_closed() {
        let mut human = HumanPlayer::new(Cursor::new("x\n"), Vec::new());
        assert!(matches!(human.next_move(None), Err(Error::InputClosed)));
    }

    #[test]
    fn test_bot_kind_parse() {
        for bot in BotKind::ROSTER {
            assert_eq!(bot.id().parse::<BotKind>().unwrap(), bot);
        }
        assert_eq!("Rock".parse::<BotKind>().unwrap(), BotKind::Always(Rock));
        assert!(matches!("grandmaster".parse::<BotKind>(), Err(Error::UnknownBot { .. })));
    }

    #[test]
    fn test_bot_kind_serde() {
        let json = serde_json::to_string(&BotKind::Always(Paper)).unwrap();
        assert_eq!(json, r#"{"Always":"Paper"}"#);
        let bot: BotKind = serde_json::from_str(r#""Adaptive""#).unwrap();
        assert_eq!(bot, BotKind::Adaptive);
    }

    #[test]
    fn test_every_bot_builds_and_plays() {
        for bot in BotKind::ROSTER {
            let mut player = bot.build(1, 0);
            let mut previous = None;
            for _ in 0..30 {
                let m = player.next_move(previous).unwrap();
                previous = Some(m.counter());
            }
        }
    }
}
