//! Adaptive opponent-modelling bot
//!
//! The predictor keeps both move histories for the current match and a
//! table of continuation counts keyed by recent move patterns. Each round it
//! runs a fixed list of detectors for known opponent behaviours and, when none
//! of them fire, falls back to the most confident pattern in the table.
//! Whatever it expects the opponent to play, it answers with the counter.
//!
//! A predictor must see `None` as its first input of every match; that call
//! wipes all learned state. Reusing an instance without it carries the
//! previous match's model into the new one.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::moves::{most_counted, Move};

/// Move returned on the reset call that opens a match.
pub const OPENING_MOVE: Move = Move::Rock;

/// Longest opponent-only pattern recorded and looked up.
pub const MAX_PATTERN_LEN: usize = 5;

/// Longest own-move window used for joint patterns.
pub const MAX_JOINT_LEN: usize = 2;

/// Cycle played by the fixed-cycle opponent.
const FIXED_CYCLE: [Move; 5] = [Move::Rock, Move::Paper, Move::Paper, Move::Scissors, Move::Rock];

/// How far back the fixed-cycle detector compares.
const CYCLE_WINDOW: usize = 20;
const CYCLE_MIN_MATCHES: usize = 15;

/// Rounds sampled by the mirror-counter and self-pattern checks.
const LOOKBACK: usize = 5;
const MIRROR_MIN_MATCHES: usize = 4;

/// Window for the frequency-counter detector.
const FREQUENCY_WINDOW: usize = 10;
const FREQUENCY_MIN_COUNT: usize = 5;

const SELF_PATTERN_MIN_HISTORY: usize = 10;
const SELF_PATTERN_MIN_SAMPLES: u32 = 5;
const SELF_PATTERN_MIN_HITS: usize = 3;

/// Opponent history needed before the recent-frequency fallback applies.
const RECENT_MIN_HISTORY: usize = 3;

/// Key into the [`PatternTable`]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PatternKey {
    /// Opponent moves immediately preceding the recorded move.
    Opponent(Vec<Move>),
    /// Own recent moves paired with the opponent moves that preceded the
    /// recorded move by the same offset.
    Joint { own: Vec<Move>, opponent: Vec<Move> },
}

/// Occurrence counts of each next move under one pattern key
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Frequency {
    counts: [u32; 3],
}

impl Frequency {
    pub fn record(&mut self, next: Move) {
        self.counts[next.index()] += 1;
    }

    pub fn count(&self, m: Move) -> u32 {
        self.counts[m.index()]
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// Most frequent continuation, ties broken Rock, Paper, Scissors.
    pub fn most_likely(&self) -> Move {
        most_counted(&self.counts)
    }

    /// Most frequent continuation with its empirical probability, or `None`
    /// if nothing has been recorded.
    pub fn confidence(&self) -> Option<(Move, f64)> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let best = self.most_likely();
        Some((best, self.count(best) as f64 / total as f64))
    }
}

/// Lazily populated map from pattern key to continuation counts
#[derive(Clone, Debug, Default)]
pub struct PatternTable {
    records: HashMap<PatternKey, Frequency>,
}

impl PatternTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count `next` under `key`, creating a zeroed record on first sight.
    pub fn record(&mut self, key: PatternKey, next: Move) {
        self.records.entry(key).or_default().record(next);
    }

    pub fn get(&self, key: &PatternKey) -> Option<&Frequency> {
        self.records.get(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

/// Which rule produced a prediction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Detector {
    /// Opponent follows the fixed five-move cycle.
    FixedCycle,
    /// Opponent keeps countering our previous move.
    MirrorCounter,
    /// Opponent keeps countering our most frequent move.
    FrequencyCounter,
    /// Opponent predicts us from what we played after our last move.
    SelfPattern,
    /// Highest-confidence pattern from the table.
    PatternTable,
    /// Opponent's most frequent recent move.
    RecentFrequency,
    /// Nothing known yet.
    Default,
}

/// The opponent move the predictor expects next
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Prediction {
    pub expected: Move,
    pub detector: Detector,
    /// Set only for [`Detector::PatternTable`] predictions.
    pub confidence: Option<f64>,
}

impl Prediction {
    fn new(detector: Detector, expected: Move) -> Self {
        Self { expected, detector, confidence: None }
    }

    /// The move that beats the expected one.
    pub fn reply(&self) -> Move {
        self.expected.counter()
    }
}

/// Adaptive opponent-modelling player
#[derive(Clone, Debug)]
pub struct AdaptivePredictor {
    opponent_history: Vec<Move>,
    own_history: Vec<Move>,
    patterns: PatternTable,
    detectors: bool,
}

impl Default for AdaptivePredictor {
    fn default() -> Self {
        Self::new()
    }
}

impl AdaptivePredictor {
    /// Full predictor: behaviour detectors in front of the pattern table.
    pub fn new() -> Self {
        Self {
            opponent_history: Vec::new(),
            own_history: Vec::new(),
            patterns: PatternTable::new(),
            detectors: true,
        }
    }

    /// Pattern table and recent-frequency fallback only.
    pub fn statistical_only() -> Self {
        Self { detectors: false, ..Self::new() }
    }

    /// Play one round.
    ///
    /// `None` starts a new match: all state is cleared and [`OPENING_MOVE`]
    /// is returned without being recorded.
    pub fn next_move(&mut self, opponent_previous: Option<Move>) -> Move {
        let Some(opponent_move) = opponent_previous else {
            self.reset();
            return OPENING_MOVE;
        };

        self.observe(opponent_move);
        let prediction = self.predict();
        trace!(
            detector = ?prediction.detector,
            expected = %prediction.expected,
            round = self.opponent_history.len() + 1,
            "prediction"
        );

        let reply = prediction.reply();
        self.own_history.push(reply);
        reply
    }

    /// Forget everything learned in the current match.
    pub fn reset(&mut self) {
        debug!(
            rounds = self.opponent_history.len(),
            patterns = self.patterns.len(),
            "resetting predictor"
        );
        self.opponent_history.clear();
        self.own_history.clear();
        self.patterns.clear();
    }

    pub fn opponent_history(&self) -> &[Move] {
        &self.opponent_history
    }

    pub fn own_history(&self) -> &[Move] {
        &self.own_history
    }

    pub fn patterns(&self) -> &PatternTable {
        &self.patterns
    }

    /// Append the opponent's move and count it under every pattern that
    /// preceded it.
    fn observe(&mut self, opponent_move: Move) {
        self.opponent_history.push(opponent_move);
        let opp = &self.opponent_history;
        let own = &self.own_history;
        let newest = opp.len() - 1;

        for length in 1..=MAX_PATTERN_LEN.min(newest) {
            let key = PatternKey::Opponent(opp[newest - length..newest].to_vec());
            self.patterns.record(key, opponent_move);
        }

        for length in 1..=MAX_JOINT_LEN.min(own.len()) {
            if newest < length {
                continue;
            }
            let key = PatternKey::Joint {
                own: own[own.len() - length..].to_vec(),
                opponent: opp[newest - length..newest].to_vec(),
            };
            self.patterns.record(key, opponent_move);
        }
    }

    /// Expected next opponent move given the current state.
    pub fn predict(&self) -> Prediction {
        if self.detectors {
            let detected = self
                .fixed_cycle()
                .map(|m| Prediction::new(Detector::FixedCycle, m))
                .or_else(|| self.mirror_counter().map(|m| Prediction::new(Detector::MirrorCounter, m)))
                .or_else(|| self.frequency_counter().map(|m| Prediction::new(Detector::FrequencyCounter, m)))
                .or_else(|| self.self_pattern().map(|m| Prediction::new(Detector::SelfPattern, m)));
            if let Some(prediction) = detected {
                return prediction;
            }
        }
        self.statistical()
    }

    fn fixed_cycle(&self) -> Option<Move> {
        let opp = &self.opponent_history;
        let len = opp.len();
        if len < FIXED_CYCLE.len() {
            return None;
        }

        let window = len.min(CYCLE_WINDOW);
        let matches = (len - window..len)
            .filter(|&k| opp[k] == FIXED_CYCLE[k % FIXED_CYCLE.len()])
            .count();
        if matches >= CYCLE_MIN_MATCHES.min(len - 2) {
            Some(FIXED_CYCLE[len % FIXED_CYCLE.len()])
        } else {
            None
        }
    }

    fn mirror_counter(&self) -> Option<Move> {
        let own = &self.own_history;
        let n = own.len();
        if n < LOOKBACK {
            return None;
        }

        // Round i back, did they counter what we played the round before?
        let matches = (1..n.min(LOOKBACK + 1))
            .filter(|&i| back(&self.opponent_history, i) == Some(own[n - i - 1].counter()))
            .count();
        if matches >= MIRROR_MIN_MATCHES {
            Some(own[n - 1].counter())
        } else {
            None
        }
    }

    fn frequency_counter(&self) -> Option<Move> {
        let own = &self.own_history;
        let opp = &self.opponent_history;
        if own.len() < FREQUENCY_WINDOW || opp.len() < FREQUENCY_WINDOW {
            return None;
        }

        let ours = Move::most_frequent(&own[own.len() - FREQUENCY_WINDOW..]);
        let expected = ours.counter();
        let recent = &opp[opp.len() - FREQUENCY_WINDOW..];
        let count = recent.iter().filter(|m| **m == expected).count();
        if Move::most_frequent(recent) == expected && count >= FREQUENCY_MIN_COUNT {
            Some(ours)
        } else {
            None
        }
    }

    fn self_pattern(&self) -> Option<Move> {
        let own = &self.own_history;
        let n = own.len();
        if n < SELF_PATTERN_MIN_HISTORY {
            return None;
        }

        let follows = follow_counts(own, n, own[n - 1]);
        if follows.iter().sum::<u32>() < SELF_PATTERN_MIN_SAMPLES {
            return None;
        }

        // Would this model have called the opponent's recent moves?
        let mut hits = 0;
        for i in 1..n.min(LOOKBACK + 1) {
            if n <= i + 1 {
                continue;
            }
            let earlier = follow_counts(own, n - i, own[n - i - 1]);
            if earlier.iter().sum::<u32>() == 0 {
                continue;
            }
            let would_play = most_counted(&earlier).counter();
            if back(&self.opponent_history, i) == Some(would_play) {
                hits += 1;
            }
        }

        if hits >= SELF_PATTERN_MIN_HITS {
            Some(most_counted(&follows).counter())
        } else {
            None
        }
    }

    /// Longest-first scan of the pattern table; strictly higher confidence
    /// replaces, so equal confidence keeps the longer pattern.
    fn statistical(&self) -> Prediction {
        let opp = &self.opponent_history;
        let len = opp.len();

        let mut best: Option<(Move, f64)> = None;
        for length in (1..=MAX_PATTERN_LEN.min(len)).rev() {
            let key = PatternKey::Opponent(opp[len - length..].to_vec());
            let Some((expected, confidence)) = self.patterns.get(&key).and_then(Frequency::confidence) else {
                continue;
            };
            if best.map_or(true, |(_, c)| confidence > c) {
                best = Some((expected, confidence));
            }
        }

        if let Some((expected, confidence)) = best {
            return Prediction {
                expected,
                detector: Detector::PatternTable,
                confidence: Some(confidence),
            };
        }
        if len >= RECENT_MIN_HISTORY {
            let recent = &opp[len.saturating_sub(LOOKBACK)..];
            return Prediction::new(Detector::RecentFrequency, Move::most_frequent(recent));
        }
        Prediction::new(Detector::Default, Move::Rock)
    }
}

/// The move `i` places from the end (1 = last), if history reaches that far.
fn back(history: &[Move], i: usize) -> Option<Move> {
    if i == 0 || i > history.len() {
        return None;
    }
    Some(history[history.len() - i])
}

/// Count what we played right after each occurrence of `after` within
/// `history[..upto]`, skipping the opening pair.
fn follow_counts(history: &[Move], upto: usize, after: Move) -> [u32; 3] {
    let mut counts = [0u32; 3];
    for j in 2..upto.min(history.len()) {
        if history[j - 1] == after {
            counts[history[j].index()] += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use Move::*;

    fn with_history(own: &[Move], opponent: &[Move]) -> AdaptivePredictor {
        AdaptivePredictor {
            own_history: own.to_vec(),
            opponent_history: opponent.to_vec(),
            ..AdaptivePredictor::new()
        }
    }

    fn moves(codes: &str) -> Vec<Move> {
        codes.chars().map(|c| Move::from_code(c).unwrap()).collect()
    }

    fn detector_for(own: &str, opponent: &str) -> Detector {
        with_history(&moves(own), &moves(opponent)).predict().detector
    }

    fn feed(predictor: &mut AdaptivePredictor, moves: &[Move]) -> Vec<Move> {
        let mut replies = vec![predictor.next_move(None)];
        for m in moves {
            replies.push(predictor.next_move(Some(*m)));
        }
        replies
    }

    #[test]
    fn test_reset_returns_rock_and_clears_state() {
        let mut p = AdaptivePredictor::new();
        feed(&mut p, &[Paper, Scissors, Rock, Rock]);
        assert!(!p.patterns().is_empty());

        assert_eq!(p.next_move(None), OPENING_MOVE);
        assert!(p.opponent_history().is_empty());
        assert!(p.own_history().is_empty());
        assert!(p.patterns().is_empty());
    }

    #[test]
    fn test_opening_move_is_not_recorded() {
        let mut p = AdaptivePredictor::new();
        p.next_move(None);
        p.next_move(Some(Scissors));
        assert_eq!(p.own_history().len(), 1);
        assert_eq!(p.opponent_history(), &[Scissors]);
    }

    #[test]
    fn test_observe_records_opponent_patterns() {
        let mut p = AdaptivePredictor::new();
        feed(&mut p, &[Rock, Paper, Scissors]);

        let rp = PatternKey::Opponent(vec![Rock, Paper]);
        let p_only = PatternKey::Opponent(vec![Paper]);
        assert_eq!(p.patterns().get(&rp).unwrap().count(Scissors), 1);
        assert_eq!(p.patterns().get(&p_only).unwrap().count(Scissors), 1);
        assert_eq!(p.patterns().get(&p_only).unwrap().total(), 1);
        // The newest move is never part of a key
        assert!(p.patterns().get(&PatternKey::Opponent(vec![Scissors])).is_none());
    }

    #[test]
    fn test_observe_records_joint_patterns() {
        let mut p = AdaptivePredictor::new();
        feed(&mut p, &[Rock, Paper]);
        // After the second opponent move we had played one reply.
        let own = p.own_history()[0];
        let key = PatternKey::Joint { own: vec![own], opponent: vec![Rock] };
        assert_eq!(p.patterns().get(&key).unwrap().count(Paper), 1);
    }

    #[test]
    fn test_pattern_lengths_are_capped() {
        let mut p = AdaptivePredictor::new();
        feed(&mut p, &[Rock; 12]);
        assert!(p.patterns().get(&PatternKey::Opponent(vec![Rock; 5])).is_some());
        assert!(p.patterns().get(&PatternKey::Opponent(vec![Rock; 6])).is_none());
        let joint3 = PatternKey::Joint { own: vec![Paper; 3], opponent: vec![Rock; 3] };
        assert!(p.patterns().get(&joint3).is_none());
    }

    #[test]
    fn test_default_then_recent_frequency() {
        let p = with_history(&[], &[Scissors]);
        assert_eq!(p.predict().detector, Detector::Default);
        assert_eq!(p.predict().expected, Rock);

        let p = with_history(&[Paper, Paper], &[Scissors, Scissors, Paper]);
        let prediction = p.predict();
        assert_eq!(prediction.detector, Detector::RecentFrequency);
        assert_eq!(prediction.expected, Scissors);
    }

    #[test]
    fn test_always_rock_converges_to_paper() {
        let mut p = AdaptivePredictor::new();
        let replies = feed(&mut p, &[Rock; 30]);
        assert!(replies[6..].iter().all(|m| *m == Paper));
    }

    #[test]
    fn test_fixed_cycle_detector() {
        let cycle: Vec<Move> = FIXED_CYCLE.iter().copied().cycle().take(20).collect();
        let mut p = AdaptivePredictor::new();
        p.next_move(None);
        for (i, m) in cycle.iter().enumerate() {
            let reply = p.next_move(Some(*m));
            if i + 1 >= 5 {
                let next = FIXED_CYCLE[(i + 1) % 5];
                assert_eq!(reply, next.counter(), "round {}", i + 2);
            }
        }
        assert_eq!(p.predict().detector, Detector::FixedCycle);
    }

    #[test]
    fn test_mirror_counter_detector() {
        // Each opponent move counters our move from the round before.
        let own = [Rock, Paper, Scissors, Paper, Rock, Scissors];
        let opponent: Vec<Move> = [Scissors, Rock]
            .into_iter()
            .chain(own[..own.len() - 1].iter().map(|m| m.counter()))
            .collect();
        let p = with_history(&own, &opponent);
        let prediction = p.predict();
        assert_eq!(prediction.detector, Detector::MirrorCounter);
        assert_eq!(prediction.expected, Scissors.counter());
        assert_eq!(prediction.reply(), Scissors.counter().counter());
    }

    #[test]
    fn test_frequency_counter_detector() {
        let own = [Rock, Rock, Paper, Rock, Scissors, Rock, Rock, Paper, Rock, Rock];
        let opponent = [Scissors, Paper, Paper, Paper, Rock, Paper, Paper, Scissors, Paper, Paper, Scissors];
        let p = with_history(&own, &opponent);
        let prediction = p.predict();
        assert_eq!(prediction.detector, Detector::FrequencyCounter);
        assert_eq!(prediction.expected, Rock);
        assert_eq!(prediction.reply(), Paper);
    }

    #[test]
    fn test_self_pattern_detector() {
        // We alternate Rock, Paper; the opponent plays the counter of what
        // we usually play after our previous move.
        let own: Vec<Move> = [Rock, Paper].into_iter().cycle().take(12).collect();
        let opponent = [
            Scissors, Scissors, Scissors, Scissors, Scissors, Paper, Scissors,
            Paper, Scissors, Paper, Scissors, Paper, Scissors,
        ];
        let p = with_history(&own, &opponent);
        let prediction = p.predict();
        assert_eq!(prediction.detector, Detector::SelfPattern);
        // Our last move is Paper, which we always followed with Rock.
        assert_eq!(prediction.expected, Rock.counter());
        assert_eq!(prediction.reply(), Scissors);
    }

    #[test]
    fn test_fixed_cycle_needs_fifteen_of_last_twenty() {
        // Twenty cycle moves with five broken, then with six broken
        assert_eq!(detector_for(&"R".repeat(19), "RRPSSRPRSRSPPPRRPPSR"), Detector::FixedCycle);
        assert_eq!(detector_for(&"R".repeat(19), "RRPSSRPRSRSPPPRRRPSR"), Detector::RecentFrequency);
    }

    #[test]
    fn test_fixed_cycle_ignores_moves_outside_window() {
        // The first five moves follow the cycle, the last twenty match only 14 times
        assert_eq!(
            detector_for(&"R".repeat(24), "RPPSRRRPSSRPRSRSPPPRRRPSR"),
            Detector::RecentFrequency
        );
    }

    #[test]
    fn test_fixed_cycle_threshold_on_short_history() {
        // Seven moves need five matches
        assert_eq!(detector_for("RRRRRR", "RRPPRRP"), Detector::FixedCycle);
        assert_eq!(detector_for("RRRRRR", "RRPPRSP"), Detector::RecentFrequency);
    }

    #[test]
    fn test_mirror_counter_needs_four_of_five() {
        assert_eq!(detector_for("SPRPPR", "PPRSPSR"), Detector::MirrorCounter);
        assert_eq!(detector_for("SPRPPR", "PPRSPRR"), Detector::RecentFrequency);
    }

    #[test]
    fn test_frequency_counter_needs_five_counters() {
        // Our most frequent move is Paper; Scissors shows up five times, then four
        assert_eq!(detector_for("SPRPPPPSPS", "SPSRSSRPSSR"), Detector::FrequencyCounter);
        assert_eq!(detector_for("SPRPPPPSPS", "SPSRSSRPSPR"), Detector::RecentFrequency);
    }

    #[test]
    fn test_self_pattern_needs_three_hits() {
        assert_eq!(detector_for("RPRRSSSRRPRR", "PRRSSSRPRRPRP"), Detector::SelfPattern);
        assert_eq!(detector_for("RPRRSSSRRPRR", "PRRSSSRPRRPRR"), Detector::RecentFrequency);
    }

    #[test]
    fn test_self_pattern_needs_five_samples() {
        // Changing our third move drops the follow-up samples from five to four
        assert_eq!(detector_for("RPRRSSSRRPRR", "PRRSSSRPRRPRP"), Detector::SelfPattern);
        assert_eq!(detector_for("RPPRSSSRRPRR", "PRRSSSRPRRPRP"), Detector::RecentFrequency);
    }

    #[test]
    fn test_recent_frequency_needs_three_moves() {
        assert_eq!(detector_for("P", "SS"), Detector::Default);
        assert_eq!(detector_for("PP", "SSR"), Detector::RecentFrequency);
    }

    #[test]
    fn test_fallback_prefers_longer_pattern_on_equal_confidence() {
        let mut p = AdaptivePredictor::statistical_only();
        feed(&mut p, &[Rock, Paper, Rock, Paper, Rock]);
        // Every table entry after "...R" says Paper with confidence 1.0
        let prediction = p.predict();
        assert_eq!(prediction.detector, Detector::PatternTable);
        assert_eq!(prediction.expected, Paper);
        assert_eq!(prediction.confidence, Some(1.0));
    }

    #[test]
    fn test_statistical_only_skips_detectors() {
        let cycle: Vec<Move> = FIXED_CYCLE.iter().copied().cycle().take(10).collect();
        let mut p = AdaptivePredictor::statistical_only();
        feed(&mut p, &cycle);
        assert_ne!(p.predict().detector, Detector::FixedCycle);
    }

    #[test]
    fn test_frequency_confidence() {
        let mut f = Frequency::default();
        assert_eq!(f.confidence(), None);
        f.record(Paper);
        f.record(Paper);
        f.record(Scissors);
        f.record(Rock);
        let (m, c) = f.confidence().unwrap();
        assert_eq!(m, Paper);
        assert!((c - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_back_is_bounded() {
        assert_eq!(back(&[], 1), None);
        assert_eq!(back(&[Rock, Paper], 0), None);
        assert_eq!(back(&[Rock, Paper], 1), Some(Paper));
        assert_eq!(back(&[Rock, Paper], 3), None);
    }
}
