//! Seeded pseudo-random number generator
//!
//! Deterministic PRNG so that matches involving the random bot replay
//! identically for the same seed. xorshift64* underneath.

use crate::moves::Move;

/// Seeded random number generator
///
/// Deterministic: same seed + stream = same sequence
#[derive(Clone, Debug)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    /// Create a new RNG from a seed and a stream index (e.g. player slot)
    pub fn new(seed: u64, stream: u32) -> Self {
        let mut state = seed ^ (stream as u64).wrapping_mul(0x517cc1b727220a95);
        // xorshift has a fixed point at zero
        if state == 0 {
            state = 0x9e3779b97f4a7c15;
        }

        let mut rng = Self { state };
        for _ in 0..8 {
            rng.next_u64();
        }
        rng
    }

    /// Generate next u64
    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state >> 12;
        self.state ^= self.state << 25;
        self.state ^= self.state >> 27;
        self.state.wrapping_mul(0x2545f4914f6cdd1d)
    }

    /// Generate next u32
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Generate a value in range [0, max)
    pub fn next_range(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        self.next_u32() % max
    }

    /// Uniformly pick one of the three moves
    pub fn next_move(&mut self) -> Move {
        Move::ALL[self.next_range(3) as usize]
    }
}
