//! Seeded deterministic random number generator.
//!
//! Every replica in a lockstep session seeds this generator with the same
//! `(start_time, serial)` pair and must draw from it in the same order, so
//! the whole stream — spawn placement, zombie wandering, loot, per-tick
//! command-pass direction — replays identically everywhere. The state is
//! serializable so the determinism blob covers it.
//!
//! The recurrence: both seed inputs are split into 18 decimal digits that
//! initialize 18 accumulator lanes. Each draw derives a modular-exponentiation
//! mix (5^e mod 1_000_000_007) from the oldest lane, shifts the lanes by one,
//! folds the mix into the newest lane, and returns the low 31 bits of the
//! lane that was shifted out. A 1,024-draw warm-up decorrelates the stream
//! from the raw seed digits.

use serde::{Deserialize, Serialize};

/// Number of accumulator lanes — one per decimal digit of the seed inputs.
pub const LANES: usize = 18;

const WARMUP_DRAWS: usize = 1024;
const MIX_MODULUS: u64 = 1_000_000_007;
const MIX_BASE: u64 = 5;
const LANE_FOLD: u64 = 6_364_136_223_846_793_005;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRng {
    lanes: [u64; LANES],
}

impl GameRng {
    /// Seed from the shared session pair and run the warm-up.
    pub fn new(start_time: u64, serial: u64) -> Self {
        let mut lanes = [0u64; LANES];
        let mut t = start_time;
        let mut s = serial;
        for (i, lane) in lanes.iter_mut().enumerate() {
            let digit_t = t % 10;
            let digit_s = s % 10;
            t /= 10;
            s /= 10;
            *lane = (digit_t * 10 + digit_s) * (i as u64 + 3) + 1;
        }
        let mut rng = Self { lanes };
        for _ in 0..WARMUP_DRAWS {
            rng.next();
        }
        rng
    }

    /// Next draw in the stream.
    pub fn next(&mut self) -> u32 {
        let oldest = self.lanes[0];
        let mixed = mod_pow(MIX_BASE, oldest % (MIX_MODULUS - 1) + 1, MIX_MODULUS);
        self.lanes.rotate_left(1);
        self.lanes[LANES - 1] = oldest.wrapping_mul(LANE_FOLD).wrapping_add(mixed);
        (oldest & 0x7fff_ffff) as u32
    }

    /// Uniform draw in `0..bound`. `bound` must be non-zero.
    pub fn below(&mut self, bound: u32) -> u32 {
        debug_assert!(bound > 0);
        self.next() % bound
    }

    /// True with probability `num/den`.
    pub fn chance(&mut self, num: u32, den: u32) -> bool {
        self.below(den) < num
    }

    /// Fair coin flip.
    pub fn coin_flip(&mut self) -> bool {
        self.next() & 1 == 1
    }
}

fn mod_pow(base: u64, mut exp: u64, modulus: u64) -> u64 {
    let mut acc: u64 = 1;
    let mut base = base % modulus;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = (acc as u128 * base as u128 % modulus as u128) as u64;
        }
        base = (base as u128 * base as u128 % modulus as u128) as u64;
        exp >>= 1;
    }
    acc
}
