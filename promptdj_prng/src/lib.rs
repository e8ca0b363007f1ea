// Call-scoped, portable pseudo-random number generator.
//
// Implements xoshiro256++ (Blackman & Vigna, 2019) with SplitMix64 seeding.
// Every generation or transformation call in `promptdj_music` constructs its
// own `SeqRng` and threads it explicitly through the generator; there is no
// process-wide stream. A seeded call therefore reproduces the same output no
// matter how many other calls run concurrently on other threads.
//
// Seeding: `SeqRng::new(seed)` for reproducible streams, `SeqRng::from_entropy()`
// when the caller supplied no seed. `SeqRng::from_seed(Option<u64>)` picks
// between the two, which is what the request types in the music crate use.
//
// **Determinism constraint.** The core generator is integer-only. The derived
// float helpers (`next_f64`, `gauss`) are pure functions of the integer stream,
// so the same seed yields the same draws on any platform; `gauss` goes through
// `ln`/`cos`, which are not guaranteed bit-identical across libm builds.

use serde::{Deserialize, Serialize};
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Distinguishes entropy-seeded streams created within the same nanosecond.
static ENTROPY_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Xoshiro256++ stream owned by a single generation call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeqRng {
    s: [u64; 4],
}

impl SeqRng {
    /// Create a stream from a `u64` seed.
    ///
    /// Uses SplitMix64 to expand the seed into the 256-bit internal state.
    /// Two streams created with the same seed produce identical sequences.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Create a non-reproducible stream.
    ///
    /// Mixes the std hasher's per-process random keys with the wall clock and
    /// a global counter, so two calls never share a stream.
    pub fn from_entropy() -> Self {
        let mut hasher = RandomState::new().build_hasher();
        if let Ok(elapsed) = SystemTime::now().duration_since(UNIX_EPOCH) {
            hasher.write_u128(elapsed.as_nanos());
        }
        hasher.write_u64(ENTROPY_COUNTER.fetch_add(1, Ordering::Relaxed));
        Self::new(hasher.finish())
    }

    /// Seeded stream when `seed` is present, entropy-seeded otherwise.
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::new(seed),
            None => Self::from_entropy(),
        }
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Generate a uniform `f64` in [0, 1) from the upper 53 bits of a `u64`.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Generate a uniform integer in `[low, high)`.
    ///
    /// Uses rejection sampling to avoid modulo bias.
    /// Panics if `low >= high`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "range_u64: low must be less than high");
        let range = high - low;
        if range.is_power_of_two() {
            return low + (self.next_u64() & (range - 1));
        }
        let threshold = range.wrapping_neg() % range; // = (2^64 - range) % range
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + (r % range);
            }
        }
    }

    /// Generate a uniform signed integer in `[low, high]` (inclusive on both ends).
    ///
    /// Panics if `low > high`.
    pub fn range_i64_inclusive(&mut self, low: i64, high: i64) -> i64 {
        assert!(low <= high, "range_i64_inclusive: low must be <= high");
        let span = high.abs_diff(low);
        if span == u64::MAX {
            return self.next_u64() as i64;
        }
        low.wrapping_add(self.range_u64(0, span + 1) as i64)
    }

    /// Generate a uniform `u8` in `[low, high]`, e.g. a MIDI velocity.
    ///
    /// Panics if `low > high`.
    pub fn range_u8_inclusive(&mut self, low: u8, high: u8) -> u8 {
        self.range_i64_inclusive(low.into(), high.into()) as u8
    }

    /// Return `true` with probability `p`.
    ///
    /// Always consumes exactly one draw: `p <= 0.0` is always false,
    /// `p >= 1.0` always true.
    pub fn random_bool(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Pick one element uniformly. `None` only for an empty slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.range_u64(0, items.len() as u64) as usize;
        items.get(idx)
    }

    /// Normal deviate with the given mean and standard deviation (Box–Muller).
    ///
    /// Always consumes exactly two draws, including when `std_dev` is zero.
    pub fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        // 1 - u keeps the log argument in (0, 1].
        let u1 = 1.0 - self.next_f64();
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
        mean + z * std_dev
    }
}

/// SplitMix64, used only for expanding a `u64` seed into xoshiro state.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
