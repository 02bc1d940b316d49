//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call any platform RNG.
//! All randomness flows through StreamRng instances derived from the
//! single master seed the engine was constructed with.
//!
//! Two kinds of streams exist:
//!   - the bootstrap stream (stable index 0), which drives the initial
//!     365-day history generation;
//!   - one stream per simulated day, keyed by the date's ordinal, which
//!     drives that day's advance step. Keying by date means replaying a
//!     day after a reload draws exactly what a continuous run would have.

use chrono::{Datelike, NaiveDate};
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// A named, deterministic RNG for a single stream.
pub struct StreamRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl StreamRng {
    /// Create a stream RNG from the master seed and a stable stream
    /// index. The index must never change once assigned.
    pub fn new(master_seed: u64, stream_index: u64) -> Self {
        let derived_seed = master_seed ^ (stream_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a float in [lo, hi).
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.next_f64() * (hi - lo)
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Sample from a normal distribution via Box–Muller.
    /// Not truncated: rare draws far below the mean (including negative
    /// amounts) are valid output and tolerated downstream.
    pub fn normal(&mut self, mean: f64, sd: f64) -> f64 {
        let u1 = self.next_f64().max(1e-12);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
        mean + sd * z
    }
}

/// All RNG streams for one engine instance, derived from one master seed.
pub struct RngBank {
    master_seed: u64,
}

/// Stream index 0 is reserved for history bootstrap. Day streams use the
/// date's ordinal (days from CE), far above 0 for any simulated date.
const BOOTSTRAP_STREAM: u64 = 0;

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    /// The stream that generates the initial multi-year history.
    pub fn bootstrap(&self) -> StreamRng {
        StreamRng::new(self.master_seed, BOOTSTRAP_STREAM).with_name("bootstrap")
    }

    /// The stream for a single day-advance step.
    pub fn day_stream(&self, date: NaiveDate) -> StreamRng {
        StreamRng::new(self.master_seed, date.num_days_from_ce() as u64).with_name("advance")
    }
}
