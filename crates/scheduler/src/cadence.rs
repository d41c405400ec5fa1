//! Cadence policies — when a pulse task fires.

use rand::rngs::StdRng;
use rand::Rng;

/// Decides, per pulse cycle, whether a task fires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CadencePolicy {
    /// Fire on every pulse.
    EveryPulse,

    /// Fire when the cycle sequence is a multiple of N.
    EveryCycles(u64),

    /// Fire with probability p, drawn fresh each cycle. Memoryless: a long
    /// dry streak does not make the next draw more likely.
    Probability(f64),
}

impl CadencePolicy {
    /// Whether the task fires on this cycle. The RNG is only consulted for
    /// `Probability`, so deterministic policies stay deterministic even when
    /// the scheduler's RNG is unseeded.
    pub fn should_fire(&self, cycle: u64, rng: &mut StdRng) -> bool {
        match *self {
            CadencePolicy::EveryPulse => true,
            CadencePolicy::EveryCycles(n) => n != 0 && cycle % n == 0,
            CadencePolicy::Probability(p) => rng.gen_bool(p.clamp(0.0, 1.0)),
        }
    }
}
