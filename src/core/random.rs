//! Random streams
//!
//! Two distinct generator types keep gameplay and visuals apart:
//! [`SharedRandom`] is seeded identically on every replica and drives
//! anything that affects the simulation, [`CosmeticRandom`] is seeded
//! locally and may only feed visuals. They are separate types so a cosmetic
//! handle can never be passed where a gameplay draw is expected.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::geometry::WVec;

/// Synchronized gameplay stream
#[derive(Debug, Clone)]
pub struct SharedRandom {
    rng: ChaCha8Rng,
    draws: u64,
}

impl SharedRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            draws: 0,
        }
    }

    /// Uniform integer in `low..high`. An empty range yields `low` without drawing.
    pub fn next_range(&mut self, low: i32, high: i32) -> i32 {
        if high <= low {
            return low;
        }
        self.draws += 1;
        self.rng.gen_range(low..high)
    }

    /// Uniform integer in `0..max`
    pub fn next_below(&mut self, max: i32) -> i32 {
        self.next_range(0, max)
    }

    /// Rolls a percentage chance; always consumes one draw
    pub fn percent_chance(&mut self, percent: i32) -> bool {
        self.draws += 1;
        self.rng.gen_range(0..100) < percent
    }

    /// Sum of `samples` uniform draws in `-1024..1024`, divided by `samples`.
    /// Two samples give a triangular distribution centred on zero.
    pub fn pdf_offset(&mut self, samples: u32) -> i32 {
        let samples = samples.max(1);
        let sum: i64 = (0..samples).map(|_| self.next_range(-1024, 1024) as i64).sum();
        (sum / samples as i64) as i32
    }

    /// Horizontal offset with both components drawn from [`Self::pdf_offset`]
    pub fn pdf_vec(&mut self, samples: u32) -> WVec {
        let x = self.pdf_offset(samples);
        let y = self.pdf_offset(samples);
        WVec::new(x, y, 0)
    }

    /// Number of values drawn so far, exposed for desync reports
    pub fn draws(&self) -> u64 {
        self.draws
    }
}

/// Local, non-synchronized stream for visual jitter only
#[derive(Debug, Clone)]
pub struct CosmeticRandom {
    rng: ChaCha8Rng,
}

impl CosmeticRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn next_range(&mut self, low: i32, high: i32) -> i32 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..high)
    }

    /// Picks one element, or `None` for an empty slice. Single-element
    /// slices do not consume a draw.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        match items.len() {
            0 => None,
            1 => items.first(),
            n => items.get(self.rng.gen_range(0..n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = SharedRandom::new(42);
        let mut b = SharedRandom::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_range(-500, 500), b.next_range(-500, 500));
        }
        assert_eq!(a.draws(), 100);
    }

    #[test]
    fn test_empty_range_does_not_draw() {
        let mut r = SharedRandom::new(1);
        assert_eq!(r.next_range(5, 5), 5);
        assert_eq!(r.draws(), 0);
    }

    #[test]
    fn test_pdf_offset_bounds() {
        let mut r = SharedRandom::new(7);
        for _ in 0..500 {
            let v = r.pdf_offset(2);
            assert!((-1024..1024).contains(&v));
        }
        assert_eq!(r.draws(), 1000);
    }

    #[test]
    fn test_cosmetic_pick_single_does_not_draw() {
        let mut a = CosmeticRandom::new(3);
        let mut b = CosmeticRandom::new(3);
        assert_eq!(a.pick(&["only"]), Some(&"only"));
        assert_eq!(a.next_range(0, 1000), b.next_range(0, 1000));
    }
}
