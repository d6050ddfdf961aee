//! Injectable randomness.
//!
//! Every random choice the engine makes goes through a [`PromptRng`] passed in
//! by the caller. Seeding it identically reproduces a build exactly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform draws in `[0, 1)`.
pub trait PromptRng: Send {
    fn next(&mut self) -> f64;
}

/// Any `FnMut() -> f64` is a generator; handy for scripted sequences in tests.
impl<F> PromptRng for F
where
    F: FnMut() -> f64 + Send,
{
    fn next(&mut self) -> f64 {
        self()
    }
}

/// `StdRng`-backed generator.
pub struct SeededRng(StdRng);

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }

    /// Seeded from the operating system.
    pub fn from_os() -> Self {
        Self(StdRng::from_os_rng())
    }
}

impl PromptRng for SeededRng {
    fn next(&mut self) -> f64 {
        self.0.random::<f64>()
    }
}

/// A draw forced into `[0, 1)`; out-of-range or NaN values become 0.
pub fn unit(rng: &mut dyn PromptRng) -> f64 {
    let value = rng.next();
    if (0.0..1.0).contains(&value) {
        value
    } else {
        0.0
    }
}

fn index(rng: &mut dyn PromptRng, len: usize) -> usize {
    ((unit(rng) * len as f64) as usize).min(len.saturating_sub(1))
}

/// Uniform pick. Consumes one draw, even for an empty slice.
pub fn pick<'a, T>(rng: &mut dyn PromptRng, items: &'a [T]) -> Option<&'a T> {
    let i = index(rng, items.len());
    items.get(i)
}

/// Weighted pick. Items with zero weight are never chosen unless all are zero,
/// in which case the pick is uniform.
pub fn pick_weighted<'a, T>(
    rng: &mut dyn PromptRng,
    items: &'a [T],
    weight: impl Fn(&T) -> u32,
) -> Option<&'a T> {
    let total: u64 = items.iter().map(|i| weight(i) as u64).sum();
    if total == 0 {
        return pick(rng, items);
    }

    let mut target = unit(rng) * total as f64;
    for item in items {
        let w = weight(item) as f64;
        if target < w {
            return Some(item);
        }
        target -= w;
    }
    items.iter().rev().find(|i| weight(*i) > 0)
}

/// Up to `n` distinct items, in draw order.
pub fn sample_distinct<'a, T>(rng: &mut dyn PromptRng, items: &'a [T], n: usize) -> Vec<&'a T> {
    let mut pool: Vec<&T> = items.iter().collect();
    let mut picked = Vec::with_capacity(n.min(pool.len()));
    while picked.len() < n && !pool.is_empty() {
        let i = index(rng, pool.len());
        picked.push(pool.swap_remove(i));
    }
    picked
}

/// Uniform integer in `lo..=hi`.
pub fn range(rng: &mut dyn PromptRng, lo: u32, hi: u32) -> u32 {
    if hi <= lo {
        return lo;
    }
    let span = (hi - lo + 1) as f64;
    lo + ((unit(rng) * span) as u32).min(hi - lo)
}
