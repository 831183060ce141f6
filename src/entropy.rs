//! Sources of uniform random integers.
//!
//! Health probes and random dispatch both draw from a `RandomSource`, so a
//! balancer can run on thread-local randomness in production and on a
//! scripted sequence in tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use rand::Rng;

/// Uniform integer source.
pub trait RandomSource: Send + Sync {
    /// Draw a value in `[0, upper)`. `upper` is always at least 1.
    fn next_below(&self, upper: usize) -> usize;
}

/// Draws from `rand::thread_rng`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_below(&self, upper: usize) -> usize {
        if upper <= 1 {
            return 0;
        }
        rand::thread_rng().gen_range(0..upper)
    }
}

/// Replays a fixed sequence of draws, then repeats a fallback value.
///
/// Each draw is reduced modulo `upper`, so a script written for one range
/// stays valid for another. Every draw is counted.
#[derive(Debug)]
pub struct SequenceSource {
    script: Mutex<VecDeque<usize>>,
    fallback: usize,
    draws: AtomicU64,
}

impl SequenceSource {
    pub fn new(script: impl IntoIterator<Item = usize>, fallback: usize) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
            draws: AtomicU64::new(0),
        }
    }

    /// Source that always draws `value`.
    pub fn constant(value: usize) -> Self {
        Self::new([], value)
    }

    /// Append further draws to the script.
    pub fn push(&self, values: impl IntoIterator<Item = usize>) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(values);
    }

    /// Number of draws taken so far.
    pub fn draws(&self) -> u64 {
        self.draws.load(Ordering::Relaxed)
    }
}

impl RandomSource for SequenceSource {
    fn next_below(&self, upper: usize) -> usize {
        self.draws.fetch_add(1, Ordering::Relaxed);
        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(self.fallback);
        next % upper.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_random_in_range() {
        let source = ThreadRandom;
        for _ in 0..1000 {
            assert!(source.next_below(5) < 5);
        }
        assert_eq!(source.next_below(1), 0);
    }

    #[test]
    fn test_sequence_replays_then_falls_back() {
        let source = SequenceSource::new([0, 3, 7], 1);
        assert_eq!(source.next_below(5), 0);
        assert_eq!(source.next_below(5), 3);
        // 7 % 5
        assert_eq!(source.next_below(5), 2);
        assert_eq!(source.next_below(5), 1);
        assert_eq!(source.draws(), 4);

        source.push([4]);
        assert_eq!(source.next_below(10), 4);
    }
}
