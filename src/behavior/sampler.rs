use std::time::Duration;

use rand::Rng;

/// Source of the human-variation randomness. Production code draws from the
/// thread RNG; tests inject a deterministic implementation so runs are
/// reproducible.
pub trait Sampler: Send + Sync {
    /// Uniform duration in `[min, max]`.
    fn duration_between(&self, min: Duration, max: Duration) -> Duration;

    /// Uniform index in `[0, n)`.
    fn index_below(&self, n: usize) -> usize;

    /// Uniform count in `[lo, hi]`, inclusive.
    fn count_between(&self, lo: usize, hi: usize) -> usize;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngSampler;

impl Sampler for ThreadRngSampler {
    fn duration_between(&self, min: Duration, max: Duration) -> Duration {
        // Each draw completes before any await; the RNG is never held
        // across a suspension point.
        let range = max.saturating_sub(min);
        if range.is_zero() {
            return min;
        }
        let offset = rand::thread_rng().gen_range(0..=range.as_millis() as u64);
        min + Duration::from_millis(offset)
    }

    fn index_below(&self, n: usize) -> usize {
        if n <= 1 {
            0
        } else {
            rand::thread_rng().gen_range(0..n)
        }
    }

    fn count_between(&self, lo: usize, hi: usize) -> usize {
        if hi <= lo {
            lo
        } else {
            rand::thread_rng().gen_range(lo..=hi)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_stays_within_bounds() {
        let sampler = ThreadRngSampler;
        let min = Duration::from_millis(100);
        let max = Duration::from_millis(300);
        for _ in 0..50 {
            let d = sampler.duration_between(min, max);
            assert!(d >= min && d <= max);
        }
    }

    #[test]
    fn index_stays_below_n() {
        let sampler = ThreadRngSampler;
        for _ in 0..50 {
            assert!(sampler.index_below(5) < 5);
        }
        assert_eq!(sampler.index_below(0), 0);
        assert_eq!(sampler.index_below(1), 0);
    }

    #[test]
    fn count_is_inclusive() {
        let sampler = ThreadRngSampler;
        for _ in 0..50 {
            let c = sampler.count_between(1, 3);
            assert!((1..=3).contains(&c));
        }
        assert_eq!(sampler.count_between(2, 2), 2);
    }
}
