//! Seed policy.

use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out a fresh seed for every generator call.
///
/// The first call uses the base seed; every later call gets the next value,
/// so retries never replay an earlier sample.
///
/// # Examples
///
/// ```
/// use fabulist_gateway::SeedPolicy;
///
/// let seeds = SeedPolicy::new(10);
/// assert_eq!(seeds.next_seed(), 10);
/// assert_eq!(seeds.next_seed(), 11);
/// ```
#[derive(Debug)]
pub struct SeedPolicy {
    base: u64,
    issued: AtomicU64,
}

impl SeedPolicy {
    /// Create a policy starting at `base`.
    pub fn new(base: u64) -> Self {
        Self {
            base,
            issued: AtomicU64::new(0),
        }
    }

    /// The seed the policy started from.
    pub fn base(&self) -> u64 {
        self.base
    }

    /// Next unused seed.
    pub fn next_seed(&self) -> u64 {
        self.base
            .wrapping_add(self.issued.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeds_never_repeat() {
        let seeds = SeedPolicy::new(7);
        let issued: Vec<u64> = (0..5).map(|_| seeds.next_seed()).collect();
        assert_eq!(issued, vec![7, 8, 9, 10, 11]);
        assert_eq!(seeds.base(), 7);
    }

    #[test]
    fn test_seed_wraps_at_max() {
        let seeds = SeedPolicy::new(u64::MAX);
        assert_eq!(seeds.next_seed(), u64::MAX);
        assert_eq!(seeds.next_seed(), 0);
    }
}
