//! Seeded random sampling of year slices.
//!
//! The map and the raw-data table show a random subset of a year rather
//! than its first rows. Picks are reproducible for a seed and come back in
//! dataset order.

use rand::SeedableRng as _;
use rand::rngs::StdRng;
use rand::seq::index;

/// Rows returned by a raw-data sample when no limit is given.
pub const DEFAULT_SAMPLE_ROWS: usize = 100;

/// Picks `min(limit, len)` distinct indices below `len`, ascending.
#[must_use]
pub fn sample_indices(len: usize, limit: usize, seed: u64) -> Vec<usize> {
    if limit >= len {
        return (0..len).collect();
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked = index::sample(&mut rng, len, limit).into_vec();
    picked.sort_unstable();
    picked
}

/// Returns a seeded random subset of at most `limit` items, in input order.
#[must_use]
pub fn sample<T>(items: &[T], limit: usize, seed: u64) -> Vec<&T> {
    let picked: Vec<&T> = sample_indices(items.len(), limit, seed)
        .into_iter()
        .map(|i| &items[i])
        .collect();

    log::trace!("Sampled {} of {} items (seed {seed})", picked.len(), items.len());
    picked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_picks_same_items() {
        let items: Vec<u32> = (0..500).collect();
        assert_eq!(sample(&items, 25, 9), sample(&items, 25, 9));
        assert_ne!(sample(&items, 25, 9), sample(&items, 25, 10));
    }

    #[test]
    fn picks_are_distinct_and_in_input_order() {
        let picked = sample_indices(1_000, 50, 42);
        assert_eq!(picked.len(), 50);
        assert!(picked.windows(2).all(|w| w[0] < w[1]));
        assert!(picked.iter().all(|&i| i < 1_000));
    }

    #[test]
    fn limit_at_or_above_length_keeps_everything() {
        let items = ["a", "b", "c"];
        assert_eq!(sample(&items, 3, 1), vec![&"a", &"b", &"c"]);
        assert_eq!(sample(&items, 10, 1).len(), 3);
        assert!(sample::<u8>(&[], 5, 1).is_empty());
    }

    #[test]
    fn zero_limit_is_empty() {
        assert!(sample_indices(10, 0, 42).is_empty());
    }
}
