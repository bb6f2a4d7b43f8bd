//! Weighted random selection for batch subtopic sampling.

use rand::Rng;

/// Index drawn with probability proportional to its weight.
///
/// `None` when there are no weights or they sum to zero. Negative weights
/// count as zero.
pub fn pick_weighted<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Option<usize> {
    let total: f64 = weights.iter().map(|w| w.max(0.0)).sum();
    if weights.is_empty() || total <= 0.0 || !total.is_finite() {
        return None;
    }

    let target = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    let mut last_positive = None;
    for (i, weight) in weights.iter().enumerate() {
        let weight = weight.max(0.0);
        if weight == 0.0 {
            continue;
        }
        cumulative += weight;
        last_positive = Some(i);
        if target < cumulative {
            return Some(i);
        }
    }
    // float rounding can leave target just past the final prefix sum
    last_positive
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_empty_or_zero_weights() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(pick_weighted(&[], &mut rng), None);
        assert_eq!(pick_weighted(&[0.0, 0.0], &mut rng), None);
    }

    #[test]
    fn test_zero_weight_never_chosen() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            assert_eq!(pick_weighted(&[0.0, 1.0, 0.0], &mut rng), Some(1));
        }
    }

    #[test]
    fn test_frequencies_follow_weights() {
        let mut rng = StdRng::seed_from_u64(1234);
        let weights = [1.0, 0.3];
        let mut counts = [0usize; 2];
        for _ in 0..10_000 {
            if let Some(i) = pick_weighted(&weights, &mut rng) {
                counts[i] += 1;
            }
        }
        let share = counts[0] as f64 / 10_000.0;
        // expected 1.0 / 1.3 ≈ 0.769
        assert!((0.74..0.80).contains(&share), "share was {}", share);
    }

    proptest! {
        #[test]
        fn prop_pick_is_in_bounds_and_positive(
            weights in proptest::collection::vec(0.0f64..5.0, 1..20),
            seed in any::<u64>(),
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            match pick_weighted(&weights, &mut rng) {
                Some(i) => {
                    prop_assert!(i < weights.len());
                    prop_assert!(weights[i] > 0.0);
                }
                None => prop_assert!(weights.iter().all(|w| *w <= 0.0)),
            }
        }
    }
}
