//! Disjoint target/shadow index pools.

use mia_core::{MiaError, Result};
use rand::Rng;

/// Indices split into a target pool and its complement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPartition {
    /// Sampled target indices, in sampling order.
    pub target: Vec<usize>,
    /// Every remaining index in `0..total`, ascending.
    pub shadow: Vec<usize>,
}

/// Sample `target_size` indices from `0..total` without replacement; the
/// rest form the shadow pool.
pub fn partition_indices<R: Rng + ?Sized>(
    total: usize,
    target_size: usize,
    rng: &mut R,
) -> Result<IndexPartition> {
    if target_size > total {
        return Err(MiaError::Bounds {
            requested: target_size,
            available: total,
        });
    }
    let target = rand::seq::index::sample(rng, total, target_size).into_vec();

    let mut in_target = vec![false; total];
    for &i in &target {
        in_target[i] = true;
    }
    let shadow = (0..total).filter(|&i| !in_target[i]).collect();

    Ok(IndexPartition { target, shadow })
}

/// Sample `n` entries of `pool` without replacement.
pub fn sample_from<R: Rng + ?Sized>(pool: &[usize], n: usize, rng: &mut R) -> Result<Vec<usize>> {
    if n > pool.len() {
        return Err(MiaError::Bounds {
            requested: n,
            available: pool.len(),
        });
    }
    Ok(rand::seq::index::sample(rng, pool.len(), n)
        .into_iter()
        .map(|i| pool[i])
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    #[test]
    fn test_partition_is_disjoint_and_complete() {
        let mut rng = ChaCha8Rng::seed_from_u64(171_717);
        for (total, size) in [(100, 30), (50, 0), (50, 50), (1, 1), (1000, 999)] {
            let p = partition_indices(total, size, &mut rng).unwrap();
            assert_eq!(p.target.len(), size);
            assert_eq!(p.shadow.len(), total - size);

            let target: HashSet<usize> = p.target.iter().copied().collect();
            let shadow: HashSet<usize> = p.shadow.iter().copied().collect();
            assert_eq!(target.len(), size, "target indices must be unique");
            assert!(target.is_disjoint(&shadow));
            let union: HashSet<usize> = target.union(&shadow).copied().collect();
            assert_eq!(union, (0..total).collect::<HashSet<_>>());
            assert!(p.shadow.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_partition_oversized_request() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = partition_indices(10, 11, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            MiaError::Bounds {
                requested: 11,
                available: 10
            }
        ));
    }

    #[test]
    fn test_partition_is_reproducible() {
        let a = partition_indices(500, 50, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        let b = partition_indices(500, 50, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_sample_from_pool() {
        let pool: Vec<usize> = (100..120).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let picked = sample_from(&pool, 5, &mut rng).unwrap();
        assert_eq!(picked.len(), 5);
        assert!(picked.iter().all(|i| pool.contains(i)));
        assert_eq!(picked.iter().collect::<HashSet<_>>().len(), 5);

        assert!(matches!(
            sample_from(&pool, 21, &mut rng),
            Err(MiaError::Bounds { .. })
        ));
    }
}
