//! Membership-label rebalancing.
//!
//! Extraction yields far more members than non-members. Balancing keeps
//! every non-member, samples `ratio` members per non-member without
//! replacement, and repeats the non-members `ratio` times so both labels end
//! up with `ratio * non_members` rows.

use mia_core::{AttackSplit, MiaError, Result, MEMBER, NON_MEMBER};
use rand::Rng;

/// Rebalance `split` so that member and non-member counts are equal.
///
/// Output order: non-members, sampled members, then the non-members
/// `ratio - 1` more times.
///
/// # Errors
///
/// [`MiaError::Bounds`] when `ratio * non_members` exceeds the members
/// available, and [`MiaError::Config`] when `ratio` is zero.
pub fn balance_membership<R: Rng + ?Sized>(
    split: &AttackSplit,
    ratio: usize,
    rng: &mut R,
) -> Result<AttackSplit> {
    if ratio == 0 {
        return Err(MiaError::Config("balance ratio must be >= 1".to_string()));
    }
    let keep = split.indices_of_label(NON_MEMBER);
    let members = split.indices_of_label(MEMBER);
    let wanted = keep.len() * ratio;
    if wanted > members.len() {
        return Err(MiaError::Bounds {
            requested: wanted,
            available: members.len(),
        });
    }

    let sampled = rand::seq::index::sample(rng, members.len(), wanted)
        .into_iter()
        .map(|i| members[i]);

    let mut order = Vec::with_capacity(wanted * 2);
    order.extend_from_slice(&keep);
    order.extend(sampled);
    for _ in 1..ratio {
        order.extend_from_slice(&keep);
    }

    tracing::debug!(
        non_members = keep.len(),
        members_available = members.len(),
        rows = order.len(),
        "balanced attack split"
    );
    Ok(split.select(&order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mia_core::ConfidenceRecord;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn split(members: usize, non_members: usize) -> AttackSplit {
        let mut s = AttackSplit::new(2);
        for i in 0..members + non_members {
            let membership = if i < members { MEMBER } else { NON_MEMBER };
            s.push(&ConfidenceRecord {
                confidences: vec![i as f32, 0.0],
                membership,
                true_class: (i % 3) as i32,
            })
            .unwrap();
        }
        s
    }

    #[test]
    fn test_balanced_counts() {
        let mut rng = ChaCha8Rng::seed_from_u64(171_717);
        for (members, non_members, ratio) in [(100, 20, 2), (50, 10, 1), (90, 30, 3), (5, 0, 2)] {
            let out = balance_membership(&split(members, non_members), ratio, &mut rng).unwrap();
            assert_eq!(out.count_label(MEMBER), non_members * ratio);
            assert_eq!(out.count_label(NON_MEMBER), non_members * ratio);
            assert_eq!(out.count_label(MEMBER), out.count_label(NON_MEMBER));
        }
    }

    #[test]
    fn test_members_sampled_without_replacement() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let out = balance_membership(&split(40, 20), 2, &mut rng).unwrap();
        let mut member_rows: Vec<u32> = (0..out.len())
            .filter(|&i| out.labels[i] == MEMBER)
            .map(|i| out.row(i)[0] as u32)
            .collect();
        member_rows.sort_unstable();
        member_rows.dedup();
        assert_eq!(member_rows.len(), 40);
    }

    #[test]
    fn test_rows_keep_their_class() {
        let input = split(30, 10);
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let out = balance_membership(&input, 2, &mut rng).unwrap();
        for i in 0..out.len() {
            let original = out.row(i)[0] as usize;
            assert_eq!(out.classes[i], input.classes[original]);
            assert_eq!(out.labels[i], input.labels[original]);
        }
    }

    #[test]
    fn test_not_enough_members() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = balance_membership(&split(30, 20), 2, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            MiaError::Bounds {
                requested: 40,
                available: 30
            }
        ));
    }

    #[test]
    fn test_zero_ratio_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(matches!(
            balance_membership(&split(3, 1), 0, &mut rng),
            Err(MiaError::Config(_))
        ));
    }
}
