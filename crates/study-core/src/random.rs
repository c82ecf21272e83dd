//! Randomization utilities
//!
//! Participant identifiers, group assignment and Fisher–Yates shuffling.
//! Every function has a variant taking an explicit [`Rng`] so sessions are
//! reproducible under a fixed seed.

use crate::types::{ExperimentalGroup, OpinionResponse, ParticipantId};
use chrono::{DateTime, Utc};
use rand::Rng;
use ulid::Ulid;

/// Generate a participant identifier from ambient time and entropy
#[must_use]
pub fn generate_participant_id() -> ParticipantId {
    ParticipantId::from_ulid(Ulid::new())
}

/// Generate a participant identifier from an explicit source and timestamp
///
/// The timestamp fills the 48 time bits of the ULID, the source fills the
/// remaining 80 random bits.
#[must_use]
pub fn generate_participant_id_with<R: Rng>(rng: &mut R, at: DateTime<Utc>) -> ParticipantId {
    let timestamp_ms = u64::try_from(at.timestamp_millis()).unwrap_or(0);
    ParticipantId::from_ulid(Ulid::from_parts(timestamp_ms, rng.random::<u128>()))
}

/// Assign one of the five groups uniformly at random
#[must_use]
pub fn assign_group() -> ExperimentalGroup {
    assign_group_with(&mut rand::rng())
}

/// Assign one of the five groups uniformly using the given source
#[must_use]
pub fn assign_group_with<R: Rng>(rng: &mut R) -> ExperimentalGroup {
    ExperimentalGroup::ALL[rng.random_range(0..ExperimentalGroup::ALL.len())]
}

/// Fisher–Yates shuffle in place
pub fn shuffle<T, R: Rng>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

/// Shuffle an owned list and hand it back
#[must_use]
pub fn shuffled<T, R: Rng>(mut items: Vec<T>, rng: &mut R) -> Vec<T> {
    shuffle(&mut items, rng);
    items
}

/// Mean opinion rating, 0 for no responses
#[must_use]
pub fn average_rating(responses: &[OpinionResponse]) -> f64 {
    if responses.is_empty() {
        return 0.0;
    }
    let sum: u32 = responses.iter().map(|r| u32::from(r.rating)).sum();
    f64::from(sum) / responses.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::{HashMap, HashSet};

    #[test]
    fn participant_ids_are_distinct() {
        let ids: HashSet<_> = (0..10_000).map(|_| generate_participant_id()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn seeded_participant_ids_are_distinct_within_one_millisecond() {
        let mut rng = StdRng::seed_from_u64(7);
        let now = Utc::now();
        let ids: HashSet<_> = (0..10_000)
            .map(|_| generate_participant_id_with(&mut rng, now))
            .collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn participant_id_shape() {
        let id = generate_participant_id();
        assert!(id.as_str().starts_with('P'));
        assert_eq!(id.as_str().len(), 27);
    }

    #[test]
    fn seeded_assignment_is_reproducible() {
        let a: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(42);
            (0..50).map(|_| assign_group_with(&mut rng)).collect()
        };
        let b: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(42);
            (0..50).map(|_| assign_group_with(&mut rng)).collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn assignment_covers_all_groups_roughly_evenly() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut counts: HashMap<ExperimentalGroup, usize> = HashMap::new();
        for _ in 0..10_000 {
            *counts.entry(assign_group_with(&mut rng)).or_default() += 1;
        }
        assert_eq!(counts.len(), 5);
        for count in counts.values() {
            assert!((1_700..=2_300).contains(count), "skewed count {count}");
        }
    }

    #[test]
    fn shuffle_reaches_every_ordering_of_three() {
        let mut rng = StdRng::seed_from_u64(3);
        let seen: HashSet<Vec<u8>> = (0..600)
            .map(|_| shuffled(vec![1, 2, 3], &mut rng))
            .collect();
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn average_rating_of_empty_is_zero() {
        assert!(average_rating(&[]).abs() < f64::EPSILON);
        let avg = average_rating(&[OpinionResponse::new(1, 4), OpinionResponse::new(2, 1)]);
        assert!((avg - 2.5).abs() < f64::EPSILON);
    }

    proptest! {
        #[test]
        fn prop_shuffle_is_permutation(items in proptest::collection::vec(0u16..50, 0..40), seed: u64) {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut out = shuffled(items.clone(), &mut rng);
            let mut expected = items;
            out.sort_unstable();
            expected.sort_unstable();
            prop_assert_eq!(out, expected);
        }
    }
}
