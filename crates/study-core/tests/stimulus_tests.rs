use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use study_core::types::{ExperimentalGroup, OpinionResponse};
use study_core::StimulusSelector;

fn selector() -> StimulusSelector {
    StimulusSelector::new("/img", vec!["1.png".into(), "2.png".into(), "3.png".into()], vec![1, 2, 3, 4])
}

fn group_strategy() -> impl Strategy<Value = ExperimentalGroup> {
    prop_oneof![
        Just(ExperimentalGroup::PretestMatching),
        Just(ExperimentalGroup::PretestNotMatching),
        Just(ExperimentalGroup::NoPretestMatching),
        Just(ExperimentalGroup::NoPretestNotMatching),
    ]
}

proptest! {
    #[test]
    fn prop_two_images_per_response(
        ratings in prop::collection::vec(1u8..=4, 0..12),
        group in group_strategy(),
        seed in any::<u64>(),
    ) {
        let responses: Vec<OpinionResponse> = ratings
            .iter()
            .enumerate()
            .map(|(i, r)| OpinionResponse::new(u32::try_from(i).unwrap() + 1, *r))
            .collect();
        let mut rng = StdRng::seed_from_u64(seed);
        let out = selector().select(&responses, group, &mut rng);

        prop_assert_eq!(out.len(), 2 * responses.len());
        prop_assert_eq!(out.iter().filter(|s| s.is_actually_ai).count(), responses.len());
        for s in &out {
            let generated = s.image_path.contains("-generated/");
            prop_assert_eq!(generated, s.is_actually_ai);
            prop_assert!(
                s.image_path.starts_with("/img/matching-")
                    || s.image_path.starts_with("/img/not-matching-")
            );
        }
    }

    #[test]
    fn prop_all_images_size_is_fixed(seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let out = selector().select(&[], ExperimentalGroup::AllImagesNoQuestionnaire, &mut rng);
        prop_assert_eq!(out.len(), 2 + 4 * 4);
        prop_assert_eq!(out[0].image_path.as_str(), "/img/test-generated/1.png");
        prop_assert_eq!(out[1].image_path.as_str(), "/img/test-authentic/1.png");
    }

    #[test]
    fn prop_pretest_is_permutation_of_fixed_set(seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut paths: Vec<String> = selector()
            .pretest(&mut rng)
            .into_iter()
            .map(|s| s.image_path)
            .collect();
        paths.sort();
        prop_assert_eq!(paths, vec![
            "/img/test-authentic/1.png",
            "/img/test-authentic/2.png",
            "/img/test-authentic/3.png",
            "/img/test-generated/1.png",
            "/img/test-generated/2.png",
            "/img/test-generated/3.png",
        ]);
    }
}
