//! Stimulus selection engine
//!
//! Maps opinion responses and the assigned group onto the ordered list of
//! images a participant rates. Each response contributes one generated and one
//! authentic image from the bucket its agreement and the group's polarity
//! select; the combined list is shuffled.

use crate::catalog::QuestionCatalog;
use crate::config::StudyConfig;
use crate::random::shuffled;
use crate::types::{Bucket, ExperimentalGroup, ImageStimulus, OpinionResponse, Polarity};
use indexmap::IndexMap;
use rand::Rng;

const PRETEST_GENERATED: &str = "test-generated";
const PRETEST_AUTHENTIC: &str = "test-authentic";

/// Rating fed for every question when the group skips the questionnaire
const SYNTHETIC_RATING: u8 = 3;

/// Builds stimulus lists for a session
#[derive(Debug, Clone)]
pub struct StimulusSelector {
    image_root: String,
    pretest_files: Vec<String>,
    question_ids: Vec<u32>,
}

impl StimulusSelector {
    /// Create selector
    #[must_use]
    pub fn new(
        image_root: impl Into<String>,
        pretest_files: Vec<String>,
        question_ids: Vec<u32>,
    ) -> Self {
        let image_root: String = image_root.into();
        Self {
            image_root: image_root.trim_end_matches('/').to_string(),
            pretest_files,
            question_ids,
        }
    }

    /// Create selector from configuration and the active catalog
    #[must_use]
    pub fn from_config(config: &StudyConfig, catalog: &QuestionCatalog) -> Self {
        Self::new(
            config.image_root.clone(),
            config.pretest_files.clone(),
            catalog.ids().collect(),
        )
    }

    fn path(&self, folder: &str, file: &str) -> String {
        format!("{}/{folder}/{file}", self.image_root)
    }

    /// Generated and authentic image for one question in one bucket
    #[must_use]
    pub fn pair(&self, bucket: Bucket, question_id: u32) -> [ImageStimulus; 2] {
        let file = format!("{question_id}.png");
        [
            ImageStimulus::new(self.path(&format!("{}-generated", bucket.as_str()), &file), true),
            ImageStimulus::new(self.path(&format!("{}-authentic", bucket.as_str()), &file), false),
        ]
    }

    /// Stimuli for the responses under one polarity, shuffled
    pub fn for_polarity<R: Rng>(
        &self,
        responses: &[OpinionResponse],
        polarity: Polarity,
        rng: &mut R,
    ) -> Vec<ImageStimulus> {
        let stimuli = responses
            .iter()
            .flat_map(|r| self.pair(polarity.bucket(r.agreement()), r.question_id))
            .collect();
        shuffled(stimuli, rng)
    }

    /// Stimulus list for the main rating step
    ///
    /// Groups with a polarity derive the list from `responses`. The all-images
    /// group ignores `responses` and gets two pretest images followed by every
    /// catalog question under both polarities.
    pub fn select<R: Rng>(
        &self,
        responses: &[OpinionResponse],
        group: ExperimentalGroup,
        rng: &mut R,
    ) -> Vec<ImageStimulus> {
        match group.polarity() {
            Some(polarity) => self.for_polarity(responses, polarity, rng),
            None => self.all_images(rng),
        }
    }

    fn all_images<R: Rng>(&self, rng: &mut R) -> Vec<ImageStimulus> {
        let synthetic: Vec<OpinionResponse> = self
            .question_ids
            .iter()
            .map(|&id| OpinionResponse::new(id, SYNTHETIC_RATING))
            .collect();

        let mut stimuli = vec![
            ImageStimulus::new(self.path(PRETEST_GENERATED, "1.png"), true),
            ImageStimulus::new(self.path(PRETEST_AUTHENTIC, "1.png"), false),
        ];
        stimuli.extend(self.for_polarity(&synthetic, Polarity::Matching, rng));
        stimuli.extend(self.for_polarity(&synthetic, Polarity::Opposite, rng));
        stimuli
    }

    /// Fixed pretest set: every pretest file in both folders, deduplicated by
    /// path, shuffled
    pub fn pretest<R: Rng>(&self, rng: &mut R) -> Vec<ImageStimulus> {
        let generated = self
            .pretest_files
            .iter()
            .map(|f| ImageStimulus::new(self.path(PRETEST_GENERATED, f), true));
        let authentic = self
            .pretest_files
            .iter()
            .map(|f| ImageStimulus::new(self.path(PRETEST_AUTHENTIC, f), false));

        let unique: IndexMap<String, ImageStimulus> = generated
            .chain(authentic)
            .map(|s| (s.image_path.clone(), s))
            .collect();
        shuffled(unique.into_values().collect(), rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn selector() -> StimulusSelector {
        StimulusSelector::new("/images/", vec!["1.png".into(), "2.png".into(), "3.png".into()], vec![1, 2, 3])
    }

    fn paths(stimuli: &[ImageStimulus]) -> Vec<&str> {
        stimuli.iter().map(|s| s.image_path.as_str()).collect()
    }

    #[test]
    fn matching_polarity_high_agreement() {
        let mut rng = StdRng::seed_from_u64(1);
        let out = selector().select(
            &[OpinionResponse::new(7, 4)],
            ExperimentalGroup::NoPretestMatching,
            &mut rng,
        );
        assert_eq!(out.len(), 2);
        assert!(out.contains(&ImageStimulus::new("/images/matching-generated/7.png", true)));
        assert!(out.contains(&ImageStimulus::new("/images/matching-authentic/7.png", false)));
    }

    #[test]
    fn opposite_polarity_high_agreement() {
        let mut rng = StdRng::seed_from_u64(1);
        let out = selector().select(
            &[OpinionResponse::new(7, 4)],
            ExperimentalGroup::PretestNotMatching,
            &mut rng,
        );
        assert!(out.contains(&ImageStimulus::new("/images/not-matching-generated/7.png", true)));
        assert!(out.contains(&ImageStimulus::new("/images/not-matching-authentic/7.png", false)));
    }

    #[test]
    fn low_agreement_flips_bucket() {
        let mut rng = StdRng::seed_from_u64(2);
        let out = selector().for_polarity(&[OpinionResponse::new(5, 2)], Polarity::Matching, &mut rng);
        assert!(paths(&out).iter().all(|p| p.contains("/not-matching-")));
        let out = selector().for_polarity(&[OpinionResponse::new(5, 1)], Polarity::Opposite, &mut rng);
        assert!(paths(&out).iter().all(|p| p.contains("/matching-") && !p.contains("not-")));
    }

    #[test]
    fn no_responses_yield_no_stimuli() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(selector()
            .select(&[], ExperimentalGroup::PretestMatching, &mut rng)
            .is_empty());
    }

    #[test]
    fn all_images_group_gets_prefix_and_both_polarities() {
        let mut rng = StdRng::seed_from_u64(4);
        let out = selector().select(
            &[OpinionResponse::new(1, 1)],
            ExperimentalGroup::AllImagesNoQuestionnaire,
            &mut rng,
        );
        assert_eq!(out.len(), 2 + 2 * 3 + 2 * 3);
        assert_eq!(out[0], ImageStimulus::new("/images/test-generated/1.png", true));
        assert_eq!(out[1], ImageStimulus::new("/images/test-authentic/1.png", false));
        for id in 1..=3 {
            for folder in ["matching-generated", "matching-authentic", "not-matching-generated", "not-matching-authentic"] {
                let path = format!("/images/{folder}/{id}.png");
                assert!(paths(&out).contains(&path.as_str()), "missing {path}");
            }
        }
        // synthetic rating 3 under matching polarity stays in the matching bucket
        assert!(paths(&out[2..8]).iter().all(|p| !p.contains("not-matching")));
        assert!(paths(&out[8..]).iter().all(|p| p.contains("not-matching")));
    }

    #[test]
    fn pretest_set_is_deduplicated() {
        let mut rng = StdRng::seed_from_u64(5);
        let selector = StimulusSelector::new("/images", vec!["1.png".into(), "1.png".into(), "2.png".into()], vec![]);
        let out = selector.pretest(&mut rng);
        assert_eq!(out.len(), 4);
        assert_eq!(out.iter().filter(|s| s.is_actually_ai).count(), 2);
    }

    #[test]
    fn pretest_set_has_three_of_each() {
        let mut rng = StdRng::seed_from_u64(6);
        let out = selector().pretest(&mut rng);
        assert_eq!(out.len(), 6);
        assert_eq!(out.iter().filter(|s| s.is_actually_ai).count(), 3);
        assert!(paths(&out).iter().all(|p| p.starts_with("/images/test-")));
    }
}
