//! Input validation at the collection boundary
//!
//! The flow engine trusts its payloads. Front-ends collect answers into the
//! drafts below, gate their submit control on `is_complete`, and only
//! dispatch what `finish` returns.

use crate::catalog::QuestionCatalog;
use crate::config::StudyConfig;
use crate::error::InputError;
use crate::types::{Demographics, Education, Gender, ImageRating, OpinionResponse};
use std::collections::HashSet;

/// Parse a whole number typed by the participant
pub fn parse_number(text: &str) -> Result<u32, InputError> {
    let text = text.trim();
    text.parse()
        .map_err(|_| InputError::NotANumber(text.to_string()))
}

/// Check an opinion rating is on the 1-4 scale
pub fn validate_rating(question_id: u32, rating: u32) -> Result<OpinionResponse, InputError> {
    u8::try_from(rating)
        .ok()
        .filter(|r| (OpinionResponse::MIN_RATING..=OpinionResponse::MAX_RATING).contains(r))
        .map(|r| OpinionResponse::new(question_id, r))
        .ok_or(InputError::RatingOutOfRange { question_id, rating })
}

/// Check an AI-probability estimate is within 0-100
pub fn validate_probability(value: u32) -> Result<u8, InputError> {
    u8::try_from(value)
        .ok()
        .filter(|p| *p <= ImageRating::MAX_PROBABILITY)
        .ok_or(InputError::ProbabilityOutOfRange(value))
}

/// Check every catalog question is answered exactly once, on the 1-4 scale
pub fn validate_questionnaire(
    responses: &[OpinionResponse],
    catalog: &QuestionCatalog,
) -> Result<(), InputError> {
    let mut seen = HashSet::with_capacity(responses.len());
    for r in responses {
        if catalog.get(r.question_id).is_none() {
            return Err(InputError::UnknownQuestion(r.question_id));
        }
        if !seen.insert(r.question_id) {
            return Err(InputError::DuplicateResponse(r.question_id));
        }
        validate_rating(r.question_id, u32::from(r.rating))?;
    }
    match catalog.ids().find(|id| !seen.contains(id)) {
        Some(missing) => Err(InputError::MissingResponse(missing)),
        None => Ok(()),
    }
}

/// Questionnaire answers being collected, one slider per catalog question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionnaireDraft {
    responses: Vec<OpinionResponse>,
}

impl QuestionnaireDraft {
    /// Every question starts at the default rating
    #[must_use]
    pub fn new(catalog: &QuestionCatalog) -> Self {
        Self {
            responses: catalog
                .ids()
                .map(|id| OpinionResponse::new(id, OpinionResponse::DEFAULT_RATING))
                .collect(),
        }
    }

    /// Move one slider
    pub fn set(&mut self, question_id: u32, rating: u32) -> Result<(), InputError> {
        let response = validate_rating(question_id, rating)?;
        let slot = self
            .responses
            .iter_mut()
            .find(|r| r.question_id == question_id)
            .ok_or(InputError::UnknownQuestion(question_id))?;
        *slot = response;
        Ok(())
    }

    /// Current rating for a question
    #[must_use]
    pub fn rating(&self, question_id: u32) -> Option<u8> {
        self.responses
            .iter()
            .find(|r| r.question_id == question_id)
            .map(|r| r.rating)
    }

    /// Sliders always hold a value, so the draft is always submittable
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.responses.is_empty()
    }

    /// Responses in catalog order
    #[must_use]
    pub fn finish(self) -> Vec<OpinionResponse> {
        self.responses
    }
}

/// Demographic form being filled in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemographicsDraft {
    /// Entered age
    pub age: Option<u32>,
    /// Selected gender
    pub gender: Option<Gender>,
    /// Selected education level
    pub education: Option<Education>,
}

impl DemographicsDraft {
    /// Create empty form
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether every field holds something (range is checked by `finish`)
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.age.is_some_and(|a| a > 0) && self.gender.is_some() && self.education.is_some()
    }

    /// Validate and build the record
    pub fn finish(&self, config: &StudyConfig) -> Result<Demographics, InputError> {
        let age = self.age.unwrap_or(0);
        if !(config.min_age..=config.max_age).contains(&age) {
            return Err(InputError::AgeOutOfRange {
                age,
                min: config.min_age,
                max: config.max_age,
            });
        }
        let gender = self.gender.ok_or(InputError::EmptySelection("gender"))?;
        let education = self
            .education
            .ok_or(InputError::EmptySelection("education"))?;
        Ok(Demographics::new(age, gender, education))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Question;

    fn catalog() -> QuestionCatalog {
        QuestionCatalog::new(vec![
            Question { id: 1, statement: "a".into() },
            Question { id: 2, statement: "b".into() },
        ])
        .unwrap()
    }

    #[test]
    fn rating_scale_bounds() {
        assert!(validate_rating(1, 1).is_ok());
        assert!(validate_rating(1, 4).is_ok());
        assert_eq!(
            validate_rating(1, 5),
            Err(InputError::RatingOutOfRange { question_id: 1, rating: 5 })
        );
        assert!(validate_rating(1, 0).is_err());
        assert!(validate_rating(1, 300).is_err());
    }

    #[test]
    fn probability_bounds() {
        assert_eq!(validate_probability(0), Ok(0));
        assert_eq!(validate_probability(100), Ok(100));
        assert_eq!(
            validate_probability(101),
            Err(InputError::ProbabilityOutOfRange(101))
        );
    }

    #[test]
    fn parse_number_trims() {
        assert_eq!(parse_number(" 42\n"), Ok(42));
        assert_eq!(parse_number("x"), Err(InputError::NotANumber("x".into())));
    }

    #[test]
    fn questionnaire_must_cover_catalog() {
        let catalog = catalog();
        let full = [OpinionResponse::new(1, 3), OpinionResponse::new(2, 1)];
        assert!(validate_questionnaire(&full, &catalog).is_ok());
        assert_eq!(
            validate_questionnaire(&full[..1], &catalog),
            Err(InputError::MissingResponse(2))
        );
        assert_eq!(
            validate_questionnaire(&[OpinionResponse::new(1, 3), OpinionResponse::new(1, 2)], &catalog),
            Err(InputError::DuplicateResponse(1))
        );
        assert_eq!(
            validate_questionnaire(&[OpinionResponse::new(9, 3)], &catalog),
            Err(InputError::UnknownQuestion(9))
        );
    }

    #[test]
    fn questionnaire_draft_starts_at_default() {
        let mut draft = QuestionnaireDraft::new(&catalog());
        assert_eq!(draft.rating(1), Some(2));
        draft.set(2, 4).unwrap();
        assert!(draft.set(3, 4).is_err());
        assert!(draft.set(1, 7).is_err());
        assert!(draft.is_complete());
        let responses = draft.finish();
        assert!(validate_questionnaire(&responses, &catalog()).is_ok());
        assert_eq!(responses[1], OpinionResponse::new(2, 4));
    }

    #[test]
    fn demographics_draft_gates_submission() {
        let config = StudyConfig::default();
        let mut draft = DemographicsDraft::new();
        assert!(!draft.is_complete());
        draft.age = Some(25);
        draft.gender = Some(Gender::Female);
        assert!(!draft.is_complete());
        assert_eq!(draft.finish(&config), Err(InputError::EmptySelection("education")));
        draft.education = Some(Education::Srednie);
        assert!(draft.is_complete());
        assert_eq!(
            draft.finish(&config).unwrap(),
            Demographics::new(25, Gender::Female, Education::Srednie)
        );
    }

    #[test]
    fn demographics_age_range() {
        let config = StudyConfig::default();
        let draft = DemographicsDraft {
            age: Some(12),
            gender: Some(Gender::Male),
            education: Some(Education::Podstawowe),
        };
        assert!(draft.is_complete());
        assert_eq!(
            draft.finish(&config),
            Err(InputError::AgeOutOfRange { age: 12, min: 18, max: 100 })
        );
    }
}
