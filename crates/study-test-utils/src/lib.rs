//! Testing utilities for the perception study workspace
//!
//! Shared fixtures, scripted participants and fake stores.

#![allow(missing_docs)]

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use study_core::{
    Action, Demographics, Education, ExperimentFlow, ExperimentalGroup, Gender, ImageRating,
    OpinionResponse, Question, QuestionCatalog, SessionRecord, SessionStore, Step,
    StimulusSelector, StoreError, StudyConfig,
};

pub fn fixture_catalog() -> QuestionCatalog {
    QuestionCatalog::new(vec![
        Question { id: 1, statement: "Pierwsze stwierdzenie".to_string() },
        Question { id: 2, statement: "Drugie stwierdzenie".to_string() },
        Question { id: 3, statement: "Trzecie stwierdzenie".to_string() },
    ])
    .unwrap()
}

pub fn fixture_config() -> StudyConfig {
    StudyConfig::new().with_advance_delay_ms(0)
}

pub fn seeded_flow(group: ExperimentalGroup, seed: u64) -> ExperimentFlow {
    let selector = StimulusSelector::from_config(&fixture_config(), &fixture_catalog());
    ExperimentFlow::with_group(selector, group, StdRng::seed_from_u64(seed))
}

pub fn sample_demographics() -> Demographics {
    Demographics::new(25, Gender::Female, Education::Srednie)
}

/// The action a cooperative participant takes on the current step
pub fn default_action<R: rand::Rng>(
    flow: &ExperimentFlow<R>,
    catalog: &QuestionCatalog,
) -> Option<Action> {
    match flow.step() {
        Step::Instructions => Some(Action::Begin),
        Step::Questionnaire => Some(Action::SubmitQuestionnaire(
            catalog.ids().map(|id| OpinionResponse::new(id, 4)).collect(),
        )),
        Step::Pretest | Step::Images => Some(Action::AdvanceStimulus {
            ai_probability: ImageRating::DEFAULT_PROBABILITY,
        }),
        Step::Demographics => Some(Action::SubmitDemographics(sample_demographics())),
        Step::Complete => None,
    }
}

/// Apply default actions until completion, returning the distinct steps visited
pub fn walk_to_completion<R: rand::Rng>(
    flow: &mut ExperimentFlow<R>,
    catalog: &QuestionCatalog,
) -> Vec<Step> {
    let mut visited = vec![flow.step()];
    while let Some(action) = default_action(flow, catalog) {
        let step = flow.dispatch(action).unwrap();
        if visited.last() != Some(&step) {
            visited.push(step);
        }
    }
    visited
}

/// Record with fixed timestamps, built through the serialized form
pub fn fixture_record(
    responses: &[(u32, u8)],
    ratings: &[(&str, u8, bool)],
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
) -> SessionRecord {
    let value = json!({
        "participantId": "P01HZXTEST",
        "group": "no-pretest-matching",
        "opinionResponses": responses
            .iter()
            .map(|(id, rating)| json!({ "questionId": id, "rating": rating }))
            .collect::<Vec<_>>(),
        "imageRatings": ratings
            .iter()
            .map(|(path, p, ai)| json!({ "imagePath": path, "aiProbability": p, "isActuallyAI": ai }))
            .collect::<Vec<_>>(),
        "demographics": {
            "age": 25,
            "gender": "female",
            "education": "srednie",
            "occupation": ""
        },
        "startTime": start,
        "endTime": end,
    });
    serde_json::from_value(value).unwrap()
}

/// Store that rejects every snapshot; clones share the attempt counter
#[derive(Debug, Clone, Default)]
pub struct FailingStore {
    attempts: Arc<AtomicUsize>,
}

impl FailingStore {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl SessionStore for FailingStore {
    fn save(&self, _record: &SessionRecord) -> Result<(), StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only",
        )))
    }
}
