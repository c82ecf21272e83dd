//! Flow state machine
//!
//! Owns the participant's position (step and stimulus index), the active
//! stimulus lists and the session record. State changes only through
//! [`ExperimentFlow::dispatch`]; a rejected action leaves everything untouched.
//!
//! Step sequence per group:
//!
//! | Group | Steps |
//! |---|---|
//! | `pretest-*` | instructions → pretest → images → demographics → complete |
//! | `no-pretest-*` | instructions → questionnaire → images → demographics → complete |
//! | `all-images-no-questionnaire` | instructions → images → demographics → complete |

use crate::catalog::QuestionCatalog;
use crate::config::StudyConfig;
use crate::error::FlowError;
use crate::random::{assign_group_with, generate_participant_id_with};
use crate::session::SessionRecord;
use crate::stimulus::StimulusSelector;
use crate::store::SessionStore;
use crate::types::{
    Demographics, ExperimentalGroup, ImageRating, ImageStimulus, OpinionResponse,
    ParticipantId, Step,
};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;

const PRETEST_SEQUENCE: &[Step] = &[
    Step::Instructions,
    Step::Pretest,
    Step::Images,
    Step::Demographics,
    Step::Complete,
];

const QUESTIONNAIRE_SEQUENCE: &[Step] = &[
    Step::Instructions,
    Step::Questionnaire,
    Step::Images,
    Step::Demographics,
    Step::Complete,
];

const ALL_IMAGES_SEQUENCE: &[Step] = &[
    Step::Instructions,
    Step::Images,
    Step::Demographics,
    Step::Complete,
];

/// Steps a group visits, in order
#[must_use]
pub fn step_sequence(group: ExperimentalGroup) -> &'static [Step] {
    match group {
        ExperimentalGroup::PretestMatching | ExperimentalGroup::PretestNotMatching => {
            PRETEST_SEQUENCE
        }
        ExperimentalGroup::NoPretestMatching | ExperimentalGroup::NoPretestNotMatching => {
            QUESTIONNAIRE_SEQUENCE
        }
        ExperimentalGroup::AllImagesNoQuestionnaire => ALL_IMAGES_SEQUENCE,
    }
}

/// Step following `from` for a group, `None` at the end or off the route
#[must_use]
pub fn next_step(group: ExperimentalGroup, from: Step) -> Option<Step> {
    let sequence = step_sequence(group);
    sequence
        .iter()
        .position(|s| *s == from)
        .and_then(|i| sequence.get(i + 1))
        .copied()
}

/// Transition request from the front-end
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Consent given, leave the instructions
    Begin,
    /// All questionnaire answers
    SubmitQuestionnaire(Vec<OpinionResponse>),
    /// Rating for the stimulus on screen
    AdvanceStimulus {
        /// Elicited estimate, 0-100
        ai_probability: u8,
    },
    /// Demographic answers
    SubmitDemographics(Demographics),
}

impl Action {
    /// Payload-free tag of the action
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Begin => ActionKind::Begin,
            Self::SubmitQuestionnaire(_) => ActionKind::SubmitQuestionnaire,
            Self::AdvanceStimulus { .. } => ActionKind::AdvanceStimulus,
            Self::SubmitDemographics(_) => ActionKind::SubmitDemographics,
        }
    }
}

/// Tag of an [`Action`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// [`Action::Begin`]
    Begin,
    /// [`Action::SubmitQuestionnaire`]
    SubmitQuestionnaire,
    /// [`Action::AdvanceStimulus`]
    AdvanceStimulus,
    /// [`Action::SubmitDemographics`]
    SubmitDemographics,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Begin => "begin",
            Self::SubmitQuestionnaire => "submit-questionnaire",
            Self::AdvanceStimulus => "advance-stimulus",
            Self::SubmitDemographics => "submit-demographics",
        })
    }
}

/// The one action a step accepts
#[must_use]
pub const fn accepted_action(step: Step) -> Option<ActionKind> {
    match step {
        Step::Instructions => Some(ActionKind::Begin),
        Step::Questionnaire => Some(ActionKind::SubmitQuestionnaire),
        Step::Pretest | Step::Images => Some(ActionKind::AdvanceStimulus),
        Step::Demographics => Some(ActionKind::SubmitDemographics),
        Step::Complete => None,
    }
}

/// Validates that `action` may be dispatched on `step`.
///
/// Dispatching anything else is a contract violation. It is reported as an
/// error; with the `strict-debug` feature it panics instead.
pub fn validate_action(step: Step, action: ActionKind) -> Result<(), FlowError> {
    if accepted_action(step) == Some(action) {
        Ok(())
    } else {
        #[cfg(feature = "strict-debug")]
        panic!("Illegal action attempted: {action} on step {step}");

        Err(FlowError::IllegalAction { step, action })
    }
}

/// Guided flow for one participant
pub struct ExperimentFlow<R = StdRng> {
    step: Step,
    stimulus_index: usize,
    stimuli: Vec<ImageStimulus>,
    pretest_stimuli: Option<Vec<ImageStimulus>>,
    session: SessionRecord,
    selector: StimulusSelector,
    store: Option<Box<dyn SessionStore>>,
    rng: R,
}

impl ExperimentFlow<StdRng> {
    /// Start a session with ambient entropy
    #[must_use]
    pub fn new(config: &StudyConfig, catalog: &QuestionCatalog) -> Self {
        Self::with_rng(
            StimulusSelector::from_config(config, catalog),
            StdRng::from_os_rng(),
        )
    }

    /// Start a reproducible session
    #[must_use]
    pub fn seeded(config: &StudyConfig, catalog: &QuestionCatalog, seed: u64) -> Self {
        Self::with_rng(
            StimulusSelector::from_config(config, catalog),
            StdRng::seed_from_u64(seed),
        )
    }
}

impl<R: Rng> ExperimentFlow<R> {
    /// Start a session, drawing identity and group from `rng`
    #[must_use]
    pub fn with_rng(selector: StimulusSelector, mut rng: R) -> Self {
        let group = assign_group_with(&mut rng);
        Self::with_group(selector, group, rng)
    }

    /// Start a session in a fixed group
    #[must_use]
    pub fn with_group(selector: StimulusSelector, group: ExperimentalGroup, mut rng: R) -> Self {
        let started = Utc::now();
        let participant_id = generate_participant_id_with(&mut rng, started);
        tracing::info!("Session {} started in group {}", participant_id, group);

        Self {
            step: Step::Instructions,
            stimulus_index: 0,
            stimuli: Vec::new(),
            pretest_stimuli: None,
            session: SessionRecord::new(participant_id, group, started),
            selector,
            store: None,
            rng,
        }
    }

    /// With a store receiving a snapshot after every transition
    #[must_use]
    pub fn with_store(mut self, store: Box<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Apply an action, returning the step the flow is on afterwards
    pub fn dispatch(&mut self, action: Action) -> Result<Step, FlowError> {
        let from = self.step;
        let kind = action.kind();
        validate_action(from, kind)?;
        let next = next_step(self.group(), from)
            .ok_or(FlowError::IllegalAction { step: from, action: kind })?;

        match action {
            Action::Begin => self.enter(next),
            Action::SubmitQuestionnaire(responses) => {
                self.session.set_opinion_responses(responses);
                self.enter(next);
            }
            Action::AdvanceStimulus { ai_probability } => self.advance(ai_probability, next),
            Action::SubmitDemographics(demographics) => {
                self.session.set_demographics(demographics);
                let end = self.session.complete(Utc::now());
                self.step = Step::Complete;
                tracing::info!(
                    "Session {} complete at {} ({} ratings)",
                    self.session.participant_id(),
                    end,
                    self.session.image_ratings().len()
                );
            }
        }

        if self.step != from {
            tracing::debug!("{}: {} -> {}", self.session.participant_id(), from, self.step);
        }
        self.persist();
        Ok(self.step)
    }

    fn advance(&mut self, ai_probability: u8, next: Step) {
        let rating = self
            .current_stimulus()
            .map(|stimulus| ImageRating::for_stimulus(stimulus, ai_probability));
        if let Some(rating) = rating {
            self.session.push_rating(rating);
        }
        if self.stimulus_index + 1 >= self.active_stimuli().len() {
            self.enter(next);
        } else {
            self.stimulus_index += 1;
        }
    }

    fn enter(&mut self, step: Step) {
        match step {
            Step::Pretest => {
                if self.pretest_stimuli.is_none() {
                    self.pretest_stimuli = Some(self.selector.pretest(&mut self.rng));
                }
                self.stimulus_index = 0;
            }
            Step::Images => {
                self.stimuli = self.selector.select(
                    self.session.opinion_responses(),
                    self.session.group(),
                    &mut self.rng,
                );
                self.stimulus_index = 0;
                if self.stimuli.is_empty() {
                    tracing::warn!(
                        "Session {} entered images with no stimuli",
                        self.session.participant_id()
                    );
                }
            }
            _ => {}
        }
        self.step = step;
    }

    fn persist(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(&self.session) {
                tracing::warn!(
                    "Failed to persist session {}: {}",
                    self.session.participant_id(),
                    e
                );
            }
        }
    }

    /// Current step
    #[inline]
    #[must_use]
    pub fn step(&self) -> Step {
        self.step
    }

    /// Index into the active stimulus list
    #[inline]
    #[must_use]
    pub fn stimulus_index(&self) -> usize {
        self.stimulus_index
    }

    /// Stimulus list of the current rating step, empty elsewhere
    #[must_use]
    pub fn active_stimuli(&self) -> &[ImageStimulus] {
        match self.step {
            Step::Pretest => self.pretest_stimuli.as_deref().unwrap_or_default(),
            Step::Images => &self.stimuli,
            _ => &[],
        }
    }

    /// Stimulus on screen, `None` when there is nothing to show
    #[must_use]
    pub fn current_stimulus(&self) -> Option<&ImageStimulus> {
        self.active_stimuli().get(self.stimulus_index)
    }

    /// One-based position and total of the current rating step
    #[must_use]
    pub fn progress(&self) -> Option<(usize, usize)> {
        self.current_stimulus()
            .map(|_| (self.stimulus_index + 1, self.active_stimuli().len()))
    }

    /// Main image list as last computed
    #[inline]
    #[must_use]
    pub fn main_stimuli(&self) -> &[ImageStimulus] {
        &self.stimuli
    }

    /// Pretest set, once computed
    #[inline]
    #[must_use]
    pub fn pretest_stimuli(&self) -> Option<&[ImageStimulus]> {
        self.pretest_stimuli.as_deref()
    }

    /// Session record
    #[inline]
    #[must_use]
    pub fn session(&self) -> &SessionRecord {
        &self.session
    }

    /// Assigned group
    #[inline]
    #[must_use]
    pub fn group(&self) -> ExperimentalGroup {
        self.session.group()
    }

    /// Participant identifier
    #[inline]
    #[must_use]
    pub fn participant_id(&self) -> &ParticipantId {
        self.session.participant_id()
    }

    /// Whether the terminal step was reached
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.step == Step::Complete
    }

    /// Give up the flow, keeping the record
    #[must_use]
    pub fn into_session(self) -> SessionRecord {
        self.session
    }
}

impl<R> fmt::Debug for ExperimentFlow<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExperimentFlow")
            .field("step", &self.step)
            .field("stimulus_index", &self.stimulus_index)
            .field("stimuli", &self.stimuli.len())
            .field("participant_id", self.session.participant_id())
            .field("group", &self.session.group())
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
