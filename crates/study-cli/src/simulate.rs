//! Seeded batch simulation
//!
//! Runs scripted participants through the flow with random but reproducible
//! answers. Useful for checking group balance and producing sample exports.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::PathBuf;
use study_core::{
    Action, Demographics, Education, ExperimentFlow, ExperimentalGroup, FlowError, Gender,
    JsonFileStore, OpinionResponse, QuestionCatalog, SessionRecord, StimulusSelector, Step,
    StudyConfig,
};
use study_export::write_csv;

/// Simulator configuration
#[derive(Debug, Clone)]
pub(crate) struct SimulatorConfig {
    /// Random seed for reproducibility
    pub(crate) seed: u64,
    /// Participants to run
    pub(crate) participants: usize,
    /// Directory receiving one CSV per participant
    pub(crate) out: Option<PathBuf>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            participants: 10,
            out: None,
        }
    }
}

/// Final report from the simulator
#[derive(Debug, Clone, Default)]
pub(crate) struct SimulatorReport {
    pub(crate) seed: u64,
    pub(crate) group_counts: BTreeMap<ExperimentalGroup, usize>,
    pub(crate) completed: usize,
    pub(crate) ratings: usize,
    pub(crate) exported: Vec<PathBuf>,
    pub(crate) failures: Vec<String>,
}

impl SimulatorReport {
    /// Every participant reached the end
    pub(crate) fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Generate text report
    pub(crate) fn generate_text(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Study Simulation Report ===\n\n");
        let _ = writeln!(report, "Seed: {}", self.seed);
        let _ = writeln!(report, "Participants Completed: {}", self.completed);
        let _ = writeln!(report, "Images Rated: {}", self.ratings);
        let _ = writeln!(report, "Files Exported: {}", self.exported.len());

        report.push_str("\n=== Groups ===\n");
        for group in ExperimentalGroup::ALL {
            let count = self.group_counts.get(&group).copied().unwrap_or_default();
            let _ = writeln!(report, "{group}: {count}");
        }

        if !self.failures.is_empty() {
            report.push_str("\n=== Failures ===\n");
            for (i, f) in self.failures.iter().enumerate() {
                let _ = writeln!(report, "{}. {}", i + 1, f);
            }
        }

        let _ = writeln!(
            report,
            "\n=== Result: {} ===",
            if self.passed() { "PASS" } else { "FAIL" }
        );
        report
    }
}

/// Random answer a scripted participant gives on the current step
fn scripted_action<R: Rng>(
    step: Step,
    catalog: &QuestionCatalog,
    config: &StudyConfig,
    rng: &mut R,
) -> Option<Action> {
    let action = match step {
        Step::Instructions => Action::Begin,
        Step::Questionnaire => Action::SubmitQuestionnaire(
            catalog
                .ids()
                .map(|id| {
                    let rating = rng.random_range(
                        OpinionResponse::MIN_RATING..=OpinionResponse::MAX_RATING,
                    );
                    OpinionResponse::new(id, rating)
                })
                .collect(),
        ),
        Step::Pretest | Step::Images => Action::AdvanceStimulus {
            ai_probability: rng.random_range(0..=study_core::ImageRating::MAX_PROBABILITY),
        },
        Step::Demographics => Action::SubmitDemographics(Demographics::new(
            rng.random_range(config.min_age..=config.max_age),
            Gender::ALL[rng.random_range(0..Gender::ALL.len())],
            Education::ALL[rng.random_range(0..Education::ALL.len())],
        )),
        Step::Complete => return None,
    };
    Some(action)
}

fn run_participant(
    flow: &mut ExperimentFlow,
    catalog: &QuestionCatalog,
    config: &StudyConfig,
    answers: &mut StdRng,
) -> Result<(), FlowError> {
    while let Some(action) = scripted_action(flow.step(), catalog, config, answers) {
        flow.dispatch(action)?;
    }
    Ok(())
}

/// Run the simulator
pub(crate) fn run_simulator(
    sim: &SimulatorConfig,
    config: &StudyConfig,
    catalog: &QuestionCatalog,
) -> Result<SimulatorReport> {
    let mut rng = StdRng::seed_from_u64(sim.seed);
    let selector = StimulusSelector::from_config(config, catalog);
    let mut report = SimulatorReport {
        seed: sim.seed,
        ..SimulatorReport::default()
    };

    for _ in 0..sim.participants {
        let mut flow = ExperimentFlow::with_rng(selector.clone(), StdRng::seed_from_u64(rng.random()));
        if let Some(dir) = &config.store_dir {
            flow = flow.with_store(Box::new(JsonFileStore::new(dir)));
        }
        *report.group_counts.entry(flow.group()).or_default() += 1;

        if let Err(e) = run_participant(&mut flow, catalog, config, &mut rng) {
            tracing::warn!("Participant {} stopped: {}", flow.participant_id(), e);
            report.failures.push(format!("{}: {e}", flow.participant_id()));
            continue;
        }

        let record: SessionRecord = flow.into_session();
        report.completed += 1;
        report.ratings += record.image_ratings().len();
        if let Some(out) = &sim.out {
            report.exported.push(write_csv(&record, out)?);
        }
    }

    tracing::info!(
        "Simulated {} participants, {} completed",
        sim.participants,
        report.completed
    );
    Ok(report)
}
