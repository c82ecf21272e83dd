//! Interactive terminal session
//!
//! Renders each step as text, reads answers line by line and only dispatches
//! what the validation drafts accept. Invalid answers are reported and asked
//! again.

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::str::FromStr;
use study_core::validation::{parse_number, validate_probability};
use study_core::{
    Action, DemographicsDraft, Education, ExperimentFlow, ExperimentalGroup, Gender,
    ImageRating, InputError, JsonFileStore, QuestionCatalog, QuestionnaireDraft, SessionRecord,
    StimulusSelector, Step, StudyConfig,
};
use study_export::{write_csv, SessionSummary};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Options of `study run`
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RunOptions {
    /// Seed for group, identifier and shuffles
    pub(crate) seed: Option<u64>,
    /// Fixed group instead of a random one
    pub(crate) group: Option<ExperimentalGroup>,
}

/// Completed session and where its CSV went
#[derive(Debug)]
pub(crate) struct RunOutcome {
    pub(crate) record: SessionRecord,
    pub(crate) csv_path: PathBuf,
}

struct Terminal<I, O> {
    input: I,
    output: O,
}

impl<I, O> Terminal<I, O>
where
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    async fn say(&mut self, text: &str) -> Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await?;
        Ok(())
    }

    async fn prompt(&mut self, text: &str) -> Result<String> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await?;
        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            bail!("input closed before the session completed");
        }
        Ok(line.trim().to_string())
    }

    /// Ask until `parse` accepts the answer
    async fn ask<T>(
        &mut self,
        text: &str,
        parse: impl Fn(&str) -> Result<T, InputError>,
    ) -> Result<T> {
        loop {
            let answer = self.prompt(text).await?;
            match parse(&answer) {
                Ok(value) => return Ok(value),
                Err(e) => self.say(&format!("  Niepoprawna odpowiedź: {e}")).await?,
            }
        }
    }
}

/// Pick an option by its 1-based number or its stored value
fn choose<T>(answer: &str, options: &[T]) -> Result<T, InputError>
where
    T: Copy + FromStr<Err = InputError>,
{
    match answer.parse::<usize>() {
        Ok(n) if (1..=options.len()).contains(&n) => Ok(options[n - 1]),
        _ => answer.parse(),
    }
}

/// Drive one participant through the study on the given streams
pub(crate) async fn run_session<I, O>(
    config: &StudyConfig,
    catalog: &QuestionCatalog,
    options: RunOptions,
    input: I,
    output: O,
) -> Result<RunOutcome>
where
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    let rng = options
        .seed
        .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
    let selector = StimulusSelector::from_config(config, catalog);
    let mut flow = match options.group {
        Some(group) => ExperimentFlow::with_group(selector, group, rng),
        None => ExperimentFlow::with_rng(selector, rng),
    };
    if let Some(dir) = &config.store_dir {
        flow = flow.with_store(Box::new(JsonFileStore::new(dir)));
    }

    let mut term = Terminal { input, output };
    let delay = config.advance_delay();

    while let Some(action) = next_action(&mut term, &flow, config, catalog).await? {
        if matches!(action, Action::AdvanceStimulus { .. }) && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        flow.dispatch(action)?;
    }

    let record = flow.into_session();
    let csv_path = write_csv(&record, &config.export_dir)
        .with_context(|| format!("exporting session {}", record.participant_id()))?;

    term.say("Dziękujemy za udział!").await?;
    term.say(&SessionSummary::from_record(&record).to_string())
        .await?;
    term.say(&format!("Dane zapisano w {}", csv_path.display()))
        .await?;

    Ok(RunOutcome { record, csv_path })
}

async fn next_action<I, O>(
    term: &mut Terminal<I, O>,
    flow: &ExperimentFlow,
    config: &StudyConfig,
    catalog: &QuestionCatalog,
) -> Result<Option<Action>>
where
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    let action = match flow.step() {
        Step::Instructions => {
            term.say("Witamy w naszym badaniu naukowym!").await?;
            term.say("Twoje odpowiedzi są całkowicie anonimowe.").await?;
            term.prompt("Naciśnij Enter, aby rozpocząć. ").await?;
            Action::Begin
        }
        Step::Questionnaire => Action::SubmitQuestionnaire(questionnaire(term, catalog).await?),
        Step::Pretest | Step::Images => {
            let ai_probability = rate_stimulus(term, flow).await?;
            Action::AdvanceStimulus { ai_probability }
        }
        Step::Demographics => Action::SubmitDemographics(demographics(term, config).await?),
        Step::Complete => return Ok(None),
    };
    Ok(Some(action))
}

async fn questionnaire<I, O>(
    term: &mut Terminal<I, O>,
    catalog: &QuestionCatalog,
) -> Result<Vec<study_core::OpinionResponse>>
where
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    term.say("Oceń każde stwierdzenie: 1 = zdecydowanie nie, 4 = zdecydowanie tak.")
        .await?;
    let mut draft = QuestionnaireDraft::new(catalog);
    for question in catalog.questions() {
        term.say(&format!("{}. {}", question.id, question.statement))
            .await?;
        let current = draft.rating(question.id).unwrap_or_default();
        loop {
            let answer = term.prompt(&format!("  Ocena (1-4) [{current}]: ")).await?;
            if answer.is_empty() {
                break;
            }
            match parse_number(&answer).and_then(|r| draft.set(question.id, r)) {
                Ok(()) => break,
                Err(e) => term.say(&format!("  Niepoprawna odpowiedź: {e}")).await?,
            }
        }
    }
    Ok(draft.finish())
}

async fn rate_stimulus<I, O>(term: &mut Terminal<I, O>, flow: &ExperimentFlow) -> Result<u8>
where
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    let (Some(stimulus), Some((n, total))) = (flow.current_stimulus(), flow.progress()) else {
        term.say("Brak zdjęć do oceny.").await?;
        term.prompt("Naciśnij Enter, aby przejść dalej. ").await?;
        return Ok(ImageRating::DEFAULT_PROBABILITY);
    };

    term.say(&format!("Zdjęcie {n} z {total}: {}", stimulus.image_path))
        .await?;
    let default = ImageRating::DEFAULT_PROBABILITY;
    term.ask(
        &format!("  Prawdopodobieństwo AI (0 = na pewno prawdziwe, 100 = na pewno AI) [{default}]: "),
        |answer| {
            if answer.is_empty() {
                Ok(default)
            } else {
                parse_number(answer).and_then(validate_probability)
            }
        },
    )
    .await
}

async fn demographics<I, O>(
    term: &mut Terminal<I, O>,
    config: &StudyConfig,
) -> Result<study_core::Demographics>
where
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    let gender_menu: Vec<String> = Gender::ALL
        .iter()
        .enumerate()
        .map(|(i, g)| format!("  {}) {}", i + 1, g.label()))
        .collect();
    let education_menu: Vec<String> = Education::ALL
        .iter()
        .enumerate()
        .map(|(i, e)| format!("  {}) {}", i + 1, e.label()))
        .collect();

    loop {
        let mut draft = DemographicsDraft::new();
        draft.age = Some(term.ask("Wiek: ", parse_number).await?);

        term.say("Wybierz swoją płeć").await?;
        term.say(&gender_menu.join("\n")).await?;
        draft.gender = Some(term.ask("Płeć: ", |a| choose(a, &Gender::ALL)).await?);

        term.say("Wybierz poziom wykształcenia").await?;
        term.say(&education_menu.join("\n")).await?;
        draft.education = Some(
            term.ask("Wykształcenie: ", |a| choose(a, &Education::ALL))
                .await?,
        );

        match draft.finish(config) {
            Ok(demographics) => return Ok(demographics),
            Err(e) => term.say(&format!("  Niepoprawne dane: {e}")).await?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_test_utils::{fixture_catalog, fixture_config};
    use tokio::io::BufReader;

    fn script(lines: &[&str]) -> BufReader<std::io::Cursor<Vec<u8>>> {
        let mut text = lines.join("\n");
        text.push('\n');
        BufReader::new(std::io::Cursor::new(text.into_bytes()))
    }

    #[test]
    fn choose_by_number_or_value() {
        assert_eq!(choose("2", &Gender::ALL), Ok(Gender::Female));
        assert_eq!(choose("other", &Gender::ALL), Ok(Gender::Other));
        assert!(choose("9", &Gender::ALL).is_err());
        assert_eq!(
            choose("", &Education::ALL),
            Err(InputError::EmptySelection("education"))
        );
    }

    #[tokio::test]
    async fn questionnaire_session_with_corrections() {
        let dir = tempfile::tempdir().unwrap();
        let config = fixture_config()
            .with_export_dir(dir.path().join("out"))
            .with_store_dir(dir.path().join("sessions"));
        let catalog = fixture_catalog();

        let mut lines = vec![
            "",        // begin
            "4",       // question 1
            "x", "1",  // question 2, corrected
            "",        // question 3 keeps the default
        ];
        // three responses, two images each, one out-of-range retry
        lines.extend(["150", "70", "70", "70", "70", "70", "70"]);
        lines.extend(["25", "2", "3"]);

        let mut output = Vec::new();
        let outcome = run_session(
            &config,
            &catalog,
            RunOptions {
                seed: Some(11),
                group: Some(ExperimentalGroup::NoPretestMatching),
            },
            script(&lines),
            &mut output,
        )
        .await
        .unwrap();

        let record = outcome.record;
        assert!(record.is_complete());
        let ratings: Vec<u8> = record.opinion_responses().iter().map(|r| r.rating).collect();
        assert_eq!(ratings, vec![4, 1, 2]);
        assert_eq!(record.image_ratings().len(), 6);
        assert!(record.image_ratings().iter().all(|r| r.ai_probability == 70));
        assert_eq!(record.demographics().unwrap().gender, Gender::Female);
        assert_eq!(record.demographics().unwrap().education, Education::Srednie);

        assert!(outcome.csv_path.exists());
        let stored = JsonFileStore::new(dir.path().join("sessions"))
            .load(record.participant_id())
            .unwrap();
        assert_eq!(stored, record);

        let transcript = String::from_utf8(output).unwrap();
        assert!(transcript.contains("Niepoprawna odpowiedź"));
        assert!(transcript.contains("Zdjęcie 6 z 6"));
    }

    #[tokio::test]
    async fn pretest_session_passes_empty_image_step() {
        let dir = tempfile::tempdir().unwrap();
        let config = fixture_config().with_export_dir(dir.path());
        let mut lines = vec![""];
        lines.extend(["10"; 6]);
        lines.push(""); // nothing to rate
        lines.extend(["12", "1", "1", "40", "1", "1"]); // too young, then retry

        let mut output = Vec::new();
        let outcome = run_session(
            &config,
            &fixture_catalog(),
            RunOptions {
                seed: Some(3),
                group: Some(ExperimentalGroup::PretestNotMatching),
            },
            script(&lines),
            &mut output,
        )
        .await
        .unwrap();

        assert_eq!(outcome.record.image_ratings().len(), 6);
        assert_eq!(outcome.record.demographics().unwrap().age, 40);
        let transcript = String::from_utf8(output).unwrap();
        assert!(transcript.contains("Brak zdjęć do oceny."));
        assert!(transcript.contains("Niepoprawne dane"));
    }

    #[tokio::test]
    async fn closed_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = fixture_config().with_export_dir(dir.path());
        let result = run_session(
            &config,
            &fixture_catalog(),
            RunOptions::default(),
            script(&[""]),
            Vec::<u8>::new(),
        )
        .await;
        assert!(result.is_err());
    }
}
