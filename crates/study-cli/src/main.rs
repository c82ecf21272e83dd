//! `study` - terminal front-end for the AI-image perception study

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use study_core::{step_sequence, ExperimentalGroup, QuestionCatalog, StudyConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod run;
mod simulate;

use run::{run_session, RunOptions};
use simulate::{run_simulator, SimulatorConfig};

fn cli() -> Command {
    Command::new("study")
        .version(study_core::VERSION)
        .about("AI-image perception study")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .env("STUDY_CONFIG")
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log every transition"),
        )
        .subcommand(
            Command::new("run")
                .about("Run one participant interactively")
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("group")
                        .long("group")
                        .value_parser(|s: &str| s.parse::<ExperimentalGroup>())
                        .help("Force an experimental group instead of a random one"),
                ),
        )
        .subcommand(
            Command::new("simulate")
                .about("Run scripted participants with seeded answers")
                .arg(
                    Arg::new("participants")
                        .long("participants")
                        .default_value("10")
                        .value_parser(value_parser!(usize))
                        .help("Number of participants to simulate"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory for one CSV per participant"),
                ),
        )
        .subcommand(Command::new("sequence").about("Print the step sequence of every group"))
        .subcommand(Command::new("catalog").about("Print the active question catalog"))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "study=debug" } else { "study=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load(matches: &ArgMatches) -> Result<(StudyConfig, QuestionCatalog)> {
    let path = matches.get_one::<PathBuf>("config").map(PathBuf::as_path);
    let config = StudyConfig::load_or_default(path).with_context(|| {
        format!(
            "loading configuration from {}",
            path.map_or_else(|| "defaults".to_string(), |p| p.display().to_string())
        )
    })?;
    let catalog = QuestionCatalog::load_or_builtin(config.catalog_path.as_deref())
        .context("loading question catalog")?;
    Ok((config, catalog))
}

fn print_sequences() {
    for group in ExperimentalGroup::ALL {
        let steps: Vec<&str> = step_sequence(group).iter().map(|s| s.as_str()).collect();
        println!("{group:<28} {}", steps.join(" -> "));
    }
}

fn print_catalog(catalog: &QuestionCatalog) {
    for question in catalog.questions() {
        println!("{:>3}. {}", question.id, question.statement);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("verbose"));

    let (config, catalog) = load(&matches)?;

    match matches.subcommand() {
        Some(("run", args)) => {
            let options = RunOptions {
                seed: args.get_one::<u64>("seed").copied(),
                group: args.get_one::<ExperimentalGroup>("group").copied(),
            };
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let outcome =
                run_session(&config, &catalog, options, stdin, tokio::io::stdout()).await?;
            tracing::debug!(
                "Session {} exported to {}",
                outcome.record.participant_id(),
                outcome.csv_path.display()
            );
        }
        Some(("simulate", args)) => {
            let defaults = SimulatorConfig::default();
            let sim = SimulatorConfig {
                seed: args.get_one::<u64>("seed").copied().unwrap_or(defaults.seed),
                participants: args
                    .get_one::<usize>("participants")
                    .copied()
                    .unwrap_or(defaults.participants),
                out: args.get_one::<PathBuf>("out").cloned(),
            };

            println!("Running study simulation...");
            println!("Participants: {}", sim.participants);
            println!("Seed: {}", sim.seed);
            println!();

            let report = run_simulator(&sim, &config, &catalog)?;
            println!("{}", report.generate_text());

            std::process::exit(if report.passed() { 0 } else { 1 });
        }
        Some(("sequence", _)) => print_sequences(),
        Some(("catalog", _)) => print_catalog(&catalog),
        _ => unreachable!("subcommand is required"),
    }

    Ok(())
}
