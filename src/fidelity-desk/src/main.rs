//! Fidelity Desk — staff tooling around the rule evaluation engine.
//!
//! Reads scenario and reward JSON files, runs the engine (or the
//! expiry sweep, or the progress projection) and prints the result as
//! JSON, so reception staff tooling and cron jobs share one entry
//! point.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::info;

use fidelity_core::catalog::{CatalogEntry, StaticCatalog};
use fidelity_core::config::AppConfig;
use fidelity_core::reward::Reward;
use fidelity_core::rules::RuleRecord;
use fidelity_core::types::{Appointment, ClientState};
use fidelity_core::{FidelityError, FidelityResult};
use fidelity_loyalty::{apply_completed, project, EvaluationContext, FidelityEngine};
use fidelity_rewards::RewardStore;

#[derive(Parser, Debug)]
#[command(name = "fidelity-desk")]
#[command(about = "Loyalty rule evaluation tooling for the reception desk")]
#[command(version)]
struct Cli {
    /// TOML config file (env vars with prefix FIDELITY_DESK__ win)
    #[arg(long, env = "FIDELITY_DESK_CONFIG")]
    config: Option<String>,

    /// Directory scenario files are resolved against (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate one completed appointment against the configured rules
    Evaluate {
        /// Scenario JSON: catalog, rules, before-state, appointment,
        /// prior completed appointments
        scenario: PathBuf,
    },
    /// Expire available rewards past their date
    Sweep {
        /// Rewards JSON (array of reward objects)
        rewards: PathBuf,
        /// Sweep date, ISO format (yyyy-mm-dd)
        #[arg(long)]
        today: NaiveDate,
    },
    /// Show progress toward each rule's next threshold
    Progress {
        scenario: PathBuf,
    },
}

/// Input file for `evaluate` and `progress`.
#[derive(Debug, Deserialize)]
struct Scenario {
    catalog: Vec<CatalogEntry>,
    rules: Vec<RuleRecord>,
    client_before: ClientState,
    appointment: Appointment,
    #[serde(default)]
    prior_completed: Vec<Appointment>,
}

fn load_json<T: serde::de::DeserializeOwned>(dir: &Path, file: &Path) -> FidelityResult<T> {
    let path = dir.join(file);
    let raw = std::fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())
        .map_err(|e| FidelityError::Config(e.to_string()))?;

    let subscriber = tracing_subscriber::fmt().with_env_filter(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "fidelity_desk=info".into()),
    );
    if config.desk.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| PathBuf::from(&config.desk.data_dir));

    match cli.command {
        Command::Evaluate { scenario } => {
            let scenario: Scenario = load_json(&data_dir, &scenario)
                .with_context(|| format!("loading scenario {}", scenario.display()))?;
            let catalog = StaticCatalog::new(scenario.catalog);
            let engine = FidelityEngine::new(&config.engine);

            let after = apply_completed(&scenario.client_before, &scenario.appointment);
            let rewards = engine.evaluate(
                &EvaluationContext {
                    appointment: &scenario.appointment,
                    before: &scenario.client_before,
                    after: &after,
                    prior_completed: &scenario.prior_completed,
                    rules: &scenario.rules,
                },
                &catalog,
            );

            info!(count = rewards.len(), "Evaluation finished");
            println!("{}", serde_json::to_string_pretty(&rewards)?);
        }
        Command::Sweep { rewards, today } => {
            let rewards: Vec<Reward> = load_json(&data_dir, &rewards)
                .with_context(|| format!("loading rewards {}", rewards.display()))?;
            let store = RewardStore::new();
            for reward in rewards {
                store.insert(reward);
            }

            let expired = store.expire_due(today);
            info!(expired, %today, "Sweep finished");
            println!("{}", serde_json::to_string_pretty(&store.status_counts())?);
        }
        Command::Progress { scenario } => {
            let scenario: Scenario = load_json(&data_dir, &scenario)
                .with_context(|| format!("loading scenario {}", scenario.display()))?;
            let catalog = StaticCatalog::new(scenario.catalog);

            let rows = project(
                &scenario.rules,
                &scenario.client_before,
                &scenario.prior_completed,
                &catalog,
                config.engine.default_validity_days,
            );
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }

    Ok(())
}
