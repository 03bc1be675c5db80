use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use lungstat_analysis::lung::LungData;

use crate::{logging, util::OutputDir};

use self::{describe::DescribeArg, run::RunArg, survival::SurvivalArg};

mod describe;
mod run;
mod survival;

const DEFAULT_DATA: &str = "lung.csv";
const DEFAULT_OUTPUT_DIR: &str = "results";
const DEFAULT_ALPHA: f64 = 0.05;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// What to compute; runs every analysis when omitted
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Build the descriptive table of the All, Male and Female groups
    Describe(#[clap(flatten)] DescribeArg),
    /// Fit Kaplan-Meier curves, the log-rank test and the Cox model
    Survival(#[clap(flatten)] SurvivalArg),
    /// Run the descriptive and survival analyses
    Run(#[clap(flatten)] RunArg),
}

/// Input dataset and output location shared by every subcommand.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct InputArg {
    /// Path to the lung dataset CSV file
    #[arg(long, default_value = DEFAULT_DATA)]
    data: PathBuf,
    /// Directory the tables, plots and summaries are written to
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,
}

impl Default for InputArg {
    fn default() -> Self {
        Self {
            data: PathBuf::from(DEFAULT_DATA),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl InputArg {
    pub(crate) fn load(&self) -> anyhow::Result<LungData> {
        LungData::load(&self.data)
            .with_context(|| format!("Failed to load dataset: {}", self.data.display()))
    }

    pub(crate) fn output_dir(&self) -> anyhow::Result<OutputDir> {
        OutputDir::create(&self.output_dir)
    }
}

/// Parses a significance level strictly between 0 and 1.
fn parse_alpha(s: &str) -> Result<f64, String> {
    let alpha = s
        .parse::<f64>()
        .map_err(|e| format!("`{s}` is not a number: {e}"))?;
    if alpha > 0.0 && alpha < 1.0 {
        Ok(alpha)
    } else {
        Err(format!("significance level must be in (0, 1), got {alpha}"))
    }
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    logging::init(args.verbose)?;
    match args.mode.unwrap_or(Mode::Run(RunArg::default())) {
        Mode::Describe(arg) => describe::run(&arg)?,
        Mode::Survival(arg) => survival::run(&arg)?,
        Mode::Run(arg) => run::run(&arg)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_command_definition() {
        CommandArgs::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = CommandArgs::try_parse_from(["lungstat", "survival"]).unwrap();
        let Some(Mode::Survival(arg)) = args.mode else {
            panic!("expected survival mode");
        };
        assert_eq!(arg.input.data, PathBuf::from(DEFAULT_DATA));
        assert_eq!(arg.input.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert!((arg.alpha - DEFAULT_ALPHA).abs() < f64::EPSILON);

        let default = RunArg::default();
        assert_eq!(default.input.data, PathBuf::from(DEFAULT_DATA));
        assert!((default.alpha - DEFAULT_ALPHA).abs() < f64::EPSILON);
    }

    #[test]
    fn test_global_verbosity() {
        let args =
            CommandArgs::try_parse_from(["lungstat", "describe", "--data", "x.csv", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
        assert!(matches!(args.mode, Some(Mode::Describe(_))));
    }

    #[test]
    fn test_alpha_validation() {
        assert_eq!(parse_alpha("0.1"), Ok(0.1));
        assert!(parse_alpha("0").is_err());
        assert!(parse_alpha("1").is_err());
        assert!(parse_alpha("abc").is_err());
        assert!(CommandArgs::try_parse_from(["lungstat", "survival", "--alpha", "1.5"]).is_err());
    }
}
