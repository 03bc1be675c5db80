use anyhow::Context;
use lungstat_analysis::{
    lung::LungData,
    survival::{SurvivalAnalysis, log_rank_label, write_cox_summary_csv, write_life_table_csv},
};

use crate::{
    command::{DEFAULT_ALPHA, InputArg, parse_alpha},
    plot, print,
    util::OutputDir,
};

pub(crate) const MULTIVARIATE_TABLE_FILE: &str = "multivariate_table.csv";
pub(crate) const SURVIVAL_TABLE_FILE: &str = "survival_table.csv";
pub(crate) const SURVIVAL_SUMMARY_FILE: &str = "survival_summary.json";
pub(crate) const KM_OVERALL_FILE: &str = "km_overall.svg";
pub(crate) const KM_BY_SEX_FILE: &str = "km_by_sex.svg";

/// Life-table rows shown on the console; the CSV holds all of them.
const LIFE_TABLE_PREVIEW_ROWS: usize = 10;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SurvivalArg {
    #[clap(flatten)]
    pub input: InputArg,
    /// Significance level of confidence bands and intervals
    #[arg(long, default_value_t = DEFAULT_ALPHA, value_parser = parse_alpha)]
    pub alpha: f64,
}

impl Default for SurvivalArg {
    fn default() -> Self {
        Self {
            input: InputArg::default(),
            alpha: DEFAULT_ALPHA,
        }
    }
}

pub(crate) fn run(arg: &SurvivalArg) -> anyhow::Result<()> {
    let data = arg.input.load()?;
    let dir = arg.input.output_dir()?;
    write_survival(&data, &dir, arg.alpha)
}

/// Runs the survival analyses, prints their summaries and saves plots,
/// tables and the JSON digest.
pub(crate) fn write_survival(data: &LungData, dir: &OutputDir, alpha: f64) -> anyhow::Result<()> {
    let analysis = SurvivalAnalysis::run(data, alpha).context("Survival analysis failed")?;

    print::print_survival_curves(&analysis);
    println!();
    print::print_log_rank(&analysis);
    println!();
    print::print_cox_summary(&analysis.cox, alpha);
    println!();
    print::print_life_table(&analysis.life_table, LIFE_TABLE_PREVIEW_ROWS);
    println!();

    let overall_path = dir.file_path(KM_OVERALL_FILE);
    plot::km_overall(&overall_path, &analysis.overall)?;
    println!("Kaplan-Meier plot saved to: {}", overall_path.display());

    let by_sex_path = dir.file_path(KM_BY_SEX_FILE);
    plot::km_by_sex(
        &by_sex_path,
        [&analysis.male, &analysis.female],
        &log_rank_label(analysis.log_rank.p_value),
        analysis.overall.curve.max_time,
    )?;
    println!("Kaplan-Meier plot saved to: {}", by_sex_path.display());

    let path = dir.save_with(MULTIVARIATE_TABLE_FILE, |out| {
        write_cox_summary_csv(&analysis.cox, alpha, out)
    })?;
    println!("Cox summary saved to: {}", path.display());

    let path = dir.save_with(SURVIVAL_TABLE_FILE, |out| {
        write_life_table_csv(&analysis.life_table, out)
    })?;
    println!("Life table saved to: {}", path.display());

    let path = dir.save_json(SURVIVAL_SUMMARY_FILE, &analysis.summary())?;
    println!("Survival summary saved to: {}", path.display());

    Ok(())
}
