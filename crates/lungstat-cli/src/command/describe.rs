use anyhow::Context;
use lungstat_analysis::{lung::LungData, report::descriptive_report};

use crate::{command::InputArg, print, util::OutputDir};

pub(crate) const DESCRIPTIVE_TABLE_FILE: &str = "descriptive_table.csv";

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct DescribeArg {
    #[clap(flatten)]
    pub input: InputArg,
}

pub(crate) fn run(arg: &DescribeArg) -> anyhow::Result<()> {
    let data = arg.input.load()?;
    let dir = arg.input.output_dir()?;
    write_descriptive(&data, &dir)
}

/// Builds the descriptive table, prints it and saves it as CSV.
pub(crate) fn write_descriptive(data: &LungData, dir: &OutputDir) -> anyhow::Result<()> {
    let report = descriptive_report(data).context("Failed to build the descriptive table")?;

    print::print_report_table(&report);
    println!();

    let path = dir.save_with(DESCRIPTIVE_TABLE_FILE, |out| report.write_csv(out))?;
    println!("Descriptive table saved to: {}", path.display());
    Ok(())
}
