//! Descriptive and survival analysis of the NCCTG lung-cancer dataset
//!
//! This crate turns the raw patient table into the report artifacts:
//! a descriptive table with one column per patient group, and the survival
//! analyses (Kaplan-Meier, log-rank, Cox regression) with their tabular and
//! JSON summaries.
//!
//! # Overview
//!
//! ## Descriptive Table Workflow
//!
//! 1. **Load Data** ([`lung::LungData`]): Read the CSV, validate the schema and
//!    append derived columns
//! 2. **Select Groups** ([`group::GroupMask`]): All, Male and Female patients
//! 3. **Compute Statistics** ([`table`]): Count, mean (SD), median (IQR) and
//!    category frequencies as labeled fragments
//! 4. **Assemble** ([`report::descriptive_report`]): Stack fragments per
//!    group, then join the groups side by side
//!
//! ## Survival Analysis Workflow
//!
//! 1. **Extract Observations** ([`survival::observations`]): `(time, is_censored)`
//!    pairs per group
//! 2. **Fit Models** ([`survival::SurvivalAnalysis`]): Kaplan-Meier curves,
//!    log-rank test, Cox model and life table
//! 3. **Summarize** ([`survival::SurvivalSummary`]): Serializable digest
//!
//! # Examples
//!
//! ```no_run
//! use lungstat_analysis::{lung::LungData, report::descriptive_report, survival::SurvivalAnalysis};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let data = LungData::load("lung.csv")?;
//!
//! let report = descriptive_report(&data)?;
//! report.write_csv(std::io::stdout())?;
//!
//! let analysis = SurvivalAnalysis::run(&data, 0.05)?;
//! println!("median survival: {:?}", analysis.overall.median());
//! # Ok(())
//! # }
//! ```

pub mod dataset;
pub mod format;
pub mod group;
pub mod lung;
pub mod report;
pub mod survival;
pub mod table;
