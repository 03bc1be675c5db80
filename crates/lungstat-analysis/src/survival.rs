//! Survival analysis of the lung dataset
//!
//! Follow-up `time` and the derived `event` column (`1` = death observed)
//! feed three analyses:
//!
//! - Kaplan-Meier curves for all patients and for each sex, with pointwise
//!   confidence bands
//! - a log-rank test of male against female survival
//! - a Cox proportional-hazards model of `sex`, `age` and `wt.loss`, fitted on
//!   the patients whose weight loss is known
//!
//! Observations are passed to the estimators as `(time, is_censored)` pairs.

use std::io;

use lungstat_stats::{
    cox::{CoefficientSummary, CoxData, CoxError, CoxModel, CoxOptions},
    logrank::LogRankTest,
    survival::{KaplanMeierCurve, LifeTable},
};
use serde::Serialize;

use crate::{
    dataset::DatasetError,
    format::display_rounded,
    group::GroupMask,
    lung::{self, LungData},
};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum SurvivalError {
    #[display("invalid input column")]
    Column { source: DatasetError },
    #[display("missing follow-up time at row {row}")]
    MissingTime { row: usize },
    #[display("Cox regression failed")]
    Cox { source: CoxError },
}

impl From<DatasetError> for SurvivalError {
    fn from(source: DatasetError) -> Self {
        Self::Column { source }
    }
}

impl From<CoxError> for SurvivalError {
    fn from(source: CoxError) -> Self {
        Self::Cox { source }
    }
}

/// Regression covariates as `(reported name, source column)`.
pub const COX_COVARIATES: [(&str, &str); 3] = [
    ("sex", lung::SEX_FOR_REGRESSION),
    ("age", lung::AGE),
    ("wt.loss", lung::WEIGHT_LOSS),
];

/// `(time, is_censored)` observations of the rows selected by `mask`.
pub fn observations(data: &LungData, mask: &GroupMask) -> Result<Vec<(f64, bool)>, SurvivalError> {
    let time = data.column(lung::TIME)?;
    let event = data.column(lung::EVENT)?;
    time.check_mask(mask)?;
    let times = time.numeric_options()?;
    let events = event.numeric_options()?;

    times
        .iter()
        .zip(&events)
        .zip(mask.iter())
        .enumerate()
        .filter(|(_, (_, selected))| *selected)
        .map(|(row, ((time, event), _))| {
            let time = time.ok_or(SurvivalError::MissingTime { row })?;
            Ok((time, *event != Some(1.0)))
        })
        .collect()
}

/// A Kaplan-Meier curve of one patient group.
#[derive(Debug, Clone)]
pub struct StratumCurve {
    pub name: String,
    pub curve: KaplanMeierCurve,
    /// Lower confidence bound at each event time.
    pub lower: Vec<f64>,
    /// Upper confidence bound at each event time.
    pub upper: Vec<f64>,
}

impl StratumCurve {
    #[must_use]
    pub fn fit(name: impl Into<String>, observations: Vec<(f64, bool)>, alpha: f64) -> Self {
        let curve = KaplanMeierCurve::from_data(observations);
        let (lower, upper) = curve.confidence_band(alpha);
        Self {
            name: name.into(),
            curve,
            lower,
            upper,
        }
    }

    #[must_use]
    pub fn median(&self) -> Option<f64> {
        self.curve.median_survival()
    }

    #[must_use]
    pub fn events(&self) -> usize {
        self.curve.events.iter().sum()
    }
}

/// Cox model input: complete cases on `wt.loss`.
///
/// Rows with a missing `wt.loss` are dropped. A missing value in any other
/// covariate is an error.
pub fn cox_data(data: &LungData) -> Result<CoxData, SurvivalError> {
    let weight_loss = data.column(lung::WEIGHT_LOSS)?.numeric_options()?;
    let keep = GroupMask::new(
        "complete wt.loss",
        weight_loss.iter().map(Option::is_some).collect(),
    );
    let dropped = data.len() - keep.count();
    if dropped > 0 {
        tracing::warn!(dropped, "dropping rows with missing wt.loss from the Cox model");
    }

    let time = data.column(lung::TIME)?.select(&keep)?.numeric_options()?;
    let event = data.column(lung::EVENT)?.select(&keep)?.numeric_options()?;
    let covariates = COX_COVARIATES
        .iter()
        .map(|(_, column)| data.column(column)?.select(&keep)?.numeric_options())
        .collect::<Result<Vec<_>, _>>()?;

    let rows = (0..keep.count())
        .map(|i| {
            covariates
                .iter()
                .map(|column| column[i].unwrap_or(f64::NAN))
                .collect()
        })
        .collect();
    Ok(CoxData::new(
        COX_COVARIATES.iter().map(|(name, _)| (*name).to_owned()).collect(),
        time.iter().map(|t| t.unwrap_or(f64::NAN)).collect(),
        event.iter().map(|e| *e == Some(1.0)).collect(),
        rows,
    )?)
}

/// Results of every survival analysis.
#[derive(Debug, Clone)]
pub struct SurvivalAnalysis {
    /// Significance level of confidence bands and intervals.
    pub alpha: f64,
    pub overall: StratumCurve,
    pub male: StratumCurve,
    pub female: StratumCurve,
    /// Male against female.
    pub log_rank: LogRankTest,
    pub cox: CoxModel,
    /// Life table of all patients.
    pub life_table: LifeTable,
}

impl SurvivalAnalysis {
    pub fn run(data: &LungData, alpha: f64) -> Result<Self, SurvivalError> {
        let [all, male, female] = data.strata()?;

        tracing::info!("fitting Kaplan-Meier curves");
        let all_obs = observations(data, &all)?;
        let male_obs = observations(data, &male)?;
        let female_obs = observations(data, &female)?;
        let life_table = LifeTable::from_events(&all_obs);
        let log_rank = LogRankTest::compute(&male_obs, &female_obs);

        let overall = StratumCurve::fit(all.name(), all_obs, alpha);
        let male = StratumCurve::fit(male.name(), male_obs, alpha);
        let female = StratumCurve::fit(female.name(), female_obs, alpha);
        for curve in [&overall, &male, &female] {
            tracing::debug!(
                group = %curve.name,
                observations = curve.curve.observations,
                events = curve.events(),
                median = ?curve.median(),
                "Kaplan-Meier curve"
            );
        }
        tracing::info!(p_value = log_rank.p_value, "log-rank test");

        tracing::info!("fitting Cox proportional-hazards model");
        let cox = CoxModel::fit(&cox_data(data)?, &CoxOptions::default())?;
        tracing::info!(
            iterations = cox.iterations,
            log_likelihood = cox.log_likelihood,
            "Cox model converged"
        );

        Ok(Self {
            alpha,
            overall,
            male,
            female,
            log_rank,
            cox,
            life_table,
        })
    }

    #[must_use]
    pub fn summary(&self) -> SurvivalSummary {
        SurvivalSummary::new(self)
    }
}

/// Plot annotation of a log-rank p-value, rounded to 4 places.
///
/// ```
/// # use lungstat_analysis::survival::log_rank_label;
/// assert_eq!(log_rank_label(0.001_311), "log-rank p=0.0013");
/// assert_eq!(log_rank_label(0.5), "log-rank p=0.5");
/// ```
#[must_use]
pub fn log_rank_label(p_value: f64) -> String {
    format!("log-rank p={}", display_rounded(p_value, 4))
}

/// Confidence level as a whole percentage, `95` for `alpha = 0.05`.
#[must_use]
pub fn confidence_percent(alpha: f64) -> String {
    format!("{:.0}", 100.0 * (1.0 - alpha))
}

/// Header of the coefficient table written by [`write_cox_summary_csv`].
#[must_use]
pub fn cox_summary_header(alpha: f64) -> Vec<String> {
    let level = confidence_percent(alpha);
    vec![
        "covariate".to_owned(),
        "coef".to_owned(),
        "exp(coef)".to_owned(),
        "se(coef)".to_owned(),
        format!("coef lower {level}%"),
        format!("coef upper {level}%"),
        format!("exp(coef) lower {level}%"),
        format!("exp(coef) upper {level}%"),
        "cmp to".to_owned(),
        "z".to_owned(),
        "p".to_owned(),
        "-log2(p)".to_owned(),
    ]
}

/// Writes one row per covariate of the Cox model.
pub fn write_cox_summary_csv<W: io::Write>(
    model: &CoxModel,
    alpha: f64,
    writer: W,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(cox_summary_header(alpha))?;
    for row in model.summary(alpha) {
        let numbers = [
            row.coef,
            row.exp_coef,
            row.se_coef,
            row.coef_lower,
            row.coef_upper,
            row.exp_coef_lower,
            row.exp_coef_upper,
            row.cmp_to,
            row.z,
            row.p,
            row.neg_log2_p,
        ];
        writer.write_record(
            std::iter::once(row.covariate.clone()).chain(numbers.iter().map(f64::to_string)),
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the life table, one row per distinct time.
pub fn write_life_table_csv<W: io::Write>(table: &LifeTable, writer: W) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record([
        "event_at", "removed", "observed", "censored", "entrance", "at_risk",
    ])?;
    for row in &table.rows {
        writer.write_record([
            row.event_at.to_string(),
            row.removed.to_string(),
            row.observed.to_string(),
            row.censored.to_string(),
            row.entrance.to_string(),
            row.at_risk.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Machine-readable digest of a [`SurvivalAnalysis`].
#[derive(Debug, Clone, Serialize)]
pub struct SurvivalSummary {
    pub alpha: f64,
    pub curves: Vec<CurveSummary>,
    pub log_rank: LogRankSummary,
    pub cox: CoxSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurveSummary {
    pub group: String,
    pub observations: usize,
    pub events: usize,
    pub median_survival: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogRankSummary {
    pub groups: [String; 2],
    pub test_statistic: f64,
    pub degrees_of_freedom: f64,
    pub p_value: f64,
    pub observed: [usize; 2],
    pub expected: [f64; 2],
}

#[derive(Debug, Clone, Serialize)]
pub struct CoxSummary {
    pub observations: usize,
    pub events: usize,
    pub iterations: usize,
    pub log_likelihood: f64,
    pub null_log_likelihood: f64,
    pub partial_aic: f64,
    pub concordance: f64,
    pub likelihood_ratio_statistic: f64,
    pub likelihood_ratio_df: usize,
    pub likelihood_ratio_p_value: f64,
    pub coefficients: Vec<CoefficientRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoefficientRow {
    pub covariate: String,
    pub coef: f64,
    pub exp_coef: f64,
    pub se_coef: f64,
    pub coef_lower: f64,
    pub coef_upper: f64,
    pub exp_coef_lower: f64,
    pub exp_coef_upper: f64,
    pub z: f64,
    pub p: f64,
}

impl From<CoefficientSummary> for CoefficientRow {
    fn from(row: CoefficientSummary) -> Self {
        Self {
            covariate: row.covariate,
            coef: row.coef,
            exp_coef: row.exp_coef,
            se_coef: row.se_coef,
            coef_lower: row.coef_lower,
            coef_upper: row.coef_upper,
            exp_coef_lower: row.exp_coef_lower,
            exp_coef_upper: row.exp_coef_upper,
            z: row.z,
            p: row.p,
        }
    }
}

impl SurvivalSummary {
    fn new(analysis: &SurvivalAnalysis) -> Self {
        let curves = [&analysis.overall, &analysis.male, &analysis.female]
            .into_iter()
            .map(|c| CurveSummary {
                group: c.name.clone(),
                observations: c.curve.observations,
                events: c.events(),
                median_survival: c.median(),
            })
            .collect();

        let test = &analysis.log_rank;
        let log_rank = LogRankSummary {
            groups: [analysis.male.name.clone(), analysis.female.name.clone()],
            test_statistic: test.test_statistic,
            degrees_of_freedom: test.degrees_of_freedom,
            p_value: test.p_value,
            observed: [test.observed_a, test.observed_b],
            expected: [test.expected_a, test.expected_b],
        };

        let model = &analysis.cox;
        let lr = model.likelihood_ratio_test();
        let cox = CoxSummary {
            observations: model.observations,
            events: model.events,
            iterations: model.iterations,
            log_likelihood: model.log_likelihood,
            null_log_likelihood: model.null_log_likelihood,
            partial_aic: model.partial_aic(),
            concordance: model.concordance,
            likelihood_ratio_statistic: lr.test_statistic,
            likelihood_ratio_df: lr.degrees_of_freedom,
            likelihood_ratio_p_value: lr.p_value,
            coefficients: model
                .summary(analysis.alpha)
                .into_iter()
                .map(CoefficientRow::from)
                .collect(),
        };

        Self {
            alpha: analysis.alpha,
            curves,
            log_rank,
            cox,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dataset::Dataset, lung::tests::sample};

    #[test]
    fn test_observations_follow_event_coding() {
        let csv = "time,status,sex,age,wt.loss,ph.ecog,ph.karno,pat.karno,meal.cal\n\
                   10,2,1,60,1,0,90,90,1000\n\
                   20,1,2,61,2,1,80,80,900\n\
                   30,2,2,62,3,2,70,70,900\n";
        let data = LungData::from_dataset(Dataset::from_reader(csv.as_bytes()).unwrap()).unwrap();
        let [all, male, female] = data.strata().unwrap();
        assert_eq!(
            observations(&data, &all).unwrap(),
            [(10.0, false), (20.0, true), (30.0, false)]
        );
        assert_eq!(observations(&data, &male).unwrap(), [(10.0, false)]);
        assert_eq!(observations(&data, &female).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_time_is_error() {
        let csv = "time,status,sex,age,wt.loss,ph.ecog,ph.karno,pat.karno,meal.cal\n\
                   10,2,1,60,1,0,90,90,1000\n\
                   NA,1,2,61,2,1,80,80,900\n";
        let data = LungData::from_dataset(Dataset::from_reader(csv.as_bytes()).unwrap()).unwrap();
        let [all, ..] = data.strata().unwrap();
        assert!(matches!(
            observations(&data, &all),
            Err(SurvivalError::MissingTime { row: 1 })
        ));
    }

    #[test]
    fn test_cox_data_drops_missing_weight_loss() {
        let data = sample();
        let cox = cox_data(&data).unwrap();
        // Two rows of the sample lack wt.loss
        assert_eq!(cox.len(), data.len() - 2);
        assert_eq!(cox.names(), ["sex", "age", "wt.loss"]);
    }

    #[test]
    fn test_cox_data_rejects_other_missing_covariates() {
        let csv = "time,status,sex,age,wt.loss,ph.ecog,ph.karno,pat.karno,meal.cal\n\
                   10,2,1,60,1,0,90,90,1000\n\
                   20,2,2,NA,2,1,80,80,900\n";
        let data = LungData::from_dataset(Dataset::from_reader(csv.as_bytes()).unwrap()).unwrap();
        assert!(matches!(
            cox_data(&data),
            Err(SurvivalError::Cox {
                source: CoxError::NonFiniteValue { row: 1, .. }
            })
        ));
    }

    #[test]
    fn test_full_analysis_on_sample() {
        let data = sample();
        let analysis = SurvivalAnalysis::run(&data, 0.05).unwrap();
        assert_eq!(analysis.overall.curve.observations, data.len());
        assert_eq!(
            analysis.male.curve.observations + analysis.female.curve.observations,
            data.len()
        );
        assert_eq!(
            analysis.overall.events(),
            analysis.male.events() + analysis.female.events()
        );
        assert!((0.0..=1.0).contains(&analysis.log_rank.p_value));
        assert_eq!(analysis.cox.coefficients.len(), 3);
        assert!(analysis.cox.log_likelihood >= analysis.cox.null_log_likelihood);

        let removed: usize = analysis.life_table.rows.iter().map(|r| r.removed).sum();
        assert_eq!(removed, data.len());

        let summary = analysis.summary();
        assert_eq!(summary.curves.len(), 3);
        assert_eq!(summary.cox.coefficients.len(), 3);
        assert_eq!(summary.log_rank.groups, ["Male", "Female"]);
    }

    #[test]
    fn test_cox_summary_csv_header() {
        let analysis = SurvivalAnalysis::run(&sample(), 0.05).unwrap();
        let mut out = Vec::new();
        write_cox_summary_csv(&analysis.cox, analysis.alpha, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some(
                "covariate,coef,exp(coef),se(coef),coef lower 95%,coef upper 95%,\
                 exp(coef) lower 95%,exp(coef) upper 95%,cmp to,z,p,-log2(p)"
            )
        );
        let covariates = lines
            .map(|l| l.split(',').next().unwrap().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(covariates, ["sex", "age", "wt.loss"]);
    }

    #[test]
    fn test_life_table_csv() {
        let table = LifeTable::from_events(&[(5.0, false), (5.0, true), (8.0, false)]);
        let mut out = Vec::new();
        write_life_table_csv(&table, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "event_at,removed,observed,censored,entrance,at_risk\n\
             0,0,0,0,3,3\n\
             5,2,1,1,0,3\n\
             8,1,1,0,0,1\n"
        );
    }

    #[test]
    fn test_confidence_percent() {
        assert_eq!(confidence_percent(0.05), "95");
        assert_eq!(confidence_percent(0.1), "90");
    }
}
