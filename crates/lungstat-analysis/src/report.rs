//! The descriptive report: one column per patient group.

use crate::{
    dataset::Column,
    group::GroupMask,
    lung::{self, LungData},
    table::{
        self, Fragment, GroupTable, ReportTable, TableError, blank_row, frequency, mean_std,
        median_iqr,
    },
};

/// One step of a report layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Count {
        column: &'static str,
        stat_label: &'static str,
    },
    MeanStd {
        column: &'static str,
        decimals: usize,
        variable_label: &'static str,
        stat_label: &'static str,
    },
    MedianIqr {
        column: &'static str,
        decimals: usize,
        stat_label: &'static str,
    },
    Frequency {
        column: &'static str,
        decimals: usize,
        variable_label: &'static str,
    },
    Blank,
}

const MEAN_SD: &str = "Mean (SD)";
const MEDIAN_IQR: &str = "Median (IQR)";

/// Layout of the descriptive table, applied identically to every group.
pub const DESCRIPTIVE_LAYOUT: &[Statistic] = &[
    Statistic::Count {
        column: lung::TIME,
        stat_label: "Number of patients",
    },
    Statistic::Blank,
    Statistic::MeanStd {
        column: lung::AGE,
        decimals: 1,
        variable_label: "Age",
        stat_label: MEAN_SD,
    },
    Statistic::MedianIqr {
        column: lung::AGE,
        decimals: 1,
        stat_label: MEDIAN_IQR,
    },
    Statistic::Blank,
    Statistic::Frequency {
        column: lung::SEX_RECODE,
        decimals: 1,
        variable_label: "Gender",
    },
    Statistic::Blank,
    Statistic::MeanStd {
        column: lung::WEIGHT_LOSS,
        decimals: 1,
        variable_label: "Weight loss",
        stat_label: MEAN_SD,
    },
    Statistic::Blank,
    Statistic::Frequency {
        column: lung::ECOG_PHYSICIAN,
        decimals: 4,
        variable_label: "ECOG performance (physician)",
    },
    Statistic::Blank,
    Statistic::Frequency {
        column: lung::KARNOFSKY_PHYSICIAN,
        decimals: 4,
        variable_label: "Karnofsky performance (physician)",
    },
    Statistic::Blank,
    Statistic::Frequency {
        column: lung::KARNOFSKY_PATIENT,
        decimals: 4,
        variable_label: "Karnofsky performance (patient)",
    },
    Statistic::Blank,
    Statistic::MeanStd {
        column: lung::MEAL_CALORIES,
        decimals: 1,
        variable_label: "Calories consumed at meals",
        stat_label: MEAN_SD,
    },
    Statistic::MedianIqr {
        column: lung::MEAL_CALORIES,
        decimals: 1,
        stat_label: MEDIAN_IQR,
    },
    Statistic::Blank,
    Statistic::MeanStd {
        column: lung::WEIGHT_LOSS,
        decimals: 1,
        variable_label: "Weight loss in last 6 months",
        stat_label: MEAN_SD,
    },
    Statistic::Blank,
    Statistic::Frequency {
        column: lung::STATUS_RECODE,
        decimals: 1,
        variable_label: "Patient status",
    },
];

impl Statistic {
    /// Computes this step for the rows selected by `mask`.
    pub fn fragment(&self, data: &LungData, mask: &GroupMask) -> Result<Fragment, TableError> {
        let group = mask.name();
        let subset = |name: &str| -> Result<Column, TableError> {
            Ok(data.column(name)?.select(mask)?)
        };
        match *self {
            Self::Count { column, stat_label } => {
                Ok(table::count(&subset(column)?, stat_label, group))
            }
            Self::MeanStd {
                column,
                decimals,
                variable_label,
                stat_label,
            } => mean_std(&subset(column)?, decimals, variable_label, stat_label, group),
            Self::MedianIqr {
                column,
                decimals,
                stat_label,
            } => median_iqr(&subset(column)?, decimals, stat_label, group),
            Self::Frequency {
                column,
                decimals,
                variable_label,
            } => frequency(data.column(column)?, Some(mask), decimals, variable_label, group),
            Self::Blank => Ok(blank_row(group)),
        }
    }
}

/// Applies `layout` to the rows selected by `mask`.
pub fn group_table(
    data: &LungData,
    mask: &GroupMask,
    layout: &[Statistic],
) -> Result<GroupTable, TableError> {
    let fragments = layout
        .iter()
        .map(|statistic| statistic.fragment(data, mask))
        .collect::<Result<Vec<_>, _>>()?;
    let table = GroupTable::concat(mask.name(), fragments)?;
    tracing::debug!(
        group = mask.name(),
        patients = mask.count(),
        rows = table.len(),
        "built group table"
    );
    Ok(table)
}

/// Builds the descriptive table for all patients, males and females.
pub fn descriptive_report(data: &LungData) -> Result<ReportTable, TableError> {
    let tables = data
        .strata()?
        .iter()
        .map(|mask| group_table(data, mask, DESCRIPTIVE_LAYOUT))
        .collect::<Result<Vec<_>, _>>()?;
    let report = ReportTable::join(&tables)?;
    tracing::info!(rows = report.len(), groups = report.groups().len(), "descriptive table ready");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lung::tests::sample;

    fn row<'a>(report: &'a ReportTable, label: &str) -> &'a [String] {
        report
            .rows()
            .find(|(l, _)| *l == label)
            .map(|(_, values)| values)
            .unwrap()
    }

    #[test]
    fn test_report_shape() {
        let data = sample();
        let report = descriptive_report(&data).unwrap();
        assert_eq!(report.groups(), [lung::ALL, lung::MALE, lung::FEMALE]);

        let [all, ..] = data.strata().unwrap();
        let all_table = group_table(&data, &all, DESCRIPTIVE_LAYOUT).unwrap();
        assert_eq!(report.len(), all_table.len());

        let labels = report.rows().map(|(l, _)| l).take(8).collect::<Vec<_>>();
        assert_eq!(
            labels,
            [
                "Number of patients",
                "",
                "Age",
                "N nonmissing",
                "Mean (SD)",
                "Median (IQR)",
                "",
                "Gender",
            ]
        );
        let last = report.rows().last().unwrap();
        assert_eq!(last.0, "Dead");
    }

    #[test]
    fn test_group_sizes_add_up() {
        let data = sample();
        let report = descriptive_report(&data).unwrap();
        let counts = row(&report, "Number of patients")
            .iter()
            .map(|v| v.parse::<usize>().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(counts[0], data.len());
        assert_eq!(counts[1] + counts[2], counts[0]);
    }

    #[test]
    fn test_gender_rows_in_sex_groups() {
        let report = descriptive_report(&sample()).unwrap();
        assert_eq!(row(&report, "Female")[0], "27 (40.0)");
        assert_eq!(row(&report, "Male")[0], "33 (60.0)");
        assert_eq!(row(&report, "Female")[1], "0 (0.0)");
        assert_eq!(row(&report, "Male")[2], "0 (0.0)");
        assert!(row(&report, "Male")[1].ends_with("(100.0)"));
    }

    #[test]
    fn test_missing_categories_are_reported() {
        let report = descriptive_report(&sample()).unwrap();
        // The sample has one missing ph.ecog and one missing pat.karno
        let missing = report
            .rows()
            .filter(|(l, _)| *l == table::MISSING_LABEL)
            .collect::<Vec<_>>();
        assert_eq!(missing.len(), 2);
        assert!(missing.iter().all(|(_, v)| v[0].starts_with("1 (")));
    }

    #[test]
    fn test_csv_output() {
        let report = descriptive_report(&sample()).unwrap();
        let mut out = Vec::new();
        report.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(",All,Male,Female"));
        assert_eq!(lines.count(), report.len());
    }

    #[test]
    fn test_unknown_column_in_layout() {
        let data = sample();
        let [all, ..] = data.strata().unwrap();
        let layout = [Statistic::MeanStd {
            column: "bmi",
            decimals: 1,
            variable_label: "BMI",
            stat_label: MEAN_SD,
        }];
        assert!(matches!(
            group_table(&data, &all, &layout),
            Err(TableError::Column { .. })
        ));
    }
}
