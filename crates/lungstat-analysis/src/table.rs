//! Building blocks of the descriptive report table.
//!
//! Each builder computes one statistic for one group and returns a
//! [`Fragment`]: an ordered list of `(row label, formatted value)` pairs
//! tagged with the group name. A group's fragments are stacked into a
//! [`GroupTable`], and the group tables are joined side by side into a
//! [`ReportTable`].
//!
//! ```text
//!                        All           Male          Female
//! Number of patients     228           138           90
//!                        ""            ""            ""        <- blank_row
//! Age                    ""            ""            ""        <- mean_std
//! N nonmissing           228           138           90
//! Mean (SD)              62.4 (9.1)    63.3 (9.1)    61.1 (8.9)
//! ```
//!
//! Joining requires every group table to carry the same row labels in the
//! same order. [`frequency`] enumerates categories from the unfiltered
//! column so this holds even when a group lacks some category.

use std::{fmt, io};

use lungstat_stats::{descriptive::DescriptiveStats, percentiles::Percentiles};

use crate::{
    dataset::{Cell, Column, ColumnKind, DatasetError},
    format::{display_float, display_rounded, round_half_even},
    group::GroupMask,
};

/// Row label of the non-missing count emitted by [`mean_std`].
pub const NONMISSING_LABEL: &str = "N nonmissing";
/// Row label of the missing-value category emitted by [`frequency`].
pub const MISSING_LABEL: &str = "Missing";

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum TableError {
    #[display("invalid input column")]
    Column { source: DatasetError },
    #[display("fragment of group '{found}' cannot join table of group '{expected}'")]
    GroupMismatch { expected: String, found: String },
    #[display("group '{group}' appears more than once")]
    DuplicateGroup { group: String },
    #[display("group '{group}' has {found} rows, expected {expected}")]
    RowCount {
        group: String,
        expected: usize,
        found: usize,
    },
    #[display("group '{group}' row {row} is labeled '{found}', expected '{expected}'")]
    RowMisalignment {
        group: String,
        row: usize,
        expected: String,
        found: String,
    },
    #[display("no group tables to join")]
    NoGroups,
}

impl From<DatasetError> for TableError {
    fn from(source: DatasetError) -> Self {
        Self::Column { source }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub label: String,
    pub value: String,
}

impl Row {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// A row with an empty value, used for section headers.
    pub fn header(label: impl Into<String>) -> Self {
        Self::new(label, "")
    }
}

/// Rows produced by one statistic for one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    group: String,
    rows: Vec<Row>,
}

impl Fragment {
    pub fn new(group: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            group: group.into(),
            rows,
        }
    }

    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.label.as_str())
    }

    /// Value of the first row labeled `label`.
    #[must_use]
    pub fn value(&self, label: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|r| r.label == label)
            .map(|r| r.value.as_str())
    }
}

/// Number of rows in `column`, which the caller has already restricted to
/// the group.
///
/// ```
/// # use lungstat_analysis::{dataset::Column, table::count};
/// let time = Column::numeric("time", [Some(306.0), None, Some(1022.0)]);
/// let fragment = count(&time, "Number of patients", "All");
/// assert_eq!(fragment.value("Number of patients"), Some("3"));
/// ```
#[must_use]
pub fn count(column: &Column, stat_label: &str, group_name: &str) -> Fragment {
    Fragment::new(group_name, vec![Row::new(stat_label, column.len().to_string())])
}

/// Mean and sample standard deviation of the non-missing values.
///
/// Produces three rows: a blank header `variable_label`, the non-missing
/// count as `N nonmissing`, and `"<mean> (<sd>)"` under `stat_label`, with
/// both numbers rounded to `decimals`. Undefined statistics display as `nan`.
///
/// ```
/// # use lungstat_analysis::{dataset::Column, table::mean_std};
/// let age = Column::numeric("age", [Some(74.0), Some(68.0), None, Some(56.0)]);
/// let fragment = mean_std(&age, 1, "Age", "Mean (SD)", "All").unwrap();
/// let labels = fragment.labels().collect::<Vec<_>>();
/// assert_eq!(labels, ["Age", "N nonmissing", "Mean (SD)"]);
/// assert_eq!(fragment.value("Age"), Some(""));
/// assert_eq!(fragment.value("N nonmissing"), Some("3"));
/// assert_eq!(fragment.value("Mean (SD)"), Some("66.0 (9.2)"));
/// ```
pub fn mean_std(
    column: &Column,
    decimals: usize,
    variable_label: &str,
    stat_label: &str,
    group_name: &str,
) -> Result<Fragment, TableError> {
    let stats = DescriptiveStats::new(column.numeric_values()?);
    let mean = display_rounded(stats.mean, decimals);
    let std_dev = display_rounded(stats.std_dev, decimals);
    Ok(Fragment::new(
        group_name,
        vec![
            Row::header(variable_label),
            Row::new(NONMISSING_LABEL, stats.count.to_string()),
            Row::new(stat_label, format!("{mean} ({std_dev})")),
        ],
    ))
}

/// Median with the interquartile range, `"<median> (<q25>, <q75>)"`.
///
/// Only the median is rounded to `decimals`; the quartiles are shown at full
/// precision.
///
/// ```
/// # use lungstat_analysis::{dataset::Column, table::median_iqr};
/// let values = Column::numeric("x", [Some(10.0), Some(20.0), Some(30.0), Some(40.0)]);
/// let fragment = median_iqr(&values, 1, "Median (IQR)", "All").unwrap();
/// assert_eq!(fragment.value("Median (IQR)"), Some("25.0 (17.5, 32.5)"));
/// ```
pub fn median_iqr(
    column: &Column,
    decimals: usize,
    stat_label: &str,
    group_name: &str,
) -> Result<Fragment, TableError> {
    let percentiles = Percentiles::new(&column.numeric_values()?, &[25.0, 50.0, 75.0]);
    let at = |p| percentiles.get(p).unwrap_or(f64::NAN);
    let value = format!(
        "{} ({}, {})",
        display_rounded(at(50.0), decimals),
        display_float(at(25.0)),
        display_float(at(75.0)),
    );
    Ok(Fragment::new(group_name, vec![Row::new(stat_label, value)]))
}

/// A distinct value of a column, as enumerated by [`frequency`].
#[derive(Debug, Clone, PartialEq)]
enum Category {
    Number(f64),
    Text(String),
    Missing,
}

impl Category {
    fn matches(&self, cell: &Cell) -> bool {
        match (self, cell) {
            (Self::Number(a), Cell::Numeric(b)) => a == b,
            (Self::Text(a), Cell::Categorical(b)) => a == b,
            (Self::Missing, Cell::Missing) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => f.write_str(&display_float(*value)),
            Self::Text(value) => f.write_str(value),
            Self::Missing => f.write_str(MISSING_LABEL),
        }
    }
}

/// Distinct values of `column` in display order: numbers ascending, text
/// lexicographically, missing last.
fn categories(column: &Column) -> Vec<Category> {
    let mut categories = match column.kind() {
        ColumnKind::Numeric => {
            let mut values = column.cells().iter().filter_map(Cell::as_f64).collect::<Vec<_>>();
            values.sort_by(f64::total_cmp);
            values.dedup();
            values.into_iter().map(Category::Number).collect::<Vec<_>>()
        }
        ColumnKind::Categorical => {
            let mut values = column.cells().iter().filter_map(Cell::as_str).collect::<Vec<_>>();
            values.sort_unstable();
            values.dedup();
            values
                .into_iter()
                .map(|v| Category::Text(v.to_owned()))
                .collect()
        }
    };
    if column.cells().iter().any(Cell::is_missing) {
        categories.push(Category::Missing);
    }
    categories
}

/// Count and percentage of every category among the rows selected by
/// `filter` (all rows when `None`).
///
/// Categories are taken from the whole column, so every group gets the same
/// rows; a category the group lacks shows `0 (0.0)`. Missing values form
/// their own `Missing` category. The percentage is the proportion rounded
/// to `decimals` and then multiplied by 100, without rounding again, so
/// `decimals` counts places of the proportion rather than of the percentage.
/// A filter selecting no rows yields `0 (nan)` for every category.
///
/// ```
/// # use lungstat_analysis::{dataset::Column, table::frequency};
/// let sex = Column::categorical(
///     "sex_recode",
///     ["Male", "Male", "Male", "Female", "Female"].map(Some),
/// );
/// let fragment = frequency(&sex, None, 1, "Gender", "All").unwrap();
/// let rows = fragment
///     .rows()
///     .iter()
///     .map(|r| (r.label.as_str(), r.value.as_str()))
///     .collect::<Vec<_>>();
/// assert_eq!(rows, [("Gender", ""), ("Female", "2 (40.0)"), ("Male", "3 (60.0)")]);
/// ```
#[expect(clippy::cast_precision_loss)]
pub fn frequency(
    column: &Column,
    filter: Option<&GroupMask>,
    decimals: usize,
    variable_label: &str,
    group_name: &str,
) -> Result<Fragment, TableError> {
    let selected = match filter {
        Some(mask) => {
            column.check_mask(mask)?;
            mask.apply(column.cells()).collect::<Vec<_>>()
        }
        None => column.cells().iter().collect(),
    };
    let total = selected.len();

    let mut rows = vec![Row::header(variable_label)];
    for category in categories(column) {
        let n = selected.iter().filter(|cell| category.matches(cell)).count();
        let percent = if total == 0 {
            f64::NAN
        } else {
            round_half_even(n as f64 / total as f64, decimals) * 100.0
        };
        rows.push(Row::new(
            category.to_string(),
            format!("{n} ({})", display_float(percent)),
        ));
    }
    Ok(Fragment::new(group_name, rows))
}

/// Separator row with an empty label and an empty value.
#[must_use]
pub fn blank_row(group_name: &str) -> Fragment {
    Fragment::new(group_name, vec![Row::header("")])
}

/// Fragments of one group stacked in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupTable {
    group: String,
    rows: Vec<Row>,
}

impl GroupTable {
    /// Stacks `fragments`, all of which must belong to `group`.
    pub fn concat<I>(group: impl Into<String>, fragments: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = Fragment>,
    {
        let group = group.into();
        let mut rows = Vec::new();
        for fragment in fragments {
            if fragment.group != group {
                return Err(TableError::GroupMismatch {
                    expected: group,
                    found: fragment.group,
                });
            }
            rows.extend(fragment.rows);
        }
        Ok(Self { group, rows })
    }

    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Group tables joined side by side, one column per group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTable {
    groups: Vec<String>,
    labels: Vec<String>,
    /// `values[row][group]`
    values: Vec<Vec<String>>,
}

impl ReportTable {
    /// Joins group tables by row position.
    ///
    /// Every table must have the same row labels in the same order as the
    /// first one; labels may repeat. Group names must be distinct.
    pub fn join(tables: &[GroupTable]) -> Result<Self, TableError> {
        let first = tables.first().ok_or(TableError::NoGroups)?;
        let mut groups = Vec::with_capacity(tables.len());
        for table in tables {
            if groups.contains(&table.group) {
                return Err(TableError::DuplicateGroup {
                    group: table.group.clone(),
                });
            }
            if table.len() != first.len() {
                return Err(TableError::RowCount {
                    group: table.group.clone(),
                    expected: first.len(),
                    found: table.len(),
                });
            }
            if let Some((row, (expected, found))) = first
                .rows
                .iter()
                .zip(&table.rows)
                .enumerate()
                .find(|(_, (a, b))| a.label != b.label)
            {
                return Err(TableError::RowMisalignment {
                    group: table.group.clone(),
                    row,
                    expected: expected.label.clone(),
                    found: found.label.clone(),
                });
            }
            groups.push(table.group.clone());
        }

        let labels = first.rows.iter().map(|r| r.label.clone()).collect();
        let values = (0..first.len())
            .map(|i| tables.iter().map(|t| t.rows[i].value.clone()).collect())
            .collect();
        Ok(Self {
            groups,
            labels,
            values,
        })
    }

    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Rows as `(label, values per group)`.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.labels
            .iter()
            .zip(&self.values)
            .map(|(label, values)| (label.as_str(), values.as_slice()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Writes the table as CSV with an unnamed label column.
    ///
    /// ```
    /// # use lungstat_analysis::table::{GroupTable, ReportTable, blank_row, Fragment, Row};
    /// let tables = ["All", "Male"].map(|g| {
    ///     GroupTable::concat(g, [Fragment::new(g, vec![Row::new("n", "1")]), blank_row(g)]).unwrap()
    /// });
    /// let report = ReportTable::join(&tables).unwrap();
    /// let mut out = Vec::new();
    /// report.write_csv(&mut out).unwrap();
    /// assert_eq!(String::from_utf8(out).unwrap(), ",All,Male\nn,1,1\n,,\n");
    /// ```
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(std::iter::once("").chain(self.groups.iter().map(String::as_str)))?;
        for (label, values) in self.rows() {
            writer.write_record(std::iter::once(label).chain(values.iter().map(String::as_str)))?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng as _, SeedableRng as _};
    use rand_pcg::Pcg64Mcg;

    use super::*;

    fn values(fragment: &Fragment) -> Vec<(&str, &str)> {
        fragment
            .rows()
            .iter()
            .map(|r| (r.label.as_str(), r.value.as_str()))
            .collect()
    }

    fn random_mask(rng: &mut Pcg64Mcg, name: &str, len: usize) -> GroupMask {
        GroupMask::new(name, (0..len).map(|_| rng.random_bool(0.5)).collect())
    }

    fn random_ecog(rng: &mut Pcg64Mcg, len: usize) -> Column {
        Column::numeric(
            "ph.ecog",
            (0..len).map(|_| {
                let v = rng.random_range(0..5);
                (v < 4).then_some(f64::from(v))
            }),
        )
    }

    #[test]
    fn test_empty_group() {
        let age = Column::numeric("age", [Some(70.0), Some(60.0)]);
        let none = GroupMask::new("None", vec![false, false]);
        let subset = age.select(&none).unwrap();

        assert_eq!(count(&subset, "Number of patients", "None").value("Number of patients"), Some("0"));

        let fragment = mean_std(&subset, 1, "Age", "Mean (SD)", "None").unwrap();
        assert_eq!(fragment.value("N nonmissing"), Some("0"));
        assert_eq!(fragment.value("Mean (SD)"), Some("nan (nan)"));

        let fragment = median_iqr(&subset, 1, "Median (IQR)", "None").unwrap();
        assert_eq!(fragment.value("Median (IQR)"), Some("nan (nan, nan)"));

        let fragment = frequency(&age, Some(&none), 1, "Age", "None").unwrap();
        assert_eq!(
            values(&fragment),
            [("Age", ""), ("60.0", "0 (nan)"), ("70.0", "0 (nan)")]
        );
    }

    #[test]
    fn test_single_value_has_nan_sd() {
        let column = Column::numeric("x", [Some(5.0)]);
        let fragment = mean_std(&column, 1, "X", "Mean (SD)", "All").unwrap();
        assert_eq!(fragment.value("Mean (SD)"), Some("5.0 (nan)"));
    }

    #[test]
    fn test_mean_std_rejects_categorical() {
        let column = Column::categorical("sex_recode", [Some("Male")]);
        assert!(matches!(
            mean_std(&column, 1, "Sex", "Mean (SD)", "All"),
            Err(TableError::Column {
                source: DatasetError::KindMismatch { .. }
            })
        ));
        assert!(median_iqr(&column, 1, "Median (IQR)", "All").is_err());
    }

    #[test]
    fn test_median_is_rounded_but_quartiles_are_not() {
        let column = Column::numeric("x", [Some(1.04), Some(1.06), Some(2.0), Some(3.1)]);
        let fragment = median_iqr(&column, 1, "Median (IQR)", "All").unwrap();
        // median 1.53, q25 1.055, q75 2.275
        let value = fragment.value("Median (IQR)").unwrap();
        assert!(value.starts_with("1.5 ("), "{value}");
        assert!(!value.contains("1.1,"), "{value}");
    }

    #[test]
    fn test_frequency_scenario_with_filter() {
        let sex = Column::categorical(
            "sex_recode",
            ["Male", "Male", "Male", "Female", "Female"].map(Some),
        );
        let male = GroupMask::from_predicate("Male", &sex, |c| c.as_str() == Some("Male"));
        let fragment = frequency(&sex, Some(&male), 1, "Gender", "Male").unwrap();
        assert_eq!(
            values(&fragment),
            [("Gender", ""), ("Female", "0 (0.0)"), ("Male", "3 (100.0)")]
        );
    }

    #[test]
    fn test_frequency_numeric_categories_with_missing() {
        let ecog = Column::numeric("ph.ecog", [Some(1.0), None, Some(0.0), Some(1.0), Some(3.0)]);
        let fragment = frequency(&ecog, None, 4, "ECOG", "All").unwrap();
        assert_eq!(
            values(&fragment),
            [
                ("ECOG", ""),
                ("0.0", "1 (20.0)"),
                ("1.0", "2 (40.0)"),
                ("3.0", "1 (20.0)"),
                ("Missing", "1 (20.0)"),
            ]
        );
    }

    #[test]
    fn test_frequency_numeric_order_is_numeric() {
        let karno = Column::numeric("ph.karno", [Some(100.0), Some(50.0), Some(90.0)]);
        let fragment = frequency(&karno, None, 4, "Karnofsky", "All").unwrap();
        let labels = fragment.labels().collect::<Vec<_>>();
        assert_eq!(labels, ["Karnofsky", "50.0", "90.0", "100.0"]);
    }

    #[test]
    fn test_frequency_percent_rounds_proportion_first() {
        // 7 of 100 at 2 places: round(0.07, 2) * 100
        let column = Column::categorical(
            "x",
            (0..100).map(|i| Some(if i < 7 { "a" } else { "b" })),
        );
        let fragment = frequency(&column, None, 2, "X", "All").unwrap();
        assert_eq!(fragment.value("a"), Some("7 (7.000000000000001)"));
        assert_eq!(fragment.value("b"), Some("93 (93.0)"));

        // 1 of 3 at 1 place loses the second digit of the percentage
        let column = Column::categorical("y", [Some("a"), Some("b"), Some("b")]);
        let fragment = frequency(&column, None, 1, "Y", "All").unwrap();
        assert_eq!(fragment.value("a"), Some("1 (30.0)"));
        assert_eq!(fragment.value("b"), Some("2 (70.0)"));
    }

    #[test]
    fn test_frequency_mask_length_mismatch() {
        let column = Column::categorical("x", [Some("a"), Some("b")]);
        let mask = GroupMask::all("All", 3);
        assert!(matches!(
            frequency(&column, Some(&mask), 1, "X", "All"),
            Err(TableError::Column {
                source: DatasetError::MaskLength { .. }
            })
        ));
    }

    #[test]
    fn test_frequency_labels_invariant_across_masks() {
        let mut rng = Pcg64Mcg::seed_from_u64(11);
        for _ in 0..50 {
            let len = rng.random_range(0..40);
            let column = random_ecog(&mut rng, len);
            let a = random_mask(&mut rng, "A", len);
            let b = random_mask(&mut rng, "B", len);
            let fa = frequency(&column, Some(&a), 4, "ECOG", "A").unwrap();
            let fb = frequency(&column, Some(&b), 4, "ECOG", "B").unwrap();
            let fall = frequency(&column, None, 4, "ECOG", "All").unwrap();
            assert!(fa.labels().eq(fb.labels()));
            assert!(fa.labels().eq(fall.labels()));
        }
    }

    #[test]
    fn test_frequency_counts_sum_to_group_size() {
        let mut rng = Pcg64Mcg::seed_from_u64(12);
        for _ in 0..50 {
            let len = rng.random_range(1..60);
            let column = random_ecog(&mut rng, len);
            let mask = random_mask(&mut rng, "G", len);
            let fragment = frequency(&column, Some(&mask), 4, "ECOG", "G").unwrap();
            let total: usize = fragment.rows()[1..]
                .iter()
                .map(|r| r.value.split(' ').next().unwrap().parse::<usize>().unwrap())
                .sum();
            assert_eq!(total, mask.count());
        }
    }

    #[test]
    fn test_mean_std_matches_rounded_sample_sd() {
        let mut rng = Pcg64Mcg::seed_from_u64(13);
        for _ in 0..50 {
            let len = rng.random_range(2..30);
            let data = (0..len)
                .map(|_| rng.random_range(-100.0..100.0))
                .collect::<Vec<f64>>();
            let decimals = rng.random_range(0..4);
            let column = Column::numeric("x", data.iter().copied().map(Some));
            let fragment = mean_std(&column, decimals, "X", "Mean (SD)", "All").unwrap();

            let sd = DescriptiveStats::new(data.iter().copied()).std_dev;
            let expected = format!("({})", display_float(round_half_even(sd, decimals)));
            let value = fragment.value("Mean (SD)").unwrap();
            assert!(value.ends_with(&expected), "{value} vs {expected}");
        }
    }

    #[test]
    fn test_blank_rows_differ_only_in_group() {
        let a = blank_row("All");
        let b = blank_row("Female");
        assert_eq!(a.rows(), b.rows());
        assert_eq!(a.rows(), [Row::new("", "")]);
        assert_ne!(a.group(), b.group());
    }

    #[test]
    fn test_join_preserves_row_count() {
        let mut rng = Pcg64Mcg::seed_from_u64(14);
        let len = 50;
        let ecog = random_ecog(&mut rng, len);
        let age = Column::numeric("age", (0..len).map(|_| Some(rng.random_range(40.0..80.0))));
        let all = GroupMask::all("All", len);
        let male = random_mask(&mut rng, "Male", len);
        let female = male.complement("Female");

        let tables = [&all, &male, &female]
            .into_iter()
            .map(|mask| {
                let g = mask.name();
                GroupTable::concat(
                    g,
                    [
                        count(&age.select(mask)?, "Number of patients", g),
                        blank_row(g),
                        mean_std(&age.select(mask)?, 1, "Age", "Mean (SD)", g)?,
                        median_iqr(&age.select(mask)?, 1, "Median (IQR)", g)?,
                        blank_row(g),
                        frequency(&ecog, Some(mask), 4, "ECOG", g)?,
                    ],
                )
            })
            .collect::<Result<Vec<_>, TableError>>()
            .unwrap();
        let report = ReportTable::join(&tables).unwrap();
        assert_eq!(report.len(), tables[0].len());
        assert_eq!(report.groups(), ["All", "Male", "Female"]);
        assert!(report.rows().all(|(_, values)| values.len() == 3));
    }

    #[test]
    fn test_join_rejects_misaligned_tables() {
        let a = GroupTable::concat("A", [Fragment::new("A", vec![Row::new("x", "1")])]).unwrap();
        let b = GroupTable::concat("B", [Fragment::new("B", vec![Row::new("y", "1")])]).unwrap();
        let c = GroupTable::concat("C", [blank_row("C"), blank_row("C")]).unwrap();
        assert!(matches!(
            ReportTable::join(&[a.clone(), b]),
            Err(TableError::RowMisalignment { row: 0, .. })
        ));
        assert!(matches!(
            ReportTable::join(&[a.clone(), c]),
            Err(TableError::RowCount {
                expected: 1,
                found: 2,
                ..
            })
        ));
        assert!(matches!(
            ReportTable::join(&[a.clone(), a]),
            Err(TableError::DuplicateGroup { .. })
        ));
        assert!(matches!(ReportTable::join(&[]), Err(TableError::NoGroups)));
    }

    #[test]
    fn test_concat_rejects_foreign_fragment() {
        assert!(matches!(
            GroupTable::concat("All", [blank_row("All"), blank_row("Male")]),
            Err(TableError::GroupMismatch { .. })
        ));
    }
}
