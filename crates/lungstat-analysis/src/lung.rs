//! The NCCTG lung-cancer dataset schema.
//!
//! [`LungData`] validates the source columns and appends the derived columns
//! the analyses read. Source columns are never modified:
//!
//! | derived column        | rule                                   |
//! |-----------------------|----------------------------------------|
//! | `sex_recode`          | `Male` when `sex == 1`, else `Female`  |
//! | `status_recode`       | `Alive` when `status == 1`, else `Dead`|
//! | `event`               | `1` when `status == 2`, else `0`       |
//! | `sex_for_regression`  | `1` when `sex == 1`, else `2`          |
//!
//! A missing `sex` therefore counts as female and a missing `status` as
//! dead but censored, matching the recoding rules literally.

use std::path::Path;

use crate::{
    dataset::{Cell, Column, ColumnKind, Dataset, DatasetError},
    group::GroupMask,
};

pub const TIME: &str = "time";
pub const STATUS: &str = "status";
pub const SEX: &str = "sex";
pub const AGE: &str = "age";
pub const WEIGHT_LOSS: &str = "wt.loss";
pub const ECOG_PHYSICIAN: &str = "ph.ecog";
pub const KARNOFSKY_PHYSICIAN: &str = "ph.karno";
pub const KARNOFSKY_PATIENT: &str = "pat.karno";
pub const MEAL_CALORIES: &str = "meal.cal";

pub const SEX_RECODE: &str = "sex_recode";
pub const STATUS_RECODE: &str = "status_recode";
pub const EVENT: &str = "event";
pub const SEX_FOR_REGRESSION: &str = "sex_for_regression";

/// Source columns that must be present and numeric.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    TIME,
    STATUS,
    SEX,
    AGE,
    WEIGHT_LOSS,
    ECOG_PHYSICIAN,
    KARNOFSKY_PHYSICIAN,
    KARNOFSKY_PATIENT,
    MEAL_CALORIES,
];

pub const ALL: &str = "All";
pub const MALE: &str = "Male";
pub const FEMALE: &str = "Female";
pub const ALIVE: &str = "Alive";
pub const DEAD: &str = "Dead";

const SEX_CODE_MALE: f64 = 1.0;
const STATUS_CODE_ALIVE: f64 = 1.0;
const STATUS_CODE_DEAD: f64 = 2.0;

/// The lung dataset with its derived columns.
#[derive(Debug, Clone)]
pub struct LungData {
    dataset: Dataset,
}

impl LungData {
    /// Loads and validates a CSV file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "loading dataset");
        Self::from_dataset(Dataset::from_csv_path(path)?)
    }

    /// Validates `dataset` and appends the derived columns.
    ///
    /// ```
    /// # use lungstat_analysis::{dataset::Dataset, lung::{self, LungData}};
    /// let csv = "time,status,sex,age,wt.loss,ph.ecog,ph.karno,pat.karno,meal.cal\n\
    ///            306,2,1,74,NA,1,90,100,1175\n\
    ///            455,1,2,68,15,0,90,90,1225\n";
    /// let data = LungData::from_dataset(Dataset::from_reader(csv.as_bytes()).unwrap()).unwrap();
    /// let sex = data.dataset().column(lung::SEX_RECODE).unwrap();
    /// assert_eq!(sex.cells()[0].as_str(), Some("Male"));
    /// ```
    pub fn from_dataset(dataset: Dataset) -> Result<Self, DatasetError> {
        for name in REQUIRED_COLUMNS {
            dataset.column_of_kind(name, ColumnKind::Numeric)?;
        }

        let sex = dataset.column(SEX)?.numeric_options()?;
        let status = dataset.column(STATUS)?.numeric_options()?;

        let is_male = |code: &Option<f64>| *code == Some(SEX_CODE_MALE);
        let sex_recode = Column::categorical(
            SEX_RECODE,
            sex.iter()
                .map(|code| Some(if is_male(code) { MALE } else { FEMALE })),
        );
        let sex_for_regression = Column::numeric(
            SEX_FOR_REGRESSION,
            sex.iter()
                .map(|code| Some(if is_male(code) { 1.0 } else { 2.0 })),
        );
        let status_recode = Column::categorical(
            STATUS_RECODE,
            status.iter().map(|code| {
                Some(if *code == Some(STATUS_CODE_ALIVE) {
                    ALIVE
                } else {
                    DEAD
                })
            }),
        );
        let event = Column::numeric(
            EVENT,
            status
                .iter()
                .map(|code| Some(if *code == Some(STATUS_CODE_DEAD) { 1.0 } else { 0.0 })),
        );

        let dataset = dataset
            .with_column(sex_recode)?
            .with_column(status_recode)?
            .with_column(event)?
            .with_column(sex_for_regression)?;
        tracing::info!(patients = dataset.len(), "dataset ready");
        Ok(Self { dataset })
    }

    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn column(&self, name: &str) -> Result<&Column, DatasetError> {
        self.dataset.column(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Patients recoded as male.
    pub fn male(&self) -> Result<GroupMask, DatasetError> {
        Ok(GroupMask::from_predicate(
            MALE,
            self.dataset.column(SEX_RECODE)?,
            |cell| matches!(cell, Cell::Categorical(s) if s == MALE),
        ))
    }

    /// The report groups in order: all patients, male, female.
    ///
    /// Female is the complement of male.
    pub fn strata(&self) -> Result<[GroupMask; 3], DatasetError> {
        let male = self.male()?;
        let female = male.complement(FEMALE);
        Ok([GroupMask::all(ALL, self.len()), male, female])
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::table::frequency;

    pub(crate) const SAMPLE_CSV: &str = include_str!("../data/lung_sample.csv");

    pub(crate) fn sample() -> LungData {
        LungData::from_dataset(Dataset::from_reader(SAMPLE_CSV.as_bytes()).unwrap()).unwrap()
    }

    #[test]
    fn test_derived_columns() {
        let csv = "time,status,sex,age,wt.loss,ph.ecog,ph.karno,pat.karno,meal.cal\n\
                   1,2,1,60,1,0,90,90,1000\n\
                   2,1,2,61,NA,1,80,80,NA\n\
                   3,NA,NA,62,3,2,70,70,900\n";
        let data = LungData::from_dataset(Dataset::from_reader(csv.as_bytes()).unwrap()).unwrap();

        let text = |name| {
            data.column(name)
                .unwrap()
                .cells()
                .iter()
                .map(|c| c.as_str().unwrap().to_owned())
                .collect::<Vec<_>>()
        };
        let numbers = |name| data.column(name).unwrap().numeric_values().unwrap();

        assert_eq!(text(SEX_RECODE), ["Male", "Female", "Female"]);
        assert_eq!(text(STATUS_RECODE), ["Dead", "Alive", "Dead"]);
        assert_eq!(numbers(EVENT), [1.0, 0.0, 0.0]);
        assert_eq!(numbers(SEX_FOR_REGRESSION), [1.0, 2.0, 2.0]);
        // Source columns are untouched
        assert_eq!(
            data.column(SEX).unwrap().numeric_options().unwrap(),
            [Some(1.0), Some(2.0), None]
        );
    }

    fn csv_with_sex_codes(codes: &[u8]) -> String {
        let mut csv = "time,status,sex,age,wt.loss,ph.ecog,ph.karno,pat.karno,meal.cal\n".to_owned();
        for (i, code) in codes.iter().enumerate() {
            csv.push_str(&format!("{},2,{code},60,1,0,90,90,1000\n", 100 + i));
        }
        csv
    }

    fn sex_frequency(codes: &[u8]) -> Vec<(String, String)> {
        let csv = csv_with_sex_codes(codes);
        let data = LungData::from_dataset(Dataset::from_reader(csv.as_bytes()).unwrap()).unwrap();
        let fragment = frequency(data.column(SEX_RECODE).unwrap(), None, 1, "Gender", ALL).unwrap();
        fragment
            .rows()
            .iter()
            .map(|r| (r.label.clone(), r.value.clone()))
            .collect()
    }

    #[test]
    fn test_numeric_sex_codes_feed_frequency() {
        let rows = sex_frequency(&[1, 1, 1, 2, 2]);
        let expected = [("Gender", ""), ("Female", "2 (40.0)"), ("Male", "3 (60.0)")]
            .map(|(l, v)| (l.to_owned(), v.to_owned()));
        assert_eq!(rows, expected);
    }

    #[test]
    fn test_sex_percent_tie_rounds_to_even() {
        // 27 / 60 = 0.45 rounds down to 0.4 at one place
        let codes = [[2_u8; 27].as_slice(), [1_u8; 33].as_slice()].concat();
        let rows = sex_frequency(&codes);
        let expected = [("Gender", ""), ("Female", "27 (40.0)"), ("Male", "33 (60.0)")]
            .map(|(l, v)| (l.to_owned(), v.to_owned()));
        assert_eq!(rows, expected);
    }

    #[test]
    fn test_strata() {
        let data = sample();
        let [all, male, female] = data.strata().unwrap();
        assert_eq!(all.count(), data.len());
        assert_eq!(male.count() + female.count(), data.len());
        assert_eq!([all.name(), male.name(), female.name()], [ALL, MALE, FEMALE]);
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "time,status\n1,2\n";
        let err = LungData::from_dataset(Dataset::from_reader(csv.as_bytes()).unwrap()).unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn { name } if name == SEX));
    }

    #[test]
    fn test_non_numeric_required_column() {
        let csv = "time,status,sex,age,wt.loss,ph.ecog,ph.karno,pat.karno,meal.cal\n\
                   1,2,M,60,1,0,90,90,1000\n";
        let err = LungData::from_dataset(Dataset::from_reader(csv.as_bytes()).unwrap()).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::KindMismatch { name, found: ColumnKind::Categorical, .. } if name == SEX
        ));
    }

    #[test]
    fn test_derived_name_collision() {
        let csv = "time,status,sex,age,wt.loss,ph.ecog,ph.karno,pat.karno,meal.cal,event\n\
                   1,2,1,60,1,0,90,90,1000,1\n";
        let err = LungData::from_dataset(Dataset::from_reader(csv.as_bytes()).unwrap()).unwrap_err();
        assert!(matches!(err, DatasetError::DuplicateColumn { name } if name == EVENT));
    }
}
