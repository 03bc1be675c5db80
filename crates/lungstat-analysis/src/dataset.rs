//! Tabular dataset with tagged cells.
//!
//! A [`Dataset`] is an ordered collection of uniquely named [`Column`]s of
//! equal length. Every column has a [`ColumnKind`]; numeric columns hold only
//! [`Cell::Numeric`] or [`Cell::Missing`], categorical columns only
//! [`Cell::Categorical`] or [`Cell::Missing`]. Statistic functions check the
//! kind at the boundary instead of coercing.
//!
//! Datasets are built once (usually from CSV) and then only extended with
//! derived columns; an existing column is never overwritten.

use std::{io, path::Path};

use crate::group::GroupMask;

/// Field values read as missing, compared case-insensitively.
pub const MISSING_TOKENS: [&str; 3] = ["", "na", "nan"];

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum DatasetError {
    #[display("column '{name}' not found")]
    MissingColumn { name: String },
    #[display("column '{name}' already exists")]
    DuplicateColumn { name: String },
    #[display("column '{name}' has {found} rows, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    #[display("column '{name}' is {found}, expected {expected}")]
    KindMismatch {
        name: String,
        expected: ColumnKind,
        found: ColumnKind,
    },
    #[display("mask '{mask}' covers {found} rows but column '{name}' has {expected}")]
    MaskLength {
        mask: String,
        name: String,
        expected: usize,
        found: usize,
    },
    #[display("failed to read CSV")]
    Csv { source: csv::Error },
}

/// A single value of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Numeric(f64),
    Categorical(String),
    Missing,
}

impl Cell {
    /// Wraps a number, mapping non-finite values to [`Cell::Missing`].
    #[must_use]
    pub fn numeric(value: f64) -> Self {
        if value.is_finite() {
            Self::Numeric(value)
        } else {
            Self::Missing
        }
    }

    #[must_use]
    pub fn categorical(value: impl Into<String>) -> Self {
        Self::Categorical(value.into())
    }

    /// Parses a raw CSV field.
    ///
    /// ```
    /// # use lungstat_analysis::dataset::Cell;
    /// assert_eq!(Cell::parse("74"), Cell::Numeric(74.0));
    /// assert_eq!(Cell::parse(" NA "), Cell::Missing);
    /// assert_eq!(Cell::parse("NaN"), Cell::Missing);
    /// assert_eq!(Cell::parse("Male"), Cell::categorical("Male"));
    /// ```
    #[must_use]
    pub fn parse(field: &str) -> Self {
        let field = field.trim();
        if MISSING_TOKENS
            .iter()
            .any(|token| field.eq_ignore_ascii_case(token))
        {
            return Self::Missing;
        }
        match field.parse::<f64>() {
            Ok(value) => Self::numeric(value),
            Err(_) => Self::categorical(field),
        }
    }

    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Numeric(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Categorical(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum ColumnKind {
    #[display("numeric")]
    Numeric,
    #[display("categorical")]
    Categorical,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    kind: ColumnKind,
    cells: Vec<Cell>,
}

impl Column {
    /// Builds a numeric column; `None` and non-finite values become missing.
    pub fn numeric<I>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        Self {
            name: name.into(),
            kind: ColumnKind::Numeric,
            cells: values
                .into_iter()
                .map(|v| v.map_or(Cell::Missing, Cell::numeric))
                .collect(),
        }
    }

    /// Builds a categorical column; `None` becomes missing.
    pub fn categorical<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind: ColumnKind::Categorical,
            cells: values
                .into_iter()
                .map(|v| v.map_or(Cell::Missing, Cell::categorical))
                .collect(),
        }
    }

    /// Builds a column from parsed cells and infers its kind.
    ///
    /// A column whose non-missing cells are all numeric (or that has no
    /// non-missing cells) is numeric. A column mixing numbers and text is
    /// categorical with every number kept as its original text.
    pub fn infer(name: impl Into<String>, fields: &[String]) -> Self {
        let cells = fields.iter().map(|f| Cell::parse(f)).collect::<Vec<_>>();
        let all_numeric = cells
            .iter()
            .all(|c| matches!(c, Cell::Numeric(_) | Cell::Missing));
        if all_numeric {
            return Self {
                name: name.into(),
                kind: ColumnKind::Numeric,
                cells,
            };
        }
        let cells = fields
            .iter()
            .zip(cells)
            .map(|(field, cell)| match cell {
                Cell::Missing => Cell::Missing,
                _ => Cell::categorical(field.trim()),
            })
            .collect();
        Self {
            name: name.into(),
            kind: ColumnKind::Categorical,
            cells,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Fails unless the column is of `expected` kind.
    pub fn expect_kind(&self, expected: ColumnKind) -> Result<(), DatasetError> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(DatasetError::KindMismatch {
                name: self.name.clone(),
                expected,
                found: self.kind,
            })
        }
    }

    /// Non-missing values of a numeric column.
    pub fn numeric_values(&self) -> Result<Vec<f64>, DatasetError> {
        self.expect_kind(ColumnKind::Numeric)?;
        Ok(self.cells.iter().filter_map(Cell::as_f64).collect())
    }

    /// Values of a numeric column with `None` for missing cells.
    pub fn numeric_options(&self) -> Result<Vec<Option<f64>>, DatasetError> {
        self.expect_kind(ColumnKind::Numeric)?;
        Ok(self.cells.iter().map(Cell::as_f64).collect())
    }

    /// The rows selected by `mask`, as a new column with the same name.
    pub fn select(&self, mask: &GroupMask) -> Result<Self, DatasetError> {
        self.check_mask(mask)?;
        Ok(Self {
            name: self.name.clone(),
            kind: self.kind,
            cells: self
                .cells
                .iter()
                .zip(mask.iter())
                .filter(|(_, selected)| *selected)
                .map(|(cell, _)| cell.clone())
                .collect(),
        })
    }

    pub(crate) fn check_mask(&self, mask: &GroupMask) -> Result<(), DatasetError> {
        if mask.len() == self.len() {
            Ok(())
        } else {
            Err(DatasetError::MaskLength {
                mask: mask.name().to_owned(),
                name: self.name.clone(),
                expected: self.len(),
                found: mask.len(),
            })
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    /// Builds a dataset, checking names are unique and lengths agree.
    pub fn new(columns: Vec<Column>) -> Result<Self, DatasetError> {
        let mut dataset = Self::default();
        for column in columns {
            dataset.add_column(column)?;
        }
        Ok(dataset)
    }

    /// Reads a CSV file with a header row.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|source| DatasetError::Csv { source })?;
        Self::from_csv_reader(reader)
    }

    /// Reads CSV from any reader.
    ///
    /// ```
    /// # use lungstat_analysis::dataset::{ColumnKind, Dataset};
    /// let csv = "time,sex,note\n306,1,a\n455,NA,b\n";
    /// let data = Dataset::from_reader(csv.as_bytes()).unwrap();
    /// assert_eq!(data.len(), 2);
    /// assert_eq!(data.column("sex").unwrap().kind(), ColumnKind::Numeric);
    /// assert_eq!(data.column("note").unwrap().kind(), ColumnKind::Categorical);
    /// ```
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, DatasetError> {
        Self::from_csv_reader(
            csv::ReaderBuilder::new()
                .trim(csv::Trim::All)
                .from_reader(reader),
        )
    }

    fn from_csv_reader<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Self, DatasetError> {
        let headers = reader
            .headers()
            .map_err(|source| DatasetError::Csv { source })?
            .iter()
            .map(str::to_owned)
            .collect::<Vec<_>>();

        let mut fields = vec![Vec::new(); headers.len()];
        for record in reader.records() {
            let record = record.map_err(|source| DatasetError::Csv { source })?;
            for (column, field) in fields.iter_mut().zip(record.iter()) {
                column.push(field.to_owned());
            }
        }

        let columns = headers
            .into_iter()
            .zip(&fields)
            .map(|(name, fields)| Column::infer(name, fields))
            .collect();
        let dataset = Self::new(columns)?;
        tracing::debug!(
            rows = dataset.len(),
            columns = dataset.columns.len(),
            "loaded dataset"
        );
        Ok(dataset)
    }

    /// Appends a column; its name must be new and its length must match.
    pub fn add_column(&mut self, column: Column) -> Result<(), DatasetError> {
        if self.columns.iter().any(|c| c.name == column.name) {
            return Err(DatasetError::DuplicateColumn { name: column.name });
        }
        if let Some(first) = self.columns.first()
            && first.len() != column.len()
        {
            let found = column.len();
            return Err(DatasetError::LengthMismatch {
                name: column.name,
                expected: first.len(),
                found,
            });
        }
        self.columns.push(column);
        Ok(())
    }

    /// Builder-style [`Self::add_column`].
    pub fn with_column(mut self, column: Column) -> Result<Self, DatasetError> {
        self.add_column(column)?;
        Ok(self)
    }

    pub fn column(&self, name: &str) -> Result<&Column, DatasetError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| DatasetError::MissingColumn {
                name: name.to_owned(),
            })
    }

    /// Looks up a column and checks its kind.
    pub fn column_of_kind(&self, name: &str, kind: ColumnKind) -> Result<&Column, DatasetError> {
        let column = self.column(name)?;
        column.expect_kind(kind)?;
        Ok(column)
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
