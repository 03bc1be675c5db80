//! Named row selections.

use crate::dataset::{Cell, Column};

/// A named boolean mask over dataset rows.
///
/// ```
/// # use lungstat_analysis::{dataset::Column, group::GroupMask};
/// let sex = Column::categorical("sex", [Some("Male"), Some("Female"), None]);
/// let male = GroupMask::from_predicate("Male", &sex, |cell| cell.as_str() == Some("Male"));
/// let female = male.complement("Female");
/// assert_eq!(male.count(), 1);
/// // Rows with a missing value fall into the complement
/// assert_eq!(female.count(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMask {
    name: String,
    selected: Vec<bool>,
}

impl GroupMask {
    pub fn new(name: impl Into<String>, selected: Vec<bool>) -> Self {
        Self {
            name: name.into(),
            selected,
        }
    }

    /// Selects every one of `len` rows.
    pub fn all(name: impl Into<String>, len: usize) -> Self {
        Self::new(name, vec![true; len])
    }

    /// Selects the rows whose cell in `column` satisfies `predicate`.
    pub fn from_predicate<F>(name: impl Into<String>, column: &Column, mut predicate: F) -> Self
    where
        F: FnMut(&Cell) -> bool,
    {
        Self::new(name, column.cells().iter().map(&mut predicate).collect())
    }

    /// Selects exactly the rows this mask leaves out.
    #[must_use]
    pub fn complement(&self, name: impl Into<String>) -> Self {
        Self::new(name, self.selected.iter().map(|s| !s).collect())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Number of selected rows.
    #[must_use]
    pub fn count(&self) -> usize {
        self.selected.iter().filter(|s| **s).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.selected.iter().copied()
    }

    /// Selects elements of a row-aligned slice.
    ///
    /// # Panics
    ///
    /// Panics if `values` is not as long as the mask.
    pub fn apply<'a, T>(&'a self, values: &'a [T]) -> impl Iterator<Item = &'a T> + 'a {
        assert_eq!(values.len(), self.len(), "mask length differs from values");
        values
            .iter()
            .zip(&self.selected)
            .filter(|(_, s)| **s)
            .map(|(v, _)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complement_partitions_rows() {
        let mask = GroupMask::new("a", vec![true, false, true, false]);
        let rest = mask.complement("b");
        assert_eq!(mask.count() + rest.count(), 4);
        assert!(mask.iter().zip(rest.iter()).all(|(a, b)| a != b));
        assert_eq!(rest.name(), "b");
    }

    #[test]
    fn test_apply_selects_values() {
        let mask = GroupMask::new("a", vec![false, true, true]);
        let values = [10, 20, 30];
        assert_eq!(mask.apply(&values).copied().collect::<Vec<_>>(), vec![20, 30]);
    }
}
