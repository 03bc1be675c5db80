use crate::percentiles::compute_percentile;

/// Descriptive statistics summarizing a sample of `f64` observations.
///
/// Non-finite inputs are treated as missing and skipped. Every measure that
/// is undefined for the observed sample size is `NaN` rather than an error,
/// so callers iterating over many subgroups never have to special-case an
/// empty one.
#[derive(Debug, Clone, Copy)]
pub struct DescriptiveStats {
    /// Number of non-missing observations.
    pub count: usize,
    /// The minimum value (`NaN` when empty).
    pub min: f64,
    /// The maximum value (`NaN` when empty).
    pub max: f64,
    /// The arithmetic mean (`NaN` when empty).
    pub mean: f64,
    /// The median, linearly interpolated between the two middle values.
    pub median: f64,
    /// The sample variance with `n - 1` denominator (`NaN` when `count < 2`).
    pub variance: f64,
    /// The sample standard deviation (`NaN` when `count < 2`).
    pub std_dev: f64,
}

impl DescriptiveStats {
    /// Computes descriptive statistics from unsorted values.
    ///
    /// Non-finite values are dropped before anything is computed.
    ///
    /// # Examples
    ///
    /// ```
    /// # use lungstat_stats::descriptive::DescriptiveStats;
    /// let stats = DescriptiveStats::new([5.0, 2.0, f64::NAN, 4.0, 1.0, 3.0]);
    /// assert_eq!(stats.count, 5);
    /// assert_eq!(stats.min, 1.0);
    /// assert_eq!(stats.max, 5.0);
    /// assert_eq!(stats.mean, 3.0);
    /// assert_eq!(stats.median, 3.0);
    /// assert!((stats.variance - 2.5).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut values = values
            .into_iter()
            .filter(|v| v.is_finite())
            .collect::<Vec<_>>();
        values.sort_by(f64::total_cmp);
        Self::from_sorted(&values)
    }

    /// Computes descriptive statistics from pre-sorted, finite values.
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// # use lungstat_stats::descriptive::DescriptiveStats;
    /// let stats = DescriptiveStats::from_sorted(&[]);
    /// assert_eq!(stats.count, 0);
    /// assert!(stats.mean.is_nan());
    /// assert!(stats.std_dev.is_nan());
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64]) -> Self {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let count = sorted_values.len();
        let min = sorted_values.first().copied().unwrap_or(f64::NAN);
        let max = sorted_values.last().copied().unwrap_or(f64::NAN);
        let mean = mean(sorted_values);
        let median = compute_percentile(sorted_values, 50.0);
        let variance = if count < 2 {
            f64::NAN
        } else {
            sorted_values
                .iter()
                .map(|v| (v - mean).powi(2))
                .sum::<f64>()
                / (count - 1) as f64
        };
        let std_dev = variance.sqrt();

        Self {
            count,
            min,
            max,
            mean,
            median,
            variance,
            std_dev,
        }
    }
}

/// Arithmetic mean of `values`, `NaN` for an empty slice.
///
/// ```
/// # use lungstat_stats::descriptive::mean;
/// assert_eq!(mean(&[1.0, 2.0, 6.0]), 3.0);
/// assert!(mean(&[]).is_nan());
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
