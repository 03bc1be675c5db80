/// Precomputed percentile values for a dataset.
///
/// Percentiles are linearly interpolated between order statistics, which is
/// the default quantile definition of most statistics packages (Hyndman and
/// Fan type 7).
///
/// # Examples
///
/// ```
/// use lungstat_stats::percentiles::Percentiles;
///
/// let values = vec![10.0, 20.0, 30.0, 40.0];
/// let percentiles = Percentiles::new(&values, &[25.0, 50.0, 75.0]);
///
/// assert_eq!(percentiles.get(25.0), Some(17.5));
/// assert_eq!(percentiles.get(50.0), Some(25.0));
/// assert_eq!(percentiles.get(75.0), Some(32.5));
/// ```
#[derive(Debug, Clone)]
pub struct Percentiles {
    /// Percentile-value pairs in the order they were requested.
    /// Each tuple contains (percentile, value) where percentile is 0.0-100.0.
    values: Vec<(f64, f64)>,
}

impl Percentiles {
    /// Computes percentiles from sorted, finite values.
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order.
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64], percentile_points: &[f64]) -> Self {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let values = percentile_points
            .iter()
            .map(|&p| (p, compute_percentile(sorted_values, p)))
            .collect();
        Self { values }
    }

    /// Computes percentiles from unsorted values.
    ///
    /// Non-finite values are treated as missing and skipped.
    ///
    /// ```
    /// use lungstat_stats::percentiles::Percentiles;
    ///
    /// let values = vec![5.0, f64::NAN, 2.0, 8.0, 1.0, 9.0];
    /// let percentiles = Percentiles::new(&values, &[50.0]);
    ///
    /// assert_eq!(percentiles.get(50.0), Some(5.0));
    /// ```
    #[must_use]
    pub fn new(values: &[f64], percentile_points: &[f64]) -> Self {
        let mut sorted = values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .collect::<Vec<_>>();
        sorted.sort_by(f64::total_cmp);
        Self::from_sorted(&sorted, percentile_points)
    }

    /// Gets the value at a specific percentile.
    ///
    /// Returns `None` if the percentile was not precomputed.
    ///
    /// ```
    /// use lungstat_stats::percentiles::Percentiles;
    ///
    /// let percentiles = Percentiles::new(&[1.0, 2.0, 3.0, 4.0, 5.0], &[50.0, 75.0]);
    ///
    /// assert_eq!(percentiles.get(50.0), Some(3.0));
    /// assert_eq!(percentiles.get(75.0), Some(4.0));
    /// assert_eq!(percentiles.get(25.0), None); // Not precomputed
    /// ```
    #[must_use]
    pub fn get(&self, percentile: f64) -> Option<f64> {
        self.values.iter().find_map(|(p, value)| {
            if (*p - percentile).abs() < f64::EPSILON {
                Some(*value)
            } else {
                None
            }
        })
    }

    /// Returns an iterator over all (percentile, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.values.iter().copied()
    }

    /// Returns all percentile-value pairs as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[(f64, f64)] {
        &self.values
    }
}

/// Computes a single percentile value from sorted data.
///
/// With `n` sorted values the percentile `p` sits at the fractional position
/// `h = (n - 1) * p / 100`; the result interpolates linearly between the
/// values at `floor(h)` and `ceil(h)`.
///
/// Returns `f64::NAN` if the input is empty.
///
/// ```
/// use lungstat_stats::percentiles::compute_percentile;
///
/// let values = vec![10.0, 20.0, 30.0, 40.0];
/// assert_eq!(compute_percentile(&values, 50.0), 25.0);
/// assert_eq!(compute_percentile(&values, 0.0), 10.0);
/// assert_eq!(compute_percentile(&values, 100.0), 40.0);
/// assert!(compute_percentile(&[], 50.0).is_nan());
/// ```
#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]
#[must_use]
pub fn compute_percentile(sorted_values: &[f64], percentile: f64) -> f64 {
    if sorted_values.is_empty() {
        return f64::NAN;
    }
    let last = sorted_values.len() - 1;
    let h = (last as f64 * percentile / 100.0).clamp(0.0, last as f64);
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    let frac = h - h.floor();
    if lo == hi {
        sorted_values[lo]
    } else {
        sorted_values[lo] + (sorted_values[hi] - sorted_values[lo]) * frac
    }
}
