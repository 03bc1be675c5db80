//! Kaplan-Meier survival curves and life tables for right-censored data.
//!
//! All functions take observations as `(time, is_censored)` pairs:
//!
//! ```text
//! Event:     |----x      (died at day 50)           (50.0, false)
//! Censored:  |-------->  (alive at last follow-up)  (120.0, true)
//! ```

use statrs::distribution::{ContinuousCDF as _, Normal};

/// Kaplan-Meier survival curve for survival analysis.
///
/// The Kaplan-Meier estimator is a non-parametric statistic used to estimate the survival
/// function from lifetime data. It accounts for censored data (observations where the event
/// of interest has not occurred by the end of the study period).
///
/// The curve stores parallel vectors describing the survival function at every
/// time point where at least one event occurred.
#[derive(Debug, Clone)]
pub struct KaplanMeierCurve {
    /// Time points where events (non-censored observations) occurred.
    pub times: Vec<f64>,
    /// Survival probability right after each corresponding time point.
    pub survival_prob: Vec<f64>,
    /// Number of subjects at risk (not yet experienced the event or censored) at each time point.
    pub at_risk: Vec<usize>,
    /// Number of events (non-censored observations) that occurred at each time point.
    pub events: Vec<usize>,
    /// Greenwood's cumulative sum `sum(d / (n * (n - d)))` up to each time point.
    pub greenwood: Vec<f64>,
    /// Largest observed time, censored or not (`0.0` for an empty curve).
    pub max_time: f64,
    /// Number of observations the curve was fitted on.
    pub observations: usize,
}

impl KaplanMeierCurve {
    /// Computes the Kaplan-Meier survival curve from survival data.
    ///
    /// # Arguments
    ///
    /// * `data` - A vector of tuples where each tuple contains:
    ///   - `time`: The time at which the observation occurred
    ///   - `is_censored`: `true` if the observation was censored (event did not occur),
    ///     `false` if the event occurred
    ///
    /// # Examples
    ///
    /// ```
    /// # use lungstat_stats::survival::KaplanMeierCurve;
    /// // Data: (time, is_censored)
    /// let data = vec![
    ///     (10.0, false), // Event at time 10
    ///     (20.0, true),  // Censored at time 20
    ///     (30.0, false), // Event at time 30
    /// ];
    /// let curve = KaplanMeierCurve::from_data(data);
    /// assert_eq!(curve.times, vec![10.0, 30.0]);
    /// assert!((curve.survival_prob[0] - 2.0 / 3.0).abs() < 1e-12);
    /// assert_eq!(curve.survival_prob[1], 0.0);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_data(mut data: Vec<(f64, bool)>) -> Self {
        // Sort by time
        data.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut times = vec![];
        let mut survival_prob = vec![];
        let mut at_risk_vec = vec![];
        let mut events_vec = vec![];
        let mut greenwood = vec![];

        let mut current_survival = 1.0;
        let mut current_greenwood = 0.0;
        let total = data.len();

        let mut i = 0;
        while i < data.len() {
            let current_time = data[i].0;
            let at_risk = total - i;

            // Count events (non-censored) at this time point
            let mut event_count = 0;
            let mut j = i;
            while j < data.len() && data[j].0 == current_time {
                if !data[j].1 {
                    event_count += 1;
                }
                j += 1;
            }

            if event_count > 0 {
                let n = at_risk as f64;
                let d = event_count as f64;
                current_survival *= 1.0 - d / n;
                current_greenwood += if at_risk > event_count {
                    d / (n * (n - d))
                } else {
                    f64::INFINITY
                };

                times.push(current_time);
                survival_prob.push(current_survival);
                at_risk_vec.push(at_risk);
                events_vec.push(event_count);
                greenwood.push(current_greenwood);
            }

            i = j;
        }

        Self {
            times,
            survival_prob,
            at_risk: at_risk_vec,
            events: events_vec,
            greenwood,
            max_time: data.last().map_or(0.0, |(t, _)| *t),
            observations: total,
        }
    }

    /// Returns the median survival time.
    ///
    /// The median survival time is the first event time at which the survival
    /// probability drops to or below 50%. If the survival probability never
    /// reaches 50%, this method returns `None`.
    ///
    /// ```
    /// # use lungstat_stats::survival::KaplanMeierCurve;
    /// let data = vec![(10.0, false), (20.0, false), (30.0, false), (40.0, true)];
    /// let curve = KaplanMeierCurve::from_data(data);
    /// assert_eq!(curve.median_survival(), Some(20.0));
    /// ```
    #[must_use]
    pub fn median_survival(&self) -> Option<f64> {
        self.times
            .iter()
            .zip(&self.survival_prob)
            .find(|(_, s)| **s <= 0.5)
            .map(|(t, _)| *t)
    }

    /// Pointwise `1 - alpha` confidence band using the exponential Greenwood
    /// (log-log) transform.
    ///
    /// Returns `(lower, upper)` vectors parallel to [`Self::times`]. Where the
    /// estimate is exactly 0 or 1 the band collapses onto the estimate.
    ///
    /// ```
    /// # use lungstat_stats::survival::KaplanMeierCurve;
    /// let data = (1..=20).map(|t| (f64::from(t), t % 3 == 0)).collect();
    /// let curve = KaplanMeierCurve::from_data(data);
    /// let (lower, upper) = curve.confidence_band(0.05);
    /// for ((lo, hi), s) in lower.iter().zip(&upper).zip(&curve.survival_prob) {
    ///     assert!(lo <= s && s <= hi);
    /// }
    /// ```
    #[must_use]
    pub fn confidence_band(&self, alpha: f64) -> (Vec<f64>, Vec<f64>) {
        let z = normal_quantile(1.0 - alpha / 2.0);
        self.survival_prob
            .iter()
            .zip(&self.greenwood)
            .map(|(&s, &var)| {
                if s <= 0.0 || s >= 1.0 || !var.is_finite() {
                    return (s, s);
                }
                let log_s = s.ln();
                let spread = z * var.sqrt() / log_s;
                let centre = (-log_s).ln();
                let lower = (-(centre - spread).exp()).exp();
                let upper = (-(centre + spread).exp()).exp();
                (lower, upper)
            })
            .unzip()
    }

    /// Step-function vertices for drawing the curve from time 0 to
    /// [`Self::max_time`], starting at survival 1.
    ///
    /// ```
    /// # use lungstat_stats::survival::KaplanMeierCurve;
    /// let curve = KaplanMeierCurve::from_data(vec![(10.0, false), (20.0, true)]);
    /// assert_eq!(
    ///     curve.step_points(),
    ///     vec![(0.0, 1.0), (10.0, 1.0), (10.0, 0.5), (20.0, 0.5)]
    /// );
    /// ```
    #[must_use]
    pub fn step_points(&self) -> Vec<(f64, f64)> {
        step_path(&self.times, &self.survival_prob, 1.0, self.max_time)
    }
}

/// Builds step-function vertices through `(times[i], values[i])` starting at
/// `(0, initial)` and extending flat to `end`.
#[must_use]
pub fn step_path(times: &[f64], values: &[f64], initial: f64, end: f64) -> Vec<(f64, f64)> {
    let mut points = vec![(0.0, initial)];
    let mut last = initial;
    for (&t, &v) in times.iter().zip(values) {
        points.push((t, last));
        points.push((t, v));
        last = v;
    }
    let last_time = times.last().copied().unwrap_or(0.0);
    if end > last_time {
        points.push((end, last));
    }
    points
}

/// One row of a [`LifeTable`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifeTableRow {
    /// Time of this row (`0.0` for the entry row).
    pub event_at: f64,
    /// Subjects leaving the risk set at this time (events + censored).
    pub removed: usize,
    /// Events observed at this time.
    pub observed: usize,
    /// Subjects censored at this time.
    pub censored: usize,
    /// Subjects entering the study at this time.
    pub entrance: usize,
    /// Subjects at risk just before this time.
    pub at_risk: usize,
}

/// Life table aggregating observations per distinct time.
///
/// The first row is the entry row at time 0 where every subject enters the
/// risk set; one row follows per distinct observed time.
///
/// ```
/// # use lungstat_stats::survival::LifeTable;
/// let table = LifeTable::from_events(&[(5.0, false), (5.0, true), (8.0, false)]);
/// assert_eq!(table.rows.len(), 3);
/// assert_eq!(table.rows[0].entrance, 3);
/// assert_eq!(table.rows[1].removed, 2);
/// assert_eq!(table.rows[1].censored, 1);
/// assert_eq!(table.rows[2].at_risk, 1);
/// ```
#[derive(Debug, Clone)]
pub struct LifeTable {
    pub rows: Vec<LifeTableRow>,
}

impl LifeTable {
    #[must_use]
    pub fn from_events(data: &[(f64, bool)]) -> Self {
        let mut sorted = data.to_vec();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let total = sorted.len();
        let mut rows = vec![LifeTableRow {
            event_at: 0.0,
            removed: 0,
            observed: 0,
            censored: 0,
            entrance: total,
            at_risk: total,
        }];

        let mut i = 0;
        while i < sorted.len() {
            let time = sorted[i].0;
            let at_risk = total - i;
            let mut j = i;
            let mut observed = 0;
            while j < sorted.len() && sorted[j].0 == time {
                if !sorted[j].1 {
                    observed += 1;
                }
                j += 1;
            }
            let removed = j - i;
            let row = LifeTableRow {
                event_at: time,
                removed,
                observed,
                censored: removed - observed,
                entrance: 0,
                at_risk,
            };
            // A time-0 observation folds into the entry row.
            if time == 0.0 {
                rows[0] = LifeTableRow {
                    entrance: total,
                    ..row
                };
            } else {
                rows.push(row);
            }
            i = j;
        }

        Self { rows }
    }
}

/// Standard normal quantile function.
#[must_use]
pub fn normal_quantile(p: f64) -> f64 {
    Normal::standard().inverse_cdf(p)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Textbook example (Kleinbaum): remission times in weeks, `true` = censored
    fn remission_data() -> Vec<(f64, bool)> {
        [
            (6.0, false),
            (6.0, false),
            (6.0, false),
            (6.0, true),
            (7.0, false),
            (9.0, true),
            (10.0, false),
            (10.0, true),
            (11.0, true),
            (13.0, false),
            (16.0, false),
            (17.0, true),
            (19.0, true),
            (20.0, true),
            (22.0, false),
            (23.0, false),
            (25.0, true),
            (32.0, true),
            (32.0, true),
            (34.0, true),
            (35.0, true),
        ]
        .to_vec()
    }

    #[test]
    fn test_empty_curve() {
        let curve = KaplanMeierCurve::from_data(vec![]);
        assert!(curve.times.is_empty());
        assert_eq!(curve.median_survival(), None);
        assert_eq!(curve.step_points(), vec![(0.0, 1.0)]);
    }

    #[test]
    fn test_remission_curve() {
        let curve = KaplanMeierCurve::from_data(remission_data());
        assert_eq!(curve.times, vec![6.0, 7.0, 10.0, 13.0, 16.0, 22.0, 23.0]);
        assert_eq!(curve.at_risk, vec![21, 17, 15, 12, 11, 7, 6]);
        assert_eq!(curve.events, vec![3, 1, 1, 1, 1, 1, 1]);

        let expected = [0.8571, 0.8067, 0.7529, 0.6902, 0.6275, 0.5378, 0.4482];
        for (s, e) in curve.survival_prob.iter().zip(expected) {
            assert!((s - e).abs() < 1e-4, "{s} != {e}");
        }
        assert_eq!(curve.median_survival(), Some(23.0));
        assert_eq!(curve.max_time, 35.0);
        assert_eq!(curve.observations, 21);
    }

    #[test]
    fn test_confidence_band_brackets_estimate() {
        let curve = KaplanMeierCurve::from_data(remission_data());
        let (lower, upper) = curve.confidence_band(0.05);
        // Exponential Greenwood band at week 6: (0.6197, 0.9516)
        assert!((lower[0] - 0.6197).abs() < 1e-3, "{}", lower[0]);
        assert!((upper[0] - 0.9516).abs() < 1e-3, "{}", upper[0]);
        for i in 0..curve.times.len() {
            assert!(lower[i] <= curve.survival_prob[i]);
            assert!(curve.survival_prob[i] <= upper[i]);
            assert!(upper[i] <= 1.0);
        }
    }

    #[test]
    fn test_life_table_totals() {
        let data = remission_data();
        let table = LifeTable::from_events(&data);
        let removed: usize = table.rows.iter().map(|r| r.removed).sum();
        let observed: usize = table.rows.iter().map(|r| r.observed).sum();
        assert_eq!(removed, data.len());
        assert_eq!(observed, 9);
        assert_eq!(table.rows[1].event_at, 6.0);
        assert_eq!(table.rows[1].at_risk, 21);
        assert_eq!(table.rows[1].observed, 3);
        assert_eq!(table.rows[1].censored, 1);
    }
}
