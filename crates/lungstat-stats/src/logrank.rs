//! Two-sample log-rank test.

use statrs::distribution::{ChiSquared, ContinuousCDF as _};

/// Result of a two-sample log-rank test.
///
/// Under the null hypothesis that both samples share one survival
/// distribution the statistic is chi-squared distributed with one degree of
/// freedom.
#[derive(Debug, Clone, Copy)]
pub struct LogRankTest {
    /// Chi-squared test statistic `(O_a - E_a)^2 / V`.
    pub test_statistic: f64,
    /// Upper-tail p-value of the statistic.
    pub p_value: f64,
    /// Degrees of freedom of the reference distribution.
    pub degrees_of_freedom: f64,
    /// Observed events in the first sample.
    pub observed_a: usize,
    /// Expected events in the first sample under the null hypothesis.
    pub expected_a: f64,
    /// Observed events in the second sample.
    pub observed_b: usize,
    /// Expected events in the second sample under the null hypothesis.
    pub expected_b: f64,
}

impl LogRankTest {
    /// Compares two samples of `(time, is_censored)` observations.
    ///
    /// If neither sample has an event the variance is zero and the statistic
    /// and p-value are `NaN`.
    ///
    /// ```
    /// # use lungstat_stats::logrank::LogRankTest;
    /// let a = vec![(1.0, false), (2.0, false), (3.0, false)];
    /// let b = vec![(10.0, false), (11.0, false), (12.0, false)];
    /// let test = LogRankTest::compute(&a, &b);
    /// assert!(test.p_value < 0.05);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn compute(sample_a: &[(f64, bool)], sample_b: &[(f64, bool)]) -> Self {
        // (time, is_censored, in_sample_a)
        let mut pooled = sample_a
            .iter()
            .map(|&(t, c)| (t, c, true))
            .chain(sample_b.iter().map(|&(t, c)| (t, c, false)))
            .collect::<Vec<_>>();
        pooled.sort_by(|x, y| x.0.total_cmp(&y.0));

        let mut at_risk_a = sample_a.len();
        let mut at_risk_b = sample_b.len();
        let mut observed_a = 0;
        let mut observed_b = 0;
        let mut expected_a = 0.0;
        let mut variance = 0.0;

        let mut i = 0;
        while i < pooled.len() {
            let time = pooled[i].0;
            let mut events_a = 0;
            let mut events_b = 0;
            let mut removed_a = 0;
            let mut removed_b = 0;
            let mut j = i;
            while j < pooled.len() && pooled[j].0 == time {
                let (_, censored, in_a) = pooled[j];
                match (in_a, censored) {
                    (true, false) => events_a += 1,
                    (false, false) => events_b += 1,
                    _ => {}
                }
                if in_a {
                    removed_a += 1;
                } else {
                    removed_b += 1;
                }
                j += 1;
            }

            let events = events_a + events_b;
            if events > 0 {
                let n_a = at_risk_a as f64;
                let n = (at_risk_a + at_risk_b) as f64;
                let d = events as f64;
                expected_a += d * n_a / n;
                if n > 1.0 {
                    variance += d * (n_a / n) * (1.0 - n_a / n) * (n - d) / (n - 1.0);
                }
            }
            observed_a += events_a;
            observed_b += events_b;
            at_risk_a -= removed_a;
            at_risk_b -= removed_b;
            i = j;
        }

        let total_events = (observed_a + observed_b) as f64;
        let test_statistic = if variance > 0.0 {
            (observed_a as f64 - expected_a).powi(2) / variance
        } else {
            f64::NAN
        };
        let degrees_of_freedom = 1.0;
        let p_value = chi_squared_sf(test_statistic, degrees_of_freedom);

        Self {
            test_statistic,
            p_value,
            degrees_of_freedom,
            observed_a,
            expected_a,
            observed_b,
            expected_b: total_events - expected_a,
        }
    }
}

/// Upper-tail probability of a chi-squared distribution, `NaN` for a
/// non-finite statistic.
#[must_use]
pub fn chi_squared_sf(statistic: f64, degrees_of_freedom: f64) -> f64 {
    if !statistic.is_finite() {
        return f64::NAN;
    }
    ChiSquared::new(degrees_of_freedom).map_or(f64::NAN, |dist| dist.sf(statistic))
}
