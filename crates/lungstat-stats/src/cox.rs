//! Cox proportional-hazards regression.
//!
//! The model is fitted by maximizing the partial likelihood with
//! Newton-Raphson iterations. Tied event times use Efron's approximation.
//! Covariates are centered internally for numerical stability; the partial
//! likelihood is invariant under centering so the reported coefficients are
//! those of the uncentered model.

use faer::{Mat, Side, linalg::solvers::Solve as _};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use statrs::distribution::{ContinuousCDF as _, Normal};

use crate::{logrank::chi_squared_sf, survival::normal_quantile};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum CoxError {
    #[display("no observations to fit")]
    EmptyData,
    #[display("model has no covariates")]
    NoCovariates,
    #[display("{what}: expected {expected} values, found {found}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[display("non-finite value in '{column}' at row {row}")]
    NonFiniteValue { row: usize, column: String },
    #[display("no events observed")]
    NoEvents,
    #[display("information matrix is singular")]
    SingularInformation,
    #[display("Newton-Raphson did not converge after {iterations} iterations")]
    NonConvergence { iterations: usize },
}

/// Validated input for a Cox model.
#[derive(Debug, Clone)]
pub struct CoxData {
    names: Vec<String>,
    durations: Vec<f64>,
    events: Vec<bool>,
    /// One row per observation, one column per covariate.
    covariates: Array2<f64>,
}

impl CoxData {
    /// Builds model input from durations, event indicators (`true` when the
    /// event occurred) and one covariate row per observation.
    ///
    /// Every value must be finite; missing covariates are not dropped
    /// silently.
    ///
    /// ```
    /// # use lungstat_stats::cox::{CoxData, CoxError};
    /// let data = CoxData::new(
    ///     vec!["age".to_owned()],
    ///     vec![5.0, 8.0],
    ///     vec![true, false],
    ///     vec![vec![61.0], vec![f64::NAN]],
    /// );
    /// assert!(matches!(data, Err(CoxError::NonFiniteValue { row: 1, .. })));
    /// ```
    pub fn new(
        names: Vec<String>,
        durations: Vec<f64>,
        events: Vec<bool>,
        covariates: Vec<Vec<f64>>,
    ) -> Result<Self, CoxError> {
        if names.is_empty() {
            return Err(CoxError::NoCovariates);
        }
        if durations.is_empty() {
            return Err(CoxError::EmptyData);
        }
        let n = durations.len();
        if events.len() != n {
            return Err(CoxError::LengthMismatch {
                what: "events",
                expected: n,
                found: events.len(),
            });
        }
        if covariates.len() != n {
            return Err(CoxError::LengthMismatch {
                what: "covariate rows",
                expected: n,
                found: covariates.len(),
            });
        }
        for (row, (&duration, values)) in durations.iter().zip(&covariates).enumerate() {
            if !duration.is_finite() {
                return Err(CoxError::NonFiniteValue {
                    row,
                    column: "duration".to_owned(),
                });
            }
            if values.len() != names.len() {
                return Err(CoxError::LengthMismatch {
                    what: "covariate columns",
                    expected: names.len(),
                    found: values.len(),
                });
            }
            if let Some(col) = values.iter().position(|v| !v.is_finite()) {
                return Err(CoxError::NonFiniteValue {
                    row,
                    column: names[col].clone(),
                });
            }
        }
        let covariates = Array2::from_shape_fn((n, names.len()), |(i, j)| covariates[i][j]);
        Ok(Self {
            names,
            durations,
            events,
            covariates,
        })
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.durations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.iter().filter(|e| **e).count()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CoxOptions {
    pub max_iterations: usize,
    /// Convergence threshold on the largest Newton step component.
    pub tolerance: f64,
}

impl Default for CoxOptions {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            tolerance: 1e-9,
        }
    }
}

const MAX_STEP_HALVINGS: usize = 30;

/// A fitted Cox proportional-hazards model.
#[derive(Debug, Clone)]
pub struct CoxModel {
    pub names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub standard_errors: Vec<f64>,
    /// Inverse of the observed information matrix at the estimate.
    pub covariance: Array2<f64>,
    /// Partial log-likelihood at the estimate.
    pub log_likelihood: f64,
    /// Partial log-likelihood of the model with all coefficients zero.
    pub null_log_likelihood: f64,
    pub iterations: usize,
    /// Harrell's concordance index of the linear predictor.
    pub concordance: f64,
    pub observations: usize,
    pub events: usize,
}

/// One row of a coefficient summary.
#[derive(Debug, Clone)]
pub struct CoefficientSummary {
    pub covariate: String,
    pub coef: f64,
    pub exp_coef: f64,
    pub se_coef: f64,
    pub coef_lower: f64,
    pub coef_upper: f64,
    pub exp_coef_lower: f64,
    pub exp_coef_upper: f64,
    /// Null-hypothesis value the coefficient is compared to.
    pub cmp_to: f64,
    pub z: f64,
    pub p: f64,
    pub neg_log2_p: f64,
}

/// Likelihood-ratio test of a fitted model against the null model.
#[derive(Debug, Clone, Copy)]
pub struct LikelihoodRatioTest {
    pub test_statistic: f64,
    pub degrees_of_freedom: usize,
    pub p_value: f64,
}

impl CoxModel {
    /// Fits the model by Newton-Raphson with step halving.
    pub fn fit(data: &CoxData, options: &CoxOptions) -> Result<Self, CoxError> {
        let events = data.event_count();
        if events == 0 {
            return Err(CoxError::NoEvents);
        }

        let centered = center(&data.covariates);
        let mut order = (0..data.len()).collect::<Vec<_>>();
        order.sort_by(|&a, &b| data.durations[b].total_cmp(&data.durations[a]));
        let partial = |beta: &Array1<f64>| efron_terms(data, &centered, &order, beta);

        let mut beta = Array1::zeros(data.names.len());
        let mut current = partial(&beta);
        let null_log_likelihood = current.log_likelihood;
        let mut iterations = 0;
        let mut converged = false;

        while iterations < options.max_iterations {
            iterations += 1;
            let inverse =
                invert_information(&current.information).ok_or(CoxError::SingularInformation)?;
            let step = inverse.dot(&current.gradient);

            let mut scale = 1.0;
            let mut halvings = 0;
            let (next_beta, next) = loop {
                let candidate = &beta + &(&step * scale);
                let terms = partial(&candidate);
                let tolerance = 1e-12 * current.log_likelihood.abs().max(1.0);
                if terms.log_likelihood.is_finite()
                    && terms.log_likelihood >= current.log_likelihood - tolerance
                {
                    break (candidate, terms);
                }
                halvings += 1;
                if halvings > MAX_STEP_HALVINGS {
                    return Err(CoxError::NonConvergence { iterations });
                }
                scale *= 0.5;
            };

            beta = next_beta;
            current = next;
            let largest = step.iter().fold(0.0_f64, |acc, s| acc.max(s.abs()));
            if largest < options.tolerance {
                converged = true;
                break;
            }
        }
        if !converged {
            return Err(CoxError::NonConvergence { iterations });
        }

        let covariance =
            invert_information(&current.information).ok_or(CoxError::SingularInformation)?;
        let standard_errors = covariance.diag().mapv(f64::sqrt).to_vec();
        let risk_scores = data.covariates.dot(&beta).to_vec();
        let concordance = concordance_index(&data.durations, &data.events, &risk_scores);

        Ok(Self {
            names: data.names.clone(),
            coefficients: beta.to_vec(),
            standard_errors,
            covariance,
            log_likelihood: current.log_likelihood,
            null_log_likelihood,
            iterations,
            concordance,
            observations: data.len(),
            events,
        })
    }

    /// Per-covariate Wald statistics with `1 - alpha` confidence intervals.
    ///
    /// p-values are two-sided and compared against a coefficient of zero.
    #[must_use]
    pub fn summary(&self, alpha: f64) -> Vec<CoefficientSummary> {
        let z_crit = normal_quantile(1.0 - alpha / 2.0);
        let normal = Normal::standard();
        self.names
            .iter()
            .zip(&self.coefficients)
            .zip(&self.standard_errors)
            .map(|((name, &coef), &se)| {
                let z = coef / se;
                let p = 2.0 * normal.sf(z.abs());
                let coef_lower = coef - z_crit * se;
                let coef_upper = coef + z_crit * se;
                CoefficientSummary {
                    covariate: name.clone(),
                    coef,
                    exp_coef: coef.exp(),
                    se_coef: se,
                    coef_lower,
                    coef_upper,
                    exp_coef_lower: coef_lower.exp(),
                    exp_coef_upper: coef_upper.exp(),
                    cmp_to: 0.0,
                    z,
                    p,
                    neg_log2_p: -p.log2(),
                }
            })
            .collect()
    }

    /// Likelihood-ratio test against the model with all coefficients zero.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn likelihood_ratio_test(&self) -> LikelihoodRatioTest {
        let degrees_of_freedom = self.coefficients.len();
        let test_statistic = 2.0 * (self.log_likelihood - self.null_log_likelihood);
        LikelihoodRatioTest {
            test_statistic,
            degrees_of_freedom,
            p_value: chi_squared_sf(test_statistic, degrees_of_freedom as f64),
        }
    }

    /// Akaike information criterion of the partial likelihood.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn partial_aic(&self) -> f64 {
        -2.0 * self.log_likelihood + 2.0 * self.coefficients.len() as f64
    }
}

struct EfronTerms {
    log_likelihood: f64,
    gradient: Array1<f64>,
    information: Array2<f64>,
}

fn center(rows: &Array2<f64>) -> Array2<f64> {
    match rows.mean_axis(Axis(0)) {
        Some(means) => rows - &means,
        None => rows.clone(),
    }
}

fn outer(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> Array2<f64> {
    Array2::from_shape_fn((a.len(), b.len()), |(i, j)| a[i] * b[j])
}

/// Partial log-likelihood, gradient and observed information under Efron's
/// tie handling. `order` sorts observations by descending duration.
#[expect(clippy::cast_precision_loss)]
fn efron_terms(
    data: &CoxData,
    x: &Array2<f64>,
    order: &[usize],
    beta: &Array1<f64>,
) -> EfronTerms {
    let p = beta.len();
    let mut log_likelihood = 0.0;
    let mut gradient = Array1::zeros(p);
    let mut information = Array2::zeros((p, p));

    // Running sums over the risk set
    let mut risk0 = 0.0;
    let mut risk1 = Array1::<f64>::zeros(p);
    let mut risk2 = Array2::<f64>::zeros((p, p));

    let mut i = 0;
    while i < order.len() {
        let time = data.durations[order[i]];
        let mut tie0 = 0.0;
        let mut tie1 = Array1::<f64>::zeros(p);
        let mut tie2 = Array2::<f64>::zeros((p, p));
        let mut deaths = 0_usize;

        let mut j = i;
        while j < order.len() && data.durations[order[j]] == time {
            let k = order[j];
            let xk = x.row(k);
            let eta = xk.dot(beta);
            let w = eta.exp();
            let xx = outer(&xk, &xk);
            risk0 += w;
            risk1.scaled_add(w, &xk);
            risk2.scaled_add(w, &xx);
            if data.events[k] {
                deaths += 1;
                tie0 += w;
                tie1.scaled_add(w, &xk);
                tie2.scaled_add(w, &xx);
                log_likelihood += eta;
                gradient += &xk;
            }
            j += 1;
        }

        for l in 0..deaths {
            let f = l as f64 / deaths as f64;
            let s0 = risk0 - f * tie0;
            let s1 = &risk1 - &(&tie1 * f);
            let s2 = &risk2 - &(&tie2 * f);
            let mean = s1 / s0;
            log_likelihood -= s0.ln();
            gradient -= &mean;
            information += &(s2 / s0);
            information -= &outer(&mean.view(), &mean.view());
        }
        i = j;
    }

    EfronTerms {
        log_likelihood,
        gradient,
        information,
    }
}

/// Smallest accepted squared Cholesky pivot, relative to the largest
/// diagonal entry.
const PIVOT_EPSILON: f64 = 1e-12;

/// Inverts a symmetric positive-definite information matrix through its
/// Cholesky factor.
///
/// Returns `None` for non-finite entries, or when a pivot vanishes relative
/// to the diagonal.
fn invert_information(information: &Array2<f64>) -> Option<Array2<f64>> {
    if information.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let (rows, cols) = information.dim();
    if rows != cols {
        return None;
    }
    let matrix = Mat::from_fn(rows, cols, |i, j| information[[i, j]]);
    let llt = matrix.as_ref().llt(Side::Lower).ok()?;

    let scale = information
        .diag()
        .iter()
        .fold(0.0_f64, |acc, v| acc.max(v.abs()))
        .max(1.0);
    let factor = llt.L();
    if (0..rows).any(|i| factor[(i, i)].powi(2) <= PIVOT_EPSILON * scale) {
        return None;
    }

    let identity = Mat::<f64>::identity(rows, cols);
    let inverse = llt.solve(identity.as_ref());
    Some(Array2::from_shape_fn((rows, cols), |(i, j)| inverse[(i, j)]))
}

/// Harrell's concordance index for risk scores where a higher score means
/// shorter expected survival.
///
/// A pair is comparable when the observation with the shorter time had an
/// event; equal times are comparable only when exactly the first one had the
/// event. Tied scores count as half-concordant. Returns `NaN` when no pair is
/// comparable.
///
/// ```
/// # use lungstat_stats::cox::concordance_index;
/// let times = [1.0, 2.0, 3.0];
/// let events = [true, true, true];
/// assert_eq!(concordance_index(&times, &events, &[3.0, 2.0, 1.0]), 1.0);
/// assert_eq!(concordance_index(&times, &events, &[1.0, 2.0, 3.0]), 0.0);
/// ```
#[must_use]
pub fn concordance_index(times: &[f64], events: &[bool], risk_scores: &[f64]) -> f64 {
    let mut concordant = 0.0;
    let mut comparable = 0.0;
    for i in 0..times.len() {
        if !events[i] {
            continue;
        }
        for j in 0..times.len() {
            if i == j {
                continue;
            }
            let is_comparable = times[i] < times[j] || (times[i] == times[j] && !events[j]);
            if !is_comparable {
                continue;
            }
            comparable += 1.0;
            if risk_scores[i] > risk_scores[j] {
                concordant += 1.0;
            } else if risk_scores[i] == risk_scores[j] {
                concordant += 0.5;
            }
        }
    }
    if comparable == 0.0 {
        f64::NAN
    } else {
        concordant / comparable
    }
}
