//! Statistical routines for clinical survival data.
//!
//! This crate provides:
//!
//! - **Descriptive statistics**: count, mean, median, variance, standard deviation
//! - **Percentiles**: linearly interpolated order statistics
//! - **Survival analysis**: Kaplan-Meier estimator with Greenwood confidence
//!   bands, and life tables of event counts
//! - **Log-rank test**: two-sample comparison of survival distributions
//! - **Cox regression**: proportional-hazards model with Efron ties
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing samples
//! - [`percentiles`]: Percentile computation and storage
//! - [`survival`]: Kaplan-Meier curves and life tables
//! - [`logrank`]: Log-rank test
//! - [`cox`]: Cox proportional-hazards regression
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use lungstat_stats::descriptive::DescriptiveStats;
//!
//! let stats = DescriptiveStats::new([1.0, 2.0, 3.0, 4.0, 5.0]);
//! assert_eq!(stats.mean, 3.0);
//! ```
//!
//! ## Analyzing survival data
//!
//! ```
//! use lungstat_stats::survival::KaplanMeierCurve;
//!
//! // Data: (time, is_censored)
//! let data = vec![
//!     (10.0, false), // Event occurred at time 10
//!     (20.0, true),  // Censored at time 20
//!     (30.0, false), // Event occurred at time 30
//! ];
//! let curve = KaplanMeierCurve::from_data(data);
//! assert_eq!(curve.median_survival(), Some(30.0));
//! ```

pub mod cox;
pub mod descriptive;
pub mod logrank;
pub mod percentiles;
pub mod survival;
