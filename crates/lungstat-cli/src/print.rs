//! Console rendering of the report tables and model summaries

use lungstat_analysis::{
    survival::{SurvivalAnalysis, confidence_percent},
    table::ReportTable,
};
use lungstat_stats::{cox::CoxModel, survival::LifeTable};

/// Prints the descriptive table with one column per group.
pub fn print_report_table(report: &ReportTable) {
    let label_width = report
        .rows()
        .map(|(label, _)| label.chars().count())
        .max()
        .unwrap_or(0)
        .max(10);
    let value_width = report
        .rows()
        .flat_map(|(_, values)| values.iter().map(|v| v.chars().count()))
        .chain(report.groups().iter().map(|g| g.chars().count()))
        .max()
        .unwrap_or(0);

    print!("  {:<label_width$}", "");
    for group in report.groups() {
        print!(" {group:>value_width$}");
    }
    println!();
    println!(
        "  {}",
        "-".repeat(label_width + (value_width + 1) * report.groups().len())
    );
    for (label, values) in report.rows() {
        print!("  {label:<label_width$}");
        for value in values {
            print!(" {value:>value_width$}");
        }
        println!();
    }
}

fn median_str(median: Option<f64>) -> String {
    median.map_or("not reached".to_string(), |m| format!("{m:.1}"))
}

/// Prints observation counts and median survival of each curve.
pub fn print_survival_curves(analysis: &SurvivalAnalysis) {
    println!("Kaplan-Meier Estimates:");
    println!(
        "  {:<10} {:>8} {:>8} {:>12}",
        "Group", "Patients", "Events", "Median"
    );
    println!("  {}", "-".repeat(41));
    for stratum in [&analysis.overall, &analysis.male, &analysis.female] {
        println!(
            "  {:<10} {:>8} {:>8} {:>12}",
            stratum.name,
            stratum.curve.observations,
            stratum.events(),
            median_str(stratum.median()),
        );
    }
}

pub fn print_log_rank(analysis: &SurvivalAnalysis) {
    let test = &analysis.log_rank;
    println!(
        "Log-rank Test ({} vs {}):",
        analysis.male.name, analysis.female.name
    );
    println!(
        "  observed: {} / {}, expected: {:.2} / {:.2}",
        test.observed_a, test.observed_b, test.expected_a, test.expected_b
    );
    println!(
        "  chi-squared = {:.4} on {} df, p = {:.4}",
        test.test_statistic, test.degrees_of_freedom, test.p_value
    );
}

/// Prints the fitted Cox model in the usual summary layout.
pub fn print_cox_summary(model: &CoxModel, alpha: f64) {
    let level = confidence_percent(alpha);
    println!("Cox Proportional-Hazards Model:");
    println!("  duration = time, event = event");
    println!(
        "  observations: {}, events: {}, iterations: {}",
        model.observations, model.events, model.iterations
    );
    println!("  partial log-likelihood: {:.3}", model.log_likelihood);
    println!();

    let lower = format!("lower {level}%");
    let upper = format!("upper {level}%");
    println!(
        "  {:<10} {:>9} {:>9} {:>9} {:>10} {:>10} {:>8} {:>9} {:>9}",
        "covariate", "coef", "exp(coef)", "se(coef)", lower, upper, "z", "p", "-log2(p)"
    );
    println!("  {}", "-".repeat(93));
    for row in model.summary(alpha) {
        println!(
            "  {:<10} {:>9.4} {:>9.4} {:>9.4} {:>10.4} {:>10.4} {:>8.2} {:>9.4} {:>9.2}",
            row.covariate,
            row.coef,
            row.exp_coef,
            row.se_coef,
            row.exp_coef_lower,
            row.exp_coef_upper,
            row.z,
            row.p,
            row.neg_log2_p,
        );
    }
    println!("  (confidence limits are for exp(coef))");
    println!();

    let lr = model.likelihood_ratio_test();
    println!("  concordance = {:.3}", model.concordance);
    println!("  partial AIC = {:.2}", model.partial_aic());
    println!(
        "  log-likelihood ratio test = {:.2} on {} df, -log2(p) = {:.2}",
        lr.test_statistic,
        lr.degrees_of_freedom,
        -lr.p_value.log2()
    );
}

/// Prints the first `limit` rows of the life table.
pub fn print_life_table(table: &LifeTable, limit: usize) {
    println!("Life Table (first {} of {} rows):", limit.min(table.rows.len()), table.rows.len());
    println!(
        "  {:>10} {:>8} {:>9} {:>9} {:>9} {:>8}",
        "event_at", "removed", "observed", "censored", "entrance", "at_risk"
    );
    println!("  {}", "-".repeat(58));
    for row in table.rows.iter().take(limit) {
        println!(
            "  {:>10} {:>8} {:>9} {:>9} {:>9} {:>8}",
            row.event_at, row.removed, row.observed, row.censored, row.entrance, row.at_risk
        );
    }
}
