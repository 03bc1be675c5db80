//! Kaplan-Meier plots rendered to SVG
//!
//! Each curve is drawn as a step line over a shaded confidence band.

use std::path::Path;

use anyhow::Context;
use lungstat_analysis::survival::StratumCurve;
use lungstat_stats::survival::step_path;
use plotters::prelude::*;

const TITLE: &str = "Overall survival in lung cancer patients";
const X_LABEL: &str = "Days of follow-up";
const Y_LABEL: &str = "Survival probability";
const SIZE: (u32, u32) = (800, 600);
const BAND_OPACITY: f64 = 0.25;
const PALETTE: [RGBColor; 2] = [RGBColor(31, 119, 180), RGBColor(255, 127, 14)];

/// The log-rank label sits at `max_time - 0.35 * max_time` on the time axis.
const ANNOTATION_OFFSET: f64 = 0.35;
const ANNOTATION_Y: f64 = 0.70;

struct Annotation<'a> {
    text: &'a str,
    at: (f64, f64),
}

/// Plots the curve of all patients, without a legend.
pub fn km_overall(path: &Path, curve: &StratumCurve) -> anyhow::Result<()> {
    draw_km(path, &[(curve, PALETTE[0])], None, false)
        .with_context(|| format!("Failed to draw plot: {}", path.display()))
}

/// Plots two curves with a legend and a log-rank annotation.
///
/// `max_time` is the longest follow-up of all patients and positions the
/// annotation.
pub fn km_by_sex(
    path: &Path,
    curves: [&StratumCurve; 2],
    log_rank: &str,
    max_time: f64,
) -> anyhow::Result<()> {
    let annotation = Annotation {
        text: log_rank,
        at: (max_time - ANNOTATION_OFFSET * max_time, ANNOTATION_Y),
    };
    let [first, second] = curves;
    draw_km(
        path,
        &[(first, PALETTE[0]), (second, PALETTE[1])],
        Some(&annotation),
        true,
    )
    .with_context(|| format!("Failed to draw plot: {}", path.display()))
}

/// Outline of the confidence band: the upper step path forward, then the
/// lower one backward.
fn band_polygon(stratum: &StratumCurve) -> Vec<(f64, f64)> {
    let curve = &stratum.curve;
    let upper = step_path(&curve.times, &stratum.upper, 1.0, curve.max_time);
    let lower = step_path(&curve.times, &stratum.lower, 1.0, curve.max_time);
    upper.into_iter().chain(lower.into_iter().rev()).collect()
}

fn draw_km(
    path: &Path,
    curves: &[(&StratumCurve, RGBColor)],
    annotation: Option<&Annotation>,
    legend: bool,
) -> anyhow::Result<()> {
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let max_time = curves
        .iter()
        .map(|(stratum, _)| stratum.curve.max_time)
        .fold(0.0, f64::max);
    let x_max = if max_time > 0.0 { max_time * 1.05 } else { 1.0 };

    let mut chart = ChartBuilder::on(&root)
        .caption(TITLE, ("sans-serif", 20))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..x_max, 0.0..1.0)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(X_LABEL)
        .y_desc(Y_LABEL)
        .draw()?;

    for &(stratum, color) in curves {
        chart.draw_series(std::iter::once(Polygon::new(
            band_polygon(stratum),
            color.mix(BAND_OPACITY),
        )))?;
        let series = chart.draw_series(LineSeries::new(
            stratum.curve.step_points(),
            color.stroke_width(2),
        ))?;
        if legend {
            series.label(stratum.name.as_str()).legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
        }
    }

    if let Some(annotation) = annotation {
        chart.draw_series(std::iter::once(Text::new(
            annotation.text.to_owned(),
            annotation.at,
            ("sans-serif", 15),
        )))?;
    }

    if legend {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()?;
    tracing::debug!(path = %path.display(), curves = curves.len(), "plot rendered");
    Ok(())
}
