//! SVG charts for the report tools
//! Alejandro Gonzales-Irribarren, 2025

use plotters::prelude::*;

use std::path::Path;

use crate::{consts::MAX_PLOT_POINTS, utils::Summary};

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 400;

/// Keeps at most [`MAX_PLOT_POINTS`] evenly spaced values.
fn downsample(values: &[f64]) -> Vec<(f64, f64)> {
    let step = values.len().div_ceil(MAX_PLOT_POINTS).max(1);

    values
        .iter()
        .enumerate()
        .step_by(step)
        .map(|(x, y)| (x as f64, *y))
        .collect()
}

/// Line chart of window mutation rates by window start.
pub fn mutation_rates(output: &Path, rates: &[f64], window: usize) -> anyhow::Result<()> {
    let root = SVGBackend::new(output, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    let x_max = rates.len().max(1) as f64;
    let mut chart = ChartBuilder::on(&root)
        .caption("Mutation Rates Across the Sequences", ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..x_max, 0f64..1f64)?;

    chart
        .configure_mesh()
        .x_desc("Position")
        .y_desc("Mutation Rate")
        .draw()?;

    chart
        .draw_series(LineSeries::new(downsample(rates), &BLUE))?
        .label(format!("Window Length: {window}"))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

fn draw_box(
    area: &DrawingArea<SVGBackend<'_>, plotters::coord::Shift>,
    title: &str,
    label: &str,
    summary: &Summary,
) -> anyhow::Result<()> {
    let pad = ((summary.max - summary.min) * 0.05).max(1e-6);
    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..1f64, (summary.min - pad)..(summary.max + pad))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_x_axis()
        .y_desc(label)
        .draw()?;

    let lines = [
        vec![(0.5, summary.min), (0.5, summary.q1)],
        vec![(0.5, summary.q3), (0.5, summary.max)],
        vec![(0.4, summary.min), (0.6, summary.min)],
        vec![(0.4, summary.max), (0.6, summary.max)],
        vec![(0.3, summary.median), (0.7, summary.median)],
    ];

    chart
        .draw_series(std::iter::once(Rectangle::new(
            [(0.3, summary.q1), (0.7, summary.q3)],
            ShapeStyle::from(&BLUE).stroke_width(2),
        )))?;

    chart
        .draw_series(
            lines
                .into_iter()
                .map(|points| PathElement::new(points, ShapeStyle::from(&BLACK).stroke_width(2))),
        )?;

    Ok(())
}

/// Side by side box plots of sequence lengths and GC content.
pub fn length_gc_boxplots(
    output: &Path,
    lengths: &Summary,
    gc_percent: &Summary,
) -> anyhow::Result<()> {
    let root = SVGBackend::new(output, (WIDTH, HEIGHT + 200)).into_drawing_area();
    root.fill(&WHITE)?;

    let (left, right) = root.split_horizontally((WIDTH / 2) as i32);
    draw_box(&left, "Distribution of Sequence Lengths", "Length", lengths)?;
    draw_box(&right, "Distribution of GC Content", "GC Content (%)", gc_percent)?;

    root.present()?;
    Ok(())
}

/// Scatter plot of sequence length against GC content.
///
/// Lengths are drawn on a log axis; empty sequences sit on its origin.
pub fn length_gc_correlation(
    output: &Path,
    lengths: &[f64],
    gc_percent: &[f64],
    correlation: Option<f64>,
) -> anyhow::Result<()> {
    let root = SVGBackend::new(output, (WIDTH, HEIGHT + 200)).into_drawing_area();
    root.fill(&WHITE)?;

    let x_max = lengths.iter().copied().fold(1.0, f64::max);
    let title = match correlation {
        Some(r) => format!("Sequence Length vs GC Content (Pearson: {r:.2})"),
        None => "Sequence Length vs GC Content".to_string(),
    };

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d((1f64..x_max * 1.05).log_scale(), 0f64..100f64)?;

    chart
        .configure_mesh()
        .x_desc("Sequence Length (log scale)")
        .y_desc("GC Content (%)")
        .draw()?;

    chart.draw_series(
        lengths
            .iter()
            .zip(gc_percent)
            .map(|(&x, &y)| Circle::new((x.max(1.0), y), 2, BLUE.filled())),
    )?;

    root.present()?;
    Ok(())
}
