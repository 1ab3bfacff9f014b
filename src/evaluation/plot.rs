use anyhow::{anyhow, bail, Result};
use plotters::prelude::*;
use std::path::Path;

/// One histogram bucket: `[lower, upper)` and its sample count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width buckets spanning the finite values of `values`.
///
/// The maximum lands in the last bucket. Non-finite values are skipped.
pub fn histogram(values: &[f64], bins: usize) -> Vec<Bin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // Degenerate span: widen so every value still falls in a bucket
    let (lo, hi) = if max > min {
        (min, max)
    } else {
        (min - 0.5, max + 0.5)
    };
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0usize; bins];
    for v in finite {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| Bin {
            lower: lo + width * i as f64,
            upper: lo + width * (i + 1) as f64,
            count,
        })
        .collect()
}

/// Renders an SVG histogram of validation errors (prediction - label).
pub fn render_error_histogram(errors: &[f64], path: impl AsRef<Path>, bins: usize) -> Result<()> {
    let buckets = histogram(errors, bins);
    if buckets.is_empty() {
        bail!("no finite errors to plot");
    }
    let x_min = buckets[0].lower;
    let x_max = buckets[buckets.len() - 1].upper;
    let y_max = buckets.iter().map(|b| b.count).max().unwrap_or(0).max(1) as f64 * 1.05;

    let path = path.as_ref();
    let root = SVGBackend::new(path, (1024, 640)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow!("{}", e))?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(
            format!("Validation error distribution (n={})", errors.len()),
            ("sans-serif", 28),
        )
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, 0.0..y_max)
        .map_err(|e| anyhow!("{}", e))?;

    chart
        .configure_mesh()
        .x_desc("Prediction - BSM price")
        .y_desc("Count")
        .draw()
        .map_err(|e| anyhow!("{}", e))?;

    chart
        .draw_series(buckets.iter().map(|b| {
            Rectangle::new(
                [(b.lower, 0.0), (b.upper, b.count as f64)],
                BLUE.mix(0.6).filled(),
            )
        }))
        .map_err(|e| anyhow!("{}", e))?;

    root.present()
        .map_err(|e| anyhow!("failed to write {}: {}", path.display(), e))?;
    Ok(())
}
