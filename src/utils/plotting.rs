use anyhow::Result;
use plotters::prelude::*;
use std::path::Path;

use crate::utils::tracking::{Stage, TrackingTable};

/// Plots read survival across the pipeline stages, one line per sample.
pub fn plot_read_survival(table: &TrackingTable, output_path: &Path) -> Result<()> {
    if table.rows().is_empty() {
        return Err(anyhow::anyhow!("No tracking data available for plotting"));
    }

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    // Find max
    let max_count = table
        .rows()
        .iter()
        .flat_map(|row| Stage::ALL.iter().map(|&stage| row.get(stage)))
        .max()
        .unwrap_or(1)
        .max(1);

    let mut chart = ChartBuilder::on(&root)
        .caption("Reads surviving per stage", ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(60)
        .margin_right(20)
        .build_cartesian_2d(0usize..Stage::ALL.len() - 1, 0u64..max_count + max_count / 10)?;

    chart
        .configure_mesh()
        .x_labels(Stage::ALL.len())
        .x_label_formatter(&|idx| {
            Stage::ALL
                .get(*idx)
                .map(|s| s.to_string())
                .unwrap_or_default()
        })
        .x_desc("stage")
        .y_desc("reads")
        .draw()?;

    for (idx, (sample, row)) in table.samples().iter().zip(table.rows()).enumerate() {
        let color = Palette99::pick(idx);
        chart
            .draw_series(LineSeries::new(
                Stage::ALL
                    .iter()
                    .enumerate()
                    .map(|(i, &stage)| (i, row.get(stage))),
                &color,
            ))?
            .label(sample)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], Palette99::pick(idx))
            });
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;

    root.present()?;
    Ok(())
}
