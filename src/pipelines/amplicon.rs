use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use log::{debug, info, warn};

use crate::cli::Arguments;
use crate::config::defs::{
    PipelineError, RunConfig, STAGE_SUFFIXES, TRACK_LONG_FILE, TRACK_PLOT_FILE, TRACK_REPORT_FILE,
};
use crate::utils::checkpoint::{self, PipelineState};
use crate::utils::ingest;
use crate::utils::plotting::plot_read_survival;
use crate::utils::report::{write_long_tsv, write_wide_tsv};
use crate::utils::tracking::{Stage, build_tracking_table};

/// Read-provenance accounting over an amplicon pipeline's stage artifacts.
pub async fn run(config: Arc<RunConfig>) -> Result<(), PipelineError> {
    println!("\n-------------\n Read Tracking\n-------------\n");

    let state = match &config.args.resume_from {
        Some(ckpt) => {
            let path = resolve_path(ckpt, &config.cwd);
            info!("Resuming from checkpoint {}", path.display());
            checkpoint::load_state(&path)
                .map_err(|e| PipelineError::Checkpoint(e.to_string()))?
        }
        None => {
            let stage_dir = stage_dir(&config)?;
            info!("Reading stage artifacts from {}", stage_dir.display());
            load_pipeline_state(&stage_dir, &config.args)
                .map_err(|e| PipelineError::InvalidArtifact(e.to_string()))?
        }
    };

    if let Some(ckpt) = &config.args.checkpoint {
        let path = resolve_path(ckpt, &config.out_dir);
        checkpoint::save_state(&path, &state)
            .map_err(|e| PipelineError::Checkpoint(e.to_string()))?;
        info!("Wrote checkpoint to {}", path.display());
    }

    debug!("Tracking {} samples across {} stages", state.samples.len(), Stage::ALL.len());
    let table = build_tracking_table(
        &state.samples,
        &state.filter_counts,
        &state.denoised_f,
        &state.denoised_r,
        &state.merged,
        &state.nonchim,
    )?;

    for (sample, stage) in table.decay_violations() {
        warn!(
            "Sample '{}': read count rises at stage {}; upstream output is suspect",
            sample, stage
        );
    }

    let report_path = config.out_dir.join(TRACK_REPORT_FILE);
    write_wide_tsv(&table, &report_path)
        .await
        .map_err(|e| PipelineError::IOError(e.to_string()))?;
    info!("Wrote tracking table to {}", report_path.display());

    let long_path = config.out_dir.join(TRACK_LONG_FILE);
    write_long_tsv(&table, &long_path)
        .await
        .map_err(|e| PipelineError::IOError(e.to_string()))?;
    info!("Wrote long-form records to {}", long_path.display());

    if !config.args.no_plot {
        let plot_path = config.out_dir.join(TRACK_PLOT_FILE);
        plot_read_survival(&table, &plot_path)
            .map_err(|e| PipelineError::Plotting(e.to_string()))?;
        info!("Wrote read-survival plot to {}", plot_path.display());
    }

    let total_input: u64 = table.rows().iter().map(|r| r.input).sum();
    let total_nonchim: u64 = table.rows().iter().map(|r| r.nonchim).sum();
    let survival = if total_input > 0 {
        total_nonchim as f64 / total_input as f64 * 100.0
    } else {
        0.0
    };
    info!(
        "Tracked {} samples: {} of {} input reads survived to nonchim ({:.1}%)",
        table.samples().len(),
        total_nonchim,
        total_input,
        survival
    );

    Ok(())
}

/// Loads the five stage inputs from `dir`.
///
/// The filter-statistics row order is the canonical sample order unless the
/// caller overrides it with an explicit sample list.
pub fn load_pipeline_state(dir: &Path, args: &Arguments) -> Result<PipelineState> {
    let (order, filter_counts) = ingest::read_filter_stats(&dir.join(&args.filter_stats))?;
    let samples = match &args.samples {
        Some(explicit) => explicit.clone(),
        None => order,
    };

    let denoised_f = ingest::read_stage_uniques(dir, &samples, STAGE_SUFFIXES[&Stage::DenoisedF])?;
    let denoised_r = ingest::read_stage_uniques(dir, &samples, STAGE_SUFFIXES[&Stage::DenoisedR])?;
    let merged = ingest::read_stage_uniques(dir, &samples, STAGE_SUFFIXES[&Stage::Merged])?;
    let nonchim = ingest::read_sequence_table(&dir.join(&args.nonchim_table))?;

    Ok(PipelineState {
        samples,
        filter_counts,
        denoised_f,
        denoised_r,
        merged,
        nonchim,
    })
}

fn stage_dir(config: &RunConfig) -> Result<PathBuf, PipelineError> {
    let dir = config.args.stage_dir.as_ref().ok_or_else(|| {
        PipelineError::InvalidConfig("Stage directory required (-d)".to_string())
    })?;
    let path = resolve_path(dir, &config.cwd);
    if !path.is_dir() {
        return Err(PipelineError::InvalidConfig(format!(
            "Stage directory {} does not exist",
            path.display()
        )));
    }
    Ok(path)
}

fn resolve_path(raw: &str, base: &Path) -> PathBuf {
    let path = PathBuf::from(raw);
    if path.is_absolute() { path } else { base.join(path) }
}
