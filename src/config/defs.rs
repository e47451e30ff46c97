use std::collections::HashMap;
use std::path::PathBuf;

use lazy_static::lazy_static;
use log::LevelFilter;
use thiserror::Error;

use crate::cli::Arguments;
use crate::utils::tracking::{Stage, TrackingError};

// Artifact and output names
pub const GZIP_EXT: &str = "gz";
pub const FILTER_STATS_FILE: &str = "filter_stats.tsv";
pub const NONCHIM_TABLE_FILE: &str = "seqtab_nonchim.tsv";
pub const DENOISED_F_SUFFIX: &str = "_denoisedF.tsv";
pub const DENOISED_R_SUFFIX: &str = "_denoisedR.tsv";
pub const MERGED_SUFFIX: &str = "_merged.tsv";
pub const TRACK_REPORT_FILE: &str = "track_report.tsv";
pub const TRACK_LONG_FILE: &str = "track_long.tsv";
pub const TRACK_PLOT_FILE: &str = "read_tracking.png";

lazy_static! {
    /// Per-sample artifact suffix for each uniques-producing stage.
    pub static ref STAGE_SUFFIXES: HashMap<Stage, &'static str> = {
        let mut m = HashMap::new();
        m.insert(Stage::DenoisedF, DENOISED_F_SUFFIX);
        m.insert(Stage::DenoisedR, DENOISED_R_SUFFIX);
        m.insert(Stage::Merged, MERGED_SUFFIX);

        m
    };
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("I/O error: {0}")]
    IOError(String),
    #[error("Invalid stage artifact: {0}")]
    InvalidArtifact(String),
    #[error("Read tracking failed: {0}")]
    Tracking(#[from] TrackingError),
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),
    #[error("Plotting error: {0}")]
    Plotting(String),
}

pub struct RunConfig {
    pub cwd: PathBuf,
    pub out_dir: PathBuf,
    pub args: Arguments,
    pub log_level: LevelFilter,
}
