/// Single-blob persistence of the loaded pipeline state, so a run can be
/// resumed without re-reading the stage artifacts.
use std::fs;
use std::path::Path;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::utils::tracking::{FilterCounts, SampleMap, SequenceTable, Uniques};

/// Everything the tracker consumes: the canonical sample order plus the
/// five upstream stage inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    pub samples: Vec<String>,
    pub filter_counts: SampleMap<FilterCounts>,
    pub denoised_f: SampleMap<Uniques>,
    pub denoised_r: SampleMap<Uniques>,
    pub merged: SampleMap<Uniques>,
    pub nonchim: SequenceTable,
}

pub fn save_state(path: &Path, state: &PipelineState) -> Result<()> {
    let bytes = bincode::serde::encode_to_vec(state, bincode::config::standard())
        .map_err(|e| anyhow!("Failed to encode checkpoint: {}", e))?;
    fs::write(path, bytes)
        .map_err(|e| anyhow!("Failed to write checkpoint {}: {}", path.display(), e))?;
    Ok(())
}

pub fn load_state(path: &Path) -> Result<PipelineState> {
    let bytes = fs::read(path)
        .map_err(|e| anyhow!("Failed to read checkpoint {}: {}", path.display(), e))?;
    let (state, _) = bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
        .map_err(|e| anyhow!("Failed to decode checkpoint {}: {}", path.display(), e))?;
    Ok(state)
}
