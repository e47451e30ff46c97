/// Read-provenance accounting: how many reads survive each pipeline stage.
use std::collections::HashSet;
use std::fmt;

use fxhash::FxHashMap;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One sample's unique-sequence abundances at a single stage.
pub type Uniques = FxHashMap<String, i64>;

/// Per-sample lookup for a stage input, keyed by sample id.
pub type SampleMap<T> = FxHashMap<String, T>;

/// The fixed pipeline stages, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Input,
    Filtered,
    DenoisedF,
    DenoisedR,
    Merged,
    Nonchim,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Input,
        Stage::Filtered,
        Stage::DenoisedF,
        Stage::DenoisedR,
        Stage::Merged,
        Stage::Nonchim,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Input => "input",
            Stage::Filtered => "filtered",
            Stage::DenoisedF => "denoisedF",
            Stage::DenoisedR => "denoisedR",
            Stage::Merged => "merged",
            Stage::Nonchim => "nonchim",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackingError {
    #[error("no samples to track")]
    NoSamples,
    #[error("duplicate sample id '{0}' in sample list")]
    DuplicateSample(String),
    #[error("sample '{sample}' has no entry in the {stage} input")]
    MissingSample { sample: String, stage: Stage },
    #[error("negative count {value} for sample '{sample}' at stage {stage}")]
    MalformedCount {
        sample: String,
        stage: Stage,
        value: i64,
    },
}

/// Raw and surviving read counts from the quality-filtering stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCounts {
    pub input: i64,
    pub filtered: i64,
}

/// Sequence-by-sample abundance matrix after chimera removal.
///
/// Rows are samples, columns are surviving sequence variants. Row access is
/// by sample id only; callers never index rows positionally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceTable {
    samples: Vec<String>,
    variants: Vec<String>,
    counts: Array2<i64>,
}

impl SequenceTable {
    pub fn new(
        samples: Vec<String>,
        variants: Vec<String>,
        counts: Array2<i64>,
    ) -> anyhow::Result<Self> {
        if counts.dim() != (samples.len(), variants.len()) {
            return Err(anyhow::anyhow!(
                "sequence table shape {:?} does not match {} samples x {} variants",
                counts.dim(),
                samples.len(),
                variants.len()
            ));
        }
        Ok(SequenceTable {
            samples,
            variants,
            counts,
        })
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    /// Total abundance for one sample, summed across all sequence variants.
    /// `None` if the sample has no row in the table.
    pub fn row_sum(&self, sample: &str) -> Option<i64> {
        let idx = self.samples.iter().position(|s| s == sample)?;
        Some(self.counts.row(idx).sum())
    }
}

/// Read counts for one sample across all six stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageCounts {
    pub input: u64,
    pub filtered: u64,
    pub denoised_f: u64,
    pub denoised_r: u64,
    pub merged: u64,
    pub nonchim: u64,
}

impl StageCounts {
    pub fn get(&self, stage: Stage) -> u64 {
        match stage {
            Stage::Input => self.input,
            Stage::Filtered => self.filtered,
            Stage::DenoisedF => self.denoised_f,
            Stage::DenoisedR => self.denoised_r,
            Stage::Merged => self.merged,
            Stage::Nonchim => self.nonchim,
        }
    }
}

/// One cell of the tracking table in long (tidy) form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LongRecord<'a> {
    pub sample: &'a str,
    pub stage: Stage,
    pub count: u64,
}

/// The per-sample, per-stage read-tracking table.
///
/// Row order matches the sample order handed to [`build_tracking_table`];
/// column order is [`Stage::ALL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingTable {
    samples: Vec<String>,
    rows: Vec<StageCounts>,
}

impl TrackingTable {
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn rows(&self) -> &[StageCounts] {
        &self.rows
    }

    pub fn row(&self, sample: &str) -> Option<&StageCounts> {
        let idx = self.samples.iter().position(|s| s == sample)?;
        Some(&self.rows[idx])
    }

    pub fn get(&self, sample: &str, stage: Stage) -> Option<u64> {
        self.row(sample).map(|r| r.get(stage))
    }

    /// Cells in row-major order, one record per (sample, stage) pair.
    /// The iterator is restartable; each call walks the table afresh.
    pub fn long_form(&self) -> impl Iterator<Item = LongRecord<'_>> + '_ {
        self.samples.iter().zip(self.rows.iter()).flat_map(|(sample, row)| {
            Stage::ALL.iter().map(move |&stage| LongRecord {
                sample,
                stage,
                count: row.get(stage),
            })
        })
    }

    /// Stages where a sample's count rises above its upstream bound.
    ///
    /// A healthy run decays monotonically
    /// (nonchim <= merged <= min(denoisedF, denoisedR) <= filtered <= input);
    /// violations are a data-quality signal, not a structural error.
    pub fn decay_violations(&self) -> Vec<(&str, Stage)> {
        let mut violations = Vec::new();
        for (sample, row) in self.samples.iter().zip(self.rows.iter()) {
            if row.filtered > row.input {
                violations.push((sample.as_str(), Stage::Filtered));
            }
            if row.denoised_f > row.filtered {
                violations.push((sample.as_str(), Stage::DenoisedF));
            }
            if row.denoised_r > row.filtered {
                violations.push((sample.as_str(), Stage::DenoisedR));
            }
            if row.merged > row.denoised_f.min(row.denoised_r) {
                violations.push((sample.as_str(), Stage::Merged));
            }
            if row.nonchim > row.merged {
                violations.push((sample.as_str(), Stage::Nonchim));
            }
        }
        violations
    }
}

/// Sums the abundances of one sample's unique-sequence mapping.
/// An empty mapping sums to 0.
pub fn count_uniques(uniques: &Uniques) -> i64 {
    uniques.values().sum()
}

fn resolve(sample: &str, stage: Stage, value: i64) -> Result<u64, TrackingError> {
    u64::try_from(value).map_err(|_| TrackingError::MalformedCount {
        sample: sample.to_string(),
        stage,
        value,
    })
}

fn lookup<'a, T>(
    map: &'a SampleMap<T>,
    sample: &str,
    stage: Stage,
) -> Result<&'a T, TrackingError> {
    map.get(sample).ok_or_else(|| TrackingError::MissingSample {
        sample: sample.to_string(),
        stage,
    })
}

/// Builds the read-tracking table for `samples`, in order.
///
/// # Arguments
///
/// * `samples` - Canonical sample order; non-empty, no duplicates.
/// * `filter_counts` - Per-sample raw-input and post-filter read counts.
/// * `denoised_f`, `denoised_r`, `merged` - Per-sample uniques, reduced via
///   [`count_uniques`].
/// * `nonchim` - Post-chimera-removal sequence table, reduced via row sum.
///
/// # Returns
///
/// The full table, or the first error met. A sample absent from any stage
/// input is an error, never a silent zero; a genuinely-zero sample must be
/// handed in as an explicit empty entry.
pub fn build_tracking_table(
    samples: &[String],
    filter_counts: &SampleMap<FilterCounts>,
    denoised_f: &SampleMap<Uniques>,
    denoised_r: &SampleMap<Uniques>,
    merged: &SampleMap<Uniques>,
    nonchim: &SequenceTable,
) -> Result<TrackingTable, TrackingError> {
    if samples.is_empty() {
        return Err(TrackingError::NoSamples);
    }
    let mut seen = HashSet::new();
    for sample in samples {
        if !seen.insert(sample.as_str()) {
            return Err(TrackingError::DuplicateSample(sample.clone()));
        }
    }

    let mut rows = Vec::with_capacity(samples.len());
    for sample in samples {
        let filter = lookup(filter_counts, sample, Stage::Input)?;
        let nonchim_sum =
            nonchim
                .row_sum(sample)
                .ok_or_else(|| TrackingError::MissingSample {
                    sample: sample.clone(),
                    stage: Stage::Nonchim,
                })?;

        rows.push(StageCounts {
            input: resolve(sample, Stage::Input, filter.input)?,
            filtered: resolve(sample, Stage::Filtered, filter.filtered)?,
            denoised_f: resolve(
                sample,
                Stage::DenoisedF,
                count_uniques(lookup(denoised_f, sample, Stage::DenoisedF)?),
            )?,
            denoised_r: resolve(
                sample,
                Stage::DenoisedR,
                count_uniques(lookup(denoised_r, sample, Stage::DenoisedR)?),
            )?,
            merged: resolve(
                sample,
                Stage::Merged,
                count_uniques(lookup(merged, sample, Stage::Merged)?),
            )?,
            nonchim: resolve(sample, Stage::Nonchim, nonchim_sum)?,
        });
    }

    Ok(TrackingTable {
        samples: samples.to_vec(),
        rows,
    })
}
