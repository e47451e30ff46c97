/// Readers for the tabular artifacts the upstream pipeline stages leave
/// behind. All artifacts are TSV, optionally gzipped; `#`-prefixed and
/// blank lines are ignored.
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{Result, anyhow};
use flate2::read::GzDecoder;
use fxhash::FxHashMap;
use log::warn;
use ndarray::Array2;

use crate::config::defs::GZIP_EXT;
use crate::utils::file::is_gzipped;
use crate::utils::samples::{sample_base, stage_file};
use crate::utils::tracking::{FilterCounts, SampleMap, SequenceTable, Uniques};

pub enum TableReader {
    Plain(BufReader<File>),
    Gzipped(GzDecoder<File>),
}

impl Read for TableReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            TableReader::Plain(r) => r.read(buf),
            TableReader::Gzipped(r) => r.read(buf),
        }
    }
}

pub fn open_table(path: &Path) -> Result<BufReader<TableReader>> {
    let gzipped = is_gzipped(path)
        .map_err(|e| anyhow!("Failed to open {}: {}", path.display(), e))?;
    let file = File::open(path)
        .map_err(|e| anyhow!("Failed to open {}: {}", path.display(), e))?;
    let reader = if gzipped {
        TableReader::Gzipped(GzDecoder::new(file))
    } else {
        TableReader::Plain(BufReader::new(file))
    };
    Ok(BufReader::new(reader))
}

/// Data lines of an artifact, with their 1-based line numbers.
fn data_lines(path: &Path) -> Result<Vec<(usize, String)>> {
    let reader = open_table(path)?;
    let mut lines = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| anyhow!("Failed to read {}: {}", path.display(), e))?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        lines.push((idx + 1, line));
    }
    Ok(lines)
}

fn parse_count(field: &str, path: &Path, lineno: usize) -> Result<i64> {
    field.trim().parse::<i64>().map_err(|_| {
        anyhow!(
            "{} line {}: expected an integer count, got '{}'",
            path.display(),
            lineno,
            field
        )
    })
}

/// Reads the filter-statistics artifact: one row per sample,
/// `file_name<TAB>reads_in<TAB>reads_out`.
///
/// The first column is the input file name as the filter wrote it; the
/// sample id is its leading token. Row order defines the canonical sample
/// order for the whole run.
///
/// # Returns
///
/// The ordered sample ids and the per-sample raw/filtered counts.
pub fn read_filter_stats(path: &Path) -> Result<(Vec<String>, SampleMap<FilterCounts>)> {
    let mut order = Vec::new();
    let mut counts: SampleMap<FilterCounts> = FxHashMap::default();

    for (lineno, line) in data_lines(path)? {
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 3 {
            return Err(anyhow!(
                "{} line {}: expected 'file<TAB>reads_in<TAB>reads_out', got '{}'",
                path.display(),
                lineno,
                line
            ));
        }
        let sample = sample_base(parts[0]).ok_or_else(|| {
            anyhow!(
                "{} line {}: cannot derive a sample id from '{}'",
                path.display(),
                lineno,
                parts[0]
            )
        })?;
        let pair = FilterCounts {
            input: parse_count(parts[1], path, lineno)?,
            filtered: parse_count(parts[2], path, lineno)?,
        };
        if counts.insert(sample.clone(), pair).is_some() {
            return Err(anyhow!(
                "{} line {}: duplicate sample '{}'",
                path.display(),
                lineno,
                sample
            ));
        }
        order.push(sample);
    }

    Ok((order, counts))
}

/// Reads one sample's uniques artifact: `sequence<TAB>abundance` per row.
pub fn read_uniques(path: &Path) -> Result<Uniques> {
    let mut uniques = Uniques::default();
    for (lineno, line) in data_lines(path)? {
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 2 {
            return Err(anyhow!(
                "{} line {}: expected 'sequence<TAB>abundance', got '{}'",
                path.display(),
                lineno,
                line
            ));
        }
        let abundance = parse_count(parts[1], path, lineno)?;
        if uniques.insert(parts[0].to_string(), abundance).is_some() {
            return Err(anyhow!(
                "{} line {}: duplicate sequence entry",
                path.display(),
                lineno
            ));
        }
    }
    Ok(uniques)
}

/// Reads one stage's per-sample uniques artifacts from `dir`, located as
/// `<sample><suffix>` (or `.gz`). A sample whose artifact is absent gets no
/// map entry; the tracker reports it as missing at build time rather than
/// zero-filling here.
pub fn read_stage_uniques(
    dir: &Path,
    samples: &[String],
    suffix: &str,
) -> Result<SampleMap<Uniques>> {
    let mut per_sample: SampleMap<Uniques> = FxHashMap::default();
    for sample in samples {
        let path = stage_file(dir, sample, suffix);
        let gz_path = stage_file(dir, sample, &format!("{}.{}", suffix, GZIP_EXT));
        let path = if path.exists() {
            path
        } else if gz_path.exists() {
            gz_path
        } else {
            warn!(
                "No {}{} artifact for sample '{}' in {}; the tracker will report it as missing",
                sample,
                suffix,
                sample,
                dir.display()
            );
            continue;
        };
        per_sample.insert(sample.clone(), read_uniques(&path)?);
    }
    Ok(per_sample)
}

/// Reads the post-chimera-removal sequence table: a header of variant ids,
/// then one row per sample, `sample<TAB>count...`.
pub fn read_sequence_table(path: &Path) -> Result<SequenceTable> {
    let lines = data_lines(path)?;
    let mut iter = lines.into_iter();
    let (_, header) = iter
        .next()
        .ok_or_else(|| anyhow!("{}: empty sequence table", path.display()))?;
    let variants: Vec<String> = header
        .split('\t')
        .skip(1)
        .map(|v| v.trim().to_string())
        .collect();
    if variants.is_empty() {
        return Err(anyhow!(
            "{}: sequence table header has no variant columns",
            path.display()
        ));
    }

    let mut samples = Vec::new();
    let mut flat = Vec::new();
    for (lineno, line) in iter {
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() != variants.len() + 1 {
            return Err(anyhow!(
                "{} line {}: expected {} columns, got {}",
                path.display(),
                lineno,
                variants.len() + 1,
                parts.len()
            ));
        }
        samples.push(parts[0].trim().to_string());
        for field in &parts[1..] {
            flat.push(parse_count(field, path, lineno)?);
        }
    }

    let counts = Array2::from_shape_vec((samples.len(), variants.len()), flat)
        .map_err(|e| anyhow!("{}: malformed sequence table: {}", path.display(), e))?;
    SequenceTable::new(samples, variants, counts)
}
