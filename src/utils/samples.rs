use std::path::{Path, PathBuf};

/// Known artifact extensions stripped before deriving a sample id.
const TABLE_EXTS: &[&str] = &["tsv", "txt", "csv", "gz"];

/// Strips trailing table extensions from a file name, innermost last.
/// "S1_R1.tsv.gz" -> "S1_R1"; unknown extensions are left alone.
fn strip_extensions(name: &str) -> &str {
    let mut stem = name;
    loop {
        match stem.rsplit_once('.') {
            Some((rest, ext)) if TABLE_EXTS.contains(&ext.to_ascii_lowercase().as_str()) => {
                stem = rest;
            }
            _ => return stem,
        }
    }
}

/// Derives a sample id from an input file name: the leading token of the
/// base name, before the first '_'.
///
/// Upstream stages key their outputs by input file name (e.g.
/// "S1_R1_filtered.fastq.gz"); the leading token is the sample id shared by
/// every stage.
///
/// # Arguments
///
/// * `name` - A file name or path as written by an upstream stage.
///
/// # Returns
///
/// The sample id, or `None` for paths without a usable base name.
pub fn sample_base(name: &str) -> Option<String> {
    let base = Path::new(name).file_name()?.to_str()?;
    let stem = strip_extensions(base);
    if stem.is_empty() {
        return None;
    }
    let token = stem.split('_').next().unwrap_or(stem);
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Path of a per-sample stage artifact: `<dir>/<sample><suffix>`.
pub fn stage_file(dir: &Path, sample: &str, suffix: &str) -> PathBuf {
    dir.join(format!("{}{}", sample, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_base_leading_token() {
        assert_eq!(sample_base("S1_R1.fastq_stats.tsv"), Some("S1".to_string()));
        assert_eq!(sample_base("S1_L001_R1_001.tsv.gz"), Some("S1".to_string()));
        assert_eq!(sample_base("/data/run3/S2_R1.tsv"), Some("S2".to_string()));
    }

    #[test]
    fn test_sample_base_without_delimiter() {
        assert_eq!(sample_base("S1.tsv"), Some("S1".to_string()));
        assert_eq!(sample_base("S1"), Some("S1".to_string()));
    }

    #[test]
    fn test_sample_base_keeps_unknown_extensions() {
        // Only table extensions are stripped; a dotted id survives.
        assert_eq!(sample_base("sample.v2.tsv"), Some("sample.v2".to_string()));
    }

    #[test]
    fn test_sample_base_rejects_empty() {
        assert_eq!(sample_base(""), None);
        assert_eq!(sample_base("_R1.tsv"), None);
    }

    #[test]
    fn test_stage_file_joins_suffix() {
        let path = stage_file(Path::new("/run"), "S1", "_denoisedF.tsv");
        assert_eq!(path, PathBuf::from("/run/S1_denoisedF.tsv"));
    }
}
