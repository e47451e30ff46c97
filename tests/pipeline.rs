use std::io::Write;
use std::path::Path;

use anyhow::Result;
use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;

use ampliseq_track::Arguments;
use ampliseq_track::config::defs::{FILTER_STATS_FILE, NONCHIM_TABLE_FILE};
use ampliseq_track::pipelines::amplicon::load_pipeline_state;
use ampliseq_track::utils::checkpoint::{load_state, save_state};
use ampliseq_track::utils::report::{write_long_tsv, write_wide_tsv};
use ampliseq_track::utils::tracking::{Stage, TrackingError, build_tracking_table};

fn write_artifact(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).unwrap();
}

/// Lays down the two-sample artifact set: S1 surviving 1000 -> 800 reads,
/// S2 surviving 800 -> 390.
fn write_scenario(dir: &Path) {
    write_artifact(
        dir,
        FILTER_STATS_FILE,
        "# file\treads_in\treads_out\n\
         S1_R1.fastq.gz\t1000\t900\n\
         S2_R1.fastq.gz\t800\t750\n",
    );
    write_artifact(dir, "S1_denoisedF.tsv", "seqA\t500\nseqB\t380\n");
    write_artifact(dir, "S2_denoisedF.tsv", "seqA\t400\n");
    write_artifact(dir, "S1_denoisedR.tsv", "seqA\t490\nseqB\t380\n");
    write_artifact(dir, "S2_denoisedR.tsv", "seqA\t400\n");
    write_artifact(dir, "S1_merged.tsv", "m1\t850\n");
    write_artifact(dir, "S2_merged.tsv", "m1\t390\n");
    write_artifact(dir, NONCHIM_TABLE_FILE, "sample\tm1\nS1\t800\nS2\t390\n");
}

fn test_args() -> Arguments {
    Arguments {
        filter_stats: FILTER_STATS_FILE.to_string(),
        nonchim_table: NONCHIM_TABLE_FILE.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_track_end_to_end() -> Result<()> {
    let stage_dir = TempDir::new()?;
    write_scenario(stage_dir.path());

    let state = load_pipeline_state(stage_dir.path(), &test_args())?;
    assert_eq!(state.samples, vec!["S1".to_string(), "S2".to_string()]);

    let table = build_tracking_table(
        &state.samples,
        &state.filter_counts,
        &state.denoised_f,
        &state.denoised_r,
        &state.merged,
        &state.nonchim,
    )?;

    let s1 = table.row("S1").unwrap();
    assert_eq!(
        (s1.input, s1.filtered, s1.denoised_f, s1.denoised_r, s1.merged, s1.nonchim),
        (1000, 900, 880, 870, 850, 800)
    );
    let s2 = table.row("S2").unwrap();
    assert_eq!(
        (s2.input, s2.filtered, s2.denoised_f, s2.denoised_r, s2.merged, s2.nonchim),
        (800, 750, 400, 400, 390, 390)
    );
    assert!(table.decay_violations().is_empty());

    let out_dir = TempDir::new()?;
    let wide_path = out_dir.path().join("track_report.tsv");
    write_wide_tsv(&table, &wide_path).await?;
    let wide = std::fs::read_to_string(&wide_path)?;
    assert_eq!(
        wide,
        "sample\tinput\tfiltered\tdenoisedF\tdenoisedR\tmerged\tnonchim\n\
         S1\t1000\t900\t880\t870\t850\t800\n\
         S2\t800\t750\t400\t400\t390\t390\n"
    );

    let long_path = out_dir.path().join("track_long.tsv");
    write_long_tsv(&table, &long_path).await?;
    let long = std::fs::read_to_string(&long_path)?;
    let lines: Vec<&str> = long.lines().collect();
    assert_eq!(lines.len(), 1 + 2 * 6);
    assert_eq!(lines[0], "sample\tstage\tcount");
    assert_eq!(lines[1], "S1\tinput\t1000");
    assert_eq!(lines[12], "S2\tnonchim\t390");
    Ok(())
}

#[tokio::test]
async fn test_gzipped_artifacts_are_read() -> Result<()> {
    let stage_dir = TempDir::new()?;
    write_scenario(stage_dir.path());

    // Replace S2's merged artifact with a gzipped copy.
    std::fs::remove_file(stage_dir.path().join("S2_merged.tsv"))?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(b"m1\t390\n")?;
    std::fs::write(stage_dir.path().join("S2_merged.tsv.gz"), encoder.finish()?)?;

    let state = load_pipeline_state(stage_dir.path(), &test_args())?;
    let table = build_tracking_table(
        &state.samples,
        &state.filter_counts,
        &state.denoised_f,
        &state.denoised_r,
        &state.merged,
        &state.nonchim,
    )?;
    assert_eq!(table.get("S2", Stage::Merged), Some(390));
    Ok(())
}

#[tokio::test]
async fn test_missing_stage_artifact_surfaces_as_error() -> Result<()> {
    let stage_dir = TempDir::new()?;
    write_scenario(stage_dir.path());
    std::fs::remove_file(stage_dir.path().join("S2_denoisedF.tsv"))?;

    let state = load_pipeline_state(stage_dir.path(), &test_args())?;
    let err = build_tracking_table(
        &state.samples,
        &state.filter_counts,
        &state.denoised_f,
        &state.denoised_r,
        &state.merged,
        &state.nonchim,
    )
    .unwrap_err();
    assert_eq!(
        err,
        TrackingError::MissingSample {
            sample: "S2".to_string(),
            stage: Stage::DenoisedF,
        }
    );
    Ok(())
}

#[tokio::test]
async fn test_explicit_sample_order_overrides_filter_table() -> Result<()> {
    let stage_dir = TempDir::new()?;
    write_scenario(stage_dir.path());

    let args = Arguments {
        samples: Some(vec!["S2".to_string(), "S1".to_string()]),
        ..test_args()
    };
    let state = load_pipeline_state(stage_dir.path(), &args)?;
    assert_eq!(state.samples, vec!["S2".to_string(), "S1".to_string()]);

    let table = build_tracking_table(
        &state.samples,
        &state.filter_counts,
        &state.denoised_f,
        &state.denoised_r,
        &state.merged,
        &state.nonchim,
    )?;
    assert_eq!(table.samples(), ["S2".to_string(), "S1".to_string()]);
    assert_eq!(table.rows()[0].input, 800);
    Ok(())
}

#[tokio::test]
async fn test_checkpoint_resume_matches_fresh_load() -> Result<()> {
    let stage_dir = TempDir::new()?;
    write_scenario(stage_dir.path());

    let state = load_pipeline_state(stage_dir.path(), &test_args())?;
    let ckpt = stage_dir.path().join("state.ckpt");
    save_state(&ckpt, &state)?;
    let resumed = load_state(&ckpt)?;
    assert_eq!(resumed, state);

    let table = build_tracking_table(
        &resumed.samples,
        &resumed.filter_counts,
        &resumed.denoised_f,
        &resumed.denoised_r,
        &resumed.merged,
        &resumed.nonchim,
    )?;
    assert_eq!(table.get("S1", Stage::Nonchim), Some(800));
    Ok(())
}
