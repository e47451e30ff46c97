/// TSV reports for the tracking table, wide and long form.
use std::path::Path;

use anyhow::{Result, anyhow};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::utils::tracking::{Stage, TrackingTable};

async fn write_tsv(path: &Path, content: &str) -> Result<()> {
    let mut file = File::create(path)
        .await
        .map_err(|e| anyhow!("Failed to create output file {}: {}", path.display(), e))?;
    file.write_all(content.as_bytes())
        .await
        .map_err(|e| anyhow!("Failed to write to output file {}: {}", path.display(), e))?;
    file.flush()
        .await
        .map_err(|e| anyhow!("Failed to flush output file {}: {}", path.display(), e))?;
    Ok(())
}

/// Wide form: header `sample` + the six stage columns, one row per sample.
pub async fn write_wide_tsv(table: &TrackingTable, path: &Path) -> Result<()> {
    let mut content = String::from("sample");
    for stage in Stage::ALL {
        content.push('\t');
        content.push_str(stage.as_str());
    }
    content.push('\n');

    for (sample, row) in table.samples().iter().zip(table.rows()) {
        content.push_str(sample);
        for stage in Stage::ALL {
            content.push_str(&format!("\t{}", row.get(stage)));
        }
        content.push('\n');
    }

    write_tsv(path, &content).await
}

/// Long form: `sample<TAB>stage<TAB>count`, row-major. This is the shape
/// the plotting layer charts one series per sample from.
pub async fn write_long_tsv(table: &TrackingTable, path: &Path) -> Result<()> {
    let mut content = String::from("sample\tstage\tcount\n");
    for record in table.long_form() {
        content.push_str(&format!(
            "{}\t{}\t{}\n",
            record.sample, record.stage, record.count
        ));
    }
    write_tsv(path, &content).await
}
