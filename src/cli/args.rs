use clap::Parser;

use crate::config::defs::{FILTER_STATS_FILE, NONCHIM_TABLE_FILE};

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "ampliseq-track", version)]
pub struct Arguments {
    #[arg(short, long)]
    pub module: String,

    #[arg(short = 'v', long = "verbose", action)]
    pub verbose: bool,

    #[arg(short = 'd', long = "stage-dir", help = "Directory holding the upstream stage artifacts")]
    pub stage_dir: Option<String>,

    #[arg(short = 'o', long = "out", help = "Output directory for all generated files. If not specified, a directory named '<stage_dir base>_track_YYYYMMDD' will be created in the current working directory.")]
    pub out_dir: Option<String>,

    #[arg(long, default_value = FILTER_STATS_FILE, help = "Filter statistics artifact, relative to the stage directory")]
    pub filter_stats: String,

    #[arg(long, default_value = NONCHIM_TABLE_FILE, help = "Post-chimera-removal sequence table, relative to the stage directory")]
    pub nonchim_table: String,

    #[clap(
        long,
        value_delimiter = ',',
        help = "Comma-separated sample ids overriding the filter-table row order (e.g., S1,S2)"
    )]
    pub samples: Option<Vec<String>>,

    #[arg(long, help = "Write the loaded pipeline state to this checkpoint file")]
    pub checkpoint: Option<String>,

    #[arg(long, help = "Load the pipeline state from this checkpoint instead of reading stage artifacts")]
    pub resume_from: Option<String>,

    #[arg(long, default_value_t = false)]
    pub no_plot: bool,
}
