use crate::config::ChimeraConfig;
use crate::ltr::{DEFAULT_EDGE_BUFFER, LtrPositions, LtrSpec};
use anyhow::{Context, Result, bail};
use clap::{ArgGroup, Parser};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "intsite-rs",
    about = "Find viral-host chimeric reads and integration sites in single-cell BAMs",
    version
)]
#[command(group(ArgGroup::new("ltr").required(true).args(["ltr_positions", "ltr_matches"])))]
pub struct Args {
    /// Name-sorted BAM aligned to a combined host and viral reference
    pub in_bam: PathBuf,

    /// Directory for intermediate and final outputs
    #[arg(short = 'o', long = "output-dir", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Viral reference sequences (FASTA)
    #[arg(short = 'r', long = "viral-fasta", value_name = "FASTA")]
    pub viral_fasta: PathBuf,

    /// LTR coordinates applied to every viral sequence: 5'start,5'end,3'start,3'end
    #[arg(long, value_name = "S5,E5,S3,E3")]
    pub ltr_positions: Option<LtrPositions>,

    /// Tabular LTR self-match table
    #[arg(long, value_name = "TSV")]
    pub ltr_matches: Option<PathBuf>,

    /// Distance from a sequence end within which a match counts as an LTR
    #[arg(long, default_value_t = DEFAULT_EDGE_BUFFER)]
    pub ltr_edge_buffer: u64,

    /// Minimum soft clip matched against an LTR
    #[arg(long, default_value_t = 11)]
    pub ltr_clip_len: usize,

    /// Minimum soft clip realigned to the host genome
    #[arg(long, default_value_t = 17)]
    pub host_clip_len: usize,

    /// Slack between a clip and a sequence edge
    #[arg(long, default_value_t = 3)]
    pub soft_clip_pad: usize,

    /// Minimum MAPQ of the host mate in a mixed pair
    #[arg(long, default_value_t = 30)]
    pub min_host_mapq: u8,

    /// Stop after this many input records
    #[arg(short = 'n', long)]
    pub max_records: Option<u64>,

    /// Host genome index for realigning clips; realignment is skipped without it
    #[arg(short = 'x', long = "host-index", value_name = "PREFIX")]
    pub host_index: Option<PathBuf>,

    /// Aligner executable
    #[arg(long, default_value = "bwa")]
    pub bwa: PathBuf,

    /// Also look for LTR chimeras among clipped host read pairs
    #[arg(long)]
    pub scan_host_reads: bool,

    /// Set logging level to WARN
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

impl Args {
    /// Check inputs, create the output directory, and derive run settings.
    pub fn validate(&self) -> Result<(LtrSpec, ChimeraConfig)> {
        require_file(&self.in_bam, "input BAM")?;
        require_file(&self.viral_fasta, "viral FASTA")?;

        let ltr = match (&self.ltr_positions, &self.ltr_matches) {
            (Some(positions), None) => LtrSpec::Positions(*positions),
            (None, Some(path)) => {
                require_file(path, "LTR match table")?;
                LtrSpec::MatchTable {
                    path: path.clone(),
                    edge_buffer: self.ltr_edge_buffer,
                }
            }
            _ => bail!("exactly one of --ltr-positions and --ltr-matches is required"),
        };

        if self.ltr_clip_len == 0 || self.host_clip_len == 0 {
            bail!("clip lengths must be positive");
        }

        std::fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("failed to create output directory {}", self.output_dir.display())
        })?;

        let config = ChimeraConfig {
            ltr_clip_len: self.ltr_clip_len,
            host_clip_len: self.host_clip_len,
            soft_clip_pad: self.soft_clip_pad,
            min_host_mapq: self.min_host_mapq,
            max_records: self.max_records,
            scan_host_reads: self.scan_host_reads,
        };
        Ok((ltr, config))
    }
}

fn require_file(path: &Path, what: &str) -> Result<()> {
    if !path.is_file() {
        bail!("{what} not found: {}", path.display());
    }
    Ok(())
}
