use crate::alignment::AlignmentRecord;
use crate::bam_io::{BamInput, Checkpoint, write_bam};
use crate::config::ChimeraConfig;
use crate::dataset::{AssemblyInput, CompiledDataset};
use crate::dual_viral::resolve_dual_viral;
use crate::fasta::{ViralReferences, write_fasta};
use crate::grouping::{Buckets, NameGroups};
use crate::host_reads::resolve_host_reads;
use crate::ltr::LtrCatalog;
use crate::mixed::resolve_mixed;
use crate::realign::Aligner;
use anyhow::Result;
use noodles::sam;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const PROGRESS_INTERVAL: u64 = 10_000_000;

pub const VALID_PROVIRAL_READS_BAM: &str = "validProviralReads.bam";
pub const VALID_PROVIRAL_CHIMERA_BAM: &str = "validProviralReadsWithPotentialChimera.bam";
pub const HOST_CLIP_FASTA: &str = "viralReadHostClipFastaFn.fa";
pub const INTEGRATION_SITES_TSV: &str = "integrationSites.tsv";
pub const PROVIRAL_FRAGMENTS_TSV: &str = "proviralFragments.tsv";

#[derive(Debug, Default)]
pub struct Stats {
    pub total_records: u64,
    pub skipped_records: u64,
    pub dual_viral_pairs: u64,
    pub host_clip_reads: u64,
    pub mixed_pairs: u64,
    pub chimera_candidates: u64,
    pub integration_sites: u64,
    pub fragments: u64,
    pub resumed: bool,
}

/// Everything a run needs besides the alignment input.
pub struct RunContext<'a> {
    pub bam: &'a Path,
    pub output_dir: &'a Path,
    pub refs: &'a ViralReferences,
    pub catalog: &'a LtrCatalog,
    pub aligner: Option<&'a Aligner>,
    pub config: &'a ChimeraConfig,
}

impl RunContext<'_> {
    fn output(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }
}

pub fn run(ctx: &RunContext<'_>) -> Result<Stats> {
    let mut stats = Stats::default();

    let checkpoint = Checkpoint::in_dir(ctx.output_dir);
    let (header, buckets) = if checkpoint.exists() {
        info!("parsed BAM files already found; importing them");
        stats.resumed = true;
        checkpoint.load()?
    } else {
        info!(bam = %ctx.bam.display(), "parsing name-sorted BAM");
        let (header, buckets) = partition(ctx.bam, ctx.refs, ctx.config, &mut stats)?;
        info!("writing BAM files of parsed records");
        checkpoint.write(&header, &buckets)?;
        (header, buckets)
    };
    stats.dual_viral_pairs = buckets.dual_viral.len() as u64;
    stats.host_clip_reads = buckets.host_clip.record_count() as u64;
    stats.mixed_pairs = buckets.mixed.len() as u64;

    info!("finding valid chimeras from proviral reads");
    let dual = resolve_dual_viral(&buckets.dual_viral, ctx.refs, &ctx.config.host_clip_params());

    info!("finding valid unmapped reads that might span an integration site");
    let mixed = resolve_mixed(&buckets.mixed, ctx.refs, ctx.catalog, ctx.config);
    info!(
        valid_unmapped = mixed.valid_unmapped.len(),
        ltr_chimeras = mixed.ltr_chimeras.len(),
        potential = mixed.potential_chimeras.len(),
        "mixed pairs resolved"
    );

    let host_reads = if ctx.config.scan_host_reads {
        info!("finding valid chimeras from host reads");
        resolve_host_reads(&buckets.host_clip, ctx.catalog, ctx.config)
    } else {
        Vec::new()
    };

    let candidates: Vec<_> = dual
        .chimeras
        .iter()
        .chain(mixed.potential_chimeras.iter())
        .collect();
    stats.chimera_candidates = candidates.len() as u64;
    info!(candidates = candidates.len(), "potential valid chimeras found");

    let fasta_path = ctx.output(HOST_CLIP_FASTA);
    write_fasta(
        &fasta_path,
        candidates.iter().map(|c| (c.name(), c.clip_bases())),
    )?;

    let host_hits = match ctx.aligner {
        Some(aligner) => {
            info!("aligning host clips found on viruses to host genome");
            aligner.align(&fasta_path, ctx.config.host_clip_len)?
        }
        None => {
            warn!("no host genome index given; skipping host clip realignment");
            None
        }
    };

    let dataset = CompiledDataset::assemble(&AssemblyInput {
        dual: &dual,
        mixed: &mixed,
        host_reads: &host_reads,
        host_hits: host_hits.as_ref(),
        catalog: ctx.catalog,
    });
    stats.integration_sites = dataset.chimeric_reads().len() as u64;
    stats.fragments = dataset.fragments().len() as u64;

    info!("writing output tables and BAM files");
    dataset.write_integration_sites(&ctx.output(INTEGRATION_SITES_TSV))?;
    dataset.write_fragments(&ctx.output(PROVIRAL_FRAGMENTS_TSV))?;
    write_bam(&ctx.output(VALID_PROVIRAL_READS_BAM), &header, dual.valid_reads.iter())?;
    write_bam(
        &ctx.output(VALID_PROVIRAL_CHIMERA_BAM),
        &header,
        dual.chimeras.iter().map(|c| &c.record),
    )?;

    Ok(stats)
}

/// Stream the input once, routing records into buckets.
pub fn partition(
    bam: &Path,
    refs: &ViralReferences,
    config: &ChimeraConfig,
    stats: &mut Stats,
) -> Result<(sam::Header, Buckets)> {
    let mut input = BamInput::open(bam)?;
    let header = input.header.clone();
    let mut buckets = Buckets::new();

    let cap = config.max_records;
    let records = input
        .records()
        .take(cap.map_or(usize::MAX, |n| n as usize));

    for group in NameGroups::new(records) {
        for record in group? {
            stats.total_records += 1;
            if buckets.add(record, refs).is_none() {
                stats.skipped_records += 1;
            }
            if stats.total_records % PROGRESS_INTERVAL == 0 {
                info!(records = stats.total_records, "parsed records");
            }
        }
    }

    if cap.is_some_and(|n| stats.total_records >= n) {
        info!(records = stats.total_records, "record cap reached");
    }

    Ok((header, buckets))
}

/// Route records already in memory; same policy as [`partition`].
pub fn partition_records<I>(records: I, refs: &ViralReferences) -> Buckets
where
    I: IntoIterator<Item = AlignmentRecord>,
{
    let mut buckets = Buckets::new();
    for record in records {
        buckets.add(record, refs);
    }
    buckets
}
