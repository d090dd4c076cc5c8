use anyhow::Result;
use clap::Parser;
use intsite_rs::cli::Args;
use intsite_rs::fasta::ViralReferences;
use intsite_rs::ltr::LtrCatalog;
use intsite_rs::pipeline::{self, RunContext};
use intsite_rs::realign::Aligner;
use mimalloc::MiMalloc;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if args.quiet {
            EnvFilter::new("warn")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let (ltr_spec, config) = args.validate()?;

    tracing::info!(fasta = %args.viral_fasta.display(), "loading viral references");
    let refs = ViralReferences::load(&args.viral_fasta)?;
    let catalog = LtrCatalog::build(&ltr_spec, &refs)?;
    tracing::info!(viral_seqs = refs.len(), ltr_entries = catalog.len(), "LTR catalog built");

    let aligner = args
        .host_index
        .as_ref()
        .map(|index| Aligner::new(&args.bwa, index));

    let stats = pipeline::run(&RunContext {
        bam: &args.in_bam,
        output_dir: &args.output_dir,
        refs: &refs,
        catalog: &catalog,
        aligner: aligner.as_ref(),
        config: &config,
    })?;
    tracing::info!(
        total_records = stats.total_records,
        skipped_records = stats.skipped_records,
        dual_viral_pairs = stats.dual_viral_pairs,
        host_clip_reads = stats.host_clip_reads,
        mixed_pairs = stats.mixed_pairs,
        chimera_candidates = stats.chimera_candidates,
        integration_sites = stats.integration_sites,
        fragments = stats.fragments,
        resumed = stats.resumed,
        "intsite-rs: processing complete"
    );
    Ok(())
}
