//! intsite-rs: find viral-host chimeric reads and proviral integration sites
//! in name-sorted single-cell BAMs aligned to a combined host and viral
//! reference.
//!
//! # Library usage
//!
//! ```no_run
//! use intsite_rs::{ChimeraConfig, LtrCatalog, LtrSpec, ViralReferences};
//! use intsite_rs::pipeline::{RunContext, run};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let refs = ViralReferences::load(Path::new("hiv.fa"))?;
//! let catalog = LtrCatalog::build(&LtrSpec::Positions("1,634,9086,9719".parse()?), &refs)?;
//! let config = ChimeraConfig::default();
//! let stats = run(&RunContext {
//!     bam: Path::new("possorted_by_name.bam"),
//!     output_dir: Path::new("out"),
//!     refs: &refs,
//!     catalog: &catalog,
//!     aligner: None,
//!     config: &config,
//! })?;
//! println!("{} integration sites", stats.integration_sites);
//! # Ok(())
//! # }
//! ```

pub mod alignment;
pub mod bam_io;
pub mod cigar;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod dual_viral;
pub mod fasta;
pub mod grouping;
pub mod host_clip;
pub mod host_reads;
pub mod ltr;
pub mod mixed;
pub mod pipeline;
pub mod realign;
pub mod softclip;
pub mod viral_clip;

pub(crate) mod types;

pub use alignment::{AlignmentRecord, AltAlignment};
pub use cigar::{Cigar, CigarOp};
pub use config::ChimeraConfig;
pub use dataset::{CompiledDataset, IntegrationSite, ProviralFragment};
pub use fasta::ViralReferences;
pub use ltr::{LtrCatalog, LtrSpec};
