//! Realign exported host clips to the host genome with `bwa mem`.

use crate::cigar::Cigar;
use crate::types::{HashMap, HashMapExt, HashSet, HashSetExt};
use anyhow::{Context, Result, bail};
use noodles::sam;
use std::ffi::OsString;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

/// One qualifying host-genome alignment of a clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostHit {
    pub reference_name: String,
    /// 0-based start.
    pub start: u64,
    /// 0-based inclusive end.
    pub end: u64,
    pub is_reverse: bool,
    pub mapping_quality: u8,
}

#[derive(Debug, Clone)]
pub struct Aligner {
    pub program: PathBuf,
    pub host_index: PathBuf,
}

impl Aligner {
    pub fn new(program: impl Into<PathBuf>, host_index: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            host_index: host_index.into(),
        }
    }

    /// Argument vector for `bwa mem`; seed and score derive from the clip length.
    pub fn args(&self, fasta: &Path, sam_out: &Path, host_clip_len: usize) -> Vec<OsString> {
        let score = host_clip_len;
        let seed = host_clip_len.saturating_sub(2).max(1);
        vec![
            "mem".into(),
            "-T".into(),
            score.to_string().into(),
            "-k".into(),
            seed.to_string().into(),
            "-a".into(),
            "-Y".into(),
            "-q".into(),
            self.host_index.clone().into_os_string(),
            fasta.as_os_str().to_os_string(),
            "-o".into(),
            sam_out.as_os_str().to_os_string(),
        ]
    }

    /// Align `fasta` and return its unique hits, or `None` when there is
    /// nothing to align.
    pub fn align(&self, fasta: &Path, host_clip_len: usize) -> Result<Option<HashMap<String, HostHit>>> {
        let is_empty = std::fs::metadata(fasta).map(|m| m.len() == 0).unwrap_or(true);
        if is_empty {
            info!("no records in clip FASTA; skipping alignment");
            return Ok(None);
        }

        let mut sam_out = fasta.as_os_str().to_os_string();
        sam_out.push(".sam");
        let sam_out = PathBuf::from(sam_out);

        let args = self.args(fasta, &sam_out, host_clip_len);
        info!(program = %self.program.display(), ?args, "aligning host clips");
        let status = Command::new(&self.program)
            .args(&args)
            .status()
            .with_context(|| format!("failed to run {}", self.program.display()))?;
        if !status.success() {
            bail!(
                "{} exited with status {:?} while aligning {}",
                self.program.display(),
                status.code(),
                fasta.display()
            );
        }

        read_unique_hits(&sam_out).map(Some)
    }
}

/// Read aligner output and keep fragments with exactly one hit of nonzero MAPQ.
pub fn read_unique_hits(path: &Path) -> Result<HashMap<String, HostHit>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open aligner output {}", path.display()))?;
    let mut reader = sam::io::Reader::new(BufReader::new(file));
    let header = reader.read_header()?;

    let mut hits = Vec::new();
    for result in reader.record_bufs(&header) {
        let record = result?;
        if record.flags().is_unmapped() {
            continue;
        }
        // Missing MAPQ (255) still counts as confident.
        let mapping_quality = record.mapping_quality().map(|q| q.get()).unwrap_or(255);
        if mapping_quality == 0 {
            continue;
        }
        let Some(name) = record.name().map(|n| n.to_string()) else { continue };
        let Some(reference_name) = record
            .reference_sequence_id()
            .and_then(|id| header.reference_sequences().get_index(id))
            .map(|(n, _)| n.to_string())
        else {
            continue;
        };
        let Some(start) = record.alignment_start().map(|p| (p.get() - 1) as u64) else {
            continue;
        };
        let cigar = Cigar::from_sam_ops(record.cigar().as_ref().iter().map(|op| Ok(*op)))?;
        let span = u64::from(cigar.reference_len()).max(1);

        hits.push((
            name,
            HostHit {
                reference_name,
                start,
                end: start + span - 1,
                is_reverse: record.flags().is_reverse_complemented(),
                mapping_quality,
            },
        ));
    }

    Ok(unique_hits(hits))
}

/// Drop every name that has more than one hit.
pub fn unique_hits<I>(hits: I) -> HashMap<String, HostHit>
where
    I: IntoIterator<Item = (String, HostHit)>,
{
    let mut unique: HashMap<String, HostHit> = HashMap::new();
    let mut repeated: HashSet<String> = HashSet::new();

    for (name, hit) in hits {
        if repeated.contains(&name) {
            continue;
        }
        if unique.remove(&name).is_some() {
            warn!(read = %name, "integration site can't be found due to multiple hits in host genome");
            repeated.insert(name);
            continue;
        }
        unique.insert(name, hit);
    }

    unique
}
