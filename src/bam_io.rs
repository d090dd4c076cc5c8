use crate::alignment::AlignmentRecord;
use crate::grouping::{Buckets, ReadPairs};
use anyhow::{Context, Result};
use noodles::{bam, bgzf, sam};
use sam::alignment::io::Write as _;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Dual-viral bucket; its presence marks a reusable checkpoint.
pub const PROVIRAL_READS_BAM: &str = "proviralReads.bam";
pub const HOST_WITH_POTENTIAL_CHIMERA_BAM: &str = "hostWithPotentialChimera.bam";
pub const UNMAPPED_WITH_POTENTIAL_CHIMERA_BAM: &str = "unmappedWithPotentialChimera.bam";

pub struct BamInput {
    pub header: sam::Header,
    reader: bam::io::Reader<bgzf::io::Reader<File>>,
}

impl BamInput {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open BAM {}", path.display()))?;
        let mut reader = bam::io::Reader::new(file);
        let header = reader
            .read_header()
            .with_context(|| format!("failed to read BAM header from {}", path.display()))?;
        Ok(Self { header, reader })
    }

    pub fn records(&mut self) -> impl Iterator<Item = Result<AlignmentRecord>> + '_ {
        let Self { header, reader } = self;
        let header: &sam::Header = header;
        reader.record_bufs(header).map(move |result| {
            let record = result?;
            AlignmentRecord::from_record_buf(&record, header)
        })
    }
}

pub fn write_bam<'a, I>(path: &Path, header: &sam::Header, records: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a AlignmentRecord>,
{
    let mut writer = bam::io::writer::Builder
        .build_from_path(path)
        .with_context(|| format!("failed to create BAM {}", path.display()))?;
    writer.write_header(header)?;
    let mut n = 0usize;
    for record in records {
        writer.write_alignment_record(header, &record.to_record_buf()?)?;
        n += 1;
    }
    writer.finish(header)?;
    Ok(n)
}

pub fn read_bam(path: &Path) -> Result<(sam::Header, Vec<AlignmentRecord>)> {
    let mut input = BamInput::open(path)?;
    let records = input.records().collect::<Result<Vec<_>>>()?;
    Ok((input.header, records))
}

/// Intermediate per-bucket BAMs in an output directory.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub dual_viral: PathBuf,
    pub host_clip: PathBuf,
    pub mixed: PathBuf,
}

impl Checkpoint {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            dual_viral: dir.join(PROVIRAL_READS_BAM),
            host_clip: dir.join(HOST_WITH_POTENTIAL_CHIMERA_BAM),
            mixed: dir.join(UNMAPPED_WITH_POTENTIAL_CHIMERA_BAM),
        }
    }

    pub fn exists(&self) -> bool {
        self.dual_viral.exists()
    }

    pub fn write(&self, header: &sam::Header, buckets: &Buckets) -> Result<()> {
        write_bam(&self.dual_viral, header, buckets.dual_viral.records())?;
        write_bam(&self.host_clip, header, buckets.host_clip.records())?;
        write_bam(&self.mixed, header, buckets.mixed.records())?;
        Ok(())
    }

    /// Reload every bucket; a missing optional bucket file loads empty.
    pub fn load(&self) -> Result<(sam::Header, Buckets)> {
        let (header, dual) = read_bam(&self.dual_viral)?;
        let load_pairs = |path: &Path| -> Result<ReadPairs> {
            if path.exists() {
                Ok(read_bam(path)?.1.into_iter().collect())
            } else {
                Ok(ReadPairs::new())
            }
        };
        let buckets = Buckets {
            dual_viral: dual.into_iter().collect(),
            host_clip: load_pairs(&self.host_clip)?,
            mixed: load_pairs(&self.mixed)?,
        };
        Ok((header, buckets))
    }
}
