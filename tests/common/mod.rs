#![allow(dead_code)]

use intsite_rs::alignment::{AlignmentRecord, AltAlignment};
use intsite_rs::cigar::Cigar;
use intsite_rs::fasta::ViralReferences;
use noodles::sam::alignment::record::Flags;

pub const VIRUS: &str = "HIV";

/// Deterministic pseudo-random ACGT sequence.
pub fn bases(seed: u64, len: usize) -> Vec<u8> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            b"ACGT"[(state >> 33) as usize % 4]
        })
        .collect()
}

pub fn viral_refs(seq: Vec<u8>) -> ViralReferences {
    let mut refs = ViralReferences::default();
    refs.insert(VIRUS, seq);
    refs
}

/// Fluent builder for test alignment records.
pub struct RecordBuilder {
    record: AlignmentRecord,
}

impl RecordBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            record: AlignmentRecord {
                name: name.to_string(),
                flags: Flags::SEGMENTED,
                mapping_quality: 60,
                ..AlignmentRecord::default()
            },
        }
    }

    pub fn reference(mut self, id: usize, name: &str, start: u64) -> Self {
        self.record.reference_sequence_id = Some(id);
        self.record.reference_name = Some(name.to_string());
        self.record.start = Some(start);
        self
    }

    pub fn mate(mut self, id: usize, name: &str, start: u64) -> Self {
        self.record.mate_reference_sequence_id = Some(id);
        self.record.mate_reference_name = Some(name.to_string());
        self.record.mate_start = Some(start);
        self
    }

    pub fn cigar(mut self, cigar: &str) -> Self {
        self.record.cigar = cigar.parse::<Cigar>().expect("valid CIGAR");
        self
    }

    pub fn sequence(mut self, seq: &[u8]) -> Self {
        self.record.sequence = seq.to_vec();
        self.record.quality_scores = vec![30; seq.len()];
        self
    }

    pub fn flag(mut self, flag: Flags) -> Self {
        self.record.flags.insert(flag);
        self
    }

    pub fn mapq(mut self, mapq: u8) -> Self {
        self.record.mapping_quality = mapq;
        self
    }

    pub fn barcode(mut self, barcode: &str) -> Self {
        self.record.cell_barcode = Some(barcode.to_string());
        self
    }

    pub fn alternates(mut self, tag: &str) -> Self {
        self.record.alternates = AltAlignment::parse_tag(tag).expect("valid XA");
        self.record.alt_tag = Some(tag.to_string());
        self
    }

    pub fn build(self) -> AlignmentRecord {
        self.record
    }
}

/// Unique scratch directory under the system temp dir.
pub fn scratch_dir(label: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("intsite-rs-{label}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}
