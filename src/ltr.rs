//! Long terminal repeat regions of each viral reference.

use crate::fasta::ViralReferences;
use anyhow::{Context, Result, anyhow, bail};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

/// Minimum span of a match-table row to be considered an LTR.
pub const MIN_LTR_MATCH_LEN: u64 = 550;

/// Distance from a sequence edge within which a match counts as an LTR.
pub const DEFAULT_EDGE_BUFFER: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LtrVariant {
    FivePrime,
    FivePrimeRevComp,
    ThreePrime,
    ThreePrimeRevComp,
}

impl LtrVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            LtrVariant::FivePrime => "5p",
            LtrVariant::FivePrimeRevComp => "5pRevComp",
            LtrVariant::ThreePrime => "3p",
            LtrVariant::ThreePrimeRevComp => "3pRevComp",
        }
    }

    /// Variants whose junction edge is the first base of the stored sequence.
    pub fn is_start_anchored(self) -> bool {
        matches!(self, LtrVariant::FivePrime | LtrVariant::ThreePrimeRevComp)
    }

    pub fn is_reverse_complement(self) -> bool {
        matches!(
            self,
            LtrVariant::FivePrimeRevComp | LtrVariant::ThreePrimeRevComp
        )
    }
}

impl fmt::Display for LtrVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A derived LTR with its 1-based inclusive coordinates on the viral sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LtrRegion {
    pub start: u64,
    pub end: u64,
    pub seq: Vec<u8>,
    pub rev_comp: Vec<u8>,
}

impl LtrRegion {
    fn from_reference(reference: &[u8], start: u64, end: u64) -> Option<Self> {
        if start == 0 || start > end || end as usize > reference.len() {
            return None;
        }
        let seq = reference[(start - 1) as usize..end as usize].to_vec();
        let rev_comp = reverse_complement(&seq);
        Some(Self {
            start,
            end,
            seq,
            rev_comp,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LtrEntry {
    pub five_prime: Option<LtrRegion>,
    pub three_prime: Option<LtrRegion>,
}

impl LtrEntry {
    pub fn sequence(&self, variant: LtrVariant) -> Option<&[u8]> {
        match variant {
            LtrVariant::FivePrime => self.five_prime.as_ref().map(|r| r.seq.as_slice()),
            LtrVariant::FivePrimeRevComp => {
                self.five_prime.as_ref().map(|r| r.rev_comp.as_slice())
            }
            LtrVariant::ThreePrime => self.three_prime.as_ref().map(|r| r.seq.as_slice()),
            LtrVariant::ThreePrimeRevComp => {
                self.three_prime.as_ref().map(|r| r.rev_comp.as_slice())
            }
        }
    }

    pub fn region(&self, variant: LtrVariant) -> Option<&LtrRegion> {
        match variant {
            LtrVariant::FivePrime | LtrVariant::FivePrimeRevComp => self.five_prime.as_ref(),
            LtrVariant::ThreePrime | LtrVariant::ThreePrimeRevComp => self.three_prime.as_ref(),
        }
    }
}

/// Literal coordinates `5'start,5'end,3'start,3'end` (1-based, inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LtrPositions {
    pub five_start: u64,
    pub five_end: u64,
    pub three_start: u64,
    pub three_end: u64,
}

impl FromStr for LtrPositions {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let marks: Vec<u64> = s
            .split(',')
            .map(|v| v.trim().parse::<u64>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| anyhow!("LTR positions must be integers, got {s:?}"))?;
        let [five_start, five_end, three_start, three_end] = marks[..] else {
            bail!(
                "LTR positions must be 5' start, 5' end, 3' start, 3' end (ex: 1,634,9086,9719), got {s:?}"
            );
        };
        Ok(Self {
            five_start,
            five_end,
            three_start,
            three_end,
        })
    }
}

/// How the catalog is derived. Exactly one source per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LtrSpec {
    Positions(LtrPositions),
    MatchTable { path: PathBuf, edge_buffer: u64 },
}

/// LTR entries keyed by viral sequence id, in reference order.
#[derive(Debug, Clone, Default)]
pub struct LtrCatalog {
    entries: Vec<(String, LtrEntry)>,
}

impl LtrCatalog {
    pub fn build(spec: &LtrSpec, refs: &ViralReferences) -> Result<Self> {
        match spec {
            LtrSpec::Positions(positions) => Ok(Self::from_positions(positions, refs)),
            LtrSpec::MatchTable { path, edge_buffer } => {
                Self::from_match_table(path, refs, *edge_buffer)
            }
        }
    }

    /// Apply the same coordinates to every viral sequence.
    pub fn from_positions(positions: &LtrPositions, refs: &ViralReferences) -> Self {
        let mut catalog = Self::default();
        for id in refs.ids() {
            let Some(reference) = refs.get(id) else { continue };
            let five = LtrRegion::from_reference(reference, positions.five_start, positions.five_end);
            let three =
                LtrRegion::from_reference(reference, positions.three_start, positions.three_end);
            if five.is_none() || three.is_none() {
                warn!(
                    seq = %id,
                    len = reference.len(),
                    "LTR positions fall outside the viral sequence"
                );
                continue;
            }
            let entry = catalog.entry_mut(id);
            entry.five_prime = five;
            entry.three_prime = three;
        }
        catalog
    }

    pub fn from_match_table(path: &Path, refs: &ViralReferences, edge_buffer: u64) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open LTR match table {}", path.display()))?;
        Self::from_match_reader(BufReader::new(file), refs, edge_buffer)
    }

    /// Columns used (1-based): 2 subject id, 9 subject start, 10 subject end.
    pub fn from_match_reader<R: BufRead>(
        reader: R,
        refs: &ViralReferences,
        edge_buffer: u64,
    ) -> Result<Self> {
        let mut catalog = Self::default();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 10 {
                bail!(
                    "LTR match table line {}: expected at least 10 columns, found {}",
                    line_no + 1,
                    fields.len()
                );
            }
            let subject = fields[1];
            let parse = |s: &str| {
                s.trim().parse::<u64>().map_err(|_| {
                    anyhow!("LTR match table line {}: invalid coordinate {s:?}", line_no + 1)
                })
            };
            let sstart = parse(fields[8])?;
            let send = parse(fields[9])?;

            let Some(reference) = refs.get(subject) else {
                warn!(subject, line = line_no + 1, "LTR match subject is not a viral reference");
                continue;
            };
            let slen = reference.len() as u64;

            if sstart.abs_diff(send) < MIN_LTR_MATCH_LEN {
                continue;
            }
            if sstart < edge_buffer {
                if let Some(region) = LtrRegion::from_reference(reference, 1, send) {
                    catalog.entry_mut(subject).five_prime = Some(region);
                }
            } else if slen.saturating_sub(send) < edge_buffer {
                if let Some(region) = LtrRegion::from_reference(reference, sstart, slen) {
                    catalog.entry_mut(subject).three_prime = Some(region);
                }
            }
        }

        Ok(catalog)
    }

    fn entry_mut(&mut self, id: &str) -> &mut LtrEntry {
        let idx = match self.entries.iter().position(|(k, _)| k == id) {
            Some(idx) => idx,
            None => {
                self.entries.push((id.to_string(), LtrEntry::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].1
    }

    pub fn get(&self, id: &str) -> Option<&LtrEntry> {
        self.entries.iter().find(|(k, _)| k == id).map(|(_, e)| e)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LtrEntry)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Key naming a matched LTR variant: `<viralSeqId>___<variant>`.
pub fn ltr_key(id: &str, variant: LtrVariant) -> String {
    format!("{id}___{variant}")
}

/// Split a key produced by [`ltr_key`].
pub fn parse_ltr_key(key: &str) -> Option<(&str, LtrVariant)> {
    let (id, variant) = key.rsplit_once("___")?;
    let variant = match variant {
        "5p" => LtrVariant::FivePrime,
        "5pRevComp" => LtrVariant::FivePrimeRevComp,
        "3p" => LtrVariant::ThreePrime,
        "3pRevComp" => LtrVariant::ThreePrimeRevComp,
        _ => return None,
    };
    Some((id, variant))
}

pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|base| match *base {
            b'A' => b'T',
            b'T' => b'A',
            b'C' => b'G',
            b'G' => b'C',
            b'a' => b't',
            b't' => b'a',
            b'c' => b'g',
            b'g' => b'c',
            other => other,
        })
        .collect()
}
