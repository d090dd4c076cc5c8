//! One CIGAR representation shared by primary records and `XA` alternates.

use anyhow::{Result, anyhow, bail};
use noodles::sam::alignment::record::cigar::{Op as SamCigarOp, op::Kind as CigarKind};
use noodles::sam::alignment::record_buf::Cigar as SamCigar;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CigarOp {
    Match,
    Ins,
    Del,
    RefSkip,
    SoftClip,
    HardClip,
    Pad,
    Equal,
    Diff,
}

impl CigarOp {
    pub fn from_char(c: char) -> Option<Self> {
        let op = match c {
            'M' => CigarOp::Match,
            'I' => CigarOp::Ins,
            'D' => CigarOp::Del,
            'N' => CigarOp::RefSkip,
            'S' => CigarOp::SoftClip,
            'H' => CigarOp::HardClip,
            'P' => CigarOp::Pad,
            '=' => CigarOp::Equal,
            'X' => CigarOp::Diff,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_char(self) -> char {
        match self {
            CigarOp::Match => 'M',
            CigarOp::Ins => 'I',
            CigarOp::Del => 'D',
            CigarOp::RefSkip => 'N',
            CigarOp::SoftClip => 'S',
            CigarOp::HardClip => 'H',
            CigarOp::Pad => 'P',
            CigarOp::Equal => '=',
            CigarOp::Diff => 'X',
        }
    }

    pub fn consumes_reference(self) -> bool {
        matches!(
            self,
            CigarOp::Match | CigarOp::Del | CigarOp::RefSkip | CigarOp::Equal | CigarOp::Diff
        )
    }

    pub fn consumes_query(self) -> bool {
        matches!(
            self,
            CigarOp::Match | CigarOp::Ins | CigarOp::SoftClip | CigarOp::Equal | CigarOp::Diff
        )
    }

    fn from_kind(kind: CigarKind) -> Self {
        match kind {
            CigarKind::Match => CigarOp::Match,
            CigarKind::Insertion => CigarOp::Ins,
            CigarKind::Deletion => CigarOp::Del,
            CigarKind::Skip => CigarOp::RefSkip,
            CigarKind::SoftClip => CigarOp::SoftClip,
            CigarKind::HardClip => CigarOp::HardClip,
            CigarKind::Pad => CigarOp::Pad,
            CigarKind::SequenceMatch => CigarOp::Equal,
            CigarKind::SequenceMismatch => CigarOp::Diff,
        }
    }

    fn to_kind(self) -> CigarKind {
        match self {
            CigarOp::Match => CigarKind::Match,
            CigarOp::Ins => CigarKind::Insertion,
            CigarOp::Del => CigarKind::Deletion,
            CigarOp::RefSkip => CigarKind::Skip,
            CigarOp::SoftClip => CigarKind::SoftClip,
            CigarOp::HardClip => CigarKind::HardClip,
            CigarOp::Pad => CigarKind::Pad,
            CigarOp::Equal => CigarKind::SequenceMatch,
            CigarOp::Diff => CigarKind::SequenceMismatch,
        }
    }
}

/// Ordered `(length, op)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cigar {
    pub ops: Vec<(u32, CigarOp)>,
}

impl Cigar {
    pub fn new(ops: Vec<(u32, CigarOp)>) -> Self {
        Self { ops }
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn first(&self) -> Option<(u32, CigarOp)> {
        self.ops.first().copied()
    }

    pub fn last(&self) -> Option<(u32, CigarOp)> {
        self.ops.last().copied()
    }

    pub fn soft_clip_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|(_, op)| *op == CigarOp::SoftClip)
            .count()
    }

    /// Bases of the reference covered by the alignment.
    pub fn reference_len(&self) -> u32 {
        self.ops
            .iter()
            .filter(|(_, op)| op.consumes_reference())
            .map(|(len, _)| *len)
            .sum()
    }

    pub fn query_len(&self) -> u32 {
        self.ops
            .iter()
            .filter(|(_, op)| op.consumes_query())
            .map(|(len, _)| *len)
            .sum()
    }

    /// Build from the op iterator exposed by noodles records.
    pub fn from_sam_ops<I>(ops: I) -> Result<Self>
    where
        I: IntoIterator<Item = std::io::Result<SamCigarOp>>,
    {
        let mut out = Vec::new();
        for result in ops {
            let op = result?;
            let len = u32::try_from(op.len())
                .map_err(|_| anyhow!("CIGAR op length out of range: {}", op.len()))?;
            out.push((len, CigarOp::from_kind(op.kind())));
        }
        Ok(Self { ops: out })
    }

    pub fn to_sam_cigar(&self) -> SamCigar {
        self.ops
            .iter()
            .map(|(len, op)| SamCigarOp::new(op.to_kind(), *len as usize))
            .collect()
    }
}

impl FromStr for Cigar {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == "*" {
            return Ok(Self::default());
        }

        let mut ops = Vec::new();
        let mut len: Option<u32> = None;
        for c in s.chars() {
            if let Some(d) = c.to_digit(10) {
                let next = len
                    .unwrap_or(0)
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(d))
                    .ok_or_else(|| anyhow!("CIGAR op length overflow in {s:?}"))?;
                len = Some(next);
                continue;
            }
            let Some(op) = CigarOp::from_char(c) else {
                bail!("invalid CIGAR op {c:?} in {s:?}");
            };
            let Some(n) = len.take() else {
                bail!("CIGAR op {c:?} without a length in {s:?}");
            };
            ops.push((n, op));
        }
        if len.is_some() {
            bail!("trailing length without an op in CIGAR {s:?}");
        }

        Ok(Self { ops })
    }
}

impl fmt::Display for Cigar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ops.is_empty() {
            return f.write_str("*");
        }
        for (len, op) in &self.ops {
            write!(f, "{}{}", len, op.as_char())?;
        }
        Ok(())
    }
}
