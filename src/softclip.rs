use crate::alignment::{AlignmentRecord, AltAlignment};
use crate::cigar::{Cigar, CigarOp};

/// Which end of the read carries the clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipEnd {
    FivePrime,
    ThreePrime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClippedFragment {
    /// The soft-clipped bases.
    pub bases: Vec<u8>,
    /// Up to `pad` aligned bases next to the clip.
    pub adjacent: Vec<u8>,
    pub end: ClipEnd,
    /// Alternate alignment whose CIGAR produced this clip, if any.
    pub alt: Option<AltAlignment>,
}

impl ClippedFragment {
    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }
}

/// Extract the single qualifying soft clip of `record`.
///
/// When `alt` is given its CIGAR replaces the primary one; the bases always
/// come from the primary record. Returns `None` unless the CIGAR has exactly
/// one soft clip, it is the first or last op, and it is at least `min_len`
/// long.
pub fn extract_soft_clip(
    record: &AlignmentRecord,
    alt: Option<&AltAlignment>,
    min_len: usize,
    pad: usize,
) -> Option<ClippedFragment> {
    let cigar = alt.map_or(&record.cigar, |a| &a.cigar);
    let (clip_len, end) = qualifying_clip(cigar, min_len)?;

    let seq = &record.sequence;
    if clip_len > seq.len() {
        return None;
    }

    let (bases, adjacent) = match end {
        ClipEnd::FivePrime => {
            let adj_end = (clip_len + pad).min(seq.len());
            (seq[..clip_len].to_vec(), seq[clip_len..adj_end].to_vec())
        }
        ClipEnd::ThreePrime => {
            let clip_start = seq.len() - clip_len;
            let adj_start = clip_start.saturating_sub(pad);
            (seq[clip_start..].to_vec(), seq[adj_start..clip_start].to_vec())
        }
    };

    Some(ClippedFragment {
        bases,
        adjacent,
        end,
        alt: alt.cloned(),
    })
}

fn qualifying_clip(cigar: &Cigar, min_len: usize) -> Option<(usize, ClipEnd)> {
    if cigar.soft_clip_count() != 1 {
        return None;
    }

    let passes = |op: Option<(u32, CigarOp)>| match op {
        Some((len, CigarOp::SoftClip)) if len as usize >= min_len => Some(len as usize),
        _ => None,
    };

    let five = passes(cigar.first());
    let three = passes(cigar.last());

    // A read that is nothing but clip sits at both ends.
    match (five, three) {
        (Some(len), None) => Some((len, ClipEnd::FivePrime)),
        (None, Some(len)) => Some((len, ClipEnd::ThreePrime)),
        _ => None,
    }
}
