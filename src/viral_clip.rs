//! Does a clip on a host-aligned read run into a viral LTR edge?

use crate::alignment::AlignmentRecord;
use crate::ltr::{LtrCatalog, LtrVariant, ltr_key};
use crate::softclip::{ClipEnd, ClippedFragment, extract_soft_clip};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Plus,
    Minus,
}

impl Orientation {
    pub fn as_char(self) -> char {
        match self {
            Orientation::Plus => '+',
            Orientation::Minus => '-',
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Plus => f.write_str("plus"),
            Orientation::Minus => f.write_str("minus"),
        }
    }
}

/// Match offsets of the clip within each matched LTR variant, by orientation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HitBucket {
    pub offsets: Vec<Vec<usize>>,
    pub keys: Vec<String>,
}

impl HitBucket {
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChimeraHits {
    pub plus: HitBucket,
    pub minus: HitBucket,
    pub clip: ClippedFragment,
}

impl ChimeraHits {
    /// The single populated orientation of an accepted bundle.
    pub fn orientation(&self) -> Orientation {
        if self.plus.is_empty() {
            Orientation::Minus
        } else {
            Orientation::Plus
        }
    }

    pub fn bucket(&self) -> &HitBucket {
        match self.orientation() {
            Orientation::Plus => &self.plus,
            Orientation::Minus => &self.minus,
        }
    }

    pub fn clip_end(&self) -> ClipEnd {
        self.clip.end
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ViralClipParams {
    pub min_clip_len: usize,
    pub pad: usize,
    pub check_orientation: bool,
}

/// LTR variants a clip may match, with the orientation a match implies.
fn eligible_variants(end: ClipEnd) -> [(LtrVariant, Orientation); 2] {
    match end {
        ClipEnd::FivePrime => [
            (LtrVariant::ThreePrime, Orientation::Plus),
            (LtrVariant::FivePrimeRevComp, Orientation::Minus),
        ],
        ClipEnd::ThreePrime => [
            (LtrVariant::FivePrime, Orientation::Plus),
            (LtrVariant::ThreePrimeRevComp, Orientation::Minus),
        ],
    }
}

/// Classify the soft clip of a host-aligned read against every LTR.
///
/// Returns hits only when at least one LTR edge explains the clip and all
/// explanations agree on orientation.
pub fn classify_viral_clip(
    record: &AlignmentRecord,
    catalog: &LtrCatalog,
    params: &ViralClipParams,
) -> Option<ChimeraHits> {
    let clip = extract_soft_clip(record, None, params.min_clip_len, params.pad)?;

    if params.check_orientation {
        match clip.end {
            ClipEnd::FivePrime if record.is_reverse() => return None,
            // Inspects the mate's strand bit, unlike the 5' case.
            ClipEnd::ThreePrime if record.is_mate_reverse() => return None,
            _ => {}
        }
    }

    if !clip.bases.iter().all(|b| matches!(b, b'A' | b'T' | b'G' | b'C')) {
        return None;
    }

    let mut plus = HitBucket::default();
    let mut minus = HitBucket::default();

    for (id, entry) in catalog.iter() {
        for (variant, orientation) in eligible_variants(clip.end) {
            let Some(ltr) = entry.sequence(variant) else { continue };
            let Some(offsets) = edge_match(ltr, &clip, variant, &record.sequence, params.pad)
            else {
                continue;
            };

            debug!(read = %record.name, key = %ltr_key(id, variant), "chimeric LTR match");
            let bucket = match orientation {
                Orientation::Plus => &mut plus,
                Orientation::Minus => &mut minus,
            };
            bucket.offsets.push(offsets);
            bucket.keys.push(ltr_key(id, variant));
        }
    }

    if plus.is_empty() == minus.is_empty() {
        if !plus.is_empty() {
            debug!(read = %record.name, "clip matches LTRs in both orientations");
        }
        return None;
    }

    Some(ChimeraHits { plus, minus, clip })
}

/// Offsets of `clip` in `ltr` when the match sits at the junction edge of the
/// variant and any LTR overhang past the match is also present on the read.
fn edge_match(
    ltr: &[u8],
    clip: &ClippedFragment,
    variant: LtrVariant,
    read: &[u8],
    pad: usize,
) -> Option<Vec<usize>> {
    let offsets = find_all(ltr, &clip.bases);
    let first = *offsets.first()?;
    let last = *offsets.last()?;
    let clip_len = clip.len();
    let ltr_len = ltr.len();

    if variant.is_start_anchored() {
        if first > pad {
            return None;
        }
        if first > 0 {
            // LTR bases before the match must sit right before the clip.
            let overhang = &ltr[..first];
            let clip_start = read.len().checked_sub(clip_len)?;
            let host_start = clip_start.checked_sub(overhang.len())?;
            if &read[host_start..clip_start] != overhang {
                debug!("viral clip not found at the end of LTR");
                return None;
            }
        }
    } else {
        if last + clip_len + pad < ltr_len {
            return None;
        }
        let match_end = last + clip_len;
        if match_end < ltr_len {
            // LTR bases after the match must follow the clip on the read.
            let overhang = &ltr[match_end..];
            let host_end = clip_len + overhang.len();
            if host_end > read.len() || &read[clip_len..host_end] != overhang {
                debug!("viral clip not found at the end of LTR");
                return None;
            }
        }
    }

    Some(offsets)
}

/// Start offsets of non-overlapping occurrences of `needle`, scanning left to right.
pub fn find_all(haystack: &[u8], needle: &[u8]) -> Vec<usize> {
    let mut offsets = Vec::new();
    if needle.is_empty() {
        return offsets;
    }
    let mut i = 0;
    while i + needle.len() <= haystack.len() {
        if &haystack[i..i + needle.len()] == needle {
            offsets.push(i);
            i += needle.len();
        } else {
            i += 1;
        }
    }
    offsets
}
