//! Does a clip on a virus-aligned read continue past the provirus edge?

use crate::alignment::{AlignmentRecord, AltAlignment};
use crate::softclip::{ClippedFragment, extract_soft_clip};

#[derive(Debug, Clone, Copy)]
pub struct HostClipParams {
    pub min_clip_len: usize,
    pub pad: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostClip {
    pub clip: ClippedFragment,
    /// Start the decision was made on: the primary 0-based start, or the
    /// alternate's reported position.
    pub start: u64,
}

impl HostClip {
    pub fn is_alternate(&self) -> bool {
        self.clip.alt.is_some()
    }
}

/// A virus-aligned read whose clip should be realigned to the host genome.
#[derive(Debug, Clone)]
pub struct HostClipCandidate {
    pub record: AlignmentRecord,
    pub host_clip: HostClip,
}

impl HostClipCandidate {
    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn clip_bases(&self) -> &[u8] {
        &self.host_clip.clip.bases
    }
}

/// Classify the soft clip of a read aligned to `viral_ref`.
///
/// With `alt`, the alternate's position and CIGAR stand in for the primary
/// alignment; the position is used as reported.
pub fn classify_host_clip(
    record: &AlignmentRecord,
    alt: Option<&AltAlignment>,
    viral_ref: &[u8],
    params: &HostClipParams,
) -> Option<HostClip> {
    let start = match alt {
        Some(a) => a.position(),
        None => record.start?,
    };
    let clip = extract_soft_clip(record, alt, params.min_clip_len, params.pad)?;

    let pad = params.pad as u64;
    let ref_len = viral_ref.len() as u64;
    let read_len = record.read_len() as u64;

    let near_5p = start <= pad;
    let near_3p = start + read_len + pad + 1 >= ref_len;

    let accepted = if near_5p {
        explains_5p_overhang(&clip, start, viral_ref)
    } else if near_3p {
        reaches_3p_end(&clip, start, read_len, ref_len)
    } else {
        false
    };

    accepted.then_some(HostClip { clip, start })
}

/// Viral bases `[1, start)` skipped by the alignment must end the clip.
fn explains_5p_overhang(clip: &ClippedFragment, start: u64, viral_ref: &[u8]) -> bool {
    if start == 1 {
        return true;
    }
    if start < 2 {
        return false;
    }
    let n = (start - 1) as usize;
    if n > clip.len() || start as usize > viral_ref.len() {
        return false;
    }
    clip.bases[clip.len() - n..] == viral_ref[1..start as usize]
}

/// The aligned part must run exactly to the provirus end.
fn reaches_3p_end(clip: &ClippedFragment, start: u64, read_len: u64, ref_len: u64) -> bool {
    let host_len = read_len.saturating_sub(clip.len() as u64);
    ref_len.checked_sub(host_len) == Some(start)
}
