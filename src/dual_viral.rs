//! Read pairs with both mates on viral references.

use crate::alignment::AlignmentRecord;
use crate::fasta::ViralReferences;
use crate::grouping::ReadPairs;
use crate::host_clip::{HostClip, HostClipCandidate, HostClipParams, classify_host_clip};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DualViralReject {
    NotAPair,
    MissingBarcode,
    MateUnmapped,
}

#[derive(Debug, Clone)]
pub enum DualViralOutcome {
    Rejected(DualViralReject),
    /// More than one soft clip across the pair; no junction analysis.
    MultipleClips,
    /// Both mates clipped. Recognized but not resolved.
    Deferred,
    /// A mate has several alternates on its own reference.
    ManualReview,
    /// Conflicting accept signals.
    Ambiguous,
    NoChimera,
    Chimera(HostClipCandidate),
}

impl DualViralOutcome {
    /// Whether both mates count as valid proviral reads.
    pub fn is_valid_pair(&self) -> bool {
        !matches!(self, DualViralOutcome::Rejected(_))
    }
}

#[derive(Debug, Default)]
pub struct DualViralResolution {
    /// Both mates of every accepted pair, ordered by start within a pair.
    pub valid_reads: Vec<AlignmentRecord>,
    pub chimeras: Vec<HostClipCandidate>,
    pub manual_review: Vec<String>,
    pub ambiguous: Vec<String>,
    pub deferred: Vec<String>,
    pub rejected: usize,
}

pub fn resolve_dual_viral(
    pairs: &ReadPairs,
    refs: &ViralReferences,
    params: &HostClipParams,
) -> DualViralResolution {
    let mut out = DualViralResolution::default();

    for (name, group) in pairs.iter() {
        let outcome = resolve_pair(group, refs, params);
        if outcome.is_valid_pair() {
            out.valid_reads.extend(ordered_mates(group).into_iter().cloned());
        }
        match outcome {
            DualViralOutcome::Rejected(reason) => {
                debug!(read = name, ?reason, "dual viral pair rejected");
                out.rejected += 1;
            }
            DualViralOutcome::MultipleClips | DualViralOutcome::NoChimera => {}
            DualViralOutcome::Deferred => {
                warn!(read = name, "soft clip on both viral mates; not resolved");
                out.deferred.push(name.to_string());
            }
            DualViralOutcome::ManualReview => {
                warn!(read = name, "multiple alternate alignments; verify manually");
                out.manual_review.push(name.to_string());
            }
            DualViralOutcome::Ambiguous => {
                warn!(read = name, "clip identified by more than one alignment; verify manually");
                out.ambiguous.push(name.to_string());
            }
            DualViralOutcome::Chimera(candidate) => {
                debug!(
                    read = name,
                    alternate = candidate.host_clip.is_alternate(),
                    "potential chimera on viral mate"
                );
                out.chimeras.push(candidate);
            }
        }
    }

    out
}

/// Decide one dual-viral read pair.
pub fn resolve_pair(
    group: &[AlignmentRecord],
    refs: &ViralReferences,
    params: &HostClipParams,
) -> DualViralOutcome {
    let [a, b] = group else {
        return DualViralOutcome::Rejected(DualViralReject::NotAPair);
    };
    if a.cell_barcode.is_none() || b.cell_barcode.is_none() {
        return DualViralOutcome::Rejected(DualViralReject::MissingBarcode);
    }
    if !a.is_mapped() || !b.is_mapped() {
        return DualViralOutcome::Rejected(DualViralReject::MateUnmapped);
    }

    let mates = ordered_mates(group);
    let clips = [mates[0].cigar.soft_clip_count(), mates[1].cigar.soft_clip_count()];
    if clips[0] > 0 && clips[1] > 0 {
        return DualViralOutcome::Deferred;
    }
    if clips[0] + clips[1] > 1 {
        return DualViralOutcome::MultipleClips;
    }

    let alternates: Vec<_> = mates.iter().map(|m| m.same_reference_alternates()).collect();
    if alternates.iter().any(|alts| alts.len() > 1) {
        return DualViralOutcome::ManualReview;
    }

    let check = |mate: &AlignmentRecord, alt| -> Option<HostClip> {
        let viral_ref = refs.get(mate.reference_name.as_deref()?)?;
        classify_host_clip(mate, alt, viral_ref, params)
    };

    let alt_checks = [0, 1].map(|i| match alternates[i].as_slice() {
        [alt] => check(mates[i], Some(*alt)),
        _ => None,
    });
    let primary_checks = [0, 1].map(|i| check(mates[i], None));

    let alt_signal = single_mate(alt_checks);
    let primary_signal = single_mate(primary_checks);

    match (alt_signal, primary_signal) {
        (Signal::Conflict, _) | (_, Signal::Conflict) => DualViralOutcome::Ambiguous,
        (Signal::Mate(..), Signal::Mate(..)) => DualViralOutcome::Ambiguous,
        (Signal::Mate(i, host_clip), Signal::None) | (Signal::None, Signal::Mate(i, host_clip)) => {
            DualViralOutcome::Chimera(HostClipCandidate {
                record: mates[i].clone(),
                host_clip,
            })
        }
        (Signal::None, Signal::None) => DualViralOutcome::NoChimera,
    }
}

enum Signal {
    None,
    Mate(usize, HostClip),
    Conflict,
}

fn single_mate(checks: [Option<HostClip>; 2]) -> Signal {
    match checks {
        [None, None] => Signal::None,
        [Some(c), None] => Signal::Mate(0, c),
        [None, Some(c)] => Signal::Mate(1, c),
        [Some(_), Some(_)] => Signal::Conflict,
    }
}

/// Mates ordered by alignment start.
fn ordered_mates(group: &[AlignmentRecord]) -> Vec<&AlignmentRecord> {
    let mut mates: Vec<&AlignmentRecord> = group.iter().collect();
    mates.sort_by_key(|m| m.start);
    mates
}
