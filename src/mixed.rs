//! Read pairs with one mate on a viral reference and the other on the host.

use crate::alignment::AlignmentRecord;
use crate::config::ChimeraConfig;
use crate::fasta::ViralReferences;
use crate::grouping::ReadPairs;
use crate::host_clip::{HostClipCandidate, classify_host_clip};
use crate::ltr::LtrCatalog;
use crate::viral_clip::{ChimeraHits, classify_viral_clip};
use tracing::{debug, warn};

/// A mixed pair split into its viral and host mates.
#[derive(Debug, Clone)]
pub struct MixedPair {
    pub viral: AlignmentRecord,
    pub host: AlignmentRecord,
}

impl MixedPair {
    pub fn barcode(&self) -> Option<&str> {
        self.viral
            .cell_barcode
            .as_deref()
            .or(self.host.cell_barcode.as_deref())
    }
}

/// A host mate whose clip runs into an LTR edge.
#[derive(Debug, Clone)]
pub struct LtrChimera {
    pub pair: MixedPair,
    pub hits: ChimeraHits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixedReject {
    NotAPair,
    LowHostMapq,
    MultipleClips,
}

#[derive(Debug, Clone)]
pub enum MixedOutcome {
    Rejected(MixedReject),
    /// Clips on both mates. Recognized but not resolved.
    Deferred,
    ValidUnmapped(MixedPair),
    LtrChimera(LtrChimera),
    HostClip {
        pair: MixedPair,
        candidate: HostClipCandidate,
    },
}

#[derive(Debug, Default)]
pub struct MixedResolution {
    pub valid_unmapped: Vec<MixedPair>,
    pub ltr_chimeras: Vec<LtrChimera>,
    /// Viral mates whose clip should be realigned to the host.
    pub potential_chimeras: Vec<HostClipCandidate>,
    /// Pairs behind `potential_chimeras`, by the same index.
    pub potential_pairs: Vec<MixedPair>,
    pub deferred: Vec<String>,
    pub rejected: usize,
}

pub fn resolve_mixed(
    pairs: &ReadPairs,
    refs: &ViralReferences,
    catalog: &LtrCatalog,
    config: &ChimeraConfig,
) -> MixedResolution {
    let mut out = MixedResolution::default();

    for (name, group) in pairs.iter() {
        match resolve_pair(group, refs, catalog, config) {
            MixedOutcome::Rejected(reason) => {
                debug!(read = name, ?reason, "mixed pair rejected");
                out.rejected += 1;
            }
            MixedOutcome::Deferred => {
                warn!(read = name, "soft clip detected in both host and viral mate");
                out.deferred.push(name.to_string());
            }
            MixedOutcome::ValidUnmapped(pair) => out.valid_unmapped.push(pair),
            MixedOutcome::LtrChimera(chimera) => out.ltr_chimeras.push(chimera),
            MixedOutcome::HostClip { pair, candidate } => {
                debug!(
                    read = name,
                    alternate = candidate.host_clip.is_alternate(),
                    "valid soft clip detected in virus"
                );
                out.potential_chimeras.push(candidate);
                out.potential_pairs.push(pair);
            }
        }
    }

    out
}

/// Decide one mixed read pair.
pub fn resolve_pair(
    group: &[AlignmentRecord],
    refs: &ViralReferences,
    catalog: &LtrCatalog,
    config: &ChimeraConfig,
) -> MixedOutcome {
    let [first, second] = group else {
        return MixedOutcome::Rejected(MixedReject::NotAPair);
    };
    let first_viral = first
        .reference_name
        .as_deref()
        .is_some_and(|n| refs.contains(n));
    let (viral, host) = if first_viral {
        (first, second)
    } else {
        (second, first)
    };

    // MAPQ of the viral mate is unreliable with several viral references.
    if host.mapping_quality < config.min_host_mapq {
        return MixedOutcome::Rejected(MixedReject::LowHostMapq);
    }

    let host_clips = host.cigar.soft_clip_count();
    let viral_clips = viral.cigar.soft_clip_count();
    if host_clips > 0 && viral_clips > 0 {
        return MixedOutcome::Deferred;
    }
    if host_clips + viral_clips > 1 {
        return MixedOutcome::Rejected(MixedReject::MultipleClips);
    }

    let pair = MixedPair {
        viral: viral.clone(),
        host: host.clone(),
    };

    if host_clips == 1 {
        let params = config.viral_clip_params(false);
        return match classify_viral_clip(host, catalog, &params) {
            Some(hits) => MixedOutcome::LtrChimera(LtrChimera { pair, hits }),
            None => MixedOutcome::ValidUnmapped(pair),
        };
    }

    if viral_clips == 1 {
        let params = config.host_clip_params();
        let candidate = viral
            .reference_name
            .as_deref()
            .and_then(|n| refs.get(n))
            .and_then(|viral_ref| {
                let alternates = viral.same_reference_alternates();
                if alternates.len() > 1 {
                    debug!(read = %viral.name, "multiple alternate alignments; alternates skipped");
                }
                let alt_check = match alternates.as_slice() {
                    [alt] => classify_host_clip(viral, Some(*alt), viral_ref, &params),
                    _ => None,
                };
                classify_host_clip(viral, None, viral_ref, &params).or(alt_check)
            });

        return match candidate {
            Some(host_clip) => MixedOutcome::HostClip {
                candidate: HostClipCandidate {
                    record: viral.clone(),
                    host_clip,
                },
                pair,
            },
            None => MixedOutcome::ValidUnmapped(pair),
        };
    }

    MixedOutcome::ValidUnmapped(pair)
}
