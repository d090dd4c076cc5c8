//! Host-aligned reads whose clip runs into an LTR.

use crate::alignment::AlignmentRecord;
use crate::config::ChimeraConfig;
use crate::grouping::ReadPairs;
use crate::ltr::LtrCatalog;
use crate::viral_clip::{ChimeraHits, classify_viral_clip};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct HostReadChimera {
    pub record: AlignmentRecord,
    pub hits: ChimeraHits,
}

/// Only templates where exactly one mate landed in the bucket are
/// considered, so a single mate carries the clip.
pub fn resolve_host_reads(
    pairs: &ReadPairs,
    catalog: &LtrCatalog,
    config: &ChimeraConfig,
) -> Vec<HostReadChimera> {
    let params = config.viral_clip_params(true);
    let mut out = Vec::new();

    for (name, group) in pairs.iter() {
        let [record] = group else { continue };
        if record.cell_barcode.is_none() {
            continue;
        }
        if let Some(hits) = classify_viral_clip(record, catalog, &params) {
            debug!(read = name, orientation = %hits.orientation(), "chimeric host read");
            out.push(HostReadChimera {
                record: record.clone(),
                hits,
            });
        }
    }

    out
}
