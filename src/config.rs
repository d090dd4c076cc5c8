use crate::host_clip::HostClipParams;
use crate::viral_clip::ViralClipParams;

#[derive(Debug, Clone)]
pub struct ChimeraConfig {
    /// Minimum clip length matched against an LTR.
    pub ltr_clip_len: usize,
    /// Minimum clip length realigned to the host genome.
    pub host_clip_len: usize,
    /// Bases of slack allowed between a clip and a sequence edge.
    pub soft_clip_pad: usize,
    /// Minimum MAPQ of the host mate in a mixed pair.
    pub min_host_mapq: u8,
    /// Stop after this many input records.
    pub max_records: Option<u64>,
    /// Classify clipped host-only pairs against the LTRs.
    pub scan_host_reads: bool,
}

impl ChimeraConfig {
    pub fn host_clip_params(&self) -> HostClipParams {
        HostClipParams {
            min_clip_len: self.host_clip_len,
            pad: self.soft_clip_pad,
        }
    }

    pub fn viral_clip_params(&self, check_orientation: bool) -> ViralClipParams {
        ViralClipParams {
            min_clip_len: self.ltr_clip_len,
            pad: self.soft_clip_pad,
            check_orientation,
        }
    }
}

impl Default for ChimeraConfig {
    fn default() -> Self {
        Self {
            ltr_clip_len: 11,
            host_clip_len: 17,
            soft_clip_pad: 3,
            min_host_mapq: 30,
            max_records: None,
            scan_host_reads: false,
        }
    }
}
