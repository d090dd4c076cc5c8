//! Route a name-sorted alignment stream into read-pair buckets.

use crate::alignment::AlignmentRecord;
use crate::cigar::CigarOp;
use crate::fasta::ViralReferences;
use crate::types::{HashMap, HashMapExt};

/// Shortest end soft clip that sends a host read to the chimera bucket.
pub const HOST_CLIP_ROUTING_MIN: u32 = 9;

/// Records grouped by read name, in first-seen order.
#[derive(Debug, Default)]
pub struct ReadPairs {
    order: Vec<String>,
    groups: HashMap<String, Vec<AlignmentRecord>>,
}

impl ReadPairs {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            groups: HashMap::new(),
        }
    }

    pub fn push(&mut self, record: AlignmentRecord) {
        match self.groups.get_mut(&record.name) {
            Some(group) => group.push(record),
            None => {
                self.order.push(record.name.clone());
                self.groups.insert(record.name.clone(), vec![record]);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&[AlignmentRecord]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    /// Groups in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[AlignmentRecord])> {
        self.order
            .iter()
            .filter_map(|name| self.groups.get(name).map(|g| (name.as_str(), g.as_slice())))
    }

    pub fn records(&self) -> impl Iterator<Item = &AlignmentRecord> {
        self.iter().flat_map(|(_, group)| group.iter())
    }

    /// Number of read names.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

impl FromIterator<AlignmentRecord> for ReadPairs {
    fn from_iter<I: IntoIterator<Item = AlignmentRecord>>(iter: I) -> Self {
        let mut pairs = Self::new();
        for record in iter {
            pairs.push(record);
        }
        pairs
    }
}

/// Yields runs of consecutive records sharing a name, holding only one run
/// in memory. On name-sorted input every run is a complete template.
pub struct NameGroups<I> {
    inner: I,
    pending: Option<AlignmentRecord>,
}

impl<I> NameGroups<I> {
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            pending: None,
        }
    }
}

impl<I, E> Iterator for NameGroups<I>
where
    I: Iterator<Item = Result<AlignmentRecord, E>>,
{
    type Item = Result<Vec<AlignmentRecord>, E>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = match self.pending.take() {
            Some(record) => record,
            None => match self.inner.next()? {
                Ok(record) => record,
                Err(e) => return Some(Err(e)),
            },
        };

        let mut group = vec![first];
        loop {
            match self.inner.next() {
                None => break,
                Some(Err(e)) => return Some(Err(e)),
                Some(Ok(record)) if record.name == group[0].name => group.push(record),
                Some(Ok(record)) => {
                    self.pending = Some(record);
                    break;
                }
            }
        }
        Some(Ok(group))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    /// Host-aligned proper pair with a long end clip.
    HostClip,
    /// Both mates on viral references.
    DualViral,
    /// One mate viral, the other elsewhere.
    Mixed,
}

/// Which bucket, if any, a record belongs to.
pub fn route(record: &AlignmentRecord, refs: &ViralReferences) -> Option<Bucket> {
    if record.is_duplicate() || !record.is_paired() {
        return None;
    }

    let is_viral = |name: &Option<String>| name.as_deref().is_some_and(|n| refs.contains(n));
    let ref_viral = is_viral(&record.reference_name);
    let mate_viral = is_viral(&record.mate_reference_name);

    if record.is_proper_pair() && !ref_viral && has_long_end_clip(record) {
        Some(Bucket::HostClip)
    } else if ref_viral && mate_viral {
        Some(Bucket::DualViral)
    } else if !record.is_proper_pair()
        && record.is_mapped()
        && !record.flags.is_mate_unmapped()
        && (ref_viral || mate_viral)
    {
        Some(Bucket::Mixed)
    } else {
        None
    }
}

fn has_long_end_clip(record: &AlignmentRecord) -> bool {
    let (Some(first), Some(last)) = (record.cigar.first(), record.cigar.last()) else {
        return false;
    };
    let clipped = first.1 == CigarOp::SoftClip || last.1 == CigarOp::SoftClip;
    let long_enough = first.0 >= HOST_CLIP_ROUTING_MIN || last.0 >= HOST_CLIP_ROUTING_MIN;
    clipped && long_enough
}

/// The three caller-owned groupings the resolvers consume.
#[derive(Debug, Default)]
pub struct Buckets {
    pub dual_viral: ReadPairs,
    pub host_clip: ReadPairs,
    pub mixed: ReadPairs,
}

impl Buckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route one record; returns the bucket it went to.
    pub fn add(&mut self, record: AlignmentRecord, refs: &ViralReferences) -> Option<Bucket> {
        let bucket = route(&record, refs)?;
        match bucket {
            Bucket::HostClip => self.host_clip.push(record),
            Bucket::DualViral => self.dual_viral.push(record),
            Bucket::Mixed => self.mixed.push(record),
        }
        Some(bucket)
    }
}
