//! Integration sites, proviral fragments, and the final tables.

use crate::alignment::{AlignmentRecord, AltAlignment};
use crate::dual_viral::DualViralResolution;
use crate::host_reads::HostReadChimera;
use crate::ltr::{LtrCatalog, parse_ltr_key};
use crate::mixed::MixedResolution;
use crate::realign::HostHit;
use crate::softclip::ClipEnd;
use crate::types::HashMap;
use crate::viral_clip::{ChimeraHits, Orientation};
use anyhow::Result;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationSite {
    pub chromosome: String,
    pub orientation: Orientation,
    /// 0-based.
    pub position: u64,
}

impl fmt::Display for IntegrationSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "int site at {}{}{}",
            self.chromosome,
            self.orientation.as_char(),
            self.position
        )
    }
}

/// Where on a viral sequence a read lies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentSpan {
    pub seqname: String,
    /// 0-based inclusive.
    pub start: u64,
    /// 0-based inclusive.
    pub end: u64,
    pub barcode: Option<String>,
    pub alt: Option<AltAlignment>,
}

impl FragmentSpan {
    /// Span of the primary alignment. `alt` holds the record's alternate on
    /// the same reference when there is exactly one.
    pub fn from_record(record: &AlignmentRecord) -> Option<Self> {
        let alt = match record.same_reference_alternates().as_slice() {
            [only] => Some((*only).clone()),
            _ => None,
        };
        Some(Self {
            seqname: record.reference_name.clone()?,
            start: record.start?,
            end: record.end()?,
            barcode: record.cell_barcode.clone(),
            alt,
        })
    }

    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviralFragment {
    Primary(FragmentSpan),
    /// Moved to its alternate alignment after the alternate was validated.
    ConfirmedAlternate(FragmentSpan),
}

impl ProviralFragment {
    pub fn from_record(record: &AlignmentRecord) -> Option<Self> {
        FragmentSpan::from_record(record).map(ProviralFragment::Primary)
    }

    pub fn span(&self) -> &FragmentSpan {
        match self {
            ProviralFragment::Primary(span) | ProviralFragment::ConfirmedAlternate(span) => span,
        }
    }

    pub fn is_confirmed_alternate(&self) -> bool {
        matches!(self, ProviralFragment::ConfirmedAlternate(_))
    }

    /// Move a primary fragment onto its alternate alignment, keeping its
    /// length. Fragments without an alternate, and already confirmed ones,
    /// come back unchanged.
    pub fn confirm_alternate(self) -> Self {
        match self {
            ProviralFragment::Primary(span) => {
                let Some(alt) = span.alt.clone() else {
                    return ProviralFragment::Primary(span);
                };
                let len = span.len();
                let start = alt.position().saturating_sub(1);
                ProviralFragment::ConfirmedAlternate(FragmentSpan {
                    seqname: alt.reference_name.clone(),
                    start,
                    end: start + len - 1,
                    barcode: span.barcode,
                    alt: Some(alt),
                })
            }
            confirmed => confirmed,
        }
    }
}

impl fmt::Display for ProviralFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let span = self.span();
        write!(
            f,
            "{} {}:{}-{}",
            span.barcode.as_deref().unwrap_or("."),
            span.seqname,
            span.start,
            span.end
        )
    }
}

#[derive(Debug, Clone)]
pub struct ChimericRead {
    record: AlignmentRecord,
    site: IntegrationSite,
    fragment: ProviralFragment,
}

impl ChimericRead {
    pub fn new(record: AlignmentRecord, site: IntegrationSite, fragment: ProviralFragment) -> Self {
        Self {
            record,
            site,
            fragment,
        }
    }

    pub fn record(&self) -> &AlignmentRecord {
        &self.record
    }

    pub fn site(&self) -> &IntegrationSite {
        &self.site
    }

    pub fn fragment(&self) -> &ProviralFragment {
        &self.fragment
    }
}

impl fmt::Display for ChimericRead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} is chimeric with {}. Proviral fragment: {}",
            self.record.name, self.site, self.fragment
        )
    }
}

/// Every resolver result that feeds the final tables.
pub struct AssemblyInput<'a> {
    pub dual: &'a DualViralResolution,
    pub mixed: &'a MixedResolution,
    pub host_reads: &'a [HostReadChimera],
    /// Unique host hits by read name; `None` when realignment was skipped.
    pub host_hits: Option<&'a HashMap<String, HostHit>>,
    pub catalog: &'a LtrCatalog,
}

/// The final dataset. Built once by [`CompiledDataset::assemble`].
#[derive(Debug, Default)]
pub struct CompiledDataset {
    chimeric_reads: Vec<ChimericRead>,
    fragments: Vec<ProviralFragment>,
}

impl CompiledDataset {
    pub fn assemble(input: &AssemblyInput<'_>) -> Self {
        let mut fragments: Vec<ProviralFragment> = Vec::new();
        let mut fragment_index: HashMap<(String, bool), usize> = HashMap::default();

        for record in &input.dual.valid_reads {
            if let Some(fragment) = ProviralFragment::from_record(record) {
                fragment_index.insert(mate_key(record), fragments.len());
                fragments.push(fragment);
            }
        }
        let mixed_pairs = input
            .mixed
            .valid_unmapped
            .iter()
            .chain(input.mixed.ltr_chimeras.iter().map(|c| &c.pair))
            .chain(input.mixed.potential_pairs.iter());
        for pair in mixed_pairs {
            if let Some(fragment) = ProviralFragment::from_record(&pair.viral) {
                fragment_index.insert(mate_key(&pair.viral), fragments.len());
                fragments.push(fragment);
            }
        }

        let mut chimeric_reads = Vec::new();

        if let Some(hits) = input.host_hits {
            let candidates = input
                .dual
                .chimeras
                .iter()
                .chain(input.mixed.potential_chimeras.iter());
            for candidate in candidates {
                let Some(hit) = hits.get(candidate.name()) else { continue };
                let Some(mut span) = FragmentSpan::from_record(&candidate.record) else {
                    continue;
                };
                if let Some(alt) = &candidate.host_clip.clip.alt {
                    span.alt = Some(alt.clone());
                }
                let mut fragment = ProviralFragment::Primary(span);
                if candidate.host_clip.is_alternate() {
                    fragment = fragment.confirm_alternate();
                    let (name, first) = mate_key(&candidate.record);
                    if let Some(&idx) = fragment_index.get(&(name.clone(), first)) {
                        fragments[idx] = fragment.clone();
                    }
                    // The paired mate follows the candidate onto its alternate.
                    if let Some(&idx) = fragment_index.get(&(name, !first)) {
                        fragments[idx] = fragments[idx].clone().confirm_alternate();
                    }
                }
                let site = junction_site(hit, candidate.host_clip.clip.end);
                chimeric_reads.push(ChimericRead::new(candidate.record.clone(), site, fragment));
            }
        }

        for chimera in &input.mixed.ltr_chimeras {
            let barcode = chimera.pair.barcode().map(str::to_string);
            if let Some(read) = ltr_chimeric_read(&chimera.pair.host, &chimera.hits, barcode, input.catalog) {
                chimeric_reads.push(read);
            }
        }
        for chimera in input.host_reads {
            let barcode = chimera.record.cell_barcode.clone();
            if let Some(read) = ltr_chimeric_read(&chimera.record, &chimera.hits, barcode, input.catalog) {
                chimeric_reads.push(read);
            }
        }

        Self {
            chimeric_reads,
            fragments,
        }
    }

    pub fn chimeric_reads(&self) -> &[ChimericRead] {
        &self.chimeric_reads
    }

    pub fn fragments(&self) -> &[ProviralFragment] {
        &self.fragments
    }

    /// `barcode, chromosome, orientation, position`
    pub fn write_integration_sites(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        for read in &self.chimeric_reads {
            let barcode = read.fragment.span().barcode.as_deref().unwrap_or(".");
            let site = &read.site;
            writeln!(
                writer,
                "{}\t{}\t{}\t{}",
                barcode,
                site.chromosome,
                site.orientation.as_char(),
                site.position
            )?;
        }
        writer.flush()?;
        Ok(())
    }

    /// `barcode, seqname, start, end, alt, confirmedAlt`
    pub fn write_fragments(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        for fragment in &self.fragments {
            let span = fragment.span();
            let alt = span
                .alt
                .as_ref()
                .map_or_else(|| ".".to_string(), |a| a.to_string());
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}\t{}",
                span.barcode.as_deref().unwrap_or("."),
                span.seqname,
                span.start,
                span.end,
                alt,
                fragment.is_confirmed_alternate()
            )?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn mate_key(record: &AlignmentRecord) -> (String, bool) {
    (record.name.clone(), record.flags.is_first_segment())
}

/// The host base next to the viral part of the read.
pub fn junction_site(hit: &HostHit, clip_end: ClipEnd) -> IntegrationSite {
    let position = match (clip_end, hit.is_reverse) {
        (ClipEnd::FivePrime, false) | (ClipEnd::ThreePrime, true) => hit.end,
        (ClipEnd::FivePrime, true) | (ClipEnd::ThreePrime, false) => hit.start,
    };
    IntegrationSite {
        chromosome: hit.reference_name.clone(),
        orientation: if hit.is_reverse {
            Orientation::Minus
        } else {
            Orientation::Plus
        },
        position,
    }
}

/// Site and fragment of a host read whose clip matched an LTR edge.
fn ltr_chimeric_read(
    host: &AlignmentRecord,
    hits: &ChimeraHits,
    barcode: Option<String>,
    catalog: &LtrCatalog,
) -> Option<ChimericRead> {
    let position = match hits.clip_end() {
        ClipEnd::FivePrime => host.start?,
        ClipEnd::ThreePrime => host.end()?,
    };
    let site = IntegrationSite {
        chromosome: host.reference_name.clone()?,
        orientation: hits.orientation(),
        position,
    };

    let bucket = hits.bucket();
    let (id, variant) = parse_ltr_key(bucket.keys.first()?)?;
    let region = catalog.get(id)?.region(variant)?;
    let offset = *bucket.offsets.first()?.first()? as u64;
    let clip_len = hits.clip.len() as u64;
    let region_len = region.end - region.start + 1;
    let forward_offset = if variant.is_reverse_complement() {
        region_len.checked_sub(offset + clip_len)?
    } else {
        offset
    };
    let start = region.start - 1 + forward_offset;
    let fragment = ProviralFragment::Primary(FragmentSpan {
        seqname: id.to_string(),
        start,
        end: start + clip_len - 1,
        barcode,
        alt: None,
    });

    Some(ChimericRead::new(host.clone(), site, fragment))
}
