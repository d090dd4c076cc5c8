use crate::cigar::Cigar;
use crate::types::RefId;
use anyhow::{Context, Result, anyhow, bail};
use noodles::core::Position;
use noodles::sam;
use noodles::sam::alignment::RecordBuf;
use noodles::sam::alignment::record::Flags;
use noodles::sam::alignment::record::MappingQuality;
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record_buf::{
    Data as SamData, QualityScores, Sequence, data::field::Value,
};
use std::fmt;

pub const CELL_BARCODE_TAG: Tag = Tag::new(b'C', b'B');
pub const ALT_ALIGNMENT_TAG: Tag = Tag::new(b'X', b'A');

/// MAPQ value meaning "not available".
pub const MAPQ_UNAVAILABLE: u8 = 255;

/// One entry of a `XA:Z:` tag: `ref,[+|-]pos,CIGAR,NM`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AltAlignment {
    pub reference_name: String,
    /// 1-based position; negative when the alternate is on the reverse strand.
    pub signed_position: i64,
    pub cigar: Cigar,
    pub edit_distance: u32,
}

impl AltAlignment {
    /// Unsigned position as reported by the aligner.
    pub fn position(&self) -> u64 {
        self.signed_position.unsigned_abs()
    }

    pub fn is_reverse(&self) -> bool {
        self.signed_position < 0
    }

    pub fn parse(entry: &str) -> Result<Self> {
        let fields: Vec<&str> = entry.split(',').collect();
        if fields.len() != 4 {
            bail!("expected 4 comma-separated fields in alternate alignment {entry:?}");
        }
        let signed_position: i64 = fields[1]
            .parse()
            .with_context(|| format!("invalid alternate position in {entry:?}"))?;
        let cigar = fields[2]
            .parse()
            .with_context(|| format!("invalid alternate CIGAR in {entry:?}"))?;
        let edit_distance = fields[3]
            .parse()
            .with_context(|| format!("invalid alternate edit distance in {entry:?}"))?;
        Ok(Self {
            reference_name: fields[0].to_string(),
            signed_position,
            cigar,
            edit_distance,
        })
    }

    /// Parse a whole tag value; the trailing `;` is optional.
    pub fn parse_tag(value: &str) -> Result<Vec<Self>> {
        value
            .split_terminator(';')
            .filter(|s| !s.is_empty())
            .map(Self::parse)
            .collect()
    }
}

impl fmt::Display for AltAlignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_reverse() { '-' } else { '+' };
        write!(
            f,
            "{},{}{},{},{}",
            self.reference_name,
            sign,
            self.position(),
            self.cigar,
            self.edit_distance
        )
    }
}

/// Owned view of one aligned (or unmapped) read.
#[derive(Debug, Clone)]
pub struct AlignmentRecord {
    pub name: String,
    pub reference_sequence_id: Option<RefId>,
    pub reference_name: Option<String>,
    /// 0-based leftmost aligned position.
    pub start: Option<u64>,
    pub cigar: Cigar,
    pub sequence: Vec<u8>,
    pub quality_scores: Vec<u8>,
    pub flags: Flags,
    pub mapping_quality: u8,
    pub mate_reference_sequence_id: Option<RefId>,
    pub mate_reference_name: Option<String>,
    /// 0-based mate start.
    pub mate_start: Option<u64>,
    pub template_length: i32,
    pub cell_barcode: Option<String>,
    /// Raw `XA` value, kept verbatim for round-tripping.
    pub alt_tag: Option<String>,
    pub alternates: Vec<AltAlignment>,
}

impl Default for AlignmentRecord {
    fn default() -> Self {
        Self {
            name: String::new(),
            reference_sequence_id: None,
            reference_name: None,
            start: None,
            cigar: Cigar::default(),
            sequence: Vec::new(),
            quality_scores: Vec::new(),
            flags: Flags::empty(),
            mapping_quality: MAPQ_UNAVAILABLE,
            mate_reference_sequence_id: None,
            mate_reference_name: None,
            mate_start: None,
            template_length: 0,
            cell_barcode: None,
            alt_tag: None,
            alternates: Vec::new(),
        }
    }
}

impl AlignmentRecord {
    pub fn from_record_buf(record: &RecordBuf, header: &sam::Header) -> Result<Self> {
        let name = record.name().map(|n| n.to_string()).unwrap_or_default();

        let reference_sequence_id = record.reference_sequence_id();
        let mate_reference_sequence_id = record.mate_reference_sequence_id();

        let cigar = Cigar::from_sam_ops(record.cigar().as_ref().iter().map(|op| Ok(*op)))
            .with_context(|| format!("{name}: invalid CIGAR"))?;

        let cell_barcode = get_string_tag(record.data(), CELL_BARCODE_TAG);
        let alt_tag = get_string_tag(record.data(), ALT_ALIGNMENT_TAG);
        let alternates = match &alt_tag {
            Some(value) => AltAlignment::parse_tag(value)
                .with_context(|| format!("{name}: invalid XA tag"))?,
            None => Vec::new(),
        };

        Ok(Self {
            reference_name: reference_name(header, reference_sequence_id),
            mate_reference_name: reference_name(header, mate_reference_sequence_id),
            reference_sequence_id,
            mate_reference_sequence_id,
            start: record.alignment_start().map(|p| (p.get() - 1) as u64),
            mate_start: record.mate_alignment_start().map(|p| (p.get() - 1) as u64),
            cigar,
            sequence: record.sequence().as_ref().to_vec(),
            quality_scores: record.quality_scores().as_ref().to_vec(),
            flags: record.flags(),
            mapping_quality: record
                .mapping_quality()
                .map(|q| q.get())
                .unwrap_or(MAPQ_UNAVAILABLE),
            template_length: record.template_length(),
            name,
            cell_barcode,
            alt_tag,
            alternates,
        })
    }

    /// Rebuild a noodles record carrying every field this view keeps.
    pub fn to_record_buf(&self) -> Result<RecordBuf> {
        let mut out = RecordBuf::default();

        *out.name_mut() = Some(self.name.as_bytes().to_vec().into());
        *out.flags_mut() = self.flags;
        *out.reference_sequence_id_mut() = self.reference_sequence_id;
        *out.alignment_start_mut() = to_position(self.start)?;
        *out.mapping_quality_mut() = MappingQuality::new(self.mapping_quality);
        *out.cigar_mut() = self.cigar.to_sam_cigar();
        *out.mate_reference_sequence_id_mut() = self.mate_reference_sequence_id;
        *out.mate_alignment_start_mut() = to_position(self.mate_start)?;
        *out.template_length_mut() = self.template_length;
        *out.sequence_mut() = Sequence::from(self.sequence.clone());
        *out.quality_scores_mut() = QualityScores::from(self.quality_scores.clone());

        let mut data = SamData::default();
        if let Some(barcode) = &self.cell_barcode {
            data.insert(CELL_BARCODE_TAG, Value::String(barcode.as_str().into()));
        }
        if let Some(alt) = &self.alt_tag {
            data.insert(ALT_ALIGNMENT_TAG, Value::String(alt.as_str().into()));
        }
        *out.data_mut() = data;

        Ok(out)
    }

    pub fn is_paired(&self) -> bool {
        self.flags.is_segmented()
    }

    pub fn is_mapped(&self) -> bool {
        !self.flags.is_unmapped()
    }

    pub fn is_reverse(&self) -> bool {
        self.flags.is_reverse_complemented()
    }

    pub fn is_mate_reverse(&self) -> bool {
        self.flags.is_mate_reverse_complemented()
    }

    pub fn is_duplicate(&self) -> bool {
        self.flags.is_duplicate()
    }

    pub fn is_proper_pair(&self) -> bool {
        self.flags.is_properly_segmented()
    }

    pub fn read_len(&self) -> usize {
        self.sequence.len()
    }

    /// 0-based inclusive end of the aligned span.
    pub fn end(&self) -> Option<u64> {
        let start = self.start?;
        let span = u64::from(self.cigar.reference_len());
        Some(start + span.max(1) - 1)
    }

    /// Alternates that sit on the same reference as the primary alignment.
    pub fn same_reference_alternates(&self) -> Vec<&AltAlignment> {
        let Some(reference) = self.reference_name.as_deref() else {
            return Vec::new();
        };
        self.alternates
            .iter()
            .filter(|alt| alt.reference_name == reference)
            .collect()
    }
}

fn reference_name(header: &sam::Header, id: Option<RefId>) -> Option<String> {
    let id = id?;
    header
        .reference_sequences()
        .get_index(id)
        .map(|(name, _)| name.to_string())
}

fn get_string_tag(data: &SamData, tag: Tag) -> Option<String> {
    match data.get(&tag)? {
        Value::String(s) => Some(s.to_string()),
        _ => None,
    }
}

fn to_position(pos0: Option<u64>) -> Result<Option<Position>> {
    let Some(pos0) = pos0 else {
        return Ok(None);
    };
    let pos1 = (pos0 + 1) as usize;
    let position =
        Position::try_from(pos1).map_err(|_| anyhow!("alignment start out of range: {pos1}"))?;
    Ok(Some(position))
}
