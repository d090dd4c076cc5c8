mod common;

use common::{RecordBuilder, VIRUS, bases, viral_refs};
use intsite_rs::alignment::AlignmentRecord;
use intsite_rs::dual_viral::{DualViralOutcome, DualViralReject, resolve_dual_viral, resolve_pair};
use intsite_rs::fasta::ViralReferences;
use intsite_rs::grouping::ReadPairs;
use intsite_rs::host_clip::HostClipParams;
use noodles::sam::alignment::record::Flags;

const PARAMS: HostClipParams = HostClipParams {
    min_clip_len: 17,
    pad: 3,
};

fn provirus() -> (Vec<u8>, ViralReferences) {
    let virus = bases(61, 9719);
    (virus.clone(), viral_refs(virus))
}

fn mate(name: &str, start: u64, cigar: &str, seq: &[u8]) -> RecordBuilder {
    RecordBuilder::new(name)
        .reference(1, VIRUS, start)
        .mate(1, VIRUS, start)
        .cigar(cigar)
        .sequence(seq)
        .barcode("AAACCCAAGAAACACT-1")
}

/// Mate A at the provirus start with a 20 bp host clip, mate B unclipped.
fn clipped_pair(virus: &[u8], name: &str) -> Vec<AlignmentRecord> {
    let read_a = [&bases(62, 20)[..], &virus[1..31]].concat();
    let a = mate(name, 1, "20S30M", &read_a)
        .flag(Flags::FIRST_SEGMENT)
        .build();
    let b = mate(name, 200, "50M", &virus[200..250])
        .flag(Flags::LAST_SEGMENT)
        .build();
    vec![b, a]
}

#[test]
fn mate_at_provirus_start_is_the_chimera() {
    let (virus, refs) = provirus();
    let group = clipped_pair(&virus, "p1");

    let DualViralOutcome::Chimera(candidate) = resolve_pair(&group, &refs, &PARAMS) else {
        panic!("expected a chimera");
    };
    assert_eq!(candidate.record.start, Some(1));
    assert!(candidate.record.flags.is_first_segment());
    assert_eq!(candidate.clip_bases(), &bases(62, 20)[..]);
    assert!(!candidate.host_clip.is_alternate());
}

#[test]
fn unclipped_pair_is_valid_without_chimera() {
    let (virus, refs) = provirus();
    let group = vec![
        mate("p1", 100, "50M", &virus[100..150]).build(),
        mate("p1", 300, "50M", &virus[300..350]).build(),
    ];
    let outcome = resolve_pair(&group, &refs, &PARAMS);
    assert!(matches!(outcome, DualViralOutcome::NoChimera));
    assert!(outcome.is_valid_pair());
}

#[test]
fn missing_barcode_rejects_pair() {
    let (virus, refs) = provirus();
    let mut group = clipped_pair(&virus, "p1");
    group[0].cell_barcode = None;
    assert!(matches!(
        resolve_pair(&group, &refs, &PARAMS),
        DualViralOutcome::Rejected(DualViralReject::MissingBarcode)
    ));
}

#[test]
fn lone_record_is_not_a_pair() {
    let (virus, refs) = provirus();
    let group = vec![mate("p1", 100, "50M", &virus[100..150]).build()];
    assert!(matches!(
        resolve_pair(&group, &refs, &PARAMS),
        DualViralOutcome::Rejected(DualViralReject::NotAPair)
    ));
}

#[test]
fn unmapped_mate_rejects_pair() {
    let (virus, refs) = provirus();
    let mut group = clipped_pair(&virus, "p1");
    group[0].flags.insert(Flags::UNMAPPED);
    assert!(matches!(
        resolve_pair(&group, &refs, &PARAMS),
        DualViralOutcome::Rejected(DualViralReject::MateUnmapped)
    ));
}

#[test]
fn clips_on_both_mates_are_deferred() {
    let (_, refs) = provirus();
    let group = vec![
        mate("p1", 1, "20S30M", &bases(63, 50)).build(),
        mate("p1", 400, "30M20S", &bases(64, 50)).build(),
    ];
    let outcome = resolve_pair(&group, &refs, &PARAMS);
    assert!(matches!(outcome, DualViralOutcome::Deferred));
    assert!(outcome.is_valid_pair());
}

#[test]
fn two_clips_on_one_mate_skip_junction_analysis() {
    let (virus, refs) = provirus();
    let group = vec![
        mate("p1", 1, "10S30M10S", &bases(65, 50)).build(),
        mate("p1", 300, "50M", &virus[300..350]).build(),
    ];
    assert!(matches!(
        resolve_pair(&group, &refs, &PARAMS),
        DualViralOutcome::MultipleClips
    ));
}

#[test]
fn several_same_reference_alternates_need_manual_review() {
    let (virus, refs) = provirus();
    let mut group = clipped_pair(&virus, "p1");
    let seq = group[1].sequence.clone();
    group[1] = RecordBuilder::new("p1")
        .reference(1, VIRUS, 1)
        .mate(1, VIRUS, 200)
        .cigar("20S30M")
        .sequence(&seq)
        .barcode("AAACCCAAGAAACACT-1")
        .alternates("HIV,+9000,30M20S,1;HIV,-9500,30M20S,2;")
        .build();

    assert!(matches!(
        resolve_pair(&group, &refs, &PARAMS),
        DualViralOutcome::ManualReview
    ));
}

#[test]
fn primary_and_alternate_on_different_mates_are_ambiguous() {
    let (virus, refs) = provirus();
    let read_a = [&bases(66, 20)[..], &virus[1..31]].concat();
    let a = mate("p1", 1, "20S30M", &read_a).build();
    // Mate B is unclipped on its primary but its alternate clips at the provirus start.
    let read_b = [&bases(67, 20)[..], &virus[1..31]].concat();
    let b = mate("p1", 5000, "50M", &read_b)
        .alternates("HIV,+1,20S30M,0;")
        .build();

    assert!(matches!(
        resolve_pair(&[a, b], &refs, &PARAMS),
        DualViralOutcome::Ambiguous
    ));
}

#[test]
fn alternate_only_signal_yields_alternate_chimera() {
    let (virus, refs) = provirus();
    let read_b = [&bases(68, 20)[..], &virus[1..31]].concat();
    let a = mate("p1", 300, "50M", &virus[300..350]).build();
    let b = mate("p1", 5000, "50M", &read_b)
        .alternates("HIV,+1,20S30M,0;chr1,+100,50M,0;")
        .build();

    let DualViralOutcome::Chimera(candidate) = resolve_pair(&[a, b], &refs, &PARAMS) else {
        panic!("expected a chimera");
    };
    assert!(candidate.host_clip.is_alternate());
    assert_eq!(candidate.record.start, Some(5000));
}

#[test]
fn resolution_collects_valid_reads_and_chimeras() {
    let (virus, refs) = provirus();
    let mut records = clipped_pair(&virus, "p1");
    records.push(mate("p2", 100, "50M", &virus[100..150]).build());
    records.push(mate("p2", 300, "50M", &virus[300..350]).build());
    records.push(mate("p3", 100, "50M", &virus[100..150]).build());
    let pairs: ReadPairs = records.into_iter().collect();

    let resolution = resolve_dual_viral(&pairs, &refs, &PARAMS);
    assert_eq!(resolution.valid_reads.len(), 4);
    assert_eq!(resolution.valid_reads[0].start, Some(1));
    assert_eq!(resolution.valid_reads[1].start, Some(200));
    assert_eq!(resolution.chimeras.len(), 1);
    assert_eq!(resolution.chimeras[0].name(), "p1");
    assert_eq!(resolution.rejected, 1);
    assert!(resolution.manual_review.is_empty());
}
