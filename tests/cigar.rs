use intsite_rs::alignment::AltAlignment;
use intsite_rs::cigar::{Cigar, CigarOp};

#[test]
fn parses_ops_in_order() {
    let cigar: Cigar = "15S85M".parse().unwrap();
    assert_eq!(cigar.ops, vec![(15, CigarOp::SoftClip), (85, CigarOp::Match)]);
    assert_eq!(cigar.soft_clip_count(), 1);
    assert_eq!(cigar.reference_len(), 85);
    assert_eq!(cigar.query_len(), 100);
    assert_eq!(cigar.to_string(), "15S85M");
}

#[test]
fn star_is_empty() {
    let cigar: Cigar = "*".parse().unwrap();
    assert!(cigar.is_empty());
    assert_eq!(cigar.to_string(), "*");
}

#[test]
fn deletions_and_skips_consume_reference_only() {
    let cigar: Cigar = "10M2D5N3I10M4H".parse().unwrap();
    assert_eq!(cigar.reference_len(), 27);
    assert_eq!(cigar.query_len(), 23);
    assert_eq!(cigar.soft_clip_count(), 0);
}

#[test]
fn rejects_malformed_strings() {
    assert!("15".parse::<Cigar>().is_err());
    assert!("S15".parse::<Cigar>().is_err());
    assert!("15Q".parse::<Cigar>().is_err());
}

#[test]
fn noodles_conversion_keeps_ops() {
    let cigar: Cigar = "3S10M1I7M".parse().unwrap();
    let sam = cigar.to_sam_cigar();
    let back = Cigar::from_sam_ops(sam.as_ref().iter().map(|op| Ok(*op))).unwrap();
    assert_eq!(back, cigar);
}

#[test]
fn alternate_tag_entries() {
    let alts = AltAlignment::parse_tag("HIV,+120,20S80M,2;HIV,-4000,80M20S,0;").unwrap();
    assert_eq!(alts.len(), 2);

    assert_eq!(alts[0].reference_name, "HIV");
    assert_eq!(alts[0].position(), 120);
    assert!(!alts[0].is_reverse());
    assert_eq!(alts[0].cigar.first(), Some((20, CigarOp::SoftClip)));
    assert_eq!(alts[0].edit_distance, 2);

    assert!(alts[1].is_reverse());
    assert_eq!(alts[1].position(), 4000);
    assert_eq!(alts[1].to_string(), "HIV,-4000,80M20S,0");
}

#[test]
fn alternate_without_trailing_separator() {
    let alts = AltAlignment::parse_tag("chr1,+5,50M,1").unwrap();
    assert_eq!(alts.len(), 1);
    assert!(AltAlignment::parse("chr1,+5,50M").is_err());
}
