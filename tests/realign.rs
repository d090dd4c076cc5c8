mod common;

use common::scratch_dir;
use intsite_rs::realign::{Aligner, HostHit, read_unique_hits, unique_hits};
use std::path::Path;

const SAM: &str = "\
@HD\tVN:1.6\tSO:unsorted
@SQ\tSN:chr1\tLN:100000
@SQ\tSN:chr2\tLN:50000
r1\t0\tchr1\t1001\t60\t20M\t*\t0\t0\tACGTACGTACGTACGTACGT\t*
r2\t16\tchr2\t501\t37\t18M\t*\t0\t0\tACGTACGTACGTACGTAC\t*
r3\t0\tchr1\t100\t60\t20M\t*\t0\t0\tACGTACGTACGTACGTACGT\t*
r3\t256\tchr2\t200\t10\t20M\t*\t0\t0\tACGTACGTACGTACGTACGT\t*
r4\t4\t*\t0\t0\t*\t*\t0\t0\tACGTACGTACGTACGTACGT\t*
r5\t0\tchr1\t300\t0\t20M\t*\t0\t0\tACGTACGTACGTACGTACGT\t*
";

fn hit(reference: &str, start: u64, end: u64) -> HostHit {
    HostHit {
        reference_name: reference.to_string(),
        start,
        end,
        is_reverse: false,
        mapping_quality: 60,
    }
}

#[test]
fn keeps_single_confident_hits() {
    let dir = scratch_dir("realign-sam");
    let path = dir.join("clips.fa.sam");
    std::fs::write(&path, SAM).unwrap();

    let hits = read_unique_hits(&path).unwrap();
    assert_eq!(hits.len(), 2);

    let r1 = &hits["r1"];
    assert_eq!(r1.reference_name, "chr1");
    assert_eq!((r1.start, r1.end), (1000, 1019));
    assert!(!r1.is_reverse);
    assert_eq!(r1.mapping_quality, 60);

    let r2 = &hits["r2"];
    assert_eq!(r2.reference_name, "chr2");
    assert_eq!((r2.start, r2.end), (500, 517));
    assert!(r2.is_reverse);

    assert!(!hits.contains_key("r3"));
    assert!(!hits.contains_key("r4"));
    assert!(!hits.contains_key("r5"));
}

#[test]
fn names_with_repeated_hits_are_dropped() {
    let hits = unique_hits(vec![
        ("a".to_string(), hit("chr1", 10, 30)),
        ("b".to_string(), hit("chr1", 50, 70)),
        ("a".to_string(), hit("chr2", 10, 30)),
        ("a".to_string(), hit("chr3", 10, 30)),
    ]);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits["b"], hit("chr1", 50, 70));
}

#[test]
fn aligner_arguments_follow_clip_length() {
    let aligner = Aligner::new("bwa", "/ref/hg38.fa");
    let args: Vec<String> = aligner
        .args(Path::new("clips.fa"), Path::new("clips.fa.sam"), 17)
        .into_iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        args,
        vec![
            "mem", "-T", "17", "-k", "15", "-a", "-Y", "-q", "/ref/hg38.fa", "clips.fa", "-o",
            "clips.fa.sam"
        ]
    );

    let tiny: Vec<String> = aligner
        .args(Path::new("c.fa"), Path::new("c.sam"), 2)
        .into_iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    assert_eq!(tiny[4], "1");
}

#[test]
fn empty_fasta_skips_alignment() {
    let dir = scratch_dir("realign-empty");
    let fasta = dir.join("clips.fa");
    std::fs::write(&fasta, "").unwrap();

    let aligner = Aligner::new("/nonexistent/bwa", "/ref/hg38.fa");
    assert!(aligner.align(&fasta, 17).unwrap().is_none());
    assert!(aligner.align(&dir.join("missing.fa"), 17).unwrap().is_none());
}

#[test]
fn missing_aligner_is_an_error() {
    let dir = scratch_dir("realign-missing");
    let fasta = dir.join("clips.fa");
    std::fs::write(&fasta, ">r1\nACGTACGTACGTACGTACGT\n").unwrap();

    let aligner = Aligner::new("/nonexistent/bwa", "/ref/hg38.fa");
    assert!(aligner.align(&fasta, 17).is_err());
}
