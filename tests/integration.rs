/// End-to-end tests running the intsite-rs binary.
///
/// The synthetic test builds a tiny name-sorted BAM and viral FASTA in a
/// scratch directory and always runs. The dataset test runs the binary on a
/// real single-cell sample and is skipped when the data is not present, so
/// `cargo test` still passes in CI.
///
/// To run the dataset test locally:
///   INTSITE_TEST_DATA=/path/to/test_data cargo test --test integration
///
/// Expected layout under `INTSITE_TEST_DATA`:
///   input/possorted_genome_bam.name_sorted.bam
///   input/hiv.fa
mod common;

use common::{RecordBuilder, VIRUS, bases, scratch_dir};
use intsite_rs::alignment::AlignmentRecord;
use intsite_rs::bam_io::{read_bam, write_bam};
use intsite_rs::fasta::write_fasta;
use noodles::sam;
use noodles::sam::alignment::record::Flags;
use noodles::sam::header::record::value::Map;
use noodles::sam::header::record::value::map::ReferenceSequence;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::Command;

// ── helpers ──────────────────────────────────────────────────────────────────

const BARCODE: &str = "GTCACAATCCATGCTC-1";

fn test_data_dir() -> Option<PathBuf> {
    std::env::var("INTSITE_TEST_DATA").ok().map(PathBuf::from)
}

fn intsite_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_intsite-rs"))
}

fn run_binary(args: &[&str]) {
    let status = Command::new(intsite_bin())
        .args(args)
        .status()
        .expect("failed to spawn intsite-rs");
    assert!(status.success(), "intsite-rs exited with status {status}");
}

fn header() -> sam::Header {
    let chr1 = Map::<ReferenceSequence>::new(NonZeroUsize::new(1_000_000).expect("non-zero"));
    let virus = Map::<ReferenceSequence>::new(NonZeroUsize::new(9719).expect("non-zero"));
    sam::Header::builder()
        .add_reference_sequence("chr1", chr1)
        .add_reference_sequence(VIRUS, virus)
        .build()
}

/// One dual-viral pair clipped at the provirus start and one mixed pair
/// whose host mate is clipped into the 3' LTR.
fn synthetic_reads(virus: &[u8]) -> Vec<AlignmentRecord> {
    let dual_a = [&bases(111, 20)[..], &virus[1..31]].concat();
    let host = [&virus[9702..], &bases(112, 33)[..]].concat();
    vec![
        RecordBuilder::new("d1")
            .reference(1, VIRUS, 1)
            .mate(1, VIRUS, 200)
            .cigar("20S30M")
            .sequence(&dual_a)
            .flag(Flags::FIRST_SEGMENT)
            .barcode(BARCODE)
            .build(),
        RecordBuilder::new("d1")
            .reference(1, VIRUS, 200)
            .mate(1, VIRUS, 1)
            .cigar("50M")
            .sequence(&virus[200..250])
            .flag(Flags::LAST_SEGMENT)
            .barcode(BARCODE)
            .build(),
        RecordBuilder::new("m1")
            .reference(1, VIRUS, 300)
            .mate(0, "chr1", 70000)
            .cigar("50M")
            .sequence(&virus[300..350])
            .mapq(0)
            .barcode(BARCODE)
            .build(),
        RecordBuilder::new("m1")
            .reference(0, "chr1", 70000)
            .mate(1, VIRUS, 300)
            .cigar("15S35M")
            .sequence(&host)
            .barcode(BARCODE)
            .build(),
    ]
}

fn write_inputs(dir: &Path) -> (PathBuf, PathBuf) {
    let virus = bases(110, 9719);
    let bam = dir.join("name_sorted.bam");
    let fasta = dir.join("hiv.fa");
    write_bam(&bam, &header(), synthetic_reads(&virus).iter()).unwrap();
    write_fasta(&fasta, [(VIRUS, virus.as_slice())]).unwrap();
    (bam, fasta)
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[test]
fn synthetic_sample_end_to_end() {
    let dir = scratch_dir("e2e");
    let (bam, fasta) = write_inputs(&dir);
    let out = dir.join("out");

    let args = [
        bam.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
        "-r",
        fasta.to_str().unwrap(),
        "--ltr-positions",
        "1,17,9703,9719",
        "-q",
    ];
    run_binary(&args);

    for name in [
        "proviralReads.bam",
        "hostWithPotentialChimera.bam",
        "unmappedWithPotentialChimera.bam",
        "validProviralReads.bam",
        "validProviralReadsWithPotentialChimera.bam",
        "viralReadHostClipFastaFn.fa",
        "integrationSites.tsv",
        "proviralFragments.tsv",
    ] {
        assert!(out.join(name).is_file(), "missing output {name}");
    }

    let sites = std::fs::read_to_string(out.join("integrationSites.tsv")).unwrap();
    assert_eq!(sites, format!("{BARCODE}\tchr1\t+\t70000\n"));

    let clips = std::fs::read_to_string(out.join("viralReadHostClipFastaFn.fa")).unwrap();
    assert!(clips.starts_with(">d1\n"));

    let (_, valid) = read_bam(&out.join("validProviralReads.bam")).unwrap();
    assert_eq!(valid.len(), 2);
    let (_, chimeras) = read_bam(&out.join("validProviralReadsWithPotentialChimera.bam")).unwrap();
    assert_eq!(chimeras.len(), 1);
    assert_eq!(chimeras[0].start, Some(1));

    let fragments = std::fs::read_to_string(out.join("proviralFragments.tsv")).unwrap();
    assert_eq!(fragments.lines().count(), 3);

    // A second run reuses the parsed bucket BAMs and reproduces the tables.
    run_binary(&args);
    let again = std::fs::read_to_string(out.join("integrationSites.tsv")).unwrap();
    assert_eq!(again, sites);
}

/// A real sample should produce every output and at least one valid proviral read.
#[test]
fn dataset_produces_outputs() {
    let data_dir = match test_data_dir() {
        Some(d) => d,
        None => {
            eprintln!("Skipping dataset_produces_outputs: set INTSITE_TEST_DATA to run");
            return;
        }
    };

    let input = data_dir.join("input/possorted_genome_bam.name_sorted.bam");
    let fasta = data_dir.join("input/hiv.fa");
    let out = std::env::temp_dir().join("intsite_rs_dataset_out");
    let _ = std::fs::remove_dir_all(&out);

    run_binary(&[
        input.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
        "-r",
        fasta.to_str().unwrap(),
        "--ltr-positions",
        "1,634,9086,9719",
        "-q",
    ]);

    let (_, valid) = read_bam(&out.join("validProviralReads.bam")).unwrap();
    assert!(!valid.is_empty(), "no valid proviral reads found");
    assert!(out.join("integrationSites.tsv").is_file());
    assert!(out.join("proviralFragments.tsv").is_file());
}
