mod common;

use common::{bases, scratch_dir};
use intsite_rs::fasta::{ViralReferences, write_fasta};

#[test]
fn written_clips_are_complete_when_the_call_returns() {
    let dir = scratch_dir("fasta-write");
    let path = dir.join("clips.fa");
    let long = bases(131, 20_000);
    let short = bases(132, 17);

    let n = write_fasta(&path, [("r1", long.as_slice()), ("r2", short.as_slice())]).unwrap();
    assert_eq!(n, 2);

    let refs = ViralReferences::load(&path).unwrap();
    assert_eq!(refs.ids(), ["r1".to_string(), "r2".to_string()]);
    assert_eq!(refs.get("r1"), Some(long.as_slice()));
    assert_eq!(refs.get("r2"), Some(short.as_slice()));
}

#[test]
fn header_description_is_not_part_of_the_id() {
    let dir = scratch_dir("fasta-load");
    let path = dir.join("hiv.fa");
    std::fs::write(&path, b">HIV strain HXB2\nacgtN\nACGT\n").unwrap();

    let refs = ViralReferences::load(&path).unwrap();
    assert_eq!(refs.len(), 1);
    assert!(refs.contains("HIV"));
    assert_eq!(refs.get("HIV"), Some(b"ACGTNACGT".as_slice()));
}
