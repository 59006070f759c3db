use pathoscope_rs::build_matrix;
use std::fs;
use std::path::{Path, PathBuf};

// ── helpers ──────────────────────────────────────────────────────────────────

fn write_sam(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("input.sam");
    fs::write(&path, contents).expect("write fixture");
    path
}

/// One unique read on ref_a plus one read tied between ref_a and ref_b; all
/// raw scores equal (AS:i:-2 on 8 bp reads).
const TIE_SAM: &str = "\
@HD\tVN:1.0\tSO:unsorted
@SQ\tSN:ref_a\tLN:500
@SQ\tSN:ref_b\tLN:500
read_1\t0\tref_a\t10\t42\t8M\t*\t0\t0\tACGTACGT\tFFFFFFFF\tAS:i:-2
read_2\t0\tref_a\t20\t7\t8M\t*\t0\t0\tACGTACGT\tFFFFFFFF\tAS:i:-2
read_2\t256\tref_b\t20\t7\t8M\t*\t0\t0\tACGTACGT\tFFFFFFFF\tAS:i:-2
";

// ── tests ─────────────────────────────────────────────────────────────────────

#[test]
fn partitions_unique_and_ambiguous_reads() {
    let dir = tempfile::tempdir().unwrap();
    let sam = write_sam(dir.path(), TIE_SAM);

    let matrix = build_matrix(&sam, 0.01).unwrap();

    assert_eq!(matrix.refs, vec!["ref_a", "ref_b"]);
    assert_eq!(matrix.reads, vec!["read_1", "read_2"]);

    assert_eq!(matrix.unique.len(), 1);
    assert_eq!(matrix.unique[&0].ref_index, 0);

    assert_eq!(matrix.ambiguous.len(), 1);
    let read = &matrix.ambiguous[&1];
    assert_eq!(read.refs, vec![0, 1]);
    assert_eq!(read.responsibilities, vec![0.5, 0.5]);
    assert_eq!(read.weight, read.scores[0]);
}

/// Equal raw scores rescale to exp(100) and normalize to an even split.
#[test]
fn responsibilities_sum_to_one() {
    let dir = tempfile::tempdir().unwrap();
    let sam = write_sam(dir.path(), TIE_SAM);

    let matrix = build_matrix(&sam, 0.01).unwrap();

    for read in matrix.ambiguous.values() {
        let sum: f64 = read.responsibilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12, "responsibilities summed to {sum}");
        assert!(read.refs.len() >= 2);
    }
    let expected = 100f64.exp();
    assert!((matrix.unique[&0].score - expected).abs() / expected < 1e-12);
    assert_eq!(matrix.unique[&0].score, matrix.ambiguous[&1].weight);
}

/// Grouping is keyed on the read id, not on line adjacency.
#[test]
fn scattered_lines_group_by_read_id() {
    let scattered = "\
read_1\t0\tref_a\t10\t42\t8M\t*\t0\t0\tACGTACGT\tFFFFFFFF\tAS:i:-2
read_2\t0\tref_a\t20\t42\t8M\t*\t0\t0\tACGTACGT\tFFFFFFFF\tAS:i:-2
read_1\t256\tref_b\t30\t42\t8M\t*\t0\t0\tACGTACGT\tFFFFFFFF\tAS:i:-2
";
    let dir = tempfile::tempdir().unwrap();
    let sam = write_sam(dir.path(), scattered);

    let matrix = build_matrix(&sam, 0.01).unwrap();

    assert_eq!(matrix.reads, vec!["read_1", "read_2"]);
    assert!(matrix.ambiguous.contains_key(&0), "read_1 is ambiguous");
    assert!(matrix.unique.contains_key(&1), "read_2 is unique");
}

/// The same (read, reference) pair twice adds nothing; the read stays
/// unique.
#[test]
fn duplicate_read_reference_pairs_are_ignored() {
    let duplicated = "\
read_1\t0\tref_a\t10\t42\t8M\t*\t0\t0\tACGTACGT\tFFFFFFFF\tAS:i:-2
read_1\t256\tref_a\t15\t42\t8M\t*\t0\t0\tACGTACGT\tFFFFFFFF\tAS:i:-2
";
    let dir = tempfile::tempdir().unwrap();
    let sam = write_sam(dir.path(), duplicated);

    let matrix = build_matrix(&sam, 0.01).unwrap();

    assert_eq!(matrix.unique.len(), 1);
    assert!(matrix.ambiguous.is_empty());
}

/// Negative raw scores shift up by the minimum before the exponential
/// rescale, so every stored score stays strictly positive and the best
/// alignment still lands on exp(100).
#[test]
fn negative_scores_shift_before_rescaling() {
    let mixed = "\
read_1\t0\tref_a\t10\t42\t8M\t*\t0\t0\tACGTACGT\tFFFFFFFF\tAS:i:-20
read_2\t0\tref_b\t20\t42\t8M\t*\t0\t0\tACGTACGT\tFFFFFFFF\tAS:i:-4
";
    let dir = tempfile::tempdir().unwrap();
    let sam = write_sam(dir.path(), mixed);

    // Raw scores: -12 and 4. Span 16, shift -12.
    let matrix = build_matrix(&sam, 0.01).unwrap();

    let low = matrix.unique[&0].score;
    let high = matrix.unique[&1].score;
    assert_eq!(low, 1.0, "minimum shifts to exp(0)");
    assert!((high - 100f64.exp()).abs() / 100f64.exp() < 1e-12);
}

/// A read whose only alignments fall below the cutoff never enters the
/// read table.
#[test]
fn below_cutoff_reads_never_enter_the_tables() {
    let faint = "\
read_1\t0\tref_a\t10\t30\t8M\t*\t0\t0\tACGTACGT\tFFFFFFFF
read_2\t0\tref_b\t20\t0\t8M\t*\t0\t0\tACGTACGT\tFFFFFFFF
";
    let dir = tempfile::tempdir().unwrap();
    let sam = write_sam(dir.path(), faint);

    let matrix = build_matrix(&sam, 0.01).unwrap();

    assert_eq!(matrix.reads, vec!["read_1"]);
    assert_eq!(matrix.refs, vec!["ref_a"]);
}

#[test]
fn empty_input_builds_an_empty_matrix() {
    let dir = tempfile::tempdir().unwrap();
    let sam = write_sam(dir.path(), "@HD\tVN:1.0\n");

    let matrix = build_matrix(&sam, 0.01).unwrap();

    assert!(matrix.refs.is_empty());
    assert!(matrix.reads.is_empty());
    assert!(matrix.unique.is_empty());
    assert!(matrix.ambiguous.is_empty());
}

/// A malformed line aborts the build; a partially built matrix is unsafe
/// to optimize over.
#[test]
fn malformed_line_aborts_the_build() {
    let broken = "\
read_1\t0\tref_a\t10\t42\t8M\t*\t0\t0\tACGTACGT\tFFFFFFFF\tAS:i:-2
read_2\tnot_a_flag\tref_a\t20\t42\t8M\t*\t0\t0\tACGTACGT\tFFFFFFFF\tAS:i:-2
";
    let dir = tempfile::tempdir().unwrap();
    let sam = write_sam(dir.path(), broken);

    assert!(build_matrix(&sam, 0.01).is_err());
}
