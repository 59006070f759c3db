//! Matrix builder: one streaming pass over the SAM file that partitions
//! reads into unique and ambiguous groups.
//!
//! Read and reference names are interned to dense zero-based indices in
//! first-seen order. Those indices are stable for the rest of the run and
//! fix the accumulation order everywhere downstream, which is what makes
//! repeated runs bit-identical.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::Result;
use crate::sam::{self, LineKind};
use crate::types::{HashMap, HashMapExt, ReadIndex, RefIndex};

/// A read with a single candidate reference. Contributes its mass to that
/// reference without EM refinement.
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueRead {
    pub ref_index: RefIndex,
    /// Rescaled entry score.
    pub score: f64,
}

/// A read with two or more candidate references, refined iteratively.
#[derive(Debug, Clone, PartialEq)]
pub struct AmbiguousRead {
    /// Candidate reference indices, in the order the alignments appeared.
    pub refs: Vec<RefIndex>,
    /// Rescaled entry score per candidate, parallel to `refs`.
    pub scores: Vec<f64>,
    /// Current responsibility distribution over `refs`; sums to 1. Starts
    /// as the normalized entry scores, overwritten by each E-step.
    pub responsibilities: Vec<f64>,
    /// Maximum rescaled entry score; weights this read's contribution to
    /// the abundance totals.
    pub weight: f64,
}

/// The sparse read-by-reference structure consumed by the EM optimizer.
///
/// `BTreeMap` keys are read indices, so iteration is always in read-table
/// order. Ownership flows builder -> optimizer -> resolver -> writer; no
/// stage shares mutable access with another.
#[derive(Debug, Clone, Default)]
pub struct AlignmentMatrix {
    pub unique: BTreeMap<ReadIndex, UniqueRead>,
    pub ambiguous: BTreeMap<ReadIndex, AmbiguousRead>,
    /// Reference table: distinct reference names, first-seen order.
    pub refs: Vec<String>,
    /// Read table: distinct read names, first-seen order.
    pub reads: Vec<String>,
}

/// All alignments collected for one read during the pass, before the
/// unique/ambiguous split.
#[derive(Debug)]
struct PendingRead {
    refs: Vec<RefIndex>,
    scores: Vec<f64>,
}

/// Stream `sam_path` once and build the alignment matrix.
///
/// Alignments scoring below `cutoff` are dropped before they reach the
/// matrix; a read whose candidates all fall below the cutoff never enters
/// the read table. A malformed line aborts the build.
pub fn build_matrix(sam_path: &Path, cutoff: f64) -> Result<AlignmentMatrix> {
    let reader = BufReader::new(File::open(sam_path)?);

    let mut ref_ids: HashMap<String, RefIndex> = HashMap::new();
    let mut read_ids: HashMap<String, ReadIndex> = HashMap::new();
    let mut refs: Vec<String> = Vec::new();
    let mut reads: Vec<String> = Vec::new();
    // Indexed by read index; reads are interned densely so this stays
    // parallel to `reads`.
    let mut pending: Vec<PendingRead> = Vec::new();

    let mut max_score: Option<f64> = None;
    let mut min_score: Option<f64> = None;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let number = idx as u64 + 1;

        let record = match sam::classify_line(&line, number, cutoff)? {
            LineKind::Header | LineKind::Skip => continue,
            LineKind::Alignment(record) => record,
        };

        max_score = Some(max_score.map_or(record.score, |m| m.max(record.score)));
        min_score = Some(min_score.map_or(record.score, |m| m.min(record.score)));

        let ref_index = match ref_ids.get(record.ref_id) {
            Some(&index) => index,
            None => {
                let index = refs.len();
                ref_ids.insert(record.ref_id.to_string(), index);
                refs.push(record.ref_id.to_string());
                index
            }
        };

        match read_ids.get(record.read_id) {
            Some(&read_index) => {
                let entry = &mut pending[read_index];
                // A repeated (read, reference) pair adds nothing.
                if entry.refs.contains(&ref_index) {
                    continue;
                }
                entry.refs.push(ref_index);
                entry.scores.push(record.score);
            }
            None => {
                read_ids.insert(record.read_id.to_string(), reads.len());
                reads.push(record.read_id.to_string());
                pending.push(PendingRead {
                    refs: vec![ref_index],
                    scores: vec![record.score],
                });
            }
        }
    }

    let mut matrix = AlignmentMatrix {
        unique: BTreeMap::new(),
        ambiguous: BTreeMap::new(),
        refs,
        reads,
    };

    let (Some(max_score), Some(min_score)) = (max_score, min_score) else {
        // No accepted alignments; a valid, empty matrix.
        return Ok(matrix);
    };

    let (scale, shift) = rescale_factors(max_score, min_score);

    for (read_index, mut entry) in pending.into_iter().enumerate() {
        for score in &mut entry.scores {
            *score = ((*score - shift) * scale).exp();
        }

        if entry.refs.len() == 1 {
            matrix.unique.insert(
                read_index,
                UniqueRead {
                    ref_index: entry.refs[0],
                    score: entry.scores[0],
                },
            );
        } else {
            let sum: f64 = entry.scores.iter().sum();
            let responsibilities = entry.scores.iter().map(|s| s / sum).collect();
            let weight = entry.scores.iter().cloned().fold(f64::MIN, f64::max);
            matrix.ambiguous.insert(
                read_index,
                AmbiguousRead {
                    refs: entry.refs,
                    scores: entry.scores,
                    responsibilities,
                    weight,
                },
            );
        }
    }

    Ok(matrix)
}

/// Exponential rescaling parameters for raw alignment scores.
///
/// Scores are mapped onto `exp((score - shift) * scale)` so the spread
/// covers at most `e^100`. Negative raw scores (the AS-tag path) shift the
/// whole range up by the minimum first. Every rescaled score is strictly
/// positive, which keeps the EM away from zero likelihoods.
fn rescale_factors(max_score: f64, min_score: f64) -> (f64, f64) {
    if min_score < 0.0 {
        let span = max_score - min_score;
        let scale = if span > 0.0 { 100.0 / span } else { 0.0 };
        (scale, min_score)
    } else {
        let scale = if max_score > 0.0 { 100.0 / max_score } else { 0.0 };
        (scale, 0.0)
    }
}
