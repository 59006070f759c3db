//! Best-hit resolution: per-reference read counts from the refined matrix.

use crate::matrix::AlignmentMatrix;

/// Read-count thresholds for the confidence bands in the report.
const HIGH_CONFIDENCE: f64 = 0.5;
const LOW_CONFIDENCE: f64 = 0.01;

/// Per-reference best-hit counts, indexed by reference table order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BestHitCounts {
    /// Best-hit read mass. A unique read counts 1 for its reference; an
    /// ambiguous read splits 1 evenly across every candidate tied at its
    /// maximum responsibility.
    pub reads: Vec<f64>,
    /// `reads` normalized by the total read count.
    pub proportions: Vec<f64>,
    /// Reads whose winning responsibility is at least 0.5.
    pub high_confidence: Vec<f64>,
    /// Reads whose winning responsibility is in [0.01, 0.5).
    pub low_confidence: Vec<f64>,
}

/// Resolve every read to its best-supported reference(s).
///
/// Ties share mass rather than being broken arbitrarily; candidates are
/// visited in stored (first-seen) order, so the outcome is deterministic.
/// Run before the EM for the initial guess and after it for the final one.
pub fn compute_best_hit(matrix: &AlignmentMatrix) -> BestHitCounts {
    let genome_count = matrix.refs.len();
    let mut reads = vec![0.0; genome_count];
    let mut high_confidence = vec![0.0; genome_count];
    let mut low_confidence = vec![0.0; genome_count];

    for read in matrix.unique.values() {
        reads[read.ref_index] += 1.0;
        high_confidence[read.ref_index] += 1.0;
    }

    for read in matrix.ambiguous.values() {
        let best = read
            .responsibilities
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        let tied = read.responsibilities.iter().filter(|&&x| x == best).count();
        let share = 1.0 / tied.max(1) as f64;

        for (k, &ref_index) in read.refs.iter().enumerate() {
            let x = read.responsibilities[k];
            if x == best {
                reads[ref_index] += share;
                if x >= HIGH_CONFIDENCE {
                    high_confidence[ref_index] += 1.0;
                } else if x >= LOW_CONFIDENCE {
                    low_confidence[ref_index] += 1.0;
                }
            }
        }
    }

    let read_count = matrix.reads.len();
    let proportions = if read_count == 0 {
        vec![0.0; genome_count]
    } else {
        reads.iter().map(|r| r / read_count as f64).collect()
    };

    BestHitCounts {
        reads,
        proportions,
        high_confidence,
        low_confidence,
    }
}
