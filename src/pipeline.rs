//! Pipeline orchestration: build matrix, run EM, resolve best hits,
//! rewrite the SAM file, emit the report.

use std::path::Path;

use crate::best_hit::{self, BestHitCounts};
use crate::em::{self, EmParams};
use crate::error::Result;
use crate::matrix;
use crate::report;
use crate::rewrite;

/// Parameters for one reassignment run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReassignConfig {
    /// Minimum alignment score; lower-scoring lines are ignored in both
    /// passes.
    pub cutoff: f64,
    /// EM iteration cap.
    pub max_iter: usize,
    /// EM convergence threshold on the L1 change in pi.
    pub epsilon: f64,
    /// Pseudo-count smoothing for pi.
    pub pi_prior: f64,
    /// Pseudo-count smoothing for theta.
    pub theta_prior: f64,
}

impl Default for ReassignConfig {
    fn default() -> Self {
        Self {
            cutoff: 0.01,
            max_iter: 30,
            epsilon: 1e-7,
            pi_prior: 0.0,
            theta_prior: 0.0,
        }
    }
}

/// Structured result of a reassignment run; the contract callers persist.
#[derive(Debug, Clone, Default)]
pub struct ReassignSummary {
    /// Reference table, first-seen order; all vectors below are parallel
    /// to it.
    pub refs: Vec<String>,
    /// Distinct reads that had at least one accepted alignment.
    pub read_count: usize,
    /// Final per-reference abundance estimate.
    pub pi: Vec<f64>,
    /// Abundance after the first EM iteration.
    pub initial_pi: Vec<f64>,
    /// Best-hit counts before EM refinement.
    pub best_hit_initial: BestHitCounts,
    /// Best-hit counts after EM refinement.
    pub best_hit_final: BestHitCounts,
    /// EM iterations run.
    pub iterations: usize,
    /// False when the EM stopped at the iteration cap.
    pub converged: bool,
    /// Alignment lines kept in the rewritten SAM.
    pub retained: u64,
    /// Alignment lines dropped from the rewritten SAM.
    pub dropped: u64,
}

/// Run the full reassignment over `sam_path`.
///
/// Writes the filtered SAM to `realigned_path` and the abundance report to
/// `report_path`. Neither output file is touched until the matrix build,
/// EM, and best-hit resolution have all succeeded.
pub fn reassign(
    sam_path: &Path,
    report_path: &Path,
    realigned_path: &Path,
    config: &ReassignConfig,
) -> Result<ReassignSummary> {
    let mut matrix = matrix::build_matrix(sam_path, config.cutoff)?;
    tracing::info!(
        references = matrix.refs.len(),
        reads = matrix.reads.len(),
        unique = matrix.unique.len(),
        ambiguous = matrix.ambiguous.len(),
        "alignment matrix built"
    );

    let best_hit_initial = best_hit::compute_best_hit(&matrix);

    let params = EmParams {
        max_iter: config.max_iter,
        epsilon: config.epsilon,
        pi_prior: config.pi_prior,
        theta_prior: config.theta_prior,
    };
    let abundances = em::em(&mut matrix, &params)?;
    if abundances.converged {
        tracing::info!(iterations = abundances.iterations, "em converged");
    } else {
        tracing::warn!(
            iterations = abundances.iterations,
            epsilon = config.epsilon,
            "em stopped at the iteration cap; keeping the best estimate so far"
        );
    }

    let best_hit_final = best_hit::compute_best_hit(&matrix);

    let stats = rewrite::rewrite_align(&matrix, sam_path, realigned_path, config.cutoff)?;
    tracing::info!(
        headers = stats.header_lines,
        retained = stats.retained,
        dropped = stats.dropped,
        "rewrote alignment file"
    );

    let rows = report::build_report_rows(&matrix, &abundances, &best_hit_initial, &best_hit_final);
    report::write_report(report_path, &rows)?;
    tracing::info!(rows = rows.len(), "wrote abundance report");

    Ok(ReassignSummary {
        refs: matrix.refs,
        read_count: matrix.reads.len(),
        pi: abundances.pi,
        initial_pi: abundances.initial_pi,
        best_hit_initial,
        best_hit_final,
        iterations: abundances.iterations,
        converged: abundances.converged,
        retained: stats.retained,
        dropped: stats.dropped,
    })
}
