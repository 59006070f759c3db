//! Expectation-maximization over the alignment matrix.
//!
//! The E-step refreshes each ambiguous read's responsibility distribution
//! from the current abundance estimates; the M-step re-estimates pi and
//! theta from unique mass plus weighted responsibilities. All accumulation
//! runs in read-table and reference-table order, so identical inputs and
//! parameters give bit-identical trajectories.

use crate::error::{ReassignError, Result};
use crate::matrix::AlignmentMatrix;

/// Tuning parameters for the EM loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmParams {
    /// Iteration cap. Hitting it is a normal outcome, not an error.
    pub max_iter: usize,
    /// Convergence threshold on the L1 change in pi between iterations.
    pub epsilon: f64,
    /// Dirichlet-style pseudo-count smoothing pi; 0 disables.
    pub pi_prior: f64,
    /// Dirichlet-style pseudo-count smoothing theta; 0 disables.
    pub theta_prior: f64,
}

impl Default for EmParams {
    fn default() -> Self {
        Self {
            max_iter: 30,
            epsilon: 1e-7,
            pi_prior: 0.0,
            theta_prior: 0.0,
        }
    }
}

/// Refined abundance estimates.
#[derive(Debug, Clone, Default)]
pub struct Abundances {
    /// Pi after the first iteration, before ambiguity is resolved. Reported
    /// alongside the final estimate as the initial guess.
    pub initial_pi: Vec<f64>,
    /// Genome-level relative abundance per reference; sums to 1.
    pub pi: Vec<f64>,
    /// Read-weight-normalized abundance used to re-weight responsibilities.
    pub theta: Vec<f64>,
    /// Iterations actually run.
    pub iterations: usize,
    /// False when the loop stopped at `max_iter` with the pi delta still
    /// above epsilon.
    pub converged: bool,
}

/// Run the EM loop, refining `matrix.ambiguous` responsibilities in place.
///
/// With no ambiguous reads the loop stops after a single iteration; pi is
/// then fully determined by the unique mass, independent of `max_iter` and
/// `epsilon`.
pub fn em(matrix: &mut AlignmentMatrix, params: &EmParams) -> Result<Abundances> {
    let genome_count = matrix.refs.len();
    if genome_count == 0 {
        return Ok(Abundances {
            iterations: 0,
            converged: true,
            ..Abundances::default()
        });
    }

    let uniform = 1.0 / genome_count as f64;
    let mut pi = vec![uniform; genome_count];
    let mut theta = vec![uniform; genome_count];
    let mut initial_pi = pi.clone();

    // Unique reads contribute fixed mass; fold it once.
    let mut pi_sum_0 = vec![0.0; genome_count];
    let mut u_total = 0.0;
    let mut max_u_weight: f64 = 0.0;
    for read in matrix.unique.values() {
        pi_sum_0[read.ref_index] += read.score;
        u_total += read.score;
        max_u_weight = max_u_weight.max(read.score);
    }

    let mut nu_total = 0.0;
    let mut max_nu_weight: f64 = 0.0;
    for read in matrix.ambiguous.values() {
        nu_total += read.weight;
        max_nu_weight = max_nu_weight.max(read.weight);
    }

    let prior_weight = max_u_weight.max(max_nu_weight);
    let pi_p = params.pi_prior * prior_weight;
    let theta_p = params.theta_prior * prior_weight;

    let pi_denominator = u_total + nu_total + pi_p * genome_count as f64;
    let theta_denominator =
        if nu_total == 0.0 { 1.0 } else { nu_total } + theta_p * genome_count as f64;

    let mut iterations = 0;
    let mut converged = false;

    for iteration in 0..params.max_iter {
        let pi_old = pi.clone();
        let mut theta_sum = vec![0.0; genome_count];

        // E-step.
        for read in matrix.ambiguous.values_mut() {
            let mut x_sum = 0.0;
            for (k, &ref_index) in read.refs.iter().enumerate() {
                let x = pi[ref_index] * theta[ref_index] * read.scores[k];
                read.responsibilities[k] = x;
                x_sum += x;
            }
            if x_sum == 0.0 {
                read.responsibilities.fill(0.0);
            } else {
                for x in &mut read.responsibilities {
                    *x /= x_sum;
                }
            }
            for (k, &ref_index) in read.refs.iter().enumerate() {
                theta_sum[ref_index] += read.responsibilities[k] * read.weight;
            }
        }

        // M-step.
        for g in 0..genome_count {
            pi[g] = (theta_sum[g] + pi_sum_0[g] + pi_p) / pi_denominator;
            theta[g] = (theta_sum[g] + theta_p) / theta_denominator;
        }

        if pi.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(ReassignError::NumericInstability { iteration });
        }

        if iteration == 0 {
            initial_pi.copy_from_slice(&pi);
        }

        iterations = iteration + 1;

        let delta: f64 = pi
            .iter()
            .zip(&pi_old)
            .map(|(new, old)| (new - old).abs())
            .sum();

        if delta <= params.epsilon || matrix.ambiguous.is_empty() {
            converged = true;
            break;
        }
    }

    Ok(Abundances {
        initial_pi,
        pi,
        theta,
        iterations,
        converged,
    })
}
