use thiserror::Error;

/// Errors surfaced by the reassignment engine.
///
/// A malformed alignment line is fatal for the whole run: a partially built
/// matrix cannot be trusted, so there is no per-line recovery. Hitting the
/// EM iteration cap is NOT an error and is reported through
/// [`crate::em::Abundances::converged`] instead.
#[derive(Error, Debug)]
pub enum ReassignError {
    #[error("malformed SAM line {line}: {reason}")]
    MalformedLine { line: u64, reason: String },

    #[error("pi left the probability simplex at EM iteration {iteration}")]
    NumericInstability { iteration: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = ReassignError> = std::result::Result<T, E>;
