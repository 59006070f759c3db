//! pathoscope-rs: probabilistic reassignment of ambiguous metagenomic read
//! alignments.
//!
//! Given a SAM file in which reads may align to several candidate
//! references, estimate which reference each read came from with an
//! expectation-maximization over alignment-derived likelihoods, then write
//! a filtered SAM (best-supported alignments only) and a per-reference
//! abundance report.
//!
//! # Library usage
//!
//! ```no_run
//! use pathoscope_rs::{reassign, ReassignConfig};
//! use std::path::Path;
//!
//! let config = ReassignConfig::default();
//! let summary = reassign(
//!     Path::new("alignments.sam"),
//!     Path::new("report.tsv"),
//!     Path::new("realigned.sam"),
//!     &config,
//! )?;
//! println!("{} references, {} EM iterations", summary.refs.len(), summary.iterations);
//! # Ok::<(), pathoscope_rs::ReassignError>(())
//! ```
//!
//! The stages are also exposed individually (`build_matrix` -> `em` ->
//! `compute_best_hit` -> rewrite/report) for callers that want the
//! intermediate structures.

pub mod best_hit;
pub mod em;
pub mod error;
pub mod matrix;
pub mod pipeline;
pub mod report;
pub mod rewrite;
pub mod sam;
pub mod types;

// Flat re-exports for the most commonly used public types.
pub use best_hit::{BestHitCounts, compute_best_hit};
pub use em::{Abundances, EmParams, em};
pub use error::ReassignError;
pub use matrix::{AlignmentMatrix, AmbiguousRead, UniqueRead, build_matrix};
pub use pipeline::{ReassignConfig, ReassignSummary, reassign};
pub use types::{ReadIndex, RefIndex};
