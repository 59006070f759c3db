use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pathoscope-rs",
    about = "Reassign ambiguous metagenomic read alignments with an EM over alignment likelihoods",
    version
)]
pub struct Args {
    /// Input SAM with candidate alignments
    pub in_sam: PathBuf,

    /// Output SAM path (best-supported alignments only)
    #[arg(short = 'o', long = "out", value_name = "SAM")]
    pub out_sam: PathBuf,

    /// Output abundance report path (TSV)
    #[arg(short = 'r', long = "report", value_name = "TSV")]
    pub report: PathBuf,

    /// Minimum alignment score to keep an alignment
    #[arg(long, default_value_t = 0.01)]
    pub cutoff: f64,

    /// EM iteration cap
    #[arg(long, default_value_t = 30)]
    pub max_iter: usize,

    /// EM convergence threshold on the change in pi
    #[arg(long, default_value_t = 1e-7)]
    pub epsilon: f64,

    /// Pseudo-count prior smoothing pi
    #[arg(long, default_value_t = 0.0)]
    pub pi_prior: f64,

    /// Pseudo-count prior smoothing theta
    #[arg(long, default_value_t = 0.0)]
    pub theta_prior: f64,

    /// Set logging level to WARN
    #[arg(short = 'q', long)]
    pub quiet: bool,
}
