mod best_hit;
mod cli;
mod em;
mod error;
mod matrix;
mod pipeline;
mod report;
mod rewrite;
mod sam;
mod types;

use anyhow::Result;
use clap::Parser;
use mimalloc::MiMalloc;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> Result<()> {
    let args = cli::Args::parse();

    // Initialize tracing subscriber
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if args.quiet {
            EnvFilter::new("warn")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = pipeline::ReassignConfig {
        cutoff: args.cutoff,
        max_iter: args.max_iter,
        epsilon: args.epsilon,
        pi_prior: args.pi_prior,
        theta_prior: args.theta_prior,
    };

    let summary = pipeline::reassign(&args.in_sam, &args.report, &args.out_sam, &config)?;
    tracing::info!(
        references = summary.refs.len(),
        reads = summary.read_count,
        iterations = summary.iterations,
        converged = summary.converged,
        retained = summary.retained,
        dropped = summary.dropped,
        "pathoscope-rs: reassignment complete"
    );
    Ok(())
}
