//! TSV abundance report.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::best_hit::BestHitCounts;
use crate::em::Abundances;
use crate::error::Result;
use crate::matrix::AlignmentMatrix;

const COLUMNS: [&str; 11] = [
    "reference",
    "final_pi",
    "final_best_hit",
    "final_best_hit_reads",
    "final_high_confidence",
    "final_low_confidence",
    "initial_pi",
    "initial_best_hit",
    "initial_best_hit_reads",
    "initial_high_confidence",
    "initial_low_confidence",
];

/// One report row; field order matches [`COLUMNS`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub reference: String,
    pub final_pi: f64,
    pub final_best_hit: f64,
    pub final_best_hit_reads: f64,
    pub final_high_confidence: f64,
    pub final_low_confidence: f64,
    pub initial_pi: f64,
    pub initial_best_hit: f64,
    pub initial_best_hit_reads: f64,
    pub initial_high_confidence: f64,
    pub initial_low_confidence: f64,
}

/// Assemble report rows: one per reference with any best-hit support,
/// ordered by descending final pi, ties in reference-table order.
pub fn build_report_rows(
    matrix: &AlignmentMatrix,
    abundances: &Abundances,
    initial: &BestHitCounts,
    final_: &BestHitCounts,
) -> Vec<ReportRow> {
    let mut rows: Vec<ReportRow> = matrix
        .refs
        .iter()
        .enumerate()
        .filter(|&(g, _)| final_.reads[g] > 0.0 || initial.reads[g] > 0.0)
        .map(|(g, name)| ReportRow {
            reference: name.clone(),
            final_pi: abundances.pi[g],
            final_best_hit: final_.proportions[g],
            final_best_hit_reads: final_.reads[g],
            final_high_confidence: final_.high_confidence[g],
            final_low_confidence: final_.low_confidence[g],
            initial_pi: abundances.initial_pi[g],
            initial_best_hit: initial.proportions[g],
            initial_best_hit_reads: initial.reads[g],
            initial_high_confidence: initial.high_confidence[g],
            initial_low_confidence: initial.low_confidence[g],
        })
        .collect();

    // Stable sort keeps reference-table order for equal pi.
    rows.sort_by(|a, b| b.final_pi.total_cmp(&a.final_pi));
    rows
}

/// Write the report: one tab-separated header row, then one row per entry.
pub fn write_report(path: &Path, rows: &[ReportRow]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);

    writeln!(writer, "{}", COLUMNS.join("\t"))?;

    for row in rows {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            row.reference,
            row.final_pi,
            row.final_best_hit,
            row.final_best_hit_reads,
            row.final_high_confidence,
            row.final_low_confidence,
            row.initial_pi,
            row.initial_best_hit,
            row.initial_best_hit_reads,
            row.initial_high_confidence,
            row.initial_low_confidence,
        )?;
    }

    writer.flush()?;
    Ok(())
}
