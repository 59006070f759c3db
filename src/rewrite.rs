//! Second pass over the SAM file: keep only best-supported alignment lines.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{ReassignError, Result};
use crate::matrix::AlignmentMatrix;
use crate::sam::{self, LineKind};
use crate::types::{HashMap, HashSet, HashSetExt, ReadIndex};

/// Line counts from the rewrite pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct RewriteStats {
    pub header_lines: u64,
    /// Alignment lines kept in the rewritten file.
    pub retained: u64,
    /// Alignment lines dropped: skipped by classification or losing the
    /// best-hit decision for their read.
    pub dropped: u64,
}

/// Rewrite `sam_path` into `out_path`, retaining header lines verbatim and
/// only those alignment lines whose reference is a best hit for their read.
///
/// Classification (unmapped, `*` reference, below `cutoff`) matches the
/// builder pass exactly, so every surviving line resolves against the
/// matrix. Ties at the maximum responsibility are all retained. A unique
/// read keeps its single line; repeated (read, reference) lines beyond the
/// first are dropped for unique reads, mirroring the dedup in the builder.
pub fn rewrite_align(
    matrix: &AlignmentMatrix,
    sam_path: &Path,
    out_path: &Path,
    cutoff: f64,
) -> Result<RewriteStats> {
    let reader = BufReader::new(File::open(sam_path)?);
    let mut writer = BufWriter::new(File::create(out_path)?);

    let ref_ids: HashMap<&str, usize> = matrix
        .refs
        .iter()
        .enumerate()
        .map(|(index, name)| (name.as_str(), index))
        .collect();
    let read_ids: HashMap<&str, usize> = matrix
        .reads
        .iter()
        .enumerate()
        .map(|(index, name)| (name.as_str(), index))
        .collect();

    let mut unique_written: HashSet<ReadIndex> = HashSet::new();
    let mut stats = RewriteStats::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let number = idx as u64 + 1;

        let record = match sam::classify_line(&line, number, cutoff)? {
            LineKind::Header => {
                stats.header_lines += 1;
                writer.write_all(line.as_bytes())?;
                writer.write_all(b"\n")?;
                continue;
            }
            LineKind::Skip => {
                stats.dropped += 1;
                continue;
            }
            LineKind::Alignment(record) => record,
        };

        // Both lookups must succeed: this pass accepts exactly the lines
        // the builder accepted. A miss means the file changed under us.
        let (Some(&read_index), Some(&ref_index)) = (
            read_ids.get(record.read_id),
            ref_ids.get(record.ref_id),
        ) else {
            return Err(stale_input(number));
        };

        let keep = if matrix.unique.contains_key(&read_index) {
            unique_written.insert(read_index)
        } else if let Some(read) = matrix.ambiguous.get(&read_index) {
            let best = read
                .responsibilities
                .iter()
                .cloned()
                .fold(f64::NEG_INFINITY, f64::max);
            let position = read
                .refs
                .iter()
                .position(|&r| r == ref_index)
                .ok_or_else(|| stale_input(number))?;
            read.responsibilities[position] == best
        } else {
            return Err(stale_input(number));
        };

        if keep {
            stats.retained += 1;
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        } else {
            stats.dropped += 1;
        }
    }

    writer.flush()?;
    Ok(stats)
}

fn stale_input(line: u64) -> ReassignError {
    ReassignError::MalformedLine {
        line,
        reason: "alignment not present in the matrix built from this file".to_string(),
    }
}
