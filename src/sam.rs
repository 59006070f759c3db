//! SAM line classification and alignment scoring.
//!
//! The engine never materializes whole SAM records. Each data line is split
//! on whitespace and reduced to the three fields the reassignment model
//! needs: query name, reference name, and an alignment score. The same
//! classification runs in both file passes (matrix build and rewrite) so the
//! two passes agree on which lines exist.

use crate::error::{ReassignError, Result};

/// Bitwise FLAG 0x4: segment unmapped.
const FLAG_UNMAPPED: u32 = 0x4;

/// One accepted alignment line, borrowing from the line buffer.
#[derive(Debug, Clone, Copy)]
pub struct AlignmentRecord<'a> {
    pub read_id: &'a str,
    pub ref_id: &'a str,
    pub score: f64,
}

/// Outcome of looking at one SAM line.
#[derive(Debug, Clone, Copy)]
pub enum LineKind<'a> {
    /// `@`-prefixed header (or `#` comment); copied through by the rewriter.
    Header,
    /// Unmapped segment, `*` reference, or score below the cutoff.
    Skip,
    Alignment(AlignmentRecord<'a>),
}

/// Classify one SAM line.
///
/// `number` is the 1-based line number, used only for error reporting. A
/// line that is neither a header nor a parseable alignment is a fatal
/// [`ReassignError::MalformedLine`]; skipping it would leave the matrix in a
/// state the EM cannot be trusted with.
pub fn classify_line<'a>(line: &'a str, number: u64, cutoff: f64) -> Result<LineKind<'a>> {
    if line.starts_with('@') || line.starts_with('#') {
        return Ok(LineKind::Header);
    }

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 11 {
        return Err(malformed(
            number,
            format!("expected at least 11 fields, found {}", fields.len()),
        ));
    }

    let flag: u32 = fields[1]
        .parse()
        .map_err(|_| malformed(number, format!("FLAG is not an integer: {:?}", fields[1])))?;
    if flag & FLAG_UNMAPPED != 0 {
        return Ok(LineKind::Skip);
    }

    if fields[2] == "*" {
        return Ok(LineKind::Skip);
    }

    let score = alignment_score(&fields, number)?;
    if score < cutoff {
        return Ok(LineKind::Skip);
    }

    Ok(LineKind::Alignment(AlignmentRecord {
        read_id: fields[0],
        ref_id: fields[2],
        score,
    }))
}

/// Raw alignment score for a mapped line.
///
/// Prefers the aligner's `AS:i:` tag, offset by the query length so that the
/// score is comparable across read lengths (the PathoScope convention; the
/// rescaling step in the matrix builder assumes this shape). When the tag is
/// absent the score falls back to the MAPQ-derived mapping probability
/// `1 - 10^(-mapq/10)`, which is bounded on `[0, 1)`.
pub fn alignment_score(fields: &[&str], number: u64) -> Result<f64> {
    for field in &fields[11..] {
        if let Some(value) = field.strip_prefix("AS:i:") {
            let a_score: i64 = value
                .parse()
                .map_err(|_| malformed(number, format!("bad AS tag value: {value:?}")))?;
            return Ok(a_score as f64 + fields[9].len() as f64);
        }
    }

    let mapq: f64 = fields[4]
        .parse()
        .map_err(|_| malformed(number, format!("MAPQ is not numeric: {:?}", fields[4])))?;
    Ok(1.0 - 10f64.powf(mapq / -10.0))
}

fn malformed(line: u64, reason: String) -> ReassignError {
    ReassignError::MalformedLine { line, reason }
}
