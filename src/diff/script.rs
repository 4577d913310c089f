//! Edit script construction from per-line change flags.

use crate::diff::engine::DiffData;
use crate::diff::{DiffChunk, DiffType};

/// Scans both flag arrays in lockstep producing chunks in forward order.
///
/// Each round consumes a maximal unchanged run, then a maximal deleted run,
/// then a maximal inserted run; callers rely on deletions coming before
/// insertions at the same point. Zero-length chunks are never emitted.
pub(crate) fn create_diffs(data_a: &DiffData, data_b: &DiffData) -> Vec<DiffChunk> {
    let mut chunks = Vec::new();

    let mut line_a = 0;
    let mut line_b = 0;
    while line_a < data_a.len() || line_b < data_b.len() {
        // equal lines
        let start_a = line_a;
        let start_b = line_b;
        while line_a < data_a.len()
            && !data_a.modified[line_a]
            && line_b < data_b.len()
            && !data_b.modified[line_b]
        {
            line_a += 1;
            line_b += 1;
        }
        if start_a < line_a {
            chunks.push(DiffChunk::new(
                DiffType::Unchanged,
                start_a,
                start_b,
                line_a - start_a,
            ));
        }

        // deleted lines
        let start_a = line_a;
        let start_b = line_b;
        while line_a < data_a.len() && (line_b >= data_b.len() || data_a.modified[line_a]) {
            line_a += 1;
        }
        if start_a < line_a {
            chunks.push(DiffChunk::new(
                DiffType::Deleted,
                start_a,
                start_b,
                line_a - start_a,
            ));
        }

        // inserted lines
        let start_a = line_a;
        let start_b = line_b;
        while line_b < data_b.len() && (line_a >= data_a.len() || data_b.modified[line_b]) {
            line_b += 1;
        }
        if start_b < line_b {
            chunks.push(DiffChunk::new(
                DiffType::Inserted,
                start_a,
                start_b,
                line_b - start_b,
            ));
        }
    }

    chunks
}
