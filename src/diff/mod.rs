//! Line-sequence diffing
//!
//! Implements the difference algorithm published in "An O(ND) Difference
//! Algorithm and its Variations" by Eugene Myers, Algorithmica Vol. 1
//! No. 2, 1986, p 251, using the divide-and-conquer middle snake search.
//!
//! - `codes`: maps lines to integer codes through a shared symbol table
//! - `engine`: the recursive shortest edit script search
//! - `script`: converts per-line change flags into typed chunks

mod codes;
mod engine;
mod script;

use std::collections::HashMap;
use std::hash::Hash;

use derive_new::new;

use crate::diff::engine::{DiffData, MyersEngine, optimize};

/// Classification of one contiguous region of a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffType {
    Unchanged,
    Deleted,
    Inserted,
}

/// One contiguous region of the edit script.
///
/// `start_a` and `start_b` are 0-based offsets into the original inputs.
/// A full chunk list partitions both inputs: every element of A belongs to
/// exactly one `Unchanged` or `Deleted` chunk, every element of B to exactly
/// one `Unchanged` or `Inserted` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct DiffChunk {
    pub kind: DiffType,
    pub start_a: usize,
    pub start_b: usize,
    pub length: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// The middle snake search ran past its iteration bound. This is an
    /// internal invariant violation, not a property of the input.
    #[error("middle snake search exceeded its iteration bound")]
    MiddleSnakeNotFound,
}

/// Computes the shortest edit script between two sequences.
///
/// Elements are compared by exact equality; no normalization of any kind is
/// applied. The returned chunks are ordered, never empty, never repeat a
/// type back-to-back, and deletions always precede insertions at the same
/// point.
pub fn diff<T: Eq + Hash>(lines_a: &[T], lines_b: &[T]) -> Result<Vec<DiffChunk>, DiffError> {
    // The symbol table is shared so that equal lines across both inputs
    // receive equal codes; it is dropped as soon as both are encoded.
    let mut table = HashMap::with_capacity(lines_a.len() + lines_b.len());
    let codes_a = codes::diff_codes(lines_a, &mut table);
    let codes_b = codes::diff_codes(lines_b, &mut table);
    drop(table);

    let mut data_a = DiffData::new(codes_a);
    let mut data_b = DiffData::new(codes_b);

    MyersEngine::new(&mut data_a, &mut data_b).run()?;

    optimize(&mut data_a);
    optimize(&mut data_b);

    Ok(script::create_diffs(&data_a, &data_b))
}
