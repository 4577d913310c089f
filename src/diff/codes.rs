//! Line encoding
//!
//! Converts input elements into small integer codes through a symbol table
//! shared across both sequences, so the engine compares plain integers
//! instead of strings.

use std::collections::HashMap;
use std::hash::Hash;

/// Encodes `lines` against `table`, assigning a fresh code to every element
/// seen for the first time. Equal elements always map to equal codes and
/// distinct elements never collide, since the table is keyed by the element
/// itself.
pub(crate) fn diff_codes<'a, T: Eq + Hash>(
    lines: &'a [T],
    table: &mut HashMap<&'a T, u32>,
) -> Vec<u32> {
    let mut codes = Vec::with_capacity(lines.len());
    for line in lines {
        let next = table.len() as u32 + 1;
        let code = *table.entry(line).or_insert(next);
        codes.push(code);
    }
    codes
}
