//! Myers divide-and-conquer shortest edit script search.

use crate::diff::DiffError;

/// Working buffer for one side of a comparison.
///
/// `modified[i]` set means line `i` takes part in an edit: a deletion when
/// this is the A side, an insertion when it is the B side.
pub(crate) struct DiffData {
    pub(crate) data: Vec<u32>,
    pub(crate) modified: Vec<bool>,
}

impl DiffData {
    pub(crate) fn new(data: Vec<u32>) -> Self {
        let modified = vec![false; data.len()];
        DiffData { data, modified }
    }

    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }
}

/// One shortest edit script computation over a pair of coded sequences.
///
/// The two diagonal work vectors are allocated once per top-level run and
/// reused by every recursive call; each call only touches the diagonal range
/// implied by its own box, so sharing them is safe. Positions and diagonals
/// are kept as `isize` throughout because k-lines go negative.
pub(crate) struct MyersEngine<'d> {
    a: &'d mut DiffData,
    b: &'d mut DiffData,
    down_vector: Vec<isize>,
    up_vector: Vec<isize>,
}

impl<'d> MyersEngine<'d> {
    pub(crate) fn new(a: &'d mut DiffData, b: &'d mut DiffData) -> Self {
        let max = a.len() + b.len() + 1;
        MyersEngine {
            a,
            b,
            down_vector: vec![0; 2 * max + 2],
            up_vector: vec![0; 2 * max + 2],
        }
    }

    /// Fills in the `modified` flags of both sides with a minimal edit set.
    pub(crate) fn run(&mut self) -> Result<(), DiffError> {
        let n = self.a.len() as isize;
        let m = self.b.len() as isize;
        self.lcs(0, n, 0, m)
    }

    /// Recursive longest-common-subsequence step over the box
    /// `A[lower_a..upper_a) x B[lower_b..upper_b)`. Bounds are passed instead
    /// of sub-slices so the sequences stay in place.
    fn lcs(
        &mut self,
        mut lower_a: isize,
        mut upper_a: isize,
        mut lower_b: isize,
        mut upper_b: isize,
    ) -> Result<(), DiffError> {
        // Fast walkthrough of equal lines at the start and end; this is what
        // keeps long unchanged regions linear.
        while lower_a < upper_a
            && lower_b < upper_b
            && self.a.data[lower_a as usize] == self.b.data[lower_b as usize]
        {
            lower_a += 1;
            lower_b += 1;
        }
        while lower_a < upper_a
            && lower_b < upper_b
            && self.a.data[(upper_a - 1) as usize] == self.b.data[(upper_b - 1) as usize]
        {
            upper_a -= 1;
            upper_b -= 1;
        }

        if lower_a == upper_a {
            for i in lower_b..upper_b {
                self.b.modified[i as usize] = true;
            }
        } else if lower_b == upper_b {
            for i in lower_a..upper_a {
                self.a.modified[i as usize] = true;
            }
        } else {
            let (x, y) = self.sms(lower_a, upper_a, lower_b, upper_b)?;
            // Some shortest path passes through (x, y); the two halves are
            // independent sub-problems.
            self.lcs(lower_a, x, lower_b, y)?;
            self.lcs(x, upper_a, y, upper_b)?;
        }

        Ok(())
    }

    /// Shortest middle snake search: simultaneous forward and backward
    /// D-path extension until the frontiers overlap on a diagonal of the
    /// right parity. Returns the split point `(x, y)`.
    fn sms(
        &mut self,
        lower_a: isize,
        upper_a: isize,
        lower_b: isize,
        upper_b: isize,
    ) -> Result<(isize, isize), DiffError> {
        let max = (self.a.len() + self.b.len() + 1) as isize;

        let down_k = lower_a - lower_b;
        let up_k = upper_a - upper_b;

        let delta = (upper_a - lower_a) - (upper_b - lower_b);
        let odd_delta = (delta & 1) != 0;

        // The published vectors accept negative indexes; these are 0-based
        // and accessed through a per-direction offset.
        let down_offset = max - down_k;
        let up_offset = max - up_k;

        let max_d = ((upper_a - lower_a + upper_b - lower_b) / 2) + 1;

        self.down_vector[(down_offset + down_k + 1) as usize] = lower_a;
        self.up_vector[(up_offset + up_k - 1) as usize] = upper_a;

        for d in 0..=max_d {
            // Extend the forward path.
            for k in (down_k - d..=down_k + d).step_by(2) {
                let mut x = if k == down_k - d {
                    self.down_vector[(down_offset + k + 1) as usize] // down
                } else {
                    let step_right = self.down_vector[(down_offset + k - 1) as usize] + 1;
                    let down = self.down_vector[(down_offset + k + 1) as usize];
                    if k < down_k + d && down >= step_right {
                        down
                    } else {
                        step_right
                    }
                };
                let mut y = x - k;

                // Follow the diagonal as far as it reaches.
                while x < upper_a
                    && y < upper_b
                    && self.a.data[x as usize] == self.b.data[y as usize]
                {
                    x += 1;
                    y += 1;
                }
                self.down_vector[(down_offset + k) as usize] = x;

                if odd_delta
                    && up_k - d < k
                    && k < up_k + d
                    && self.up_vector[(up_offset + k) as usize]
                        <= self.down_vector[(down_offset + k) as usize]
                {
                    let x = self.down_vector[(down_offset + k) as usize];
                    return Ok((x, x - k));
                }
            }

            // Extend the reverse path.
            for k in (up_k - d..=up_k + d).step_by(2) {
                let mut x = if k == up_k + d {
                    self.up_vector[(up_offset + k - 1) as usize] // up
                } else {
                    let step_left = self.up_vector[(up_offset + k + 1) as usize] - 1;
                    let up = self.up_vector[(up_offset + k - 1) as usize];
                    if k > up_k - d && up < step_left {
                        up
                    } else {
                        step_left
                    }
                };
                let mut y = x - k;

                while x > lower_a
                    && y > lower_b
                    && self.a.data[(x - 1) as usize] == self.b.data[(y - 1) as usize]
                {
                    x -= 1;
                    y -= 1;
                }
                self.up_vector[(up_offset + k) as usize] = x;

                if !odd_delta
                    && down_k - d <= k
                    && k <= down_k + d
                    && self.up_vector[(up_offset + k) as usize]
                        <= self.down_vector[(down_offset + k) as usize]
                {
                    let x = self.down_vector[(down_offset + k) as usize];
                    return Ok((x, x - k));
                }
            }
        }

        // A valid input always overlaps within max_d iterations.
        Err(DiffError::MiddleSnakeNotFound)
    }
}

/// Shifts ambiguous edit runs towards more readable positions.
///
/// When a run of modified lines starts with a line equal to the first line
/// after the run, the run slides one position later, so repeated lines
/// (blank-line padding and the like) keep the trailing copy marked instead
/// of the leading one. Purely local; applied per side after the engine
/// finishes.
pub(crate) fn optimize(data: &mut DiffData) {
    let len = data.len();
    let mut start_pos = 0;

    while start_pos < len {
        while start_pos < len && !data.modified[start_pos] {
            start_pos += 1;
        }
        let mut end_pos = start_pos;
        while end_pos < len && data.modified[end_pos] {
            end_pos += 1;
        }

        if end_pos < len && data.data[start_pos] == data.data[end_pos] {
            data.modified[start_pos] = false;
            data.modified[end_pos] = true;
        } else {
            start_pos = end_pos;
        }
    }
}
