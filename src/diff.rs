//! Line-level diff between two document snapshots.
//!
//! This module provides:
//! - `EditScript` / `EditOp` describing how old line indices map to new ones
//! - `compute_edit_script` implementing Myers' greedy shortest-edit search
//!
//! The computation is pure: no I/O, no state between calls, and identical
//! inputs always produce the identical script.

use std::fmt;
use std::ops::Range;

/// A single run of lines in an edit script.
///
/// Ranges are half-open and zero-based. `Equal` runs always have
/// `old.len() == new.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    /// Lines identical in both snapshots; indices shift from `old` to `new`.
    Equal { old: Range<usize>, new: Range<usize> },
    /// Lines present only in the new snapshot.
    Insert { new: Range<usize> },
    /// Lines present only in the old snapshot.
    Delete { old: Range<usize> },
    /// A run of old lines rewritten in place. Equivalent to delete + insert:
    /// the old content is gone, the new content is unrelated to it.
    Replace { old: Range<usize>, new: Range<usize> },
}

/// An ordered sequence of operations transforming one line sequence into
/// another. Applied in order, the ops exactly tile both inputs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditScript {
    ops: Vec<EditOp>,
}

impl EditScript {
    /// The operations, in document order.
    pub fn ops(&self) -> &[EditOp] {
        &self.ops
    }

    /// True when the script carries no insertions, deletions or replacements,
    /// i.e. the two snapshots were identical.
    pub fn is_identity(&self) -> bool {
        matches!(self.ops.as_slice(), [] | [EditOp::Equal { .. }])
    }
}

impl fmt::Display for EditScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ops.is_empty() {
            return write!(f, "(empty)");
        }
        for (i, op) in self.ops.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match op {
                EditOp::Equal { old, new } => {
                    write!(f, "equal {}..{} -> {}..{}", old.start, old.end, new.start, new.end)?
                }
                EditOp::Insert { new } => write!(f, "insert -> {}..{}", new.start, new.end)?,
                EditOp::Delete { old } => write!(f, "delete {}..{}", old.start, old.end)?,
                EditOp::Replace { old, new } => {
                    write!(f, "replace {}..{} -> {}..{}", old.start, old.end, new.start, new.end)?
                }
            }
        }
        Ok(())
    }
}

/// A single backtracked move, one line at a time. Coalesced into runs after
/// the search.
enum Step {
    Equal(usize, usize),
    Delete(usize),
    Insert(usize),
}

/// Compute the shortest edit script turning `old` into `new`.
///
/// Lines are compared for whole-line identity via `PartialEq`; for strings
/// that means byte-for-byte equality with no normalization. Runs in
/// O((N+M)·D) where D is the number of differing lines.
///
/// Tie-breaking among equally short scripts is fixed (deletions are taken
/// before insertions at equal depth), so the result is deterministic.
pub fn compute_edit_script<T: PartialEq>(old: &[T], new: &[T]) -> EditScript {
    let n = old.len();
    let m = new.len();

    if n == 0 && m == 0 {
        return EditScript::default();
    }
    if old == new {
        return EditScript {
            ops: vec![EditOp::Equal { old: 0..n, new: 0..m }],
        };
    }

    let (trace, depth) = forward_search(old, new);
    let steps = backtrack(&trace, depth, n, m);
    EditScript {
        ops: coalesce(&steps),
    }
}

/// Greedy forward pass: for each edit depth `d`, record the furthest-reaching
/// x per diagonal. Returns the per-depth snapshots and the depth at which
/// `(n, m)` was reached.
fn forward_search<T: PartialEq>(old: &[T], new: &[T]) -> (Vec<Vec<usize>>, usize) {
    let n = old.len();
    let m = new.len();
    let max = n + m;
    let offset = max as isize;

    let mut v = vec![0usize; 2 * max + 1];
    let mut trace = Vec::new();
    let mut depth = max;

    'search: for d in 0..=max {
        trace.push(v.clone());
        let d = d as isize;
        let mut k = -d;
        while k <= d {
            let idx = (k + offset) as usize;
            // Extend downward (insertion) when forced onto the lowest
            // diagonal or when the diagonal above reaches further.
            let mut x = if k == -d || (k != d && v[idx - 1] < v[idx + 1]) {
                v[idx + 1]
            } else {
                v[idx - 1] + 1
            };
            let mut y = (x as isize - k) as usize;
            while x < n && y < m && old[x] == new[y] {
                x += 1;
                y += 1;
            }
            v[idx] = x;
            if x >= n && y >= m {
                depth = d as usize;
                break 'search;
            }
            k += 2;
        }
    }

    // A path of depth n + m (delete everything, insert everything) always
    // exists, so the search cannot fall through without setting `depth`.
    (trace, depth)
}

/// Walk the trace back from `(n, m)` to the origin, emitting one step per
/// line in reverse document order.
fn backtrack(trace: &[Vec<usize>], depth: usize, n: usize, m: usize) -> Vec<Step> {
    let offset = (n + m) as isize;
    let mut steps = Vec::new();
    let mut x = n;
    let mut y = m;

    for d in (1..=depth).rev() {
        let v = &trace[d];
        let d = d as isize;
        let k = x as isize - y as isize;
        let prev_k = if k == -d || (k != d && v[(k - 1 + offset) as usize] < v[(k + 1 + offset) as usize])
        {
            k + 1
        } else {
            k - 1
        };
        let prev_x = v[(prev_k + offset) as usize];
        let prev_y = (prev_x as isize - prev_k) as usize;

        while x > prev_x && y > prev_y {
            x -= 1;
            y -= 1;
            steps.push(Step::Equal(x, y));
        }
        if x == prev_x {
            y -= 1;
            steps.push(Step::Insert(y));
        } else {
            x -= 1;
            steps.push(Step::Delete(x));
        }
        debug_assert_eq!((x, y), (prev_x, prev_y));
    }

    // Depth 0: whatever remains is a leading run of equal lines.
    while x > 0 && y > 0 {
        x -= 1;
        y -= 1;
        steps.push(Step::Equal(x, y));
    }
    debug_assert_eq!((x, y), (0, 0));

    steps.reverse();
    steps
}

/// Merge single-line steps into maximal runs, pairing adjacent delete and
/// insert runs into `Replace`.
fn coalesce(steps: &[Step]) -> Vec<EditOp> {
    let mut ops = Vec::new();
    let mut equal: Option<(Range<usize>, Range<usize>)> = None;
    let mut deleted: Option<Range<usize>> = None;
    let mut inserted: Option<Range<usize>> = None;

    fn flush_edits(
        ops: &mut Vec<EditOp>,
        deleted: &mut Option<Range<usize>>,
        inserted: &mut Option<Range<usize>>,
    ) {
        match (deleted.take(), inserted.take()) {
            (Some(old), Some(new)) => ops.push(EditOp::Replace { old, new }),
            (Some(old), None) => ops.push(EditOp::Delete { old }),
            (None, Some(new)) => ops.push(EditOp::Insert { new }),
            (None, None) => {}
        }
    }

    for step in steps {
        match *step {
            Step::Equal(ox, ny) => {
                flush_edits(&mut ops, &mut deleted, &mut inserted);
                match &mut equal {
                    Some((old, new)) if old.end == ox && new.end == ny => {
                        old.end = ox + 1;
                        new.end = ny + 1;
                    }
                    other => {
                        if let Some((old, new)) = other.take() {
                            ops.push(EditOp::Equal { old, new });
                        }
                        equal = Some((ox..ox + 1, ny..ny + 1));
                    }
                }
            }
            Step::Delete(ox) => {
                if let Some((old, new)) = equal.take() {
                    ops.push(EditOp::Equal { old, new });
                }
                match &mut deleted {
                    Some(old) => {
                        debug_assert_eq!(old.end, ox);
                        old.end = ox + 1;
                    }
                    None => deleted = Some(ox..ox + 1),
                }
            }
            Step::Insert(ny) => {
                if let Some((old, new)) = equal.take() {
                    ops.push(EditOp::Equal { old, new });
                }
                match &mut inserted {
                    Some(new) => {
                        debug_assert_eq!(new.end, ny);
                        new.end = ny + 1;
                    }
                    None => inserted = Some(ny..ny + 1),
                }
            }
        }
    }

    flush_edits(&mut ops, &mut deleted, &mut inserted);
    if let Some((old, new)) = equal {
        ops.push(EditOp::Equal { old, new });
    }
    ops
}
