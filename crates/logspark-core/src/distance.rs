//! Token-level edit distance.
//!
//! Distances are computed over already-split tokens rather than characters,
//! so multi-word field values are compared at word granularity.

/// Minimum number of token insertions, deletions and substitutions needed to
/// turn `a` into `b`.
///
/// Uses a single DP row sized by the shorter sequence, so auxiliary space is
/// `O(min(|a|, |b|))`.
///
/// # Examples
///
/// ```
/// use logspark_core::distance::distance;
///
/// assert_eq!(distance(&["error", "reading", "A"], &["error", "reading", "B"]), 1);
/// assert_eq!(distance::<&str>(&[], &["a", "b"]), 2);
/// ```
pub fn distance<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    if a == b {
        return 0;
    }

    // Row over the shorter sequence, iterate over the longer one.
    let (short, long) = if a.len() > b.len() { (b, a) } else { (a, b) };

    let mut row: Vec<usize> = (0..=short.len()).collect();

    for (i, long_tok) in long.iter().enumerate() {
        // `diag` holds cost[i-1][j-1], `row[0]` becomes cost[i][0].
        let mut diag = row[0];
        row[0] = i + 1;

        for (j, short_tok) in short.iter().enumerate() {
            let above = row[j + 1];
            let cost = if long_tok == short_tok {
                diag
            } else {
                1 + diag.min(above).min(row[j])
            };
            diag = above;
            row[j + 1] = cost;
        }
    }

    row[short.len()]
}

// ── Tests ─────────────────────────────────────────────────────────────────────
