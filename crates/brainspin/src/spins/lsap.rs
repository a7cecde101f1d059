//! Linear sum assignment (minimum-cost bipartite matching).
//!
//! Shortest augmenting path with dual potentials (Jonker–Volgenant style, as
//! described by Crouse 2016). One augmentation per row; O(n³) for square
//! problems. Rectangular problems are solved on the transpose when there are
//! more rows than columns.

use nalgebra::DMatrix;

use crate::error::{Error, Result};

/// Minimum-cost matching of `cost`'s rows to distinct columns.
///
/// Returns `(row, col)` pairs sorted by row; `min(nrows, ncols)` pairs in
/// total. NaN or `-inf` entries, or a problem with no finite assignment, fail
/// with `InfeasibleAssignment`.
pub fn linear_sum_assignment(cost: &DMatrix<f64>) -> Result<Vec<(usize, usize)>> {
    if cost.iter().any(|c| c.is_nan() || *c == f64::NEG_INFINITY) {
        return Err(Error::InfeasibleAssignment);
    }
    if cost.nrows() == 0 || cost.ncols() == 0 {
        return Ok(Vec::new());
    }
    if cost.nrows() > cost.ncols() {
        let transposed = cost.transpose();
        let col4row = solve(&transposed)?;
        let mut pairs: Vec<(usize, usize)> = col4row.into_iter().enumerate().map(|(c, r)| (r, c)).collect();
        pairs.sort_unstable();
        return Ok(pairs);
    }
    Ok(solve(cost)?.into_iter().enumerate().collect())
}

/// Column for each row; requires `nrows <= ncols`.
fn solve(cost: &DMatrix<f64>) -> Result<Vec<usize>> {
    let (nr, nc) = cost.shape();
    let mut u = vec![0.0; nr];
    let mut v = vec![0.0; nc];
    let mut shortest = vec![f64::INFINITY; nc];
    let mut path = vec![0usize; nc];
    let mut col4row: Vec<Option<usize>> = vec![None; nr];
    let mut row4col: Vec<Option<usize>> = vec![None; nc];
    let mut sr = vec![false; nr];
    let mut sc = vec![false; nc];
    let mut remaining = vec![0usize; nc];

    for cur_row in 0..nr {
        // Dijkstra-like search for the cheapest augmenting path from cur_row.
        let mut min_val = 0.0;
        let mut n_remaining = nc;
        for (k, slot) in remaining.iter_mut().enumerate() {
            *slot = nc - k - 1;
        }
        sr.fill(false);
        sc.fill(false);
        shortest.fill(f64::INFINITY);

        let mut i = cur_row;
        let sink = loop {
            let mut index = None;
            let mut lowest = f64::INFINITY;
            sr[i] = true;
            for k in 0..n_remaining {
                let j = remaining[k];
                let reduced = min_val + cost[(i, j)] - u[i] - v[j];
                if reduced < shortest[j] {
                    path[j] = i;
                    shortest[j] = reduced;
                }
                if shortest[j] < lowest || (shortest[j] == lowest && row4col[j].is_none()) {
                    lowest = shortest[j];
                    index = Some(k);
                }
            }
            min_val = lowest;
            let Some(index) = index.filter(|_| min_val.is_finite()) else {
                return Err(Error::InfeasibleAssignment);
            };
            let j = remaining[index];
            sc[j] = true;
            n_remaining -= 1;
            remaining[index] = remaining[n_remaining];
            match row4col[j] {
                None => break j,
                Some(next) => i = next,
            }
        };

        // update potentials
        u[cur_row] += min_val;
        for r in 0..nr {
            if sr[r] && r != cur_row {
                if let Some(c) = col4row[r] {
                    u[r] += min_val - shortest[c];
                }
            }
        }
        for c in 0..nc {
            if sc[c] {
                v[c] -= min_val - shortest[c];
            }
        }

        // augment along the path back to cur_row
        let mut j = sink;
        loop {
            let r = path[j];
            row4col[j] = Some(r);
            let prev = std::mem::replace(&mut col4row[r], Some(j));
            if r == cur_row {
                break;
            }
            match prev {
                Some(p) => j = p,
                None => break,
            }
        }
    }

    col4row
        .into_iter()
        .map(|c| c.ok_or(Error::InfeasibleAssignment))
        .collect()
}
