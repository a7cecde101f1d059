//! Reassignment of original points to rotated points.

use std::fmt;
use std::str::FromStr;

use nalgebra::{DMatrix, Vector3};

use super::lsap::linear_sum_assignment;
use crate::error::{Error, Result};
use crate::mesh::PointTree;

/// How each original point picks a rotated point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ReassignMethod {
    /// Nearest rotated point; several originals may share one target.
    #[default]
    Original,
    /// Greedy worst-first bijection.
    Vasa,
    /// Minimum total-cost bijection.
    Hungarian,
}

impl ReassignMethod {
    pub const NAMES: &'static [&'static str] = &["original", "vasa", "hungarian"];

    pub fn as_str(self) -> &'static str {
        match self {
            ReassignMethod::Original => "original",
            ReassignMethod::Vasa => "vasa",
            ReassignMethod::Hungarian => "hungarian",
        }
    }
}

impl fmt::Display for ReassignMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReassignMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "original" => Ok(ReassignMethod::Original),
            "vasa" => Ok(ReassignMethod::Vasa),
            "hungarian" => Ok(ReassignMethod::Hungarian),
            other => Err(Error::InvalidMethod {
                kind: "reassignment method",
                value: other.to_string(),
                valid: Self::NAMES,
            }),
        }
    }
}

/// For every original point: `(index into rotated, Euclidean distance)`.
pub(crate) fn reassign(
    original: &[Vector3<f64>],
    rotated: &[Vector3<f64>],
    method: ReassignMethod,
) -> Result<Vec<(usize, f64)>> {
    if original.is_empty() {
        return Ok(Vec::new());
    }
    match method {
        ReassignMethod::Original => Ok(nearest(original, rotated)),
        ReassignMethod::Vasa => Ok(vasa(&distance_matrix(original, rotated))),
        ReassignMethod::Hungarian => {
            let dist = distance_matrix(original, rotated);
            let pairs = linear_sum_assignment(&dist)?;
            Ok(pairs.into_iter().map(|(r, c)| (c, dist[(r, c)])).collect())
        }
    }
}

fn nearest(original: &[Vector3<f64>], rotated: &[Vector3<f64>]) -> Vec<(usize, f64)> {
    let tree = PointTree::new(rotated);
    original
        .iter()
        .filter_map(|p| tree.nearest(p))
        .collect()
}

/// `dist[(i, j)] = |original_i - rotated_j|`.
fn distance_matrix(original: &[Vector3<f64>], rotated: &[Vector3<f64>]) -> DMatrix<f64> {
    DMatrix::from_fn(original.len(), rotated.len(), |i, j| (original[i] - rotated[j]).norm())
}

/// Repeatedly places the unassigned row whose best available column is the
/// farthest, on that column. Ties go to the lowest index.
fn vasa(dist: &DMatrix<f64>) -> Vec<(usize, f64)> {
    let (n, m) = dist.shape();
    let mut out = vec![(0usize, f64::NAN); n];
    let mut row_done = vec![false; n];
    let mut col_free = vec![true; m];

    for _ in 0..n.min(m) {
        let mut pick: Option<(usize, usize, f64)> = None;
        for r in (0..n).filter(|&r| !row_done[r]) {
            let mut best: Option<(usize, f64)> = None;
            for c in (0..m).filter(|&c| col_free[c]) {
                let d = dist[(r, c)];
                if best.map_or(true, |(_, bd)| d < bd) {
                    best = Some((c, d));
                }
            }
            if let Some((c, d)) = best {
                if pick.map_or(true, |(_, _, pd)| d > pd) {
                    pick = Some((r, c, d));
                }
            }
        }
        let Some((r, c, d)) = pick else { break };
        out[r] = (c, d);
        row_done[r] = true;
        col_free[c] = false;
    }
    out
}
