//! `gen_spinsamples`: resampling arrays from random rotations.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use nalgebra::{DMatrix, Vector3};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, warn};

use super::assign::{reassign, ReassignMethod};
use super::rotation::{gen_rotation, rotate, RotationPair};
use crate::cfg::{DEFAULT_N_ROTATE, MAX_SPIN_ATTEMPTS};
use crate::error::{check_len, Result};
use crate::hemi::{Hemisphere, Hemispheres};

/// Knobs for `gen_spinsamples`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpinCfg {
    pub n_rotate: usize,
    pub method: ReassignMethod,
    /// `None` seeds from OS entropy.
    pub seed: Option<u64>,
    /// Reject columns equal to an earlier column or to the identity.
    pub check_duplicates: bool,
    pub return_cost: bool,
    /// Generate columns on the rayon pool from pre-drawn per-rotation seeds.
    pub parallel: bool,
}

impl Default for SpinCfg {
    fn default() -> Self {
        Self {
            n_rotate: DEFAULT_N_ROTATE,
            method: ReassignMethod::Original,
            seed: None,
            check_duplicates: true,
            return_cost: false,
            parallel: false,
        }
    }
}

/// Non-fatal conditions met while sampling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpinWarning {
    /// Retries were exhausted and at least one duplicate column was kept.
    DuplicateRotations,
    /// Duplicate checking was requested on the parallel path, which skips it.
    DuplicateCheckSkipped,
}

/// Resampling matrix: column `r` maps every point to its source under rotation `r`.
#[derive(Clone, Debug, PartialEq)]
pub struct SpinSamples {
    pub spins: DMatrix<usize>,
    /// Euclidean reassignment distance, same shape as `spins`.
    pub cost: Option<DMatrix<f64>>,
    pub warnings: Vec<SpinWarning>,
}

impl SpinSamples {
    #[inline]
    pub fn n_rotate(&self) -> usize {
        self.spins.ncols()
    }
}

/// Points split by hemisphere with their global indices.
struct HemiSplit {
    indices: Hemispheres<Vec<usize>>,
    points: Hemispheres<Vec<Vector3<f64>>>,
    n: usize,
}

impl HemiSplit {
    fn new(coords: &[Vector3<f64>], hemiid: &[Hemisphere]) -> Self {
        let pick = |h: Hemisphere| -> Vec<usize> { (0..coords.len()).filter(|&i| hemiid[i] == h).collect() };
        let indices = Hemispheres::new(pick(Hemisphere::Left), pick(Hemisphere::Right));
        let points: Hemispheres<Vec<Vector3<f64>>> =
            indices.map(|idx| idx.iter().map(|&i| coords[i]).collect());
        Self {
            indices,
            points,
            n: coords.len(),
        }
    }

    /// One resampling column and its costs.
    fn spin(&self, rotation: &RotationPair, method: ReassignMethod) -> Result<(Vec<usize>, Vec<f64>)> {
        let mut column = vec![0usize; self.n];
        let mut cost = vec![0.0; self.n];
        for (hemi, idx) in self.indices.iter() {
            let points = self.points.get(hemi);
            if points.is_empty() {
                continue;
            }
            let rotated = rotate(points, rotation.get(hemi));
            for (k, (target, c)) in reassign(points, &rotated, method)?.into_iter().enumerate() {
                column[idx[k]] = idx[target];
                cost[idx[k]] = c;
            }
        }
        Ok((column, cost))
    }
}

/// Accepted columns keyed by hash; stores positions into the caller's column list.
#[derive(Default)]
struct ColumnIndex {
    buckets: HashMap<u64, Vec<usize>>,
}

impl ColumnIndex {
    fn key(column: &[usize]) -> u64 {
        let mut hasher = DefaultHasher::new();
        column.hash(&mut hasher);
        hasher.finish()
    }

    fn contains(&self, column: &[usize], columns: &[(Vec<usize>, Vec<f64>)]) -> bool {
        self.buckets
            .get(&Self::key(column))
            .is_some_and(|hits| hits.iter().any(|&i| columns[i].0 == column))
    }

    fn insert(&mut self, column: &[usize], position: usize) {
        self.buckets.entry(Self::key(column)).or_default().push(position);
    }
}

fn is_identity(column: &[usize]) -> bool {
    column.iter().enumerate().all(|(i, &c)| i == c)
}

/// Generates `cfg.n_rotate` resampling columns for `coords`.
///
/// Each rotation is drawn for the left hemisphere and mirrored for the right.
/// Fails with `ShapeMismatch` if `coords` and `hemiid` differ in length.
pub fn gen_spinsamples(coords: &[Vector3<f64>], hemiid: &[Hemisphere], cfg: &SpinCfg) -> Result<SpinSamples> {
    check_len("hemiid", coords.len(), hemiid.len())?;
    let split = HemiSplit::new(coords, hemiid);
    let mut rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    debug!(
        n_points = coords.len(),
        n_rotate = cfg.n_rotate,
        method = %cfg.method,
        parallel = cfg.parallel,
        "generating spins"
    );

    let n = coords.len();
    let mut columns: Vec<(Vec<usize>, Vec<f64>)> = Vec::with_capacity(cfg.n_rotate);
    let mut warnings = Vec::new();

    if cfg.parallel {
        let seeds: Vec<u64> = (0..cfg.n_rotate).map(|_| rng.next_u64()).collect();
        columns = seeds
            .par_iter()
            .map(|&seed| {
                let mut local = StdRng::seed_from_u64(seed);
                split.spin(&gen_rotation(&mut local), cfg.method)
            })
            .collect::<Result<Vec<_>>>()?;
        if cfg.check_duplicates {
            debug!("duplicate checking is not performed on the parallel path");
            warnings.push(SpinWarning::DuplicateCheckSkipped);
        }
    } else {
        let mut seen = ColumnIndex::default();
        let mut warned = false;
        for _ in 0..cfg.n_rotate {
            let mut attempt = 0;
            let accepted = loop {
                attempt += 1;
                let (column, cost) = split.spin(&gen_rotation(&mut rng), cfg.method)?;
                let duplicated = cfg.check_duplicates && (is_identity(&column) || seen.contains(&column, &columns));
                if !duplicated {
                    break (column, cost);
                }
                if attempt >= MAX_SPIN_ATTEMPTS {
                    if !warned {
                        warn!(
                            "duplicate rotations used; check the resampling array for the real \
                             number of unique permutations"
                        );
                        warnings.push(SpinWarning::DuplicateRotations);
                        warned = true;
                    }
                    break (column, cost);
                }
            };
            if cfg.check_duplicates {
                seen.insert(&accepted.0, columns.len());
            }
            columns.push(accepted);
        }
    }

    Ok(assemble(n, columns, cfg.return_cost, warnings))
}

/// Applies caller-supplied rotations, one column per pair, without duplicate checks.
pub fn gen_spinsamples_with(
    coords: &[Vector3<f64>],
    hemiid: &[Hemisphere],
    rotations: &[RotationPair],
    method: ReassignMethod,
    return_cost: bool,
) -> Result<SpinSamples> {
    check_len("hemiid", coords.len(), hemiid.len())?;
    let split = HemiSplit::new(coords, hemiid);
    let columns = rotations
        .iter()
        .map(|rot| split.spin(rot, method))
        .collect::<Result<Vec<_>>>()?;
    Ok(assemble(coords.len(), columns, return_cost, Vec::new()))
}

fn assemble(
    n: usize,
    columns: Vec<(Vec<usize>, Vec<f64>)>,
    return_cost: bool,
    warnings: Vec<SpinWarning>,
) -> SpinSamples {
    let r = columns.len();
    let spins = DMatrix::from_iterator(n, r, columns.iter().flat_map(|(col, _)| col.iter().copied()));
    let cost = return_cost
        .then(|| DMatrix::from_iterator(n, r, columns.iter().flat_map(|(_, c)| c.iter().copied())));
    SpinSamples { spins, cost, warnings }
}
