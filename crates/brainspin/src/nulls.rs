//! Null-Map Drivers: one function per published null model.
//!
//! Every driver returns an `N × n_perm` matrix, one null map per column. With
//! `data == None` the matrix holds source indices (as `f64`) instead of values.
//!
//! Models
//! - `alexander_bloch` (alias `vazquez_rodriguez`): spin centroids or vertices,
//!   nearest-neighbour reassignment.
//! - `vasa`, `hungarian`: spin parcel centroids with a bijective reassignment.
//! - `baum`: spin vertex labels, each parcel takes its modal rotated label;
//!   parcels landing on background are NaN.
//! - `cornblath`: spin vertex-projected parcel values and re-average.
//! - `naive_nonparametric`: plain permutations, no spatial structure.
//!
//! Precomputed resampling arrays (`NullCfg::spins`) skip generation.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use crate::centroids::{get_parcel_centroids, CentroidMethod};
use crate::cfg::DEFAULT_N_PERM;
use crate::distance::{get_surface_distance, DistanceOpts};
use crate::error::{check_len, Error, Result};
use crate::hemi::{Hemisphere, Hemispheres};
use crate::mesh::Mesh;
use crate::parcel::{joint_labels, Parcellation};
use crate::spins::{gen_spinsamples, spin_data, spin_parcels, ReassignMethod, SpinCfg};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NullMethod {
    AlexanderBloch,
    Vasa,
    Hungarian,
    Baum,
    Cornblath,
    NaiveNonparametric,
}

impl NullMethod {
    pub const NAMES: &'static [&'static str] = &[
        "alexander_bloch",
        "vazquez_rodriguez",
        "vasa",
        "hungarian",
        "baum",
        "cornblath",
        "naive_nonparametric",
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NullMethod::AlexanderBloch => "alexander_bloch",
            NullMethod::Vasa => "vasa",
            NullMethod::Hungarian => "hungarian",
            NullMethod::Baum => "baum",
            NullMethod::Cornblath => "cornblath",
            NullMethod::NaiveNonparametric => "naive_nonparametric",
        }
    }
}

impl fmt::Display for NullMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NullMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "alexander_bloch" | "vazquez_rodriguez" => Ok(NullMethod::AlexanderBloch),
            "vasa" => Ok(NullMethod::Vasa),
            "hungarian" => Ok(NullMethod::Hungarian),
            "baum" => Ok(NullMethod::Baum),
            "cornblath" => Ok(NullMethod::Cornblath),
            "naive_nonparametric" => Ok(NullMethod::NaiveNonparametric),
            other => Err(Error::InvalidMethod {
                kind: "null method",
                value: other.to_string(),
                valid: Self::NAMES,
            }),
        }
    }
}

/// Spherical surfaces plus an optional parcellation on them.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceAtlas<'a> {
    pub surfaces: &'a Hemispheres<Mesh>,
    pub parcellation: Option<&'a Hemispheres<Parcellation>>,
}

impl<'a> SurfaceAtlas<'a> {
    pub fn new(surfaces: &'a Hemispheres<Mesh>, parcellation: Option<&'a Hemispheres<Parcellation>>) -> Self {
        Self {
            surfaces,
            parcellation,
        }
    }

    fn require_parcellation(&self, method: &'static str) -> Result<&'a Hemispheres<Parcellation>> {
        self.parcellation.ok_or(Error::MissingParcellation { method })
    }
}

#[derive(Clone, Copy, Debug)]
pub struct NullCfg<'a> {
    pub n_perm: usize,
    pub seed: Option<u64>,
    /// Precomputed resampling array; used as given.
    pub spins: Option<&'a DMatrix<usize>>,
    /// Label names to exclude; `None` = `PARCIGNORE`.
    pub drop: Option<&'a [String]>,
    /// Generate rotations on the rayon pool.
    pub parallel: bool,
}

impl Default for NullCfg<'_> {
    fn default() -> Self {
        Self {
            n_perm: DEFAULT_N_PERM,
            seed: None,
            spins: None,
            drop: None,
            parallel: false,
        }
    }
}

impl NullCfg<'_> {
    fn spin_cfg(&self, method: ReassignMethod) -> SpinCfg {
        SpinCfg {
            n_rotate: self.n_perm,
            method,
            seed: self.seed,
            parallel: self.parallel,
            ..Default::default()
        }
    }
}

/// Centroid-level spins for the atlas (vertex-level without a parcellation).
fn centroid_spins<'c>(
    atlas: &SurfaceAtlas<'_>,
    parcellation: Option<&Hemispheres<Parcellation>>,
    cfg: &NullCfg<'c>,
    method: ReassignMethod,
) -> Result<Cow<'c, DMatrix<usize>>> {
    if let Some(spins) = cfg.spins {
        return Ok(Cow::Borrowed(spins));
    }
    let centroids = get_parcel_centroids(atlas.surfaces, parcellation, CentroidMethod::Surface, cfg.drop)?;
    let samples = gen_spinsamples(&centroids.coords, &centroids.hemiid, &cfg.spin_cfg(method))?;
    Ok(Cow::Owned(samples.spins))
}

/// `data[spins]`, or the indices themselves when `data` is `None`.
fn index_data(data: Option<&[f64]>, spins: &DMatrix<usize>) -> Result<DMatrix<f64>> {
    let n = spins.nrows();
    let Some(data) = data else {
        return Ok(spins.map(|s| s as f64));
    };
    check_len("data", n, data.len())?;
    if let Some(&bad) = spins.iter().find(|&&s| s >= n) {
        return Err(Error::IndexOutOfRange {
            what: "spin",
            index: bad,
            len: n,
        });
    }
    Ok(spins.map(|s| data[s]))
}

/// Spin test of Alexander-Bloch et al. (2018).
pub fn alexander_bloch(data: Option<&[f64]>, atlas: &SurfaceAtlas<'_>, cfg: &NullCfg<'_>) -> Result<DMatrix<f64>> {
    debug!(method = "alexander_bloch", n_perm = cfg.n_perm, "generating nulls");
    let spins = centroid_spins(atlas, atlas.parcellation, cfg, ReassignMethod::Original)?;
    index_data(data, &spins)
}

/// Alias of `alexander_bloch` (Vázquez-Rodríguez et al., 2019).
pub fn vazquez_rodriguez(data: Option<&[f64]>, atlas: &SurfaceAtlas<'_>, cfg: &NullCfg<'_>) -> Result<DMatrix<f64>> {
    alexander_bloch(data, atlas, cfg)
}

/// Parcel spins with greedy worst-first reassignment (Váša et al., 2018).
pub fn vasa(data: Option<&[f64]>, atlas: &SurfaceAtlas<'_>, cfg: &NullCfg<'_>) -> Result<DMatrix<f64>> {
    let parcellation = atlas.require_parcellation("vasa")?;
    debug!(method = "vasa", n_perm = cfg.n_perm, "generating nulls");
    let spins = centroid_spins(atlas, Some(parcellation), cfg, ReassignMethod::Vasa)?;
    index_data(data, &spins)
}

/// Parcel spins with minimum-cost reassignment.
pub fn hungarian(data: Option<&[f64]>, atlas: &SurfaceAtlas<'_>, cfg: &NullCfg<'_>) -> Result<DMatrix<f64>> {
    let parcellation = atlas.require_parcellation("hungarian")?;
    debug!(method = "hungarian", n_perm = cfg.n_perm, "generating nulls");
    let spins = centroid_spins(atlas, Some(parcellation), cfg, ReassignMethod::Hungarian)?;
    index_data(data, &spins)
}

/// Modal-label parcel reassignment (Baum et al., 2020).
///
/// `cfg.spins`, if given, must be vertex-level.
pub fn baum(data: Option<&[f64]>, atlas: &SurfaceAtlas<'_>, cfg: &NullCfg<'_>) -> Result<DMatrix<f64>> {
    let parcellation = atlas.require_parcellation("baum")?;
    debug!(method = "baum", n_perm = cfg.n_perm, "generating nulls");
    let labels = joint_labels(parcellation, cfg.drop);
    let spins = centroid_spins(atlas, None, cfg, ReassignMethod::Original)?;
    let regions = spin_parcels(&labels, &spins)?;

    let n = regions.nrows();
    if let Some(data) = data {
        check_len("data", n, data.len())?;
    }
    let mut out = DMatrix::from_element(n, regions.ncols(), f64::NAN);
    for (dst, &src) in out.iter_mut().zip(regions.iter()) {
        if src < 0 {
            continue;
        }
        let src = src as usize;
        *dst = match data {
            Some(d) => *d.get(src).ok_or(Error::IndexOutOfRange {
                what: "parcel",
                index: src,
                len: d.len(),
            })?,
            None => src as f64,
        };
    }
    Ok(out)
}

/// Vertex-projected parcel values, spun and re-averaged (Cornblath et al., 2020).
///
/// `cfg.spins`, if given, must be vertex-level.
pub fn cornblath(data: Option<&[f64]>, atlas: &SurfaceAtlas<'_>, cfg: &NullCfg<'_>) -> Result<DMatrix<f64>> {
    let parcellation = atlas.require_parcellation("cornblath")?;
    let data = data.ok_or(Error::MissingInput {
        method: "cornblath",
        needs: "parcellated data",
    })?;
    debug!(method = "cornblath", n_perm = cfg.n_perm, "generating nulls");
    let labels = joint_labels(parcellation, cfg.drop);
    let spins = centroid_spins(atlas, None, cfg, ReassignMethod::Original)?;
    spin_data(data, &labels, &spins)
}

/// Random permutations with no regard for spatial structure.
///
/// The permutation length is `data.len()`, or the number of atlas centroids
/// when `data` is `None`.
pub fn naive_nonparametric(
    data: Option<&[f64]>,
    atlas: Option<&SurfaceAtlas<'_>>,
    cfg: &NullCfg<'_>,
) -> Result<DMatrix<f64>> {
    debug!(method = "naive_nonparametric", n_perm = cfg.n_perm, "generating nulls");
    let spins = match cfg.spins {
        Some(spins) => Cow::Borrowed(spins),
        None => {
            let n = match (data, atlas) {
                (Some(d), _) => d.len(),
                (None, Some(atlas)) => {
                    get_parcel_centroids(atlas.surfaces, atlas.parcellation, CentroidMethod::Surface, cfg.drop)?
                        .len()
                }
                (None, None) => {
                    return Err(Error::MissingInput {
                        method: "naive_nonparametric",
                        needs: "data or a surface atlas",
                    })
                }
            };
            let mut rng = match cfg.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let mut perm: Vec<usize> = (0..n).collect();
            let mut flat = Vec::with_capacity(n * cfg.n_perm);
            for _ in 0..cfg.n_perm {
                perm.shuffle(&mut rng);
                flat.extend_from_slice(&perm);
            }
            Cow::Owned(DMatrix::from_vec(n, cfg.n_perm, flat))
        }
    };
    index_data(data, &spins)
}

/// Dispatches to the driver for `method`.
pub fn generate_nulls(
    method: NullMethod,
    data: Option<&[f64]>,
    atlas: &SurfaceAtlas<'_>,
    cfg: &NullCfg<'_>,
) -> Result<DMatrix<f64>> {
    match method {
        NullMethod::AlexanderBloch => alexander_bloch(data, atlas, cfg),
        NullMethod::Vasa => vasa(data, atlas, cfg),
        NullMethod::Hungarian => hungarian(data, atlas, cfg),
        NullMethod::Baum => baum(data, atlas, cfg),
        NullMethod::Cornblath => cornblath(data, atlas, cfg),
        NullMethod::NaiveNonparametric => naive_nonparametric(data, Some(atlas), cfg),
    }
}

/// Surface distance matrix for one hemisphere.
///
/// `hemisphere` accepts `L/R`, `lh/rh`, `left/right`, `0/1`. With a
/// parcellation, `drop` labels are both removed and blocked for travel;
/// without one, `medial` (true = cortex) masks the medial wall.
pub fn get_distmat(
    hemisphere: &str,
    surfaces: &Hemispheres<Mesh>,
    medial: Option<&Hemispheres<Vec<bool>>>,
    parcellation: Option<&Hemispheres<Parcellation>>,
    drop: Option<&[String]>,
    n_proc: usize,
) -> Result<DMatrix<f64>> {
    let hemi: Hemisphere = hemisphere.parse()?;
    let mesh = surfaces.get(hemi);
    let opts = match parcellation {
        None => DistanceOpts {
            medial: medial.map(|m| m.get(hemi).as_slice()),
            n_proc,
            ..Default::default()
        },
        Some(parc) => {
            let names = drop.map_or_else(crate::cfg::default_drop, <[String]>::to_vec);
            DistanceOpts {
                parcellation: Some(parc.get(hemi)),
                medial_labels: names.clone(),
                drop: Some(names),
                n_proc,
                ..Default::default()
            }
        }
    };
    get_surface_distance(mesh, &opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::icosphere;
    use std::collections::BTreeMap;

    fn quadrants(mesh: &Mesh) -> Parcellation {
        let labels = mesh
            .vertices
            .iter()
            .map(|v| 1 + (v.z > 0.0) as i32 + 2 * (v.y > 0.0) as i32)
            .collect();
        let table: BTreeMap<i32, String> = (1..=4).map(|k| (k, format!("p{k}"))).collect();
        Parcellation::new(labels, table)
    }

    fn atlas_parts() -> (Hemispheres<Mesh>, Hemispheres<Parcellation>) {
        let mesh = icosphere(1);
        let parc = quadrants(&mesh);
        (Hemispheres::new(mesh.clone(), mesh), Hemispheres::new(parc.clone(), parc))
    }

    fn cfg(n_perm: usize) -> NullCfg<'static> {
        NullCfg {
            n_perm,
            seed: Some(9),
            ..Default::default()
        }
    }

    fn is_permutation(col: &[f64], n: usize) -> bool {
        let mut idx: Vec<usize> = col.iter().map(|&x| x as usize).collect();
        idx.sort_unstable();
        idx == (0..n).collect::<Vec<_>>()
    }

    #[test]
    fn parses_method_names_and_alias() {
        assert_eq!("vazquez_rodriguez".parse::<NullMethod>().unwrap(), NullMethod::AlexanderBloch);
        assert_eq!("cornblath".parse::<NullMethod>().unwrap(), NullMethod::Cornblath);
        let err = "burt2020".parse::<NullMethod>().unwrap_err();
        assert!(matches!(err, Error::InvalidMethod { .. }));
    }

    #[test]
    fn parcel_methods_require_a_parcellation() {
        let (surfaces, _) = atlas_parts();
        let atlas = SurfaceAtlas::new(&surfaces, None);
        for f in [vasa, hungarian, baum, cornblath] {
            let err = f(None, &atlas, &cfg(2)).unwrap_err();
            assert!(matches!(err, Error::MissingParcellation { .. }));
            assert!(err.to_string().contains("alexander_bloch"));
        }
    }

    #[test]
    fn alexander_bloch_on_vertices_returns_indices() {
        let (surfaces, _) = atlas_parts();
        let atlas = SurfaceAtlas::new(&surfaces, None);
        let nulls = alexander_bloch(None, &atlas, &cfg(3)).unwrap();
        assert_eq!(nulls.shape(), (84, 3));
        assert!(nulls.iter().all(|&x| x.fract() == 0.0 && (0.0..84.0).contains(&x)));
        // left vertices draw from the left hemisphere only
        assert!(nulls.rows(0, 42).iter().all(|&x| x < 42.0));
    }

    #[test]
    fn bijective_parcel_nulls_are_permutations() {
        let (surfaces, parc) = atlas_parts();
        let atlas = SurfaceAtlas::new(&surfaces, Some(&parc));
        for method in [NullMethod::Vasa, NullMethod::Hungarian] {
            let nulls = generate_nulls(method, None, &atlas, &cfg(4)).unwrap();
            assert_eq!(nulls.shape(), (8, 4));
            for col in nulls.column_iter() {
                let col: Vec<f64> = col.iter().copied().collect();
                assert!(is_permutation(&col, 8), "{method}");
            }
        }
    }

    #[test]
    fn precomputed_spins_index_the_data() {
        let (surfaces, parc) = atlas_parts();
        let atlas = SurfaceAtlas::new(&surfaces, Some(&parc));
        let spins = DMatrix::from_column_slice(3, 2, &[2, 0, 1, 0, 0, 2]);
        let nc = NullCfg {
            spins: Some(&spins),
            ..cfg(2)
        };
        let nulls = vasa(Some(&[10.0, 20.0, 30.0]), &atlas, &nc).unwrap();
        assert_eq!(nulls, DMatrix::from_column_slice(3, 2, &[30.0, 10.0, 20.0, 10.0, 10.0, 30.0]));
        let err = vasa(Some(&[1.0, 2.0]), &atlas, &nc).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { expected: 3, actual: 2, .. }));
    }

    #[test]
    fn baum_and_cornblath_reproduce_data_under_identity_spins() {
        let (surfaces, parc) = atlas_parts();
        let atlas = SurfaceAtlas::new(&surfaces, Some(&parc));
        let n_vert = 84;
        let spins = DMatrix::from_fn(n_vert, 2, |i, _| i);
        let nc = NullCfg {
            spins: Some(&spins),
            ..cfg(2)
        };
        let data: Vec<f64> = (0..8).map(|p| p as f64 * 1.5 - 2.0).collect();

        let b = baum(Some(&data), &atlas, &nc).unwrap();
        let c = cornblath(Some(&data), &atlas, &nc).unwrap();
        for r in 0..2 {
            for p in 0..8 {
                assert_eq!(b[(p, r)], data[p]);
                assert!((c[(p, r)] - data[p]).abs() < 1e-12);
            }
        }
        let idx = baum(None, &atlas, &nc).unwrap();
        assert_eq!(idx[(5, 0)], 5.0);
        assert!(matches!(
            cornblath(None, &atlas, &nc),
            Err(Error::MissingInput { method: "cornblath", .. })
        ));
    }

    #[test]
    fn baum_marks_background_landings_as_nan() {
        let (surfaces, parc) = atlas_parts();
        let atlas = SurfaceAtlas::new(&surfaces, Some(&parc));
        // send every vertex of parcel 1 (left) onto a vertex that the drop set removes
        let drop = vec!["p2".to_string()];
        let labels = joint_labels(&parc, Some(&drop));
        let dropped = (0..labels.len()).find(|&v| labels[v] == 0).unwrap();
        let spins = DMatrix::from_fn(labels.len(), 1, |i, _| if labels[i] == 1 { dropped } else { i });
        let nc = NullCfg {
            spins: Some(&spins),
            drop: Some(&drop),
            ..cfg(1)
        };
        let n_parcels = labels.iter().copied().max().unwrap() as usize;
        let data: Vec<f64> = (0..n_parcels).map(|p| p as f64).collect();
        let out = baum(Some(&data), &atlas, &nc).unwrap();
        assert!(out[(0, 0)].is_nan());
        assert_eq!(out[(1, 0)], 1.0);
    }

    #[test]
    fn naive_nonparametric_permutes() {
        let (surfaces, parc) = atlas_parts();
        let atlas = SurfaceAtlas::new(&surfaces, Some(&parc));
        let nulls = naive_nonparametric(None, Some(&atlas), &cfg(5)).unwrap();
        assert_eq!(nulls.shape(), (8, 5));
        for col in nulls.column_iter() {
            let col: Vec<f64> = col.iter().copied().collect();
            assert!(is_permutation(&col, 8));
        }
        let vertices = SurfaceAtlas::new(&surfaces, None);
        let nulls = naive_nonparametric(None, Some(&vertices), &cfg(100)).unwrap();
        assert_eq!(nulls.shape(), (84, 100));
        assert!(nulls.column_iter().all(|c| is_permutation(&c.iter().copied().collect::<Vec<_>>(), 84)));

        let data = [3.0, 1.0, 2.0];
        let nulls = naive_nonparametric(Some(&data), None, &cfg(4)).unwrap();
        for col in nulls.column_iter() {
            let mut v: Vec<f64> = col.iter().copied().collect();
            v.sort_by(f64::total_cmp);
            assert_eq!(v, vec![1.0, 2.0, 3.0]);
        }
        assert_eq!(nulls, naive_nonparametric(Some(&data), None, &cfg(4)).unwrap());
        assert!(naive_nonparametric(None, None, &cfg(1)).is_err());
    }

    #[test]
    fn distmat_per_hemisphere() {
        let (surfaces, parc) = atlas_parts();
        let vertex = get_distmat("lh", &surfaces, None, None, None, 1).unwrap();
        assert_eq!(vertex.shape(), (42, 42));
        let parcel = get_distmat("R", &surfaces, None, Some(&parc), None, 2).unwrap();
        assert_eq!(parcel.shape(), (4, 4));
        assert!(parcel.iter().all(|d| d.is_finite() && *d >= 0.0));
        let err = get_distmat("both", &surfaces, None, None, None, 1).unwrap_err();
        assert!(matches!(err, Error::InvalidHemisphere { .. }));
    }
}
