use super::*;
use crate::error::Error;
use crate::hemi::Hemisphere;
use crate::mesh::icosphere;
use approx::assert_relative_eq;
use nalgebra::{DMatrix, Matrix3, Rotation3, Unit, Vector3};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;

const L: Hemisphere = Hemisphere::Left;
const R: Hemisphere = Hemisphere::Right;

fn four_points() -> (Vec<Vector3<f64>>, Vec<Hemisphere>) {
    let coords = vec![
        Vector3::new(0.0, 0.0, 1.0),
        Vector3::new(1.0, 0.0, 0.0),
        Vector3::new(0.0, 0.0, 1.0),
        Vector3::new(1.0, 0.0, 0.0),
    ];
    (coords, vec![L, L, R, R])
}

/// A fixed rotation under which the two left points resolve differently per method.
fn fixed_rotation() -> RotationPair {
    let axis = Unit::new_normalize(Vector3::new(0.1627312167179585, -0.2962684699499426, 1.0138434818453892));
    let rot = Rotation3::from_axis_angle(&axis, 1.545132527904845);
    RotationPair::from_left(*rot.matrix())
}

fn sphere_split() -> (Vec<Vector3<f64>>, Vec<Hemisphere>) {
    let mesh = icosphere(1);
    let hemi = mesh
        .vertices
        .iter()
        .map(|v| if v.x < 0.0 { L } else { R })
        .collect();
    (mesh.vertices, hemi)
}

fn column(m: &DMatrix<usize>, r: usize) -> Vec<usize> {
    m.column(r).iter().copied().collect()
}

#[test]
fn worked_example_resolves_per_method() {
    let (coords, hemi) = four_points();
    let rot = [fixed_rotation()];
    let expect = [
        (ReassignMethod::Original, vec![0, 0, 2, 3]),
        (ReassignMethod::Vasa, vec![1, 0, 2, 3]),
        (ReassignMethod::Hungarian, vec![0, 1, 2, 3]),
    ];
    for (method, want) in expect {
        let out = gen_spinsamples_with(&coords, &hemi, &rot, method, true).unwrap();
        assert_eq!(out.spins.shape(), (4, 1));
        assert_eq!(column(&out.spins, 0), want, "{method}");
        let cost = out.cost.unwrap();
        assert!(cost.iter().all(|&c| c >= 0.0));
    }
    let cost = gen_spinsamples_with(&coords, &hemi, &rot, ReassignMethod::Hungarian, true)
        .unwrap()
        .cost
        .unwrap();
    assert_relative_eq!(cost[(0, 0)], 0.441521, epsilon = 1e-5);
    assert_relative_eq!(cost[(1, 0)], 1.379672, epsilon = 1e-5);
}

#[test]
fn mirror_pair_is_exact() {
    let mut rng = StdRng::seed_from_u64(11);
    let pair = gen_rotation(&mut rng);
    let f = reflect();
    assert_eq!(pair.right, f * pair.left * f);
    assert_eq!(RotationPair::identity().right, Matrix3::identity());
}

proptest! {
    #[test]
    fn rotations_are_proper(seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let pair = gen_rotation(&mut rng);
        for m in [pair.left, pair.right] {
            prop_assert!((m.determinant() - 1.0).abs() < 1e-9);
            let gram = m.transpose() * m;
            prop_assert!((gram - Matrix3::identity()).abs().max() < 1e-9);
        }
    }
}

#[test]
fn bijective_methods_permute_within_hemispheres() {
    let (coords, hemi) = sphere_split();
    for method in [ReassignMethod::Vasa, ReassignMethod::Hungarian] {
        let cfg = SpinCfg {
            n_rotate: 4,
            method,
            seed: Some(3),
            ..Default::default()
        };
        let out = gen_spinsamples(&coords, &hemi, &cfg).unwrap();
        for r in 0..out.n_rotate() {
            let col = column(&out.spins, r);
            for (i, &s) in col.iter().enumerate() {
                assert_eq!(hemi[i], hemi[s]);
            }
            let mut sorted = col.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, (0..coords.len()).collect::<Vec<_>>(), "{method}");
        }
    }
}

#[test]
fn hungarian_total_cost_never_exceeds_vasa() {
    let (coords, hemi) = sphere_split();
    let mut rng = StdRng::seed_from_u64(5);
    let rots: Vec<RotationPair> = (0..3).map(|_| gen_rotation(&mut rng)).collect();
    let hun = gen_spinsamples_with(&coords, &hemi, &rots, ReassignMethod::Hungarian, true).unwrap();
    let vasa = gen_spinsamples_with(&coords, &hemi, &rots, ReassignMethod::Vasa, true).unwrap();
    let (hc, vc) = (hun.cost.unwrap(), vasa.cost.unwrap());
    for r in 0..rots.len() {
        assert!(hc.column(r).sum() <= vc.column(r).sum() + 1e-9);
    }
}

#[test]
fn duplicates_are_rejected_until_exhausted() {
    let (coords, hemi) = four_points();
    // two points per hemisphere under a bijection: only three non-identity columns exist
    let cfg = SpinCfg {
        n_rotate: 3,
        method: ReassignMethod::Hungarian,
        seed: Some(1),
        ..Default::default()
    };
    let out = gen_spinsamples(&coords, &hemi, &cfg).unwrap();
    assert!(out.warnings.is_empty());
    let mut cols: Vec<Vec<usize>> = (0..3).map(|r| column(&out.spins, r)).collect();
    cols.sort();
    assert_eq!(cols, vec![vec![0, 1, 3, 2], vec![1, 0, 2, 3], vec![1, 0, 3, 2]]);

    let cfg = SpinCfg { n_rotate: 5, ..cfg };
    let out = gen_spinsamples(&coords, &hemi, &cfg).unwrap();
    assert_eq!(out.warnings, vec![SpinWarning::DuplicateRotations]);
    assert_eq!(out.n_rotate(), 5);
}

#[test]
fn single_point_hemispheres_always_exhaust() {
    let coords = vec![Vector3::new(0.0, 0.0, 1.0), Vector3::new(0.0, 1.0, 0.0)];
    let cfg = SpinCfg {
        n_rotate: 2,
        seed: Some(0),
        ..Default::default()
    };
    let out = gen_spinsamples(&coords, &[L, R], &cfg).unwrap();
    assert_eq!(out.warnings, vec![SpinWarning::DuplicateRotations]);
    assert_eq!(column(&out.spins, 1), vec![0, 1]);

    let quiet = SpinCfg {
        check_duplicates: false,
        ..cfg
    };
    assert!(gen_spinsamples(&coords, &[L, R], &quiet).unwrap().warnings.is_empty());
}

#[test]
fn seeded_runs_are_reproducible_on_both_paths() {
    let (coords, hemi) = sphere_split();
    for parallel in [false, true] {
        let cfg = SpinCfg {
            n_rotate: 6,
            seed: Some(42),
            return_cost: true,
            parallel,
            ..Default::default()
        };
        let a = gen_spinsamples(&coords, &hemi, &cfg).unwrap();
        let b = gen_spinsamples(&coords, &hemi, &cfg).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.cost.as_ref().unwrap().shape(), (coords.len(), 6));
        assert_eq!(a.warnings.contains(&SpinWarning::DuplicateCheckSkipped), parallel);
    }
}

#[test]
fn length_mismatch_is_rejected_up_front() {
    let (coords, _) = four_points();
    let err = gen_spinsamples(&coords, &[L, R], &SpinCfg::default()).unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { expected: 4, actual: 2, .. }));
}

#[test]
fn empty_hemisphere_is_skipped() {
    let coords = vec![Vector3::new(0.0, 0.0, 1.0), Vector3::new(1.0, 0.0, 0.0)];
    let out = gen_spinsamples_with(&coords, &[R, R], &[fixed_rotation()], ReassignMethod::Vasa, false).unwrap();
    let col = column(&out.spins, 0);
    let mut sorted = col.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, vec![0, 1]);
    assert!(out.cost.is_none());
}

#[test]
fn spin_parcels_takes_the_modal_label() {
    let labels = [1, 1, 1, 2, 2, 0];
    #[rustfmt::skip]
    let spins = DMatrix::from_column_slice(6, 3, &[
        0, 1, 2, 3, 4, 5,
        3, 4, 5, 5, 5, 0,
        0, 3, 5, 0, 3, 5,
    ]);
    let out = spin_parcels(&labels, &spins).unwrap();
    assert_eq!(out, DMatrix::from_row_slice(2, 3, &[0, 1, 0, 1, -1, 0]));

    let bad = DMatrix::from_element(6, 1, 9usize);
    assert!(matches!(spin_parcels(&labels, &bad), Err(Error::IndexOutOfRange { index: 9, .. })));
    let short = DMatrix::from_element(5, 1, 0usize);
    assert!(matches!(spin_parcels(&labels, &short), Err(Error::ShapeMismatch { .. })));
}

#[test]
fn spin_data_reaverages_rotated_values() {
    let labels = [1, 1, 2, 2, 0];
    #[rustfmt::skip]
    let spins = DMatrix::from_column_slice(5, 2, &[
        0, 1, 2, 3, 4,
        2, 3, 4, 4, 0,
    ]);
    let out = spin_data(&[10.0, 20.0], &labels, &spins).unwrap();
    assert_eq!(out.shape(), (2, 2));
    assert_eq!(out[(0, 0)], 10.0);
    assert_eq!(out[(1, 0)], 20.0);
    assert_eq!(out[(0, 1)], 20.0);
    assert!(out[(1, 1)].is_nan());

    let features = DMatrix::from_column_slice(2, 2, &[10.0, 20.0, -1.0, 3.0]);
    let blocks = spin_data_matrix(&features, &labels, &spins).unwrap();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].shape(), (2, 2));
    assert!(blocks[0][(1, 1)].is_nan());
    assert_eq!(blocks[1][(0, 0)], -1.0);
    assert_eq!(blocks[1][(0, 1)], 3.0);
}

#[test]
fn npy_round_trip_and_truncation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spins.npy");
    let spins = DMatrix::from_fn(7, 5, |i, j| (i * 3 + j) % 7);
    save_spins(&path, &spins).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..6], b"\x93NUMPY");
    let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
    assert_eq!((10 + header_len) % 64, 0);
    assert_eq!(bytes.len(), 10 + header_len + 7 * 5 * 4);

    assert_eq!(load_spins(&path, None).unwrap(), spins);
    let two = load_spins(&path, Some(2)).unwrap();
    assert_eq!(two, truncate_spins(&spins, 2));
    assert_eq!(two.shape(), (7, 2));
    assert_eq!(load_spins(&path, Some(99)).unwrap(), spins);

    let cost = DMatrix::from_fn(3, 2, |i, j| i as f64 * 0.5 - j as f64);
    let cpath = dir.path().join("cost.npy");
    save_cost(&cpath, &cost).unwrap();
    assert_eq!(load_matrix(&cpath, None).unwrap(), cost);
    assert!(matches!(load_spins(&cpath, None), Err(Error::Npy { .. })));
}

#[test]
fn c_order_int64_files_are_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("c_order.npy");
    let mut dict = "{'descr': '<i8', 'fortran_order': False, 'shape': (2, 3), }".to_string();
    while (10 + dict.len() + 1) % 64 != 0 {
        dict.push(' ');
    }
    dict.push('\n');
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(b"\x93NUMPY\x01\x00").unwrap();
    file.write_all(&(dict.len() as u16).to_le_bytes()).unwrap();
    file.write_all(dict.as_bytes()).unwrap();
    // rows [0, 1, 2] and [3, 4, 5]
    for v in 0i64..6 {
        file.write_all(&v.to_le_bytes()).unwrap();
    }
    drop(file);

    let full = load_spins(&path, None).unwrap();
    assert_eq!(full, DMatrix::from_row_slice(2, 3, &[0, 1, 2, 3, 4, 5]));
    let first = load_spins(&path, Some(1)).unwrap();
    assert_eq!(column(&first, 0), vec![0, 3]);
}

#[test]
fn malformed_npy_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("junk.npy");
    std::fs::write(&path, b"not an npy file at all").unwrap();
    assert!(matches!(load_spins(&path, None), Err(Error::Npy { .. })));
    assert!(matches!(load_spins(dir.path().join("missing.npy"), None), Err(Error::Io(_))));
}

#[test]
fn coincident_points_in_one_hemisphere_are_reassigned() {
    let mut coords = vec![Vector3::new(0.0, 0.0, 1.0); 40];
    coords.extend([Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0)]);
    let mut hemi = vec![L; 40];
    hemi.extend([R, R]);
    let cfg = SpinCfg {
        n_rotate: 1,
        seed: Some(1),
        check_duplicates: false,
        return_cost: true,
        ..Default::default()
    };
    let out = gen_spinsamples(&coords, &hemi, &cfg).unwrap();
    assert_eq!(out.spins.shape(), (42, 1));
    assert!(column(&out.spins, 0)[..40].iter().all(|&s| s < 40));
    assert!(column(&out.spins, 0)[40..].iter().all(|&s| s >= 40));
    // every left point maps onto the same rotated image
    let cost = out.cost.unwrap();
    assert!((0..40).all(|i| (cost[(i, 0)] - cost[(0, 0)]).abs() < 1e-12));
}

#[test]
fn identity_replay_on_a_planar_ring_maps_points_to_themselves() {
    let coords: Vec<Vector3<f64>> = (0..40)
        .map(|k| {
            let t = k as f64 * std::f64::consts::TAU / 40.0;
            Vector3::new(0.0, t.cos(), t.sin())
        })
        .collect();
    let hemi = vec![L; 40];
    let out = gen_spinsamples_with(&coords, &hemi, &[RotationPair::identity()], ReassignMethod::Original, true)
        .unwrap();
    assert_eq!(column(&out.spins, 0), (0..40).collect::<Vec<_>>());
    assert!(out.cost.unwrap().iter().all(|&c| c == 0.0));
}
