//! Spinning parcel labels and parcel data through a vertex-level resampling array.

use std::collections::BTreeSet;

use nalgebra::DMatrix;

use crate::error::{check_len, Error, Result};
use crate::parcel::{parcels_to_vertices, vertices_to_parcels};

/// Parcel reassignment per rotation: `P × R`, `-1` where a parcel landed
/// entirely on background.
pub type ParcelSpins = DMatrix<i64>;

fn check_spins(labels: &[i32], spins: &DMatrix<usize>) -> Result<()> {
    check_len("labels", spins.nrows(), labels.len())?;
    if let Some(&bad) = spins.iter().find(|&&s| s >= labels.len()) {
        return Err(Error::IndexOutOfRange {
            what: "spin",
            index: bad,
            len: labels.len(),
        });
    }
    Ok(())
}

/// Reassigns every parcel to the label covering most of its rotated footprint.
///
/// Row `k` belongs to the `k`-th smallest positive label. The emitted value is
/// `q - 1` for the modal positive label `q` (ties to the smallest), or `-1`.
pub fn spin_parcels(labels: &[i32], spins: &DMatrix<usize>) -> Result<ParcelSpins> {
    check_spins(labels, spins)?;
    let parcels: Vec<i32> = labels
        .iter()
        .copied()
        .filter(|&l| l > 0)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let row_of = |label: i32| parcels.binary_search(&label).ok();

    let mut out = DMatrix::<i64>::from_element(parcels.len(), spins.ncols(), -1);
    let mut pairs: Vec<(usize, i32)> = Vec::with_capacity(labels.len());
    for r in 0..spins.ncols() {
        pairs.clear();
        for (v, &own) in labels.iter().enumerate() {
            let landed = labels[spins[(v, r)]];
            if landed > 0 {
                if let Some(row) = row_of(own) {
                    pairs.push((row, landed));
                }
            }
        }
        pairs.sort_unstable();

        let mut k = 0;
        while k < pairs.len() {
            let row = pairs[k].0;
            let mut best: Option<(i32, usize)> = None;
            while k < pairs.len() && pairs[k].0 == row {
                let label = pairs[k].1;
                let start = k;
                while k < pairs.len() && pairs[k] == (row, label) {
                    k += 1;
                }
                let count = k - start;
                if best.map_or(true, |(_, c)| count > c) {
                    best = Some((label, count));
                }
            }
            if let Some((label, _)) = best {
                out[(row, r)] = i64::from(label) - 1;
            }
        }
    }
    Ok(out)
}

/// Projects parcel `data` to vertices, permutes by each spin column and
/// re-averages per parcel. Parcels left with only background are NaN.
pub fn spin_data(data: &[f64], labels: &[i32], spins: &DMatrix<usize>) -> Result<DMatrix<f64>> {
    check_spins(labels, spins)?;
    let vertices = parcels_to_vertices(data, labels)?;
    let mut columns = Vec::with_capacity(spins.ncols());
    for col in spins.column_iter() {
        let rotated: Vec<f64> = col.iter().map(|&s| vertices[s]).collect();
        columns.push(vertices_to_parcels(&rotated, labels, None)?);
    }
    let n_out = columns.first().map_or(data.len(), Vec::len);
    Ok(DMatrix::from_iterator(n_out, columns.len(), columns.into_iter().flatten()))
}

/// `spin_data` for each column of a `P × F` feature matrix; one `P × R` block per feature.
pub fn spin_data_matrix(data: &DMatrix<f64>, labels: &[i32], spins: &DMatrix<usize>) -> Result<Vec<DMatrix<f64>>> {
    data.column_iter()
        .map(|col| spin_data(col.as_slice(), labels, spins))
        .collect()
}
