//! Vertex ↔ parcel conversion.

use std::collections::BTreeSet;

use nalgebra::DMatrix;

use crate::error::{check_len, Error, Result};

/// Mean of `data` within each parcel of `labels`.
///
/// Entry `p - 1` holds parcel `p`. NaN values, values equal to `background`
/// and vertices with label `<= 0` do not contribute; a parcel with no
/// contributing vertex is NaN. Labels are expected to be consecutive, so the
/// output length is the largest label.
pub fn vertices_to_parcels(data: &[f64], labels: &[i32], background: Option<f64>) -> Result<Vec<f64>> {
    check_len("vertex data", labels.len(), data.len())?;
    let n_parc = labels.iter().copied().max().unwrap_or(0).max(0) as usize;
    let mut sums = vec![0.0; n_parc];
    let mut counts = vec![0usize; n_parc];
    for (&value, &label) in data.iter().zip(labels) {
        if label <= 0 || value.is_nan() || background == Some(value) {
            continue;
        }
        let p = label as usize - 1;
        sums[p] += value;
        counts[p] += 1;
    }
    Ok(sums
        .into_iter()
        .zip(counts)
        .map(|(s, c)| if c == 0 { f64::NAN } else { s / c as f64 })
        .collect())
}

/// Broadcasts parcel values to vertices; background vertices get NaN.
///
/// The number of distinct positive labels must equal `data.len()`.
pub fn parcels_to_vertices(data: &[f64], labels: &[i32]) -> Result<Vec<f64>> {
    let expected = labels
        .iter()
        .filter(|&&l| l > 0)
        .collect::<BTreeSet<_>>()
        .len();
    check_len("parcel data", expected, data.len())?;
    labels
        .iter()
        .map(|&l| {
            if l <= 0 {
                return Ok(f64::NAN);
            }
            let p = l as usize - 1;
            data.get(p).copied().ok_or(Error::IndexOutOfRange {
                what: "parcel label",
                index: p,
                len: data.len(),
            })
        })
        .collect()
}

/// `vertices_to_parcels` over every column of an `N × F` feature matrix.
pub fn vertices_to_parcels_matrix(
    data: &DMatrix<f64>,
    labels: &[i32],
    background: Option<f64>,
) -> Result<DMatrix<f64>> {
    by_column(data, |col| vertices_to_parcels(col, labels, background), || {
        labels.iter().copied().max().unwrap_or(0).max(0) as usize
    })
}

/// `parcels_to_vertices` over every column of a `P × F` feature matrix.
pub fn parcels_to_vertices_matrix(data: &DMatrix<f64>, labels: &[i32]) -> Result<DMatrix<f64>> {
    by_column(data, |col| parcels_to_vertices(col, labels), || labels.len())
}

fn by_column<F, R>(data: &DMatrix<f64>, f: F, empty_rows: R) -> Result<DMatrix<f64>>
where
    F: Fn(&[f64]) -> Result<Vec<f64>>,
    R: FnOnce() -> usize,
{
    let columns = data
        .column_iter()
        .map(|col| f(col.as_slice()))
        .collect::<Result<Vec<_>>>()?;
    let rows = columns.first().map_or_else(empty_rows, Vec::len);
    Ok(DMatrix::from_iterator(rows, columns.len(), columns.into_iter().flatten()))
}
