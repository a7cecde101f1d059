//! Surface Distance Service: vertex × vertex or parcel × parcel geodesic matrices.
//!
//! Purpose
//! - Wrap the mesh graph into a dense distance matrix that respects the medial
//!   wall and parcel background.
//!
//! Model
//! - One Dijkstra run per source vertex over a graph built once. Rows are
//!   independent and fan out over a dedicated rayon pool of `n_proc` threads;
//!   results are gathered in vertex order.
//! - Parcel mode: each source row is reduced to per-label means (source vertex
//!   excluded), then source rows are averaged per source label. Label 0 never
//!   appears in the output; the diagonal is 0.
//! - Masked or disconnected pairs stay `+inf`. Means over them are `+inf`.

use nalgebra::DMatrix;
use rayon::prelude::*;
use tracing::debug;

use crate::error::{check_len, Result};
use crate::mesh::{make_surf_graph, Mesh, SurfGraph};
use crate::parcel::Parcellation;

/// Inputs besides the mesh.
#[derive(Clone, Debug)]
pub struct DistanceOpts<'a> {
    /// Per-vertex labels; switches the output to parcel × parcel.
    pub parcellation: Option<&'a Parcellation>,
    /// Per-vertex cortex flag (`true` = cortex, `false` = medial wall).
    pub medial: Option<&'a [bool]>,
    /// Label names through which travel is blocked, on top of `drop`.
    pub medial_labels: Vec<String>,
    /// Label names removed from the output; `None` = `PARCIGNORE`.
    pub drop: Option<Vec<String>>,
    /// Worker threads; `<= 1` runs on the caller thread.
    pub n_proc: usize,
}

impl Default for DistanceOpts<'_> {
    fn default() -> Self {
        Self {
            parcellation: None,
            medial: None,
            medial_labels: Vec::new(),
            drop: None,
            n_proc: 1,
        }
    }
}

impl DistanceOpts<'_> {
    /// Effective exclusion set: `drop` (or `PARCIGNORE`) plus `medial_labels`.
    fn excluded(&self) -> Vec<String> {
        let mut names = self.drop.clone().unwrap_or_else(crate::cfg::default_drop);
        for name in &self.medial_labels {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }
}

/// Geodesic distance between every pair of vertices (or parcels) of `mesh`.
///
/// Errors with `ShapeMismatch` if the medial mask or the parcellation length
/// differs from the vertex count. Infinite distances are returned as is.
pub fn get_surface_distance(mesh: &Mesh, opts: &DistanceOpts<'_>) -> Result<DMatrix<f64>> {
    let n = mesh.n_vertices();
    let mut mask = vec![false; n];
    if let Some(medial) = opts.medial {
        check_len("medial mask", n, medial.len())?;
        for (m, &cortex) in mask.iter_mut().zip(medial) {
            *m = !cortex;
        }
    }
    let labels = match opts.parcellation {
        Some(parc) => {
            check_len("parcellation", n, parc.len())?;
            let excluded = opts.excluded();
            let relabelled = parc.relabel(Some(&excluded), 0);
            for (m, &l) in mask.iter_mut().zip(&relabelled.labels) {
                *m |= l == 0;
            }
            Some(relabelled.labels)
        }
        None => None,
    };

    let graph = make_surf_graph(mesh, Some(&mask))?;
    debug!(
        n_vertices = n,
        n_edges = graph.n_edges(),
        masked = mask.iter().filter(|&&m| m).count(),
        n_proc = opts.n_proc,
        "surface distance"
    );

    match labels {
        None => {
            let rows = fan_out(opts.n_proc, n, |src| graph.dijkstra(src))?;
            Ok(DMatrix::from_fn(n, n, |i, j| rows[i][j]))
        }
        Some(labels) => parcel_distance(&graph, &labels, opts.n_proc),
    }
}

fn parcel_distance(graph: &SurfGraph, labels: &[i32], n_proc: usize) -> Result<DMatrix<f64>> {
    let n_parc = labels.iter().copied().max().unwrap_or(0).max(0) as usize;
    let sources: Vec<usize> = (0..labels.len()).filter(|&v| labels[v] > 0).collect();

    let rows = fan_out(n_proc, sources.len(), |k| {
        let src = sources[k];
        let dist = graph.dijkstra(src)?;
        let mut sums = vec![0.0; n_parc];
        let mut counts = vec![0usize; n_parc];
        for (v, (&d, &l)) in dist.iter().zip(labels).enumerate() {
            if v == src || l <= 0 {
                continue;
            }
            sums[l as usize - 1] += d;
            counts[l as usize - 1] += 1;
        }
        Ok(mean_of(sums, &counts))
    })?;

    let mut sums = DMatrix::<f64>::zeros(n_parc, n_parc);
    let mut counts = vec![0usize; n_parc];
    for (k, row) in rows.iter().enumerate() {
        let p = labels[sources[k]] as usize - 1;
        counts[p] += 1;
        for (q, &d) in row.iter().enumerate() {
            sums[(p, q)] += d;
        }
    }
    for p in 0..n_parc {
        let c = counts[p];
        for q in 0..n_parc {
            sums[(p, q)] = if p == q {
                0.0
            } else if c == 0 {
                f64::NAN
            } else {
                sums[(p, q)] / c as f64
            };
        }
    }
    Ok(sums)
}

fn mean_of(sums: Vec<f64>, counts: &[usize]) -> Vec<f64> {
    sums.into_iter()
        .zip(counts)
        .map(|(s, &c)| if c == 0 { f64::NAN } else { s / c as f64 })
        .collect()
}

/// Evaluates `job(0..len)` on `n_proc` threads, results in index order.
fn fan_out<T, F>(n_proc: usize, len: usize, job: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(usize) -> Result<T> + Sync,
{
    if n_proc <= 1 {
        return (0..len).map(&job).collect();
    }
    let pool = rayon::ThreadPoolBuilder::new().num_threads(n_proc).build()?;
    pool.install(|| (0..len).into_par_iter().map(&job).collect())
}
