//! Parcel Centroid Resolver: one representative point per parcel.
//!
//! Purpose
//! - Reduce each parcel of a two-hemisphere parcellation to a coordinate the
//!   rotation sampler can spin.
//!
//! Methods
//! - `Average`: arithmetic mean of member vertices (generally off-surface).
//! - `Surface`: mesh vertex nearest (Euclidean) to the average.
//! - `Geodesic`: member vertex with the smallest mean shortest-path distance
//!   to the other members, on a graph restricted to the parcel's own vertices.
//!
//! Ordering
//! - Left hemisphere first, labels ascending within a hemisphere.

use std::fmt;
use std::str::FromStr;

use nalgebra::Vector3;
use tracing::debug;

use crate::error::{check_len, Error, Result};
use crate::hemi::{Hemisphere, Hemispheres};
use crate::mesh::{surface_edges, Mesh, PointTree, SurfGraph};
use crate::parcel::Parcellation;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CentroidMethod {
    Average,
    #[default]
    Surface,
    Geodesic,
}

impl CentroidMethod {
    pub const NAMES: &'static [&'static str] = &["average", "surface", "geodesic"];

    pub fn as_str(self) -> &'static str {
        match self {
            CentroidMethod::Average => "average",
            CentroidMethod::Surface => "surface",
            CentroidMethod::Geodesic => "geodesic",
        }
    }
}

impl fmt::Display for CentroidMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CentroidMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "average" => Ok(CentroidMethod::Average),
            "surface" => Ok(CentroidMethod::Surface),
            "geodesic" => Ok(CentroidMethod::Geodesic),
            other => Err(Error::InvalidMethod {
                kind: "centroid method",
                value: other.to_string(),
                valid: Self::NAMES,
            }),
        }
    }
}

/// Coordinates with their hemisphere of origin.
#[derive(Clone, Debug, PartialEq)]
pub struct Centroids {
    pub coords: Vec<Vector3<f64>>,
    pub hemiid: Vec<Hemisphere>,
}

impl Centroids {
    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}

/// Parcel centroids of both hemispheres.
///
/// Without a parcellation every vertex is its own parcel and the raw vertex
/// coordinates are returned. Labels named in `drop` (`None` = `PARCIGNORE`)
/// are skipped, as are labels `<= 0` that have no name.
pub fn get_parcel_centroids(
    surfaces: &Hemispheres<Mesh>,
    parcellation: Option<&Hemispheres<Parcellation>>,
    method: CentroidMethod,
    drop: Option<&[String]>,
) -> Result<Centroids> {
    let mut coords = Vec::new();
    let mut hemiid = Vec::new();

    for (hemi, mesh) in surfaces.iter() {
        let Some(parcs) = parcellation else {
            coords.extend_from_slice(&mesh.vertices);
            hemiid.extend(std::iter::repeat(hemi).take(mesh.n_vertices()));
            continue;
        };
        let parc = parcs.get(hemi);
        check_len("parcellation", mesh.n_vertices(), parc.len())?;

        let edges = match method {
            CentroidMethod::Geodesic => Some(surface_edges(mesh)),
            _ => None,
        };
        let tree = (method == CentroidMethod::Surface).then(|| PointTree::new(&mesh.vertices));
        for label in parc.unique_labels() {
            if parc.is_dropped(label, drop) || (label <= 0 && parc.name(label).is_none()) {
                continue;
            }
            let members: Vec<usize> = (0..parc.len()).filter(|&v| parc.labels[v] == label).collect();
            let centroid = match &edges {
                Some(edges) => geodesic_centroid(mesh, edges, &members)?,
                None => {
                    let avg = average(mesh, &members);
                    match tree.as_ref().and_then(|t| t.nearest(&avg)) {
                        Some((v, _)) => mesh.vertices[v],
                        None => avg,
                    }
                }
            };
            coords.push(centroid);
            hemiid.push(hemi);
        }
    }

    debug!(n_centroids = coords.len(), %method, "parcel centroids");
    Ok(Centroids { coords, hemiid })
}

fn average(mesh: &Mesh, members: &[usize]) -> Vector3<f64> {
    let sum = members
        .iter()
        .fold(Vector3::zeros(), |acc, &v| acc + mesh.vertices[v]);
    sum / members.len() as f64
}

fn geodesic_centroid(mesh: &Mesh, edges: &[crate::mesh::Edge], members: &[usize]) -> Result<Vector3<f64>> {
    let mut mask = vec![true; mesh.n_vertices()];
    for &v in members {
        mask[v] = false;
    }
    let graph = SurfGraph::from_edges(mesh.n_vertices(), edges, Some(&mask))?;

    let mut best = (members[0], f64::INFINITY);
    for &src in members {
        let dist = graph.dijkstra(src)?;
        let mean = members.iter().map(|&v| dist[v]).sum::<f64>() / members.len() as f64;
        if mean < best.1 {
            best = (src, mean);
        }
    }
    Ok(mesh.vertices[best.0])
}
