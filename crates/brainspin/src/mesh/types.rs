//! Mesh, edge and shared-edge types.

use nalgebra::Vector3;

use crate::error::{Error, Result};

/// Triangle mesh: `N` vertices and `T` index triples.
///
/// Invariants:
/// - every triangle index is `< vertices.len()` (checked by `new`);
/// - manifold/watertight is assumed, never verified.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub vertices: Vec<Vector3<f64>>,
    pub triangles: Vec<[usize; 3]>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vector3<f64>>, triangles: Vec<[usize; 3]>) -> Result<Self> {
        let n = vertices.len();
        for tri in &triangles {
            if let Some(&bad) = tri.iter().find(|&&v| v >= n) {
                return Err(Error::IndexOutOfRange {
                    what: "triangle vertex",
                    index: bad,
                    len: n,
                });
            }
        }
        Ok(Self {
            vertices,
            triangles,
        })
    }

    /// Builds a mesh from flat `[x, y, z]` rows.
    pub fn from_arrays(vertices: &[[f64; 3]], triangles: Vec<[usize; 3]>) -> Result<Self> {
        let verts = vertices
            .iter()
            .map(|v| Vector3::new(v[0], v[1], v[2]))
            .collect();
        Self::new(verts, triangles)
    }

    #[inline]
    pub fn n_vertices(&self) -> usize {
        self.vertices.len()
    }
}

/// Unordered weighted edge, stored with `a < b`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
    pub weight: f64,
}

impl Edge {
    #[inline]
    pub fn new(u: usize, v: usize, weight: f64) -> Self {
        let (a, b) = if u <= v { (u, v) } else { (v, u) };
        Self { a, b, weight }
    }
}

/// Two triangles sharing `edge`.
///
/// Each triangle is `[a, b, apex]`: the shared vertices (sorted) followed by the
/// triangle's own third vertex. The triangle with the smaller index comes first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SharedEdge {
    pub edge: (usize, usize),
    pub triangles: [[usize; 3]; 2],
}

impl SharedEdge {
    #[inline]
    pub fn apexes(&self) -> (usize, usize) {
        (self.triangles[0][2], self.triangles[1][2])
    }
}
