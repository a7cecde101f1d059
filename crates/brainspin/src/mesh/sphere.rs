//! Synthetic spherical meshes (icosphere subdivision).
//!
//! Used by tests, benches and demos in place of a template sphere from an atlas.

use std::collections::HashMap;

use nalgebra::Vector3;

use super::types::Mesh;

/// Unit icosphere with `subdivisions` rounds of 4-to-1 triangle splitting.
///
/// Vertex count is `10 * 4^k + 2`; the mesh is closed and every edge is
/// shared by exactly two triangles.
pub fn icosphere(subdivisions: u32) -> Mesh {
    let t = (1.0 + 5f64.sqrt()) / 2.0;
    let mut vertices: Vec<Vector3<f64>> = [
        [-1.0, t, 0.0],
        [1.0, t, 0.0],
        [-1.0, -t, 0.0],
        [1.0, -t, 0.0],
        [0.0, -1.0, t],
        [0.0, 1.0, t],
        [0.0, -1.0, -t],
        [0.0, 1.0, -t],
        [t, 0.0, -1.0],
        [t, 0.0, 1.0],
        [-t, 0.0, -1.0],
        [-t, 0.0, 1.0],
    ]
    .iter()
    .map(|v| Vector3::new(v[0], v[1], v[2]).normalize())
    .collect();
    let mut triangles: Vec<[usize; 3]> = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    for _ in 0..subdivisions {
        let mut cache: HashMap<(usize, usize), usize> = HashMap::new();
        let mut midpoint = |u: usize, v: usize, verts: &mut Vec<Vector3<f64>>| -> usize {
            let key = if u < v { (u, v) } else { (v, u) };
            *cache.entry(key).or_insert_with(|| {
                let mid = ((verts[u] + verts[v]) * 0.5).normalize();
                verts.push(mid);
                verts.len() - 1
            })
        };
        let mut next = Vec::with_capacity(triangles.len() * 4);
        for &[a, b, c] in &triangles {
            let ab = midpoint(a, b, &mut vertices);
            let bc = midpoint(b, c, &mut vertices);
            let ca = midpoint(c, a, &mut vertices);
            next.push([a, ab, ca]);
            next.push([b, bc, ab]);
            next.push([c, ca, bc]);
            next.push([ab, bc, ca]);
        }
        triangles = next;
    }

    Mesh {
        vertices,
        triangles,
    }
}
