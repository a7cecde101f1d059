//! Direct, shared and indirect (face-to-face) edges of a triangle mesh.

use super::types::{Edge, Mesh, SharedEdge};

/// All three edges of every triangle as sorted pairs, tagged with the face index.
fn face_edges(triangles: &[[usize; 3]]) -> Vec<((usize, usize), usize)> {
    let mut out = Vec::with_capacity(triangles.len() * 3);
    for (f, &[v0, v1, v2]) in triangles.iter().enumerate() {
        for (u, v) in [(v0, v1), (v1, v2), (v2, v0)] {
            let key = if u <= v { (u, v) } else { (v, u) };
            out.push((key, f));
        }
    }
    out
}

/// Unique direct edges weighted by Euclidean length, sorted by `(a, b)`.
///
/// Self-loops from degenerate triangles are skipped.
pub fn get_direct_edges(mesh: &Mesh) -> Vec<Edge> {
    let mut keys: Vec<(usize, usize)> = face_edges(&mesh.triangles)
        .into_iter()
        .map(|(k, _)| k)
        .filter(|&(a, b)| a != b)
        .collect();
    keys.sort_unstable();
    keys.dedup();
    keys.into_iter()
        .map(|(a, b)| Edge::new(a, b, (mesh.vertices[a] - mesh.vertices[b]).norm()))
        .collect()
}

/// Pairs of triangles sharing an edge.
///
/// Only edges used by exactly two distinct triangles qualify: boundary edges
/// (one triangle) and non-manifold edges (three or more) are left out, as are
/// triangles that repeat a vertex.
pub fn get_shared_triangles(triangles: &[[usize; 3]]) -> Vec<SharedEdge> {
    let mut tagged = face_edges(triangles);
    tagged.sort_unstable();

    let mut out = Vec::with_capacity(tagged.len() / 2);
    let mut start = 0;
    while start < tagged.len() {
        let key = tagged[start].0;
        let mut end = start + 1;
        while end < tagged.len() && tagged[end].0 == key {
            end += 1;
        }
        if end - start == 2 && key.0 != key.1 {
            let (f0, f1) = (tagged[start].1, tagged[start + 1].1);
            if f0 != f1 {
                let apex0 = apex_of(&triangles[f0], key);
                let apex1 = apex_of(&triangles[f1], key);
                if let (Some(p0), Some(p1)) = (apex0, apex1) {
                    out.push(SharedEdge {
                        edge: key,
                        triangles: [[key.0, key.1, p0], [key.0, key.1, p1]],
                    });
                }
            }
        }
        start = end;
    }
    out
}

/// The single vertex of `tri` not on `edge`; `None` for degenerate triangles.
fn apex_of(tri: &[usize; 3], edge: (usize, usize)) -> Option<usize> {
    let mut apex = None;
    for &v in tri {
        if v != edge.0 && v != edge.1 {
            if apex.is_some() {
                return None;
            }
            apex = Some(v);
        }
    }
    apex
}

/// Edges between the apexes of every shared-edge triangle pair.
///
/// The weight is `|V0 - M| + |V1 - M|`, where `M` is the midpoint of the feet
/// of the perpendiculars dropped from each apex onto the shared edge. When a
/// triangle is obtuse at the shared edge the foot falls outside the edge and
/// the weight slightly underestimates the surface path.
pub fn get_indirect_edges(mesh: &Mesh) -> Vec<Edge> {
    let verts = &mesh.vertices;
    get_shared_triangles(&mesh.triangles)
        .into_iter()
        .filter_map(|shared| {
            let (p0, p1) = shared.apexes();
            if p0 == p1 {
                return None;
            }
            let a = verts[shared.edge.0];
            let b = verts[shared.edge.1];
            let ab = a - b;
            let ab2 = ab.norm_squared();
            if ab2 == 0.0 {
                return None;
            }
            let foot = |apex: usize| {
                let w = ab.dot(&(verts[apex] - b)) / ab2;
                b + ab * w
            };
            let mid = (foot(p0) + foot(p1)) * 0.5;
            let weight = (verts[p0] - mid).norm() + (verts[p1] - mid).norm();
            Some(Edge::new(p0, p1, weight))
        })
        .collect()
}
