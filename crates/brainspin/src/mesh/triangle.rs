//! Point-in-triangle queries.

use nalgebra::Vector3;

/// Barycentric containment test of `point` against `triangle`.
///
/// Returns `(inside, pdist)` where `pdist = |v2 · (v1 × v0)|` is the planar
/// offset of the point scaled by twice the triangle area (exact distance for
/// unit-area triangles; only used to rank candidates).
pub fn point_in_triangle(point: &Vector3<f64>, triangle: &[Vector3<f64>; 3]) -> (bool, f64) {
    let [a, b, c] = triangle;
    let v0 = c - a;
    let v1 = b - a;
    let v2 = point - a;

    let dot00 = v0.dot(&v0);
    let dot01 = v0.dot(&v1);
    let dot02 = v0.dot(&v2);
    let dot11 = v1.dot(&v1);
    let dot12 = v1.dot(&v2);

    let denom = 1.0 / (dot00 * dot11 - dot01 * dot01);
    let u = (dot11 * dot02 - dot01 * dot12) * denom;
    let v = (dot00 * dot12 - dot01 * dot02) * denom;
    let inside = u >= 0.0 && v >= 0.0 && u + v < 1.0;

    (inside, v2.dot(&v1.cross(&v0)).abs())
}

/// Index of the containing triangle with the smallest planar offset, if any.
pub fn which_triangle(point: &Vector3<f64>, triangles: &[[Vector3<f64>; 3]]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (n, tri) in triangles.iter().enumerate() {
        let (inside, pdist) = point_in_triangle(point, tri);
        if inside && best.map_or(true, |(_, d)| pdist < d) {
            best = Some((n, pdist));
        }
    }
    best.map(|(n, _)| n)
}
