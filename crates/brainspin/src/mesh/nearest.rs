//! Nearest-point queries over a fixed point set.
//!
//! Built once with kiddo's immutable k-d tree, which accepts any number of
//! points sharing a coordinate (coincident vertices, planar meshes, the
//! unrotated identity).

use kiddo::{ImmutableKdTree, SquaredEuclidean};
use nalgebra::Vector3;

pub struct PointTree {
    tree: Option<ImmutableKdTree<f64, 3>>,
    len: usize,
}

impl PointTree {
    pub fn new(points: &[Vector3<f64>]) -> Self {
        let entries: Vec<[f64; 3]> = points.iter().map(|p| [p.x, p.y, p.z]).collect();
        Self {
            tree: (!entries.is_empty()).then(|| ImmutableKdTree::new_from_slice(&entries)),
            len: points.len(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// `(index, Euclidean distance)` of the closest point; `None` when empty.
    pub fn nearest(&self, p: &Vector3<f64>) -> Option<(usize, f64)> {
        let hit = self.tree.as_ref()?.nearest_one::<SquaredEuclidean>(&[p.x, p.y, p.z]);
        Some((hit.item as usize, hit.distance.sqrt()))
    }
}
