//! Mesh Geometry Engine: edges, surface graph, geodesic distances.
//!
//! Purpose
//! - Turn a triangle mesh into a weighted graph whose shortest paths
//!   approximate geodesic distance along the surface.
//!
//! Model
//! - Direct edges: triangle sides, weighted by Euclidean length.
//! - Indirect edges: for two triangles sharing a side, an edge between their
//!   apexes weighted by the path through the midpoint of the apex feet on the
//!   shared side. This cuts across the shared side instead of walking two
//!   triangle sides, which is closer to the true geodesic.
//! - A vertex mask removes every edge touching a masked vertex (medial wall,
//!   dropped parcels). Disconnected nodes end up at `+inf`.
//!
//! Assumptions
//! - Meshes are taken as manifold. Boundary edges (used by one triangle) give
//!   no indirect edge; paths along a boundary fall back to direct edges.

mod edges;
mod graph;
mod nearest;
pub mod sphere;
pub mod triangle;
mod types;

pub use edges::{get_direct_edges, get_indirect_edges, get_shared_triangles};
pub use graph::{make_surf_graph, surface_edges, SurfGraph};
pub use nearest::PointTree;
pub use sphere::icosphere;
pub use triangle::{point_in_triangle, which_triangle};
pub use types::{Edge, Mesh, SharedEdge};
