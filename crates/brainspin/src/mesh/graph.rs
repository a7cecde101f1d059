//! Weighted surface graph (CSR) and single-source shortest paths.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::edges::{get_direct_edges, get_indirect_edges};
use super::types::{Edge, Mesh};
use crate::error::{check_len, Error, Result};

/// Symmetric sparse graph over mesh vertices.
///
/// Invariants:
/// - `offsets.len() == n + 1`; neighbours of `v` are
///   `targets[offsets[v]..offsets[v + 1]]`, sorted ascending.
/// - every stored edge appears in both directions with the same weight.
#[derive(Clone, Debug)]
pub struct SurfGraph {
    offsets: Vec<usize>,
    targets: Vec<usize>,
    weights: Vec<f64>,
}

impl SurfGraph {
    /// Builds the graph from undirected edges, dropping every edge with an
    /// endpoint marked `true` in `mask`. Repeated pairs keep the smallest weight.
    pub fn from_edges(n: usize, edges: &[Edge], mask: Option<&[bool]>) -> Result<Self> {
        if let Some(m) = mask {
            check_len("mask", n, m.len())?;
        }
        let blocked = |v: usize| mask.map_or(false, |m| m[v]);

        let mut arcs: Vec<(usize, usize, f64)> = Vec::with_capacity(edges.len() * 2);
        for e in edges {
            for idx in [e.a, e.b] {
                if idx >= n {
                    return Err(Error::IndexOutOfRange {
                        what: "edge vertex",
                        index: idx,
                        len: n,
                    });
                }
            }
            if e.a == e.b || blocked(e.a) || blocked(e.b) {
                continue;
            }
            arcs.push((e.a, e.b, e.weight));
            arcs.push((e.b, e.a, e.weight));
        }
        arcs.sort_by(|x, y| {
            (x.0, x.1)
                .cmp(&(y.0, y.1))
                .then_with(|| x.2.partial_cmp(&y.2).unwrap_or(Ordering::Equal))
        });
        arcs.dedup_by(|later, kept| later.0 == kept.0 && later.1 == kept.1);

        let mut offsets = vec![0usize; n + 1];
        for &(src, _, _) in &arcs {
            offsets[src + 1] += 1;
        }
        for v in 0..n {
            offsets[v + 1] += offsets[v];
        }
        let targets = arcs.iter().map(|&(_, dst, _)| dst).collect();
        let weights = arcs.iter().map(|&(_, _, w)| w).collect();
        Ok(Self {
            offsets,
            targets,
            weights,
        })
    }

    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Number of undirected edges.
    #[inline]
    pub fn n_edges(&self) -> usize {
        self.targets.len() / 2
    }

    /// `(neighbour, weight)` pairs of `v`.
    pub fn neighbors(&self, v: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.offsets[v]..self.offsets[v + 1];
        self.targets[range.clone()]
            .iter()
            .copied()
            .zip(self.weights[range].iter().copied())
    }

    /// Weight of edge `(u, v)` if present.
    pub fn weight(&self, u: usize, v: usize) -> Option<f64> {
        let range = self.offsets[u]..self.offsets[u + 1];
        let slice = &self.targets[range.clone()];
        slice
            .binary_search(&v)
            .ok()
            .map(|k| self.weights[range.start + k])
    }

    /// Shortest-path distance from `source` to every node; unreachable nodes are `+inf`.
    pub fn dijkstra(&self, source: usize) -> Result<Vec<f64>> {
        let n = self.n_nodes();
        if source >= n {
            return Err(Error::IndexOutOfRange {
                what: "source vertex",
                index: source,
                len: n,
            });
        }
        let mut dist = vec![f64::INFINITY; n];
        dist[source] = 0.0;
        let mut heap = BinaryHeap::new();
        heap.push(DijkNode {
            dist: 0.0,
            node: source,
        });
        while let Some(DijkNode { dist: d, node }) = heap.pop() {
            if d > dist[node] {
                continue;
            }
            for (next, w) in self.neighbors(node) {
                let cand = d + w;
                if cand < dist[next] {
                    dist[next] = cand;
                    heap.push(DijkNode {
                        dist: cand,
                        node: next,
                    });
                }
            }
        }
        Ok(dist)
    }

    /// One distance row per source, in the order given.
    pub fn dijkstra_from(&self, sources: &[usize]) -> Result<Vec<Vec<f64>>> {
        sources.iter().map(|&s| self.dijkstra(s)).collect()
    }
}

#[derive(Clone, Copy, PartialEq)]
struct DijkNode {
    dist: f64,
    node: usize,
}

impl Eq for DijkNode {}

// Min-heap on distance; ties broken on node index for a deterministic pop order.
impl Ord for DijkNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .dist
            .partial_cmp(&self.dist)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for DijkNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Direct edges followed by indirect edges.
pub fn surface_edges(mesh: &Mesh) -> Vec<Edge> {
    let mut edges = get_direct_edges(mesh);
    edges.extend(get_indirect_edges(mesh));
    edges
}

/// Graph of direct + indirect edges; edges touching a masked vertex are removed.
///
/// Errors with `ShapeMismatch` if `mask.len() != mesh.n_vertices()`.
pub fn make_surf_graph(mesh: &Mesh, mask: Option<&[bool]>) -> Result<SurfGraph> {
    if let Some(m) = mask {
        check_len("mask", mesh.n_vertices(), m.len())?;
    }
    SurfGraph::from_edges(mesh.n_vertices(), &surface_edges(mesh), mask)
}
