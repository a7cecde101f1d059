//! Curated API surface (UNSTABLE).
//!
//! Important
//! - A convenience re-export of the entry points most callers need, grouped
//!   by layer. The modules themselves remain the source of truth.

// Meshes and graphs
pub use crate::mesh::{
    get_direct_edges, get_indirect_edges, get_shared_triangles, icosphere, make_surf_graph,
    point_in_triangle, surface_edges, which_triangle, Edge, Mesh, SurfGraph,
};
// Parcellations
pub use crate::parcel::{
    joint_labels, parcels_to_vertices, parcels_to_vertices_matrix, relabel_hemispheres,
    vertices_to_parcels, vertices_to_parcels_matrix, Parcellation,
};
// Distances and centroids
pub use crate::centroids::{get_parcel_centroids, CentroidMethod, Centroids};
pub use crate::distance::{get_surface_distance, DistanceOpts};
// Rotation sampler
pub use crate::spins::{
    gen_rotation, gen_spinsamples, gen_spinsamples_with, linear_sum_assignment, load_spins,
    save_spins, spin_data, spin_data_matrix, spin_parcels, ReassignMethod, RotationPair, SpinCfg, SpinSamples,
    SpinWarning,
};
// Null models
pub use crate::nulls::{
    alexander_bloch, baum, cornblath, generate_nulls, get_distmat, hungarian, naive_nonparametric,
    vasa, vazquez_rodriguez, NullCfg, NullMethod, SurfaceAtlas,
};
// Statistics
pub use crate::stats::{
    compare_images, efficient_pearsonr, permtest_metric, rankdata, CompareOpts, Comparison,
    Metric, NanPolicy, NullSource,
};
// Hemispheres and errors
pub use crate::hemi::{hemiid_from_ints, Hemisphere, Hemispheres};
pub use crate::{Error, Result};
