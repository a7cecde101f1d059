//! Spatial null models for brain maps on spherical surfaces.
//!
//! Layers, bottom-up
//! - `mesh`: triangle meshes, edge extraction, weighted surface graphs.
//! - `parcel`, `distance`, `centroids`: parcellations, geodesic distance
//!   matrices, parcel representative points.
//! - `spins`: rotation sampler and reassignment (original / vasa / hungarian),
//!   plus `.npy` persistence of resampling arrays.
//! - `nulls`: the published null-model drivers.
//! - `stats`: similarity metrics and permutation tests against nulls.
//!
//! API Policy
//! - Modules are public for direct use; `api` collects the common entry
//!   points in one place. Breaking changes are allowed while the crate is
//!   pre-1.0.

pub mod api;
pub mod centroids;
pub mod cfg;
pub mod distance;
pub mod error;
pub mod hemi;
pub mod mesh;
pub mod nulls;
pub mod parcel;
pub mod spins;
pub mod stats;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::{Error, Result};
pub use hemi::{Hemisphere, Hemispheres};
pub use nalgebra::{DMatrix, Vector3 as Vec3};

/// Common imports for callers running a spin test end to end.
pub mod prelude {
    pub use crate::centroids::{get_parcel_centroids, CentroidMethod};
    pub use crate::hemi::{Hemisphere, Hemispheres};
    pub use crate::mesh::{icosphere, Mesh};
    pub use crate::nulls::{generate_nulls, NullCfg, NullMethod, SurfaceAtlas};
    pub use crate::parcel::Parcellation;
    pub use crate::spins::{gen_spinsamples, ReassignMethod, SpinCfg};
    pub use crate::stats::{compare_images, CompareOpts, Metric};
    pub use nalgebra::{DMatrix, Vector3 as Vec3};
}
