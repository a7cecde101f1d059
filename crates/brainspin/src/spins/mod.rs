//! Rotation Sampler: spherical spin nulls.
//!
//! Purpose
//! - Rotate coordinates on a sphere and map every point to the point that
//!   takes its place, producing a resampling array (one column per rotation).
//!
//! Why this design
//! - Rotations are drawn for the left hemisphere and mirrored across the Y-Z
//!   plane for the right, so both hemispheres move symmetrically.
//! - Reassignment is a closed enum: nearest neighbour (`Original`, k-d tree),
//!   worst-first greedy bijection (`Vasa`) and exact minimum-cost matching
//!   (`Hungarian`, `lsap`).
//! - Reproducibility follows a master `StdRng`; the parallel path pre-draws one
//!   seed per rotation from it so column `r` depends only on `(seed, r)`.
//! - Warnings (duplicate exhaustion) are returned with the samples instead of
//!   being tracked in process-wide state.
//!
//! References
//! - Alexander-Bloch et al. (2018), NeuroImage 178, 540-551.
//! - Váša et al. (2018), Cerebral Cortex 28(1), 281-294.
//! - Crouse (2016), On implementing 2D rectangular assignment algorithms.

mod assign;
pub mod io;
pub mod lsap;
mod project;
mod rotation;
mod sampler;

pub use assign::ReassignMethod;
pub use io::{load_matrix, load_spins, save_cost, save_matrix, save_spins, truncate_spins};
pub use lsap::linear_sum_assignment;
pub use project::{spin_data, spin_data_matrix, spin_parcels, ParcelSpins};
pub use rotation::{gen_rotation, reflect, rotate, RotationPair};
pub use sampler::{gen_spinsamples, gen_spinsamples_with, SpinCfg, SpinSamples, SpinWarning};

#[cfg(test)]
mod tests;
