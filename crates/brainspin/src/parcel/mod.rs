//! Parcellations: background resolution, relabelling and vertex ↔ parcel
//! aggregation.
//!
//! Conventions
//! - Label 0 is background; negative labels are treated as background too.
//! - Excluded names (`drop`, default `cfg::PARCIGNORE`) are matched against
//!   the label table once, in `Parcellation::relabel`. Everything downstream
//!   works on consecutive integer ids `1..=P`.
//! - Two hemispheres are numbered jointly: right ids continue after the left.

mod aggregate;
mod labels;

pub use aggregate::{
    parcels_to_vertices, parcels_to_vertices_matrix, vertices_to_parcels, vertices_to_parcels_matrix,
};
pub use labels::{joint_labels, relabel_hemispheres, Parcellation};

pub(crate) use labels::name_in_drop;
