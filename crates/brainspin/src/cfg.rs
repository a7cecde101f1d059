//! Defaults and fixed constants.
//!
//! Policy
//! - Values a caller may reasonably tune live on the config structs
//!   (`SpinCfg`, `DistanceOpts`, `NullCfg`); these constants are their
//!   defaults. The retry budget is fixed.

/// Attempts per rotation before a duplicate resampling is accepted.
pub const MAX_SPIN_ATTEMPTS: usize = 500;

/// Default number of rotations for `gen_spinsamples`.
pub const DEFAULT_N_ROTATE: usize = 1000;

/// Default number of null maps for the drivers in `nulls`.
pub const DEFAULT_N_PERM: usize = 1000;

/// Label names that conventionally denote the medial wall or background.
pub const PARCIGNORE: &[&str] = &[
    "unknown",
    "corpuscallosum",
    "Background+FreeSurfer_Defined_Medial_Wall",
    "???",
    "Unknown",
    "Medial_wall",
    "Medial wall",
    "medial_wall",
];

/// `PARCIGNORE` as owned strings, for APIs that take caller-supplied sets.
pub fn default_drop() -> Vec<String> {
    PARCIGNORE.iter().map(|s| s.to_string()).collect()
}
