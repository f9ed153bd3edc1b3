//! Affinity-aware bin packing of replicated applications.
//!
//! Replicas with a cpu and memory demand, either fixed or varying over time, are packed into as few
//! identical bins as possible, while respecting how many replicas of each other the applications
//! tolerate in the same bin.

/// Entities to model the packing problem
pub mod entities;

/// Importing instances into and exporting solutions out of this library
pub mod io;

/// Lower bounds on the number of bins
pub mod lower_bounds;

/// The packing algorithms
pub mod packing;

/// Scalar and time-series resource models
pub mod resources;

/// Helper functions which do not belong to any specific module
pub mod util;
