//! Planar distance helpers
//!
//! Distances are measured directly in degrees, which is accurate enough for
//! the few-metre radii used by gameplay range checks.

use crate::types::Location;

/// Euclidean distance between two positions, in degrees
pub fn distance(a: Location, b: Location) -> f64 {
    (a.latitude - b.latitude).hypot(a.longitude - b.longitude)
}

/// Whether `b` lies within `radius` degrees of `a` (inclusive)
pub fn in_radius(a: Location, b: Location, radius: f64) -> bool {
    distance(a, b) <= radius
}
