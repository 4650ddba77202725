// Track geometry derivation
// Turns one reference lap's position samples into the renderable circuit
// outline (centerline, boundary curves, bounds, DRS zones) consumed by the
// replay viewer.

pub mod drs;
pub mod geometry;

// Re-export commonly used types
pub use drs::{DrsZone, TrackPoint, DEFAULT_DRS_ACTIVE_CODES};
pub use geometry::{TrackGeometry, TrackOutlineBuilder, TrackOutlineConfig};
