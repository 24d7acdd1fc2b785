#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Camera intrinsics and normalized image coordinates.
pub mod camera;

/// Timestamped depth point clouds.
pub mod depth;

/// Named coordinate frames.
pub mod frame;

/// Plane models and plane-local frames.
pub mod plane;

/// Timestamped rigid transforms between frames.
pub mod pose;
