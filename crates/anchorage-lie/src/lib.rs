#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Anchorage Lie Groups
//!
//! Rotations and rigid body transformations used to chain coordinate frames of a
//! depth-sensing device (IMU, device body, colour camera, depth camera, world).
//!
//! ## Supported Groups
//!
//! - **SO(3)**: 3D rotation group
//! - **SE(3)**: 3D rigid body transformations (rotation + translation)
//!
//! ## Example
//!
//! ```rust
//! use anchorage_lie::{se3::SE3, so3::SO3};
//! use glam::DVec3;
//!
//! // a quarter turn around z followed by a shift along x
//! let rotation = SO3::exp(DVec3::new(0.0, 0.0, std::f64::consts::FRAC_PI_2));
//! let a_t_b = SE3::new(rotation, DVec3::new(1.0, 0.0, 0.0));
//!
//! let p_in_a = a_t_b.transform_point(DVec3::new(1.0, 0.0, 0.0));
//! assert!((p_in_a - DVec3::new(1.0, 1.0, 0.0)).length() < 1e-12);
//! ```

/// Special Euclidean group SE(3) for 3D rigid transformations.
pub mod se3;

/// Special Orthogonal group SO(3) for 3D rotations.
pub mod so3;
