#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Session configuration.
pub mod config;

/// Error types for placement and sessions.
pub mod error;

/// Asynchronous updates from the tracking service.
pub mod events;

/// Sensor extrinsics captured once per session.
pub mod extrinsics;

pub mod interfaces;

/// Click to world anchor.
pub mod pipeline;

/// The AR session tying the collaborators together.
pub mod session;

/// Latest depth snapshot holder.
pub mod store;

/// Touch normalization.
pub mod touch;

pub use error::{PlacementError, SessionError};
pub use pipeline::{AnchorPipeline, AnchorPose};
pub use session::ArSession;
pub use store::DepthSnapshotStore;
