use anchorage_3d::{frame::FramePair, plane::PlaneError, pose::PoseError};
use thiserror::Error;

use crate::config::ConfigError;
use crate::touch::TouchError;

/// Error returned by a plane fitter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaneFitError {
    /// The click ray does not meet a surface that supports a stable plane estimate.
    #[error("no plane found near the click location")]
    NoPlaneFound,
}

/// Error reported by the tracking service itself.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// The tracking session was lost.
    #[error("tracking service disconnected")]
    Disconnected,

    /// The installed tracking service is older than the client library.
    #[error("tracking service is out of date")]
    OutOfDate,

    /// The application lacks the permission to use motion tracking.
    #[error("missing permission to use the tracking service")]
    PermissionDenied,

    /// Any other service failure.
    #[error("tracking service unavailable: {0}")]
    Unavailable(String),
}

/// Why a placement request did not produce an anchor.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlacementError {
    /// The pose subsystem cannot answer yet; try again later.
    #[error("tracking not ready for {pair}")]
    NotReady {
        /// The pose that could not be obtained.
        pair: FramePair,
    },

    /// No depth snapshot has been received yet.
    #[error("no depth data received yet")]
    NoDepthData,

    /// The click does not land on a fittable surface; click elsewhere.
    #[error("no plane found near the click location")]
    NoPlaneFound,

    /// The tracking session is gone and must be reconnected.
    #[error("tracking service disconnected")]
    ServiceDisconnected,

    /// A pose did not match the depth snapshot it was paired with.
    #[error("inconsistent pose: {0}")]
    InconsistentPose(String),

    /// The touch could not be converted into a click location.
    #[error("invalid touch: {0}")]
    InvalidTouch(#[from] TouchError),
}

impl PlacementError {
    /// Whether touching again may succeed without reconnecting the session.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, PlacementError::ServiceDisconnected)
    }
}

impl From<PoseError> for PlacementError {
    fn from(err: PoseError) -> Self {
        match err {
            PoseError::NotReady { pair } => PlacementError::NotReady { pair },
            PoseError::Disconnected => PlacementError::ServiceDisconnected,
            err @ PoseError::FrameMismatch { .. } => {
                PlacementError::InconsistentPose(err.to_string())
            }
        }
    }
}

impl From<PlaneFitError> for PlacementError {
    fn from(err: PlaneFitError) -> Self {
        match err {
            PlaneFitError::NoPlaneFound => PlacementError::NoPlaneFound,
        }
    }
}

impl From<PlaneError> for PlacementError {
    fn from(_: PlaneError) -> Self {
        PlacementError::NoPlaneFound
    }
}

/// Error raised while connecting a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The tracking service refused the connection.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The sensor extrinsics could not be captured, even after retrying.
    #[error("failed to capture extrinsics: {0}")]
    Extrinsics(#[from] PoseError),

    /// The session configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchorage_3d::frame::CoordinateFrame;

    #[test]
    fn test_pose_error_mapping() {
        let pair = FramePair::new(CoordinateFrame::World, CoordinateFrame::Device);
        assert_eq!(
            PlacementError::from(PoseError::NotReady { pair }),
            PlacementError::NotReady { pair }
        );
        assert_eq!(
            PlacementError::from(PoseError::Disconnected),
            PlacementError::ServiceDisconnected
        );
        let mismatch = PoseError::FrameMismatch {
            left: pair,
            right: pair,
        };
        assert!(matches!(
            PlacementError::from(mismatch),
            PlacementError::InconsistentPose(_)
        ));
    }

    #[test]
    fn test_recoverable() {
        assert!(PlacementError::NoDepthData.is_recoverable());
        assert!(PlacementError::NoPlaneFound.is_recoverable());
        assert!(!PlacementError::ServiceDisconnected.is_recoverable());
    }
}
