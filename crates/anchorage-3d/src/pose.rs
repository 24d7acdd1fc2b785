use anchorage_lie::{se3::SE3, so3::SO3};
use glam::{DMat4, DQuat, DVec3};
use thiserror::Error;

use crate::frame::{CoordinateFrame, FramePair};

/// Error types for pose queries and pose composition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PoseError {
    /// The tracking service cannot provide this pose yet, e.g. tracking is still initializing.
    #[error("pose {pair} is not available yet")]
    NotReady {
        /// The frame pair that was requested.
        pair: FramePair,
    },

    /// The tracking service is not connected anymore.
    #[error("tracking service disconnected")]
    Disconnected,

    /// Two poses were composed whose inner frames do not match.
    #[error("cannot compose {left} with {right}")]
    FrameMismatch {
        /// The left operand frames.
        left: FramePair,
        /// The right operand frames.
        right: FramePair,
    },
}

/// A rigid transform `base_T_target` valid at a given instant.
///
/// The transform maps points expressed in the `target` frame into the `base` frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// The frames connected by the transform.
    pub pair: FramePair,
    /// The instant the transform is valid at, in seconds.
    pub timestamp: f64,
    /// The rigid transform.
    pub transform: SE3,
}

impl Pose {
    /// Create a new pose.
    pub fn new(pair: FramePair, timestamp: f64, transform: SE3) -> Self {
        Self {
            pair,
            timestamp,
            transform,
        }
    }

    /// The identity pose between two frames.
    pub fn identity(base: CoordinateFrame, target: CoordinateFrame, timestamp: f64) -> Self {
        Self::new(FramePair::new(base, target), timestamp, SE3::IDENTITY)
    }

    /// Build a pose from the tracking service layout: a translation and a quaternion
    /// stored as `[x, y, z, w]`.
    pub fn from_translation_rotation(
        pair: FramePair,
        timestamp: f64,
        translation: [f64; 3],
        rotation: [f64; 4],
    ) -> Self {
        let rotation = SO3::from_quaternion(DQuat::from_array(rotation));
        Self::new(
            pair,
            timestamp,
            SE3::new(rotation, DVec3::from_array(translation)),
        )
    }

    /// The translation and `[x, y, z, w]` quaternion of the pose.
    pub fn to_translation_rotation(&self) -> ([f64; 3], [f64; 4]) {
        (
            self.transform.translation.to_array(),
            self.transform.rotation.q.to_array(),
        )
    }

    /// Build a pose from a column-major homogeneous matrix.
    pub fn from_matrix(pair: FramePair, timestamp: f64, matrix: &[f64; 16]) -> Self {
        Self::new(
            pair,
            timestamp,
            SE3::from_matrix(&DMat4::from_cols_array(matrix)),
        )
    }

    /// The pose as a column-major homogeneous matrix.
    pub fn to_matrix(&self) -> [f64; 16] {
        self.transform.matrix().to_cols_array()
    }

    /// The frame the pose is expressed in.
    #[inline]
    pub fn base(&self) -> CoordinateFrame {
        self.pair.base
    }

    /// The frame being located.
    #[inline]
    pub fn target(&self) -> CoordinateFrame {
        self.pair.target
    }

    /// The inverse pose `target_T_base`.
    pub fn inverse(&self) -> Self {
        Self::new(self.pair.reversed(), self.timestamp, self.transform.inverse())
    }

    /// Chain `a_T_b` with `b_T_c` into `a_T_c`.
    ///
    /// The result is stamped with the timestamp of `self`.
    pub fn compose(&self, other: &Pose) -> Result<Pose, PoseError> {
        if self.pair.target != other.pair.base {
            return Err(PoseError::FrameMismatch {
                left: self.pair,
                right: other.pair,
            });
        }
        Ok(Self::new(
            FramePair::new(self.pair.base, other.pair.target),
            self.timestamp,
            self.transform.compose(&other.transform),
        ))
    }

    /// Map a point expressed in the target frame into the base frame.
    #[inline]
    pub fn transform_point(&self, point: DVec3) -> DVec3 {
        self.transform.transform_point(point)
    }
}
