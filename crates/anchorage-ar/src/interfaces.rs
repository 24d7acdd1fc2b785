//! Collaborators the placement pipeline talks to.
//!
//! Motion tracking, plane fitting and rendering live outside this crate. They are reached
//! through these traits and injected into [`crate::session::ArSession`] and
//! [`crate::pipeline::AnchorPipeline`], so that synthetic doubles can stand in for them.

use std::sync::Arc;

use anchorage_3d::{
    camera::{CameraId, CameraIntrinsics, NormalizedPoint},
    depth::DepthSnapshot,
    frame::{CoordinateFrame, FramePair, QueryTime},
    plane::PlaneFitResult,
    pose::{Pose, PoseError},
};

use crate::config::SessionConfig;
use crate::error::{PlaneFitError, ServiceError};
use crate::events::UpdateListener;
use crate::pipeline::AnchorPose;

/// Source of rigid transforms between device frames.
///
/// Calls are synchronous and may block briefly.
pub trait PoseProvider: Send + Sync {
    /// The pose `pair.base_T_pair.target` at `time`.
    fn pose_at(&self, pair: FramePair, time: QueryTime) -> Result<Pose, PoseError>;

    /// The pose of `target` evaluated at `target_time` relative to `base` evaluated at
    /// `base_time`.
    ///
    /// The returned pose is stamped with the instant of the target frame.
    fn relative_pose(
        &self,
        base: CoordinateFrame,
        base_time: QueryTime,
        target: CoordinateFrame,
        target_time: QueryTime,
    ) -> Result<Pose, PoseError>;
}

/// Source of camera calibrations.
pub trait IntrinsicsProvider: Send + Sync {
    /// The calibration of `camera`.
    fn camera_intrinsics(&self, camera: CameraId) -> Result<CameraIntrinsics, ServiceError>;
}

/// A motion-tracking session: poses, intrinsics and asynchronous sensor updates.
pub trait TrackingService: PoseProvider + IntrinsicsProvider {
    /// Start the service with the given configuration.
    fn connect(&self, config: &SessionConfig) -> Result<(), ServiceError>;

    /// Register the handler for asynchronous updates (depth snapshots, camera frames,
    /// poses, service events). The service may call it from any thread.
    fn connect_listener(&self, listener: Arc<dyn UpdateListener>) -> Result<(), ServiceError>;

    /// Stop the service. Pending updates may still be delivered.
    fn disconnect(&self);
}

/// Fits a plane to the depth samples around a click.
pub trait PlaneFitter: Send + Sync {
    /// Fit a plane near `click`.
    ///
    /// # Arguments
    ///
    /// * `snapshot` - The depth point cloud, in the depth camera frame.
    /// * `intrinsics` - The calibration of the camera `click` refers to.
    /// * `color_t_depth` - The depth camera at the snapshot instant, relative to the colour
    ///   camera at the click instant.
    /// * `click` - The normalized click location.
    fn fit(
        &self,
        snapshot: &DepthSnapshot,
        intrinsics: &CameraIntrinsics,
        color_t_depth: &Pose,
        click: NormalizedPoint,
    ) -> Result<PlaneFitResult, PlaneFitError>;
}

/// Draws the virtual object.
pub trait Renderer: Send + Sync {
    /// Place the object at `anchor`, replacing any previous anchor. Consumed on the next
    /// draw cycle.
    ///
    /// Called while the pipeline publishes the anchor. Reading the last anchor back is
    /// fine, placing another one from here deadlocks.
    fn set_anchor(&self, anchor: AnchorPose);

    /// A new camera frame is ready to be drawn as background.
    fn on_frame_available(&self, _camera: CameraId) {}
}
