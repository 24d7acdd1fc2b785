use std::sync::Arc;

use anchorage_3d::{
    camera::{CameraIntrinsics, NormalizedPoint},
    frame::{CoordinateFrame, FramePair, QueryTime},
    plane::plane_frame,
    pose::{Pose, PoseError},
};
use anchorage_lie::se3::SE3;
use glam::{DQuat, DVec3};
use parking_lot::Mutex;

use crate::config::PlacementConfig;
use crate::error::PlacementError;
use crate::extrinsics::ExtrinsicsSet;
use crate::interfaces::{PlaneFitter, PoseProvider, Renderer};
use crate::store::DepthSnapshotStore;

/// Where the virtual object is placed, in the world frame.
///
/// The anchor's local +Z axis is the normal of the surface it sits on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorPose {
    /// `world_T_anchor`
    pub world_t_anchor: SE3,
    /// The surface normal, in the world frame.
    pub normal: DVec3,
    /// Timestamp of the depth snapshot the anchor was computed from, in seconds.
    pub timestamp: f64,
}

impl AnchorPose {
    /// The anchor position in the world frame.
    #[inline]
    pub fn position(&self) -> DVec3 {
        self.world_t_anchor.translation
    }

    /// The anchor orientation in the world frame.
    #[inline]
    pub fn orientation(&self) -> DQuat {
        self.world_t_anchor.rotation.q
    }
}

/// Turns a click into a world anchor using the latest depth snapshot.
///
/// The pipeline keeps no state between calls apart from the last published anchor.
pub struct AnchorPipeline<P: ?Sized, F: ?Sized, R: ?Sized> {
    store: Arc<DepthSnapshotStore>,
    poses: Arc<P>,
    fitter: Arc<F>,
    renderer: Arc<R>,
    intrinsics: CameraIntrinsics,
    device_t_depth: Pose,
    config: PlacementConfig,
    last_anchor: Mutex<Option<AnchorPose>>,
    // serializes publication so the renderer sees anchors in `last_anchor` order
    publish: Mutex<()>,
}

impl<P, F, R> AnchorPipeline<P, F, R>
where
    P: PoseProvider + ?Sized,
    F: PlaneFitter + ?Sized,
    R: Renderer + ?Sized,
{
    /// Create a pipeline.
    ///
    /// # Arguments
    ///
    /// * `store` - The depth snapshot store fed by the tracking service.
    /// * `poses` - The pose provider.
    /// * `fitter` - The plane fitter.
    /// * `renderer` - Receives every successfully placed anchor.
    /// * `intrinsics` - The calibration of the camera clicks refer to.
    /// * `extrinsics` - The frozen sensor extrinsics of the session.
    /// * `config` - Placement parameters.
    pub fn new(
        store: Arc<DepthSnapshotStore>,
        poses: Arc<P>,
        fitter: Arc<F>,
        renderer: Arc<R>,
        intrinsics: CameraIntrinsics,
        extrinsics: &ExtrinsicsSet,
        config: PlacementConfig,
    ) -> Result<Self, PoseError> {
        Ok(Self {
            store,
            poses,
            fitter,
            renderer,
            intrinsics,
            device_t_depth: extrinsics.device_t_depth()?,
            config,
            last_anchor: Mutex::new(None),
            publish: Mutex::new(()),
        })
    }

    /// The last anchor published to the renderer, if any.
    pub fn last_anchor(&self) -> Option<AnchorPose> {
        *self.last_anchor.lock()
    }

    /// Place the object at the surface under `click` and publish the anchor to the renderer.
    ///
    /// On failure nothing is published and the previous anchor stays in place.
    ///
    /// [`AnchorPipeline::last_anchor`] already returns the new anchor when the renderer
    /// receives it. The renderer must not place anchors from [`Renderer::set_anchor`].
    pub fn place_anchor(&self, click: NormalizedPoint) -> Result<AnchorPose, PlacementError> {
        let anchor = self.locate(click)?;

        let _publishing = self.publish.lock();
        *self.last_anchor.lock() = Some(anchor);
        self.renderer.set_anchor(anchor);

        log::debug!(
            "anchor placed at {:?} (normal {:?})",
            anchor.position(),
            anchor.normal
        );
        Ok(anchor)
    }

    /// Compute the anchor for `click` without publishing it.
    pub fn locate(&self, click: NormalizedPoint) -> Result<AnchorPose, PlacementError> {
        // 1. the depth data the anchor will be derived from
        let snapshot = self.store.latest().ok_or(PlacementError::NoDepthData)?;
        let timestamp = snapshot.timestamp();
        log::debug!(
            "placing at ({:.3}, {:.3}) with {} depth points at t={timestamp:.6}",
            click.u,
            click.v,
            snapshot.len()
        );

        // 2. colour camera at the click instant relative to the depth camera at capture time
        let color_t_depth = self.poses.relative_pose(
            CoordinateFrame::CameraColor,
            self.config.reference_time,
            CoordinateFrame::CameraDepth,
            QueryTime::At(timestamp),
        )?;
        self.check_pose(
            &color_t_depth,
            FramePair::new(CoordinateFrame::CameraColor, CoordinateFrame::CameraDepth),
            timestamp,
        )?;

        // 3. plane under the click, in depth camera space
        let fit = self
            .fitter
            .fit(&snapshot, &self.intrinsics, &color_t_depth, click)?;
        if !fit.intersection.is_finite() {
            return Err(PlacementError::NoPlaneFound);
        }

        // 4. device pose at the instant the depth was captured
        let world_t_device = self.poses.pose_at(
            FramePair::new(CoordinateFrame::World, CoordinateFrame::Device),
            QueryTime::At(timestamp),
        )?;
        self.check_pose(
            &world_t_device,
            FramePair::new(CoordinateFrame::World, CoordinateFrame::Device),
            timestamp,
        )?;

        // 5. depth -> device -> world
        let world_t_depth = world_t_device.compose(&self.device_t_depth)?;
        let depth_up = world_t_depth
            .transform
            .rotation
            .inverse()
            .transform(self.config.world_up);
        let depth_t_anchor = plane_frame(fit.intersection, fit.plane.normal(), depth_up)?;

        Ok(AnchorPose {
            world_t_anchor: world_t_depth.transform.compose(&depth_t_anchor),
            normal: world_t_depth.transform.transform_vector(fit.plane.normal()),
            timestamp,
        })
    }

    fn check_pose(
        &self,
        pose: &Pose,
        expected: FramePair,
        timestamp: f64,
    ) -> Result<(), PlacementError> {
        if pose.pair != expected {
            return Err(PlacementError::InconsistentPose(format!(
                "expected {expected}, got {}",
                pose.pair
            )));
        }
        if !((pose.timestamp - timestamp).abs() <= self.config.timestamp_tolerance) {
            return Err(PlacementError::InconsistentPose(format!(
                "{expected} is stamped {:.6} but the depth snapshot is stamped {timestamp:.6}",
                pose.timestamp
            )));
        }
        Ok(())
    }
}
