#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use anchorage_3d::{
    camera::{CameraId, CameraIntrinsics, NormalizedPoint},
    depth::DepthSnapshot,
    frame::{CoordinateFrame, FramePair, QueryTime},
    plane::{PlaneFitResult, PlaneModel},
    pose::{Pose, PoseError},
};
use anchorage_ar::{
    config::SessionConfig,
    error::{PlaneFitError, ServiceError},
    events::UpdateListener,
    interfaces::{IntrinsicsProvider, PlaneFitter, PoseProvider, Renderer, TrackingService},
    pipeline::AnchorPose,
};
use anchorage_lie::se3::SE3;
use glam::DVec3;
use parking_lot::Mutex;

/// A tracking service with a device that does not move.
pub struct StaticService {
    pub world_t_device: SE3,
    pub imu_t_device: SE3,
    pub imu_t_color: SE3,
    pub imu_t_depth: SE3,
    pub intrinsics: CameraIntrinsics,
    /// Replaces `imu_t_depth` once set, as after a recalibration.
    pub recalibrated_depth: Mutex<Option<SE3>>,
    /// Returned by every intrinsics query while set.
    pub intrinsics_error: Mutex<Option<ServiceError>>,
    /// Added to the timestamp of every world pose.
    pub stamp_skew: Mutex<f64>,
    /// Number of extrinsics queries that still fail as not ready.
    pub extrinsics_not_ready: AtomicU32,
    pub tracking_lost: AtomicBool,
    pub connect_error: Mutex<Option<ServiceError>>,
    pub connects: AtomicUsize,
    pub disconnects: AtomicUsize,
    pub listener: Mutex<Option<Arc<dyn UpdateListener>>>,
}

impl Default for StaticService {
    fn default() -> Self {
        Self {
            world_t_device: SE3::IDENTITY,
            imu_t_device: SE3::IDENTITY,
            imu_t_color: SE3::IDENTITY,
            imu_t_depth: SE3::IDENTITY,
            intrinsics: intrinsics(),
            recalibrated_depth: Mutex::new(None),
            intrinsics_error: Mutex::new(None),
            stamp_skew: Mutex::new(0.0),
            extrinsics_not_ready: AtomicU32::new(0),
            tracking_lost: AtomicBool::new(false),
            connect_error: Mutex::new(None),
            connects: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
            listener: Mutex::new(None),
        }
    }
}

impl StaticService {
    fn device_t(&self, frame: CoordinateFrame) -> SE3 {
        let imu_t_frame = match frame {
            CoordinateFrame::CameraColor => self.imu_t_color,
            CoordinateFrame::CameraDepth => self.imu_t_depth(),
            CoordinateFrame::Imu => SE3::IDENTITY,
            _ => self.imu_t_device,
        };
        self.imu_t_device.inverse() * imu_t_frame
    }

    fn imu_t_depth(&self) -> SE3 {
        self.recalibrated_depth.lock().unwrap_or(self.imu_t_depth)
    }

    /// Push a depth snapshot through the registered listener.
    pub fn deliver_depth(&self, snapshot: DepthSnapshot) {
        if let Some(listener) = self.listener.lock().as_ref() {
            listener.on_depth_available(Arc::new(snapshot));
        }
    }

    /// Push a frame notification through the registered listener.
    pub fn deliver_frame(&self, camera: CameraId) {
        if let Some(listener) = self.listener.lock().as_ref() {
            listener.on_frame_available(camera);
        }
    }
}

impl PoseProvider for StaticService {
    fn pose_at(&self, pair: FramePair, time: QueryTime) -> Result<Pose, PoseError> {
        let timestamp = match time {
            QueryTime::At(t) => t,
            QueryTime::Latest => 0.0,
        };
        match (pair.base, pair.target) {
            (CoordinateFrame::Imu, target) => {
                let pending = self.extrinsics_not_ready.load(Ordering::SeqCst);
                if pending > 0 {
                    self.extrinsics_not_ready.store(pending - 1, Ordering::SeqCst);
                    return Err(PoseError::NotReady { pair });
                }
                let transform = match target {
                    CoordinateFrame::CameraColor => self.imu_t_color,
                    CoordinateFrame::CameraDepth => self.imu_t_depth(),
                    _ => self.imu_t_device,
                };
                Ok(Pose::new(pair, timestamp, transform))
            }
            (CoordinateFrame::World, CoordinateFrame::Device) => {
                if self.tracking_lost.load(Ordering::SeqCst) {
                    return Err(PoseError::NotReady { pair });
                }
                let skew = *self.stamp_skew.lock();
                Ok(Pose::new(pair, timestamp + skew, self.world_t_device))
            }
            _ => Err(PoseError::NotReady { pair }),
        }
    }

    fn relative_pose(
        &self,
        base: CoordinateFrame,
        _base_time: QueryTime,
        target: CoordinateFrame,
        target_time: QueryTime,
    ) -> Result<Pose, PoseError> {
        let pair = FramePair::new(base, target);
        if self.tracking_lost.load(Ordering::SeqCst) {
            return Err(PoseError::NotReady { pair });
        }
        let timestamp = match target_time {
            QueryTime::At(t) => t,
            QueryTime::Latest => 0.0,
        };
        // the device does not move, so the instants do not matter
        let transform = self.device_t(base).inverse() * self.device_t(target);
        Ok(Pose::new(pair, timestamp, transform))
    }
}

impl IntrinsicsProvider for StaticService {
    fn camera_intrinsics(&self, _camera: CameraId) -> Result<CameraIntrinsics, ServiceError> {
        if let Some(err) = self.intrinsics_error.lock().clone() {
            return Err(err);
        }
        Ok(self.intrinsics.clone())
    }
}

impl TrackingService for StaticService {
    fn connect(&self, _config: &SessionConfig) -> Result<(), ServiceError> {
        if let Some(err) = self.connect_error.lock().clone() {
            return Err(err);
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn connect_listener(&self, listener: Arc<dyn UpdateListener>) -> Result<(), ServiceError> {
        *self.listener.lock() = Some(listener);
        Ok(())
    }

    fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

/// Casts the click ray into the depth frame and intersects it with the plane through the
/// first two and the last point of the snapshot.
#[derive(Default)]
pub struct RayFitter;

impl PlaneFitter for RayFitter {
    fn fit(
        &self,
        snapshot: &DepthSnapshot,
        intrinsics: &CameraIntrinsics,
        color_t_depth: &Pose,
        click: NormalizedPoint,
    ) -> Result<PlaneFitResult, PlaneFitError> {
        let points = snapshot.points();
        if points.len() < 3 {
            return Err(PlaneFitError::NoPlaneFound);
        }
        let [p0, p1, p2] = [0, 1, points.len() - 1].map(|i| DVec3::from_array(points[i]));
        let plane = PlaneModel::from_point_normal(p0, (p1 - p0).cross(p2 - p0))
            .map_err(|_| PlaneFitError::NoPlaneFound)?;

        let depth_t_color = color_t_depth.inverse().transform;
        let ray = intrinsics.unproject(intrinsics.to_pixel(click));
        let intersection = plane
            .intersect_ray(depth_t_color.translation, depth_t_color.transform_vector(ray))
            .ok_or(PlaneFitError::NoPlaneFound)?;

        Ok(PlaneFitResult {
            intersection,
            plane,
        })
    }
}

/// Records every anchor and frame it receives.
#[derive(Default)]
pub struct RecordingRenderer {
    pub anchors: Mutex<Vec<AnchorPose>>,
    pub frames: Mutex<Vec<CameraId>>,
}

impl Renderer for RecordingRenderer {
    fn set_anchor(&self, anchor: AnchorPose) {
        self.anchors.lock().push(anchor);
    }

    fn on_frame_available(&self, camera: CameraId) {
        self.frames.lock().push(camera);
    }
}

pub fn intrinsics() -> CameraIntrinsics {
    CameraIntrinsics::new(640, 480, 520.0, 520.0, 320.0, 240.0).unwrap()
}

/// A 5x5 grid of points on the plane `z = depth` of the depth camera.
pub fn wall_snapshot(timestamp: f64, depth: f64) -> DepthSnapshot {
    let mut points = Vec::new();
    for i in 0..5 {
        for j in 0..5 {
            points.push([i as f64 * 0.25 - 0.5, j as f64 * 0.25 - 0.5, depth]);
        }
    }
    DepthSnapshot::new(timestamp, points)
}
