use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anchorage::ar::{
    config::SessionConfig,
    error::ServiceError,
    events::{self, EventDispatcher, SessionEvent, UpdateListener},
    interfaces::{IntrinsicsProvider, PoseProvider, TrackingService},
};
use anchorage::k3d::{
    camera::{CameraId, CameraIntrinsics},
    depth::DepthSnapshot,
    frame::{CoordinateFrame, FramePair, QueryTime},
    plane::PlaneModel,
    pose::{Pose, PoseError},
};
use anchorage::lie::{se3::SE3, so3::SO3};
use crossbeam_channel::Sender;
use glam::{DMat3, DVec3};
use parking_lot::Mutex;
use rand::Rng;

/// A device circling a flat floor while looking at the origin.
pub struct Scene {
    start: Instant,
    radius: f64,
    height: f64,
    angular_speed: f64,
    floor: PlaneModel,
    device_t_color: SE3,
    device_t_depth: SE3,
    color: CameraIntrinsics,
    depth: CameraIntrinsics,
    noise: f64,
}

impl Scene {
    pub fn new(radius: f64, height: f64) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            start: Instant::now(),
            radius,
            height,
            angular_speed: 0.2,
            floor: PlaneModel::from_coefficients([0.0, 0.0, 1.0, 0.0])?,
            device_t_color: SE3::from_translation(DVec3::new(0.01, 0.0, 0.0)),
            device_t_depth: SE3::from_translation(DVec3::new(0.02, 0.0, 0.0)),
            color: CameraIntrinsics::new(1280, 720, 1040.0, 1040.0, 640.0, 360.0)?,
            depth: CameraIntrinsics::new(320, 180, 260.0, 260.0, 160.0, 90.0)?,
            noise: 0.002,
        })
    }

    /// Seconds since the scene started.
    pub fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// The device pose at `t`: x right, y down, z towards the origin.
    pub fn world_t_device(&self, t: f64) -> SE3 {
        let angle = self.angular_speed * t;
        let position = DVec3::new(
            self.radius * angle.cos(),
            self.radius * angle.sin(),
            self.height,
        );
        let forward = (-position).normalize();
        let right = forward.cross(DVec3::Z).normalize();
        let down = forward.cross(right);
        SE3::new(
            SO3::from_matrix(&DMat3::from_cols(right, down, forward)),
            position,
        )
    }

    fn imu_t(&self, frame: CoordinateFrame) -> SE3 {
        // the IMU sits at the device origin
        match frame {
            CoordinateFrame::CameraColor => self.device_t_color,
            CoordinateFrame::CameraDepth => self.device_t_depth,
            _ => SE3::IDENTITY,
        }
    }

    fn world_t(&self, frame: CoordinateFrame, t: f64) -> SE3 {
        match frame {
            CoordinateFrame::World => SE3::IDENTITY,
            frame => self.world_t_device(t) * self.imu_t(frame),
        }
    }

    /// What the depth camera sees of the floor at `t`, in the depth camera frame.
    pub fn depth_snapshot(&self, t: f64, rng: &mut impl Rng) -> DepthSnapshot {
        let world_t_depth = self.world_t(CoordinateFrame::CameraDepth, t);
        let depth_t_world = world_t_depth.inverse();

        let mut points = Vec::new();
        for v in (0..self.depth.height).step_by(4) {
            for u in (0..self.depth.width).step_by(4) {
                let ray = self.depth.unproject([u as f64, v as f64]);
                let Some(hit) = self.floor.intersect_ray(
                    world_t_depth.translation,
                    world_t_depth.transform_vector(ray),
                ) else {
                    continue;
                };
                let p = depth_t_world.transform_point(hit);
                if p.z < 6.0 {
                    let z = p.z + rng.random_range(-self.noise..self.noise);
                    points.push([p.x, p.y, z]);
                }
            }
        }
        DepthSnapshot::new(t, points)
    }
}

fn resolve(time: QueryTime, now: f64) -> f64 {
    match time {
        QueryTime::Latest => now,
        QueryTime::At(t) => t,
    }
}

/// A tracking service replaying [`Scene`].
///
/// Depth snapshots and colour frames are produced on a background thread and delivered
/// through the notification channel.
pub struct SyntheticTracker {
    scene: Arc<Scene>,
    depth_rate: f64,
    running: Arc<AtomicBool>,
    workers: Mutex<Option<(JoinHandle<()>, EventDispatcher)>>,
}

impl SyntheticTracker {
    pub fn new(scene: Scene, depth_rate: f64) -> Self {
        Self {
            scene: Arc::new(scene),
            depth_rate,
            running: Arc::new(AtomicBool::new(false)),
            workers: Mutex::new(None),
        }
    }

    fn spawn_sensors(&self, sender: Sender<SessionEvent>) -> std::io::Result<JoinHandle<()>> {
        let scene = self.scene.clone();
        let running = self.running.clone();
        let period = Duration::from_secs_f64(1.0 / self.depth_rate.max(0.1));

        std::thread::Builder::new()
            .name("synthetic-depth".to_string())
            .spawn(move || {
                let mut rng = rand::rng();
                while running.load(Ordering::Relaxed) {
                    let snapshot = scene.depth_snapshot(scene.now(), &mut rng);
                    log::trace!("depth snapshot with {} points", snapshot.len());

                    let delivered = sender
                        .send(SessionEvent::Depth(Arc::new(snapshot)))
                        .and_then(|_| {
                            sender.send(SessionEvent::FrameAvailable(CameraId::Color))
                        });
                    if delivered.is_err() {
                        break;
                    }
                    std::thread::sleep(period);
                }
            })
    }
}

impl PoseProvider for SyntheticTracker {
    fn pose_at(&self, pair: FramePair, time: QueryTime) -> Result<Pose, PoseError> {
        let t = resolve(time, self.scene.now());
        let transform = match pair.base {
            CoordinateFrame::Imu => self.scene.imu_t(pair.target),
            CoordinateFrame::World => self.scene.world_t(pair.target, t),
            _ => return Err(PoseError::NotReady { pair }),
        };
        Ok(Pose::new(pair, t, transform))
    }

    fn relative_pose(
        &self,
        base: CoordinateFrame,
        base_time: QueryTime,
        target: CoordinateFrame,
        target_time: QueryTime,
    ) -> Result<Pose, PoseError> {
        let now = self.scene.now();
        let base_t = resolve(base_time, now);
        let target_t = resolve(target_time, now);
        let transform =
            self.scene.world_t(base, base_t).inverse() * self.scene.world_t(target, target_t);
        Ok(Pose::new(FramePair::new(base, target), target_t, transform))
    }
}

impl IntrinsicsProvider for SyntheticTracker {
    fn camera_intrinsics(&self, camera: CameraId) -> Result<CameraIntrinsics, ServiceError> {
        match camera {
            CameraId::Color => Ok(self.scene.color.clone()),
            CameraId::Depth => Ok(self.scene.depth.clone()),
            CameraId::Fisheye => Err(ServiceError::Unavailable(
                "no fisheye camera in the synthetic scene".to_string(),
            )),
        }
    }
}

impl TrackingService for SyntheticTracker {
    fn connect(&self, config: &SessionConfig) -> Result<(), ServiceError> {
        if !config.enable_depth {
            log::warn!("depth disabled, no anchor can be placed");
        }
        self.running.store(config.enable_depth, Ordering::Relaxed);
        Ok(())
    }

    fn connect_listener(&self, listener: Arc<dyn UpdateListener>) -> Result<(), ServiceError> {
        let (sender, receiver) = events::channel();
        let dispatcher = EventDispatcher::spawn(receiver, listener)
            .map_err(|err| ServiceError::Unavailable(err.to_string()))?;
        let sensors = self
            .spawn_sensors(sender)
            .map_err(|err| ServiceError::Unavailable(err.to_string()))?;
        *self.workers.lock() = Some((sensors, dispatcher));
        Ok(())
    }

    fn disconnect(&self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some((sensors, dispatcher)) = self.workers.lock().take() {
            // the dispatcher stops once the sensor thread drops its sender
            if sensors.join().is_err() {
                log::error!("depth thread panicked");
            }
            match dispatcher.join() {
                Ok(delivered) => log::info!("delivered {delivered} sensor updates"),
                Err(_) => log::error!("event dispatcher panicked"),
            }
        }
    }
}

impl Drop for SyntheticTracker {
    fn drop(&mut self) {
        self.disconnect();
    }
}

