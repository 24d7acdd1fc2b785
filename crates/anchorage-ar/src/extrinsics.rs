use std::sync::OnceLock;

use anchorage_3d::{
    frame::{CoordinateFrame, FramePair, QueryTime},
    pose::{Pose, PoseError},
};

use crate::interfaces::PoseProvider;

/// The fixed transforms between the IMU and the other sensors of the device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtrinsicsSet {
    /// `imu_T_device`
    pub imu_t_device: Pose,
    /// `imu_T_color`
    pub imu_t_color: Pose,
    /// `imu_T_depth`
    pub imu_t_depth: Pose,
}

impl ExtrinsicsSet {
    /// `device_T_depth = imu_T_device⁻¹ ∘ imu_T_depth`
    pub fn device_t_depth(&self) -> Result<Pose, PoseError> {
        self.imu_t_device.inverse().compose(&self.imu_t_depth)
    }

    /// `device_T_color = imu_T_device⁻¹ ∘ imu_T_color`
    pub fn device_t_color(&self) -> Result<Pose, PoseError> {
        self.imu_t_device.inverse().compose(&self.imu_t_color)
    }
}

/// Captures the sensor extrinsics once and keeps them frozen for the session.
#[derive(Debug, Default)]
pub struct ExtrinsicsCache {
    time: QueryTime,
    cell: OnceLock<ExtrinsicsSet>,
}

impl ExtrinsicsCache {
    /// Create an empty cache querying all extrinsics at `time`.
    pub fn new(time: QueryTime) -> Self {
        Self {
            time,
            cell: OnceLock::new(),
        }
    }

    /// The frozen extrinsics, if captured already.
    pub fn get(&self) -> Option<&ExtrinsicsSet> {
        self.cell.get()
    }

    /// Query the three IMU-relative transforms at the cache's single reference instant.
    ///
    /// Once a capture succeeds the result is frozen and returned by every later call without
    /// querying the provider again. A failure caches nothing; the caller decides when to
    /// retry.
    pub fn capture<P: PoseProvider + ?Sized>(
        &self,
        provider: &P,
    ) -> Result<ExtrinsicsSet, PoseError> {
        if let Some(extrinsics) = self.cell.get() {
            return Ok(*extrinsics);
        }

        let query = |target: CoordinateFrame| -> Result<Pose, PoseError> {
            let pair = FramePair::new(CoordinateFrame::Imu, target);
            let pose = provider.pose_at(pair, self.time)?;
            if pose.pair != pair {
                return Err(PoseError::FrameMismatch {
                    left: pair,
                    right: pose.pair,
                });
            }
            Ok(pose)
        };

        let extrinsics = ExtrinsicsSet {
            imu_t_color: query(CoordinateFrame::CameraColor)?,
            imu_t_device: query(CoordinateFrame::Device)?,
            imu_t_depth: query(CoordinateFrame::CameraDepth)?,
        };
        log::debug!("captured extrinsics at {:?}: {:?}", self.time, extrinsics);

        // a concurrent capture may have won the race, keep whichever was stored first
        Ok(*self.cell.get_or_init(|| extrinsics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchorage_lie::se3::SE3;
    use glam::DVec3;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct FixedProvider {
        ready: Mutex<bool>,
        queries: Mutex<Vec<(FramePair, QueryTime)>>,
    }

    impl PoseProvider for FixedProvider {
        fn pose_at(&self, pair: FramePair, time: QueryTime) -> Result<Pose, PoseError> {
            self.queries.lock().push((pair, time));
            if !*self.ready.lock() {
                return Err(PoseError::NotReady { pair });
            }
            let offset = match pair.target {
                CoordinateFrame::CameraColor => DVec3::new(0.01, 0.0, 0.0),
                CoordinateFrame::CameraDepth => DVec3::new(0.03, 0.0, 0.0),
                _ => DVec3::ZERO,
            };
            Ok(Pose::new(pair, 0.0, SE3::from_translation(offset)))
        }

        fn relative_pose(
            &self,
            base: CoordinateFrame,
            _base_time: QueryTime,
            target: CoordinateFrame,
            _target_time: QueryTime,
        ) -> Result<Pose, PoseError> {
            Err(PoseError::NotReady {
                pair: FramePair::new(base, target),
            })
        }
    }

    #[test]
    fn test_not_ready_caches_nothing() {
        let provider = FixedProvider::default();
        let cache = ExtrinsicsCache::new(QueryTime::Latest);
        assert!(matches!(
            cache.capture(&provider),
            Err(PoseError::NotReady { .. })
        ));
        assert!(cache.get().is_none());

        *provider.ready.lock() = true;
        assert!(cache.capture(&provider).is_ok());
        assert!(cache.get().is_some());
    }

    #[test]
    fn test_capture_is_frozen() -> Result<(), PoseError> {
        let provider = FixedProvider::default();
        *provider.ready.lock() = true;
        let cache = ExtrinsicsCache::new(QueryTime::At(0.0));

        let first = cache.capture(&provider)?;
        let second = cache.capture(&provider)?;
        assert_eq!(first, second);

        // three queries, all at the same instant, none for the second capture
        let queries = provider.queries.lock();
        assert_eq!(queries.len(), 3);
        assert!(queries.iter().all(|(pair, time)| {
            pair.base == CoordinateFrame::Imu && *time == QueryTime::At(0.0)
        }));
        Ok(())
    }

    #[test]
    fn test_device_t_depth() -> Result<(), PoseError> {
        let provider = FixedProvider::default();
        *provider.ready.lock() = true;
        let extrinsics = ExtrinsicsCache::default().capture(&provider)?;

        let device_t_depth = extrinsics.device_t_depth()?;
        assert_eq!(
            device_t_depth.pair,
            FramePair::new(CoordinateFrame::Device, CoordinateFrame::CameraDepth)
        );
        assert_eq!(
            device_t_depth.transform_point(DVec3::ZERO),
            DVec3::new(0.03, 0.0, 0.0)
        );
        Ok(())
    }
}
