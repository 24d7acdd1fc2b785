use std::path::Path;
use std::time::Duration;

use anchorage_3d::{camera::CameraId, frame::QueryTime};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid JSON for this configuration.
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}

/// How often and how fast a failed operation is retried by the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub attempts: u32,
    /// Pause between two attempts, in milliseconds.
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay_ms: 100,
        }
    }
}

impl RetryPolicy {
    /// The pause between two attempts.
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Parameters of the anchor placement pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Instant the colour camera pose is evaluated at when relating it to the depth camera.
    pub reference_time: QueryTime,
    /// Largest accepted difference, in seconds, between a pose timestamp and the depth
    /// snapshot timestamp.
    pub timestamp_tolerance: f64,
    /// The up direction of the world frame, used to orient anchors on their plane.
    pub world_up: DVec3,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            reference_time: QueryTime::Latest,
            timestamp_tolerance: 1e-6,
            world_up: DVec3::Z,
        }
    }
}

/// Configuration of an AR session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Ask the tracking service for low-latency IMU integration. Needed to align virtual
    /// content precisely with the colour image.
    pub low_latency_imu_integration: bool,
    /// Enable depth sensing.
    pub enable_depth: bool,
    /// The camera the click coordinates refer to.
    pub color_camera: CameraId,
    /// The single instant all three extrinsics queries are evaluated at.
    pub extrinsics_time: QueryTime,
    /// Retry policy for capturing extrinsics right after connecting.
    pub extrinsics_retry: RetryPolicy,
    /// Placement pipeline parameters.
    pub placement: PlacementConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            low_latency_imu_integration: true,
            enable_depth: true,
            color_camera: CameraId::Color,
            extrinsics_time: QueryTime::Latest,
            extrinsics_retry: RetryPolicy::default(),
            placement: PlacementConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Parse a configuration from JSON. Missing fields take their default value.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}
