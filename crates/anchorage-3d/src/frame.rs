use serde::{Deserialize, Serialize};

/// A named reference frame of the device or its surroundings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateFrame {
    /// The device body.
    Device,
    /// The inertial measurement unit.
    Imu,
    /// The colour camera optical frame.
    CameraColor,
    /// The depth camera optical frame.
    CameraDepth,
    /// The start-of-service world frame, fixed when tracking starts.
    World,
}

impl std::fmt::Display for CoordinateFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CoordinateFrame::Device => "device",
            CoordinateFrame::Imu => "imu",
            CoordinateFrame::CameraColor => "camera_color",
            CoordinateFrame::CameraDepth => "camera_depth",
            CoordinateFrame::World => "world",
        };
        write!(f, "{name}")
    }
}

/// An ordered pair of frames identifying the transform `base_T_target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FramePair {
    /// The frame the pose is expressed in.
    pub base: CoordinateFrame,
    /// The frame being located.
    pub target: CoordinateFrame,
}

impl FramePair {
    /// Create a new frame pair.
    pub const fn new(base: CoordinateFrame, target: CoordinateFrame) -> Self {
        Self { base, target }
    }

    /// The pair with base and target swapped.
    pub const fn reversed(&self) -> Self {
        Self {
            base: self.target,
            target: self.base,
        }
    }
}

impl std::fmt::Display for FramePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_T_{}", self.base, self.target)
    }
}

/// The instant a pose is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryTime {
    /// The most recent estimate available from the tracking service.
    #[default]
    Latest,
    /// A specific timestamp, in seconds.
    At(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_pair_display_and_reverse() {
        let pair = FramePair::new(CoordinateFrame::World, CoordinateFrame::Device);
        assert_eq!(pair.to_string(), "world_T_device");
        assert_eq!(
            pair.reversed(),
            FramePair::new(CoordinateFrame::Device, CoordinateFrame::World)
        );
    }

    #[test]
    fn test_query_time_default_is_latest() {
        assert_eq!(QueryTime::default(), QueryTime::Latest);
    }
}
