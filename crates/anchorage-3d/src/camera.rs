use glam::DVec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    /// Invalid camera intrinsics
    #[error("Invalid camera intrinsics: {0}")]
    InvalidIntrinsics(String),
}

/// The cameras exposed by a depth-sensing device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraId {
    /// The colour (RGB) camera.
    Color,
    /// The depth camera.
    Depth,
    /// The wide-angle motion-tracking camera.
    Fisheye,
}

/// A click location as fractions of the view size, `u = x / width` and `v = y / height`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    /// Horizontal fraction in `[0, 1]`.
    pub u: f64,
    /// Vertical fraction in `[0, 1]`.
    pub v: f64,
}

impl NormalizedPoint {
    /// Create a new point, clamping both coordinates to `[0, 1]`.
    pub fn new(u: f64, v: f64) -> Self {
        Self {
            u: u.clamp(0.0, 1.0),
            v: v.clamp(0.0, 1.0),
        }
    }
}

/// The calibration of a pinhole camera.
///
/// Distortion follows the polynomial model `[k1, k2, p1, p2, k3]`. It is carried for
/// consumers that undistort; the helpers below are pure pinhole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Focal length in x, in pixels.
    pub fx: f64,
    /// Focal length in y, in pixels.
    pub fy: f64,
    /// Principal point x coordinate, in pixels.
    pub cx: f64,
    /// Principal point y coordinate, in pixels.
    pub cy: f64,
    /// Distortion coefficients.
    pub distortion: [f64; 5],
}

impl CameraIntrinsics {
    /// Create undistorted intrinsics, checking that the focal lengths and the image size are
    /// positive.
    pub fn new(
        width: u32,
        height: u32,
        fx: f64,
        fy: f64,
        cx: f64,
        cy: f64,
    ) -> Result<Self, CameraError> {
        if width == 0 || height == 0 {
            return Err(CameraError::InvalidIntrinsics(format!(
                "image size must be positive, got {width}x{height}"
            )));
        }
        if !(fx > 0.0 && fy > 0.0) {
            return Err(CameraError::InvalidIntrinsics(format!(
                "focal lengths must be positive, got fx={fx} fy={fy}"
            )));
        }
        Ok(Self {
            width,
            height,
            fx,
            fy,
            cx,
            cy,
            distortion: [0.0; 5],
        })
    }

    /// Set the distortion coefficients.
    pub fn with_distortion(mut self, distortion: [f64; 5]) -> Self {
        self.distortion = distortion;
        self
    }

    /// The 3x3 camera matrix, row major.
    pub fn camera_matrix(&self) -> [[f64; 3]; 3] {
        [
            [self.fx, 0.0, self.cx],
            [0.0, self.fy, self.cy],
            [0.0, 0.0, 1.0],
        ]
    }

    /// Convert a normalized click location into pixel coordinates of this camera.
    pub fn to_pixel(&self, point: NormalizedPoint) -> [f64; 2] {
        [point.u * self.width as f64, point.v * self.height as f64]
    }

    /// The viewing ray through a pixel, with unit depth (`z = 1`).
    pub fn unproject(&self, pixel: [f64; 2]) -> DVec3 {
        DVec3::new(
            (pixel[0] - self.cx) / self.fx,
            (pixel[1] - self.cy) / self.fy,
            1.0,
        )
    }

    /// Project a point in camera space to pixel coordinates.
    ///
    /// Returns `None` for points on or behind the image plane.
    pub fn project(&self, point: DVec3) -> Option<[f64; 2]> {
        if point.z <= f64::EPSILON {
            return None;
        }
        Some([
            self.fx * point.x / point.z + self.cx,
            self.fy * point.y / point.z + self.cy,
        ])
    }
}
