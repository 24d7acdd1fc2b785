use anchorage_lie::{se3::SE3, so3::SO3};
use glam::{DMat3, DVec3};
use thiserror::Error;

const DEGENERATE_EPSILON: f64 = 1e-9;

/// Error types for plane models.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaneError {
    /// The plane normal has (almost) zero length.
    #[error("plane normal is degenerate: {0:?}")]
    DegenerateNormal([f64; 3]),
}

/// A plane `normal · x + offset = 0` with a unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneModel {
    normal: DVec3,
    offset: f64,
}

impl PlaneModel {
    /// Create a plane from the coefficients `[a, b, c, d]` of `a x + b y + c z + d = 0`.
    ///
    /// The coefficients are scaled so that the normal has unit length.
    pub fn from_coefficients(coefficients: [f64; 4]) -> Result<Self, PlaneError> {
        let [a, b, c, d] = coefficients;
        let normal = DVec3::new(a, b, c);
        let norm = normal.length();
        if !norm.is_finite() || norm < DEGENERATE_EPSILON {
            return Err(PlaneError::DegenerateNormal([a, b, c]));
        }
        Ok(Self {
            normal: normal / norm,
            offset: d / norm,
        })
    }

    /// Create the plane through `point` with the given normal.
    pub fn from_point_normal(point: DVec3, normal: DVec3) -> Result<Self, PlaneError> {
        let unit = normal.try_normalize().ok_or(PlaneError::DegenerateNormal(normal.to_array()))?;
        Ok(Self {
            normal: unit,
            offset: -unit.dot(point),
        })
    }

    /// The unit normal.
    #[inline]
    pub fn normal(&self) -> DVec3 {
        self.normal
    }

    /// The offset `d` of the plane equation.
    #[inline]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// The normalized coefficients `[a, b, c, d]`.
    pub fn coefficients(&self) -> [f64; 4] {
        [self.normal.x, self.normal.y, self.normal.z, self.offset]
    }

    /// Signed distance of `point` to the plane, positive on the normal side.
    #[inline]
    pub fn signed_distance(&self, point: DVec3) -> f64 {
        self.normal.dot(point) + self.offset
    }

    /// Intersect the ray `origin + t * direction` (`t >= 0`) with the plane.
    pub fn intersect_ray(&self, origin: DVec3, direction: DVec3) -> Option<DVec3> {
        let denom = self.normal.dot(direction);
        if denom.abs() < DEGENERATE_EPSILON {
            return None;
        }
        let t = -self.signed_distance(origin) / denom;
        (t >= 0.0).then(|| origin + t * direction)
    }
}

/// The outcome of fitting a plane near a clicked pixel.
///
/// Both members are expressed in the depth camera frame at the snapshot timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneFitResult {
    /// Where the click ray meets the fitted plane.
    pub intersection: DVec3,
    /// The fitted plane.
    pub plane: PlaneModel,
}

/// A frame sitting on a plane: origin at `point`, +Z along `normal`, +X along
/// `up × normal` and +Y completing a right-handed frame.
///
/// When `up` is parallel to the normal (e.g. a floor seen with a world up of +Z) an
/// arbitrary orthonormal completion is used.
pub fn plane_frame(point: DVec3, normal: DVec3, up: DVec3) -> Result<SE3, PlaneError> {
    let z_axis = normal
        .try_normalize()
        .ok_or(PlaneError::DegenerateNormal(normal.to_array()))?;

    let cross = up.cross(z_axis);
    let x_axis = if cross.length() > DEGENERATE_EPSILON {
        cross.normalize()
    } else {
        z_axis.any_orthonormal_pair().0
    };
    let y_axis = z_axis.cross(x_axis);

    let rotation = SO3::from_matrix(&DMat3::from_cols(x_axis, y_axis, z_axis));
    Ok(SE3::new(rotation, point))
}
