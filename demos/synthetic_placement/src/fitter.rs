use anchorage::ar::{error::PlaneFitError, interfaces::PlaneFitter};
use anchorage::k3d::{
    camera::{CameraIntrinsics, NormalizedPoint},
    depth::DepthSnapshot,
    plane::{PlaneFitResult, PlaneModel},
    pose::Pose,
};
use glam::DVec3;

/// Marches along the click ray until it touches the depth samples, then spans a plane over
/// the samples around the touching point.
pub struct RayMarchFitter {
    /// Distance between two probes along the ray, in meters.
    pub step: f64,
    /// Farthest probe along the ray, in meters.
    pub max_range: f64,
    /// A probe closer than this to a sample touches the surface.
    pub hit_distance: f64,
    /// Radius of the neighbourhood the plane is spanned over.
    pub support_radius: f64,
    /// Minimum number of samples in the neighbourhood.
    pub min_support: usize,
}

impl Default for RayMarchFitter {
    fn default() -> Self {
        Self {
            step: 0.02,
            max_range: 6.0,
            hit_distance: 0.03,
            support_radius: 0.2,
            min_support: 8,
        }
    }
}

impl PlaneFitter for RayMarchFitter {
    fn fit(
        &self,
        snapshot: &DepthSnapshot,
        intrinsics: &CameraIntrinsics,
        color_t_depth: &Pose,
        click: NormalizedPoint,
    ) -> Result<PlaneFitResult, PlaneFitError> {
        // the click ray, in the depth camera frame
        let depth_t_color = color_t_depth.inverse().transform;
        let origin = depth_t_color.translation;
        let direction = depth_t_color
            .transform_vector(intrinsics.unproject(intrinsics.to_pixel(click)))
            .normalize();

        let num_steps = (self.max_range / self.step) as usize;
        let touch = (1..=num_steps)
            .map(|i| origin + direction * (i as f64 * self.step))
            .find_map(|probe| {
                snapshot
                    .nearest(&probe.to_array())
                    .filter(|n| n.distance < self.hit_distance)
            })
            .ok_or(PlaneFitError::NoPlaneFound)?;
        let touch = DVec3::from_array(snapshot.points()[touch.index]);

        let support = snapshot
            .within(&touch.to_array(), self.support_radius)
            .into_iter()
            .map(|n| DVec3::from_array(snapshot.points()[n.index]))
            .collect::<Vec<_>>();
        if support.len() < self.min_support {
            log::debug!("only {} samples around {touch:?}", support.len());
            return Err(PlaneFitError::NoPlaneFound);
        }

        let centroid = support.iter().sum::<DVec3>() / support.len() as f64;
        let normal = spanning_normal(&support, centroid).ok_or(PlaneFitError::NoPlaneFound)?;
        // face the camera
        let normal = if normal.dot(origin - centroid) < 0.0 {
            -normal
        } else {
            normal
        };

        let plane = PlaneModel::from_point_normal(centroid, normal)
            .map_err(|_| PlaneFitError::NoPlaneFound)?;
        let intersection = plane
            .intersect_ray(origin, direction)
            .ok_or(PlaneFitError::NoPlaneFound)?;

        Ok(PlaneFitResult {
            intersection,
            plane,
        })
    }
}

/// The normal of the largest triangle spanned by the centroid and two support samples.
fn spanning_normal(support: &[DVec3], centroid: DVec3) -> Option<DVec3> {
    let far = support
        .iter()
        .copied()
        .max_by(|a, b| a.distance_squared(centroid).total_cmp(&b.distance_squared(centroid)))?;
    let edge = far - centroid;
    support
        .iter()
        .map(|p| edge.cross(*p - centroid))
        .max_by(|a, b| a.length_squared().total_cmp(&b.length_squared()))
        .and_then(|n| n.try_normalize())
}
