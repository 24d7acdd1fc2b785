use std::ops::Mul;

use glam::{DMat4, DVec3};
use rand::Rng;

use crate::so3::SO3;

/// A rigid body transformation `a_T_b`: maps points expressed in frame `b` into frame `a`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SE3 {
    /// The rotation part.
    pub rotation: SO3,
    /// The translation part.
    pub translation: DVec3,
}

impl Default for SE3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl SE3 {
    /// The identity transformation.
    pub const IDENTITY: Self = Self {
        rotation: SO3::IDENTITY,
        translation: DVec3::ZERO,
    };

    /// Create a transformation from a rotation and a translation.
    pub fn new(rotation: SO3, translation: DVec3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// A pure translation.
    pub fn from_translation(translation: DVec3) -> Self {
        Self::new(SO3::IDENTITY, translation)
    }

    /// Create a transformation from an axis, an angle in radians and a translation.
    pub fn from_axis_angle(axis: DVec3, angle: f64, translation: DVec3) -> Self {
        Self::new(SO3::from_axis_angle(axis, angle), translation)
    }

    /// Create a transformation from a homogeneous 4x4 matrix.
    ///
    /// PRECONDITION: the upper 3x3 block is a rotation matrix.
    pub fn from_matrix(mat: &DMat4) -> Self {
        let (_, rotation, translation) = mat.to_scale_rotation_translation();
        Self::new(SO3::from_quaternion(rotation), translation)
    }

    /// Draw a random transformation with a uniform rotation and a translation in
    /// `[-extent, extent]^3`.
    pub fn from_random(extent: f64) -> Self {
        let mut rng = rand::rng();
        let translation = DVec3::new(
            rng.random_range(-extent..=extent),
            rng.random_range(-extent..=extent),
            rng.random_range(-extent..=extent),
        );
        Self::new(SO3::from_random(), translation)
    }

    /// The homogeneous 4x4 matrix of the transformation.
    pub fn matrix(&self) -> DMat4 {
        DMat4::from_rotation_translation(self.rotation.q, self.translation)
    }

    /// The inverse transformation `b_T_a`.
    pub fn inverse(&self) -> Self {
        let inv_rot = self.rotation.inverse();
        let inv_trans = -inv_rot.transform(self.translation);
        Self::new(inv_rot, inv_trans)
    }

    /// Chain two transformations: `a_T_b.compose(&b_T_c) == a_T_c`.
    pub fn compose(&self, other: &SE3) -> Self {
        Self::new(
            self.rotation * other.rotation,
            self.translation + self.rotation.transform(other.translation),
        )
    }

    /// Map a point from the source frame into the destination frame.
    #[inline]
    pub fn transform_point(&self, point: DVec3) -> DVec3 {
        self.rotation.transform(point) + self.translation
    }

    /// Rotate a direction; the translation is ignored.
    #[inline]
    pub fn transform_vector(&self, vector: DVec3) -> DVec3 {
        self.rotation.transform(vector)
    }
}

impl Mul for SE3 {
    type Output = SE3;

    fn mul(self, rhs: Self) -> Self::Output {
        self.compose(&rhs)
    }
}
