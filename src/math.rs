//! Quaternion utilities and nalgebra extensions for the attitude engine
//!
//! All functions here are pure. Every quaternion they return is unit-norm;
//! compositions are renormalized to counter floating-point drift.

use nalgebra::{Quaternion, Unit, UnitQuaternion, Vector3};

use crate::error::AttitudeError;

/// Mathematical constants
pub const DEG_TO_RAD: f32 = core::f32::consts::PI / 180.0;
pub const RAD_TO_DEG: f32 = 180.0 / core::f32::consts::PI;

/// Norms at or below this are treated as degenerate.
pub const NORM_EPSILON: f32 = 1.0e-6;

/// Yaw magnitude (sine) past which the Euler decomposition is treated as gimbal locked.
const GIMBAL_LOCK_THRESHOLD: f32 = 0.999_999;

/// Normalize a quaternion, reporting a degenerate input as an error.
pub fn try_normalize(q: Quaternion<f32>) -> Result<UnitQuaternion<f32>, AttitudeError> {
    let norm = q.norm();
    if !norm.is_finite() || norm <= NORM_EPSILON {
        return Err(AttitudeError::DegenerateQuaternion { norm });
    }
    Ok(UnitQuaternion::new_unchecked(q / norm))
}

/// Normalize a quaternion, substituting identity for a degenerate input.
///
/// The substitution is logged at warn level.
pub fn normalize(q: Quaternion<f32>) -> UnitQuaternion<f32> {
    try_normalize(q).unwrap_or_else(|error| {
        tracing::warn!(%error, "substituting identity for degenerate quaternion");
        UnitQuaternion::identity()
    })
}

/// Compose two rotations: the result applies `b` first, then `a`.
pub fn multiply(a: &UnitQuaternion<f32>, b: &UnitQuaternion<f32>) -> UnitQuaternion<f32> {
    normalize(a.into_inner() * b.into_inner())
}

/// Inverse of a unit quaternion (its conjugate).
pub fn inverse(q: &UnitQuaternion<f32>) -> UnitQuaternion<f32> {
    q.inverse()
}

/// Rotation of `angle` radians about `axis`.
///
/// The axis does not need to be normalized. A zero axis yields identity.
pub fn from_angle_axis(angle: f32, axis: Vector3<f32>) -> UnitQuaternion<f32> {
    match Unit::try_new(axis, NORM_EPSILON) {
        Some(axis) => UnitQuaternion::from_axis_angle(&axis, angle),
        None => UnitQuaternion::identity(),
    }
}

/// Euler angles `(x, y, z)` in radians using the scene-node convention.
///
/// `x` is pitch, `y` is yaw and `z` is roll. The rotation is
/// `Rx(pitch) * Ry(yaw) * Rz(roll)`, i.e. roll is applied first, then yaw,
/// then pitch.
///
/// The decomposition is singular at yaw = ±90° (gimbal lock). There, pitch
/// and roll rotate about the same axis and cannot be separated; the whole
/// rotation is reported as pitch and roll is 0.
pub fn to_euler_angles(q: &UnitQuaternion<f32>) -> Vector3<f32> {
    let rotation = q.to_rotation_matrix();
    let m = rotation.matrix();

    let sin_yaw = m[(0, 2)].clamp(-1.0, 1.0);
    let yaw = sin_yaw.asin();

    if sin_yaw.abs() >= GIMBAL_LOCK_THRESHOLD {
        let pitch = m[(2, 1)].atan2(m[(1, 1)]);
        return Vector3::new(pitch, yaw, 0.0);
    }

    let pitch = (-m[(1, 2)]).atan2(m[(2, 2)]);
    let roll = (-m[(0, 1)]).atan2(m[(0, 0)]);
    Vector3::new(pitch, yaw, roll)
}

/// Extension trait for Vector3 operations
pub trait Vector3Ext {
    /// Convert radians to degrees
    fn rad_to_deg(&self) -> Vector3<f32>;
}

impl Vector3Ext for Vector3<f32> {
    fn rad_to_deg(&self) -> Vector3<f32> {
        *self * RAD_TO_DEG
    }
}

/// Scene-node Euler conversions on UnitQuaternion
pub trait QuaternionExt {
    /// Node Euler angles `(pitch, yaw, roll)` in radians
    fn node_euler_angles(&self) -> Vector3<f32>;

    /// Node Euler angles `(pitch, yaw, roll)` in degrees
    fn node_euler_degrees(&self) -> Vector3<f32>;

    /// Build a quaternion from node Euler angles in degrees
    fn from_node_euler_degrees(pitch: f32, yaw: f32, roll: f32) -> UnitQuaternion<f32>;
}

impl QuaternionExt for UnitQuaternion<f32> {
    fn node_euler_angles(&self) -> Vector3<f32> {
        to_euler_angles(self)
    }

    fn node_euler_degrees(&self) -> Vector3<f32> {
        self.node_euler_angles().rad_to_deg()
    }

    fn from_node_euler_degrees(pitch: f32, yaw: f32, roll: f32) -> UnitQuaternion<f32> {
        let pitch = from_angle_axis(pitch * DEG_TO_RAD, Vector3::x());
        let yaw = from_angle_axis(yaw * DEG_TO_RAD, Vector3::y());
        let roll = from_angle_axis(roll * DEG_TO_RAD, Vector3::z());
        multiply(&pitch, &multiply(&yaw, &roll))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64;

    const EPSILON: f32 = 1e-5;

    /// Same rotation, allowing for the q / -q double cover
    fn same_rotation(a: &UnitQuaternion<f32>, b: &UnitQuaternion<f32>, tolerance: f32) -> bool {
        let diff = (a.coords - b.coords).norm();
        let sum = (a.coords + b.coords).norm();
        diff.min(sum) < tolerance
    }

    fn random_unit(rng: &mut Pcg64) -> UnitQuaternion<f32> {
        let axis = Vector3::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
        );
        from_angle_axis(rng.random_range(-3.1..3.1), axis)
    }

    #[test]
    fn test_multiply_by_inverse_is_identity() {
        let mut rng = Pcg64::seed_from_u64(7);
        for _ in 0..200 {
            let q = random_unit(&mut rng);
            let product = multiply(&q, &inverse(&q));
            assert!(
                same_rotation(&product, &UnitQuaternion::identity(), 1e-5),
                "q * q^-1 should be identity for {:?}",
                q
            );
        }
    }

    #[test]
    fn test_degenerate_quaternion() {
        let zero = Quaternion::new(0.0, 0.0, 0.0, 0.0);
        assert!(matches!(
            try_normalize(zero),
            Err(AttitudeError::DegenerateQuaternion { .. })
        ));
        assert_eq!(normalize(zero), UnitQuaternion::identity());
    }

    #[test]
    fn test_normalize_scales_to_unit() {
        let q = normalize(Quaternion::new(2.0, 0.0, 0.0, 2.0));
        assert!((q.norm() - 1.0).abs() < EPSILON);
        assert!((q.angle() - core::f32::consts::FRAC_PI_2).abs() < EPSILON);
    }

    #[test]
    fn test_multiply_order() {
        // b applied first, then a
        let a = from_angle_axis(core::f32::consts::FRAC_PI_2, Vector3::z());
        let b = from_angle_axis(core::f32::consts::FRAC_PI_2, Vector3::x());
        let composed = multiply(&a, &b);

        let v = composed * Vector3::y();
        // x-rotation maps +Y to +Z, z-rotation leaves +Z alone
        assert!((v - Vector3::z()).norm() < EPSILON);

        let reversed = multiply(&b, &a) * Vector3::y();
        assert!((reversed - Vector3::z()).norm() > 0.5);
    }

    #[test]
    fn test_from_angle_axis_normalizes_axis() {
        let scaled = from_angle_axis(0.5, Vector3::new(0.0, 0.0, 10.0));
        let unit = from_angle_axis(0.5, Vector3::z());
        assert!(same_rotation(&scaled, &unit, EPSILON));

        assert_eq!(from_angle_axis(1.0, Vector3::zeros()), UnitQuaternion::identity());
    }

    #[test]
    fn test_single_axis_euler() {
        let angle = 30.0 * DEG_TO_RAD;

        let pitch = to_euler_angles(&from_angle_axis(angle, Vector3::x()));
        assert!((pitch - Vector3::new(angle, 0.0, 0.0)).norm() < EPSILON);

        let yaw = to_euler_angles(&from_angle_axis(angle, Vector3::y()));
        assert!((yaw - Vector3::new(0.0, angle, 0.0)).norm() < EPSILON);

        let roll = to_euler_angles(&from_angle_axis(angle, Vector3::z()));
        assert!((roll - Vector3::new(0.0, 0.0, angle)).norm() < EPSILON);
    }

    #[test]
    fn test_node_euler_round_trip() {
        let q = UnitQuaternion::from_node_euler_degrees(20.0, -35.0, 60.0);
        let recovered = q.node_euler_degrees();
        assert!(
            (recovered - Vector3::new(20.0, -35.0, 60.0)).norm() < 1e-3,
            "recovered {:?}",
            recovered
        );
    }

    #[test]
    fn test_gimbal_lock_folds_roll_into_pitch() {
        let q = UnitQuaternion::from_node_euler_degrees(10.0, 90.0, 25.0);
        let euler = q.node_euler_degrees();

        assert!((euler.y - 90.0).abs() < 0.1);
        assert_eq!(euler.z, 0.0);
        // pitch and roll share an axis at yaw = 90, so only their sum survives
        assert!((euler.x - 35.0).abs() < 0.1, "pitch {}", euler.x);
    }

    #[test]
    fn test_rad_to_deg() {
        let radians = Vector3::new(core::f32::consts::PI, core::f32::consts::FRAC_PI_2, 0.0);
        assert!((radians.rad_to_deg() - Vector3::new(180.0, 90.0, 0.0)).norm() < 1e-4);
    }
}
