//! Rigid transforms built from a point and a quaternion.
//!
//! Conventions follow the grasp database: Euler angles are `(roll, pitch, yaw)`
//! about the fixed X, Y and Z axes, so the rotation matrix is
//! `Rz(yaw) * Ry(pitch) * Rx(roll)`.

use glam::{DQuat, DVec3};

/// Roll, pitch and yaw in radians.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Euler {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl Euler {
    #[must_use]
    pub const fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self { roll, pitch, yaw }
    }

    #[must_use]
    pub fn from_array(rpy: [f64; 3]) -> Self {
        Self::new(rpy[0], rpy[1], rpy[2])
    }

    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.roll, self.pitch, self.yaw]
    }

    /// Convert to a unit quaternion.
    #[must_use]
    pub fn to_quat(self) -> DQuat {
        let q = DQuat::from_rotation_z(self.yaw)
            * DQuat::from_rotation_y(self.pitch)
            * DQuat::from_rotation_x(self.roll);
        q.normalize()
    }

    /// Recover the angles from a quaternion. Pitch is clamped to `[-pi/2, pi/2]`.
    ///
    /// At pitch `±pi/2` only the sum or difference of roll and yaw is
    /// defined; roll is then 0 and yaw carries the whole rotation.
    #[must_use]
    pub fn from_quat(q: DQuat) -> Self {
        const GIMBAL_LOCK: f64 = 1.0 - 1e-9;

        let q = q.normalize();
        let (x, y, z, w) = (q.x, q.y, q.z, q.w);

        let sin_pitch = (2.0 * (w * y - z * x)).clamp(-1.0, 1.0);
        let pitch = sin_pitch.asin();
        if sin_pitch.abs() > GIMBAL_LOCK {
            // Rotation matrix entries m01 and m11.
            let yaw = (2.0 * (w * z - x * y)).atan2(1.0 - 2.0 * (x * x + z * z));
            return Self {
                roll: 0.0,
                pitch,
                yaw,
            };
        }

        let roll = (2.0 * (w * x + y * z)).atan2(1.0 - 2.0 * (x * x + y * y));
        let yaw = (2.0 * (w * z + x * y)).atan2(1.0 - 2.0 * (y * y + z * z));
        Self { roll, pitch, yaw }
    }
}

/// Position plus orientation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pose {
    pub point: DVec3,
    pub quat: DQuat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Self = Self {
        point: DVec3::ZERO,
        quat: DQuat::IDENTITY,
    };

    #[must_use]
    pub const fn new(point: DVec3, quat: DQuat) -> Self {
        Self { point, quat }
    }

    /// Pure translation.
    #[must_use]
    pub const fn from_point(point: DVec3) -> Self {
        Self {
            point,
            quat: DQuat::IDENTITY,
        }
    }

    /// Pure rotation.
    #[must_use]
    pub fn from_euler(euler: Euler) -> Self {
        Self {
            point: DVec3::ZERO,
            quat: euler.to_quat(),
        }
    }

    /// Decode `[x, y, z, roll, pitch, yaw]`.
    #[must_use]
    pub fn from_flat(flat: [f64; 6]) -> Self {
        Self {
            point: DVec3::new(flat[0], flat[1], flat[2]),
            quat: Euler::new(flat[3], flat[4], flat[5]).to_quat(),
        }
    }

    /// Compose `self * other`: `other` is expressed in the frame of `self`.
    #[must_use]
    pub fn multiply(&self, other: &Pose) -> Pose {
        Pose {
            point: self.point + self.quat * other.point,
            quat: (self.quat * other.quat).normalize(),
        }
    }

    #[must_use]
    pub fn invert(&self) -> Pose {
        let inv = self.quat.inverse();
        Pose {
            point: -(inv * self.point),
            quat: inv,
        }
    }

    #[must_use]
    pub fn transform_point(&self, p: DVec3) -> DVec3 {
        self.point + self.quat * p
    }

    #[must_use]
    pub fn euler(&self) -> Euler {
        Euler::from_quat(self.quat)
    }

    /// Encode as `[x, y, z, roll, pitch, yaw]`.
    #[must_use]
    pub fn to_flat(&self) -> [f64; 6] {
        let e = self.euler();
        [
            self.point.x,
            self.point.y,
            self.point.z,
            e.roll,
            e.pitch,
            e.yaw,
        ]
    }

    /// Flat encoding with every component rounded to `digits` decimals.
    #[must_use]
    pub fn to_rounded_flat(&self, digits: u32) -> [f64; 6] {
        self.to_flat().map(|v| crate::round_to(v, digits))
    }

    /// Same pose with its position multiplied by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Pose {
        Pose {
            point: self.point * factor,
            quat: self.quat,
        }
    }

    /// True when positions agree within `eps` and the orientations describe the
    /// same rotation within `eps` (sign of the quaternion is ignored).
    #[must_use]
    pub fn approx_eq(&self, other: &Pose, eps: f64) -> bool {
        let dp = (self.point - other.point).abs().max_element();
        let dot = self.quat.dot(other.quat).abs();
        dp <= eps && (1.0 - dot) <= eps
    }
}

/// Transform every point by `pose`.
#[must_use]
pub fn apply_affine(pose: &Pose, points: &[DVec3]) -> Vec<DVec3> {
    points.iter().map(|p| pose.transform_point(*p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn euler_round_trip() {
        let e = Euler::new(0.3, -0.7, 1.9);
        let back = Euler::from_quat(e.to_quat());
        assert!((e.roll - back.roll).abs() < 1e-9);
        assert!((e.pitch - back.pitch).abs() < 1e-9);
        assert!((e.yaw - back.yaw).abs() < 1e-9);
    }

    #[test]
    fn gimbal_lock_keeps_the_orientation() {
        for pitch in [FRAC_PI_2, -FRAC_PI_2] {
            for (roll, yaw) in [(FRAC_PI_2, -FRAC_PI_2), (PI, 0.3), (-0.4, FRAC_PI_2), (0.0, 0.0)] {
                let q = Euler::new(roll, pitch, yaw).to_quat();
                let back = Euler::from_quat(q);
                assert!(back.roll.abs() < 1e-12);
                assert!((back.pitch - pitch).abs() < 1e-6);
                assert!(back.to_quat().abs_diff_eq(q, 1e-7) || back.to_quat().abs_diff_eq(-q, 1e-7));
            }
        }
    }

    #[test]
    fn yaw_rotates_x_into_y() {
        let pose = Pose::from_euler(Euler::new(0.0, 0.0, FRAC_PI_2));
        let p = pose.transform_point(DVec3::X);
        assert!((p - DVec3::Y).length() < 1e-9);
    }

    #[test]
    fn fixed_axis_order_is_roll_then_pitch_then_yaw() {
        // Rz(yaw) * Ry(pitch) * Rx(roll) applied to +Z with roll=pi/2 gives -Y,
        // then yaw=pi/2 maps -Y onto +X.
        let pose = Pose::from_euler(Euler::new(FRAC_PI_2, 0.0, FRAC_PI_2));
        let p = pose.transform_point(DVec3::Z);
        assert!((p - DVec3::X).length() < 1e-9);
    }

    #[test]
    fn multiply_with_inverse_is_identity() {
        let pose = Pose::new(DVec3::new(1.0, -2.0, 0.5), Euler::new(0.1, 0.2, PI).to_quat());
        let id = pose.multiply(&pose.invert());
        assert!(id.approx_eq(&Pose::IDENTITY, 1e-9));
    }

    #[test]
    fn point_then_rotation_keeps_point() {
        let grasp = Pose::from_point(DVec3::new(0.1, 0.0, 0.0))
            .multiply(&Pose::from_euler(Euler::new(FRAC_PI_2, 0.0, -FRAC_PI_2)));
        assert!((grasp.point - DVec3::new(0.1, 0.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn flat_encoding_round_trip() {
        let pose = Pose::new(DVec3::new(0.04, 0.0, 0.02), Euler::new(PI, 0.0, FRAC_PI_2).to_quat());
        let back = Pose::from_flat(pose.to_flat());
        assert!(back.approx_eq(&pose, 1e-9));
    }
}
