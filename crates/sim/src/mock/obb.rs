//! Oriented boxes and the separating-axis overlap test.

use geometry::{DQuat, DVec3, Pose};

const PARALLEL_EPS: f64 = 1e-12;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Obb {
    pub center: DVec3,
    pub rotation: DQuat,
    pub half_extents: DVec3,
}

impl Obb {
    /// Box with the given half extents placed at `pose`.
    #[must_use]
    pub fn from_pose(pose: &Pose, half_extents: DVec3) -> Self {
        Self {
            center: pose.point,
            rotation: pose.quat,
            half_extents,
        }
    }

    #[must_use]
    pub fn axes(&self) -> [DVec3; 3] {
        [
            self.rotation * DVec3::X,
            self.rotation * DVec3::Y,
            self.rotation * DVec3::Z,
        ]
    }

    #[must_use]
    pub fn corners(&self) -> [DVec3; 8] {
        let [ax, ay, az] = self.axes();
        let h = self.half_extents;
        let mut out = [DVec3::ZERO; 8];
        for (i, corner) in out.iter_mut().enumerate() {
            let sx = if i & 0b100 == 0 { -1.0 } else { 1.0 };
            let sy = if i & 0b010 == 0 { -1.0 } else { 1.0 };
            let sz = if i & 0b001 == 0 { -1.0 } else { 1.0 };
            *corner = self.center + ax * (sx * h.x) + ay * (sy * h.y) + az * (sz * h.z);
        }
        out
    }

    /// Half length of the projection of the box onto `axis`.
    fn projected_radius(&self, axis: DVec3) -> f64 {
        let [ax, ay, az] = self.axes();
        ax.dot(axis).abs() * self.half_extents.x
            + ay.dot(axis).abs() * self.half_extents.y
            + az.dot(axis).abs() * self.half_extents.z
    }

    /// Separating-axis test over the 15 candidate axes. Touching boxes overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Obb) -> bool {
        let a = self.axes();
        let b = other.axes();
        let t = other.center - self.center;

        let mut candidates = Vec::with_capacity(15);
        candidates.extend_from_slice(&a);
        candidates.extend_from_slice(&b);
        for u in &a {
            for v in &b {
                let c = u.cross(*v);
                if c.length_squared() > PARALLEL_EPS {
                    candidates.push(c);
                }
            }
        }

        candidates.iter().all(|axis| {
            let distance = t.dot(*axis).abs();
            distance <= self.projected_radius(*axis) + other.projected_radius(*axis)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geometry::Euler;
    use std::f64::consts::FRAC_PI_4;

    fn cube(center: DVec3, half: f64) -> Obb {
        Obb::from_pose(&Pose::from_point(center), DVec3::splat(half))
    }

    #[test]
    fn separated_cubes() {
        let a = cube(DVec3::ZERO, 0.5);
        let b = cube(DVec3::new(1.1, 0.0, 0.0), 0.5);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn touching_cubes_overlap() {
        let a = cube(DVec3::ZERO, 0.5);
        let b = cube(DVec3::new(1.0, 0.0, 0.0), 0.5);
        assert!(a.overlaps(&b));
    }

    #[test]
    fn rotated_cube_reaches_further() {
        let a = cube(DVec3::ZERO, 0.5);
        // A cube rotated 45 degrees about z reaches sqrt(2)/2 along x.
        let b = Obb::from_pose(
            &Pose::new(DVec3::new(1.15, 0.0, 0.0), Euler::new(0.0, 0.0, FRAC_PI_4).to_quat()),
            DVec3::splat(0.5),
        );
        let c = cube(DVec3::new(1.15, 0.0, 0.0), 0.5);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn corners_span_extents() {
        let obb = cube(DVec3::new(1.0, 2.0, 3.0), 0.25);
        let corners = obb.corners();
        let min = corners.iter().fold(DVec3::splat(f64::MAX), |m, c| m.min(*c));
        assert!((min - DVec3::new(0.75, 1.75, 2.75)).length() < 1e-12);
    }
}
